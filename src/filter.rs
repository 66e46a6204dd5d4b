//! Origin and message filters for deprecation usages.
//!
//! Both filters keep a usage when it matches any of the supplied
//! patterns and are no-ops when given no patterns.

use crate::model::Usage;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid regular expression \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Keeps usages whose origin package is in an allow-list.
#[derive(Debug, Clone, Default)]
pub struct OriginFilter {
    packages: HashSet<String>,
}

impl OriginFilter {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Usages without an origin never pass a non-empty filter.
    pub fn allows(&self, usage: &Usage) -> bool {
        if self.packages.is_empty() {
            return true;
        }
        usage
            .source_package
            .as_ref()
            .is_some_and(|pkg| self.packages.contains(pkg))
    }
}

/// Keeps usages that come from one of `packages`.
pub fn filter_by_origin(usages: Vec<Usage>, packages: &[String]) -> Vec<Usage> {
    let filter = OriginFilter::new(packages.iter().cloned());
    if filter.is_empty() {
        return usages;
    }
    usages.into_iter().filter(|u| filter.allows(u)).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFilterOptions {
    /// Compare messages with exact case. Off by default.
    pub case_sensitive: bool,
    /// Treat patterns as regular expressions instead of literal text.
    pub regex: bool,
}

#[derive(Debug, Clone)]
enum Pattern {
    Literal(String),
    Regex(Regex),
}

/// A compiled set of message patterns.
///
/// Literal patterns match as plain substrings, so regex metacharacters in
/// them carry no special meaning and can never fail to compile.
#[derive(Debug, Clone)]
pub struct MessageMatcher {
    patterns: Vec<Pattern>,
    case_sensitive: bool,
}

impl MessageMatcher {
    pub fn new<S: AsRef<str>>(
        patterns: &[S],
        options: MessageFilterOptions,
    ) -> Result<Self, FilterError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                if options.regex {
                    RegexBuilder::new(p)
                        .case_insensitive(!options.case_sensitive)
                        .build()
                        .map(Pattern::Regex)
                        .map_err(|source| FilterError::InvalidPattern {
                            pattern: p.to_string(),
                            source,
                        })
                } else if options.case_sensitive {
                    Ok(Pattern::Literal(p.to_string()))
                } else {
                    Ok(Pattern::Literal(p.to_lowercase()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            case_sensitive: options.case_sensitive,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_match(&self, message: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        let folded;
        let haystack = if self.case_sensitive {
            message
        } else {
            folded = message.to_lowercase();
            folded.as_str()
        };

        self.patterns.iter().any(|pattern| match pattern {
            Pattern::Literal(text) => haystack.contains(text.as_str()),
            Pattern::Regex(re) => re.is_match(message),
        })
    }
}

/// Keeps usages whose message matches at least one of `patterns`,
/// preserving input order.
///
/// # Errors
///
/// Fails only in regex mode, when a pattern does not compile. The error
/// names the offending pattern.
///
/// # Example
///
/// ```
/// use deprecation_scanner::filter::{filter_by_message, MessageFilterOptions};
/// use deprecation_scanner::{Position, Range, Usage};
///
/// let range = Range::new(Position::new(0, 0), Position::new(0, 3));
/// let usages = vec![
///     Usage::new("/a.ts", range, "'foo' is deprecated."),
///     Usage::new("/a.ts", range, "'bar' is deprecated."),
/// ];
///
/// let kept = filter_by_message(usages, &["FOO"], MessageFilterOptions::default())?;
/// assert_eq!(kept.len(), 1);
/// # Ok::<(), deprecation_scanner::filter::FilterError>(())
/// ```
pub fn filter_by_message<S: AsRef<str>>(
    usages: Vec<Usage>,
    patterns: &[S],
    options: MessageFilterOptions,
) -> Result<Vec<Usage>, FilterError> {
    let matcher = MessageMatcher::new(patterns, options)?;
    if matcher.is_empty() {
        return Ok(usages);
    }
    Ok(usages
        .into_iter()
        .filter(|u| matcher.is_match(&u.message))
        .collect())
}
