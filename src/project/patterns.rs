use super::ProjectError;
use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;
use tracing::warn;

const GLOB_CHARS: &[char] = &['*', '?', '[', ']', '{', '}', '!'];

/// Normalizes a user-supplied include/exclude pattern.
///
/// A pattern without glob metacharacters is a directory path and matches
/// everything beneath it: `src/legacy/` becomes `src/legacy/**`.
pub fn normalize_glob_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');

    if trimmed.contains(GLOB_CHARS) {
        trimmed.to_string()
    } else {
        format!("{}/**", trimmed)
    }
}

/// Compiles a glob where `*` never crosses a path separator.
pub(crate) fn compile_glob(pattern: &str) -> Result<GlobMatcher, ProjectError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|source| ProjectError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })
}

/// An include or exclude pattern matched against root-relative paths.
///
/// Patterns without a `/` match the file name alone, so `*.spec.ts`
/// excludes spec files at any depth.
#[derive(Debug, Clone)]
pub struct PathPattern {
    matcher: GlobMatcher,
    basename_only: bool,
}

impl PathPattern {
    /// Compiles a command-line pattern. A malformed glob such as `src/[` is
    /// matched literally instead of failing.
    pub fn new(pattern: &str) -> Result<Self, ProjectError> {
        let pattern = normalize_glob_pattern(pattern);
        let matcher = match compile_glob(&pattern) {
            Ok(matcher) => matcher,
            Err(err) => {
                warn!("{}, matching it literally", err);
                compile_glob(&globset::escape(&pattern))?
            }
        };
        let basename_only = !pattern.contains('/');

        Ok(Self {
            matcher,
            basename_only,
        })
    }

    pub fn is_match(&self, relative: &Path) -> bool {
        if self.basename_only {
            match relative.file_name() {
                Some(name) => self.matcher.is_match(name),
                None => false,
            }
        } else {
            self.matcher.is_match(relative)
        }
    }
}
