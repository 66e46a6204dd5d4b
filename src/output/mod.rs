//! Report rendering.
//!
//! Every format is a pure function of a [`ScanResult`] and
//! [`ReportOptions`]. Human-readable formats render an explicit
//! "No deprecations found." when there is nothing to report.
//!
//! # Available Formats
//!
//! | Format | Aliases | Content |
//! |--------|---------|---------|
//! | `human` | `log` | Terminal listing, optionally colored |
//! | `structured` | `json` | Pretty JSON, readable back with [`parse_structured`] |
//! | `tabular` | `markdown`, `md` | Markdown tables per file |
//! | `rich-text` | `html` | Self-contained HTML page |

mod cli;
mod html;
mod json;
mod markdown;

pub use cli::generate_human_string;
pub use html::generate_html_string;
pub use json::{generate_json_string, parse_structured};
pub use markdown::generate_markdown_string;

use crate::model::{ScanResult, Usage};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Message rendered by human-readable formats for an empty result.
pub const NO_FINDINGS: &str = "No deprecations found.";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unknown format: {0}. Use 'human', 'structured', 'tabular', or 'rich-text'")]
    UnknownFormat(String),

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format for scan results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable listing
    Human,
    /// JSON for programmatic use
    Structured,
    /// Markdown tables
    Tabular,
    /// HTML report
    RichText,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Human,
        OutputFormat::Structured,
        OutputFormat::Tabular,
        OutputFormat::RichText,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Human => "human",
            OutputFormat::Structured => "structured",
            OutputFormat::Tabular => "tabular",
            OutputFormat::RichText => "rich-text",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            OutputFormat::Human => &["log"],
            OutputFormat::Structured => &["json"],
            OutputFormat::Tabular => &["markdown", "md"],
            OutputFormat::RichText => &["html"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OutputFormat::Human => "Terminal listing grouped by file",
            OutputFormat::Structured => "JSON, lossless and machine-readable",
            OutputFormat::Tabular => "Markdown report with one table per file",
            OutputFormat::RichText => "Self-contained HTML report",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.name() == lower || f.aliases().contains(&lower.as_str()))
            .ok_or_else(|| ReportError::UnknownFormat(s.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub format: OutputFormat,
    /// Only meaningful for [`OutputFormat::Human`].
    pub colorize: bool,
    /// Paths beneath this directory are shown relative to it.
    pub root_dir: Option<PathBuf>,
}

impl ReportOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: false,
            root_dir: None,
        }
    }
}

/// Renders `result` in the requested format.
pub fn format_result(result: &ScanResult, options: &ReportOptions) -> Result<String, ReportError> {
    let root = options.root_dir.as_deref();
    match options.format {
        OutputFormat::Human => Ok(generate_human_string(result, root, options.colorize)),
        OutputFormat::Structured => generate_json_string(result, root),
        OutputFormat::Tabular => Ok(generate_markdown_string(result, root)),
        OutputFormat::RichText => Ok(generate_html_string(result, root)),
    }
}

fn relative_path(file_path: &str, root: Option<&Path>) -> String {
    let Some(root) = root else {
        return file_path.to_string();
    };
    match Path::new(file_path).strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().into_owned(),
        _ => file_path.to_string(),
    }
}

/// 1-based `line:column` of the usage start.
fn format_position(usage: &Usage) -> String {
    let start = usage.range.start;
    format!("{}:{}", start.line + 1, start.character + 1)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

/// `N deprecation(s) in M file(s).`
fn summary_counts(result: &ScanResult) -> String {
    format!(
        "{} in {}.",
        plural(result.total_usages, "deprecation"),
        plural(result.files.len(), "file")
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{FileFindings, Position, Range};

    pub(crate) fn sample_result() -> ScanResult {
        let a = "/repo/src/a.ts";
        let b = "/repo/src/b.ts";
        ScanResult::from_files(
            vec![
                FileFindings::new(
                    b,
                    vec![Usage::new(
                        b,
                        Range::new(Position::new(9, 4), Position::new(9, 7)),
                        "The signature '(x: A | B): void' is deprecated.",
                    )],
                ),
                FileFindings::new(
                    a,
                    vec![
                        Usage::new(
                            a,
                            Range::new(Position::new(0, 9), Position::new(0, 12)),
                            "'old' is deprecated.",
                        )
                        .with_source_package(Some("@scope/lib".to_string())),
                        Usage::new(
                            a,
                            Range::new(Position::new(2, 0), Position::new(2, 5)),
                            "'<legacy>' is deprecated. Use 'fresh' instead.",
                        ),
                    ],
                ),
            ],
            4,
        )
    }

    #[test]
    fn test_format_parsing_and_aliases() {
        assert_eq!("human".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
        assert_eq!("log".parse::<OutputFormat>().unwrap(), OutputFormat::Human);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Structured);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Tabular);
        assert_eq!("rich-text".parse::<OutputFormat>().unwrap(), OutputFormat::RichText);
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::RichText);
    }

    #[test]
    fn test_unknown_format_is_error() {
        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, ReportError::UnknownFormat(ref f) if f == "xml"));
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/repo");
        assert_eq!(relative_path("/repo/src/a.ts", Some(root)), "src/a.ts");
        assert_eq!(relative_path("/repository/a.ts", Some(root)), "/repository/a.ts");
        assert_eq!(relative_path("/other/a.ts", Some(root)), "/other/a.ts");
        assert_eq!(relative_path("/repo/src/a.ts", None), "/repo/src/a.ts");
    }

    #[test]
    fn test_summary_pluralization() {
        let result = sample_result();
        assert_eq!(summary_counts(&result), "3 deprecations in 2 files.");

        let mut single = result.clone();
        single.retain_usages(|u| u.message == "'old' is deprecated.");
        assert_eq!(summary_counts(&single), "1 deprecation in 1 file.");
    }

    #[test]
    fn test_every_format_handles_empty_result() {
        let empty = ScanResult::default();
        for format in OutputFormat::ALL {
            let out = format_result(&empty, &ReportOptions::new(format)).unwrap();
            if format == OutputFormat::Structured {
                assert_eq!(parse_structured(&out).unwrap(), empty);
            } else {
                assert!(out.contains(NO_FINDINGS), "{} output: {}", format, out);
            }
        }
    }
}
