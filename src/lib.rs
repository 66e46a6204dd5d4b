pub mod config;
pub mod engine;
pub mod extract;
pub mod filter;
pub mod model;
pub mod origin;
pub mod output;
pub mod project;
pub mod scanner;

pub use config::Config;
pub use engine::DiagnosticEngine;
pub use filter::{filter_by_message, filter_by_origin, MessageFilterOptions, MessageMatcher};
pub use model::{FileFindings, Position, Range, ScanResult, Usage};
pub use origin::resolve_origin;
pub use output::{format_result, OutputFormat, ReportOptions};
pub use scanner::{scan, CancellationFlag, ScanObserver, ScanOptions};
