//! The scan loop.
//!
//! [`scan`] resolves the project, feeds every file to a
//! [`DiagnosticEngine`], annotates each finding with its origin package,
//! applies the origin and message filters and aggregates what survives.
//!
//! The loop is cooperative: every [`YIELD_INTERVAL`] files it yields to the
//! runtime and checks the [`CancellationFlag`]. A cancelled scan returns
//! the partial result gathered so far.
//!
//! # Example
//!
//! ```no_run
//! use deprecation_scanner::engine::CommandEngine;
//! use deprecation_scanner::scanner::{scan, ScanOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = ScanOptions::new("/path/to/project");
//!     let engine = CommandEngine::new("deprecation-engine", vec![]);
//!     let result = scan(&options, engine, &mut (), None).await?;
//!     println!("{} usages in {} files", result.total_usages, result.files.len());
//!     Ok(())
//! }
//! ```

mod aggregate;

pub use aggregate::Aggregator;

use crate::engine::{DiagnosticEngine, EngineError};
use crate::extract::DeprecationExtractor;
use crate::filter::{MessageMatcher, OriginFilter};
use crate::model::{FileFindings, ScanResult, Usage};
use crate::origin::resolve_origin;
use crate::project::{find_config, Project, ProjectError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Files between two cooperative yields.
pub const YIELD_INTERVAL: usize = 50;

/// Files between two progress messages.
pub const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error("{engine} engine failed to open the project: {source}")]
    Engine {
        engine: &'static str,
        #[source]
        source: EngineError,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub root_dir: PathBuf,
    /// Configuration file, relative to `root_dir` unless absolute.
    pub config_path: Option<PathBuf>,
    pub include: Option<String>,
    pub exclude: Option<String>,
    /// Keep only usages originating from these packages.
    pub from_packages: Vec<String>,
    /// Keep only usages whose message matches.
    pub message_filter: Option<MessageMatcher>,
}

impl ScanOptions {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }
}

/// Receives progress while a scan runs.
pub trait ScanObserver {
    /// A human-readable status line.
    fn on_progress(&mut self, _message: &str) {}

    /// A file's entry, as soon as it is final. Called in scan order, before
    /// the result is sorted.
    fn on_file(&mut self, _findings: &FileFindings) {}
}

impl ScanObserver for () {}

/// Observer built from two closures.
pub struct Callbacks<P, F> {
    pub on_progress: P,
    pub on_file: F,
}

impl<P, F> ScanObserver for Callbacks<P, F>
where
    P: FnMut(&str),
    F: FnMut(&FileFindings),
{
    fn on_progress(&mut self, message: &str) {
        (self.on_progress)(message)
    }

    fn on_file(&mut self, findings: &FileFindings) {
        (self.on_file)(findings)
    }
}

/// Shared request to stop a running scan at its next checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Scans the project described by `options` with `engine`.
///
/// The engine is disposed before this returns, whatever the outcome.
///
/// # Errors
///
/// Fails only when the project configuration cannot be read or parsed,
/// a glob is invalid, or the engine cannot open the project. Files the
/// engine fails to analyze are reported through
/// [`ScanObserver::on_progress`] and skipped.
pub async fn scan<E, O>(
    options: &ScanOptions,
    engine: E,
    observer: &mut O,
    cancel: Option<&CancellationFlag>,
) -> Result<ScanResult, ScanError>
where
    E: DiagnosticEngine,
    O: ScanObserver + ?Sized,
{
    let mut extractor = DeprecationExtractor::new(engine);
    let result = run(options, &mut extractor, observer, cancel).await;
    extractor.dispose();
    result
}

async fn run<E, O>(
    options: &ScanOptions,
    extractor: &mut DeprecationExtractor<E>,
    observer: &mut O,
    cancel: Option<&CancellationFlag>,
) -> Result<ScanResult, ScanError>
where
    E: DiagnosticEngine,
    O: ScanObserver + ?Sized,
{
    let root = &options.root_dir;

    observer.on_progress("Looking for tsconfig.json...");
    let project = match find_config(root, options.config_path.as_deref()) {
        Some(config) => {
            observer.on_progress("Reading tsconfig.json...");
            debug!(config = %config.display(), "using project configuration");
            Project::load(root, Some(&config))?
        }
        None => {
            observer.on_progress("No tsconfig.json found, using default configuration...");
            Project::load(root, None)?
        }
    };

    let files = project.files_to_scan(options.include.as_deref(), options.exclude.as_deref())?;
    let total = files.len();

    observer.on_progress(&format!("Initializing {} engine ({} files)...", extractor.engine_name(), total));
    extractor
        .open_project(&project)
        .await
        .map_err(|source| ScanError::Engine {
            engine: extractor.engine_name(),
            source,
        })?;

    let origins = OriginFilter::new(options.from_packages.iter().cloned());
    let mut aggregator = Aggregator::new();

    for (i, file) in files.iter().enumerate() {
        if i % YIELD_INTERVAL == 0 {
            tokio::task::yield_now().await;
            if cancel.is_some_and(CancellationFlag::is_cancelled) {
                info!(scanned = i, total, "scan cancelled");
                observer.on_progress("Scan cancelled");
                return Ok(aggregator.finish(i));
            }
        }
        if i % PROGRESS_INTERVAL == 0 {
            observer.on_progress(&format!("Scanning files... ({}/{})", i + 1, total));
        }

        let findings = match extractor.deprecation_findings(file).await {
            Ok(findings) => findings,
            Err(err) => {
                warn!(file = %file.display(), error = %err, "skipping file");
                observer.on_progress(&format!("Warning: Error scanning {}: {}", file.display(), err));
                continue;
            }
        };

        let file_path = file.to_string_lossy().into_owned();
        let usages: Vec<Usage> = findings
            .into_iter()
            .map(|finding| {
                let origin = finding.definition_path.as_deref().and_then(resolve_origin);
                Usage::new(file_path.clone(), finding.range, finding.message)
                    .with_source_package(origin)
            })
            .filter(|usage| origins.allows(usage))
            .filter(|usage| {
                options
                    .message_filter
                    .as_ref()
                    .map_or(true, |m| m.is_match(&usage.message))
            })
            .collect();

        if let Some(entry) = aggregator.add(file_path, usages) {
            observer.on_file(entry);
        }
    }

    let result = aggregator.finish(total);
    debug!(
        scanned = result.scanned_files,
        usages = result.total_usages,
        "scan complete"
    );
    Ok(result)
}
