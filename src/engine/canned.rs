use super::{DiagnosticEngine, EngineError, RawDiagnostic};
use crate::project::Project;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Engine that answers from canned data instead of analyzing anything.
///
/// Files without canned diagnostics report none.
///
/// # Example
///
/// ```
/// use deprecation_scanner::engine::{CannedEngine, RawDiagnostic};
///
/// let engine = CannedEngine::new()
///     .with_diagnostic("/repo/src/a.ts", RawDiagnostic::new(6385, 10, 3, "'x' is deprecated."))
///     .with_definition("/repo/src/a.ts", 10, "/repo/node_modules/lib/index.d.ts");
/// let disposed = engine.disposed_flag();
/// assert!(!disposed.load(std::sync::atomic::Ordering::SeqCst));
/// ```
#[derive(Debug, Default)]
pub struct CannedEngine {
    diagnostics: HashMap<PathBuf, Vec<RawDiagnostic>>,
    definitions: HashMap<(PathBuf, usize), String>,
    failing: HashSet<PathBuf>,
    disposed: Arc<AtomicBool>,
    analyzed: Arc<AtomicUsize>,
    opened_files: Arc<Mutex<Vec<PathBuf>>>,
}

impl CannedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diagnostic(mut self, file: impl Into<PathBuf>, diagnostic: RawDiagnostic) -> Self {
        self.diagnostics
            .entry(file.into())
            .or_default()
            .push(diagnostic);
        self
    }

    pub fn with_definition(
        mut self,
        file: impl Into<PathBuf>,
        offset: usize,
        definition: impl Into<String>,
    ) -> Self {
        self.definitions
            .insert((file.into(), offset), definition.into());
        self
    }

    /// Makes analysis of `file` fail.
    pub fn failing_on(mut self, file: impl Into<PathBuf>) -> Self {
        self.failing.insert(file.into());
        self
    }

    /// Shared flag set once the engine is disposed.
    pub fn disposed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.disposed)
    }

    /// Shared counter of files analyzed so far.
    pub fn analyzed_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.analyzed)
    }

    /// Shared list of the files the engine was last opened on.
    pub fn opened_files(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.opened_files)
    }
}

#[async_trait]
impl DiagnosticEngine for CannedEngine {
    fn name(&self) -> &'static str {
        "Canned"
    }

    async fn open_project(&mut self, project: &Project) -> Result<(), EngineError> {
        if let Ok(mut files) = self.opened_files.lock() {
            *files = project.file_names.clone();
        }
        Ok(())
    }

    async fn suggestion_diagnostics(
        &mut self,
        file: &Path,
    ) -> Result<Vec<RawDiagnostic>, EngineError> {
        self.analyzed.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(file) {
            return Err(EngineError::Analysis {
                path: file.to_path_buf(),
                message: "canned failure".to_string(),
            });
        }
        Ok(self.diagnostics.get(file).cloned().unwrap_or_default())
    }

    async fn definition_at(
        &mut self,
        file: &Path,
        offset: usize,
    ) -> Result<Option<String>, EngineError> {
        Ok(self
            .definitions
            .get(&(file.to_path_buf(), offset))
            .cloned())
    }

    fn dispose(&mut self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}
