//! Turns an engine's raw diagnostics into deprecation findings.

use crate::engine::{DiagnosticEngine, EngineError, RawDiagnostic};
use crate::model::{Position, Range};
use crate::project::Project;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Diagnostic codes that flag a reference to a deprecated declaration.
///
/// | Code | Message |
/// |------|---------|
/// | 6385 | `'{0}' is deprecated.` |
/// | 6386 | `'{0}' is deprecated. Use '{1}' instead.` |
/// | 6387 | `The signature '{0}' is deprecated.` |
pub const DEPRECATED_DIAGNOSTIC_CODES: [u32; 3] = [6385, 6386, 6387];

pub fn is_deprecation_code(code: u32) -> bool {
    DEPRECATED_DIAGNOSTIC_CODES.contains(&code)
}

/// One deprecation diagnostic, located and flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub range: Range,
    pub message: String,
    /// File declaring the deprecated symbol, when the engine could tell.
    pub definition_path: Option<String>,
}

/// Maps UTF-16 offsets to line/character positions for one file's text.
///
/// `\n`, `\r\n`, a lone `\r`, U+2028 and U+2029 each end a line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut offset = 0;
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            offset += c.len_utf16();
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                        offset += 1;
                    }
                    line_starts.push(offset);
                }
                '\n' | '\u{2028}' | '\u{2029}' => line_starts.push(offset),
                _ => {}
            }
        }

        Self {
            line_starts,
            len: offset,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of `offset`. Offsets past the end clamp to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let character = offset - self.line_starts[line];
        Position::new(line as u32, character as u32)
    }
}

#[derive(Debug)]
struct SourceFile {
    version: u32,
    index: LineIndex,
}

/// Per-scan wrapper around a [`DiagnosticEngine`].
///
/// File text is read at most once per extractor and kept for the rest of
/// the scan. The engine is disposed exactly once, either through
/// [`dispose`](Self::dispose) or when the extractor is dropped.
pub struct DeprecationExtractor<E: DiagnosticEngine> {
    engine: E,
    files: HashMap<PathBuf, SourceFile>,
    disposed: bool,
}

impl<E: DiagnosticEngine> DeprecationExtractor<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            files: HashMap::new(),
            disposed: false,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn open_project(&mut self, project: &Project) -> Result<(), EngineError> {
        self.engine.open_project(project).await
    }

    /// Version of the cached text of `path`, if it has been read.
    pub fn file_version(&self, path: &Path) -> Option<u32> {
        self.files.get(path).map(|f| f.version)
    }

    /// Returns the deprecation findings of one file, in engine order.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine cannot analyze the file or the
    /// file text cannot be read.
    pub async fn deprecation_findings(&mut self, path: &Path) -> Result<Vec<Finding>, EngineError> {
        let diagnostics = self.engine.suggestion_diagnostics(path).await?;
        let mut findings = Vec::new();

        for diagnostic in diagnostics {
            let code = diagnostic.code;
            if !is_deprecation_code(code) {
                continue;
            }
            let RawDiagnostic {
                start: Some(start),
                length: Some(length),
                message_text,
                ..
            } = diagnostic
            else {
                trace!(file = %path.display(), code, "skipping diagnostic without location");
                continue;
            };

            let range = {
                let index = self.line_index(path).await?;
                let end = start.saturating_add(length);
                Range::new(index.position(start), index.position(end))
            };
            let definition_path = self.engine.definition_at(path, start).await?;

            findings.push(Finding {
                range,
                message: message_text.flatten(),
                definition_path,
            });
        }

        Ok(findings)
    }

    async fn line_index(&mut self, path: &Path) -> Result<&LineIndex, EngineError> {
        if !self.files.contains_key(path) {
            let bytes = tokio::fs::read(path).await.map_err(|source| EngineError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let index = LineIndex::new(&String::from_utf8_lossy(&bytes));
            self.files
                .insert(path.to_path_buf(), SourceFile { version: 0, index });
        }
        Ok(&self.files[path].index)
    }

    /// Releases the engine. Later calls do nothing.
    pub fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.files.clear();
            self.engine.dispose();
        }
    }
}

impl<E: DiagnosticEngine> Drop for DeprecationExtractor<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CannedEngine, MessageChain, MessageText};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    #[test]
    fn test_line_index_line_breaks() {
        let index = LineIndex::new("a\nb\r\nc\rd\u{2028}e\u{2029}f");
        assert_eq!(index.line_count(), 6);
        assert_eq!(index.position(0), Position::new(0, 0));
        assert_eq!(index.position(2), Position::new(1, 0));
        assert_eq!(index.position(5), Position::new(2, 0));
        assert_eq!(index.position(7), Position::new(3, 0));
        assert_eq!(index.position(9), Position::new(4, 0));
        assert_eq!(index.position(11), Position::new(5, 0));
    }

    #[test]
    fn test_line_index_counts_utf16_units() {
        // '😀' is two UTF-16 code units.
        let index = LineIndex::new("x😀y\nz");
        assert_eq!(index.position(3), Position::new(0, 3));
        assert_eq!(index.position(5), Position::new(1, 0));
    }

    #[test]
    fn test_line_index_clamps_past_end() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.position(100), Position::new(1, 2));
        assert_eq!(LineIndex::new("").position(3), Position::new(0, 0));
    }

    #[tokio::test]
    async fn test_findings_keep_only_deprecations() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "import { old } from 'lib';\nold();\n").unwrap();

        let chain = MessageText::Chain(MessageChain {
            message_text: "The signature '(): void' is deprecated.".to_string(),
            next: vec![MessageChain {
                message_text: "Use 'fresh' instead.".to_string(),
                next: vec![],
            }],
        });
        let engine = CannedEngine::new()
            .with_diagnostic(&file, RawDiagnostic::new(6385, 27, 3, "'old' is deprecated."))
            .with_diagnostic(&file, RawDiagnostic::new(6133, 9, 3, "'old' is declared but never read."))
            .with_diagnostic(
                &file,
                RawDiagnostic {
                    code: 6387,
                    start: None,
                    length: None,
                    message_text: "no location".into(),
                },
            )
            .with_diagnostic(&file, RawDiagnostic::new(6387, 27, 5, chain))
            .with_definition(&file, 27, "/repo/node_modules/lib/index.d.ts");

        let mut extractor = DeprecationExtractor::new(engine);
        let findings = extractor.deprecation_findings(&file).await.unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].message, "'old' is deprecated.");
        assert_eq!(
            findings[0].range,
            Range::new(Position::new(1, 0), Position::new(1, 3))
        );
        assert_eq!(
            findings[0].definition_path.as_deref(),
            Some("/repo/node_modules/lib/index.d.ts")
        );
        assert_eq!(
            findings[1].message,
            "The signature '(): void' is deprecated.\n  Use 'fresh' instead."
        );
        assert_eq!(extractor.file_version(&file), Some(0));
    }

    #[tokio::test]
    async fn test_out_of_range_offsets_are_clamped() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.ts");
        std::fs::write(&file, "old();
").unwrap();

        let engine = CannedEngine::new()
            .with_diagnostic(&file, RawDiagnostic::new(6385, usize::MAX, 2, "'old' is deprecated."));
        let mut extractor = DeprecationExtractor::new(engine);
        let findings = extractor.deprecation_findings(&file).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].range,
            Range::new(Position::new(1, 0), Position::new(1, 0))
        );
    }

    #[tokio::test]
    async fn test_findings_without_deprecations_skip_reading() {
        let engine = CannedEngine::new();
        let mut extractor = DeprecationExtractor::new(engine);

        let path = Path::new("/does/not/exist.ts");
        let findings = extractor.deprecation_findings(path).await.unwrap();

        assert!(findings.is_empty());
        assert_eq!(extractor.file_version(path), None);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_error() {
        let path = PathBuf::from("/does/not/exist.ts");
        let engine = CannedEngine::new().with_diagnostic(&path, RawDiagnostic::new(6385, 0, 1, "x"));
        let mut extractor = DeprecationExtractor::new(engine);

        let err = extractor.deprecation_findings(&path).await.unwrap_err();
        assert!(matches!(err, EngineError::Read { .. }));
    }

    #[test]
    fn test_dispose_runs_once_and_on_drop() {
        let engine = CannedEngine::new();
        let disposed = engine.disposed_flag();

        let extractor = DeprecationExtractor::new(engine);
        assert!(!disposed.load(Ordering::SeqCst));
        drop(extractor);
        assert!(disposed.load(Ordering::SeqCst));
    }
}
