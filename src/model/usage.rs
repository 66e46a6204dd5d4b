use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A zero-based line/character location inside one file's text.
///
/// `character` counts UTF-16 code units from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.character).cmp(&(other.line, other.character))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Creates a range, swapping the endpoints if `end` precedes `start`.
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }
}

/// One occurrence of a reference to a deprecated declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub file_path: String,
    pub range: Range,
    pub message: String,
    /// Package the deprecated declaration was installed from, if it lives
    /// under `node_modules`. Never an empty string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_package: Option<String>,
}

impl Usage {
    pub fn new(file_path: impl Into<String>, range: Range, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            range,
            message: message.into(),
            source_package: None,
        }
    }

    /// Sets the origin package. Empty names are treated as no origin.
    pub fn with_source_package(mut self, package: Option<String>) -> Self {
        self.source_package = package.filter(|p| !p.is_empty());
        self
    }
}

/// All usages found in a single file. `usages` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFindings {
    pub file_path: String,
    pub usages: Vec<Usage>,
}

impl FileFindings {
    pub fn new(file_path: impl Into<String>, usages: Vec<Usage>) -> Self {
        Self {
            file_path: file_path.into(),
            usages,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Files with at least one usage, ordered by path.
    pub files: Vec<FileFindings>,
    pub total_usages: usize,
    /// Files the scan visited, including those without findings.
    pub scanned_files: usize,
}

impl ScanResult {
    /// Builds a result from per-file findings, dropping empty entries,
    /// sorting by path and recomputing the usage total.
    pub fn from_files(files: Vec<FileFindings>, scanned_files: usize) -> Self {
        let mut files: Vec<FileFindings> =
            files.into_iter().filter(|f| !f.usages.is_empty()).collect();
        files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        let total_usages = files.iter().map(|f| f.usages.len()).sum();

        Self {
            files,
            total_usages,
            scanned_files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterates over every usage in file order.
    pub fn usages(&self) -> impl Iterator<Item = &Usage> {
        self.files.iter().flat_map(|f| f.usages.iter())
    }

    /// Keeps only the usages accepted by `keep`, dropping files left empty
    /// and recomputing the total. `scanned_files` is unchanged.
    pub fn retain_usages<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Usage) -> bool,
    {
        for file in &mut self.files {
            file.usages.retain(|u| keep(u));
        }
        self.files.retain(|f| !f.usages.is_empty());
        self.total_usages = self.files.iter().map(|f| f.usages.len()).sum();
    }
}
