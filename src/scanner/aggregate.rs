use crate::model::{FileFindings, ScanResult, Usage};

/// Collects per-file usages in scan order and folds them into a
/// [`ScanResult`] at the end.
#[derive(Debug, Default)]
pub struct Aggregator {
    files: Vec<FileFindings>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the surviving usages of one file and returns the finalized
    /// entry. Files without usages are not recorded.
    pub fn add(&mut self, file_path: String, usages: Vec<Usage>) -> Option<&FileFindings> {
        if usages.is_empty() {
            return None;
        }
        self.files.push(FileFindings::new(file_path, usages));
        self.files.last()
    }

    pub fn finish(self, scanned_files: usize) -> ScanResult {
        ScanResult::from_files(self.files, scanned_files)
    }
}
