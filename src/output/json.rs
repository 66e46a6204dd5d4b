use super::{relative_path, ReportError};
use crate::model::{FileFindings, Range, ScanResult, Usage};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Usages omit their file path; it is carried by the enclosing file entry.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport {
    files: Vec<JsonFile>,
    total_usages: usize,
    scanned_files: usize,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonFile {
    file_path: String,
    usages: Vec<JsonUsage>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonUsage {
    range: Range,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_package: Option<String>,
}

/// Pretty-printed JSON with two-space indentation.
pub fn generate_json_string(result: &ScanResult, root: Option<&Path>) -> Result<String, ReportError> {
    let report = JsonReport {
        files: result
            .files
            .iter()
            .map(|file| JsonFile {
                file_path: relative_path(&file.file_path, root),
                usages: file
                    .usages
                    .iter()
                    .map(|usage| JsonUsage {
                        range: usage.range,
                        message: usage.message.clone(),
                        source_package: usage.source_package.clone(),
                    })
                    .collect(),
            })
            .collect(),
        total_usages: result.total_usages,
        scanned_files: result.scanned_files,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Reads back a report produced by [`generate_json_string`].
///
/// File and usage order are kept as written. Each usage takes its file
/// path from the enclosing entry.
pub fn parse_structured(input: &str) -> Result<ScanResult, ReportError> {
    let report: JsonReport = serde_json::from_str(input)?;

    let files = report
        .files
        .into_iter()
        .map(|file| {
            let usages = file
                .usages
                .into_iter()
                .map(|u| {
                    Usage::new(file.file_path.clone(), u.range, u.message)
                        .with_source_package(u.source_package)
                })
                .collect();
            FileFindings::new(file.file_path, usages)
        })
        .collect();

    Ok(ScanResult {
        files,
        total_usages: report.total_usages,
        scanned_files: report.scanned_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_result;
    use serde_json::Value;

    #[test]
    fn test_structured_round_trip() {
        let result = sample_result();
        let json = generate_json_string(&result, None).unwrap();
        let parsed = parse_structured(&json).unwrap();

        assert_eq!(parsed, result);
    }

    #[test]
    fn test_absent_source_package_is_omitted() {
        let json = generate_json_string(&sample_result(), None).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        let usages = &value["files"][0]["usages"];
        assert_eq!(usages[0]["sourcePackage"], "@scope/lib");
        assert!(usages[1].get("sourcePackage").is_none());
        assert!(usages[0].get("filePath").is_none());
        assert_eq!(value["totalUsages"], 3);
        assert_eq!(value["scannedFiles"], 4);
        assert_eq!(value["files"][1]["usages"][0]["range"]["start"]["line"], 9);
    }

    #[test]
    fn test_relative_paths_and_indentation() {
        let json = generate_json_string(&sample_result(), Some(Path::new("/repo"))).unwrap();
        assert!(json.contains("\n  \"files\": ["));
        assert!(json.contains("\"filePath\": \"src/a.ts\""));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_structured("not json"), Err(ReportError::Json(_))));
    }
}
