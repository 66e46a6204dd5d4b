use super::{format_position, relative_path, summary_counts, NO_FINDINGS};
use crate::model::ScanResult;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Package")]
    package: String,
}

/// Markdown report with one table per file.
pub fn generate_markdown_string(result: &ScanResult, root: Option<&Path>) -> String {
    let mut md = String::from("# Deprecation Report\n\n");

    if result.is_empty() {
        md.push_str(NO_FINDINGS);
        return md;
    }

    for file in &result.files {
        md.push_str(&format!("## {}\n\n", relative_path(&file.file_path, root)));

        let rows: Vec<UsageRow> = file
            .usages
            .iter()
            .map(|usage| UsageRow {
                line: format_position(usage),
                message: escape_cell(&usage.message),
                package: usage
                    .source_package
                    .as_deref()
                    .map(escape_cell)
                    .unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        let table = Table::new(rows).with(Style::markdown()).to_string();
        md.push_str(&table);
        md.push_str("\n\n");
    }

    md.push_str(&format!("**Summary**: {}", summary_counts(result)));
    md
}

/// Keeps a value on one table row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_result;

    #[test]
    fn test_markdown_layout() {
        let md = generate_markdown_string(&sample_result(), Some(Path::new("/repo")));

        assert!(md.starts_with("# Deprecation Report\n\n## src/a.ts\n\n"));
        assert!(md.contains("## src/b.ts"));
        assert!(md.contains("Line"));
        assert!(md.contains("Package"));
        assert!(md.contains("@scope/lib"));
        assert!(md.contains("| -"));
        assert!(md.ends_with("**Summary**: 3 deprecations in 2 files."));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let md = generate_markdown_string(&sample_result(), None);
        assert!(md.contains("(x: A \\| B)"));
    }

    #[test]
    fn test_escape_cell_keeps_one_row() {
        assert_eq!(escape_cell("top\n  nested"), "top<br>  nested");
        assert_eq!(escape_cell("a|b"), "a\\|b");
    }

    #[test]
    fn test_markdown_empty() {
        let md = generate_markdown_string(&ScanResult::default(), None);
        assert_eq!(md, "# Deprecation Report\n\nNo deprecations found.");
    }
}
