use super::{format_position, relative_path, summary_counts, NO_FINDINGS};
use crate::model::ScanResult;
use console::Style;
use std::path::Path;

struct Palette {
    colorize: bool,
}

impl Palette {
    fn paint(&self, style: Style, text: &str) -> String {
        if self.colorize {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Terminal listing: each file followed by its usages, then a summary.
///
/// ```text
/// src/a.ts
///   1:10     'old' is deprecated.  [@scope/lib]
///
/// Found 1 deprecation in 1 file.
/// ```
pub fn generate_human_string(result: &ScanResult, root: Option<&Path>, colorize: bool) -> String {
    let palette = Palette { colorize };

    if result.is_empty() {
        return palette.paint(Style::new().green(), NO_FINDINGS);
    }

    let mut lines = Vec::new();

    for file in &result.files {
        let path = relative_path(&file.file_path, root);
        lines.push(palette.paint(Style::new().underlined(), &path));

        for usage in &file.usages {
            let position = format!("{:<8}", format_position(usage));
            let package = usage
                .source_package
                .as_ref()
                .map(|pkg| palette.paint(Style::new().cyan(), &format!("[{}]", pkg)))
                .unwrap_or_default();

            lines.push(format!(
                "  {} {}  {}",
                palette.paint(Style::new().dim(), &position),
                palette.paint(Style::new().yellow(), &usage.message),
                package
            ));
        }

        lines.push(String::new());
    }

    let summary = format!("Found {}", summary_counts(result));
    lines.push(palette.paint(Style::new().bold(), &summary));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_result;

    #[test]
    fn test_human_lists_every_file_and_message() {
        let result = sample_result();
        let out = generate_human_string(&result, None, false);

        for file in &result.files {
            assert!(out.contains(&file.file_path));
        }
        for usage in result.usages() {
            assert!(out.contains(&usage.message));
        }
        assert!(out.ends_with("Found 3 deprecations in 2 files."));
    }

    #[test]
    fn test_human_line_layout() {
        let out = generate_human_string(&sample_result(), Some(Path::new("/repo")), false);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "src/a.ts");
        assert_eq!(lines[1], "  1:10     'old' is deprecated.  [@scope/lib]");
        assert_eq!(lines[2], "  3:1      '<legacy>' is deprecated. Use 'fresh' instead.  ");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "src/b.ts");
    }

    #[test]
    fn test_human_plain_output_has_no_escapes() {
        let out = generate_human_string(&sample_result(), None, false);
        assert!(!out.contains('\x1b'));

        let colored = generate_human_string(&sample_result(), None, true);
        assert!(colored.contains('\x1b'));
    }

    #[test]
    fn test_human_empty() {
        let out = generate_human_string(&ScanResult::default(), None, false);
        assert_eq!(out, NO_FINDINGS);
    }
}
