//! Rich-text report: a single HTML page with inline styles.
//!
//! Each file with findings gets a card listing its usages by position,
//! followed by the summary line.

use super::{format_position, relative_path, summary_counts, NO_FINDINGS};
use crate::model::ScanResult;
use std::path::Path;

/// Renders the deprecation report as a standalone HTML document.
pub fn generate_html_string(result: &ScanResult, root: Option<&Path>) -> String {
    let mut html = String::new();

    html.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Deprecation Report</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
            background: #f5f5f5;
            color: #333;
        }
        h1 { color: #2c3e50; border-bottom: 2px solid #3498db; padding-bottom: 10px; }
        .file {
            background: white;
            border-radius: 8px;
            padding: 16px;
            margin-bottom: 16px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        .file h2 { margin: 0 0 12px 0; font-size: 1.1em; color: #2980b9; word-break: break-all; }
        .file ul { list-style: none; padding: 0; margin: 0; }
        .file li { padding: 8px 0; border-bottom: 1px solid #eee; white-space: pre-wrap; }
        .file li:last-child { border-bottom: none; }
        code {
            background: #ecf0f1;
            padding: 2px 6px;
            border-radius: 4px;
            font-family: 'Monaco', 'Menlo', monospace;
            font-size: 0.9em;
        }
        .package { color: #27ae60; font-size: 0.9em; }
        .summary { background: #2c3e50; color: white; padding: 12px 16px; border-radius: 8px; margin-top: 20px; }
        .no-deprecations { text-align: center; color: #27ae60; font-size: 1.2em; padding: 40px; }
    </style>
</head>
<body>
    <h1>Deprecation Report</h1>
"#,
    );

    if result.is_empty() {
        html.push_str(&format!(
            "    <p class=\"no-deprecations\">{}</p>\n",
            NO_FINDINGS
        ));
    } else {
        for file in &result.files {
            html.push_str(&format!(
                r#"    <section class="file">
        <h2>{}</h2>
        <ul>
"#,
                html_escape(&relative_path(&file.file_path, root))
            ));

            for usage in &file.usages {
                let package = usage
                    .source_package
                    .as_ref()
                    .map(|pkg| format!(r#" <span class="package">[{}]</span>"#, html_escape(pkg)))
                    .unwrap_or_default();

                html.push_str(&format!(
                    "            <li><code>{}</code> {}{}</li>\n",
                    format_position(usage),
                    html_escape(&usage.message),
                    package
                ));
            }

            html.push_str("        </ul>\n    </section>\n");
        }

        html.push_str(&format!(
            "    <div class=\"summary\">Found {}</div>\n",
            summary_counts(result)
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_result;

    #[test]
    fn test_html_escapes_content() {
        let html = generate_html_string(&sample_result(), Some(Path::new("/repo")));

        assert!(html.contains("<h2>src/a.ts</h2>"));
        assert!(html.contains("&#039;&lt;legacy&gt;&#039; is deprecated."));
        assert!(!html.contains("'<legacy>'"));
        assert!(html.contains(r#"<span class="package">[@scope/lib]</span>"#));
        assert!(html.contains("<code>1:10</code>"));
        assert!(html.contains(r#"<div class="summary">Found 3 deprecations in 2 files.</div>"#));
    }

    #[test]
    fn test_html_empty() {
        let html = generate_html_string(&ScanResult::default(), None);
        assert!(html.contains(r#"<p class="no-deprecations">No deprecations found.</p>"#));
        assert!(!html.contains("class=\"summary\""));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;");
    }
}
