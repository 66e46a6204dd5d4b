use super::patterns::compile_glob;
use super::{is_source_file, ProjectError, JS_EXTENSIONS};
use globset::GlobMatcher;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directories excluded when a project configuration has no `exclude`.
const DEFAULT_CONFIG_EXCLUDES: [&str; 3] = ["node_modules", "bower_components", "jspm_packages"];

/// The parts of a `tsconfig.json` the scanner understands.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TsConfig {
    pub files: Option<Vec<String>>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub compiler_options: Map<String, Value>,
}

impl TsConfig {
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = fs::read_to_string(path).map_err(|source| ProjectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parses configuration text. Comments and trailing commas are allowed.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ProjectError> {
        let cleaned = strip_trailing_commas(&strip_json_comments(content));
        serde_json::from_str(&cleaned).map_err(|source| ProjectError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn allow_js(&self) -> bool {
        self.compiler_options
            .get("allowJs")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Enumerates the project's source files, in directory-walk order after
    /// any explicitly listed `files`.
    pub fn file_names(&self, config_dir: &Path) -> Result<Vec<PathBuf>, ProjectError> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();

        for file in self.files.iter().flatten() {
            let path = config_dir.join(file);
            if !path.is_file() {
                warn!(file = %path.display(), "file listed in configuration does not exist");
                continue;
            }
            if seen.insert(path.clone()) {
                names.push(path);
            }
        }

        let include: Vec<String> = match (&self.include, &self.files) {
            (Some(include), _) => include.clone(),
            (None, Some(_)) => Vec::new(),
            (None, None) => vec!["**/*".to_string()],
        };
        if include.is_empty() {
            return Ok(names);
        }

        let include = include
            .iter()
            .map(|p| compile_glob(&expand_include(p)))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude = self.exclude_matchers()?;
        let allow_js = self.allow_js();

        let walker = WalkDir::new(config_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                match entry.path().strip_prefix(config_dir) {
                    Ok(rel) => !matches_any(&exclude, rel),
                    Err(_) => true,
                }
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }
            if !allow_js && has_js_extension(entry.path()) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(config_dir) else {
                continue;
            };
            if matches_any(&exclude, rel) || !matches_any(&include, rel) {
                continue;
            }

            let path = entry.into_path();
            if seen.insert(path.clone()) {
                names.push(path);
            }
        }

        debug!(count = names.len(), "resolved files from project configuration");
        Ok(names)
    }

    fn exclude_matchers(&self) -> Result<Vec<GlobMatcher>, ProjectError> {
        let patterns: Vec<String> = match &self.exclude {
            Some(exclude) => exclude.clone(),
            None => {
                let mut defaults: Vec<String> =
                    DEFAULT_CONFIG_EXCLUDES.iter().map(|s| s.to_string()).collect();
                if let Some(out_dir) = self.compiler_options.get("outDir").and_then(Value::as_str) {
                    defaults.push(out_dir.to_string());
                }
                defaults
            }
        };

        let mut matchers = Vec::with_capacity(patterns.len() * 2);
        for pattern in patterns {
            let pattern = clean_pattern(&pattern);
            matchers.push(compile_glob(&pattern)?);
            matchers.push(compile_glob(&format!("{}/**", pattern))?);
        }
        Ok(matchers)
    }
}

fn matches_any(set: &[GlobMatcher], rel: &Path) -> bool {
    set.iter().any(|m| m.is_match(rel))
}

fn clean_pattern(pattern: &str) -> String {
    pattern
        .trim_start_matches("./")
        .trim_end_matches('/')
        .to_string()
}

/// An include entry whose last segment has neither a wildcard nor an
/// extension names a directory.
fn expand_include(pattern: &str) -> String {
    let pattern = clean_pattern(pattern);
    let last = pattern.rsplit('/').next().unwrap_or("");
    if last.contains(['*', '?']) || last.contains('.') {
        pattern
    } else {
        format!("{}/**/*", pattern)
    }
}

fn has_js_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| JS_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Removes `//` and `/* */` comments outside string literals. Newlines
/// inside comments are kept so parser line numbers stay accurate.
pub fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    prev = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

/// Drops commas that directly precede a closing `}` or `]`.
fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }

    out
}
