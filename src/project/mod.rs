//! Project configuration and file resolution.
//!
//! A scan starts by deciding which files to examine:
//!
//! 1. An explicitly given configuration file is used if it exists.
//! 2. Otherwise `tsconfig.json` directly inside the root directory is used.
//!    Parent directories are never searched.
//! 3. Otherwise a built-in default applies: permissive compiler options and
//!    every source file under the root, skipping `node_modules`, `dist`,
//!    `build` and `.git`.
//!
//! Optional include/exclude globs then narrow the list further, see
//! [`Project::files_to_scan`].

mod patterns;
mod tsconfig;

pub use patterns::{normalize_glob_pattern, PathPattern};
pub use tsconfig::{strip_json_comments, TsConfig};

use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Name of the project configuration file looked up in the root directory.
pub const CONFIG_FILE_NAME: &str = "tsconfig.json";

/// Extensions of the files the scanner can analyze.
pub const SOURCE_EXTENSIONS: [&str; 8] = ["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

pub(crate) const JS_EXTENSIONS: [&str; 4] = ["js", "jsx", "mjs", "cjs"];

/// Directories skipped when no project configuration exists.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 4] = ["node_modules", "dist", "build", ".git"];

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Cannot resolve root directory {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid glob pattern \"{pattern}\": {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// A resolved project: where it lives, how to compile it, and which files
/// belong to it.
#[derive(Debug, Clone)]
pub struct Project {
    pub root_dir: PathBuf,
    /// The configuration file in use, `None` for the built-in default.
    pub config_path: Option<PathBuf>,
    pub compiler_options: Map<String, Value>,
    pub file_names: Vec<PathBuf>,
}

/// Returns whether `path` has one of the [`SOURCE_EXTENSIONS`].
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Compiler options used when the project has no configuration file.
pub fn default_compiler_options() -> Map<String, Value> {
    let options = json!({
        "target": "ESNext",
        "module": "ESNext",
        "moduleResolution": "Bundler",
        "allowJs": true,
        "checkJs": true,
        "strict": true,
        "skipLibCheck": true,
        "esModuleInterop": true,
    });
    match options {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Locates the configuration file for `root_dir`.
///
/// `explicit` is resolved against `root_dir` and used when it exists;
/// otherwise only `root_dir/tsconfig.json` is considered.
pub fn find_config(root_dir: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        let path = root_dir.join(path);
        if path.is_file() {
            return Some(path);
        }
        debug!(path = %path.display(), "configured project file not found");
    }

    let candidate = root_dir.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

impl Project {
    /// A project with no files and default options.
    pub fn empty(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            config_path: None,
            compiler_options: default_compiler_options(),
            file_names: Vec::new(),
        }
    }

    /// Loads the project rooted at `root_dir`, reading `config_path` when
    /// given or falling back to the built-in default.
    ///
    /// # Errors
    ///
    /// Returns an error if `root_dir` is not a directory or the
    /// configuration cannot be read or parsed.
    pub fn load(root_dir: &Path, config_path: Option<&Path>) -> Result<Self, ProjectError> {
        check_root(root_dir)?;

        let Some(config_path) = config_path else {
            let file_names = discover_default(root_dir);
            debug!(count = file_names.len(), "resolved files with default configuration");
            return Ok(Self {
                file_names,
                ..Self::empty(root_dir)
            });
        };

        let config = TsConfig::load(config_path)?;
        let config_dir = config_path.parent().unwrap_or(root_dir);
        let file_names = config.file_names(config_dir)?;

        Ok(Self {
            root_dir: root_dir.to_path_buf(),
            config_path: Some(config_path.to_path_buf()),
            compiler_options: config.compiler_options,
            file_names,
        })
    }

    /// Narrows the project's files with optional include/exclude globs,
    /// matched against paths relative to the root directory.
    ///
    /// A file is kept when it is not excluded and either no include pattern
    /// is given or it matches the include pattern. Order is preserved.
    pub fn files_to_scan(
        &self,
        include: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<Vec<PathBuf>, ProjectError> {
        if include.is_none() && exclude.is_none() {
            return Ok(self.file_names.clone());
        }

        let include = include.map(PathPattern::new).transpose()?;
        let exclude = exclude.map(PathPattern::new).transpose()?;

        let files = self
            .file_names
            .iter()
            .filter(|file| {
                let rel = file.strip_prefix(&self.root_dir).unwrap_or(file);
                if exclude.as_ref().is_some_and(|p| p.is_match(rel)) {
                    return false;
                }
                include.as_ref().map_or(true, |p| p.is_match(rel))
            })
            .cloned()
            .collect();

        Ok(files)
    }
}

fn check_root(root_dir: &Path) -> Result<(), ProjectError> {
    let metadata = std::fs::metadata(root_dir).map_err(|source| ProjectError::Root {
        path: root_dir.to_path_buf(),
        source,
    })?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(ProjectError::Root {
            path: root_dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        })
    }
}

fn discover_default(root_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(root_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| DEFAULT_EXCLUDED_DIRS.contains(&name))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_source_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "export {}\n").unwrap();
    }

    fn names(project: &Project, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(&project.root_dir)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_is_source_file() {
        for ext in SOURCE_EXTENSIONS {
            assert!(is_source_file(Path::new(&format!("file.{}", ext))));
        }
        assert!(is_source_file(Path::new("file.TS")));
        assert!(!is_source_file(Path::new("file.json")));
        assert!(!is_source_file(Path::new("file.vue")));
        assert!(!is_source_file(Path::new("file")));
    }

    #[test]
    fn test_find_config_in_root_only() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("app");
        fs::create_dir_all(&root).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{}").unwrap();

        assert_eq!(find_config(&root, None), None);

        fs::write(root.join(CONFIG_FILE_NAME), "{}").unwrap();
        assert_eq!(find_config(&root, None), Some(root.join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_find_config_explicit_path() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("tsconfig.build.json"), "{}").unwrap();

        assert_eq!(
            find_config(root, Some(Path::new("tsconfig.build.json"))),
            Some(root.join("tsconfig.build.json"))
        );
        assert_eq!(find_config(root, Some(Path::new("missing.json"))), None);
    }

    #[test]
    fn test_default_discovery_skips_vendor_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/b.tsx");
        touch(root, "src/a.ts");
        touch(root, "lib/c.mjs");
        touch(root, "node_modules/x/index.js");
        touch(root, "dist/out.js");
        touch(root, "build/out.js");
        touch(root, "notes.md");

        let project = Project::load(root, None).unwrap();

        assert!(project.config_path.is_none());
        assert_eq!(
            names(&project, &project.file_names),
            vec!["lib/c.mjs", "src/a.ts", "src/b.tsx"]
        );
        assert_eq!(project.compiler_options["allowJs"], Value::Bool(true));
    }

    #[test]
    fn test_load_with_config() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/a.ts");
        touch(root, "test/a.test.ts");
        fs::write(
            root.join(CONFIG_FILE_NAME),
            "{\n  // only sources\n  \"include\": [\"src\"],\n  \"compilerOptions\": { \"strict\": true, },\n}",
        )
        .unwrap();

        let config = find_config(root, None).unwrap();
        let project = Project::load(root, Some(&config)).unwrap();

        assert_eq!(names(&project, &project.file_names), vec!["src/a.ts"]);
        assert_eq!(project.compiler_options["strict"], Value::Bool(true));
    }

    #[test]
    fn test_load_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = Project::load(&dir.path().join("missing"), None).unwrap_err();
        assert!(matches!(err, ProjectError::Root { .. }));

        touch(dir.path(), "file.ts");
        let err = Project::load(&dir.path().join("file.ts"), None).unwrap_err();
        assert!(matches!(err, ProjectError::Root { .. }));
    }

    #[test]
    fn test_load_malformed_config() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join(CONFIG_FILE_NAME), "{ not json").unwrap();

        let err = Project::load(root, Some(&root.join(CONFIG_FILE_NAME))).unwrap_err();
        assert!(matches!(err, ProjectError::Parse { .. }));
    }

    #[test]
    fn test_files_to_scan_include_exclude() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/a.ts");
        touch(root, "src/a.spec.ts");
        touch(root, "src/legacy/old.ts");
        touch(root, "scripts/tool.ts");
        let project = Project::load(root, None).unwrap();

        let files = project.files_to_scan(Some("src"), Some("*.spec.ts")).unwrap();
        assert_eq!(names(&project, &files), vec!["src/a.ts", "src/legacy/old.ts"]);

        let files = project.files_to_scan(None, Some("src/legacy/")).unwrap();
        assert_eq!(
            names(&project, &files),
            vec!["scripts/tool.ts", "src/a.spec.ts", "src/a.ts"]
        );

        let files = project.files_to_scan(Some("**/*.tsx"), None).unwrap();
        assert!(files.is_empty());

        let files = project.files_to_scan(None, Some("**/*")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_files_to_scan_tolerates_malformed_globs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/a.ts");
        let project = Project::load(root, None).unwrap();

        let files = project.files_to_scan(Some("src/["), None).unwrap();
        assert!(files.is_empty());

        let files = project.files_to_scan(None, Some("{src")).unwrap();
        assert_eq!(names(&project, &files), vec!["src/a.ts"]);
    }

    #[test]
    fn test_exclusion_wins_over_inclusion() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/a.ts");
        let project = Project::load(root, None).unwrap();

        let files = project.files_to_scan(Some("src"), Some("src")).unwrap();
        assert!(files.is_empty());
    }
}
