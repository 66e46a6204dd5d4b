//! Resolves which installed package a declaration comes from.

/// Directory name under which installed third-party packages live.
pub const VENDOR_DIR: &str = "node_modules";

/// Returns the package that owns `definition_path`, if it lies under
/// `node_modules`.
///
/// Only the outermost `node_modules` segment is considered, so a
/// dependency nested inside another package resolves to the outer one.
/// Scoped packages (`@scope/name`) yield both segments.
///
/// # Example
///
/// ```
/// use deprecation_scanner::origin::resolve_origin;
///
/// assert_eq!(
///     resolve_origin("/path/to/node_modules/@types/node/index.d.ts").as_deref(),
///     Some("@types/node")
/// );
/// assert_eq!(resolve_origin("/path/to/src/utils.ts"), None);
/// ```
pub fn resolve_origin(definition_path: &str) -> Option<String> {
    let normalized = definition_path.replace('\\', "/");
    let mut segments = normalized
        .split('/')
        .skip_while(|segment| *segment != VENDOR_DIR)
        .skip(1);

    let first = segments.next().filter(|s| !s.is_empty())?;

    if first.starts_with('@') {
        match segments.next().filter(|s| !s.is_empty()) {
            Some(name) => Some(format!("{}/{}", first, name)),
            None => Some(first.to_string()),
        }
    } else {
        Some(first.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_package() {
        assert_eq!(
            resolve_origin("/path/to/node_modules/lodash/index.js").as_deref(),
            Some("lodash")
        );
    }

    #[test]
    fn test_scoped_package() {
        assert_eq!(
            resolve_origin("/path/to/node_modules/@types/node/index.d.ts").as_deref(),
            Some("@types/node")
        );
    }

    #[test]
    fn test_nested_node_modules_uses_outermost() {
        assert_eq!(
            resolve_origin("/path/node_modules/pkg-a/node_modules/pkg-b/index.js").as_deref(),
            Some("pkg-a")
        );
        assert_eq!(
            resolve_origin("/p/node_modules/@s/a/node_modules/@t/b/x.d.ts").as_deref(),
            Some("@s/a")
        );
    }

    #[test]
    fn test_no_vendor_dir() {
        assert_eq!(resolve_origin("/path/to/src/utils.ts"), None);
        assert_eq!(resolve_origin(""), None);
    }

    #[test]
    fn test_marker_must_be_whole_segment() {
        assert_eq!(resolve_origin("/path/my_node_modules/pkg/index.js"), None);
    }

    #[test]
    fn test_relative_and_windows_paths() {
        assert_eq!(
            resolve_origin("node_modules/moment/moment.d.ts").as_deref(),
            Some("moment")
        );
        assert_eq!(
            resolve_origin(r"C:\repo\node_modules\@angular\core\index.d.ts").as_deref(),
            Some("@angular/core")
        );
    }

    #[test]
    fn test_marker_without_package() {
        assert_eq!(resolve_origin("/repo/node_modules"), None);
        assert_eq!(resolve_origin("/repo/node_modules/"), None);
        assert_eq!(
            resolve_origin("/repo/node_modules/@scope").as_deref(),
            Some("@scope")
        );
    }
}
