//! Source path normalization shared by matching, grouping and naming.

use path_clean::PathClean;
use std::path::Path;

/// Forward slashes, no leading `./`, `.` and `..` segments resolved.
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let cleaned = Path::new(&unified).clean();
    let text = cleaned.to_string_lossy().replace('\\', "/");
    match text.as_str() {
        "." => String::new(),
        other => other.trim_start_matches("./").to_string(),
    }
}

/// Final extension of the file name. Dotfiles without a further extension,
/// names without a dot and names ending in a dot have none.
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The path with its final extension removed.
pub fn without_extension(path: &str) -> &str {
    match extension(path) {
        Some(ext) => &path[..path.len() - ext.len() - 1],
        None => path,
    }
}

/// Directory part of a normalized path, empty for top-level files.
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dots() {
        assert_eq!(normalize("./styles/main.css"), "styles/main.css");
        assert_eq!(normalize("styles\\fonts\\a.woff"), "styles/fonts/a.woff");
        assert_eq!(normalize("a/./b/../c.js"), "a/c.js");
        assert_eq!(normalize("."), "");
    }

    #[test]
    fn extension_edge_cases() {
        assert_eq!(extension("img/logo.PNG"), Some("PNG"));
        assert_eq!(extension("archive.tar.gz"), Some("gz"));
        assert_eq!(extension(".eslintrc.json"), Some("json"));
        assert_eq!(extension("LICENSE"), None);
        assert_eq!(extension(".env"), None);
        assert_eq!(extension("notes."), None);
        assert_eq!(extension("v1.2/README"), None);
    }

    #[test]
    fn strips_final_extension() {
        assert_eq!(without_extension("images/logo.png"), "images/logo");
        assert_eq!(without_extension("LICENSE"), "LICENSE");
        assert_eq!(parent("images/logo.png"), "images");
        assert_eq!(parent("logo.png"), "");
    }
}
