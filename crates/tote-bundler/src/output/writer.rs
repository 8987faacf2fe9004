//! Atomic, contained writes of build output.
//!
//! Every path is validated against the output directory before anything is
//! written. Files are staged next to their targets and renamed into place
//! only once every file has been staged; a failure removes the staged files.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, warn};

use crate::{Error, Result};

const STAGING_SUFFIX: &str = ".tote-tmp";

/// Write `(relative path, bytes)` pairs below `dir`.
///
/// With `overwrite == false` an existing target is an error and nothing is
/// written.
pub fn write_files<'a, I>(dir: &Path, files: I, overwrite: bool) -> Result<usize>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let dir = normalize_dir(dir)?;
    fs::create_dir_all(&dir).map_err(|e| {
        Error::WriteFailure(format!(
            "Failed to create output directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let mut operations = Vec::new();
    for (file_name, bytes) in files {
        let target = validate_output_path(&dir, file_name)?;
        if !overwrite && target.exists() {
            return Err(Error::OutputExists(format!(
                "File already exists: '{}'. Use overwrite=true to replace.",
                target.display()
            )));
        }
        operations.push((target, bytes));
    }

    write_files_atomic(&operations)?;
    debug!(dir = %dir.display(), files = operations.len(), "output written");
    Ok(operations.len())
}

fn normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }
    let cwd = std::env::current_dir().map_err(|e| {
        Error::InvalidOutputPath(format!("Failed to get current directory: {}", e))
    })?;
    Ok(cwd.join(cleaned).clean())
}

/// Resolve `file_name` below `base_dir`, rejecting anything that escapes it.
pub(crate) fn validate_output_path(base_dir: &Path, file_name: &str) -> Result<PathBuf> {
    if file_name.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "Filename contains null byte".to_string(),
        ));
    }
    if file_name.is_empty() || Path::new(file_name).is_absolute() {
        return Err(Error::InvalidOutputPath(format!(
            "'{}' is not a relative file path",
            file_name
        )));
    }

    #[cfg(target_os = "windows")]
    {
        let stem = file_name
            .rsplit(['/', '\\'])
            .next()
            .and_then(|name| name.split('.').next())
            .unwrap_or_default()
            .to_uppercase();
        let device_names = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        if device_names.contains(&stem.as_str()) {
            return Err(Error::InvalidOutputPath(format!(
                "Filename is a reserved device name: {}",
                file_name
            )));
        }
    }

    let full_path = base_dir.join(Path::new(file_name).clean()).clean();
    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "Path '{}' escapes output directory '{}' (resolved to '{}')",
            file_name,
            base_dir.display(),
            full_path.display()
        )));
    }
    Ok(full_path)
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(STAGING_SUFFIX);
    target.with_file_name(name)
}

fn write_files_atomic(operations: &[(PathBuf, &[u8])]) -> Result<()> {
    let mut staged = Vec::new();

    for (target, bytes) in operations {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                cleanup_staged(&staged);
                Error::WriteFailure(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp = staging_path(target);
        fs::write(&temp, bytes).map_err(|e| {
            cleanup_staged(&staged);
            Error::WriteFailure(format!(
                "Failed to write temporary file '{}': {}",
                temp.display(),
                e
            ))
        })?;
        staged.push((temp, target.clone()));
    }

    for (temp, target) in &staged {
        fs::rename(temp, target).map_err(|e| {
            cleanup_staged(&staged);
            Error::WriteFailure(format!(
                "Failed to rename '{}' to '{}': {}",
                temp.display(),
                target.display(),
                e
            ))
        })?;
    }
    Ok(())
}

fn cleanup_staged(staged: &[(PathBuf, PathBuf)]) {
    for (temp, _) in staged {
        if temp.exists() {
            if let Err(e) = fs::remove_file(temp) {
                warn!(path = %temp.display(), error = %e, "failed to remove staged file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_output_path_accepts_nested_and_dot_paths() {
        let base = Path::new("/tmp/output");
        assert_eq!(
            validate_output_path(base, "assets/app.js").unwrap(),
            Path::new("/tmp/output/assets/app.js")
        );
        assert_eq!(
            validate_output_path(base, "./index.html").unwrap(),
            Path::new("/tmp/output/index.html")
        );
    }

    #[test]
    fn validate_output_path_rejects_escapes() {
        let base = Path::new("/tmp/output");
        for bad in ["../etc/passwd", "safe/../../../../etc/passwd", "/etc/passwd", "", "a\0b"] {
            assert!(
                matches!(validate_output_path(base, bad), Err(Error::InvalidOutputPath(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn staging_keeps_full_file_name() {
        assert_eq!(
            staging_path(Path::new("/out/main.js")),
            Path::new("/out/main.js.tote-tmp")
        );
    }

    #[test]
    fn writes_files_and_respects_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<(&str, &[u8])> = vec![("main.js", &b"a"[..]), ("img/logo.png", &b"\x89PNG"[..])];
        assert_eq!(write_files(dir.path(), files.clone(), false).unwrap(), 2);
        assert_eq!(fs::read(dir.path().join("img/logo.png")).unwrap(), b"\x89PNG");

        let err = write_files(dir.path(), files.clone(), false).unwrap_err();
        assert!(matches!(err, Error::OutputExists(_)));
        assert!(write_files(dir.path(), files, true).is_ok());
        assert!(!dir.path().join("main.js.tote-tmp").exists());
    }
}
