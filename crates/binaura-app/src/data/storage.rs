//! Storage layer for JSON persistence
//!
//! Every file lives in the platform config directory under `binaura/`.
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write never leaves a truncated preset or settings file.

use crate::config::app::NAME;
use crate::error::{AppError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Get the application config directory path
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(NAME))
        .ok_or_else(|| AppError::Config(
            "Could not determine config directory. HOME environment variable may not be set.".to_string()
        ))
}

/// Ensure the config directory exists, creating it if necessary
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir()?;
    create_dir_if_needed(&dir)?;
    Ok(dir)
}

/// Get path to a specific data file in the default config directory
pub fn data_path(filename: &str) -> Result<PathBuf> {
    Ok(config_dir()?.join(filename))
}

fn create_dir_if_needed(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| {
        AppError::Config(match e.kind() {
            ErrorKind::PermissionDenied => {
                format!("Permission denied: cannot create directory {:?}", path)
            }
            _ => format!("Failed to create directory {:?}: {}", path, e),
        })
    })
}

/// Read a file; a missing file is `None`
fn read_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(AppError::Config(format!(
            "Permission denied: cannot read {:?}",
            path
        ))),
        Err(e) => Err(AppError::Config(format!("Failed to read {:?}: {}", path, e))),
    }
}

/// Write through a temp file and rename over the target
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|e| {
            let _ = fs::remove_file(&tmp);
            AppError::Config(match e.kind() {
                ErrorKind::PermissionDenied => {
                    format!("Permission denied: cannot write to {:?}", path)
                }
                ErrorKind::ReadOnlyFilesystem => {
                    format!("Cannot write to {:?}: filesystem is read-only", path)
                }
                _ => format!("Failed to write to {:?}: {}", path, e),
            })
        })
}

/// Load data from a JSON file at a specific path
///
/// Returns `None` if the file doesn't exist or is empty.
/// Returns an error if the file exists but can't be read or parsed.
pub fn load_from<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let Some(content) = read_file(path)? else {
        return Ok(None);
    };
    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| AppError::Config(format!("Failed to parse {:?}: {}", path, e)))
}

/// Save data to a JSON file at a specific path
///
/// Creates parent directories if they don't exist.
pub fn save_to<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_if_needed(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(data)
        .map_err(|e| AppError::Config(format!("Failed to serialize data: {}", e)))?;

    write_atomically(path, &content)
}

/// Load data from a JSON file in the config directory
pub fn load<T: DeserializeOwned>(filename: &str) -> Result<Option<T>> {
    load_from(&data_path(filename)?)
}

/// Save data to a JSON file in the config directory
pub fn save<T: Serialize>(filename: &str, data: &T) -> Result<()> {
    save_to(&data_path(filename)?, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::env::temp_dir;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        temp_dir().join(format!(
            "binaura_storage_{}_{}_{}.json",
            std::process::id(),
            id,
            name
        ))
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Pair {
        left: f64,
        right: f64,
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("save_load");
        let data = Pair {
            left: 200.0,
            right: 196.0,
        };

        save_to(&path, &data).unwrap();
        let loaded: Option<Pair> = load_from(&path).unwrap();
        assert_eq!(loaded, Some(data));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let path = temp_path("no_tmp");
        save_to(&path, &Pair { left: 1.0, right: 2.0 }).unwrap();
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        assert!(!PathBuf::from(tmp).exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_save_overwrites() {
        let path = temp_path("overwrite");
        save_to(&path, &Pair { left: 1.0, right: 2.0 }).unwrap();
        save_to(&path, &Pair { left: 3.0, right: 4.0 }).unwrap();
        let loaded: Option<Pair> = load_from(&path).unwrap();
        assert_eq!(loaded, Some(Pair { left: 3.0, right: 4.0 }));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_nonexistent() {
        let loaded: Option<Pair> = load_from(&temp_path("nonexistent")).unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_load_empty_file() {
        let path = temp_path("empty");
        fs::write(&path, "  \n").unwrap();
        let loaded: Option<Pair> = load_from(&path).unwrap();
        assert_eq!(loaded, None);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_invalid_json_names_file() {
        let path = temp_path("invalid");
        fs::write(&path, "not valid json").unwrap();

        let err = load_from::<Pair>(&path).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("invalid"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_creates_parent_dirs() {
        let root = temp_dir().join(format!(
            "binaura_storage_dir_{}_{}",
            std::process::id(),
            TEST_COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        let path = root.join("nested").join("data.json");

        save_to(&path, &Pair { left: 5.0, right: 6.0 }).unwrap();
        assert!(path.exists());

        let _ = fs::remove_dir_all(root);
    }
}
