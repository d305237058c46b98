//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the application directory (~/.rag-pipeline/)
pub fn rag_pipeline_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".rag-pipeline"))
}

/// Get the config file path (~/.rag-pipeline/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(rag_pipeline_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensure the parent directory of a file path exists
pub fn ensure_parent_dir(path: &Path) -> AppResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rag_pipeline_dir() {
        let dir = rag_pipeline_dir();
        assert!(dir.is_ok());
        assert!(dir.unwrap().to_string_lossy().contains(".rag-pipeline"));
    }

    #[test]
    fn test_config_path() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().ends_with("config.json"));
    }

    #[test]
    fn test_ensure_parent_dir_creates_nested_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("a").join("b").join("config.json");
        ensure_parent_dir(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(ensure_parent_dir(Path::new("config.json")).is_ok());
    }
}
