//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path di output e la creazione
//! delle directory di destinazione.

use crate::error::JobError;
use crate::job::JobSpec;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Path di output per un file: stessa struttura relativa sotto `output_dir`,
    /// oppure il file stesso quando non c'è una directory di output (in-place)
    pub fn get_output_path(input_path: &Path, input_base_dir: &Path, output_dir: Option<&Path>) -> PathBuf {
        let Some(output_dir) = output_dir else {
            return input_path.to_path_buf();
        };

        let relative_path = match input_path.strip_prefix(input_base_dir) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            _ => {
                debug!("{} is not under {}, using file name only", input_path.display(), input_base_dir.display());
                input_path.file_name().map(PathBuf::from).unwrap_or_default()
            }
        };

        let result = output_dir.join(relative_path);
        debug!("Resolved output path: {} -> {}", input_path.display(), result.display());
        result
    }

    /// One job per input file
    pub fn job_specs(files: Vec<PathBuf>, input_base_dir: &Path, output_dir: Option<&Path>) -> Vec<JobSpec> {
        files
            .into_iter()
            .map(|source| {
                let dest = Self::get_output_path(&source, input_base_dir, output_dir);
                JobSpec { source, dest }
            })
            .collect()
    }

    /// Crea le directory parent se necessario
    pub async fn ensure_parent_dirs(path: &Path) -> Result<(), JobError> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| JobError::directory(parent, e)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_preserves_structure() {
        let dest = PathResolver::get_output_path(
            Path::new("/src/photos/2023/img.png"),
            Path::new("/src/photos"),
            Some(Path::new("/dest")),
        );
        assert_eq!(dest, PathBuf::from("/dest/2023/img.png"));
    }

    #[test]
    fn test_single_file_input_uses_file_name() {
        let dest = PathResolver::get_output_path(
            Path::new("/src/img.png"),
            Path::new("/src/img.png"),
            Some(Path::new("/dest")),
        );
        assert_eq!(dest, PathBuf::from("/dest/img.png"));
    }

    #[test]
    fn test_in_place_without_output_dir() {
        let dest = PathResolver::get_output_path(Path::new("/src/img.png"), Path::new("/src"), None);
        assert_eq!(dest, PathBuf::from("/src/img.png"));
    }

    #[tokio::test]
    async fn test_ensure_parent_dirs_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.png");

        PathResolver::ensure_parent_dirs(&path).await.unwrap();
        PathResolver::ensure_parent_dirs(&path).await.unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }
}
