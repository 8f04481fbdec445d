// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A UTF-8 file of `|`-separated records, one per line.
//!
//! Reads go straight to disk every time. Writes replace the whole file
//! through a temporary file in the same directory, so readers only ever see
//! the old or the new contents.

use std::io::Write;
use std::path::{Path, PathBuf};

use linkrelay_core::RelayError;

#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-empty lines of the file; a missing file has none.
    pub async fn read_lines(&self) -> Result<Vec<String>, RelayError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.persistence(e)),
        }
    }

    /// Replace the file with `lines`.
    pub async fn write_lines(&self, lines: Vec<String>) -> Result<(), RelayError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &lines))
            .await
            .map_err(|e| RelayError::Internal(format!("write task failed: {e}")))?
            .map_err(|e| self.persistence(e))
    }

    fn persistence(&self, e: std::io::Error) -> RelayError {
        RelayError::Persistence {
            path: self.path.clone(),
            source: Box::new(e),
        }
    }
}

fn write_atomic(path: &Path, lines: &[String]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    for line in lines {
        writeln!(temp, "{line}")?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = RecordFile::new(dir.path().join("absent.txt"));
        assert!(file.read_lines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_then_read_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = RecordFile::new(dir.path().join("nested/records.txt"));
        file.write_lines(vec!["a|1".into(), "".into(), "b|2".into()])
            .await
            .unwrap();
        assert_eq!(file.read_lines().await.unwrap(), vec!["a|1", "b|2"]);
    }

    #[tokio::test]
    async fn unreadable_path_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = RecordFile::new(dir.path());
        assert!(matches!(
            file.read_lines().await,
            Err(RelayError::Persistence { .. })
        ));
    }
}
