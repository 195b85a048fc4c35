//! Durable pending-submission queue.
//!
//! The queue is a plain text artifact, one candidate identifier per line.
//! Every mutation rewrites the whole remaining set, so the file is always
//! consistent with "these identifiers have not yet reached a terminal
//! outcome" — a crash between submissions never drops or duplicates ids.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to read queue file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write queue file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Line-oriented set of pending candidate identifiers.
///
/// Exclusive to one running batch driver; no locking.
#[derive(Debug, Clone)]
pub struct PendingQueue {
    path: PathBuf,
}

impl PendingQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the pending identifiers. A missing or empty artifact is an
    /// empty queue, not an error.
    pub fn load(&self) -> Result<Vec<String>, QueueError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| QueueError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Replace the artifact with exactly `ids`, truncating prior content.
    pub fn write_all(&self, ids: &[String]) -> Result<(), QueueError> {
        let mut contents = ids.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        fs::write(&self.path, contents).map_err(|source| QueueError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Remove `id` and persist the remaining set immediately.
    ///
    /// Idempotent: an absent id leaves the artifact untouched.
    pub fn remove(&self, id: &str) -> Result<(), QueueError> {
        let ids = self.load()?;
        if !ids.iter().any(|pending| pending == id) {
            return Ok(());
        }
        let remaining: Vec<String> = ids.into_iter().filter(|pending| pending != id).collect();
        self.write_all(&remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn queue_in(dir: &TempDir) -> PendingQueue {
        PendingQueue::new(dir.path().join("alpha_ids.txt"))
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_in(&tmp);
        assert!(queue.load().unwrap().is_empty());
    }

    #[test]
    fn write_all_then_load_roundtrips_in_order() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_in(&tmp);
        let ids = vec!["a1".to_string(), "b2".to_string(), "c3".to_string()];
        queue.write_all(&ids).unwrap();
        assert_eq!(queue.load().unwrap(), ids);
    }

    #[test]
    fn write_all_truncates_prior_content() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_in(&tmp);
        queue
            .write_all(&["old1".into(), "old2".into(), "old3".into()])
            .unwrap();
        queue.write_all(&["new".into()]).unwrap();
        assert_eq!(queue.load().unwrap(), vec!["new".to_string()]);
    }

    #[test]
    fn load_skips_blank_lines_and_trims() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_in(&tmp);
        fs::write(queue.path(), "a1\n\n  b2  \n\n").unwrap();
        assert_eq!(
            queue.load().unwrap(),
            vec!["a1".to_string(), "b2".to_string()]
        );
    }

    #[test]
    fn remove_persists_immediately() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_in(&tmp);
        queue
            .write_all(&["a1".into(), "b2".into(), "c3".into()])
            .unwrap();

        queue.remove("b2").unwrap();

        // the artifact itself must already reflect the removal
        let on_disk = fs::read_to_string(queue.path()).unwrap();
        assert_eq!(on_disk, "a1\nc3\n");
    }

    #[test]
    fn remove_is_idempotent_for_absent_ids() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_in(&tmp);
        queue.write_all(&["a1".into(), "b2".into()]).unwrap();
        let before = fs::read_to_string(queue.path()).unwrap();

        queue.remove("nope").unwrap();
        queue.remove("nope").unwrap();

        assert_eq!(fs::read_to_string(queue.path()).unwrap(), before);
    }

    #[test]
    fn remove_on_missing_file_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_in(&tmp);
        queue.remove("anything").unwrap();
        assert!(!queue.path().exists());
    }

    #[test]
    fn removing_last_id_leaves_an_empty_artifact() {
        let tmp = TempDir::new().unwrap();
        let queue = queue_in(&tmp);
        queue.write_all(&["only".into()]).unwrap();
        queue.remove("only").unwrap();
        assert_eq!(fs::read_to_string(queue.path()).unwrap(), "");
        assert!(queue.load().unwrap().is_empty());
    }
}
