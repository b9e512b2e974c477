//! Storage layer for taskline: a single JSON document replaced atomically.

use crate::lock::FileLock;
use crate::store::StoreError;
use crate::types::{Task, TaskFile, TaskId};
use eyre::{Context, Result};
use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default task file, relative to the working directory.
pub const DEFAULT_TASKS_FILE: &str = "tasks/tasks.json";

/// Suffix of the sidecar file used for the advisory lock.
const LOCK_SUFFIX: &str = ".lock";

/// Borrowed view of [`TaskFile`] so saving doesn't clone the collection.
#[derive(Serialize)]
struct TaskFileRef<'a> {
    tasks: &'a [Task],
}

/// Storage handle for reading/writing the task file.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the task file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create the parent directory and an empty task file.
    ///
    /// Returns `false` without touching anything when the file already exists.
    pub fn init(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }

        let dir = self.dir();
        fs::create_dir_all(&dir).map_err(|e| StoreError::storage(&dir, e))?;
        self.save(&[]).context("Failed to write empty task file")?;

        Ok(true)
    }

    /// Read and parse the whole collection, preserving stored order.
    pub fn load(&self) -> Result<Vec<Task>> {
        debug!("Loading tasks from {}", self.path.display());

        let content = fs::read(&self.path).map_err(|e| StoreError::storage(&self.path, e))?;
        let file: TaskFile = serde_json::from_slice(&content).map_err(|e| StoreError::format(&self.path, e))?;

        if let Some(id) = first_duplicate(&file.tasks) {
            return Err(StoreError::format(&self.path, format!("duplicate task id {}", id)).into());
        }

        debug!("Loaded {} task(s)", file.tasks.len());
        Ok(file.tasks)
    }

    /// Replace the whole collection.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the target, so readers see either the old or the new content. An
    /// existing file keeps its permissions.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        debug!("Saving {} task(s) to {}", tasks.len(), self.path.display());

        let json = serde_json::to_string_pretty(&TaskFileRef { tasks }).context("Failed to serialize tasks")?;

        let dir = self.dir();
        let mut tmp = tempfile::Builder::new()
            .prefix(".tasks-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| StoreError::storage(&dir, e))?;

        if let Ok(metadata) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(|e| StoreError::storage(tmp.path(), e))?;
        }

        tmp.write_all(json.as_bytes())
            .map_err(|e| StoreError::storage(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::storage(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::storage(&self.path, e.error))?;

        Ok(())
    }

    /// Take the exclusive advisory lock guarding load-mutate-save.
    pub fn lock(&self) -> Result<FileLock> {
        let lock_path = self.lock_path();
        FileLock::acquire(&lock_path).map_err(|e| StoreError::storage(&lock_path, e).into())
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tasks.json".into());
        name.push(LOCK_SUFFIX);
        self.path.with_file_name(name)
    }

    /// Directory holding the task file; "." for a bare file name.
    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

fn first_duplicate(tasks: &[Task]) -> Option<TaskId> {
    let mut seen = HashSet::new();
    tasks.iter().map(|t| t.id).find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, Status};
    use tempfile::TempDir;

    fn setup_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path().join("tasks").join("tasks.json"));
        storage.init().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_init_creates_empty_file() {
        let (_temp_dir, storage) = setup_test_storage();

        assert!(storage.exists());
        assert_eq!(fs::read_to_string(storage.path()).unwrap(), "{\n  \"tasks\": []\n}");
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let (_temp_dir, storage) = setup_test_storage();
        storage.save(&[Task::new(1, "Keep me", Priority::Low)]).unwrap();

        assert!(!storage.init().unwrap());
        assert_eq!(storage.load().unwrap().len(), 1);
    }

    #[test]
    fn test_save_and_load_preserves_order() {
        let (_temp_dir, storage) = setup_test_storage();

        let tasks = vec![
            Task::new(3, "Third", Priority::Low),
            Task::new(1, "First", Priority::High).with_status(Status::Done),
            Task::new(2, "Second", Priority::Medium).with_dependencies([1, 3]),
        ];
        storage.save(&tasks).unwrap();

        let loaded = storage.load().unwrap();
        assert_eq!(loaded, tasks);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let (temp_dir, storage) = setup_test_storage();
        storage.save(&[Task::new(1, "Only", Priority::Medium)]).unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path().join("tasks"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["tasks.json".to_string()]);
    }

    #[test]
    fn test_lock_path_is_sidecar() {
        let storage = Storage::new("/data/tasks/tasks.json");
        assert_eq!(storage.lock_path(), PathBuf::from("/data/tasks/tasks.json.lock"));
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let storage = Storage::new("tasks.json");
        assert_eq!(storage.dir(), PathBuf::from("."));
    }
}
