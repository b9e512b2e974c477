//! High-level store API for taskline.

use crate::config::Config;
use crate::scheduler::{self, Blocker, Issue, NewTask};
use crate::storage::Storage;
use crate::types::{Status, Task, TaskId, ValidationError};
use eyre::{Context, Result};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors that can occur during store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Task file missing, unreadable or unwritable.
    Storage { path: PathBuf, reason: String },
    /// Task file content does not have the expected shape.
    Format { path: PathBuf, reason: String },
    /// No task has this id.
    NotFound(TaskId),
    /// Malformed or missing argument.
    InvalidArgument(ValidationError),
}

impl StoreError {
    pub fn storage(path: &Path, reason: impl fmt::Display) -> Self {
        StoreError::Storage {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn format(path: &Path, reason: impl fmt::Display) -> Self {
        StoreError::Format {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Find the store error inside a report, looking through any context.
    pub fn find(report: &eyre::Report) -> Option<&StoreError> {
        report.chain().find_map(|e| e.downcast_ref::<StoreError>())
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Storage { path, reason } => write!(f, "cannot access {}: {}", path.display(), reason),
            StoreError::Format { path, reason } => write!(f, "malformed task file {}: {}", path.display(), reason),
            StoreError::NotFound(id) => write!(f, "task {} not found", id),
            StoreError::InvalidArgument(e) => write!(f, "invalid argument: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        StoreError::InvalidArgument(e)
    }
}

/// The main taskline store.
///
/// Every operation loads the whole collection; mutations write it back.
pub struct Store {
    storage: Storage,
    lock: bool,
    strict: bool,
}

impl Store {
    /// Create the task file if needed and open it.
    pub fn init(config: &Config) -> Result<Self> {
        let store = Self::with_config(config);
        if store.storage.init()? {
            info!("Created task file {}", store.path().display());
        }
        Ok(store)
    }

    /// Open an existing task file.
    pub fn open(config: &Config) -> Result<Self> {
        let store = Self::with_config(config);
        if !store.storage.exists() {
            return Err(StoreError::storage(store.path(), "no task file found; run 'tl init' first").into());
        }
        Ok(store)
    }

    fn with_config(config: &Config) -> Self {
        Self {
            storage: Storage::new(&config.tasks_file),
            lock: config.lock,
            strict: config.strict,
        }
    }

    /// Location of the task file.
    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    /// Load the collection, rejecting cycles in strict mode.
    pub fn load(&self) -> Result<Vec<Task>> {
        let tasks = self.storage.load()?;

        if self.strict
            && let Some(cycle) = scheduler::find_cycles(&tasks).into_iter().next()
        {
            return Err(StoreError::format(self.path(), Issue::Cycle(cycle)).into());
        }

        Ok(tasks)
    }

    /// All tasks in stored order.
    pub fn list(&self) -> Result<Vec<Task>> {
        self.load()
    }

    /// Get a task by ID.
    pub fn get(&self, id: TaskId) -> Result<Task> {
        let tasks = self.load()?;
        Ok(scheduler::find(&tasks, id)?.clone())
    }

    /// Change a task's status and persist the collection.
    pub fn set_status(&mut self, id: TaskId, status: Status) -> Result<Task> {
        let task = self
            .mutate(|tasks| scheduler::set_status(tasks, id, status).cloned())
            .context("Failed to update status")?;

        info!("Task {} status set to {}", id, status);
        Ok(task)
    }

    /// Add a task and persist the collection.
    pub fn create(&mut self, new: NewTask) -> Result<Task> {
        let task = self
            .mutate(|tasks| scheduler::create(tasks, new).cloned())
            .context("Failed to create task")?;

        info!("Created task {}: {}", task.id, task.title);
        Ok(task)
    }

    /// The task to work on next, if any is actionable.
    pub fn next(&self) -> Result<Option<Task>> {
        let tasks = self.load()?;
        let next = scheduler::next_actionable(&tasks).cloned();
        debug!("Next actionable task: {:?}", next.as_ref().map(|t| t.id));
        Ok(next)
    }

    /// Tasks ready to work on.
    pub fn ready(&self) -> Result<Vec<Task>> {
        let tasks = self.load()?;
        Ok(scheduler::ready(&tasks).into_iter().cloned().collect())
    }

    /// Pending tasks held back by dependencies.
    pub fn blocked(&self) -> Result<Vec<(Task, Vec<Blocker>)>> {
        let tasks = self.load()?;
        Ok(scheduler::blocked(&tasks)
            .into_iter()
            .map(|b| (b.task.clone(), b.blockers))
            .collect())
    }

    /// Structural problems in the dependency graph.
    ///
    /// Reads the file directly so strict mode doesn't hide the cycles it
    /// would reject.
    pub fn validate(&self) -> Result<Vec<Issue>> {
        let tasks = self.storage.load()?;
        Ok(scheduler::validate(&tasks))
    }

    /// Load, apply `op`, and save, holding the lock when enabled.
    fn mutate<T>(&mut self, op: impl FnOnce(&mut Vec<Task>) -> Result<T, StoreError>) -> Result<T> {
        let _guard = if self.lock { Some(self.storage.lock()?) } else { None };

        let mut tasks = self.load()?;
        let out = op(&mut tasks)?;
        self.storage.save(&tasks).context("Failed to persist tasks")?;

        Ok(out)
    }
}
