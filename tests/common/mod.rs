//! Shared test infrastructure for taskline integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use taskline::{Config, Priority, Status, Storage, Store, StoreError, Task, TaskId};
use tempfile::TempDir;

/// Test environment with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config: Config,
    pub store: Store,
}

impl TestEnv {
    /// Create a new test environment with an empty task file.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a test environment after adjusting the default config.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config {
            tasks_file: temp_dir.path().join("tasks").join("tasks.json"),
            ..Config::default()
        };
        adjust(&mut config);
        let store = Store::init(&config).expect("Failed to init store");
        Self {
            temp_dir,
            config,
            store,
        }
    }

    /// Create a test environment holding exactly these tasks.
    pub fn with_tasks(tasks: &[Task]) -> Self {
        let env = Self::new();
        env.seed(tasks);
        env
    }

    /// Overwrite the task file with these tasks.
    pub fn seed(&self, tasks: &[Task]) {
        Storage::new(self.path()).save(tasks).expect("Failed to seed tasks");
    }

    /// Overwrite the task file with raw content.
    pub fn write_raw(&self, content: &str) {
        fs::write(self.path(), content).expect("Failed to write task file");
    }

    pub fn path(&self) -> PathBuf {
        self.config.tasks_file.clone()
    }

    /// Raw bytes of the task file.
    pub fn bytes(&self) -> Vec<u8> {
        fs::read(self.path()).expect("Failed to read task file")
    }

    /// Id of the task `next` picks, if any.
    pub fn next_id(&self) -> Option<TaskId> {
        self.store.next().expect("Failed to pick next task").map(|t| t.id)
    }

    /// Assert that a task is in the ready list.
    pub fn assert_ready(&self, id: TaskId) {
        let ready = self.store.ready().expect("Failed to get ready tasks");
        assert!(
            ready.iter().any(|t| t.id == id),
            "Expected task {} to be ready, but it wasn't. Ready tasks: {:?}",
            id,
            ready.iter().map(|t| t.id).collect::<Vec<_>>()
        );
    }

    /// Assert that a task is NOT in the ready list.
    pub fn assert_not_ready(&self, id: TaskId) {
        let ready = self.store.ready().expect("Failed to get ready tasks");
        assert!(
            !ready.iter().any(|t| t.id == id),
            "Expected task {} to NOT be ready, but it was",
            id
        );
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a task with a predictable title.
pub fn task(id: TaskId, status: Status, priority: Priority, deps: &[TaskId]) -> Task {
    Task::new(id, format!("Task {}", id), priority)
        .with_status(status)
        .with_dependencies(deps.iter().copied())
}

pub fn pending(id: TaskId, priority: Priority, deps: &[TaskId]) -> Task {
    task(id, Status::Pending, priority, deps)
}

pub fn done(id: TaskId) -> Task {
    task(id, Status::Done, Priority::Medium, &[])
}

/// The store error carried by a report, panicking if there is none.
pub fn store_error(report: &eyre::Report) -> &StoreError {
    StoreError::find(report).unwrap_or_else(|| panic!("Expected a StoreError, got: {:?}", report))
}

/// Every ordering of `items`.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }

    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}
