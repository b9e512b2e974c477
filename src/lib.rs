//! Taskline: a small dependency-aware task list.
//!
//! Tasks live in a single JSON file. Every operation loads the whole
//! collection, applies a pure scheduler operation, and mutations write the
//! collection back atomically.
//!
//! # Example
//!
//! ```no_run
//! use taskline::{Config, NewTask, Priority, Status, Store};
//!
//! let config = Config::default();
//! let mut store = Store::init(&config).unwrap();
//!
//! let setup = store.create(NewTask::new("Set up project", Priority::High)).unwrap();
//! let mut docs = NewTask::new("Write docs", Priority::Medium);
//! docs.dependencies = vec![setup.id];
//! let docs = store.create(docs).unwrap();
//!
//! // Docs is blocked until setup is done
//! assert_eq!(store.next().unwrap().map(|t| t.id), Some(setup.id));
//!
//! store.set_status(setup.id, Status::Done).unwrap();
//! assert_eq!(store.next().unwrap().map(|t| t.id), Some(docs.id));
//! ```

mod lock;
mod storage;
mod store;
mod types;

pub mod config;
pub mod scheduler;

// Re-export public API
pub use config::Config;
pub use lock::FileLock;
pub use scheduler::{BlockedTask, Blocker, Issue, ListEntry, NewTask};
pub use storage::{DEFAULT_TASKS_FILE, Storage};
pub use store::{Store, StoreError};
pub use types::{Priority, Status, Task, TaskFile, TaskId, ValidationError, parse_id};
