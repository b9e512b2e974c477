//! Core data types for the taskline task graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task identifier. Assigned at creation and never reused.
pub type TaskId = u64;

/// The core unit of work.
///
/// Field order here is the key order in the persisted file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,

    /// Short label
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub status: Status,

    /// Ids of tasks that must be done before this one is actionable
    #[serde(default)]
    pub dependencies: Vec<TaskId>,

    pub priority: Priority,

    /// Implementation notes
    #[serde(default)]
    pub details: String,

    /// How the work will be verified
    #[serde(default)]
    pub test_strategy: String,
}

impl Task {
    /// Create a pending task with no dependencies and empty free-text fields.
    pub fn new(id: TaskId, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            status: Status::Pending,
            dependencies: Vec::new(),
            priority,
            details: String::new(),
            test_strategy: String::new(),
        }
    }

    /// Builder-style helper to set dependencies.
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Builder-style helper to set status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }

    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }
}

/// The persisted document: a single object holding the ordered task list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskFile {
    pub tasks: Vec<Task>,
}

/// Task status states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Done => "done",
        }
    }

    /// Marker shown next to a task in listings.
    pub fn marker(&self) -> &'static str {
        match self {
            Status::Pending => "⏳",
            Status::Done => "✅",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ValidationError::EmptyStatus),
            "pending" => Ok(Status::Pending),
            "done" => Ok(Status::Done),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// Task priority tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Selection rank; lower wins.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Validation errors for user-supplied task fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingId,
    InvalidId(String),
    EmptyStatus,
    UnknownStatus(String),
    UnknownPriority(String),
    EmptyTitle,
    /// The largest id is already in use, so no new id can be assigned.
    IdsExhausted,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingId => write!(f, "please provide a task ID"),
            ValidationError::InvalidId(raw) => write!(f, "'{}' is not a valid task ID", raw),
            ValidationError::EmptyStatus => write!(f, "please provide a status (pending/done)"),
            ValidationError::UnknownStatus(s) => {
                write!(f, "unknown status '{}': expected pending or done", s)
            }
            ValidationError::UnknownPriority(p) => {
                write!(f, "unknown priority '{}': expected high, medium or low", p)
            }
            ValidationError::EmptyTitle => write!(f, "title cannot be empty"),
            ValidationError::IdsExhausted => write!(f, "no task ids left: id {} is already taken", TaskId::MAX),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Parse a task id from user input.
pub fn parse_id(raw: Option<&str>) -> Result<TaskId, ValidationError> {
    let raw = raw.ok_or(ValidationError::MissingId)?;
    raw.trim()
        .parse::<TaskId>()
        .map_err(|_| ValidationError::InvalidId(raw.to_string()))
}
