//! Pure operations over an in-memory task collection.
//!
//! Nothing here touches storage. The [`Store`](crate::Store) loads a
//! collection, calls into this module, and persists the result for mutations.

use crate::store::StoreError;
use crate::types::{Priority, Status, Task, TaskId, ValidationError};
use log::warn;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Marker used when a task has no dependencies.
pub const NO_DEPENDENCIES: &str = "none";

/// A task annotated for display in a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry<'a> {
    pub task: &'a Task,
    pub marker: &'static str,
    pub dependencies: String,
}

/// Why a pending task is not actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    /// The dependency exists but is not done yet.
    NotDone(TaskId),
    /// No task has the dependency's id.
    Missing(TaskId),
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocker::NotDone(id) => write!(f, "{} (not done)", id),
            Blocker::Missing(id) => write!(f, "{} (missing)", id),
        }
    }
}

/// A pending task together with the dependencies holding it back.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockedTask<'a> {
    pub task: &'a Task,
    pub blockers: Vec<Blocker>,
}

/// A structural problem in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    DuplicateId(TaskId),
    SelfDependency(TaskId),
    DanglingDependency { task: TaskId, dependency: TaskId },
    /// Ids along the cycle; the first id is repeated at the end.
    Cycle(Vec<TaskId>),
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateId(id) => write!(f, "task id {} is used more than once", id),
            Issue::SelfDependency(id) => write!(f, "task {} depends on itself", id),
            Issue::DanglingDependency { task, dependency } => {
                write!(f, "task {} depends on missing task {}", task, dependency)
            }
            Issue::Cycle(path) => write!(f, "dependency cycle: {}", join_ids(path, " -> ")),
        }
    }
}

/// Fields for a task about to be created.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    pub description: String,
    pub details: String,
    pub test_strategy: String,
    pub dependencies: Vec<TaskId>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            priority,
            description: String::new(),
            details: String::new(),
            test_strategy: String::new(),
            dependencies: Vec::new(),
        }
    }
}

/// Render dependencies as a comma-joined list, or [`NO_DEPENDENCIES`].
pub fn format_dependencies(dependencies: &[TaskId]) -> String {
    if dependencies.is_empty() {
        NO_DEPENDENCIES.to_string()
    } else {
        join_ids(dependencies, ", ")
    }
}

fn join_ids(ids: &[TaskId], sep: &str) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(sep)
}

/// The collection in stored order, annotated for display.
pub fn list(tasks: &[Task]) -> Vec<ListEntry<'_>> {
    tasks
        .iter()
        .map(|task| ListEntry {
            task,
            marker: task.status.marker(),
            dependencies: format_dependencies(&task.dependencies),
        })
        .collect()
}

/// Look up a task by id.
pub fn find(tasks: &[Task], id: TaskId) -> Result<&Task, StoreError> {
    tasks.iter().find(|t| t.id == id).ok_or(StoreError::NotFound(id))
}

/// Set a task's status in place.
///
/// No dependency consistency is enforced in either direction.
pub fn set_status(tasks: &mut [Task], id: TaskId, status: Status) -> Result<&Task, StoreError> {
    let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(StoreError::NotFound(id))?;
    task.status = status;
    Ok(task)
}

/// Index by id. The first occurrence wins, matching [`find`].
fn index(tasks: &[Task]) -> HashMap<TaskId, &Task> {
    let mut by_id = HashMap::with_capacity(tasks.len());
    for task in tasks {
        by_id.entry(task.id).or_insert(task);
    }
    by_id
}

fn blockers(task: &Task, by_id: &HashMap<TaskId, &Task>) -> Vec<Blocker> {
    let mut seen = HashSet::new();
    task.dependencies
        .iter()
        .filter(|dep| seen.insert(**dep))
        .filter_map(|&dep| match by_id.get(&dep) {
            Some(t) if t.is_done() => None,
            Some(_) => Some(Blocker::NotDone(dep)),
            None => Some(Blocker::Missing(dep)),
        })
        .collect()
}

/// Every actionable task, in stored order.
pub fn ready(tasks: &[Task]) -> Vec<&Task> {
    let by_id = index(tasks);
    tasks
        .iter()
        .filter(|t| t.is_pending())
        .filter(|t| {
            let blocked_by = blockers(t, &by_id);
            for blocker in &blocked_by {
                if let Blocker::Missing(dep) = blocker {
                    warn!("Task {} depends on missing task {}", t.id, dep);
                }
            }
            blocked_by.is_empty()
        })
        .collect()
}

/// Every pending task that is not actionable, with what holds it back.
pub fn blocked(tasks: &[Task]) -> Vec<BlockedTask<'_>> {
    let by_id = index(tasks);
    tasks
        .iter()
        .filter(|t| t.is_pending())
        .filter_map(|task| {
            let blockers = blockers(task, &by_id);
            (!blockers.is_empty()).then_some(BlockedTask { task, blockers })
        })
        .collect()
}

/// Whether `candidate` should replace `current` as the next task.
///
/// High beats everything else, medium beats low, and within a tier the
/// lower id wins. This is a strict total order on distinct ids.
pub fn outranks(candidate: &Task, current: &Task) -> bool {
    (candidate.priority.rank(), candidate.id) < (current.priority.rank(), current.id)
}

/// Pick the next task to work on, or `None` when nothing is actionable.
pub fn next_actionable(tasks: &[Task]) -> Option<&Task> {
    ready(tasks)
        .into_iter()
        .reduce(|best, task| if outranks(task, best) { task } else { best })
}

/// Smallest id not yet used that is greater than every existing id.
///
/// `None` once an existing task holds `TaskId::MAX`.
pub fn next_id(tasks: &[Task]) -> Option<TaskId> {
    match tasks.iter().map(|t| t.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

/// Append a new pending task.
///
/// Dependencies must name existing tasks.
pub fn create(tasks: &mut Vec<Task>, new: NewTask) -> Result<&Task, StoreError> {
    if new.title.trim().is_empty() {
        return Err(StoreError::InvalidArgument(ValidationError::EmptyTitle));
    }
    if let Some(&missing) = new.dependencies.iter().find(|dep| !tasks.iter().any(|t| t.id == **dep)) {
        return Err(StoreError::NotFound(missing));
    }

    let id = next_id(tasks).ok_or(StoreError::InvalidArgument(ValidationError::IdsExhausted))?;

    let task = Task {
        id,
        title: new.title,
        description: new.description,
        status: Status::Pending,
        dependencies: new.dependencies,
        priority: new.priority,
        details: new.details,
        test_strategy: new.test_strategy,
    };
    tasks.push(task);

    Ok(&tasks[tasks.len() - 1])
}

/// Check the graph for duplicate ids, self references, dangling references
/// and cycles. Problems are reported, never repaired.
pub fn validate(tasks: &[Task]) -> Vec<Issue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.id) {
            issues.push(Issue::DuplicateId(task.id));
        }
    }

    for task in tasks {
        let mut deps_seen = HashSet::new();
        for &dep in &task.dependencies {
            if !deps_seen.insert(dep) {
                continue;
            }
            if dep == task.id {
                issues.push(Issue::SelfDependency(task.id));
            } else if !seen.contains(&dep) {
                issues.push(Issue::DanglingDependency {
                    task: task.id,
                    dependency: dep,
                });
            }
        }
    }

    issues.extend(find_cycles(tasks).into_iter().map(Issue::Cycle));
    issues
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Dependency cycles of length two or more, each reported once.
pub fn find_cycles(tasks: &[Task]) -> Vec<Vec<TaskId>> {
    let by_id = index(tasks);
    let mut marks = HashMap::new();
    let mut cycles = Vec::new();

    for task in tasks {
        if !marks.contains_key(&task.id) {
            let mut path = Vec::new();
            visit(task.id, &by_id, &mut marks, &mut path, &mut cycles);
        }
    }

    cycles
}

fn visit(
    id: TaskId,
    by_id: &HashMap<TaskId, &Task>,
    marks: &mut HashMap<TaskId, Mark>,
    path: &mut Vec<TaskId>,
    cycles: &mut Vec<Vec<TaskId>>,
) {
    marks.insert(id, Mark::Visiting);
    path.push(id);

    if let Some(task) = by_id.get(&id) {
        let mut deps_seen = HashSet::new();
        for &dep in &task.dependencies {
            // Self references and dangling ids are reported separately
            if dep == id || !by_id.contains_key(&dep) || !deps_seen.insert(dep) {
                continue;
            }
            match marks.get(&dep).copied() {
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|&p| p == dep).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(dep);
                    cycles.push(cycle);
                }
                Some(Mark::Done) => {}
                None => visit(dep, by_id, marks, path, cycles),
            }
        }
    }

    path.pop();
    marks.insert(id, Mark::Done);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: TaskId, status: Status, priority: Priority, deps: &[TaskId]) -> Task {
        Task::new(id, format!("Task {}", id), priority)
            .with_status(status)
            .with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_format_dependencies() {
        assert_eq!(format_dependencies(&[]), "none");
        assert_eq!(format_dependencies(&[3]), "3");
        assert_eq!(format_dependencies(&[1, 2, 5]), "1, 2, 5");
    }

    #[test]
    fn test_list_keeps_order_and_annotates() {
        let tasks = vec![
            task(2, Status::Done, Priority::Low, &[]),
            task(1, Status::Pending, Priority::High, &[2]),
        ];

        let entries = list(&tasks);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].task.id, 2);
        assert_eq!(entries[0].marker, "✅");
        assert_eq!(entries[0].dependencies, "none");
        assert_eq!(entries[1].task.id, 1);
        assert_eq!(entries[1].marker, "⏳");
        assert_eq!(entries[1].dependencies, "2");
    }

    #[test]
    fn test_find_and_not_found() {
        let tasks = vec![task(1, Status::Pending, Priority::Low, &[])];
        assert_eq!(find(&tasks, 1).unwrap().id, 1);
        assert_eq!(find(&tasks, 2).unwrap_err(), StoreError::NotFound(2));
    }

    #[test]
    fn test_set_status_both_directions() {
        let mut tasks = vec![task(1, Status::Pending, Priority::Low, &[])];

        assert!(set_status(&mut tasks, 1, Status::Done).unwrap().is_done());
        assert!(set_status(&mut tasks, 1, Status::Pending).unwrap().is_pending());
        assert_eq!(set_status(&mut tasks, 9, Status::Done).unwrap_err(), StoreError::NotFound(9));
    }

    #[test]
    fn test_duplicate_dependency_is_inert() {
        let tasks = vec![
            task(1, Status::Done, Priority::Low, &[]),
            task(2, Status::Pending, Priority::Low, &[1, 1]),
        ];
        let ids: Vec<_> = ready(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);

        let tasks = vec![
            task(1, Status::Pending, Priority::Low, &[]),
            task(2, Status::Pending, Priority::Low, &[1, 1]),
        ];
        let blocked = blocked(&tasks);
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].blockers, vec![Blocker::NotDone(1)]);
    }

    #[test]
    fn test_outranks_tiers() {
        let high = task(9, Status::Pending, Priority::High, &[]);
        let medium = task(1, Status::Pending, Priority::Medium, &[]);
        let low = task(2, Status::Pending, Priority::Low, &[]);

        assert!(outranks(&high, &medium));
        assert!(outranks(&high, &low));
        assert!(outranks(&medium, &low));
        assert!(!outranks(&low, &medium));
        assert!(!outranks(&medium, &high));
    }

    #[test]
    fn test_outranks_lower_id_within_tier() {
        let a = task(2, Status::Pending, Priority::Medium, &[]);
        let b = task(7, Status::Pending, Priority::Medium, &[]);
        assert!(outranks(&a, &b));
        assert!(!outranks(&b, &a));
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id(&[]), Some(1));
        let tasks = vec![
            task(4, Status::Pending, Priority::Low, &[]),
            task(2, Status::Pending, Priority::Low, &[]),
        ];
        assert_eq!(next_id(&tasks), Some(5));
    }

    #[test]
    fn test_create_fails_when_ids_exhausted() {
        let mut tasks = vec![task(TaskId::MAX, Status::Done, Priority::Low, &[])];
        assert_eq!(next_id(&tasks), None);

        let err = create(&mut tasks, NewTask::new("One too many", Priority::Low)).unwrap_err();
        assert_eq!(err, StoreError::InvalidArgument(ValidationError::IdsExhausted));
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_create_assigns_next_id() {
        let mut tasks = vec![task(3, Status::Done, Priority::Low, &[])];
        let mut new = NewTask::new("Write docs", Priority::High);
        new.dependencies = vec![3];

        let created = create(&mut tasks, new).unwrap();
        assert_eq!(created.id, 4);
        assert_eq!(created.status, Status::Pending);
        assert_eq!(created.dependencies, vec![3]);
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_create_rejects_empty_title_and_unknown_dependency() {
        let mut tasks = vec![task(1, Status::Done, Priority::Low, &[])];

        let err = create(&mut tasks, NewTask::new("  ", Priority::Low)).unwrap_err();
        assert_eq!(err, StoreError::InvalidArgument(ValidationError::EmptyTitle));

        let mut new = NewTask::new("Orphan", Priority::Low);
        new.dependencies = vec![1, 8];
        assert_eq!(create(&mut tasks, new).unwrap_err(), StoreError::NotFound(8));
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_validate_clean_graph() {
        let tasks = vec![
            task(1, Status::Done, Priority::Low, &[]),
            task(2, Status::Pending, Priority::Low, &[1]),
            task(3, Status::Pending, Priority::Low, &[1, 2]),
        ];
        assert!(validate(&tasks).is_empty());
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let tasks = vec![
            task(1, Status::Pending, Priority::Low, &[1]),
            task(2, Status::Pending, Priority::Low, &[42]),
            task(2, Status::Pending, Priority::Low, &[]),
        ];

        let issues = validate(&tasks);
        assert!(issues.contains(&Issue::DuplicateId(2)));
        assert!(issues.contains(&Issue::SelfDependency(1)));
        assert!(issues.contains(&Issue::DanglingDependency {
            task: 2,
            dependency: 42
        }));
        assert!(!issues.iter().any(|i| matches!(i, Issue::Cycle(_))));
    }

    #[test]
    fn test_find_cycles() {
        let tasks = vec![
            task(1, Status::Pending, Priority::Low, &[3]),
            task(2, Status::Pending, Priority::Low, &[1]),
            task(3, Status::Pending, Priority::Low, &[2]),
            task(4, Status::Pending, Priority::Low, &[1]),
        ];

        let cycles = find_cycles(&tasks);
        assert_eq!(cycles, vec![vec![1, 3, 2, 1]]);
        assert_eq!(
            Issue::Cycle(cycles[0].clone()).to_string(),
            "dependency cycle: 1 -> 3 -> 2 -> 1"
        );
    }

    #[test]
    fn test_no_cycle_in_diamond() {
        let tasks = vec![
            task(1, Status::Pending, Priority::Low, &[]),
            task(2, Status::Pending, Priority::Low, &[1]),
            task(3, Status::Pending, Priority::Low, &[1]),
            task(4, Status::Pending, Priority::Low, &[2, 3]),
        ];
        assert!(find_cycles(&tasks).is_empty());
    }
}
