use serde::Serialize;

use crate::models::{Filter, Task, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Counts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

/// The in-memory task collection plus the active display filter. Owned by the
/// application entry point and passed by reference; all operations are
/// synchronous and run to completion (no interior mutability, no locking).
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    filter: Filter,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the store from a loaded record. Insertion order of `tasks` is
    /// preserved as the display order.
    pub fn from_parts(tasks: Vec<Task>, filter: Filter) -> Self {
        Self { tasks, filter }
    }

    /// Validates and appends a new task at the end of the sequence. On
    /// validation failure the collection is unchanged.
    pub fn add(&mut self, text: &str) -> Result<&Task, ValidationError> {
        let task = Task::new(text)?;
        self.tasks.push(task);
        Ok(self.tasks.last().expect("just pushed"))
    }

    /// Removes the task with the given id. Absent ids are a no-op returning
    /// false.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() != before
    }

    /// Flips completion on the task with the given id; `None` for absent ids,
    /// with no side effects.
    pub fn toggle(&mut self, id: &str) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.toggle();
        Some(task)
    }

    /// Replaces the text of the task with the given id. Absent id or failing
    /// validation both return `None` and leave the store unchanged.
    pub fn edit(&mut self, id: &str, text: &str) -> Option<&Task> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        match task.set_text(text) {
            Ok(()) => Some(task),
            Err(error) => {
                log::debug!("edit rejected for task {id}: {error}");
                None
            }
        }
    }

    /// Cloned subset in insertion order; callers cannot mutate store state
    /// through the result.
    pub fn list(&self, filter: Filter) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn completed_ids(&self) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|task| task.completed)
            .map(|task| task.id.clone())
            .collect()
    }

    pub fn counts(&self) -> Counts {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        Counts {
            total,
            active: total - completed,
            completed,
        }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }
}
