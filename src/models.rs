use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_TEXT_CHARS: usize = 500;
pub const STORE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty,
    TooLong { chars: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Empty => write!(f, "task text is empty"),
            ValidationError::TooLong { chars } => {
                write!(f, "task text is {chars} characters (limit {MAX_TEXT_CHARS})")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Trims the input and enforces the text invariant: non-empty and at most
/// `MAX_TEXT_CHARS` characters after trimming.
pub fn validate_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(ValidationError::TooLong { chars });
    }
    Ok(trimmed)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        let trimmed = validate_text(text)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            text: trimmed.to_string(),
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
        self.updated_at = Utc::now();
    }

    /// Replaces the text after re-validating; a failing input leaves the task
    /// untouched.
    pub fn set_text(&mut self, text: &str) -> Result<(), ValidationError> {
        let trimmed = validate_text(text)?;
        self.text = trimmed.to_string();
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Boundary parser for untyped frontend input; unknown values fall back
    /// to `All`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "active" => Filter::Active,
            "completed" => Filter::Completed,
            _ => Filter::All,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !task.completed,
            Filter::Completed => task.completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersistedSettings {
    pub current_filter: Filter,
}

/// The full record written to the durable slot. Decoding is strict: unknown
/// fields, a wrong version, duplicate ids, or a task violating the text
/// invariant all fail closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersistedState {
    pub tasks: Vec<Task>,
    pub version: String,
    pub last_saved: DateTime<Utc>,
    pub settings: PersistedSettings,
}

impl PersistedState {
    pub fn new(tasks: Vec<Task>, current_filter: Filter) -> Self {
        Self {
            tasks,
            version: STORE_VERSION.to_string(),
            last_saved: Utc::now(),
            settings: PersistedSettings { current_filter },
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.version != STORE_VERSION {
            return Err(format!(
                "unsupported version {:?} (expected {STORE_VERSION:?})",
                self.version
            ));
        }
        for (index, task) in self.tasks.iter().enumerate() {
            if task.text.trim().is_empty() || task.text.chars().count() > MAX_TEXT_CHARS {
                return Err(format!("task {index} has invalid text"));
            }
            if self.tasks[..index].iter().any(|other| other.id == task.id) {
                return Err(format!("duplicate task id {:?}", task.id));
            }
        }
        Ok(())
    }
}
