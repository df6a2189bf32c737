use serde::Serialize;

use crate::models::{Filter, Task};
use crate::store::Counts;

/// Everything the renderer needs for a full repaint: the filtered task list,
/// the filter that produced it, and the summary counts.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub filter: Filter,
    pub counts: Counts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
}

/// A transient user-facing message. Display and auto-dismiss timing are the
/// frontend's fire-and-forget concern.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }
}
