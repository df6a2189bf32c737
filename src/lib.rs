//! Taskpad: the core of a minimal persistent task list.
//!
//! The crate owns the in-memory task collection ([`store::TaskStore`]), its
//! synchronization with a durable slot ([`storage::Storage`]), and the command
//! layer a frontend drives ([`controller`]). Rendering and gesture handling
//! are external: a frontend implements [`controller::Ui`] and calls the
//! command functions from its event handlers.
//!
//! Everything is single-threaded and synchronous; each command runs to
//! completion as mutate, then best-effort save, then repaint.

pub mod controller;
pub mod logging;
pub mod models;
pub mod storage;
pub mod store;
pub mod view;

pub use controller::Ui;
pub use models::{Filter, Task, ValidationError};
pub use storage::{Storage, StorageError};
pub use store::{Counts, TaskStore};
pub use view::{Notice, NoticeKind, Snapshot};
