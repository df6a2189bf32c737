use crate::models::{Filter, PersistedState, Task};
use crate::storage::{Storage, StorageError};
use crate::store::TaskStore;
use crate::view::{Notice, Snapshot};

/// The seam towards the presentation layer. Frontends translate user gestures
/// into the command functions below and implement this trait to receive the
/// resulting repaints and transient messages.
pub trait Ui {
    fn render(&self, snapshot: &Snapshot);
    fn notify(&self, notice: Notice);
}

pub fn snapshot(store: &TaskStore) -> Snapshot {
    Snapshot {
        tasks: store.list(store.filter()),
        filter: store.filter(),
        counts: store.counts(),
    }
}

/// Save + render, the tail of every successful mutation. A failed save is
/// reported as a distinct warning and never rolls the mutation back; the
/// in-memory model stays authoritative even with persistence broken.
fn sync(ui: &impl Ui, store: &TaskStore, storage: &Storage) -> bool {
    let record = PersistedState::new(store.tasks().to_vec(), store.filter());
    let saved = match storage.save(&record) {
        Ok(()) => true,
        Err(error) => {
            log::warn!("save failed: {error}");
            ui.notify(Notice::warning("Could not save your tasks"));
            false
        }
    };
    ui.render(&snapshot(store));
    saved
}

/// Loads the slot and builds the initial store. An empty slot is a normal
/// first run; a corrupt or unreadable slot is reported and the application
/// starts with an empty list rather than aborting.
pub fn bootstrap(ui: &impl Ui, storage: &Storage) -> TaskStore {
    if let Err(error) = storage.ensure_dirs() {
        log::warn!("could not create storage root: {error}");
    }
    let store = match storage.load() {
        Ok(Some(record)) => {
            log::info!("loaded {} tasks", record.tasks.len());
            TaskStore::from_parts(record.tasks, record.settings.current_filter)
        }
        Ok(None) => TaskStore::new(),
        Err(StorageError::Corrupt(reason)) => {
            log::warn!("stored data was corrupt, starting empty: {reason}");
            ui.notify(Notice::warning("Stored tasks were unreadable and have been reset"));
            TaskStore::new()
        }
        Err(error) => {
            log::warn!("load failed, starting empty: {error}");
            ui.notify(Notice::warning("Could not load saved tasks"));
            TaskStore::new()
        }
    };
    ui.render(&snapshot(&store));
    store
}

/// Adds a task from (possibly untrimmed) frontend input. Validation failure
/// produces an error notice and leaves the collection, the slot, and the
/// screen untouched.
pub fn add_task(
    ui: &impl Ui,
    store: &mut TaskStore,
    storage: &Storage,
    text: &str,
) -> Option<Task> {
    let task = match store.add(text) {
        Ok(task) => task.clone(),
        Err(error) => {
            ui.notify(Notice::error(error.to_string()));
            return None;
        }
    };
    sync(ui, store, storage);
    ui.notify(Notice::success("Task added"));
    Some(task)
}

/// Deletes by id; an absent id is a no-op with no save or render.
pub fn delete_task(ui: &impl Ui, store: &mut TaskStore, storage: &Storage, id: &str) -> bool {
    if !store.delete(id) {
        ui.notify(Notice::error("Task not found"));
        return false;
    }
    sync(ui, store, storage);
    ui.notify(Notice::success("Task deleted"));
    true
}

pub fn toggle_task(
    ui: &impl Ui,
    store: &mut TaskStore,
    storage: &Storage,
    id: &str,
) -> Option<Task> {
    let task = match store.toggle(id) {
        Some(task) => task.clone(),
        None => {
            ui.notify(Notice::error("Task not found"));
            return None;
        }
    };
    sync(ui, store, storage);
    Some(task)
}

/// Edits a task's text. Persists and re-renders on success, the same as every
/// other mutation.
pub fn edit_task(
    ui: &impl Ui,
    store: &mut TaskStore,
    storage: &Storage,
    id: &str,
    text: &str,
) -> Option<Task> {
    let task = match store.edit(id, text) {
        Some(task) => task.clone(),
        None => {
            ui.notify(Notice::error("Could not update task"));
            return None;
        }
    };
    sync(ui, store, storage);
    Some(task)
}

/// Switches the active filter from raw frontend input (unknown values fall
/// back to showing everything) and re-persists it alongside the tasks.
pub fn set_filter(ui: &impl Ui, store: &mut TaskStore, storage: &Storage, raw: &str) -> Filter {
    let filter = Filter::parse(raw);
    store.set_filter(filter);
    sync(ui, store, storage);
    filter
}

/// Deletes every completed task, one at a time, each removal running its own
/// save + render cycle. The confirmation gate in front of this lives in the
/// frontend.
pub fn clear_completed(ui: &impl Ui, store: &mut TaskStore, storage: &Storage) -> usize {
    let mut removed = 0;
    for id in store.completed_ids() {
        if store.delete(&id) {
            removed += 1;
            sync(ui, store, storage);
        }
    }
    if removed > 0 {
        let noun = if removed == 1 { "task" } else { "tasks" };
        ui.notify(Notice::success(format!("Cleared {removed} completed {noun}")));
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::NoticeKind;
    use std::fs;
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestUi {
        renders: Mutex<Vec<Snapshot>>,
        notices: Mutex<Vec<Notice>>,
    }

    impl TestUi {
        fn render_count(&self) -> usize {
            self.renders.lock().unwrap().len()
        }

        fn last_snapshot(&self) -> Snapshot {
            self.renders.lock().unwrap().last().cloned().expect("rendered")
        }

        fn notice_kinds(&self) -> Vec<NoticeKind> {
            self.notices.lock().unwrap().iter().map(|n| n.kind).collect()
        }
    }

    impl Ui for TestUi {
        fn render(&self, snapshot: &Snapshot) {
            self.renders.lock().unwrap().push(snapshot.clone());
        }

        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    fn setup() -> (tempfile::TempDir, Storage, TestUi) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        storage.ensure_dirs().unwrap();
        (dir, storage, TestUi::default())
    }

    fn broken_storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("not-a-dir");
        fs::write(&root, b"file").unwrap();
        (dir, Storage::new(root))
    }

    #[test]
    fn bootstrap_from_an_empty_slot_renders_an_empty_list() {
        let (_dir, storage, ui) = setup();
        let store = bootstrap(&ui, &storage);
        assert!(store.tasks().is_empty());
        assert_eq!(ui.render_count(), 1);
        assert!(ui.notices.lock().unwrap().is_empty());
    }

    #[test]
    fn bootstrap_recovers_from_a_corrupt_slot() {
        let (_dir, storage, ui) = setup();
        fs::write(storage.slot_path(), "invalid json data").unwrap();

        let store = bootstrap(&ui, &storage);
        assert!(store.tasks().is_empty());
        assert_eq!(ui.notice_kinds(), vec![NoticeKind::Warning]);
        // The poison value is gone; the next bootstrap is a clean first run.
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn add_persists_renders_and_returns_the_trimmed_task() {
        let (_dir, storage, ui) = setup();
        let mut store = TaskStore::new();

        let task = add_task(&ui, &mut store, &storage, "  Buy milk  ").expect("added");
        assert_eq!(task.text, "Buy milk");
        assert_eq!(ui.render_count(), 1);

        let record = storage.load().unwrap().expect("saved");
        assert_eq!(record.tasks.len(), 1);
        assert_eq!(record.tasks[0].text, "Buy milk");
    }

    #[test]
    fn add_with_invalid_text_notifies_without_saving_or_rendering() {
        let (_dir, storage, ui) = setup();
        let mut store = TaskStore::new();

        assert!(add_task(&ui, &mut store, &storage, "   ").is_none());
        assert_eq!(ui.render_count(), 0);
        assert_eq!(ui.notice_kinds(), vec![NoticeKind::Error]);
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn failed_save_warns_but_keeps_the_in_memory_mutation() {
        let (_dir, storage) = broken_storage();
        let ui = TestUi::default();
        let mut store = TaskStore::new();

        let task = add_task(&ui, &mut store, &storage, "survives").expect("added in memory");
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, task.id);
        // Warning for the save, then the success for the add itself.
        assert!(ui.notice_kinds().contains(&NoticeKind::Warning));
        assert_eq!(ui.render_count(), 1);
    }

    #[test]
    fn delete_of_an_absent_id_is_a_noop() {
        let (_dir, storage, ui) = setup();
        let mut store = TaskStore::new();
        add_task(&ui, &mut store, &storage, "keep").unwrap();
        let renders_before = ui.render_count();

        assert!(!delete_task(&ui, &mut store, &storage, "missing"));
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(ui.render_count(), renders_before);
    }

    #[test]
    fn edit_persists_the_new_text() {
        let (_dir, storage, ui) = setup();
        let mut store = TaskStore::new();
        let id = add_task(&ui, &mut store, &storage, "before").unwrap().id;

        let edited = edit_task(&ui, &mut store, &storage, &id, "  after  ").expect("edited");
        assert_eq!(edited.text, "after");

        let record = storage.load().unwrap().unwrap();
        assert_eq!(record.tasks[0].text, "after");
    }

    #[test]
    fn set_filter_falls_back_to_all_and_is_persisted() {
        let (_dir, storage, ui) = setup();
        let mut store = TaskStore::new();

        assert_eq!(set_filter(&ui, &mut store, &storage, "completed"), Filter::Completed);
        assert_eq!(storage.load().unwrap().unwrap().settings.current_filter, Filter::Completed);

        assert_eq!(set_filter(&ui, &mut store, &storage, "nonsense"), Filter::All);
        assert_eq!(ui.last_snapshot().filter, Filter::All);
    }

    #[test]
    fn clear_completed_runs_one_save_render_cycle_per_removal() {
        let (_dir, storage, ui) = setup();
        let mut store = TaskStore::new();
        let a = add_task(&ui, &mut store, &storage, "a").unwrap().id;
        add_task(&ui, &mut store, &storage, "b").unwrap();
        let c = add_task(&ui, &mut store, &storage, "c").unwrap().id;
        toggle_task(&ui, &mut store, &storage, &a).unwrap();
        toggle_task(&ui, &mut store, &storage, &c).unwrap();
        let renders_before = ui.render_count();

        assert_eq!(clear_completed(&ui, &mut store, &storage), 2);
        assert_eq!(ui.render_count(), renders_before + 2);
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(storage.load().unwrap().unwrap().tasks.len(), 1);
        let notices = ui.notices.lock().unwrap();
        assert_eq!(notices.last().unwrap().message, "Cleared 2 completed tasks");
    }

    #[test]
    fn clear_completed_notice_is_singular_for_one_removal() {
        let (_dir, storage, ui) = setup();
        let mut store = TaskStore::new();
        let id = add_task(&ui, &mut store, &storage, "done soon").unwrap().id;
        toggle_task(&ui, &mut store, &storage, &id).unwrap();

        assert_eq!(clear_completed(&ui, &mut store, &storage), 1);
        let notices = ui.notices.lock().unwrap();
        assert_eq!(notices.last().unwrap().message, "Cleared 1 completed task");
    }

    #[test]
    fn clear_completed_with_nothing_completed_does_nothing() {
        let (_dir, storage, ui) = setup();
        let mut store = TaskStore::new();
        add_task(&ui, &mut store, &storage, "active").unwrap();
        let renders_before = ui.render_count();

        assert_eq!(clear_completed(&ui, &mut store, &storage), 0);
        assert_eq!(ui.render_count(), renders_before);
    }

    #[test]
    fn full_session_scenario_with_reload() {
        let (_dir, storage, ui) = setup();
        let mut store = bootstrap(&ui, &storage);

        let milk = add_task(&ui, &mut store, &storage, "Buy milk").unwrap();
        assert_eq!(store.counts().total, 1);
        assert!(!milk.completed);

        let toggled = toggle_task(&ui, &mut store, &storage, &milk.id).unwrap();
        assert!(toggled.completed);

        add_task(&ui, &mut store, &storage, "Walk dog").unwrap();
        assert_eq!(store.counts().total, 2);

        let completed = store.list(Filter::Completed);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, milk.id);

        assert_eq!(clear_completed(&ui, &mut store, &storage), 1);
        let remaining = store.list(Filter::All);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].text, "Walk dog");

        // A fresh bootstrap against the same slot sees the surviving task.
        let ui2 = TestUi::default();
        let reloaded = bootstrap(&ui2, &storage);
        assert_eq!(reloaded.tasks().len(), 1);
        assert_eq!(reloaded.tasks()[0].text, "Walk dog");
        assert_eq!(ui2.last_snapshot().counts.active, 1);
    }
}
