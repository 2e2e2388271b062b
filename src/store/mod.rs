//! The task store: owner of the active and deleted collections.
//!
//! Every mutation runs as one unit: change the collections, write both
//! collections through the [`Storage`], then tell observers. A failed write
//! is returned to the caller but the in-memory change stands and observers
//! still hear about it.
//!
//! Operations come in two flavours. The index forms (`complete`, `delete`,
//! `restore`) address a task by its current position and are meant for a
//! caller acting on what it just listed. The `_id` forms address a task by
//! its stable [`TaskId`] and stay correct across re-renders.
//!
//! Other processes may write the same storage. Before every mutation and
//! sweep the store checks the storage's change counter and re-reads both
//! collections if someone else has committed since its last read or write.

mod reminder;
mod retention;

pub use reminder::Notifier;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::clock::Clock;
use crate::model::{Task, TaskId};
use crate::storage::{self, Collections, Storage};

/// What a mutation did, as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(TaskId),
    Completed(TaskId),
    Deleted(TaskId),
    Restored(TaskId),
    Reminded(TaskId),
    Purged { count: usize },
    /// Both collections were re-read after another writer changed storage.
    Reloaded,
}

type Observer = Box<dyn FnMut(&Change)>;

pub struct TaskStore {
    active: Vec<Task>,
    deleted: Vec<Task>,
    storage: Box<dyn Storage>,
    clock: Box<dyn Clock>,
    observers: Vec<Observer>,
    /// Storage change counter as of our last read or write.
    version: Option<u64>,
}

impl TaskStore {
    /// Load both collections from `storage`. Unreadable data loads empty.
    pub fn open(storage: impl Storage + 'static, clock: impl Clock + 'static) -> Self {
        let version = read_version(&storage);
        let Collections { active, deleted } = storage::load(&storage);
        let mut store = Self {
            active,
            deleted,
            storage: Box::new(storage),
            clock: Box::new(clock),
            observers: Vec::new(),
            version,
        };
        store.normalize();
        debug!(
            "loaded {} active and {} deleted tasks",
            store.active.len(),
            store.deleted.len()
        );
        store
    }

    /// Repair loaded data so the collection invariants hold.
    fn normalize(&mut self) {
        for task in &mut self.active {
            if task.deleted_at.take().is_some() {
                warn!("active task {} carried a deletion time; cleared", task.id);
            }
        }
        for task in self.active.iter_mut().chain(self.deleted.iter_mut()) {
            match (task.completed, task.completed_at) {
                (false, Some(_)) => {
                    warn!("pending task {} carried a completion time; cleared", task.id);
                    task.completed_at = None;
                }
                (true, None) => {
                    warn!("completed task {} had no completion time; using its creation time", task.id);
                    task.completed_at = Some(task.added_at);
                }
                _ => {}
            }
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Active tasks, pending and completed, in insertion order.
    pub fn active(&self) -> &[Task] {
        &self.active
    }

    /// Soft-deleted tasks, oldest deletion first.
    pub fn deleted(&self) -> &[Task] {
        &self.deleted
    }

    pub fn active_id(&self, index: usize) -> Option<TaskId> {
        self.active.get(index).map(|t| t.id)
    }

    pub fn deleted_id(&self, index: usize) -> Option<TaskId> {
        self.deleted.get(index).map(|t| t.id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.active
            .iter()
            .chain(self.deleted.iter())
            .find(|t| t.id == id)
    }

    /// Register a callback run after every mutation.
    pub fn subscribe(&mut self, observer: impl FnMut(&Change) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Re-read both collections if another writer has committed since our
    /// last read or write. Returns whether anything was reloaded.
    pub fn sync(&mut self) -> Result<bool> {
        let current = self
            .storage
            .version()
            .context("failed to check storage for changes")?;
        if self.version == Some(current) {
            return Ok(false);
        }
        let Collections { active, deleted } = storage::load(self.storage.as_ref());
        self.active = active;
        self.deleted = deleted;
        self.normalize();
        self.version = Some(current);
        info!(
            "reloaded {} active and {} deleted tasks after an outside change",
            self.active.len(),
            self.deleted.len()
        );
        self.notify(&[Change::Reloaded]);
        Ok(true)
    }

    fn notify(&mut self, changes: &[Change]) {
        for change in changes {
            for observer in &mut self.observers {
                observer(change);
            }
        }
    }

    /// Persist both collections, then notify observers of `changes`.
    fn commit(&mut self, changes: &[Change]) -> Result<()> {
        let saved = storage::save(self.storage.as_mut(), &self.active, &self.deleted);
        match &saved {
            Ok(()) => self.version = read_version(self.storage.as_ref()),
            Err(e) => warn!("{e:#}"),
        }
        self.notify(changes);
        saved
    }

    /// Add a pending task. Text is trimmed; blank text is ignored and
    /// yields `Ok(None)` without touching storage.
    pub fn add(&mut self, text: &str, reminder: Option<DateTime<Utc>>) -> Result<Option<TaskId>> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring task with empty text");
            return Ok(None);
        }
        self.sync()?;
        let task = Task::new(text, self.clock.now(), reminder);
        let id = task.id;
        self.active.push(task);
        info!("added task {id}");
        self.commit(&[Change::Added(id)])?;
        Ok(Some(id))
    }

    /// Complete the active task at `index`. Returns whether anything changed.
    pub fn complete(&mut self, index: usize) -> Result<bool> {
        self.sync()?;
        match self.active_id(index) {
            Some(id) => self.complete_id(id),
            None => Ok(false),
        }
    }

    /// Complete an active task. Already-completed tasks keep their
    /// original completion time.
    pub fn complete_id(&mut self, id: TaskId) -> Result<bool> {
        self.sync()?;
        let now = self.clock.now();
        let Some(task) = self.active.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        if task.completed {
            return Ok(false);
        }
        task.completed = true;
        task.completed_at = Some(now);
        info!("completed task {id}");
        self.commit(&[Change::Completed(id)])?;
        Ok(true)
    }

    /// Soft-delete the active task at `index`.
    pub fn delete(&mut self, index: usize) -> Result<bool> {
        self.sync()?;
        match self.active_id(index) {
            Some(id) => self.delete_id(id),
            None => Ok(false),
        }
    }

    /// Move an active task to the end of the deleted collection.
    pub fn delete_id(&mut self, id: TaskId) -> Result<bool> {
        self.sync()?;
        let Some(pos) = self.active.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        let mut task = self.active.remove(pos);
        task.deleted_at = Some(self.clock.now());
        self.deleted.push(task);
        info!("deleted task {id}");
        self.commit(&[Change::Deleted(id)])?;
        Ok(true)
    }

    /// Restore the deleted task at `index`.
    pub fn restore(&mut self, index: usize) -> Result<bool> {
        self.sync()?;
        match self.deleted_id(index) {
            Some(id) => self.restore_id(id),
            None => Ok(false),
        }
    }

    /// Move a deleted task to the end of the active collection. Its
    /// original position is not recovered; its completion state is kept.
    pub fn restore_id(&mut self, id: TaskId) -> Result<bool> {
        self.sync()?;
        let Some(pos) = self.deleted.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        let mut task = self.deleted.remove(pos);
        task.deleted_at = None;
        self.active.push(task);
        info!("restored task {id}");
        self.commit(&[Change::Restored(id)])?;
        Ok(true)
    }
}

fn read_version(storage: &dyn Storage) -> Option<u64> {
    match storage.version() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("failed to read storage version: {e:#}");
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{MemoryStorage, DELETED_KEY, TASKS_KEY};
    use chrono::TimeDelta;

    #[test]
    fn blank_text_is_ignored() {
        let (mut store, _clock, storage) = fresh();
        let seen = record_changes(&mut store);
        assert_eq!(store.add("", None).unwrap(), None);
        assert_eq!(store.add("   ", None).unwrap(), None);
        assert_eq!(store.add("\t\n", None).unwrap(), None);
        assert!(store.active().is_empty());
        assert!(store.deleted().is_empty());
        assert!(seen.borrow().is_empty());
        assert!(storage.raw(TASKS_KEY).is_none(), "nothing should be written");
    }

    #[test]
    fn add_builds_pending_task() {
        let (mut store, _clock, _storage) = fresh();
        let reminder = t0() + TimeDelta::hours(2);
        let id = store.add("  buy milk ", Some(reminder)).unwrap().unwrap();
        let task = &store.active()[0];
        assert_eq!(task.id, id);
        assert_eq!(task.text, "buy milk");
        assert!(!task.completed);
        assert_eq!(task.added_at, t0());
        assert!(task.completed_at.is_none());
        assert_eq!(task.reminder, Some(reminder));
        assert!(!task.reminder_notified);
        assert!(task.deleted_at.is_none());
    }

    #[test]
    fn add_then_complete() {
        let (mut store, clock, _storage) = fresh();
        store.add("buy milk", None).unwrap();
        clock.advance(TimeDelta::seconds(3));
        assert!(store.complete(0).unwrap());
        let task = &store.active()[0];
        assert!(task.completed);
        assert!(task.completed_at.unwrap() >= task.added_at);
        assert_invariants(&store);
    }

    #[test]
    fn completing_twice_keeps_first_time() {
        let (mut store, clock, _storage) = fresh();
        store.add("t", None).unwrap();
        store.complete(0).unwrap();
        let first = store.active()[0].completed_at;
        clock.advance(TimeDelta::minutes(1));
        assert!(!store.complete(0).unwrap());
        assert_eq!(store.active()[0].completed_at, first);
    }

    #[test]
    fn out_of_range_is_a_noop() {
        let (mut store, _clock, _storage) = fresh();
        store.add("only", None).unwrap();
        let seen = record_changes(&mut store);
        assert!(!store.complete(1).unwrap());
        assert!(!store.delete(5).unwrap());
        assert!(!store.restore(0).unwrap());
        assert!(!store.complete(usize::MAX).unwrap());
        assert_eq!(store.active().len(), 1);
        assert!(!store.active()[0].completed);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn delete_moves_task_to_deleted() {
        let (mut store, clock, _storage) = fresh();
        store.add("t", Some(t0() + TimeDelta::hours(1))).unwrap();
        let before = store.active()[0].clone();
        clock.advance(TimeDelta::seconds(7));
        assert!(store.delete(0).unwrap());
        assert!(store.active().is_empty());
        assert_eq!(store.deleted().len(), 1);
        let gone = &store.deleted()[0];
        assert_eq!(gone.deleted_at, Some(t0() + TimeDelta::seconds(7)));
        let mut expected = before;
        expected.deleted_at = gone.deleted_at;
        assert_eq!(gone, &expected);
        assert_invariants(&store);
    }

    #[test]
    fn deletions_append_in_order() {
        let (mut store, _clock, _storage) = fresh();
        for text in ["a", "b", "c"] {
            store.add(text, None).unwrap();
        }
        store.delete(1).unwrap();
        store.delete(0).unwrap();
        let texts: Vec<_> = store.deleted().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["b", "a"]);
        assert_eq!(store.active()[0].text, "c");
    }

    #[test]
    fn restore_appends_and_keeps_completion() {
        let (mut store, _clock, _storage) = fresh();
        store.add("first", None).unwrap();
        store.add("second", None).unwrap();
        store.complete(0).unwrap();
        store.delete(0).unwrap();
        assert!(store.restore(0).unwrap());
        assert!(store.deleted().is_empty());
        let texts: Vec<_> = store.active().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
        let restored = &store.active()[1];
        assert!(restored.completed);
        assert!(restored.deleted_at.is_none());
        assert_invariants(&store);

        let json = serde_json::to_value(restored).unwrap();
        assert!(json.get("deletedAt").is_none());
    }

    #[test]
    fn id_operations_survive_reordering() {
        let (mut store, _clock, _storage) = fresh();
        let a = store.add("a", None).unwrap().unwrap();
        let b = store.add("b", None).unwrap().unwrap();
        store.delete_id(a).unwrap();
        // `b` is now at index 0, but the id still points at it.
        assert!(store.complete_id(b).unwrap());
        assert!(store.get(b).unwrap().completed);
        // Ids in the wrong collection are ignored.
        assert!(!store.complete_id(a).unwrap());
        assert!(!store.restore_id(b).unwrap());
        assert!(store.restore_id(a).unwrap());
        assert!(!store.delete_id(TaskId::new()).unwrap());
    }

    #[test]
    fn observers_hear_every_mutation() {
        let (mut store, _clock, _storage) = fresh();
        let seen = record_changes(&mut store);
        let id = store.add("t", None).unwrap().unwrap();
        store.complete(0).unwrap();
        store.delete(0).unwrap();
        store.restore(0).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                Change::Added(id),
                Change::Completed(id),
                Change::Deleted(id),
                Change::Restored(id),
            ]
        );
    }

    #[test]
    fn mutations_are_persisted() {
        let (mut store, clock, storage) = fresh();
        store.add("keep", None).unwrap();
        store.add("toss", None).unwrap();
        store.complete(0).unwrap();
        store.delete(1).unwrap();

        let reopened = TaskStore::open(storage.clone(), clock.clone());
        assert_eq!(reopened.active(), store.active());
        assert_eq!(reopened.deleted(), store.deleted());
        assert!(storage.raw(DELETED_KEY).unwrap().contains("toss"));
    }

    #[test]
    fn outside_writes_are_picked_up_before_mutating() {
        let (mut ours, clock, storage) = fresh();
        ours.add("ours", None).unwrap();
        let seen = record_changes(&mut ours);

        let mut theirs = TaskStore::open(storage.clone(), clock.clone());
        let added = theirs.add("theirs", None).unwrap().unwrap();
        theirs.delete(0).unwrap();

        // Nothing is re-read until the next operation.
        assert_eq!(ours.active()[0].text, "ours");
        assert!(ours.complete_id(added).unwrap());
        let texts: Vec<_> = ours.active().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["theirs"]);
        assert_eq!(ours.deleted()[0].text, "ours");
        assert_eq!(*seen.borrow(), vec![Change::Reloaded, Change::Completed(added)]);

        let reopened = TaskStore::open(storage.clone(), clock.clone());
        assert_eq!(reopened.active(), ours.active());
        assert_eq!(reopened.deleted(), ours.deleted());
    }

    #[test]
    fn sync_without_outside_writes_is_quiet() {
        let (mut store, _clock, _storage) = fresh();
        store.add("t", None).unwrap();
        let seen = record_changes(&mut store);
        assert!(!store.sync().unwrap());
        store.complete(0).unwrap();
        assert!(!store.sync().unwrap());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn failed_write_keeps_memory_state() {
        let clock = ManualClock::new(t0());
        let mut store = TaskStore::open(FullDisk, clock);
        let seen = record_changes(&mut store);
        let err = store.add("t", None).unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
        assert_eq!(store.active().len(), 1);
        assert_eq!(seen.borrow().len(), 1);

        assert!(store.delete(0).is_err());
        assert!(store.active().is_empty());
        assert_eq!(store.deleted().len(), 1);
    }

    #[test]
    fn corrupted_storage_opens_empty() {
        let storage = MemoryStorage::new();
        storage.insert(TASKS_KEY, "[[[");
        storage.insert(DELETED_KEY, "42");
        let store = TaskStore::open(storage, ManualClock::new(t0()));
        assert!(store.active().is_empty());
        assert!(store.deleted().is_empty());
    }

    #[test]
    fn load_repairs_broken_invariants() {
        let storage = MemoryStorage::new();
        storage.insert(
            TASKS_KEY,
            r#"[
                {"text": "stray", "addedAt": 1000, "deletedAt": 2000},
                {"text": "half done", "completed": true, "addedAt": 1000},
                {"text": "undone", "completed": false, "addedAt": 1000, "completedAt": 3000}
            ]"#,
        );
        storage.insert(DELETED_KEY, r#"[{"text": "no stamp", "addedAt": 1000}]"#);
        let store = TaskStore::open(storage, ManualClock::new(t0()));
        assert!(store.active()[0].deleted_at.is_none());
        assert_eq!(store.active()[1].completed_at, Some(store.active()[1].added_at));
        assert!(store.active()[2].completed_at.is_none());
        // Deleted tasks without a stamp are kept as they are.
        assert_eq!(store.deleted().len(), 1);
        assert!(store.deleted()[0].deleted_at.is_none());
    }
}
