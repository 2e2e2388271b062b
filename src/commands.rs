//! One-shot CLI commands. Each returns the status line to show the user;
//! positions that name no task are reported, not treated as errors.

use anyhow::Result;
use chrono::TimeDelta;

use crate::output;
use crate::store::{Notifier, TaskStore};

/// Map a 1-based position from the command line to a 0-based index.
pub fn index_of(position: usize) -> Option<usize> {
    position.checked_sub(1)
}

/// Index of the deleted task `undo` should restore: the given position, or
/// the most recently deleted task.
pub fn undo_index(position: Option<usize>, deleted_len: usize) -> Option<usize> {
    match position {
        Some(p) => index_of(p).filter(|&i| i < deleted_len),
        None => deleted_len.checked_sub(1),
    }
}

pub fn add(store: &mut TaskStore, text: &str, remind: Option<&str>) -> Result<String> {
    let reminder = remind.map(output::parse_when).transpose()?;
    Ok(match store.add(text, reminder)? {
        Some(_) => format!("Added '{}'", text.trim()),
        None => "Nothing to add".to_string(),
    })
}

pub fn done(store: &mut TaskStore, position: usize) -> Result<String> {
    store.sync()?;
    let Some(i) = index_of(position).filter(|&i| i < store.active().len()) else {
        return Ok(format!("No task at position {position}"));
    };
    Ok(if store.complete(i)? {
        format!("Completed task {position}")
    } else {
        format!("Task {position} is already completed")
    })
}

pub fn rm(store: &mut TaskStore, position: usize) -> Result<String> {
    let removed = match index_of(position) {
        Some(i) => store.delete(i)?,
        None => false,
    };
    Ok(if removed {
        format!("Deleted task {position}")
    } else {
        format!("No task at position {position}")
    })
}

pub fn undo(store: &mut TaskStore, position: Option<usize>) -> Result<String> {
    store.sync()?;
    let Some(i) = undo_index(position, store.deleted().len()) else {
        return Ok("Nothing to restore".to_string());
    };
    let text = store.deleted()[i].text.clone();
    store.restore(i)?;
    Ok(format!("Restored '{text}'"))
}

pub fn sweep(store: &mut TaskStore, window: TimeDelta, notifier: &mut dyn Notifier) -> Result<String> {
    let reminded = store.check_reminders(notifier)?;
    let purged = store.purge_expired(window)?;
    Ok(format!("Sent {reminded} reminder(s), purged {purged} deleted task(s)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;
    use crate::store::test_support::*;

    fn store_with(texts: &[&str]) -> TaskStore {
        let (mut store, _clock, _storage) = fresh();
        for text in texts {
            store.add(text, None).unwrap();
        }
        store
    }

    #[test]
    fn positions_are_one_based() {
        assert_eq!(index_of(0), None);
        assert_eq!(index_of(1), Some(0));
        assert_eq!(index_of(3), Some(2));
    }

    #[test]
    fn position_zero_is_a_noop() {
        let mut store = store_with(&["a"]);
        assert_eq!(done(&mut store, 0).unwrap(), "No task at position 0");
        assert_eq!(rm(&mut store, 0).unwrap(), "No task at position 0");
        assert_eq!(undo(&mut store, Some(0)).unwrap(), "Nothing to restore");
        assert!(!store.active()[0].completed);
        assert!(store.deleted().is_empty());
    }

    #[test]
    fn done_and_rm_address_listed_position() {
        let mut store = store_with(&["a", "b", "c"]);
        assert_eq!(done(&mut store, 2).unwrap(), "Completed task 2");
        assert!(store.active()[1].completed);
        assert_eq!(done(&mut store, 2).unwrap(), "Task 2 is already completed");
        assert_eq!(rm(&mut store, 3).unwrap(), "Deleted task 3");
        assert_eq!(store.deleted()[0].text, "c");
    }

    #[test]
    fn out_of_range_reports_without_failing() {
        let mut store = store_with(&["a"]);
        assert_eq!(done(&mut store, 2).unwrap(), "No task at position 2");
        assert_eq!(rm(&mut store, 9).unwrap(), "No task at position 9");
        assert_eq!(undo(&mut store, Some(1)).unwrap(), "Nothing to restore");
        assert_eq!(undo(&mut store, None).unwrap(), "Nothing to restore");
        assert_eq!(store.active().len(), 1);
    }

    #[test]
    fn undo_defaults_to_most_recent_deletion() {
        let mut store = store_with(&["a", "b", "c"]);
        rm(&mut store, 1).unwrap();
        rm(&mut store, 2).unwrap();
        let deleted: Vec<_> = store.deleted().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(deleted, ["a", "c"]);

        assert_eq!(undo(&mut store, None).unwrap(), "Restored 'c'");
        assert_eq!(undo(&mut store, Some(1)).unwrap(), "Restored 'a'");
        let active: Vec<_> = store.active().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(active, ["b", "c", "a"]);
    }

    #[test]
    fn undo_index_bounds() {
        assert_eq!(undo_index(None, 0), None);
        assert_eq!(undo_index(None, 3), Some(2));
        assert_eq!(undo_index(Some(3), 3), Some(2));
        assert_eq!(undo_index(Some(4), 3), None);
    }

    #[test]
    fn add_reports_blank_and_bad_reminders() {
        let mut store = store_with(&[]);
        assert_eq!(add(&mut store, "  ", None).unwrap(), "Nothing to add");
        assert!(add(&mut store, "x", Some("whenever")).is_err());
        assert!(store.active().is_empty());
        assert_eq!(
            add(&mut store, " call ", Some("2030-01-01T09:00:00Z")).unwrap(),
            "Added 'call'"
        );
    }

    #[test]
    fn sweep_reports_counts() {
        let (mut store, clock, _storage) = fresh();
        store.add("ping", Some(t0())).unwrap();
        store.add("trash", None).unwrap();
        store.delete(1).unwrap();
        clock.advance(TimeDelta::minutes(1));
        let mut fired = Vec::new();
        let line = sweep(&mut store, TimeDelta::seconds(30), &mut |t: &Task| {
            fired.push(t.text.clone())
        })
        .unwrap();
        assert_eq!(line, "Sent 1 reminder(s), purged 1 deleted task(s)");
        assert_eq!(fired, ["ping"]);
    }
}
