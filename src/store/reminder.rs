use anyhow::Result;
use log::info;

use super::{Change, TaskStore};
use crate::model::Task;

/// Receives due reminders.
pub trait Notifier {
    fn remind(&mut self, task: &Task);
}

impl<F: FnMut(&Task)> Notifier for F {
    fn remind(&mut self, task: &Task) {
        self(task)
    }
}

impl TaskStore {
    /// Fire every due reminder once and mark it notified. Storage is written
    /// once at the end, and only if something fired. Returns how many fired.
    pub fn check_reminders(&mut self, notifier: &mut dyn Notifier) -> Result<usize> {
        self.sync()?;
        let now = self.clock.now();
        let mut fired = Vec::new();
        for task in self.active.iter_mut().filter(|t| t.reminder_due(now)) {
            notifier.remind(task);
            task.reminder_notified = true;
            fired.push(Change::Reminded(task.id));
        }
        if fired.is_empty() {
            return Ok(0);
        }
        info!("fired {} reminder(s)", fired.len());
        self.commit(&fired)?;
        Ok(fired.len())
    }
}
