use anyhow::Result;
use chrono::TimeDelta;
use log::info;

use super::{Change, TaskStore};

impl TaskStore {
    /// Drop deleted tasks whose time in the deleted list has reached
    /// `window`. Tasks with no deletion time never expire. Returns how many
    /// were purged.
    pub fn purge_expired(&mut self, window: TimeDelta) -> Result<usize> {
        self.sync()?;
        let now = self.clock.now();
        let before = self.deleted.len();
        self.deleted.retain(|task| match task.deleted_at {
            Some(at) => now - at < window,
            None => true,
        });
        let count = before - self.deleted.len();
        if count == 0 {
            return Ok(0);
        }
        info!("purged {count} expired task(s)");
        self.commit(&[Change::Purged { count }])?;
        Ok(count)
    }
}
