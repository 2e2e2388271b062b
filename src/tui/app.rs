use std::collections::VecDeque;

use anyhow::Result;

use crate::model::{Task, TaskId};
use crate::output;
use crate::store::TaskStore;

/// Alerts beyond this many are dropped, oldest first.
const MAX_ALERTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Pending,
    Completed,
    Deleted,
}

impl Pane {
    pub const ALL: [Pane; 3] = [Pane::Pending, Pane::Completed, Pane::Deleted];

    fn index(self) -> usize {
        match self {
            Pane::Pending => 0,
            Pane::Completed => 1,
            Pane::Deleted => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Pane::Pending => " Pending ",
            Pane::Completed => " Completed ",
            Pane::Deleted => " Deleted ",
        }
    }

    fn next(self) -> Self {
        match self {
            Pane::Pending => Pane::Completed,
            Pane::Completed => Pane::Deleted,
            Pane::Deleted => Pane::Pending,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Pending => Pane::Deleted,
            Pane::Completed => Pane::Pending,
            Pane::Deleted => Pane::Completed,
        }
    }
}

/// A task as drawn: a snapshot taken at the last refresh, addressed by id.
#[derive(Debug, Clone)]
pub struct Row {
    pub id: TaskId,
    pub text: String,
    pub meta: String,
    pub reminder_pending: bool,
}

impl Row {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            text: task.text.clone(),
            meta: output::format_meta(task),
            reminder_pending: task.reminder.is_some() && !task.reminder_notified && !task.completed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddField {
    #[default]
    Text,
    Reminder,
}

#[derive(Default)]
pub struct AddForm {
    pub text: String,
    pub reminder: String,
    pub focused: AddField,
    pub error: Option<String>,
}

impl AddForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused_buf_mut(&mut self) -> &mut String {
        match self.focused {
            AddField::Text => &mut self.text,
            AddField::Reminder => &mut self.reminder,
        }
    }

    pub fn toggle_field(&mut self) {
        self.focused = match self.focused {
            AddField::Text => AddField::Reminder,
            AddField::Reminder => AddField::Text,
        };
    }
}

pub struct App {
    pub pane: Pane,
    panes: [Vec<Row>; 3],
    cursors: [usize; 3],
    pub add_form: Option<AddForm>,
    pub alerts: VecDeque<String>,
    pub error: Option<String>,
    pub show_help: bool,
}

impl App {
    pub fn new(store: &TaskStore) -> Self {
        let mut app = App {
            pane: Pane::Pending,
            panes: [Vec::new(), Vec::new(), Vec::new()],
            cursors: [0; 3],
            add_form: None,
            alerts: VecDeque::new(),
            error: None,
            show_help: false,
        };
        app.refresh(store);
        app
    }

    /// Re-read both collections and rebuild every pane.
    pub fn refresh(&mut self, store: &TaskStore) {
        let (completed, pending): (Vec<&Task>, Vec<&Task>) =
            store.active().iter().partition(|t| t.completed);
        self.panes = [
            pending.into_iter().map(Row::from_task).collect(),
            completed.into_iter().map(Row::from_task).collect(),
            store.deleted().iter().map(Row::from_task).collect(),
        ];
        for pane in Pane::ALL {
            self.clamp_cursor(pane);
        }
    }

    fn clamp_cursor(&mut self, pane: Pane) {
        let len = self.panes[pane.index()].len();
        let cursor = &mut self.cursors[pane.index()];
        if len == 0 {
            *cursor = 0;
        } else if *cursor >= len {
            *cursor = len - 1;
        }
    }

    pub fn rows(&self, pane: Pane) -> &[Row] {
        &self.panes[pane.index()]
    }

    pub fn cursor(&self, pane: Pane) -> usize {
        self.cursors[pane.index()]
    }

    pub fn selected(&self) -> Option<&Row> {
        self.rows(self.pane).get(self.cursor(self.pane))
    }

    pub fn move_up(&mut self) {
        let cursor = &mut self.cursors[self.pane.index()];
        *cursor = cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.panes[self.pane.index()].len();
        let cursor = &mut self.cursors[self.pane.index()];
        if *cursor + 1 < len {
            *cursor += 1;
        }
    }

    pub fn next_pane(&mut self) {
        self.pane = self.pane.next();
    }

    pub fn prev_pane(&mut self) {
        self.pane = self.pane.prev();
    }

    pub fn push_alert(&mut self, task: &Task) {
        self.alerts.push_back(output::format_reminder(task));
        while self.alerts.len() > MAX_ALERTS {
            self.alerts.pop_front();
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    pub fn enter_add_mode(&mut self) {
        self.add_form = Some(AddForm::new());
    }

    pub fn cancel_add_mode(&mut self) {
        self.add_form = None;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Validate the add form and hand it to the store. Form problems stay in
    /// the form; storage errors are returned.
    pub fn submit_add(&mut self, store: &mut TaskStore) -> Result<()> {
        let Some(form) = self.add_form.as_mut() else {
            return Ok(());
        };
        if form.text.trim().is_empty() {
            form.error = Some("Task text must not be empty".into());
            return Ok(());
        }
        let reminder = if form.reminder.trim().is_empty() {
            None
        } else {
            match output::parse_when(&form.reminder) {
                Ok(at) => Some(at),
                Err(e) => {
                    form.error = Some(e.to_string());
                    return Ok(());
                }
            }
        };
        let text = std::mem::take(&mut form.text);
        self.add_form = None;
        store.add(&text, reminder)?;
        Ok(())
    }
}
