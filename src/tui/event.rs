use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Pane};
use crate::model::TaskId;

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Submit,
    Complete(TaskId),
    Delete(TaskId),
    Restore(TaskId),
    Continue,
}

/// Handle a key press. Returns an action indicating what the event loop should do.
pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    if app.add_form.is_some() {
        return handle_add(app, key);
    }
    if app.show_help {
        app.toggle_help();
        return KeyAction::Continue;
    }

    let selected = app.selected().map(|r| r.id);
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_down();
            KeyAction::Continue
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_up();
            KeyAction::Continue
        }
        KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => {
            app.next_pane();
            KeyAction::Continue
        }
        KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => {
            app.prev_pane();
            KeyAction::Continue
        }
        KeyCode::Char('a') => {
            app.enter_add_mode();
            KeyAction::Continue
        }
        KeyCode::Char('c') | KeyCode::Enter if app.pane == Pane::Pending => {
            selected.map_or(KeyAction::Continue, KeyAction::Complete)
        }
        KeyCode::Char('d') if app.pane != Pane::Deleted => {
            selected.map_or(KeyAction::Continue, KeyAction::Delete)
        }
        KeyCode::Char('u') | KeyCode::Enter if app.pane == Pane::Deleted => {
            selected.map_or(KeyAction::Continue, KeyAction::Restore)
        }
        KeyCode::Char('x') => {
            app.dismiss_alert();
            app.error = None;
            KeyAction::Continue
        }
        KeyCode::Char('?') => {
            app.toggle_help();
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn handle_add(app: &mut App, key: KeyEvent) -> KeyAction {
    let Some(form) = app.add_form.as_mut() else {
        return KeyAction::Continue;
    };
    match key.code {
        KeyCode::Esc => app.cancel_add_mode(),
        KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
        KeyCode::Enter => return KeyAction::Submit,
        KeyCode::Backspace => {
            form.focused_buf_mut().pop();
            form.error = None;
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            form.focused_buf_mut().clear();
            form.error = None;
        }
        KeyCode::Char(c) => {
            form.focused_buf_mut().push(c);
            form.error = None;
        }
        _ => {}
    }
    KeyAction::Continue
}
