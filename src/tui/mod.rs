mod app;
mod event;
mod panes;

use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use log::{info, warn};
use ratatui::prelude::*;

use crate::model::Task;
use crate::schedule::Scheduler;
use crate::store::TaskStore;
use app::App;
use event::KeyAction;

pub fn run(store: &mut TaskStore, scheduler: &mut Scheduler, poll_interval: Duration) -> Result<()> {
    let dirty = Rc::new(Cell::new(false));
    let flag = dirty.clone();
    store.subscribe(move |_| flag.set(true));

    let mut app = App::new(store);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    scheduler.start(store.now());
    info!("ui started");
    let result = run_loop(&mut terminal, &mut app, store, scheduler, &dirty, poll_interval);
    scheduler.stop();

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    store: &mut TaskStore,
    scheduler: &mut Scheduler,
    dirty: &Cell<bool>,
    poll_interval: Duration,
) -> Result<()> {
    loop {
        if let Err(e) = store.sync() {
            app.error = Some(format!("{e:#}"));
        }
        if dirty.replace(false) {
            app.refresh(store);
        }
        terminal.draw(|frame| panes::render(frame, app))?;

        let wait = scheduler
            .until_next(store.now())
            .map_or(poll_interval, |d| d.min(poll_interval));
        if ct_event::poll(wait)? {
            if let Event::Key(key) = ct_event::read()? {
                if key.kind == KeyEventKind::Press {
                    let result = match event::handle_key(app, key) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Submit => app.submit_add(store),
                        KeyAction::Complete(id) => store.complete_id(id).map(drop),
                        KeyAction::Delete(id) => store.delete_id(id).map(drop),
                        KeyAction::Restore(id) => store.restore_id(id).map(drop),
                        KeyAction::Continue => Ok(()),
                    };
                    if let Err(e) = result {
                        app.error = Some(format!("{e:#}"));
                    }
                }
            }
        }

        let ticked = scheduler.tick(store, &mut |task: &Task| app.push_alert(task));
        if let Err(e) = ticked {
            warn!("scheduled sweep failed: {e:#}");
            app.error = Some(format!("{e:#}"));
        }
    }
}
