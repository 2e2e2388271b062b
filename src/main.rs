mod cli;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};

use cli::{Cli, Command};
use tada::clock::SystemClock;
use tada::commands;
use tada::config::Config;
use tada::model::Task;
use tada::output;
use tada::paths;
use tada::schedule::Scheduler;
use tada::storage::SqliteStorage;
use tada::store::TaskStore;

/// Upper bound on how long `run` sleeps, so Ctrl-C is noticed promptly.
const RUN_POLL: Duration = Duration::from_millis(250);

fn resolve_path(cli_path: Option<String>, default: fn() -> Result<PathBuf>) -> Result<PathBuf> {
    match cli_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => default(),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Long-running modes log to a file next to the database so output never
/// lands on the terminal; one-shot commands log to stderr.
fn setup_logging(db_path: &Path, to_file: bool) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    if to_file {
        let log_path = paths::log_path_for(db_path);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("failed to open log file {}", log_path.display()))?;
        builder
            .target(env_logger::Target::Pipe(Box::new(file)))
            .filter_level(LevelFilter::Info);
    } else {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.parse_default_env().format_timestamp_secs().init();
    Ok(())
}

fn open_store(db_path: &Path) -> Result<TaskStore> {
    let path = db_path
        .to_str()
        .context("database path is not valid UTF-8")?;
    let storage = SqliteStorage::open(path)?;
    Ok(TaskStore::open(storage, SystemClock))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let db_path = resolve_path(cli.db, paths::default_db_path)?;
    let config_path = resolve_path(cli.config, paths::default_config_path)?;
    ensure_parent_dir(&db_path)?;

    let long_running = matches!(cli.command, Command::Run | Command::Ui { .. });
    setup_logging(&db_path, long_running)?;
    let config = Config::load(&config_path)?;

    let mut store = open_store(&db_path)?;

    match cli.command {
        Command::Add { text, remind } => {
            eprintln!("{}", commands::add(&mut store, &text, remind.as_deref())?);
        }

        Command::Done { position } => {
            eprintln!("{}", commands::done(&mut store, position)?);
        }

        Command::Rm { position } => {
            eprintln!("{}", commands::rm(&mut store, position)?);
        }

        Command::Undo { position } => {
            eprintln!("{}", commands::undo(&mut store, position)?);
        }

        Command::List { json } => {
            if json {
                let listing = output::Listing {
                    tasks: store.active(),
                    deleted_tasks: store.deleted(),
                };
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print!("{}", output::format_listing(store.active(), store.deleted()));
            }
        }

        Command::Sweep => {
            let mut print = |task: &Task| println!("{}", output::format_reminder(task));
            let window = config.timers.retention_window();
            eprintln!("{}", commands::sweep(&mut store, window, &mut print)?);
        }

        Command::Run => {
            let running = Arc::new(AtomicBool::new(true));
            let r = running.clone();
            ctrlc::set_handler(move || {
                r.store(false, Ordering::SeqCst);
            })
            .context("failed to set signal handler")?;

            let mut scheduler = Scheduler::new(&config.timers);
            scheduler.start(store.now());
            info!("running timers (db={})", db_path.display());
            let mut print = |task: &Task| println!("{}", output::format_reminder(task));
            while running.load(Ordering::SeqCst) {
                match scheduler.tick(&mut store, &mut print) {
                    Ok(report) if !report.is_empty() => {
                        info!("sweep: {} reminded, {} purged", report.reminded, report.purged);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("scheduled sweep failed: {e:#}"),
                }
                let wait = scheduler
                    .until_next(store.now())
                    .map_or(RUN_POLL, |d| d.min(RUN_POLL));
                std::thread::sleep(wait);
            }
            scheduler.stop();
            info!("shutting down");
        }

        Command::Ui { poll_interval } => {
            let mut scheduler = Scheduler::new(&config.timers);
            tada::tui::run(
                &mut store,
                &mut scheduler,
                Duration::from_millis(poll_interval),
            )?;
        }
    }

    Ok(())
}
