pub mod clock;
pub mod commands;
pub mod config;
pub mod db;
pub mod model;
pub mod output;
pub mod paths;
pub mod schedule;
pub mod storage;
pub mod store;
pub mod tui;
