pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::http::HttpEvaluator;
pub use config::Settings;
pub use core::{
    entry::{EntryState, Machine, PendingRequest, Resolution},
    history::HistoryLog,
    keymap::Key,
    session::{Notice, Session, SessionHandle, Snapshot},
};
pub use utils::error::{CalcError, Result};
