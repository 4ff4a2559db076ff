//! Data models for the ini-reporter application.
//!
//! - [`AppState`]: the central state container (selection, run flags, progress)
//! - [`UserSettings`]: user preferences persisted as YAML between sessions
//! - [`PROGRESS_TICKS`]: the progress bar maximum for a single run

pub mod app_state;
pub mod settings;

pub use app_state::{AppState, PROGRESS_TICKS};
pub use settings::{ReportSettings, UserSettings};
