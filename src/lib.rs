// ini-reporter - Desktop shell for generating reports from INI measurement files
//
// Library crate containing the state management, worker abstraction and
// services. The binary crate (main.rs) provides the GUI entry point.

pub mod config;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;
pub mod worker;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppState, PROGRESS_TICKS, UserSettings};
pub use state::{StateChange, StateManager};
pub use worker::{ProgressReporter, ReportTask, Worker, WorkerEvent};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
