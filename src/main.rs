//! ini-reporter - Desktop shell for generating reports from INI files
//!
//! Main entry point for the GUI application.
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: runs the Slint event loop (blocking, synchronous)
//! - **Tokio workers**: run the background report task and async plumbing
//! - **State listener**: background std::thread mirroring state into the UI
//!
//! # Execution Flow
//!
//! 1. Load `ini-reporter Settings.yaml` (the debug flag feeds the log filter)
//! 2. Initialize logging (console always on, file log toggleable from the menu)
//! 3. Create the tokio runtime and the StateManager
//! 4. Create the GuiController and run the event loop until the window closes
//! 5. Persist settings, shut the runtime down with a timeout

use anyhow::Result;
use ini_reporter::ui::GuiController;
use ini_reporter::{APP_NAME, ConfigManager, StateManager, VERSION};
use std::sync::Arc;

fn main() -> Result<()> {
    // Settings come first so the persisted debug flag can raise the filter
    // level; anything these two calls log is dropped, the subscriber is not
    // installed yet
    let config_manager = ConfigManager::new("config")?;
    let settings = config_manager.load_settings()?;

    let file_log = ini_reporter::logging::setup_logging(
        ".",
        APP_NAME,
        settings.report_settings.debug_mode,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Background work is a single blocking task at a time; a small pool is
    // plenty
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("ini-reporter-worker")
        .build()?;

    let state_manager = Arc::new(StateManager::new());
    state_manager.load_from_settings(&settings);

    // The settings file may ask for file logging from the start
    if state_manager.read(|s| s.file_logging_enabled) {
        if let Err(e) = file_log.enable() {
            tracing::error!("Failed to enable file logging from settings: {:?}", e);
            state_manager.set_file_logging(false);
        }
    }

    let gui_controller =
        GuiController::new(state_manager.clone(), file_log.clone(), runtime.handle().clone())?;

    tracing::info!("GUI controller initialized, launching window");

    // Blocks until the window is closed; the runtime stays alive in the
    // background for the worker
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    if state_manager.read(|s| s.is_running) {
        tracing::warn!("Window closed during a report run - the run will be abandoned");
    }

    if let Err(e) = config_manager.save_settings(&state_manager.to_settings()) {
        tracing::error!("Failed to save settings: {:?}", e);
    }

    file_log.disable();
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
