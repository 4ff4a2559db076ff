// GuiController - wires the Slint window to state management and the worker
//
// Responsibilities:
// - Slint callbacks -> state updates / worker runs
// - StateChange subscription -> widget updates via the UiBridge
// - Native file/folder pickers (rfd)
// - Result and about dialogs

use crate::logging::FileLogHandle;
use crate::models::{AppState, PROGRESS_TICKS};
use crate::services::{PlaceholderReport, ReportRequest};
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::UiBridge;
use crate::{APP_NAME, VERSION};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::sync::Arc;

// Include the generated Slint code
slint::include_modules!();

/// Main coordinator for the GUI layer.
///
/// Creates the window, the [`UiBridge`] for tokio/Slint coordination, hooks
/// up callbacks, and subscribes to [`StateManager`] events so every state
/// mutation is reflected in the widgets.
pub struct GuiController {
    ui: MainWindow,
    _bridge: UiBridge<MainWindow>,
    _state_manager: Arc<StateManager>,
}

impl GuiController {
    /// Create a new GUI controller.
    ///
    /// # Arguments
    /// * `state_manager` - Shared application state manager
    /// * `file_log` - Handle controlling the toggleable file log
    /// * `tokio_handle` - Handle to the tokio runtime for background work
    pub fn new(
        state_manager: Arc<StateManager>,
        file_log: FileLogHandle,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;
        let bridge = UiBridge::new(&ui, tokio_handle);

        ui.set_window_title(format!("{} v{}", APP_NAME, VERSION).into());
        ui.set_about_text(format!("{}\n\nVersion: {}", APP_NAME, VERSION).into());

        Self::sync_ui_with_state(&ui, &state_manager);
        Self::setup_callbacks(&ui, &bridge, &state_manager, &file_log);
        Self::setup_state_subscription(&bridge, &state_manager);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            _state_manager: state_manager,
        })
    }

    /// Run the GUI (blocks until the window is closed).
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Initialize the widgets from the current state, once at startup.
    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        let state = state_manager.snapshot();

        ui.set_input_display(state.input_display().into());
        ui.set_output_dir(state.output_dir.as_str().into());
        ui.set_can_start(state.can_start());
        ui.set_is_running(state.is_running);
        ui.set_progress_value(state.progress as i32);
        ui.set_progress_max(PROGRESS_TICKS as i32);
        ui.set_file_logging_enabled(state.file_logging_enabled);
        ui.set_status_message(Self::status_message(&state).into());

        tracing::debug!("UI synchronized with initial state");
    }

    /// Connect Slint UI events (button clicks, menu items) to Rust logic.
    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &UiBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        file_log: &FileLogHandle,
    ) {
        let state = Arc::clone(state_manager);

        // Browse input files: multi-select, restricted to .ini
        ui.on_browse_inputs(move || {
            tracing::debug!("Browse input files clicked");

            let start_dir = state.read(|s| s.last_input_dir.clone());
            let picked = rfd::FileDialog::new()
                .set_title("Select INI files")
                .set_directory(start_dir.as_std_path())
                .add_filter("INI files", &["ini"])
                .pick_files();

            let Some(paths) = picked else {
                return;
            };

            let files: Vec<Utf8PathBuf> = paths
                .into_iter()
                .filter_map(|p| match Utf8PathBuf::try_from(p) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::error!("Selected path is not valid UTF-8: {}", e);
                        None
                    }
                })
                .collect();

            if !files.is_empty() {
                tracing::info!("Input INI files selected: {:?}", files);
                state.set_input_files(files);
            }
        });

        let state = Arc::clone(state_manager);

        // Browse output folder
        ui.on_browse_output(move || {
            tracing::debug!("Browse output folder clicked");

            let current = state.read(|s| s.output_dir.clone());
            let picked = rfd::FileDialog::new()
                .set_title("Select report folder")
                .set_directory(current.as_std_path())
                .pick_folder();

            if let Some(path) = picked {
                match Utf8PathBuf::try_from(path) {
                    Ok(folder) => {
                        tracing::info!("Output path updated to {}", folder);
                        state.set_output_dir(folder);
                    }
                    Err(e) => tracing::error!("Selected folder is not valid UTF-8: {}", e),
                }
            }
        });

        let state = Arc::clone(state_manager);
        let bridge_clone = bridge.clone();

        // Start report generation
        ui.on_start_report(move || {
            tracing::info!("Start button clicked");

            // Guarded in the UI too, but re-check before spawning so a
            // queued double-click can't start two runs
            if !state.read(AppState::can_start) {
                tracing::warn!("Start requested but state does not allow it");
                return;
            }

            state.start_run();

            let state_for_run = Arc::clone(&state);
            bridge_clone.spawn_async(move || async move {
                Self::run_report(state_for_run).await;
            });
        });

        let state = Arc::clone(state_manager);
        let file_log_clone = file_log.clone();
        let ui_weak = ui.as_weak();

        // Activate Logging menu toggle
        ui.on_toggle_file_logging(move || {
            let Some(ui) = ui_weak.upgrade() else { return };
            let enable = ui.get_file_logging_enabled();

            if enable {
                match file_log_clone.enable() {
                    Ok(path) => {
                        tracing::info!("Log file handler added: {}", path);
                        state.set_file_logging(true);
                    }
                    Err(e) => {
                        tracing::error!("Failed to enable file logging: {:?}", e);
                        ui.set_file_logging_enabled(false);
                    }
                }
            } else {
                file_log_clone.disable();
                state.set_file_logging(false);
            }
        });

        let ui_weak = ui.as_weak();

        // About dialog (Ctrl+H)
        ui.on_show_about(move || {
            tracing::debug!("Showing about dialog");
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_about_dialog(true);
            }
        });

        let ui_weak = ui.as_weak();

        ui.on_about_dismissed(move || {
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_about_dialog(false);
            }
        });

        let ui_weak = ui.as_weak();

        // Result dialog dismissed
        ui.on_result_dismissed(move || {
            tracing::debug!("Result dialog dismissed");
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_result_dialog(false);
            }
        });

        let ui_weak = ui.as_weak();

        // Exit menu item (Ctrl+Q)
        ui.on_request_exit(move || {
            tracing::info!("Exit requested");
            if let Some(ui) = ui_weak.upgrade() {
                let _ = ui.window().hide();
            }
        });

        let state = Arc::clone(state_manager);

        ui.window().on_close_requested(move || {
            if state.read(|s| s.is_running) {
                // No cancellation: the placeholder run finishes on its own,
                // the runtime shutdown timeout covers the rest
                tracing::warn!("Window closed while a report run is in progress");
            }
            slint::CloseRequestResponse::HideWindow
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Execute one report run: spawn the worker and fold its events back
    /// into the state manager.
    async fn run_report(state: Arc<StateManager>) {
        let request = state.read(|s| {
            ReportRequest::new(s.input_files.clone(), s.output_dir.clone())
        });

        let mut worker = crate::worker::Worker::spawn(PlaceholderReport::new(request));
        let mut failure: Option<crate::worker::TaskFailure> = None;

        while let Some(event) = worker.recv().await {
            match event {
                crate::worker::WorkerEvent::Progress(value) => {
                    state.record_progress(value);
                }
                crate::worker::WorkerEvent::Error(task_failure) => {
                    tracing::error!("Report run failed: {}", task_failure.detail);
                    failure = Some(task_failure);
                }
                crate::worker::WorkerEvent::Finished(ok) => {
                    state.finish_run(ok, failure.take().map(|f| f.message));
                    break;
                }
            }
        }
    }

    /// Listen for state changes on a background thread and mirror them into
    /// the widgets through the bridge.
    fn setup_state_subscription(bridge: &UiBridge<MainWindow>, state_manager: &Arc<StateManager>) {
        let bridge = bridge.clone();
        let state_manager = Arc::clone(state_manager);
        let mut rx = state_manager.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("State subscription thread started");

            loop {
                match rx.blocking_recv() {
                    Ok(change) => {
                        tracing::trace!("State change received: {:?}", change);
                        Self::apply_change(&bridge, &state_manager, change);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        tracing::info!("State channel closed - stopping subscription thread");
                        break;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("State subscription lagged - {} events skipped", skipped);
                    }
                }
            }

            tracing::debug!("State subscription thread terminated");
        });
    }

    fn apply_change(
        bridge: &UiBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        change: StateChange,
    ) {
        match change {
            StateChange::InputSelectionChanged { can_start, display } => {
                let status = Self::status_message(&state_manager.snapshot());
                bridge.update_ui(move |ui| {
                    ui.set_input_display(display.into());
                    ui.set_can_start(can_start);
                    ui.set_status_message(status.into());
                });
            }

            StateChange::OutputDirChanged { path } => {
                bridge.update_ui(move |ui| {
                    ui.set_output_dir(path.as_str().into());
                });
            }

            StateChange::RunStarted { progress_max } => {
                tracing::info!("Report run started");
                bridge.update_ui(move |ui| {
                    ui.set_is_running(true);
                    ui.set_can_start(false);
                    ui.set_progress_value(0);
                    ui.set_progress_max(progress_max as i32);
                    ui.set_status_message("Generating report...".into());
                });
            }

            StateChange::ProgressUpdated { value } => {
                bridge.update_ui(move |ui| {
                    ui.set_progress_value(value as i32);
                });
            }

            StateChange::RunFinished { ok, error } => {
                tracing::info!(ok, "Report run finished");

                let snapshot = state_manager.snapshot();
                let can_start = snapshot.can_start();
                let status = Self::status_message(&snapshot);
                let message = if ok {
                    "Work has been completed successfully.".to_string()
                } else {
                    format!(
                        "Error has occurred.\n{}",
                        error.unwrap_or_else(|| "Report generation did not finish".to_string())
                    )
                };

                bridge.update_ui(move |ui| {
                    ui.set_is_running(false);
                    ui.set_can_start(can_start);
                    ui.set_progress_value(ui.get_progress_max());
                    ui.set_status_message(status.into());
                    ui.set_result_ok(ok);
                    ui.set_result_message(message.into());
                    ui.set_show_result_dialog(true);
                });
            }

            StateChange::FileLoggingToggled { enabled } => {
                bridge.update_ui(move |ui| {
                    ui.set_file_logging_enabled(enabled);
                });
            }
        }
    }

    /// Contextual status line shown under the form.
    fn status_message(state: &AppState) -> String {
        if state.is_running {
            format!("Generating report... ({}/{})", state.progress, PROGRESS_TICKS)
        } else if state.input_files.is_empty() {
            "At least one INI file must be selected".to_string()
        } else {
            format!(
                "Ready to generate report from {} file{}",
                state.input_files.len(),
                if state.input_files.len() == 1 { "" } else { "s" }
            )
        }
    }
}
