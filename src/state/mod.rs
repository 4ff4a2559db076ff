// State management module
//
// Wraps AppState with thread-safe access (Arc<RwLock>) and emits change
// events over a broadcast channel so the GUI never has to poll.

use crate::models::{AppState, PROGRESS_TICKS, UserSettings};
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The input file selection changed; carries the recomputed start guard
    /// and the semicolon-joined display string.
    InputSelectionChanged { can_start: bool, display: String },

    /// The output folder was replaced.
    OutputDirChanged { path: Utf8PathBuf },

    /// A report run started.
    RunStarted { progress_max: u32 },

    /// Progress tick during a run.
    ProgressUpdated { value: u32 },

    /// A report run finished, successfully or not.
    RunFinished { ok: bool, error: Option<String> },

    /// The file-logging menu toggle changed.
    FileLoggingToggled { enabled: bool },
}

/// Thread-safe state manager with event emission.
///
/// The central coordination point of the application:
/// - thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - detects state changes and emits [`StateChange`] events
/// - multiple subscribers via tokio broadcast channels
///
/// Always go through `StateManager` instead of touching [`AppState`]
/// directly: [`read()`](Self::read) for reads, [`update()`](Self::update)
/// for mutations, [`subscribe()`](Self::subscribe) to listen for changes.
pub struct StateManager {
    state: Arc<RwLock<AppState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state.
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events.
    ///
    /// Captures the old state, applies `update_fn`, diffs old vs new, and
    /// broadcasts one event per detected change.
    ///
    /// # Returns
    /// The events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = Self::detect_changes(&old_state, &state);
        for change in &changes {
            // It's fine if nobody is listening yet
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.input_files != new.input_files {
            changes.push(StateChange::InputSelectionChanged {
                can_start: new.can_start(),
                display: new.input_display(),
            });
        }

        if old.output_dir != new.output_dir {
            changes.push(StateChange::OutputDirChanged {
                path: new.output_dir.clone(),
            });
        }

        if old.is_running != new.is_running {
            if new.is_running {
                changes.push(StateChange::RunStarted {
                    progress_max: PROGRESS_TICKS,
                });
            } else {
                changes.push(StateChange::RunFinished {
                    ok: new.last_run_ok.unwrap_or(false),
                    error: new.last_error.clone(),
                });
            }
        }

        if old.progress != new.progress {
            changes.push(StateChange::ProgressUpdated {
                value: new.progress,
            });
        }

        if old.file_logging_enabled != new.file_logging_enabled {
            changes.push(StateChange::FileLoggingToggled {
                enabled: new.file_logging_enabled,
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Replace the input file selection.
    pub fn set_input_files(&self, files: Vec<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            // Remember where the picker was, for next time
            if let Some(parent) = files.first().and_then(|f| f.parent()) {
                state.last_input_dir = parent.to_path_buf();
            }
            state.input_files = files;
        })
    }

    /// Replace the output folder wholesale.
    pub fn set_output_dir(&self, path: Utf8PathBuf) -> Vec<StateChange> {
        self.update(|state| {
            state.output_dir = path;
        })
    }

    /// Begin a report run (Idle -> Running).
    pub fn start_run(&self) -> Vec<StateChange> {
        self.update(|state| state.begin_run())
    }

    /// Record a progress tick from the worker.
    pub fn record_progress(&self, value: u32) -> Vec<StateChange> {
        self.update(|state| state.record_progress(value))
    }

    /// Finish the current run (Running -> Idle).
    pub fn finish_run(&self, ok: bool, error: Option<String>) -> Vec<StateChange> {
        self.update(|state| state.finish_run(ok, error))
    }

    /// Flip the file-logging flag.
    pub fn set_file_logging(&self, enabled: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.file_logging_enabled = enabled;
        })
    }

    /// Populate state from the persisted user settings.
    pub fn load_from_settings(&self, settings: &UserSettings) -> Vec<StateChange> {
        self.update(|state| {
            let report = &settings.report_settings;

            if !report.output_dir.is_empty() {
                state.output_dir = Utf8PathBuf::from(&report.output_dir);
            }
            if !report.last_input_dir.is_empty() {
                state.last_input_dir = Utf8PathBuf::from(&report.last_input_dir);
            }
            state.file_logging_enabled = report.file_logging;
            state.debug_mode = report.debug_mode;

            tracing::info!(
                output_dir = %state.output_dir,
                file_logging = state.file_logging_enabled,
                "user settings loaded into state"
            );
        })
    }

    /// Export the persistable part of the state back into settings form.
    pub fn to_settings(&self) -> UserSettings {
        self.read(|state| UserSettings {
            report_settings: crate::models::ReportSettings {
                output_dir: state.output_dir.to_string(),
                last_input_dir: state.last_input_dir.to_string(),
                file_logging: state.file_logging_enabled,
                debug_mode: state.debug_mode,
            },
        })
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Cloneable for sharing across threads; clones share the same state
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
