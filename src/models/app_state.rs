use camino::Utf8PathBuf;

/// Number of progress ticks in a single report run.
///
/// The placeholder task reports ticks `0..PROGRESS_TICKS` and the progress
/// bar maximum is set to this value. [`AppState::finish_run`] forces the
/// counter to this maximum so the bar always ends full, matching the
/// result dialog.
pub const PROGRESS_TICKS: u32 = 10;

/// Single source of truth for all application state.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by
/// [`crate::state::StateManager`]. Never access it directly from more than
/// one place - go through the manager:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with
///   automatic change events
#[derive(Clone, Debug)]
pub struct AppState {
    // Form selection
    pub input_files: Vec<Utf8PathBuf>,
    pub output_dir: Utf8PathBuf,

    // Run state
    pub is_running: bool,
    pub progress: u32,
    pub last_run_ok: Option<bool>,
    pub last_error: Option<String>,

    // Settings
    pub file_logging_enabled: bool,
    pub debug_mode: bool,
    pub last_input_dir: Utf8PathBuf,
}

impl Default for AppState {
    fn default() -> Self {
        let cwd = current_dir_utf8();
        Self {
            input_files: Vec::new(),
            output_dir: cwd.clone(),
            is_running: false,
            progress: 0,
            last_run_ok: None,
            last_error: None,
            file_logging_enabled: false,
            debug_mode: false,
            last_input_dir: cwd,
        }
    }
}

/// Current working directory as a UTF-8 path, falling back to `"."` when
/// the cwd is unavailable or not valid UTF-8.
fn current_dir_utf8() -> Utf8PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|p| Utf8PathBuf::try_from(p).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

impl AppState {
    /// The start control is enabled only while at least one input file is
    /// selected and no run is in flight.
    pub fn can_start(&self) -> bool {
        !self.input_files.is_empty() && !self.is_running
    }

    /// Display form of the input selection: paths joined with `;`.
    pub fn input_display(&self) -> String {
        self.input_files
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Transition Idle -> Running: progress back to zero, previous result
    /// cleared.
    pub fn begin_run(&mut self) {
        self.is_running = true;
        self.progress = 0;
        self.last_run_ok = None;
        self.last_error = None;
    }

    /// Record a progress tick. Values never go backwards within a run.
    pub fn record_progress(&mut self, value: u32) {
        if value > self.progress {
            self.progress = value.min(PROGRESS_TICKS);
        }
    }

    /// Transition Running -> Idle. Progress is forced to the maximum so a
    /// finished run always shows a full bar.
    pub fn finish_run(&mut self, ok: bool, error: Option<String>) {
        self.is_running = false;
        self.progress = PROGRESS_TICKS;
        self.last_run_ok = Some(ok);
        self.last_error = error;
    }
}
