use crate::models::PROGRESS_TICKS;
use crate::worker::{ProgressReporter, ReportTask};
use camino::Utf8PathBuf;
use std::time::Duration;

/// Inputs for a single report run: the selected INI files and the folder
/// the report would be written to.
///
/// Paths are carried as-is; no validation of existence or content happens
/// here (the real generator is expected to own that).
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub input_files: Vec<Utf8PathBuf>,
    pub output_dir: Utf8PathBuf,
}

impl ReportRequest {
    pub fn new(input_files: Vec<Utf8PathBuf>, output_dir: Utf8PathBuf) -> Self {
        Self {
            input_files,
            output_dir,
        }
    }

    /// Display form of the input selection: paths joined with `;`.
    pub fn input_display(&self) -> String {
        self.input_files
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Placeholder report generation.
///
/// Stands in for the real report logic: ticks [`PROGRESS_TICKS`] times,
/// sleeping `tick_interval` per tick, and reports success. Produces no
/// output artifact.
pub struct PlaceholderReport {
    request: ReportRequest,
    tick_interval: Duration,
}

impl PlaceholderReport {
    pub fn new(request: ReportRequest) -> Self {
        Self {
            request,
            tick_interval: Duration::from_secs(1),
        }
    }

    /// Override the per-tick sleep. Tests use millisecond intervals.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

impl ReportTask for PlaceholderReport {
    fn run(&self, progress: &ProgressReporter) -> anyhow::Result<bool> {
        tracing::info!(
            inputs = %self.request.input_display(),
            output = %self.request.output_dir,
            "report generation started"
        );

        for n in 0..PROGRESS_TICKS {
            std::thread::sleep(self.tick_interval);
            progress.report(n);
        }

        tracing::info!("report generation finished");
        Ok(true)
    }
}
