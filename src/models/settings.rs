use serde::{Deserialize, Serialize};

/// User configuration persisted as `ini-reporter Settings.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(rename = "Report_Settings")]
    pub report_settings: ReportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Output folder for generated reports. Empty means "use the current
    /// working directory".
    #[serde(rename = "Output Folder", default)]
    pub output_dir: String,

    /// Directory the INI file picker opens in.
    #[serde(rename = "Last Input Folder", default)]
    pub last_input_dir: String,

    #[serde(rename = "File Logging", default)]
    pub file_logging: bool,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_dir: String::new(),
            last_input_dir: String::new(),
            file_logging: false,
            debug_mode: false,
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            report_settings: ReportSettings::default(),
        }
    }
}
