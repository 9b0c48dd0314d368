//! Domain error types.

use std::path::PathBuf;

/// Top-level error type for sentidash.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("required input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("CSV error in {file}: {reason}")]
    Csv { file: String, reason: String },

    #[error("missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    #[error("no trades could be joined with sentiment data")]
    EmptyDataset,

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid filter parameter '{param}': {reason}")]
    InvalidFilter { param: String, reason: String },

    #[error("render error: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn invalid_filter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

impl From<&DashboardError> for std::process::ExitCode {
    fn from(err: &DashboardError) -> Self {
        let code: u8 = match err {
            DashboardError::Io(_) | DashboardError::Render { .. } => 1,
            DashboardError::ConfigParse { .. }
            | DashboardError::ConfigMissing { .. }
            | DashboardError::ConfigInvalid { .. } => 2,
            DashboardError::MissingInput { .. }
            | DashboardError::Csv { .. }
            | DashboardError::MissingColumn { .. }
            | DashboardError::EmptyDataset => 3,
            DashboardError::InvalidFilter { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
