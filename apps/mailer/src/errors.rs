use std::path::PathBuf;

use thiserror::Error;

/// Startup errors. Anything raised here aborts the run before the first posting;
/// once the batch is running, failures are recorded as outcomes instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Attachment not found: {}", .0.display())]
    MissingAttachment(PathBuf),

    #[error("Cannot read links file {}: {source}", path.display())]
    LinksFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build client: {0}")]
    ClientBuild(String),
}

impl AppError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::MissingAttachment(_) => "MISSING_ATTACHMENT",
            AppError::LinksFile { .. } => "LINKS_FILE_ERROR",
            AppError::ClientBuild(_) => "CLIENT_BUILD_ERROR",
        }
    }
}
