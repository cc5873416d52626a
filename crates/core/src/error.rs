use std::path::PathBuf;

/// Result alias that carries the custom [`StemMixError`] type.
pub type Result<T> = std::result::Result<T, StemMixError>;

/// Common error type for the core crate.
///
/// Per-file and per-track variants are recoverable: the batch logs them and
/// moves on. Only [`StemMixError::is_batch_fatal`] errors stop a run.
#[derive(Debug, thiserror::Error)]
pub enum StemMixError {
    /// A file name did not follow `<track>_<channel>_<type>.<ext>`.
    #[error("invalid stem file name `{file_name}`: {reason}")]
    Parse { file_name: String, reason: String },
    /// The input directory could not be listed.
    #[error("error reading input directory {path:?}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The stems of a track do not have the shape its mix strategy needs.
    #[error("cannot build mix for track {track}: {reason}")]
    StrategyBuild { track: u32, reason: String },
    /// An external program failed to start or exited unsuccessfully.
    #[error("`{program}` failed: {reason}")]
    ExternalTool { program: String, reason: String },
    /// The extraction tool printed stream metadata we could not decode.
    #[error("failed to decode stream info: {0}")]
    StreamInfo(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl StemMixError {
    pub(crate) fn parse(file_name: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            file_name: file_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn build(track: u32, reason: impl Into<String>) -> Self {
        Self::StrategyBuild {
            track,
            reason: reason.into(),
        }
    }

    pub(crate) fn tool(program: &str, reason: impl Into<String>) -> Self {
        Self::ExternalTool {
            program: program.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true when the error leaves the batch without any work to do.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            StemMixError::DirectoryRead { .. } | StemMixError::Config(_)
        )
    }
}
