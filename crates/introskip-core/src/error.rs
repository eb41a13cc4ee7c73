//! Unified error type for introskip.
//!
//! Every component reports failures through [`Error`]. None of these reach the
//! playback client: the proxy recovers each kind at the component boundary by
//! degrading (unknown length, weaker strategy, or a redirect to the original
//! source). HTTP adapters use [`Error::http_status`] for the few requests that
//! are rejected before the pipeline runs.

/// Unified error type covering all failure modes in introskip.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffprobe) failed to run or returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Probing a remote source failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// A manifest could not be built because the byte ranges are impossible.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Probe(_) => 502,
            Error::Invariant(_) => 422,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Invariant`].
    pub fn invariant(message: impl Into<String>) -> Self {
        Error::Invariant(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
