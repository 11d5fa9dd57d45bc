/*!
 * Error types for the subburn application.
 *
 * This module contains custom error types for the different stages of a
 * burn-in job, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;

use thiserror::Error;

use crate::render::EncodePath;

/// Errors produced while converting SRT timestamps
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimecodeError {
    /// The value does not follow the `H:MM:SS,mmm` grammar
    #[error("Malformed timestamp: '{0}'")]
    MalformedTimestamp(String),
}

/// Reasons a caption block is skipped during transcoding.
///
/// None of these abort a job; the block is dropped and processing continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtitleError {
    /// Fewer than index, timing and text lines
    #[error("block has {lines} line(s), at least 3 are required")]
    BlockTooShort {
        /// Number of non-blank lines found
        lines: usize,
    },

    /// Second line is not a `start --> end` pair
    #[error("missing timing line, found '{0}'")]
    MissingTimingLine(String),

    /// One side of the timing line failed to convert
    #[error("{0}")]
    Timestamp(#[from] TimecodeError),

    /// End of the cue precedes its start
    #[error("cue ends ({end}) before it starts ({start})")]
    InvertedRange {
        /// Converted start
        start: String,
        /// Converted end
        end: String,
    },

    /// Only whitespace after the timing line
    #[error("cue text is empty")]
    EmptyText,
}

/// Errors that can occur while rendering a job
#[derive(Error, Debug)]
pub enum RenderError {
    /// Video geometry could not be determined
    #[error("Probe failed: {0}")]
    ProbeFailed(String),

    /// The external encoder exited unsuccessfully
    #[error("Encode failed on {path} path: {message}")]
    EncodeFailed {
        /// Which encoder configuration failed
        path: EncodePath,
        /// Filtered encoder diagnostics
        message: String,
    },

    /// An external process exceeded its configured time budget
    #[error("{tool} timed out after {secs} seconds")]
    Timeout {
        /// Tool name (ffmpeg, ffprobe)
        tool: String,
        /// Budget in seconds
        secs: u64,
    },

    /// Filesystem problem inside the job workspace
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the storage collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    /// An input could not be downloaded or copied
    #[error("Failed to fetch '{location}': {message}")]
    FetchFailed {
        /// Source URL or path
        location: String,
        /// Underlying cause
        message: String,
    },

    /// The rendered artifact could not be stored
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// The job specification is incomplete
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// Error from rendering
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Error from storage
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Upload failed, the render was kept for manual recovery
    #[error("{source} (render kept at {})", kept_at.display())]
    UploadFailedArtifactKept {
        /// Underlying storage error
        source: StorageError,
        /// Where the artifact was moved to
        kept_at: PathBuf,
    },

    /// Upload failed and the render could not be moved out of the workspace
    #[error("{source} (render could not be kept: {keep_error})")]
    UploadFailedArtifactLost {
        /// Underlying storage error
        source: StorageError,
        /// Why the move failed
        keep_error: String,
    },

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(format!("{:#}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
