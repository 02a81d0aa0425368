/*!
 * Error types for the lexlate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised by the archive codec
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The input bytes are not a readable ZIP container
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    /// Writing the output container failed
    #[error("Failed to write archive: {0}")]
    Write(String),
}

/// Errors raised while parsing an XML part
#[derive(Error, Debug, Clone)]
pub enum XmlError {
    /// The part is not well-formed XML
    #[error("Malformed XML in {path}: {message}")]
    Malformed {
        /// Part path inside the container
        path: String,
        /// Parser message
        message: String,
    },
}

/// Pipeline error taxonomy.
///
/// Part-level and batch-level failures are recorded and the run continues;
/// the remaining variants end the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The container could not be opened
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// A scanned part could not be parsed and was skipped
    #[error("Malformed part {path}: {message}")]
    MalformedPart {
        /// Part path inside the container
        path: String,
        /// Parser message
        message: String,
    },

    /// Nothing left to translate after parsing and filtering
    #[error("Document contains no translatable content")]
    NoTranslatableContent,

    /// A batch fell back to its original text
    #[error("Batch {batch_id} failed after {attempts} attempt(s): {message}")]
    BatchTranslationFailed {
        /// Batch identifier
        batch_id: usize,
        /// Number of attempts made
        attempts: u32,
        /// Last collaborator error
        message: String,
    },

    /// The output container could not be produced
    #[error("Rebuild failed: {0}")]
    RebuildFailed(String),

    /// The run was cancelled before completion
    #[error("Translation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Whether this error ends the run
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MalformedPart { .. } | Self::BatchTranslationFailed { .. }
        )
    }
}

impl From<ArchiveError> for PipelineError {
    fn from(error: ArchiveError) -> Self {
        match error {
            ArchiveError::Corrupt(message) => Self::CorruptArchive(message),
            ArchiveError::Write(message) => Self::RebuildFailed(message),
        }
    }
}

impl From<XmlError> for PipelineError {
    fn from(error: XmlError) -> Self {
        match error {
            XmlError::Malformed { path, message } => Self::MalformedPart { path, message },
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the document pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
