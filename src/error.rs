use thiserror::Error;

use crate::page::PageId;

/// External inpaint service failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InpaintFailure {
    /// The request exceeded the configured timeout.
    Timeout,
    /// Transport failure or non-success HTTP status.
    ServiceUnavailable,
    /// The reply could not be decoded, or its dimensions did not match the crop.
    MalformedResponse,
}

impl std::fmt::Display for InpaintFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InpaintFailure::Timeout => write!(f, "timeout"),
            InpaintFailure::ServiceUnavailable => write!(f, "service unavailable"),
            InpaintFailure::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RetouchError {
    /// No mask source supplied: neither OCR boxes nor strokes produced pixels.
    #[error("Empty mask region: no boxes or strokes to repair")]
    EmptyRegion,

    /// External inpaint service failure. State is left untouched; retryable.
    #[error("Inpaint service error: {0}")]
    Inpaint(InpaintFailure),

    /// Reference to a page that is not (or no longer) in the document.
    #[error("Unknown page: {0}")]
    UnknownPage(PageId),

    /// A regeneration for this page is already in flight.
    #[error("Regeneration already in flight for page {0}")]
    RegenInFlight(PageId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Version store error: {0}")]
    VersionError(String),

    #[error("Document error: {0}")]
    DocumentError(String),

    #[error("Project store error: {0}")]
    ProjectError(String),

    #[error("Job error: {0}")]
    JobError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`RetouchError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl RetouchError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create an image error.
    image => ImageError,
    /// Create a version store error.
    version => VersionError,
    /// Create a document error.
    document => DocumentError,
    /// Create a project store error.
    project => ProjectError,
    /// Create a job error.
    job => JobError,
}

impl From<image::ImageError> for RetouchError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageError(e.to_string())
    }
}

impl From<serde_json::Error> for RetouchError {
    fn from(e: serde_json::Error) -> Self {
        Self::ProjectError(e.to_string())
    }
}

impl From<serde_yml::Error> for RetouchError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<reqwest::Error> for RetouchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Inpaint(InpaintFailure::Timeout)
        } else {
            Self::Inpaint(InpaintFailure::ServiceUnavailable)
        }
    }
}

pub type Result<T> = std::result::Result<T, RetouchError>;
