//! Error types for the annotation widget.
//!
//! Failures are grouped by where they are recovered:
//! - [`ConfigError`] is raised at the call boundary, before anything is sent to
//!   the frontend, and is fatal to that call.
//! - [`ValidationError`] rejects a single mutation or ingested entry.
//! - [`FetchError`] is degraded to an unknown image size by the bridge.
//! - [`MediaError`] comes from resolving an image to a servable URL.

use thiserror::Error;

/// Errors detected while validating call-time parameters or loading config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `use_container_width` and the deprecated `use_column_width` were both set
    #[error(
        "`use_container_width` and `use_column_width` cannot be set at the same time; \
         please use `use_container_width` since `use_column_width` is deprecated"
    )]
    ConflictingWidthFlags,

    /// `bboxes` and `labels` must be parallel arrays
    #[error("`bboxes` has {bboxes} entries but `labels` has {labels}")]
    LengthMismatch {
        /// Number of boxes supplied
        bboxes: usize,
        /// Number of labels supplied
        labels: usize,
    },

    /// Line width must be a positive, finite number
    #[error("Invalid line width: {0}")]
    InvalidLineWidth(f32),

    /// At least one label is required to annotate anything
    #[error("`label_list` must contain at least one label")]
    EmptyLabelList,

    /// An initial label index does not point into `label_list`
    #[error("Initial label {label_id} at position {index} is outside a label list of {len}")]
    LabelOutOfRange {
        /// Position of the offending entry in `labels`
        index: usize,
        /// The offending label index
        label_id: i64,
        /// Number of labels available
        len: usize,
    },

    /// An initial box has non-finite or negative-size coordinates
    #[error("Invalid box at position {index}: {message}")]
    InvalidBox {
        /// Position of the offending entry in `bboxes`
        index: usize,
        /// Description of the problem
        message: String,
    },

    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A mutation or ingested entry referenced a label that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Label index outside the current label list
    #[error("Label {label_id} is out of range for {len} labels")]
    LabelOutOfRange {
        /// The rejected label index
        label_id: i64,
        /// Number of labels available
        len: usize,
    },
}

/// Errors that can occur while fetching an image to learn its size.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network failure or non-success HTTP status
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// Failure while reading the response body
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload is not an image format we can identify
    #[error("Could not identify image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Errors from turning an image source into a servable URL.
#[derive(Error, Debug)]
pub enum MediaError {
    /// Reading a local image file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The host has no origin to build an absolute URL from
    #[error("Missing origin for media URL")]
    MissingOrigin,
}

/// Any error the call boundary can surface to the caller.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Invalid call-time parameters
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The image could not be published to the media store
    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Reasons the store refuses an edit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// The box has no positive area inside the image once clamped
    #[error("Box is degenerate after clamping to the image")]
    Degenerate,

    /// The label does not exist
    #[error(transparent)]
    Label(#[from] ValidationError),
}
