use crate::query;
use std::{io, path::PathBuf};

/// Shorthand for results produced by this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure this crate can report.
///
/// Variants fall into three groups:
/// - **caller misuse** - invalid arguments, reported before anything is touched
/// - **stream state** - operating on a stream that cannot do what was asked,
///   or an underlying I/O call failing
/// - **decoding** - a request body that cannot be decoded at all
///
/// Nothing is retried internally. A missing `name` in a multipart block or a
/// malformed JSON body are not errors; they are skipped or left unset.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Caller misuse
    #[error("uploaded file not found: {}", .0.display())]
    UploadNotFound(PathBuf),
    #[error("upload error status must be one of the known codes, got {0}")]
    InvalidUploadCode(i64),
    #[error("invalid request target provided; cannot contain whitespace")]
    InvalidRequestTarget,
    #[error("invalid path provided for move operation; must be a non-empty path")]
    EmptyTargetPath,
    #[error("invalid path provided for move operation; {} is not writable", .0.display())]
    NotWritableTarget(PathBuf),
    #[error("uploaded file has already been moved")]
    AlreadyMoved,
    #[error("invalid status code {0}; must be between 100 and 599")]
    InvalidStatus(u16),
    #[error("invalid stream mode `{0}`")]
    InvalidMode(String),

    // Stream state
    #[error("stream is detached")]
    Detached,
    #[error("cannot read from non-readable stream")]
    NotReadable,
    #[error("cannot write to a non-writable stream")]
    NotWritable,
    #[error("stream is not seekable")]
    NotSeekable,
    #[error("stream I/O failed: {0}")]
    Io(#[from] io::Error),

    // Decoding
    #[error("can't find boundary in content type `{0}`")]
    MissingBoundary(String),
    #[error("too many multipart parts: limit={0}")]
    TooManyParts(usize),
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },
    #[error(transparent)]
    Query(#[from] query::Error),
}

impl Error {
    /// Whether the error comes from a caller passing an invalid argument.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::UploadNotFound(_)
                | Self::InvalidUploadCode(_)
                | Self::InvalidRequestTarget
                | Self::EmptyTargetPath
                | Self::NotWritableTarget(_)
                | Self::AlreadyMoved
                | Self::InvalidStatus(_)
                | Self::InvalidMode(_)
        )
    }

    /// Whether the error is a decoding failure of a request body.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::MissingBoundary(_)
                | Self::TooManyParts(_)
                | Self::BodyTooLarge { .. }
                | Self::Query(_)
        )
    }
}
