//! Request decoding limits
//!
//! # Security-First Defaults
//!
//! Default limits are intentionally conservative to prevent:
//! - Memory exhaustion through huge bodies
//! - Part flooding in multipart bodies
//! - Query parameter explosion
//!
//! Every struct implements [Default]; override only what you need.
//!
//! # Examples
//!
//! ```
//! use maker_message::{Environment, ServerRequest, limits::{MultipartLimits, ReqLimits}};
//!
//! let limits = ReqLimits {
//!     body_size: 64 * 1024 * 1024, // Large uploads
//!     multipart: MultipartLimits {
//!         max_file_size: 32 * 1024 * 1024,
//!         ..MultipartLimits::default()
//!     },
//!     ..ReqLimits::default()
//! };
//!
//! let request = ServerRequest::from_environment_with(&Environment::new(), &limits).unwrap();
//! assert_eq!(request.method(), "GET");
//! ```

use std::path::PathBuf;

/// Limits applied while building a [ServerRequest](crate::ServerRequest)
/// from an [Environment](crate::Environment).
///
/// # Errors
///
/// Exceeding a limit aborts population with:
/// - [Error::BodyTooLarge](crate::Error::BodyTooLarge) for `body_size`
/// - [Error::Query](crate::Error::Query) for `query_parts`
/// - [Error::TooManyParts](crate::Error::TooManyParts) for `multipart.max_parts`
#[derive(Debug, Clone)]
pub struct ReqLimits {
    /// Maximum number of bytes read from the body for decoding (default: `8 MB`)
    ///
    /// Only JSON and multipart bodies are read. Other bodies stay untouched
    /// in the stream.
    pub body_size: usize,
    /// Maximum number of query parameters decoded from `QUERY_STRING` (default: `64`)
    pub query_parts: usize,
    /// Decode `multipart/form-data` bodies of `POST` requests too (default: `false`)
    ///
    /// By default a `POST` body is expected to be decoded already by the
    /// platform and is taken from the form snapshot of the environment.
    pub decode_multipart_on_post: bool,
    /// Limits of the multipart decoder.
    pub multipart: MultipartLimits,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ReqLimits {
    fn default() -> Self {
        Self {
            body_size: 8 * 1024 * 1024, // Room for a few small uploads
            query_parts: 64,            // Generous for filtering APIs
            decode_multipart_on_post: false,
            multipart: MultipartLimits::default(),

            _priv: (),
        }
    }
}

/// Limits of the [MultipartDecoder](crate::MultipartDecoder).
///
/// | Limit           | Exceeded                                              |
/// |-----------------|-------------------------------------------------------|
/// | `max_parts`     | the whole decode fails                                |
/// | `max_file_size` | that file is kept with [UploadError::IniSize](crate::UploadError::IniSize) and no content |
#[derive(Debug, Clone)]
pub struct MultipartLimits {
    /// Maximum number of parts between boundaries (default: `128`)
    ///
    /// Counts every block, including the ones skipped for lacking a name.
    pub max_parts: usize,
    /// Maximum size of one uploaded file in bytes (default: `4 MB`)
    pub max_file_size: usize,
    /// Directory for spooled uploads (default: the system temporary directory)
    pub temp_dir: Option<PathBuf>,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for MultipartLimits {
    fn default() -> Self {
        Self {
            max_parts: 128,
            max_file_size: 4 * 1024 * 1024,
            temp_dir: None,

            _priv: (),
        }
    }
}
