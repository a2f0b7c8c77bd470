//! Uploaded files: a stream plus the metadata the client sent with it.

use crate::{
    errors::{Error, Result},
    http::{
        form::{FormArray, FormEntry},
        stream::{Body, Stream},
    },
};
use std::{io::Write, path::Path};
use tempfile::NamedTempFile;
use tracing::debug;

/// Outcome of an upload, with the conventional numeric codes.
///
/// Code `5` is unassigned.
///
/// # Examples
/// ```
/// use maker_message::UploadError;
///
/// assert_eq!(UploadError::try_from(4).unwrap(), UploadError::NoFile);
/// assert_eq!(UploadError::IniSize.code(), 1);
/// assert!(UploadError::try_from(5).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UploadError {
    #[default]
    Ok,
    /// Larger than the server-wide file size limit.
    IniSize,
    /// Larger than the limit declared by the form.
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    /// Stopped by an extension.
    Extension,
}

impl UploadError {
    pub const fn code(self) -> i64 {
        match self {
            Self::Ok => 0,
            Self::IniSize => 1,
            Self::FormSize => 2,
            Self::Partial => 3,
            Self::NoFile => 4,
            Self::NoTmpDir => 6,
            Self::CantWrite => 7,
            Self::Extension => 8,
        }
    }

    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl TryFrom<i64> for UploadError {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        Ok(match code {
            0 => Self::Ok,
            1 => Self::IniSize,
            2 => Self::FormSize,
            3 => Self::Partial,
            4 => Self::NoFile,
            6 => Self::NoTmpDir,
            7 => Self::CantWrite,
            8 => Self::Extension,
            _ => return Err(Error::InvalidUploadCode(code)),
        })
    }
}

/// A file received with a request.
///
/// Clones share the stream. [`move_to`](UploadedFile::move_to) works once for
/// the file and all its clones: it closes the shared stream, and every later
/// move reports [Error::AlreadyMoved].
///
/// # Examples
/// ```
/// use maker_message::{Stream, UploadedFile};
///
/// let dir = tempfile::tempdir().unwrap();
/// let target = dir.path().join("hello.txt");
///
/// let file = UploadedFile::from_stream(
///     Stream::from_bytes("hi"),
///     Some("hello.txt"),
///     Some("text/plain"),
/// );
/// assert_eq!(file.size(), Some(2));
///
/// file.move_to(&target).unwrap();
/// assert_eq!(std::fs::read(&target).unwrap(), b"hi");
/// assert!(file.move_to(&target).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct UploadedFile {
    stream: Body,
    client_filename: Option<String>,
    client_media_type: Option<String>,
    size: Option<u64>,
    error: UploadError,
}

impl UploadedFile {
    /// Wraps a stream.
    ///
    /// When the stream was opened from a path, the filename and media type
    /// default to that path's file name and guessed type.
    pub fn from_stream(
        stream: impl Into<Body>,
        client_filename: Option<&str>,
        client_media_type: Option<&str>,
    ) -> Self {
        let stream = stream.into();

        let (size, filename, media_type) = {
            let mut inner = stream.stream_mut();
            let size = inner.size();
            let (filename, media_type) = match inner.uri() {
                Some(uri) => (file_name(uri), guess_media_type(uri)),
                None => (None, None),
            };
            (size, filename, media_type)
        };

        Self {
            stream,
            client_filename: client_filename.map(str::to_owned).or(filename),
            client_media_type: client_media_type.map(str::to_owned).or(media_type),
            size,
            error: UploadError::Ok,
        }
    }

    /// Opens an existing file for reading and writing.
    pub fn from_path(
        path: impl AsRef<Path>,
        client_filename: Option<&str>,
        client_media_type: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::UploadNotFound(path.to_path_buf()));
        }

        let stream = Stream::open(path, "r+")?;
        Ok(Self::from_stream(stream, client_filename, client_media_type))
    }

    /// An upload that failed before any content was stored.
    pub fn failed(
        error: UploadError,
        client_filename: Option<&str>,
        client_media_type: Option<&str>,
    ) -> Self {
        Self {
            error,
            size: None,
            ..Self::from_stream(Stream::memory(), client_filename, client_media_type)
        }
    }

    /// Same file with a different error status.
    #[must_use]
    pub fn with_error(&self, error: UploadError) -> Self {
        Self {
            error,
            ..self.clone()
        }
    }
}

// Public API
impl UploadedFile {
    /// The content stream; errors once the file has been moved.
    pub fn stream(&self) -> Result<&Body> {
        match self.stream.stream().is_detached() {
            true => Err(Error::AlreadyMoved),
            false => Ok(&self.stream),
        }
    }

    #[inline]
    pub fn client_filename(&self) -> Option<&str> {
        self.client_filename.as_deref()
    }

    #[inline]
    pub fn client_media_type(&self) -> Option<&str> {
        self.client_media_type.as_deref()
    }

    /// Size captured when the file was created.
    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub fn error(&self) -> UploadError {
        self.error
    }

    /// Writes the content to `target` and closes the stream.
    ///
    /// The content goes to a temporary file next to `target`, which is then
    /// renamed over it, so a failure never leaves a partial file behind.
    pub fn move_to(&self, target: impl AsRef<Path>) -> Result<()> {
        let target = target.as_ref();
        if target.as_os_str().is_empty() {
            return Err(Error::EmptyTargetPath);
        }

        let mut stream = self.stream.stream_mut();
        if stream.is_detached() {
            return Err(Error::AlreadyMoved);
        }

        let directory = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(directory)
            .map_err(|_| Error::NotWritableTarget(target.to_path_buf()))?;

        if stream.is_seekable() {
            stream.rewind()?;
        }
        loop {
            let chunk = stream.read(64 * 1024)?;
            if chunk.is_empty() {
                break;
            }
            staged.write_all(&chunk)?;
        }

        staged.persist(target).map_err(|err| Error::Io(err.error))?;
        stream.close();

        debug!(
            path = %target.display(),
            filename = ?self.client_filename,
            "Uploaded file moved"
        );
        Ok(())
    }
}

/// Uploaded files keyed by base field name, with the same bracket
/// convention as [Params](crate::form::Params).
pub type UploadedFiles = FormArray<FormEntry<UploadedFile>>;

#[inline]
fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[inline]
fn guess_media_type(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(str::to_owned)
}
