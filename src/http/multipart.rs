//! `multipart/form-data` decoder.
//!
//! Body layout:
//! ```text
//! preamble
//! --BOUNDARY\r\n
//! Content-Disposition: form-data; name="title"\r\n
//! \r\n
//! Hello\r\n
//! --BOUNDARY\r\n
//! Content-Disposition: form-data; name="upload"; filename="x.txt"\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! hi\r\n
//! --BOUNDARY--\r\n
//! ```

use crate::{
    errors::{Error, Result},
    http::{
        form::Params,
        stream::Stream,
        upload::{UploadError, UploadedFile, UploadedFiles},
    },
    limits::MultipartLimits,
};
use memchr::memmem;
use std::{borrow::Cow, fs::File};
use tracing::{debug, warn};

/// Decoded fields and files of a multipart body.
#[derive(Debug, Clone, Default)]
pub struct MultipartFormData {
    pub params: Params,
    pub files: UploadedFiles,
}

/// Decodes `multipart/form-data` bodies into [Params] and [UploadedFiles].
///
/// - Blocks without a `name` in their `Content-Disposition` are skipped,
///   this covers the preamble and the closing `--`.
/// - `name[]` appends, `name[key]` inserts under `key`, a plain name
///   overwrites.
/// - A block with a `filename` is a file: its content is spooled to a fresh
///   temporary file.
///
/// # Examples
/// ```
/// use maker_message::{MultipartDecoder, form::FormEntry};
///
/// let body = "--XyZ\r\n\
///     Content-Disposition: form-data; name=\"tags[]\"\r\n\r\na\r\n\
///     --XyZ\r\n\
///     Content-Disposition: form-data; name=\"tags[]\"\r\n\r\nb\r\n\
///     --XyZ--\r\n";
///
/// let data = MultipartDecoder::default()
///     .decode(body.as_bytes(), "multipart/form-data; boundary=XyZ")
///     .unwrap();
///
/// let tags = data.params.get("tags").and_then(FormEntry::as_array).unwrap();
/// assert_eq!(tags.values().collect::<Vec<_>>(), ["a", "b"]);
/// assert!(data.files.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultipartDecoder {
    limits: MultipartLimits,
}

impl MultipartDecoder {
    #[inline]
    pub fn new(limits: MultipartLimits) -> Self {
        Self { limits }
    }

    /// Decodes `body` using the boundary declared in `content_type`.
    ///
    /// # Errors
    /// - [Error::MissingBoundary] when `content_type` declares no boundary
    /// - [Error::TooManyParts] when the body has more parts than allowed
    pub fn decode(&self, body: &[u8], content_type: &str) -> Result<MultipartFormData> {
        let boundary = boundary(content_type)
            .ok_or_else(|| Error::MissingBoundary(content_type.to_owned()))?;
        let delimiter = format!("--{boundary}");

        let blocks = split_blocks(body, delimiter.as_bytes(), self.limits.max_parts)?;
        let mut data = MultipartFormData::default();

        for block in blocks {
            let Some(part) = Part::parse(block) else {
                continue;
            };

            match part.filename.as_deref() {
                Some(filename) => {
                    let file = self.upload(&part, filename);
                    data.files.insert_field(&part.name, file);
                }
                None => {
                    let value = match from_utf8_fast(part.body) {
                        Some(value) => value.to_owned(),
                        None => String::from_utf8_lossy(part.body).into_owned(),
                    };
                    data.params.insert_field(&part.name, value);
                }
            }
        }

        debug!(
            params = data.params.field_count(),
            files = data.files.field_count(),
            "Multipart body decoded"
        );
        Ok(data)
    }

    fn upload(&self, part: &Part<'_>, filename: &str) -> UploadedFile {
        let media_type = part.content_type.as_deref();

        if filename.is_empty() && part.body.is_empty() {
            return UploadedFile::failed(UploadError::NoFile, None, media_type);
        }
        if part.body.len() > self.limits.max_file_size {
            warn!(
                field = %part.name,
                filename,
                size = part.body.len(),
                limit = self.limits.max_file_size,
                "Uploaded file exceeds size limit, content dropped"
            );
            return UploadedFile::failed(UploadError::IniSize, Some(filename), media_type);
        }

        let file = match self.spool_file() {
            Ok(file) => file,
            Err(err) => {
                warn!(field = %part.name, error = %err, "Can't create temporary file for upload");
                return UploadedFile::failed(UploadError::NoTmpDir, Some(filename), media_type);
            }
        };

        let mut stream = Stream::from_file(file);
        if let Err(err) = stream.write(part.body).and_then(|_| stream.rewind()) {
            warn!(field = %part.name, error = %err, "Can't write upload to temporary file");
            return UploadedFile::failed(UploadError::CantWrite, Some(filename), media_type);
        }

        UploadedFile::from_stream(stream, Some(filename), media_type)
    }

    #[inline]
    fn spool_file(&self) -> std::io::Result<File> {
        match &self.limits.temp_dir {
            Some(dir) => tempfile::tempfile_in(dir),
            None => tempfile::tempfile(),
        }
    }
}

/// The `boundary` parameter of a content type.
///
/// Everything after `boundary=` up to the next `;`, without surrounding
/// quotes. `None` when absent or empty.
///
/// # Examples
/// ```
/// use maker_message::multipart::boundary;
///
/// assert_eq!(boundary("multipart/form-data; boundary=abc"), Some("abc"));
/// assert_eq!(boundary("multipart/form-data; boundary=\"a b\"; x=y"), Some("a b"));
/// assert_eq!(boundary("multipart/form-data"), None);
/// ```
pub fn boundary(content_type: &str) -> Option<&str> {
    let start = memmem::find(content_type.to_ascii_lowercase().as_bytes(), b"boundary=")? + 9;
    let rest = &content_type[start..];

    let value = rest.split(';').next().unwrap_or_default().trim();
    let value = value
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
        .unwrap_or(value);

    (!value.is_empty()).then_some(value)
}

// Blocks between delimiters, the preamble included.
fn split_blocks<'a>(body: &'a [u8], delimiter: &[u8], max_parts: usize) -> Result<Vec<&'a [u8]>> {
    let mut blocks = Vec::new();
    let mut start = 0;

    for position in memmem::find_iter(body, delimiter) {
        blocks.push(&body[start..position]);
        start = position + delimiter.len();

        // Preamble plus the closing `--` block
        if blocks.len() > max_parts + 1 {
            return Err(Error::TooManyParts(max_parts));
        }
    }
    blocks.push(&body[start..]);

    Ok(blocks)
}

#[inline]
fn from_utf8_fast(bytes: &[u8]) -> Option<&str> {
    simdutf8::basic::from_utf8(bytes).ok()
}

// PART

#[derive(Debug)]
struct Part<'a> {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    body: &'a [u8],
}

impl<'a> Part<'a> {
    // `None` for blocks without a disposition name
    fn parse(block: &'a [u8]) -> Option<Self> {
        let start = block
            .iter()
            .position(|b| !matches!(b, b'\r' | b'\n'))
            .unwrap_or(block.len());
        let (head, body) = split_head(&block[start..]);
        // Header bytes outside UTF-8 (Latin-1 filenames) are replaced, not fatal
        let head: Cow<'_, str> = String::from_utf8_lossy(head);

        let mut disposition = None;
        let mut content_type = None;
        for line in head.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };

            let key = key.trim();
            if key.eq_ignore_ascii_case("content-disposition") {
                disposition = Some(value.trim());
            } else if key.eq_ignore_ascii_case("content-type") {
                let value = value.split(';').next().unwrap_or_default().trim();
                content_type = (!value.is_empty()).then(|| value.to_owned());
            }
        }

        let disposition = disposition?;
        let Some(name) = disposition_param(disposition, "name") else {
            debug!(disposition, "Multipart block without a name skipped");
            return None;
        };

        Some(Part {
            name: name.to_owned(),
            filename: disposition_param(disposition, "filename").map(str::to_owned),
            content_type,
            body: trim_line_breaks(body),
        })
    }
}

// Header block and body, split at the first blank line
fn split_head(block: &[u8]) -> (&[u8], &[u8]) {
    let crlf = memmem::find(block, b"\r\n\r\n").map(|at| (at, 4));
    let lf = memmem::find(block, b"\n\n").map(|at| (at, 2));

    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((at, len)) => (&block[..at], &block[at + len..]),
        None => (block, &[]),
    }
}

#[inline]
fn trim_line_breaks(mut body: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = body {
        body = rest;
    }
    body
}

/// Value of `param` in a disposition like `form-data; name="a"; filename="b"`.
///
/// Quoted values end at the next quote, unquoted ones at the next `;`.
fn disposition_param<'a>(disposition: &'a str, param: &str) -> Option<&'a str> {
    let mut rest = disposition;

    while !rest.is_empty() {
        rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());

        let key_end = rest.find(['=', ';']).unwrap_or(rest.len());
        let key = rest[..key_end].trim();
        rest = &rest[key_end..];

        let Some(after_eq) = rest.strip_prefix('=') else {
            continue;
        };
        let after_eq = after_eq.trim_start();

        let (value, next) = match after_eq.strip_prefix('"') {
            Some(quoted) => {
                let end = quoted.find('"').unwrap_or(quoted.len());
                (&quoted[..end], quoted.get(end + 1..).unwrap_or_default())
            }
            None => {
                let end = after_eq.find(';').unwrap_or(after_eq.len());
                (after_eq[..end].trim_end(), &after_eq[end..])
            }
        };

        if key.eq_ignore_ascii_case(param) {
            return Some(value);
        }
        rest = next;
    }

    None
}
