//! Byte streams with explicit capabilities, and the shared body handle.

use crate::errors::{Error, Result};
use std::{
    cell::{Ref, RefCell, RefMut},
    fmt,
    fs::{File, OpenOptions},
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    rc::Rc,
};

/// The resource a [Stream] wraps.
///
/// Implemented for in-memory buffers and files; anything readable can be
/// wrapped with [Stream::from_reader].
pub trait StreamResource: Read + Write + Seek + fmt::Debug {
    /// Total size in bytes, when the resource knows it.
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

impl StreamResource for Cursor<Vec<u8>> {
    fn size_hint(&self) -> Option<u64> {
        Some(self.get_ref().len() as u64)
    }
}

impl StreamResource for File {
    fn size_hint(&self) -> Option<u64> {
        self.metadata().ok().map(|meta| meta.len())
    }
}

struct ReadOnly(Box<dyn Read>);

impl fmt::Debug for ReadOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReadOnly(..)")
    }
}

impl Read for ReadOnly {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for ReadOnly {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for ReadOnly {
    fn seek(&mut self, _: SeekFrom) -> io::Result<u64> {
        Err(io::ErrorKind::Unsupported.into())
    }
}

impl StreamResource for ReadOnly {}

// MODE

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mode {
    readable: bool,
    writable: bool,
}

impl Mode {
    const READ_WRITE: Mode = Mode {
        readable: true,
        writable: true,
    };

    // `fopen`-style: r, r+, w, w+, a, a+, x, x+, c, c+ with optional `b`/`t`
    fn parse(mode: &str) -> Result<(Self, OpenOptions)> {
        let trimmed = mode.trim_end_matches(['b', 't']);
        let (base, plus) = match trimmed.strip_suffix('+') {
            Some(base) => (base, true),
            None => (trimmed, false),
        };
        let base = base.trim_end_matches(['b', 't']);

        let mut options = OpenOptions::new();
        match base {
            "r" => options.read(true).write(plus),
            "w" => options.write(true).read(plus).create(true).truncate(true),
            "a" => options.append(true).read(plus).create(true),
            "x" => options.write(true).read(plus).create_new(true),
            "c" => options.write(true).read(plus).create(true),
            _ => return Err(Error::InvalidMode(mode.to_owned())),
        };

        let mode = Mode {
            readable: base == "r" || plus,
            writable: base != "r" || plus,
        };
        Ok((mode, options))
    }
}

// STREAM

/// A byte sequence with readable/writable/seekable capability flags.
///
/// Every operation checks the matching capability first and fails with a
/// runtime error instead of touching the resource. After
/// [`detach`](Stream::detach) or [`close`](Stream::close) every operation
/// fails with [Error::Detached] and all capabilities report `false`.
///
/// # Examples
/// ```
/// use maker_message::Stream;
/// use std::io::SeekFrom;
///
/// let mut stream = Stream::memory();
/// stream.write(b"Hello, World!").unwrap();
/// stream.seek(SeekFrom::Start(7)).unwrap();
///
/// assert_eq!(stream.read(5).unwrap(), b"World");
/// assert_eq!(stream.read_all().unwrap(), b"Hello, World!");
/// ```
#[derive(Debug)]
pub struct Stream {
    resource: Option<Box<dyn StreamResource>>,
    readable: bool,
    writable: bool,
    seekable: bool,
    size: Option<u64>,
    uri: Option<PathBuf>,
    eof: bool,
}

impl Stream {
    fn with(resource: Box<dyn StreamResource>, mode: Mode, seekable: bool) -> Self {
        Self {
            resource: Some(resource),
            readable: mode.readable,
            writable: mode.writable,
            seekable,
            size: None,
            uri: None,
            eof: false,
        }
    }

    /// An empty, readable, writable and seekable in-memory stream.
    #[inline]
    pub fn memory() -> Self {
        Self::from_bytes(Vec::new())
    }

    /// An in-memory stream positioned at the start of `bytes`.
    #[inline]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with(Box::new(Cursor::new(bytes.into())), Mode::READ_WRITE, true)
    }

    /// A stream over an anonymous temporary file.
    pub fn temp() -> Result<Self> {
        Ok(Self::from_file(tempfile::tempfile()?))
    }

    /// A readable, writable and seekable stream over an open file.
    #[inline]
    pub fn from_file(file: File) -> Self {
        Self::with(Box::new(file), Mode::READ_WRITE, true)
    }

    /// Opens `path` with an `fopen`-style mode (`r`, `r+`, `w`, `w+`, `a`,
    /// `a+`, `x`, `x+`, `c`, `c+`); the mode decides the capabilities.
    ///
    /// # Examples
    /// ```no_run
    /// use maker_message::Stream;
    ///
    /// let stream = Stream::open("/tmp/report.csv", "r").unwrap();
    /// assert!(stream.is_readable());
    /// assert!(!stream.is_writable());
    /// ```
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self> {
        let path = path.as_ref();
        let (mode, options) = Mode::parse(mode)?;
        let file = options.open(path)?;

        let mut stream = Self::with(Box::new(file), mode, true);
        stream.uri = Some(path.to_path_buf());
        Ok(stream)
    }

    /// A readable, non-seekable, non-writable stream over any reader, such as
    /// the raw request input.
    #[inline]
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        let mode = Mode {
            readable: true,
            writable: false,
        };
        Self::with(Box::new(ReadOnly(Box::new(reader))), mode, false)
    }
}

// Public API
impl Stream {
    #[inline]
    pub fn is_readable(&self) -> bool {
        self.resource.is_some() && self.readable
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.resource.is_some() && self.writable
    }

    #[inline]
    pub fn is_seekable(&self) -> bool {
        self.resource.is_some() && self.seekable
    }

    #[inline]
    pub fn is_detached(&self) -> bool {
        self.resource.is_none()
    }

    /// Path of the underlying file, for streams created with [Stream::open].
    #[inline]
    pub fn uri(&self) -> Option<&Path> {
        self.uri.as_deref()
    }

    /// Total size in bytes, if known. The value is cached until the next write.
    pub fn size(&mut self) -> Option<u64> {
        if self.size.is_none() {
            self.size = self.resource.as_ref()?.size_hint();
        }
        self.size
    }

    /// Reads up to `length` bytes from the current position.
    pub fn read(&mut self, length: usize) -> Result<Vec<u8>> {
        let resource = self.readable_resource()?;
        if length == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = Vec::with_capacity(length.min(64 * 1024));
        let read = (&mut **resource)
            .take(length as u64)
            .read_to_end(&mut buffer)?;

        if read < length {
            self.eof = true;
        }
        Ok(buffer)
    }

    /// Reads everything from the current position to the end.
    pub fn get_contents(&mut self) -> Result<Vec<u8>> {
        let resource = self.readable_resource()?;

        let mut buffer = Vec::new();
        resource.read_to_end(&mut buffer)?;

        self.eof = true;
        Ok(buffer)
    }

    /// Rewinds (when seekable) and reads the whole stream.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        if self.is_seekable() {
            self.rewind()?;
        }
        self.get_contents()
    }

    /// Writes all of `data`, returning the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let resource = self.resource.as_mut().ok_or(Error::Detached)?;
        if !self.writable {
            return Err(Error::NotWritable);
        }

        self.size = None;
        resource.write_all(data)?;
        Ok(data.len())
    }

    pub fn seek(&mut self, position: SeekFrom) -> Result<u64> {
        let resource = self.resource.as_mut().ok_or(Error::Detached)?;
        if !self.seekable {
            return Err(Error::NotSeekable);
        }

        let offset = resource.seek(position)?;
        self.eof = false;
        Ok(offset)
    }

    #[inline]
    pub fn rewind(&mut self) -> Result<()> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    /// Current position.
    pub fn tell(&mut self) -> Result<u64> {
        let resource = self.resource.as_mut().ok_or(Error::Detached)?;
        if !self.seekable {
            return Err(Error::NotSeekable);
        }
        Ok(resource.stream_position()?)
    }

    /// Whether a read has hit the end of the stream.
    pub fn eof(&self) -> Result<bool> {
        match self.resource {
            Some(_) => Ok(self.eof),
            None => Err(Error::Detached),
        }
    }

    /// Separates the underlying resource from the stream.
    pub fn detach(&mut self) -> Option<Box<dyn StreamResource>> {
        let resource = self.resource.take()?;

        self.size = None;
        self.uri = None;
        self.readable = false;
        self.writable = false;
        self.seekable = false;

        Some(resource)
    }

    /// Closes the stream and its resource.
    #[inline]
    pub fn close(&mut self) {
        if let Some(mut resource) = self.detach() {
            let _ = resource.flush();
        }
    }

    #[inline]
    fn readable_resource(&mut self) -> Result<&mut Box<dyn StreamResource>> {
        let resource = self.resource.as_mut().ok_or(Error::Detached)?;
        match self.readable {
            true => Ok(resource),
            false => Err(Error::NotReadable),
        }
    }
}

impl Default for Stream {
    fn default() -> Self {
        Self::memory()
    }
}

// BODY

/// Shared handle to a [Stream].
///
/// Cloning a message copies this handle, not the stream: two snapshots
/// derived from each other observe the same bytes until one of them gets a
/// new body. The handle is `!Send`, so a body can never cross a thread
/// boundary.
///
/// # Examples
/// ```
/// use maker_message::Body;
///
/// let body = Body::from("Hello");
/// let alias = body.clone();
///
/// alias.write(b", World!").unwrap();
/// assert_eq!(body.contents().unwrap(), b"Hello, World!");
/// assert!(body.ptr_eq(&alias));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Body(Rc<RefCell<Stream>>);

impl Body {
    #[inline]
    pub fn new(stream: Stream) -> Self {
        Body(Rc::new(RefCell::new(stream)))
    }

    /// Borrows the stream.
    ///
    /// # Panics
    /// Panics if the stream is currently mutably borrowed.
    #[inline]
    pub fn stream(&self) -> Ref<'_, Stream> {
        self.0.borrow()
    }

    /// Mutably borrows the stream.
    ///
    /// # Panics
    /// Panics if the stream is currently borrowed.
    #[inline]
    pub fn stream_mut(&self) -> RefMut<'_, Stream> {
        self.0.borrow_mut()
    }

    /// Whether both handles point at the same stream.
    #[inline]
    pub fn ptr_eq(&self, other: &Body) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Appends at the current position of the shared stream.
    #[inline]
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.stream_mut().write(data)
    }

    /// The whole stream content, see [Stream::read_all].
    #[inline]
    pub fn contents(&self) -> Result<Vec<u8>> {
        self.stream_mut().read_all()
    }
}

impl From<Stream> for Body {
    fn from(stream: Stream) -> Self {
        Body::new(stream)
    }
}

// Positioned at the end so writes append, like a stream just written to
impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        let mut stream = Stream::from_bytes(bytes);
        let _ = stream.seek(SeekFrom::End(0));
        Body::new(stream)
    }
}

impl From<&str> for Body {
    #[inline]
    fn from(text: &str) -> Self {
        Body::from(text.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_round_trip() {
        let mut stream = Stream::memory();
        assert_eq!(stream.write(b"abcdef").unwrap(), 6);
        assert_eq!(stream.tell().unwrap(), 6);
        assert_eq!(stream.size(), Some(6));

        stream.rewind().unwrap();
        assert_eq!(stream.read(4).unwrap(), b"abcd");
        assert!(!stream.eof().unwrap());

        assert_eq!(stream.read(10).unwrap(), b"ef");
        assert!(stream.eof().unwrap());

        stream.seek(SeekFrom::Start(1)).unwrap();
        assert!(!stream.eof().unwrap());
        assert_eq!(stream.get_contents().unwrap(), b"bcdef");
        assert_eq!(stream.read(0).unwrap(), b"");
    }

    #[test]
    fn reader_capabilities() {
        let mut stream = Stream::from_reader(&b"payload"[..]);

        assert!(stream.is_readable());
        assert!(!stream.is_writable());
        assert!(!stream.is_seekable());

        assert!(matches!(stream.write(b"x"), Err(Error::NotWritable)));
        assert!(matches!(stream.seek(SeekFrom::Start(0)), Err(Error::NotSeekable)));
        assert!(matches!(stream.tell(), Err(Error::NotSeekable)));
        assert_eq!(stream.size(), None);

        // No rewind for non-seekable streams, reads what's left
        assert_eq!(stream.read_all().unwrap(), b"payload");
        assert_eq!(stream.read_all().unwrap(), b"");
    }

    #[test]
    fn detached() {
        let mut stream = Stream::from_bytes("data");
        assert!(stream.detach().is_some());
        assert!(stream.detach().is_none());

        assert!(stream.is_detached());
        assert!(!stream.is_readable());
        assert!(!stream.is_writable());
        assert!(!stream.is_seekable());

        assert!(matches!(stream.read(1), Err(Error::Detached)));
        assert!(matches!(stream.write(b"x"), Err(Error::Detached)));
        assert!(matches!(stream.seek(SeekFrom::Start(0)), Err(Error::Detached)));
        assert!(matches!(stream.eof(), Err(Error::Detached)));
        assert!(matches!(stream.get_contents(), Err(Error::Detached)));
        assert_eq!(stream.size(), None);
    }

    #[test]
    fn open_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");

        #[rustfmt::skip]
        let cases = [
            ("w",   false, true),
            ("w+",  true,  true),
            ("r",   true,  false),
            ("r+",  true,  true),
            ("rb",  true,  false),
            ("a",   false, true),
            ("c+b", true,  true),
        ];

        for (mode, readable, writable) in cases {
            let stream = Stream::open(&path, mode).unwrap();
            assert_eq!(stream.is_readable(), readable, "{mode}");
            assert_eq!(stream.is_writable(), writable, "{mode}");
            assert!(stream.is_seekable());
            assert_eq!(stream.uri(), Some(path.as_path()));
        }

        assert!(matches!(Stream::open(&path, "q"), Err(Error::InvalidMode(_))));
        assert!(matches!(Stream::open(&path, "x"), Err(Error::Io(_))));
    }

    #[test]
    fn read_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("read.txt");
        std::fs::write(&path, "content").unwrap();

        let mut stream = Stream::open(&path, "r").unwrap();
        assert_eq!(stream.size(), Some(7));
        assert!(matches!(stream.write(b"x"), Err(Error::NotWritable)));
        assert_eq!(stream.read_all().unwrap(), b"content");

        stream.close();
        assert!(stream.is_detached());
        assert_eq!(stream.uri(), None);
    }

    #[test]
    fn body_sharing() {
        let first = Body::from("a");
        let second = first.clone();
        let other = Body::from("a");

        second.write(b"b").unwrap();
        assert_eq!(first.contents().unwrap(), b"ab");
        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&other));
    }

    #[test]
    fn body_conversions_append() {
        let bodies = [Body::from("ab"), Body::from(b"ab".to_vec())];

        for body in bodies {
            assert_eq!(body.stream_mut().tell().unwrap(), 2);
            body.write(b"c").unwrap();
            assert_eq!(body.contents().unwrap(), b"abc");
        }
    }
}
