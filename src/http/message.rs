//! The message core: protocol version, headers and body, with copy-on-write
//! mutators.
//!
//! Every message type comes in two flavours:
//!
//! - the plain value (`Message`, [Request](crate::Request), ...): each
//!   `with_*` leaves the receiver untouched and returns a modified clone;
//! - [Mutable]: each `with_*` changes the wrapped value in place and returns
//!   the very same object, so calls chain without cloning.
//!
//! Clones copy the headers and share the [Body].

use crate::http::{
    headers::{HeaderValues, Headers},
    stream::Body,
};
use std::ops::Deref;

/// Generates both `with_*` flavours from private setters.
///
/// ```text
/// copy_on_write! { Uri {
///     fn with_host(host: &str) => set_host;     // infallible setter
///     fn with_port(port: u16) => set_port?;     // setter returning Result<()>
/// }}
/// ```
macro_rules! copy_on_write {
    ($ty:ty { $($body:tt)* }) => {
        $crate::http::message::copy_on_write!(@each $ty; $($body)*);
    };

    (@each $ty:ty;) => {};

    (@each $ty:ty;
        $(#[$meta:meta])*
        fn $with:ident($($arg:ident: $arg_ty:ty),*) => $set:ident?;
        $($rest:tt)*
    ) => {
        impl $ty {
            $(#[$meta])*
            pub fn $with(&self, $($arg: $arg_ty),*) -> $crate::errors::Result<Self> {
                let mut next = self.clone();
                next.$set($($arg),*)?;
                Ok(next)
            }
        }

        impl $crate::http::message::Mutable<$ty> {
            $(#[$meta])*
            pub fn $with(&mut self, $($arg: $arg_ty),*) -> $crate::errors::Result<&mut Self> {
                self.0.$set($($arg),*)?;
                Ok(self)
            }
        }

        $crate::http::message::copy_on_write!(@each $ty; $($rest)*);
    };

    (@each $ty:ty;
        $(#[$meta:meta])*
        fn $with:ident($($arg:ident: $arg_ty:ty),*) => $set:ident;
        $($rest:tt)*
    ) => {
        impl $ty {
            $(#[$meta])*
            #[must_use = "the receiver is left untouched, use the returned value"]
            pub fn $with(&self, $($arg: $arg_ty),*) -> Self {
                let mut next = self.clone();
                next.$set($($arg),*);
                next
            }
        }

        impl $crate::http::message::Mutable<$ty> {
            $(#[$meta])*
            pub fn $with(&mut self, $($arg: $arg_ty),*) -> &mut Self {
                self.0.$set($($arg),*);
                self
            }
        }

        $crate::http::message::copy_on_write!(@each $ty; $($rest)*);
    };
}

/// The header and body mutators every message type shares.
macro_rules! message_copy_on_write {
    ($ty:ty) => {
        $crate::http::message::copy_on_write! { $ty {
            /// Replaces every case-insensitive match of `name`.
            fn with_header(name: &str, values: impl $crate::http::headers::HeaderValues) => set_header;
            /// Appends to an existing header; does nothing when `name` is absent.
            fn with_added_header(name: &str, values: impl $crate::http::headers::HeaderValues) => set_added_header;
            fn without_header(name: &str) => remove_header;
            fn with_body(body: impl Into<$crate::http::stream::Body>) => set_body;
            fn with_protocol_version(version: &str) => set_protocol_version;
        }}
    };
}

pub(crate) use {copy_on_write, message_copy_on_write};

// MUTABLE

/// The in-place flavour of a message type.
///
/// Getters come through [Deref]; `with_*` mutate the wrapped value and return
/// `&mut Self`, preserving identity.
///
/// # Examples
/// ```
/// use maker_message::{HttpMessage, Message};
///
/// let mut message = Message::new().into_mutable();
/// let before: *const _ = &message;
/// let after: *const _ = message
///     .with_header("X-Api-Key", "101010")
///     .with_protocol_version("2.0");
///
/// assert!(std::ptr::eq(before, after));
/// assert_eq!(message.protocol_version(), "2.0");
/// assert!(message.has_header("x-api-key"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mutable<T>(pub(crate) T);

impl<T> Mutable<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Mutable(value)
    }

    /// Returns the plain value, switching back to copy-on-write.
    #[inline]
    pub fn freeze(self) -> T {
        self.0
    }
}

impl<T> Deref for Mutable<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Mutable<T> {
    #[inline]
    fn from(value: T) -> Self {
        Mutable(value)
    }
}

// MESSAGE

/// Protocol version, headers and body.
///
/// # Examples
/// ```
/// use maker_message::{HttpMessage, Message};
///
/// let a = Message::new();
/// let b = a.with_protocol_version("2.0").with_header("X", ["a", "b"]);
///
/// assert_eq!(a.protocol_version(), "1.1");
/// assert_eq!(b.protocol_version(), "2.0");
/// assert_eq!(b.header_line("x"), "a, b");
/// assert!(a.headers().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    protocol_version: String,
    headers: Headers,
    body: Body,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            protocol_version: "1.1".to_owned(),
            headers: Headers::new(),
            body: Body::default(),
        }
    }
}

impl Message {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a message from its parts; an empty version means `1.1`.
    pub fn from_parts(headers: Headers, body: impl Into<Body>, protocol_version: &str) -> Self {
        let mut message = Self {
            headers,
            body: body.into(),
            ..Self::default()
        };
        if !protocol_version.is_empty() {
            message.set_protocol_version(protocol_version);
        }
        message
    }
}

/// Read access shared by all message types.
pub trait HttpMessage {
    fn message(&self) -> &Message;

    #[inline]
    fn protocol_version(&self) -> &str {
        &self.message().protocol_version
    }

    /// All headers, in insertion order and with the casing they were set with.
    #[inline]
    fn headers(&self) -> &Headers {
        &self.message().headers
    }

    /// Values of a header matched case-insensitively; empty when absent.
    #[inline]
    fn header(&self, name: &str) -> &[String] {
        self.message().headers.get(name)
    }

    /// Values of a header joined with `", "`; empty when absent.
    #[inline]
    fn header_line(&self, name: &str) -> String {
        self.message().headers.line(name)
    }

    #[inline]
    fn has_header(&self, name: &str) -> bool {
        self.message().headers.contains(name)
    }

    #[inline]
    fn body(&self) -> &Body {
        &self.message().body
    }

    /// Switches to the in-place flavour.
    #[inline]
    fn into_mutable(self) -> Mutable<Self>
    where
        Self: Sized,
    {
        Mutable(self)
    }
}

pub(crate) trait MessageMut {
    fn message_mut(&mut self) -> &mut Message;

    #[inline]
    fn set_header(&mut self, name: &str, values: impl HeaderValues) {
        self.message_mut().headers.set(name, values);
    }

    #[inline]
    fn set_added_header(&mut self, name: &str, values: impl HeaderValues) {
        self.message_mut().headers.append(name, values);
    }

    #[inline]
    fn remove_header(&mut self, name: &str) {
        self.message_mut().headers.remove(name);
    }

    #[inline]
    fn set_body(&mut self, body: impl Into<Body>) {
        self.message_mut().body = body.into();
    }

    fn set_protocol_version(&mut self, version: &str) {
        self.message_mut().protocol_version = version.to_owned();
    }
}

impl HttpMessage for Message {
    #[inline]
    fn message(&self) -> &Message {
        self
    }
}

impl MessageMut for Message {
    #[inline]
    fn message_mut(&mut self) -> &mut Message {
        self
    }
}

message_copy_on_write!(Message);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stream;
    use std::ptr;

    #[test]
    fn case_insensitive_lookup() {
        #[rustfmt::skip]
        let cases = [
            ("Content-Type", "content-type"),
            ("content-type", "CONTENT-TYPE"),
            ("X-Api-Key",    "x-API-key"),
        ];

        for (set, lookup) in cases {
            let message = Message::new().with_header(set, "value");

            assert_eq!(message.has_header(set), message.has_header(lookup));
            assert_eq!(message.header(set), message.header(lookup));
            assert_eq!(message.header(lookup), ["value"]);
        }
    }

    #[test]
    fn with_header_replaces() {
        let message = Message::new().with_header("X", "a").with_header("x", "b");

        assert_eq!(message.header_line("X"), "b");
        assert_eq!(message.headers().len(), 1);
        assert_eq!(message.headers().iter().next().unwrap().0, "x");
    }

    #[test]
    fn with_added_header() {
        let message = Message::new().with_header("X", "a").with_added_header("x", "b");
        assert_eq!(message.header("X"), ["a", "b"]);

        let absent = Message::new().with_added_header("X", "b");
        assert!(!absent.has_header("X"));
    }

    #[test]
    fn without_header() {
        let message = Message::new()
            .with_header("Accept", "*/*")
            .with_header("Host", "example.com")
            .without_header("ACCEPT");

        assert!(!message.has_header("accept"));
        assert_eq!(message.header_line("host"), "example.com");
        assert!(message.header("accept").is_empty());
        assert_eq!(message.header_line("accept"), "");
    }

    #[test]
    fn immutable_leaves_receiver() {
        let a = Message::new().with_header("X", "a");
        let b = a.with_protocol_version("2.0").with_header("X", "b");

        assert_eq!(a.protocol_version(), "1.1");
        assert_eq!(b.protocol_version(), "2.0");
        assert_eq!(a.header_line("X"), "a");
        assert_eq!(b.header_line("X"), "b");
    }

    #[test]
    fn mutable_preserves_identity() {
        let mut a = Message::new().into_mutable();

        let before: *const Mutable<Message> = &a;
        let after: *const Mutable<Message> = a.with_protocol_version("2.0");

        assert!(ptr::eq(before, after));
        assert_eq!(a.protocol_version(), "2.0");

        a.with_header("X", "a").with_added_header("X", "b");
        assert_eq!(a.header("x"), ["a", "b"]);

        let frozen = a.freeze();
        let derived = frozen.without_header("X");
        assert!(frozen.has_header("X"));
        assert!(!derived.has_header("X"));
    }

    #[test]
    fn clones_share_body() {
        let a = Message::new();
        let b = a.with_header("X", "1");

        b.body().write(b"shared").unwrap();
        assert_eq!(a.body().contents().unwrap(), b"shared");
        assert!(a.body().ptr_eq(b.body()));

        let c = b.with_body(Stream::from_bytes("own"));
        assert!(!c.body().ptr_eq(b.body()));
        assert_eq!(c.body().contents().unwrap(), b"own");
        assert_eq!(b.body().contents().unwrap(), b"shared");
    }

    #[test]
    fn empty_version() {
        let message = Message::from_parts(Headers::new(), "body", "");
        assert_eq!(message.protocol_version(), "1.1");

        // Explicit replacement is taken as given
        assert_eq!(message.with_protocol_version("").protocol_version(), "");
        assert_eq!(message.protocol_version(), "1.1");
        assert_eq!(message.body().contents().unwrap(), b"body");
    }
}
