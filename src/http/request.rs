use crate::{
    errors::{Error, Result},
    http::{
        message::{copy_on_write, message_copy_on_write, HttpMessage, Message, MessageMut},
        uri::{default_port, Uri},
    },
};

/// Outgoing or generic HTTP request: a [Message] plus method and target.
///
/// The method is stored upper-cased. The request target is derived from the
/// URI unless it was set explicitly with
/// [`with_request_target`](Request::with_request_target).
///
/// | URI                       | Request target |
/// |---------------------------|----------------|
/// | `http://example.com`      | `/`            |
/// | `http://example.com/a`    | `/a`           |
/// | `http://example.com/a?b`  | `/a?b`         |
/// | `?b`                      | `/?b`          |
///
/// # Examples
/// ```
/// use maker_message::{HttpMessage, Request, Uri};
///
/// let request = Request::new("post", "http://example.com/api?v=2")
///     .with_header("Host", "example.com");
/// assert_eq!(request.method(), "POST");
/// assert_eq!(request.request_target(), "/api?v=2");
///
/// let moved = request.with_uri(Uri::parse("http://example.org:8080/"), false);
/// assert_eq!(moved.header_line("host"), "example.org:8080");
/// assert_eq!(request.header_line("host"), "example.com");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    message: Message,
    method: String,
    uri: Uri,
    request_target: Option<String>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new("GET", Uri::default())
    }
}

impl Request {
    pub fn new(method: &str, uri: impl Into<Uri>) -> Self {
        Self::from_message(method, uri, Message::new())
    }

    /// Builds a request around an existing message.
    pub fn from_message(method: &str, uri: impl Into<Uri>, message: Message) -> Self {
        Self {
            message,
            method: method.to_ascii_uppercase(),
            uri: uri.into(),
            request_target: None,
        }
    }

    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The explicit request target, or one built from the URI path and query.
    pub fn request_target(&self) -> String {
        if let Some(target) = &self.request_target {
            return target.clone();
        }

        let mut target = match self.uri.path() {
            "" => "/".to_owned(),
            path => path.to_owned(),
        };
        if !self.uri.query().is_empty() {
            target.push('?');
            target.push_str(self.uri.query());
        }
        target
    }

    pub(crate) fn set_method(&mut self, method: &str) {
        self.method = method.to_ascii_uppercase();
    }

    pub(crate) fn set_request_target(&mut self, target: &str) -> Result<()> {
        if target.chars().any(char::is_whitespace) {
            return Err(Error::InvalidRequestTarget);
        }

        self.request_target = Some(target.to_owned());
        Ok(())
    }

    // An existing `Host` header follows the new URI unless `preserve_host`
    pub(crate) fn set_uri(&mut self, uri: Uri, preserve_host: bool) {
        if !preserve_host && !uri.host().is_empty() && self.has_header("Host") {
            let port = uri.port().filter(|&port| default_port(uri.scheme()) != Some(port));
            let host = match port {
                Some(port) => format!("{}:{port}", uri.host()),
                None => uri.host().to_owned(),
            };
            self.set_header("Host", host);
        }

        self.uri = uri;
    }
}

copy_on_write! { Request {
    /// Stores the method upper-cased.
    fn with_method(method: &str) => set_method;
    /// Overrides the request target; whitespace is rejected.
    fn with_request_target(target: &str) => set_request_target?;
    /// Replaces the URI, rewriting an existing `Host` header unless
    /// `preserve_host` is set.
    fn with_uri(uri: Uri, preserve_host: bool) => set_uri;
}}

message_copy_on_write!(Request);

impl HttpMessage for Request {
    #[inline]
    fn message(&self) -> &Message {
        &self.message
    }
}

impl MessageMut for Request {
    #[inline]
    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_upper_cased() {
        for method in ["get", "Get", "GET"] {
            assert_eq!(Request::new(method, "/").method(), "GET");
        }
        assert_eq!(Request::default().with_method("patch").method(), "PATCH");
    }

    #[test]
    fn request_target_from_uri() {
        #[rustfmt::skip]
        let cases = [
            ("http://example.com",         "/"),
            ("",                           "/"),
            ("http://example.com/a/b",     "/a/b"),
            ("http://example.com/a?b=c",   "/a?b=c"),
            ("?only=query",                "/?only=query"),
            ("/path#fragment",             "/path"),
        ];

        for (uri, target) in cases {
            assert_eq!(Request::new("GET", uri).request_target(), target, "{uri}");
        }
    }

    #[test]
    fn request_target_override() {
        let request = Request::new("OPTIONS", "http://example.com/a");

        let star = request.with_request_target("*").unwrap();
        assert_eq!(star.request_target(), "*");
        assert_eq!(request.request_target(), "/a");

        for target in ["/a b", "/a\tb", "/a\n"] {
            assert!(matches!(
                request.with_request_target(target),
                Err(Error::InvalidRequestTarget)
            ));
        }
    }

    #[test]
    fn with_uri_host_header() {
        let request = Request::new("GET", "http://example.com/").with_header("host", "example.com");

        #[rustfmt::skip]
        let cases = [
            ("http://example.org/",       false, "example.org"),
            ("http://example.org:8080/",  false, "example.org:8080"),
            ("http://example.org:8080/",  true,  "example.com"),
            ("/relative",                 false, "example.com"),
        ];

        for (uri, preserve, host) in cases {
            let moved = request.with_uri(Uri::parse(uri), preserve);
            assert_eq!(moved.header_line("Host"), host, "{uri}");
            assert_eq!(moved.uri().to_string(), uri);
        }

        // Explicit default port stays on the Uri, not in the header
        let moved = request.with_uri(Uri::parse("http://example.org:80/"), false);
        assert_eq!(moved.header_line("Host"), "example.org");
        assert_eq!(moved.uri().port(), Some(80));

        // No Host header, none is added
        let bare = Request::new("GET", "/").with_uri(Uri::parse("http://example.org/"), false);
        assert!(!bare.has_header("Host"));
    }

    #[test]
    fn mutable_flavour() {
        let mut request = Request::new("GET", "/").into_mutable();

        let before: *const _ = &request;
        let after: *const _ = request
            .with_method("delete")
            .with_header("X-Trace", "1")
            .with_request_target("/items/7")
            .unwrap();

        assert!(std::ptr::eq(before, after));
        assert_eq!(request.method(), "DELETE");
        assert_eq!(request.request_target(), "/items/7");
        assert_eq!(request.header_line("x-trace"), "1");

        assert!(request.with_request_target("bad target").is_err());
        assert_eq!(request.request_target(), "/items/7");
    }
}
