//! maker_message - Copy-on-write HTTP message model for request handling
//!
//! Value types for the HTTP messages a handler receives and produces, plus
//! the decoding needed to build an incoming request from its raw inputs.
//!
//! # Message Model
//!
//! - **[Message]** - protocol version, case-insensitive [Headers] and a shared [Body]
//! - **[Request]** / **[ServerRequest]** / **[Response]** - messages with a request or status line
//! - **[Uri]** - parsed URI with component accessors
//! - **[Stream]** - readable/writable/seekable byte stream over memory, files or readers
//! - **[UploadedFile]** - one uploaded file, movable exactly once
//!
//! Every `with_*` method returns a modified copy and leaves the receiver
//! untouched. Wrap a value in [Mutable] (via `into_mutable`) to apply the same
//! methods in place without cloning.
//!
//! # Request Decoding
//!
//! - **JSON bodies** - objects and arrays become the parsed body
//! - **`multipart/form-data`** - fields and files via [MultipartDecoder], bounded by [limits]
//! - **Bracket field names** - `tags[]` and `user[name]` nest into [form::FormArray]
//! - **Client address** - proxy headers with a preference for public addresses
//!
//! # Examples
//!
//! Building a request from CGI-style inputs:
//! ```
//! use maker_message::{Environment, HttpMessage, ServerRequest};
//!
//! let env = Environment::new()
//!     .server_param("REQUEST_METHOD", "GET")
//!     .server_param("HTTP_HOST", "example.com")
//!     .server_param("REQUEST_URI", "/users?page=2")
//!     .server_param("REMOTE_ADDR", "203.0.113.7");
//!
//! let request = ServerRequest::from_environment(&env).unwrap();
//!
//! assert_eq!(request.uri().host(), "example.com");
//! assert_eq!(request.header_line("host"), "example.com");
//! assert_eq!(request.client_ip().as_deref(), Some("203.0.113.7"));
//! ```
//! Deriving messages:
//! ```
//! use maker_message::{HttpMessage, Response, StatusCode};
//!
//! let base = Response::new().with_header("Server", "maker");
//! let missing = base
//!     .with_status(StatusCode::NotFound.into(), None)
//!     .unwrap()
//!     .with_body("nothing here");
//!
//! assert_eq!(base.status_code(), 200);
//! assert_eq!(missing.status_code(), 404);
//! assert_eq!(missing.header_line("server"), "maker");
//! ```
//! Editing in place:
//! ```
//! use maker_message::{HttpMessage, Request};
//!
//! let mut request = Request::new("get", "https://example.com/").into_mutable();
//! request
//!     .with_method("post")
//!     .with_header("Content-Type", "application/json")
//!     .with_body(r#"{"id": 1}"#);
//!
//! let request = request.freeze();
//! assert_eq!(request.method(), "POST");
//! assert_eq!(request.body().contents().unwrap(), br#"{"id": 1}"#);
//! ```

pub(crate) mod http {
    pub mod form;
    pub mod multipart;
    pub mod query;
    pub(crate) mod environment;
    pub(crate) mod headers;
    pub(crate) mod message;
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod server_request;
    pub(crate) mod stream;
    pub(crate) mod types;
    pub(crate) mod upload;
    pub(crate) mod uri;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::{Error, Result},
    http::{
        environment::{Environment, FileDescriptor, ServerParams},
        form,
        headers::{HeaderValues, Headers},
        message::{HttpMessage, Message, Mutable},
        multipart::{self, MultipartDecoder, MultipartFormData},
        query,
        request::Request,
        response::Response,
        server_request::{ServerRequest, FORWARDING_HEADERS},
        stream::{Body, Stream, StreamResource},
        types::StatusCode,
        upload::{UploadError, UploadedFile, UploadedFiles},
        uri::{default_port, Uri},
    },
};

#[cfg(test)]
pub mod tools {
    /// Builds a `multipart/form-data` body.
    ///
    /// Each part is `(name, filename, content type, value)`.
    pub fn multipart_body(
        boundary: &str,
        parts: &[(&str, Option<&str>, Option<&str>, &str)],
    ) -> String {
        let mut body = String::new();

        for (name, filename, content_type, value) in parts {
            body.push_str(&format!("--{boundary}\r\n"));
            body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\""));
            if let Some(filename) = filename {
                body.push_str(&format!("; filename=\"{filename}\""));
            }
            body.push_str("\r\n");

            if let Some(content_type) = content_type {
                body.push_str(&format!("Content-Type: {content_type}\r\n"));
            }
            body.push_str(&format!("\r\n{value}\r\n"));
        }

        body.push_str(&format!("--{boundary}--\r\n"));
        body
    }
}
