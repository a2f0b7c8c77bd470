//! Explicit request input: everything a [ServerRequest](crate::ServerRequest)
//! is built from.

use crate::{
    errors::Result,
    http::{
        form::{FormArray, FormEntry, Params},
        stream::{Body, Stream},
        upload::{UploadError, UploadedFile},
    },
};
use std::{
    collections::{BTreeMap, HashMap},
    io,
    path::PathBuf,
};

/// CGI-style server parameters (`REQUEST_METHOD`, `HTTP_HOST`, ...).
pub type ServerParams = HashMap<String, String>;

/// A file the platform already stored before the request reached us.
///
/// An empty `tmp_name` means no file was submitted for the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Where the platform stored the content.
    pub tmp_name: PathBuf,
    /// File name sent by the client.
    pub name: Option<String>,
    /// Media type sent by the client.
    pub media_type: Option<String>,
    /// Raw upload error code, see [UploadError].
    pub error: i64,
}

impl FileDescriptor {
    pub fn new(tmp_name: impl Into<PathBuf>) -> Self {
        Self {
            tmp_name: tmp_name.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.tmp_name.as_os_str().is_empty()
    }

    pub(crate) fn open(&self) -> Result<UploadedFile> {
        let error = UploadError::try_from(self.error)?;
        let file = UploadedFile::from_path(
            &self.tmp_name,
            self.name.as_deref(),
            self.media_type.as_deref(),
        )?;
        Ok(file.with_error(error))
    }
}

/// Snapshot of the inputs of one request.
///
/// Only server parameters and the body are mandatory in practice, every
/// other source has a fallback:
///
/// | Source  | When not given                                          |
/// |---------|---------------------------------------------------------|
/// | headers | `HTTP_*` server parameters plus `CONTENT_TYPE`/`CONTENT_LENGTH` |
/// | cookies | parsed from the `Cookie` header                         |
/// | query   | decoded from the URI query                              |
/// | form    | empty                                                   |
///
/// # Examples
/// ```
/// use maker_message::{Environment, HttpMessage, ServerRequest};
///
/// let env = Environment::new()
///     .server_param("REQUEST_METHOD", "PUT")
///     .server_param("HTTP_HOST", "example.com")
///     .server_param("REQUEST_URI", "/items/7?expand=1")
///     .server_param("CONTENT_TYPE", "application/json")
///     .body(r#"{"name": "lamp"}"#);
///
/// let request = ServerRequest::from_environment(&env).unwrap();
/// assert_eq!(request.method(), "PUT");
/// assert_eq!(request.uri().to_string(), "http://example.com/items/7?expand=1");
/// assert_eq!(request.header_line("content-type"), "application/json");
/// assert_eq!(request.parsed_body_param("name").unwrap(), "lamp");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Environment {
    server: ServerParams,
    headers: Option<Vec<(String, String)>>,
    cookies: Option<HashMap<String, String>>,
    query: Option<Params>,
    form: Params,
    files: FormArray<FormEntry<FileDescriptor>>,
    body: Body,
}

impl Environment {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process environment as server parameters and standard input as
    /// body, the way a CGI program receives a request.
    pub fn from_cgi() -> Self {
        Self {
            server: std::env::vars().collect(),
            body: Stream::from_reader(io::stdin()).into(),
            ..Self::default()
        }
    }

    pub fn server_params(mut self, params: ServerParams) -> Self {
        self.server = params;
        self
    }

    pub fn server_param(mut self, name: &str, value: &str) -> Self {
        self.server.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Adds a raw header; once any header is given, `HTTP_*` server
    /// parameters are no longer used as headers.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies
            .get_or_insert_with(HashMap::new)
            .insert(name.to_owned(), value.to_owned());
        self
    }

    /// Adds an already decoded query parameter, bracket names included.
    pub fn query_param(mut self, name: &str, value: &str) -> Self {
        self.query
            .get_or_insert_with(Params::new)
            .insert_field(name, value.to_owned());
        self
    }

    /// Adds an already decoded form field, bracket names included.
    pub fn form_field(mut self, name: &str, value: &str) -> Self {
        self.form.insert_field(name, value.to_owned());
        self
    }

    /// Adds an already stored upload, bracket names included.
    pub fn file(mut self, name: &str, file: FileDescriptor) -> Self {
        self.files.insert_field(name, file);
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }
}

// Read access for population
impl Environment {
    #[inline]
    pub(crate) fn server(&self) -> &ServerParams {
        &self.server
    }

    #[inline]
    pub(crate) fn param(&self, name: &str) -> Option<&str> {
        self.server.get(name).map(String::as_str)
    }

    /// Explicit headers, or headers derived from the server parameters.
    pub(crate) fn raw_headers(&self) -> Vec<(String, String)> {
        if let Some(headers) = &self.headers {
            return headers.clone();
        }

        // Sorted for a stable header order
        let server: BTreeMap<&String, &String> = self.server.iter().collect();
        let mut headers: Vec<(String, String)> = server
            .iter()
            .filter_map(|(name, value)| {
                let name = name.strip_prefix("HTTP_")?;
                Some((header_name(name), value.to_string()))
            })
            .collect();

        for (param, name) in [("CONTENT_TYPE", "Content-Type"), ("CONTENT_LENGTH", "Content-Length")] {
            if let Some(value) = self.param(param) {
                headers.push((name.to_owned(), value.to_owned()));
            }
        }
        headers
    }

    #[inline]
    pub(crate) fn cookies(&self) -> Option<&HashMap<String, String>> {
        self.cookies.as_ref()
    }

    #[inline]
    pub(crate) fn query(&self) -> Option<&Params> {
        self.query.as_ref()
    }

    #[inline]
    pub(crate) fn form(&self) -> &Params {
        &self.form
    }

    #[inline]
    pub(crate) fn files(&self) -> &FormArray<FormEntry<FileDescriptor>> {
        &self.files
    }

    #[inline]
    pub(crate) fn body_ref(&self) -> &Body {
        &self.body
    }
}

// `ACCEPT_LANGUAGE` -> `Accept-Language`
fn header_name(param: &str) -> String {
    param
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
