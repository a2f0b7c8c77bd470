use crate::{
    errors::{Error, Result},
    http::{
        environment::{Environment, ServerParams},
        form::{FormArray, FormEntry, Params},
        message::{copy_on_write, message_copy_on_write, HttpMessage, Message, MessageMut},
        multipart::MultipartDecoder,
        request::Request,
        stream::Stream,
        upload::{UploadedFile, UploadedFiles},
        uri::Uri,
    },
    limits::ReqLimits,
    query::Query,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};
use tracing::debug;

/// Proxy headers consulted by [ServerRequest::client_ip], in order.
pub const FORWARDING_HEADERS: [&str; 6] = [
    "CLIENT-IP",
    "X-FORWARDED-FOR",
    "X-FORWARDED",
    "X-CLUSTER-CLIENT-IP",
    "FORWARDED-FOR",
    "FORWARDED",
];

/// Incoming request as seen by the application.
///
/// On top of [Request] it carries the server parameters it was built from,
/// cookies, decoded query parameters, the parsed body, uploaded files and
/// free-form attributes that handler stages attach to it.
///
/// # Building
///
/// [`from_environment`](ServerRequest::from_environment) picks the body
/// decoding by `Content-Type`:
///
/// | `Content-Type`        | Parsed body                         | Uploaded files            |
/// |-----------------------|-------------------------------------|---------------------------|
/// | `application/json`    | the JSON, if it is an object or array | none                    |
/// | `multipart/form-data` | decoded fields                      | decoded files             |
/// | anything else         | the environment form fields         | the environment files     |
///
/// Multipart bodies of `POST` requests take the last row unless
/// [ReqLimits::decode_multipart_on_post] is set: the platform decoded those
/// before the request reached us.
///
/// # Examples
/// ```
/// use maker_message::{Environment, HttpMessage, ServerRequest};
/// use serde_json::json;
///
/// let env = Environment::new()
///     .server_param("REQUEST_METHOD", "GET")
///     .server_param("HTTP_X_FORWARDED_FOR", "10.0.0.5, 8.8.8.8")
///     .server_param("HTTP_COOKIE", "session=abc; theme=dark")
///     .server_param("REQUEST_URI", "/search?q=rust&tags[]=a&tags[]=b")
///     .server_param("REMOTE_ADDR", "127.0.0.1");
///
/// let request = ServerRequest::from_environment(&env)
///     .unwrap()
///     .with_attribute("user_id", json!(42));
///
/// assert_eq!(request.client_ip().as_deref(), Some("8.8.8.8"));
/// assert_eq!(request.cookie_param("theme"), Some("dark"));
/// assert_eq!(request.query_params().to_json()["tags"], json!(["a", "b"]));
/// assert_eq!(request.attribute("user_id"), Some(&json!(42)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ServerRequest {
    request: Request,
    attributes: HashMap<String, Value>,
    cookie_params: HashMap<String, String>,
    server_params: ServerParams,
    query_params: Params,
    parsed_body: Option<Value>,
    uploaded_files: UploadedFiles,
}

impl ServerRequest {
    pub fn new(method: &str, uri: impl Into<Uri>, server_params: ServerParams) -> Self {
        Self {
            request: Request::new(method, uri),
            server_params,
            ..Self::default()
        }
    }

    /// Builds a request from `env` with default [ReqLimits].
    #[inline]
    pub fn from_environment(env: &Environment) -> Result<Self> {
        Self::from_environment_with(env, &ReqLimits::default())
    }

    /// Builds a request from `env`.
    ///
    /// # Errors
    /// - [Error::BodyTooLarge] when a body to decode exceeds `limits.body_size`
    /// - [Error::Query] when the query has more than `limits.query_parts` parameters
    /// - decoder errors of [MultipartDecoder::decode]
    /// - [Error::UploadNotFound] and [Error::InvalidUploadCode] for broken
    ///   file descriptors of the environment
    ///
    /// A malformed JSON body is not an error, the parsed body stays unset.
    pub fn from_environment_with(env: &Environment, limits: &ReqLimits) -> Result<Self> {
        let mut request = Self {
            server_params: env.server().clone(),
            ..Self::default()
        };

        for (name, value) in env.raw_headers() {
            request.set_header(&name, [value]);
        }

        let version = env
            .param("SERVER_PROTOCOL")
            .map(|protocol| protocol.replace("HTTP/", ""))
            .filter(|version| !version.is_empty());

        request.set_method(env.param("REQUEST_METHOD").unwrap_or("GET"));
        request.set_uri(Uri::from_server_params(env.server()), true);
        request.set_body(env.body_ref().clone());
        request.set_protocol_version(version.as_deref().unwrap_or("1.1"));

        request.cookie_params = match env.cookies() {
            Some(cookies) => cookies.clone(),
            None => parse_cookies(&request.header_line("Cookie")),
        };

        request.query_params = match env.query() {
            Some(query) => query.clone(),
            None => decode_query(request.uri().query(), limits.query_parts)?,
        };

        let content_type = request.header_line("Content-Type");
        if content_type.contains("application/json") {
            let body = request.buffer_body(limits.body_size)?;

            match serde_json::from_slice::<Value>(&body) {
                Ok(json) if json.is_object() || json.is_array() => {
                    request.parsed_body = Some(json);
                }
                Ok(_) => debug!("JSON body is not an object or array, parsed body left unset"),
                Err(err) => debug!(error = %err, "Malformed JSON body, parsed body left unset"),
            }
        } else if content_type.contains("multipart/form-data")
            && (request.method() != "POST" || limits.decode_multipart_on_post)
        {
            let body = request.buffer_body(limits.body_size)?;
            let data = MultipartDecoder::new(limits.multipart.clone()).decode(&body, &content_type)?;

            request.parsed_body = Some(Value::Object(data.params.to_json()));
            request.uploaded_files = data.files;
        } else {
            request.parsed_body = Some(Value::Object(env.form().to_json()));
            request.uploaded_files = open_descriptors(env)?;
        }

        debug!(
            method = request.method(),
            uri = %request.uri(),
            files = request.uploaded_files.field_count(),
            "Server request populated"
        );
        Ok(request)
    }

    // Reads the whole body for decoding, leaving it readable from the start
    fn buffer_body(&mut self, limit: usize) -> Result<Vec<u8>> {
        let mut stream = self.body().stream_mut();
        if stream.is_seekable() {
            stream.rewind()?;
        }

        let bytes = stream.read(limit.saturating_add(1))?;
        if bytes.len() > limit {
            return Err(Error::BodyTooLarge { limit });
        }

        if stream.is_seekable() {
            stream.rewind()?;
        } else {
            drop(stream);
            self.set_body(Stream::from_bytes(bytes.clone()));
        }
        Ok(bytes)
    }
}

fn decode_query(query: &str, limit: usize) -> Result<Params> {
    let mut params = Params::new();
    if !query.is_empty() {
        Query::parse_into(&mut params, query, limit)?;
    }
    Ok(params)
}

/// Splits a `Cookie` header into name/value pairs.
///
/// Values are kept as sent; pairs without a name are dropped.
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();

            (!name.is_empty()).then(|| (name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

// Scalar fields map to one file, array fields to a list; empty slots are skipped
fn open_descriptors(env: &Environment) -> Result<UploadedFiles> {
    let mut files = UploadedFiles::new();

    for (name, entry) in env.files().iter() {
        match entry {
            FormEntry::Value(descriptor) => {
                if descriptor.is_empty() {
                    continue;
                }
                files.insert(name, FormEntry::Value(descriptor.open()?));
            }
            FormEntry::Array(descriptors) => {
                let mut list = FormArray::new();
                for descriptor in descriptors.values().filter(|d| !d.is_empty()) {
                    list.push(descriptor.open()?);
                }
                files.insert(name, FormEntry::Array(list));
            }
        }
    }

    Ok(files)
}

// Getters
impl ServerRequest {
    #[inline]
    pub fn method(&self) -> &str {
        self.request.method()
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    #[inline]
    pub fn request_target(&self) -> String {
        self.request.request_target()
    }

    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    #[inline]
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    #[inline]
    pub fn cookie_param(&self, name: &str) -> Option<&str> {
        self.cookie_params.get(name).map(String::as_str)
    }

    #[inline]
    pub fn cookie_params(&self) -> &HashMap<String, String> {
        &self.cookie_params
    }

    #[inline]
    pub fn server_param(&self, name: &str) -> Option<&str> {
        self.server_params.get(name).map(String::as_str)
    }

    #[inline]
    pub fn server_params(&self) -> &ServerParams {
        &self.server_params
    }

    #[inline]
    pub fn query_param(&self, name: &str) -> Option<&FormEntry<String>> {
        self.query_params.get(name)
    }

    #[inline]
    pub fn query_params(&self) -> &Params {
        &self.query_params
    }

    #[inline]
    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    /// Top-level field of an object body.
    #[inline]
    pub fn parsed_body_param(&self, name: &str) -> Option<&Value> {
        self.parsed_body.as_ref()?.as_object()?.get(name)
    }

    #[inline]
    pub fn uploaded_file(&self, name: &str) -> Option<&FormEntry<UploadedFile>> {
        self.uploaded_files.get(name)
    }

    #[inline]
    pub fn uploaded_files(&self) -> &UploadedFiles {
        &self.uploaded_files
    }

    /// Address of the client, looking through proxy headers.
    ///
    /// For each header of [FORWARDING_HEADERS] in order, the comma separated
    /// candidates are scanned twice: first for a public address, then for any
    /// valid one. Without a match the `REMOTE_ADDR` server parameter is used.
    pub fn client_ip(&self) -> Option<String> {
        for name in FORWARDING_HEADERS {
            let candidates: Vec<&str> = self
                .header(name)
                .iter()
                .flat_map(|value| value.split(','))
                .map(str::trim)
                .filter(|candidate| !candidate.is_empty())
                .collect();

            let public = candidates
                .iter()
                .find(|candidate| candidate.parse::<IpAddr>().is_ok_and(is_public));
            let valid = || {
                candidates
                    .iter()
                    .find(|candidate| candidate.parse::<IpAddr>().is_ok())
            };

            if let Some(ip) = public.or_else(valid) {
                return Some((*ip).to_owned());
            }
        }

        self.server_param("REMOTE_ADDR").map(str::to_owned)
    }
}

/// Whether `ip` lies outside private and reserved ranges.
pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ip) => is_public_v4(ip),
        IpAddr::V6(ip) => is_public_v6(ip),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [first, ..] = ip.octets();

    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || first == 0
        || first >= 240)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let segments = ip.segments();

    let unique_local = segments[0] & 0xfe00 == 0xfc00;
    let link_local = segments[0] & 0xffc0 == 0xfe80;
    let documentation = segments[0] == 0x2001 && segments[1] == 0x0db8;
    let v4_mapped = segments[..5] == [0; 5] && segments[5] == 0xffff;

    !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local || documentation || v4_mapped)
}

// Setters
impl ServerRequest {
    #[inline]
    fn set_method(&mut self, method: &str) {
        self.request.set_method(method);
    }

    #[inline]
    fn set_request_target(&mut self, target: &str) -> Result<()> {
        self.request.set_request_target(target)
    }

    #[inline]
    fn set_uri(&mut self, uri: Uri, preserve_host: bool) {
        self.request.set_uri(uri, preserve_host);
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_owned(), value);
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    fn set_cookie_params(&mut self, cookies: HashMap<String, String>) {
        self.cookie_params = cookies;
    }

    fn set_query_params(&mut self, params: Params) {
        self.query_params = params;
    }

    fn set_parsed_body(&mut self, body: Option<Value>) {
        self.parsed_body = body;
    }

    fn set_uploaded_files(&mut self, files: UploadedFiles) {
        self.uploaded_files = files;
    }
}

copy_on_write! { ServerRequest {
    fn with_method(method: &str) => set_method;
    fn with_request_target(target: &str) => set_request_target?;
    fn with_uri(uri: Uri, preserve_host: bool) => set_uri;
    fn with_attribute(name: &str, value: Value) => set_attribute;
    fn without_attribute(name: &str) => remove_attribute;
    fn with_cookie_params(cookies: HashMap<String, String>) => set_cookie_params;
    fn with_query_params(params: Params) => set_query_params;
    fn with_parsed_body(body: Option<Value>) => set_parsed_body;
    fn with_uploaded_files(files: UploadedFiles) => set_uploaded_files;
}}

message_copy_on_write!(ServerRequest);

impl HttpMessage for ServerRequest {
    #[inline]
    fn message(&self) -> &Message {
        self.request.message()
    }
}

impl MessageMut for ServerRequest {
    #[inline]
    fn message_mut(&mut self) -> &mut Message {
        self.request.message_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tools::multipart_body, FileDescriptor, UploadError};
    use serde_json::json;

    fn with_headers(headers: &[(&str, &str)]) -> ServerRequest {
        let mut request = ServerRequest::default();
        for (name, value) in headers {
            request = request.with_header(name, *value);
        }
        request.with_server_params_for_test("REMOTE_ADDR", "192.168.1.20")
    }

    impl ServerRequest {
        fn with_server_params_for_test(mut self, name: &str, value: &str) -> Self {
            self.server_params.insert(name.to_owned(), value.to_owned());
            self
        }
    }

    #[test]
    fn client_ip_preference() {
        #[rustfmt::skip]
        let cases: [(&[(&str, &str)], Option<&str>); 7] = [
            (&[("X-Forwarded-For", "10.0.0.5, 8.8.8.8")],                    Some("8.8.8.8")),
            (&[("X-Forwarded-For", "10.0.0.5, 172.16.0.1")],                 Some("10.0.0.5")),
            (&[("Client-Ip", "10.1.1.1"), ("X-Forwarded-For", "8.8.4.4")],   Some("10.1.1.1")),
            (&[("X-Forwarded-For", "unknown, 2001:4860::8888")],             Some("2001:4860::8888")),
            (&[("X-Forwarded-For", "fe80::1, ::1")],                         Some("fe80::1")),
            (&[("Forwarded", "for=1.2.3.4")],                                Some("192.168.1.20")),
            (&[],                                                            Some("192.168.1.20")),
        ];

        for (headers, expected) in cases {
            assert_eq!(with_headers(headers).client_ip().as_deref(), expected, "{headers:?}");
        }

        assert_eq!(ServerRequest::default().client_ip(), None);
    }

    #[test]
    fn public_ranges() {
        #[rustfmt::skip]
        let cases = [
            ("8.8.8.8",          true),
            ("203.0.113.9",      true),
            ("10.0.0.1",         false),
            ("172.31.255.255",   false),
            ("192.168.0.1",      false),
            ("127.0.0.1",        false),
            ("169.254.1.1",      false),
            ("0.1.2.3",          false),
            ("250.0.0.1",        false),
            ("2001:4860::8888",  true),
            ("::1",              false),
            ("fd00::1",          false),
            ("fe80::1",          false),
            ("2001:db8::1",      false),
            ("::ffff:8.8.8.8",   false),
        ];

        for (ip, public) in cases {
            assert_eq!(is_public(ip.parse().unwrap()), public, "{ip}");
        }
    }

    #[test]
    fn cookies() {
        let cookies = parse_cookies("a=1; b = two ; flag; =orphan; c=x=y");

        assert_eq!(cookies.len(), 4);
        assert_eq!(cookies["a"], "1");
        assert_eq!(cookies["b"], "two");
        assert_eq!(cookies["flag"], "");
        assert_eq!(cookies["c"], "x=y");
    }

    #[test]
    fn population_basics() {
        let env = Environment::new()
            .server_param("REQUEST_METHOD", "delete")
            .server_param("SERVER_PROTOCOL", "HTTP/2.0")
            .server_param("HTTP_HOST", "api.example.com")
            .server_param("HTTP_ACCEPT", "application/json")
            .server_param("REQUEST_URI", "/items/7")
            .server_param("QUERY_STRING", "force=1")
            .cookie("session", "abc");

        let request = ServerRequest::from_environment(&env).unwrap();

        assert_eq!(request.method(), "DELETE");
        assert_eq!(request.protocol_version(), "2.0");
        assert_eq!(request.uri().to_string(), "http://api.example.com/items/7?force=1");
        assert_eq!(request.request_target(), "/items/7?force=1");
        assert_eq!(request.header_line("accept"), "application/json");
        assert_eq!(request.header_line("host"), "api.example.com");
        assert_eq!(request.cookie_param("session"), Some("abc"));
        assert_eq!(request.server_param("REQUEST_METHOD"), Some("delete"));
        assert_eq!(
            request.query_param("force").and_then(FormEntry::as_value).map(String::as_str),
            Some("1")
        );
        assert_eq!(request.parsed_body(), Some(&json!({})));
        assert!(request.uploaded_files().is_empty());
    }

    #[test]
    fn population_defaults() {
        let request = ServerRequest::from_environment(&Environment::new()).unwrap();

        assert_eq!(request.method(), "GET");
        assert_eq!(request.protocol_version(), "1.1");
        assert_eq!(request.uri().to_string(), "http:");
        assert!(request.headers().is_empty());
        assert!(request.cookie_params().is_empty());
        assert!(request.query_params().is_empty());

        for protocol in ["", "HTTP/"] {
            let env = Environment::new().server_param("SERVER_PROTOCOL", protocol);
            let request = ServerRequest::from_environment(&env).unwrap();
            assert_eq!(request.protocol_version(), "1.1", "{protocol}");
        }
    }

    #[test]
    fn json_body() {
        #[rustfmt::skip]
        let cases = [
            (r#"{"a": 1}"#,    Some(json!({"a": 1}))),
            (r#"[1, 2]"#,      Some(json!([1, 2]))),
            (r#""scalar""#,    None),
            ("42",             None),
            ("{broken",        None),
            ("",               None),
        ];

        for (body, expected) in cases {
            let env = Environment::new()
                .server_param("REQUEST_METHOD", "POST")
                .header("Content-Type", "application/json; charset=utf-8")
                .body(Stream::from_reader(std::io::Cursor::new(body.to_owned())));

            let request = ServerRequest::from_environment(&env).unwrap();
            assert_eq!(request.parsed_body(), expected.as_ref(), "{body}");

            // Buffered for a second read
            assert_eq!(request.body().contents().unwrap(), body.as_bytes());
        }
    }

    #[test]
    fn body_too_large() {
        let limits = ReqLimits {
            body_size: 4,
            ..ReqLimits::default()
        };
        let env = Environment::new()
            .header("Content-Type", "application/json")
            .body(r#"{"a": 1}"#);

        assert!(matches!(
            ServerRequest::from_environment_with(&env, &limits),
            Err(Error::BodyTooLarge { limit: 4 })
        ));
    }

    #[test]
    fn multipart_population() {
        let body = multipart_body(
            "XyZ",
            &[
                ("title", None, None, "Hello"),
                ("tags[]", None, None, "a"),
                ("tags[]", None, None, "b"),
                ("upload", Some("x.txt"), Some("text/plain"), "hi"),
            ],
        );

        let env = Environment::new()
            .server_param("REQUEST_METHOD", "PUT")
            .server_param("CONTENT_TYPE", "multipart/form-data; boundary=XyZ")
            .body(body.as_str());

        let request = ServerRequest::from_environment(&env).unwrap();

        assert_eq!(
            request.parsed_body(),
            Some(&json!({"title": "Hello", "tags": ["a", "b"]}))
        );
        let file = request.uploaded_file("upload").and_then(FormEntry::as_value).unwrap();
        assert_eq!(file.client_filename(), Some("x.txt"));
        assert_eq!(file.stream().unwrap().contents().unwrap(), b"hi");
    }

    #[test]
    fn multipart_on_post() {
        let body = multipart_body("XyZ", &[("title", None, None, "from body")]);
        let env = Environment::new()
            .server_param("REQUEST_METHOD", "POST")
            .server_param("CONTENT_TYPE", "multipart/form-data; boundary=XyZ")
            .form_field("title", "from platform")
            .body(body.as_str());

        let request = ServerRequest::from_environment(&env).unwrap();
        assert_eq!(request.parsed_body_param("title").unwrap(), "from platform");

        let limits = ReqLimits {
            decode_multipart_on_post: true,
            ..ReqLimits::default()
        };
        let request = ServerRequest::from_environment_with(&env, &limits).unwrap();
        assert_eq!(request.parsed_body_param("title").unwrap(), "from body");
    }

    #[test]
    fn multipart_without_boundary() {
        let env = Environment::new()
            .server_param("REQUEST_METHOD", "PATCH")
            .header("Content-Type", "multipart/form-data")
            .body("--x\r\n");

        assert!(matches!(
            ServerRequest::from_environment(&env),
            Err(Error::MissingBoundary(_))
        ));
    }

    #[test]
    fn platform_files() {
        let dir = tempfile::tempdir().unwrap();
        let avatar = dir.path().join("php_avatar");
        let doc = dir.path().join("php_doc");
        std::fs::write(&avatar, "png").unwrap();
        std::fs::write(&doc, "pdf").unwrap();

        let descriptor = |path: &std::path::Path, name: &str, error: i64| FileDescriptor {
            tmp_name: path.to_path_buf(),
            name: Some(name.to_owned()),
            media_type: Some("application/octet-stream".to_owned()),
            error,
        };

        let env = Environment::new()
            .server_param("REQUEST_METHOD", "POST")
            .form_field("title", "Hello")
            .file("avatar", descriptor(&avatar, "me.png", 0))
            .file("empty", FileDescriptor::default())
            .file("docs[]", FileDescriptor::default())
            .file("docs[]", descriptor(&doc, "cv.pdf", 3));

        let request = ServerRequest::from_environment(&env).unwrap();
        assert_eq!(request.parsed_body(), Some(&json!({"title": "Hello"})));

        let files = request.uploaded_files();
        assert_eq!(files.len(), 2);
        assert!(files.get("empty").is_none());

        let avatar = files.get("avatar").and_then(FormEntry::as_value).unwrap();
        assert_eq!(avatar.client_filename(), Some("me.png"));
        assert_eq!(avatar.size(), Some(3));

        let docs = files.get("docs").and_then(FormEntry::as_array).unwrap();
        assert_eq!(docs.len(), 1);
        let cv = docs.get("0").unwrap();
        assert_eq!(cv.client_filename(), Some("cv.pdf"));
        assert_eq!(cv.error(), UploadError::Partial);
    }

    #[test]
    fn broken_descriptor() {
        let env = Environment::new().file("x", FileDescriptor::new("/nonexistent/upload"));
        assert!(matches!(
            ServerRequest::from_environment(&env),
            Err(Error::UploadNotFound(_))
        ));
    }

    #[test]
    fn query_limit() {
        let limits = ReqLimits {
            query_parts: 2,
            ..ReqLimits::default()
        };
        let env = Environment::new().server_param("QUERY_STRING", "a=1&b=2&c=3");

        assert!(matches!(
            ServerRequest::from_environment_with(&env, &limits),
            Err(Error::Query(_))
        ));
    }

    #[test]
    fn accessors_copy_on_write() {
        let request = ServerRequest::new("get", "/", ServerParams::new());
        let derived = request
            .with_attribute("role", json!("admin"))
            .with_attribute("id", json!(7))
            .without_attribute("id")
            .with_parsed_body(Some(json!({"k": "v"})))
            .with_cookie_params(parse_cookies("a=b"));

        assert!(request.attributes().is_empty());
        assert_eq!(request.parsed_body(), None);

        assert_eq!(derived.attribute("role"), Some(&json!("admin")));
        assert_eq!(derived.attribute("id"), None);
        assert_eq!(derived.parsed_body_param("k"), Some(&json!("v")));
        assert_eq!(derived.parsed_body_param("missing"), None);
        assert_eq!(derived.cookie_param("a"), Some("b"));

        let mut mutable = derived.into_mutable();
        let before: *const _ = &mutable;
        let after: *const _ = mutable
            .with_uploaded_files(UploadedFiles::new())
            .with_query_params(Params::new())
            .with_method("head")
            .with_protocol_version("1.0");

        assert!(std::ptr::eq(before, after));
        assert_eq!(mutable.method(), "HEAD");
        assert_eq!(mutable.protocol_version(), "1.0");
    }
}
