//! Status codes and their reason phrases

macro_rules! set_status_codes {
    ($(
        $name:ident = ($num:expr, $str:expr);
    )+) => {
        /// HTTP status codes
        ///
        /// Registered codes as defined in
        /// [RFC 9110](https://datatracker.ietf.org/doc/html/rfc9110#section-15) and other standards,
        /// each with its recommended reason phrase.
        ///
        /// # Examples
        /// ```
        /// use maker_message::StatusCode;
        ///
        /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
        /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
        /// assert_eq!(StatusCode::from_u16(418), Some(StatusCode::ImaTeapot));
        /// assert_eq!(StatusCode::from_u16(299), None);
        /// ```
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $name = $num,
        )+ }

        impl StatusCode {
            #[inline]
            pub const fn as_u16(&self) -> u16 {
                *self as u16
            }

            #[inline]
            pub const fn reason_phrase(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => $str,
                )+ }
            }

            /// The registered code for `code`, if there is one.
            #[inline]
            pub const fn from_u16(code: u16) -> Option<Self> {
                match code { $(
                    $num => Some(StatusCode::$name),
                )+
                    _ => None,
                }
            }
        }
    }
}

set_status_codes! {
    Continue = (100, "Continue");
    SwitchingProtocols = (101, "Switching Protocols");
    Processing = (102, "Processing");
    EarlyHints = (103, "Early Hints");

    Ok = (200, "OK");
    Created = (201, "Created");
    Accepted = (202, "Accepted");
    NonAuthoritativeInformation = (203, "Non-Authoritative Information");
    NoContent = (204, "No Content");
    ResetContent = (205, "Reset Content");
    PartialContent = (206, "Partial Content");
    MultiStatus = (207, "Multi-Status");
    AlreadyReported = (208, "Already Reported");
    ImUsed = (226, "IM Used");

    MultipleChoices = (300, "Multiple Choices");
    MovedPermanently = (301, "Moved Permanently");
    Found = (302, "Found");
    SeeOther = (303, "See Other");
    NotModified = (304, "Not Modified");
    UseProxy = (305, "Use Proxy");
    TemporaryRedirect = (307, "Temporary Redirect");
    PermanentRedirect = (308, "Permanent Redirect");

    BadRequest = (400, "Bad Request");
    Unauthorized = (401, "Unauthorized");
    PaymentRequired = (402, "Payment Required");
    Forbidden = (403, "Forbidden");
    NotFound = (404, "Not Found");
    MethodNotAllowed = (405, "Method Not Allowed");
    NotAcceptable = (406, "Not Acceptable");
    ProxyAuthenticationRequired = (407, "Proxy Authentication Required");
    RequestTimeout = (408, "Request Timeout");
    Conflict = (409, "Conflict");
    Gone = (410, "Gone");
    LengthRequired = (411, "Length Required");
    PreconditionFailed = (412, "Precondition Failed");
    PayloadTooLarge = (413, "Payload Too Large");
    UriTooLong = (414, "URI Too Long");
    UnsupportedMediaType = (415, "Unsupported Media Type");
    RangeNotSatisfiable = (416, "Range Not Satisfiable");
    ExpectationFailed = (417, "Expectation Failed");
    ImaTeapot = (418, "I'm a teapot");
    MisdirectedRequest = (421, "Misdirected Request");
    UnprocessableEntity = (422, "Unprocessable Entity");
    Locked = (423, "Locked");
    FailedDependency = (424, "Failed Dependency");
    TooEarly = (425, "Too Early");
    UpgradeRequired = (426, "Upgrade Required");
    PreconditionRequired = (428, "Precondition Required");
    TooManyRequests = (429, "Too Many Requests");
    RequestHeaderFieldsTooLarge = (431, "Request Header Fields Too Large");
    UnavailableForLegalReasons = (451, "Unavailable For Legal Reasons");

    InternalServerError = (500, "Internal Server Error");
    NotImplemented = (501, "Not Implemented");
    BadGateway = (502, "Bad Gateway");
    ServiceUnavailable = (503, "Service Unavailable");
    GatewayTimeout = (504, "Gateway Timeout");
    HttpVersionNotSupported = (505, "HTTP Version Not Supported");
    VariantAlsoNegotiates = (506, "Variant Also Negotiates");
    InsufficientStorage = (507, "Insufficient Storage");
    LoopDetected = (508, "Loop Detected");
    NotExtended = (510, "Not Extended");
    NetworkAuthenticationRequired = (511, "Network Authentication Required");
}

impl From<StatusCode> for u16 {
    #[inline]
    fn from(code: StatusCode) -> Self {
        code.as_u16()
    }
}
