//! Outgoing HTTP response: a [Message] plus status line.

use crate::{
    errors::{Error, Result},
    http::{
        message::{copy_on_write, message_copy_on_write, HttpMessage, Message, MessageMut},
        types::StatusCode,
    },
};

/// HTTP response with a status code and reason phrase.
///
/// Starts as `200 OK`. Without an explicit reason phrase
/// [`with_status`](Response::with_status) takes the one of the
/// [StatusCode] table; unregistered codes get an empty phrase.
///
/// # Examples
/// ```
/// use maker_message::{HttpMessage, Response, StatusCode};
///
/// let response = Response::new()
///     .with_status(StatusCode::NotFound.into(), None)
///     .unwrap()
///     .with_header("Content-Type", "application/json")
///     .with_body(r#"{"status": "not found"}"#);
///
/// assert_eq!(response.status_code(), 404);
/// assert_eq!(response.reason_phrase(), "Not Found");
/// assert_eq!(
///     response.serialize().unwrap(),
///     b"HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\n\r\n{\"status\": \"not found\"}"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    message: Message,
    status: u16,
    reason: String,
}

impl Default for Response {
    fn default() -> Self {
        Self::from_message(Message::new())
    }
}

impl Response {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// A `200 OK` response around an existing message.
    pub fn from_message(message: Message) -> Self {
        Self {
            message,
            status: StatusCode::Ok.as_u16(),
            reason: StatusCode::Ok.reason_phrase().to_owned(),
        }
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    #[inline]
    pub fn reason_phrase(&self) -> &str {
        &self.reason
    }

    /// Status line, headers and the whole body, ready for the wire.
    ///
    /// Multiple values of one header are joined into a single line.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buffer = format!(
            "HTTP/{} {} {}\r\n",
            self.protocol_version(),
            self.status,
            self.reason
        )
        .into_bytes();

        for (name, values) in self.headers().iter() {
            buffer.extend_from_slice(name.as_bytes());
            buffer.extend_from_slice(b": ");
            buffer.extend_from_slice(values.join(", ").as_bytes());
            buffer.extend_from_slice(b"\r\n");
        }
        buffer.extend_from_slice(b"\r\n");

        buffer.extend_from_slice(&self.body().contents()?);
        Ok(buffer)
    }

    fn set_status(&mut self, code: u16, reason: Option<&str>) -> Result<()> {
        if !(100..=599).contains(&code) {
            return Err(Error::InvalidStatus(code));
        }

        self.reason = match reason {
            Some(reason) => reason.to_owned(),
            None => StatusCode::from_u16(code)
                .map(|status| status.reason_phrase())
                .unwrap_or_default()
                .to_owned(),
        };
        self.status = code;
        Ok(())
    }
}

copy_on_write! { Response {
    /// Sets the status; codes outside `100..=599` are rejected.
    fn with_status(code: u16, reason: Option<&str>) => set_status?;
}}

message_copy_on_write!(Response);

impl HttpMessage for Response {
    #[inline]
    fn message(&self) -> &Message {
        &self.message
    }
}

impl MessageMut for Response {
    #[inline]
    fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}
