use bytes::Bytes;
use ::http::{Method, StatusCode, Version};
use std::fmt;
use std::io;

/// Errors raised while framing HTTP/1.1 requests on a connection
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP parsing error: {0}")]
    HttpParse(#[from] httparse::Error),
    #[error("Request head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },
    #[error("Request line exceeds {limit} bytes")]
    RequestLineTooLong { limit: usize },
    #[error("Invalid Content-Length: {0:?}")]
    InvalidContentLength(String),
    #[error("Connection closed after {received} of {expected} body bytes")]
    BodyTruncated { expected: u64, received: u64 },
    #[error("Connection closed in the middle of a request head")]
    IncompleteRequest,
    #[error("Connection idle for too long")]
    IdleTimeout,
}

impl HttpError {
    /// Status to send before closing the connection, if a response is still possible
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::HttpParse(httparse::Error::TooManyHeaders)
            | HttpError::HeadTooLarge { .. } => Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE),
            HttpError::RequestLineTooLong { .. } => Some(StatusCode::URI_TOO_LONG),
            HttpError::HttpParse(httparse::Error::Version) => {
                Some(StatusCode::HTTP_VERSION_NOT_SUPPORTED)
            }
            HttpError::HttpParse(_) => Some(StatusCode::BAD_REQUEST),
            _ => None,
        }
    }
}

/// The closed set of methods this server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl EchoMethod {
    pub fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(EchoMethod::Get),
            Method::POST => Some(EchoMethod::Post),
            Method::PUT => Some(EchoMethod::Put),
            Method::DELETE => Some(EchoMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EchoMethod::Get => "GET",
            EchoMethod::Post => "POST",
            EchoMethod::Put => "PUT",
            EchoMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for EchoMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A header as received: original name case, raw value bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    pub name: String,
    pub value: Bytes,
}

/// Parsed request line and headers of one request
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub target: String,
    pub version: Version,
    pub headers: Vec<HeaderField>,
}

impl RequestHead {
    /// Parses a request head from the front of `buf`.
    ///
    /// Returns `Ok(None)` when more bytes are needed, otherwise the head and
    /// the number of bytes it occupied.
    pub fn parse(buf: &[u8], max_headers: usize) -> Result<Option<(Self, usize)>, HttpError> {
        let mut headers = vec![httparse::EMPTY_HEADER; max_headers];
        let mut req = httparse::Request::new(&mut headers);

        let parsed_len = match req.parse(buf)? {
            httparse::Status::Complete(len) => len,
            httparse::Status::Partial => return Ok(None),
        };

        let malformed = || HttpError::HttpParse(httparse::Error::Token);
        let method = req
            .method
            .ok_or_else(malformed)
            .and_then(|m| Method::from_bytes(m.as_bytes()).map_err(|_| malformed()))?;
        let target = req.path.ok_or_else(malformed)?.to_string();
        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            _ => return Err(HttpError::HttpParse(httparse::Error::Version)),
        };
        let headers = req
            .headers
            .iter()
            .map(|h| HeaderField {
                name: h.name.to_string(),
                value: Bytes::copy_from_slice(h.value),
            })
            .collect();

        Ok(Some((
            Self {
                method,
                target,
                version,
                headers,
            },
            parsed_len,
        )))
    }

    /// First value of the named header, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_ref())
    }

    /// Declared body length. Absent means zero, negative integers count as zero.
    pub fn content_length(&self) -> Result<u64, HttpError> {
        let Some(raw) = self.header("Content-Length") else {
            return Ok(0);
        };
        let invalid =
            || HttpError::InvalidContentLength(String::from_utf8_lossy(raw).into_owned());
        let text = std::str::from_utf8(raw).map_err(|_| invalid())?;
        let value: i64 = text.trim().parse().map_err(|_| invalid())?;
        Ok(u64::try_from(value).unwrap_or(0))
    }

    /// Whether the connection stays open after this exchange
    pub fn keep_alive(&self) -> bool {
        if self.has_connection_token("close") {
            return false;
        }
        self.version == Version::HTTP_11 || self.has_connection_token("keep-alive")
    }

    /// `Expect: 100-continue` on an HTTP/1.1 request
    pub fn expects_continue(&self) -> bool {
        self.version == Version::HTTP_11
            && self
                .header("Expect")
                .is_some_and(|v| v.trim_ascii().eq_ignore_ascii_case(b"100-continue"))
    }

    /// The request line without the trailing CRLF
    pub fn request_line(&self) -> String {
        format!("{} {} {}", self.method, self.target, version_token(self.version))
    }

    fn has_connection_token(&self, token: &str) -> bool {
        self.headers
            .iter()
            .filter(|h| h.name.eq_ignore_ascii_case("Connection"))
            .flat_map(|h| h.value.split(|b| *b == b','))
            .any(|t| t.trim_ascii().eq_ignore_ascii_case(token.as_bytes()))
    }
}

/// Protocol token as it appears on the wire
pub fn version_token(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}
