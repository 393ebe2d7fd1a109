use bytes::{BufMut, Bytes, BytesMut};
use ::http::StatusCode;

/// Provisional response sent when a client's `Expect: 100-continue` is honoured
pub const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// A final HTTP/1.1 response.
///
/// `Content-Length` is not a settable header: [`Response::encode`] always
/// derives it from the body.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(&'static str, String)>,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `200 OK` carrying a diagnostic echo
    pub fn diagnostic(body: Bytes) -> Self {
        Self::new(StatusCode::OK, body).header("Content-Type", TEXT_PLAIN)
    }

    /// Plain-text error that closes the connection
    pub fn error(status: StatusCode, message: &str) -> Self {
        let reason = status.canonical_reason().unwrap_or("Error");
        Self::new(status, format!("{} {reason}: {message}\r\n", status.as_u16()))
            .header("Content-Type", TEXT_PLAIN)
            .header("Connection", "close")
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Serializes status line, `Server`/`Date`, the headers, `Content-Length` and body
    pub fn encode(&self, server_name: &str) -> BytesMut {
        let mut out = BytesMut::with_capacity(256 + self.body.len());
        let reason = self.status.canonical_reason().unwrap_or("");
        out.put_slice(format!("HTTP/1.1 {} {reason}\r\n", self.status.as_u16()).as_bytes());
        put_header(&mut out, "Server", server_name);
        put_header(&mut out, "Date", &http_date());
        for (name, value) in &self.headers {
            put_header(&mut out, name, value);
        }
        put_header(&mut out, "Content-Length", &self.body.len().to_string());
        out.put_slice(b"\r\n");
        out.put_slice(&self.body);
        out
    }
}

fn put_header(out: &mut BytesMut, name: &str, value: &str) {
    out.put_slice(name.as_bytes());
    out.put_slice(b": ");
    out.put_slice(value.as_bytes());
    out.put_slice(b"\r\n");
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
fn http_date() -> String {
    chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
