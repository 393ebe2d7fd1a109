use crate::common::EchoClient;
use crate::{EchoError, Result};
use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use ::http::StatusCode;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Configuration for the HTTP echo client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read timeout for a full response
    pub read_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum response body size to prevent memory exhaustion
    pub max_response_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_response_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// A parsed final response
#[derive(Debug, Clone)]
pub struct EchoResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl EchoResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Raw HTTP/1.1 client over one persistent connection
///
/// Requests are written verbatim, so tests can send exactly the bytes a
/// misbehaving client or proxy would.
///
/// ```no_run
/// use echo_headers::http::HttpEchoClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = HttpEchoClient::connect("127.0.0.1:8080".parse()?).await?;
///     let response = client.request("GET", "/", &[("Host", "localhost")], b"").await?;
///     println!("{}", response.body_text());
///     Ok(())
/// }
/// ```
pub struct HttpEchoClient {
    stream: TcpStream,
    buffer: BytesMut,
    config: ClientConfig,
}

impl HttpEchoClient {
    pub async fn connect_with_config(addr: SocketAddr, config: ClientConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| EchoError::Timeout("Connection timeout".to_string()))??;
        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            config,
        })
    }

    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Local end of the connection, i.e. what the server sees as the client address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.stream.local_addr()?)
    }

    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Sends a complete request with a `Content-Length` derived from `body`
    /// and reads the final response.
    pub async fn request(
        &mut self,
        method: &str,
        target: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<EchoResponse> {
        let mut raw = format!("{method} {target} HTTP/1.1\r\n").into_bytes();
        for (name, value) in headers {
            raw.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        if !body.is_empty() {
            raw.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
        }
        raw.extend_from_slice(b"\r\n");
        raw.extend_from_slice(body);
        self.send_raw(&raw).await?;
        self.read_response().await
    }

    /// Waits up to `wait` for a `100 Continue`, consuming it if it arrives.
    ///
    /// Returns false on timeout; any other status is left for
    /// [`read_response`](Self::read_response).
    pub async fn await_continue(&mut self, wait: Duration) -> Result<bool> {
        timeout(wait, self.next_is_continue()).await.unwrap_or(Ok(false))
    }

    async fn next_is_continue(&mut self) -> Result<bool> {
        loop {
            if let Some((status, len)) = parse_status(&self.buffer)? {
                if status != StatusCode::CONTINUE {
                    return Ok(false);
                }
                self.buffer.advance(len);
                return Ok(true);
            }
            self.fill().await?;
        }
    }

    /// Reads the next final response, skipping any 1xx interim responses.
    pub async fn read_response(&mut self) -> Result<EchoResponse> {
        let read_timeout = self.config.read_timeout;
        timeout(read_timeout, self.read_final())
            .await
            .map_err(|_| EchoError::Timeout("Read timeout".to_string()))?
    }

    async fn read_final(&mut self) -> Result<EchoResponse> {
        loop {
            let (status, headers, head_len) = loop {
                if let Some(head) = parse_head(&self.buffer)? {
                    break head;
                }
                self.fill().await?;
            };
            self.buffer.advance(head_len);
            if status.is_informational() {
                continue;
            }

            let length = headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case("Content-Length"))
                .map(|(_, v)| v.trim().parse::<usize>())
                .transpose()
                .map_err(|e| EchoError::Config(format!("Invalid Content-Length in response: {e}")))?
                .unwrap_or(0);
            if length > self.config.max_response_size {
                return Err(EchoError::Config(format!(
                    "Response too large: {length} bytes, max allowed: {}",
                    self.config.max_response_size
                )));
            }
            while self.buffer.len() < length {
                self.fill().await?;
            }
            let body = self.buffer.split_to(length).freeze();
            return Ok(EchoResponse { status, headers, body });
        }
    }

    async fn fill(&mut self) -> Result<()> {
        self.buffer.reserve(4096);
        if self.stream.read_buf(&mut self.buffer).await? == 0 {
            return Err(EchoError::Tcp(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EchoClient for HttpEchoClient {
    /// POSTs `data` and returns the diagnostic body
    async fn echo(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let response = self.request("POST", "/", &[("Host", "localhost")], data).await?;
        Ok(response.body.to_vec())
    }
}

type ParsedHead = (StatusCode, Vec<(String, String)>, usize);

fn parse_head(buf: &[u8]) -> Result<Option<ParsedHead>> {
    let mut headers = [httparse::EMPTY_HEADER; 64];
    let mut res = httparse::Response::new(&mut headers);
    match res.parse(buf) {
        Ok(httparse::Status::Complete(len)) => {
            let status = res
                .code
                .and_then(|c| StatusCode::from_u16(c).ok())
                .ok_or_else(|| EchoError::Config("Response without a valid status".to_string()))?;
            let headers = res
                .headers
                .iter()
                .map(|h| (h.name.to_string(), String::from_utf8_lossy(h.value).into_owned()))
                .collect();
            Ok(Some((status, headers, len)))
        }
        Ok(httparse::Status::Partial) => Ok(None),
        Err(e) => Err(EchoError::Config(format!("Failed to parse response: {e}"))),
    }
}

fn parse_status(buf: &[u8]) -> Result<Option<(StatusCode, usize)>> {
    Ok(parse_head(buf)?.map(|(status, _, len)| (status, len)))
}
