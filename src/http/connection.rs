use super::config::HttpConfig;
use super::echo::DiagnosticBody;
use super::expect::RequestContext;
use super::protocol::{EchoMethod, HttpError, RequestHead};
use super::query::QueryFlags;
use super::response::Response;
use crate::diagnostics::ConnectionGuard;
use bytes::{Buf, BytesMut};
use ::http::{StatusCode, Version};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info};

const READ_CHUNK: usize = 8 * 1024;

/// One client connection: reads requests sequentially and answers each with
/// its diagnostic echo until the peer leaves or keep-alive ends.
pub struct HttpConnection<S> {
    stream: S,
    peer: SocketAddr,
    config: Arc<HttpConfig>,
    buffer: BytesMut,
    guard: Option<ConnectionGuard>,
}

impl<S> HttpConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr, config: Arc<HttpConfig>) -> Self {
        Self {
            stream,
            peer,
            config,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            guard: None,
        }
    }

    /// Reports completed requests to a diagnostic tracker
    pub fn tracked(mut self, guard: ConnectionGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Serves requests until the connection ends.
    ///
    /// A clean close by the peer between requests is `Ok`. Framing errors are
    /// returned after an error response has been sent where one is possible.
    pub async fn serve(mut self) -> Result<(), HttpError> {
        loop {
            let head = match self.read_head().await {
                Ok(Some(head)) => head,
                Ok(None) => {
                    debug!(peer = %self.peer, "Client closed connection");
                    return Ok(());
                }
                Err(HttpError::IdleTimeout) => {
                    info!(peer = %self.peer, "Idle timeout, closing connection");
                    return Ok(());
                }
                Err(e) => {
                    if let Some(status) = e.status() {
                        self.write_response(&Response::error(status, &e.to_string())).await?;
                    }
                    return Err(e);
                }
            };

            if !self.handle_request(head).await? {
                return Ok(());
            }
        }
    }

    /// Answers one request; returns whether the connection stays open
    async fn handle_request(&mut self, head: RequestHead) -> Result<bool, HttpError> {
        let Some(method) = EchoMethod::from_method(&head.method) else {
            let response = Response::error(
                StatusCode::NOT_IMPLEMENTED,
                &format!("Unsupported method ({})", head.method),
            );
            self.write_response(&response).await?;
            self.log_exchange(&head, response.status(), response.body().len());
            return Ok(false);
        };

        let flags = QueryFlags::from_target(&head.target);
        let mut context = RequestContext::new();
        if head.expects_continue() {
            context.intercept_continue(&flags, &mut self.stream).await?;
        }

        let content_length = head.content_length()?;
        let mut body = DiagnosticBody::new(&head);
        let sink = if flags.echo_body() { Some(&mut body) } else { None };
        self.drain_body(content_length, sink).await?;

        let keep_alive = head.keep_alive();
        let mut response = Response::diagnostic(body.finish(self.peer, context.outcome()));
        if !keep_alive {
            response = response.header("Connection", "close");
        } else if head.version == Version::HTTP_10 {
            response = response.header("Connection", "keep-alive");
        }
        self.write_response(&response).await?;

        debug!(
            %method,
            content_length,
            echo_body = flags.echo_body(),
            expect = ?context.outcome(),
            "Request echoed"
        );
        self.log_exchange(&head, response.status(), response.body().len());
        if let Some(guard) = &self.guard {
            guard.record_request(head.request_line());
        }
        Ok(keep_alive)
    }

    async fn read_head(&mut self) -> Result<Option<RequestHead>, HttpError> {
        loop {
            if !self.buffer.is_empty() {
                let parsed = RequestHead::parse(&self.buffer, self.config.max_headers)?;
                if let Some((head, len)) = parsed {
                    self.buffer.advance(len);
                    return Ok(Some(head));
                }
                let limit = self.config.max_head_size;
                if self.buffer.len() >= limit {
                    let line_ended = self.buffer.windows(2).any(|w| w == b"\r\n");
                    return Err(if line_ended {
                        HttpError::HeadTooLarge { limit }
                    } else {
                        HttpError::RequestLineTooLong { limit }
                    });
                }
            }

            let idle = self.buffer.is_empty();
            if self.read_more(idle).await? == 0 {
                return if idle {
                    Ok(None)
                } else {
                    Err(HttpError::IncompleteRequest)
                };
            }
        }
    }

    /// Consumes exactly `declared` body bytes, copying them into `sink` if given.
    ///
    /// A zero-length read before the count is reached ends the connection.
    async fn drain_body(
        &mut self,
        declared: u64,
        mut sink: Option<&mut DiagnosticBody>,
    ) -> Result<(), HttpError> {
        let mut remaining = declared;
        while remaining > 0 {
            if self.buffer.is_empty() && self.read_more(false).await? == 0 {
                return Err(HttpError::BodyTruncated {
                    expected: declared,
                    received: declared - remaining,
                });
            }
            let take = self.buffer.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            let chunk = self.buffer.split_to(take);
            if let Some(body) = sink.as_mut() {
                body.append_request_body(&chunk);
            }
            remaining -= take as u64;
        }
        Ok(())
    }

    /// Reads whatever the peer has sent into the buffer.
    ///
    /// `idle` marks a wait between requests, the only wait the idle timeout covers.
    async fn read_more(&mut self, idle: bool) -> Result<usize, HttpError> {
        self.buffer.reserve(READ_CHUNK);
        let read = self.stream.read_buf(&mut self.buffer);
        let n = match self.config.idle_timeout {
            Some(limit) if idle => {
                timeout(limit, read).await.map_err(|_| HttpError::IdleTimeout)??
            }
            _ => read.await?,
        };
        Ok(n)
    }

    async fn write_response(&mut self, response: &Response) -> Result<(), HttpError> {
        let encoded = response.encode(&self.config.server_name);
        self.stream.write_all(&encoded).await?;
        self.stream.flush().await?;
        Ok(())
    }

    fn log_exchange(&self, head: &RequestHead, status: StatusCode, bytes: usize) {
        info!(
            peer = %self.peer,
            method = %head.method,
            target = %head.target,
            version = ?head.version,
            status = status.as_u16(),
            bytes,
            "Handled request"
        );
    }
}
