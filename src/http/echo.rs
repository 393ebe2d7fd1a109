use super::expect::ExpectOutcome;
use super::protocol::RequestHead;
use bytes::{BufMut, Bytes, BytesMut};
use std::net::SocketAddr;

/// Incrementally assembled diagnostic body.
///
/// Construction writes the request line, the headers and the blank line;
/// request body chunks may then be appended; [`DiagnosticBody::finish`] adds
/// the client address and the expect line.
#[derive(Debug)]
pub struct DiagnosticBody {
    buf: BytesMut,
}

impl DiagnosticBody {
    pub fn new(head: &RequestHead) -> Self {
        let mut buf = BytesMut::with_capacity(512);
        buf.put_slice(head.request_line().as_bytes());
        buf.put_slice(b"\r\n");
        for header in &head.headers {
            buf.put_slice(header.name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(&header.value);
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(b"\r\n");
        Self { buf }
    }

    pub fn append_request_body(&mut self, chunk: &[u8]) {
        self.buf.put_slice(chunk);
    }

    pub fn finish(mut self, peer: SocketAddr, expect: ExpectOutcome) -> Bytes {
        // ip and port printed separately: no brackets around IPv6 hosts
        let address = format!("\r\nImmediate client address: {}:{}\r\n", peer.ip(), peer.port());
        self.buf.put_slice(address.as_bytes());
        self.buf.put_slice(expect.message().as_bytes());
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(raw: &str) -> RequestHead {
        RequestHead::parse(raw.as_bytes(), 16).unwrap().unwrap().0
    }

    #[test]
    fn test_body_layout() {
        let request = head("POST /foo HTTP/1.1\r\nHost: a\r\nContent-Length: 5\r\n\r\n");
        let mut body = DiagnosticBody::new(&request);
        body.append_request_body(b"hello");
        let out = body.finish("10.0.0.7:4321".parse().unwrap(), ExpectOutcome::NotRequested);

        assert_eq!(
            &out[..],
            "POST /foo HTTP/1.1\r\nHost: a\r\nContent-Length: 5\r\n\r\nhello\r\n\
             Immediate client address: 10.0.0.7:4321\r\n\
             Client did not send “Expect: 100-continue”\r\n"
                .as_bytes()
        );
    }

    #[test]
    fn test_ipv6_peer_without_brackets() {
        let body = DiagnosticBody::new(&head("GET / HTTP/1.1\r\n\r\n"));
        let out = body.finish("[::1]:8081".parse().unwrap(), ExpectOutcome::Suppressed);
        let text = String::from_utf8(out.to_vec()).unwrap();
        assert!(text.contains("Immediate client address: ::1:8081\r\n"));
        assert!(text.ends_with("(due to ?return-100=false)\r\n"));
    }

    #[test]
    fn test_raw_header_bytes_are_kept() {
        let mut raw = b"GET / HTTP/1.1\r\nX-Bin: ".to_vec();
        raw.extend_from_slice(&[0xC3, 0xA9]);
        raw.extend_from_slice(b"\r\n\r\n");
        let (head, _) = RequestHead::parse(&raw, 4).unwrap().unwrap();
        let out = DiagnosticBody::new(&head)
            .finish("127.0.0.1:1".parse().unwrap(), ExpectOutcome::NotRequested);
        assert!(out.windows(9).any(|w| w == b"X-Bin: \xC3\xA9"));
    }
}
