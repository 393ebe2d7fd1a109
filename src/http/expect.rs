//! `Expect: 100-continue` interception
//!
//! Each request gets a fresh [`RequestContext`]; the connection never carries
//! expect state from one request to the next.

use super::query::QueryFlags;
use super::response::CONTINUE;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Request-scoped negotiation state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    expect_100_received: bool,
    override_return_100: bool,
}

/// What happened to the client's `Expect: 100-continue`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectOutcome {
    NotRequested,
    Continued,
    Suppressed,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a client's `Expect: 100-continue` before the body is read.
    ///
    /// With `return-100=false` nothing is written and the suppression is only
    /// reported in the final body; otherwise `100 Continue` is written and flushed.
    pub async fn intercept_continue<W>(
        &mut self,
        flags: &QueryFlags,
        writer: &mut W,
    ) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        self.expect_100_received = true;
        if flags.return_100() {
            writer.write_all(CONTINUE).await?;
            writer.flush().await?;
            debug!("Sent 100 Continue");
        } else {
            self.override_return_100 = true;
            debug!("Suppressed 100 Continue");
        }
        Ok(())
    }

    pub fn outcome(&self) -> ExpectOutcome {
        match (self.expect_100_received, self.override_return_100) {
            (false, _) => ExpectOutcome::NotRequested,
            (true, false) => ExpectOutcome::Continued,
            (true, true) => ExpectOutcome::Suppressed,
        }
    }
}

impl ExpectOutcome {
    /// Status line appended to the diagnostic body, CRLF included
    pub fn message(&self) -> &'static str {
        match self {
            ExpectOutcome::NotRequested => "Client did not send “Expect: 100-continue”\r\n",
            ExpectOutcome::Continued => concat!(
                "Client sent “Expect: 100-continue”, and server returned normally with ",
                "“100 Continue” (use ?return-100=false to override)\r\n"
            ),
            ExpectOutcome::Suppressed => concat!(
                "Client sent “Expect: 100-continue”, but server did NOT return ",
                "“100 Continue” (due to ?return-100=false)\r\n"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_writes_continue() {
        let mut ctx = RequestContext::new();
        let mut out = Vec::new();
        ctx.intercept_continue(&QueryFlags::parse(""), &mut out).await.unwrap();

        assert_eq!(out, CONTINUE);
        assert_eq!(ctx.outcome(), ExpectOutcome::Continued);
    }

    #[tokio::test]
    async fn test_override_writes_nothing() {
        let mut ctx = RequestContext::new();
        let mut out = Vec::new();
        ctx.intercept_continue(&QueryFlags::parse("return-100=false"), &mut out).await.unwrap();

        assert!(out.is_empty());
        assert_eq!(ctx.outcome(), ExpectOutcome::Suppressed);
    }

    #[test]
    fn test_fresh_context_reports_not_requested() {
        assert_eq!(RequestContext::new().outcome(), ExpectOutcome::NotRequested);
        assert!(ExpectOutcome::Suppressed.message().contains("did NOT return"));
        assert!(ExpectOutcome::Continued.message().contains("returned normally"));
    }
}
