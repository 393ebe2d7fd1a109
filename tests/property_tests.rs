use echo_headers::common::spawn_test_server;
use echo_headers::http::{HttpConfig, HttpEchoClient};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the echoed body sits right after the blank line, byte for byte,
    /// and Content-Length always equals the response body length
    #[test]
    fn body_echoed_verbatim(data in prop::collection::vec(any::<u8>(), 1..4096)) {
        tokio_test::block_on(async {
            let (server_handle, addr, _shutdown) = spawn_test_server(HttpConfig::default()).await
                .map_err(|e| TestCaseError::fail(format!("Server setup failed: {e}")))?;

            let mut client = HttpEchoClient::connect(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {e}")))?;
            let response = client.request("POST", "/p", &[], &data).await
                .map_err(|e| TestCaseError::fail(format!("Request failed: {e}")))?;

            server_handle.abort();

            let head = format!("POST /p HTTP/1.1\r\nContent-Length: {}\r\n\r\n", data.len());
            let declared: usize = response
                .header("Content-Length")
                .unwrap_or("0")
                .parse()
                .unwrap_or(usize::MAX);
            prop_assert_eq!(declared, response.body.len());
            prop_assert!(response.body.starts_with(head.as_bytes()));
            prop_assert_eq!(&response.body[head.len()..head.len() + data.len()], &data[..]);
            Ok(())
        })?;
    }

    /// Property: with echo-body=false the body never appears, yet the next
    /// request on the same connection is still framed correctly
    #[test]
    fn suppressed_body_is_drained(data in prop::collection::vec(any::<u8>(), 1..4096)) {
        tokio_test::block_on(async {
            let (server_handle, addr, _shutdown) = spawn_test_server(HttpConfig::default()).await
                .map_err(|e| TestCaseError::fail(format!("Server setup failed: {e}")))?;

            let mut client = HttpEchoClient::connect(addr).await
                .map_err(|e| TestCaseError::fail(format!("Client connection failed: {e}")))?;
            let first = client.request("POST", "/?echo-body=false", &[], &data).await
                .map_err(|e| TestCaseError::fail(format!("First request failed: {e}")))?;
            let second = client.request("GET", "/second", &[], b"").await
                .map_err(|e| TestCaseError::fail(format!("Second request failed: {e}")))?;

            server_handle.abort();

            let head = format!(
                "POST /?echo-body=false HTTP/1.1\r\nContent-Length: {}\r\n\r\n\r\nImmediate client address: ",
                data.len()
            );
            prop_assert!(first.body.starts_with(head.as_bytes()));
            prop_assert!(second.body.starts_with(b"GET /second HTTP/1.1\r\n\r\n\r\n"));
            Ok(())
        })?;
    }
}
