//! Mock transport for deterministic testing of protocol engines.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test command framing, response
//! parsing, flushing, and retry behaviour without a mount on the bench.
//!
//! Besides the ordered expectations, the mock can model the awkward parts
//! of a real serial line:
//!
//! - stale bytes already sitting in the input buffer ([`inject`](MockTransport::inject))
//! - bytes still on the wire that survive `clear_input()`
//!   ([`inject_late`](MockTransport::inject_late))
//! - per-read latency and response chunking
//! - short writes
//!
//! # Example
//!
//! ```
//! use lx200_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the channel sends this command, the mount answers with this block.
//! mock.expect(b"#:GOS#", b"P00S0000002000#");
//! // Blind command: no reply.
//! mock.expect_blind(b"#:KA");
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lx200_core::error::{Error, Result};
use lx200_core::transport::Transport;

/// What the mock does when a matching request is sent.
#[derive(Debug, Clone)]
enum Outcome {
    /// Queue these bytes for reading.
    Respond(Vec<u8>),
    /// Accept only `written` bytes and fail the send.
    ShortWrite(usize),
}

/// A pre-loaded request/outcome pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    outcome: Outcome,
}

#[derive(Debug, Default)]
struct LogInner {
    sent: Vec<Vec<u8>>,
    clears: usize,
}

/// Shared view of everything written through a [`MockTransport`].
///
/// The handle stays valid after the mock has been moved into a
/// `Box<dyn Transport>`, so tests can check what reached the wire (or that
/// nothing did).
#[derive(Debug, Clone, Default)]
pub struct MockLog {
    inner: Arc<Mutex<LogInner>>,
}

impl MockLog {
    fn with<R>(&self, f: impl FnOnce(&mut LogInner) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Every `send()` payload, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.with(|log| log.sent.clone())
    }

    /// Every `send()` payload decoded as text.
    pub fn sent_text(&self) -> Vec<String> {
        self.with(|log| {
            log.sent
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect()
        })
    }

    /// Number of `send()` calls.
    pub fn writes(&self) -> usize {
        self.with(|log| log.sent.len())
    }

    /// Number of `clear_input()` calls.
    pub fn clears(&self) -> usize {
        self.with(|log| log.clears)
    }
}

/// A mock [`Transport`] for testing protocol engines without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; its response
/// is appended to the input buffer and handed out by `receive()`.
///
/// Once the ordered expectations run out, sends are looked up in the
/// reusable reply table registered with [`reply`](MockTransport::reply).
/// Anything else is an error.
#[derive(Debug)]
pub struct MockTransport {
    expectations: VecDeque<Expectation>,
    /// Replies that can be used any number of times, in any order.
    replies: HashMap<Vec<u8>, Vec<u8>>,
    /// Fallback replies keyed by request prefix, first match wins.
    prefix_replies: Vec<(Vec<u8>, Vec<u8>)>,
    /// Bytes available to `receive()`.
    input: VecDeque<u8>,
    /// Bytes that arrive right after the next `clear_input()`.
    late: Vec<u8>,
    connected: bool,
    latency: Duration,
    /// Maximum bytes handed out per `receive()`; 0 means unlimited.
    chunk_size: usize,
    log: MockLog,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            replies: HashMap::new(),
            prefix_replies: Vec::new(),
            input: VecDeque::new(),
            late: Vec::new(),
            connected: true,
            latency: Duration::ZERO,
            chunk_size: 0,
            log: MockLog::default(),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, the
    /// subsequent `receive()` calls will return `response`. An empty
    /// response makes the mount stay silent (reads time out).
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            outcome: Outcome::Respond(response.to_vec()),
        });
    }

    /// Expect a command that the mount never answers.
    pub fn expect_blind(&mut self, request: &[u8]) {
        self.expect(request, b"");
    }

    /// Expect a command whose write stops after `written` bytes.
    pub fn expect_short_write(&mut self, request: &[u8], written: usize) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            outcome: Outcome::ShortWrite(written),
        });
    }

    /// Register a reply that can be used any number of times.
    pub fn reply(&mut self, request: &[u8], response: &[u8]) {
        self.replies.insert(request.to_vec(), response.to_vec());
    }

    /// Register a reusable reply for every request starting with `prefix`.
    ///
    /// Consulted after the exact [`reply`](MockTransport::reply) table, in
    /// registration order.
    pub fn reply_prefix(&mut self, prefix: &[u8], response: &[u8]) {
        self.prefix_replies.push((prefix.to_vec(), response.to_vec()));
    }

    /// Put stale bytes in the input buffer, as if left over from an
    /// earlier exchange.
    pub fn inject(&mut self, data: &[u8]) {
        self.input.extend(data.iter().copied());
    }

    /// Queue bytes that are still in flight: they survive the next
    /// `clear_input()` and become readable right after it.
    pub fn inject_late(&mut self, data: &[u8]) {
        self.late.extend_from_slice(data);
    }

    /// Delay every successful `receive()` by `latency`.
    pub fn set_latency(&mut self, latency: Duration) {
        self.latency = latency;
    }

    /// Hand out at most `size` bytes per `receive()`.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size;
    }

    /// Return a handle to the sent-data log.
    pub fn log(&self) -> MockLog {
        self.log.clone()
    }

    /// Return all data that has been sent through this transport.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.log.sent()
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.log.with(|log| log.sent.push(data.to_vec()));

        let outcome = if let Some(expectation) = self.expectations.pop_front() {
            if data != expectation.request.as_slice() {
                return Err(Error::Protocol(format!(
                    "unexpected send data: expected {:?}, got {:?}",
                    String::from_utf8_lossy(&expectation.request),
                    String::from_utf8_lossy(data)
                )));
            }
            expectation.outcome
        } else if let Some(response) = self.replies.get(data) {
            Outcome::Respond(response.clone())
        } else if let Some((_, response)) = self
            .prefix_replies
            .iter()
            .find(|(prefix, _)| data.starts_with(prefix))
        {
            Outcome::Respond(response.clone())
        } else {
            return Err(Error::Protocol(format!(
                "no expectation in mock transport for {:?}",
                String::from_utf8_lossy(data)
            )));
        };

        match outcome {
            Outcome::Respond(response) => {
                self.input.extend(response);
                Ok(())
            }
            Outcome::ShortWrite(written) => Err(Error::ShortWrite {
                written,
                expected: data.len(),
            }),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if self.input.is_empty() {
            return Err(Error::timeout());
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut n = self.input.len().min(buf.len());
        if self.chunk_size > 0 {
            n = n.min(self.chunk_size);
        }
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn clear_input(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.log.with(|log| log.clears += 1);
        self.input.clear();
        self.input.extend(self.late.drain(..));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.input.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lx200_core::transport::Transport;

    #[tokio::test]
    async fn mock_transport_basic_send_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b"#:GOS#", b"P00S0000002000#");

        mock.send(b"#:GOS#").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(&buf[..n], b"P00S0000002000#");
    }

    #[tokio::test]
    async fn mock_transport_tracks_sent_data() {
        let mut mock = MockTransport::new();
        let log = mock.log();
        mock.expect_blind(b"#:KA");
        mock.expect(b":GG#", b"-05:00:00#");

        mock.send(b"#:KA").await.unwrap();
        mock.send(b":GG#").await.unwrap();

        assert_eq!(log.writes(), 2);
        assert_eq!(log.sent_text(), vec!["#:KA", ":GG#"]);
        assert_eq!(mock.sent_data()[0], b"#:KA");
    }

    #[tokio::test]
    async fn mock_transport_wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(b":GR#", b"12:00:00#");

        let result = mock.send(b":GD#").await;
        assert!(matches!(result.unwrap_err(), Error::Protocol(_)));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();
        let result = mock.send(b":Q#").await;
        assert!(matches!(result.unwrap_err(), Error::Protocol(_)));
    }

    #[tokio::test]
    async fn mock_transport_receive_without_send_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 64];

        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn mock_transport_reusable_replies() {
        let mut mock = MockTransport::new();
        mock.reply(b":GR#", b"05:00:00#");

        let mut buf = [0u8; 64];
        for _ in 0..3 {
            mock.send(b":GR#").await.unwrap();
            let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
            assert_eq!(&buf[..n], b"05:00:00#");
        }
    }

    #[tokio::test]
    async fn mock_transport_clear_input_drops_stale_bytes() {
        let mut mock = MockTransport::new();
        let log = mock.log();
        mock.inject(b"stale#");
        mock.inject_late(b"x");

        mock.clear_input().await.unwrap();
        assert_eq!(log.clears(), 1);

        let mut buf = [0u8; 8];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"x");
        assert!(mock.receive(&mut buf, Duration::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn mock_transport_short_write() {
        let mut mock = MockTransport::new();
        mock.expect_short_write(b"#:Sr 12:00:00#", 4);

        match mock.send(b"#:Sr 12:00:00#").await {
            Err(Error::ShortWrite { written, expected }) => {
                assert_eq!(written, 4);
                assert_eq!(expected, 14);
            }
            other => panic!("expected ShortWrite, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mock_transport_chunked_receive() {
        let mut mock = MockTransport::new();
        mock.expect(b":GR#", b"12:34:56#");
        mock.set_chunk_size(4);

        mock.send(b":GR#").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"12:3");
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"4:56");
        let n = mock.receive(&mut buf, Duration::ZERO).await.unwrap();
        assert_eq!(&buf[..n], b"#");
    }

    #[tokio::test]
    async fn mock_transport_disconnect() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        let result = mock.send(b":Q#").await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test]
    async fn mock_transport_set_connected() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
        assert!(matches!(
            mock.clear_input().await.unwrap_err(),
            Error::NotConnected
        ));
    }

    #[tokio::test]
    async fn mock_transport_remaining_expectations() {
        let mut mock = MockTransport::new();
        mock.expect_blind(b"#:KA");
        mock.expect_blind(b"#:PO");
        assert_eq!(mock.remaining_expectations(), 2);

        mock.send(b"#:KA").await.unwrap();
        assert_eq!(mock.remaining_expectations(), 1);
    }

    #[tokio::test]
    async fn mock_transport_prefix_replies() {
        let mut mock = MockTransport::new();
        mock.reply(b":Fp#", b"42#");
        mock.reply_prefix(b":F", b"");
        mock.reply_prefix(b":S", b"1");

        mock.send(b":Fp#").await.unwrap();
        let mut buf = [0u8; 8];
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], b"42#");

        mock.send(b":FQ#").await.unwrap();
        assert!(mock.receive(&mut buf, Duration::from_millis(10)).await.is_err());

        mock.send(b":Sr05:30:00#").await.unwrap();
        let n = mock.receive(&mut buf, Duration::from_millis(10)).await.unwrap();
        assert_eq!(&buf[..n], b"1");

        assert!(mock.send(b":GR#").await.is_err());
    }
}
