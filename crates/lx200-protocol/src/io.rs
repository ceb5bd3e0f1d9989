//! Exclusive, frame-safe access to the serial channel.
//!
//! A [`CommandChannel`] owns the [`Transport`] behind a `tokio::sync::Mutex`.
//! Every logical exchange takes the lock once and keeps it across
//! flush + write + read, so a status poll running on one task can never
//! pick up the reply to a goto issued from another.
//!
//! The lower-level primitives ([`write_command`], [`read_until_terminator`],
//! [`read_ack`], [`flush_input`]) operate on a `&mut dyn Transport` that the
//! caller has already locked.
//!
//! # Exchange sequence
//!
//! ```text
//! lock -> flush (clear_input + drain) -> write -> [read] -> unlock
//! ```
//!
//! The flush at the start of every exchange discards bytes left behind by
//! an earlier exchange that timed out, which would otherwise be read as the
//! beginning of the next reply.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use lx200_core::error::{Error, Result};
use lx200_core::transport::Transport;

use crate::frame::{Command, Expect, TERMINATOR};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Longest response accepted before the terminator.
pub const MAX_RESPONSE_LEN: usize = 256;

/// Stop draining after this many stale bytes; a device this chatty needs
/// attention, not an endless loop.
const MAX_DRAIN_BYTES: usize = 4096;

/// Default window for a blocking read.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default wait per read while draining stale input.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Timing configuration for a [`CommandChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// How long a blocking read waits for the `#` terminator.
    pub command_timeout: Duration,
    /// How long each drain read waits during a flush.
    pub drain_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Decoded reply to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Blind command; nothing was read.
    None,
    /// Single acknowledgement character.
    Ack(char),
    /// Response text without the terminator.
    Text(String),
}

impl Reply {
    /// Response text, or an empty string for blind commands.
    pub fn into_text(self) -> String {
        match self {
            Reply::None => String::new(),
            Reply::Ack(c) => c.to_string(),
            Reply::Text(text) => text,
        }
    }
}

/// One attempt of a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStep {
    /// Sleep before this attempt, with the channel unlocked.
    pub delay: Duration,
    /// Log a failure of this attempt at `warn` instead of `debug`.
    pub complain: bool,
}

impl RetryStep {
    pub const fn new(delay: Duration, complain: bool) -> Self {
        RetryStep { delay, complain }
    }
}

/// Ordered attempts for a single logical query.
///
/// Exhausting the list surfaces the last attempt's error only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    steps: Vec<RetryStep>,
}

impl RetryPolicy {
    /// Build a policy from explicit steps. At least one step is required.
    pub fn new(steps: impl IntoIterator<Item = RetryStep>) -> Result<Self> {
        let steps: Vec<RetryStep> = steps.into_iter().collect();
        if steps.is_empty() {
            return Err(Error::InvalidParameter(
                "retry policy needs at least one attempt".into(),
            ));
        }
        Ok(RetryPolicy { steps })
    }

    /// A single silent attempt.
    pub fn once() -> Self {
        RetryPolicy {
            steps: vec![RetryStep::new(Duration::ZERO, false)],
        }
    }

    /// Immediate silent attempt, then 50 ms and 250 ms backoffs that log
    /// their failures. Used for the Astro-Physics status block.
    pub fn three_tier() -> Self {
        RetryPolicy {
            steps: vec![
                RetryStep::new(Duration::ZERO, false),
                RetryStep::new(Duration::from_millis(50), true),
                RetryStep::new(Duration::from_millis(250), true),
            ],
        }
    }

    pub fn steps(&self) -> &[RetryStep] {
        &self.steps
    }

    /// Sum of all backoff delays.
    pub fn total_backoff(&self) -> Duration {
        self.steps.iter().map(|step| step.delay).sum()
    }
}

// ---------------------------------------------------------------------------
// Primitives on a locked transport
// ---------------------------------------------------------------------------

/// Write the literal command bytes. Returns the number of bytes written.
///
/// A partial write surfaces as [`Error::ShortWrite`] carrying the count.
pub async fn write_command(transport: &mut dyn Transport, command: &[u8]) -> Result<usize> {
    transport.send(command).await?;
    Ok(command.len())
}

/// Read until the `#` terminator or until `max_wait` has elapsed.
///
/// Returns the response without its terminator. On timeout the bytes
/// accumulated so far travel in [`Error::Timeout`]; they are diagnostic
/// only. Bytes after the terminator in the same read are discarded.
pub async fn read_until_terminator(
    transport: &mut dyn Transport,
    max_wait: Duration,
) -> Result<String> {
    let deadline = Instant::now() + max_wait;
    let mut response: Vec<u8> = Vec::new();
    let mut buf = [0u8; 64];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(Error::Timeout {
                partial: String::from_utf8_lossy(&response).into_owned(),
            });
        }

        let n = match transport.receive(&mut buf, remaining).await {
            Ok(n) => n,
            Err(Error::Timeout { .. }) => {
                return Err(Error::Timeout {
                    partial: String::from_utf8_lossy(&response).into_owned(),
                });
            }
            Err(e) => return Err(e),
        };

        let chunk = &buf[..n];
        if let Some(pos) = chunk.iter().position(|&b| b == TERMINATOR) {
            response.extend_from_slice(&chunk[..pos]);
            if pos + 1 < n {
                trace!(
                    discarded = %String::from_utf8_lossy(&chunk[pos + 1..]),
                    "bytes after terminator dropped"
                );
            }
            return Ok(String::from_utf8_lossy(&response).into_owned());
        }

        response.extend_from_slice(chunk);
        if response.len() > MAX_RESPONSE_LEN {
            return Err(Error::Protocol(format!(
                "no terminator within {MAX_RESPONSE_LEN} bytes"
            )));
        }
    }
}

/// Read exactly one unterminated byte.
pub async fn read_ack(transport: &mut dyn Transport, max_wait: Duration) -> Result<char> {
    let mut buf = [0u8; 1];
    match transport.receive(&mut buf, max_wait).await {
        Ok(0) => Err(Error::timeout()),
        Ok(_) => Ok(char::from(buf[0])),
        Err(Error::Timeout { .. }) => Err(Error::timeout()),
        Err(e) => Err(e),
    }
}

/// Discard unread input: clear the OS buffer, then drain anything still
/// arriving until a read of `drain_timeout` comes back empty.
///
/// Returns the discarded bytes.
pub async fn flush_input(transport: &mut dyn Transport, drain_timeout: Duration) -> Result<Vec<u8>> {
    transport.clear_input().await?;

    let mut discarded = Vec::new();
    let mut buf = [0u8; 64];
    loop {
        match transport.receive(&mut buf, drain_timeout).await {
            Ok(0) => break,
            Ok(n) => {
                discarded.extend_from_slice(&buf[..n]);
                if discarded.len() >= MAX_DRAIN_BYTES {
                    warn!(bytes = discarded.len(), "input still arriving, giving up drain");
                    break;
                }
            }
            Err(Error::Timeout { .. }) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(discarded)
}

// ---------------------------------------------------------------------------
// CommandChannel
// ---------------------------------------------------------------------------

/// Lock-owning command channel to one mount controller.
///
/// Every public method is one complete exchange. The device name tags all
/// log output from this channel.
pub struct CommandChannel {
    transport: Mutex<Box<dyn Transport>>,
    device: String,
    config: ChannelConfig,
}

impl CommandChannel {
    pub fn new(transport: Box<dyn Transport>, device: impl Into<String>, config: ChannelConfig) -> Self {
        CommandChannel {
            transport: Mutex::new(transport),
            device: device.into(),
            config,
        }
    }

    /// Device name used in log output.
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Whether the underlying transport is still open.
    pub async fn is_connected(&self) -> bool {
        self.transport.lock().await.is_connected()
    }

    /// Execute a framed command and return its decoded reply.
    ///
    /// The command is validated before the lock is taken; an invalid
    /// command never reaches the wire.
    pub async fn execute(&self, command: &Command) -> Result<Reply> {
        command.validate()?;
        let bytes = command.encode();
        match command.expect() {
            Expect::Nothing => {
                self.send_blind(&bytes).await?;
                Ok(Reply::None)
            }
            Expect::Ack => Ok(Reply::Ack(self.query_ack(&bytes).await?)),
            Expect::Terminated => Ok(Reply::Text(self.query(&bytes).await?)),
        }
    }

    /// Execute a set command and require the `1` acknowledgement.
    ///
    /// Any other acknowledgement character is a protocol error.
    pub async fn execute_set(&self, command: &Command) -> Result<()> {
        if command.expect() != Expect::Ack {
            return Err(Error::InvalidParameter(format!(
                "{command} is not acknowledged with a single character"
            )));
        }
        match self.execute(command).await? {
            Reply::Ack('1') => Ok(()),
            Reply::Ack(other) => Err(Error::Protocol(format!(
                "{command} rejected by mount (ack {other:?})"
            ))),
            other => Err(Error::Protocol(format!(
                "unexpected reply to {command}: {other:?}"
            ))),
        }
    }

    /// Flush, then write without waiting for a reply.
    pub async fn send_blind(&self, command: &[u8]) -> Result<usize> {
        let mut transport = self.transport.lock().await;
        self.flush_locked(transport.as_mut()).await?;
        let written = self.write_locked(transport.as_mut(), command).await?;
        Ok(written)
    }

    /// Flush, write, and read a `#`-terminated response.
    pub async fn query(&self, command: &[u8]) -> Result<String> {
        let mut transport = self.transport.lock().await;
        self.flush_locked(transport.as_mut()).await?;
        self.write_locked(transport.as_mut(), command).await?;
        let response = read_until_terminator(transport.as_mut(), self.config.command_timeout)
            .await
            .inspect_err(|e| self.log_read_failure(command, e))?;
        debug!(device = %self.device, response = %response, "RES");
        Ok(response)
    }

    /// Flush, write, and read a single acknowledgement character.
    pub async fn query_ack(&self, command: &[u8]) -> Result<char> {
        let mut transport = self.transport.lock().await;
        self.flush_locked(transport.as_mut()).await?;
        self.write_locked(transport.as_mut(), command).await?;
        let ack = read_ack(transport.as_mut(), self.config.command_timeout)
            .await
            .inspect_err(|e| self.log_read_failure(command, e))?;
        debug!(device = %self.device, ack = %ack, "RES");
        Ok(ack)
    }

    /// Run [`query`](Self::query) under a retry policy.
    ///
    /// An attempt fails on any I/O error, on timeout, or when `accept`
    /// rejects the response. The channel is unlocked while sleeping between
    /// attempts. Only the last attempt's error is returned.
    pub async fn query_with_retry<F>(
        &self,
        command: &[u8],
        policy: &RetryPolicy,
        accept: F,
    ) -> Result<String>
    where
        F: Fn(&str) -> Result<()>,
    {
        let mut last_error = None;
        for (index, step) in policy.steps().iter().enumerate() {
            let attempt = index + 1;
            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }

            let result = match self.query(command).await {
                Ok(response) => accept(&response).map(|()| response),
                Err(e) => Err(e),
            };

            match result {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(device = %self.device, attempt, "query succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if step.complain {
                        warn!(
                            device = %self.device,
                            cmd = %String::from_utf8_lossy(command),
                            attempt,
                            error = %e,
                            "query attempt failed"
                        );
                    } else {
                        debug!(
                            device = %self.device,
                            cmd = %String::from_utf8_lossy(command),
                            attempt,
                            error = %e,
                            "query attempt failed"
                        );
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::InvalidParameter("empty retry policy".into())))
    }

    /// Discard unread input. Returns the number of bytes dropped.
    pub async fn flush(&self) -> Result<usize> {
        let mut transport = self.transport.lock().await;
        self.flush_locked(transport.as_mut()).await
    }

    /// Give the controller `delay` to finish talking, then flush.
    pub async fn settle_and_flush(&self, delay: Duration) -> Result<usize> {
        tokio::time::sleep(delay).await;
        self.flush().await
    }

    /// Close the underlying transport.
    pub async fn shutdown(&self) -> Result<()> {
        debug!(device = %self.device, "closing command channel");
        self.transport.lock().await.close().await
    }

    async fn flush_locked(&self, transport: &mut dyn Transport) -> Result<usize> {
        let discarded = flush_input(transport, self.config.drain_timeout).await?;
        if !discarded.is_empty() {
            debug!(
                device = %self.device,
                bytes = discarded.len(),
                discarded = %String::from_utf8_lossy(&discarded),
                "discarded stale input"
            );
        }
        Ok(discarded.len())
    }

    async fn write_locked(&self, transport: &mut dyn Transport, command: &[u8]) -> Result<usize> {
        debug!(device = %self.device, cmd = %String::from_utf8_lossy(command), "CMD");
        write_command(transport, command).await.inspect_err(|e| {
            warn!(
                device = %self.device,
                cmd = %String::from_utf8_lossy(command),
                error = %e,
                "write failed"
            );
        })
    }

    fn log_read_failure(&self, command: &[u8], error: &Error) {
        match error {
            Error::Timeout { partial } => debug!(
                device = %self.device,
                cmd = %String::from_utf8_lossy(command),
                partial = %partial,
                "timed out waiting for response"
            ),
            other => debug!(
                device = %self.device,
                cmd = %String::from_utf8_lossy(command),
                error = %other,
                "read failed"
            ),
        }
    }
}
