//! Transport trait for mount communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a mount
//! controller. Implementations exist for serial ports (`lx200-transport`)
//! and a scripted mock (`lx200-test-harness`).
//!
//! The command channel in `lx200-protocol` operates on a `Transport` rather
//! than directly on a serial port, so the exact same framing, flushing, and
//! retry code runs against real hardware and in deterministic unit tests.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a mount.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. Framing (`#` terminators, dialect prefixes) is handled by the
/// command channel that consumes this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the mount.
    ///
    /// Returns only once every byte has been handed to the channel. A
    /// partial write is reported as
    /// [`Error::ShortWrite`](crate::error::Error::ShortWrite).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the mount into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if no data is received within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Discard everything sitting in the input buffer of the channel.
    ///
    /// This is the equivalent of `tcflush(fd, TCIFLUSH)`: bytes already
    /// received by the OS but not yet read are dropped. Bytes still on the
    /// wire are not affected.
    async fn clear_input(&mut self) -> Result<()>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
