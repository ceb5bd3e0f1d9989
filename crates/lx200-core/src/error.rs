//! Error types for lx200.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Serial-channel, protocol, and
//! caller-side validation errors are all captured here.

/// The error type for all lx200 operations.
///
/// Variants fall into four families:
///
/// - transport failures (`Transport`, `ShortWrite`, `NotConnected`,
///   `ConnectionLost`, `Io`): the command may not have reached the mount
/// - [`Timeout`](Error::Timeout): the mount stayed silent (or stopped
///   talking) before the `#` terminator arrived
/// - [`Protocol`](Error::Protocol): the mount answered with something the
///   decoders could not interpret
/// - caller errors (`OutOfRange`, `InvalidParameter`, `Unsupported`): rejected
///   before any byte was written
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open failure, closed channel).
    #[error("transport error: {0}")]
    Transport(String),

    /// Fewer bytes than requested reached the serial channel.
    #[error("short write: {written} of {expected} bytes written")]
    ShortWrite {
        /// Bytes accepted by the channel before the failure.
        written: usize,
        /// Length of the command that was being written.
        expected: usize,
    },

    /// A protocol-level error (short status block, bad acknowledgement,
    /// UTC-offset marker missing from the quirk table).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a `#`-terminated response.
    ///
    /// `partial` holds whatever arrived before the deadline. It is useful for
    /// diagnostics but must never be treated as a valid response.
    #[error("timeout waiting for response")]
    Timeout {
        /// Bytes accumulated before the deadline, lossily decoded.
        partial: String,
    },

    /// A value was outside the range accepted by the mount (focuser target
    /// beyond the configured travel, unknown rate selector index).
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// The requested operation is not supported by this dialect.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed to a command or builder.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the mount has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the mount was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// A timeout with nothing received.
    pub fn timeout() -> Self {
        Error::Timeout {
            partial: String::new(),
        }
    }

    /// Whether the error means the command may not have been delivered.
    ///
    /// Callers of blind commands should read this as "command not sent".
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::ShortWrite { .. }
                | Error::NotConnected
                | Error::ConnectionLost
                | Error::Io(_)
        )
    }

    /// Whether the mount stayed silent past the read window.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
