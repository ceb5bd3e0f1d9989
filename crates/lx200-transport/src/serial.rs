//! Serial port transport for mount communication.
//!
//! [`SerialTransport`] implements the [`Transport`] trait on top of
//! `tokio-serial` for USB virtual COM ports and RS-232 links.
//!
//! Every LX200-family controller this crate drives talks 8N1 without flow
//! control; only the speed differs (9600 baud for Astro-Physics, 19200 for
//! OpenAstroTech). [`LineSettings`] exists for adapters that need something
//! else, such as a USB bridge stuck on two stop bits.
//!
//! # Example
//!
//! ```no_run
//! use lx200_transport::SerialTransport;
//! use lx200_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> lx200_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! transport.clear_input().await?;
//! transport.send(b"#:GOS#").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};
use tracing::{debug, error, info, trace, warn};

use lx200_core::error::{Error, Result};
use lx200_core::transport::Transport;

/// Line settings for a serial link. The default is 9600 8N1, no flow
/// control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

impl LineSettings {
    /// 8N1 at the given speed.
    pub fn at(baud_rate: u32) -> Self {
        LineSettings {
            baud_rate,
            ..Self::default()
        }
    }
}

impl Default for LineSettings {
    fn default() -> Self {
        LineSettings {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

/// Classify an I/O error: a vanished device is a lost connection, anything
/// else stays an I/O error.
fn classify_io_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected | io::ErrorKind::UnexpectedEof => {
            Error::ConnectionLost
        }
        _ => Error::Io(e),
    }
}

/// An open serial link to a mount controller.
pub struct SerialTransport {
    stream: Option<SerialStream>,
    path: String,
    settings: LineSettings,
}

impl SerialTransport {
    /// Open `path` at `baud_rate`, 8N1.
    pub async fn open(path: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with_settings(path, LineSettings::at(baud_rate)).await
    }

    /// Open `path` with explicit line settings.
    pub async fn open_with_settings(path: &str, settings: LineSettings) -> Result<Self> {
        debug!(port = %path, ?settings, "opening serial port");

        let stream = tokio_serial::new(path, settings.baud_rate)
            .data_bits(settings.data_bits)
            .stop_bits(settings.stop_bits)
            .parity(settings.parity)
            .flow_control(settings.flow_control)
            .open_native_async()
            .map_err(|e| {
                error!(port = %path, error = %e, "failed to open serial port");
                Error::Transport(format!("cannot open {path}: {e}"))
            })?;

        info!(port = %path, baud_rate = settings.baud_rate, "serial port open");
        Ok(SerialTransport {
            stream: Some(stream),
            path: path.to_string(),
            settings,
        })
    }

    /// Device path this transport was opened on.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn settings(&self) -> LineSettings {
        self.settings
    }

    fn stream(&mut self) -> Result<&mut SerialStream> {
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let path = self.path.clone();
        let stream = self.stream()?;
        trace!(port = %path, data = %String::from_utf8_lossy(data), "TX");

        // A controller that stops accepting bytes mid-command leaves a torn
        // frame; report how far we got.
        let mut written = 0;
        while written < data.len() {
            match stream.write(&data[written..]).await {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if written == 0 => {
                    error!(port = %path, error = %e, "write failed");
                    return Err(classify_io_error(e));
                }
                Err(e) => {
                    error!(port = %path, error = %e, written, "write failed mid-command");
                    break;
                }
            }
        }
        if written < data.len() {
            return Err(Error::ShortWrite {
                written,
                expected: data.len(),
            });
        }

        stream.flush().await.map_err(classify_io_error)
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let path = self.path.clone();
        let stream = self.stream()?;

        let n = match tokio::time::timeout(timeout, stream.read(buf)).await {
            Err(_) => return Err(Error::timeout()),
            Ok(read) => read.map_err(|e| {
                error!(port = %path, error = %e, "read failed");
                classify_io_error(e)
            })?,
        };
        if n == 0 {
            error!(port = %path, "serial port reached end of stream");
            return Err(Error::ConnectionLost);
        }
        trace!(port = %path, data = %String::from_utf8_lossy(&buf[..n]), "RX");
        Ok(n)
    }

    async fn clear_input(&mut self) -> Result<()> {
        let path = self.path.clone();
        self.stream()?.clear(ClearBuffer::Input).map_err(|e| {
            error!(port = %path, error = %e, "failed to clear input buffer");
            Error::Transport(format!("cannot clear input on {path}: {e}"))
        })
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.flush().await {
                warn!(port = %self.path, error = %e, "flush before close failed");
            }
            info!(port = %self.path, "serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
