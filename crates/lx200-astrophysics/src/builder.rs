//! AstroPhysicsBuilder -- fluent builder for [`AstroPhysicsMount`].
//!
//! Separates configuration from construction so that callers can set up
//! serial parameters and timeouts before the port is opened.
//!
//! # Example
//!
//! ```no_run
//! use lx200_astrophysics::builder::AstroPhysicsBuilder;
//! use lx200_astrophysics::models::gtocp4;
//! use std::time::Duration;
//!
//! # async fn example() -> lx200_core::Result<()> {
//! let mount = AstroPhysicsBuilder::new(gtocp4())
//!     .serial_port("/dev/ttyUSB0")
//!     .command_timeout(Duration::from_secs(3))
//!     .device_name("Mach1")
//!     .build()
//!     .await?;
//! mount.check_connection().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use lx200_core::error::{Error, Result};
use lx200_core::transport::Transport;
use lx200_protocol::ChannelConfig;
use lx200_protocol::io::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_DRAIN_TIMEOUT};

use crate::models::ApModel;
use crate::mount::AstroPhysicsMount;
use crate::status::FirmwareGeneration;

/// Fluent builder for [`AstroPhysicsMount`].
///
/// Defaults come from the [`ApModel`]; the simplest usage is:
///
/// ```ignore
/// let mount = AstroPhysicsBuilder::new(gtocp4())
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct AstroPhysicsBuilder {
    model: ApModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    command_timeout: Duration,
    drain_timeout: Duration,
    device_name: Option<String>,
    max_pulse_ms: Option<u32>,
}

impl AstroPhysicsBuilder {
    /// Create a new builder for the given controller.
    pub fn new(model: ApModel) -> Self {
        AstroPhysicsBuilder {
            model,
            serial_port: None,
            baud_rate: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            device_name: None,
            max_pulse_ms: None,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the model's default baud rate.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// How long a blocking read waits for the `#` terminator (default 5 s).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Per-read wait while draining stale input (default 1 ms).
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Name used to tag log output (defaults to the model name).
    pub fn device_name(mut self, name: &str) -> Self {
        self.device_name = Some(name.to_string());
        self
    }

    /// Override the firmware generation, e.g. after a controller upgrade.
    pub fn firmware(mut self, generation: FirmwareGeneration) -> Self {
        self.model.firmware = generation;
        self
    }

    /// Lower the guide-pulse cap below the model maximum.
    pub fn max_pulse_ms(mut self, ms: u32) -> Self {
        self.max_pulse_ms = Some(ms);
        self
    }

    /// Build a mount with a caller-provided transport.
    ///
    /// This is the entry point for tests (pass a `MockTransport` from
    /// `lx200-test-harness`) and for callers that manage the transport
    /// themselves.
    pub async fn build_with_transport(
        self,
        transport: Box<dyn Transport>,
    ) -> Result<AstroPhysicsMount> {
        let max_pulse_ms = self.max_pulse_ms.unwrap_or(self.model.max_pulse_ms);
        if max_pulse_ms == 0 || max_pulse_ms > self.model.max_pulse_ms {
            return Err(Error::InvalidParameter(format!(
                "max_pulse_ms must be within 1..={}",
                self.model.max_pulse_ms
            )));
        }
        if self.command_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "command_timeout must be non-zero".into(),
            ));
        }

        let device_name = self
            .device_name
            .unwrap_or_else(|| self.model.name.to_string());
        let config = ChannelConfig {
            command_timeout: self.command_timeout,
            drain_timeout: self.drain_timeout,
        };
        Ok(AstroPhysicsMount::new(
            transport,
            self.model,
            device_name,
            config,
            max_pulse_ms,
        ))
    }

    /// Build a mount on a serial port.
    ///
    /// Requires [`serial_port()`](Self::serial_port). The baud rate
    /// defaults to the model's.
    pub async fn build(self) -> Result<AstroPhysicsMount> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let baud = self.baud_rate.unwrap_or(self.model.default_baud_rate);

        let transport = lx200_transport::SerialTransport::open(port, baud).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{gtocp3, gtocp4, gtocp4_p02};
    use lx200_core::{MountMotion, Vendor};
    use lx200_test_harness::MockTransport;

    #[tokio::test]
    async fn builder_defaults() {
        let mount = AstroPhysicsBuilder::new(gtocp4())
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(mount.info().vendor, Vendor::AstroPhysics);
        assert_eq!(mount.info().model_name, "GTOCP4");
        assert_eq!(mount.info().device_name, "GTOCP4");
        assert_eq!(mount.max_pulse_ms(), 999);
        assert_eq!(
            mount.channel().config().command_timeout,
            DEFAULT_COMMAND_TIMEOUT
        );
    }

    #[tokio::test]
    async fn builder_custom_settings() {
        let mount = AstroPhysicsBuilder::new(gtocp3())
            .serial_port("/dev/ttyUSB0")
            .baud_rate(19_200)
            .command_timeout(Duration::from_millis(800))
            .drain_timeout(Duration::from_millis(2))
            .device_name("Mach1GTO")
            .max_pulse_ms(500)
            .firmware(FirmwareGeneration::P02)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(mount.info().device_name, "Mach1GTO");
        assert_eq!(mount.channel().device(), "Mach1GTO");
        assert_eq!(mount.max_pulse_ms(), 500);
        assert_eq!(mount.model().firmware, FirmwareGeneration::P02);
        assert_eq!(
            mount.channel().config().command_timeout,
            Duration::from_millis(800)
        );
    }

    #[tokio::test]
    async fn builder_rejects_bad_pulse_cap() {
        for cap in [0, 1000] {
            let result = AstroPhysicsBuilder::new(gtocp4_p02())
                .max_pulse_ms(cap)
                .build_with_transport(Box::new(MockTransport::new()))
                .await;
            assert!(matches!(result, Err(Error::InvalidParameter(_))), "{cap}");
        }
    }

    #[tokio::test]
    async fn builder_rejects_zero_timeout() {
        let result = AstroPhysicsBuilder::new(gtocp4())
            .command_timeout(Duration::ZERO)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = AstroPhysicsBuilder::new(gtocp4()).build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
