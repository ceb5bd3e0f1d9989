//! OatBuilder -- fluent builder for [`OpenAstroTechMount`].

use std::time::Duration;

use lx200_core::error::{Error, Result};
use lx200_core::transport::Transport;
use lx200_protocol::ChannelConfig;
use lx200_protocol::io::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_DRAIN_TIMEOUT};

use crate::models::OatModel;
use crate::mount::OpenAstroTechMount;

/// Fluent builder for [`OpenAstroTechMount`].
///
/// ```no_run
/// use lx200_oat::builder::OatBuilder;
/// use lx200_oat::models::openastrotech;
///
/// # async fn example() -> lx200_core::Result<()> {
/// let mount = OatBuilder::new(openastrotech())
///     .serial_port("/dev/ttyACM0")
///     .focuser_limits(0, 30_000)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct OatBuilder {
    model: OatModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    command_timeout: Duration,
    drain_timeout: Duration,
    device_name: Option<String>,
    max_pulse_ms: Option<u32>,
    focuser_limits: Option<(u32, u32)>,
}

impl OatBuilder {
    pub fn new(model: OatModel) -> Self {
        OatBuilder {
            model,
            serial_port: None,
            baud_rate: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            device_name: None,
            max_pulse_ms: None,
            focuser_limits: None,
        }
    }

    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Name used to tag log output (defaults to the model name).
    pub fn device_name(mut self, name: &str) -> Self {
        self.device_name = Some(name.to_string());
        self
    }

    pub fn max_pulse_ms(mut self, ms: u32) -> Self {
        self.max_pulse_ms = Some(ms);
        self
    }

    /// Focuser travel in ticks. Absolute targets outside `min..=max` and
    /// relative moves longer than the span are refused.
    pub fn focuser_limits(mut self, min: u32, max: u32) -> Self {
        self.focuser_limits = Some((min, max));
        self
    }

    /// Build a mount with a caller-provided transport.
    pub async fn build_with_transport(
        self,
        transport: Box<dyn Transport>,
    ) -> Result<OpenAstroTechMount> {
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
        let (min, max) = self.focuser_limits.unwrap_or(self.model.focuser_limits);
        if min > max {
            return Err(Error::InvalidParameter(format!(
                "focuser limits inverted: min {min} > max {max}"
            )));
        }

        let device_name = self
            .device_name
            .unwrap_or_else(|| self.model.name.to_string());
        let config = ChannelConfig {
            command_timeout: self.command_timeout,
            drain_timeout: self.drain_timeout,
        };
        Ok(OpenAstroTechMount::new(
            transport,
            self.model,
            device_name,
            config,
            max_pulse_ms,
            (min, max),
        ))
    }

    /// Build a mount on a serial port. Requires
    /// [`serial_port()`](Self::serial_port).
    pub async fn build(self) -> Result<OpenAstroTechMount> {
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
    use crate::models::openastrotech;
    use lx200_core::{Focuser, MountMotion, Vendor};
    use lx200_test_harness::MockTransport;

    #[tokio::test]
    async fn builder_defaults() {
        let mount = OatBuilder::new(openastrotech())
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(mount.info().vendor, Vendor::OpenAstroTech);
        assert_eq!(mount.info().device_name, "LX200 OpenAstroTech");
        assert_eq!(mount.focuser_limits(), openastrotech().focuser_limits);
        assert_eq!(mount.max_pulse_ms(), 999);
    }

    #[tokio::test]
    async fn builder_custom_focuser_limits() {
        let mount = OatBuilder::new(openastrotech())
            .device_name("OAT")
            .focuser_limits(100, 30_000)
            .max_pulse_ms(400)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        assert_eq!(mount.channel().device(), "OAT");
        assert_eq!(mount.focuser_limits(), (100, 30_000));
        assert_eq!(mount.max_pulse_ms(), 400);
    }

    #[tokio::test]
    async fn builder_rejects_inverted_limits() {
        let result = OatBuilder::new(openastrotech())
            .focuser_limits(500, 100)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = OatBuilder::new(openastrotech()).build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
