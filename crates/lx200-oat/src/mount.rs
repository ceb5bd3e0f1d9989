//! OpenAstroTechMount -- [`MountMotion`] and [`Focuser`] for OpenAstroTech.
//!
//! OpenAstroTech accepts plain Meade commands and adds a focuser relay.
//! Focuser moves are blind and validated locally against the configured
//! travel; a rejected move reports [`MoveStatus::Alert`] without touching
//! the serial line.

use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use lx200_core::error::Result;
use lx200_core::mount::{Focuser, MountMotion};
use lx200_core::transport::Transport;
use lx200_core::types::*;
use lx200_protocol::codec::{self, ensure_finite, ensure_in_range};
use lx200_protocol::{ChannelConfig, Command, CommandChannel};

use crate::commands;
use crate::models::OatModel;

const SYNC_SETTLE: Duration = Duration::from_millis(10);

/// A connected OpenAstroTech mount.
///
/// Constructed via [`OatBuilder`](crate::builder::OatBuilder).
pub struct OpenAstroTechMount {
    channel: CommandChannel,
    model: OatModel,
    info: MountInfo,
    max_pulse_ms: u32,
    focuser_limits: (u32, u32),
    backlash: AtomicI32,
}

impl OpenAstroTechMount {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        model: OatModel,
        device_name: String,
        config: ChannelConfig,
        max_pulse_ms: u32,
        focuser_limits: (u32, u32),
    ) -> Self {
        let info = MountInfo {
            vendor: Vendor::OpenAstroTech,
            model_name: model.name.to_string(),
            device_name: device_name.clone(),
        };
        OpenAstroTechMount {
            channel: CommandChannel::new(transport, device_name, config),
            model,
            info,
            max_pulse_ms,
            focuser_limits,
            backlash: AtomicI32::new(0),
        }
    }

    pub fn model(&self) -> &OatModel {
        &self.model
    }

    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    pub fn max_pulse_ms(&self) -> u32 {
        self.max_pulse_ms
    }

    fn device(&self) -> &str {
        &self.info.device_name
    }

    async fn query_text(&self, command: &Command) -> Result<String> {
        Ok(self.channel.execute(command).await?.into_text())
    }

    /// Pass a raw Meade command (`:GVP#`) through to the controller.
    ///
    /// Focuser motion and alignment triggers are sent blind and yield an
    /// empty string; everything else returns the `#`-terminated reply.
    pub async fn execute_meade_command(&self, raw: &str) -> Result<String> {
        let command = Command::parse_meade(raw)?;
        debug!(device = %self.device(), cmd = %raw, blind = command.is_blind(), "raw meade command");
        self.query_text(&command).await
    }

    /// Close the serial channel.
    pub async fn shutdown(&self) -> Result<()> {
        self.channel.shutdown().await
    }

    fn focuser_target_in_range(&self, ticks: u32) -> bool {
        let (min, max) = self.focuser_limits;
        (min..=max).contains(&ticks)
    }

    async fn send_focuser(&self, command: &Command) -> Result<MoveStatus> {
        self.channel.execute(command).await?;
        Ok(MoveStatus::Busy)
    }
}

#[async_trait]
impl MountMotion for OpenAstroTechMount {
    fn info(&self) -> &MountInfo {
        &self.info
    }

    async fn set_target_ra(&self, hours: f64) -> Result<()> {
        ensure_finite("right ascension", hours)?;
        debug!(device = %self.device(), hours, "setting target RA");
        self.channel.execute_set(&commands::cmd_set_target_ra(hours)).await
    }

    async fn set_target_dec(&self, degrees: f64) -> Result<()> {
        ensure_in_range("declination", degrees, -90.0, 90.0)?;
        debug!(device = %self.device(), degrees, "setting target Dec");
        self.channel.execute_set(&commands::cmd_set_target_dec(degrees)).await
    }

    async fn set_target_az(&self, degrees: f64) -> Result<()> {
        ensure_finite("azimuth", degrees)?;
        self.channel.execute_set(&commands::cmd_set_target_az(degrees)).await
    }

    async fn set_target_alt(&self, degrees: f64) -> Result<()> {
        ensure_in_range("altitude", degrees, -90.0, 90.0)?;
        self.channel.execute_set(&commands::cmd_set_target_alt(degrees)).await
    }

    async fn set_site_longitude(&self, degrees: f64) -> Result<()> {
        ensure_finite("longitude", degrees)?;
        debug!(device = %self.device(), degrees, "setting site longitude");
        self.channel
            .execute_set(&commands::cmd_set_site_longitude(degrees))
            .await
    }

    async fn set_site_latitude(&self, degrees: f64) -> Result<()> {
        ensure_in_range("latitude", degrees, -90.0, 90.0)?;
        debug!(device = %self.device(), degrees, "setting site latitude");
        self.channel
            .execute_set(&commands::cmd_set_site_latitude(degrees))
            .await
    }

    async fn set_utc_offset(&self, hours: f64) -> Result<()> {
        ensure_in_range("UTC offset", hours, -24.0, 24.0)?;
        self.channel.execute_set(&commands::cmd_set_utc_offset(hours)).await
    }

    async fn get_utc_offset(&self) -> Result<f64> {
        let raw = self.query_text(&commands::cmd_get_utc_offset()).await?;
        codec::parse_sexagesimal(&raw)
    }

    async fn sync(&self) -> Result<String> {
        let matched = self.query_text(&commands::cmd_sync()).await?;
        self.channel.settle_and_flush(SYNC_SETTLE).await?;
        info!(device = %self.device(), matched = %matched.trim(), "synced");
        Ok(matched)
    }

    async fn pulse_guide(&self, direction: GuideDirection, duration_ms: u32) -> Result<u32> {
        let pulse = PulseGuide::new(direction, duration_ms).clamped(self.max_pulse_ms);
        self.channel.execute(&commands::cmd_pulse_guide(pulse)).await?;
        Ok(pulse.duration_ms)
    }

    async fn park(&self) -> Result<()> {
        info!(device = %self.device(), "parking");
        self.channel.execute(&commands::cmd_park()).await?;
        Ok(())
    }

    async fn unpark(&self) -> Result<()> {
        info!(device = %self.device(), "unparking");
        self.channel.execute(&commands::cmd_unpark()).await?;
        Ok(())
    }

    async fn abort_slew(&self) -> Result<()> {
        info!(device = %self.device(), "aborting slew");
        self.channel.execute(&commands::cmd_abort()).await?;
        Ok(())
    }
}

#[async_trait]
impl Focuser for OpenAstroTechMount {
    fn focuser_limits(&self) -> (u32, u32) {
        self.focuser_limits
    }

    async fn move_focuser_absolute(&self, ticks: u32) -> Result<MoveStatus> {
        if !self.focuser_target_in_range(ticks) {
            let (min, max) = self.focuser_limits;
            info!(device = %self.device(), ticks, min, max, "unable to move focuser, out of range");
            return Ok(MoveStatus::Alert);
        }
        debug!(device = %self.device(), ticks, "moving focuser to position");
        self.send_focuser(&commands::cmd_focuser_absolute(ticks)).await
    }

    async fn move_focuser_relative(
        &self,
        direction: FocusDirection,
        ticks: u32,
    ) -> Result<MoveStatus> {
        let (min, max) = self.focuser_limits;
        if ticks > max - min {
            info!(device = %self.device(), ticks, %direction, "unable to move focuser, out of range");
            return Ok(MoveStatus::Alert);
        }
        debug!(device = %self.device(), ticks, %direction, "moving focuser");
        self.send_focuser(&commands::cmd_focuser_relative(direction, ticks))
            .await
    }

    async fn move_focuser_timed(
        &self,
        direction: FocusDirection,
        duration_ms: u32,
    ) -> Result<MoveStatus> {
        debug!(device = %self.device(), duration_ms, %direction, "running focuser");
        self.send_focuser(&commands::cmd_focuser_timed(direction, duration_ms))
            .await
    }

    async fn abort_focuser(&self) -> Result<()> {
        info!(device = %self.device(), "aborting focuser");
        self.channel.execute(&commands::cmd_focuser_abort()).await?;
        Ok(())
    }

    async fn get_focuser_position(&self) -> Result<i64> {
        let text = self.query_text(&commands::cmd_focuser_position()).await?;
        commands::parse_focuser_position(&text)
    }

    fn set_focuser_backlash(&self, steps: i32) {
        self.backlash.store(steps, Ordering::Relaxed);
        info!(device = %self.device(), steps, "focuser backlash set");
    }

    fn focuser_backlash(&self) -> i32 {
        self.backlash.load(Ordering::Relaxed)
    }
}
