//! AstroPhysicsMount -- the [`MountMotion`] implementation for GTOCP3/4.
//!
//! This module ties the Astro-Physics command table ([`commands`]) and the
//! status decoder ([`status`](crate::status)) to a [`CommandChannel`].
//!
//! Set commands answer with a single `1`/`0` character. Queries answer with
//! `#`-terminated text. Park, unpark, rate selection and guide pulses are
//! blind; their effect is observed by polling the status block, which is
//! the one query that retries (immediately, then after 50 ms and 250 ms).

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use lx200_core::error::{Error, Result};
use lx200_core::mount::MountMotion;
use lx200_core::transport::Transport;
use lx200_core::types::*;
use lx200_protocol::codec::{self, ensure_finite, ensure_in_range};
use lx200_protocol::utc_offset::decode_utc_offset;
use lx200_protocol::{ChannelConfig, Command, CommandChannel, Reply, RetryPolicy, RetryStep};

use crate::commands::{self, ButtonSwap, CenterRate, GuideRate, MoveToRate, PecState, SlewRate, TrackingMode};
use crate::models::ApModel;
use crate::status::{MIN_STATUS_LEN, StatusSnapshot};

/// Pause after a sync before flushing; the controller keeps talking
/// briefly after the reply.
const SYNC_SETTLE: Duration = Duration::from_millis(10);

/// A connected Astro-Physics mount.
///
/// Constructed via [`AstroPhysicsBuilder`](crate::builder::AstroPhysicsBuilder).
/// The mount can be shared between tasks (`Arc<AstroPhysicsMount>`); every
/// call is one locked exchange on the channel.
pub struct AstroPhysicsMount {
    channel: CommandChannel,
    model: ApModel,
    info: MountInfo,
    max_pulse_ms: u32,
}

impl AstroPhysicsMount {
    /// Create a mount from its parts. Callers should use the builder.
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        model: ApModel,
        device_name: String,
        config: ChannelConfig,
        max_pulse_ms: u32,
    ) -> Self {
        let info = MountInfo {
            vendor: Vendor::AstroPhysics,
            model_name: model.name.to_string(),
            device_name: device_name.clone(),
        };
        AstroPhysicsMount {
            channel: CommandChannel::new(transport, device_name, config),
            model,
            info,
            max_pulse_ms,
        }
    }

    pub fn model(&self) -> &ApModel {
        &self.model
    }

    /// The underlying command channel, for raw exchanges.
    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    /// Longest guide pulse this mount will transmit.
    pub fn max_pulse_ms(&self) -> u32 {
        self.max_pulse_ms
    }

    fn device(&self) -> &str {
        &self.info.device_name
    }

    async fn query_text(&self, command: &Command) -> Result<String> {
        Ok(self.channel.execute(command).await?.into_text())
    }

    /// Probe the controller with `#:GG#`, trying twice 50 ms apart.
    pub async fn check_connection(&self) -> Result<()> {
        debug!(device = %self.device(), "testing connection");
        let policy = RetryPolicy::new([
            RetryStep::new(Duration::ZERO, false),
            RetryStep::new(Duration::from_millis(50), true),
        ])?;
        let response = self
            .channel
            .query_with_retry(&commands::cmd_get_utc_offset().encode(), &policy, |r| {
                if r.is_empty() {
                    Err(Error::Protocol("empty reply to connection probe".into()))
                } else {
                    Ok(())
                }
            })
            .await?;
        debug!(device = %self.device(), response = %response, "connection confirmed");
        Ok(())
    }

    /// Read and decode the status block.
    ///
    /// Uses the three-tier retry policy; only the final failure is
    /// reported.
    pub async fn status(&self) -> Result<StatusSnapshot> {
        let raw = self
            .channel
            .query_with_retry(
                &commands::cmd_get_status().encode(),
                &RetryPolicy::three_tier(),
                |r| {
                    if r.len() >= MIN_STATUS_LEN {
                        Ok(())
                    } else {
                        Err(Error::Protocol(format!("short status block: {r:?}")))
                    }
                },
            )
            .await?;
        StatusSnapshot::parse(&raw, self.model.firmware)
    }

    /// Whether the controller has been initialized since power-up.
    ///
    /// An uninitialized controller reports an RA of exactly zero.
    pub async fn is_initialized(&self) -> Result<bool> {
        let ra = self.query_text(&commands::cmd_get_ra()).await?;
        Ok(commands::parse_initialized(&ra))
    }

    /// Read the hour angle in hours.
    pub async fn get_hour_angle(&self) -> Result<f64> {
        let text = self.query_text(&commands::cmd_get_hour_angle()).await?;
        codec::parse_sexagesimal(&text)
    }

    /// Sync with recalibration (`#:CMR#`).
    pub async fn sync_recalibrate(&self) -> Result<String> {
        self.sync_with(&commands::cmd_sync_recalibrate()).await
    }

    async fn sync_with(&self, command: &Command) -> Result<String> {
        let matched = self.query_text(command).await?;
        self.channel.settle_and_flush(SYNC_SETTLE).await?;
        info!(device = %self.device(), matched = %matched.trim(), "synced");
        Ok(matched)
    }

    /// Select the sidereal-drive mode.
    ///
    /// [`TrackingMode::Custom`] sends nothing; the custom rates select it.
    pub async fn set_tracking_mode(&self, mode: TrackingMode) -> Result<()> {
        match commands::cmd_set_tracking_mode(mode) {
            Some(cmd) => {
                debug!(device = %self.device(), %mode, "setting tracking mode");
                self.channel.execute(&cmd).await?;
            }
            None => {
                debug!(device = %self.device(), "custom tracking selected via track rates");
            }
        }
        Ok(())
    }

    pub async fn set_move_to_rate(&self, rate: MoveToRate) -> Result<()> {
        debug!(device = %self.device(), ?rate, "setting move-to rate");
        self.channel.execute(&commands::cmd_set_move_to_rate(rate)).await?;
        Ok(())
    }

    pub async fn set_slew_rate(&self, rate: SlewRate) -> Result<()> {
        debug!(device = %self.device(), ?rate, "setting slew rate");
        self.channel.execute(&commands::cmd_set_slew_rate(rate)).await?;
        Ok(())
    }

    pub async fn set_guide_rate(&self, rate: GuideRate) -> Result<()> {
        debug!(device = %self.device(), ?rate, "setting guide rate");
        self.channel.execute(&commands::cmd_set_guide_rate(rate)).await?;
        Ok(())
    }

    pub async fn set_center_rate(&self, rate: CenterRate) -> Result<()> {
        debug!(device = %self.device(), ?rate, "setting center rate");
        self.channel.execute(&commands::cmd_set_center_rate(rate)).await?;
        Ok(())
    }

    pub async fn set_pec_state(&self, state: PecState) -> Result<()> {
        debug!(device = %self.device(), ?state, "setting PEC state");
        self.channel.execute(&commands::cmd_set_pec_state(state)).await?;
        Ok(())
    }

    /// Reverse one pair of hand-controller buttons.
    pub async fn swap_buttons(&self, swap: ButtonSwap) -> Result<()> {
        debug!(device = %self.device(), ?swap, "swapping buttons");
        self.channel.execute(&commands::cmd_swap_buttons(swap)).await?;
        Ok(())
    }

    /// Set a custom RA tracking rate. The one-byte reply is not checked.
    pub async fn set_ra_track_rate(&self, rate: f64) -> Result<()> {
        ensure_finite("RA track rate", rate)?;
        self.set_track_rate(&commands::cmd_set_ra_track_rate(rate)).await
    }

    /// Set a custom Dec tracking rate. The one-byte reply is not checked.
    pub async fn set_dec_track_rate(&self, rate: f64) -> Result<()> {
        ensure_finite("Dec track rate", rate)?;
        self.set_track_rate(&commands::cmd_set_dec_track_rate(rate)).await
    }

    async fn set_track_rate(&self, command: &Command) -> Result<()> {
        if let Reply::Ack(byte) = self.channel.execute(command).await? {
            debug!(device = %self.device(), cmd = %command, reply = ?byte, "track rate accepted");
        }
        Ok(())
    }

    /// Close the serial channel.
    pub async fn shutdown(&self) -> Result<()> {
        self.channel.shutdown().await
    }
}

#[async_trait]
impl MountMotion for AstroPhysicsMount {
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
        debug!(device = %self.device(), degrees, "setting target azimuth");
        self.channel.execute_set(&commands::cmd_set_target_az(degrees)).await
    }

    async fn set_target_alt(&self, degrees: f64) -> Result<()> {
        ensure_in_range("altitude", degrees, -90.0, 90.0)?;
        debug!(device = %self.device(), degrees, "setting target altitude");
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
        debug!(device = %self.device(), hours, "setting UTC offset");
        self.channel.execute_set(&commands::cmd_set_utc_offset(hours)).await
    }

    async fn get_utc_offset(&self) -> Result<f64> {
        let raw = self.query_text(&commands::cmd_get_utc_offset()).await?;
        let hours = decode_utc_offset(&raw)?;
        debug!(device = %self.device(), raw = %raw, hours, "read UTC offset");
        Ok(hours)
    }

    async fn sync(&self) -> Result<String> {
        self.sync_with(&commands::cmd_sync()).await
    }

    async fn pulse_guide(&self, direction: GuideDirection, duration_ms: u32) -> Result<u32> {
        let pulse = PulseGuide::new(direction, duration_ms).clamped(self.max_pulse_ms);
        if pulse.duration_ms != duration_ms {
            debug!(
                device = %self.device(),
                requested = duration_ms,
                sent = pulse.duration_ms,
                "guide pulse limited to controller maximum"
            );
        }
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
