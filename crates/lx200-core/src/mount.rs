//! Capability traits implemented by the dialect backends.
//!
//! A concrete driver composes the capabilities its hardware offers instead
//! of specializing a single monolithic telescope type: every backend
//! implements [`MountMotion`], and only controllers that relay a focuser
//! implement [`Focuser`]. Application code can hold a `dyn MountMotion`
//! and stay dialect-agnostic.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::*;

/// Coordinate targeting, site setup, guiding, and parking.
///
/// All methods that talk to the controller are `async`: each one is a
/// single exchange on the serial channel and may wait up to the configured
/// command timeout for the `#` terminator.
#[async_trait]
pub trait MountMotion: Send + Sync {
    /// Return static information about the connected mount.
    fn info(&self) -> &MountInfo;

    /// Set the goto/sync target right ascension in hours.
    ///
    /// The value is normalized into `[0, 24)` before encoding.
    async fn set_target_ra(&self, hours: f64) -> Result<()>;

    /// Set the goto/sync target declination in signed degrees.
    async fn set_target_dec(&self, degrees: f64) -> Result<()>;

    /// Set the target azimuth in degrees, normalized into `[0, 360)`.
    async fn set_target_az(&self, degrees: f64) -> Result<()>;

    /// Set the target altitude in signed degrees.
    async fn set_target_alt(&self, degrees: f64) -> Result<()>;

    /// Set the site longitude in degrees, normalized into `[0, 360)`.
    async fn set_site_longitude(&self, degrees: f64) -> Result<()>;

    /// Set the site latitude in signed degrees.
    async fn set_site_latitude(&self, degrees: f64) -> Result<()>;

    /// Set the controller's UTC offset in signed hours.
    async fn set_utc_offset(&self, hours: f64) -> Result<()>;

    /// Read the controller's UTC offset in signed hours.
    async fn get_utc_offset(&self) -> Result<f64>;

    /// Sync the mount to the current target. Returns the controller's
    /// reply text (typically an object name).
    async fn sync(&self) -> Result<String>;

    /// Issue a timed guide pulse.
    ///
    /// Returns the duration actually transmitted, which is capped at the
    /// controller's maximum pulse length.
    async fn pulse_guide(&self, direction: GuideDirection, duration_ms: u32) -> Result<u32>;

    /// Send the park command. Completion is confirmed by polling.
    async fn park(&self) -> Result<()>;

    /// Send the unpark command. Completion is confirmed by polling.
    async fn unpark(&self) -> Result<()>;

    /// Stop any slew in progress.
    async fn abort_slew(&self) -> Result<()>;
}

/// Focuser attached to (or relayed by) the mount controller.
///
/// Moves are fire-and-forget: a request that passes validation returns
/// [`MoveStatus::Busy`] once the command is written, and one that fails
/// validation returns [`MoveStatus::Alert`] without touching the channel.
#[async_trait]
pub trait Focuser: Send + Sync {
    /// Configured travel limits `(min, max)` in ticks.
    fn focuser_limits(&self) -> (u32, u32);

    /// Move to an absolute position in ticks.
    async fn move_focuser_absolute(&self, ticks: u32) -> Result<MoveStatus>;

    /// Move by `ticks` in the given direction.
    async fn move_focuser_relative(&self, direction: FocusDirection, ticks: u32)
    -> Result<MoveStatus>;

    /// Run the focuser motor for `duration_ms` in the given direction.
    async fn move_focuser_timed(
        &self,
        direction: FocusDirection,
        duration_ms: u32,
    ) -> Result<MoveStatus>;

    /// Stop focuser motion.
    async fn abort_focuser(&self) -> Result<()>;

    /// Read the current focuser position in ticks.
    async fn get_focuser_position(&self) -> Result<i64>;

    /// Store the backlash compensation in ticks. No command is sent.
    fn set_focuser_backlash(&self, steps: i32);

    /// Return the stored backlash compensation.
    fn focuser_backlash(&self) -> i32;

    /// Dispatch a [`FocuserMove`] to the matching move method.
    async fn move_focuser(&self, request: FocuserMove) -> Result<MoveStatus> {
        match request {
            FocuserMove::Absolute(ticks) => self.move_focuser_absolute(ticks).await,
            FocuserMove::Relative { direction, ticks } => {
                self.move_focuser_relative(direction, ticks).await
            }
        }
    }
}
