//! Astro-Physics GTO controller backend for lx200.
//!
//! This crate drives GTOCP3 and GTOCP4 controllers with the Astro-Physics
//! dialect of the LX200 command set. It provides:
//!
//! - **Command builders** ([`commands`]) -- framed commands for targets,
//!   site setup, rate selection, guiding, and parking.
//! - **Status decoder** ([`status`]) -- lazy, firmware-aware view of the
//!   `#:GOS#` status block.
//! - **Model definitions** ([`models`]) -- GTOCP3, GTOCP4, GTOCP4 P02.
//! - **Mount driver** ([`mount`]) -- [`MountMotion`](lx200_core::MountMotion)
//!   implementation on top of a shared command channel.
//! - **Builder** ([`builder`]) -- fluent construction with smart defaults.
//!
//! # Dialect differences from plain Meade
//!
//! - Commands are framed `#:VERB PARAMS#`; the leading `#` clears any
//!   half-received command in the controller.
//! - Park (`#:KA`) and unpark (`#:PO`) are sent without a terminator.
//! - Negative UTC offsets come back with a marker instead of a minus sign
//!   (see [`lx200_protocol::utc_offset`]).
//!
//! # Example
//!
//! ```
//! use lx200_astrophysics::commands::cmd_set_target_ra;
//! use lx200_astrophysics::status::{FirmwareGeneration, StatusSnapshot};
//!
//! assert_eq!(cmd_set_target_ra(5.5).to_string(), "#:Sr 05:30:00#");
//!
//! let status = StatusSnapshot::parse("P0000000002000", FirmwareGeneration::PreP02).unwrap();
//! assert!(status.is_parked());
//! assert!(!status.is_slewing());
//! ```

pub mod builder;
pub mod commands;
pub mod models;
pub mod mount;
pub mod status;

pub use builder::AstroPhysicsBuilder;
pub use models::ApModel;
pub use mount::AstroPhysicsMount;
pub use status::{FirmwareGeneration, StatusSnapshot};
