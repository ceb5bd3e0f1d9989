//! OpenAstroTech backend for lx200.
//!
//! OpenAstroTech firmware relays plain Meade commands (`:VERBPARAMS#`) and
//! adds a focuser through the `F` command family. This crate provides:
//!
//! - **Command builders** ([`commands`]) -- targets, site, guiding,
//!   parking, and focuser moves.
//! - **Model definition** ([`models`]).
//! - **Mount driver** ([`mount`]) -- implements both
//!   [`MountMotion`](lx200_core::MountMotion) and
//!   [`Focuser`](lx200_core::Focuser), plus a raw command relay.
//! - **Builder** ([`builder`]).
//!
//! # Example
//!
//! ```
//! use lx200_core::FocusDirection;
//! use lx200_oat::commands::{cmd_focuser_relative, cmd_set_target_dec};
//!
//! assert_eq!(cmd_set_target_dec(-12.25).to_string(), ":Sd-12*15:00#");
//! assert_eq!(
//!     cmd_focuser_relative(FocusDirection::Inward, 150).to_string(),
//!     ":FM-150#"
//! );
//! ```

pub mod builder;
pub mod commands;
pub mod models;
pub mod mount;

pub use builder::OatBuilder;
pub use models::OatModel;
pub use mount::OpenAstroTechMount;
