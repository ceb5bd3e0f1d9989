//! lx200-core: Core traits, types, and error definitions for lx200.
//!
//! This crate defines the dialect-agnostic abstractions that every lx200
//! backend implements. Observatory software depends on these types without
//! pulling in a specific mount driver.
//!
//! # Key types
//!
//! - [`MountMotion`] / [`Focuser`] -- capability traits composed by drivers
//! - [`Transport`] -- byte-level communication channel
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod mount;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use lx200_core::*`.
pub use error::{Error, Result};
pub use mount::{Focuser, MountMotion};
pub use transport::Transport;
pub use types::*;
