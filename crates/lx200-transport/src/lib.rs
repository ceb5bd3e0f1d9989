//! Transport implementations for lx200.
//!
//! This crate provides [`SerialTransport`], the concrete implementation of
//! the [`Transport`](lx200_core::Transport) trait for USB virtual COM ports
//! and RS-232 links to mount controllers.

pub mod serial;

pub use serial::{LineSettings, SerialTransport};
