//! lx200-test-harness: Test utilities and mock transports for lx200.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! protocol engines without a mount on the bench, and [`MockLog`] for
//! inspecting what reached the wire after the mock has been handed to a
//! driver.

pub mod mock_serial;

pub use mock_serial::{MockLog, MockTransport};
