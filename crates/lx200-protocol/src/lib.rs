//! lx200-protocol: Shared LX200 protocol engine.
//!
//! Everything in here is dialect-neutral and used by both mount backends:
//!
//! - [`codec`] -- sexagesimal field encoding and parsing
//! - [`utc_offset`] -- decoding of the Astro-Physics negative UTC-offset quirk
//! - [`frame`] -- command framing and blind/blocking classification
//! - [`io`] -- the lock-owning [`CommandChannel`] with flush and retry

pub mod codec;
pub mod frame;
pub mod io;
pub mod utc_offset;

pub use frame::{classify, Command, Exchange, Expect, Framing};
pub use io::{ChannelConfig, CommandChannel, Reply, RetryPolicy, RetryStep};
