//! # lx200 -- Serial control of LX200-family telescope mounts
//!
//! `lx200` is an asynchronous Rust library for driving telescope mount
//! controllers that speak a dialect of the Meade LX200 serial protocol.
//! Two dialects are supported: Astro-Physics GTO controllers and
//! OpenAstroTech firmware (which also relays a focuser).
//!
//! ## Quick Start
//!
//! ```no_run
//! use lx200::MountMotion;
//! use lx200::astrophysics::{AstroPhysicsBuilder, models::gtocp4};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mount = AstroPhysicsBuilder::new(gtocp4())
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     mount.set_target_ra(5.5).await?;
//!     mount.set_target_dec(-12.25).await?;
//!     println!("UTC offset: {} h", mount.get_utc_offset().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                  | Purpose                                           |
//! |------------------------|---------------------------------------------------|
//! | `lx200-core`           | Traits ([`MountMotion`], [`Focuser`]), types, errors |
//! | `lx200-transport`      | Serial transport                                  |
//! | `lx200-protocol`       | Field codec, framing, locked command channel      |
//! | `lx200-astrophysics`   | Astro-Physics GTO dialect                         |
//! | `lx200-oat`            | OpenAstroTech dialect with focuser                |
//! | **`lx200`**            | This facade crate                                 |
//!
//! ## Feature Flags
//!
//! | Feature        | Enables                              | Default |
//! |----------------|--------------------------------------|---------|
//! | `astrophysics` | [`astrophysics`] module              | yes     |
//! | `oat`          | [`oat`] module                       | yes     |
//! | `full`         | All dialect backends                 | no      |

pub use lx200_core::*;

/// Dialect-neutral protocol pieces (codec, framing, command channel).
pub mod protocol {
    pub use lx200_protocol::*;
}

/// Serial transport implementation.
pub mod serial {
    pub use lx200_transport::*;
}

/// Astro-Physics GTO backend.
///
/// Provides [`AstroPhysicsMount`](astrophysics::AstroPhysicsMount),
/// [`AstroPhysicsBuilder`](astrophysics::AstroPhysicsBuilder) and the
/// firmware-aware status decoder.
#[cfg(feature = "astrophysics")]
pub mod astrophysics {
    pub use lx200_astrophysics::*;
}

/// OpenAstroTech backend.
///
/// Provides [`OpenAstroTechMount`](oat::OpenAstroTechMount) and
/// [`OatBuilder`](oat::OatBuilder).
#[cfg(feature = "oat")]
pub mod oat {
    pub use lx200_oat::*;
}

/// Every supported controller model across the enabled backends.
///
/// ```
/// for mount in lx200::supported_mounts() {
///     println!("{} {} @ {} baud", mount.vendor, mount.model_name, mount.default_baud_rate);
/// }
/// ```
pub fn supported_mounts() -> Vec<MountDefinition> {
    let mut mounts = Vec::new();

    #[cfg(feature = "astrophysics")]
    {
        mounts.extend(
            astrophysics::models::all_models()
                .iter()
                .map(MountDefinition::from),
        );
    }

    #[cfg(feature = "oat")]
    {
        mounts.push(MountDefinition::from(&oat::models::openastrotech()));
    }

    mounts
}
