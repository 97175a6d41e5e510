//! This crate holds the types and traits shared by the glowsync
//! components.
//!
//! The host automation platform is never referenced directly. The
//! pieces of it that a light-sync switch needs -- state change
//! subscription, service calls and config-entry options -- are
//! described here as traits and handed to each switch when it's
//! built. A host adapter (or the in-memory backend used for testing)
//! implements them.

mod types;

// Pull types down to the `glowsync-api` namespace.

pub use types::color::{self, HueSat, Rgb};
pub use types::entity::{self, EntityId};
pub use types::update::{Attributes, UpstreamUpdate};
pub use types::Error;

/// A specialization of `std::result::Result<>` where the error value
/// is `types::Error`.

pub type Result<T> = std::result::Result<T, Error>;

pub mod dispatch;
pub mod options;
pub mod source;
