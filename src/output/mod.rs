//! Output sinks: consumers of per-frame panel state. [`crate::engine::Output`]
//! is the shared trait; each sink here implements it without blocking the
//! tick.
pub mod artnet;
pub mod broadcaster;

pub use artnet::{ArtNetConfig, ArtNetOutput};
pub use broadcaster::{StateBroadcaster, StateSnapshot};
