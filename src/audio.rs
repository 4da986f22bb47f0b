//! Audio playback: the coordinator, the backend seam and the `rodio` backend.

mod coordinator;
mod media;
mod player;
mod sink;
mod thread;
mod types;

pub use coordinator::{AudioCoordinator, CoordinatorSettings};
pub use media::{MediaBackend, MediaElement};
pub use player::{RodioBackend, resolve_media_path};
pub use types::*;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
