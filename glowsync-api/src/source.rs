//! Defines how switches receive data from the host platform.

use crate::{EntityId, Result, UpstreamUpdate};
use async_trait::async_trait;
use std::pin::Pin;
use tokio_stream::Stream;

/// A stream that yields each new state of a subscribed entity. The
/// subscription stays registered with the host for as long as the
/// stream exists; dropping the stream unsubscribes.
pub type UpdateStream = Pin<Box<dyn Stream<Item = UpstreamUpdate> + Send>>;

/// Defines the trait a host adapter implements so switches can watch
/// and query source entities.
///
/// A switch receives an `Arc<dyn EventSource>` when it's built, so
/// nothing in glowsync looks up the host through global state.

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Subscribes to state changes of `entity`.
    ///
    /// On success, returns a stream of every state reported after
    /// the call. The current state isn't replayed; use
    /// `current_state()` for that.
    async fn subscribe(&self, entity: &EntityId) -> Result<UpdateStream>;

    /// Returns the entity's current state. An entity the host
    /// doesn't know should return `Error::NotFound`. An entity that
    /// exists but has no usable state returns
    /// `Ok(UpstreamUpdate::Unknown)`.
    async fn current_state(&self, entity: &EntityId) -> Result<UpstreamUpdate>;

    /// Returns the encoded artwork a media player is currently
    /// showing. `Ok(None)` means the player exists but has nothing to
    /// show.
    async fn media_image(&self, entity: &EntityId) -> Result<Option<Vec<u8>>>;
}
