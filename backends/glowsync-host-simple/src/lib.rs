//! Provides a simple, in-memory host for glowsync switches.
//!
//! This is the simplest host available. It keeps the last state and
//! the current artwork of each entity and broadcasts every state
//! change to the entity's subscribers. Light commands aren't sent
//! anywhere; they're recorded so they can be inspected or printed.
//!
//! The test suites of the other glowsync crates drive switches with
//! this backend, and `glowsyncd replay` uses it to show what a
//! configuration would do with a sequence of state changes.

use async_trait::async_trait;
use glowsync_api::{
    dispatch::{LightDispatcher, ServiceCall, SyncEvent},
    source::{EventSource, UpdateStream},
    EntityId, Error, Result, UpstreamUpdate,
};
use std::collections::{hash_map, HashMap};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, MutexGuard,
};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{debug, warn};

const CHAN_SIZE: usize = 20;

struct EntityInfo {
    tx_state: broadcast::Sender<UpstreamUpdate>,
    state: UpstreamUpdate,
    image: Option<Vec<u8>>,
    subscribe_calls: usize,
}

impl EntityInfo {
    fn create() -> EntityInfo {
        let (tx, _) = broadcast::channel(CHAN_SIZE);

        EntityInfo {
            tx_state: tx,
            state: UpstreamUpdate::Unknown,
            image: None,
            subscribe_calls: 0,
        }
    }
}

/// An `EventSource` whose entities are set by the caller.
#[derive(Default)]
pub struct SimpleHost(Mutex<HashMap<EntityId, EntityInfo>>);

impl SimpleHost {
    pub fn new() -> Self {
        SimpleHost::default()
    }

    // The only way the lock can fail is if another thread panicked
    // while holding it. Every access in this module is short and
    // infallible, so this error shouldn't ever be seen.

    fn table(&self) -> Result<MutexGuard<'_, HashMap<EntityId, EntityInfo>>> {
        self.0
            .lock()
            .map_err(|_| Error::OperationError("host table is poisoned".into()))
    }

    /// Makes `entity` known to the host with an unknown state. Adding
    /// an entity that already exists leaves it untouched.
    pub fn add_entity(&self, entity: &EntityId) -> Result<()> {
        let _ = self
            .table()?
            .entry(entity.clone())
            .or_insert_with(EntityInfo::create);
        Ok(())
    }

    /// Records a new state for `entity`, creating the entity if
    /// needed, and sends it to every subscriber.
    pub fn set_state(
        &self, entity: &EntityId, update: UpstreamUpdate,
    ) -> Result<()> {
        let mut table = self.table()?;
        let info = table.entry(entity.clone()).or_insert_with(EntityInfo::create);

        // A send only fails when nobody is subscribed, which is fine.

        let _ = info.tx_state.send(update.clone());

        debug!("{} is now {:?}", entity, &update);
        info.state = update;
        Ok(())
    }

    /// Sets (or, with `None`, clears) the artwork a media player is
    /// showing. This doesn't notify subscribers; hosts change artwork
    /// together with a state change.
    pub fn set_image(
        &self, entity: &EntityId, image: Option<Vec<u8>>,
    ) -> Result<()> {
        self.table()?
            .entry(entity.clone())
            .or_insert_with(EntityInfo::create)
            .image = image;
        Ok(())
    }

    /// Returns the number of live subscriptions to `entity`.
    pub fn subscriber_count(&self, entity: &EntityId) -> usize {
        self.table()
            .ok()
            .and_then(|t| t.get(entity).map(|v| v.tx_state.receiver_count()))
            .unwrap_or(0)
    }

    /// Returns how many times `subscribe()` succeeded for `entity`.
    pub fn subscribe_calls(&self, entity: &EntityId) -> usize {
        self.table()
            .ok()
            .and_then(|t| t.get(entity).map(|v| v.subscribe_calls))
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventSource for SimpleHost {
    async fn subscribe(&self, entity: &EntityId) -> Result<UpdateStream> {
        let mut table = self.table()?;

        match table.entry(entity.clone()) {
            hash_map::Entry::Occupied(mut e) => {
                let info = e.get_mut();
                let name = entity.to_string();

                info.subscribe_calls += 1;

                let stream = BroadcastStream::new(info.tx_state.subscribe())
                    .filter_map(move |v| match v {
                        Ok(v) => Some(v),
                        Err(e) => {
                            warn!("subscriber of {} fell behind: {}", &name, e);
                            None
                        }
                    });

                Ok(Box::pin(stream) as UpdateStream)
            }
            hash_map::Entry::Vacant(_) => Err(Error::NotFound),
        }
    }

    async fn current_state(&self, entity: &EntityId) -> Result<UpstreamUpdate> {
        self.table()?
            .get(entity)
            .map(|v| v.state.clone())
            .ok_or(Error::NotFound)
    }

    async fn media_image(&self, entity: &EntityId) -> Result<Option<Vec<u8>>> {
        self.table()?
            .get(entity)
            .map(|v| v.image.clone())
            .ok_or(Error::NotFound)
    }
}

/// A `LightDispatcher` that records what it's asked to do. Each
/// accepted service call is also sent to the receiver returned by
/// `new()` so tests can wait for calls to arrive.
pub struct RecordingDispatcher {
    calls: Mutex<Vec<ServiceCall>>,
    events: Mutex<Vec<SyncEvent>>,
    tx_calls: mpsc::UnboundedSender<ServiceCall>,
    failing: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServiceCall>) {
        let (tx, rx) = mpsc::unbounded_channel();

        (
            RecordingDispatcher {
                calls: Mutex::new(Vec::new()),
                events: Mutex::new(Vec::new()),
                tx_calls: tx,
                failing: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// When set, every service call is refused with an
    /// `OperationError` and nothing is recorded.
    pub fn set_failing(&self, value: bool) {
        self.failing.store(value, Ordering::SeqCst)
    }

    /// Returns a copy of the recorded service calls, oldest first.
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Returns a copy of the recorded events, oldest first.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LightDispatcher for RecordingDispatcher {
    async fn call_service(&self, call: ServiceCall) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::OperationError(format!(
                "{}.{} refused for {}",
                call.domain, call.service, call.data.entity_id
            )));
        }

        self.calls
            .lock()
            .map_err(|_| Error::OperationError("call log is poisoned".into()))?
            .push(call.clone());

        // The receiver may have been dropped by callers that only look
        // at `calls()`.

        let _ = self.tx_calls.send(call);
        Ok(())
    }

    async fn fire_event(&self, event: SyncEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| Error::OperationError("event log is poisoned".into()))?
            .push(event);
        Ok(())
    }
}
