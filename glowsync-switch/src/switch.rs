use crate::{
    mode::{Outcome, SyncMode},
    subscription::Subscription,
};
use glowsync_api::{
    dispatch::{LightDispatcher, SyncEvent},
    options::SwitchOptions,
    source::{EventSource, UpdateStream},
    EntityId, Error, Result, UpstreamUpdate,
};
use std::sync::{Arc, Weak};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, info_span, warn};
use tracing_futures::Instrument;

/// What `sync_now()` found.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SyncReport {
    /// The state label the color was chosen for. `None` if the
    /// source had no usable state.
    pub condition: Option<String>,
    pub enabled: bool,
    pub light_ids: Vec<EntityId>,
}

struct State {
    enabled: bool,
    options: SwitchOptions,
    subscription: Option<Subscription>,
}

struct Inner {
    name: String,
    mode: SyncMode,
    source: Arc<dyn EventSource>,
    lights: Arc<dyn LightDispatcher>,
    state: Mutex<State>,
}

impl Inner {
    // Runs one sync cycle for `update`: computes the command and
    // sends it to every light. Failed service calls are logged and
    // the remaining lights still get the command.

    async fn sync(
        &self, state: &State, update: &UpstreamUpdate,
    ) -> Result<Outcome> {
        let out = self
            .mode
            .compute(self.source.as_ref(), &state.options.source, update)
            .await?;

        debug!(
            "syncing {} light(s) for '{}'",
            state.options.lights.len(),
            &out.condition
        );

        for light in &state.options.lights {
            let call = out.command.to_service_call(light);

            if let Err(e) = self.lights.call_service(call).await {
                error!("couldn't update {}: {}", light, e)
            }
        }

        if let Some(rgb) = out.rgb {
            let ev = SyncEvent::color_changed(&out.condition, rgb);

            if let Err(e) = self.lights.fire_event(ev).await {
                warn!("couldn't report color change: {}", e)
            }
        }
        Ok(out)
    }

    // Runs a sync cycle using the source's current state.

    async fn sync_current(&self, state: &State) -> Result<Outcome> {
        let update = self.source.current_state(&state.options.source).await?;

        self.sync(state, &update).await
    }

    async fn on_upstream_event(&self, update: UpstreamUpdate) {
        let state = self.state.lock().await;

        if !state.enabled {
            debug!("ignoring update while disabled");
            return;
        }

        if !update.is_known() {
            debug!("source state is unknown -- skipping");
            return;
        }

        if let Err(e) = self.sync(&state, &update).await {
            warn!("sync skipped: {}", e)
        }
    }

    async fn enable(self: &Arc<Self>, state: &mut State) {
        state.enabled = true;

        // Bring the lights up to date before waiting for changes.

        if let Err(e) = self.sync_current(state).await {
            warn!("initial sync skipped: {}", e)
        }

        let entity = state.options.source.clone();

        match self.source.subscribe(&entity).await {
            Ok(stream) => {
                let span = info_span!("switch", name = self.name.as_str());
                let task = tokio::spawn(
                    listen(Arc::downgrade(self), stream).instrument(span),
                );

                info!("enabled -- listening to {}", &entity);
                state.subscription = Some(Subscription::new(entity, task))
            }
            Err(e) => error!("couldn't subscribe to {}: {}", &entity, e),
        }
    }

    async fn disable(&self, state: &mut State) {
        state.enabled = false;

        if let Some(sub) = state.subscription.take() {
            sub.cancel().await;
            info!("disabled");
        }
    }
}

// Feeds each state reported by the source to the switch. The task
// only holds a weak reference so it doesn't keep the switch alive.

async fn listen(switch: Weak<Inner>, mut stream: UpdateStream) {
    while let Some(update) = stream.next().await {
        match switch.upgrade() {
            Some(sw) => sw.on_upstream_event(update).await,
            None => break,
        }
    }
    debug!("listener exiting");
}

/// A switch that, while on, keeps a set of lights colored to match a
/// source entity.
///
/// The switch starts off. Turning it on syncs the lights once and
/// subscribes to the source; each reported state then runs another
/// sync cycle. Turning it off drops the subscription. All operations
/// on one switch are serialized.
///
/// Cloning the switch produces another handle to the same switch.
/// When the last handle is dropped, the switch stops listening.
#[derive(Clone)]
pub struct ToggleableSyncSwitch(Arc<Inner>);

impl ToggleableSyncSwitch {
    /// Creates a switch in the off state. Returns
    /// `Error::ConfigError` if `options` can't be used with `mode`.
    pub fn new(
        name: &str, mode: SyncMode, options: SwitchOptions,
        source: Arc<dyn EventSource>, lights: Arc<dyn LightDispatcher>,
    ) -> Result<Self> {
        mode.validate(&options).map_err(|e| {
            Error::ConfigError(format!("switch '{}': {}", name, e))
        })?;

        Ok(ToggleableSyncSwitch(Arc::new(Inner {
            name: name.to_string(),
            mode,
            source,
            lights,
            state: Mutex::new(State {
                enabled: false,
                options,
                subscription: None,
            }),
        })))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub async fn is_on(&self) -> bool {
        self.0.state.lock().await.enabled
    }

    pub async fn options(&self) -> SwitchOptions {
        self.0.state.lock().await.options.clone()
    }

    fn span(&self) -> tracing::Span {
        info_span!("switch", name = self.0.name.as_str())
    }

    /// Turns the switch on. The lights are synced with the source's
    /// current state and then the source is subscribed to. Sync
    /// failures are logged, not returned. Does nothing if the switch
    /// is already on.
    pub async fn turn_on(&self) {
        async {
            let mut state = self.0.state.lock().await;

            if !state.enabled {
                self.0.enable(&mut state).await
            }
        }
        .instrument(self.span())
        .await
    }

    /// Turns the switch off and drops its subscription. Turning off a
    /// switch that's already off is allowed.
    pub async fn turn_off(&self) {
        async {
            let mut state = self.0.state.lock().await;

            self.0.disable(&mut state).await
        }
        .instrument(self.span())
        .await
    }

    /// Handles a state reported by the source entity. Ignored while
    /// the switch is off or if the state is unknown.
    pub async fn on_upstream_event(&self, update: UpstreamUpdate) {
        self.0.on_upstream_event(update).instrument(self.span()).await
    }

    /// Replaces the switch's options. Options that don't suit the
    /// switch's mode are refused with `Error::ConfigError` and the
    /// switch is left unchanged. If the switch is on, it's turned off,
    /// updated and turned back on without any other operation running
    /// in between.
    pub async fn on_config_updated(&self, options: SwitchOptions) -> Result<()> {
        async {
            self.0.mode.validate(&options)?;

            let mut state = self.0.state.lock().await;

            if state.enabled {
                info!("options changed -- resubscribing");
                self.0.disable(&mut state).await;
                state.options = options;
                self.0.enable(&mut state).await;
            } else {
                state.options = options;
            }
            Ok::<_, Error>(())
        }
        .instrument(self.span())
        .await
    }

    /// Syncs the lights now, if the switch is on, and reports the
    /// state they were synced to. A switch that's off reports the
    /// source's state but doesn't touch the lights.
    pub async fn sync_now(&self) -> SyncReport {
        async {
            let state = self.0.state.lock().await;

            let condition = if state.enabled {
                match self.0.sync_current(&state).await {
                    Ok(out) => Some(out.condition),
                    Err(e) => {
                        warn!("sync skipped: {}", e);
                        None
                    }
                }
            } else {
                self.0
                    .source
                    .current_state(&state.options.source)
                    .await
                    .ok()
                    .and_then(|v| v.get_state().map(String::from))
            };

            SyncReport {
                condition,
                enabled: state.enabled,
                light_ids: state.options.lights.clone(),
            }
        }
        .instrument(self.span())
        .await
    }
}

/// Starts a task that applies every options change received on `rx`
/// to `switch`. Rejected options are logged. The task ends when the
/// sender is dropped or the switch is.
pub fn spawn_options_listener(
    switch: &ToggleableSyncSwitch, mut rx: watch::Receiver<SwitchOptions>,
) -> JoinHandle<()> {
    let weak = Arc::downgrade(&switch.0);
    let span = info_span!("options", name = switch.name());

    tokio::spawn(
        async move {
            while rx.changed().await.is_ok() {
                let opts = rx.borrow_and_update().clone();

                match weak.upgrade() {
                    Some(inner) => {
                        let sw = ToggleableSyncSwitch(inner);

                        if let Err(e) = sw.on_config_updated(opts).await {
                            error!("rejected new options: {}", e)
                        }
                    }
                    None => break,
                }
            }
            debug!("options listener exiting");
        }
        .instrument(span),
    )
}
