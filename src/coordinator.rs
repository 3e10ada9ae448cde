//! Bridge between provider actions and the call registry.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use hotline_core::ProviderConfiguration;
use hotline_core::types::{CallAction, CallId, CallUpdate, Handle};
use log::{debug, error, info, warn};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle as RuntimeHandle;

use crate::audio::AudioController;
use crate::calls::{Call, CallError, CallRegistry, ConnectedState, Dialer, EndCause};
use crate::provider::{Action, CallProvider};

/// Receives provider actions, drives call state and reports back.
///
/// Every action is checked against the registry first: the provider decides
/// which identities are live, so a missing call fails the action instead of
/// being assumed.
pub struct ProviderCoordinator {
    configuration: ProviderConfiguration,
    provider: Arc<dyn CallProvider>,
    audio: Arc<dyn AudioController>,
    dialer: Arc<dyn Dialer>,
    registry: CallRegistry,
    /// Outgoing calls whose start action is still in flight.
    dialing: DashMap<CallId, Arc<Call>>,
    /// Runtime current at construction; start tasks are spawned onto it.
    runtime: Option<RuntimeHandle>,
}

impl std::fmt::Debug for ProviderCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCoordinator")
            .field("configuration", &self.configuration)
            .field("registry", &self.registry)
            .field("dialing", &self.dialing.len())
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

impl ProviderCoordinator {
    /// Build a coordinator. When called inside a tokio runtime, outgoing
    /// calls are later placed on that runtime even if the start action is
    /// performed from another thread.
    pub fn new(
        configuration: ProviderConfiguration,
        provider: Arc<dyn CallProvider>,
        audio: Arc<dyn AudioController>,
        dialer: Arc<dyn Dialer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            configuration,
            provider,
            audio,
            dialer,
            registry: CallRegistry::new(),
            dialing: DashMap::new(),
            runtime: RuntimeHandle::try_current().ok(),
        })
    }

    pub fn configuration(&self) -> &ProviderConfiguration {
        &self.configuration
    }

    pub fn registry(&self) -> &CallRegistry {
        &self.registry
    }

    /// Ask the provider to show a new incoming call and register it once the
    /// provider accepts. Provider errors are returned unchanged.
    pub async fn report_incoming_call(
        &self,
        call_id: CallId,
        handle: Handle,
        has_video: bool,
    ) -> Result<(), CallError> {
        self.check_supported(&handle, has_video)?;

        let update = CallUpdate {
            remote_handle: handle.clone(),
            has_video,
        };
        self.provider
            .report_new_incoming_call(call_id, update)
            .await?;

        let call = Call::new_incoming(call_id, handle, has_video);
        if let Err(e) = self.registry.add(call) {
            error!("Provider accepted incoming call but registration failed: {}", e);
            return Err(e);
        }
        info!("Incoming call {} registered", call_id);
        Ok(())
    }

    fn check_supported(&self, handle: &Handle, video: bool) -> Result<(), CallError> {
        if !self.configuration.supports_handle(handle.kind) {
            return Err(CallError::UnsupportedHandle(handle.kind));
        }
        if video && !self.configuration.supports_video {
            return Err(CallError::VideoUnsupported);
        }
        Ok(())
    }

    fn runtime(&self) -> Option<RuntimeHandle> {
        self.runtime
            .clone()
            .or_else(|| RuntimeHandle::try_current().ok())
    }

    /// The provider dropped all of its calls.
    pub fn provider_did_reset(&self) {
        self.audio.stop_audio();

        let dialing: Vec<CallId> = self.dialing.iter().map(|entry| *entry.key()).collect();
        let in_flight = dialing
            .iter()
            .filter_map(|id| self.dialing.remove(id).map(|(_, call)| call));
        let calls: Vec<Arc<Call>> = self
            .registry
            .remove_all()
            .into_iter()
            .chain(in_flight)
            .collect();

        info!("Provider reset, ending {} call(s)", calls.len());
        for call in calls {
            call.end();
        }
    }

    pub fn did_activate_audio_session(&self) {
        debug!("Audio session activated");
        self.audio.start_audio();
    }

    pub fn did_deactivate_audio_session(&self) {
        debug!("Audio session deactivated");
    }

    /// Dispatch a provider action. Never blocks: placing an outgoing call
    /// continues on a task spawned onto the coordinator's runtime. A start
    /// with no runtime to run on fails.
    pub fn perform(self: &Arc<Self>, action: Action) {
        debug!(
            "Performing {} for call {}",
            action.kind().name(),
            action.call_id()
        );
        match action.kind().clone() {
            CallAction::Answer { call_id } => self.perform_answer(call_id, action),
            CallAction::End { call_id } => self.perform_end(call_id, action),
            CallAction::SetHeld { call_id, on_hold } => {
                self.perform_set_held(call_id, on_hold, action)
            }
            CallAction::Start {
                call_id,
                handle,
                video,
            } => self.perform_start(call_id, handle, video, action),
        }
    }

    fn perform_answer(&self, call_id: CallId, action: Action) {
        let Some(call) = self.registry.lookup(&call_id) else {
            warn!("Answer for unknown call {}", call_id);
            action.fail();
            return;
        };

        self.audio.configure_audio_session();
        match call.answer() {
            Ok(()) => {
                info!("Answered call {}", call_id);
                action.fulfill();
            }
            Err(e) => {
                warn!("Cannot answer call {}: {}", call_id, e);
                action.fail();
            }
        }
    }

    fn perform_end(&self, call_id: CallId, action: Action) {
        // Dialing first: a start that finishes concurrently moves the call
        // into the registry before leaving `dialing`.
        let call = self
            .dialing
            .remove(&call_id)
            .map(|(_, call)| call)
            .or_else(|| self.registry.remove_by_id(&call_id));

        let Some(call) = call else {
            warn!("End for unknown call {}", call_id);
            action.fail();
            return;
        };

        self.audio.stop_audio();
        call.end();
        info!("Ended call {}", call_id);
        action.fulfill();
    }

    fn perform_set_held(&self, call_id: CallId, on_hold: bool, action: Action) {
        let Some(call) = self.registry.lookup(&call_id) else {
            warn!("Hold for unknown call {}", call_id);
            action.fail();
            return;
        };

        if let Err(e) = call.set_held(on_hold) {
            warn!("Cannot change hold on call {}: {}", call_id, e);
            action.fail();
            return;
        }

        self.apply_hold_audio(&call, on_hold);
        debug!("Call {} on hold: {}", call_id, on_hold);
        action.fulfill();
    }

    fn apply_hold_audio(&self, call: &Call, on_hold: bool) {
        if on_hold {
            self.audio.stop_audio();
        } else if call.is_ended() {
            // A concurrent end already stopped audio.
            debug!("Call {} ended before resuming audio", call.id());
        } else {
            self.audio.start_audio();
        }
    }

    fn perform_start(
        self: &Arc<Self>,
        call_id: CallId,
        handle: Handle,
        video: bool,
        action: Action,
    ) {
        if let Err(e) = self.check_supported(&handle, video) {
            warn!("Start for call {}: {}", call_id, e);
            action.fail();
            return;
        }
        let Some(runtime) = self.runtime() else {
            error!("Start for call {}: no tokio runtime to dial on", call_id);
            action.fail();
            return;
        };
        if self.registry.contains(&call_id) {
            error!("Start rejected: {}", CallError::DuplicateIdentity(call_id));
            action.fail();
            return;
        }

        let call = Call::new_outgoing(call_id, handle, video);
        match self.dialing.entry(call_id) {
            Entry::Occupied(_) => {
                error!("Start rejected: {}", CallError::DuplicateIdentity(call_id));
                action.fail();
                return;
            }
            Entry::Vacant(slot) => {
                slot.insert(call.clone());
            }
        }

        self.audio.configure_audio_session();

        let coordinator = Arc::downgrade(self);
        call.set_connected_state_observer(move |call, state| {
            if let Some(coordinator) = coordinator.upgrade() {
                coordinator.connected_state_changed(call, state);
            }
        });

        let coordinator = Arc::downgrade(self);
        let dialer = self.dialer.clone();
        runtime.spawn(async move {
            let result = call.start(dialer.as_ref()).await;
            if !Self::finish_start(&coordinator, &call, result, action) {
                return;
            }
            if let Err(e) = call.finish_connecting(dialer.as_ref()).await {
                if call.is_ended() {
                    debug!("Call {} ended before connecting: {}", call.id(), e);
                } else {
                    warn!("Call {} did not connect: {}", call.id(), e);
                }
            }
        });
    }

    /// Resolve a start action once dialing is over. Returns whether the call
    /// was registered.
    fn finish_start(
        coordinator: &Weak<Self>,
        call: &Arc<Call>,
        result: Result<(), CallError>,
        action: Action,
    ) -> bool {
        let Some(this) = coordinator.upgrade() else {
            debug!("Coordinator gone before call {} finished dialing", call.id());
            call.end();
            // Dropping the action fails it.
            return false;
        };
        let call_id = call.id();

        if let Err(e) = result {
            this.dialing.remove(&call_id);
            warn!("Start for call {} failed: {}", call_id, e);
            action.fail();
            return false;
        }

        if let Err(e) = this.registry.add(call.clone()) {
            error!("Start for call {}: {}", call_id, e);
            this.dialing.remove(&call_id);
            call.end();
            action.fail();
            return false;
        }

        if this.dialing.remove(&call_id).is_none() {
            // An end action claimed the call while it was dialing.
            this.registry.remove(call);
            call.end();
            info!("Call {} ended before it was placed", call_id);
            action.fail();
            return false;
        }

        info!("Outgoing call {} placed", call_id);
        action.fulfill();
        true
    }

    fn connected_state_changed(&self, call: &Call, state: ConnectedState) {
        match state {
            ConnectedState::Pending => self
                .provider
                .report_outgoing_call_started_connecting(call.id(), None),
            ConnectedState::Complete => {
                self.provider.report_outgoing_call_connected(call.id(), None)
            }
            ConnectedState::Ended if call.end_cause() == Some(EndCause::Failed) => {
                // Only calls the provider already knows as live get a failure report;
                // a failed start is reported through its action.
                if self.registry.remove(call).is_some() {
                    self.audio.stop_audio();
                    self.provider.report_call_failed(call.id(), None);
                }
            }
            _ => {}
        }
    }
}
