//! A single call session.

use chrono::{DateTime, Utc};
use hotline_core::types::{CallDirection, CallId, Handle};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::dialer::Dialer;
use super::error::CallError;
use super::state::{
    CallState, CallTransition, ConnectedState, EndCause, HoldState, InvalidTransition,
};

/// Invoked with the new state on every connected-state change.
///
/// The call is handed in by reference, so an observer never needs to keep
/// the call alive itself.
pub type ConnectedStateObserver = Arc<dyn Fn(&Call, ConnectedState) + Send + Sync>;

pub struct Call {
    id: CallId,
    direction: CallDirection,
    handle: Handle,
    has_video: bool,
    created_at: DateTime<Utc>,
    state: Mutex<CallState>,
    observer: Mutex<Option<ConnectedStateObserver>>,
}

impl std::fmt::Debug for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("handle", &self.handle)
            .field("has_video", &self.has_video)
            .field("state", &*self.lock_state())
            .field("observer", &self.lock_observer().is_some())
            .finish()
    }
}

impl Call {
    pub fn new_incoming(id: CallId, handle: Handle, has_video: bool) -> Arc<Self> {
        Arc::new(Self::new(id, CallDirection::Incoming, handle, has_video))
    }

    pub fn new_outgoing(id: CallId, handle: Handle, has_video: bool) -> Arc<Self> {
        Arc::new(Self::new(id, CallDirection::Outgoing, handle, has_video))
    }

    fn new(id: CallId, direction: CallDirection, handle: Handle, has_video: bool) -> Self {
        Self {
            id,
            direction,
            handle,
            has_video,
            created_at: Utc::now(),
            state: Mutex::new(CallState::new(direction)),
            observer: Mutex::new(None),
        }
    }

    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn direction(&self) -> CallDirection {
        self.direction
    }

    pub fn is_outgoing(&self) -> bool {
        self.direction == CallDirection::Outgoing
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn remote_handle(&self) -> &str {
        self.handle.value()
    }

    pub fn has_video(&self) -> bool {
        self.has_video
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CallState {
        self.lock_state().clone()
    }

    pub fn connected_state(&self) -> ConnectedState {
        self.lock_state().connected
    }

    pub fn hold_state(&self) -> HoldState {
        self.lock_state().hold
    }

    pub fn is_answered(&self) -> bool {
        self.lock_state().is_answered()
    }

    pub fn is_ended(&self) -> bool {
        self.lock_state().is_ended()
    }

    pub fn end_cause(&self) -> Option<EndCause> {
        self.lock_state().end_cause
    }

    pub fn set_connected_state_observer<F>(&self, observer: F)
    where
        F: Fn(&Call, ConnectedState) + Send + Sync + 'static,
    {
        *self.lock_observer() = Some(Arc::new(observer));
    }

    /// Mark the call answered. Answering twice is accepted.
    pub fn answer(&self) -> Result<(), CallError> {
        if self.is_answered() {
            debug!("Call {} already answered", self.id);
        }
        self.apply(CallTransition::Answer)?;
        Ok(())
    }

    /// End the call. Ending an ended call does nothing.
    pub fn end(&self) {
        self.finish(EndCause::Requested);
    }

    pub fn set_held(&self, on_hold: bool) -> Result<(), CallError> {
        self.apply(CallTransition::SetHeld(on_hold))?;
        Ok(())
    }

    /// Place a freshly constructed outgoing call.
    ///
    /// Resolves once dialing finished: `Ok` leaves the call `Connecting`,
    /// any error leaves it `Ended`. A call ended while dialing resolves as
    /// failed.
    pub async fn start(&self, dialer: &dyn Dialer) -> Result<(), CallError> {
        self.apply(CallTransition::BeginDialing)?;
        info!("Placing outgoing call {} to {}", self.id, self.handle);

        if let Err(e) = dialer.dial(self.id, &self.handle).await {
            warn!("Dialing failed for call {}: {}", self.id, e);
            self.finish(EndCause::Failed);
            return Err(CallError::StartFailed {
                id: self.id,
                reason: e.to_string(),
            });
        }

        self.apply(CallTransition::Dialed)
            .map_err(|_| CallError::StartFailed {
                id: self.id,
                reason: "call ended while dialing".to_string(),
            })
    }

    /// Wait for the far end of a started call to pick up.
    pub async fn finish_connecting(&self, dialer: &dyn Dialer) -> Result<(), CallError> {
        match dialer.await_answer(self.id, &self.handle).await {
            Ok(()) => {
                self.apply(CallTransition::Connected)?;
                info!("Outgoing call {} connected", self.id);
                Ok(())
            }
            Err(e) => {
                warn!("Call {} failed while connecting: {}", self.id, e);
                self.finish(EndCause::Failed);
                Err(CallError::StartFailed {
                    id: self.id,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn finish(&self, cause: EndCause) {
        // End is accepted from every state.
        if let Err(e) = self.apply(CallTransition::End(cause)) {
            warn!("Call {}: {}", self.id, e);
        }
    }

    fn apply(&self, transition: CallTransition) -> Result<(), InvalidTransition> {
        let changed = self.lock_state().apply_transition(transition)?;
        if let Some(next) = changed {
            debug!("Call {} connected state -> {:?}", self.id, next);
            // Clone out so the observer runs with no lock held.
            let observer = self.lock_observer().clone();
            if let Some(observer) = observer {
                observer(self, next);
            }
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, CallState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_observer(&self) -> MutexGuard<'_, Option<ConnectedStateObserver>> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::dialer::SimulatedDialer;
    use crate::test_utils::ScriptedDialer;

    fn recording_observer(call: &Call) -> Arc<Mutex<Vec<ConnectedState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        call.set_connected_state_observer(move |_, state| sink.lock().unwrap().push(state));
        seen
    }

    #[tokio::test]
    async fn test_start_then_connect_notifies_each_state_once() {
        let call = Call::new_outgoing(
            CallId::generate(),
            Handle::phone_number("555-2000"),
            false,
        );
        let seen = recording_observer(&call);
        let dialer = SimulatedDialer::instant();

        call.start(&dialer).await.unwrap();
        assert_eq!(call.connected_state(), ConnectedState::Connecting);

        call.finish_connecting(&dialer).await.unwrap();
        assert_eq!(call.connected_state(), ConnectedState::Complete);
        assert!(call.is_answered());

        call.end();
        call.end();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ConnectedState::Pending,
                ConnectedState::Connecting,
                ConnectedState::Complete,
                ConnectedState::Ended,
            ]
        );
    }

    #[tokio::test]
    async fn test_start_failure_ends_call() {
        let call = Call::new_outgoing(
            CallId::generate(),
            Handle::phone_number("555-0000"),
            false,
        );
        let dialer = ScriptedDialer::failing_dial();

        let err = call.start(&dialer).await.unwrap_err();
        assert!(matches!(err, CallError::StartFailed { .. }));
        assert!(call.is_ended());
        assert_eq!(call.end_cause(), Some(EndCause::Failed));
    }

    #[tokio::test]
    async fn test_start_rejected_for_incoming_and_restarted_calls() {
        let incoming = Call::new_incoming(
            CallId::generate(),
            Handle::phone_number("555-1000"),
            false,
        );
        let dialer = SimulatedDialer::instant();
        assert!(matches!(
            incoming.start(&dialer).await,
            Err(CallError::InvalidTransition(_))
        ));

        let outgoing = Call::new_outgoing(
            CallId::generate(),
            Handle::phone_number("555-2000"),
            false,
        );
        outgoing.start(&dialer).await.unwrap();
        assert!(matches!(
            outgoing.start(&dialer).await,
            Err(CallError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_end_while_dialing_fails_start() {
        let call = Call::new_outgoing(
            CallId::generate(),
            Handle::phone_number("555-2000"),
            false,
        );
        let dialer = ScriptedDialer::gated();

        let task = {
            let call = call.clone();
            let dialer = dialer.clone();
            tokio::spawn(async move { call.start(&dialer).await })
        };
        dialer.wait_until_dialing().await;
        call.end();
        dialer.release();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(CallError::StartFailed { .. })));
        assert_eq!(call.end_cause(), Some(EndCause::Requested));
    }

    #[test]
    fn test_hold_on_ended_call_is_rejected() {
        let call = Call::new_incoming(
            CallId::generate(),
            Handle::phone_number("555-1000"),
            false,
        );
        call.answer().unwrap();
        call.set_held(true).unwrap();
        assert_eq!(call.hold_state(), HoldState::Held);

        call.end();
        assert!(call.set_held(false).is_err());
        assert!(call.answer().is_err());
    }

    #[test]
    fn test_state_snapshot_records_timestamps() {
        let call = Call::new_incoming(
            CallId::generate(),
            Handle::phone_number("555-1000"),
            true,
        );
        assert!(call.has_video());
        assert_eq!(call.state().answered_at, None);

        call.answer().unwrap();
        call.end();

        let state = call.state();
        assert_eq!(state.direction, CallDirection::Incoming);
        assert_eq!(state.end_cause, Some(EndCause::Requested));
        let answered_at = state.answered_at.unwrap();
        assert!(call.created_at() <= answered_at);
        assert!(answered_at <= state.ended_at.unwrap());
    }

    #[test]
    fn test_observer_does_not_keep_call_alive() {
        let call = Call::new_incoming(
            CallId::generate(),
            Handle::phone_number("555-1000"),
            false,
        );
        let weak = Arc::downgrade(&call);
        call.set_connected_state_observer(|call, _| {
            let _ = call.id();
        });
        drop(call);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_observer_can_read_call_state() {
        let call = Call::new_incoming(
            CallId::generate(),
            Handle::phone_number("555-1000"),
            false,
        );
        let observed = Arc::new(Mutex::new(None));
        let sink = observed.clone();
        call.set_connected_state_observer(move |call, _| {
            *sink.lock().unwrap() = Some(call.is_ended());
        });

        call.end();
        assert_eq!(*observed.lock().unwrap(), Some(true));
    }
}
