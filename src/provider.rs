//! The telephony provider: outbound reports and inbound actions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hotline_core::types::{ActionOutcome, CallAction, CallId, CallUpdate, ProviderError};
use log::warn;
use tokio::sync::oneshot;

/// Reports sent from the coordinator to the provider.
///
/// Only the incoming-call report is acknowledged; the rest are
/// fire-and-forget.
#[async_trait]
pub trait CallProvider: Send + Sync {
    async fn report_new_incoming_call(
        &self,
        call_id: CallId,
        update: CallUpdate,
    ) -> Result<(), ProviderError>;

    fn report_outgoing_call_started_connecting(
        &self,
        call_id: CallId,
        at: Option<DateTime<Utc>>,
    );

    fn report_outgoing_call_connected(&self, call_id: CallId, at: Option<DateTime<Utc>>);

    /// A registered call failed after its start action was fulfilled.
    fn report_call_failed(&self, call_id: CallId, at: Option<DateTime<Utc>>);
}

/// An action request awaiting its outcome.
///
/// Resolving consumes the action, so it can be fulfilled or failed only
/// once. An action dropped unresolved is reported as failed.
#[derive(Debug)]
pub struct Action {
    kind: CallAction,
    responder: Option<oneshot::Sender<ActionOutcome>>,
}

impl Action {
    pub fn new(kind: CallAction) -> (Self, oneshot::Receiver<ActionOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                kind,
                responder: Some(tx),
            },
            rx,
        )
    }

    pub fn kind(&self) -> &CallAction {
        &self.kind
    }

    pub fn call_id(&self) -> CallId {
        self.kind.call_id()
    }

    pub fn fulfill(mut self) {
        self.resolve(ActionOutcome::Fulfilled);
    }

    pub fn fail(mut self) {
        self.resolve(ActionOutcome::Failed);
    }

    fn resolve(&mut self, outcome: ActionOutcome) {
        if let Some(tx) = self.responder.take() {
            // The provider may have stopped listening.
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for Action {
    fn drop(&mut self) {
        if self.responder.is_some() {
            warn!(
                "{} action for call {} dropped unresolved, failing it",
                self.kind.name(),
                self.kind.call_id()
            );
            self.resolve(ActionOutcome::Failed);
        }
    }
}
