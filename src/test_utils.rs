use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hotline_core::types::{CallId, CallUpdate, Handle, ProviderError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::audio::AudioController;
use crate::calls::{DialError, Dialer};
use crate::provider::CallProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReport {
    NewIncomingCall(CallId, CallUpdate),
    StartedConnecting(CallId),
    Connected(CallId),
    Failed(CallId),
}

#[derive(Debug, Default)]
pub struct RecordingProvider {
    reports: Mutex<Vec<ProviderReport>>,
    incoming_error: Option<ProviderError>,
}

impl RecordingProvider {
    pub fn rejecting(error: ProviderError) -> Self {
        Self {
            reports: Mutex::default(),
            incoming_error: Some(error),
        }
    }

    pub fn reports(&self) -> Vec<ProviderReport> {
        self.reports.lock().unwrap().clone()
    }

    pub async fn wait_for_report(&self, expected: &ProviderReport) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.reports().contains(expected) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for provider report");
    }

    fn record(&self, report: ProviderReport) {
        self.reports.lock().unwrap().push(report);
    }
}

#[async_trait]
impl CallProvider for RecordingProvider {
    async fn report_new_incoming_call(
        &self,
        call_id: CallId,
        update: CallUpdate,
    ) -> Result<(), ProviderError> {
        self.record(ProviderReport::NewIncomingCall(call_id, update));
        match self.incoming_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn report_outgoing_call_started_connecting(
        &self,
        call_id: CallId,
        _at: Option<DateTime<Utc>>,
    ) {
        self.record(ProviderReport::StartedConnecting(call_id));
    }

    fn report_outgoing_call_connected(&self, call_id: CallId, _at: Option<DateTime<Utc>>) {
        self.record(ProviderReport::Connected(call_id));
    }

    fn report_call_failed(&self, call_id: CallId, _at: Option<DateTime<Utc>>) {
        self.record(ProviderReport::Failed(call_id));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    Configure,
    Start,
    Stop,
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    events: Mutex<Vec<AudioEvent>>,
}

impl RecordingAudio {
    pub fn events(&self) -> Vec<AudioEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: AudioEvent) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }
}

impl AudioController for RecordingAudio {
    fn configure_audio_session(&self) {
        self.events.lock().unwrap().push(AudioEvent::Configure);
    }

    fn start_audio(&self) {
        self.events.lock().unwrap().push(AudioEvent::Start);
    }

    fn stop_audio(&self) {
        self.events.lock().unwrap().push(AudioEvent::Stop);
    }
}

#[derive(Debug, Default)]
struct Gate {
    dialing: Notify,
    released: Notify,
}

/// Dialer with scripted results. A gated dialer parks in `dial` until
/// [`ScriptedDialer::release`] is called.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDialer {
    fail_dial: bool,
    fail_answer: bool,
    gate: Option<Arc<Gate>>,
}

impl ScriptedDialer {
    pub fn failing_dial() -> Self {
        Self {
            fail_dial: true,
            ..Default::default()
        }
    }

    pub fn failing_answer() -> Self {
        Self {
            fail_answer: true,
            ..Default::default()
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Gate::default())),
            ..Default::default()
        }
    }

    pub async fn wait_until_dialing(&self) {
        if let Some(gate) = &self.gate {
            gate.dialing.notified().await;
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.released.notify_one();
        }
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self, _call_id: CallId, handle: &Handle) -> Result<(), DialError> {
        if let Some(gate) = &self.gate {
            gate.dialing.notify_one();
            gate.released.notified().await;
        }
        if self.fail_dial {
            return Err(DialError(format!("{} is unreachable", handle)));
        }
        Ok(())
    }

    async fn await_answer(&self, _call_id: CallId, handle: &Handle) -> Result<(), DialError> {
        if self.fail_answer {
            return Err(DialError(format!("{} did not answer", handle)));
        }
        Ok(())
    }
}
