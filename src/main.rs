use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use hotline::calls::{ConnectedState, SimulatedDialer};
use hotline::types::{ActionOutcome, CallAction, CallId, CallUpdate, Handle, ProviderError};
use hotline::{Action, AudioController, CallProvider, HotlineConfig, ProviderCoordinator};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// Drives a scripted session against logging collaborators.
//
// Usage:
//   cargo run -- --incoming 555-1000 --outgoing 555-2000
//   cargo run -- -i 555-1000 --hold
//   cargo run -- --config hotline.json -o 555-2000

#[derive(Parser)]
#[command(name = "hotline")]
#[command(about = "Call provider coordination demo")]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report an incoming call from this number, answer it and hang up.
    #[arg(short, long)]
    incoming: Vec<String>,

    /// Place an outgoing call to this number and hang up once connected.
    #[arg(short, long)]
    outgoing: Vec<String>,

    /// Put answered calls on hold and resume them before hanging up.
    #[arg(long)]
    hold: bool,
}

struct LoggingProvider;

#[async_trait]
impl CallProvider for LoggingProvider {
    async fn report_new_incoming_call(
        &self,
        call_id: CallId,
        update: CallUpdate,
    ) -> Result<(), ProviderError> {
        info!(
            "provider: incoming {} call {} from {}",
            if update.has_video { "video" } else { "audio" },
            call_id,
            update.remote_handle
        );
        Ok(())
    }

    fn report_outgoing_call_started_connecting(
        &self,
        call_id: CallId,
        _at: Option<DateTime<Utc>>,
    ) {
        info!("provider: call {} started connecting", call_id);
    }

    fn report_outgoing_call_connected(&self, call_id: CallId, _at: Option<DateTime<Utc>>) {
        info!("provider: call {} connected", call_id);
    }

    fn report_call_failed(&self, call_id: CallId, _at: Option<DateTime<Utc>>) {
        warn!("provider: call {} failed", call_id);
    }
}

struct LoggingAudio;

impl AudioController for LoggingAudio {
    fn configure_audio_session(&self) {
        info!("audio: session configured");
    }

    fn start_audio(&self) {
        info!("audio: started");
    }

    fn stop_audio(&self) {
        info!("audio: stopped");
    }
}

async fn perform(coordinator: &Arc<ProviderCoordinator>, kind: CallAction) -> ActionOutcome {
    let name = kind.name();
    let (action, outcome) = Action::new(kind);
    coordinator.perform(action);
    let outcome = outcome.await.unwrap_or(ActionOutcome::Failed);
    info!("{} -> {:?}", name, outcome);
    outcome
}

async fn hold_and_resume(coordinator: &Arc<ProviderCoordinator>, call_id: CallId) {
    for on_hold in [true, false] {
        perform(coordinator, CallAction::SetHeld { call_id, on_hold }).await;
    }
}

async fn run_incoming(
    coordinator: &Arc<ProviderCoordinator>,
    number: &str,
    hold: bool,
) -> Result<(), anyhow::Error> {
    let call_id = CallId::generate();
    coordinator
        .report_incoming_call(call_id, Handle::phone_number(number), false)
        .await?;

    if perform(coordinator, CallAction::Answer { call_id }).await.is_fulfilled() {
        coordinator.did_activate_audio_session();
    }
    if hold {
        hold_and_resume(coordinator, call_id).await;
    }
    perform(coordinator, CallAction::End { call_id }).await;
    Ok(())
}

async fn run_outgoing(
    coordinator: &Arc<ProviderCoordinator>,
    number: &str,
    hold: bool,
    timeout: Duration,
) {
    let call_id = CallId::generate();
    let start = CallAction::Start {
        call_id,
        handle: Handle::phone_number(number),
        video: false,
    };
    if !perform(coordinator, start).await.is_fulfilled() {
        return;
    }
    coordinator.did_activate_audio_session();

    let connected = tokio::time::timeout(timeout, async {
        loop {
            match coordinator.registry().lookup(&call_id) {
                Some(call) if call.connected_state() == ConnectedState::Complete => return true,
                Some(_) => tokio::time::sleep(Duration::from_millis(50)).await,
                None => return false,
            }
        }
    })
    .await
    .unwrap_or(false);

    if !connected {
        warn!("Call {} to {} never connected", call_id, number);
    } else if hold {
        hold_and_resume(coordinator, call_id).await;
    }
    perform(coordinator, CallAction::End { call_id }).await;
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{:<5}] [{}] - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => HotlineConfig::load(path)?,
        None => HotlineConfig::default(),
    };
    info!(
        "{} provider: video={}, calls per group={}, handles={:?}",
        config.provider.localized_name,
        config.provider.supports_video,
        config.provider.maximum_calls_per_call_group,
        config.provider.supported_handle_types
    );

    let connect_timeout =
        Duration::from_millis(config.dialer.dial_delay_ms + config.dialer.answer_delay_ms)
            + Duration::from_secs(5);
    let coordinator = ProviderCoordinator::new(
        config.provider,
        Arc::new(LoggingProvider),
        Arc::new(LoggingAudio),
        Arc::new(SimulatedDialer::new(&config.dialer)),
    );

    for number in &cli.incoming {
        if let Err(e) = run_incoming(&coordinator, number, cli.hold).await {
            warn!("Incoming call from {} not reported: {}", number, e);
        }
    }
    for number in &cli.outgoing {
        run_outgoing(&coordinator, number, cli.hold, connect_timeout).await;
    }

    coordinator.provider_did_reset();
    info!("Done, {} call(s) left", coordinator.registry().len());
    Ok(())
}
