use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use fieldline_agent::countdown::spawn_countdown;
use fieldline_agent::gateway::{HttpGateway, TimelineGateway};
use fieldline_core::engine::{stage_states, RequestProgress, StageState};
use fieldline_core::eta::{eta_target_from_events, remaining_seconds};
use fieldline_core::model::{ServiceType, StageKey, TimelineEvent};
use fieldline_core::now_ms;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fieldlinectl", version, about = "Customer status view for fieldline service requests")]
struct Cli {
    /// Daemon base URL, e.g. http://127.0.0.1:8080
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    daemon_url: String,

    /// Service request to inspect.
    #[arg(long)]
    request: String,

    /// Service type of the request (in_house, in_shop, pc_build).
    #[arg(long)]
    service: ServiceType,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show stage progress and the timeline.
    Status,
    /// Run the live ETA countdown derived from the agent's declared ETA.
    WatchEta,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let gateway = HttpGateway::new(cli.daemon_url.trim_end_matches('/'));

    let events = match gateway.get_events(&cli.request).await {
        Ok(events) => events,
        Err(e) => {
            // Reads degrade to an empty timeline rather than an error screen.
            warn!("timeline fetch failed: {e}");
            Vec::new()
        }
    };

    match cli.command {
        Command::Status => print_status(&cli.request, cli.service, &events),
        Command::WatchEta => watch_eta(&events).await?,
    }

    Ok(())
}

fn print_status(request_id: &str, service: ServiceType, events: &[TimelineEvent]) {
    let progress = RequestProgress::from_events(service, events);
    println!("request {request_id} ({service})");

    for (stage, state) in stage_states(&progress) {
        let mark = match state {
            StageState::Done => "x",
            StageState::Current => ">",
            StageState::Pending => " ",
        };
        println!("  [{mark}] {stage:?}");
    }

    // The countdown target comes from the ETA event itself, so this view and
    // the technician's agree on the same clock.
    if let Some(target) = eta_target_from_events(events) {
        let visit_started = events.iter().any(|e| e.stage() == Some(StageKey::StartVisit));
        if !visit_started {
            let remaining = remaining_seconds(target, now_ms());
            println!("  technician arrives in ~{}m", remaining.div_ceil(60));
        }
    }

    if events.is_empty() {
        println!("  (no updates yet)");
    }
    for event in events {
        println!(
            "  {} {:?} {}",
            event.at_ms,
            event.actor,
            event.description.as_deref().unwrap_or("")
        );
    }
}

async fn watch_eta(events: &[TimelineEvent]) -> Result<()> {
    let Some(target) = eta_target_from_events(events) else {
        bail!("no ETA has been declared for this request yet");
    };
    if events.iter().any(|e| e.stage() == Some(StageKey::StartVisit)) {
        println!("technician already arrived");
        return Ok(());
    }

    let countdown = spawn_countdown(target, |remaining| {
        println!("eta: {}m{:02}s remaining", remaining / 60, remaining % 60);
    });

    let _ = tokio::signal::ctrl_c().await;
    countdown.cancel().await;
    Ok(())
}
