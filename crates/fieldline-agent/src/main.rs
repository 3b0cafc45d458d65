use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use fieldline_agent::countdown::spawn_countdown;
use fieldline_agent::gateway::{HttpGateway, TimelineGateway};
use fieldline_agent::outbox::Outbox;
use fieldline_agent::session::{Session, StageRequest};
use fieldline_core::eta::eta_target_from_events;
use fieldline_core::model::{Actor, ServiceType, StageKey};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fieldline-agent", version, about = "Technician CLI for fieldline service requests")]
struct Cli {
    /// Daemon base URL, e.g. http://127.0.0.1:8080
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    daemon_url: String,

    /// Agent identifier (stable string). If omitted, a random UUID is used.
    #[arg(long)]
    agent_id: Option<String>,

    /// Service request to operate on.
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
    /// Show the request's stage progress and timeline.
    Show,
    /// Move the request to an explicit stage, confirming a checklist where
    /// one applies (diagnosis, install).
    Apply {
        /// Stage to move to (accept, start_visit, diagnosis, ...).
        stage: StageKey,
        /// Checklist selections for gated stages. Repeatable.
        #[arg(long = "select")]
        selections: Vec<String>,
        /// Free-text addition to the checklist selections.
        #[arg(long)]
        other: Option<String>,
        /// Abandon the gated stage instead of confirming it.
        #[arg(long, default_value_t = false)]
        cancel: bool,
    },
    /// Advance one step in the flow.
    Advance,
    /// Declare the estimated time of arrival in minutes.
    Eta {
        #[arg(long)]
        minutes: i64,
    },
    /// Run the live ETA countdown until the visit starts.
    WatchEta,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let agent_id = cli
        .agent_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!("agent_id={agent_id} request={} daemon={}", cli.request, cli.daemon_url);

    let gateway = HttpGateway::new(cli.daemon_url.trim_end_matches('/'));

    // A read failure means "no events yet", not a crash.
    let events = match gateway.get_events(&cli.request).await {
        Ok(events) => events,
        Err(e) => {
            warn!("timeline fetch failed, starting from an empty log: {e}");
            Vec::new()
        }
    };
    let mut session = Session::load(cli.request.clone(), cli.service, events);

    match cli.command {
        Command::Show => {
            print_progress(&session);
            return Ok(());
        }
        Command::Apply {
            stage,
            mut selections,
            other,
            cancel,
        } => {
            let outbox = Outbox::spawn(gateway.clone());
            match session.request_stage(stage, Actor::Agent)? {
                StageRequest::Committed(t) => {
                    outbox.enqueue(&session.request_id, t.event.clone());
                    println!("-> {}", t.event.description.as_deref().unwrap_or(""));
                }
                StageRequest::NeedsConfirmation { stage, options } => {
                    if cancel {
                        session.cancel_pending();
                        println!("{stage:?} cancelled, nothing recorded");
                        finish(outbox).await?;
                        return Ok(());
                    }
                    if let Some(other) = other {
                        selections.push(other);
                    }
                    for s in &selections {
                        if !options.contains(&s.as_str()) {
                            info!("free-text selection: {s}");
                        }
                    }
                    let t = session.confirm_pending(&selections, Actor::Agent)?;
                    outbox.enqueue(&session.request_id, t.event.clone());
                    println!("-> {}", t.event.description.as_deref().unwrap_or(""));
                }
            }
            finish(outbox).await?;
        }
        Command::Advance => {
            let outbox = Outbox::spawn(gateway.clone());
            let t = session.advance(Actor::Agent);
            outbox.enqueue(&session.request_id, t.event.clone());
            println!("-> {}", t.event.description.as_deref().unwrap_or(""));
            finish(outbox).await?;
        }
        Command::Eta { minutes } => {
            let outbox = Outbox::spawn(gateway.clone());
            let event = session.set_eta(minutes, Actor::Agent)?;
            outbox.enqueue(&session.request_id, event.clone());
            println!("-> {}", event.description.as_deref().unwrap_or(""));
            finish(outbox).await?;
        }
        Command::WatchEta => {
            watch_eta(&gateway, &session).await?;
        }
    }

    Ok(())
}

/// Drain the outbox and fail loudly if any append never made it.
async fn finish(outbox: Outbox) -> Result<()> {
    let report = outbox.close().await;
    if !report.all_delivered() {
        for (request_id, event) in &report.dead {
            warn!("undelivered append for {request_id}: {:?}", event.kind);
        }
        bail!("{} timeline append(s) could not be delivered", report.dead.len());
    }
    Ok(())
}

fn print_progress(session: &Session) {
    println!(
        "request {} ({}) — stage {:?}",
        session.request_id,
        session.progress.service,
        session.progress.current_stage()
    );
    for (stage, state) in fieldline_core::engine::stage_states(&session.progress) {
        println!("  [{state:?}] {stage:?}");
    }
    for event in &session.events {
        println!(
            "  {} {:?} {}",
            event.at_ms,
            event.actor,
            event.description.as_deref().unwrap_or("")
        );
    }
}

/// Tick the countdown once a second, polling the timeline so the countdown
/// stops the moment a start-visit event lands.
async fn watch_eta(gateway: &HttpGateway, session: &Session) -> Result<()> {
    let Some(target) = eta_target_from_events(&session.events) else {
        bail!("no ETA recorded for request {}", session.request_id);
    };

    let countdown = spawn_countdown(target, |remaining| {
        println!("eta: {}m{:02}s remaining", remaining / 60, remaining % 60);
    });

    loop {
        sleep(Duration::from_secs(5)).await;
        match gateway.get_events(&session.request_id).await {
            Ok(events) => {
                let started = events
                    .iter()
                    .any(|e| e.stage() == Some(StageKey::StartVisit));
                if started {
                    info!("visit started; stopping countdown");
                    break;
                }
            }
            Err(e) => warn!("timeline poll failed: {e}"),
        }
    }

    countdown.cancel().await;
    Ok(())
}
