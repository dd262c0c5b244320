use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use solocron_core::config::ElectionMode;
use solocron_core::{LeadershipState, SolocronConfig};
use solocron_dispatch::{
    BreakerRegistry, BreakerSettings, DispatchMetrics, Dispatcher, WebhookAction,
};
use solocron_election::{ElectionBackend, SidecarElection, StaticElection};
use solocron_scheduler::{LeadershipGate, ScheduleEntry, SchedulerControl, TimerLoop};

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SOLOCRON_LOG")
                .unwrap_or_else(|_| "solocron=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path via SOLOCRON_CONFIG > ~/.solocron/solocron.toml
    let config_path = std::env::var("SOLOCRON_CONFIG").ok();
    let mut config = SolocronConfig::load(config_path.as_deref())?;
    // missing identity/namespace outside cluster mode is fatal here
    config.validate()?;

    let self_id = config.election.id.clone();
    info!(id = %self_id, election = %config.election.name, "solocron starting");

    // dispatch pipeline: per-job breakers feeding the metrics sink
    let breakers = Arc::new(BreakerRegistry::new(BreakerSettings {
        failure_threshold: config.breaker.failure_threshold,
        cooldown: Duration::from_secs(config.breaker.cooldown_secs),
    }));
    let metrics = Arc::new(DispatchMetrics::new()?);
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&breakers),
        Arc::clone(&metrics),
    ));

    // the crontab: registry is fixed before the loop ever starts
    let timer = Arc::new(TimerLoop::new(dispatcher));
    let client = reqwest::Client::new();
    for job in &config.jobs {
        timer.add_entry(ScheduleEntry::new(
            job.name.clone(),
            Duration::from_secs(job.every_secs),
            Arc::new(WebhookAction::new(
                job.name.clone(),
                job.url.clone(),
                self_id.clone(),
                client.clone(),
            )),
        ))?;
        info!(job = %job.name, url = %job.url, every_secs = job.every_secs, "job registered");
    }

    let leadership = Arc::new(LeadershipState::new(self_id.clone()));

    // election bootstrap must succeed before we serve anything
    let mut backend: Box<dyn ElectionBackend> = match config.election.mode {
        ElectionMode::Sidecar => Box::new(SidecarElection::new(&config.election)),
        ElectionMode::Static => Box::new(StaticElection::new(self_id)),
    };
    let initial = backend.bootstrap().await?;
    info!(leader = %initial, "election established");

    let (notify_tx, notify_rx) = tokio::sync::mpsc::channel::<String>(64);
    let backend_task = tokio::spawn(backend.run(notify_tx));

    let control: Arc<dyn SchedulerControl> = timer.clone();
    let gate = LeadershipGate::new(control, Arc::clone(&leadership));
    let gate_task = tokio::spawn(gate.run(notify_rx));

    // optional status surface; without it the process just runs the gate
    if let Some(ref addr) = config.http.addr {
        let state = Arc::new(app::AppState::new(
            Arc::clone(&leadership),
            Arc::clone(&breakers),
            Arc::clone(&metrics),
        ));
        let router = app::build_router(state);
        let addr: SocketAddr = addr.parse()?;
        info!("status server listening on {addr}");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    // Aborting the backend drops the only notification sender; the gate sees
    // the closed channel and stops the timer loop if it is active.
    info!("shutting down");
    backend_task.abort();
    let _ = gate_task.await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
