use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use outpost_journal::{InMemoryJournal, Journal, JournalRecorder};
use outpost_scheduler::{OutpostConfig, SimulationLoop};
use outpost_server::{AppState, demo::demo_simulation, router};
use outpost_types::EventBus;

#[derive(Parser)]
#[command(name = "outpost", about = "Settlement work scheduler with a read-only dashboard")]
struct Cli {
    /// Directory holding outpost.toml
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
    /// Dashboard address, overriding the configured one
    #[arg(long)]
    bind: Option<String>,
    /// Write the effective configuration back to the config directory
    #[arg(long)]
    save_config: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = OutpostConfig::load(&cli.config_dir)?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    init_tracing(config.json_logs);
    if cli.save_config {
        config.save(&cli.config_dir)?;
    }

    let events = EventBus::default();
    let journal: Arc<dyn Journal> = match config.journal_capacity {
        0 => Arc::new(InMemoryJournal::new()),
        cap => Arc::new(InMemoryJournal::with_capacity(cap)),
    };
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let recorder = JournalRecorder::new(events.subscribe(), shutdown_rx.clone(), journal.clone());
    let recorder = tokio::spawn(recorder.run());

    let simulation = demo_simulation(&config, &events);
    let (snapshot_tx, snapshot_rx) = watch::channel(simulation.snapshot());
    let sim_loop = SimulationLoop::new(simulation, &config, snapshot_tx, shutdown_rx.clone());
    let sim_loop = {
        let shutdown_tx = Arc::clone(&shutdown_tx);
        tokio::spawn(async move {
            let result = sim_loop.run().await;
            if result.is_err() {
                let _ = shutdown_tx.send(true);
            }
            result
        })
    };

    let app = router(AppState::new(snapshot_rx, journal)).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "dashboard listening");

    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = server_shutdown.changed() => {}
            }
        })
        .await
        .context("dashboard server failed")?;

    let _ = shutdown_tx.send(true);
    let simulation = sim_loop.await.context("simulation task panicked")?;
    recorder.await.context("journal recorder panicked")?;
    match simulation {
        Ok(sim) => {
            tracing::info!(pulses = sim.pulse_count(), "outpost stopped");
            Ok(())
        }
        Err(e) => Err(e).context("simulation stopped on a fatal error"),
    }
}
