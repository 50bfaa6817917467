use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use quorum::audit::{ActionMetrics, AuditTrail};
use quorum::compliance::ComplianceEvaluator;
use quorum::config::{AppConfig, LoggingConfig};
use quorum::orchestrator::Orchestrator;
use quorum::scheduler::CycleScheduler;

#[derive(Parser, Debug)]
#[command(name = "quorum", version, about = "Multi-agent trading orchestration service")]
struct Cli {
    /// Directory holding default.toml and environment-specific overrides
    #[arg(long, default_value = "config", env = "QUORUM_CONFIG_DIR")]
    config_dir: String,
}

fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::layer::{Layered, SubscriberExt};
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer, Registry};

    type FilteredSubscriber = Layered<EnvFilter, Registry>;
    type BoxedLayer = Box<dyn Layer<FilteredSubscriber> + Send + Sync>;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},quorum=debug", logging.level)));

    // Optional rolling file output, enabled by QUORUM_LOG_DIR.
    //
    // `tracing_appender::rolling::daily` aborts the process if it cannot
    // create the initial log file, so probe writability first.
    let file_layer = std::env::var("QUORUM_LOG_DIR").ok().and_then(|log_dir| {
        if std::fs::create_dir_all(&log_dir).is_err() {
            eprintln!(
                "Warning: could not create log directory {}, file logging disabled",
                log_dir
            );
            return None;
        }

        let probe = std::path::Path::new(&log_dir).join(".quorum_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&probe)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&probe);
            }
            Err(e) => {
                eprintln!(
                    "Warning: log directory {} is not writable ({}), file logging disabled",
                    log_dir, e
                );
                return None;
            }
        }

        let file_appender = tracing_appender::rolling::daily(&log_dir, "quorum.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Keep the guard alive by leaking it (acceptable for a long-running process)
        Box::leak(Box::new(guard));

        eprintln!("Logging to: {}/quorum.log", log_dir);
        let layer: BoxedLayer = Box::new(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        );
        Some(layer)
    });

    let console_layer: BoxedLayer = if logging.json {
        Box::new(tracing_subscriber::fmt::layer().with_target(true).json())
    } else {
        Box::new(tracing_subscriber::fmt::layer().with_target(true))
    };

    let mut layers: Vec<BoxedLayer> = vec![console_layer];
    if let Some(layer) = file_layer {
        layers.push(layer);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config =
        AppConfig::load_from(&cli.config_dir).context("failed to load configuration")?;
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("config error: {}", error);
        }
        anyhow::bail!("invalid configuration ({} errors)", errors.len());
    }

    init_logging(&config.logging);

    let scheduler = Arc::new(CycleScheduler::new(config.scheduler.clone()));
    let compliance = Arc::new(ComplianceEvaluator::with_defaults());
    compliance.load_policy(&config.compliance.policy).await?;

    let audit = Arc::new(AuditTrail::new());
    let metrics = Arc::new(ActionMetrics::new());

    let orchestrator = Arc::new(Orchestrator::new(
        config.orchestration.clone(),
        scheduler,
        compliance,
        audit.clone(),
        metrics.clone(),
    ));

    // Strategy agents attach through the library surface; the daemon itself
    // only runs the orchestration loop.
    orchestrator.start_automated_trading().await;
    info!("quorum orchestration service running; ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("shutdown signal received");
    orchestrator.stop_automated_trading();

    let status = orchestrator.trading_status().await;
    info!(
        completed_cycles = status.completed_cycles,
        audited_actions = audit.len().await,
        "orchestration service stopped"
    );
    println!("{}", metrics.summary());

    Ok(())
}
