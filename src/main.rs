use anyhow::Context;
use chatprobe::config::Config;
use chatprobe::probe::run_probe;
use chatprobe::shutdown::setup_shutdown_handler;
use chatprobe::ws::ConsoleObserver;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_logging(&config);

    info!("Starting chatprobe...");
    info!(config=?config, "Configuration loaded");

    let shutdown_token = setup_shutdown_handler();

    let mut observer = ConsoleObserver::new(config.print_length);
    run_probe(&config, &mut observer, shutdown_token).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    use tracing_subscriber::{fmt, registry, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .init();

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing::info!(rust_log=?rust_log, "RUST_LOG");
}
