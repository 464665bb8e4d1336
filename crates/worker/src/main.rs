use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portage_worker::config::WorkerConfig;
use portage_worker::run::run_migration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portage_worker=debug,portage_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();
    run_migration(&config).await?;

    Ok(())
}
