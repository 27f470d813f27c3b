use devclass::{config::Config, repositories::PgStatusRepository, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();
    let config = Config::from_env()?;

    // runs all pending migrations; no-op if up-to-date
    PgStatusRepository::connect(config.database_url(), 1).await?;
    info!("migrations applied");

    Ok(())
}
