use anyhow::Result;
use devclass::{
    classification::Classifier,
    config::Config,
    jobs::{BatchRunner, RunnerConfig},
    repositories::PgStatusRepository,
    telemetry,
};
use std::sync::Arc;
use tracing::info;
use url::Url;

const ENV_WORKER_MODE: &str = "WORKER_MODE";

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    let config = Config::from_env()?;
    let store = PgStatusRepository::connect(config.database_url(), 10).await?;
    let classifier = Classifier::new(
        Url::parse(config.source_base_url())?,
        config.retry_policy(),
    )?;

    let runner_config = RunnerConfig::from_config(&config);
    let runner = BatchRunner::new(Arc::new(store), Arc::new(classifier), runner_config);

    // "once" processes a single batch, for schedulers that invoke the worker
    // repeatedly; "loop" keeps polling until interrupted.
    let mode = std::env::var(ENV_WORKER_MODE).unwrap_or_else(|_| "once".to_string());
    let summary = match mode.as_str() {
        "loop" => runner.run().await?,
        "once" => runner.run_once().await?,
        other => anyhow::bail!("unknown {ENV_WORKER_MODE} {other:?}, expected \"once\" or \"loop\""),
    };

    info!(
        completed = summary.completed,
        no_data = summary.no_data,
        failed = summary.failed,
        store_errors = summary.store_errors,
        "worker finished"
    );
    Ok(())
}
