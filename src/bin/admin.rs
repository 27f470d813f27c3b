use anyhow::Result;
use clap::{Parser, Subcommand};
use devclass::{
    classification::Classifier,
    config::Config,
    entities::ProcessingStatus,
    repositories::{PgStatusRepository, StatusStore},
    telemetry,
};
use url::Url;

/// Maintenance commands for the product-code table.
#[derive(Debug, Parser)]
#[command(name = "admin", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add product codes as "Not started"
    Seed {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Print the number of items in the table
    Count,
    /// Put every item back to "Not started"
    ResetStatus,
    /// Clear data and timestamps of every processed item
    ResetData,
    /// List items in a given status
    Pending {
        #[arg(long, default_value = "Not started")]
        status: ProcessingStatus,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Fetch and extract one product code without touching the table
    Classify { code: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Seed { codes } => {
            let inserted = connect(&config).await?.seed(&codes).await?;
            println!("inserted {inserted} of {} product codes", codes.len());
        }
        Command::Count => println!("{}", connect(&config).await?.item_count().await?),
        Command::ResetStatus => {
            let reset = connect(&config).await?.reset_status().await?;
            println!("reset {reset} items to \"{}\"", ProcessingStatus::NotStarted);
        }
        Command::ResetData => {
            let cleared = connect(&config).await?.reset_data().await?;
            println!("cleared data on {cleared} items");
        }
        Command::Pending { status, limit } => {
            for item in connect(&config).await?.fetch_by_status(status, limit).await? {
                println!("{}\t{}", item.product_code, item.status);
            }
        }
        // Needs no database
        Command::Classify { code } => {
            let classifier = Classifier::new(
                Url::parse(config.source_base_url())?,
                config.retry_policy(),
            )?;
            match classifier.classify(&code).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("{code}: {}", ProcessingStatus::NoDataFound),
            }
        }
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<PgStatusRepository> {
    PgStatusRepository::connect(config.database_url(), 2).await
}
