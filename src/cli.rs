use crate::run::{self, RunOptions};
use crate::services::session::SessionConfig;
use crate::types::{ControllerConfig, PacingRange};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "parnik", version, about = "Catalog records from regional greenhouse mirrors (JSON out)")]
pub struct Cli {
    /// CSV with the columns Название, Город, ГородКод, URL
    #[arg(long, default_value = "teplicy_links_final.csv")]
    links: PathBuf,

    /// Where to write the extracted records (pretty JSON)
    #[arg(long, default_value = "teplicy_data.json")]
    output: PathBuf,

    /// Also write a flat price CSV (one row per price entry)
    #[arg(long)]
    price_csv: Option<PathBuf>,

    /// Directory for the per-city log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Only process targets for this city (repeatable); default: all cities
    #[arg(long = "city")]
    cities: Vec<String>,

    /// Failed attempts allowed per target before it is dropped
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Readiness budget per navigation, in seconds
    #[arg(long, default_value_t = 15)]
    ready_timeout: u64,

    /// Lower bound of the courtesy delay between targets, in seconds
    #[arg(long, default_value_t = 1)]
    delay_min: u64,

    /// Upper bound of the courtesy delay between targets, in seconds
    #[arg(long, default_value_t = 3)]
    delay_max: u64,

    /// Override the session user agent
    #[arg(long)]
    user_agent: Option<String>,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut session = SessionConfig::default();
    if let Some(ua) = cli.user_agent {
        session.user_agent = ua;
    }

    let opts = RunOptions {
        links: cli.links,
        output: cli.output,
        price_csv: cli.price_csv,
        log_dir: cli.log_dir,
        cities: cli.cities,
        controller: ControllerConfig {
            max_retries: cli.max_retries,
            ready_timeout: Duration::from_secs(cli.ready_timeout),
            ..ControllerConfig::default()
        },
        session,
        pacing: PacingRange {
            min: Duration::from_secs(cli.delay_min),
            max: Duration::from_secs(cli.delay_max.max(cli.delay_min)),
        },
    };

    let summary = run::run(&opts)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
