use anyhow::{Context, Result};
use clap::Parser;
use occupancy_outlier::config::{load_config, Config};
use occupancy_outlier::provider::{HttpReadingProvider, JsonFileProvider, ReadingProvider};
use occupancy_outlier::{summarize_for_sensor, OutlierRequest};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "occupancy_outlier")]
#[command(about = "Share of occupied weekday hours a sensor spends outside its seasonal range", long_about = None)]
struct Args {
    /// Sensor metadata URI
    #[arg(long, env = "OCCUPANCY_SENSOR")]
    sensor: String,

    /// Start date (YYYY-M-D)
    #[arg(long)]
    start_date: String,

    /// End date (YYYY-M-D), included up to midnight
    #[arg(long)]
    end_date: String,

    /// First occupied hour, 24-hour clock
    #[arg(long, default_value = "9")]
    start_hour: u32,

    /// First unoccupied hour after the occupied block
    #[arg(long, default_value = "17")]
    end_hour: u32,

    #[arg(long, allow_negative_numbers = true)]
    summer_low: f64,

    #[arg(long, allow_negative_numbers = true)]
    summer_high: f64,

    #[arg(long, allow_negative_numbers = true)]
    winter_low: f64,

    #[arg(long, allow_negative_numbers = true)]
    winter_high: f64,

    /// Read readings from an archived JSON stream file instead of the data service
    #[arg(long)]
    input_file: Option<PathBuf>,

    /// Data service base URL
    #[arg(long)]
    provider_url: Option<String>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print per-season counts as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let mut config = load_config(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config
                .apply_env()
                .context("Invalid configuration in environment")?;
            config
        }
        None => Config::from_env().context("Invalid configuration in environment")?,
    };
    if let Some(url) = &args.provider_url {
        config.provider.base_url = url.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.provider.timeout_secs = secs;
    }
    config.validate()?;

    // Logs go to stderr so stdout carries only the result
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    let request = OutlierRequest {
        sensor_uri: args.sensor.clone(),
        start_date: args.start_date.clone(),
        end_date: args.end_date.clone(),
        start_hour: args.start_hour,
        end_hour: args.end_hour,
        summer_low: args.summer_low,
        summer_high: args.summer_high,
        winter_low: args.winter_low,
        winter_high: args.winter_high,
    };
    let fetch_timeout = config.provider.fetch_timeout();

    match &args.input_file {
        Some(path) => {
            info!("Using archived readings from {}", path.display());
            run(&JsonFileProvider::new(path), &request, fetch_timeout, args.json).await
        }
        None => {
            let provider = HttpReadingProvider::new(&config.provider)?;
            run(&provider, &request, fetch_timeout, args.json).await
        }
    }
}

async fn run<P: ReadingProvider>(
    provider: &P,
    request: &OutlierRequest,
    fetch_timeout: Duration,
    json: bool,
) -> Result<()> {
    let summary = summarize_for_sensor(provider, request, fetch_timeout)
        .await
        .with_context(|| format!("Outlier calculation failed for '{}'", request.sensor_uri))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{:.2}", summary.ratio);
    }
    Ok(())
}
