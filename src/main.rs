use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;

use orbit_watch::predict::next_passes;
use orbit_watch::tle::{ElementSet, ElementSource, HttpFetcher};
use orbit_watch::tracker::{self, GroundObserver};
use orbit_watch::web::{self, Config};

#[derive(Parser)]
#[command(name = "orbit-watch")]
#[command(about = "ISS tracking, pass prediction and pass reminders")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and the reminder scheduler
    Serve,
    /// Print the sub-satellite point
    Position {
        /// Instant to propagate to (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
    },
    /// Print upcoming passes over an observer
    Passes {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Observer elevation in meters
        #[arg(long, default_value_t = 0.0)]
        elevation: f64,
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Search start (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_instant)]
        start: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Position { at } => position(&config, at.unwrap_or_else(Utc::now)).await,
        Commands::Passes {
            lat,
            lon,
            elevation,
            count,
            start,
        } => {
            let observer = match GroundObserver::new(lat, lon, elevation) {
                Ok(o) => o,
                Err(e) => {
                    eprintln!("Invalid observer: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            passes(&config, observer, count, start.unwrap_or_else(Utc::now)).await
        }
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp with offset: {}", e))
}

fn load_config(path: Option<&str>) -> Result<Config, web::config::ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

async fn serve(config: Config) -> ExitCode {
    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn load_elements(config: &Config) -> Option<ElementSet> {
    let fetcher = match HttpFetcher::new(config.tle.request_timeout) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("HTTP client error: {}", e);
            return None;
        }
    };
    let source = ElementSource::new(config.tle.source_settings(), config.tle.cache(), fetcher);
    Some(source.fetch().await)
}

async fn position(config: &Config, at: DateTime<Utc>) -> ExitCode {
    let observer = match config.observer.observer() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Invalid observer: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let Some(elements) = load_elements(config).await else {
        return ExitCode::FAILURE;
    };

    match tracker::position_at(&elements, at, &observer) {
        Ok(position) => print_json(&position),
        Err(e) => {
            eprintln!("Propagation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn passes(
    config: &Config,
    observer: GroundObserver,
    count: Option<usize>,
    start: DateTime<Utc>,
) -> ExitCode {
    let search = match config.passes.search() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let Some(elements) = load_elements(config).await else {
        return ExitCode::FAILURE;
    };

    let count = count.unwrap_or(config.passes.default_count);
    match next_passes(&elements, &observer, count, start, &search) {
        Ok(passes) => print_json(&passes),
        Err(e) => {
            eprintln!("Prediction error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}
