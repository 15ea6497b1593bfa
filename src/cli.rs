//! Command-line argument parsing for athena-relay.

use athena_relay::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Run a query, wait for it and print its results as JSON.
#[derive(Parser, Debug)]
#[command(name = "athena-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL statement to execute
    #[arg(value_name = "SQL")]
    pub sql: String,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// JSON fixture describing a scripted query service
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Database to run against
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Workgroup to run in
    #[arg(short = 'w', long, value_name = "WORKGROUP")]
    pub workgroup: Option<String>,

    /// Data catalog
    #[arg(long, value_name = "CATALOG")]
    pub catalog: Option<String>,

    /// Result location (s3://bucket/prefix/)
    #[arg(long, value_name = "URI")]
    pub output_location: Option<String>,

    /// Delay between status checks in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Fetch one page of this many rows instead of the whole result file
    #[arg(long, value_name = "ROWS")]
    pub page_size: Option<usize>,

    /// Continuation token from a previous page
    #[arg(long, value_name = "TOKEN", requires = "page_size")]
    pub next_token: Option<String>,

    /// Print results without type decoding
    #[arg(long)]
    pub raw: bool,

    /// Write logs to the log file instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Overrides config values with the ones given on the command line.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(database) = &self.database {
            config.query.database = Some(database.clone());
        }
        if let Some(workgroup) = &self.workgroup {
            config.query.workgroup = Some(workgroup.clone());
        }
        if let Some(catalog) = &self.catalog {
            config.query.catalog = Some(catalog.clone());
        }
        if let Some(location) = &self.output_location {
            config.query.output_location = Some(location.clone());
        }
        if let Some(interval) = self.poll_interval_ms {
            config.polling.interval_ms = interval;
        }
        if let Some(page_size) = self.page_size {
            config.fetch.page_size = Some(page_size);
        }
        if self.raw {
            config.fetch.typed = false;
        }
    }
}
