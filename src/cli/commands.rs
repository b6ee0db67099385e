use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "odb-telemetry", version, about = "Ingestion backend for TORQUE OBD-II vehicle telemetry")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a user account that devices can attach readings to
    AddUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },

    /// Validate login credentials
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Process one live request given as key=value pairs (TORQUE wire keys)
    Live {
        #[arg(value_parser = parse_key_val, required = true)]
        params: Vec<(String, String)>,
    },

    /// Ingest a TORQUE CSV trip log for a user
    IngestCsv {
        #[arg(long)]
        email: String,
        /// Path to the CSV file
        #[arg(long)]
        file: PathBuf,
    },

    /// List drive sessions recorded for a user
    Sessions {
        #[arg(long)]
        email: String,
    },

    /// Show database row counts
    Stats,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}
