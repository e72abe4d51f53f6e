#![allow(clippy::collapsible_if)]

// Core modules
pub mod admin;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types outside of crate (for main.rs and make_demo_shipments.rs)
pub use {
    admin::{AdminConsole, NewShipment, quote_fee},
    config::{PERSISTENCE, TRACKING, TrackingConfig, TransitionPolicy},
    data::{JsonShipmentRepository, ShipmentRepository, SqliteShipmentRepository},
    domain::{ServiceType, ShipmentRecord, ShipmentStatus},
    engine::{TrackingUpdate, TrackingWatcher},
    error::TrackingError,
    models::{ProgressResult, compute_progress, compute_progress_with},
};

// CLI argument parsing
use {
    anyhow::Result,
    chrono::{DateTime, Utc},
    clap::{Parser, Subcommand},
    std::{path::PathBuf, sync::Arc},
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite database path
    #[arg(long, global = true, conflicts_with = "json")]
    pub db: Option<PathBuf>,

    /// Use a JSON document store at this path instead of SQLite
    #[arg(long, global = true)]
    pub json: Option<PathBuf>,

    /// Let status updates move a shipment back to an earlier step
    #[arg(long, global = true, default_value_t = false)]
    pub allow_non_monotonic: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the progress of one shipment
    Track {
        tracking_number: String,
        /// Evaluate as of this instant (RFC 3339) instead of now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// List shipments, newest first
    List {
        /// Case-insensitive match on tracking number, receiver name or city
        #[arg(long)]
        search: Option<String>,
    },

    /// Create a shipment and print its tracking number
    Create {
        #[arg(long)]
        sender_name: String,
        #[arg(long)]
        sender_address: String,
        #[arg(long)]
        sender_city: String,
        #[arg(long)]
        receiver_name: String,
        #[arg(long)]
        receiver_address: String,
        #[arg(long)]
        receiver_city: String,
        #[arg(long)]
        customer_email: Option<String>,
        #[arg(long, default_value_t = ServiceType::Ground)]
        service: ServiceType,
        /// Package weight in kg
        #[arg(long)]
        weight: f64,
        #[arg(long, default_value_t = config::constants::DEFAULT_DELIVERY_DAYS)]
        days: u32,
        /// Overrides the quoted fee
        #[arg(long)]
        fee: Option<f64>,
        /// Declared value of the contents
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Append a status change to a shipment's history
    UpdateStatus {
        tracking_number: String,
        status: String,
        location: String,
    },

    /// Delete a shipment and its history
    Delete { tracking_number: String },

    /// Quote a shipping fee
    Quote {
        service: ServiceType,
        days: u32,
        /// Package weight in kg
        weight: f64,
    },

    /// Follow a shipment live until interrupted
    Watch { tracking_number: String },
}

impl Cli {
    pub fn tracking_config(&self) -> TrackingConfig {
        let transitions = if self.allow_non_monotonic {
            TransitionPolicy::PERMISSIVE
        } else {
            TransitionPolicy::STRICT
        };
        TRACKING.with_transitions(transitions)
    }

    /// Opens the backend named on the command line. SQLite unless `--json` is given.
    pub async fn open_repository(&self) -> Result<Arc<dyn ShipmentRepository>> {
        if let Some(path) = &self.json {
            return Ok(Arc::new(JsonShipmentRepository::open(path).await?));
        }

        let db_path = self
            .db
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| PERSISTENCE.db_path.to_string());
        Ok(Arc::new(SqliteShipmentRepository::new(&db_path).await?))
    }
}
