//! CLI command definitions and parsing
use crate::model::Category;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tripsearch",
    version,
    author = "neur0map",
    about = "Multi-provider travel search and comparison engine",
    long_about = "Tripsearch queries flight, hotel, car and experience providers in parallel, \
                  merges equivalent offers across providers, ranks them, and keeps each search \
                  as a session that can be filtered, sorted and paged later by its token."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/tripsearch/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Configuration profile to apply (e.g., "europe")
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// JSON offers file served instead of the built-in demo inventory
    #[arg(long, global = true, value_name = "FILE")]
    pub offers: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search every category for a destination
    Search {
        /// Destination name (e.g., "Paris")
        destination: String,

        /// Destination code (e.g., "PAR")
        #[arg(long)]
        code: Option<String>,

        /// Origin name; enables flights in unified mode
        #[arg(short, long)]
        origin: Option<String>,

        /// Origin code (e.g., "NYC")
        #[arg(long)]
        origin_code: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Treat dates as flexible
        #[arg(long)]
        flexible: bool,

        /// Flexible window in days
        #[arg(long)]
        flex_days: Option<u32>,

        #[arg(short, long, default_value = "1")]
        adults: u32,

        #[arg(long, default_value = "0")]
        children: u32,

        #[arg(long, default_value = "0")]
        infants: u32,

        /// Cabin class for flights
        #[arg(long, value_parser = ["economy", "premium_economy", "business", "first"])]
        cabin: Option<String>,

        /// Search mode
        #[arg(
            short,
            long,
            value_parser = ["unified", "flight", "hotel", "car", "experience", "package", "plan"]
        )]
        mode: Option<String>,

        /// Currency code (e.g., "EUR")
        #[arg(long)]
        currency: Option<String>,

        /// Authenticated user id
        #[arg(short, long)]
        user: Option<String>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Work with an existing search session
    Session {
        /// Session token returned by `search`
        token: String,

        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Suggest destinations for typed text
    Autocomplete {
        /// Partial destination name or code
        text: String,
    },

    /// Show the most popular destinations
    Trending {
        /// Number of destinations to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show session store statistics
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Filter a category's results
    Filter {
        category: Category,

        /// Filters as a JSON object (e.g., '{"stops": [0], "price": {"max": 500}}')
        filters: String,
    },

    /// Re-sort a category's results
    Sort {
        category: Category,

        /// Sort option (e.g., "price_low")
        sort_by: String,
    },

    /// Show one page of a category's results
    Page {
        category: Category,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Items per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Record a click on an offer
    Click { offer_id: String },

    /// Record a saved offer
    Save { offer_id: String },

    /// Print the stored session
    Show,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
