use clap::{Parser, Subcommand};

use crate::commands;
use crate::models::SortKey;

#[derive(Parser)]
#[command(name = "sectorcycle")]
#[command(about = "Sector ETF cyclical Z-score analytics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh Z-scores for the whole sector universe
    Refresh {
        /// Return lookback in years
        #[arg(long, default_value_t = 2.0)]
        return_years: f64,
        /// Z-score trailing window in years
        #[arg(long, default_value_t = 10.0)]
        zscore_years: f64,
        /// Benchmark ticker
        #[arg(long, default_value = "SPY")]
        benchmark: String,
    },
    /// Rotation signal for one sector
    Rotation {
        /// Sector ETF ticker (e.g. XLK)
        sector: String,
    },
    /// Ranked holdings of one sector
    Holdings {
        /// Sector ETF ticker (e.g. XLK)
        sector: String,
        /// Ranking key
        #[arg(long, value_enum, default_value = "growth")]
        sort_by: SortKey,
    },
    /// Show cache status
    Status,
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Refresh {
            return_years,
            zscore_years,
            benchmark,
        } => {
            commands::refresh::run(return_years, zscore_years, benchmark);
        }
        Commands::Rotation { sector } => {
            commands::rotation::run(sector);
        }
        Commands::Holdings { sector, sort_by } => {
            commands::holdings::run(sector, sort_by);
        }
        Commands::Status => {
            commands::status::run();
        }
    }
}
