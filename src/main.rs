mod commands;
mod config;
mod providers;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use timetally_core::DateRange;

#[derive(Parser)]
#[command(name = "timetally")]
#[command(about = "Analyze where your Google Calendar time goes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Google Calendar
    Auth,
    /// List the calendars on the authenticated account
    Calendars,
    /// Fetch events and show the time breakdown
    Analyze {
        /// Start of the range (YYYY-MM-DD)
        #[arg(long, requires = "to", conflicts_with = "period")]
        from: Option<String>,

        /// End of the range (YYYY-MM-DD)
        #[arg(long, requires = "from", conflicts_with = "period")]
        to: Option<String>,

        /// Quick range instead of explicit dates (defaults to this-week)
        #[arg(short, long, value_enum)]
        period: Option<Period>,

        /// Count all-day events too
        #[arg(long)]
        include_all_day: bool,

        /// Drop events shorter than this many minutes
        #[arg(long)]
        min_duration: Option<i64>,

        /// Write a CSV of included events to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the full analysis as JSON to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Print a shareable plain-text summary instead of the full view
        #[arg(long)]
        summary: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Period {
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

impl Period {
    fn to_range(self, today: NaiveDate) -> DateRange {
        match self {
            Period::ThisWeek => DateRange::this_week(today),
            Period::LastWeek => DateRange::last_week(today),
            Period::ThisMonth => DateRange::this_month(today),
            Period::LastMonth => DateRange::last_month(today),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Auth => commands::auth::run().await,
        Commands::Calendars => commands::calendars::run().await,
        Commands::Analyze {
            from,
            to,
            period,
            include_all_day,
            min_duration,
            csv,
            json,
            summary,
        } => {
            let today = Local::now().date_naive();
            let range = match (&from, &to, period) {
                (Some(from), Some(to), _) => DateRange::from_args(from, to)?,
                (_, _, Some(period)) => period.to_range(today),
                _ => DateRange::this_week(today),
            };

            let opts = commands::analyze::Options {
                include_all_day,
                min_duration,
                csv,
                json,
                summary,
            };
            commands::analyze::run(range, opts).await
        }
    }
}
