use std::path::PathBuf;

use calvault_app::commands;
use calvault_core::config::load_config;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calvault")]
#[command(about = "Inspect calendar events the way the envelope layer sees them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the occurrences of an event between two days
    Expand {
        /// File holding a VEVENT or a VCALENDAR with one
        file: PathBuf,

        /// First day of the query (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Day the query ends on, at midnight UTC (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
    /// Print the server-side attendee records of an event as JSON
    Attendees {
        file: PathBuf,
    },
    /// Derive the correlation token of one attendee
    Token {
        #[arg(long)]
        uid: String,

        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    let config = load_config()?;

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    match cli.command {
        Commands::Expand { file, from, to } => {
            let ics = commands::read_ics(&file).await?;
            let from = commands::parse_day(&from)?;
            let to = commands::parse_day(&to)?;
            let occurrences = commands::expand(&ics, from, to, &config.recurrence)?;
            tracing::info!(file = %file.display(), count = occurrences.len(), "Expanded event");
            for occurrence in occurrences {
                println!(
                    "#{}\t{}\t{}\t{}",
                    occurrence.occurrence_number,
                    occurrence.utc_start.to_rfc3339(),
                    occurrence.utc_end.to_rfc3339(),
                    occurrence.local_start,
                );
            }
        }
        Commands::Attendees { file } => {
            let ics = commands::read_ics(&file).await?;
            let records = commands::attendee_records(&ics)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Token { uid, email } => {
            println!("{}", commands::token(&uid, &email));
        }
    }

    Ok(())
}
