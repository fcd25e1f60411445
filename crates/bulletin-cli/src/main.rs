use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bulletin_core::{dispatch::Dispatcher, schedule::Frequency, storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "bulletin")]
#[command(author, version, about = "Schedule and send a news digest newsletter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage newsletter recipients
    Recipients {
        #[command(subcommand)]
        action: RecipientsAction,
    },
    /// Show or change the delivery schedule
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Send the newsletter now, ignoring the schedule
    Send,
    /// Evaluate the schedule once and send if due (for cron)
    Tick,
    /// Evaluate the schedule continuously until Ctrl+C
    Daemon,
    /// Show past dispatches
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Entries per page
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Render the newsletter to an HTML file
    Preview {
        /// Output file
        #[arg(short, long, default_value = "newsletter_preview.html")]
        output: PathBuf,
        /// Fetch live articles instead of the built-in samples
        #[arg(long)]
        live: bool,
    },
}

#[derive(Subcommand)]
enum RecipientsAction {
    /// Add a recipient
    Add { email: String },
    /// List recipients
    List {
        /// Include inactive recipients
        #[arg(long)]
        all: bool,
    },
    /// Remove a recipient
    Remove { email: String },
    /// Resume deliveries to a recipient
    Activate { email: String },
    /// Pause deliveries to a recipient
    Deactivate { email: String },
}

#[derive(Subcommand)]
enum ScheduleAction {
    /// Show the current schedule
    Show,
    /// Replace the schedule
    Set {
        /// minute, daily, weekly or monthly
        #[arg(short, long)]
        frequency: Frequency,
        /// Local time of day, HH:MM
        #[arg(short, long, default_value = "09:00")]
        time: String,
        /// 0 = Monday .. 6 = Sunday (weekly)
        #[arg(long)]
        day_of_week: Option<u8>,
        /// 1..31 (monthly)
        #[arg(long)]
        day_of_month: Option<u8>,
        /// Save the schedule switched off
        #[arg(long)]
        inactive: bool,
    },
    /// Switch the schedule on
    Enable,
    /// Switch the schedule off
    Disable,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Show one dispatch in full
    Show { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands must work before a valid config exists
    let command = match cli.command {
        Commands::Config { action } => {
            return match action {
                ConfigAction::Path => commands::config::path(),
                ConfigAction::Init { force } => commands::config::init(force),
            };
        }
        other => other,
    };

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Initialize database
    let db = Arc::new(Database::new(&config).await?);

    match command {
        Commands::Recipients { action } => match action {
            RecipientsAction::Add { email } => commands::recipients::add(&db, &email).await,
            RecipientsAction::List { all } => commands::recipients::list(&db, all).await,
            RecipientsAction::Remove { email } => commands::recipients::remove(&db, &email).await,
            RecipientsAction::Activate { email } => {
                commands::recipients::set_active(&db, &email, true).await
            }
            RecipientsAction::Deactivate { email } => {
                commands::recipients::set_active(&db, &email, false).await
            }
        },
        Commands::Schedule { action } => match action {
            ScheduleAction::Show => commands::schedule::show(&db).await,
            ScheduleAction::Set {
                frequency,
                time,
                day_of_week,
                day_of_month,
                inactive,
            } => {
                commands::schedule::set(&db, frequency, time, day_of_week, day_of_month, !inactive)
                    .await
            }
            ScheduleAction::Enable => commands::schedule::set_active(&db, true).await,
            ScheduleAction::Disable => commands::schedule::set_active(&db, false).await,
        },
        Commands::Send => {
            let dispatcher = Dispatcher::from_config(&config)?;
            commands::send::run(&db, &dispatcher).await
        }
        Commands::Tick => {
            let dispatcher = Dispatcher::from_config(&config)?;
            commands::tick::run(&db, &dispatcher).await
        }
        Commands::Daemon => {
            let dispatcher = Dispatcher::from_config(&config)?;
            commands::daemon::start(db, dispatcher, config).await
        }
        Commands::History {
            action,
            page,
            per_page,
        } => match action {
            Some(HistoryAction::Show { id }) => commands::history::show(&db, &id).await,
            None => commands::history::list(&db, page, per_page).await,
        },
        Commands::Preview { output, live } => commands::preview::run(&config, &output, live).await,
        Commands::Config { .. } => Ok(()),
    }
}
