pub mod process;
pub mod report;

use std::{env, path::PathBuf, sync::Arc};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use process::{kill_previous_servers, restart_server};
use tracing::level_filters::LevelFilter;

use crate::{
    categorize::Categorizer,
    daemon::{start_daemon, DEFAULT_BACKGROUND_CADENCE, DEFAULT_POLL_INTERVAL},
    storage::store::{ActivityStore, UsageWindow},
    utils::{
        dir::{create_application_default_path, STORE_FILE_NAME},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Tracktivity", version, long_about = None)]
#[command(about = "Application for monitoring window focus and app usage", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Show per-application usage totals")]
    Usage {
        #[arg(long, help = "A single day, formatted as 2025-03-15. Defaults to today")]
        date: Option<NaiveDate>,
        #[arg(long, conflicts_with_all = ["date", "month"], help = "The trailing 7 days")]
        week: bool,
        #[arg(long, conflicts_with_all = ["date", "week"], help = "The trailing 30 days")]
        month: bool,
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Show usage totals grouped by category")]
    Categories {
        #[arg(long, help = "Start day, inclusive")]
        start: Option<NaiveDate>,
        #[arg(long, help = "End day, inclusive")]
        end: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Show per-application details with categories and last window")]
    Apps {
        #[arg(long, help = "A single day. Defaults to the trailing 7 days")]
        date: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Display the activity timeline of one application")]
    Timeline {
        app: String,
        #[arg(long, default_value_t = 7, help = "How many days back to show")]
        days: u32,
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Show the current focus and recently seen applications")]
    Status {
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Assign a category to an application")]
    SetCategory { app: String, category: String },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = create_application_default_path()?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init { dir } => {
            restart_server(dir.as_deref())?;
            Ok(())
        }
        Commands::Stop {} => {
            let process_name = env::current_exe().unwrap();
            kill_previous_servers(&process_name);
            Ok(())
        }
        Commands::Serve { dir } => {
            let dir = dir.unwrap_or(app_dir);
            start_daemon(dir, DEFAULT_POLL_INTERVAL, DEFAULT_BACKGROUND_CADENCE).await?;
            Ok(())
        }
        Commands::Usage {
            date,
            week,
            month,
            json,
        } => {
            let store = open_store(&app_dir)?;
            let (title, window) = if week {
                ("Usage over the last 7 days".to_string(), UsageWindow::LastDays(7))
            } else if month {
                ("Usage over the last 30 days".to_string(), UsageWindow::LastDays(30))
            } else {
                let day = date.unwrap_or_else(|| Local::now().date_naive());
                (format!("Usage for {day}"), UsageWindow::Day(day))
            };
            report::print_usage(&title, &store.usage(window)?, json)
        }
        Commands::Categories { start, end, json } => {
            let store = open_store(&app_dir)?;
            report::print_categories(&store.usage_by_category(start, end)?, json)
        }
        Commands::Apps { date, json } => {
            let store = open_store(&app_dir)?;
            report::print_apps(&store.usage_by_app_with_category(date)?, json)
        }
        Commands::Timeline { app, days, json } => {
            let store = open_store(&app_dir)?;
            report::print_timeline(&app, &store.timeline(&app, days)?, json)
        }
        Commands::Status { json } => {
            let store = open_store(&app_dir)?;
            let (focused, recent) = store.current_status()?;
            report::print_status(&focused, &recent, json)
        }
        Commands::SetCategory { app, category } => {
            let store = Arc::new(open_store(&app_dir)?);
            Categorizer::new(store).add_override(&app, &category)?;
            println!("Assigned {category} to {app}");
            Ok(())
        }
    }
}

fn open_store(app_dir: &std::path::Path) -> Result<ActivityStore> {
    ActivityStore::open(&app_dir.join(STORE_FILE_NAME))
}
