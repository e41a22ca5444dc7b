//! cal-server: calendar reminder service binary
//!
//! Boots the stores and the background reminder scheduler, then waits for
//! Ctrl+C.
//!
//! Usage:
//!   cal-server           - Start the service
//!   cal-server --help    - Show help

use std::sync::{Arc, Mutex};

use cal_core::store::{CalendarStore, EventStore, NotificationLedger, UserStore};
use cal_core::Config;
use cal_email::EmailSender;
use cal_reminder::{ReminderScheduler, ScanContext};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    Serve,
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("cal-server {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Serve => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting cal-server...");

    if let Some(dir) = std::path::Path::new(&config.storage.db_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let db_path = &config.storage.db_path;
    let ctx = ScanContext {
        events: Arc::new(Mutex::new(EventStore::new(db_path)?)),
        calendars: Arc::new(Mutex::new(CalendarStore::new(db_path)?)),
        users: Arc::new(Mutex::new(UserStore::new(db_path)?)),
        ledger: Arc::new(Mutex::new(NotificationLedger::new(db_path)?)),
        mailer: Arc::new(
            EmailSender::new(config.mail.clone())
                .map_err(|e| anyhow::anyhow!("Mailer error: {}", e))?,
        ),
    };
    tracing::info!("Stores opened at {}", db_path);

    // Disabling reminders is a boot-time choice: we simply never construct
    // a scheduler
    let scheduler = if config.reminders.enabled {
        let handle = ReminderScheduler::new(config.reminders.clone(), ctx).start();
        Some(handle)
    } else {
        tracing::info!("Reminder scheduler disabled by configuration");
        None
    };

    tracing::info!("cal-server initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    if let Some(handle) = scheduler {
        handle.stop().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }
    RunMode::Serve
}

/// Print help message
fn print_help() {
    println!("cal-server - calendar reminder service");
    println!();
    println!("Usage:");
    println!("  cal-server           Start the service");
    println!("  cal-server --help    Show this help message");
    println!("  cal-server --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  REMINDERS_ENABLED       Run the reminder scheduler (default: true)");
    println!("  REMINDER_INTERVAL_SECS  Seconds between scan cycles (default: 60)");
    println!("  REMINDER_LEEWAY_SECS    Scan window jitter buffer (default: 5)");
    println!("  APP_BASE_URL            Base URL for email deep links");
    println!("  DB_PATH                 SQLite database path (default: data/cal-server.db)");
    println!("  SMTP_HOST / SMTP_PORT   Outgoing mail server");
    println!("  SMTP_USER / SMTP_PASS   Outgoing mail credentials");
    println!("  MAIL_FROM               From address for reminder emails");
}
