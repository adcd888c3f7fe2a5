// gridcast CLI - sync-core demo harness and one-shot update sender

mod demo;

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use gridcast_client::{HttpSubmitter, RetryPolicy, RetryingSubmitter, UpdateSubmitter};
use gridcast_config::Settings;
use gridcast_core::CellRef;
use gridcast_protocol::SessionUpdate;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;
/// General error.
pub const EXIT_ERROR: u8 = 1;
/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

#[derive(Parser)]
#[command(name = "gridcast")]
#[command(about = "Collaborative grid sync client (demo harness + tools)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the full sync story with two in-process clients
    #[command(after_help = "\
Examples:
  gridcast demo
  gridcast demo --username ada --email ada@example.com --remember
  gridcast demo --verbose")]
    Demo {
        /// Display name for the local participant
        #[arg(long)]
        username: Option<String>,

        /// Email for the local participant
        #[arg(long)]
        email: Option<String>,

        /// Persist username/email to the settings file for next time
        #[arg(long)]
        remember: bool,

        /// Full event logs
        #[arg(long, short)]
        verbose: bool,
    },

    /// Post a one-shot cell update round to a running session service
    #[command(after_help = "\
Examples:
  gridcast send --session 42 --user u-1 A1=10 B1=20
  gridcast send --server http://grid.example.com:5000 --session 42 --user u-1 C3=hello
  gridcast send --session 42 --user u-1 --retries 3 --backoff-ms 500 A1=10")]
    Send {
        /// Session service base URL (defaults to the configured one)
        #[arg(long)]
        server: Option<String>,

        /// Session identifier to address
        #[arg(long)]
        session: String,

        /// Sender user id carried in the update round
        #[arg(long)]
        user: String,

        /// Submission attempts (1 = fire-and-forget, the default)
        #[arg(long, default_value = "1")]
        retries: u32,

        /// Sleep between attempts in milliseconds
        #[arg(long, default_value = "0")]
        backoff_ms: u64,

        /// Cell assignments, `ID=VALUE` (e.g. A1=10)
        #[arg(required = true)]
        cells: Vec<String>,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Demo {
            username,
            email,
            remember,
            verbose,
        } => cmd_demo(username, email, remember, verbose),
        Commands::Send {
            server,
            session,
            user,
            retries,
            backoff_ms,
            cells,
        } => cmd_send(server, session, user, retries, backoff_ms, cells),
    };
    ExitCode::from(code)
}

fn cmd_demo(username: Option<String>, email: Option<String>, remember: bool, verbose: bool) -> u8 {
    let mut settings = Settings::load();

    let username = username
        .or_else(|| settings.username.clone())
        .unwrap_or_else(|| "alice".to_string());
    let email = email
        .or_else(|| settings.email.clone())
        .unwrap_or_else(|| format!("{}@example.com", username));

    if remember {
        settings.username = Some(username.clone());
        settings.email = Some(email.clone());
        if let Err(e) = settings.save() {
            eprintln!("Warning: could not save settings: {}", e);
        }
    }

    match demo::run(&username, &email, verbose) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mDemo failed:\x1b[0m {}", e);
            EXIT_ERROR
        }
    }
}

fn cmd_send(
    server: Option<String>,
    session: String,
    user: String,
    retries: u32,
    backoff_ms: u64,
    cells: Vec<String>,
) -> u8 {
    let server = server.unwrap_or_else(|| Settings::load().server_url);

    let mut entries = Vec::new();
    for assignment in &cells {
        let Some((id, value)) = assignment.split_once('=') else {
            eprintln!("Bad cell assignment '{}' (expected ID=VALUE)", assignment);
            return EXIT_USAGE;
        };
        if CellRef::parse(id).is_none() {
            eprintln!("'{}' is not a cell identifier (expected e.g. A1, AA13)", id);
            return EXIT_USAGE;
        }
        entries.push((id.to_string(), value.to_string()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let update = SessionUpdate {
        session_data: entries,
        sender_id: user,
    };

    let policy = RetryPolicy::fixed(retries, Duration::from_millis(backoff_ms));
    let mut submitter = RetryingSubmitter::new(HttpSubmitter::new(server), policy);

    match submitter.submit(&session, &update) {
        Ok(()) => {
            println!("Sent {} cell(s) to session {}", update.session_data.len(), session);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Submission failed: {}", e);
            EXIT_ERROR
        }
    }
}
