//! petdesk - a terminal front end for the pet API.
//!
//! Sign in or register, then list, add, edit and delete dogs and view the
//! cats resource. The bearer token is kept in the configured credential store
//! between runs.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use petdesk_core::models::LoginRequest;
use petdesk_core::{ApiClient, Config, Session};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState, Screen};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name in the cache directory
const LOG_FILE: &str = "petdesk.log";

const USAGE: &str = "\
Usage: petdesk [COMMAND]

Without a command, starts the terminal UI.

Commands:
  --login <email>   Sign in (prompts for the password) and store the token
  --logout          Remove the stored token
  --help            Show this message

Environment:
  PETDESK_API_URL   API base URL (default http://localhost:3000)
  RUST_LOG          Log filter, e.g. RUST_LOG=debug";

/// Initialize the tracing subscriber, writing to a file so the UI stays clean.
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let log_dir = config.cache_dir()?;
    std::fs::create_dir_all(&log_dir).context("Failed to create cache directory")?;
    let _guard = init_tracing(&log_dir);

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some("--login") => {
            let email = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("--login requires an email\n\n{}", USAGE))?;
            return login_command(config, email).await;
        }
        Some("--logout") => return logout_command(&config),
        Some(other) => {
            return Err(anyhow::anyhow!("Unknown argument: {}\n\n{}", other, USAGE));
        }
        None => {}
    }

    info!("petdesk starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = match App::new() {
        Ok(mut app) => {
            // Protected screens redirect to login when no token is stored
            app.navigate(Screen::Dogs).await;
            run_app(&mut terminal, &mut app).await
        }
        Err(e) => Err(e),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("petdesk shutting down");
    Ok(())
}

/// Sign in from the command line and store the token.
async fn login_command(mut config: Config, email: &str) -> Result<()> {
    let store = config.open_credential_store()?;
    let session = Session::new(store.clone());
    let api = ApiClient::from_config(&config, store)?;

    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    let auth = api
        .login(&LoginRequest::new(email, password))
        .await
        .with_context(|| format!("Login to {} failed", api.base_url()))?;
    let user = session.begin(&auth);
    eprintln!("Signed in as {}", user.display_name());

    config.last_email = Some(email.to_string());
    config.save()?;
    Ok(())
}

fn logout_command(config: &Config) -> Result<()> {
    let session = Session::new(config.open_credential_store()?);
    session.end();
    eprintln!("Signed out");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
