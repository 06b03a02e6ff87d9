//! recycle - terminal login client for the recycle app.
//!
//! Shows the login screen, signs the user in against the recycle backend
//! and keeps the session token for the next start.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use recycle_core::{ApiClient, Config, Credentials, LoginFlow, Route, Session, SubmitOutcome};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the data directory
const LOG_FILE_PREFIX: &str = "recycle.log";

const USAGE: &str = "Usage: recycle [--login | --logout | --help]

  (no args)   Open the login screen
  --login     Sign in from the command line
  --logout    Remove the stored session token";

/// What the command line asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Tui,
    Login,
    Logout,
    Help,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args.get(1).map(String::as_str) {
        None => Ok(Command::Tui),
        Some("--login") => Ok(Command::Login),
        Some("--logout") => Ok(Command::Logout),
        Some("--help") | Some("-h") => Ok(Command::Help),
        Some(other) => Err(anyhow::anyhow!("Unknown argument: {}", other)),
    }
}

/// Initialize the tracing subscriber for logging.
///
/// The TUI owns the terminal, so logs go to a daily file in the data
/// directory. Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(data_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = std::fs::create_dir_all(data_dir);
    let file_appender = tracing_appender::rolling::daily(data_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

fn load_config() -> Config {
    match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    }
}

/// API client for the configured backend. RECYCLE_API_URL wins over config
/// without being written back to it.
fn api_client(config: &Config) -> Result<ApiClient> {
    match std::env::var("RECYCLE_API_URL") {
        Ok(url) => ApiClient::with_base_url(&url),
        Err(_) => ApiClient::with_base_url(config.api_base_url()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let data_dir = Config::data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
    let log_guard = init_tracing(&data_dir);

    let args: Vec<String> = std::env::args().collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Bad command line");
            eprintln!("{}\n\n{}", e, USAGE);
            // exit() skips destructors; flush the log writer first
            drop(log_guard);
            std::process::exit(2);
        }
    };

    let config = load_config();
    let session = Session::new(config.open_store(&data_dir));

    match command {
        Command::Tui => {}
        Command::Logout => return logout(&session),
        Command::Login => return login_interactive(config, session).await,
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
    }

    info!("recycle starting");

    let api = api_client(&config)?;
    let flow = LoginFlow::new(api, session, config.redirect_delay());
    let config_path = Config::config_path().ok();
    let mut app = App::new(config, flow, config_path).with_prefill(
        std::env::var("RECYCLE_EMAIL").ok(),
        std::env::var("RECYCLE_PASSWORD").ok(),
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start_login();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;
    app.flow.finish_pending_writes().await;

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

    info!("recycle shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks(Instant::now());

        // Let spawned tasks make progress between frames
        tokio::task::yield_now().await;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Remove the stored session token
fn logout(session: &Session) -> Result<()> {
    session.clear()?;
    info!("Session token removed");
    println!("Signed out.");
    Ok(())
}

/// Command-line login, same flow as the login screen
async fn login_interactive(mut config: Config, session: Session) -> Result<()> {
    if session.is_signed_in()? {
        println!("Already signed in. Use --logout to sign out first.");
        return Ok(());
    }

    println!("\n=== Login to Your Account ===\n");

    let email = prompt_email(config.last_email.as_deref())?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let credentials = Credentials::new(email, password);
    let normalized = credentials.normalized_email();

    let api = api_client(&config)?;
    let mut flow = LoginFlow::new(api, session, config.redirect_delay());
    flow.activate();
    // Session check result; no token was found above
    flow.wait_for_update().await;

    match flow.submit(credentials) {
        SubmitOutcome::Submitted => {}
        SubmitOutcome::Rejected(e) => {
            eprintln!("Validation Error: {}", e);
            return Ok(());
        }
        SubmitOutcome::Busy | SubmitOutcome::Inactive => {
            return Err(anyhow::anyhow!("Login flow not ready"));
        }
    }

    println!("\nLogging in...");

    match flow.wait_for_update().await {
        Some(Route::Main) => {
            flow.finish_pending_writes().await;
            config.last_email = Some(normalized);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Login successful!\n");
        }
        _ => {
            if let Some(alert) = flow.alert() {
                eprintln!("{}: {}", alert.title(), alert.message());
            }
        }
    }
    flow.deactivate();
    Ok(())
}

fn prompt_email(last_email: Option<&str>) -> Result<String> {
    match last_email {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match last_email {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    })
}
