//! Application state management for the recycle TUI.
//!
//! This module contains the `App` struct: which screen is showing, the
//! login form fields, and the glue between the form and `LoginFlow`.

use std::path::PathBuf;
use std::time::Instant;

use recycle_core::{Config, Credentials, LoginAlert, LoginFlow, Route, SubmitOutcome};
use tracing::{debug, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for email input (RFC 5321 path limit)
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input
const MAX_PASSWORD_LENGTH: usize = 128;

/// Zero-width no-break space; invisible, so it never belongs in an email
const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Busy indicator frames, advanced once per tick while a login is in flight
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

// ============================================================================
// UI State Types
// ============================================================================

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    /// The authenticated area
    Main,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
    SignUp,
}

impl LoginFocus {
    /// Get the next control (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::SignUp,
            LoginFocus::SignUp => LoginFocus::Email,
        }
    }

    /// Get the previous control (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::SignUp,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Button => LoginFocus::Password,
            LoginFocus::SignUp => LoginFocus::Button,
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,
    /// Where to persist `config`; `None` keeps it in memory only
    config_path: Option<PathBuf>,
    pub flow: LoginFlow,

    pub screen: Screen,
    pub state: AppState,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub show_password: bool,

    /// Email of the request in flight, remembered in config on success
    submitted_email: Option<String>,
    pub spinner_frame: usize,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Config, flow: LoginFlow, config_path: Option<PathBuf>) -> Self {
        let login_email = config.last_email.clone().unwrap_or_default();
        Self {
            config,
            config_path,
            flow,
            screen: Screen::Login,
            state: AppState::Normal,
            login_email,
            login_password: String::new(),
            login_focus: LoginFocus::Email,
            show_password: false,
            submitted_email: None,
            spinner_frame: 0,
            status_message: None,
        }
    }

    /// Prefill the form, e.g. from environment variables
    pub fn with_prefill(mut self, email: Option<String>, password: Option<String>) -> Self {
        if let Some(email) = email {
            self.login_email = email;
        }
        if let Some(password) = password {
            self.login_password = password;
        }
        self
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Show the login screen and start the stored-session check
    pub fn start_login(&mut self) {
        self.screen = Screen::Login;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.status_message = None;
        self.flow.activate();
    }

    /// Leave the login screen for `route`
    pub fn navigate(&mut self, route: Route) {
        self.flow.deactivate();
        match route {
            Route::Main => {
                self.login_password.clear();
                if let Some(email) = self.submitted_email.take() {
                    self.remember_email(email);
                }
                self.screen = Screen::Main;
                self.status_message = None;
                info!("Entered main area");
            }
            Route::Register => {
                self.submitted_email = None;
                self.screen = Screen::Register;
                debug!("Opened registration screen");
            }
        }
    }

    /// "Don't have an account? Sign up"
    pub fn sign_up(&mut self) {
        self.navigate(Route::Register);
    }

    fn remember_email(&mut self, email: String) {
        self.config.last_email = Some(email);
        if let Some(ref path) = self.config_path {
            if let Err(e) = self.config.save_to(path) {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    // =========================================================================
    // Login form
    // =========================================================================

    /// Submit the login form
    pub fn attempt_login(&mut self) -> SubmitOutcome {
        let credentials = Credentials::new(self.login_email.clone(), self.login_password.clone());
        let email = credentials.normalized_email();
        let outcome = self.flow.submit(credentials);
        match outcome {
            SubmitOutcome::Submitted => {
                self.submitted_email = Some(email);
                self.spinner_frame = 0;
                self.status_message = None;
            }
            SubmitOutcome::Busy => {
                self.status_message = Some("Login already in progress...".to_string());
            }
            SubmitOutcome::Rejected(_) | SubmitOutcome::Inactive => {}
        }
        outcome
    }

    pub fn toggle_password_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    pub fn alert(&self) -> Option<LoginAlert> {
        if self.screen == Screen::Login {
            self.flow.alert()
        } else {
            None
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.flow.dismiss_alert();
    }

    pub fn is_loading(&self) -> bool {
        self.screen == Screen::Login && self.flow.is_loading()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    // =========================================================================
    // Background work
    // =========================================================================

    /// Check for completed background tasks and apply navigation
    pub fn check_background_tasks(&mut self, now: Instant) {
        if self.screen != Screen::Login {
            return;
        }
        if self.flow.is_loading() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
        if let Some(route) = self.flow.tick(now) {
            self.navigate(route);
        } else if !self.flow.is_loading() {
            // Request finished without success; nothing to remember
            self.submitted_email = None;
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH
        && is_valid_input_char(c)
        && !c.is_whitespace()
        && c != BYTE_ORDER_MARK
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
