//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{can_add_email_char, can_add_password_char, App, AppState, LoginFocus, Screen};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.screen {
        Screen::Login => handle_login_input(app, key),
        Screen::Register => handle_register_input(app, key),
        Screen::Main => handle_main_input(app, key),
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // An open alert swallows everything until dismissed
    if app.alert().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return Ok(false);
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('r') {
            app.toggle_password_visibility();
        }
        return Ok(false);
    }

    match key.code {
        KeyCode::Esc => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password => {
                app.login_focus = LoginFocus::Button;
            }
            LoginFocus::Button => {
                // Result lands via check_background_tasks
                app.attempt_login();
            }
            LoginFocus::SignUp => {
                app.sign_up();
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button | LoginFocus::SignUp => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button | LoginFocus::SignUp => {
                // Ignore character input on buttons
            }
        },
        _ => {}
    }
    Ok(false)
}

fn handle_register_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace => {
            app.start_login();
        }
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        _ => {}
    }
    Ok(false)
}

fn handle_main_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        app.state = AppState::ConfirmingQuit;
    }
    Ok(false)
}
