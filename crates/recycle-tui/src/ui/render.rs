use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, Screen};

use super::styles;

/// Width of the login form column
const FORM_WIDTH: u16 = 44;

/// Visible width of a text field's content
const FIELD_WIDTH: usize = 34;

const LOGO: [&str; 3] = [
    "  ╦═╗╔═╗╔═╗╦ ╦╔═╗╦  ╔═╗",
    "  ╠╦╝║╣ ║  ╚╦╝║  ║  ║╣ ",
    "  ╩╚═╚═╝╚═╝ ╩ ╚═╝╩═╝╚═╝",
];

pub fn render(frame: &mut Frame, app: &App) {
    frame.render_widget(Block::default().style(styles::screen_style()), frame.area());

    match app.screen {
        Screen::Login => render_login_screen(frame, app),
        Screen::Register => render_register_screen(frame),
        Screen::Main => render_main_screen(frame, app),
    }

    // Render overlays
    if app.alert().is_some() {
        render_alert_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|row| Line::from(Span::styled(*row, styles::title_style())))
        .collect()
}

fn render_login_screen(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(FORM_WIDTH, 22, frame.area());

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Login to Your Account",
        styles::title_style(),
    )));
    lines.push(Line::from(""));

    let email_text = if app.login_email.is_empty() {
        None
    } else {
        Some(tail(&app.login_email, FIELD_WIDTH))
    };
    lines.extend(field_lines(
        "@",
        email_text,
        "Enter your Email",
        "",
        app.login_focus == LoginFocus::Email,
    ));
    lines.push(Line::from(""));

    // Password field with the show/hide toggle on the right
    let eye = if app.show_password { " ◉" } else { " ○" };
    let password_width = FIELD_WIDTH - eye.chars().count();
    let password_text = if app.login_password.is_empty() {
        None
    } else if app.show_password {
        Some(tail(&app.login_password, password_width))
    } else {
        Some("•".repeat(app.login_password.chars().count().min(password_width)))
    };
    lines.extend(field_lines(
        "*",
        password_text,
        "Enter your Password",
        eye,
        app.login_focus == LoginFocus::Password,
    ));
    lines.push(Line::from(""));

    // Login button
    let button_label = if app.is_loading() {
        format!("      {}      ", app.spinner())
    } else {
        "    Login    ".to_string()
    };
    lines.push(Line::from(Span::styled(
        button_label,
        styles::button_style(app.login_focus == LoginFocus::Button),
    )));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "Don't have an account? Sign up",
        styles::link_style(app.login_focus == LoginFocus::SignUp),
    )));
    lines.push(Line::from(""));

    let footer = if app.flow.redirect_pending() {
        "Signing you in...".to_string()
    } else if let Some(ref msg) = app.status_message {
        msg.clone()
    } else {
        "Tab move · Enter select · Ctrl+R show · Esc quit".to_string()
    };
    lines.push(Line::from(Span::styled(footer, styles::muted_style())));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(styles::screen_style());
    frame.render_widget(paragraph, area);
}

/// Three lines of a bordered input box: top border, content, bottom border
fn field_lines(
    icon: &str,
    value: Option<String>,
    placeholder: &str,
    suffix: &str,
    focused: bool,
) -> Vec<Line<'static>> {
    let border = styles::field_border_style(focused);
    let cursor = if focused { "▌" } else { " " };
    let (text, style) = match value {
        Some(v) => (v, styles::field_style()),
        None => (placeholder.to_string(), styles::placeholder_style()),
    };
    // " icon " + text + cursor + suffix
    let inner_width = FIELD_WIDTH + 4;
    let text_width = FIELD_WIDTH - suffix.chars().count();
    let padded = format!("{:<width$}", text, width = text_width);

    vec![
        Line::from(Span::styled(format!("┌{}┐", "─".repeat(inner_width)), border)),
        Line::from(vec![
            Span::styled("│", border),
            Span::styled(format!(" {} ", icon), styles::field_style()),
            Span::styled(padded, style),
            Span::styled(cursor.to_string(), styles::field_style()),
            Span::styled(suffix.to_string(), styles::field_style()),
            Span::styled("│", border),
        ]),
        Line::from(Span::styled(format!("└{}┘", "─".repeat(inner_width)), border)),
    ]
}

/// Keep the end of `text` visible when it is wider than the field
fn tail(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        text.to_string()
    } else {
        text.chars().skip(count - width).collect()
    }
}

fn render_register_screen(frame: &mut Frame) {
    let area = centered_rect_fixed(FORM_WIDTH, 12, frame.area());

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Create an Account", styles::title_style())));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Registration is done from the mobile app.",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Press ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" to return to login", styles::muted_style()),
    ]));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(styles::screen_style());
    frame.render_widget(paragraph, area);
}

fn render_main_screen(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(FORM_WIDTH, 10, frame.area());

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("You're signed in", styles::title_style())));
    if let Some(ref email) = app.config.last_email {
        lines.push(Line::from(Span::styled(email.clone(), styles::muted_style())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Press ", styles::muted_style()),
        Span::styled("q", styles::help_key_style()),
        Span::styled(" to quit", styles::muted_style()),
    ]));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(styles::screen_style());
    frame.render_widget(paragraph, area);
}

fn render_alert_overlay(frame: &mut Frame, app: &App) {
    let Some(alert) = app.alert() else {
        return;
    };
    let area = centered_rect_fixed(40, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(alert.message(), styles::dialog_style())),
        Line::from(""),
        Line::from(Span::styled("[ OK ]", styles::error_style())),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {} ", alert.title()), styles::error_style()))
        .style(styles::dialog_style());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 7, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Are you sure you want to quit?",
            styles::dialog_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", styles::dialog_style()),
            Span::styled("[Y]", styles::error_style()),
            Span::styled(" to quit, ", styles::dialog_style()),
            Span::styled("[N]", styles::error_style()),
            Span::styled(" to cancel", styles::dialog_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .style(styles::dialog_style());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
