use ratatui::style::{Color, Modifier, Style};

// Color palette
pub const BACKGROUND: Color = Color::Rgb(84, 124, 92);
pub const CREAM: Color = Color::Rgb(251, 251, 218);
pub const LEAF: Color = Color::Rgb(76, 124, 84);
pub const FIELD_BORDER: Color = Color::Rgb(208, 208, 208);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(200, 210, 190);

// Styles
pub fn screen_style() -> Style {
    Style::default().bg(BACKGROUND).fg(CREAM)
}

pub fn title_style() -> Style {
    Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

/// Text input box: white field, green text
pub fn field_style() -> Style {
    Style::default().bg(Color::White).fg(LEAF)
}

pub fn field_border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(FIELD_BORDER)
    }
}

pub fn placeholder_style() -> Style {
    Style::default().bg(Color::White).fg(Color::Black)
}

pub fn button_style(focused: bool) -> Style {
    let style = Style::default().bg(CREAM).fg(LEAF).add_modifier(Modifier::BOLD);
    if focused {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

pub fn link_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(CREAM).add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
    } else {
        Style::default().fg(CREAM)
    }
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR).add_modifier(Modifier::BOLD)
}

pub fn dialog_style() -> Style {
    Style::default().bg(Color::White).fg(Color::Black)
}

pub fn help_key_style() -> Style {
    Style::default().fg(CREAM).add_modifier(Modifier::BOLD)
}
