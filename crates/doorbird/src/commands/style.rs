//! Terminal styling for command output.

use std::io::IsTerminal;

use owo_colors::{OwoColorize, Style};

fn should_color() -> bool {
    std::io::stdout().is_terminal()
}

fn render(text: &str, style: Style, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_owned()
    }
}

fn paint(text: impl AsRef<str>, style: Style) -> String {
    render(text.as_ref(), style, should_color())
}

pub fn success(text: impl AsRef<str>) -> String {
    paint(text, Style::new().green())
}

pub fn warning(text: impl AsRef<str>) -> String {
    paint(text, Style::new().yellow())
}

pub fn accent(text: impl AsRef<str>) -> String {
    paint(text, Style::new().cyan())
}

pub fn dim(text: impl AsRef<str>) -> String {
    paint(text, Style::new().dimmed())
}
