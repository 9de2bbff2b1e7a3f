//! Theme and Colors
//!
//! Shellway's terminal palette. Muted body text with a clearly separated
//! treatment for the shell annotation rows, so command invocations and
//! their captured output read apart from ordinary prose.

use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Roles
// ============================================================================

/// User input green
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// Assistant accent
pub const ASSISTANT_CYAN: Color = Color::Rgb(120, 200, 230);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

// ============================================================================
// Segment styles
// ============================================================================

/// Label unit of a command-invocation row
#[must_use]
pub fn command_label() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Rgb(230, 190, 80))
        .add_modifier(Modifier::BOLD)
}

/// Value unit of a command-invocation row
#[must_use]
pub fn command_value() -> Style {
    Style::default()
        .fg(Color::Rgb(230, 210, 140))
        .add_modifier(Modifier::BOLD)
}

/// Verbatim command-output block
#[must_use]
pub fn output_block() -> Style {
    Style::default().fg(Color::Rgb(150, 150, 150))
}

// ============================================================================
// Prose (markdown) styles
// ============================================================================

/// Headings
#[must_use]
pub fn heading() -> Style {
    Style::default()
        .fg(ASSISTANT_CYAN)
        .add_modifier(Modifier::BOLD)
}

/// Inline code and code blocks
#[must_use]
pub fn code() -> Style {
    Style::default().fg(Color::Rgb(220, 170, 120))
}

/// Block quotes
#[must_use]
pub fn quote() -> Style {
    Style::default()
        .fg(DIM_GRAY)
        .add_modifier(Modifier::ITALIC)
}
