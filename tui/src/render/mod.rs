//! Segment Rendering
//!
//! Turns the typed content segments of an assistant reply into terminal
//! lines. The renderer writes into an explicit sink (`Vec<Line>`) and is a
//! pure function of the segment sequence: every call rebuilds the message
//! from scratch from the full accumulated text, so a partially-streamed
//! marker that classified wrong on one pass simply heals on the next.
//!
//! - `Command` segments become a single row: a fixed label unit plus the
//!   command text clamped to one visual line (the full text stays on the
//!   display message for inspection).
//! - `Output` segments are verbatim: one line per collected line, no
//!   wrapping, no markup interpretation.
//! - `Prose` segments go through the Markdown converter in [`markdown`],
//!   falling back to entity-escaped plain text if conversion yields
//!   nothing for non-blank input.

pub mod markdown;

use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use shellway_core::{segment_text, ContentSegment};

use crate::theme;

/// Fixed label unit of a command row
const COMMAND_LABEL: &str = " shell ";

/// Re-derive segments from the full accumulated text and render them
pub fn render_message(content: &str, width: u16, sink: &mut Vec<Line<'static>>) {
    render_segments(&segment_text(content), width, sink);
}

/// Render an ordered segment sequence into the sink
pub fn render_segments(segments: &[ContentSegment], width: u16, sink: &mut Vec<Line<'static>>) {
    for segment in segments {
        match segment {
            ContentSegment::Command(command) => sink.push(command_line(command, width)),
            ContentSegment::Output(lines) => {
                for line in lines {
                    sink.push(Line::from(Span::styled(
                        sanitize_verbatim(line),
                        theme::output_block(),
                    )));
                }
            }
            ContentSegment::Prose(lines) => {
                let joined = lines.join("\n");
                if joined.trim().is_empty() {
                    continue;
                }
                let mut rendered = markdown::prose_lines(&joined);
                if rendered.is_empty() {
                    // Conversion produced nothing for non-blank input; never
                    // lose data.
                    rendered = markdown::fallback_lines(&joined);
                }
                // Prose reflows to the view width; output blocks and
                // command rows never do.
                for line in rendered.drain(..) {
                    sink.extend(wrap_line(line, width as usize));
                }
            }
        }
    }
}

/// One command-invocation row: label unit + value unit, one visual line
fn command_line(command: &str, width: u16) -> Line<'static> {
    let label_width = COMMAND_LABEL.width() + 1;
    let budget = (width as usize).saturating_sub(label_width).max(8);
    let value = clamp_to_width(&sanitize_verbatim(command), budget);
    Line::from(vec![
        Span::styled(COMMAND_LABEL.to_string(), theme::command_label()),
        Span::raw(" "),
        Span::styled(value, theme::command_value()),
    ])
}

/// Truncate to a display-cell budget, appending an ellipsis when clipped
fn clamp_to_width(text: &str, budget: usize) -> String {
    if text.width() <= budget {
        return text.to_string();
    }
    let mut clamped = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget.saturating_sub(1) {
            break;
        }
        clamped.push(c);
        used += w;
    }
    clamped.push('…');
    clamped
}

/// Greedy word wrap that keeps span styling intact
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 || line.width() <= width {
        return vec![line];
    }

    let mut wrapped = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    for span in line.spans {
        let style = span.style;
        for token in span.content.split_inclusive(' ') {
            let token_width = token.width();
            if used + token_width > width && used > 0 {
                wrapped.push(Line::from(std::mem::take(&mut current)));
                used = 0;
            }
            if token_width > width {
                // A single token wider than the view: hard-split by cells.
                let mut piece = String::new();
                for c in token.chars() {
                    let w = c.width().unwrap_or(0);
                    if used + w > width && used > 0 {
                        current.push(Span::styled(std::mem::take(&mut piece), style));
                        wrapped.push(Line::from(std::mem::take(&mut current)));
                        used = 0;
                    }
                    piece.push(c);
                    used += w;
                }
                if !piece.is_empty() {
                    current.push(Span::styled(piece, style));
                }
            } else {
                current.push(Span::styled(token.to_string(), style));
                used += token_width;
            }
        }
    }
    if !current.is_empty() {
        wrapped.push(Line::from(current));
    }
    wrapped
}

/// Verbatim text still must not smuggle terminal control sequences
fn sanitize_verbatim(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\t' {
            cleaned.push_str("    ");
        } else if !c.is_control() {
            cleaned.push(c);
        }
    }
    cleaned
}
