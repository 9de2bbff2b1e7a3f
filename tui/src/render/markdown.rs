//! Prose Conversion
//!
//! Converts the lightweight markup in prose segments (headings, emphasis,
//! lists, code spans and blocks, single-newline line breaks) into styled
//! terminal lines.
//!
//! Sanitization happens here: raw HTML from the markup stream is rendered
//! as escaped literal text, never interpreted, and control characters are
//! stripped from every span so streamed reply text cannot smuggle terminal
//! escape sequences into the view. Callers that cannot use the converted
//! output fall back to [`fallback_lines`], which is plain entity-escaped
//! text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::theme;

/// Convert one prose segment's markup to terminal lines
#[must_use]
pub fn prose_lines(markdown: &str) -> Vec<Line<'static>> {
    let mut writer = MarkdownWriter::new();
    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        writer.handle(event);
    }
    writer.finish()
}

/// Entity-escape the characters that carry markup meaning: `& < > "`
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Plain-text fallback: entity-escaped lines, no markup interpretation
#[must_use]
pub fn fallback_lines(text: &str) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::from(Span::raw(strip_control(&escape_text(line)))))
        .collect()
}

/// Drop control characters; tabs become spaces
fn strip_control(text: &str) -> String {
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

/// Builds terminal lines from the markup event stream
struct MarkdownWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    /// Style stack; the top applies to incoming text
    styles: Vec<Style>,
    /// One entry per open list; `Some(n)` is the next ordinal
    list_stack: Vec<Option<u64>>,
    /// Marker to emit at the start of the current item's first line
    pending_marker: Option<String>,
    quote_depth: usize,
    in_code_block: bool,
    line_open: bool,
}

impl MarkdownWriter {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            styles: Vec::new(),
            list_stack: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            in_code_block: false,
            line_open: false,
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(&tag),
            Event::End(tag) => self.end_tag(&tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.push_code_text(&text);
                } else {
                    self.push_text(&text, self.current_style());
                }
            }
            Event::Code(code) => self.push_text(&code, theme::code()),
            // Sanitization: raw markup is shown escaped, never interpreted.
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_text(&escape_text(&html), self.current_style());
            }
            Event::SoftBreak | Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.start_block();
                self.push_text("────────────", Style::default().fg(theme::DIM_GRAY));
                self.flush_line();
            }
            Event::TaskListMarker(done) => {
                let mark = if done { "[x] " } else { "[ ] " };
                self.push_text(mark, self.current_style());
            }
            Event::FootnoteReference(reference) => {
                self.push_text(&format!("[{reference}]"), self.current_style());
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: &Tag) {
        match tag {
            Tag::Paragraph => {
                if self.list_stack.is_empty() {
                    self.start_block();
                } else {
                    self.flush_line();
                }
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                self.styles.push(theme::heading());
                let marks = "#".repeat(heading_rank(*level));
                self.push_text(&format!("{marks} "), theme::heading());
            }
            Tag::BlockQuote => {
                self.start_block();
                self.quote_depth += 1;
                self.styles.push(theme::quote());
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.list_stack.is_empty() {
                    self.start_block();
                } else {
                    self.flush_line();
                }
                self.list_stack.push(*start);
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.list_stack.last_mut() {
                    Some(Some(ordinal)) => {
                        let marker = format!("{ordinal}. ");
                        *ordinal += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            Tag::Emphasis => self.push_style(Modifier::ITALIC),
            Tag::Strong => self.push_style(Modifier::BOLD),
            Tag::Strikethrough => self.push_style(Modifier::CROSSED_OUT),
            Tag::Link { .. } | Tag::Image { .. } => self.push_style(Modifier::UNDERLINED),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: &TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Item => self.flush_line(),
            TagEnd::Heading(_) => {
                self.flush_line();
                self.styles.pop();
            }
            TagEnd::BlockQuote => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.styles.pop();
            }
            TagEnd::CodeBlock => {
                self.flush_line();
                self.in_code_block = false;
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => {
                self.styles.pop();
            }
            _ => {}
        }
    }

    fn current_style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, modifier: Modifier) {
        self.styles.push(self.current_style().add_modifier(modifier));
    }

    /// Begin the current visual line if needed, emitting quote/list prefixes
    fn ensure_line(&mut self) {
        if self.line_open {
            return;
        }
        self.line_open = true;

        let mut prefix = String::new();
        for _ in 0..self.quote_depth {
            prefix.push_str("> ");
        }
        if !self.list_stack.is_empty() {
            let depth = self.list_stack.len();
            if let Some(marker) = self.pending_marker.take() {
                prefix.push_str(&"  ".repeat(depth - 1));
                prefix.push_str(&marker);
            } else {
                prefix.push_str(&"  ".repeat(depth));
            }
        }
        if !prefix.is_empty() {
            let style = if self.quote_depth > 0 {
                theme::quote()
            } else {
                Style::default()
            };
            self.current.push(Span::styled(prefix, style));
        }
    }

    fn push_text(&mut self, text: &str, style: Style) {
        self.ensure_line();
        self.current.push(Span::styled(strip_control(text), style));
    }

    /// Code block text arrives with embedded newlines; keep it verbatim
    fn push_code_text(&mut self, text: &str) {
        let mut parts = text.split('\n').peekable();
        let mut first = true;
        while let Some(part) = parts.next() {
            if !first {
                self.flush_line();
            }
            first = false;
            if parts.peek().is_none() && part.is_empty() {
                // Trailing newline of the block, not an extra empty line.
                break;
            }
            self.ensure_line();
            self.current.push(Span::styled(strip_control(part), theme::code()));
        }
    }

    fn flush_line(&mut self) {
        if self.line_open || !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
            self.line_open = false;
        }
    }

    /// Blank separator line between blocks
    fn start_block(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

fn heading_rank(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
