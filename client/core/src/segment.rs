//! Content Segmentation
//!
//! The assistant's reply interleaves prose with shell-tool annotations the
//! server injects mid-stream: a command-invocation line, then a block of
//! captured output bracketed by begin/end markers. This module partitions
//! the full accumulated reply text into an ordered sequence of typed
//! segments so the surface can render each kind differently.
//!
//! Segmentation is re-derived from the entire accumulated text after every
//! delta rather than patched incrementally. A marker arriving split across
//! two deltas classifies wrong for one render pass and heals on the next
//! full scan - there is no stale-partial-tag state to invalidate.

/// Marker prefix of a command-invocation line (trailing space included)
pub const COMMAND_PREFIX: &str = "[执行 Shell] ";

/// Marker opening a block of captured command output
pub const OUTPUT_BEGIN: &str = "[Shell 输出]";

/// Marker closing a block of captured command output
pub const OUTPUT_END: &str = "[Shell 输出结束]";

/// A classified, contiguous span of the accumulated assistant text
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentSegment {
    /// A shell command the assistant invoked
    Command(String),
    /// Captured command output, verbatim lines
    Output(Vec<String>),
    /// Ordinary reply text, to be rendered as rich content
    Prose(Vec<String>),
}

/// Partition accumulated reply text into ordered content segments
///
/// One left-to-right scan over the lines. Prose lines collect into an
/// accumulator that is flushed whenever a marker line starts a Command or
/// Output segment, and again at end of input. Output collection is ended by
/// the end marker (consumed), by a line starting a new Command or Output
/// segment (left for the outer scan to re-examine), or by running out of
/// input.
#[must_use]
pub fn segment_text(text: &str) -> Vec<ContentSegment> {
    let lines: Vec<&str> = text.lines().collect();
    let mut segments = Vec::new();
    let mut prose: Vec<String> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(command) = line.strip_prefix(COMMAND_PREFIX) {
            flush_prose(&mut segments, &mut prose);
            segments.push(ContentSegment::Command(command.to_string()));
            i += 1;
        } else if let Some(inline) = line.strip_prefix(OUTPUT_BEGIN) {
            flush_prose(&mut segments, &mut prose);
            let mut collected = Vec::new();
            // Trailing text on the marker line is the first output line.
            if !inline.is_empty() {
                collected.push(inline.to_string());
            }
            i += 1;
            while i < lines.len() {
                let next = lines[i];
                if next.starts_with(OUTPUT_END) {
                    // End marker is consumed and excluded.
                    i += 1;
                    break;
                }
                if starts_segment(next) {
                    // Un-consume: leave the marker line in place so the
                    // outer scan re-examines it as a new segment start.
                    break;
                }
                collected.push(next.to_string());
                i += 1;
            }
            segments.push(ContentSegment::Output(collected));
        } else {
            prose.push(line.to_string());
            i += 1;
        }
    }

    flush_prose(&mut segments, &mut prose);
    segments
}

/// Does this line begin a new Command or Output segment?
fn starts_segment(line: &str) -> bool {
    line.starts_with(COMMAND_PREFIX) || line.starts_with(OUTPUT_BEGIN)
}

fn flush_prose(segments: &mut Vec<ContentSegment>, prose: &mut Vec<String>) {
    if !prose.is_empty() {
        segments.push(ContentSegment::Prose(std::mem::take(prose)));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn prose(lines: &[&str]) -> ContentSegment {
        ContentSegment::Prose(lines.iter().map(ToString::to_string).collect())
    }

    fn output(lines: &[&str]) -> ContentSegment {
        ContentSegment::Output(lines.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_mixed_reply() {
        let text = "intro\n[执行 Shell] ls -la\n[Shell 输出]\nfile1\nfile2\n[Shell 输出结束]\noutro";
        assert_eq!(
            segment_text(text),
            vec![
                prose(&["intro"]),
                ContentSegment::Command("ls -la".to_string()),
                output(&["file1", "file2"]),
                prose(&["outro"]),
            ]
        );
    }

    #[test]
    fn test_plain_prose_only() {
        assert_eq!(segment_text("just\nsome text"), vec![prose(&["just", "some text"])]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(segment_text(""), Vec::<ContentSegment>::new());
    }

    #[test]
    fn test_rescan_is_deterministic() {
        let text = "a\n[执行 Shell] pwd\n[Shell 输出]\nx\n[Shell 输出结束]\nb";
        let one_shot = segment_text(text);

        // Re-deriving from the full text after any number of intermediate
        // partial accumulations yields the same final sequence.
        let mut accumulated = String::new();
        for chunk in text.split_inclusive('\n') {
            accumulated.push_str(chunk);
            let _ = segment_text(&accumulated);
        }
        assert_eq!(segment_text(&accumulated), one_shot);

        // No-op extension is a re-scan of identical input.
        assert_eq!(segment_text(text), one_shot);
    }

    #[test]
    fn test_unterminated_output_ends_before_next_command() {
        let text = "[Shell 输出]\nline1\n[执行 Shell] pwd\nafter";
        assert_eq!(
            segment_text(text),
            vec![
                output(&["line1"]),
                ContentSegment::Command("pwd".to_string()),
                prose(&["after"]),
            ]
        );
    }

    #[test]
    fn test_unterminated_output_ends_before_next_output_block() {
        let text = "[Shell 输出]\none\n[Shell 输出]\ntwo\n[Shell 输出结束]";
        assert_eq!(segment_text(text), vec![output(&["one"]), output(&["two"])]);
    }

    #[test]
    fn test_output_runs_to_end_of_input() {
        // Mid-stream state: the end marker has not arrived yet.
        let text = "[执行 Shell] cat f\n[Shell 输出]\npartial out";
        assert_eq!(
            segment_text(text),
            vec![
                ContentSegment::Command("cat f".to_string()),
                output(&["partial out"]),
            ]
        );
    }

    #[test]
    fn test_output_marker_with_trailing_text() {
        let text = "[Shell 输出]first\nsecond\n[Shell 输出结束]";
        assert_eq!(segment_text(text), vec![output(&["first", "second"])]);
    }

    #[test]
    fn test_output_preserves_blank_lines_verbatim() {
        let text = "[Shell 输出]\na\n\nb\n[Shell 输出结束]";
        assert_eq!(segment_text(text), vec![output(&["a", "", "b"])]);
    }

    #[test]
    fn test_command_without_trailing_space_is_prose() {
        // The command marker includes the trailing space; a bare bracket
        // line is ordinary text.
        assert_eq!(segment_text("[执行 Shell]"), vec![prose(&["[执行 Shell]"])]);
    }

    #[test]
    fn test_blank_lines_between_segments_become_prose() {
        let text = "[执行 Shell] echo hi\n\n[Shell 输出]\nhi\n[Shell 输出结束]";
        assert_eq!(
            segment_text(text),
            vec![
                ContentSegment::Command("echo hi".to_string()),
                prose(&[""]),
                output(&["hi"]),
            ]
        );
    }

    #[test]
    fn test_command_marker_at_end_of_input() {
        let text = "[Shell 输出]\nout\n[执行 Shell] tail";
        assert_eq!(
            segment_text(text),
            vec![output(&["out"]), ContentSegment::Command("tail".to_string())]
        );
    }
}
