//! Fixed-size model of the robot's character display.
//!
//! The physical HMI board carries a 6-line display: a 21-character header
//! row and five 18-character body rows. Raw text arrives as one string;
//! the buffer splits it into fixed-width lines and renders the selected
//! line with a marker for the GUI layer.

/// Number of display lines.
pub const NUM_LINES: usize = 6;
/// Characters per body line.
pub const CHARS_PER_LINE: usize = 18;
/// Characters on the header (first) line.
pub const CHARS_PER_HEADER_LINE: usize = 21;

/// The scrollable text buffer behind the panel's display widget.
///
/// Derived state: recomputed wholesale from the latest raw message, never
/// edited in place.
#[derive(Debug, Clone, Default)]
pub struct DisplayBuffer {
    lines: Vec<String>,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer contents with `raw`, split on newlines and
    /// wrapped to the fixed line widths. The first line is the header row
    /// (21 chars); everything after wraps at 18. At most [`NUM_LINES`]
    /// lines are kept.
    pub fn set_raw(&mut self, raw: &str) {
        self.lines.clear();
        for segment in raw.split('\n') {
            if self.lines.len() == NUM_LINES {
                break;
            }
            let mut rest = segment;
            loop {
                let width = if self.lines.is_empty() {
                    CHARS_PER_HEADER_LINE
                } else {
                    CHARS_PER_LINE
                };
                let cut = floor_char_boundary(rest, width);
                self.lines.push(rest[..cut].to_string());
                rest = &rest[cut..];
                if rest.is_empty() || self.lines.len() == NUM_LINES {
                    break;
                }
            }
        }
    }

    /// Number of lines currently held (0..=6).
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Render the combined display text with a `>` marker on the selected
    /// line. `selected` is clamped into the buffer range; the simulator
    /// can legitimately send a stale index across a menu change.
    pub fn render(&self, selected: i32) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let selected = (selected.max(0) as usize).min(self.lines.len() - 1);
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let marker = if i == selected { '>' } else { ' ' };
                format!("{marker}{line}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Largest byte index `<= max_chars` characters into `s` that lies on a
/// char boundary.
fn floor_char_boundary(s: &str, max_chars: usize) -> usize {
    s.char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_kept_verbatim() {
        let mut buf = DisplayBuffer::new();
        buf.set_raw("*HEADER*\nitem 1\nitem 2");
        assert_eq!(buf.lines(), &["*HEADER*", "item 1", "item 2"]);
    }

    #[test]
    fn overlong_payload_wraps_to_six_body_lines() {
        let mut buf = DisplayBuffer::new();
        // Body much longer than 5 x 18 chars after a short header.
        let body = "x".repeat(10 * CHARS_PER_LINE);
        buf.set_raw(&format!("*HEADER*\n{body}"));

        assert_eq!(buf.len(), NUM_LINES);
        assert_eq!(buf.lines()[0], "*HEADER*");
        for line in &buf.lines()[1..] {
            assert!(line.len() <= CHARS_PER_LINE);
        }
    }

    #[test]
    fn header_line_wraps_at_header_width() {
        let mut buf = DisplayBuffer::new();
        buf.set_raw(&"h".repeat(30));
        assert_eq!(buf.lines()[0].len(), CHARS_PER_HEADER_LINE);
        assert_eq!(buf.lines()[1].len(), 30 - CHARS_PER_HEADER_LINE);
    }

    #[test]
    fn excess_lines_are_dropped() {
        let mut buf = DisplayBuffer::new();
        buf.set_raw("1\n2\n3\n4\n5\n6\n7\n8");
        assert_eq!(buf.len(), NUM_LINES);
        assert_eq!(buf.lines()[NUM_LINES - 1], "6");
    }

    #[test]
    fn render_marks_selected_line() {
        let mut buf = DisplayBuffer::new();
        buf.set_raw("menu\na\nb");
        let text = buf.render(1);
        assert_eq!(text, " menu\n>a\n b");
    }

    #[test]
    fn render_clamps_out_of_range_selection() {
        let mut buf = DisplayBuffer::new();
        buf.set_raw("menu\na");
        assert_eq!(buf.render(99), " menu\n>a");
        assert_eq!(buf.render(-4), ">menu\n a");
    }

    #[test]
    fn empty_buffer_renders_empty() {
        let buf = DisplayBuffer::new();
        assert_eq!(buf.render(0), "");
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let mut buf = DisplayBuffer::new();
        buf.set_raw(&"é".repeat(25));
        assert_eq!(buf.lines()[0].chars().count(), CHARS_PER_HEADER_LINE);
        assert_eq!(buf.lines()[1].chars().count(), 4);
    }
}
