//! Text layout helpers shared by the form widgets.

use unicode_width::UnicodeWidthChar;

/// One visual line of wrapped text, as a byte range into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrappedLine {
    pub start: usize,
    pub end: usize,
}

/// Wraps `text` at character boundaries so no line is wider than `width`
/// columns. Hard line breaks always start a new line; an empty text still
/// yields one empty line.
pub fn wrap_text(text: &str, width: u16) -> Vec<WrappedLine> {
    let width = usize::from(width.max(1));
    let mut lines = Vec::new();
    let mut offset = 0;
    for logical in text.split('\n') {
        let mut start = offset;
        let mut columns = 0;
        for (index, ch) in logical.char_indices() {
            let ch_width = ch.width().unwrap_or(0);
            if columns + ch_width > width && columns > 0 {
                lines.push(WrappedLine {
                    start,
                    end: offset + index,
                });
                start = offset + index;
                columns = 0;
            }
            columns += ch_width;
        }
        lines.push(WrappedLine {
            start,
            end: offset + logical.len(),
        });
        offset += logical.len() + 1;
    }
    lines
}

/// Visual (line, column) of the byte offset `cursor` within `lines`.
pub fn cursor_position(text: &str, lines: &[WrappedLine], cursor: usize) -> (usize, u16) {
    let line = lines.iter().rposition(|line| line.start <= cursor).unwrap_or(0);
    let Some(wrapped) = lines.get(line) else {
        return (0, 0);
    };
    let end = cursor.min(wrapped.end).max(wrapped.start);
    (line, display_width(&text[wrapped.start..end]))
}

pub fn display_width(text: &str) -> u16 {
    let width: usize = text.chars().map(|ch| ch.width().unwrap_or(0)).sum();
    u16::try_from(width).unwrap_or(u16::MAX)
}
