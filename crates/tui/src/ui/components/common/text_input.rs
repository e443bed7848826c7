//! UTF-8 safe text input state with cursor management.
//!
//! Shared by every editable field on the form: single-line inputs, the
//! masked API key, number inputs and multi-line text areas. Besides cursor
//! movement it tracks a whole-content selection, which is what a field gets
//! when it receives focus through navigation.

#[derive(Clone, Debug, Default)]
pub struct TextInputState {
    /// The underlying text buffer
    input: String,
    /// Cursor byte index into `input` (always on a UTF-8 boundary)
    cursor: usize,
    /// Whether the whole content is selected
    selected_all: bool,
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: impl Into<String>) -> Self {
        let input = input.into();
        let cursor = input.len();
        Self {
            input,
            cursor,
            selected_all: false,
        }
    }

    // ----- Getters -----
    pub fn input(&self) -> &str {
        &self.input
    }
    pub fn cursor(&self) -> usize {
        self.cursor
    }
    pub fn is_empty(&self) -> bool {
        self.input.trim().is_empty()
    }
    pub fn is_selected_all(&self) -> bool {
        self.selected_all && !self.input.is_empty()
    }

    // ----- Setters -----
    pub fn set_input<S: Into<String>>(&mut self, s: S) {
        self.input = s.into();
        self.cursor = self.input.len();
        self.selected_all = false;
    }

    /// Selects the whole content; the cursor moves to the end.
    pub fn select_all(&mut self) {
        self.selected_all = true;
        self.cursor = self.input.len();
    }

    pub fn clear_selection(&mut self) {
        self.selected_all = false;
    }

    // ----- Editing primitives (UTF-8 safe) -----

    /// Move cursor one Unicode scalar to the left.
    pub fn move_left(&mut self) {
        if self.take_selection() {
            self.cursor = 0;
            return;
        }
        if self.cursor == 0 {
            return;
        }
        let prev_len = self.input[..self.cursor].chars().last().map(|c| c.len_utf8()).unwrap_or(1);
        self.cursor = self.cursor.saturating_sub(prev_len);
    }

    /// Move cursor one Unicode scalar to the right.
    pub fn move_right(&mut self) {
        if self.take_selection() {
            return;
        }
        if let Some(next) = self.input[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    /// Move the cursor to the start of the current line.
    pub fn move_home(&mut self) {
        self.selected_all = false;
        self.cursor = self.line_start(self.cursor);
    }

    /// Move the cursor to the end of the current line.
    pub fn move_end(&mut self) {
        self.selected_all = false;
        self.cursor = self.line_end(self.cursor);
    }

    /// Move to the previous line, keeping the column where possible.
    /// Returns false when the cursor already sits on the first line.
    pub fn move_line_up(&mut self) -> bool {
        self.selected_all = false;
        let start = self.line_start(self.cursor);
        if start == 0 {
            return false;
        }
        let column = self.input[start..self.cursor].chars().count();
        let prev_start = self.line_start(start - 1);
        self.cursor = self.offset_in_line(prev_start, column);
        true
    }

    /// Move to the next line, keeping the column where possible.
    /// Returns false when the cursor already sits on the last line.
    pub fn move_line_down(&mut self) -> bool {
        self.selected_all = false;
        let end = self.line_end(self.cursor);
        if end >= self.input.len() {
            return false;
        }
        let column = self.input[self.line_start(self.cursor)..self.cursor].chars().count();
        self.cursor = self.offset_in_line(end + 1, column);
        true
    }

    /// Insert a char at the cursor, replacing the selection if any.
    pub fn insert_char(&mut self, c: char) {
        self.delete_selection();
        self.input.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert a string at the cursor, replacing the selection if any.
    pub fn insert_str(&mut self, text: &str) {
        self.delete_selection();
        self.input.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    /// Backspace the char immediately before the cursor.
    pub fn backspace(&mut self) {
        if self.delete_selection() {
            return;
        }
        if self.cursor == 0 {
            return;
        }
        let prev = self.input[..self.cursor].chars().last().map(|c| c.len_utf8()).unwrap_or(1);
        let start = self.cursor - prev;
        self.input.drain(start..self.cursor);
        self.cursor = start;
    }

    /// Delete the char under the cursor.
    pub fn delete(&mut self) {
        if self.delete_selection() {
            return;
        }
        if let Some(next) = self.input[self.cursor..].chars().next() {
            self.input.drain(self.cursor..self.cursor + next.len_utf8());
        }
    }

    fn take_selection(&mut self) -> bool {
        std::mem::replace(&mut self.selected_all, false) && !self.input.is_empty()
    }

    fn delete_selection(&mut self) -> bool {
        if !self.take_selection() {
            return false;
        }
        self.input.clear();
        self.cursor = 0;
        true
    }

    fn line_start(&self, at: usize) -> usize {
        self.input[..at].rfind('\n').map(|index| index + 1).unwrap_or(0)
    }

    fn line_end(&self, at: usize) -> usize {
        self.input[at..].find('\n').map(|index| at + index).unwrap_or(self.input.len())
    }

    fn offset_in_line(&self, line_start: usize, column: usize) -> usize {
        let line_end = self.line_end(line_start);
        self.input[line_start..line_end]
            .char_indices()
            .nth(column)
            .map(|(index, _)| line_start + index)
            .unwrap_or(line_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_move_insert_backspace() {
        let mut st = TextInputState::new();
        st.set_input("h🙂llo");
        st.move_home();
        st.move_right();
        st.insert_char('e');
        assert_eq!(st.input(), "he🙂llo");
        st.move_right();
        st.backspace();
        assert_eq!(st.input(), "hello");
        st.move_left();
        st.backspace();
        assert_eq!(st.input(), "ello");
    }

    #[test]
    fn typing_replaces_a_full_selection() {
        let mut st = TextInputState::with_input("Ada");
        st.select_all();
        assert!(st.is_selected_all());
        st.insert_char('G');
        assert_eq!(st.input(), "G");
        assert!(!st.is_selected_all());

        st.select_all();
        st.backspace();
        assert_eq!(st.input(), "");
    }

    #[test]
    fn moving_collapses_the_selection() {
        let mut st = TextInputState::with_input("abc");
        st.select_all();
        st.move_left();
        assert_eq!(st.cursor(), 0);
        st.insert_char('x');
        assert_eq!(st.input(), "xabc");
    }

    #[test]
    fn line_moves_keep_the_column() {
        let mut st = TextInputState::with_input("first\nab\nthird");
        assert!(st.move_line_up());
        assert_eq!(st.cursor(), "first\nab".len());
        assert!(st.move_line_up());
        assert_eq!(st.cursor(), 2);
        assert!(!st.move_line_up());
        assert!(st.move_line_down());
        assert!(st.move_line_down());
        assert_eq!(st.cursor(), "first\nab\nth".len());
        assert!(!st.move_line_down());
    }
}
