//! Hint bar component for keyboard shortcuts.
//!
//! Renders the single-line strip at the bottom of the screen listing the key
//! bindings of the form.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::App,
    ui::{components::component::Component, theme::Theme},
};

const HINTS: [(&str, &str); 6] = [
    ("Tab", "next"),
    ("↑/↓", "move"),
    ("0-9", "jump"),
    ("Enter", "submit"),
    ("Ctrl+Y", "copy"),
    ("Ctrl+C", "quit"),
];

#[derive(Debug, Default)]
pub struct HintBarComponent;

impl Component for HintBarComponent {
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let theme = app.theme.as_ref();
        let mut spans = Vec::with_capacity(HINTS.len() * 3);
        for (index, (key, action)) in HINTS.iter().enumerate() {
            if index > 0 {
                spans.push(Span::styled("  ", theme.text_muted_style()));
            }
            spans.push(Span::styled(*key, theme.accent_emphasis_style()));
            spans.push(Span::styled(format!(" {action}"), theme.text_muted_style()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), rect);
    }
}
