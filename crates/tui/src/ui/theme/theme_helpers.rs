use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, BorderType, Borders, Paragraph},
};

use super::roles::{Theme, ThemeRoles};

/// Build a standard Block with theme surfaces and borders.
pub fn block<'a, T: Theme + ?Sized>(theme: &'a T, title: Option<&'a str>, focused: bool) -> Block<'a> {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(theme.border_style(focused))
        .style(panel_style(theme));
    if let Some(t) = title {
        block = block.title(Span::styled(t, theme.text_secondary_style().add_modifier(Modifier::BOLD)));
    }
    block
}

/// Style for panel-like containers (set background on widget using `.style`).
pub fn panel_style<T: Theme + ?Sized>(theme: &T) -> Style {
    let ThemeRoles { surface, text, .. } = *theme.roles();
    Style::default().bg(surface).fg(text)
}

/// Lighten an RGB color toward white by `amount` (0.0..=1.0).
/// If the color is not RGB, returns it unchanged.
pub fn lighten_rgb(color: Color, amount: f32) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let a = amount.clamp(0.0, 1.0);
            let lift = |channel: u8| (channel as f32 + (255.0 - channel as f32) * a).round().clamp(0.0, 255.0) as u8;
            Color::Rgb(lift(r), lift(g), lift(b))
        }
        other => other,
    }
}

/// Style for input values; caller sets the block border based on focus.
pub fn input_style<T: Theme + ?Sized>(theme: &T, focused: bool) -> Style {
    let ThemeRoles { surface, text, .. } = *theme.roles();
    let mut style = Style::default().bg(surface).fg(text);
    if focused {
        style = style.add_modifier(Modifier::BOLD);
    }
    style
}

/// Label style for a form row.
pub fn label_style<T: Theme + ?Sized>(theme: &T, focused: bool) -> Style {
    if focused {
        theme.accent_emphasis_style()
    } else {
        theme.text_secondary_style()
    }
}

/// Secondary button style (outline-like, rely on border color in Block).
pub fn button_secondary_style<T: Theme + ?Sized>(theme: &T, selected: bool) -> Style {
    let ThemeRoles {
        accent_secondary,
        selection_bg,
        ..
    } = *theme.roles();
    let style = Style::default().fg(accent_secondary);
    if selected { style.bg(selection_bg) } else { style }
}

/// Renders a single-line button.
///
/// A pressed button is drawn one column narrower on each side, which reads as
/// the button sinking into the page.
pub fn render_button<T: Theme + ?Sized>(frame: &mut Frame, area: Rect, label: &str, focused: bool, pressed: bool, theme: &T) {
    let text = if pressed { format!("[{label}]") } else { format!("[ {label} ]") };
    let mut style = button_secondary_style(theme, focused);
    if focused {
        style = style.add_modifier(Modifier::BOLD);
    }
    if pressed {
        style = style.add_modifier(Modifier::REVERSED);
    }
    frame.render_widget(Paragraph::new(Span::styled(text, style)), area);
}
