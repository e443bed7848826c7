//! Form component: key routing, mouse hits and rendering of the page.
//!
//! Keys are routed in this order: focus traversal (`Tab`/`Shift+Tab`), the
//! copy shortcut, keyboard navigation (arrows, digits, Enter), button
//! activation, and finally the focused widget's own editing.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::Modifier,
    text::{Line, Span, Text},
    widgets::Paragraph,
};
use replykit_engine::{NavAction, NavKey, NavigableList, PageView, resolve_key};
use replykit_types::{ButtonId, Effect, ElementId, ErrorSlot, FieldId, FieldKind, MAX_OUTPUTS, SETTINGS_FIELDS};

use crate::{
    app::App,
    ui::{
        components::{common::TextInputState, component::Component, textarea::shortcut_entries},
        theme::{Theme, theme_helpers as th},
        utils::{cursor_position, display_width, wrap_text},
    },
};

const LABEL_WIDTH: u16 = 22;
const MIN_TEXTAREA_LINES: u16 = 3;
const MAX_TEXTAREA_LINES: u16 = 8;
const BUTTON_WIDTH: u16 = 12;

/// What a click at a position lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Element(ElementId),
    Shortcut(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Heading(&'static str),
    Field(FieldId),
    TextArea(FieldId),
    Shortcuts(FieldId),
    CopyButton(FieldId),
    Error(ErrorSlot),
    Submit,
    Spacer,
}

#[derive(Debug, Clone, Copy)]
struct Row {
    kind: RowKind,
    height: u16,
}

impl Row {
    fn element(&self) -> Option<ElementId> {
        match self.kind {
            RowKind::Field(field) | RowKind::TextArea(field) => Some(ElementId::Field(field)),
            RowKind::CopyButton(field) => Some(ElementId::Button(ButtonId::Copy(field))),
            RowKind::Submit => Some(ElementId::Button(ButtonId::Submit)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct FormComponent {
    scroll: u16,
    follow_focus: bool,
    hit_areas: Vec<(Rect, Hit)>,
}

impl FormComponent {
    pub fn new() -> Self {
        Self {
            follow_focus: true,
            ..Self::default()
        }
    }

    fn route_key(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Tab => {
                app.focus.next();
                return Vec::new();
            }
            KeyCode::BackTab => {
                app.focus.prev();
                return Vec::new();
            }
            _ => {}
        }

        let focused = app.form.focused_element();
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match (key.code, focused) {
                (KeyCode::Char('y'), Some(ElementId::Field(field))) if field.kind() == FieldKind::TextArea => {
                    app.press_copy(field)
                }
                (KeyCode::Char('y'), Some(ElementId::Button(ButtonId::Copy(field)))) => app.press_copy(field),
                (KeyCode::Char('a'), Some(ElementId::Field(field))) => {
                    if let Some(state) = app.form.field_mut(field) {
                        state.input.select_all();
                    }
                    Vec::new()
                }
                _ => Vec::new(),
            };
        }

        if let Some(nav_key) = nav_key(key) {
            let list = NavigableList::from_page(&app.form);
            match resolve_key(&list, focused, nav_key) {
                NavAction::Navigate(index) => {
                    app.navigate_to(index);
                    return Vec::new();
                }
                NavAction::Submit => return app.press_submit(),
                NavAction::Suppress => return Vec::new(),
                NavAction::Default => {}
            }
        }

        match focused {
            Some(ElementId::Button(button)) if key.code == KeyCode::Char(' ') => app.activate(button),
            Some(ElementId::Field(field)) => {
                let changed = app.form.field_mut(field).is_some_and(|state| edit_field(&mut state.input, field, key.code));
                if changed {
                    app.on_field_input(field);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn build_rows(&self, app: &App, width: u16) -> Vec<Row> {
        let form = &app.form;
        let mut rows = Vec::new();
        let push_error = |rows: &mut Vec<Row>, slot: ErrorSlot| {
            if let Some(message) = form.error_text(slot).filter(|text| !text.trim().is_empty()) {
                let height = u16::try_from(wrap_text(message, width).len()).unwrap_or(u16::MAX);
                rows.push(Row {
                    kind: RowKind::Error(slot),
                    height,
                });
            }
        };
        let line = |kind| Row { kind, height: 1 };

        rows.push(line(RowKind::Field(FieldId::ApiKey)));
        push_error(&mut rows, ErrorSlot::ApiKey);
        rows.push(line(RowKind::Field(FieldId::ResponderName)));
        rows.push(line(RowKind::Spacer));
        rows.push(line(RowKind::Heading("Settings")));
        for field in SETTINGS_FIELDS {
            rows.push(line(RowKind::Field(field)));
            match field {
                FieldId::SentenceLimit => push_error(&mut rows, ErrorSlot::SentenceLimit),
                FieldId::NumOutputs => push_error(&mut rows, ErrorSlot::NumOutputs),
                _ => {}
            }
        }
        rows.push(line(RowKind::Field(FieldId::UniquenessAttempts)));
        rows.push(line(RowKind::Spacer));

        self.push_text_area(app, &mut rows, FieldId::InputText, width);
        push_error(&mut rows, ErrorSlot::InputText);
        rows.push(line(RowKind::Submit));

        let outputs = form.output_fields();
        let has_output_error = form.error_text(ErrorSlot::Output).is_some();
        if !outputs.is_empty() || has_output_error {
            rows.push(line(RowKind::Spacer));
            rows.push(line(RowKind::Heading("Responses")));
            push_error(&mut rows, ErrorSlot::Output);
            for field in outputs {
                self.push_text_area(app, &mut rows, field, width);
            }
        }
        rows
    }

    fn push_text_area(&self, app: &App, rows: &mut Vec<Row>, field: FieldId, width: u16) {
        let Some(text) = app.form.value(field) else {
            return;
        };
        let inner_width = width.saturating_sub(2);
        let lines = u16::try_from(wrap_text(text, inner_width).len()).unwrap_or(u16::MAX);
        rows.push(Row {
            kind: RowKind::TextArea(field),
            height: 1 + 2 + lines.clamp(MIN_TEXTAREA_LINES, MAX_TEXTAREA_LINES),
        });
        if app.shortcuts.is_visible(field) && !shortcut_entries(&NavigableList::from_page(&app.form)).is_empty() {
            rows.push(Row {
                kind: RowKind::Shortcuts(field),
                height: 1,
            });
        }
        if app.form.visible_copy_button(field).is_some() {
            rows.push(Row {
                kind: RowKind::CopyButton(field),
                height: 1,
            });
        }
    }

    /// Keeps the focused row inside the viewport.
    fn adjust_scroll(&mut self, rows: &[Row], focused: Option<ElementId>, viewport: u16) {
        let total: u16 = rows.iter().map(|row| row.height).sum();
        if self.follow_focus
            && let Some(focused) = focused
        {
            let mut top = 0u16;
            for row in rows {
                if row.element() == Some(focused) {
                    let bottom = top.saturating_add(row.height);
                    if top < self.scroll {
                        self.scroll = top;
                    } else if bottom > self.scroll.saturating_add(viewport) {
                        self.scroll = bottom.saturating_sub(viewport);
                    }
                    break;
                }
                top = top.saturating_add(row.height);
            }
        }
        self.scroll = self.scroll.min(total.saturating_sub(viewport));
    }

    fn render_row(&mut self, frame: &mut Frame, area: Rect, row: Row, app: &App) {
        let theme = app.theme.as_ref();
        let focused = app.form.focused_element();
        match row.kind {
            RowKind::Spacer => {}
            RowKind::Heading(title) => {
                frame.render_widget(Paragraph::new(Span::styled(title, theme.accent_emphasis_style())), area);
            }
            RowKind::Field(field) => {
                let is_focused = focused == Some(ElementId::Field(field));
                self.hit_areas.push((area, Hit::Element(ElementId::Field(field))));
                render_field_line(frame, area, app, field, is_focused);
            }
            RowKind::TextArea(field) => {
                let is_focused = focused == Some(ElementId::Field(field));
                self.hit_areas.push((area, Hit::Element(ElementId::Field(field))));
                render_text_area(frame, area, app, field, is_focused);
            }
            RowKind::Shortcuts(_) => self.render_shortcuts(frame, area, app),
            RowKind::CopyButton(field) => {
                let button = ButtonId::Copy(field);
                let rect = Rect { width: BUTTON_WIDTH.min(area.width), ..area };
                self.hit_areas.push((rect, Hit::Element(ElementId::Button(button))));
                let is_focused = focused == Some(ElementId::Button(button));
                th::render_button(frame, rect, "Copy", is_focused, app.buttons.is_pressed(button), theme);
            }
            RowKind::Submit => {
                let button = ButtonId::Submit;
                let rect = Rect { width: BUTTON_WIDTH.min(area.width), ..area };
                self.hit_areas.push((rect, Hit::Element(ElementId::Button(button))));
                let is_focused = focused == Some(ElementId::Button(button));
                th::render_button(frame, rect, "Submit", is_focused, app.buttons.is_pressed(button), theme);
            }
            RowKind::Error(slot) => {
                let message = app.form.error_text(slot).unwrap_or_default();
                let lines: Vec<Line> = wrap_text(message, area.width)
                    .into_iter()
                    .map(|line| Line::styled(message[line.start..line.end].to_string(), theme.status_error()))
                    .collect();
                frame.render_widget(Paragraph::new(Text::from(lines)), area);
            }
        }
    }

    fn render_shortcuts(&mut self, frame: &mut Frame, area: Rect, app: &App) {
        let theme = app.theme.as_ref();
        let entries = shortcut_entries(&NavigableList::from_page(&app.form));
        let mut spans = Vec::new();
        let mut x = area.x;
        let right = area.x.saturating_add(area.width);
        for entry in entries {
            let key = format!("[{}] ", entry.key);
            let width = display_width(&key) + display_width(&entry.label);
            if x.saturating_add(width) > right {
                break;
            }
            self.hit_areas.push((
                Rect {
                    x,
                    y: area.y,
                    width,
                    height: 1,
                },
                Hit::Shortcut(entry.target),
            ));
            spans.push(Span::styled(key, theme.accent_emphasis_style()));
            spans.push(Span::styled(entry.label, theme.text_secondary_style()));
            spans.push(Span::raw("  "));
            x = x.saturating_add(width + 2);
        }
        spans.push(Span::styled("Ctrl+Y copy", theme.text_muted_style()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn hit_at(&self, column: u16, row: u16) -> Option<Hit> {
        let position = Position::new(column, row);
        self.hit_areas
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(position))
            .map(|(_, hit)| *hit)
    }
}

impl Component for FormComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        self.follow_focus = true;
        let effects = self.route_key(app, key);
        app.sync_focus();
        effects
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(hit) = self.hit_at(mouse.column, mouse.row) else {
                    return Vec::new();
                };
                self.follow_focus = true;
                match hit {
                    Hit::Shortcut(index) => {
                        app.navigate_to(index);
                        Vec::new()
                    }
                    Hit::Element(element) => {
                        app.focus_element(element);
                        match element {
                            ElementId::Button(button) => app.activate(button),
                            ElementId::Field(_) => Vec::new(),
                        }
                    }
                }
            }
            MouseEventKind::ScrollUp => {
                self.follow_focus = false;
                self.scroll = self.scroll.saturating_sub(1);
                Vec::new()
            }
            MouseEventKind::ScrollDown => {
                self.follow_focus = false;
                self.scroll = self.scroll.saturating_add(1);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_paste(&mut self, app: &mut App, text: &str) -> Vec<Effect> {
        let Some(field) = app.form.focused_field() else {
            return Vec::new();
        };
        let pasted: String = match field.kind() {
            FieldKind::TextArea => text.replace("\r\n", "\n"),
            FieldKind::Text | FieldKind::Secret => text.replace(['\r', '\n'], " "),
            FieldKind::Number => text.chars().filter(char::is_ascii_digit).collect(),
            FieldKind::Select => return Vec::new(),
        };
        if pasted.is_empty() {
            return Vec::new();
        }
        if let Some(state) = app.form.field_mut(field) {
            state.input.insert_str(&pasted);
            app.on_field_input(field);
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let block = th::block(app.theme.as_ref(), Some(" Reply generator "), false);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        app.form.area = inner;

        self.hit_areas.clear();
        let rows = self.build_rows(app, inner.width);
        self.adjust_scroll(&rows, app.form.focused_element(), inner.height);

        let mut top = 0u16;
        for row in rows {
            let row_top = top;
            top = top.saturating_add(row.height);
            if row_top < self.scroll || top > self.scroll.saturating_add(inner.height) {
                continue;
            }
            let area = Rect {
                x: inner.x,
                y: inner.y + (row_top - self.scroll),
                width: inner.width,
                height: row.height,
            };
            self.render_row(frame, area, row, app);
        }
    }
}

fn nav_key(key: KeyEvent) -> Option<NavKey> {
    if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Up => Some(NavKey::ArrowUp),
        KeyCode::Down => Some(NavKey::ArrowDown),
        KeyCode::Enter => Some(NavKey::Enter),
        KeyCode::Char(ch) => ch.to_digit(10).and_then(|digit| u8::try_from(digit).ok()).map(NavKey::Digit),
        _ => None,
    }
}

/// Applies `code` to a field. Returns whether the value changed.
fn edit_field(input: &mut TextInputState, field: FieldId, code: KeyCode) -> bool {
    match field.kind() {
        FieldKind::Select => match code {
            KeyCode::Left | KeyCode::Up => cycle_option(input, field.options(), -1),
            KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => cycle_option(input, field.options(), 1),
            _ => false,
        },
        FieldKind::Number => match code {
            KeyCode::Up => step_number(input, field, 1),
            KeyCode::Down => step_number(input, field, -1),
            KeyCode::Char(ch) if ch.is_ascii_digit() => {
                input.insert_char(ch);
                true
            }
            KeyCode::Char(_) => false,
            other => edit_text(input, other, false),
        },
        FieldKind::Text | FieldKind::Secret => edit_text(input, code, false),
        FieldKind::TextArea => edit_text(input, code, true),
    }
}

fn edit_text(input: &mut TextInputState, code: KeyCode, multiline: bool) -> bool {
    let before = input.input().len();
    match code {
        KeyCode::Char(ch) => {
            input.insert_char(ch);
            return true;
        }
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Up if multiline => {
            input.move_line_up();
        }
        KeyCode::Down if multiline => {
            input.move_line_down();
        }
        _ => {}
    }
    input.input().len() != before
}

fn cycle_option(input: &mut TextInputState, options: &[&str], delta: isize) -> bool {
    if options.is_empty() {
        return false;
    }
    let current = options
        .iter()
        .position(|option| option.eq_ignore_ascii_case(input.input().trim()));
    let len = options.len() as isize;
    let next = match current {
        Some(index) => (index as isize + delta).rem_euclid(len),
        None => 0,
    };
    let value = options[next as usize];
    if value == input.input() {
        return false;
    }
    input.set_input(value);
    true
}

fn number_bounds(field: FieldId) -> (usize, usize) {
    match field {
        FieldId::NumOutputs => (1, MAX_OUTPUTS),
        _ => (1, 5),
    }
}

fn step_number(input: &mut TextInputState, field: FieldId, delta: isize) -> bool {
    let (min, max) = number_bounds(field);
    let current = input.input().trim().parse::<usize>().unwrap_or(min);
    let next = current.saturating_add_signed(delta).clamp(min, max);
    let value = next.to_string();
    if value == input.input() {
        return false;
    }
    input.set_input(value);
    true
}

fn label_span<'a>(theme: &dyn Theme, field: FieldId, focused: bool) -> Span<'a> {
    let label = format!("{:<width$}", field.label(), width = usize::from(LABEL_WIDTH));
    Span::styled(label, th::label_style(theme, focused))
}

fn render_field_line(frame: &mut Frame, area: Rect, app: &App, field: FieldId, focused: bool) {
    let theme = app.theme.as_ref();
    let Some(state) = app.form.field(field) else {
        return;
    };
    let input = &state.input;
    let value_style = if input.is_selected_all() && focused {
        theme.selection_style()
    } else {
        th::input_style(theme, focused)
    };
    let (shown, cursor_text) = match field.kind() {
        FieldKind::Secret => {
            let masked = "•".repeat(input.input().chars().count());
            let before = "•".repeat(input.input()[..input.cursor()].chars().count());
            (masked, before)
        }
        FieldKind::Select => {
            let value = format!("‹ {} ›", input.input());
            (value, String::new())
        }
        _ => (input.input().to_string(), input.input()[..input.cursor()].to_string()),
    };
    let line = Line::from(vec![label_span(theme, field, focused), Span::styled(shown, value_style)]);
    frame.render_widget(Paragraph::new(line), area);

    if focused && field.kind() != FieldKind::Select {
        let x = area.x + LABEL_WIDTH + display_width(&cursor_text);
        if x < area.x.saturating_add(area.width) {
            frame.set_cursor_position(Position::new(x, area.y));
        }
    }
}

fn render_text_area(frame: &mut Frame, area: Rect, app: &App, field: FieldId, focused: bool) {
    let theme = app.theme.as_ref();
    let Some(state) = app.form.field(field) else {
        return;
    };
    let input = &state.input;
    let label_area = Rect { height: 1, ..area };
    frame.render_widget(Paragraph::new(label_span(theme, field, focused)), label_area);

    let box_area = Rect {
        y: area.y + 1,
        height: area.height.saturating_sub(1),
        ..area
    };
    let block = th::block(theme, None, focused);
    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);

    let text = input.input();
    let lines = wrap_text(text, inner.width);
    let (cursor_line, cursor_column) = cursor_position(text, &lines, input.cursor());
    let visible = usize::from(inner.height);
    let first = if focused { (cursor_line + 1).saturating_sub(visible) } else { 0 };
    let style = if input.is_selected_all() && focused {
        theme.selection_style()
    } else {
        th::input_style(theme, focused).remove_modifier(Modifier::BOLD)
    };
    let rendered: Vec<Line> = lines
        .iter()
        .skip(first)
        .take(visible)
        .map(|line| Line::styled(text[line.start..line.end].to_string(), style))
        .collect();
    frame.render_widget(Paragraph::new(Text::from(rendered)), inner);

    if focused && inner.height > 0 {
        let y = inner.y + u16::try_from(cursor_line - first).unwrap_or(0);
        let x = inner.x + cursor_column.min(inner.width.saturating_sub(1));
        frame.set_cursor_position(Position::new(x, y));
    }
}
