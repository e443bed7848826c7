//! Top-level view: the form, the loading status panel and the hint bar.

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    widgets::Block,
};
use replykit_types::{Effect, Msg};

use crate::{
    app::App,
    ui::{
        components::{FormComponent, HintBarComponent, StatusComponent, component::Component, status::STATUS_HEIGHT},
        theme::theme_helpers as th,
    },
};

pub struct MainView {
    form: FormComponent,
    status: StatusComponent,
    hint_bar: HintBarComponent,
}

impl MainView {
    pub fn new() -> Self {
        Self {
            form: FormComponent::new(),
            status: StatusComponent,
            hint_bar: HintBarComponent,
        }
    }
}

impl Component for MainView {
    fn handle_message(&mut self, app: &mut App, msg: &Msg) -> Vec<Effect> {
        app.update(msg)
    }

    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        self.form.handle_key_events(app, key)
    }

    fn handle_mouse_events(&mut self, app: &mut App, mouse: MouseEvent) -> Vec<Effect> {
        self.form.handle_mouse_events(app, mouse)
    }

    fn handle_paste(&mut self, app: &mut App, text: &str) -> Vec<Effect> {
        self.form.handle_paste(app, text)
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        frame.render_widget(Block::default().style(th::panel_style(app.theme.as_ref())), rect);
        let status_height = if app.status.is_visible() { STATUS_HEIGHT } else { 0 };
        let [form_area, status_area, hint_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(status_height),
            Constraint::Length(1),
        ])
        .areas(rect);
        self.form.render(frame, form_area, app);
        self.status.render(frame, status_area, app);
        self.hint_bar.render(frame, hint_area, app);
    }
}
