//! Loading status display.
//!
//! The sequencer writes to the display from its own tasks; those writes are
//! forwarded to the UI loop as [`Msg::Status`] and applied here, each one
//! replacing the full text.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Text},
    widgets::Paragraph,
};
use replykit_engine::StatusSurface;
use replykit_types::{Msg, StatusUpdate};
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::{
    app::App,
    ui::{
        components::component::Component,
        theme::{Theme, theme_helpers as th},
    },
};

/// Height of the status panel including its border.
pub const STATUS_HEIGHT: u16 = 5;

/// Current content of the status display.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusState {
    visible: bool,
    text: String,
}

impl StatusState {
    pub fn apply(&mut self, update: &StatusUpdate) {
        match update {
            StatusUpdate::Show => self.visible = true,
            StatusUpdate::Hide => self.visible = false,
            StatusUpdate::Write(text) => self.text.clone_from(text),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Status surface that forwards sequencer writes to the UI loop.
#[derive(Debug, Clone)]
pub struct ChannelStatusSurface {
    sender: UnboundedSender<Msg>,
}

impl ChannelStatusSurface {
    pub fn new(sender: UnboundedSender<Msg>) -> Self {
        Self { sender }
    }

    fn send(&self, update: StatusUpdate) {
        if self.sender.send(Msg::Status(update)).is_err() {
            warn!("Status display is gone; dropping status update.");
        }
    }
}

impl StatusSurface for ChannelStatusSurface {
    fn show(&self) {
        self.send(StatusUpdate::Show);
    }

    fn hide(&self) {
        self.send(StatusUpdate::Hide);
    }

    fn write(&self, text: &str) {
        self.send(StatusUpdate::Write(text.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct StatusComponent;

impl Component for StatusComponent {
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        if !app.status.is_visible() || rect.height == 0 {
            return;
        }
        let theme = app.theme.as_ref();
        let lines: Vec<Line> = app
            .status
            .text()
            .lines()
            .enumerate()
            .map(|(index, line)| {
                let style = if index == 0 {
                    theme.status_info()
                } else {
                    theme.text_primary_style()
                };
                Line::styled(line.to_string(), style)
            })
            .collect();
        let block = th::block(theme, Some("Status"), false);
        frame.render_widget(Paragraph::new(Text::from(lines)).block(block), rect);
    }
}
