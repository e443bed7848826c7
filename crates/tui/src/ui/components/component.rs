//! Component trait shared by the form UI pieces.
//!
//! A component reacts to terminal input and internal messages by mutating
//! the [`App`] and returning [`Effect`]s for the runtime to execute. Rendering
//! reads the same state; components keep only layout bookkeeping of their
//! own (hit areas, scroll offsets).

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{Frame, layout::Rect};
use replykit_types::{Effect, Msg};

use crate::app::App;

pub(crate) trait Component {
    /// Handle an internal message (tick, status write, submission result).
    fn handle_message(&mut self, _app: &mut App, _msg: &Msg) -> Vec<Effect> {
        Vec::new()
    }

    fn handle_key_events(&mut self, _app: &mut App, _key: KeyEvent) -> Vec<Effect> {
        Vec::new()
    }

    fn handle_mouse_events(&mut self, _app: &mut App, _mouse: MouseEvent) -> Vec<Effect> {
        Vec::new()
    }

    /// Handle a bracketed paste.
    fn handle_paste(&mut self, _app: &mut App, _text: &str) -> Vec<Effect> {
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App);
}
