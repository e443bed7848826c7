//! Transient pressed state for buttons.
//!
//! A press is purely cosmetic: the button renders pressed until its deadline
//! passes, then the next tick restores it. Nothing else is retained.

use std::collections::HashMap;

use replykit_types::ButtonId;
use tokio::time::{Duration, Instant};

/// How long a button stays pressed.
pub const PRESS_DURATION: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
pub struct ButtonFeedback {
    pressed_until: HashMap<ButtonId, Instant>,
}

impl ButtonFeedback {
    pub fn press(&mut self, button: ButtonId, now: Instant) {
        self.pressed_until.insert(button, now + PRESS_DURATION);
    }

    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.pressed_until.contains_key(&button)
    }

    /// Releases every button whose deadline passed. Returns whether any
    /// button changed.
    pub fn release_expired(&mut self, now: Instant) -> bool {
        let before = self.pressed_until.len();
        self.pressed_until.retain(|_, deadline| *deadline > now);
        before != self.pressed_until.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pressed_until.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replykit_types::FieldId;

    #[test]
    fn press_is_released_after_100ms() {
        let start = Instant::now();
        let mut feedback = ButtonFeedback::default();
        feedback.press(ButtonId::Submit, start);
        feedback.press(ButtonId::Copy(FieldId::InputText), start + Duration::from_millis(50));

        assert!(!feedback.release_expired(start + Duration::from_millis(99)));
        assert!(feedback.is_pressed(ButtonId::Submit));

        assert!(feedback.release_expired(start + PRESS_DURATION));
        assert!(!feedback.is_pressed(ButtonId::Submit));
        assert!(feedback.is_pressed(ButtonId::Copy(FieldId::InputText)));
        assert!(feedback.has_pending());
    }
}
