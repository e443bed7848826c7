//! Text area behaviors: the per-field shortcut panel and copy availability.
//!
//! A text area shows its shortcut panel while it has focus. When focus
//! leaves, the panel stays up for a short grace period so a click on the
//! field's copy button still lands, and it stays up for good when focus went
//! to that copy button.

use std::collections::{HashMap, HashSet};

use replykit_engine::{
    NavigableList,
    navigation::{FIRST_OUTPUT_SLOT, INPUT_SLOT},
};
use replykit_types::{ButtonId, ElementId, FieldId, FieldKind};
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Grace period between blur and hiding the shortcut panel.
pub const HIDE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
pub struct ShortcutPanels {
    visible: HashSet<FieldId>,
    hide_at: HashMap<FieldId, Instant>,
}

impl ShortcutPanels {
    pub fn is_visible(&self, field: FieldId) -> bool {
        self.visible.contains(&field)
    }

    /// Focus entered `field`.
    pub fn on_focus(&mut self, field: FieldId) {
        if field.kind() != FieldKind::TextArea {
            return;
        }
        self.hide_at.remove(&field);
        self.visible.insert(field);
    }

    /// Focus left `field` for `next`.
    pub fn on_blur(&mut self, field: FieldId, next: Option<ElementId>, now: Instant) {
        if field.kind() != FieldKind::TextArea {
            return;
        }
        if next == Some(ElementId::Button(ButtonId::Copy(field))) {
            debug!("Focus moved to the copy button of {field}; keeping shortcuts visible.");
            return;
        }
        self.hide_at.insert(field, now + HIDE_DELAY);
    }

    /// Hides panels whose grace period passed. Returns whether any changed.
    pub fn hide_expired(&mut self, now: Instant) -> bool {
        let expired: Vec<FieldId> = self
            .hide_at
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(field, _)| *field)
            .collect();
        for field in &expired {
            self.hide_at.remove(field);
            self.visible.remove(field);
        }
        !expired.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        !self.hide_at.is_empty()
    }

    /// Drops panels of text areas that no longer exist.
    pub fn retain(&mut self, exists: impl Fn(FieldId) -> bool) {
        self.visible.retain(|field| exists(*field));
        self.hide_at.retain(|field, _| exists(*field));
    }
}

/// One clickable entry of a shortcut panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutEntry {
    pub key: String,
    pub label: String,
    /// Navigable list slot the entry jumps to.
    pub target: usize,
}

/// Entries shown in a text area's shortcut panel: the digit shortcuts for
/// the input and every output present.
pub fn shortcut_entries(list: &NavigableList) -> Vec<ShortcutEntry> {
    if list.output_count() == 0 {
        return Vec::new();
    }
    let input = list.target(INPUT_SLOT).map(|field| ShortcutEntry {
        key: "0".into(),
        label: field.label(),
        target: INPUT_SLOT,
    });
    let outputs = list.outputs().iter().enumerate().filter_map(|(offset, slot)| {
        slot.map(|field| ShortcutEntry {
            key: (offset + 1).to_string(),
            label: field.label(),
            target: FIRST_OUTPUT_SLOT + offset,
        })
    });
    input.into_iter().chain(outputs).collect()
}

/// Whether a text area with `text` shows its copy button.
pub fn copy_visible(text: &str) -> bool {
    !text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_hides_after_the_grace_period() {
        let now = Instant::now();
        let mut panels = ShortcutPanels::default();
        panels.on_focus(FieldId::InputText);
        panels.on_blur(FieldId::InputText, Some(ElementId::Field(FieldId::ApiKey)), now);

        assert!(!panels.hide_expired(now + Duration::from_millis(99)));
        assert!(panels.is_visible(FieldId::InputText));
        assert!(panels.hide_expired(now + HIDE_DELAY));
        assert!(!panels.is_visible(FieldId::InputText));
    }

    #[test]
    fn moving_to_the_own_copy_button_keeps_the_panel() {
        let now = Instant::now();
        let mut panels = ShortcutPanels::default();
        panels.on_focus(FieldId::Output(1));
        panels.on_blur(
            FieldId::Output(1),
            Some(ElementId::Button(ButtonId::Copy(FieldId::Output(1)))),
            now,
        );
        assert!(!panels.has_pending());
        assert!(panels.is_visible(FieldId::Output(1)));
    }

    #[test]
    fn refocus_cancels_a_pending_hide() {
        let now = Instant::now();
        let mut panels = ShortcutPanels::default();
        panels.on_focus(FieldId::InputText);
        panels.on_blur(FieldId::InputText, None, now);
        panels.on_focus(FieldId::InputText);
        assert!(!panels.hide_expired(now + HIDE_DELAY));
        assert!(panels.is_visible(FieldId::InputText));
    }

    #[test]
    fn non_text_areas_have_no_panel() {
        let mut panels = ShortcutPanels::default();
        panels.on_focus(FieldId::Tone);
        assert!(!panels.is_visible(FieldId::Tone));
    }

    #[test]
    fn copy_requires_visible_text() {
        assert!(!copy_visible("  \n"));
        assert!(copy_visible(" hi "));
    }
}
