//! Keyboard navigation across the form.
//!
//! The navigable list has fixed slots: API key, responder name, input text,
//! then every output present. The first three slots exist even when the page
//! lacks the element, so digit and arrow targets keep their positions.

use replykit_types::{ERROR_FOCUS_ORDER, ElementId, FieldId, FieldKind};
use tracing::debug;

use crate::page::PageView;

/// Index of the input text slot.
pub const INPUT_SLOT: usize = 2;
/// Index of the first output slot.
pub const FIRST_OUTPUT_SLOT: usize = 3;

/// Ordered focus targets for arrow and digit keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigableList {
    slots: Vec<Option<FieldId>>,
}

impl NavigableList {
    /// Derives the list from what the page currently renders.
    pub fn from_page(page: &impl PageView) -> Self {
        let fixed = [FieldId::ApiKey, FieldId::ResponderName, FieldId::InputText]
            .into_iter()
            .map(|field| page.has_field(field).then_some(field));
        let outputs = page.output_fields().into_iter().map(Some);
        Self {
            slots: fixed.chain(outputs).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Element at `index`, `None` when the slot is empty or out of range.
    pub fn target(&self, index: usize) -> Option<FieldId> {
        self.slots.get(index).copied().flatten()
    }

    pub fn position(&self, field: FieldId) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(field))
    }

    pub fn outputs(&self) -> &[Option<FieldId>] {
        self.slots.get(FIRST_OUTPUT_SLOT..).unwrap_or(&[])
    }

    pub fn output_count(&self) -> usize {
        self.outputs().len()
    }
}

/// Keys the navigation layer interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    Digit(u8),
    Enter,
}

/// What to do with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    /// Leave the key to the focused widget.
    Default,
    /// Focus the slot at this index and select its content.
    Navigate(usize),
    /// Consume the key without doing anything.
    Suppress,
    /// Press the submit button.
    Submit,
}

/// Resolves `key` pressed while `focused` has focus.
pub fn resolve_key(list: &NavigableList, focused: Option<ElementId>, key: NavKey) -> NavAction {
    let focused_field = focused.and_then(|element| element.field());
    match key {
        NavKey::ArrowUp | NavKey::ArrowDown => resolve_arrow(list, focused_field, key == NavKey::ArrowUp),
        NavKey::Digit(digit) => resolve_digit(list, focused_field, digit),
        NavKey::Enter => {
            if focused_field.is_some_and(|field| field.kind() == FieldKind::Select) {
                debug!("Enter key pressed in dropdown. Preventing submission.");
                NavAction::Suppress
            } else {
                debug!("Enter key pressed. Triggering submit.");
                NavAction::Submit
            }
        }
    }
}

fn resolve_arrow(list: &NavigableList, focused: Option<FieldId>, up: bool) -> NavAction {
    let Some(index) = focused.and_then(|field| list.position(field)) else {
        return NavAction::Default;
    };

    if !up && list.output_count() == 1 && index >= FIRST_OUTPUT_SLOT {
        debug!("ArrowDown key uses default action because an output textarea is active and there is only one output.");
        return NavAction::Default;
    }

    let last = list.len() - 1;
    if (up && index == 0) || (!up && index == last) {
        debug!("Arrow key at boundary element. Using default action.");
        return NavAction::Default;
    }

    NavAction::Navigate(if up { index - 1 } else { index + 1 })
}

fn resolve_digit(list: &NavigableList, focused: Option<FieldId>, digit: u8) -> NavAction {
    let outputs = list.output_count();
    if outputs == 0 || focused.is_some_and(|field| field.kind() == FieldKind::Number) {
        return NavAction::Default;
    }
    match usize::from(digit) {
        0 => NavAction::Navigate(INPUT_SLOT),
        k if k <= outputs => NavAction::Navigate(k - 1 + FIRST_OUTPUT_SLOT),
        _ => NavAction::Default,
    }
}

/// Field that should hold focus when the page (re)loads.
///
/// A field whose error slot shows a message wins, then an empty API key, then
/// the first output on the result view, then the input text.
pub fn initial_focus(page: &impl PageView) -> Option<FieldId> {
    for slot in ERROR_FOCUS_ORDER {
        let has_message = page.error_text(slot).is_some_and(|text| !text.trim().is_empty());
        let target = slot.target_field();
        if has_message && page.has_field(target) {
            debug!("Focused on input with ID: {target}");
            return Some(target);
        }
    }

    let api_key_present = page.value(FieldId::ApiKey).is_some_and(|value| !value.trim().is_empty());
    if !api_key_present {
        debug!("No API key found. Focusing on API key input.");
        return page.has_field(FieldId::ApiKey).then_some(FieldId::ApiKey);
    }

    if page.location_path() == "/submit" && page.has_field(FieldId::Output(1)) {
        debug!("Location is /submit. Focusing on the first output textarea.");
        return Some(FieldId::Output(1));
    }

    page.has_field(FieldId::InputText).then_some(FieldId::InputText)
}
