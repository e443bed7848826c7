//! Element registry of the form page.
//!
//! Every element the page renders is registered here under its typed id:
//! field values with their focus flags, the copy buttons attached to text
//! areas, the submit button and the error slots. Lookups of elements the
//! page does not render return `None`.

use indexmap::IndexMap;
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;
use replykit_engine::{FormStore, PageView, uniqueness_attempts};
use replykit_types::{ButtonId, ElementId, ErrorSlot, FieldId, FieldKind, MAX_OUTPUTS, SETTINGS_FIELDS};
use tracing::warn;

use crate::ui::components::{common::TextInputState, textarea::copy_visible};

/// One editable field.
#[derive(Debug, Clone)]
pub struct FieldState {
    pub input: TextInputState,
    pub focus: FocusFlag,
}

impl FieldState {
    fn new(field: FieldId, value: String) -> Self {
        Self {
            input: TextInputState::with_input(value),
            focus: FocusFlag::named(&field.name()),
        }
    }
}

#[derive(Debug)]
pub struct FormState {
    fields: IndexMap<FieldId, FieldState>,
    copy_buttons: IndexMap<FieldId, FocusFlag>,
    submit: FocusFlag,
    errors: IndexMap<ErrorSlot, String>,
    path: String,
    container: FocusFlag,
    pub area: Rect,
}

/// Fields above the submit button, in page order.
pub fn leading_fields() -> impl Iterator<Item = FieldId> {
    [FieldId::ApiKey, FieldId::ResponderName]
        .into_iter()
        .chain(SETTINGS_FIELDS)
        .chain([FieldId::UniquenessAttempts, FieldId::InputText])
}

impl FormState {
    /// Builds the page with initial values from `store`. The uniqueness
    /// attempts are derived from the input text rather than restored.
    pub fn new(store: &FormStore) -> Self {
        let fields = leading_fields()
            .map(|field| (field, FieldState::new(field, store.initial_value(field))))
            .collect();
        let mut state = Self {
            fields,
            copy_buttons: IndexMap::new(),
            submit: FocusFlag::named("submit"),
            errors: IndexMap::new(),
            path: store.location().path().to_string(),
            container: FocusFlag::named("form"),
            area: Rect::default(),
        };
        state.copy_buttons.insert(FieldId::InputText, FocusFlag::named("copy.input_text"));
        state.refresh_uniqueness_attempts();
        state
    }

    pub fn field(&self, field: FieldId) -> Option<&FieldState> {
        self.fields.get(&field)
    }

    pub fn field_mut(&mut self, field: FieldId) -> Option<&mut FieldState> {
        self.fields.get_mut(&field)
    }

    pub fn set_value(&mut self, field: FieldId, value: impl Into<String>) {
        match self.fields.get_mut(&field) {
            Some(state) => state.input.set_input(value),
            None => warn!("Field {field} not found; value not set."),
        }
    }

    /// Overwrites the uniqueness attempts with the value derived from the
    /// input text.
    pub fn refresh_uniqueness_attempts(&mut self) {
        let attempts = uniqueness_attempts(self.value(FieldId::InputText).unwrap_or_default());
        self.set_value(FieldId::UniquenessAttempts, attempts.to_string());
    }

    /// Number of outputs requested, clamped to the accepted range.
    pub fn requested_outputs(&self) -> usize {
        self.value(FieldId::NumOutputs)
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_OUTPUTS)
    }

    /// Replaces the output text areas with `texts`.
    pub fn set_outputs(&mut self, texts: &[String]) {
        self.fields.retain(|field, _| !field.is_output());
        self.copy_buttons.retain(|field, _| !field.is_output());
        for (offset, text) in texts.iter().enumerate() {
            let field = FieldId::Output(offset + 1);
            self.fields.insert(field, FieldState::new(field, text.clone()));
            self.copy_buttons
                .insert(field, FocusFlag::named(&format!("copy.{}", field.name())));
        }
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn set_error(&mut self, slot: ErrorSlot, message: impl Into<String>) {
        self.errors.insert(slot, message.into());
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
    }

    /// Copy button of `field`, when the field is a text area with text.
    pub fn visible_copy_button(&self, field: FieldId) -> Option<&FocusFlag> {
        let text = self.value(field)?;
        copy_visible(text).then(|| self.copy_buttons.get(&field)).flatten()
    }

    /// Focus flag of an element the page currently renders.
    pub fn flag(&self, element: ElementId) -> Option<&FocusFlag> {
        match element {
            ElementId::Field(field) => self.fields.get(&field).map(|state| &state.focus),
            ElementId::Button(ButtonId::Submit) => Some(&self.submit),
            ElementId::Button(ButtonId::Copy(field)) => self.visible_copy_button(field),
        }
    }

    /// Focusable elements in tab order.
    pub fn elements(&self) -> Vec<ElementId> {
        let mut elements = Vec::with_capacity(self.fields.len() * 2 + 1);
        for field in self.fields.keys() {
            if field.is_output() && !elements.contains(&ElementId::Button(ButtonId::Submit)) {
                elements.push(ElementId::Button(ButtonId::Submit));
            }
            elements.push(ElementId::Field(*field));
            if self.visible_copy_button(*field).is_some() {
                elements.push(ElementId::Button(ButtonId::Copy(*field)));
            }
        }
        if !elements.contains(&ElementId::Button(ButtonId::Submit)) {
            elements.push(ElementId::Button(ButtonId::Submit));
        }
        elements
    }

    pub fn focused_element(&self) -> Option<ElementId> {
        self.elements()
            .into_iter()
            .find(|element| self.flag(*element).is_some_and(FocusFlag::get))
    }

    pub fn focused_field(&self) -> Option<FieldId> {
        self.focused_element().and_then(|element| element.field())
    }

    /// Form body of the submission, in page order.
    pub fn form_body(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|(field, _)| !field.is_output())
            .map(|(field, state)| (field.name(), state.input.input().to_string()))
            .collect()
    }

    /// Whether focusing `field` selects its content.
    pub fn is_text_like(field: FieldId) -> bool {
        matches!(field.kind(), FieldKind::Text | FieldKind::Secret | FieldKind::TextArea)
    }
}

impl PageView for FormState {
    fn has_field(&self, field: FieldId) -> bool {
        self.fields.contains_key(&field)
    }

    fn value(&self, field: FieldId) -> Option<&str> {
        self.fields.get(&field).map(|state| state.input.input())
    }

    fn output_fields(&self) -> Vec<FieldId> {
        self.fields.keys().copied().filter(FieldId::is_output).collect()
    }

    fn error_text(&self, slot: ErrorSlot) -> Option<&str> {
        self.errors.get(&slot).map(String::as_str)
    }

    fn location_path(&self) -> &str {
        &self.path
    }
}

impl HasFocus for FormState {
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        for element in self.elements() {
            if let Some(flag) = self.flag(element) {
                builder.leaf_widget(flag);
            }
        }
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container.clone()
    }

    fn area(&self) -> Rect {
        self.area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replykit_util::{CookieJar, Location};

    fn form(url: &str) -> FormState {
        let location = Location::parse(url).expect("location");
        FormState::new(&FormStore::new(CookieJar::ephemeral(), location))
    }

    #[test]
    fn starts_without_outputs_and_derived_attempts() {
        let state = form("http://127.0.0.1:5000/?uniqueness_attempts=2&tone=friendly");
        assert!(state.output_fields().is_empty());
        assert_eq!(state.value(FieldId::Tone), Some("friendly"));
        assert_eq!(state.value(FieldId::UniquenessAttempts), Some("5"));
        assert_eq!(state.value(FieldId::Output(1)), None);
    }

    #[test]
    fn tab_order_places_outputs_after_submit() {
        let mut state = form("http://127.0.0.1:5000/");
        state.set_value(FieldId::InputText, "hello");
        state.set_outputs(&["one".into(), String::new()]);
        let elements = state.elements();
        let submit = elements
            .iter()
            .position(|element| *element == ElementId::Button(ButtonId::Submit))
            .expect("submit");
        assert_eq!(elements[submit - 1], ElementId::Button(ButtonId::Copy(FieldId::InputText)));
        assert_eq!(
            &elements[submit + 1..],
            &[
                ElementId::Field(FieldId::Output(1)),
                ElementId::Button(ButtonId::Copy(FieldId::Output(1))),
                ElementId::Field(FieldId::Output(2)),
            ]
        );
    }

    #[test]
    fn requested_outputs_are_clamped() {
        let mut state = form("http://127.0.0.1:5000/");
        assert_eq!(state.requested_outputs(), 1);
        state.set_value(FieldId::NumOutputs, "42");
        assert_eq!(state.requested_outputs(), MAX_OUTPUTS);
        state.set_value(FieldId::NumOutputs, "abc");
        assert_eq!(state.requested_outputs(), 1);
    }

    #[test]
    fn form_body_excludes_outputs() {
        let mut state = form("http://127.0.0.1:5000/");
        state.set_outputs(&["reply".into()]);
        let names: Vec<String> = state.form_body().into_iter().map(|(name, _)| name).collect();
        assert!(names.contains(&"uniqueness_attempts".to_string()));
        assert!(!names.iter().any(|name| name.starts_with("output_text_")));
    }
}
