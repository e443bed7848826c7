//! Mirrors tracked field values into the cookie jar and the location.

use replykit_types::{FieldId, TRACKED_FIELDS};
use replykit_util::{CookieJar, CookieJarError, Location};
use tracing::debug;

use crate::page::PageView;

const MAX_UNIQUENESS_ATTEMPTS: usize = 5;
const CHARS_PER_ATTEMPT: usize = 75;

/// Uniqueness attempts derived from the input text: one fewer for every 75
/// characters, never below one.
pub fn uniqueness_attempts(input_text: &str) -> usize {
    let length = input_text.chars().count();
    MAX_UNIQUENESS_ATTEMPTS.saturating_sub(length / CHARS_PER_ATTEMPT).max(1)
}

/// Owns the two stores form values persist to.
#[derive(Debug)]
pub struct FormStore {
    jar: CookieJar,
    location: Location,
}

impl FormStore {
    pub fn new(jar: CookieJar, location: Location) -> Self {
        Self { jar, location }
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn location_mut(&mut self) -> &mut Location {
        &mut self.location
    }

    /// Value a field starts with: the location parameter, then the cookie,
    /// then the field default. API key, input text and outputs are never read
    /// from the location.
    pub fn initial_value(&self, field: FieldId) -> String {
        let name = field.name();
        let from_location = field
            .restorable_from_location()
            .then(|| self.location.query_param(&name))
            .flatten();
        from_location
            .or_else(|| self.jar.get(&name).filter(|value| !value.is_empty()).map(str::to_string))
            .unwrap_or_else(|| field.default_value().to_string())
    }

    /// Writes every tracked field missing from the location with its initial
    /// value, so the location always describes the full configuration.
    pub fn fill_missing_location_params(&mut self) {
        let missing: Vec<(String, String)> = TRACKED_FIELDS
            .into_iter()
            .filter(|field| self.location.query_param(&field.name()).is_none())
            .map(|field| (field.name(), self.initial_value(field)))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        if missing.is_empty() {
            return;
        }
        debug!("Missing parameters detected: {missing:?}. Updating the location to include them.");
        self.location
            .replace_query_params(missing.iter().map(|(name, value)| (name.as_str(), value.as_str())));
    }

    /// Handles an input event on `field`.
    ///
    /// The lowercased value is stored as a cookie and every tracked field with
    /// a non-empty value is written to the location. Untracked fields are
    /// ignored. A cookie write failure is returned after the location has
    /// still been updated.
    pub fn record_input(&mut self, field: FieldId, page: &impl PageView) -> Result<(), CookieJarError> {
        if !field.is_tracked() {
            return Ok(());
        }
        let value = lowercase_value(page, field);
        debug!("Setting cookie \"{field}\" to \"{value}\".");
        let cookie_result = self.jar.set(&field.name(), &value);
        self.update_location_params(page);
        cookie_result
    }

    fn update_location_params(&mut self, page: &impl PageView) {
        debug!("Updating URL parameters.");
        let values: Vec<(String, String)> = TRACKED_FIELDS
            .into_iter()
            .map(|field| (field.name(), lowercase_value(page, field)))
            .filter(|(_, value)| !value.is_empty())
            .collect();
        self.location
            .replace_query_params(values.iter().map(|(name, value)| (name.as_str(), value.as_str())));
    }
}

fn lowercase_value(page: &impl PageView, field: FieldId) -> String {
    page.value(field).map(str::to_lowercase).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use replykit_types::ErrorSlot;
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct Page(HashMap<FieldId, String>);

    impl PageView for Page {
        fn has_field(&self, field: FieldId) -> bool {
            self.0.contains_key(&field)
        }

        fn value(&self, field: FieldId) -> Option<&str> {
            self.0.get(&field).map(String::as_str)
        }

        fn output_fields(&self) -> Vec<FieldId> {
            Vec::new()
        }

        fn error_text(&self, _slot: ErrorSlot) -> Option<&str> {
            None
        }

        fn location_path(&self) -> &str {
            "/"
        }
    }

    fn location(value: &str) -> Location {
        Location::parse(value).expect("location")
    }

    #[test]
    fn uniqueness_attempts_step_down_every_75_chars() {
        assert_eq!(uniqueness_attempts(""), 5);
        assert_eq!(uniqueness_attempts(&"a".repeat(74)), 5);
        assert_eq!(uniqueness_attempts(&"a".repeat(75)), 4);
        assert_eq!(uniqueness_attempts(&"a".repeat(375)), 1);
        assert_eq!(uniqueness_attempts(&"a".repeat(1000)), 1);
    }

    #[test]
    fn uniqueness_attempts_count_characters_not_bytes() {
        assert_eq!(uniqueness_attempts(&"é".repeat(74)), 5);
    }

    #[test]
    fn initial_values_prefer_location_then_cookie_then_default() {
        let mut jar = CookieJar::ephemeral();
        jar.set("tone", "friendly").expect("cookie");
        jar.set("dialect", "british").expect("cookie");
        jar.set("api_key", "sk-from-cookie").expect("cookie");
        let store = FormStore::new(jar, location("http://127.0.0.1:5000/?dialect=canadian&api_key=sk-from-url"));

        assert_eq!(store.initial_value(FieldId::Dialect), "canadian");
        assert_eq!(store.initial_value(FieldId::Tone), "friendly");
        assert_eq!(store.initial_value(FieldId::Channel), "chat");
        assert_eq!(store.initial_value(FieldId::ApiKey), "sk-from-cookie");
        assert_eq!(store.initial_value(FieldId::InputText), "");
    }

    #[test]
    fn input_lowercases_into_cookie_and_location() {
        let dir = tempdir().expect("tempdir");
        let jar = CookieJar::open(dir.path().join("cookies.json")).expect("jar");
        let mut store = FormStore::new(jar, location("http://127.0.0.1:5000/?ref=mail"));
        let page = Page(HashMap::from([
            (FieldId::ResponderName, "Ada Lovelace".to_string()),
            (FieldId::Tone, "Friendly".to_string()),
            (FieldId::NumOutputs, String::new()),
        ]));

        store.record_input(FieldId::ResponderName, &page).expect("record");

        assert_eq!(store.jar().get("responder_name"), Some("ada lovelace"));
        assert_eq!(store.jar().get("tone"), None);
        assert_eq!(
            store.location().to_string(),
            "http://127.0.0.1:5000/?ref=mail&responder_name=ada+lovelace&tone=friendly"
        );
        assert_eq!(store.location().history_len(), 0);

        let reopened = CookieJar::open(dir.path().join("cookies.json")).expect("reopen");
        assert_eq!(reopened.get("responder_name"), Some("ada lovelace"));
    }

    #[test]
    fn untracked_fields_are_not_persisted() {
        let mut store = FormStore::new(CookieJar::ephemeral(), location("http://127.0.0.1:5000/"));
        let page = Page(HashMap::from([(FieldId::InputText, "Hello".to_string())]));
        store.record_input(FieldId::InputText, &page).expect("record");
        assert!(store.jar().header_value().is_none());
        assert_eq!(store.location().to_string(), "http://127.0.0.1:5000/");
    }

    #[test]
    fn missing_params_are_filled_from_cookies_and_defaults() {
        let mut jar = CookieJar::ephemeral();
        jar.set("responder_name", "ada").expect("cookie");
        let mut store = FormStore::new(jar, location("http://127.0.0.1:5000/?tone=friendly"));
        store.fill_missing_location_params();

        let loc = store.location();
        assert_eq!(loc.query_param("tone").as_deref(), Some("friendly"));
        assert_eq!(loc.query_param("responder_name").as_deref(), Some("ada"));
        assert_eq!(loc.query_param("dialect").as_deref(), Some("american"));
        assert_eq!(loc.query_param("uniqueness_attempts").as_deref(), Some("5"));
        assert_eq!(loc.query_param("api_key"), None);
        assert_eq!(loc.history_len(), 0);
    }
}
