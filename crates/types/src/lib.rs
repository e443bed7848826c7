//! Shared types for the replykit workspace.
//!
//! The form page is described here as typed identifiers rather than string
//! element ids: every crate that needs to talk about "the API key field" or
//! "the second output" uses [`FieldId`] / [`ElementId`], and only the edges
//! (cookies, query parameters, form bodies) turn them into wire names.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maximum number of outputs the form accepts.
pub const MAX_OUTPUTS: usize = 10;

/// Identifies one field on the form page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    ApiKey,
    ResponderName,
    Dialect,
    Formality,
    Tone,
    Creativity,
    Channel,
    Greetings,
    SentenceLimit,
    NumOutputs,
    UniquenessAttempts,
    InputText,
    /// Output text area, 1-based.
    Output(usize),
}

/// Fields whose values are mirrored into cookies and location parameters.
pub const TRACKED_FIELDS: [FieldId; 10] = [
    FieldId::ResponderName,
    FieldId::Dialect,
    FieldId::Formality,
    FieldId::Tone,
    FieldId::Creativity,
    FieldId::Channel,
    FieldId::Greetings,
    FieldId::SentenceLimit,
    FieldId::NumOutputs,
    FieldId::UniquenessAttempts,
];

/// Settings fields in the order they appear on the page.
pub const SETTINGS_FIELDS: [FieldId; 8] = [
    FieldId::Dialect,
    FieldId::Formality,
    FieldId::Tone,
    FieldId::Creativity,
    FieldId::Channel,
    FieldId::Greetings,
    FieldId::SentenceLimit,
    FieldId::NumOutputs,
];

/// How a field behaves when it has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single line text input.
    Text,
    /// Single line text input rendered masked.
    Secret,
    /// Multi-line text area with copy button and shortcut panel.
    TextArea,
    /// Dropdown-style control cycling through fixed options.
    Select,
    /// Numeric input.
    Number,
}

impl FieldId {
    /// Wire name used for cookies, query parameters and form bodies.
    pub fn name(&self) -> String {
        match self {
            FieldId::ApiKey => "api_key".into(),
            FieldId::ResponderName => "responder_name".into(),
            FieldId::Dialect => "dialect".into(),
            FieldId::Formality => "formality".into(),
            FieldId::Tone => "tone".into(),
            FieldId::Creativity => "creativity".into(),
            FieldId::Channel => "channel".into(),
            FieldId::Greetings => "greetings".into(),
            FieldId::SentenceLimit => "sentence_limit".into(),
            FieldId::NumOutputs => "num_outputs".into(),
            FieldId::UniquenessAttempts => "uniqueness_attempts".into(),
            FieldId::InputText => "input_text".into(),
            FieldId::Output(index) => format!("output_text_{index}"),
        }
    }

    pub fn label(&self) -> String {
        match self {
            FieldId::ApiKey => "API key".into(),
            FieldId::ResponderName => "Your name".into(),
            FieldId::Dialect => "Dialect".into(),
            FieldId::Formality => "Formality".into(),
            FieldId::Tone => "Tone".into(),
            FieldId::Creativity => "Creativity".into(),
            FieldId::Channel => "Channel".into(),
            FieldId::Greetings => "Greetings".into(),
            FieldId::SentenceLimit => "Sentence limit".into(),
            FieldId::NumOutputs => "Responses".into(),
            FieldId::UniquenessAttempts => "Uniqueness attempts".into(),
            FieldId::InputText => "Message to reply to".into(),
            FieldId::Output(index) => format!("Response {index}"),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldId::ApiKey => FieldKind::Secret,
            FieldId::ResponderName => FieldKind::Text,
            FieldId::Dialect
            | FieldId::Formality
            | FieldId::Tone
            | FieldId::Creativity
            | FieldId::Channel
            | FieldId::Greetings
            | FieldId::SentenceLimit => FieldKind::Select,
            FieldId::NumOutputs | FieldId::UniquenessAttempts => FieldKind::Number,
            FieldId::InputText | FieldId::Output(_) => FieldKind::TextArea,
        }
    }

    /// Options offered by select fields; empty for every other kind.
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            FieldId::Dialect => &["american", "british", "australian", "canadian"],
            FieldId::Formality => &["casual", "neutral", "formal"],
            FieldId::Tone => &["friendly", "neutral", "professional", "empathetic", "enthusiastic"],
            FieldId::Creativity => &["low", "med", "high"],
            FieldId::Channel => &["chat", "email", "sms", "social"],
            FieldId::Greetings => &["include", "exclude"],
            FieldId::SentenceLimit => &["none", "1", "2", "3", "4", "5"],
            _ => &[],
        }
    }

    /// Value used when neither the location nor the cookie jar provide one.
    pub fn default_value(&self) -> &'static str {
        match self {
            FieldId::Dialect => "american",
            FieldId::Formality => "neutral",
            FieldId::Tone => "neutral",
            FieldId::Channel => "chat",
            FieldId::Greetings => "include",
            FieldId::Creativity => "med",
            FieldId::SentenceLimit => "none",
            FieldId::NumOutputs => "1",
            FieldId::UniquenessAttempts => "5",
            _ => "",
        }
    }

    /// Whether values of this field are mirrored into cookies and the location.
    pub fn is_tracked(&self) -> bool {
        TRACKED_FIELDS.contains(self)
    }

    /// Whether the field may be restored from location parameters.
    ///
    /// Secrets and free text never travel in the location.
    pub fn restorable_from_location(&self) -> bool {
        !matches!(self, FieldId::ApiKey | FieldId::InputText | FieldId::Output(_))
    }

    pub fn is_output(&self) -> bool {
        matches!(self, FieldId::Output(_))
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Error message slots rendered next to fields after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSlot {
    InputText,
    Output,
    SentenceLimit,
    NumOutputs,
    ApiKey,
}

/// Error slots in the order initial focus checks them.
pub const ERROR_FOCUS_ORDER: [ErrorSlot; 5] = [
    ErrorSlot::InputText,
    ErrorSlot::Output,
    ErrorSlot::SentenceLimit,
    ErrorSlot::NumOutputs,
    ErrorSlot::ApiKey,
];

impl ErrorSlot {
    pub fn id(&self) -> &'static str {
        match self {
            ErrorSlot::InputText => "input-text-error",
            ErrorSlot::Output => "output-error",
            ErrorSlot::SentenceLimit => "sentence-limit-error",
            ErrorSlot::NumOutputs => "num-outputs-error",
            ErrorSlot::ApiKey => "api-key-error",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        ERROR_FOCUS_ORDER.into_iter().find(|slot| slot.id() == id)
    }

    /// Field that receives focus when this slot shows a message.
    pub fn target_field(&self) -> FieldId {
        match self {
            ErrorSlot::InputText => FieldId::InputText,
            ErrorSlot::Output => FieldId::Output(1),
            ErrorSlot::SentenceLimit => FieldId::SentenceLimit,
            ErrorSlot::NumOutputs => FieldId::NumOutputs,
            ErrorSlot::ApiKey => FieldId::ApiKey,
        }
    }
}

/// Clickable buttons on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Submit,
    /// Copy button attached to a text area.
    Copy(FieldId),
}

/// Any focusable element on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Field(FieldId),
    Button(ButtonId),
}

impl ElementId {
    pub fn field(&self) -> Option<FieldId> {
        match self {
            ElementId::Field(field) => Some(*field),
            ElementId::Button(_) => None,
        }
    }
}

impl From<FieldId> for ElementId {
    fn from(field: FieldId) -> Self {
        ElementId::Field(field)
    }
}

/// Severity carried on the wire to the log collection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON body posted to the log collection endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    /// `"{file_name} - {message}"`
    pub message: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

impl LogRecord {
    pub fn new(level: LogLevel, file_name: impl Into<String>, message: &str) -> Self {
        let file_name = file_name.into();
        Self {
            level,
            message: format!("{file_name} - {message}"),
            file_name,
        }
    }
}

/// A single write to the loading status display.
///
/// Every `Write` replaces the full displayed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Show,
    Hide,
    Write(String),
}

/// Rendered result of a form submission, when the server answers with JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub output_texts: Vec<String>,
    /// Error slot id (`api-key-error`, ...) to message.
    #[serde(default)]
    pub errors: IndexMap<String, String>,
}

/// What came back from the real form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server rendered a result the page can show.
    Rendered(SubmitResponse),
    /// The server accepted the post but answered with something other than JSON.
    Accepted { status: u16 },
    /// The submission never completed.
    Failed(String),
}

/// Messages that can be sent to update the application state.
#[derive(Debug, Clone)]
pub enum Msg {
    /// Periodic UI tick (button release, shortcut panel hide deadlines)
    Tick,
    /// Terminal resized
    Resize(u16, u16),
    /// The loading sequencer wrote to the status display
    Status(StatusUpdate),
    /// The loading sequence finished and the real submission may proceed
    SubmitReady,
    /// The real submission finished
    SubmitCompleted(SubmitOutcome),
}

/// Side effects that can be triggered by state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Intercepted form submit: run the loading sequence first
    SubmitRequested { num_outputs: usize },
    /// Perform the real form submission
    SubmitForm,
    /// Copy the given text area's content to the system clipboard
    CopyToClipboard { field: FieldId, text: String },
}
