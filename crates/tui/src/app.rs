//! Application state and the message reducer of the form UI.
//!
//! [`App`] owns the page (form registry, status display, button and text
//! area feedback), the persistence stores and the loading sequencer.
//! Components mutate it in response to input; [`App::update`] folds internal
//! messages into it and returns the [`Effect`]s the runtime executes.

use std::sync::Arc;

use rat_focus::Focus;
use replykit_engine::{FormStore, LoadingSequencer, NavigableList, PageView, StatusSurface, initial_focus};
use replykit_types::{ButtonId, Effect, ElementId, ErrorSlot, FieldId, Msg, SubmitOutcome};
use replykit_util::Location;
use tokio::{sync::mpsc::UnboundedSender, time::Instant};
use tracing::{debug, error, info, warn};

use crate::{
    submit::{FormSubmitter, SubmitRequest},
    ui::{
        components::{
            button::ButtonFeedback,
            form::FormState,
            status::{ChannelStatusSurface, StatusState},
            textarea::{ShortcutPanels, copy_visible},
        },
        theme::{self, Theme},
    },
};

pub struct App {
    pub theme: Box<dyn Theme>,
    /// Element registry of the page
    pub form: FormState,
    /// Cookie jar and location the tracked fields mirror into
    pub store: FormStore,
    pub status: StatusState,
    pub buttons: ButtonFeedback,
    pub shortcuts: ShortcutPanels,
    pub sequencer: LoadingSequencer,
    pub focus: Focus,
    pub submitter: Arc<dyn FormSubmitter>,
    messages: UnboundedSender<Msg>,
    last_focused: Option<ElementId>,
    pending_focus: Option<ElementId>,
}

impl App {
    /// Loads the page: initial values come from `store`, and initial focus
    /// is requested for the next focus rebuild.
    pub fn new(store: FormStore, submitter: Arc<dyn FormSubmitter>, messages: UnboundedSender<Msg>) -> Self {
        let surface: Arc<dyn StatusSurface> = Arc::new(ChannelStatusSurface::new(messages.clone()));
        let form = FormState::new(&store);
        let mut app = Self {
            theme: theme::load_from_env(),
            form,
            store,
            status: StatusState::default(),
            buttons: ButtonFeedback::default(),
            shortcuts: ShortcutPanels::default(),
            sequencer: LoadingSequencer::new(Some(surface)),
            focus: Focus::default(),
            submitter,
            messages,
            last_focused: None,
            pending_focus: None,
        };
        app.request_initial_focus();
        app
    }

    pub fn location(&self) -> &Location {
        self.store.location()
    }

    pub fn update(&mut self, msg: &Msg) -> Vec<Effect> {
        match msg {
            Msg::Tick => {
                let now = Instant::now();
                self.buttons.release_expired(now);
                self.shortcuts.hide_expired(now);
                Vec::new()
            }
            Msg::Resize(..) => Vec::new(),
            Msg::Status(update) => {
                self.status.apply(update);
                Vec::new()
            }
            Msg::SubmitReady => vec![Effect::SubmitForm],
            Msg::SubmitCompleted(outcome) => {
                self.apply_submit_outcome(outcome);
                Vec::new()
            }
        }
    }

    /// Whether timers are pending that need fast ticks.
    pub fn needs_animation(&self) -> bool {
        self.buttons.has_pending() || self.shortcuts.has_pending()
    }

    /// Presses the submit button and intercepts the submission.
    pub fn press_submit(&mut self) -> Vec<Effect> {
        self.buttons.press(ButtonId::Submit, Instant::now());
        vec![Effect::SubmitRequested {
            num_outputs: self.form.requested_outputs(),
        }]
    }

    /// Presses the copy button of `field`.
    pub fn press_copy(&mut self, field: FieldId) -> Vec<Effect> {
        let Some(text) = self.form.value(field) else {
            warn!("Text area {field} not found; nothing to copy.");
            return Vec::new();
        };
        if !copy_visible(text) {
            debug!("Copy button of {field} is hidden; ignoring.");
            return Vec::new();
        }
        let text = text.to_string();
        self.buttons.press(ButtonId::Copy(field), Instant::now());
        vec![Effect::CopyToClipboard { field, text }]
    }

    pub fn activate(&mut self, button: ButtonId) -> Vec<Effect> {
        match button {
            ButtonId::Submit => self.press_submit(),
            ButtonId::Copy(field) => self.press_copy(field),
        }
    }

    /// Starts the loading sequence; the real submission is signalled back
    /// through [`Msg::SubmitReady`] once it completes.
    pub fn start_loading(&mut self, num_outputs: usize) {
        let messages = self.messages.clone();
        // The handle is not awaited; the run logs its own outcome.
        let _run = self.sequencer.show_loading(num_outputs, move || {
            messages
                .send(Msg::SubmitReady)
                .map_err(|_| anyhow::anyhow!("the form is no longer running"))
        });
    }

    /// Snapshot of what the real submission posts.
    pub fn submit_request(&self) -> SubmitRequest {
        SubmitRequest {
            fields: self.form.form_body(),
            cookies: self.store.jar().header_value(),
        }
    }

    /// Input event on `field`: derived values are refreshed and tracked
    /// values persisted.
    pub fn on_field_input(&mut self, field: FieldId) {
        if field == FieldId::InputText {
            self.form.refresh_uniqueness_attempts();
        }
        if let Err(error) = self.store.record_input(field, &self.form) {
            error!("Failed to persist \"{field}\": {error}");
        }
    }

    /// Focuses the navigable list slot at `index` and selects its content.
    pub fn navigate_to(&mut self, index: usize) {
        let list = NavigableList::from_page(&self.form);
        let Some(field) = list.target(index) else {
            warn!("Navigable element at index {index} not found.");
            return;
        };
        self.focus_element(ElementId::Field(field));
        if let Some(state) = self.form.field_mut(field) {
            state.input.select_all();
        }
    }

    pub fn focus_element(&mut self, element: ElementId) {
        match self.form.flag(element).cloned() {
            Some(flag) => {
                self.focus.focus(&flag);
                self.sync_focus();
            }
            None => warn!("Element {element:?} not found; focus unchanged."),
        }
    }

    /// Focus to apply once the focus structure includes the element.
    pub fn request_focus(&mut self, element: ElementId) {
        self.pending_focus = Some(element);
    }

    pub fn apply_pending_focus(&mut self) {
        if let Some(element) = self.pending_focus.take() {
            self.focus_element(element);
        }
    }

    /// Runs the focus and blur hooks when the focused element changed.
    pub fn sync_focus(&mut self) {
        let current = self.form.focused_element();
        if current == self.last_focused {
            return;
        }
        let now = Instant::now();
        if let Some(ElementId::Field(previous)) = self.last_focused {
            if let Some(state) = self.form.field_mut(previous) {
                state.input.clear_selection();
            }
            self.shortcuts.on_blur(previous, current, now);
        }
        if let Some(ElementId::Field(field)) = current {
            if FormState::is_text_like(field)
                && let Some(state) = self.form.field_mut(field)
            {
                state.input.select_all();
            }
            self.shortcuts.on_focus(field);
        }
        self.last_focused = current;
    }

    fn request_initial_focus(&mut self) {
        match initial_focus(&self.form) {
            Some(field) => self.request_focus(ElementId::Field(field)),
            None => warn!("No element available for initial focus."),
        }
    }

    fn apply_submit_outcome(&mut self, outcome: &SubmitOutcome) {
        self.form.clear_errors();
        match outcome {
            SubmitOutcome::Rendered(response) => {
                info!("Form submitted; {} output(s) rendered.", response.output_texts.len());
                self.form.set_outputs(&response.output_texts);
                for (id, message) in &response.errors {
                    match ErrorSlot::from_id(id) {
                        Some(slot) => self.form.set_error(slot, flash_message(message)),
                        None => warn!("Unknown error slot \"{id}\" in submission response."),
                    }
                }
                self.load_result_view();
            }
            SubmitOutcome::Accepted { status } => {
                info!("Form submitted with status {status}; the response carried no rendered result.");
                self.load_result_view();
            }
            SubmitOutcome::Failed(message) => {
                error!("Form submission failed: {message}");
                self.form.set_error(ErrorSlot::Output, flash_message(message));
                self.sequencer.reset();
                self.request_initial_focus();
            }
        }
    }

    fn load_result_view(&mut self) {
        self.store.location_mut().navigate("/submit");
        self.form.set_path(self.store.location().path());
        self.sequencer.reset();
        let form = &self.form;
        self.shortcuts.retain(|field| form.field(field).is_some());
        self.request_initial_focus();
    }
}

/// Error text as the page shows it.
fn flash_message(message: &str) -> String {
    if message.starts_with("Error:") {
        message.to_string()
    } else {
        format!("Error: {message}")
    }
}
