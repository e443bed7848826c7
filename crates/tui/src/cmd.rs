//! Command execution layer.
//!
//! Effects returned by components are translated into [`Cmd`]s and executed
//! here. Clipboard writes and starting the loading sequence complete
//! immediately; the real form submission runs as a task whose outcome the
//! runtime feeds back as [`Msg::SubmitCompleted`](replykit_types::Msg).

use arboard::Clipboard;
use replykit_types::{Effect, FieldId, SubmitOutcome};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{app::App, submit::SubmitRequest};

/// Represents a side-effecting command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Write the text of a text area to the system clipboard.
    ClipboardSet { field: FieldId, text: String },
    /// Run the loading sequence for this many outputs.
    StartLoading { num_outputs: usize },
    /// Post the form.
    Submit(SubmitRequest),
}

pub fn from_effects(app: &App, effects: Vec<Effect>) -> Vec<Cmd> {
    effects
        .into_iter()
        .map(|effect| match effect {
            Effect::SubmitRequested { num_outputs } => Cmd::StartLoading { num_outputs },
            Effect::SubmitForm => Cmd::Submit(app.submit_request()),
            Effect::CopyToClipboard { field, text } => Cmd::ClipboardSet { field, text },
        })
        .collect()
}

/// Executes `commands`, returning the handles of submissions in flight.
pub fn run_cmds(app: &mut App, commands: Vec<Cmd>) -> Vec<JoinHandle<SubmitOutcome>> {
    let mut pending = Vec::new();
    for command in commands {
        match command {
            Cmd::ClipboardSet { field, text } => execute_clipboard_set(field, &text),
            Cmd::StartLoading { num_outputs } => app.start_loading(num_outputs),
            Cmd::Submit(request) => pending.push(execute_submit(app, request)),
        }
    }
    pending
}

pub fn run_from_effects(app: &mut App, effects: Vec<Effect>) -> Vec<JoinHandle<SubmitOutcome>> {
    let commands = from_effects(app, effects);
    run_cmds(app, commands)
}

fn execute_clipboard_set(field: FieldId, text: &str) {
    match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
        Ok(()) => info!("Text copied to clipboard from {field}."),
        Err(err) => error!("Failed to copy text from {field}: {err}"),
    }
}

fn execute_submit(app: &App, request: SubmitRequest) -> JoinHandle<SubmitOutcome> {
    let submitter = app.submitter.clone();
    tokio::spawn(async move {
        submitter
            .submit(request)
            .await
            .unwrap_or_else(|err| SubmitOutcome::Failed(err.to_string()))
    })
}
