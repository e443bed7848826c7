//! # Replykit TUI
//!
//! Terminal rendition of the reply form. The page (API key, responder name,
//! reply settings, the message to answer and the generated responses) is
//! drawn with `ratatui`, keyboard focus is managed with `rat-focus`, and the
//! form behavior (navigation, persistence, the loading sequence) comes from
//! `replykit-engine`.
//!
//! ## Architecture
//!
//! - **`app`**: application state and the message reducer
//! - **`cmd`**: effect execution (clipboard, loading sequence, submission)
//! - **`submit`**: the HTTP form submission
//! - **`ui`**: components, theme and the event loop

pub mod app;
mod cmd;
pub mod submit;
pub mod ui;

use std::sync::Arc;

use anyhow::Result;
use replykit_engine::FormStore;
use replykit_util::{Location, Settings};
use tracing::info;

pub use submit::{FormSubmitter, HttpSubmitter, SubmitError, SubmitRequest};

/// Runs the form against the server configured in `settings` and returns
/// the location the form ended on.
pub async fn run(settings: &Settings, store: FormStore) -> Result<Location> {
    let submitter = HttpSubmitter::new(settings.submit_endpoint()?)?;
    info!("Form submissions go to {}.", submitter.endpoint());
    ui::runtime::run_app(store, Arc::new(submitter)).await
}
