//! Runtime: event loop and input routing for the form UI.
//!
//! Responsibilities
//! - Own the terminal lifecycle (enter/leave alternate screen, raw mode,
//!   mouse capture and bracketed paste).
//! - Drive a single event loop over terminal input, internal messages
//!   (sequencer status writes, submit-ready signals), submissions in flight
//!   and the UI ticker.
//! - Execute the `Effect`s components return and render after every change.
//!
//! Ticking is fast (50 ms) only while a button press or shortcut panel
//! deadline is pending, and slow (5 s) otherwise.

use std::{io::Stdout, sync::Arc, time::Duration};

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, KeyCode,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use rat_focus::FocusBuilder;
use ratatui::{Terminal, prelude::CrosstermBackend};
use replykit_engine::FormStore;
use replykit_types::{Effect, Msg, SubmitOutcome};
use replykit_util::Location;
use tokio::{
    signal,
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::warn;

use crate::{
    app::App,
    cmd,
    submit::FormSubmitter,
    ui::{components::component::Component, main_component::MainView},
};

const FAST_TICK: Duration = Duration::from_millis(50);
const IDLE_TICK: Duration = Duration::from_millis(5000);

/// Spawn the input task that polls the terminal and forwards `crossterm`
/// events over a channel.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);
    tokio::task::spawn_blocking(move || {
        let poll_interval = Duration::from_millis(16);
        loop {
            match event::poll(poll_interval) {
                Ok(false) => {
                    if sender.is_closed() {
                        break;
                    }
                }
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if let Err(e) = sender.blocking_send(event) {
                            warn!("Failed to send event: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read event: {}", e);
                        break;
                    }
                },
                Err(e) => {
                    warn!("Failed to poll events: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Rebuilds focus for the current page, applies requested focus and draws.
fn render(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App, main_view: &mut MainView) -> Result<()> {
    let old_focus = std::mem::take(&mut app.focus);
    app.focus = FocusBuilder::rebuild_for(&app.form, Some(old_focus));
    app.apply_pending_focus();
    terminal.draw(|frame| main_view.render(frame, frame.area(), app))?;
    Ok(())
}

fn handle_input_event(app: &mut App, main_view: &mut MainView, input_event: Event) -> Vec<Effect> {
    match input_event {
        Event::Key(key_event) => main_view.handle_key_events(app, key_event),
        Event::Mouse(mouse_event) => main_view.handle_mouse_events(app, mouse_event),
        Event::Paste(text) => main_view.handle_paste(app, &text),
        Event::Resize(width, height) => main_view.handle_message(app, &Msg::Resize(width, height)),
        Event::FocusGained | Event::FocusLost => Vec::new(),
    }
}

/// Runs the form until Ctrl+C and returns the final location.
pub async fn run_app(store: FormStore, submitter: Arc<dyn FormSubmitter>) -> Result<Location> {
    let mut input_receiver = spawn_input_thread();
    let (msg_sender, mut msg_receiver) = mpsc::unbounded_channel::<Msg>();
    let mut main_view = MainView::new();
    let mut app = App::new(store, submitter, msg_sender);
    let mut terminal = setup_terminal()?;

    let mut pending_submits: FuturesUnordered<JoinHandle<SubmitOutcome>> = FuturesUnordered::new();
    let mut current_interval = IDLE_TICK;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    render(&mut terminal, &mut app, &mut main_view)?;

    loop {
        let target_interval = if app.needs_animation() { FAST_TICK } else { IDLE_TICK };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = time::interval(current_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let mut effects = Vec::new();
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    break;
                };
                if let Event::Key(key_event) = &event
                    && key_event.code == KeyCode::Char('c')
                    && key_event.modifiers.contains(KeyModifiers::CONTROL)
                {
                    break;
                }
                effects.extend(handle_input_event(&mut app, &mut main_view, event));
            }

            Some(msg) = msg_receiver.recv() => {
                effects.extend(main_view.handle_message(&mut app, &msg));
            }

            Some(joined) = pending_submits.next(), if !pending_submits.is_empty() => {
                let outcome = joined.unwrap_or_else(|error| SubmitOutcome::Failed(format!("submission task failed: {error}")));
                effects.extend(main_view.handle_message(&mut app, &Msg::SubmitCompleted(outcome)));
            }

            _ = ticker.tick() => {
                effects.extend(main_view.handle_message(&mut app, &Msg::Tick));
            }

            _ = signal::ctrl_c() => { break; }
        }

        if !effects.is_empty() {
            pending_submits.extend(cmd::run_from_effects(&mut app, effects));
        }
        render(&mut terminal, &mut app, &mut main_view)?;
    }

    app.sequencer.reset();
    cleanup_terminal(&mut terminal)?;
    Ok(app.location().clone())
}
