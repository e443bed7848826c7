//! The cancellable loading sequencer.
//!
//! A [`LoadingSequencer`] owns at most one [`LoadingRun`] at a time. A run is
//! one pass over a freshly built step plan: the step loop and the elapsed-time
//! renderer are separate tasks sharing the run's [`RunState`] behind a mutex,
//! and the run's [`CancellationToken`] stops both.
//!
//! Every display write of a run is made while holding that run's state lock
//! and only if the token is still live. [`LoadingSequencer::reset`] cancels
//! under the same lock, so once it returns nothing from the old run reaches
//! the status surface or the submit callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::progress::{progress_bar, status_text, step_message};
use super::steps::{Step, StepDuration, build_steps};

/// Period of the elapsed-time renderer.
pub const ELAPSED_TICK: Duration = Duration::from_millis(100);

/// Callback performing the real submission once the sequence completes.
pub type SubmitCallback = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Display the sequencer writes its status text to.
///
/// Each `write` replaces the whole displayed text.
pub trait StatusSurface: Send + Sync {
    fn show(&self);
    fn hide(&self);
    fn write(&self, text: &str);
}

#[derive(Debug, Error)]
pub enum SequencerError {
    /// The run was superseded or reset.
    #[error("loading sequence cancelled")]
    Cancelled,
    #[error("step {step} is out of range for {total} steps")]
    StepOutOfRange { step: usize, total: usize },
    #[error("submit callback failed: {0:#}")]
    Submit(anyhow::Error),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The plan completed and the submit callback ran.
    Submitted,
    /// The run was cancelled before the callback.
    Cancelled,
    /// Anything else went wrong; the message was logged at error.
    Failed(String),
}

/// Mutable state of one run.
#[derive(Debug, Clone)]
pub struct RunState {
    pub started_at: Instant,
    /// 1-based index of the step being shown; 0 before the first step.
    pub active_step: usize,
    pub total_steps: usize,
    pub steps: Vec<Step>,
    pub current_message: String,
    pub current_progress_bar: String,
    /// Set while the run is in flight; cleared when it ends for any reason.
    pub loading: bool,
}

impl RunState {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            started_at: Instant::now(),
            active_step: 0,
            total_steps: steps.len(),
            steps,
            current_message: String::new(),
            current_progress_bar: String::new(),
            loading: true,
        }
    }

    /// Full status text as of now.
    pub fn render(&self) -> String {
        status_text(self.started_at.elapsed(), &self.current_message, &self.current_progress_bar)
    }

    fn clear(&mut self) {
        self.active_step = 0;
        self.total_steps = 0;
        self.steps.clear();
        self.current_message.clear();
        self.current_progress_bar.clear();
        self.loading = false;
    }
}

/// Handle to one run. Cheap to clone; every clone refers to the same run.
#[derive(Clone)]
pub struct LoadingRun {
    state: Arc<Mutex<RunState>>,
    token: CancellationToken,
    surface: Option<Arc<dyn StatusSurface>>,
}

impl LoadingRun {
    fn new(steps: Vec<Step>, surface: Option<Arc<dyn StatusSurface>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RunState::new(steps))),
            token: CancellationToken::new(),
            surface,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current run state.
    pub fn snapshot(&self) -> RunState {
        self.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Writes `text` unless the run has been cancelled. Callers hold the lock.
    fn write_locked(&self, _state: &RunState, text: &str) {
        if self.token.is_cancelled() {
            return;
        }
        if let Some(surface) = &self.surface {
            surface.write(text);
        }
    }

    /// Walks the plan in order, showing each step and waiting out its
    /// duration. Returns as soon as the indefinite step has been shown.
    ///
    /// Cancellation is observed before each step and during every wait.
    pub async fn run_steps_sequentially(&self) -> Result<(), SequencerError> {
        let total = self.lock().total_steps;
        for step_number in 1..=total {
            if self.token.is_cancelled() {
                return Err(SequencerError::Cancelled);
            }

            let step = {
                let mut state = self.lock();
                let Some(step) = state.steps.get(step_number - 1).cloned() else {
                    return Err(SequencerError::StepOutOfRange { step: step_number, total });
                };
                state.active_step = step_number;
                state.current_message = step_message(&step.label, step_number, total);
                step
            };
            self.update_step(step_number);
            debug!(
                "Processing step {step_number}/{total}: \"{}\" | Expected Duration: {:?}",
                step.label, step.duration
            );

            let StepDuration::Millis(millis) = step.duration else {
                break;
            };
            self.delay(Duration::from_millis(millis)).await?;
            debug!("Step {step_number}/{total} completed after {millis} ms.");
        }
        Ok(())
    }

    /// Renders step `step` of the plan. Steps past the end are logged and
    /// ignored.
    pub fn update_step(&self, step: usize) {
        let mut state = self.lock();
        if step > state.total_steps {
            error!(
                "Step out of bounds: {step} exceeds total step count of {}. Aborting.",
                state.total_steps
            );
            return;
        }
        state.current_progress_bar = progress_bar(step, state.total_steps);
        debug!("Updated step {step}/{} - Message: \"{}\"", state.total_steps, state.current_message);
        let text = state.render();
        self.write_locked(&state, &text);
    }

    /// Terminal display: the last step at 100%.
    pub fn display_finalizing(&self) {
        debug!("Displaying \"Finalizing...\" state indefinitely.");
        let state = self.lock();
        let total = state.total_steps;
        let text = status_text(
            state.started_at.elapsed(),
            &step_message("Finalizing...", total, total),
            &progress_bar(total, total),
        );
        self.write_locked(&state, &text);
    }

    /// Rewrites the status text with a fresh elapsed time.
    fn render_elapsed(&self) {
        let state = self.lock();
        let text = state.render();
        self.write_locked(&state, &text);
    }

    async fn delay(&self, duration: Duration) -> Result<(), SequencerError> {
        tokio::select! {
            _ = self.token.cancelled() => Err(SequencerError::Cancelled),
            _ = tokio::time::sleep(duration) => {
                if self.token.is_cancelled() {
                    Err(SequencerError::Cancelled)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Runs the submit callback unless the run was cancelled. The lock is
    /// held across the call so a concurrent reset cannot slip in between.
    fn submit(&self, callback: SubmitCallback) -> Result<(), SequencerError> {
        let _state = self.lock();
        if self.token.is_cancelled() {
            return Err(SequencerError::Cancelled);
        }
        callback().map_err(SequencerError::Submit)
    }

    fn cancel(&self) {
        let mut state = self.lock();
        self.token.cancel();
        state.clear();
    }

    fn finish(&self) {
        self.lock().loading = false;
    }

    fn spawn_elapsed_updater(&self) -> JoinHandle<()> {
        let run = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + ELAPSED_TICK, ELAPSED_TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = run.token.cancelled() => break,
                    _ = interval.tick() => run.render_elapsed(),
                }
            }
        })
    }
}

struct ActiveRun {
    run: LoadingRun,
    elapsed_updater: Option<JoinHandle<()>>,
}

/// Drives loading runs against an optional status surface.
pub struct LoadingSequencer<R = StdRng> {
    surface: Option<Arc<dyn StatusSurface>>,
    rng: R,
    active: Option<ActiveRun>,
}

impl LoadingSequencer<StdRng> {
    pub fn new(surface: Option<Arc<dyn StatusSurface>>) -> Self {
        Self::with_rng(surface, StdRng::from_entropy())
    }
}

impl<R: Rng> LoadingSequencer<R> {
    /// Sequencer drawing step durations from `rng`.
    pub fn with_rng(surface: Option<Arc<dyn StatusSurface>>, rng: R) -> Self {
        Self {
            surface,
            rng,
            active: None,
        }
    }

    /// Whether the current run is still in flight.
    pub fn is_loading(&self) -> bool {
        self.active.as_ref().is_some_and(|active| active.run.is_loading())
    }

    /// Handle to the current run, if any.
    pub fn current_run(&self) -> Option<LoadingRun> {
        self.active.as_ref().map(|active| active.run.clone())
    }

    /// Resets and prepares a new run for `num_outputs` outputs (at least one).
    pub fn initialize(&mut self, num_outputs: usize) -> LoadingRun {
        self.reset();
        let num_outputs = num_outputs.max(1);
        debug!("Initializing loader for {num_outputs} output(s).");
        let steps = build_steps(num_outputs, &mut self.rng);
        let run = LoadingRun::new(steps, self.surface.clone());
        debug!("Steps initialized ({} total steps).", run.lock().total_steps);
        self.active = Some(ActiveRun {
            run: run.clone(),
            elapsed_updater: None,
        });
        run
    }

    /// Starts a run and returns a handle resolving once it ends.
    ///
    /// A run still in flight is reset first. When the plan completes the
    /// finalizing state is shown and `submit` runs; when the run is cancelled
    /// `submit` is dropped unused. The loading flag is cleared either way.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn show_loading<F>(&mut self, num_outputs: usize, submit: F) -> JoinHandle<RunOutcome>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        if self.is_loading() {
            warn!("Restarting loading process...");
            self.reset();
        }

        debug!("Starting new loading process...");
        let run = self.initialize(num_outputs);

        match &self.surface {
            Some(surface) => {
                let state = run.lock();
                surface.show();
                run.write_locked(&state, "");
            }
            None => warn!("Loading status display not found; progress will not be shown."),
        }

        let elapsed_updater = run.spawn_elapsed_updater();
        if let Some(active) = self.active.as_mut() {
            active.elapsed_updater = Some(elapsed_updater);
        }

        let submit: SubmitCallback = Box::new(submit);
        tokio::spawn(async move {
            let result = match run.run_steps_sequentially().await {
                Ok(()) => {
                    run.display_finalizing();
                    run.submit(submit)
                }
                Err(error) => Err(error),
            };
            run.finish();
            match result {
                Ok(()) => RunOutcome::Submitted,
                Err(SequencerError::Cancelled) => {
                    debug!("Loading process aborted.");
                    RunOutcome::Cancelled
                }
                Err(error) => {
                    error!("Error encountered during steps: {error}");
                    RunOutcome::Failed(error.to_string())
                }
            }
        })
    }

    /// Cancels the current run, stops its renderer, and clears the display.
    /// Safe to call when nothing is running.
    pub fn reset(&mut self) {
        debug!("Resetting loading state.");
        if let Some(active) = self.active.take() {
            if let Some(updater) = active.elapsed_updater {
                updater.abort();
                debug!("Elapsed time updater cleared.");
            }
            active.run.cancel();
            debug!("Aborted previous operations.");
        }
        if let Some(surface) = &self.surface {
            surface.write("");
            surface.hide();
        }
    }
}

impl<R> Drop for LoadingSequencer<R> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            if let Some(updater) = active.elapsed_updater {
                updater.abort();
            }
            active.run.cancel();
        }
    }
}
