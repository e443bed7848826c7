//! Simulated progress shown while a form submission is in flight.
//!
//! - [`steps`] builds the randomized step plan.
//! - [`progress`] renders the three-line status text.
//! - [`sequencer`] runs a plan with cancellation and hands over to the real
//!   submission when it completes.

pub mod progress;
pub mod sequencer;
pub mod steps;

pub use progress::{BAR_WIDTH, percentage, progress_bar, status_text, step_message};
pub use sequencer::{
    ELAPSED_TICK, LoadingRun, LoadingSequencer, RunOutcome, RunState, SequencerError, StatusSurface, SubmitCallback,
};
pub use steps::{Step, StepDuration, build_steps, step_count};
