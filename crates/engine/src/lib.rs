//! # Replykit Engine
//!
//! The behavior of the reply form that does not depend on how it is drawn.
//!
//! ## Key Features
//!
//! - **Loading sequencer**: a randomized, cancellable step plan rendered as a
//!   three-line status with a text progress bar, handing over to the real
//!   submission once it completes
//! - **Keyboard navigation**: arrow and digit key targets over the fixed
//!   navigable list, Enter-to-submit, and initial focus selection
//! - **Field persistence**: tracked values mirrored into the cookie jar and
//!   the location, plus the derived uniqueness attempts
//!
//! ## Usage
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use replykit_engine::loading::{build_steps, progress_bar};
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let steps = build_steps(3, &mut rng);
//! assert_eq!(steps.len(), 12);
//! assert_eq!(progress_bar(3, steps.len()), "[#####---------------] 25%");
//! ```
//!
//! ## Architecture
//!
//! - **`loading`**: step plans, progress text and the sequencer
//! - **`navigation`**: the navigable list and key resolution
//! - **`persistence`**: the cookie jar and location mirror
//! - **`page`**: the read-only page view the other modules query

pub mod loading;
pub mod navigation;
pub mod page;
pub mod persistence;

pub use loading::{LoadingRun, LoadingSequencer, RunOutcome, SequencerError, StatusSurface, Step, StepDuration};
pub use navigation::{NavAction, NavKey, NavigableList, initial_focus, resolve_key};
pub use page::PageView;
pub use persistence::{FormStore, uniqueness_attempts};
