//! Step plans for the loading display.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::Serialize;

const SHORT_STEP_MS: RangeInclusive<u64> = 100..=250;
const API_REQUEST_MS: RangeInclusive<u64> = 2000..=2500;
const OUTPUT_STEP_MS: RangeInclusive<u64> = 250..=500;

/// How long the sequencer waits after showing a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDuration {
    Millis(u64),
    /// Never elapses; the sequence stops here and the caller takes over.
    Indefinite,
}

/// One labelled step of a loading sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub label: String,
    pub duration: StepDuration,
}

impl Step {
    fn timed<R: Rng + ?Sized>(label: impl Into<String>, range: RangeInclusive<u64>, rng: &mut R) -> Self {
        Self {
            label: label.into(),
            duration: StepDuration::Millis(rng.gen_range(range)),
        }
    }

    pub fn is_indefinite(&self) -> bool {
        matches!(self.duration, StepDuration::Indefinite)
    }
}

/// Number of steps a plan for `num_outputs` outputs contains.
pub fn step_count(num_outputs: usize) -> usize {
    3 + 2 * num_outputs.max(1) + 3
}

/// Builds a fresh plan. `num_outputs` below one is treated as one.
pub fn build_steps<R: Rng + ?Sized>(num_outputs: usize, rng: &mut R) -> Vec<Step> {
    let num_outputs = num_outputs.max(1);
    let mut steps = Vec::with_capacity(step_count(num_outputs));

    steps.push(Step::timed("Extracting parameters...", SHORT_STEP_MS, rng));
    steps.push(Step::timed("Constructing prompt...", SHORT_STEP_MS, rng));
    steps.push(Step::timed("Making API request...", API_REQUEST_MS, rng));

    for output in 1..=num_outputs {
        steps.push(Step::timed(format!("Post-processing output {output}..."), OUTPUT_STEP_MS, rng));
        steps.push(Step::timed(format!("Validating output {output}..."), OUTPUT_STEP_MS, rng));
    }

    steps.push(Step::timed("Final validation...", SHORT_STEP_MS, rng));
    steps.push(Step::timed("Calculating token usage and cost...", SHORT_STEP_MS, rng));
    steps.push(Step {
        label: "Finalizing...".to_string(),
        duration: StepDuration::Indefinite,
    });

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn plan_length_follows_output_count() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(build_steps(1, &mut rng).len(), 8);
        assert_eq!(build_steps(3, &mut rng).len(), 12);
        for outputs in 1..=10 {
            assert_eq!(build_steps(outputs, &mut rng).len(), 3 + 2 * outputs + 3);
        }
    }

    #[test]
    fn zero_outputs_plan_like_one() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(build_steps(0, &mut rng).len(), 8);
        assert_eq!(step_count(0), 8);
    }

    #[test]
    fn only_the_last_step_is_indefinite() {
        let mut rng = StdRng::seed_from_u64(42);
        let steps = build_steps(2, &mut rng);
        let (last, rest) = steps.split_last().expect("non-empty plan");
        assert_eq!(last.label, "Finalizing...");
        assert!(last.is_indefinite());
        assert!(rest.iter().all(|step| !step.is_indefinite()));
    }

    #[test]
    fn durations_stay_inside_their_ranges() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let steps = build_steps(2, &mut rng);
            let millis = |index: usize| match steps[index].duration {
                StepDuration::Millis(ms) => ms,
                StepDuration::Indefinite => panic!("step {index} should be timed"),
            };
            assert!(SHORT_STEP_MS.contains(&millis(0)));
            assert!(SHORT_STEP_MS.contains(&millis(1)));
            assert!(API_REQUEST_MS.contains(&millis(2)));
            for index in 3..7 {
                assert!(OUTPUT_STEP_MS.contains(&millis(index)));
            }
            assert!(SHORT_STEP_MS.contains(&millis(7)));
            assert!(SHORT_STEP_MS.contains(&millis(8)));
        }
    }

    #[test]
    fn output_steps_are_numbered_from_one() {
        let mut rng = StdRng::seed_from_u64(3);
        let labels: Vec<String> = build_steps(2, &mut rng).into_iter().map(|step| step.label).collect();
        assert_eq!(
            labels,
            vec![
                "Extracting parameters...",
                "Constructing prompt...",
                "Making API request...",
                "Post-processing output 1...",
                "Validating output 1...",
                "Post-processing output 2...",
                "Validating output 2...",
                "Final validation...",
                "Calculating token usage and cost...",
                "Finalizing...",
            ]
        );
    }
}
