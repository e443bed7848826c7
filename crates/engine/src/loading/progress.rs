//! Text rendering for the loading status display.

use std::time::Duration;

/// Width of the progress bar in characters, brackets excluded.
pub const BAR_WIDTH: usize = 20;

/// Percentage of `step` out of `total`, rounded to the nearest integer.
pub fn percentage(step: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * step as f64 / total as f64).round() as u32
}

/// `[#####---------------] 25%`
pub fn progress_bar(step: usize, total: usize) -> String {
    let filled = if total == 0 { 0 } else { (BAR_WIDTH * step / total).min(BAR_WIDTH) };
    format!(
        "[{}{}] {}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percentage(step, total)
    )
}

/// `{label} [{step}/{total}]`
pub fn step_message(label: &str, step: usize, total: usize) -> String {
    format!("{label} [{step}/{total}]")
}

/// The three status lines: elapsed time, current message, progress bar.
pub fn status_text(elapsed: Duration, message: &str, bar: &str) -> String {
    format!("Loading [{:.1}s]...\n{message}\n{bar}", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_fill_is_floored_and_percentage_rounded() {
        assert_eq!(progress_bar(1, 8), "[##------------------] 13%");
        assert_eq!(progress_bar(3, 12), "[#####---------------] 25%");
        assert_eq!(progress_bar(2, 3), "[#############-------] 67%");
        assert_eq!(progress_bar(12, 12), "[####################] 100%");
    }

    #[test]
    fn percentage_matches_rounded_ratio_for_every_step() {
        for total in 8..=26 {
            for step in 0..=total {
                let expected = (100.0 * step as f64 / total as f64).round() as u32;
                assert_eq!(percentage(step, total), expected);
                let filled = progress_bar(step, total).chars().filter(|c| *c == '#').count();
                assert_eq!(filled, BAR_WIDTH * step / total);
            }
        }
    }

    #[test]
    fn empty_plan_renders_an_empty_bar() {
        assert_eq!(progress_bar(0, 0), "[--------------------] 0%");
    }

    #[test]
    fn status_text_has_three_lines() {
        let text = status_text(
            Duration::from_millis(2340),
            &step_message("Making API request...", 3, 8),
            &progress_bar(3, 8),
        );
        assert_eq!(text, "Loading [2.3s]...\nMaking API request... [3/8]\n[#######-------------] 38%");
    }
}
