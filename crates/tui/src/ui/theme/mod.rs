//! Theme styling for the form UI.
//!
//! The Nord palette is mapped onto semantic roles; components only use the
//! role-based helpers so the high-contrast variant applies everywhere.

use std::env;

use tracing::debug;

pub mod nord;
pub mod roles;
pub mod theme_helpers;

pub use nord::{NordTheme, NordThemeHighContrast};
pub use roles::Theme;

/// Environment variable selecting the theme variant.
pub const THEME_ENV: &str = "REPLYKIT_THEME";

/// Selects the theme from `REPLYKIT_THEME` (`nord` or `nord-high-contrast`).
pub fn load_from_env() -> Box<dyn Theme> {
    resolve(env::var(THEME_ENV).ok().as_deref())
}

fn resolve(name: Option<&str>) -> Box<dyn Theme> {
    match name.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("nord-high-contrast" | "nord_high_contrast" | "high-contrast") => Box::new(NordThemeHighContrast::new()),
        Some("nord") | Some("") | None => Box::new(NordTheme::new()),
        Some(other) => {
            debug!("Unknown theme '{other}'; falling back to nord.");
            Box::new(NordTheme::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_contrast_brightens_text() {
        let default = resolve(None);
        let high = resolve(Some("Nord-High-Contrast"));
        assert_ne!(default.roles().text, high.roles().text);
        assert_eq!(resolve(Some("solarized")).roles().text, default.roles().text);
    }
}
