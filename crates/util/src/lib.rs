//! Utilities shared by the replykit binaries: settings, the cookie jar, the
//! location (URL) store, and the logging stack.

pub mod cookie_jar;
pub mod location;
pub mod logging;
pub mod remote_log;
pub mod settings;

use std::path::PathBuf;

use dirs_next::home_dir;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub use cookie_jar::{Cookie, CookieJar, CookieJarError, SameSite};
pub use location::{Location, LocationError};
pub use settings::{Settings, SettingsError};

static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization: )([\w\-\.=:/+]+)",
        r"(?i)(api_key=)([^\s&;]+)",
        r"(?i)([A-Z0-9_]*?(KEY|TOKEN|SECRET|PASSWORD)[=:] ?)([^\s&;]+)",
        r"()(sk-[A-Za-z0-9_\-]{8,})",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// API keys pasted into the form end up in debug logs of the form layer;
/// everything that leaves the process goes through this first.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for re in SECRET_PATTERNS.iter() {
        redacted = re
            .replace_all(&redacted, |caps: &Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}<redacted>")
            })
            .to_string();
    }
    redacted
}

/// Expands a leading `~` into the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        Some(rest) => home().join(rest),
        None => PathBuf::from(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_api_keys_in_messages() {
        let line = "Setting cookie api_key=sk-abcdefghijklmnop for request";
        let redacted = redact_sensitive(line);
        assert!(!redacted.contains("abcdefghijklmnop"), "{redacted}");
        assert!(redacted.contains("api_key=<redacted>"), "{redacted}");
    }

    #[test]
    fn redacts_bare_openai_style_keys() {
        let redacted = redact_sensitive("value sk-proj_1234567890abc");
        assert_eq!(redacted, "value <redacted>");
    }

    #[test]
    fn leaves_ordinary_messages_alone() {
        let line = "Setting cookie \"tone\" to \"friendly\".";
        assert_eq!(redact_sensitive(line), line);
    }

    #[test]
    fn expand_tilde_keeps_plain_paths() {
        assert_eq!(expand_tilde("/tmp/cookies.json"), PathBuf::from("/tmp/cookies.json"));
    }
}
