//! File-backed cookie jar.
//!
//! The form mirrors tracked field values into cookies scoped to the root path
//! with `SameSite=Lax`. The jar keeps those cookies across sessions in a JSON
//! file and renders them as a `Cookie` request header for the form
//! submission, so the server sees the same values a browser would send.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Characters that cannot appear raw in a cookie value.
const COOKIE_VALUE: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b',').add(b';').add(b'\\').add(b'%');

#[derive(Debug, Error)]
pub enum CookieJarError {
    #[error("cookie jar I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cookie jar serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid cookie name '{0}'")]
    InvalidName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub same_site: SameSite,
    pub updated_at: DateTime<Utc>,
}

impl Cookie {
    /// A root-scoped, `SameSite=Lax` cookie.
    pub fn root_lax(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            same_site: SameSite::Lax,
            updated_at: Utc::now(),
        }
    }

    /// `name=value; Path=/; SameSite=Lax`
    pub fn to_set_cookie_string(&self) -> String {
        format!(
            "{}={}; Path={}; SameSite={}",
            self.name,
            utf8_percent_encode(&self.value, COOKIE_VALUE),
            self.path,
            self.same_site.as_str()
        )
    }

    /// Parses the `name=value` pair and the `Path`/`SameSite` attributes of a
    /// `Set-Cookie` style string. Unknown attributes are ignored.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split(';').map(str::trim).filter(|part| !part.is_empty());
        let (name, raw_value) = parts.next()?.split_once('=')?;
        if !is_valid_name(name) {
            return None;
        }
        let value = percent_decode_str(raw_value).decode_utf8_lossy().into_owned();
        let mut cookie = Cookie::root_lax(name, value);
        for attribute in parts {
            let (key, value) = attribute.split_once('=').unwrap_or((attribute, ""));
            match key.to_ascii_lowercase().as_str() {
                "path" => cookie.path = value.to_string(),
                "samesite" => {
                    cookie.same_site = match value.to_ascii_lowercase().as_str() {
                        "strict" => SameSite::Strict,
                        "none" => SameSite::None,
                        _ => SameSite::Lax,
                    }
                }
                _ => {}
            }
        }
        Some(cookie)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.'))
}

/// Cookie jar persisted to a JSON file.
#[derive(Debug, Default)]
pub struct CookieJar {
    path: Option<PathBuf>,
    cookies: IndexMap<String, Cookie>,
}

impl CookieJar {
    /// Opens the jar stored at `path`. A missing file is an empty jar; an
    /// unreadable one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CookieJarError> {
        let path = path.into();
        let cookies = load_cookies(&path)?;
        Ok(Self { path: Some(path), cookies })
    }

    /// In-memory jar used when the configuration directory cannot be accessed.
    pub fn ephemeral() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|cookie| cookie.value.as_str())
    }

    /// Stores a root-scoped `SameSite=Lax` cookie and writes the jar to disk.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), CookieJarError> {
        if !is_valid_name(name) {
            return Err(CookieJarError::InvalidName(name.to_string()));
        }
        self.cookies.insert(name.to_string(), Cookie::root_lax(name, value));
        self.save()
    }

    /// `Cookie` request header value for every stored cookie, or `None` when
    /// the jar is empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs = self
            .cookies
            .values()
            .map(|cookie| format!("{}={}", cookie.name, utf8_percent_encode(&cookie.value, COOKIE_VALUE)))
            .collect::<Vec<_>>();
        Some(pairs.join("; "))
    }

    fn save(&self) -> Result<(), CookieJarError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lines = self.cookies.values().map(Cookie::to_set_cookie_string).collect::<Vec<_>>();
        let payload = serde_json::json!({
            "saved_at": Utc::now(),
            "cookies": lines,
        });
        fs::write(path, serde_json::to_string_pretty(&payload)?)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct StoredJar {
    #[serde(default)]
    cookies: Vec<String>,
}

fn load_cookies(path: &Path) -> Result<IndexMap<String, Cookie>, CookieJarError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(IndexMap::new()),
        Err(error) => return Err(CookieJarError::Io(error)),
    };
    let stored: StoredJar = match serde_json::from_str(&data) {
        Ok(stored) => stored,
        Err(error) => {
            warn!(path = %path.display(), error = %error, "Failed to parse cookie jar; starting empty");
            return Ok(IndexMap::new());
        }
    };
    Ok(stored
        .cookies
        .iter()
        .filter_map(|line| Cookie::parse(line))
        .map(|cookie| (cookie.name.clone(), cookie))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_cookie_string_is_root_scoped_and_lax() {
        let cookie = Cookie::root_lax("tone", "friendly");
        assert_eq!(cookie.to_set_cookie_string(), "tone=friendly; Path=/; SameSite=Lax");
    }

    #[test]
    fn values_with_separators_are_encoded() {
        let cookie = Cookie::root_lax("responder_name", "ada lovelace; admin");
        let line = cookie.to_set_cookie_string();
        assert!(line.starts_with("responder_name=ada%20lovelace%3B%20admin;"), "{line}");
        let parsed = Cookie::parse(&line).expect("parse");
        assert_eq!(parsed.value, "ada lovelace; admin");
        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.same_site, SameSite::Lax);
    }

    #[test]
    fn jar_persists_across_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("cookies.json");
        {
            let mut jar = CookieJar::open(&path).expect("open");
            jar.set("dialect", "british").expect("set");
            jar.set("tone", "friendly").expect("set");
            jar.set("dialect", "american").expect("overwrite");
        }
        let jar = CookieJar::open(&path).expect("reopen");
        assert_eq!(jar.get("dialect"), Some("american"));
        assert_eq!(jar.get("tone"), Some("friendly"));
        assert_eq!(jar.header_value().as_deref(), Some("dialect=american; tone=friendly"));
    }

    #[test]
    fn corrupt_jar_starts_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cookies.json");
        fs::write(&path, "garbage").expect("write");
        let jar = CookieJar::open(&path).expect("open");
        assert!(jar.header_value().is_none());
    }

    #[test]
    fn rejects_names_that_would_break_the_header() {
        let mut jar = CookieJar::ephemeral();
        assert!(matches!(jar.set("bad name", "x"), Err(CookieJarError::InvalidName(_))));
        assert!(jar.get("bad name").is_none());
    }
}
