//! The page location: a URL whose query parameters mirror form state.
//!
//! Query updates use replace semantics, so they never add history entries
//! and never trigger navigation. Only [`Location::navigate`] (used when the
//! form is submitted) records a new entry.

use std::fmt;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("invalid location '{value}': {source}")]
    Parse {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    current: Url,
    history: Vec<Url>,
}

impl Location {
    pub fn new(url: Url) -> Self {
        Self {
            current: url,
            history: Vec::new(),
        }
    }

    pub fn parse(value: &str) -> Result<Self, LocationError> {
        Url::parse(value).map(Self::new).map_err(|source| LocationError::Parse {
            value: value.to_string(),
            source,
        })
    }

    pub fn url(&self) -> &Url {
        &self.current
    }

    pub fn path(&self) -> &str {
        self.current.path()
    }

    /// First value of the named query parameter, when present and non-empty.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.current
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    /// Sets every given parameter to its value, keeping parameters that are
    /// not mentioned. Pairs with empty values are skipped. Replaces the
    /// current entry in place.
    pub fn replace_query_params<'a, I>(&mut self, params: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut merged: Vec<(String, String)> = self
            .current
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        for (name, value) in params {
            if value.is_empty() {
                continue;
            }
            match merged.iter_mut().find(|(key, _)| key == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => merged.push((name.to_string(), value.to_string())),
            }
        }
        if merged.is_empty() {
            self.current.set_query(None);
            return;
        }
        self.current.query_pairs_mut().clear().extend_pairs(merged.iter());
    }

    /// Moves to `path` on the same origin, keeping the query and recording a
    /// history entry.
    pub fn navigate(&mut self, path: &str) {
        self.history.push(self.current.clone());
        self.current.set_path(path);
    }

    /// Number of entries before the current one.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.current.as_str())
    }
}
