//! Query parameters and pagination-idiom negotiation.
//!
//! Guesty endpoints disagree on pagination: some take `skip`/`limit`, some
//! `offset`, some a 1-based `page`, and some reject `skip` outright. Instead
//! of a per-endpoint table, a rejected `skip` request is re-issued with each
//! [`PaginationFallback`] in order until one is accepted.

use std::fmt;

/// Ordered list of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Set a parameter, replacing an existing value in place.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    /// Get a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Remove a parameter, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    /// Whether the parameter is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Parameters as key/value pairs, ready for `RequestBuilder::query`.
    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }
}

/// An alternative pagination idiom for a request whose `skip` was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationFallback {
    /// `skip=N` becomes `offset=N`.
    SkipAsOffset,
    /// `skip` and `limit` become a 1-based `page = skip / limit + 1`.
    SkipAsPage,
    /// `skip` is dropped.
    DropSkip,
}

impl PaginationFallback {
    /// Fallbacks in the order they are tried.
    pub const ORDER: [PaginationFallback; 3] = [
        PaginationFallback::SkipAsOffset,
        PaginationFallback::SkipAsPage,
        PaginationFallback::DropSkip,
    ];

    /// Rewrite `params` with this idiom, or `None` when it does not apply.
    pub fn apply(&self, params: &QueryParams) -> Option<QueryParams> {
        let skip = params.get("skip")?.to_string();
        let mut rewritten = params.clone();
        rewritten.remove("skip");

        match self {
            PaginationFallback::SkipAsOffset => {
                rewritten.set("offset", skip);
            }
            PaginationFallback::SkipAsPage => {
                let skip: u64 = skip.parse().ok()?;
                let limit: u64 = params.get("limit")?.parse().ok()?;
                if limit == 0 {
                    return None;
                }
                rewritten.set("page", skip / limit + 1);
            }
            PaginationFallback::DropSkip => {}
        }

        Some(rewritten)
    }
}

impl fmt::Display for PaginationFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaginationFallback::SkipAsOffset => "offset",
            PaginationFallback::SkipAsPage => "page",
            PaginationFallback::DropSkip => "no-skip",
        };
        f.write_str(name)
    }
}

/// Candidate parameter sets for a rejected `skip` request, in trial order.
pub fn fallback_candidates(params: &QueryParams) -> Vec<(PaginationFallback, QueryParams)> {
    PaginationFallback::ORDER
        .iter()
        .filter_map(|fallback| fallback.apply(params).map(|p| (*fallback, p)))
        .collect()
}

/// Whether an error body says the `skip` parameter is not allowed.
pub fn is_skip_rejection(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower
        .find("skip")
        .is_some_and(|index| lower[index..].contains("not allowed"))
}
