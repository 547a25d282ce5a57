//! Paginated record access, abstracted over the transport.

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::warn;

use crate::client::GuestyClient;
use crate::error::Result;
use crate::pagination::{PaginationFallback, QueryParams};

/// Upstream entity types pulled by the sync pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Listings,
    Guests,
    Reservations,
    Conversations,
}

impl EntityKind {
    /// API path of the entity's list endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::Listings => "/listings",
            EntityKind::Guests => "/guests",
            EntityKind::Reservations => "/reservations",
            EntityKind::Conversations => "/communication/conversations",
        }
    }

    /// Lower-case entity name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Listings => "listings",
            EntityKind::Guests => "guests",
            EntityKind::Reservations => "reservations",
            EntityKind::Conversations => "conversations",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page request in `skip`/`limit` terms.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub skip: u64,
    pub limit: u64,
    /// Server-side filter list, sent JSON-encoded as `filters`.
    pub filters: Option<Value>,
}

impl PageRequest {
    /// First page of `limit` records.
    pub fn first(limit: u64) -> Self {
        Self {
            skip: 0,
            limit,
            filters: None,
        }
    }

    /// Attach a server-side filter list.
    pub fn with_filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    /// The following page.
    pub fn next(&self) -> Self {
        Self {
            skip: self.skip + self.limit,
            ..self.clone()
        }
    }

    /// Encode as query parameters.
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new()
            .with("skip", self.skip)
            .with("limit", self.limit);
        if let Some(ref filters) = self.filters {
            params.set("filters", filters);
        }
        params
    }
}

/// Source of raw upstream records, one page at a time.
///
/// Implemented by [`GuestyClient`]; tests substitute in-memory sources.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one page of raw records for an entity.
    async fn fetch_page(&self, entity: EntityKind, page: &PageRequest) -> Result<Vec<Value>>;
}

#[async_trait]
impl RecordSource for GuestyClient {
    async fn fetch_page(&self, entity: EntityKind, page: &PageRequest) -> Result<Vec<Value>> {
        let (body, fallback) = self
            .request_negotiated(Method::GET, entity.path(), &page.to_params())
            .await?;

        // Without skip the endpoint can only ever serve its first page
        if fallback == Some(PaginationFallback::DropSkip) && page.skip > 0 {
            warn!(
                "{} only accepts unpaginated requests, stopping at skip={}",
                entity, page.skip
            );
            return Ok(Vec::new());
        }

        Ok(results_of(body))
    }
}

/// Extract the `results` array of a list response; anything else is empty.
pub fn results_of(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
