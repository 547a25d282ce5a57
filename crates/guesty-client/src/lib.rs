//! Guesty Open API client library.
//!
//! This crate provides an authenticated client for the Guesty property
//! management API. It handles:
//!
//! - OAuth2 client-credentials tokens, cached and refreshed before expiry
//! - Retry with exponential backoff on rate limiting and transient failures
//! - Pagination-idiom negotiation for endpoints that reject `skip`
//!
//! # Example
//!
//! ```no_run
//! use guesty_client::{EntityKind, GuestyClient, GuestyConfig, PageRequest, RecordSource};
//!
//! # async fn example() -> Result<(), guesty_client::GuestyError> {
//! let client = GuestyClient::new(GuestyConfig::from_env())?;
//!
//! let page = client
//!     .fetch_page(EntityKind::Listings, &PageRequest::first(100))
//!     .await?;
//! println!("fetched {} listings", page.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod source;

pub use auth::{CachedToken, TokenManager};
pub use client::{DirectRequest, GuestyClient};
pub use config::{GuestyConfig, RetryPolicy};
pub use error::{GuestyError, Result};
pub use pagination::{PaginationFallback, QueryParams};
pub use source::{EntityKind, PageRequest, RecordSource};

// Re-export async_trait for RecordSource implementors
pub use async_trait::async_trait;
