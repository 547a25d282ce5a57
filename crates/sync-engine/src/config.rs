//! Configuration for sync runs.

use std::env;

use chrono::{Days, NaiveDate};
use tracing::warn;

/// Default reservation lookback in years.
pub const DEFAULT_LOOKBACK_YEARS: u32 = 3;

/// Records requested per page.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Configuration for a [`SyncOrchestrator`](crate::SyncOrchestrator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Reservations checking in before `today - years * 365 days` are not pulled.
    pub lookback_years: u32,
    /// Page size for every list endpoint.
    pub page_size: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lookback_years: DEFAULT_LOOKBACK_YEARS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SyncConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `SYNC_LOOKBACK_YEARS` - reservation lookback window (default: 3)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var("SYNC_LOOKBACK_YEARS") {
            match raw.trim().parse::<u32>() {
                Ok(years) => config.lookback_years = years,
                Err(_) => warn!(
                    "Ignoring invalid SYNC_LOOKBACK_YEARS={:?}, using {}",
                    raw, DEFAULT_LOOKBACK_YEARS
                ),
            }
        }

        config
    }

    /// Set the lookback window.
    pub fn with_lookback_years(mut self, years: u32) -> Self {
        self.lookback_years = years;
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Earliest check-in date pulled when syncing on `today`.
    ///
    /// A window reaching past the earliest representable date is clamped to it.
    pub fn lookback_cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.lookback_years) * 365))
            .unwrap_or(NaiveDate::MIN)
    }
}
