//! Booking channel normalization.
//!
//! Guesty reports the channel of a reservation or conversation as a free-form
//! label (`"Airbnb"`, `"airbnb2"`, `"HomeAway"`, ...). Analytics group by a
//! small canonical set, so labels are folded through an alias table. Labels
//! outside the table are kept, lower-cased, and reported once per normalizer.

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use tracing::warn;

/// Canonical booking channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BookingSource {
    Airbnb,
    Vrbo,
    Booking,
    Expedia,
    Direct,
    TripAdvisor,
    Google,
    /// The record carried no channel.
    Unknown,
    /// A channel outside the alias table, lower-cased.
    Other(String),
}

impl BookingSource {
    /// Tag as stored in the `source` column.
    pub fn as_str(&self) -> &str {
        match self {
            BookingSource::Airbnb => "airbnb",
            BookingSource::Vrbo => "vrbo",
            BookingSource::Booking => "booking",
            BookingSource::Expedia => "expedia",
            BookingSource::Direct => "direct",
            BookingSource::TripAdvisor => "tripadvisor",
            BookingSource::Google => "google",
            BookingSource::Unknown => "unknown",
            BookingSource::Other(label) => label,
        }
    }
}

impl fmt::Display for BookingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw Guesty labels and the channel they denote.
const ALIASES: &[(&str, BookingSource)] = &[
    ("airbnb", BookingSource::Airbnb),
    ("airbnb2", BookingSource::Airbnb),
    ("Airbnb", BookingSource::Airbnb),
    ("AIRBNB", BookingSource::Airbnb),
    ("vrbo", BookingSource::Vrbo),
    ("VRBO", BookingSource::Vrbo),
    ("homeaway", BookingSource::Vrbo),
    ("HomeAway", BookingSource::Vrbo),
    ("HOMEAWAY", BookingSource::Vrbo),
    ("booking.com", BookingSource::Booking),
    ("Booking.com", BookingSource::Booking),
    ("bookingcom", BookingSource::Booking),
    ("booking", BookingSource::Booking),
    ("expedia", BookingSource::Expedia),
    ("Expedia", BookingSource::Expedia),
    ("direct", BookingSource::Direct),
    ("Direct", BookingSource::Direct),
    ("manual", BookingSource::Direct),
    ("Manual", BookingSource::Direct),
    ("website", BookingSource::Direct),
    ("Website", BookingSource::Direct),
    ("tripadvisor", BookingSource::TripAdvisor),
    ("TripAdvisor", BookingSource::TripAdvisor),
    ("google", BookingSource::Google),
    ("Google", BookingSource::Google),
];

fn lookup(label: &str) -> Option<BookingSource> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == label)
        .map(|(_, source)| source.clone())
}

/// Folds raw channel labels into [`BookingSource`] values.
///
/// Each distinct unmapped label is logged at `warn` the first time this
/// instance sees it. The seen-set only grows and is never persisted.
#[derive(Debug, Default)]
pub struct SourceNormalizer {
    unmapped: Mutex<HashSet<String>>,
}

impl SourceNormalizer {
    /// Create a normalizer with an empty seen-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a raw label.
    pub fn normalize(&self, raw: Option<&str>) -> BookingSource {
        let raw = match raw {
            Some(raw) if !raw.is_empty() => raw,
            _ => return BookingSource::Unknown,
        };

        if let Some(source) = lookup(raw).or_else(|| lookup(&raw.to_lowercase())) {
            return source;
        }

        let first_sighting = self
            .unmapped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(raw.to_string());
        if first_sighting {
            warn!("Unknown booking source encountered: {}", raw);
        }

        BookingSource::Other(raw.to_lowercase())
    }

    /// Raw labels seen so far that had no alias.
    pub fn unmapped_labels(&self) -> HashSet<String> {
        self.unmapped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
