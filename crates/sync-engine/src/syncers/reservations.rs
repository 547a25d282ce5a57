use async_trait::async_trait;
use chrono::NaiveDate;
use database::reservation::upsert_reservation;
use database::NewReservation;
use guesty_client::{EntityKind, PageRequest};
use serde_json::{json, Value};
use tracing::warn;

use super::{EntitySyncer, SyncContext};
use crate::error::Result;
use crate::id_map::IdMap;
use crate::normalizer::SourceNormalizer;
use crate::record::{
    booked_at, days_between, external_id, f64_field, format_timestamp, minor_units, parse_date,
    parse_timestamp, path, str_field,
};

/// Status assumed when a reservation carries none.
const DEFAULT_STATUS: &str = "confirmed";

/// Pulls `/reservations` checking in on or after a cutoff date.
#[derive(Debug, Clone, Copy)]
pub struct ReservationSyncer<'a> {
    listings: &'a IdMap,
    guests: &'a IdMap,
    check_in_from: NaiveDate,
}

impl<'a> ReservationSyncer<'a> {
    /// Resolve foreign keys against the listing and guest maps of this run.
    pub fn new(listings: &'a IdMap, guests: &'a IdMap, check_in_from: NaiveDate) -> Self {
        Self {
            listings,
            guests,
            check_in_from,
        }
    }
}

/// Server-side filter selecting check-ins on or after `cutoff`.
pub fn reservation_filters(cutoff: NaiveDate) -> Value {
    json!([{
        "field": "checkIn",
        "operator": "$gte",
        "value": cutoff.format("%Y-%m-%dT00:00:00Z").to_string(),
    }])
}

/// Transform a raw reservation.
///
/// `None` when the record has no `_id` or no parsable `checkIn`. Foreign keys
/// missing from the maps are stored as null.
pub fn reservation_from(
    record: &Value,
    normalizer: &SourceNormalizer,
    listings: &IdMap,
    guests: &IdMap,
) -> Option<NewReservation> {
    let external_id = external_id(record)?;

    let Some(check_in) = str_field(record, "checkIn").and_then(parse_date) else {
        warn!("Reservation {} has no usable checkIn", external_id);
        return None;
    };

    let check_out = match str_field(record, "checkOut").and_then(parse_date) {
        Some(date) => date,
        None => {
            warn!("Reservation {} has no usable checkOut, assuming checkIn", external_id);
            check_in
        }
    };

    let (booked_at, fell_back) = booked_at(record, check_in);
    if fell_back {
        warn!("Reservation {} has no booking timestamp, using checkIn", external_id);
    }

    let total_price = match f64_field(path(record, "money.totalPrice")) {
        Some(amount) => minor_units(amount),
        None => {
            warn!("Reservation {} has no usable money.totalPrice", external_id);
            0
        }
    };

    let cancelled_at = str_field(record, "canceledAt")
        .or_else(|| str_field(record, "cancelledAt"))
        .and_then(parse_timestamp)
        .map(format_timestamp);

    Some(NewReservation {
        listing_id: listings.resolve(str_field(record, "listingId")),
        guest_id: guests.resolve(str_field(record, "guestId")),
        source: normalizer.normalize(str_field(record, "source")).to_string(),
        status: str_field(record, "status").unwrap_or(DEFAULT_STATUS).to_string(),
        check_in: check_in.to_string(),
        check_out: check_out.to_string(),
        booked_at: format_timestamp(booked_at),
        total_price,
        nights: days_between(check_in, check_out),
        lead_time_days: days_between(booked_at.date_naive(), check_in),
        cancelled_at,
        external_id,
    })
}

#[async_trait]
impl EntitySyncer for ReservationSyncer<'_> {
    fn entity(&self) -> EntityKind {
        EntityKind::Reservations
    }

    fn first_page(&self, page_size: u64) -> PageRequest {
        PageRequest::first(page_size).with_filters(reservation_filters(self.check_in_from))
    }

    async fn store(&self, ctx: &SyncContext<'_>, record: &Value) -> Result<Option<(String, String)>> {
        let Some(reservation) = reservation_from(record, ctx.normalizer, self.listings, self.guests)
        else {
            warn!("Skipping reservation that cannot be keyed");
            return Ok(None);
        };

        let local_id = upsert_reservation(ctx.db.pool(), &reservation).await?;
        Ok(Some((reservation.external_id, local_id)))
    }
}
