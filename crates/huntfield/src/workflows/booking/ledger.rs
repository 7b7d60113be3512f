use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{ActorId, BookingId, DateRange, Field, FieldId};

/// Date conflicts surfaced before a booking is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("field {field} is already reserved over {requested} (held by booking {held_by})")]
    Conflict {
        field: FieldId,
        requested: DateRange,
        held_by: BookingId,
    },
    #[error("field {field} is blocked by the outfitter on {date}")]
    Blocked { field: FieldId, date: NaiveDate },
    #[error("requester already holds booking {booking} over those dates")]
    RequesterOverlap { booking: BookingId },
}

#[derive(Debug, Clone)]
struct Reservation {
    booking_id: BookingId,
    requester: ActorId,
    dates: DateRange,
}

/// Occupancy ledger for field dates and requester holds. All mutation
/// happens under one mutex, so neither check can race its insert: `reserve`
/// re-runs both the per-field overlap scan and the cross-field requester
/// scan inside the critical section.
#[derive(Debug, Default)]
pub struct AvailabilityLedger {
    reservations: Mutex<HashMap<FieldId, Vec<Reservation>>>,
}

impl AvailabilityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advisory read used for search/browse; the authoritative check happens
    /// again inside [`reserve`](Self::reserve).
    pub fn check_availability(&self, field: &Field, dates: &DateRange) -> bool {
        if field.blocked_within(dates).is_some() {
            return false;
        }
        let guard = self.reservations.lock().expect("ledger mutex poisoned");
        guard
            .get(&field.id)
            .map(|held| held.iter().all(|r| !r.dates.overlaps(dates)))
            .unwrap_or(true)
    }

    /// Claim the dates for `booking_id`, failing if any held reservation,
    /// blocked date, or prior hold by the same requester overlaps. Checks
    /// and insert share the critical section.
    pub fn reserve(
        &self,
        field: &Field,
        dates: DateRange,
        booking_id: BookingId,
        requester: ActorId,
    ) -> Result<(), AvailabilityError> {
        if let Some(day) = field.blocked_within(&dates) {
            return Err(AvailabilityError::Blocked {
                field: field.id.clone(),
                date: day,
            });
        }

        let mut guard = self.reservations.lock().expect("ledger mutex poisoned");

        // One requester, one outing per day, across every field.
        if let Some(existing) = guard
            .values()
            .flatten()
            .find(|r| r.requester == requester && r.dates.overlaps(&dates))
        {
            return Err(AvailabilityError::RequesterOverlap {
                booking: existing.booking_id.clone(),
            });
        }

        let held = guard.entry(field.id.clone()).or_default();
        if let Some(existing) = held.iter().find(|r| r.dates.overlaps(&dates)) {
            return Err(AvailabilityError::Conflict {
                field: field.id.clone(),
                requested: dates,
                held_by: existing.booking_id.clone(),
            });
        }
        held.push(Reservation {
            booking_id,
            requester,
            dates,
        });
        Ok(())
    }

    /// Drop the reservation for a denied or cancelled booking. Unknown ids
    /// are a no-op so release stays idempotent.
    pub fn release(&self, booking_id: &BookingId) {
        let mut guard = self.reservations.lock().expect("ledger mutex poisoned");
        for held in guard.values_mut() {
            held.retain(|r| &r.booking_id != booking_id);
        }
    }

    /// Drop every reservation for a field; used by the deletion cascade.
    pub fn release_field(&self, field_id: &FieldId) {
        let mut guard = self.reservations.lock().expect("ledger mutex poisoned");
        guard.remove(field_id);
    }
}
