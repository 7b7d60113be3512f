use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::info;

use super::access::{self, AccessError, Capability, Relation};
use super::domain::{
    Booking, BookingId, BookingStatus, DateRange, DomainEvent, FieldId, RequestContext, StateError,
    ValidationError,
};
use super::ledger::{AvailabilityError, AvailabilityLedger};
use super::store::{BookingStore, EventPublisher, FieldStore, PaymentCollector, PaymentError, StoreError};
use crate::workflows::hunt::domain::SessionState;
use crate::workflows::hunt::store::SessionStore;

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bk-{id:06}"))
}

/// Booking lifecycle manager: creation, approval, denial, and cancellation,
/// with the availability ledger consulted before anything is written.
pub struct BookingService {
    fields: Arc<dyn FieldStore>,
    bookings: Arc<dyn BookingStore>,
    sessions: Arc<dyn SessionStore>,
    ledger: Arc<AvailabilityLedger>,
    events: Arc<dyn EventPublisher>,
    payments: Arc<dyn PaymentCollector>,
}

impl BookingService {
    pub fn new(
        fields: Arc<dyn FieldStore>,
        bookings: Arc<dyn BookingStore>,
        sessions: Arc<dyn SessionStore>,
        ledger: Arc<AvailabilityLedger>,
        events: Arc<dyn EventPublisher>,
        payments: Arc<dyn PaymentCollector>,
    ) -> Self {
        Self {
            fields,
            bookings,
            sessions,
            ledger,
            events,
            payments,
        }
    }

    /// Create a booking for the acting requester. Auto-approve fields charge
    /// up front and land in Approved; everything else waits Pending.
    pub fn create_booking(
        &self,
        ctx: &RequestContext,
        field_id: &FieldId,
        dates: DateRange,
        party_size: u32,
    ) -> Result<Booking, BookingServiceError> {
        access::require(&ctx.actor, Capability::CreateBooking, Relation::None)?;

        let field = self
            .fields
            .fetch(field_id)?
            .ok_or(StoreError::NotFound)?;

        if dates.start() < ctx.today {
            return Err(ValidationError::StartsInPast {
                start: dates.start(),
                today: ctx.today,
            }
            .into());
        }
        if party_size == 0 {
            return Err(ValidationError::EmptyParty.into());
        }
        if party_size > field.capacity {
            return Err(ValidationError::PartyExceedsCapacity {
                requested: party_size,
                capacity: field.capacity,
            }
            .into());
        }

        let price = field.pricing.quote(ctx.actor.role, dates.days());
        let booking_id = next_booking_id();

        // The ledger also enforces the one-outing-per-day rule for the
        // requester, inside its critical section.
        self.ledger
            .reserve(&field, dates.clone(), booking_id.clone(), ctx.actor.id.clone())?;

        let (status, payment_reference) = if field.auto_approve {
            match self.payments.collect(&booking_id, price) {
                Ok(reference) => (BookingStatus::Approved, Some(reference)),
                Err(err) => {
                    self.ledger.release(&booking_id);
                    return Err(err.into());
                }
            }
        } else {
            (BookingStatus::Pending, None)
        };

        let booking = Booking {
            id: booking_id.clone(),
            field_id: field.id.clone(),
            requester: ctx.actor.id.clone(),
            dates,
            party_size,
            status,
            price,
            payment_reference: payment_reference.clone(),
            created_on: ctx.today,
        };

        let stored = match self.bookings.insert(booking) {
            Ok(stored) => stored,
            Err(err) => {
                self.ledger.release(&booking_id);
                return Err(err.into());
            }
        };

        self.events.publish(DomainEvent::BookingCreated {
            booking_id: stored.id.clone(),
            field_id: stored.field_id.clone(),
            status: stored.status,
        });
        if let Some(reference) = payment_reference {
            self.events.publish(DomainEvent::BookingApproved {
                booking_id: stored.id.clone(),
                price: stored.price,
                payment_reference: reference,
            });
        }

        info!(booking = %stored.id, field = %stored.field_id, status = %stored.status, "booking created");
        Ok(stored)
    }

    /// Approve a pending booking; only the field owner or an admin may.
    pub fn approve(
        &self,
        ctx: &RequestContext,
        booking_id: &BookingId,
    ) -> Result<Booking, BookingServiceError> {
        let mut booking = self
            .bookings
            .fetch(booking_id)?
            .ok_or(StoreError::NotFound)?;
        let field = self
            .fields
            .fetch(&booking.field_id)?
            .ok_or(StoreError::NotFound)?;

        access::require(
            &ctx.actor,
            Capability::ApproveBooking,
            Relation::OwnerOf(&field.owner),
        )?;

        if booking.status != BookingStatus::Pending {
            return Err(StateError::BookingTransition {
                id: booking.id.clone(),
                from: booking.status,
                to: BookingStatus::Approved,
            }
            .into());
        }

        let reference = self.payments.collect(&booking.id, booking.price)?;
        booking.status = BookingStatus::Approved;
        booking.payment_reference = Some(reference.clone());
        self.bookings.update(booking.clone())?;

        self.events.publish(DomainEvent::BookingApproved {
            booking_id: booking.id.clone(),
            price: booking.price,
            payment_reference: reference,
        });
        info!(booking = %booking.id, "booking approved");
        Ok(booking)
    }

    /// Deny a pending booking and free its dates.
    pub fn deny(
        &self,
        ctx: &RequestContext,
        booking_id: &BookingId,
        reason: &str,
    ) -> Result<Booking, BookingServiceError> {
        let mut booking = self
            .bookings
            .fetch(booking_id)?
            .ok_or(StoreError::NotFound)?;
        let field = self
            .fields
            .fetch(&booking.field_id)?
            .ok_or(StoreError::NotFound)?;

        access::require(
            &ctx.actor,
            Capability::DenyBooking,
            Relation::OwnerOf(&field.owner),
        )?;

        if booking.status != BookingStatus::Pending {
            return Err(StateError::BookingTransition {
                id: booking.id.clone(),
                from: booking.status,
                to: BookingStatus::Denied,
            }
            .into());
        }

        booking.status = BookingStatus::Denied;
        self.bookings.update(booking.clone())?;
        self.ledger.release(&booking.id);

        self.events.publish(DomainEvent::BookingDenied {
            booking_id: booking.id.clone(),
            reason: reason.to_string(),
        });
        info!(booking = %booking.id, reason, "booking denied");
        Ok(booking)
    }

    /// Cancel a pending or approved booking before the hunt day starts.
    pub fn cancel(
        &self,
        ctx: &RequestContext,
        booking_id: &BookingId,
    ) -> Result<Booking, BookingServiceError> {
        let mut booking = self
            .bookings
            .fetch(booking_id)?
            .ok_or(StoreError::NotFound)?;

        access::require(
            &ctx.actor,
            Capability::CancelBooking,
            Relation::RequesterOf(&booking.requester),
        )?;

        if let Some(session) = self.sessions.by_booking(&booking.id)? {
            if session.state != SessionState::NotStarted {
                return Err(StateError::CancelAfterStart {
                    id: booking.id.clone(),
                }
                .into());
            }
        }

        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Approved
        ) {
            return Err(StateError::BookingTransition {
                id: booking.id.clone(),
                from: booking.status,
                to: BookingStatus::Cancelled,
            }
            .into());
        }

        booking.status = BookingStatus::Cancelled;
        self.bookings.update(booking.clone())?;
        self.ledger.release(&booking.id);

        self.events.publish(DomainEvent::BookingCancelled {
            booking_id: booking.id.clone(),
        });
        info!(booking = %booking.id, "booking cancelled");
        Ok(booking)
    }

    /// Fetch a booking for API responses.
    pub fn get(&self, booking_id: &BookingId) -> Result<Booking, BookingServiceError> {
        let booking = self
            .bookings
            .fetch(booking_id)?
            .ok_or(StoreError::NotFound)?;
        Ok(booking)
    }
}

/// Error raised by the booking service; kinds map onto the taxonomy the
/// API layer reports.
#[derive(Debug, thiserror::Error)]
pub enum BookingServiceError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Availability(#[from] AvailabilityError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
}
