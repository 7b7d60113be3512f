use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Booking, BookingId, DateRange, DomainEvent, Field, FieldId};

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction for fields so the catalog and services can be
/// exercised in isolation.
pub trait FieldStore: Send + Sync {
    fn insert(&self, field: Field) -> Result<Field, StoreError>;
    fn fetch(&self, id: &FieldId) -> Result<Option<Field>, StoreError>;
    fn remove(&self, id: &FieldId) -> Result<(), StoreError>;
    fn all(&self) -> Result<Vec<Field>, StoreError>;
}

/// Storage abstraction for bookings.
pub trait BookingStore: Send + Sync {
    fn insert(&self, booking: Booking) -> Result<Booking, StoreError>;
    fn update(&self, booking: Booking) -> Result<(), StoreError>;
    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, StoreError>;
    fn by_field(&self, field: &FieldId) -> Result<Vec<Booking>, StoreError>;
    fn remove(&self, id: &BookingId) -> Result<(), StoreError>;
}

/// Outbound hook for the notification collaborator. Delivery is
/// fire-and-forget; the core never waits on an acknowledgment.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
    #[error("payment service unavailable: {0}")]
    Unavailable(String),
}

/// Payment collaborator seam. The core only records the reference token it
/// hands back at the Approved transition.
pub trait PaymentCollector: Send + Sync {
    fn collect(&self, booking_id: &BookingId, amount: u32) -> Result<String, PaymentError>;
}

/// Sanitized booking representation for API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingView {
    pub booking_id: BookingId,
    pub field_id: FieldId,
    pub status: &'static str,
    pub dates: DateRange,
    pub party_size: u32,
    pub price: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub created_on: NaiveDate,
}

impl Booking {
    pub fn to_view(&self) -> BookingView {
        BookingView {
            booking_id: self.id.clone(),
            field_id: self.field_id.clone(),
            status: self.status.label(),
            dates: self.dates.clone(),
            party_size: self.party_size,
            price: self.price,
            payment_reference: self.payment_reference.clone(),
            created_on: self.created_on,
        }
    }
}
