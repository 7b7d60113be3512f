//! Field discovery, availability, and booking lifecycle for the marketplace.
//!
//! The ledger holds the only mutable view of per-field occupancy; every
//! reservation passes through one critical section so a check and a reserve
//! can never interleave. Lifecycle transitions live in [`service`], field
//! registration and cascade deletion in [`catalog`].

pub mod access;
pub mod catalog;
pub mod domain;
pub mod ledger;
pub mod pricing;
pub mod service;
pub mod store;


pub use access::{AccessError, Capability, Relation};
pub use catalog::{CatalogError, FieldCatalog, FieldDraft};
pub use domain::{
    Actor, ActorId, Booking, BookingId, BookingStatus, DateRange, DomainEvent, Field, FieldId,
    GeoPoint, RequestContext, Role, SpeciesQuota, StateError, ValidationError,
};
pub use ledger::{AvailabilityError, AvailabilityLedger};
pub use pricing::PriceSchedule;
pub use service::{BookingService, BookingServiceError};
pub use store::{
    BookingStore, BookingView, EventPublisher, FieldStore, PaymentCollector, PaymentError,
    StoreError,
};
