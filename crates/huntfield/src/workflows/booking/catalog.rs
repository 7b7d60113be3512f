use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::access::{self, AccessError, Capability, Relation};
use super::domain::{ActorId, Field, FieldId, GeoPoint, RequestContext, SpeciesQuota, ValidationError};
use super::ledger::AvailabilityLedger;
use super::pricing::PriceSchedule;
use super::store::{BookingStore, FieldStore, StoreError};
use crate::workflows::hunt::store::{ReportStore, SessionStore, TagStore};

static FIELD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_field_id() -> FieldId {
    let id = FIELD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    FieldId(format!("fld-{id:04}"))
}

/// Inbound payload for registering a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDraft {
    pub name: String,
    /// Owner of the ground; defaults to the registering actor.
    #[serde(default)]
    pub owner: Option<ActorId>,
    pub location: GeoPoint,
    pub species: Vec<SpeciesQuota>,
    pub pricing: PriceSchedule,
    pub capacity: u32,
    #[serde(default)]
    pub blocked_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub auto_approve: bool,
}

/// Field registration and the admin deletion cascade.
pub struct FieldCatalog {
    fields: Arc<dyn FieldStore>,
    bookings: Arc<dyn BookingStore>,
    sessions: Arc<dyn SessionStore>,
    reports: Arc<dyn ReportStore>,
    tags: Arc<dyn TagStore>,
    ledger: Arc<AvailabilityLedger>,
}

impl FieldCatalog {
    pub fn new(
        fields: Arc<dyn FieldStore>,
        bookings: Arc<dyn BookingStore>,
        sessions: Arc<dyn SessionStore>,
        reports: Arc<dyn ReportStore>,
        tags: Arc<dyn TagStore>,
        ledger: Arc<AvailabilityLedger>,
    ) -> Self {
        Self {
            fields,
            bookings,
            sessions,
            reports,
            tags,
            ledger,
        }
    }

    pub fn register_field(
        &self,
        ctx: &RequestContext,
        draft: FieldDraft,
    ) -> Result<Field, CatalogError> {
        access::require(&ctx.actor, Capability::RegisterField, Relation::None)?;

        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyFieldName.into());
        }
        if draft.species.is_empty() {
            return Err(ValidationError::NoSpeciesQuota.into());
        }
        if draft.capacity == 0 {
            return Err(ValidationError::ZeroCapacity.into());
        }

        let field = Field {
            id: next_field_id(),
            name: name.to_string(),
            owner: draft.owner.unwrap_or_else(|| ctx.actor.id.clone()),
            location: draft.location,
            species: draft.species,
            pricing: draft.pricing,
            capacity: draft.capacity,
            blocked_dates: draft.blocked_dates,
            auto_approve: draft.auto_approve,
        };

        let stored = self.fields.insert(field)?;
        info!(field = %stored.id, name = %stored.name, "field registered");
        Ok(stored)
    }

    pub fn get(&self, field_id: &FieldId) -> Result<Field, CatalogError> {
        let field = self.fields.fetch(field_id)?.ok_or(StoreError::NotFound)?;
        Ok(field)
    }

    pub fn list(&self) -> Result<Vec<Field>, CatalogError> {
        Ok(self.fields.all()?)
    }

    /// Cascading deletion, leaves first: each booking's tags, report, and
    /// session go before the booking itself, the field last. A cascade that
    /// stops on a store error leaves the field and its remaining bookings
    /// in place, so repeating the delete finishes the job. Returns
    /// `Ok(false)` when the field does not exist.
    pub fn delete_field(
        &self,
        ctx: &RequestContext,
        field_id: &FieldId,
    ) -> Result<bool, CatalogError> {
        access::require(&ctx.actor, Capability::DeleteField, Relation::None)?;

        if self.fields.fetch(field_id)?.is_none() {
            return Ok(false);
        }

        let bookings = self.bookings.by_field(field_id)?;
        for booking in &bookings {
            if let Some(session) = self.sessions.by_booking(&booking.id)? {
                if let Some(report) = self.reports.by_session(&session.id)? {
                    self.tags.remove_for_report(&report.id)?;
                    self.reports.remove(&report.id)?;
                }
                self.sessions.remove(&session.id)?;
            }
            self.bookings.remove(&booking.id)?;
        }

        self.ledger.release_field(field_id);
        self.fields.remove(field_id)?;
        info!(field = %field_id, bookings = bookings.len(), "field deleted with cascade");
        Ok(true)
    }
}

/// Error raised by catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
