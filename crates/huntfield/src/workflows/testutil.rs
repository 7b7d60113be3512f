//! In-memory stores and fixtures shared by the workflow test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use uuid::Uuid;

use super::booking::catalog::FieldCatalog;
use super::booking::domain::{
    Actor, Booking, BookingId, DomainEvent, Field, FieldId, GeoPoint, RequestContext, Role,
    SpeciesQuota,
};
use super::booking::ledger::AvailabilityLedger;
use super::booking::pricing::PriceSchedule;
use super::booking::service::BookingService;
use super::booking::store::{
    BookingStore, EventPublisher, FieldStore, PaymentCollector, PaymentError, StoreError,
};
use super::hunt::domain::{AnimalTag, HuntReport, HuntSession, ReportId, SessionId};
use super::hunt::quota::QuotaTracker;
use super::hunt::service::HuntService;
use super::hunt::store::{ReportStore, SessionStore, TagStore};
use super::hunt::tags::AnimalTagIssuer;

#[derive(Default)]
pub(crate) struct MemoryFieldStore {
    records: Mutex<HashMap<FieldId, Field>>,
}

impl FieldStore for MemoryFieldStore {
    fn insert(&self, field: Field) -> Result<Field, StoreError> {
        let mut guard = self.records.lock().expect("field mutex poisoned");
        if guard.contains_key(&field.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(field.id.clone(), field.clone());
        Ok(field)
    }

    fn fetch(&self, id: &FieldId) -> Result<Option<Field>, StoreError> {
        let guard = self.records.lock().expect("field mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &FieldId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("field mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn all(&self) -> Result<Vec<Field>, StoreError> {
        let guard = self.records.lock().expect("field mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
pub(crate) struct MemoryBookingStore {
    records: Mutex<HashMap<BookingId, Booking>>,
}

impl BookingStore for MemoryBookingStore {
    fn insert(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut guard = self.records.lock().expect("booking mutex poisoned");
        if guard.contains_key(&booking.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    fn update(&self, booking: Booking) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("booking mutex poisoned");
        if !guard.contains_key(&booking.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(booking.id.clone(), booking);
        Ok(())
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, StoreError> {
        let guard = self.records.lock().expect("booking mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn by_field(&self, field: &FieldId) -> Result<Vec<Booking>, StoreError> {
        let guard = self.records.lock().expect("booking mutex poisoned");
        Ok(guard
            .values()
            .filter(|b| &b.field_id == field)
            .cloned()
            .collect())
    }

    fn remove(&self, id: &BookingId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("booking mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub(crate) struct MemorySessionStore {
    records: Mutex<HashMap<SessionId, HuntSession>>,
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: HuntSession) -> Result<HuntSession, StoreError> {
        let mut guard = self.records.lock().expect("session mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: HuntSession) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("session mutex poisoned");
        if !guard.contains_key(&session.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<HuntSession>, StoreError> {
        let guard = self.records.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn by_booking(&self, booking: &BookingId) -> Result<Option<HuntSession>, StoreError> {
        let guard = self.records.lock().expect("session mutex poisoned");
        Ok(guard.values().find(|s| &s.booking_id == booking).cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("session mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub(crate) struct MemoryReportStore {
    records: Mutex<HashMap<ReportId, HuntReport>>,
}

impl ReportStore for MemoryReportStore {
    fn insert(&self, report: HuntReport) -> Result<HuntReport, StoreError> {
        let mut guard = self.records.lock().expect("report mutex poisoned");
        if guard.contains_key(&report.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(report.id.clone(), report.clone());
        Ok(report)
    }

    fn update(&self, report: HuntReport) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("report mutex poisoned");
        if !guard.contains_key(&report.id) {
            return Err(StoreError::NotFound);
        }
        guard.insert(report.id.clone(), report);
        Ok(())
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<HuntReport>, StoreError> {
        let guard = self.records.lock().expect("report mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn by_session(&self, session: &SessionId) -> Result<Option<HuntReport>, StoreError> {
        let guard = self.records.lock().expect("report mutex poisoned");
        Ok(guard.values().find(|r| &r.session_id == session).cloned())
    }

    fn remove(&self, id: &ReportId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("report mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub(crate) struct MemoryTagStore {
    records: Mutex<Vec<AnimalTag>>,
}

impl TagStore for MemoryTagStore {
    fn record(&self, tag: AnimalTag) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("tag mutex poisoned");
        if guard
            .iter()
            .any(|t| t.report_id == tag.report_id && t.record_index == tag.record_index)
        {
            return Err(StoreError::Conflict);
        }
        guard.push(tag);
        Ok(())
    }

    fn by_record(&self, report: &ReportId, index: usize) -> Result<Option<AnimalTag>, StoreError> {
        let guard = self.records.lock().expect("tag mutex poisoned");
        Ok(guard
            .iter()
            .find(|t| &t.report_id == report && t.record_index == index)
            .cloned())
    }

    fn by_number(&self, number: &Uuid) -> Result<Option<AnimalTag>, StoreError> {
        let guard = self.records.lock().expect("tag mutex poisoned");
        Ok(guard.iter().find(|t| &t.tag_number == number).cloned())
    }

    fn remove_for_report(&self, report: &ReportId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("tag mutex poisoned");
        guard.retain(|t| &t.report_id != report);
        Ok(())
    }
}

impl MemoryTagStore {
    pub(crate) fn all(&self) -> Vec<AnimalTag> {
        self.records.lock().expect("tag mutex poisoned").clone()
    }
}

#[derive(Default)]
pub(crate) struct RecordingEvents {
    events: Mutex<Vec<DomainEvent>>,
}

impl EventPublisher for RecordingEvents {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().expect("event mutex poisoned").push(event);
    }
}

impl RecordingEvents {
    pub(crate) fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

/// Payment stub issuing sequential reference tokens.
#[derive(Default)]
pub(crate) struct SimPayments {
    sequence: AtomicU64,
}

impl PaymentCollector for SimPayments {
    fn collect(&self, _booking_id: &BookingId, _amount: u32) -> Result<String, PaymentError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("pay-{id:06}"))
    }
}

/// Payment stub that always declines.
pub(crate) struct DecliningPayments;

impl PaymentCollector for DecliningPayments {
    fn collect(&self, _booking_id: &BookingId, _amount: u32) -> Result<String, PaymentError> {
        Err(PaymentError::Declined("card refused".to_string()))
    }
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(crate) fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

pub(crate) fn owner() -> Actor {
    Actor::new("owner-1", Role::LandownerMember)
}

pub(crate) fn hunter() -> Actor {
    Actor::new("hunter-1", Role::ShootingMember)
}

pub(crate) fn visitor() -> Actor {
    Actor::new("intl-1", Role::InternationalHunter)
}

pub(crate) fn ctx(actor: Actor, today: NaiveDate) -> RequestContext {
    RequestContext::new(actor, today)
}

pub(crate) fn deer_field(id: &str, auto_approve: bool) -> Field {
    Field {
        id: FieldId(id.to_string()),
        name: "Black Fen".to_string(),
        owner: owner().id,
        location: GeoPoint { lat: 52.2, lon: 0.12 },
        species: vec![
            SpeciesQuota {
                species: "Deer".to_string(),
                limit: 2,
            },
            SpeciesQuota {
                species: "Pheasant".to_string(),
                limit: 10,
            },
        ],
        pricing: PriceSchedule::flat(250).with_rate(Role::ShootingMember, 80),
        capacity: 4,
        blocked_dates: Vec::new(),
        auto_approve,
    }
}

/// Fully wired service stack over the in-memory stores.
pub(crate) struct Harness {
    pub(crate) fields: Arc<MemoryFieldStore>,
    pub(crate) bookings: Arc<MemoryBookingStore>,
    pub(crate) sessions: Arc<MemorySessionStore>,
    pub(crate) reports: Arc<MemoryReportStore>,
    pub(crate) tags: Arc<MemoryTagStore>,
    pub(crate) ledger: Arc<AvailabilityLedger>,
    pub(crate) quota: Arc<QuotaTracker>,
    pub(crate) events: Arc<RecordingEvents>,
    pub(crate) booking_service: BookingService,
    pub(crate) hunt_service: HuntService,
    pub(crate) catalog: FieldCatalog,
    pub(crate) issuer: AnimalTagIssuer,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_payments(Arc::new(SimPayments::default()))
    }

    pub(crate) fn with_payments(payments: Arc<dyn PaymentCollector>) -> Self {
        let fields = Arc::new(MemoryFieldStore::default());
        let bookings = Arc::new(MemoryBookingStore::default());
        let sessions = Arc::new(MemorySessionStore::default());
        let reports = Arc::new(MemoryReportStore::default());
        let tags = Arc::new(MemoryTagStore::default());
        let ledger = Arc::new(AvailabilityLedger::new());
        let quota = Arc::new(QuotaTracker::new());
        let events = Arc::new(RecordingEvents::default());
        let issuer = AnimalTagIssuer::new(tags.clone() as Arc<dyn TagStore>);

        let booking_service = BookingService::new(
            fields.clone(),
            bookings.clone(),
            sessions.clone(),
            ledger.clone(),
            events.clone(),
            payments,
        );
        let hunt_service = HuntService::new(
            bookings.clone(),
            fields.clone(),
            sessions.clone(),
            reports.clone(),
            issuer.clone(),
            quota.clone(),
            events.clone(),
        );
        let catalog = FieldCatalog::new(
            fields.clone(),
            bookings.clone(),
            sessions.clone(),
            reports.clone(),
            tags.clone(),
            ledger.clone(),
        );

        Self {
            fields,
            bookings,
            sessions,
            reports,
            tags,
            ledger,
            quota,
            events,
            booking_service,
            hunt_service,
            catalog,
            issuer,
        }
    }

    pub(crate) fn seed_field(&self, field: Field) -> Field {
        self.fields.insert(field).expect("field seeds")
    }
}
