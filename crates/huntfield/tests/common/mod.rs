//! In-memory wiring for exercising the HTTP surface end to end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use uuid::Uuid;

use huntfield::config::VerificationConfig;
use huntfield::workflows::booking::{
    AvailabilityLedger, Booking, BookingId, BookingService, BookingStore, DomainEvent,
    EventPublisher, Field, FieldCatalog, FieldId, FieldStore, PaymentCollector, PaymentError,
    StoreError,
};
use huntfield::workflows::hunt::{
    AnimalTag, AnimalTagIssuer, HuntReport, HuntService, HuntSession, QuotaTracker, ReportId,
    ReportStore, SessionId, SessionStore, TagStore,
};
use huntfield::workflows::router::{core_router, CoreState};

#[derive(Default)]
pub struct MemoryFieldStore {
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
        Ok(self
            .records
            .lock()
            .expect("field mutex poisoned")
            .get(id)
            .cloned())
    }

    fn remove(&self, id: &FieldId) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("field mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn all(&self) -> Result<Vec<Field>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("field mutex poisoned")
            .values()
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryBookingStore {
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
        Ok(self
            .records
            .lock()
            .expect("booking mutex poisoned")
            .get(id)
            .cloned())
    }

    fn by_field(&self, field: &FieldId) -> Result<Vec<Booking>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("booking mutex poisoned")
            .values()
            .filter(|b| &b.field_id == field)
            .cloned()
            .collect())
    }

    fn remove(&self, id: &BookingId) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("booking mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
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
        Ok(self
            .records
            .lock()
            .expect("session mutex poisoned")
            .get(id)
            .cloned())
    }

    fn by_booking(&self, booking: &BookingId) -> Result<Option<HuntSession>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("session mutex poisoned")
            .values()
            .find(|s| &s.booking_id == booking)
            .cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("session mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryReportStore {
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
        Ok(self
            .records
            .lock()
            .expect("report mutex poisoned")
            .get(id)
            .cloned())
    }

    fn by_session(&self, session: &SessionId) -> Result<Option<HuntReport>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("report mutex poisoned")
            .values()
            .find(|r| &r.session_id == session)
            .cloned())
    }

    fn remove(&self, id: &ReportId) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("report mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryTagStore {
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
        Ok(self
            .records
            .lock()
            .expect("tag mutex poisoned")
            .iter()
            .find(|t| &t.report_id == report && t.record_index == index)
            .cloned())
    }

    fn by_number(&self, number: &Uuid) -> Result<Option<AnimalTag>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("tag mutex poisoned")
            .iter()
            .find(|t| &t.tag_number == number)
            .cloned())
    }

    fn remove_for_report(&self, report: &ReportId) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("tag mutex poisoned")
            .retain(|t| &t.report_id != report);
        Ok(())
    }
}

pub struct NullEvents;

impl EventPublisher for NullEvents {
    fn publish(&self, _event: DomainEvent) {}
}

pub struct SimPayments {
    sequence: AtomicU64,
}

impl PaymentCollector for SimPayments {
    fn collect(&self, _booking_id: &BookingId, _amount: u32) -> Result<String, PaymentError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(format!("pay-{id:06}"))
    }
}

/// Build the full router over fresh in-memory stores.
pub fn app() -> Router {
    let fields = Arc::new(MemoryFieldStore::default());
    let bookings = Arc::new(MemoryBookingStore::default());
    let sessions = Arc::new(MemorySessionStore::default());
    let reports = Arc::new(MemoryReportStore::default());
    let tags = Arc::new(MemoryTagStore::default());
    let ledger = Arc::new(AvailabilityLedger::new());
    let quota = Arc::new(QuotaTracker::new());
    let events = Arc::new(NullEvents);
    let payments = Arc::new(SimPayments {
        sequence: AtomicU64::new(0),
    });
    let issuer = AnimalTagIssuer::new(tags.clone() as Arc<dyn TagStore>);

    let booking_service = Arc::new(BookingService::new(
        fields.clone(),
        bookings.clone(),
        sessions.clone(),
        ledger.clone(),
        events.clone(),
        payments,
    ));
    let hunt_service = Arc::new(HuntService::new(
        bookings.clone(),
        fields.clone(),
        sessions.clone(),
        reports.clone(),
        issuer.clone(),
        quota,
        events,
    ));
    let catalog = Arc::new(FieldCatalog::new(
        fields, bookings, sessions, reports, tags, ledger,
    ));

    core_router(Arc::new(CoreState {
        bookings: booking_service,
        hunts: hunt_service,
        catalog,
        issuer,
        verification: VerificationConfig {
            base_url: "https://huntfield.example/verify".to_string(),
        },
    }))
}

/// Fire one JSON request at the router and decode the JSON response.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            builder
                .body(Body::from(value.to_string()))
                .expect("request builds")
        }
        None => builder.body(Body::empty()).expect("request builds"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}
