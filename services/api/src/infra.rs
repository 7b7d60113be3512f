use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

use huntfield::workflows::booking::{
    Booking, BookingId, BookingStore, DomainEvent, EventPublisher, Field, FieldId,
    FieldStore, PaymentCollector, PaymentError, StoreError,
};
use huntfield::workflows::hunt::{
    AnimalTag, HuntReport, HuntSession, ReportId, ReportStore, SessionId, SessionStore, TagStore,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryFieldStore {
    records: Mutex<HashMap<FieldId, Field>>,
}

impl FieldStore for InMemoryFieldStore {
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
pub(crate) struct InMemoryBookingStore {
    records: Mutex<HashMap<BookingId, Booking>>,
}

impl BookingStore for InMemoryBookingStore {
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
        if guard.contains_key(&booking.id) {
            guard.insert(booking.id.clone(), booking);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
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
pub(crate) struct InMemorySessionStore {
    records: Mutex<HashMap<SessionId, HuntSession>>,
}

impl SessionStore for InMemorySessionStore {
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
        if guard.contains_key(&session.id) {
            guard.insert(session.id.clone(), session);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
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
pub(crate) struct InMemoryReportStore {
    records: Mutex<HashMap<ReportId, HuntReport>>,
}

impl ReportStore for InMemoryReportStore {
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
        if guard.contains_key(&report.id) {
            guard.insert(report.id.clone(), report);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
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
pub(crate) struct InMemoryTagStore {
    records: Mutex<Vec<AnimalTag>>,
}

impl TagStore for InMemoryTagStore {
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

    fn by_record(
        &self,
        report: &ReportId,
        index: usize,
    ) -> Result<Option<AnimalTag>, StoreError> {
        let guard = self.records.lock().expect("tag mutex poisoned");
        Ok(guard
            .iter()
            .find(|t| &t.report_id == report && t.record_index == index)
            .cloned())
    }

    fn by_number(&self, number: &uuid::Uuid) -> Result<Option<AnimalTag>, StoreError> {
        let guard = self.records.lock().expect("tag mutex poisoned");
        Ok(guard.iter().find(|t| &t.tag_number == number).cloned())
    }

    fn remove_for_report(&self, report: &ReportId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("tag mutex poisoned");
        guard.retain(|t| &t.report_id != report);
        Ok(())
    }
}

/// Logs every domain event; a queue or webhook sits here in production.
#[derive(Default)]
pub(crate) struct LoggingEventPublisher;

impl EventPublisher for LoggingEventPublisher {
    fn publish(&self, event: DomainEvent) {
        info!(?event, "domain event");
    }
}

/// Stand-in payment collaborator issuing sequential reference tokens.
#[derive(Default)]
pub(crate) struct SimulatedPayments {
    sequence: AtomicU64,
}

impl PaymentCollector for SimulatedPayments {
    fn collect(&self, booking_id: &BookingId, amount: u32) -> Result<String, PaymentError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        info!(booking = %booking_id, amount, "payment collected");
        Ok(format!("pay-{id:06}"))
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
