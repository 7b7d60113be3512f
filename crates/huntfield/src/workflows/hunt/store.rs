use uuid::Uuid;

use super::domain::{AnimalTag, HuntReport, HuntSession, ReportId, SessionId};
use crate::workflows::booking::domain::BookingId;
use crate::workflows::booking::store::StoreError;

/// Storage abstraction for hunt sessions (1:1 with bookings).
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: HuntSession) -> Result<HuntSession, StoreError>;
    fn update(&self, session: HuntSession) -> Result<(), StoreError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<HuntSession>, StoreError>;
    fn by_booking(&self, booking: &BookingId) -> Result<Option<HuntSession>, StoreError>;
    fn remove(&self, id: &SessionId) -> Result<(), StoreError>;
}

/// Storage abstraction for hunt reports (0..1 per session).
pub trait ReportStore: Send + Sync {
    fn insert(&self, report: HuntReport) -> Result<HuntReport, StoreError>;
    fn update(&self, report: HuntReport) -> Result<(), StoreError>;
    fn fetch(&self, id: &ReportId) -> Result<Option<HuntReport>, StoreError>;
    fn by_session(&self, session: &SessionId) -> Result<Option<HuntReport>, StoreError>;
    fn remove(&self, id: &ReportId) -> Result<(), StoreError>;
}

/// Storage abstraction for issued animal tags. Tags are immutable once
/// recorded; the only mutation is the cascade removal with their report.
pub trait TagStore: Send + Sync {
    fn record(&self, tag: AnimalTag) -> Result<(), StoreError>;
    fn by_record(&self, report: &ReportId, index: usize) -> Result<Option<AnimalTag>, StoreError>;
    fn by_number(&self, number: &Uuid) -> Result<Option<AnimalTag>, StoreError>;
    fn remove_for_report(&self, report: &ReportId) -> Result<(), StoreError>;
}
