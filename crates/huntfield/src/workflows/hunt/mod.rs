//! Hunt-day lifecycle: start day, finish hunt, harvest reporting, quota
//! enforcement, and traceable animal tags.
//!
//! `finish_hunt` is the only writer of reports and tags, and it consumes
//! quota before anything is persisted, so a quota failure leaves no trace.

pub mod domain;
pub mod quota;
pub mod report;
pub mod service;
pub mod store;
pub mod tags;


pub use domain::{
    AnimalCondition, AnimalDraft, AnimalRecord, AnimalTag, HuntReport, HuntReview, HuntSession,
    QuotaPeriod, ReportDraft, ReportId, SessionId, SessionState,
};
pub use quota::{QuotaError, QuotaTracker};
pub use report::{apply_review, harvest_totals, validate_draft};
pub use service::{HuntService, HuntServiceError};
pub use store::{ReportStore, SessionStore, TagStore};
pub use tags::{AnimalTagIssuer, TagError};
