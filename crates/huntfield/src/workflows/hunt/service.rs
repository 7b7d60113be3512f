use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    AnimalRecord, AnimalTag, HuntReport, HuntSession, QuotaPeriod, ReportDraft, ReportId,
    SessionId, SessionState,
};
use super::quota::{QuotaError, QuotaTracker};
use super::report;
use super::store::{ReportStore, SessionStore};
use super::tags::{AnimalTagIssuer, TagError};
use crate::workflows::booking::access::{self, AccessError, Capability, Relation};
use crate::workflows::booking::domain::{
    Booking, BookingId, BookingStatus, DomainEvent, Field, RequestContext, StateError,
    ValidationError,
};
use crate::workflows::booking::store::{BookingStore, EventPublisher, FieldStore, StoreError};

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static REPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("hs-{id:06}"))
}

fn next_report_id() -> ReportId {
    let id = REPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReportId(format!("hr-{id:06}"))
}

/// Hunt session state machine plus the finish-hunt reporting pipeline.
pub struct HuntService {
    bookings: Arc<dyn BookingStore>,
    fields: Arc<dyn FieldStore>,
    sessions: Arc<dyn SessionStore>,
    reports: Arc<dyn ReportStore>,
    issuer: AnimalTagIssuer,
    quota: Arc<QuotaTracker>,
    events: Arc<dyn EventPublisher>,
}

impl HuntService {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        fields: Arc<dyn FieldStore>,
        sessions: Arc<dyn SessionStore>,
        reports: Arc<dyn ReportStore>,
        issuer: AnimalTagIssuer,
        quota: Arc<QuotaTracker>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            bookings,
            fields,
            sessions,
            reports,
            issuer,
            quota,
            events,
        }
    }

    /// Open the hunt day for an approved booking. Creates the session on
    /// first use and moves it NotStarted -> InProgress.
    pub fn start_day(
        &self,
        ctx: &RequestContext,
        booking_id: &BookingId,
    ) -> Result<HuntSession, HuntServiceError> {
        let booking = self
            .bookings
            .fetch(booking_id)?
            .ok_or(StoreError::NotFound)?;

        access::require(
            &ctx.actor,
            Capability::StartDay,
            Relation::RequesterOf(&booking.requester),
        )?;

        if booking.status != BookingStatus::Approved {
            return Err(StateError::BookingNotApproved {
                id: booking.id.clone(),
                status: booking.status,
            }
            .into());
        }
        if !booking.dates.contains(ctx.today) {
            return Err(StateError::OutsideBookedRange {
                date: ctx.today,
                range: booking.dates.clone(),
            }
            .into());
        }

        let mut session = match self.sessions.by_booking(&booking.id)? {
            Some(existing) => existing,
            None => self.sessions.insert(HuntSession {
                id: next_session_id(),
                booking_id: booking.id.clone(),
                state: SessionState::NotStarted,
                started_on: None,
                finished_on: None,
            })?,
        };

        if session.state != SessionState::NotStarted {
            return Err(StateError::SessionAlreadyStarted {
                id: booking.id.clone(),
                state: session.state.label(),
            }
            .into());
        }

        session.state = SessionState::InProgress;
        session.started_on = Some(ctx.today);
        self.sessions.update(session.clone())?;

        self.events.publish(DomainEvent::SessionStarted {
            booking_id: booking.id.clone(),
            on: ctx.today,
        });
        info!(booking = %booking.id, session = %session.id, "hunt day started");
        Ok(session)
    }

    /// Close the hunt and commit its report. Quota is consumed for every
    /// species in the report before anything is written; on a quota failure
    /// no report, tag, or counter change survives. If a store write fails
    /// after the counters moved, the consumed quota is handed back and any
    /// recorded tags are voided before the error propagates.
    pub fn finish_hunt(
        &self,
        ctx: &RequestContext,
        booking_id: &BookingId,
        draft: ReportDraft,
    ) -> Result<HuntReport, HuntServiceError> {
        let booking = self
            .bookings
            .fetch(booking_id)?
            .ok_or(StoreError::NotFound)?;

        access::require(
            &ctx.actor,
            Capability::FinishHunt,
            Relation::RequesterOf(&booking.requester),
        )?;

        let session = self
            .sessions
            .by_booking(&booking.id)?
            .ok_or_else(|| StateError::SessionNotInProgress {
                id: booking.id.clone(),
            })?;
        if session.state != SessionState::InProgress {
            return Err(StateError::SessionNotInProgress {
                id: booking.id.clone(),
            }
            .into());
        }

        let field = self
            .fields
            .fetch(&booking.field_id)?
            .ok_or(StoreError::NotFound)?;

        report::validate_draft(&field, &draft)?;

        let period = QuotaPeriod::from_date(ctx.today);
        let totals = report::harvest_totals(&draft);
        self.quota.consume_all(&field, period, &totals)?;

        let report_id = next_report_id();
        let stored = match self.commit_report(ctx, &field, &booking, &session, draft, &report_id) {
            Ok(stored) => stored,
            Err(err) => {
                self.quota.release_all(&field.id, period, &totals);
                self.unwind_partial_commit(&report_id, &session);
                return Err(err);
            }
        };

        self.events.publish(DomainEvent::SessionFinished {
            booking_id: booking.id.clone(),
            animals_taken: stored.animals_taken(),
        });
        info!(
            booking = %booking.id,
            report = %stored.id,
            animals = stored.animals_taken(),
            "hunt finished"
        );
        Ok(stored)
    }

    fn commit_report(
        &self,
        ctx: &RequestContext,
        field: &Field,
        booking: &Booking,
        session: &HuntSession,
        draft: ReportDraft,
        report_id: &ReportId,
    ) -> Result<HuntReport, HuntServiceError> {
        let mut animals: Vec<AnimalRecord> = draft
            .animals
            .iter()
            .map(|animal| AnimalRecord {
                species: animal.species.clone(),
                condition: animal.condition,
                disease: animal.disease.clone(),
                tag_number: None,
            })
            .collect();

        for (index, animal) in animals.iter_mut().enumerate() {
            let issued = self.issuer.issue_tag(AnimalTag {
                tag_number: uuid::Uuid::nil(),
                verification_code: String::new(),
                report_id: report_id.clone(),
                record_index: index,
                field_id: field.id.clone(),
                species: animal.species.clone(),
                condition: animal.condition,
                disease: animal.disease.clone(),
                taken_on: ctx.today,
            })?;
            animal.tag_number = Some(issued.tag_number);
        }

        let stored = self.reports.insert(HuntReport {
            id: report_id.clone(),
            session_id: session.id.clone(),
            animals,
            ground_remarks: draft.ground_remarks,
            conditions: draft.conditions,
            hours_afield: draft.hours_afield,
            review: None,
        })?;

        let mut finished = session.clone();
        finished.state = SessionState::Finished;
        finished.finished_on = Some(ctx.today);
        self.sessions.update(finished)?;

        let mut completed = booking.clone();
        completed.status = BookingStatus::Completed;
        self.bookings.update(completed)?;

        Ok(stored)
    }

    /// Best-effort cleanup after an aborted commit; the original error is
    /// what propagates, cleanup failures only get logged.
    fn unwind_partial_commit(&self, report_id: &ReportId, session: &HuntSession) {
        if let Err(err) = self.issuer.void_report(report_id) {
            warn!(report = %report_id, error = %err, "tags left behind after aborted finish");
        }
        match self.reports.remove(report_id) {
            Ok(()) | Err(StoreError::NotFound) => {}
            Err(err) => {
                warn!(report = %report_id, error = %err, "report left behind after aborted finish");
            }
        }
        if let Err(err) = self.sessions.update(session.clone()) {
            warn!(session = %session.id, error = %err, "session not restored after aborted finish");
        }
    }

    /// Attach or replace the public review on an existing report.
    pub fn attach_review(
        &self,
        ctx: &RequestContext,
        report_id: &ReportId,
        rating: u8,
        text: String,
    ) -> Result<HuntReport, HuntServiceError> {
        let mut stored = self
            .reports
            .fetch(report_id)?
            .ok_or(StoreError::NotFound)?;
        let session = self
            .sessions
            .fetch(&stored.session_id)?
            .ok_or(StoreError::NotFound)?;
        let booking = self
            .bookings
            .fetch(&session.booking_id)?
            .ok_or(StoreError::NotFound)?;

        access::require(
            &ctx.actor,
            Capability::AttachReview,
            Relation::RequesterOf(&booking.requester),
        )?;

        report::apply_review(&mut stored, rating, text)?;
        self.reports.update(stored.clone())?;
        Ok(stored)
    }

    /// Session lookup for API responses.
    pub fn session_for(&self, booking_id: &BookingId) -> Result<HuntSession, HuntServiceError> {
        let session = self
            .sessions
            .by_booking(booking_id)?
            .ok_or(StoreError::NotFound)?;
        Ok(session)
    }

    /// Report lookup for API responses.
    pub fn report(&self, report_id: &ReportId) -> Result<HuntReport, HuntServiceError> {
        let stored = self
            .reports
            .fetch(report_id)?
            .ok_or(StoreError::NotFound)?;
        Ok(stored)
    }
}

/// Error raised by the hunt service.
#[derive(Debug, thiserror::Error)]
pub enum HuntServiceError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Quota(#[from] QuotaError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Tag(#[from] TagError),
}
