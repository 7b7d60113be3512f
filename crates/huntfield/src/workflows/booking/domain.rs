use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::pricing::PriceSchedule;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership roles supplied by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ShootingMember,
    InternationalHunter,
    LandownerMember,
    GuideMember,
    Admin,
}

impl Role {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::ShootingMember,
            Self::InternationalHunter,
            Self::LandownerMember,
            Self::GuideMember,
            Self::Admin,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ShootingMember => "Shooting Member",
            Self::InternationalHunter => "International Hunter",
            Self::LandownerMember => "Landowner Member",
            Self::GuideMember => "Guide Member",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller identity attached to every operation. The compliance flag comes
/// from the identity service; a lapsed member keeps their account but loses
/// the ability to act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
    pub compliant: bool,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: ActorId(id.into()),
            role,
            compliant: true,
        }
    }
}

/// Request-scoped context passed into each operation instead of ambient
/// session state: who is acting, and what "today" means for date checks.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: Actor,
    pub today: NaiveDate,
}

impl RequestContext {
    pub fn new(actor: Actor, today: NaiveDate) -> Self {
        Self { actor, today }
    }
}

/// Inclusive date range a booking occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::ReversedDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of bookable days, inclusive of both endpoints.
    pub fn days(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Denied,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Denied => "Denied",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Per-species harvest ceiling for one field within a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesQuota {
    pub species: String,
    pub limit: u32,
}

/// A bookable hunting ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub owner: ActorId,
    pub location: GeoPoint,
    pub species: Vec<SpeciesQuota>,
    pub pricing: PriceSchedule,
    pub capacity: u32,
    pub blocked_dates: Vec<NaiveDate>,
    pub auto_approve: bool,
}

impl Field {
    pub fn allows_species(&self, species: &str) -> bool {
        self.species
            .iter()
            .any(|quota| quota.species.eq_ignore_ascii_case(species))
    }

    pub fn quota_limit(&self, species: &str) -> Option<u32> {
        self.species
            .iter()
            .find(|quota| quota.species.eq_ignore_ascii_case(species))
            .map(|quota| quota.limit)
    }

    pub fn blocked_within(&self, range: &DateRange) -> Option<NaiveDate> {
        self.blocked_dates
            .iter()
            .copied()
            .find(|day| range.contains(*day))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub field_id: FieldId,
    pub requester: ActorId,
    pub dates: DateRange,
    pub party_size: u32,
    pub status: BookingStatus,
    pub price: u32,
    pub payment_reference: Option<String>,
    pub created_on: NaiveDate,
}

/// Events handed to the notification collaborator on every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingCreated {
        booking_id: BookingId,
        field_id: FieldId,
        status: BookingStatus,
    },
    BookingApproved {
        booking_id: BookingId,
        price: u32,
        payment_reference: String,
    },
    BookingDenied {
        booking_id: BookingId,
        reason: String,
    },
    BookingCancelled {
        booking_id: BookingId,
    },
    SessionStarted {
        booking_id: BookingId,
        on: NaiveDate,
    },
    SessionFinished {
        booking_id: BookingId,
        animals_taken: u32,
    },
}

/// Malformed input, rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("date range is reversed ({start} after {end})")]
    ReversedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("booking cannot start in the past ({start} before {today})")]
    StartsInPast { start: NaiveDate, today: NaiveDate },
    #[error("party of {requested} exceeds field capacity of {capacity}")]
    PartyExceedsCapacity { requested: u32, capacity: u32 },
    #[error("party size must be at least one")]
    EmptyParty,
    #[error("species '{species}' is not available on this field")]
    UnknownSpecies { species: String },
    #[error("ground remarks are required on a hunt report")]
    MissingGroundRemarks,
    #[error("review rating {rating} is outside 1..=5")]
    RatingOutOfRange { rating: u8 },
    #[error("field name must not be empty")]
    EmptyFieldName,
    #[error("field must list at least one species with a quota")]
    NoSpeciesQuota,
    #[error("field capacity must be at least one")]
    ZeroCapacity,
}

/// Illegal lifecycle transition; prior state is left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("booking {id} cannot move from {from} to {to}")]
    BookingTransition {
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("booking {id} must be approved before the day starts (currently {status})")]
    BookingNotApproved { id: BookingId, status: BookingStatus },
    #[error("{date} is outside the booked range {range}")]
    OutsideBookedRange { date: NaiveDate, range: DateRange },
    #[error("hunt for booking {id} has already started; state is {state}")]
    SessionAlreadyStarted { id: BookingId, state: &'static str },
    #[error("no hunt in progress for booking {id}")]
    SessionNotInProgress { id: BookingId },
    #[error("booking {id} cannot be cancelled once the hunt day has started")]
    CancelAfterStart { id: BookingId },
}

#[cfg(test)]
mod unit {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn date_range_overlap_is_inclusive() {
        let a = DateRange::new(date(2025, 12, 1), date(2025, 12, 3)).expect("valid");
        let b = DateRange::new(date(2025, 12, 3), date(2025, 12, 4)).expect("valid");
        let c = DateRange::new(date(2025, 12, 4), date(2025, 12, 6)).expect("valid");
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = DateRange::new(date(2025, 12, 3), date(2025, 12, 1)).expect_err("reversed");
        assert!(matches!(err, ValidationError::ReversedDateRange { .. }));
    }

    #[test]
    fn range_day_count_includes_both_ends() {
        let range = DateRange::new(date(2025, 12, 1), date(2025, 12, 3)).expect("valid");
        assert_eq!(range.days(), 3);
        assert_eq!(DateRange::single(date(2025, 12, 1)).days(), 1);
    }

    #[test]
    fn species_lookup_ignores_case() {
        let field = Field {
            id: FieldId("fld-0001".to_string()),
            name: "Black Fen".to_string(),
            owner: ActorId("owner-1".to_string()),
            location: GeoPoint { lat: 52.2, lon: 0.1 },
            species: vec![SpeciesQuota {
                species: "Deer".to_string(),
                limit: 2,
            }],
            pricing: PriceSchedule::flat(100),
            capacity: 4,
            blocked_dates: Vec::new(),
            auto_approve: false,
        };
        assert!(field.allows_species("deer"));
        assert_eq!(field.quota_limit("DEER"), Some(2));
        assert!(!field.allows_species("Boar"));
    }
}
