use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::workflows::booking::domain::{BookingId, FieldId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hunt-day lifecycle. Finished is terminal; nothing skips InProgress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Finished,
}

impl SessionState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Finished => "Finished",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The active period between starting and finishing a hunt for a booking.
/// Exactly one session ever exists per booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntSession {
    pub id: SessionId,
    pub booking_id: BookingId,
    pub state: SessionState,
    pub started_on: Option<NaiveDate>,
    pub finished_on: Option<NaiveDate>,
}

/// Condition grading recorded against a harvested animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl AnimalCondition {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// One harvested animal inside a report. The tag number is filled in by the
/// issuer when the report is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalRecord {
    pub species: String,
    pub condition: AnimalCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_number: Option<Uuid>,
}

/// Inbound animal entry before validation and tagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalDraft {
    pub species: String,
    pub condition: AnimalCondition,
    #[serde(default)]
    pub disease: Option<String>,
}

/// Inbound payload for `finish_hunt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDraft {
    pub ground_remarks: String,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub hours_afield: Option<f32>,
    #[serde(default)]
    pub animals: Vec<AnimalDraft>,
}

/// Review a requester attaches after the report exists. Reviews always come
/// from a finished session, so they carry the verified-hunt mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntReview {
    pub rating: u8,
    pub text: String,
    pub verified: bool,
}

/// Committed harvest record for one finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntReport {
    pub id: ReportId,
    pub session_id: SessionId,
    pub animals: Vec<AnimalRecord>,
    pub ground_remarks: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_afield: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<HuntReview>,
}

impl HuntReport {
    pub fn animals_taken(&self) -> u32 {
        self.animals.len() as u32
    }
}

/// Season bucket quota counters accrue under; one per calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuotaPeriod(pub i32);

impl QuotaPeriod {
    pub fn from_date(day: NaiveDate) -> Self {
        Self(day.year())
    }
}

impl fmt::Display for QuotaPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} season", self.0)
    }
}

/// Immutable traceability record issued per harvested animal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalTag {
    pub tag_number: Uuid,
    pub verification_code: String,
    pub report_id: ReportId,
    /// Position of the animal record within its report.
    pub record_index: usize,
    pub field_id: FieldId,
    pub species: String,
    pub condition: AnimalCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    pub taken_on: NaiveDate,
}
