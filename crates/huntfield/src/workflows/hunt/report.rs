use std::collections::BTreeMap;

use super::domain::{HuntReport, HuntReview, ReportDraft};
use crate::workflows::booking::domain::{Field, ValidationError};

/// Validate an inbound report against the field it was hunted on. Nothing
/// is persisted until this passes.
pub fn validate_draft(field: &Field, draft: &ReportDraft) -> Result<(), ValidationError> {
    if draft.ground_remarks.trim().is_empty() {
        return Err(ValidationError::MissingGroundRemarks);
    }

    for animal in &draft.animals {
        if !field.allows_species(&animal.species) {
            return Err(ValidationError::UnknownSpecies {
                species: animal.species.clone(),
            });
        }
    }

    Ok(())
}

/// Per-species harvest counts for the quota tracker, keyed case-insensitively.
pub fn harvest_totals(draft: &ReportDraft) -> BTreeMap<String, u32> {
    let mut totals = BTreeMap::new();
    for animal in &draft.animals {
        *totals
            .entry(animal.species.to_ascii_lowercase())
            .or_insert(0) += 1;
    }
    totals
}

/// Attach or overwrite the review on an existing report. Reviews only ever
/// follow a finished session, so the verified mark is set unconditionally.
pub fn apply_review(
    report: &mut HuntReport,
    rating: u8,
    text: String,
) -> Result<(), ValidationError> {
    if !(1..=5).contains(&rating) {
        return Err(ValidationError::RatingOutOfRange { rating });
    }

    report.review = Some(HuntReview {
        rating,
        text,
        verified: true,
    });
    Ok(())
}
