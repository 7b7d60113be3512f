use std::sync::Arc;

use uuid::Uuid;

use super::domain::{AnimalTag, ReportId};
use super::store::TagStore;
use crate::workflows::booking::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("no animal tag {number} on record")]
    NotFound { number: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Issues traceable identifiers for harvested animals and serves the public
/// verification lookup. Issue is idempotent per (report, record index).
#[derive(Clone)]
pub struct AnimalTagIssuer {
    store: Arc<dyn TagStore>,
}

impl AnimalTagIssuer {
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    /// Issue a tag for one animal record. A repeat call for the same record
    /// returns the previously issued tag untouched.
    pub fn issue_tag(&self, mut tag: AnimalTag) -> Result<AnimalTag, TagError> {
        if let Some(existing) = self.store.by_record(&tag.report_id, tag.record_index)? {
            return Ok(existing);
        }

        let number = Uuid::new_v4();
        tag.tag_number = number;
        tag.verification_code = verification_code(&number);
        self.store.record(tag.clone())?;
        Ok(tag)
    }

    /// Drop every tag issued under a report. Used when a finish aborts
    /// after tags were recorded, and by the field deletion cascade.
    pub fn void_report(&self, report: &ReportId) -> Result<(), TagError> {
        self.store.remove_for_report(report)?;
        Ok(())
    }

    /// Public read-only lookup; no authentication required.
    pub fn verify(&self, number: &Uuid) -> Result<AnimalTag, TagError> {
        self.store
            .by_number(number)?
            .ok_or(TagError::NotFound { number: *number })
    }
}

/// Short human-checkable code printed on the physical tag alongside the
/// full UUID.
pub fn verification_code(number: &Uuid) -> String {
    let hex = number.simple().to_string();
    format!("HF-{}", hex[..8].to_ascii_uppercase())
}
