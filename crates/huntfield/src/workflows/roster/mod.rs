//! Bulk field onboarding from a CSV roster export.
//!
//! Rows are parsed and normalized individually; a malformed row is reported
//! and skipped rather than aborting the batch. Registration itself goes
//! through the [`FieldCatalog`] so roster fields obey the same validation
//! as hand-registered ones.

mod normalizer;
mod parser;


use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::workflows::booking::access::{self, AccessError, Capability, Relation};
use crate::workflows::booking::catalog::{CatalogError, FieldCatalog, FieldDraft};
use crate::workflows::booking::domain::{ActorId, FieldId, GeoPoint, RequestContext, Role};
use crate::workflows::booking::pricing::PriceSchedule;

use normalizer::dedup_key;
use parser::RowOutcome;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Forbidden(AccessError),
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::Forbidden(err) => {
                write!(f, "roster import refused: {}", err)
            }
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::Forbidden(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// A roster row that could not be registered, with its CSV line number.
#[derive(Debug, Clone, Serialize)]
pub struct RosterRejection {
    pub line: u64,
    pub reason: String,
}

/// Result of one import batch.
#[derive(Debug, Default, Serialize)]
pub struct RosterImportOutcome {
    pub registered: Vec<FieldId>,
    pub rejected: Vec<RosterRejection>,
}

/// Import a roster CSV through the catalog.
pub struct RosterImporter<'a> {
    catalog: &'a FieldCatalog,
}

impl<'a> RosterImporter<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self { catalog }
    }

    pub fn from_path(
        &self,
        ctx: &RequestContext,
        path: &Path,
    ) -> Result<RosterImportOutcome, RosterImportError> {
        let file = std::fs::File::open(path)?;
        self.from_reader(ctx, file)
    }

    pub fn from_reader<R: Read>(
        &self,
        ctx: &RequestContext,
        reader: R,
    ) -> Result<RosterImportOutcome, RosterImportError> {
        // One up-front capability check; per-row failures never abort.
        access::require(&ctx.actor, Capability::RegisterField, Relation::None)
            .map_err(RosterImportError::Forbidden)?;

        let mut outcome = RosterImportOutcome::default();
        let mut seen = HashSet::new();

        for row in parser::parse_rows(reader)? {
            let record = match row {
                RowOutcome::Parsed(record) => record,
                RowOutcome::Rejected { line, reason } => {
                    warn!(line, %reason, "roster row rejected");
                    outcome.rejected.push(RosterRejection { line, reason });
                    continue;
                }
            };

            if !seen.insert(dedup_key(&record.name)) {
                outcome.rejected.push(RosterRejection {
                    line: record.line,
                    reason: format!("duplicate field name '{}' in roster", record.name),
                });
                continue;
            }

            let mut pricing = PriceSchedule::flat(record.full_rate);
            if let Some(member_rate) = record.member_rate {
                pricing = pricing.with_rate(Role::ShootingMember, member_rate);
            }

            let draft = FieldDraft {
                name: record.name,
                owner: Some(ActorId(record.owner)),
                location: GeoPoint {
                    lat: record.lat,
                    lon: record.lon,
                },
                species: record.species,
                pricing,
                capacity: record.capacity,
                blocked_dates: record.blocked_dates,
                auto_approve: record.auto_approve,
            };

            match self.catalog.register_field(ctx, draft) {
                Ok(field) => outcome.registered.push(field.id),
                Err(CatalogError::Access(err)) => {
                    return Err(RosterImportError::Forbidden(err));
                }
                Err(err) => outcome.rejected.push(RosterRejection {
                    line: record.line,
                    reason: err.to_string(),
                }),
            }
        }

        Ok(outcome)
    }
}
