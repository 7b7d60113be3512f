use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::domain::QuotaPeriod;
use crate::workflows::booking::domain::{Field, FieldId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QuotaError {
    #[error(
        "quota exceeded for {species} on field {field} ({period}): \
         limit {limit}, taken {consumed}, requested {requested}"
    )]
    Exceeded {
        field: FieldId,
        species: String,
        period: QuotaPeriod,
        limit: u32,
        consumed: u32,
        requested: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QuotaKey {
    field: FieldId,
    species: String,
    period: QuotaPeriod,
}

impl QuotaKey {
    fn new(field: &FieldId, species: &str, period: QuotaPeriod) -> Self {
        Self {
            field: field.clone(),
            species: species.to_ascii_lowercase(),
            period,
        }
    }
}

/// Multi-species harvest ceilings per field and season. Every mutation runs
/// under one mutex; a batch is checked in full before any counter moves, so
/// concurrent finish-hunt calls can never push a counter past its limit.
#[derive(Debug, Default)]
pub struct QuotaTracker {
    consumed: Mutex<HashMap<QuotaKey, u32>>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic check-and-increment for a single species.
    pub fn check_and_consume(
        &self,
        field: &Field,
        species: &str,
        period: QuotaPeriod,
        count: u32,
    ) -> Result<(), QuotaError> {
        let mut takes = BTreeMap::new();
        takes.insert(species.to_string(), count);
        self.consume_all(field, period, &takes)
    }

    /// Atomic check-and-increment across every species in one report.
    /// Either every counter advances or none does.
    pub fn consume_all(
        &self,
        field: &Field,
        period: QuotaPeriod,
        takes: &BTreeMap<String, u32>,
    ) -> Result<(), QuotaError> {
        let mut guard = self.consumed.lock().expect("quota mutex poisoned");

        for (species, count) in takes {
            let limit = field.quota_limit(species).unwrap_or(0);
            let key = QuotaKey::new(&field.id, species, period);
            let consumed = guard.get(&key).copied().unwrap_or(0);
            if consumed + count > limit {
                return Err(QuotaError::Exceeded {
                    field: field.id.clone(),
                    species: species.clone(),
                    period,
                    limit,
                    consumed,
                    requested: *count,
                });
            }
        }

        for (species, count) in takes {
            let key = QuotaKey::new(&field.id, species, period);
            *guard.entry(key).or_insert(0) += count;
        }

        Ok(())
    }

    /// Hand counters back after an aborted commit. A counter never drops
    /// below zero.
    pub fn release_all(&self, field: &FieldId, period: QuotaPeriod, takes: &BTreeMap<String, u32>) {
        let mut guard = self.consumed.lock().expect("quota mutex poisoned");
        for (species, count) in takes {
            let key = QuotaKey::new(field, species, period);
            if let Some(consumed) = guard.get_mut(&key) {
                *consumed = consumed.saturating_sub(*count);
            }
        }
    }

    /// Consumed count for dashboards and tests.
    pub fn consumed(&self, field: &FieldId, species: &str, period: QuotaPeriod) -> u32 {
        let guard = self.consumed.lock().expect("quota mutex poisoned");
        guard
            .get(&QuotaKey::new(field, species, period))
            .copied()
            .unwrap_or(0)
    }

    /// Remaining headroom for a species on a field.
    pub fn remaining(&self, field: &Field, species: &str, period: QuotaPeriod) -> u32 {
        let limit = field.quota_limit(species).unwrap_or(0);
        limit.saturating_sub(self.consumed(&field.id, species, period))
    }
}
