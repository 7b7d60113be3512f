use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::Role;

/// Per-role day rates for a field. Roles without an explicit tier pay the
/// full rate; subsidised tiers (UK shooting members, guides) undercut it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSchedule {
    pub full_day_rate: u32,
    #[serde(default)]
    pub day_rates: BTreeMap<Role, u32>,
}

impl PriceSchedule {
    /// Everyone pays the same rate.
    pub fn flat(full_day_rate: u32) -> Self {
        Self {
            full_day_rate,
            day_rates: BTreeMap::new(),
        }
    }

    pub fn with_rate(mut self, role: Role, day_rate: u32) -> Self {
        self.day_rates.insert(role, day_rate);
        self
    }

    pub fn day_rate_for(&self, role: Role) -> u32 {
        self.day_rates
            .get(&role)
            .copied()
            .unwrap_or(self.full_day_rate)
    }

    /// Price charged for a stay of `days` booked under `role`.
    pub fn quote(&self, role: Role, days: u32) -> u32 {
        self.day_rate_for(role).saturating_mul(days)
    }

    /// Saving against the full rate, shown to subsidised members.
    pub fn saving_for(&self, role: Role, days: u32) -> u32 {
        self.full_day_rate
            .saturating_mul(days)
            .saturating_sub(self.quote(role, days))
    }
}
