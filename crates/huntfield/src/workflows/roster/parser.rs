use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::normalizer::normalize_name;
use crate::workflows::booking::domain::SpeciesQuota;

/// One parsed roster row, or the reason it was unusable.
#[derive(Debug)]
pub(crate) enum RowOutcome {
    Parsed(RosterRecord),
    Rejected { line: u64, reason: String },
}

#[derive(Debug)]
pub(crate) struct RosterRecord {
    pub(crate) line: u64,
    pub(crate) name: String,
    pub(crate) owner: String,
    pub(crate) lat: f64,
    pub(crate) lon: f64,
    pub(crate) species: Vec<SpeciesQuota>,
    pub(crate) capacity: u32,
    pub(crate) member_rate: Option<u32>,
    pub(crate) full_rate: u32,
    pub(crate) auto_approve: bool,
    pub(crate) blocked_dates: Vec<NaiveDate>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<RowOutcome>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut outcomes = Vec::new();

    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        // Header occupies line 1.
        let line = index as u64 + 2;
        match record {
            Ok(row) => outcomes.push(row.into_outcome(line)),
            Err(err) => outcomes.push(RowOutcome::Rejected {
                line,
                reason: err.to_string(),
            }),
        }
    }

    Ok(outcomes)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Owner")]
    owner: String,
    #[serde(rename = "Lat")]
    lat: f64,
    #[serde(rename = "Lon")]
    lon: f64,
    /// Pipe-separated `species:limit` pairs, e.g. `Deer:2|Pheasant:10`.
    #[serde(rename = "Species")]
    species: String,
    #[serde(rename = "Capacity")]
    capacity: u32,
    #[serde(rename = "Member Rate", default, deserialize_with = "empty_string_as_none")]
    member_rate: Option<String>,
    #[serde(rename = "Full Rate")]
    full_rate: u32,
    #[serde(rename = "Auto Approve", default, deserialize_with = "empty_string_as_none")]
    auto_approve: Option<String>,
    /// Pipe-separated ISO dates the outfitter blocks out.
    #[serde(rename = "Blocked Dates", default, deserialize_with = "empty_string_as_none")]
    blocked_dates: Option<String>,
}

impl RosterRow {
    fn into_outcome(self, line: u64) -> RowOutcome {
        let name = normalize_name(&self.name);
        if name.is_empty() {
            return RowOutcome::Rejected {
                line,
                reason: "field name is empty".to_string(),
            };
        }

        let owner = self.owner.trim().to_string();
        if owner.is_empty() {
            return RowOutcome::Rejected {
                line,
                reason: "owner is empty".to_string(),
            };
        }

        let species = match parse_species(&self.species) {
            Ok(species) if !species.is_empty() => species,
            Ok(_) => {
                return RowOutcome::Rejected {
                    line,
                    reason: "no species quotas listed".to_string(),
                }
            }
            Err(reason) => return RowOutcome::Rejected { line, reason },
        };

        let member_rate = match self.member_rate.as_deref().map(parse_rate).transpose() {
            Ok(rate) => rate,
            Err(reason) => return RowOutcome::Rejected { line, reason },
        };

        let blocked_dates = match self.blocked_dates.as_deref().map(parse_dates).transpose() {
            Ok(dates) => dates.unwrap_or_default(),
            Err(reason) => return RowOutcome::Rejected { line, reason },
        };

        RowOutcome::Parsed(RosterRecord {
            line,
            name,
            owner,
            lat: self.lat,
            lon: self.lon,
            species,
            capacity: self.capacity,
            member_rate,
            full_rate: self.full_rate,
            auto_approve: parse_flag(self.auto_approve.as_deref()),
            blocked_dates,
        })
    }
}

fn parse_species(value: &str) -> Result<Vec<SpeciesQuota>, String> {
    let mut quotas = Vec::new();
    for entry in value.split('|').filter(|s| !s.trim().is_empty()) {
        let (species, limit) = entry
            .split_once(':')
            .ok_or_else(|| format!("species entry '{entry}' is not species:limit"))?;
        let species = species.trim();
        if species.is_empty() {
            return Err(format!("species entry '{entry}' has an empty name"));
        }
        let limit = limit
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("species entry '{entry}' has a non-numeric limit"))?;
        quotas.push(SpeciesQuota {
            species: species.to_string(),
            limit,
        });
    }
    Ok(quotas)
}

fn parse_rate(value: &str) -> Result<u32, String> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("rate '{value}' is not a whole amount"))
}

fn parse_dates(value: &str) -> Result<Vec<NaiveDate>, String> {
    value
        .split('|')
        .filter(|s| !s.trim().is_empty())
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| format!("blocked date '{raw}' is not YYYY-MM-DD"))
        })
        .collect()
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("yes" | "true" | "y" | "1")
    )
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
