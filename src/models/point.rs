use crate::risk::RiskLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    #[serde(rename = "inmet")]
    Meteorological,
    #[serde(rename = "usuario")]
    Local,
}

/// Temporal status relative to a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    Active,
    Past,
    Upcoming,
    /// Start or end could not be parsed.
    Unknown,
}

/// One map marker, identical in shape whichever source it came from.
///
/// Field names on the wire follow the ones the map and dashboard consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPoint {
    pub id: Option<String>,
    #[serde(rename = "origem")]
    pub source: Source,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "nivel")]
    pub risk: RiskLevel,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "inicio")]
    pub start: Option<DateTime<Utc>>,
    #[serde(rename = "fim")]
    pub end: Option<DateTime<Utc>>,
    #[serde(rename = "uf")]
    pub state: String,
    #[serde(rename = "municipio")]
    pub municipality: String,
}

impl NormalizedPoint {
    /// Active when `start <= now <= end`, Past when `end < now`. A window whose
    /// end precedes its start is taken as given, it is never reordered.
    pub fn period(&self, now: DateTime<Utc>) -> Period {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Period::Unknown;
        };

        if end < now {
            Period::Past
        } else if start > now {
            Period::Upcoming
        } else {
            Period::Active
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.period(now) == Period::Active
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.period(now) == Period::Past
    }
}
