use crate::geo::Coordinate;
use crate::models::local_alert::{iso_timestamp, NewAlerta, UserId};
use crate::reconcile::state_code;
use crate::risk::RiskLevel;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const REPORT_WINDOW_HOURS: i64 = 4;

/// A hazard report as submitted from the map.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    pub titulo: String,
    pub descricao: String,
    #[serde(alias = "nivelRisco")]
    pub nivel_risco: String,
    pub uf: String,
    pub municipio: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must have between 1 and {} characters", MAX_TITLE_CHARS)]
    Title,
    #[error("description must have between 1 and {} characters", MAX_DESCRIPTION_CHARS)]
    Description,
    #[error("unknown risk level '{0}'")]
    RiskLevel(String),
    #[error("state must be a two-letter code")]
    State,
    #[error("municipality is required")]
    Municipality,
    #[error("coordinates out of range")]
    Coordinates,
}

/// A report whose fields passed validation, not yet tied to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedReport {
    pub titulo: String,
    pub descricao: String,
    pub risk: RiskLevel,
    pub uf: String,
    pub municipio: String,
    pub at: Coordinate,
}

impl NewReport {
    pub fn validate(self) -> Result<CheckedReport, ValidationError> {
        let titulo = bounded(&self.titulo, MAX_TITLE_CHARS).ok_or(ValidationError::Title)?;
        let descricao =
            bounded(&self.descricao, MAX_DESCRIPTION_CHARS).ok_or(ValidationError::Description)?;
        let risk = RiskLevel::parse(&self.nivel_risco)
            .ok_or_else(|| ValidationError::RiskLevel(self.nivel_risco.clone()))?;
        let uf = state_code(&self.uf).ok_or(ValidationError::State)?;
        let municipio = self.municipio.trim();
        if municipio.is_empty() {
            return Err(ValidationError::Municipality);
        }
        let at = Coordinate::new(self.latitude, self.longitude).ok_or(ValidationError::Coordinates)?;

        Ok(CheckedReport {
            titulo,
            descricao,
            risk,
            uf,
            municipio: municipio.to_string(),
            at,
        })
    }
}

impl CheckedReport {
    /// Backend payload for `user_id`. The alert window is `[now, now + 4h]`.
    pub fn into_alert(self, user_id: i64, now: DateTime<Utc>) -> NewAlerta {
        NewAlerta {
            titulo: self.titulo,
            descricao: self.descricao,
            nivel_risco: self.risk.backend_code().to_string(),
            data_inicio: iso_timestamp(now),
            data_fim: iso_timestamp(now + Duration::hours(REPORT_WINDOW_HOURS)),
            latitude: self.at.latitude,
            longitude: self.at.longitude,
            uf: self.uf,
            municipio: self.municipio,
            usuario: UserId { id: user_id },
        }
    }
}

fn bounded(value: &str, max_chars: usize) -> Option<String> {
    let trimmed = value.trim();
    let count = trimmed.chars().count();
    (1..=max_chars).contains(&count).then(|| trimmed.to_string())
}
