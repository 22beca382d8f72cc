//! Canonical field extraction for alert records whose key names vary between
//! the feed, the backend and older backend schema revisions.
//!
//! Nothing in here fails: a missing or unusable field becomes `None` or the
//! documented sentinel.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

pub const UNKNOWN_STATE: &str = "BR";
pub const UNKNOWN_MUNICIPALITY: &str = "Local não especificado";

const START_KEYS: [&str; 3] = ["inicio", "dataInicio", "data_inicio"];
const END_KEYS: [&str; 3] = ["fim", "dataFim", "data_fim"];
const RISK_KEYS: [&str; 3] = ["nivel", "nivelRisco", "severidade"];
const DESCRIPTION_KEYS: [&str; 2] = ["descricao", "titulo"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledFields {
    pub id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Raw risk text, empty when no candidate key is present.
    pub risk: String,
    /// Empty when neither a description nor a title is present.
    pub description: String,
    pub municipality: String,
    pub state: String,
}

impl ReconciledFields {
    /// `offset` is applied to timestamps without a zone designator.
    pub fn from_object(record: &Map<String, Value>, offset: FixedOffset) -> Self {
        let (municipality, state) = locality(record);

        Self {
            id: text(record, "id"),
            start: first_timestamp(record, &START_KEYS, offset),
            end: first_timestamp(record, &END_KEYS, offset),
            risk: first_text(record, &RISK_KEYS).unwrap_or_default(),
            description: first_text(record, &DESCRIPTION_KEYS).unwrap_or_default(),
            municipality,
            state,
        }
    }
}

/// String form of a scalar field. Empty strings, nulls and containers count
/// as absent.
pub fn text(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First present key wins, in the order given.
pub fn first_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| text(record, key))
}

/// Timestamp under the first present key. JSON numbers are epoch
/// milliseconds; strings go through [`parse_timestamp`].
pub fn first_timestamp(
    record: &Map<String, Value>,
    keys: &[&str],
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let value = keys.iter().find_map(|key| match record.get(*key) {
        Some(Value::Null) | None => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    })?;

    match value {
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::String(s) => parse_timestamp(s, offset),
        _ => None,
    }
}

/// Parses the textual timestamp layouts seen across sources.
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Municipality and state, from discrete `municipio`/`uf` fields when both are
/// usable, otherwise from the composite `municipios` string.
fn locality(record: &Map<String, Value>) -> (String, String) {
    let discrete_municipality = text(record, "municipio");
    let discrete_state = text(record, "uf").and_then(|uf| state_code(&uf));

    let (composite_municipality, composite_state) = match text(record, "municipios") {
        Some(composite) => split_municipalities(&composite),
        None => (None, None),
    };

    let municipality = discrete_municipality
        .or(composite_municipality)
        .unwrap_or_else(|| UNKNOWN_MUNICIPALITY.to_string());
    let state = discrete_state
        .or(composite_state)
        .unwrap_or_else(|| UNKNOWN_STATE.to_string());

    (municipality, state)
}

/// Splits `"Cidade A - SP, Cidade B - SP"` into the first municipality and the
/// first state code found.
pub fn split_municipalities(composite: &str) -> (Option<String>, Option<String>) {
    let mut segments = composite.split(',');
    let first = segments.next().unwrap_or_default();
    let mut parts = first.split(" - ");

    let municipality = parts
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let state = parts.next().and_then(state_code).or_else(|| {
        segments
            .filter_map(|segment| segment.split(" - ").nth(1))
            .find_map(state_code)
    });

    (municipality, state)
}

/// Two ASCII letters, upper-cased.
pub fn state_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(trimmed.to_ascii_uppercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn legacy_key_schemes_reconcile_identically() {
        let backend = object(json!({
            "dataInicio": "2025-01-01",
            "dataFim": "2025-01-02",
            "nivelRisco": "Alto"
        }));
        let legacy = object(json!({
            "inicio": "2025-01-01",
            "fim": "2025-01-02",
            "nivel": "Alto"
        }));

        let a = ReconciledFields::from_object(&backend, utc());
        let b = ReconciledFields::from_object(&legacy, utc());
        assert_eq!(a, b);
        assert_eq!(a.risk, "Alto");
        assert_eq!(a.start, Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn first_present_key_wins() {
        let record = object(json!({
            "data_inicio": "2025-03-01 10:00:00",
            "inicio": "2025-02-01 10:00:00",
            "severidade": "Perigo",
            "nivel": "Baixo"
        }));
        let fields = ReconciledFields::from_object(&record, utc());
        assert_eq!(fields.start, Some(Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap()));
        assert_eq!(fields.risk, "Baixo");
    }

    #[test]
    fn empty_record_yields_sentinels() {
        let fields = ReconciledFields::from_object(&Map::new(), utc());
        assert_eq!(fields.id, None);
        assert_eq!(fields.start, None);
        assert_eq!(fields.end, None);
        assert_eq!(fields.risk, "");
        assert_eq!(fields.description, "");
        assert_eq!(fields.state, UNKNOWN_STATE);
        assert_eq!(fields.municipality, UNKNOWN_MUNICIPALITY);
    }

    #[test]
    fn description_falls_back_to_title() {
        let record = object(json!({ "titulo": "Rua alagada", "descricao": "" }));
        let fields = ReconciledFields::from_object(&record, utc());
        assert_eq!(fields.description, "Rua alagada");
    }

    #[test]
    fn composite_municipalities_are_split() {
        let record = object(json!({
            "id": 4021,
            "municipios": "Campinas - SP, Sumaré - SP, Paulínia - SP"
        }));
        let fields = ReconciledFields::from_object(&record, utc());
        assert_eq!(fields.id.as_deref(), Some("4021"));
        assert_eq!(fields.municipality, "Campinas");
        assert_eq!(fields.state, "SP");
    }

    #[test]
    fn discrete_fields_take_precedence() {
        let record = object(json!({
            "municipio": "Recife",
            "uf": "pe",
            "municipios": "Olinda - PB"
        }));
        let fields = ReconciledFields::from_object(&record, utc());
        assert_eq!(fields.municipality, "Recife");
        assert_eq!(fields.state, "PE");
    }

    #[test]
    fn state_is_searched_beyond_first_segment() {
        let (municipality, state) = split_municipalities("Região Serrana, Petrópolis - RJ");
        assert_eq!(municipality.as_deref(), Some("Região Serrana"));
        assert_eq!(state.as_deref(), Some("RJ"));
    }

    #[test]
    fn timestamp_layouts() {
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 6, 15, 15, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2025-06-15 12:00:00", brt), Some(expected));
        assert_eq!(parse_timestamp("2025-06-15T12:00:00.000", brt), Some(expected));
        assert_eq!(parse_timestamp("2025-06-15T12:00", brt), Some(expected));
        assert_eq!(parse_timestamp("2025-06-15T15:00:00.000Z", brt), Some(expected));
        assert_eq!(parse_timestamp("2025-06-15T12:00:00-03:00", brt), Some(expected));
    }

    #[test]
    fn epoch_millis_only_from_numbers() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 15, 15, 0, 0).unwrap();
        let record = json!({ "dataInicio": expected.timestamp_millis(), "fim": "2025" });
        let fields = ReconciledFields::from_object(record.as_object().unwrap(), utc());

        assert_eq!(fields.start, Some(expected));
        assert_eq!(fields.end, None);
        assert_eq!(parse_timestamp("2025", utc()), None);
        assert_eq!(parse_timestamp(&expected.timestamp_millis().to_string(), utc()), None);
    }

    #[test]
    fn invalid_timestamps_are_unknown() {
        assert_eq!(parse_timestamp("", utc()), None);
        assert_eq!(parse_timestamp("amanhã", utc()), None);
        assert_eq!(parse_timestamp("2025-13-40", utc()), None);
    }
}
