use crate::reconcile::{text, ReconciledFields};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A hazard report submitted by an application user, as returned by the
/// backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalAlert {
    pub fields: ReconciledFields,
    pub title: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub submitted_by: Option<UserRef>,
}

/// Reference to the submitting user. Every field is optional because older
/// backend revisions only send the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(default, rename = "nomeUsuario")]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "tipoUsuario")]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LocalExtras {
    #[serde(default, deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    usuario: Option<UserRef>,
}

impl LocalAlert {
    pub fn from_object(record: &Map<String, Value>, offset: FixedOffset) -> Self {
        let extras: LocalExtras =
            serde_json::from_value(Value::Object(record.clone())).unwrap_or_default();

        Self {
            fields: ReconciledFields::from_object(record, offset),
            title: text(record, "titulo"),
            latitude: extras.latitude,
            longitude: extras.longitude,
            submitted_by: extras.usuario,
        }
    }
}

/// Body for `POST /alertas`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlerta {
    pub titulo: String,
    pub descricao: String,
    pub nivel_risco: String,
    pub data_inicio: String,
    pub data_fim: String,
    pub latitude: f64,
    pub longitude: f64,
    pub uf: String,
    pub municipio: String,
    pub usuario: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserId {
    pub id: i64,
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Numbers that may arrive as JSON numbers or as numeric strings.
fn parse_f64_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
    }

    let v: Option<StringOrFloat> = Option::deserialize(deserializer)?;
    match v {
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::String(s)) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.trim().parse::<f64>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        None => Ok(None),
    }
}

/// Like [`parse_f64_option`], but an unparsable value is `None` for this
/// field only.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_f64_option(value).ok().flatten())
}

/// Any shape mismatch becomes `None` instead of failing the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
