//! Municipality geocoding through IBGE, falling back to Nominatim.

use super::Coordinate;
use reqwest::{Client, Url};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

/// Looks up a coordinate for a municipality. `None` means not found; transport
/// failures are logged by the implementation and also yield `None`.
pub trait GeocodeProvider: Send + Sync {
    fn lookup(
        &self,
        municipality: &str,
        state: &str,
    ) -> impl Future<Output = Option<Coordinate>> + Send;
}

pub struct HttpGeocoder {
    client: Client,
    ibge_url: String,
    nominatim_url: String,
}

impl HttpGeocoder {
    pub fn new(client: Client, ibge_url: &str, nominatim_url: &str) -> Self {
        Self {
            client,
            ibge_url: ibge_url.trim_end_matches('/').to_string(),
            nominatim_url: nominatim_url.to_string(),
        }
    }

    async fn lookup_ibge(&self, municipality: &str) -> anyhow::Result<Option<Coordinate>> {
        let mut url = Url::parse(&self.ibge_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("IBGE url cannot be a base: {}", self.ibge_url))?
            .push(municipality);

        let body: Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_ibge(&body))
    }

    async fn lookup_nominatim(
        &self,
        municipality: &str,
        state: &str,
    ) -> anyhow::Result<Option<Coordinate>> {
        let query = format!("{},{},Brasil", municipality, state);
        let body: Value = self
            .client
            .get(&self.nominatim_url)
            .query(&[("format", "json"), ("limit", "1"), ("q", query.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_nominatim(&body))
    }
}

impl GeocodeProvider for HttpGeocoder {
    async fn lookup(&self, municipality: &str, state: &str) -> Option<Coordinate> {
        match self.lookup_ibge(municipality).await {
            Ok(Some(coordinate)) => return Some(coordinate),
            Ok(None) => debug!("IBGE has no coordinates for {}", municipality),
            Err(e) => warn!("IBGE lookup failed for {}: {}", municipality, e),
        }

        match self.lookup_nominatim(municipality, state).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Nominatim lookup failed for {} - {}: {}", municipality, state, e);
                None
            }
        }
    }
}

/// IBGE answers with an object carrying `latitude`/`longitude`, as strings or
/// numbers.
pub fn parse_ibge(body: &Value) -> Option<Coordinate> {
    let record = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    Coordinate::new(number(record.get("latitude")?)?, number(record.get("longitude")?)?)
}

/// Nominatim answers with an array; the first hit's `lat`/`lon` strings win.
pub fn parse_nominatim(body: &Value) -> Option<Coordinate> {
    let first = body.as_array()?.first()?;
    Coordinate::new(number(first.get("lat")?)?, number(first.get("lon")?)?)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
