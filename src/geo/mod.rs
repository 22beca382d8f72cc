pub mod cache;
pub mod centroid;
pub mod geocoder;
pub mod states;

use crate::models::meteorological::MeteorologicalAlert;
use crate::reconcile::UNKNOWN_MUNICIPALITY;
use cache::GeocodeCache;
use geocoder::GeocodeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// `None` unless both axes are finite and within WGS84 bounds.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// Which strategy placed the point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Centroid(Coordinate),
    StateTable(Coordinate),
    Geocoded(Coordinate),
}

impl Resolution {
    pub fn coordinate(&self) -> Coordinate {
        match self {
            Resolution::Centroid(c) | Resolution::StateTable(c) | Resolution::Geocoded(c) => *c,
        }
    }
}

/// Provider used when external geocoding is switched off.
pub struct NoGeocoder;

impl GeocodeProvider for NoGeocoder {
    async fn lookup(&self, _municipality: &str, _state: &str) -> Option<Coordinate> {
        None
    }
}

/// Places meteorological alerts on the map: polygon centroid first, then the
/// state table, then (when a provider is configured) external geocoding.
pub struct GeoResolver<P> {
    geocoder: Option<P>,
    cache: GeocodeCache,
}

impl GeoResolver<NoGeocoder> {
    pub fn offline(cache: GeocodeCache) -> Self {
        Self {
            geocoder: None,
            cache,
        }
    }
}

impl<P: GeocodeProvider> GeoResolver<P> {
    pub fn with_geocoder(geocoder: P, cache: GeocodeCache) -> Self {
        Self {
            geocoder: Some(geocoder),
            cache,
        }
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    /// Centroid and state-table strategies only.
    pub fn resolve_local(&self, alert: &MeteorologicalAlert) -> Option<Resolution> {
        if let Some(raw) = alert.geometry.as_deref() {
            match centroid::centroid(raw) {
                Ok(coordinate) => return Some(Resolution::Centroid(coordinate)),
                Err(e) => warn!(
                    "Alert {}: unusable polygon ({}), trying state table",
                    alert.fields.id.as_deref().unwrap_or("?"),
                    e
                ),
            }
        }

        states::state_centroid(&alert.fields.state).map(Resolution::StateTable)
    }

    pub async fn resolve(&self, alert: &MeteorologicalAlert) -> Option<Resolution> {
        if let Some(found) = self.resolve_local(alert) {
            return Some(found);
        }

        let geocoder = self.geocoder.as_ref()?;
        let municipality = alert.fields.municipality.as_str();
        let state = alert.fields.state.as_str();
        if municipality == UNKNOWN_MUNICIPALITY {
            return None;
        }

        if let Some(cached) = self.cache.get(municipality, state).await {
            debug!("Geocode cache hit for {} - {}", municipality, state);
            return Some(Resolution::Geocoded(cached));
        }

        let coordinate = geocoder.lookup(municipality, state).await?;
        self.cache.insert(municipality, state, coordinate).await;
        Some(Resolution::Geocoded(coordinate))
    }
}
