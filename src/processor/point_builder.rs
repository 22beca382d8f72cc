use crate::geo::geocoder::GeocodeProvider;
use crate::geo::{Coordinate, GeoResolver};
use crate::models::local_alert::LocalAlert;
use crate::models::meteorological::MeteorologicalAlert;
use crate::models::point::{NormalizedPoint, Source};
use crate::reconcile::ReconciledFields;
use crate::risk::RiskLevel;
use chrono::FixedOffset;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A raw record tagged with the family it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    Meteorological(MeteorologicalAlert),
    Local(LocalAlert),
}

impl SourceRecord {
    pub fn meteorological(raw: &Value, offset: FixedOffset) -> Result<Self, DropReason> {
        let object = raw.as_object().ok_or(DropReason::MalformedRecord)?;
        Ok(SourceRecord::Meteorological(MeteorologicalAlert::from_object(object, offset)))
    }

    pub fn local(raw: &Value, offset: FixedOffset) -> Result<Self, DropReason> {
        let object = raw.as_object().ok_or(DropReason::MalformedRecord)?;
        Ok(SourceRecord::Local(LocalAlert::from_object(object, offset)))
    }

    pub fn source(&self) -> Source {
        match self {
            SourceRecord::Meteorological(_) => Source::Meteorological,
            SourceRecord::Local(_) => Source::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The record is not a JSON object.
    MalformedRecord,
    /// No placement strategy produced a coordinate.
    Unresolvable,
    /// A user report whose own coordinates are missing or out of range.
    InvalidCoordinates,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DropReport {
    pub malformed_record: usize,
    pub unresolvable: usize,
    pub invalid_coordinates: usize,
}

impl DropReport {
    pub fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::MalformedRecord => self.malformed_record += 1,
            DropReason::Unresolvable => self.unresolvable += 1,
            DropReason::InvalidCoordinates => self.invalid_coordinates += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.malformed_record + self.unresolvable + self.invalid_coordinates
    }
}

/// The unified sequence plus what was left out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointSet {
    pub points: Vec<NormalizedPoint>,
    pub dropped: DropReport,
}

/// Merges both source families into one sequence: meteorological points in
/// feed order, then local points in backend order. No deduplication.
pub struct PointBuilder<'a, P> {
    resolver: &'a GeoResolver<P>,
    offset: FixedOffset,
}

impl<'a, P: GeocodeProvider> PointBuilder<'a, P> {
    pub fn new(resolver: &'a GeoResolver<P>, offset: FixedOffset) -> Self {
        Self { resolver, offset }
    }

    pub async fn build(&self, feed: &[Value], local: &[Value]) -> PointSet {
        let records = feed
            .iter()
            .map(|raw| SourceRecord::meteorological(raw, self.offset))
            .chain(local.iter().map(|raw| SourceRecord::local(raw, self.offset)));

        let outcomes = join_all(records.map(|record| async move {
            match record {
                Ok(record) => {
                    let source = record.source();
                    self.normalize(record).await.map_err(|reason| {
                        debug!("Dropped {:?} record: {:?}", source, reason);
                        reason
                    })
                }
                Err(reason) => Err(reason),
            }
        }))
        .await;

        let mut set = PointSet::default();
        for outcome in outcomes {
            match outcome {
                Ok(point) => set.points.push(point),
                Err(reason) => set.dropped.record(reason),
            }
        }
        set
    }

    pub async fn normalize(&self, record: SourceRecord) -> Result<NormalizedPoint, DropReason> {
        match record {
            SourceRecord::Meteorological(alert) => match self.resolver.resolve(&alert).await {
                Some(resolution) => Ok(from_meteorological(alert, resolution.coordinate())),
                None => {
                    debug!(
                        "Dropping alert {}: no coordinate for {} - {}",
                        alert.fields.id.as_deref().unwrap_or("?"),
                        alert.fields.municipality,
                        alert.fields.state
                    );
                    Err(DropReason::Unresolvable)
                }
            },
            SourceRecord::Local(alert) => from_local(alert),
        }
    }
}

pub fn from_meteorological(alert: MeteorologicalAlert, at: Coordinate) -> NormalizedPoint {
    let risk = RiskLevel::classify(&alert.fields.risk);
    assemble(alert.fields, Source::Meteorological, risk, at)
}

pub fn from_local(alert: LocalAlert) -> Result<NormalizedPoint, DropReason> {
    let at = match (alert.latitude, alert.longitude) {
        (Some(lat), Some(lon)) => Coordinate::new(lat, lon),
        _ => None,
    };
    let Some(at) = at else {
        debug!(
            "Dropping user alert {}: invalid coordinates",
            alert.fields.id.as_deref().unwrap_or("?")
        );
        return Err(DropReason::InvalidCoordinates);
    };

    let risk = RiskLevel::from_native(&alert.fields.risk);
    Ok(assemble(alert.fields, Source::Local, risk, at))
}

fn assemble(
    fields: ReconciledFields,
    source: Source,
    risk: RiskLevel,
    at: Coordinate,
) -> NormalizedPoint {
    let description = if fields.description.is_empty() {
        format!("Alerta para {} e região", fields.municipality)
    } else {
        fields.description
    };

    NormalizedPoint {
        id: fields.id,
        source,
        latitude: at.latitude,
        longitude: at.longitude,
        risk,
        description,
        start: fields.start,
        end: fields.end,
        state: fields.state,
        municipality: fields.municipality,
    }
}
