use crate::clients::backend::BackendClient;
use crate::clients::inmet::InmetClient;
use crate::error::ClientError;
use crate::geo::geocoder::GeocodeProvider;
use crate::geo::GeoResolver;
use crate::models::meteorological::FeedPayload;
use crate::processor::point_builder::{PointBuilder, PointSet};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceStatus {
    Pending,
    Ok { records: usize },
    Unavailable { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceHealth {
    pub inmet: SourceStatus,
    pub backend: SourceStatus,
}

impl SourceHealth {
    pub fn all_unavailable(&self) -> bool {
        matches!(self.inmet, SourceStatus::Unavailable { .. })
            && matches!(self.backend, SourceStatus::Unavailable { .. })
    }
}

/// Result of the latest refresh cycle, replaced wholesale each cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub set: PointSet,
    pub sources: SourceHealth,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            set: PointSet::default(),
            sources: SourceHealth {
                inmet: SourceStatus::Pending,
                backend: SourceStatus::Pending,
            },
            refreshed_at: None,
        }
    }
}

pub type SharedSnapshot = Arc<RwLock<Snapshot>>;

/// Normalizes one cycle's fetch results. A failed source contributes no
/// records; the other source is still processed.
pub async fn build_snapshot<P: GeocodeProvider>(
    resolver: &GeoResolver<P>,
    offset: FixedOffset,
    feed: Result<FeedPayload, ClientError>,
    local: Result<Vec<Value>, ClientError>,
    now: DateTime<Utc>,
) -> Snapshot {
    let (feed_records, inmet) = match feed {
        Ok(payload) => {
            if payload.is_empty() {
                debug!("INMET feed returned no alerts");
            }
            let status = SourceStatus::Ok {
                records: payload.len(),
            };
            (payload.into_records(), status)
        }
        Err(e) => {
            warn!("INMET feed unavailable: {}", e);
            (Vec::new(), SourceStatus::Unavailable { error: e.to_string() })
        }
    };

    let (local_records, backend) = match local {
        Ok(records) => {
            let status = SourceStatus::Ok {
                records: records.len(),
            };
            (records, status)
        }
        Err(e) => {
            warn!("User alerts unavailable: {}", e);
            (Vec::new(), SourceStatus::Unavailable { error: e.to_string() })
        }
    };

    let set = PointBuilder::new(resolver, offset)
        .build(&feed_records, &local_records)
        .await;

    Snapshot {
        set,
        sources: SourceHealth { inmet, backend },
        refreshed_at: Some(now),
    }
}

/// Periodic fetch → normalize loop. Cycles run one at a time; a tick missed
/// while a cycle is still running is skipped. `wake` starts a cycle early.
pub struct Refresher<P> {
    pub inmet: InmetClient,
    pub backend: BackendClient,
    pub backend_token: Option<String>,
    pub resolver: GeoResolver<P>,
    pub offset: FixedOffset,
    pub interval: Duration,
    pub snapshot: SharedSnapshot,
    pub wake: Arc<Notify>,
}

impl<P: GeocodeProvider> Refresher<P> {
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.wake.notified() => {
                    debug!("Refresh requested");
                    ticker.reset();
                }
            }

            let cycle_id = Uuid::new_v4();
            let snapshot = self
                .refresh_once()
                .instrument(info_span!("refresh", %cycle_id))
                .await;

            if snapshot.sources.all_unavailable() {
                consecutive_failures += 1;
                error!(
                    "Both sources unavailable ({} consecutive cycles), retrying in {}s",
                    consecutive_failures,
                    self.interval.as_secs()
                );
            } else {
                consecutive_failures = 0;
            }
        }
    }

    pub async fn refresh_once(&self) -> Snapshot {
        let (feed, local) = tokio::join!(
            self.inmet.fetch_feed(),
            self.backend.list_alerts(self.backend_token.as_deref())
        );

        let snapshot = build_snapshot(&self.resolver, self.offset, feed, local, Utc::now()).await;

        info!(
            "Refreshed {} points ({} dropped: {} unresolvable, {} malformed, {} invalid coordinates), {} geocodes cached",
            snapshot.set.points.len(),
            snapshot.set.dropped.total(),
            snapshot.set.dropped.unresolvable,
            snapshot.set.dropped.malformed_record,
            snapshot.set.dropped.invalid_coordinates,
            self.resolver.cache().len().await
        );

        *self.snapshot.write().await = snapshot.clone();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::cache::GeocodeCache;
    use crate::geo::NoGeocoder;
    use crate::models::point::Source;
    use chrono::TimeZone;
    use serde_json::json;

    fn resolver() -> GeoResolver<NoGeocoder> {
        GeoResolver::offline(GeocodeCache::new(8, Duration::from_secs(60)))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn feed() -> FeedPayload {
        FeedPayload::from_value(json!([{
            "hoje": [{
                "id": 100,
                "data_inicio": "2025-06-15 06:00:00",
                "data_fim": "2025-06-16 06:00:00",
                "municipios": "Porto Alegre - RS, Canoas - RS",
                "severidade": "Perigo",
                "descricao": "Acumulado de chuva"
            }],
            "futuro": []
        }]))
    }

    #[tokio::test]
    async fn feed_outage_keeps_user_alerts() {
        let local = vec![json!({ "id": 1, "latitude": -30.0, "longitude": -51.2, "nivelRisco": "ALTO" })];
        let snapshot = build_snapshot(
            &resolver(),
            brt(),
            Err(ClientError::Unauthorized),
            Ok(local),
            now(),
        )
        .await;

        assert_eq!(snapshot.set.points.len(), 1);
        assert_eq!(snapshot.set.points[0].source, Source::Local);
        assert!(matches!(snapshot.sources.inmet, SourceStatus::Unavailable { .. }));
        assert_eq!(snapshot.sources.backend, SourceStatus::Ok { records: 1 });
        assert!(!snapshot.sources.all_unavailable());
    }

    #[tokio::test]
    async fn backend_outage_keeps_feed_points() {
        let snapshot =
            build_snapshot(&resolver(), brt(), Ok(feed()), Err(ClientError::NotFound), now()).await;

        let point = &snapshot.set.points[0];
        assert_eq!(point.municipality, "Porto Alegre");
        assert_eq!(point.state, "RS");
        assert!(point.is_active(now()));
        assert_eq!(point.start, Some(Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()));
        assert_eq!(snapshot.refreshed_at, Some(now()));
    }

    #[tokio::test]
    async fn total_outage_yields_empty_snapshot() {
        let snapshot = build_snapshot(
            &resolver(),
            brt(),
            Err(ClientError::NotFound),
            Err(ClientError::Unauthorized),
            now(),
        )
        .await;
        assert!(snapshot.set.points.is_empty());
        assert!(snapshot.sources.all_unavailable());
    }

    #[test]
    fn default_snapshot_is_pending() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.sources.inmet, SourceStatus::Pending);
        assert!(snapshot.refreshed_at.is_none());
    }
}
