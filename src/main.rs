mod auth;
mod clients;
mod config;
mod error;
mod geo;
mod models;
mod processor;
mod reconcile;
mod refresher;
mod report;
mod risk;
mod server;

use clients::backend::BackendClient;
use clients::inmet::InmetClient;
use config::AppConfig;
use geo::cache::GeocodeCache;
use geo::geocoder::{GeocodeProvider, HttpGeocoder};
use geo::GeoResolver;
use refresher::{Refresher, SharedSnapshot};
use server::AppState;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting SafeFlood alert service...");

    // Upstream clients
    let http = clients::init_http_client(config.http_timeout())?;
    let inmet = InmetClient::new(http.clone(), &config.inmet_feed_url);
    let backend = BackendClient::new(http.clone(), &config.backend_base_url)?;
    let cache = GeocodeCache::new(config.geocode_cache_capacity, config.geocode_cache_ttl());

    let snapshot: SharedSnapshot = Arc::default();
    let wake = Arc::new(Notify::new());

    // Start refresher
    if config.geocoding_enabled {
        info!("Geocoding fallback enabled");
        let geocoder = HttpGeocoder::new(http, &config.ibge_municipios_url, &config.nominatim_url);
        spawn_refresher(
            &config,
            inmet,
            backend.clone(),
            GeoResolver::with_geocoder(geocoder, cache.clone()),
            snapshot.clone(),
            wake.clone(),
        );
    } else {
        spawn_refresher(
            &config,
            inmet,
            backend.clone(),
            GeoResolver::offline(cache.clone()),
            snapshot.clone(),
            wake.clone(),
        );
    }

    // Serve
    let app = server::router(AppState {
        snapshot,
        backend,
        geocode_cache: cache,
        refresh: wake,
    });
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_refresher<P: GeocodeProvider + 'static>(
    config: &AppConfig,
    inmet: InmetClient,
    backend: BackendClient,
    resolver: GeoResolver<P>,
    snapshot: SharedSnapshot,
    wake: Arc<Notify>,
) {
    let refresher = Refresher {
        inmet,
        backend,
        backend_token: config.backend_token.clone(),
        resolver,
        offset: config.feed_offset(),
        interval: config.refresh_interval(),
        snapshot,
        wake,
    };
    tokio::spawn(refresher.run());
}
