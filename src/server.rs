use crate::auth::{authenticate, require_admin, Claims};
use crate::clients::backend::BackendClient;
use crate::error::{AuthError, ClientError};
use crate::geo::cache::GeocodeCache;
use crate::models::point::NormalizedPoint;
use crate::models::user::{User, UserData};
use crate::processor::filters::{FilterError, FilterState, Stats};
use crate::processor::point_builder::DropReport;
use crate::refresher::{SharedSnapshot, SourceHealth};
use crate::report::{NewReport, ValidationError};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub snapshot: SharedSnapshot,
    pub backend: BackendClient,
    pub geocode_cache: GeocodeCache,
    /// Wakes the refresher early after a report is created or deleted.
    pub refresh: Arc<Notify>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/points", get(list_points))
        .route("/api/stats", get(stats))
        .route("/api/alerts", get(list_alerts).post(create_report))
        .route(
            "/api/alerts/:id",
            get(get_alert).put(update_alert).delete(delete_alert),
        )
        .route("/api/users", get(list_users))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/geocode-cache/clear", post(clear_geocode_cache))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Upstream(#[from] ClientError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(ClientError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(ClientError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Upstream(ClientError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Filter(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        };

        if status == StatusCode::BAD_GATEWAY {
            warn!("Upstream failure: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PointsQuery {
    pub risco: Option<String>,
    pub periodo: Option<String>,
}

impl PointsQuery {
    fn filter(&self) -> Result<FilterState, FilterError> {
        Ok(FilterState {
            risk: self.risco.as_deref().unwrap_or_default().parse()?,
            period: self.periodo.as_deref().unwrap_or_default().parse()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PointsResponse {
    pub points: Vec<NormalizedPoint>,
    pub stats: Stats,
    pub dropped: DropReport,
    pub sources: SourceHealth,
    pub refreshed_at: Option<DateTime<Utc>>,
}

async fn list_points(
    State(state): State<AppState>,
    Query(query): Query<PointsQuery>,
) -> Result<Json<PointsResponse>, ApiError> {
    let filter = query.filter()?;
    let now = Utc::now();
    let snapshot = state.snapshot.read().await;

    Ok(Json(PointsResponse {
        points: filter
            .apply(&snapshot.set.points, now)
            .into_iter()
            .cloned()
            .collect(),
        stats: Stats::compute(&snapshot.set.points, now),
        dropped: snapshot.set.dropped,
        sources: snapshot.sources.clone(),
        refreshed_at: snapshot.refreshed_at,
    }))
}

async fn stats(State(state): State<AppState>) -> Json<Stats> {
    let snapshot = state.snapshot.read().await;
    Json(Stats::compute(&snapshot.set.points, Utc::now()))
}

fn caller(headers: &HeaderMap) -> Result<(String, Claims), AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    authenticate(header, Utc::now())
}

async fn list_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, ApiError> {
    let (token, claims) = caller(&headers)?;
    require_admin(&claims)?;
    Ok(Json(state.backend.list_alerts(Some(&token)).await?))
}

async fn create_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(report): Json<NewReport>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (token, claims) = caller(&headers)?;
    let checked = report.validate()?;
    let user_id = submitting_user(&state.backend, &claims, &token).await?;
    let alert = checked.into_alert(user_id, Utc::now());

    let created = state.backend.create_alert(&alert, Some(&token)).await?;
    info!("User {} reported {} in {} - {}", user_id, alert.nivel_risco, alert.municipio, alert.uf);
    state.refresh.notify_one();

    Ok((StatusCode::CREATED, Json(created)))
}

/// Backend id of the caller, registering them on first submission.
async fn submitting_user(
    backend: &BackendClient,
    claims: &Claims,
    token: &str,
) -> Result<i64, ApiError> {
    let email = claims.email.as_deref().ok_or(AuthError::Malformed)?;
    if let Some(user) = backend.find_user_by_email(email, Some(token)).await? {
        return Ok(user.id);
    }

    let data = UserData {
        nome_usuario: Some(claims.display_name().unwrap_or(email).to_string()),
        email: Some(email.to_string()),
        tipo_usuario: None,
    };
    let user = backend.create_user(&data, Some(token)).await?;
    info!("Registered user {} for {}", user.id, email);
    Ok(user.id)
}

async fn delete_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let (token, claims) = caller(&headers)?;
    require_admin(&claims)?;
    state.backend.delete_alert(id, Some(&token)).await?;
    info!("Alert {} deleted by {}", id, claims.display_name().unwrap_or("?"));
    state.refresh.notify_one();
    Ok(StatusCode::NO_CONTENT)
}

async fn get_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = caller(&headers)?;
    require_admin(&claims)?;
    Ok(Json(state.backend.get_alert(id, Some(&token)).await?))
}

async fn update_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let (token, claims) = caller(&headers)?;
    require_admin(&claims)?;
    let updated = state.backend.update_alert(id, &patch, Some(&token)).await?;
    state.refresh.notify_one();
    Ok(Json(updated))
}

async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>, ApiError> {
    let (token, claims) = caller(&headers)?;
    require_admin(&claims)?;
    Ok(Json(state.backend.list_users(Some(&token)).await?))
}

async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let (token, claims) = caller(&headers)?;
    require_admin(&claims)?;
    state
        .backend
        .find_user(id, Some(&token))
        .await?
        .map(Json)
        .ok_or(ApiError::Upstream(ClientError::NotFound))
}

async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(data): Json<UserData>,
) -> Result<Json<User>, ApiError> {
    let (token, claims) = caller(&headers)?;
    require_admin(&claims)?;
    Ok(Json(state.backend.update_user(id, &data, Some(&token)).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let (token, claims) = caller(&headers)?;
    require_admin(&claims)?;
    state.backend.delete_user(id, Some(&token)).await?;
    info!("User {} deleted by {}", id, claims.display_name().unwrap_or("?"));
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_geocode_cache(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let (_, claims) = caller(&headers)?;
    require_admin(&claims)?;
    state.geocode_cache.clear().await;
    Ok(StatusCode::NO_CONTENT)
}
