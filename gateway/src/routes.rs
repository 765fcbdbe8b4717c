//! API route handlers
//!
//! Tourist registration, location updates with background geofence
//! checks, emergency alerts with AI-drafted incident reports, threat
//! queries and route scoring.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use safety_scorer::{AlertContext, RouteScore};
use threat_engine::{safer_route, GeoPoint, ProximityMatch, ThreatRecord};

use crate::store::{
    AlertStatus, AlertType, EmergencyAlert, LocationUpdate, Tourist, DEFAULT_SAFETY_SCORE,
};
use crate::AppState;

/// Search radius for the background geofence check. Matches inside a
/// zone's own radius raise the alert; this only widens the scan.
pub const GEOFENCE_SCAN_RADIUS_KM: f64 = 5.0;

/// Location-history window used for safety analysis
const SAFETY_HISTORY_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Tourist not found: {0}")]
    TouristNotFound(Uuid),
    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("Trip end date must be after start date")]
    InvalidTripDates,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::TouristNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCoordinate { .. } | ApiError::InvalidTripDates => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

fn validated_point(lat: f64, lng: f64) -> Result<GeoPoint, ApiError> {
    GeoPoint::validated(lat, lng).map_err(|_| ApiError::InvalidCoordinate { lat, lng })
}

// ---- Tourists ----

#[derive(Deserialize)]
pub struct RegisterTouristRequest {
    pub name: String,
    pub phone: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub trip_start: DateTime<Utc>,
    pub trip_end: DateTime<Utc>,
}

pub async fn register_tourist(
    State(state): State<AppState>,
    Json(req): Json<RegisterTouristRequest>,
) -> Result<Json<Tourist>, ApiError> {
    if req.trip_end <= req.trip_start {
        return Err(ApiError::InvalidTripDates);
    }

    let tourist = Tourist {
        id: Uuid::new_v4(),
        name: req.name,
        phone: req.phone,
        emergency_contact_name: req.emergency_contact_name,
        emergency_contact_phone: req.emergency_contact_phone,
        trip_start: req.trip_start,
        trip_end: req.trip_end,
        safety_score: DEFAULT_SAFETY_SCORE,
        created_at: Utc::now(),
    };
    state.store.insert_tourist(tourist.clone()).await;
    info!(tourist_id = %tourist.id, "tourist registered");

    Ok(Json(tourist))
}

pub async fn get_tourist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tourist>, ApiError> {
    state
        .store
        .tourist(id)
        .await
        .map(Json)
        .ok_or(ApiError::TouristNotFound(id))
}

// ---- Locations ----

#[derive(Deserialize)]
pub struct LocationUpdateRequest {
    pub tourist_id: Uuid,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn update_location(
    State(state): State<AppState>,
    Json(req): Json<LocationUpdateRequest>,
) -> Result<Json<LocationUpdate>, ApiError> {
    let point = validated_point(req.lat, req.lng)?;
    if state.store.tourist(req.tourist_id).await.is_none() {
        return Err(ApiError::TouristNotFound(req.tourist_id));
    }

    let update = LocationUpdate {
        id: Uuid::new_v4(),
        tourist_id: req.tourist_id,
        point,
        recorded_at: Utc::now(),
    };
    state.store.push_location(update.clone()).await;

    // Geofence check runs off the request path
    let check_state = state.clone();
    tokio::spawn(async move {
        geofence_check(check_state, req.tourist_id, point).await;
    });

    Ok(Json(update))
}

pub async fn location_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<LocationUpdate>>, ApiError> {
    if state.store.tourist(id).await.is_none() {
        return Err(ApiError::TouristNotFound(id));
    }
    let history = state.store.location_history(id, q.limit.unwrap_or(50)).await;
    Ok(Json(history))
}

/// Raise a geofence alert when the tourist stands inside a threat's own
/// influence radius. One active geofence alert per tourist.
async fn geofence_check(state: AppState, tourist_id: Uuid, point: GeoPoint) {
    let entered: Vec<ProximityMatch> = state
        .catalog
        .nearby(point, GEOFENCE_SCAN_RADIUS_KM)
        .into_iter()
        .filter(|m| m.distance_km <= m.record.radius_km)
        .collect();

    let Some(hit) = entered.first() else {
        return;
    };
    if state.store.has_active_geofence_alert(tourist_id).await {
        return;
    }

    warn!(
        %tourist_id,
        zone = %hit.record.name,
        category = %hit.record.category,
        level = hit.record.threat_level,
        "tourist entered threat zone"
    );

    let alert = EmergencyAlert {
        id: Uuid::new_v4(),
        tourist_id,
        alert_type: AlertType::Geofence,
        status: AlertStatus::Active,
        point,
        message: Some(format!(
            "Tourist entered {} risk zone: {}",
            hit.record.category, hit.record.name
        )),
        report: None,
        report_degraded: None,
        created_at: Utc::now(),
    };
    state.store.insert_alert(alert).await;
}

// ---- Alerts ----

#[derive(Deserialize)]
pub struct CreateAlertRequest {
    pub tourist_id: Uuid,
    pub alert_type: AlertType,
    pub lat: f64,
    pub lng: f64,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct AlertsQuery {
    pub status: Option<AlertStatus>,
    pub limit: Option<usize>,
}

pub async fn create_alert(
    State(state): State<AppState>,
    Json(req): Json<CreateAlertRequest>,
) -> Result<Json<EmergencyAlert>, ApiError> {
    let point = validated_point(req.lat, req.lng)?;
    let tourist = state
        .store
        .tourist(req.tourist_id)
        .await
        .ok_or(ApiError::TouristNotFound(req.tourist_id))?;

    let alert = EmergencyAlert {
        id: Uuid::new_v4(),
        tourist_id: req.tourist_id,
        alert_type: req.alert_type,
        status: AlertStatus::Active,
        point,
        message: req.message.clone(),
        report: None,
        report_degraded: None,
        created_at: Utc::now(),
    };
    state.store.insert_alert(alert.clone()).await;
    info!(alert_id = %alert.id, alert_type = ?alert.alert_type, "emergency alert created");

    // Incident report drafting runs off the request path
    let draft_state = state.clone();
    let draft_alert = alert.clone();
    tokio::spawn(async move {
        draft_report(draft_state, draft_alert, tourist).await;
    });

    Ok(Json(alert))
}

async fn draft_report(state: AppState, alert: EmergencyAlert, tourist: Tourist) {
    let location_name = state.geocoder.display_name(alert.point).await;

    let ctx = AlertContext {
        alert_id: alert.id.to_string(),
        alert_type: alert.alert_type.as_str().to_string(),
        tourist_name: tourist.name,
        location: alert.point,
        location_name,
        occurred_at: alert.created_at,
        message: alert.message,
    };

    let outcome = state.scorer.draft_incident_report(&ctx).await;
    let degraded = outcome.degraded();
    let report = outcome.into_inner();
    info!(alert_id = %alert.id, report = %report.report_number, degraded, "incident report attached");
    state.store.attach_report(alert.id, report, degraded).await;
}

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(q): Query<AlertsQuery>,
) -> Json<Vec<EmergencyAlert>> {
    Json(state.store.alerts(q.status, q.limit.unwrap_or(100)).await)
}

// ---- Threats ----

#[derive(Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

#[derive(Serialize)]
pub struct NearbyThreat {
    pub name: String,
    pub category: threat_engine::ThreatCategory,
    pub threat_level: u8,
    pub distance_km: f64,
}

pub async fn list_threats(State(state): State<AppState>) -> Json<Vec<ThreatRecord>> {
    Json(state.catalog.all().to_vec())
}

pub async fn threats_nearby(
    State(state): State<AppState>,
    Query(q): Query<NearbyQuery>,
) -> Result<Json<Vec<NearbyThreat>>, ApiError> {
    let point = validated_point(q.lat, q.lng)?;
    let matches = state
        .catalog
        .nearby(point, q.radius_km)
        .into_iter()
        .map(|m| NearbyThreat {
            name: m.record.name,
            category: m.record.category,
            threat_level: m.record.threat_level,
            distance_km: m.distance_km,
        })
        .collect();
    Ok(Json(matches))
}

// ---- Routes & safety analysis ----

#[derive(Deserialize)]
pub struct WaypointsRequest {
    pub waypoints: Vec<CoordinatePair>,
}

#[derive(Deserialize)]
pub struct CoordinatePair {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Serialize)]
pub struct ScoreResponse {
    #[serde(flatten)]
    pub score: RouteScore,
    pub degraded: bool,
}

#[derive(Serialize)]
pub struct SaferRouteResponse {
    pub waypoints: Vec<GeoPoint>,
}

fn validated_waypoints(pairs: &[CoordinatePair]) -> Result<Vec<GeoPoint>, ApiError> {
    pairs
        .iter()
        .map(|p| validated_point(p.lat, p.lng))
        .collect()
}

pub async fn score_route(
    State(state): State<AppState>,
    Json(req): Json<WaypointsRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let waypoints = validated_waypoints(&req.waypoints)?;
    let outcome = state.scorer.score_route(&waypoints).await;
    Ok(Json(ScoreResponse {
        degraded: outcome.degraded(),
        score: outcome.into_inner(),
    }))
}

pub async fn plan_safer_route(
    State(state): State<AppState>,
    Json(req): Json<WaypointsRequest>,
) -> Result<Json<SaferRouteResponse>, ApiError> {
    let waypoints = validated_waypoints(&req.waypoints)?;
    Ok(Json(SaferRouteResponse {
        waypoints: safer_route(&state.catalog, &waypoints),
    }))
}

#[derive(Serialize)]
pub struct SafetyAnalysisResponse {
    pub tourist_id: Uuid,
    #[serde(flatten)]
    pub score: RouteScore,
    pub degraded: bool,
}

pub async fn tourist_safety(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SafetyAnalysisResponse>, ApiError> {
    if state.store.tourist(id).await.is_none() {
        return Err(ApiError::TouristNotFound(id));
    }

    let history = state.store.location_history(id, SAFETY_HISTORY_LIMIT).await;
    let points: Vec<GeoPoint> = history.iter().map(|l| l.point).collect();

    let outcome = state.scorer.score_point_history(&points).await;
    let degraded = outcome.degraded();
    let score = outcome.into_inner();

    state.store.set_safety_score(id, score.overall_score).await;

    Ok(Json(SafetyAnalysisResponse {
        tourist_id: id,
        score,
        degraded,
    }))
}
