//! In-memory document store
//!
//! Thin persistence collaborator for tourists, location history and
//! emergency alerts. Backed by `RwLock`-guarded maps; a real deployment
//! would swap this for a database without touching the core crates.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use safety_scorer::IncidentReport;
use serde::{Deserialize, Serialize};
use threat_engine::GeoPoint;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Initial safety score assigned at registration
pub const DEFAULT_SAFETY_SCORE: u8 = 85;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tourist {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    pub trip_start: DateTime<Utc>,
    pub trip_end: DateTime<Utc>,
    pub safety_score: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub id: Uuid,
    pub tourist_id: Uuid,
    pub point: GeoPoint,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Panic,
    Medical,
    Geofence,
    Other,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Panic => "panic",
            AlertType::Medical => "medical",
            AlertType::Geofence => "geofence",
            AlertType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyAlert {
    pub id: Uuid,
    pub tourist_id: Uuid,
    pub alert_type: AlertType,
    pub status: AlertStatus,
    pub point: GeoPoint,
    pub message: Option<String>,
    /// AI-drafted (or fallback) report, attached asynchronously
    pub report: Option<IncidentReport>,
    pub report_degraded: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct Store {
    tourists: RwLock<HashMap<Uuid, Tourist>>,
    locations: RwLock<Vec<LocationUpdate>>,
    alerts: RwLock<Vec<EmergencyAlert>>,
}

impl Store {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn insert_tourist(&self, tourist: Tourist) {
        self.tourists.write().await.insert(tourist.id, tourist);
    }

    pub async fn tourist(&self, id: Uuid) -> Option<Tourist> {
        self.tourists.read().await.get(&id).cloned()
    }

    pub async fn set_safety_score(&self, id: Uuid, score: u8) {
        if let Some(t) = self.tourists.write().await.get_mut(&id) {
            t.safety_score = score;
        }
    }

    pub async fn push_location(&self, update: LocationUpdate) {
        self.locations.write().await.push(update);
    }

    /// Most recent updates first.
    pub async fn location_history(&self, tourist_id: Uuid, limit: usize) -> Vec<LocationUpdate> {
        let locations = self.locations.read().await;
        let mut history: Vec<LocationUpdate> = locations
            .iter()
            .filter(|l| l.tourist_id == tourist_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        history.truncate(limit);
        history
    }

    pub async fn insert_alert(&self, alert: EmergencyAlert) {
        self.alerts.write().await.push(alert);
    }

    pub async fn alerts(&self, status: Option<AlertStatus>, limit: usize) -> Vec<EmergencyAlert> {
        let alerts = self.alerts.read().await;
        let mut out: Vec<EmergencyAlert> = alerts
            .iter()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit);
        out
    }

    /// One active geofence alert per tourist at a time.
    pub async fn has_active_geofence_alert(&self, tourist_id: Uuid) -> bool {
        self.alerts.read().await.iter().any(|a| {
            a.tourist_id == tourist_id
                && a.alert_type == AlertType::Geofence
                && a.status == AlertStatus::Active
        })
    }

    pub async fn attach_report(&self, alert_id: Uuid, report: IncidentReport, degraded: bool) {
        if let Some(a) = self
            .alerts
            .write()
            .await
            .iter_mut()
            .find(|a| a.id == alert_id)
        {
            a.report = Some(report);
            a.report_degraded = Some(degraded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tourist() -> Tourist {
        Tourist {
            id: Uuid::new_v4(),
            name: "A. Traveler".to_string(),
            phone: "+91-00000-00000".to_string(),
            emergency_contact_name: "B. Contact".to_string(),
            emergency_contact_phone: "+91-11111-11111".to_string(),
            trip_start: Utc::now(),
            trip_end: Utc::now() + Duration::days(7),
            safety_score: DEFAULT_SAFETY_SCORE,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_history_newest_first_with_limit() {
        let store = Store::new();
        let t = tourist();
        store.insert_tourist(t.clone()).await;

        let base = Utc::now();
        for i in 0..5 {
            store
                .push_location(LocationUpdate {
                    id: Uuid::new_v4(),
                    tourist_id: t.id,
                    point: GeoPoint::new(26.0 + i as f64 * 0.01, 91.7),
                    recorded_at: base + Duration::seconds(i),
                })
                .await;
        }

        let history = store.location_history(t.id, 3).await;
        assert_eq!(history.len(), 3);
        assert!(history[0].recorded_at > history[1].recorded_at);
        assert!(history[1].recorded_at > history[2].recorded_at);
    }

    #[tokio::test]
    async fn test_active_geofence_dedup_flag() {
        let store = Store::new();
        let t = tourist();

        assert!(!store.has_active_geofence_alert(t.id).await);
        store
            .insert_alert(EmergencyAlert {
                id: Uuid::new_v4(),
                tourist_id: t.id,
                alert_type: AlertType::Geofence,
                status: AlertStatus::Active,
                point: GeoPoint::new(26.14, 91.73),
                message: None,
                report: None,
                report_degraded: None,
                created_at: Utc::now(),
            })
            .await;
        assert!(store.has_active_geofence_alert(t.id).await);
    }

    #[tokio::test]
    async fn test_attach_report() {
        let store = Store::new();
        let alert_id = Uuid::new_v4();
        store
            .insert_alert(EmergencyAlert {
                id: alert_id,
                tourist_id: Uuid::new_v4(),
                alert_type: AlertType::Panic,
                status: AlertStatus::Active,
                point: GeoPoint::new(26.14, 91.73),
                message: None,
                report: None,
                report_degraded: None,
                created_at: Utc::now(),
            })
            .await;

        let report = IncidentReport {
            report_number: "RPT-12345678".to_string(),
            incident_summary: "s".to_string(),
            location_details: "l".to_string(),
            recommended_actions: vec![],
            priority: safety_scorer::IncidentPriority::High,
            assigned_units: vec![],
            generated_at: Utc::now(),
        };
        store.attach_report(alert_id, report, true).await;

        let alerts = store.alerts(None, 10).await;
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].report.is_some());
        assert_eq!(alerts[0].report_degraded, Some(true));
    }
}
