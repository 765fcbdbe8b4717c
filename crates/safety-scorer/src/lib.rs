//! Safety Scorer Library
//!
//! Orchestrates threat proximity matches into a bounded safety score
//! with qualitative risk factors. The external AI summarizer refines
//! the result; every failure mode (unreachable, timeout, malformed
//! output) degrades to a deterministic fallback, so scoring never
//! errors out of the request path.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use threat_engine::{GeoPoint, ProximityMatch, ThreatCatalog};
use tracing::warn;

pub mod report;
pub mod summarizer;

pub use report::{AlertContext, IncidentPriority, IncidentReport};
pub use summarizer::{LlmSummarizer, Summarizer, SummarizerConfig, SummarizerError, SummaryPayload};

/// Search radius applied around every scored point
pub const SCORING_SCAN_RADIUS_KM: f64 = 25.0;

/// Fallback score for route scoring
pub const ROUTE_FALLBACK_SCORE: u8 = 60;

/// Fallback score for location-history scoring
pub const HISTORY_FALLBACK_SCORE: u8 = 70;

/// Default bound on the summarizer call
pub const DEFAULT_SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded safety assessment, owned by the caller once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteScore {
    /// 0 (dangerous) to 100 (safe)
    pub overall_score: u8,
    pub risk_factors: Vec<String>,
    pub danger_zones: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Terminal outcome of a scoring or drafting call. Degradation is
/// observable instead of being hidden inside generic content.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    AiBacked(T),
    Fallback(T),
}

pub type ScoreOutcome = Outcome<RouteScore>;

impl<T> Outcome<T> {
    pub fn inner(&self) -> &T {
        match self {
            Outcome::AiBacked(v) | Outcome::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Outcome::AiBacked(v) | Outcome::Fallback(v) => v,
        }
    }

    pub fn degraded(&self) -> bool {
        matches!(self, Outcome::Fallback(_))
    }
}

/// Safety scoring facade over the threat catalog and the summarizer.
pub struct SafetyScorer<S: Summarizer> {
    catalog: Arc<ThreatCatalog>,
    summarizer: S,
    timeout: Duration,
}

impl<S: Summarizer> SafetyScorer<S> {
    pub fn new(catalog: Arc<ThreatCatalog>, summarizer: S) -> Self {
        Self {
            catalog,
            summarizer,
            timeout: DEFAULT_SUMMARIZER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &ThreatCatalog {
        &self.catalog
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn summarizer(&self) -> &S {
        &self.summarizer
    }

    /// Score a planned route. One summarizer attempt; any failure
    /// yields the deterministic fallback (score 60).
    pub async fn score_route(&self, waypoints: &[GeoPoint]) -> ScoreOutcome {
        let threats = self.collect_threats(waypoints);
        let prompt = route_prompt(waypoints, &threats);
        self.summarize_or_fallback(&prompt, &threats, ROUTE_FALLBACK_SCORE)
            .await
    }

    /// Score a tourist's recent location history. Fallback score 70.
    pub async fn score_point_history(&self, points: &[GeoPoint]) -> ScoreOutcome {
        let threats = self.collect_threats(points);
        let prompt = history_prompt(points, &threats);
        self.summarize_or_fallback(&prompt, &threats, HISTORY_FALLBACK_SCORE)
            .await
    }

    /// Scan every point and union the matches, deduplicated by threat
    /// name. The aggregate does not depend on point ordering beyond
    /// which duplicate survives, and duplicates are identical records.
    fn collect_threats(&self, points: &[GeoPoint]) -> Vec<ProximityMatch> {
        let mut seen = HashSet::new();
        let mut threats = Vec::new();
        for &point in points {
            for m in self.catalog.nearby(point, SCORING_SCAN_RADIUS_KM) {
                if seen.insert(m.record.name.clone()) {
                    threats.push(m);
                }
            }
        }
        threats
    }

    async fn summarize_or_fallback(
        &self,
        prompt: &str,
        threats: &[ProximityMatch],
        fallback_score: u8,
    ) -> ScoreOutcome {
        match self.try_summarize(prompt).await {
            Ok(payload) => {
                let mut recommendations = payload.recommendations.clone();
                recommendations.extend(payload.alternative_suggestions.clone());
                Outcome::AiBacked(RouteScore {
                    overall_score: payload.clamped_score(),
                    risk_factors: payload.risk_factors,
                    danger_zones: payload.danger_zones,
                    recommendations,
                })
            }
            Err(e) => {
                warn!(error = %e, "summarizer unavailable, using fallback score");
                Outcome::Fallback(fallback_route_score(fallback_score, threats))
            }
        }
    }

    async fn try_summarize(&self, prompt: &str) -> Result<SummaryPayload, SummarizerError> {
        let raw = tokio::time::timeout(self.timeout, self.summarizer.summarize(prompt))
            .await
            .map_err(|_| SummarizerError::Timeout)??;
        SummaryPayload::parse(&raw)
    }
}

/// Deterministic fallback: never empty, always renderable.
fn fallback_route_score(score: u8, threats: &[ProximityMatch]) -> RouteScore {
    RouteScore {
        overall_score: score,
        risk_factors: vec!["Analysis unavailable".to_string()],
        danger_zones: threats.iter().map(|m| m.record.name.clone()).collect(),
        recommendations: vec![
            "Follow standard safety protocols".to_string(),
            "Keep emergency contacts handy".to_string(),
        ],
    }
}

fn threat_lines(threats: &[ProximityMatch]) -> String {
    if threats.is_empty() {
        return "- none matched within scan radius".to_string();
    }
    threats
        .iter()
        .map(|m| {
            format!(
                "- {} ({}, level {}, ~{:.0} km away)",
                m.record.name, m.record.category, m.record.threat_level, m.distance_km
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn point_lines(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

const SUMMARY_SHAPE: &str = r#"{
  "overall_safety_score": <integer 0-100>,
  "risk_factors": ["..."],
  "danger_zones": ["..."],
  "recommendations": ["..."],
  "alternative_suggestions": ["..."]
}"#;

fn route_prompt(waypoints: &[GeoPoint], threats: &[ProximityMatch]) -> String {
    format!(
        "Assess the safety of a planned tourist route.\n\n\
         Waypoints:\n{}\n\n\
         Known threats near the route:\n{}\n\n\
         Respond with JSON in exactly this shape:\n{}",
        point_lines(waypoints),
        threat_lines(threats),
        SUMMARY_SHAPE
    )
}

fn history_prompt(points: &[GeoPoint], threats: &[ProximityMatch]) -> String {
    format!(
        "Assess a tourist's recent movement pattern for safety.\n\n\
         Recent locations (newest first):\n{}\n\n\
         Known threats near these locations:\n{}\n\n\
         Consider time spent in risk zones and proximity to restricted \
         areas.\nRespond with JSON in exactly this shape:\n{}",
        point_lines(points),
        threat_lines(threats),
        SUMMARY_SHAPE
    )
}
