//! AI-Drafted Incident Reports
//!
//! Formal report generation for emergency alerts. Same availability
//! policy as scoring: one summarizer attempt with a bounded timeout,
//! then a deterministic fallback report that responders can always act
//! on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threat_engine::GeoPoint;
use tracing::warn;

use crate::{Outcome, SafetyScorer, Summarizer, SummarizerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentPriority {
    Low,
    Medium,
    High,
}

/// Context handed to the drafter by the alert pipeline.
#[derive(Debug, Clone)]
pub struct AlertContext {
    pub alert_id: String,
    pub alert_type: String,
    pub tourist_name: String,
    pub location: GeoPoint,
    /// Reverse-geocoded display name, or the stringified coordinates
    pub location_name: String,
    pub occurred_at: DateTime<Utc>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub report_number: String,
    pub incident_summary: String,
    pub location_details: String,
    pub recommended_actions: Vec<String>,
    pub priority: IncidentPriority,
    pub assigned_units: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Expected drafter payload from the LLM.
#[derive(Debug, Deserialize)]
struct ReportPayload {
    incident_summary: String,
    location_details: String,
    recommended_actions: Vec<String>,
    priority_level: IncidentPriority,
    assigned_units: Vec<String>,
}

impl<S: Summarizer> SafetyScorer<S> {
    /// Draft a formal incident report for an emergency alert.
    pub async fn draft_incident_report(&self, ctx: &AlertContext) -> Outcome<IncidentReport> {
        let prompt = report_prompt(ctx);
        match self.try_draft(&prompt).await {
            Ok(payload) => Outcome::AiBacked(IncidentReport {
                report_number: report_number(&ctx.alert_id),
                incident_summary: payload.incident_summary,
                location_details: payload.location_details,
                recommended_actions: payload.recommended_actions,
                priority: payload.priority_level,
                assigned_units: payload.assigned_units,
                generated_at: Utc::now(),
            }),
            Err(e) => {
                warn!(error = %e, alert_id = %ctx.alert_id, "report drafter unavailable");
                Outcome::Fallback(fallback_report(ctx))
            }
        }
    }

    async fn try_draft(&self, prompt: &str) -> Result<ReportPayload, SummarizerError> {
        let raw = tokio::time::timeout(self.timeout(), self.summarizer().summarize(prompt))
            .await
            .map_err(|_| SummarizerError::Timeout)??;
        let trimmed = raw
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        serde_json::from_str(trimmed).map_err(|e| SummarizerError::ParseError(e.to_string()))
    }
}

fn report_number(alert_id: &str) -> String {
    let short: String = alert_id.chars().take(8).collect();
    format!("RPT-{short}")
}

fn fallback_report(ctx: &AlertContext) -> IncidentReport {
    IncidentReport {
        report_number: report_number(&ctx.alert_id),
        incident_summary: format!("Tourist emergency alert - {}", ctx.alert_type),
        location_details: format!("Coordinates: {}", ctx.location),
        recommended_actions: vec!["Manual review required".to_string()],
        priority: IncidentPriority::High,
        assigned_units: vec!["Tourist Police".to_string()],
        generated_at: Utc::now(),
    }
}

fn report_prompt(ctx: &AlertContext) -> String {
    format!(
        "Draft a formal incident report for a tourist emergency.\n\n\
         Incident:\n\
         - Type: {}\n\
         - Tourist: {}\n\
         - Location: {} ({})\n\
         - Time: {}\n\
         - Message: {}\n\n\
         Respond with JSON in exactly this shape:\n\
         {{\n\
           \"incident_summary\": \"...\",\n\
           \"location_details\": \"...\",\n\
           \"recommended_actions\": [\"...\"],\n\
           \"priority_level\": \"high|medium|low\",\n\
           \"assigned_units\": [\"...\"]\n\
         }}",
        ctx.alert_type,
        ctx.tourist_name,
        ctx.location_name,
        ctx.location,
        ctx.occurred_at.to_rfc3339(),
        ctx.message.as_deref().unwrap_or("No message provided"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SummarizerError;
    use std::sync::Arc;
    use threat_engine::ThreatCatalog;

    struct CannedSummarizer(String);

    impl Summarizer for CannedSummarizer {
        async fn summarize(&self, _prompt: &str) -> Result<String, SummarizerError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _prompt: &str) -> Result<String, SummarizerError> {
            Err(SummarizerError::ApiError("503".to_string()))
        }
    }

    fn ctx() -> AlertContext {
        AlertContext {
            alert_id: "b2c4e6a8-0000-0000-0000-000000000000".to_string(),
            alert_type: "panic".to_string(),
            tourist_name: "A. Traveler".to_string(),
            location: GeoPoint::new(26.1445, 91.7362),
            location_name: "Guwahati, Assam".to_string(),
            occurred_at: Utc::now(),
            message: None,
        }
    }

    #[tokio::test]
    async fn test_ai_backed_report() {
        let canned = r#"{
            "incident_summary": "Panic alert near Guwahati riverfront",
            "location_details": "Guwahati, Assam, near Brahmaputra ghats",
            "recommended_actions": ["Dispatch river patrol"],
            "priority_level": "medium",
            "assigned_units": ["Tourist Police", "River Patrol"]
        }"#;
        let scorer = SafetyScorer::new(
            Arc::new(ThreatCatalog::seeded()),
            CannedSummarizer(canned.to_string()),
        );

        let outcome = scorer.draft_incident_report(&ctx()).await;
        assert!(!outcome.degraded());
        let report = outcome.inner();
        assert_eq!(report.report_number, "RPT-b2c4e6a8");
        assert_eq!(report.priority, IncidentPriority::Medium);
        assert_eq!(report.assigned_units.len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_report_is_deterministic() {
        let scorer = SafetyScorer::new(Arc::new(ThreatCatalog::seeded()), FailingSummarizer);

        let outcome = scorer.draft_incident_report(&ctx()).await;
        assert!(outcome.degraded());
        let report = outcome.inner();
        assert_eq!(report.report_number, "RPT-b2c4e6a8");
        assert_eq!(report.priority, IncidentPriority::High);
        assert_eq!(report.recommended_actions, vec!["Manual review required"]);
        assert_eq!(report.assigned_units, vec!["Tourist Police"]);
        assert!(report.location_details.contains("26.1445"));
    }

    #[tokio::test]
    async fn test_unknown_priority_triggers_fallback() {
        let canned = r#"{
            "incident_summary": "x",
            "location_details": "y",
            "recommended_actions": [],
            "priority_level": "urgent",
            "assigned_units": []
        }"#;
        let scorer = SafetyScorer::new(
            Arc::new(ThreatCatalog::seeded()),
            CannedSummarizer(canned.to_string()),
        );

        let outcome = scorer.draft_incident_report(&ctx()).await;
        assert!(outcome.degraded());
    }
}
