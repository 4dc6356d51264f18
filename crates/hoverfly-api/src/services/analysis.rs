//! # Image Analysis Service
//!
//! Sends captured imagery to a generative-text model with a
//! mission-type-specific prompt and distills the free-text reply into a
//! structured [`AnalysisReport`]. The model output is advisory; parsing
//! is keyword-driven and never fails on malformed text, only on
//! transport errors.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use hoverfly_domain::{ImageAnalysis, MissionType, ThreatSeverity, ThreatType};

use crate::config::AnalysisConfig;
use crate::error::{ApiError, ApiResult};

/// Structured output of one analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub analysis: ImageAnalysis,
    pub threats: Vec<DetectedThreat>,
}

/// A threat the analyzer reported, before the pipeline anchors it to
/// the sample's position and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedThreat {
    pub threat_type: ThreatType,
    pub severity: ThreatSeverity,
    pub confidence: f64,
    pub description: Option<String>,
}

/// Capability trait for image analysis.
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    async fn analyze(&self, image_url: &str, mission_type: MissionType)
    -> ApiResult<AnalysisReport>;
}

// =============================================================================
// GEMINI CLIENT
// =============================================================================

/// Analyzer backed by the Gemini generate-content endpoint.
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    config: AnalysisConfig,
}

const MODEL: &str = "gemini-1.5-flash";

impl GeminiAnalyzer {
    pub fn new(config: AnalysisConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn prompt(mission_type: MissionType) -> &'static str {
        match mission_type {
            MissionType::CropMonitoring => {
                "Analyze this aerial crop image for crop health indicators, \
                 disease or pest detection, irrigation needs, yield predictions \
                 and nutrient deficiencies. Provide actionable agricultural insights."
            }
            MissionType::Surveillance => {
                "Analyze this aerial surveillance image for unusual activities, \
                 security threats, movement patterns, vehicle identification and \
                 infrastructure monitoring."
            }
            MissionType::Mapping => {
                "Analyze this aerial mapping image for terrain features, \
                 infrastructure, land use classification and change detection."
            }
            MissionType::Inspection => {
                "Analyze this aerial inspection image for equipment condition, \
                 structural integrity issues, maintenance requirements and \
                 safety hazards."
            }
            MissionType::Emergency => {
                "Perform comprehensive aerial image analysis including scene \
                 description, notable objects, areas of interest and anomaly \
                 detection."
            }
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ImageAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        image_url: &str,
        mission_type: MissionType,
    ) -> ApiResult<AnalysisReport> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Upstream("analysis service not configured".to_string()))?;

        let url = format!(
            "{}/models/{MODEL}:generateContent?key={api_key}",
            self.config.endpoint
        );
        let prompt = format!(
            "{}\n\nImage URL: {image_url}\n\nProvide analysis in structured \
             format with confidence scores and specific findings.",
            Self::prompt(mission_type)
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or_default();

        Ok(parse_analysis(text, mission_type))
    }
}

/// Fixed-report analyzer for tests and offline runs.
pub struct StaticAnalyzer {
    report: AnalysisReport,
}

impl StaticAnalyzer {
    pub fn new(report: AnalysisReport) -> Self {
        Self { report }
    }
}

#[async_trait]
impl ImageAnalyzer for StaticAnalyzer {
    async fn analyze(
        &self,
        _image_url: &str,
        _mission_type: MissionType,
    ) -> ApiResult<AnalysisReport> {
        Ok(self.report.clone())
    }
}

// =============================================================================
// FREE-TEXT PARSING
// =============================================================================

/// Distill a free-text model reply into a structured report.
///
/// Tolerates any input shape, including the empty string.
#[must_use]
pub fn parse_analysis(text: &str, mission_type: MissionType) -> AnalysisReport {
    let analysis = ImageAnalysis {
        summary: summarize(text),
        findings: extract_findings(text),
        confidence: extract_confidence(text),
        recommendations: extract_recommendations(text),
        mission_type,
        timestamp: Utc::now(),
    };

    AnalysisReport {
        analysis,
        threats: extract_threats(text),
    }
}

fn summarize(text: &str) -> String {
    let truncated: String = text.chars().take(200).collect();
    if text.chars().count() > 200 {
        format!("{truncated}...")
    } else {
        truncated
    }
}

fn extract_findings(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.len() > 20)
        .take(5)
        .map(String::from)
        .collect()
}

fn extract_recommendations(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("recommend") || lower.contains("suggest") || lower.contains("should")
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(5)
        .map(String::from)
        .collect()
}

/// First percentage on a line that mentions confidence, scaled to [0, 1].
/// Falls back to 0.8 when the model omits one.
fn extract_confidence(text: &str) -> f64 {
    for line in text.lines() {
        let lower = line.to_lowercase();
        if !lower.contains("confidence") {
            continue;
        }
        if let Some(pct) = first_percentage(&lower) {
            return (pct / 100.0).clamp(0.0, 1.0);
        }
    }
    0.8
}

fn first_percentage(line: &str) -> Option<f64> {
    let bytes = line.as_bytes();
    let mut start = None;
    for (i, &b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            start.get_or_insert(i);
        } else if b == b'%' {
            if let Some(s) = start {
                return line[s..i].parse().ok();
            }
        } else {
            start = None;
        }
    }
    None
}

const THREAT_KEYWORDS: &[(&str, ThreatType)] = &[
    ("pest", ThreatType::Pest),
    ("disease", ThreatType::Disease),
    ("weed", ThreatType::Weed),
    ("irrigation", ThreatType::IrrigationIssue),
    ("equipment", ThreatType::EquipmentFailure),
    ("wildlife", ThreatType::Wildlife),
];

fn extract_threats(text: &str) -> Vec<DetectedThreat> {
    let lower = text.to_lowercase();
    let severity = extract_severity(&lower);

    THREAT_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|&(keyword, threat_type)| DetectedThreat {
            threat_type,
            severity,
            confidence: 0.7,
            description: Some(format!("{keyword} detected in aerial imagery")),
        })
        .collect()
}

fn extract_severity(lower: &str) -> ThreatSeverity {
    if lower.contains("critical") || lower.contains("severe") {
        ThreatSeverity::Critical
    } else if lower.contains("high") || lower.contains("major") {
        ThreatSeverity::High
    } else if lower.contains("medium") || lower.contains("moderate") {
        ThreatSeverity::Medium
    } else {
        ThreatSeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reply_yields_a_well_formed_report() {
        let report = parse_analysis("", MissionType::Mapping);
        assert_eq!(report.analysis.summary, "");
        assert!(report.analysis.findings.is_empty());
        assert!((report.analysis.confidence - 0.8).abs() < f64::EPSILON);
        assert!(report.threats.is_empty());
    }

    #[test]
    fn long_reply_is_truncated_into_the_summary() {
        let text = "x".repeat(300);
        let report = parse_analysis(&text, MissionType::Surveillance);
        assert_eq!(report.analysis.summary.chars().count(), 203);
        assert!(report.analysis.summary.ends_with("..."));
    }

    #[test]
    fn confidence_percentage_is_picked_up() {
        let text = "Findings look solid.\nConfidence: 92% based on image quality.";
        assert!((extract_confidence(text) - 0.92).abs() < 1e-9);
    }

    #[test]
    fn threat_keywords_map_to_types_with_shared_severity() {
        let text = "Severe pest infestation near the north field. \
                    Irrigation lines appear damaged.";
        let report = parse_analysis(text, MissionType::CropMonitoring);

        let types: Vec<ThreatType> = report.threats.iter().map(|t| t.threat_type).collect();
        assert_eq!(types, vec![ThreatType::Pest, ThreatType::IrrigationIssue]);
        assert!(
            report
                .threats
                .iter()
                .all(|t| t.severity == ThreatSeverity::Critical)
        );
    }

    #[test]
    fn recommendations_filter_on_advisory_phrasing() {
        let text = "The field looks healthy.\n\
                    We recommend increasing irrigation in zone 3.\n\
                    Operators should schedule a follow-up pass.\n";
        let recs = extract_recommendations(text);
        assert_eq!(recs.len(), 2);
    }
}
