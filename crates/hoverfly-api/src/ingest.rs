//! # Telemetry Ingestion Pipeline
//!
//! The single write path for drone telemetry: validate, enrich with
//! best-effort image analysis, commit atomically, then fan out to live
//! subscribers. Analysis failures never block ingestion, and nothing is
//! published before the store commit succeeds.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use uuid::Uuid;

use hoverfly_domain::{StoredSample, TelemetryDraft, TelemetrySample, Threat};
use hoverfly_persistence::MissionStore;

use crate::error::{ApiError, ApiResult};
use crate::realtime::{Broadcaster, TelemetryEvent};
use crate::services::analysis::ImageAnalyzer;

pub struct IngestPipeline {
    store: Arc<dyn MissionStore>,
    analyzer: Arc<dyn ImageAnalyzer>,
    broadcaster: Arc<Broadcaster>,
    /// Sub-deadline for one analysis call.
    analysis_timeout: Duration,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn MissionStore>,
        analyzer: Arc<dyn ImageAnalyzer>,
        broadcaster: Arc<Broadcaster>,
        analysis_timeout: Duration,
    ) -> Self {
        Self {
            store,
            analyzer,
            broadcaster,
            analysis_timeout,
        }
    }

    /// Ingest one telemetry sample for `mission_id` on behalf of
    /// `owner_id`.
    ///
    /// The sample is stamped with the server clock. When it carries an
    /// `imageUrl`, the analyzer runs under a sub-deadline; on timeout or
    /// error the sample is stored without analysis metadata. Threats the
    /// analyzer reports are anchored to the sample's position and
    /// timestamp and appended after the sample itself.
    pub async fn ingest(
        &self,
        mission_id: Uuid,
        owner_id: Uuid,
        draft: TelemetryDraft,
    ) -> ApiResult<StoredSample> {
        let mission = self
            .store
            .get_by_id(mission_id, owner_id)
            .await?
            .ok_or_else(ApiError::mission_not_found)?;

        let mut sample = TelemetrySample::from_draft(draft, Utc::now())?;

        let mut derived_threats: Vec<Threat> = Vec::new();
        if let Some(image_url) = sample.image_url.clone() {
            match timeout(
                self.analysis_timeout,
                self.analyzer.analyze(&image_url, mission.mission_type),
            )
            .await
            {
                Ok(Ok(report)) => {
                    derived_threats = report
                        .threats
                        .into_iter()
                        .map(|t| {
                            Threat::detected(
                                t.threat_type,
                                t.severity,
                                sample.position,
                                t.confidence,
                                t.description,
                                sample.timestamp,
                            )
                        })
                        .collect();
                    sample.analysis = Some(report.analysis);
                }
                Ok(Err(error)) => {
                    tracing::warn!(%mission_id, %error, "image analysis failed, storing sample without analysis");
                }
                Err(_) => {
                    tracing::warn!(
                        %mission_id,
                        timeout_ms = self.analysis_timeout.as_millis() as u64,
                        "image analysis timed out, storing sample without analysis"
                    );
                }
            }
        }

        let (stored, mut analytics) = self
            .store
            .append_telemetry(mission_id, owner_id, sample)
            .await?
            .ok_or_else(ApiError::mission_not_found)?;

        if !derived_threats.is_empty() {
            self.store
                .append_threats(mission_id, owner_id, derived_threats)
                .await?
                .ok_or_else(ApiError::mission_not_found)?;
            // The snapshot from append_telemetry predates the threat
            // counter bump; re-read so subscribers see both.
            if let Some(mission) = self.store.get_by_id(mission_id, owner_id).await? {
                analytics = mission.analytics;
            }
        }

        let event = TelemetryEvent::new(mission_id, &stored, &analytics);
        self.broadcaster.publish(&event).await;

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use hoverfly_domain::{
        Coordinate, ImageAnalysis, MissionDraft, MissionType, ScheduleDraft, ThreatSeverity,
        ThreatType,
    };
    use hoverfly_persistence::MemoryMissionStore;

    use crate::services::analysis::{AnalysisReport, DetectedThreat, StaticAnalyzer};

    struct FailingAnalyzer;

    #[async_trait]
    impl ImageAnalyzer for FailingAnalyzer {
        async fn analyze(
            &self,
            _image_url: &str,
            _mission_type: MissionType,
        ) -> ApiResult<AnalysisReport> {
            Err(ApiError::Upstream("model unavailable".to_string()))
        }
    }

    struct SlowAnalyzer;

    #[async_trait]
    impl ImageAnalyzer for SlowAnalyzer {
        async fn analyze(
            &self,
            _image_url: &str,
            mission_type: MissionType,
        ) -> ApiResult<AnalysisReport> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(report(mission_type, Vec::new()))
        }
    }

    fn report(mission_type: MissionType, threats: Vec<DetectedThreat>) -> AnalysisReport {
        AnalysisReport {
            analysis: ImageAnalysis {
                summary: "field scan".to_string(),
                findings: vec!["dense canopy in the north quadrant".to_string()],
                confidence: 0.9,
                recommendations: Vec::new(),
                mission_type,
                timestamp: Utc::now(),
            },
            threats,
        }
    }

    fn draft(image_url: Option<&str>) -> TelemetryDraft {
        TelemetryDraft {
            position: Some(Coordinate { lat: 1.0, lng: 2.0 }),
            altitude: Some(45.0),
            speed: Some(9.0),
            battery_level: Some(80.0),
            heading: Some(270.0),
            image_url: image_url.map(String::from),
            ..TelemetryDraft::default()
        }
    }

    async fn seed_mission(store: &MemoryMissionStore, owner: Uuid) -> Uuid {
        let mission = store
            .create(
                MissionDraft {
                    name: Some("Orchard sweep".to_string()),
                    mission_type: Some(MissionType::CropMonitoring),
                    schedule: Some(ScheduleDraft {
                        start_time: Some(Utc::now()),
                        ..ScheduleDraft::default()
                    }),
                    ..MissionDraft::default()
                },
                owner,
            )
            .await
            .unwrap();
        mission.id
    }

    fn pipeline(
        store: Arc<MemoryMissionStore>,
        analyzer: Arc<dyn ImageAnalyzer>,
    ) -> (IngestPipeline, Arc<Broadcaster>) {
        let broadcaster = Arc::new(Broadcaster::new());
        (
            IngestPipeline::new(
                store,
                analyzer,
                Arc::clone(&broadcaster),
                Duration::from_secs(4),
            ),
            broadcaster,
        )
    }

    #[tokio::test]
    async fn plain_sample_is_stored_and_published() {
        let store = Arc::new(MemoryMissionStore::new());
        let owner = Uuid::new_v4();
        let mission_id = seed_mission(&store, owner).await;
        let (pipeline, broadcaster) =
            pipeline(Arc::clone(&store), Arc::new(FailingAnalyzer));

        let (tx, mut rx) = mpsc::unbounded_channel();
        broadcaster.subscribe(mission_id, Uuid::new_v4(), tx).await;

        let stored = pipeline.ingest(mission_id, owner, draft(None)).await.unwrap();
        assert_eq!(stored.sequence, 0);
        assert!(stored.sample.analysis.is_none());

        let frame: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame["missionId"], mission_id.to_string());
        assert_eq!(frame["analytics"]["totalFlightTime"], 1);
    }

    #[tokio::test]
    async fn analysis_threats_are_anchored_and_counted() {
        let store = Arc::new(MemoryMissionStore::new());
        let owner = Uuid::new_v4();
        let mission_id = seed_mission(&store, owner).await;

        let analyzer = StaticAnalyzer::new(report(
            MissionType::CropMonitoring,
            vec![DetectedThreat {
                threat_type: ThreatType::Pest,
                severity: ThreatSeverity::High,
                confidence: 0.8,
                description: Some("pest detected in aerial imagery".to_string()),
            }],
        ));
        let (pipeline, broadcaster) = pipeline(Arc::clone(&store), Arc::new(analyzer));

        let (tx, mut rx) = mpsc::unbounded_channel();
        broadcaster.subscribe(mission_id, Uuid::new_v4(), tx).await;

        let stored = pipeline
            .ingest(mission_id, owner, draft(Some("https://img.example/1.jpg")))
            .await
            .unwrap();
        assert!(stored.sample.analysis.is_some());

        let threats = store.threat_log(mission_id, owner).await.unwrap().unwrap();
        assert_eq!(threats.len(), 1);
        assert_eq!(threats[0].position, stored.sample.position);
        assert_eq!(threats[0].detected_at, stored.sample.timestamp);

        let mission = store.get_by_id(mission_id, owner).await.unwrap().unwrap();
        assert_eq!(mission.analytics.threats_detected, 1);
        assert_eq!(mission.analytics.images_captures, 1);

        // The published snapshot includes the threat counter bump.
        let frame: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(frame["analytics"]["threatsDetected"], 1);
    }

    #[tokio::test]
    async fn analyzer_failure_does_not_block_ingestion() {
        let store = Arc::new(MemoryMissionStore::new());
        let owner = Uuid::new_v4();
        let mission_id = seed_mission(&store, owner).await;
        let (pipeline, _) = pipeline(Arc::clone(&store), Arc::new(FailingAnalyzer));

        let stored = pipeline
            .ingest(mission_id, owner, draft(Some("https://img.example/1.jpg")))
            .await
            .unwrap();
        assert!(stored.sample.analysis.is_none());

        let mission = store.get_by_id(mission_id, owner).await.unwrap().unwrap();
        assert_eq!(mission.analytics.total_flight_time, 1);
        assert_eq!(mission.analytics.images_captures, 1);
        assert_eq!(mission.analytics.threats_detected, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_analyzer_hits_the_sub_deadline() {
        let store = Arc::new(MemoryMissionStore::new());
        let owner = Uuid::new_v4();
        let mission_id = seed_mission(&store, owner).await;
        let (pipeline, _) = pipeline(Arc::clone(&store), Arc::new(SlowAnalyzer));

        let stored = pipeline
            .ingest(mission_id, owner, draft(Some("https://img.example/1.jpg")))
            .await
            .unwrap();
        assert!(stored.sample.analysis.is_none());
    }

    #[tokio::test]
    async fn unknown_mission_is_rejected_before_analysis() {
        let store = Arc::new(MemoryMissionStore::new());
        let (pipeline, _) = pipeline(Arc::clone(&store), Arc::new(FailingAnalyzer));

        let err = pipeline
            .ingest(Uuid::new_v4(), Uuid::new_v4(), draft(None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn invalid_draft_reports_every_field() {
        let store = Arc::new(MemoryMissionStore::new());
        let owner = Uuid::new_v4();
        let mission_id = seed_mission(&store, owner).await;
        let (pipeline, _) = pipeline(Arc::clone(&store), Arc::new(FailingAnalyzer));

        let err = pipeline
            .ingest(mission_id, owner, TelemetryDraft::default())
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(
                    names,
                    ["position", "altitude", "speed", "batteryLevel", "heading"]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
