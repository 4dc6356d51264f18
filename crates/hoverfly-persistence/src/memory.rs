//! In-memory mission store.
//!
//! Reference backend used by tests and local development. Mission
//! documents and the two append-only logs live in separate maps, all
//! guarded by a single async `RwLock`: appends take the write guard, so
//! an append plus its analytics delta is one critical section and
//! concurrent ingestions for the same mission cannot lose samples.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::store::MissionStore;
use hoverfly_domain::{
    Mission, MissionAnalytics, MissionDraft, MissionFilter, MissionPatch, PageRequest,
    StoredSample, TelemetrySample, Threat, ThreatStatus,
};

#[derive(Default)]
struct Inner {
    missions: HashMap<Uuid, Mission>,
    /// Telemetry logs keyed by mission id; index in the vec is the
    /// sample's sequence number.
    telemetry: HashMap<Uuid, Vec<StoredSample>>,
    threats: HashMap<Uuid, Vec<Threat>>,
}

impl Inner {
    fn owned(&self, id: Uuid, owner_id: Uuid) -> Option<&Mission> {
        self.missions.get(&id).filter(|m| m.operator_id == owner_id)
    }

    fn owned_mut(&mut self, id: Uuid, owner_id: Uuid) -> Option<&mut Mission> {
        self.missions
            .get_mut(&id)
            .filter(|m| m.operator_id == owner_id)
    }
}

/// In-memory `MissionStore` backend.
#[derive(Default)]
pub struct MemoryMissionStore {
    inner: RwLock<Inner>,
}

impl MemoryMissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MissionStore for MemoryMissionStore {
    async fn create(&self, draft: MissionDraft, owner_id: Uuid) -> Result<Mission> {
        let mission = Mission::from_draft(draft, owner_id, Utc::now())?;

        let mut inner = self.inner.write().await;
        inner.telemetry.insert(mission.id, Vec::new());
        inner.threats.insert(mission.id, Vec::new());
        inner.missions.insert(mission.id, mission.clone());

        tracing::info!(mission_id = %mission.id, name = %mission.name, "mission created");
        Ok(mission)
    }

    async fn get_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Mission>> {
        let inner = self.inner.read().await;
        Ok(inner.owned(id, owner_id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        filter: MissionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Mission>, u64)> {
        let inner = self.inner.read().await;

        let mut matching: Vec<&Mission> = inner
            .missions
            .values()
            .filter(|m| m.operator_id == owner_id && filter.matches(m))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: MissionPatch,
    ) -> Result<Option<Mission>> {
        patch.validate()?;

        let mut inner = self.inner.write().await;
        let Some(mission) = inner.owned_mut(id, owner_id) else {
            return Ok(None);
        };
        patch.apply(mission, Utc::now());
        Ok(Some(mission.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.owned(id, owner_id).is_none() {
            return Ok(false);
        }
        inner.missions.remove(&id);
        inner.telemetry.remove(&id);
        inner.threats.remove(&id);
        tracing::info!(mission_id = %id, "mission deleted");
        Ok(true)
    }

    async fn append_telemetry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        sample: TelemetrySample,
    ) -> Result<Option<(StoredSample, MissionAnalytics)>> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let Some(mission) = inner
            .missions
            .get_mut(&id)
            .filter(|m| m.operator_id == owner_id)
        else {
            return Ok(None);
        };

        let log = inner.telemetry.entry(id).or_default();
        let stored = StoredSample {
            sequence: log.len() as u64,
            sample,
        };
        log.push(stored.clone());

        // Analytics delta, same critical section as the append.
        mission.analytics.total_flight_time += 1;
        if stored.sample.image_url.is_some() {
            mission.analytics.images_captures += 1;
        }
        if stored.sample.video_url.is_some() {
            mission.analytics.videos_recorded += 1;
        }
        mission.updated_at = Utc::now();

        Ok(Some((stored, mission.analytics.clone())))
    }

    async fn append_threats(
        &self,
        id: Uuid,
        owner_id: Uuid,
        threats: Vec<Threat>,
    ) -> Result<Option<()>> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let Some(mission) = inner
            .missions
            .get_mut(&id)
            .filter(|m| m.operator_id == owner_id)
        else {
            return Ok(None);
        };

        let count = threats.len() as u64;
        inner.threats.entry(id).or_default().extend(threats);

        mission.analytics.threats_detected += count;
        mission.updated_at = Utc::now();

        if count > 0 {
            tracing::info!(mission_id = %id, count, "threats appended");
        }
        Ok(Some(()))
    }

    async fn update_threat_status(
        &self,
        mission_id: Uuid,
        owner_id: Uuid,
        threat_id: Uuid,
        status: ThreatStatus,
        action_taken: Option<String>,
    ) -> Result<Option<Threat>> {
        let mut inner = self.inner.write().await;
        if inner.owned(mission_id, owner_id).is_none() {
            return Ok(None);
        }

        let Some(threat) = inner
            .threats
            .get_mut(&mission_id)
            .and_then(|log| log.iter_mut().find(|t| t.id == threat_id))
        else {
            return Ok(None);
        };

        threat.status = status;
        if action_taken.is_some() {
            threat.action_taken = action_taken;
        }
        if status == ThreatStatus::Resolved {
            threat.resolved_at = Some(Utc::now());
        }

        Ok(Some(threat.clone()))
    }

    async fn telemetry_log(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Vec<StoredSample>>> {
        let inner = self.inner.read().await;
        if inner.owned(id, owner_id).is_none() {
            return Ok(None);
        }
        Ok(Some(inner.telemetry.get(&id).cloned().unwrap_or_default()))
    }

    async fn recent_telemetry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        window: usize,
    ) -> Result<Option<Vec<StoredSample>>> {
        let inner = self.inner.read().await;
        if inner.owned(id, owner_id).is_none() {
            return Ok(None);
        }
        let log = inner.telemetry.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        let start = log.len().saturating_sub(window);
        Ok(Some(log[start..].to_vec()))
    }

    async fn threat_log(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Vec<Threat>>> {
        let inner = self.inner.read().await;
        if inner.owned(id, owner_id).is_none() {
            return Ok(None);
        }
        Ok(Some(inner.threats.get(&id).cloned().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoverfly_domain::{
        Coordinate, MissionStatus, MissionType, ScheduleDraft, TelemetryDraft, ThreatSeverity,
        ThreatType,
    };
    use std::sync::Arc;

    fn draft(name: &str) -> MissionDraft {
        MissionDraft {
            name: Some(name.to_string()),
            mission_type: Some(MissionType::CropMonitoring),
            schedule: Some(ScheduleDraft {
                start_time: Some(Utc::now() + chrono::Duration::hours(1)),
                ..ScheduleDraft::default()
            }),
            ..MissionDraft::default()
        }
    }

    fn sample() -> TelemetrySample {
        TelemetrySample::from_draft(
            TelemetryDraft {
                position: Some(Coordinate::new(10.0, 20.0)),
                altitude: Some(50.0),
                speed: Some(5.0),
                battery_level: Some(90.0),
                heading: Some(180.0),
                ..TelemetryDraft::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_rejects_invalid_draft() {
        let store = MemoryMissionStore::new();
        let err = store
            .create(MissionDraft::default(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::PersistenceError::Domain(hoverfly_domain::DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn ownership_is_a_hard_filter() {
        let store = MemoryMissionStore::new();
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();
        let mission = store.create(draft("Field Scan"), owner_b).await.unwrap();

        // Reads, writes and deletes under the wrong owner all behave as
        // if the mission does not exist.
        assert!(store.get_by_id(mission.id, owner_a).await.unwrap().is_none());
        assert!(
            store
                .update(mission.id, owner_a, MissionPatch::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.delete(mission.id, owner_a).await.unwrap());
        assert!(
            store
                .append_telemetry(mission.id, owner_a, sample())
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.get_by_id(mission.id, owner_b).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn append_grows_log_by_one_and_ticks_flight_time() {
        let store = MemoryMissionStore::new();
        let owner = Uuid::new_v4();
        let mission = store.create(draft("Field Scan"), owner).await.unwrap();

        let (stored, analytics) = store
            .append_telemetry(mission.id, owner, sample())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.sequence, 0);
        assert_eq!(analytics.total_flight_time, 1);
        assert_eq!(analytics.images_captures, 0);
        assert_eq!(
            store.telemetry_log(mission.id, owner).await.unwrap().unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn media_counters_track_attached_urls() {
        let store = MemoryMissionStore::new();
        let owner = Uuid::new_v4();
        let mission = store.create(draft("Field Scan"), owner).await.unwrap();

        let mut with_image = sample();
        with_image.image_url = Some("https://img.example/1.jpg".to_string());
        let mut with_video = sample();
        with_video.video_url = Some("https://vid.example/1.mp4".to_string());

        store.append_telemetry(mission.id, owner, with_image).await.unwrap();
        let (_, analytics) = store
            .append_telemetry(mission.id, owner, with_video)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(analytics.total_flight_time, 2);
        assert_eq!(analytics.images_captures, 1);
        assert_eq!(analytics.videos_recorded, 1);
    }

    #[tokio::test]
    async fn concurrent_appends_lose_nothing() {
        let store = Arc::new(MemoryMissionStore::new());
        let owner = Uuid::new_v4();
        let mission = store.create(draft("Busy Mission"), owner).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            let id = mission.id;
            handles.push(tokio::spawn(async move {
                store.append_telemetry(id, owner, sample()).await.unwrap().unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let log = store.telemetry_log(mission.id, owner).await.unwrap().unwrap();
        assert_eq!(log.len(), 32);

        // Every sequence number appears exactly once.
        let mut seqs: Vec<u64> = log.iter().map(|s| s.sequence).collect();
        seqs.sort_unstable();
        assert_eq!(seqs, (0..32).collect::<Vec<u64>>());

        let mission = store.get_by_id(mission.id, owner).await.unwrap().unwrap();
        assert_eq!(mission.analytics.total_flight_time, 32);
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paginated() {
        let store = MemoryMissionStore::new();
        let owner = Uuid::new_v4();
        for i in 0..15 {
            store.create(draft(&format!("Mission {i:02}")), owner).await.unwrap();
        }
        // A foreign mission never shows up in the listing.
        store.create(draft("Other"), Uuid::new_v4()).await.unwrap();

        let (page1, total) = store
            .list_by_owner(owner, MissionFilter::default(), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(total, 15);
        assert_eq!(page1.len(), 10);

        let (page2, _) = store
            .list_by_owner(owner, MissionFilter::default(), PageRequest::new(2, 10))
            .await
            .unwrap();
        assert_eq!(page2.len(), 5);

        // Newest first across the page boundary.
        assert!(page1.last().unwrap().created_at >= page2.first().unwrap().created_at);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = MemoryMissionStore::new();
        let owner = Uuid::new_v4();
        let mission = store.create(draft("Active One"), owner).await.unwrap();
        store.create(draft("Planned One"), owner).await.unwrap();

        let patch = MissionPatch {
            status: Some(MissionStatus::Active),
            ..MissionPatch::default()
        };
        store.update(mission.id, owner, patch).await.unwrap().unwrap();

        let filter = MissionFilter {
            status: Some(MissionStatus::Active),
            mission_type: None,
        };
        let (items, total) = store
            .list_by_owner(owner, filter, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "Active One");
    }

    #[tokio::test]
    async fn resolving_a_threat_stamps_resolved_at() {
        let store = MemoryMissionStore::new();
        let owner = Uuid::new_v4();
        let mission = store.create(draft("Field Scan"), owner).await.unwrap();

        let detected_at = Utc::now();
        let threat = Threat::detected(
            ThreatType::Pest,
            ThreatSeverity::High,
            Coordinate::new(1.0, 2.0),
            0.9,
            None,
            detected_at,
        );
        let threat_id = threat.id;
        store
            .append_threats(mission.id, owner, vec![threat])
            .await
            .unwrap()
            .unwrap();

        let updated = store
            .update_threat_status(
                mission.id,
                owner,
                threat_id,
                ThreatStatus::Resolved,
                Some("sprayed perimeter".to_string()),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, ThreatStatus::Resolved);
        assert_eq!(updated.action_taken.as_deref(), Some("sprayed perimeter"));
        assert!(updated.resolved_at.unwrap() >= detected_at);

        let mission = store.get_by_id(mission.id, owner).await.unwrap().unwrap();
        assert_eq!(mission.analytics.threats_detected, 1);
    }

    #[tokio::test]
    async fn unknown_threat_id_is_not_found() {
        let store = MemoryMissionStore::new();
        let owner = Uuid::new_v4();
        let mission = store.create(draft("Field Scan"), owner).await.unwrap();

        let result = store
            .update_threat_status(mission.id, owner, Uuid::new_v4(), ThreatStatus::Confirmed, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn recent_window_returns_tail_in_order() {
        let store = MemoryMissionStore::new();
        let owner = Uuid::new_v4();
        let mission = store.create(draft("Field Scan"), owner).await.unwrap();

        for _ in 0..5 {
            store.append_telemetry(mission.id, owner, sample()).await.unwrap();
        }

        let recent = store
            .recent_telemetry(mission.id, owner, 3)
            .await
            .unwrap()
            .unwrap();
        let seqs: Vec<u64> = recent.iter().map(|s| s.sequence).collect();
        assert_eq!(seqs, [2, 3, 4]);

        // Window larger than the log returns everything.
        let all = store
            .recent_telemetry(mission.id, owner, 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn delete_removes_document_and_logs() {
        let store = MemoryMissionStore::new();
        let owner = Uuid::new_v4();
        let mission = store.create(draft("Field Scan"), owner).await.unwrap();
        store.append_telemetry(mission.id, owner, sample()).await.unwrap();

        assert!(store.delete(mission.id, owner).await.unwrap());
        assert!(store.get_by_id(mission.id, owner).await.unwrap().is_none());
        assert!(store.telemetry_log(mission.id, owner).await.unwrap().is_none());
        assert!(!store.delete(mission.id, owner).await.unwrap());
    }
}
