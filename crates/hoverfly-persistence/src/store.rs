//! # Mission Store Trait
//!
//! Abstract storage interface for missions and their append-only
//! telemetry/threat logs. Implementations can be swapped for different
//! backends (in-memory, ScyllaDB).
//!
//! Every operation is owner-scoped: a mission that exists but belongs to
//! a different operator behaves exactly like a mission that does not
//! exist, so callers cannot distinguish the two cases.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use hoverfly_domain::{
    Mission, MissionAnalytics, MissionDraft, MissionFilter, MissionPatch, PageRequest,
    StoredSample, TelemetrySample, Threat, ThreatStatus,
};

/// Durable keyed storage of mission documents with owner-scoped lookup
/// and append support for the nested telemetry/threat logs.
#[async_trait]
pub trait MissionStore: Send + Sync {
    /// Validate a draft and store a new mission owned by `owner_id`.
    ///
    /// Fails with a validation error if required fields are missing or
    /// malformed. The stored mission starts as `planned` with all-zero
    /// analytics and empty logs.
    async fn create(&self, draft: MissionDraft, owner_id: Uuid) -> Result<Mission>;

    /// Get a mission by id, only if it belongs to `owner_id`.
    async fn get_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Mission>>;

    /// List missions for an owner, newest first, with total count.
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        filter: MissionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Mission>, u64)>;

    /// Shallow-merge permitted fields into a mission.
    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: MissionPatch,
    ) -> Result<Option<Mission>>;

    /// Delete a mission and its logs. Returns true if it existed.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;

    /// Atomically append one telemetry sample and apply the analytics
    /// delta (+1 flight-time tick, media counters). Concurrent appends
    /// for the same mission must not lose samples.
    ///
    /// Returns the stored sample with its sequence number plus the
    /// post-append analytics snapshot, or `None` if the mission is not
    /// visible to `owner_id`.
    async fn append_telemetry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        sample: TelemetrySample,
    ) -> Result<Option<(StoredSample, MissionAnalytics)>>;

    /// Atomically append zero or more threat records and bump the
    /// `threatsDetected` counter.
    async fn append_threats(
        &self,
        id: Uuid,
        owner_id: Uuid,
        threats: Vec<Threat>,
    ) -> Result<Option<()>>;

    /// Transition a threat's status; `resolved` stamps `resolvedAt`.
    ///
    /// `None` if either the mission or the threat is not visible under
    /// that owner.
    async fn update_threat_status(
        &self,
        mission_id: Uuid,
        owner_id: Uuid,
        threat_id: Uuid,
        status: ThreatStatus,
        action_taken: Option<String>,
    ) -> Result<Option<Threat>>;

    /// Full telemetry log in append order.
    async fn telemetry_log(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Vec<StoredSample>>>;

    /// Last `window` telemetry samples in append order (fewer if the
    /// log is shorter).
    async fn recent_telemetry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        window: usize,
    ) -> Result<Option<Vec<StoredSample>>>;

    /// Full threat log in append order.
    async fn threat_log(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Vec<Threat>>>;
}
