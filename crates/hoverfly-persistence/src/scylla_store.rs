//! ScyllaDB mission store implementation.
//!
//! Mission documents are stored as JSON text keyed by `(owner_id, id)`
//! with a `version` column; the telemetry and threat logs live in their
//! own tables partitioned by mission id and clustered by sequence
//! number, so appends never rewrite the mission document. Sequence
//! numbers are claimed with a lightweight transaction
//! (`INSERT ... IF NOT EXISTS`), and document writes that carry counter
//! increments are conditioned on the loaded `version`; both retry on
//! contention so concurrent appends to one mission never lose a tick.

use async_trait::async_trait;
use chrono::Utc;
use scylla::frame::response::result::Row;
use scylla::{QueryResult, Session, SessionBuilder};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{PersistenceError, Result};
use crate::store::MissionStore;
use hoverfly_domain::{
    Mission, MissionAnalytics, MissionDraft, MissionFilter, MissionPatch, PageRequest,
    StoredSample, TelemetrySample, Threat, ThreatStatus,
};

/// Retries for a contended sequence claim or conditional document save
/// before giving up.
const APPEND_RETRIES: usize = 8;

fn scylla_err<E: std::fmt::Display>(err: E) -> PersistenceError {
    PersistenceError::Scylla(err.to_string())
}

/// Read the `[applied]` column of a conditional-write result.
fn lwt_applied(result: QueryResult) -> Result<bool> {
    let applied = result
        .into_rows_result()
        .map_err(scylla_err)?
        .maybe_first_row::<Row>()
        .map_err(scylla_err)?
        .and_then(|row| row.columns.into_iter().next().flatten())
        .and_then(|value| value.as_boolean())
        .unwrap_or(true);
    Ok(applied)
}

// =============================================================================
// SCYLLA CONFIGURATION
// =============================================================================

/// ScyllaDB connection configuration.
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:9042".to_string()],
            keyspace: "hoverfly".to_string(),
            username: None,
            password: None,
        }
    }
}

// =============================================================================
// SCYLLA CLIENT
// =============================================================================

/// ScyllaDB client wrapper.
pub struct ScyllaClient {
    session: Arc<Session>,
    pub config: ScyllaConfig,
}

impl ScyllaClient {
    /// Create a new ScyllaDB client.
    pub async fn new(config: ScyllaConfig) -> Result<Self> {
        let mut builder = SessionBuilder::new().known_nodes(&config.hosts);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.user(user, pass);
        }

        let session = builder.build().await?;

        // Use keyspace
        session
            .query_unpaged(format!("USE {}", config.keyspace), ())
            .await?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    /// Get session reference.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

// =============================================================================
// MISSION STORE
// =============================================================================

/// ScyllaDB-backed `MissionStore`.
pub struct ScyllaMissionStore {
    client: Arc<ScyllaClient>,
}

impl ScyllaMissionStore {
    pub fn new(client: Arc<ScyllaClient>) -> Self {
        Self { client }
    }

    async fn load_versioned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<(Mission, i64)>> {
        let query = "SELECT doc, version FROM missions WHERE owner_id = ? AND id = ?";
        let result = self
            .client
            .session
            .query_unpaged(query, (owner_id, id))
            .await?;

        let row = result
            .into_rows_result()
            .map_err(scylla_err)?
            .maybe_first_row::<(String, i64)>()
            .map_err(scylla_err)?;

        match row {
            Some((doc, version)) => Ok(Some((serde_json::from_str(&doc)?, version))),
            None => Ok(None),
        }
    }

    async fn load_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Mission>> {
        Ok(self
            .load_versioned(id, owner_id)
            .await?
            .map(|(mission, _)| mission))
    }

    async fn save_new(&self, mission: &Mission) -> Result<()> {
        let doc = serde_json::to_string(mission)?;
        let query =
            "INSERT INTO missions (owner_id, id, created_at, doc, version) VALUES (?, ?, ?, ?, 0)";
        self.client
            .session
            .query_unpaged(query, (mission.operator_id, mission.id, mission.created_at, doc))
            .await?;
        Ok(())
    }

    /// Save the document only if its stored version is still `expected`.
    async fn save_if_version(&self, mission: &Mission, expected: i64) -> Result<bool> {
        let doc = serde_json::to_string(mission)?;
        let query =
            "UPDATE missions SET doc = ?, version = ? WHERE owner_id = ? AND id = ? IF version = ?";
        let result = self
            .client
            .session
            .query_unpaged(
                query,
                (doc, expected + 1, mission.operator_id, mission.id, expected),
            )
            .await?;
        lwt_applied(result)
    }

    /// Load, mutate and conditionally save the mission document,
    /// retrying when a concurrent writer bumps the version first.
    async fn modify_owned<F>(&self, id: Uuid, owner_id: Uuid, mutate: F) -> Result<Option<Mission>>
    where
        F: Fn(&mut Mission),
    {
        for _ in 0..APPEND_RETRIES {
            let Some((mut mission, version)) = self.load_versioned(id, owner_id).await? else {
                return Ok(None);
            };
            mutate(&mut mission);
            mission.updated_at = Utc::now();
            if self.save_if_version(&mission, version).await? {
                return Ok(Some(mission));
            }
        }
        Err(PersistenceError::WriteConflict(format!(
            "version contention on mission {id}"
        )))
    }

    async fn next_sequence(&self, table: &str, mission_id: Uuid) -> Result<i64> {
        let query = format!(
            "SELECT seq FROM {table} WHERE mission_id = ? ORDER BY seq DESC LIMIT 1"
        );
        let result = self
            .client
            .session
            .query_unpaged(query, (mission_id,))
            .await?;

        let last = result
            .into_rows_result()
            .map_err(scylla_err)?
            .maybe_first_row::<(i64,)>()
            .map_err(scylla_err)?
            .map(|(seq,)| seq);

        Ok(last.map_or(0, |s| s + 1))
    }

    /// Claim the next free sequence slot with an LWT insert, retrying on
    /// contention from concurrent appends to the same mission.
    async fn append_row(&self, table: &str, mission_id: Uuid, doc: &str) -> Result<i64> {
        for _ in 0..APPEND_RETRIES {
            let seq = self.next_sequence(table, mission_id).await?;
            let query = format!(
                "INSERT INTO {table} (mission_id, seq, doc) VALUES (?, ?, ?) IF NOT EXISTS"
            );
            let result = self
                .client
                .session
                .query_unpaged(query, (mission_id, seq, doc))
                .await?;

            if lwt_applied(result)? {
                return Ok(seq);
            }
        }
        Err(PersistenceError::WriteConflict(format!(
            "sequence contention on {table} for mission {mission_id}"
        )))
    }

    async fn read_log<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        mission_id: Uuid,
    ) -> Result<Vec<T>> {
        let query = format!("SELECT doc FROM {table} WHERE mission_id = ? ORDER BY seq ASC");
        let result = self
            .client
            .session
            .query_unpaged(query, (mission_id,))
            .await?;

        let rows = result.into_rows_result().map_err(scylla_err)?;
        let mut entries = Vec::new();
        for row in rows.rows::<(String,)>().map_err(scylla_err)? {
            let (doc,) = row.map_err(scylla_err)?;
            entries.push(serde_json::from_str(&doc)?);
        }
        Ok(entries)
    }
}

#[async_trait]
impl MissionStore for ScyllaMissionStore {
    async fn create(&self, draft: MissionDraft, owner_id: Uuid) -> Result<Mission> {
        let mission = Mission::from_draft(draft, owner_id, Utc::now())?;
        self.save_new(&mission).await?;
        tracing::info!(mission_id = %mission.id, name = %mission.name, "mission created");
        Ok(mission)
    }

    async fn get_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Mission>> {
        self.load_owned(id, owner_id).await
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        filter: MissionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Mission>, u64)> {
        // Status/type filtering and the created-at sort happen here
        // since both are document fields.
        let query = "SELECT doc FROM missions WHERE owner_id = ?";
        let result = self
            .client
            .session
            .query_unpaged(query, (owner_id,))
            .await?;

        let rows = result.into_rows_result().map_err(scylla_err)?;
        let mut matching = Vec::new();
        for row in rows.rows::<(String,)>().map_err(scylla_err)? {
            let (doc,) = row.map_err(scylla_err)?;
            let mission: Mission = serde_json::from_str(&doc)?;
            if filter.matches(&mission) {
                matching.push(mission);
            }
        }
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
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
        self.modify_owned(id, owner_id, move |mission| {
            patch.clone().apply(mission, Utc::now());
        })
        .await
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        if self.load_owned(id, owner_id).await?.is_none() {
            return Ok(false);
        }
        self.client
            .session
            .query_unpaged("DELETE FROM missions WHERE owner_id = ? AND id = ?", (owner_id, id))
            .await?;
        self.client
            .session
            .query_unpaged("DELETE FROM telemetry WHERE mission_id = ?", (id,))
            .await?;
        self.client
            .session
            .query_unpaged("DELETE FROM threats WHERE mission_id = ?", (id,))
            .await?;
        Ok(true)
    }

    async fn append_telemetry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        sample: TelemetrySample,
    ) -> Result<Option<(StoredSample, MissionAnalytics)>> {
        if self.load_owned(id, owner_id).await?.is_none() {
            return Ok(None);
        }

        let has_image = sample.image_url.is_some();
        let has_video = sample.video_url.is_some();

        // Claim the log slot first; the sequence is authoritative.
        let doc = serde_json::to_string(&sample)?;
        let seq = self.append_row("telemetry", id, &doc).await?;
        let stored = StoredSample {
            sequence: seq as u64,
            sample,
        };

        // Counter increments go through the version-checked save so a
        // concurrent append cannot overwrite this one's tick.
        let Some(mission) = self
            .modify_owned(id, owner_id, |mission| {
                mission.analytics.total_flight_time += 1;
                if has_image {
                    mission.analytics.images_captures += 1;
                }
                if has_video {
                    mission.analytics.videos_recorded += 1;
                }
            })
            .await?
        else {
            return Ok(None);
        };

        Ok(Some((stored, mission.analytics)))
    }

    async fn append_threats(
        &self,
        id: Uuid,
        owner_id: Uuid,
        threats: Vec<Threat>,
    ) -> Result<Option<()>> {
        if self.load_owned(id, owner_id).await?.is_none() {
            return Ok(None);
        }

        let count = threats.len() as u64;
        for threat in &threats {
            let doc = serde_json::to_string(threat)?;
            self.append_row("threats", id, &doc).await?;
        }

        let updated = self
            .modify_owned(id, owner_id, |mission| {
                mission.analytics.threats_detected += count;
            })
            .await?;
        Ok(updated.map(|_| ()))
    }

    async fn update_threat_status(
        &self,
        mission_id: Uuid,
        owner_id: Uuid,
        threat_id: Uuid,
        status: ThreatStatus,
        action_taken: Option<String>,
    ) -> Result<Option<Threat>> {
        if self.load_owned(mission_id, owner_id).await?.is_none() {
            return Ok(None);
        }

        let log: Vec<Threat> = self.read_log("threats", mission_id).await?;
        let Some((seq, mut threat)) = log
            .into_iter()
            .enumerate()
            .find(|(_, t)| t.id == threat_id)
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

        let doc = serde_json::to_string(&threat)?;
        self.client
            .session
            .query_unpaged(
                "UPDATE threats SET doc = ? WHERE mission_id = ? AND seq = ?",
                (doc, mission_id, seq as i64),
            )
            .await?;
        Ok(Some(threat))
    }

    async fn telemetry_log(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Vec<StoredSample>>> {
        if self.load_owned(id, owner_id).await?.is_none() {
            return Ok(None);
        }
        let samples: Vec<TelemetrySample> = self.read_log("telemetry", id).await?;
        Ok(Some(
            samples
                .into_iter()
                .enumerate()
                .map(|(i, sample)| StoredSample {
                    sequence: i as u64,
                    sample,
                })
                .collect(),
        ))
    }

    async fn recent_telemetry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        window: usize,
    ) -> Result<Option<Vec<StoredSample>>> {
        let Some(log) = self.telemetry_log(id, owner_id).await? else {
            return Ok(None);
        };
        let start = log.len().saturating_sub(window);
        Ok(Some(log[start..].to_vec()))
    }

    async fn threat_log(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Vec<Threat>>> {
        if self.load_owned(id, owner_id).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.read_log("threats", id).await?))
    }
}
