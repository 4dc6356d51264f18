//! # Hoverfly Mission Tracking - Domain Model
//!
//! Core domain entities, value objects, and enums for drone mission
//! operations. These types are the single source of truth across all
//! layers: persistence, API, and the simulator.
//!
//! Wire format is camelCase JSON with snake_case enum strings, matching
//! the public API contract (`imagesCaptures`, `crop_monitoring`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// Geographic coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are real numbers (no NaN/infinity).
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Operational area for a mission.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub polygon: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Coordinate>,
    /// Total area in hectares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_area: Option<f64>,
}

/// Recurrence rule for scheduled missions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurring {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<RecurrenceFrequency>,
    /// Days of week, 0 = Sunday.
    #[serde(default)]
    pub days: Vec<u8>,
}

/// Mission schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Planned duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default)]
    pub recurring: Recurring,
}

/// Flight parameters for the assigned drone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightParams {
    #[serde(default = "FlightParams::default_altitude")]
    pub altitude: f64,
    #[serde(default = "FlightParams::default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub pattern: FlightPattern,
    /// Image overlap percentage.
    #[serde(default = "FlightParams::default_overlap")]
    pub overlap: f64,
}

impl FlightParams {
    fn default_altitude() -> f64 {
        50.0
    }

    fn default_speed() -> f64 {
        10.0
    }

    fn default_overlap() -> f64 {
        70.0
    }
}

impl Default for FlightParams {
    fn default() -> Self {
        Self {
            altitude: Self::default_altitude(),
            speed: Self::default_speed(),
            pattern: FlightPattern::default(),
            overlap: Self::default_overlap(),
        }
    }
}

/// Drone assignment for a mission.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub flight_params: FlightParams,
}

// =============================================================================
// ENUMS
// =============================================================================

/// Mission types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    Surveillance,
    CropMonitoring,
    Mapping,
    Inspection,
    Emergency,
}

impl MissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Surveillance => "surveillance",
            Self::CropMonitoring => "crop_monitoring",
            Self::Mapping => "mapping",
            Self::Inspection => "inspection",
            Self::Emergency => "emergency",
        }
    }
}

/// Mission lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Planned,
    Active,
    Paused,
    Completed,
    Cancelled,
    Failed,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

/// Mission priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Flight pattern over the mission area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightPattern {
    #[default]
    Grid,
    Spiral,
    Perimeter,
    Custom,
}

/// Recurrence frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
}

/// Threat categories detectable from aerial imagery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    Pest,
    Disease,
    Weed,
    IrrigationIssue,
    EquipmentFailure,
    Wildlife,
}

impl ThreatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pest => "pest",
            Self::Disease => "disease",
            Self::Weed => "weed",
            Self::IrrigationIssue => "irrigation_issue",
            Self::EquipmentFailure => "equipment_failure",
            Self::Wildlife => "wildlife",
        }
    }
}

/// Threat severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Threat resolution lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatStatus {
    #[default]
    Detected,
    Investigating,
    Confirmed,
    Resolved,
    FalsePositive,
}

// =============================================================================
// TELEMETRY
// =============================================================================

/// Camera sensor sub-readings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSensor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_mode: Option<String>,
}

/// GPS sensor sub-readings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsSensor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satellites: Option<u32>,
}

/// Inertial measurement sub-readings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImuSensor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
}

/// Structured sensor sub-readings attached to a telemetry sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorData {
    #[serde(default)]
    pub camera: CameraSensor,
    #[serde(default)]
    pub gps: GpsSensor,
    #[serde(default)]
    pub imu: ImuSensor,
}

/// Structured summary of an external image-analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysis {
    pub summary: String,
    pub findings: Vec<String>,
    pub confidence: f64,
    pub recommendations: Vec<String>,
    pub mission_type: MissionType,
    pub timestamp: DateTime<Utc>,
}

/// One timestamped drone state reading, immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub timestamp: DateTime<Utc>,
    pub position: Coordinate,
    pub altitude: f64,
    pub speed: f64,
    pub battery_level: f64,
    pub heading: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_data: Option<SensorData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ImageAnalysis>,
}

/// Client-submitted telemetry payload before validation and stamping.
///
/// Required fields are `Option` so validation can report every missing
/// or malformed field in one pass rather than failing on the first.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryDraft {
    #[serde(default)]
    pub position: Option<Coordinate>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub battery_level: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub sensor_data: Option<SensorData>,
}

impl TelemetrySample {
    /// Validate a client draft and stamp it with the server clock.
    ///
    /// A client-supplied timestamp is never trusted; `now` always wins.
    pub fn from_draft(draft: TelemetryDraft, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut errors = Vec::new();

        match draft.position {
            None => errors.push(FieldError::missing("position")),
            Some(p) if !p.is_finite() => {
                errors.push(FieldError::invalid("position", "lat/lng must be finite numbers"));
            }
            Some(_) => {}
        }

        for (field, value) in [
            ("altitude", draft.altitude),
            ("speed", draft.speed),
            ("batteryLevel", draft.battery_level),
            ("heading", draft.heading),
        ] {
            match value {
                None => errors.push(FieldError::missing(field)),
                Some(v) if !v.is_finite() => {
                    errors.push(FieldError::invalid(field, "must be a finite number"));
                }
                Some(_) => {}
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        Ok(Self {
            timestamp: now,
            position: draft.position.unwrap(),
            altitude: draft.altitude.unwrap(),
            speed: draft.speed.unwrap(),
            battery_level: draft.battery_level.unwrap(),
            heading: draft.heading.unwrap(),
            temperature: draft.temperature,
            humidity: draft.humidity,
            wind_speed: draft.wind_speed,
            wind_direction: draft.wind_direction,
            image_url: draft.image_url,
            video_url: draft.video_url,
            sensor_data: draft.sensor_data,
            analysis: None,
        })
    }
}

/// A telemetry sample as persisted, carrying its append-order index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSample {
    /// Per-mission append sequence number, starting at 0.
    pub sequence: u64,
    #[serde(flatten)]
    pub sample: TelemetrySample,
}

// =============================================================================
// THREATS
// =============================================================================

/// A detected anomaly tied to a position, with its own resolution
/// lifecycle. Immutable once appended except `status`, `action_taken`
/// and `resolved_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threat {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub threat_type: ThreatType,
    pub severity: ThreatSeverity,
    pub position: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub confidence: f64,
    pub detected_at: DateTime<Utc>,
    pub status: ThreatStatus,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Threat {
    /// Build a freshly detected threat. Confidence is clamped to [0, 1].
    pub fn detected(
        threat_type: ThreatType,
        severity: ThreatSeverity,
        position: Coordinate,
        confidence: f64,
        description: Option<String>,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            threat_type,
            severity,
            position,
            description,
            confidence: confidence.clamp(0.0, 1.0),
            detected_at,
            status: ThreatStatus::Detected,
            images: Vec::new(),
            action_taken: None,
            resolved_at: None,
        }
    }
}

// =============================================================================
// ANALYTICS
// =============================================================================

/// Incrementally maintained per-mission summary counters.
///
/// The counters are updated exactly once per qualifying ingestion event
/// and are never recomputed by rescanning the logs on the hot path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionAnalytics {
    /// One tick per ingested sample, assuming uniform sampling intervals.
    pub total_flight_time: u64,
    pub distance_covered: f64,
    pub images_captures: u64,
    pub videos_recorded: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_health_score: Option<f64>,
    pub threats_detected: u64,
    pub areas_analyzed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_used: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
}

// =============================================================================
// MISSION ENTITY
// =============================================================================

/// A scheduled drone operation over a defined area, owned by one operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: Uuid,
    pub operator_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: MissionStatus,
    pub priority: MissionPriority,
    #[serde(rename = "type")]
    pub mission_type: MissionType,
    #[serde(default)]
    pub area: Area,
    pub schedule: Schedule,
    #[serde(default)]
    pub drone: DroneAssignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub analytics: MissionAnalytics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-submitted mission draft. Required fields are `Option` for
/// exhaustive validation reporting.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub mission_type: Option<MissionType>,
    #[serde(default)]
    pub priority: Option<MissionPriority>,
    #[serde(default)]
    pub area: Option<Area>,
    #[serde(default)]
    pub schedule: Option<ScheduleDraft>,
    #[serde(default)]
    pub drone: Option<DroneAssignment>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Schedule as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub recurring: Option<Recurring>,
}

/// Mission name length bounds.
pub const NAME_MIN: usize = 3;
pub const NAME_MAX: usize = 100;

fn validate_name(name: &str) -> Result<String, FieldError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if length < NAME_MIN || length > NAME_MAX {
        return Err(FieldError::invalid(
            "name",
            "must be between 3 and 100 characters",
        ));
    }
    Ok(trimmed.to_string())
}

impl Mission {
    /// Validate a draft and build a new mission owned by `operator_id`.
    ///
    /// New missions always start as `planned` with all-zero analytics
    /// and empty telemetry/threat logs.
    pub fn from_draft(draft: MissionDraft, operator_id: Uuid, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut errors = Vec::new();

        let name = match draft.name.as_deref() {
            None => {
                errors.push(FieldError::missing("name"));
                None
            }
            Some(raw) => match validate_name(raw) {
                Ok(n) => Some(n),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
        };

        if draft.mission_type.is_none() {
            errors.push(FieldError::missing("type"));
        }

        let start_time = match draft.schedule.as_ref().and_then(|s| s.start_time) {
            Some(t) => Some(t),
            None => {
                errors.push(FieldError::missing("schedule.startTime"));
                None
            }
        };

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let schedule_draft = draft.schedule.unwrap_or_default();
        Ok(Self {
            id: Uuid::new_v4(),
            operator_id,
            name: name.unwrap(),
            description: draft.description,
            status: MissionStatus::Planned,
            priority: draft.priority.unwrap_or_default(),
            mission_type: draft.mission_type.unwrap(),
            area: draft.area.unwrap_or_default(),
            schedule: Schedule {
                start_time: start_time.unwrap(),
                end_time: schedule_draft.end_time,
                duration: schedule_draft.duration,
                recurring: schedule_draft.recurring.unwrap_or_default(),
            },
            drone: draft.drone.unwrap_or_default(),
            notes: draft.notes,
            tags: draft.tags.unwrap_or_default(),
            analytics: MissionAnalytics::default(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Shallow patch of mutable mission fields. Absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<MissionStatus>,
    #[serde(default)]
    pub priority: Option<MissionPriority>,
    #[serde(default)]
    pub schedule: Option<ScheduleDraft>,
    #[serde(default)]
    pub drone: Option<DroneAssignment>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl MissionPatch {
    /// Validate patch fields without applying them.
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = Vec::new();
        if let Some(name) = self.name.as_deref() {
            if let Err(e) = validate_name(name) {
                errors.push(e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Apply the patch in place and bump `updated_at`.
    pub fn apply(self, mission: &mut Mission, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            mission.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            mission.description = Some(description);
        }
        if let Some(status) = self.status {
            mission.status = status;
        }
        if let Some(priority) = self.priority {
            mission.priority = priority;
        }
        if let Some(schedule) = self.schedule {
            if let Some(start_time) = schedule.start_time {
                mission.schedule.start_time = start_time;
            }
            if schedule.end_time.is_some() {
                mission.schedule.end_time = schedule.end_time;
            }
            if schedule.duration.is_some() {
                mission.schedule.duration = schedule.duration;
            }
            if let Some(recurring) = schedule.recurring {
                mission.schedule.recurring = recurring;
            }
        }
        if let Some(drone) = self.drone {
            mission.drone = drone;
        }
        if let Some(notes) = self.notes {
            mission.notes = Some(notes);
        }
        if let Some(tags) = self.tags {
            mission.tags = tags;
        }
        mission.updated_at = now;
    }
}

// =============================================================================
// QUERY/FILTER TYPES
// =============================================================================

/// Optional filters for mission listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct MissionFilter {
    #[serde(default)]
    pub status: Option<MissionStatus>,
    #[serde(rename = "type", default)]
    pub mission_type: Option<MissionType>,
}

impl MissionFilter {
    #[must_use]
    pub fn matches(&self, mission: &Mission) -> bool {
        self.status.is_none_or(|s| mission.status == s)
            && self.mission_type.is_none_or(|t| mission.mission_type == t)
    }
}

/// 1-based page request; page size is clamped to [1, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub const MAX_LIMIT: u64 = 100;

    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Offset of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// Pagination metadata returned alongside a page of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
}

impl PageInfo {
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        Self {
            current_page: request.page,
            total_pages: total_items.div_ceil(request.limit),
            total_items,
            items_per_page: request.limit,
        }
    }
}

/// Tally of threats by category.
pub type ThreatTally = HashMap<ThreatType, u64>;

// =============================================================================
// ERRORS
// =============================================================================

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: "is required".to_string(),
        }
    }

    pub fn invalid(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Domain-level errors.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
}

pub type DomainResult<T> = Result<T, DomainError>;
