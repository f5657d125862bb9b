use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An absolute position on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Build a coordinate, rejecting values outside latitude ∈ [-90, 90] and
    /// longitude ∈ [-180, 180] (including NaN and infinities).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let coordinate = Self::new_unchecked(latitude, longitude);
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Build a coordinate without range checks. Intended for compile-time
    /// landmark tables whose values are known to be valid.
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Flat-earth offset of a target from the observer, in whole meters.
///
/// `x` is east-positive. `z` is `observer.latitude - target.latitude` scaled to
/// meters, so a target to the north has a negative `z` (forward in a
/// right-handed, camera-looks-down-negative-z scene).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativeOffset {
    pub x: f64,
    pub z: f64,
}

impl RelativeOffset {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Horizontal distance to the target in meters.
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.z)
    }
}

/// Position of a marker in the observer-facing scene frame, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacementVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PlacementVector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// `[x, y, z]` in the order scene graphs usually expect.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// A fixed-location marker registered with the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Stable identifier, e.g. `"town_hall"`.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    pub coordinate: GeoCoordinate,
}

impl Landmark {
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinate: GeoCoordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate,
        }
    }
}

/// One entry handed to the renderer: where to draw a landmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPlacement {
    pub landmark_id: String,
    /// North-aligned offset the vector was derived from.
    pub offset: RelativeOffset,
    pub vector: PlacementVector,
}

/// Options forwarded to the location provider when a watch is started.
/// Missing fields take their [`Default`] values when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationOptions {
    pub high_accuracy: bool,
    /// Give up on a single fix after this many milliseconds.
    pub timeout_ms: u64,
    /// Accept a cached fix no older than this many milliseconds.
    pub maximum_age_ms: u64,
}

impl Default for LocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 15_000,
            maximum_age_ms: 10_000,
        }
    }
}

/// Outcome of a location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// A single compass sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompassReading {
    /// Bearing in degrees, 0 = north, clockwise.
    pub heading_degrees: f64,
    /// Provider-specific accuracy figure. Not used by the pipeline.
    pub accuracy: f64,
}

/// Coarse tracking quality reported by the AR session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Normal,
    Limited,
    Unavailable,
}

/// Why tracking is in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingReason {
    #[default]
    None,
    Initializing,
    ExcessiveMotion,
    InsufficientFeatures,
    InsufficientLight,
    Relocalizing,
}

/// Everything a sensor callback can deliver to the session queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum SensorEvent {
    LocationFix(GeoCoordinate),
    LocationFailed { code: i32, message: String },
    Compass(CompassReading),
    Tracking {
        state: TrackingState,
        reason: TrackingReason,
    },
}

/// Timestamped wrapper around a [`SensorEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Provider id, e.g. `"sim_gps"`.
    pub source: String,
    pub event: SensorEvent,
}

impl SensorEnvelope {
    pub fn new(source: impl Into<String>, event: SensorEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            event,
        }
    }
}

/// Error type shared by every GeoAnchor crate. None of these are fatal: each
/// one ends in "produce no placements" rather than a crash.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeoError {
    #[error("Observer location is not known yet")]
    MissingObserver,

    #[error("Location permission denied by {provider}")]
    PermissionDenied { provider: String },

    #[error("Sensor {sensor} unavailable: {details}")]
    SensorUnavailable { sensor: String, details: String },

    #[error("Invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Event queue error: {0}")]
    Channel(String),
}
