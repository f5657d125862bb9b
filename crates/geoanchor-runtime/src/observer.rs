//! [`ObserverState`] – everything the pipeline knows about the observer.
//!
//! Each field has exactly one writer:
//!
//! | Field | Written by |
//! |---|---|
//! | `location` | location fix / failure callbacks |
//! | current heading | compass callback |
//! | reference heading | tracking callback, via [`HeadingNormalizer::latch`] |

use geoanchor_perception::heading::{HeadingNormalizer, LatchOutcome};
use geoanchor_types::{CompassReading, GeoCoordinate, TrackingState};
use serde::Serialize;
use tracing::debug;

/// Mutable observer state owned by one session.
#[derive(Debug, Clone, Default)]
pub struct ObserverState {
    location: Option<GeoCoordinate>,
    heading: HeadingNormalizer,
}

/// Plain-data copy of [`ObserverState`] for display and logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObserverSnapshot {
    pub location: Option<GeoCoordinate>,
    pub heading_degrees: Option<f64>,
    pub reference_heading_degrees: Option<f64>,
}

impl ObserverState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new fix replaces the previous location.
    pub fn apply_fix(&mut self, coordinate: GeoCoordinate) {
        self.location = Some(coordinate);
    }

    /// A failed fix forgets the location so no stale placements are drawn.
    pub fn clear_location(&mut self) {
        self.location = None;
    }

    pub fn apply_compass(&mut self, reading: CompassReading) {
        self.heading.update_heading(reading.heading_degrees);
    }

    /// React to a tracking update. Only [`TrackingState::Normal`] attempts a
    /// latch; other states return `None`.
    pub fn on_tracking(&mut self, state: TrackingState) -> Option<LatchOutcome> {
        match state {
            TrackingState::Normal => Some(self.heading.latch()),
            other => {
                debug!(state = ?other, "tracking not normal; latch not attempted");
                None
            }
        }
    }

    pub fn location(&self) -> Option<&GeoCoordinate> {
        self.location.as_ref()
    }

    pub fn heading_degrees(&self) -> Option<f64> {
        self.heading.current_heading()
    }

    pub fn reference_heading_degrees(&self) -> Option<f64> {
        self.heading.reference_heading()
    }

    pub fn snapshot(&self) -> ObserverSnapshot {
        ObserverSnapshot {
            location: self.location,
            heading_degrees: self.heading_degrees(),
            reference_heading_degrees: self.reference_heading_degrees(),
        }
    }
}
