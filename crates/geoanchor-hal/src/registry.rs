//! [`SensorRegistry`] – the set of drivers a session runs against.
//!
//! Holds at most one provider of each kind plus the renderer. A missing slot
//! is not an error at construction time; it surfaces as
//! [`GeoError::SensorUnavailable`] when the session tries to start that
//! stream, which leaves the pipeline in its empty-output state.

use geoanchor_types::{GeoError, LandmarkPlacement};

use crate::compass::CompassProvider;
use crate::location::LocationProvider;
use crate::renderer::PlacementRenderer;
use crate::tracking::TrackingProvider;

/// Driver registry for one session.
#[derive(Default)]
pub struct SensorRegistry {
    location: Option<Box<dyn LocationProvider>>,
    compass: Option<Box<dyn CompassProvider>>,
    tracking: Option<Box<dyn TrackingProvider>>,
    renderer: Option<Box<dyn PlacementRenderer>>,
}

impl SensorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the location provider, replacing any previous one.
    pub fn register_location(&mut self, provider: Box<dyn LocationProvider>) {
        self.location = Some(provider);
    }

    /// Register the compass provider, replacing any previous one.
    pub fn register_compass(&mut self, provider: Box<dyn CompassProvider>) {
        self.compass = Some(provider);
    }

    /// Register the tracking provider, replacing any previous one.
    pub fn register_tracking(&mut self, provider: Box<dyn TrackingProvider>) {
        self.tracking = Some(provider);
    }

    /// Register the renderer, replacing any previous one.
    pub fn register_renderer(&mut self, renderer: Box<dyn PlacementRenderer>) {
        self.renderer = Some(renderer);
    }

    /// # Errors
    ///
    /// Returns [`GeoError::SensorUnavailable`] when no location provider is
    /// registered.
    pub fn location_mut(&mut self) -> Result<&mut dyn LocationProvider, GeoError> {
        match self.location.as_mut() {
            Some(p) => Ok(p.as_mut()),
            None => Err(not_registered("location")),
        }
    }

    /// # Errors
    ///
    /// Returns [`GeoError::SensorUnavailable`] when no compass is registered.
    pub fn compass_mut(&mut self) -> Result<&mut dyn CompassProvider, GeoError> {
        match self.compass.as_mut() {
            Some(p) => Ok(p.as_mut()),
            None => Err(not_registered("compass")),
        }
    }

    /// # Errors
    ///
    /// Returns [`GeoError::SensorUnavailable`] when no tracking provider is
    /// registered.
    pub fn tracking_mut(&mut self) -> Result<&mut dyn TrackingProvider, GeoError> {
        match self.tracking.as_mut() {
            Some(p) => Ok(p.as_mut()),
            None => Err(not_registered("tracking")),
        }
    }

    /// Hand `placements` to the renderer. Returns `false` if none is
    /// registered.
    pub fn render(&mut self, placements: &[LandmarkPlacement]) -> bool {
        match self.renderer.as_mut() {
            Some(r) => {
                r.render(placements);
                true
            }
            None => false,
        }
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("location", &self.location.as_ref().map(|p| p.id().to_string()))
            .field("compass", &self.compass.as_ref().map(|p| p.id().to_string()))
            .field("tracking", &self.tracking.as_ref().map(|p| p.id().to_string()))
            .field("renderer", &self.renderer.as_ref().map(|r| r.id().to_string()))
            .finish()
    }
}

fn not_registered(kind: &str) -> GeoError {
    GeoError::SensorUnavailable {
        sensor: kind.to_string(),
        details: format!("no {kind} provider is registered"),
    }
}
