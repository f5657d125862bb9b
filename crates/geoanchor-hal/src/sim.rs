//! In-process simulated drivers for headless runs and tests.
//!
//! Each simulated provider hands out a cloneable *feed* handle. Pushing into a
//! feed enqueues an event on the session queue only while the provider's
//! [`Subscription`] is active, so tests can check that teardown really stops
//! delivery.
//!
//! # Example
//!
//! ```rust
//! use geoanchor_hal::sim::SimRegistry;
//! use geoanchor_hal::sensor_queue;
//! use geoanchor_types::{GeoCoordinate, LocationOptions};
//!
//! let (mut registry, handles) = SimRegistry::standard();
//! let (sink, mut rx) = sensor_queue();
//!
//! let _watch = registry
//!     .location_mut()
//!     .unwrap()
//!     .watch(LocationOptions::default(), sink)
//!     .unwrap();
//!
//! assert!(handles.location.push_fix(GeoCoordinate::new_unchecked(53.796, -1.548)));
//! assert!(rx.try_recv().is_ok());
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use geoanchor_types::{
    CompassReading, GeoCoordinate, GeoError, LandmarkPlacement, LocationOptions, PermissionStatus,
    SensorEvent, TrackingReason, TrackingState,
};
use tracing::debug;

use crate::compass::CompassProvider;
use crate::location::LocationProvider;
use crate::registry::SensorRegistry;
use crate::renderer::PlacementRenderer;
use crate::sink::SensorSink;
use crate::subscription::Subscription;
use crate::tracking::TrackingProvider;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ────────────────────────────────────────────────────────────────────────────
// Shared link between a provider and its feed
// ────────────────────────────────────────────────────────────────────────────

/// The sink a provider is currently attached to, if any.
#[derive(Debug, Clone, Default)]
struct SimLink(Arc<Mutex<Option<SensorSink>>>);

impl SimLink {
    fn attach(&self, sink: SensorSink) {
        *lock(&self.0) = Some(sink);
    }

    fn detach(&self) {
        lock(&self.0).take();
    }

    fn is_attached(&self) -> bool {
        lock(&self.0).is_some()
    }

    /// Deliver `event` if attached. Returns whether it was enqueued.
    fn deliver(&self, source: &str, event: SensorEvent) -> bool {
        let guard = lock(&self.0);
        match guard.as_ref() {
            Some(sink) => match sink.send(source, event) {
                Ok(()) => true,
                Err(e) => {
                    debug!(source, error = %e, "sim event dropped");
                    false
                }
            },
            None => {
                debug!(source, "sim event dropped: not subscribed");
                false
            }
        }
    }

    /// Subscription that detaches this link on teardown.
    fn subscription(&self, name: &str) -> Subscription {
        let link = self.clone();
        Subscription::new(name, move || link.detach())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Location
// ────────────────────────────────────────────────────────────────────────────

/// Simulated GPS.
pub struct SimLocationProvider {
    id: String,
    permission: PermissionStatus,
    available: bool,
    link: SimLink,
    last_options: Arc<Mutex<Option<LocationOptions>>>,
}

impl SimLocationProvider {
    /// A provider that grants permission and starts successfully.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            permission: PermissionStatus::Granted,
            available: true,
            link: SimLink::default(),
            last_options: Arc::new(Mutex::new(None)),
        }
    }

    /// Refuse the permission request.
    pub fn denying_permission(mut self) -> Self {
        self.permission = PermissionStatus::Denied;
        self
    }

    /// Fail every [`watch`][LocationProvider::watch] call.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn feed(&self) -> SimLocationFeed {
        SimLocationFeed {
            source: self.id.clone(),
            link: self.link.clone(),
            last_options: self.last_options.clone(),
        }
    }
}

impl LocationProvider for SimLocationProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn request_permission(&mut self) -> Result<PermissionStatus, GeoError> {
        Ok(self.permission)
    }

    fn watch(&mut self, options: LocationOptions, sink: SensorSink) -> Result<Subscription, GeoError> {
        if !self.available {
            return Err(GeoError::SensorUnavailable {
                sensor: self.id.clone(),
                details: "simulated location service is off".to_string(),
            });
        }
        *lock(&self.last_options) = Some(options);
        self.link.attach(sink);
        Ok(self.link.subscription(&self.id))
    }
}

/// Test-side handle that injects location results.
#[derive(Debug, Clone)]
pub struct SimLocationFeed {
    source: String,
    link: SimLink,
    last_options: Arc<Mutex<Option<LocationOptions>>>,
}

impl SimLocationFeed {
    pub fn push_fix(&self, coordinate: GeoCoordinate) -> bool {
        self.link
            .deliver(&self.source, SensorEvent::LocationFix(coordinate))
    }

    pub fn push_failure(&self, code: i32, message: impl Into<String>) -> bool {
        self.link.deliver(
            &self.source,
            SensorEvent::LocationFailed {
                code,
                message: message.into(),
            },
        )
    }

    pub fn is_subscribed(&self) -> bool {
        self.link.is_attached()
    }

    /// Options passed to the most recent successful watch.
    pub fn last_options(&self) -> Option<LocationOptions> {
        *lock(&self.last_options)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Compass
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CompassFilter {
    sample_rate_degrees: f64,
    last_delivered: Option<f64>,
}

/// Smallest angle between two headings, in degrees.
fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Simulated magnetometer.
pub struct SimCompass {
    id: String,
    available: bool,
    link: SimLink,
    filter: Arc<Mutex<CompassFilter>>,
}

impl SimCompass {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            available: true,
            link: SimLink::default(),
            filter: Arc::new(Mutex::new(CompassFilter::default())),
        }
    }

    /// Fail every [`start`][CompassProvider::start] call.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn feed(&self) -> SimCompassFeed {
        SimCompassFeed {
            source: self.id.clone(),
            link: self.link.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl CompassProvider for SimCompass {
    fn id(&self) -> &str {
        &self.id
    }

    fn start(&mut self, sample_rate_degrees: f64, sink: SensorSink) -> Result<Subscription, GeoError> {
        if !self.available {
            return Err(GeoError::SensorUnavailable {
                sensor: self.id.clone(),
                details: "simulated magnetometer missing".to_string(),
            });
        }
        *lock(&self.filter) = CompassFilter {
            sample_rate_degrees: sample_rate_degrees.max(0.0),
            last_delivered: None,
        };
        self.link.attach(sink);
        Ok(self.link.subscription(&self.id))
    }
}

/// Test-side handle that injects raw compass readings.
#[derive(Debug, Clone)]
pub struct SimCompassFeed {
    source: String,
    link: SimLink,
    filter: Arc<Mutex<CompassFilter>>,
}

impl SimCompassFeed {
    /// Offer a raw reading. It is delivered only if subscribed and the heading
    /// moved at least the configured sample rate since the last delivery.
    pub fn push_heading(&self, heading_degrees: f64, accuracy: f64) -> bool {
        if !self.link.is_attached() {
            return false;
        }
        let mut filter = lock(&self.filter);
        if let Some(last) = filter.last_delivered
            && angular_distance(last, heading_degrees) < filter.sample_rate_degrees
        {
            return false;
        }
        let delivered = self.link.deliver(
            &self.source,
            SensorEvent::Compass(CompassReading {
                heading_degrees,
                accuracy,
            }),
        );
        if delivered {
            filter.last_delivered = Some(heading_degrees);
        }
        delivered
    }

    pub fn is_subscribed(&self) -> bool {
        self.link.is_attached()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tracking
// ────────────────────────────────────────────────────────────────────────────

/// Simulated AR tracking-state source.
pub struct SimTracking {
    id: String,
    link: SimLink,
}

impl SimTracking {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            link: SimLink::default(),
        }
    }

    pub fn feed(&self) -> SimTrackingFeed {
        SimTrackingFeed {
            source: self.id.clone(),
            link: self.link.clone(),
        }
    }
}

impl TrackingProvider for SimTracking {
    fn id(&self) -> &str {
        &self.id
    }

    fn subscribe(&mut self, sink: SensorSink) -> Result<Subscription, GeoError> {
        self.link.attach(sink);
        Ok(self.link.subscription(&self.id))
    }
}

/// Test-side handle that injects tracking-state changes.
#[derive(Debug, Clone)]
pub struct SimTrackingFeed {
    source: String,
    link: SimLink,
}

impl SimTrackingFeed {
    pub fn push_state(&self, state: TrackingState, reason: TrackingReason) -> bool {
        self.link
            .deliver(&self.source, SensorEvent::Tracking { state, reason })
    }

    /// Shorthand for `Normal` with no reason.
    pub fn push_normal(&self) -> bool {
        self.push_state(TrackingState::Normal, TrackingReason::None)
    }

    pub fn is_subscribed(&self) -> bool {
        self.link.is_attached()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Renderer
// ────────────────────────────────────────────────────────────────────────────

/// Renderer that records every frame it is handed.
pub struct SimRenderer {
    id: String,
    frames: SimFrames,
}

impl SimRenderer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            frames: SimFrames::default(),
        }
    }

    pub fn frames(&self) -> SimFrames {
        self.frames.clone()
    }
}

impl PlacementRenderer for SimRenderer {
    fn id(&self) -> &str {
        &self.id
    }

    fn render(&mut self, placements: &[LandmarkPlacement]) {
        lock(&self.frames.0).push(placements.to_vec());
    }
}

/// Shared view of the frames a [`SimRenderer`] has received.
#[derive(Debug, Clone, Default)]
pub struct SimFrames(Arc<Mutex<Vec<Vec<LandmarkPlacement>>>>);

impl SimFrames {
    pub fn count(&self) -> usize {
        lock(&self.0).len()
    }

    pub fn last(&self) -> Option<Vec<LandmarkPlacement>> {
        lock(&self.0).last().cloned()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRegistry builder
// ────────────────────────────────────────────────────────────────────────────

/// Feed handles for a registry built by [`SimRegistry::standard`].
#[derive(Debug, Clone)]
pub struct SimHandles {
    pub location: SimLocationFeed,
    pub compass: SimCompassFeed,
    pub tracking: SimTrackingFeed,
    pub frames: SimFrames,
}

/// Builder that constructs a [`SensorRegistry`] from simulated drivers.
#[derive(Default)]
pub struct SimRegistry {
    location: Option<SimLocationProvider>,
    compass: Option<SimCompass>,
    tracking: Option<SimTracking>,
    renderer: Option<SimRenderer>,
}

impl SimRegistry {
    /// Create an empty [`SimRegistry`] builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every slot filled by a well-behaved simulated driver.
    pub fn standard() -> (SensorRegistry, SimHandles) {
        Self::new()
            .with_location(SimLocationProvider::new("sim_gps"))
            .with_compass(SimCompass::new("sim_compass"))
            .with_tracking(SimTracking::new("sim_tracking"))
            .with_renderer(SimRenderer::new("sim_renderer"))
            .build_with_handles()
    }

    pub fn with_location(mut self, provider: SimLocationProvider) -> Self {
        self.location = Some(provider);
        self
    }

    pub fn with_compass(mut self, provider: SimCompass) -> Self {
        self.compass = Some(provider);
        self
    }

    pub fn with_tracking(mut self, provider: SimTracking) -> Self {
        self.tracking = Some(provider);
        self
    }

    pub fn with_renderer(mut self, renderer: SimRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Consume the builder and return the registry.
    pub fn build(self) -> SensorRegistry {
        let mut registry = SensorRegistry::new();
        if let Some(p) = self.location {
            registry.register_location(Box::new(p));
        }
        if let Some(p) = self.compass {
            registry.register_compass(Box::new(p));
        }
        if let Some(p) = self.tracking {
            registry.register_tracking(Box::new(p));
        }
        if let Some(r) = self.renderer {
            registry.register_renderer(Box::new(r));
        }
        registry
    }

    /// Like [`build`][Self::build] but also returns feed handles. Empty slots
    /// get detached placeholder feeds that never deliver.
    pub fn build_with_handles(self) -> (SensorRegistry, SimHandles) {
        let handles = SimHandles {
            location: self
                .location
                .as_ref()
                .map(SimLocationProvider::feed)
                .unwrap_or_else(|| SimLocationProvider::new("detached").feed()),
            compass: self
                .compass
                .as_ref()
                .map(SimCompass::feed)
                .unwrap_or_else(|| SimCompass::new("detached").feed()),
            tracking: self
                .tracking
                .as_ref()
                .map(SimTracking::feed)
                .unwrap_or_else(|| SimTracking::new("detached").feed()),
            frames: self
                .renderer
                .as_ref()
                .map(SimRenderer::frames)
                .unwrap_or_default(),
        };
        (self.build(), handles)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
