//! [`AnchorSession`] – one AR session from sensor start-up to teardown.
//!
//! The session owns the observer state, the landmark registry, the drivers and
//! the single sensor queue. Every provider pushes into that queue and the
//! session applies envelopes strictly in arrival order, so a tracking event
//! always sees the heading delivered just before it.
//!
//! Each applied event that can change the output (a fix, a failed fix, a
//! tracking change) recomputes the placements and, if they differ from the
//! last set, hands the new set to the renderer. Compass samples only update
//! the live heading: after the reference is locked they never move markers.
//!
//! # Example
//!
//! ```rust
//! use geoanchor_hal::sim::SimRegistry;
//! use geoanchor_runtime::{AnchorSession, SessionConfig};
//! use geoanchor_types::{GeoCoordinate, Landmark};
//!
//! let (registry, sim) = SimRegistry::standard();
//! let landmarks = vec![Landmark::new(
//!     "town_hall",
//!     "Town Hall",
//!     GeoCoordinate::new_unchecked(53.8, -1.55),
//! )];
//!
//! let mut session = AnchorSession::new(SessionConfig::default(), landmarks, registry);
//! session.start();
//!
//! sim.location.push_fix(GeoCoordinate::new_unchecked(53.796, -1.548));
//! sim.compass.push_heading(0.0, 1.0);
//! sim.tracking.push_normal();
//! session.drain_pending();
//!
//! assert_eq!(session.placements().len(), 1);
//! ```

use std::future::Future;

use geoanchor_hal::sink::SensorReceiver;
use geoanchor_hal::{DEFAULT_SAMPLE_RATE_DEGREES, SensorRegistry, SensorSink, Subscription, sensor_queue};
use geoanchor_perception::LatchOutcome;
use geoanchor_types::{
    GeoError, Landmark, LandmarkPlacement, LocationOptions, PermissionStatus, SensorEnvelope,
    SensorEvent,
};
use tracing::{Span, debug, info, warn};
use uuid::Uuid;

use crate::observer::ObserverState;
use crate::pipeline::compute_placements;
use crate::telemetry::session_span;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Sensor settings for [`AnchorSession`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Minimum heading change in degrees between compass samples.
    pub compass_sample_rate_degrees: f64,
    pub location: LocationOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            compass_sample_rate_degrees: DEFAULT_SAMPLE_RATE_DEGREES,
            location: LocationOptions::default(),
        }
    }
}

/// Which streams came up in [`AnchorSession::start`].
#[derive(Debug, Default)]
pub struct StartReport {
    pub location_live: bool,
    pub compass_live: bool,
    pub tracking_live: bool,
    /// Every failure, in start order. All are non-fatal.
    pub errors: Vec<GeoError>,
}

impl StartReport {
    /// `true` when any stream failed; the session then produces no
    /// placements, possibly forever.
    pub fn is_degraded(&self) -> bool {
        !(self.location_live && self.compass_live && self.tracking_live)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AnchorSession
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the pipeline for one session.
pub struct AnchorSession {
    id: Uuid,
    config: SessionConfig,
    landmarks: Vec<Landmark>,
    state: ObserverState,
    registry: SensorRegistry,
    /// The session's own sender. Released by [`run`][Self::run] so the queue
    /// closes once every provider has unsubscribed.
    sink: Option<SensorSink>,
    queue: SensorReceiver,
    subscriptions: Vec<Subscription>,
    placements: Vec<LandmarkPlacement>,
    span: Span,
}

impl AnchorSession {
    pub fn new(config: SessionConfig, landmarks: Vec<Landmark>, registry: SensorRegistry) -> Self {
        let (sink, queue) = sensor_queue();
        let id = Uuid::new_v4();
        Self {
            id,
            span: session_span(id, landmarks.len()),
            config,
            landmarks,
            state: ObserverState::new(),
            registry,
            sink: Some(sink),
            queue,
            subscriptions: Vec::new(),
            placements: Vec::new(),
        }
    }

    /// Request location permission and start the location, compass and
    /// tracking streams.
    ///
    /// Failures are logged and collected in the returned [`StartReport`];
    /// none of them abort the session. Calling `start` again tears down the
    /// existing streams first.
    pub fn start(&mut self) -> StartReport {
        let _span = self.span.clone().entered();
        self.stop_streams();
        let mut report = StartReport::default();
        let sink = self.sender();

        match self.start_location(sink.clone()) {
            Ok(sub) => {
                report.location_live = true;
                self.subscriptions.push(sub);
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "location stream not started; no placements will be produced");
                report.errors.push(e);
            }
        }

        let sample_rate = self.config.compass_sample_rate_degrees;
        let compass = self
            .registry
            .compass_mut()
            .and_then(|c| c.start(sample_rate, sink.clone()));
        match compass {
            Ok(sub) => {
                report.compass_live = true;
                self.subscriptions.push(sub);
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "compass stream not started; heading can never lock");
                report.errors.push(e);
            }
        }

        let tracking = self
            .registry
            .tracking_mut()
            .and_then(|t| t.subscribe(sink));
        match tracking {
            Ok(sub) => {
                report.tracking_live = true;
                self.subscriptions.push(sub);
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "tracking stream not started; heading can never lock");
                report.errors.push(e);
            }
        }

        info!(
            session = %self.id,
            location = report.location_live,
            compass = report.compass_live,
            tracking = report.tracking_live,
            "session started"
        );
        report
    }

    fn start_location(&mut self, sink: SensorSink) -> Result<Subscription, GeoError> {
        let options = self.config.location;
        let provider = self.registry.location_mut()?;
        match provider.request_permission()? {
            PermissionStatus::Granted => provider.watch(options, sink),
            PermissionStatus::Denied => Err(GeoError::PermissionDenied {
                provider: provider.id().to_string(),
            }),
        }
    }

    /// Apply one envelope. Returns `true` if the placement set changed.
    pub fn handle(&mut self, envelope: SensorEnvelope) -> bool {
        let _span = self.span.clone().entered();
        let source = envelope.source;
        match envelope.event {
            SensorEvent::LocationFix(coordinate) if coordinate.is_valid() => {
                debug!(%source, lat = coordinate.latitude, lon = coordinate.longitude, "location fix");
                self.state.apply_fix(coordinate);
            }
            SensorEvent::LocationFix(coordinate) => {
                warn!(%source, ?coordinate, "out-of-range fix treated as a failed fix");
                self.state.clear_location();
            }
            SensorEvent::LocationFailed { code, message } => {
                warn!(%source, code, %message, "location fix failed");
                self.state.clear_location();
            }
            SensorEvent::Compass(reading) => {
                debug!(%source, heading = reading.heading_degrees, "compass sample");
                self.state.apply_compass(reading);
                return false;
            }
            SensorEvent::Tracking { state, reason } => {
                debug!(%source, ?state, ?reason, "tracking update");
                match self.state.on_tracking(state) {
                    Some(LatchOutcome::Deferred) => {
                        info!(session = %self.id, "tracking normal but no heading yet; latch deferred");
                    }
                    Some(LatchOutcome::Locked(reference)) => {
                        info!(session = %self.id, reference, "placements anchored to reference heading");
                    }
                    Some(LatchOutcome::AlreadyLocked(_)) | None => {}
                }
            }
        }
        self.refresh()
    }

    fn refresh(&mut self) -> bool {
        let next = compute_placements(&self.state, &self.landmarks);
        if next == self.placements {
            return false;
        }
        self.placements = next;
        debug!(session = %self.id, count = self.placements.len(), "placements changed");
        self.registry.render(&self.placements);
        true
    }

    /// Apply every envelope already waiting in the queue. Returns how many
    /// were applied.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(envelope) = self.queue.try_recv() {
            self.handle(envelope);
            applied += 1;
        }
        applied
    }

    /// Apply envelopes as they arrive until `shutdown` resolves or every
    /// sender is gone, then tear down every stream.
    ///
    /// The session drops its own sender first, so once all providers have
    /// unsubscribed (and any [`sink`][Self::sink] clones are dropped) the
    /// remaining events are applied and the loop ends.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.sink = None;
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                next = self.queue.recv() => match next {
                    Some(envelope) => {
                        self.handle(envelope);
                    }
                    None => {
                        info!(session = %self.id, "every sensor sender dropped; session loop ending");
                        break;
                    }
                },
            }
        }
        self.shutdown();
    }

    /// Cancel every sensor subscription. Further events from providers are
    /// no longer delivered. Safe to call more than once.
    pub fn shutdown(&mut self) {
        let _span = self.span.clone().entered();
        if !self.subscriptions.is_empty() {
            info!(session = %self.id, streams = self.subscriptions.len(), "session shutting down");
        }
        self.stop_streams();
    }

    fn stop_streams(&mut self) {
        for mut sub in self.subscriptions.drain(..) {
            sub.cancel();
        }
    }

    /// A sender onto this session's queue, for collaborators that are not
    /// registered providers.
    pub fn sink(&mut self) -> SensorSink {
        self.sender()
    }

    /// Clone the session's sender, opening a fresh queue if a previous
    /// [`run`][Self::run] released it.
    fn sender(&mut self) -> SensorSink {
        if let Some(sink) = &self.sink {
            return sink.clone();
        }
        let (sink, queue) = sensor_queue();
        self.queue = queue;
        self.sink = Some(sink.clone());
        sink
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn state(&self) -> &ObserverState {
        &self.state
    }

    /// The most recent placement set handed to the renderer.
    pub fn placements(&self) -> &[LandmarkPlacement] {
        &self.placements
    }

    /// Names of the streams currently running.
    pub fn active_streams(&self) -> Vec<&str> {
        self.subscriptions
            .iter()
            .filter(|s| s.is_active())
            .map(Subscription::name)
            .collect()
    }
}

impl Drop for AnchorSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AnchorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorSession")
            .field("id", &self.id)
            .field("landmarks", &self.landmarks.len())
            .field("state", &self.state.snapshot())
            .field("streams", &self.active_streams())
            .field("placements", &self.placements.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use geoanchor_hal::sim::{SimCompass, SimLocationProvider, SimRegistry, SimRenderer, SimTracking};
    use geoanchor_types::{GeoCoordinate, TrackingReason, TrackingState};

    fn leeds() -> Vec<Landmark> {
        vec![
            Landmark::new(
                "queens_hotel",
                "Queens Hotel",
                GeoCoordinate::new_unchecked(53.796, -1.548),
            ),
            Landmark::new(
                "town_hall",
                "Town Hall",
                GeoCoordinate::new_unchecked(53.8, -1.55),
            ),
        ]
    }

    fn observer() -> GeoCoordinate {
        GeoCoordinate::new_unchecked(53.796, -1.548)
    }

    #[test]
    fn full_start_brings_up_every_stream() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        let report = session.start();

        assert!(!report.is_degraded());
        assert!(report.errors.is_empty());
        assert_eq!(session.active_streams(), vec!["sim_gps", "sim_compass", "sim_tracking"]);
        assert_eq!(sim.location.last_options(), Some(LocationOptions::default()));
    }

    #[test]
    fn placements_appear_only_after_fix_and_lock() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();

        sim.location.push_fix(observer());
        session.drain_pending();
        assert!(session.placements().is_empty());

        sim.compass.push_heading(0.0, 1.0);
        session.drain_pending();
        assert!(session.placements().is_empty());

        sim.tracking.push_normal();
        session.drain_pending();
        let placements = session.placements();
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].vector.x, 0.0);
        assert_eq!(placements[0].vector.z, 0.0);
        assert_eq!(placements[1].vector.x, -131.0);
        assert_eq!(placements[1].vector.z, -445.0);
        assert_eq!(sim.frames.count(), 1);
    }

    #[test]
    fn tracking_before_heading_defers_then_locks_once() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();

        sim.location.push_fix(observer());
        sim.tracking.push_normal();
        session.drain_pending();
        assert_eq!(session.state().reference_heading_degrees(), None);
        assert!(session.placements().is_empty());

        sim.compass.push_heading(90.0, 1.0);
        sim.tracking.push_normal();
        session.drain_pending();
        assert_eq!(session.state().reference_heading_degrees(), Some(90.0));

        sim.compass.push_heading(180.0, 1.0);
        sim.tracking.push_normal();
        session.drain_pending();
        assert_eq!(session.state().reference_heading_degrees(), Some(90.0));
        assert_eq!(session.state().heading_degrees(), Some(180.0));
    }

    #[test]
    fn live_heading_after_lock_does_not_move_markers() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();

        sim.location.push_fix(observer());
        sim.compass.push_heading(30.0, 1.0);
        sim.tracking.push_normal();
        session.drain_pending();
        let before = session.placements().to_vec();
        let frames = sim.frames.count();

        sim.compass.push_heading(200.0, 1.0);
        session.drain_pending();
        assert_eq!(session.placements(), before.as_slice());
        assert_eq!(sim.frames.count(), frames);
    }

    #[test]
    fn failed_fix_clears_placements() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();

        sim.location.push_fix(observer());
        sim.compass.push_heading(0.0, 1.0);
        sim.tracking.push_normal();
        session.drain_pending();
        assert_eq!(session.placements().len(), 2);

        sim.location.push_failure(3, "timeout");
        session.drain_pending();
        assert!(session.placements().is_empty());
        assert_eq!(sim.frames.last(), Some(vec![]));
        // The reference heading survives a lost fix.
        assert_eq!(session.state().reference_heading_degrees(), Some(0.0));
    }

    #[test]
    fn out_of_range_fix_is_treated_as_failure() {
        let (registry, _sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        let sink = session.sink();
        sink.send("external", SensorEvent::LocationFix(observer()))
            .unwrap();
        sink.send(
            "external",
            SensorEvent::LocationFix(GeoCoordinate::new_unchecked(95.0, 0.0)),
        )
        .unwrap();
        session.drain_pending();
        assert!(session.state().location().is_none());
    }

    #[test]
    fn new_fix_recomputes_placements() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();

        sim.location.push_fix(observer());
        sim.compass.push_heading(0.0, 1.0);
        sim.tracking.push_normal();
        session.drain_pending();

        sim.location
            .push_fix(GeoCoordinate::new_unchecked(53.8, -1.55));
        session.drain_pending();
        let town_hall = &session.placements()[1];
        assert_eq!(town_hall.vector.x, 0.0);
        assert_eq!(town_hall.vector.z, 0.0);
        assert_eq!(sim.frames.count(), 2);
    }

    #[test]
    fn permission_denied_never_produces_placements() {
        let (registry, sim) = SimRegistry::new()
            .with_location(SimLocationProvider::new("gps").denying_permission())
            .with_compass(SimCompass::new("compass"))
            .with_tracking(SimTracking::new("tracking"))
            .with_renderer(SimRenderer::new("renderer"))
            .build_with_handles();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        let report = session.start();

        assert!(!report.location_live);
        assert!(report.is_degraded());
        assert!(matches!(report.errors[0], GeoError::PermissionDenied { .. }));

        assert!(!sim.location.push_fix(observer()));
        sim.compass.push_heading(0.0, 1.0);
        sim.tracking.push_normal();
        session.drain_pending();
        assert!(session.placements().is_empty());
        assert_eq!(sim.frames.count(), 0);
    }

    #[test]
    fn compass_unavailable_degrades_without_crashing() {
        let (registry, sim) = SimRegistry::new()
            .with_location(SimLocationProvider::new("gps"))
            .with_compass(SimCompass::new("compass").unavailable())
            .with_tracking(SimTracking::new("tracking"))
            .build_with_handles();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        let report = session.start();

        assert!(report.location_live && report.tracking_live);
        assert!(!report.compass_live);
        assert!(matches!(report.errors[0], GeoError::SensorUnavailable { .. }));

        sim.location.push_fix(observer());
        sim.tracking.push_normal();
        session.drain_pending();
        assert!(session.placements().is_empty());
    }

    #[test]
    fn empty_registry_reports_three_errors() {
        let mut session = AnchorSession::new(
            SessionConfig::default(),
            leeds(),
            SensorRegistry::new(),
        );
        let report = session.start();
        assert_eq!(report.errors.len(), 3);
        assert!(session.active_streams().is_empty());
    }

    #[test]
    fn limited_tracking_does_not_latch() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();
        sim.compass.push_heading(10.0, 1.0);
        sim.tracking
            .push_state(TrackingState::Limited, TrackingReason::ExcessiveMotion);
        session.drain_pending();
        assert_eq!(session.state().reference_heading_degrees(), None);
    }

    #[test]
    fn shutdown_unsubscribes_every_stream() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();
        assert!(sim.location.is_subscribed());

        session.shutdown();
        assert!(session.active_streams().is_empty());
        assert!(!sim.location.is_subscribed());
        assert!(!sim.compass.is_subscribed());
        assert!(!sim.tracking.is_subscribed());
        assert!(!sim.location.push_fix(observer()));
    }

    #[test]
    fn drop_unsubscribes_every_stream() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();
        drop(session);
        assert!(!sim.compass.is_subscribed());
        assert!(!sim.tracking.is_subscribed());
    }

    #[test]
    fn restart_replaces_streams() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();
        session.start();
        assert_eq!(session.active_streams().len(), 3);
        assert!(sim.compass.is_subscribed());
    }

    #[tokio::test]
    async fn run_applies_events_until_shutdown() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();

        sim.location.push_fix(observer());
        sim.compass.push_heading(0.0, 1.0);
        sim.tracking.push_normal();

        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let frames = sim.frames.clone();
        let stopper = tokio::spawn(async move {
            while frames.count() == 0 {
                tokio::task::yield_now().await;
            }
            let _ = stop_tx.send(());
        });

        session
            .run(async {
                let _ = stop_rx.await;
            })
            .await;
        stopper.await.unwrap();

        assert_eq!(session.placements().len(), 2);
        assert!(session.active_streams().is_empty());
        assert!(!sim.location.is_subscribed());
    }

    #[tokio::test]
    async fn run_ends_once_every_stream_is_torn_down() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();
        sim.location.push_fix(observer());
        session.shutdown();
        assert!(!sim.location.is_subscribed());
        assert!(!sim.compass.is_subscribed());
        assert!(!sim.tracking.is_subscribed());

        let finished = tokio::time::timeout(
            std::time::Duration::from_millis(500),
            session.run(std::future::pending()),
        )
        .await;
        assert!(finished.is_ok());
        // Queued before teardown, still applied.
        assert_eq!(session.state().location(), Some(&observer()));
    }

    #[tokio::test]
    async fn start_after_run_opens_a_fresh_queue() {
        let (registry, sim) = SimRegistry::standard();
        let mut session = AnchorSession::new(SessionConfig::default(), leeds(), registry);
        session.start();
        session.shutdown();
        tokio::time::timeout(
            std::time::Duration::from_millis(500),
            session.run(std::future::pending()),
        )
        .await
        .unwrap();

        let report = session.start();
        assert!(!report.is_degraded());
        assert!(sim.location.push_fix(observer()));
        assert_eq!(session.drain_pending(), 1);
        assert_eq!(session.state().location(), Some(&observer()));
    }
}
