//! `TrackingProvider` trait for the AR session's tracking-state stream.

use geoanchor_types::GeoError;

use crate::sink::SensorSink;
use crate::subscription::Subscription;

/// Reports tracking quality changes as
/// [`SensorEvent::Tracking`][geoanchor_types::SensorEvent::Tracking].
pub trait TrackingProvider: Send {
    /// Stable identifier, e.g. `"ar_session"`.
    fn id(&self) -> &str;

    /// # Errors
    ///
    /// Returns [`GeoError::SensorUnavailable`] if tracking cannot start.
    fn subscribe(&mut self, sink: SensorSink) -> Result<Subscription, GeoError>;
}
