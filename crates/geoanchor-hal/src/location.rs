//! `LocationProvider` trait for GPS / fused-location sources.

use geoanchor_types::{GeoError, LocationOptions, PermissionStatus};

use crate::sink::SensorSink;
use crate::subscription::Subscription;

/// A source of observer position fixes.
///
/// Once [`watch`][Self::watch] succeeds the provider pushes
/// [`SensorEvent::LocationFix`][geoanchor_types::SensorEvent::LocationFix] or
/// [`SensorEvent::LocationFailed`][geoanchor_types::SensorEvent::LocationFailed]
/// into `sink` until the returned [`Subscription`] is dropped.
pub trait LocationProvider: Send {
    /// Stable identifier, e.g. `"gps"`.
    fn id(&self) -> &str;

    /// Ask the platform for fine-location access.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::SensorUnavailable`] if the request itself fails.
    /// A refusal is reported as `Ok(PermissionStatus::Denied)`.
    fn request_permission(&mut self) -> Result<PermissionStatus, GeoError>;

    /// Start delivering fixes.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::SensorUnavailable`] if the stream cannot start.
    fn watch(&mut self, options: LocationOptions, sink: SensorSink) -> Result<Subscription, GeoError>;
}
