//! `CompassProvider` trait for magnetometer heading sources.

use geoanchor_types::GeoError;

use crate::sink::SensorSink;
use crate::subscription::Subscription;

/// Default minimum heading change, in degrees, between delivered samples.
pub const DEFAULT_SAMPLE_RATE_DEGREES: f64 = 3.0;

/// A continuous compass heading stream.
pub trait CompassProvider: Send {
    /// Stable identifier, e.g. `"compass"`.
    fn id(&self) -> &str;

    /// Start pushing [`SensorEvent::Compass`][geoanchor_types::SensorEvent::Compass]
    /// samples into `sink`. A new sample is delivered whenever the heading has
    /// moved by at least `sample_rate_degrees` since the last one.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::SensorUnavailable`] if the device has no usable
    /// magnetometer.
    fn start(&mut self, sample_rate_degrees: f64, sink: SensorSink) -> Result<Subscription, GeoError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::sensor_queue;

    struct NoMagnetometer;

    impl CompassProvider for NoMagnetometer {
        fn id(&self) -> &str {
            "none"
        }

        fn start(&mut self, _rate: f64, _sink: SensorSink) -> Result<Subscription, GeoError> {
            Err(GeoError::SensorUnavailable {
                sensor: self.id().to_string(),
                details: "no magnetometer".to_string(),
            })
        }
    }

    #[test]
    fn missing_magnetometer_reports_unavailable() {
        let (sink, _rx) = sensor_queue();
        let err = NoMagnetometer
            .start(DEFAULT_SAMPLE_RATE_DEGREES, sink)
            .unwrap_err();
        assert!(matches!(err, GeoError::SensorUnavailable { ref sensor, .. } if sensor == "none"));
    }
}
