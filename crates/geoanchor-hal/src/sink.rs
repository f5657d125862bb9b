//! The single ordered sensor event queue.
//!
//! Every provider pushes into a clone of the same [`SensorSink`]. Because the
//! session drains the receiving end one envelope at a time, a compass sample
//! delivered before a tracking event is always applied before the latch check
//! that event triggers.

use geoanchor_types::{GeoError, SensorEnvelope, SensorEvent};
use tokio::sync::mpsc;
use tracing::trace;

/// Receiving end of the queue, owned by the session.
pub type SensorReceiver = mpsc::UnboundedReceiver<SensorEnvelope>;

/// Create a new queue.
pub fn sensor_queue() -> (SensorSink, SensorReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SensorSink { tx }, rx)
}

/// Cloneable sending end of the sensor queue.
#[derive(Debug, Clone)]
pub struct SensorSink {
    tx: mpsc::UnboundedSender<SensorEnvelope>,
}

impl SensorSink {
    /// Wrap `event` in an envelope stamped with `source` and enqueue it.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Channel`] when the session has gone away.
    pub fn send(&self, source: &str, event: SensorEvent) -> Result<(), GeoError> {
        trace!(source, ?event, "enqueue sensor event");
        self.tx
            .send(SensorEnvelope::new(source, event))
            .map_err(|e| GeoError::Channel(format!("sensor queue closed: {e}")))
    }

    /// `true` once the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
