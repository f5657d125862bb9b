//! `geoanchor-hal` – sensor and renderer abstraction layer.
//!
//! The pipeline never talks to device APIs directly. Location, compass and
//! AR-tracking sources implement the provider traits here and push
//! [`SensorEnvelope`][geoanchor_types::SensorEnvelope]s into a single
//! [`SensorSink`]; the renderer implements [`PlacementRenderer`].
//!
//! # Modules
//!
//! - [`sink`] – [`SensorSink`] and [`sensor_queue`]: the one ordered event
//!   queue every provider writes to.
//! - [`subscription`] – [`Subscription`]: RAII handle that stops a sensor
//!   stream when dropped.
//! - [`location`], [`compass`], [`tracking`] – provider traits.
//! - [`renderer`] – [`PlacementRenderer`]: where placements are handed off.
//! - [`registry`] – [`SensorRegistry`]: one provider of each kind plus a
//!   renderer.
//! - [`sim`] – simulated drivers and the [`SimRegistry`][sim::SimRegistry]
//!   builder for headless runs.

pub mod compass;
pub mod location;
pub mod registry;
pub mod renderer;
pub mod sim;
pub mod sink;
pub mod subscription;
pub mod tracking;

pub use compass::{CompassProvider, DEFAULT_SAMPLE_RATE_DEGREES};
pub use location::LocationProvider;
pub use registry::SensorRegistry;
pub use renderer::PlacementRenderer;
pub use sink::{SensorSink, sensor_queue};
pub use subscription::Subscription;
pub use tracking::TrackingProvider;
