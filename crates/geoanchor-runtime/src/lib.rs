//! `geoanchor-runtime` – runs the anchoring pipeline against live sensors.
//!
//! # Modules
//!
//! - [`observer`] – [`ObserverState`][observer::ObserverState]: location,
//!   live heading and latched reference heading, each with a single writer.
//! - [`pipeline`] – [`compute_placements`][pipeline::compute_placements]:
//!   turns observer state and the landmark registry into placements, or
//!   nothing.
//! - [`session`] – [`AnchorSession`][session::AnchorSession]: owns the
//!   drivers and the ordered sensor queue, applies events, hands placements
//!   to the renderer and unsubscribes everything on teardown.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with optional OTLP export.

pub mod observer;
pub mod pipeline;
pub mod session;
pub mod telemetry;

pub use observer::{ObserverSnapshot, ObserverState};
pub use pipeline::compute_placements;
pub use session::{AnchorSession, SessionConfig, StartReport};
pub use telemetry::{TracerProviderGuard, init_tracing};
