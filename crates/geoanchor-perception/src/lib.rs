//! `geoanchor-perception` – the coordinate transform pipeline.
//!
//! Turns absolute GPS coordinates and a compass heading into positions in an
//! observer-centred 3-D scene.
//!
//! # Modules
//!
//! - [`geo_offset`] – [`compute_offset`][geo_offset::compute_offset]: flat-earth
//!   offset of a landmark from the observer, in whole meters.
//! - [`heading`] – [`HeadingNormalizer`][heading::HeadingNormalizer]: live
//!   heading plus a reference heading latched once tracking stabilises.
//! - [`orientation`] – [`transform`][orientation::transform]: rotates a
//!   north-aligned offset into the observer-facing frame.
//!
//! All three are independent of each other apart from shared constants, and
//! only the heading latch holds state.

pub mod geo_offset;
pub mod heading;
pub mod orientation;

pub use geo_offset::{EARTH_RADIUS_M, RADIANS_PER_DEGREE, compute_offset, try_compute_offset};
pub use heading::{HeadingNormalizer, LatchOutcome, LatchState, normalize_degrees};
pub use orientation::transform;
