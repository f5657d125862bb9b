//! North-aligned to observer-facing rotation.
//!
//! Rotates a [`RelativeOffset`] about the vertical axis by the negated
//! reference heading so that the scene's forward axis lines up with the
//! direction the observer faced when the heading was locked:
//!
//! ```text
//! h  = heading · 2π / 360
//! x' =  x · cos h + z · sin h
//! y' =  0
//! z' = −x · sin h + z · cos h
//! ```
//!
//! # Example
//!
//! ```rust
//! use geoanchor_perception::orientation::transform;
//! use geoanchor_types::RelativeOffset;
//!
//! // 100 m east, observer locked facing east.
//! let v = transform(RelativeOffset::new(100.0, 0.0), 90.0);
//! assert!(v.x.abs() < 1e-9);
//! assert!((v.z + 100.0).abs() < 1e-9);
//! ```

use geoanchor_types::{PlacementVector, RelativeOffset};

use crate::geo_offset::RADIANS_PER_DEGREE;

/// Rotate `offset` into the frame defined by `reference_heading_degrees`.
///
/// The reference must come from a locked
/// [`HeadingNormalizer`][crate::heading::HeadingNormalizer].
pub fn transform(offset: RelativeOffset, reference_heading_degrees: f64) -> PlacementVector {
    let heading_radians = reference_heading_degrees * RADIANS_PER_DEGREE;
    let (sin, cos) = heading_radians.sin_cos();

    PlacementVector::new(
        offset.x * cos + offset.z * sin,
        0.0,
        -offset.x * sin + offset.z * cos,
    )
}
