//! Geodetic-to-local offset calculator.
//!
//! Converts an absolute target coordinate into a flat-earth offset from the
//! observer using the equirectangular local-tangent approximation:
//!
//! ```text
//! z = (observer.lat − target.lat) · k · R
//! x = (target.lon − observer.lon) · k · R · cos(observer.lat · k)
//! ```
//!
//! where `k = 2π / 360` and `R` is the mean Earth radius. The cosine term
//! corrects for longitude degrees shrinking away from the equator. Accuracy is
//! good for targets within a few kilometres; no map projection is attempted
//! beyond that.
//!
//! Both axes are rounded to the nearest whole meter with [`f64::round`] (half
//! away from zero) before the result is returned.
//!
//! # Example
//!
//! ```rust
//! use geoanchor_perception::geo_offset::compute_offset;
//! use geoanchor_types::GeoCoordinate;
//!
//! let observer = GeoCoordinate::new(53.796, -1.548).unwrap();
//! let town_hall = GeoCoordinate::new(53.8, -1.55).unwrap();
//!
//! let offset = compute_offset(&observer, &town_hall);
//! assert_eq!(offset.x, -131.0);
//! assert_eq!(offset.z, -445.0);
//! ```

use geoanchor_types::{GeoCoordinate, GeoError, RelativeOffset};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Multiply degrees by this to get radians.
pub const RADIANS_PER_DEGREE: f64 = (2.0 * std::f64::consts::PI) / 360.0;

/// Offset of `target` relative to `observer`, rounded to whole meters.
pub fn compute_offset(observer: &GeoCoordinate, target: &GeoCoordinate) -> RelativeOffset {
    let relative_latitude = observer.latitude - target.latitude;
    let z = relative_latitude * RADIANS_PER_DEGREE * EARTH_RADIUS_M;

    let relative_longitude = target.longitude - observer.longitude;
    let x = relative_longitude
        * RADIANS_PER_DEGREE
        * EARTH_RADIUS_M
        * (observer.latitude * RADIANS_PER_DEGREE).cos();

    RelativeOffset::new(x.round(), z.round())
}

/// Like [`compute_offset`] but for callers that may not have a fix yet.
///
/// # Errors
///
/// Returns [`GeoError::MissingObserver`] when `observer` is `None`.
pub fn try_compute_offset(
    observer: Option<&GeoCoordinate>,
    target: &GeoCoordinate,
) -> Result<RelativeOffset, GeoError> {
    let observer = observer.ok_or(GeoError::MissingObserver)?;
    Ok(compute_offset(observer, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(latitude: f64, longitude: f64) -> GeoCoordinate {
        GeoCoordinate::new(latitude, longitude).unwrap()
    }

    #[test]
    fn same_point_is_zero_offset() {
        for p in [coord(53.796, -1.548), coord(0.0, 0.0), coord(-33.9, 151.2)] {
            let offset = compute_offset(&p, &p);
            assert_eq!(offset, RelativeOffset::new(0.0, 0.0));
        }
    }

    #[test]
    fn town_hall_from_queens_hotel() {
        // Target is north and slightly west: negative x, negative z.
        let offset = compute_offset(&coord(53.796, -1.548), &coord(53.8, -1.55));
        assert_eq!(offset.x, -131.0);
        assert_eq!(offset.z, -445.0);
    }

    #[test]
    fn bank_house_from_queens_hotel() {
        let offset = compute_offset(&coord(53.796, -1.548), &coord(53.7974, -1.5494));
        assert_eq!(offset.x, -92.0);
        assert_eq!(offset.z, -156.0);
    }

    #[test]
    fn equator_x_is_antisymmetric() {
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 0.01);
        let ab = compute_offset(&a, &b);
        let ba = compute_offset(&b, &a);
        assert_eq!(ab.x, 1112.0);
        assert_eq!(ab.x, -ba.x);
        assert_eq!(ab.z, 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let offset = compute_offset(&coord(10.0, 20.0), &coord(11.0, 20.0));
        assert_eq!(offset.x, 0.0);
        assert_eq!(offset.z, -111_195.0);
    }

    #[test]
    fn longitude_shrinks_with_latitude() {
        let at_equator = compute_offset(&coord(0.0, 0.0), &coord(0.0, 0.01));
        let at_sixty = compute_offset(&coord(60.0, 0.0), &coord(60.0, 0.01));
        // cos(60°) = 0.5
        assert!((at_sixty.x - at_equator.x / 2.0).abs() <= 1.0);
    }

    #[test]
    fn offsets_are_whole_meters() {
        let offset = compute_offset(&coord(51.5007, -0.1246), &coord(51.5033, -0.1196));
        assert_eq!(offset.x, offset.x.round());
        assert_eq!(offset.z, offset.z.round());
    }

    #[test]
    fn try_compute_offset_without_observer_fails() {
        let err = try_compute_offset(None, &coord(53.8, -1.55)).unwrap_err();
        assert_eq!(err, GeoError::MissingObserver);
    }

    #[test]
    fn try_compute_offset_with_observer_matches_compute_offset() {
        let observer = coord(53.796, -1.548);
        let target = coord(53.8, -1.55);
        assert_eq!(
            try_compute_offset(Some(&observer), &target).unwrap(),
            compute_offset(&observer, &target)
        );
    }
}
