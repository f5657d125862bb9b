//! Observer state + landmark registry → placements.
//!
//! Rounding happens once, inside the offset calculation, before rotation.

use geoanchor_perception::{compute_offset, transform};
use geoanchor_types::{Landmark, LandmarkPlacement};

use crate::observer::ObserverState;

/// Placement for every landmark, or nothing at all.
///
/// Returns an empty vector until both a location fix and a locked reference
/// heading exist.
pub fn compute_placements(state: &ObserverState, landmarks: &[Landmark]) -> Vec<LandmarkPlacement> {
    let (Some(observer), Some(reference)) = (state.location(), state.reference_heading_degrees())
    else {
        return Vec::new();
    };

    landmarks
        .iter()
        .map(|landmark| {
            let offset = compute_offset(observer, &landmark.coordinate);
            LandmarkPlacement {
                landmark_id: landmark.id.clone(),
                offset,
                vector: transform(offset, reference),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoanchor_types::{CompassReading, GeoCoordinate, PlacementVector, TrackingState};

    fn landmarks() -> Vec<Landmark> {
        vec![
            Landmark::new(
                "town_hall",
                "Town Hall",
                GeoCoordinate::new_unchecked(53.8, -1.55),
            ),
            Landmark::new(
                "bank_house",
                "Bank House",
                GeoCoordinate::new_unchecked(53.7974, -1.5494),
            ),
        ]
    }

    fn locked_state(heading: f64) -> ObserverState {
        let mut s = ObserverState::new();
        s.apply_compass(CompassReading {
            heading_degrees: heading,
            accuracy: 1.0,
        });
        s.on_tracking(TrackingState::Normal);
        s
    }

    #[test]
    fn nothing_without_location() {
        assert!(compute_placements(&locked_state(0.0), &landmarks()).is_empty());
    }

    #[test]
    fn nothing_without_reference_heading() {
        let mut s = ObserverState::new();
        s.apply_fix(GeoCoordinate::new_unchecked(53.796, -1.548));
        s.apply_compass(CompassReading {
            heading_degrees: 10.0,
            accuracy: 1.0,
        });
        assert!(compute_placements(&s, &landmarks()).is_empty());
    }

    #[test]
    fn one_entry_per_landmark_at_north_heading() {
        let mut s = locked_state(0.0);
        s.apply_fix(GeoCoordinate::new_unchecked(53.796, -1.548));
        let placements = compute_placements(&s, &landmarks());

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].landmark_id, "town_hall");
        assert_eq!(placements[0].vector, PlacementVector::new(-131.0, 0.0, -445.0));
        assert_eq!(placements[1].landmark_id, "bank_house");
        assert_eq!(placements[1].vector, PlacementVector::new(-92.0, 0.0, -156.0));
    }

    #[test]
    fn rotation_uses_rounded_offset() {
        let mut s = locked_state(90.0);
        s.apply_fix(GeoCoordinate::new_unchecked(53.796, -1.548));
        let p = &compute_placements(&s, &landmarks())[0];
        // x' = z·sin 90 = -445, z' = -x·sin 90 = 131
        assert!((p.vector.x + 445.0).abs() < 1e-9);
        assert!((p.vector.z - 131.0).abs() < 1e-9);
        assert_eq!(p.offset.x, -131.0);
    }

    #[test]
    fn empty_registry_yields_empty_output() {
        let mut s = locked_state(0.0);
        s.apply_fix(GeoCoordinate::new_unchecked(53.796, -1.548));
        assert!(compute_placements(&s, &[]).is_empty());
    }
}
