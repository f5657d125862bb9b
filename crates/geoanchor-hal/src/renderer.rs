//! Generic `PlacementRenderer` trait for whatever draws the landmark markers.

use geoanchor_types::LandmarkPlacement;

/// The rendering collaborator.
///
/// Receives the full placement set each time it changes. An empty slice means
/// nothing should be drawn, e.g. after the location fix was lost.
pub trait PlacementRenderer: Send {
    /// Stable identifier, e.g. `"ar_scene"`.
    fn id(&self) -> &str;

    fn render(&mut self, placements: &[LandmarkPlacement]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoanchor_types::{PlacementVector, RelativeOffset};

    struct CountingRenderer {
        frames: usize,
        last_len: usize,
    }

    impl PlacementRenderer for CountingRenderer {
        fn id(&self) -> &str {
            "counting"
        }

        fn render(&mut self, placements: &[LandmarkPlacement]) {
            self.frames += 1;
            self.last_len = placements.len();
        }
    }

    #[test]
    fn counting_renderer_receives_frames() {
        let mut r = CountingRenderer {
            frames: 0,
            last_len: 0,
        };
        r.render(&[LandmarkPlacement {
            landmark_id: "town_hall".to_string(),
            offset: RelativeOffset::new(1.0, 2.0),
            vector: PlacementVector::new(1.0, 0.0, 2.0),
        }]);
        r.render(&[]);
        assert_eq!(r.id(), "counting");
        assert_eq!(r.frames, 2);
        assert_eq!(r.last_len, 0);
    }
}
