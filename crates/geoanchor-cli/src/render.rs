//! Terminal stand-in for the AR scene: prints each new placement set.

use colored::Colorize;
use geoanchor_hal::PlacementRenderer;
use geoanchor_types::{Landmark, LandmarkPlacement};

/// Prints one row per landmark marker whenever the session hands it a new
/// placement set.
pub struct ConsoleRenderer {
    names: Vec<(String, String)>,
    marker_size_m: f64,
}

impl ConsoleRenderer {
    pub fn new(landmarks: &[Landmark], marker_size_m: f64) -> Self {
        Self {
            names: landmarks
                .iter()
                .map(|l| (l.id.clone(), l.name.clone()))
                .collect(),
            marker_size_m,
        }
    }

    fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, name)| name.as_str())
            .unwrap_or(id)
    }
}

impl PlacementRenderer for ConsoleRenderer {
    fn id(&self) -> &str {
        "console"
    }

    fn render(&mut self, placements: &[LandmarkPlacement]) {
        if placements.is_empty() {
            println!("  {}", "◌ markers cleared".dimmed());
            return;
        }
        println!(
            "  {} {} marker(s), {} m boxes",
            "◉".green().bold(),
            placements.len(),
            self.marker_size_m
        );
        for line in format_placements(placements, |id| self.display_name(id).to_string()) {
            println!("{line}");
        }
    }
}

/// One aligned text row per placement.
pub fn format_placements<F>(placements: &[LandmarkPlacement], name_of: F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    placements
        .iter()
        .map(|p| {
            format!(
                "    {:<16} x={:>9.1}  y={:>4.1}  z={:>9.1}   ({:.0} m away)",
                name_of(&p.landmark_id),
                p.vector.x,
                p.vector.y,
                p.vector.z,
                p.vector.magnitude()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoanchor_types::{GeoCoordinate, PlacementVector, RelativeOffset};

    fn placement(id: &str, x: f64, z: f64) -> LandmarkPlacement {
        LandmarkPlacement {
            landmark_id: id.to_string(),
            offset: RelativeOffset::new(x, z),
            vector: PlacementVector::new(x, 0.0, z),
        }
    }

    #[test]
    fn rows_use_display_names() {
        let landmarks = vec![Landmark::new(
            "town_hall",
            "Town Hall",
            GeoCoordinate::new_unchecked(53.8, -1.55),
        )];
        let r = ConsoleRenderer::new(&landmarks, 50.0);
        assert_eq!(r.display_name("town_hall"), "Town Hall");
        assert_eq!(r.display_name("unknown"), "unknown");

        let rows = format_placements(&[placement("town_hall", -131.0, -445.0)], |id| {
            r.display_name(id).to_string()
        });
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("Town Hall"));
        assert!(rows[0].contains("-131.0"));
        assert!(rows[0].contains("-445.0"));
        assert!(rows[0].contains("464 m away"));
    }

    #[test]
    fn renderer_accepts_empty_set() {
        let mut r = ConsoleRenderer::new(&[], 50.0);
        assert_eq!(r.id(), "console");
        r.render(&[]);
        r.render(&[placement("x", 1.0, 2.0)]);
    }
}
