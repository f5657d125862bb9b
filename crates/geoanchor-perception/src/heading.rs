//! Reference-heading latch.
//!
//! [`HeadingNormalizer`] tracks the live compass heading and freezes a single
//! reference heading the first time the AR session reports stable tracking.
//! Placements are expressed relative to that reference, so they must not move
//! when the device rotates afterwards; the renderer's own camera transform
//! handles live rotation.
//!
//! ```text
//!   Uninitialized ──latch() with heading present──▶ Locked { reference }
//!        │  ▲
//!        └──┘ latch() without heading: deferred, retry on next event
//! ```
//!
//! There is no transition out of `Locked`. A new session builds a new
//! normalizer.
//!
//! # Example
//!
//! ```rust
//! use geoanchor_perception::heading::{HeadingNormalizer, LatchOutcome};
//!
//! let mut heading = HeadingNormalizer::new();
//! assert_eq!(heading.latch(), LatchOutcome::Deferred);
//!
//! heading.update_heading(42.0);
//! assert_eq!(heading.latch(), LatchOutcome::Locked(42.0));
//!
//! heading.update_heading(90.0);
//! assert_eq!(heading.latch(), LatchOutcome::AlreadyLocked(42.0));
//! assert_eq!(heading.reference_heading(), Some(42.0));
//! ```

use tracing::{debug, info};

/// Wrap any finite angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs due to rounding.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Latch state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatchState {
    Uninitialized,
    Locked { reference_degrees: f64 },
}

/// Result of a [`HeadingNormalizer::latch`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatchOutcome {
    /// This call froze the reference heading.
    Locked(f64),
    /// The reference was already frozen; nothing changed.
    AlreadyLocked(f64),
    /// No heading sample has arrived yet; still uninitialized.
    Deferred,
}

/// Live heading plus a write-once reference heading.
#[derive(Debug, Clone)]
pub struct HeadingNormalizer {
    current: Option<f64>,
    state: LatchState,
}

impl Default for HeadingNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadingNormalizer {
    pub fn new() -> Self {
        Self {
            current: None,
            state: LatchState::Uninitialized,
        }
    }

    /// Record a new compass sample. Non-finite samples are dropped.
    pub fn update_heading(&mut self, degrees: f64) {
        if !degrees.is_finite() {
            debug!(degrees, "ignoring non-finite heading sample");
            return;
        }
        self.current = Some(normalize_degrees(degrees));
    }

    /// Freeze the current heading as the session reference.
    ///
    /// Only the first call made while uninitialized *and* with a heading
    /// sample present has any effect.
    pub fn latch(&mut self) -> LatchOutcome {
        match (self.state, self.current) {
            (LatchState::Locked { reference_degrees }, _) => {
                LatchOutcome::AlreadyLocked(reference_degrees)
            }
            (LatchState::Uninitialized, None) => {
                debug!("latch deferred: no heading sample yet");
                LatchOutcome::Deferred
            }
            (LatchState::Uninitialized, Some(reference_degrees)) => {
                self.state = LatchState::Locked { reference_degrees };
                info!(reference_degrees, "reference heading locked");
                LatchOutcome::Locked(reference_degrees)
            }
        }
    }

    /// Most recent compass heading, if any.
    pub fn current_heading(&self) -> Option<f64> {
        self.current
    }

    /// The frozen reference heading, once locked.
    pub fn reference_heading(&self) -> Option<f64> {
        match self.state {
            LatchState::Locked { reference_degrees } => Some(reference_degrees),
            LatchState::Uninitialized => None,
        }
    }

    pub fn state(&self) -> LatchState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, LatchState::Locked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized_and_empty() {
        let h = HeadingNormalizer::new();
        assert_eq!(h.state(), LatchState::Uninitialized);
        assert_eq!(h.current_heading(), None);
        assert_eq!(h.reference_heading(), None);
        assert!(!h.is_locked());
    }

    #[test]
    fn latch_without_heading_defers() {
        let mut h = HeadingNormalizer::new();
        assert_eq!(h.latch(), LatchOutcome::Deferred);
        assert_eq!(h.latch(), LatchOutcome::Deferred);
        assert_eq!(h.reference_heading(), None);
    }

    #[test]
    fn deferred_latch_succeeds_once_heading_arrives() {
        let mut h = HeadingNormalizer::new();
        assert_eq!(h.latch(), LatchOutcome::Deferred);
        h.update_heading(137.5);
        assert_eq!(h.latch(), LatchOutcome::Locked(137.5));
        assert_eq!(h.reference_heading(), Some(137.5));
    }

    #[test]
    fn second_latch_never_changes_reference() {
        let mut h = HeadingNormalizer::new();
        h.update_heading(10.0);
        assert_eq!(h.latch(), LatchOutcome::Locked(10.0));

        h.update_heading(250.0);
        assert_eq!(h.latch(), LatchOutcome::AlreadyLocked(10.0));
        assert_eq!(h.reference_heading(), Some(10.0));
        assert_eq!(h.current_heading(), Some(250.0));
    }

    #[test]
    fn zero_heading_is_a_real_sample() {
        let mut h = HeadingNormalizer::new();
        h.update_heading(0.0);
        assert_eq!(h.latch(), LatchOutcome::Locked(0.0));
    }

    #[test]
    fn headings_are_normalized_on_ingest() {
        let mut h = HeadingNormalizer::new();
        h.update_heading(370.0);
        assert_eq!(h.current_heading(), Some(10.0));
        h.update_heading(-90.0);
        assert_eq!(h.current_heading(), Some(270.0));
        h.update_heading(360.0);
        assert_eq!(h.current_heading(), Some(0.0));
    }

    #[test]
    fn non_finite_heading_is_ignored() {
        let mut h = HeadingNormalizer::new();
        h.update_heading(45.0);
        h.update_heading(f64::NAN);
        assert_eq!(h.current_heading(), Some(45.0));

        let mut fresh = HeadingNormalizer::new();
        fresh.update_heading(f64::INFINITY);
        assert_eq!(fresh.latch(), LatchOutcome::Deferred);
    }

    #[test]
    fn normalize_degrees_range() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(normalize_degrees(-1.0), 359.0);
        let tiny = normalize_degrees(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }
}
