use plt::Coordinate;

use crate::{great_circle_distance, to_cartesian};

const WINDOW_SIZE: usize = 2;

/// Movement between two consecutive trackpoints
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub from: Coordinate,
    pub to: Coordinate,
    /// Great-circle distance in meters
    pub distance: f64,
    /// Straight-line distance between the Earth-centered points in meters
    pub chord: f64,
    /// Absolute difference of the Earth-centered `z` components in meters
    pub vertical: f64,
    /// Milliseconds, zero if time goes backwards
    pub duration: u64,
}

impl Segment {
    pub fn new(from: Coordinate, to: Coordinate) -> Self {
        let (start, end) = (to_cartesian(&from), to_cartesian(&to));

        Self {
            from,
            to,
            distance: great_circle_distance(&from, &to),
            chord: start.distance(&end),
            vertical: (end.z - start.z).abs(),
            duration: to.time.saturating_sub(from.time),
        }
    }

    /// Speed in km/h, `None` when no time elapsed
    pub fn speed_kmhr(&self) -> Option<f64> {
        if self.duration == 0 {
            return None;
        }

        Some((self.distance / 1000.0) / (self.duration as f64 / 1000.0 / 60.0 / 60.0))
    }
}

/// Segments between consecutive coordinates, in input order
pub fn segments(coordinates: &[Coordinate]) -> Vec<Segment> {
    coordinates
        .windows(WINDOW_SIZE)
        .map(|this| Segment::new(this[0], this[1]))
        .collect()
}

/// Sum of great-circle distances between consecutive coordinates in meters
pub fn total_distance(coordinates: &[Coordinate]) -> f64 {
    coordinates
        .windows(WINDOW_SIZE)
        .map(|this| great_circle_distance(&this[0], &this[1]))
        .sum()
}
