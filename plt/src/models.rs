/// Altitude written by loggers when the fix has no altitude
pub const UNKNOWN_ALTITUDE: f64 = 777.0;

/// Tolerance used to recognise [`UNKNOWN_ALTITUDE`]
pub const ALTITUDE_EPSILON: f64 = 1e-9;

/// A single GPS fix
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    /// Degrees, not range checked
    pub latitude: f64,
    /// Degrees, not range checked or normalized
    pub longitude: f64,
    /// Meters above the reference datum, `0.0` when unknown
    pub altitude: f64,
    /// Milliseconds since the Unix epoch
    pub time: u64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64, altitude: f64, time: u64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            time,
        }
    }
}

/// Map the unknown-altitude marker to `0.0`
#[inline]
pub fn corrected_altitude(altitude: f64) -> f64 {
    match (altitude - UNKNOWN_ALTITUDE).abs() <= ALTITUDE_EPSILON {
        true => 0.0,
        false => altitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_altitude_becomes_zero() {
        assert_eq!(corrected_altitude(777.0), 0.0);
        assert_eq!(corrected_altitude(777.0 + 1e-10), 0.0);
        assert_eq!(corrected_altitude(777.0 - 1e-10), 0.0);
    }

    #[test]
    fn nearby_altitudes_unchanged() {
        assert_eq!(corrected_altitude(776.9), 776.9);
        assert_eq!(corrected_altitude(777.1), 777.1);
        assert_eq!(corrected_altitude(-777.0), -777.0);
        assert_eq!(corrected_altitude(0.0), 0.0);
    }
}
