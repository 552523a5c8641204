//! Geodetic conversions for track coordinates.
//!
//! Cartesian points use a biaxial ellipsoid:
//!
//! ```norust
//! k = 1 − (B/A)²
//! N(φ) = A / √(1 − k·sin²φ)
//! x = (N(φ) + h)·cosφ·cosλ
//! y = (N(φ) + h)·cosφ·sinλ
//! z = (N(φ)·(1 − k) + h)·sinφ
//! ```
//!
//! Surface distance uses a sphere of radius [`EARTH_RADIUS`]:
//!
//! ```norust
//! Δλ = λ2 − λ1
//! y = √((cosφ2·sinΔλ)² + (cosφ1·sinφ2 − sinφ1·cosφ2·cosΔλ)²)
//! x = sinφ1·sinφ2 + cosφ1·cosφ2·cosΔλ
//! d = atan2(y, x)·R
//! ```
//!
//! where:
//!
//! - φ – latitude in radians;
//! - λ – longitude in radians;
//! - h – altitude in meters.
//!
//! The two Earth models are deliberately not reconciled.
//! No input is validated; degenerate input yields NaN or infinite output.

mod normalize;
mod segments;

pub use normalize::*;
pub use segments::*;

use plt::Coordinate;

/// Ellipsoid semi-major axis in meters
pub const ELLIPSOID_A: f64 = 6378137.0;

/// Ellipsoid semi-minor axis in meters
pub const ELLIPSOID_B: f64 = 6356752.31;

/// Radius of the sphere used for surface distances, in meters
pub const EARTH_RADIUS: f64 = 6372795.0;

/// First eccentricity squared of the ellipsoid
const K: f64 = 1.0 - (ELLIPSOID_B * ELLIPSOID_B) / (ELLIPSOID_A * ELLIPSOID_A);

/// Earth-centered point in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CartesianPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianPoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Straight-line distance in meters
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

    pub fn norm(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }
}

impl std::ops::Sub for CartesianPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl From<Coordinate> for CartesianPoint {
    fn from(value: Coordinate) -> Self {
        to_cartesian(&value)
    }
}

/// Convert a geodetic coordinate to an Earth-centered point
pub fn to_cartesian(coordinate: &Coordinate) -> CartesianPoint {
    let phi = coordinate.latitude.to_radians();
    let lambda = coordinate.longitude.to_radians();
    let h = coordinate.altitude;

    let (sin_phi, cos_phi) = phi.sin_cos();
    let n = ELLIPSOID_A / (1.0 - K * sin_phi * sin_phi).sqrt();

    CartesianPoint {
        x: (n + h) * cos_phi * lambda.cos(),
        y: (n + h) * cos_phi * lambda.sin(),
        z: (n * (1.0 - K) + h) * sin_phi,
    }
}

/// Surface distance between two coordinates in meters
pub fn great_circle_distance(first: &Coordinate, second: &Coordinate) -> f64 {
    let latitude_1 = first.latitude.to_radians();
    let latitude_2 = second.latitude.to_radians();
    let delta = second.longitude.to_radians() - first.longitude.to_radians();

    let (sin_lat_1, cos_lat_1) = latitude_1.sin_cos();
    let (sin_lat_2, cos_lat_2) = latitude_2.sin_cos();
    let (sin_delta, cos_delta) = delta.sin_cos();

    let y = ((cos_lat_2 * sin_delta).powi(2)
        + (cos_lat_1 * sin_lat_2 - sin_lat_1 * cos_lat_2 * cos_delta).powi(2))
    .sqrt();
    let x = sin_lat_1 * sin_lat_2 + cos_lat_1 * cos_lat_2 * cos_delta;

    y.atan2(x) * EARTH_RADIUS
}
