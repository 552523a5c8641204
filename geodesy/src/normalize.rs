//! Optional post-processing steps.
//!
//! Nothing in this crate applies them implicitly: [`crate::to_cartesian`]
//! and [`crate::great_circle_distance`] take coordinates exactly as parsed.

use plt::Coordinate;

use crate::CartesianPoint;

/// Wrap a longitude into `[-180, 180)` degrees
#[inline]
pub fn normalize_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

/// Copy of `coordinate` with its longitude wrapped into `[-180, 180)`.
/// Latitude is left alone.
pub fn normalized(coordinate: Coordinate) -> Coordinate {
    Coordinate {
        longitude: normalize_longitude(coordinate.longitude),
        ..coordinate
    }
}

/// Shift points so `origin` becomes `(0, 0, 0)`
pub fn relative_to(points: &[CartesianPoint], origin: CartesianPoint) -> Vec<CartesianPoint> {
    points.iter().map(|point| *point - origin).collect()
}

/// Shift points so their component-wise minimum becomes `(0, 0, 0)`
pub fn relative_to_min(points: &[CartesianPoint]) -> Vec<CartesianPoint> {
    let min = points.iter().fold(
        CartesianPoint::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        |min, point| CartesianPoint {
            x: min.x.min(point.x),
            y: min.y.min(point.y),
            z: min.z.min(point.z),
        },
    );

    relative_to(points, min)
}
