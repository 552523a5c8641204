//! Fit a track into a pixel canvas.
//!
//! Coordinates are projected onto the `x`/`y` plane of their Earth-centered
//! points, `y` is flipped so north-east tracks grow up and to the right, and
//! each axis is scaled independently into the canvas minus its padding.

use geodesy::{relative_to_min, to_cartesian};
use plt::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// Margin kept free on every side
    pub padding: u32,
}

impl Canvas {
    pub const fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    const fn work_width(&self) -> u32 {
        self.width.saturating_sub(self.padding.saturating_mul(2))
    }

    const fn work_height(&self) -> u32 {
        self.height.saturating_sub(self.padding.saturating_mul(2))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fit {
    pub points: Vec<PixelPoint>,
    /// Meters per pixel along each axis, zero for an axis without extent
    pub meters_per_pixel: (f64, f64),
}

pub fn fit_to_canvas(coordinates: &[Coordinate], canvas: Canvas) -> Fit {
    if coordinates.is_empty() {
        return Fit::default();
    }

    let projected = coordinates.iter().map(to_cartesian).collect::<Vec<_>>();
    let shifted = relative_to_min(&projected);

    let x_extent = shifted.iter().map(|this| this.x).fold(0.0, f64::max);
    let y_extent = shifted.iter().map(|this| this.y).fold(0.0, f64::max);

    let scale = |work: u32, extent: f64| match extent > 0.0 {
        true => f64::from(work) / extent,
        false => 0.0,
    };

    let scale_x = scale(canvas.work_width(), x_extent);
    let scale_y = scale(canvas.work_height(), y_extent);
    let padding = f64::from(canvas.padding);

    let points = shifted
        .into_iter()
        .map(|this| PixelPoint {
            x: padding + this.x * scale_x,
            y: padding + (y_extent - this.y) * scale_y,
        })
        .collect();

    let meters_per_pixel = |scale: f64| match scale > 0.0 {
        true => 1.0 / scale,
        false => 0.0,
    };

    Fit {
        points,
        meters_per_pixel: (meters_per_pixel(scale_x), meters_per_pixel(scale_y)),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const CANVAS: Canvas = Canvas::new(800, 600, 25);

    #[test]
    fn empty_track() {
        assert_eq!(fit_to_canvas(&[], CANVAS), Fit::default());
    }

    #[test]
    fn single_point_sits_at_padding() {
        let fit = fit_to_canvas(&[Coordinate::new(39.9, 116.4, 50.0, 0)], CANVAS);

        assert_eq!(fit.points, vec![PixelPoint { x: 25.0, y: 25.0 }]);
        assert_eq!(fit.meters_per_pixel, (0.0, 0.0));
    }

    #[test]
    fn points_span_padded_area() {
        let coordinates = [
            Coordinate::new(39.90, 116.40, 0.0, 0),
            Coordinate::new(39.91, 116.41, 0.0, 1000),
            Coordinate::new(39.92, 116.39, 0.0, 2000),
        ];

        let fit = fit_to_canvas(&coordinates, CANVAS);

        let xs = || fit.points.iter().map(|this| this.x);
        let ys = || fit.points.iter().map(|this| this.y);

        let min_x = xs().fold(f64::INFINITY, f64::min);
        let max_x = xs().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys().fold(f64::INFINITY, f64::min);
        let max_y = ys().fold(f64::NEG_INFINITY, f64::max);

        assert_relative_eq!(min_x, 25.0, max_relative = 1e-9);
        assert_relative_eq!(max_x, 775.0, max_relative = 1e-9);
        assert_relative_eq!(min_y, 25.0, max_relative = 1e-9);
        assert_relative_eq!(max_y, 575.0, max_relative = 1e-9);
        assert!(fit.meters_per_pixel.0 > 0.0);
        assert!(fit.meters_per_pixel.1 > 0.0);
    }

    #[test]
    fn padding_larger_than_canvas() {
        let coordinates = [
            Coordinate::new(0.0, 0.0, 0.0, 0),
            Coordinate::new(1.0, 1.0, 0.0, 0),
        ];

        let fit = fit_to_canvas(&coordinates, Canvas::new(10, 10, 20));

        assert!(
            fit.points
                .iter()
                .all(|this| *this == PixelPoint { x: 20.0, y: 20.0 })
        );
    }

    #[test]
    fn huge_padding_does_not_overflow() {
        let coordinates = [
            Coordinate::new(0.0, 0.0, 0.0, 0),
            Coordinate::new(1.0, 1.0, 0.0, 0),
        ];

        let canvas = Canvas::new(800, 800, 3_000_000_000);
        let fit = fit_to_canvas(&coordinates, canvas);

        assert_eq!(canvas.work_width(), 0);
        assert_eq!(canvas.work_height(), 0);
        assert!(
            fit.points
                .iter()
                .all(|this| *this == PixelPoint { x: 3e9, y: 3e9 })
        );
    }
}
