//! Turning the reconciled world geometry into output raster dimensions.
//!
//! The bounding box and per-axis resolution become a pixel grid here:
//! width and height are the rounded span over the resolution, and the
//! output geotransform is north-up with its origin at the top-left corner.
//! With target-aligned pixels the box is first widened outward so every
//! pixel edge lands on an integer multiple of the resolution.

use crate::geo::{BoundingBox, GeoTransform};
use crate::reconcile::ReconciledGeometry;

/// Absolute epsilon, in pixel units, absorbed by the snap rounding.
///
/// `1.8 / 0.3` is `5.999999...` in floating point; without the epsilon a
/// plain floor would pull an already aligned edge a full pixel outward and
/// snapping would not be idempotent.
const SNAP_EPSILON: f64 = 1.0e-8;

/// Finalized output raster geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputShape {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
}

impl OutputShape {
    /// World-space footprint of the output raster.
    pub fn extent(&self) -> BoundingBox {
        self.transform.grid_extent(self.width, self.height)
    }
}

/// Computes output dimensions and geotransform from the reconciled
/// geometry.
///
/// Dimensions are clamped to at least one pixel per axis, so a bounding
/// box smaller than a pixel still yields a 1x1 raster.
pub fn align(geometry: &ReconciledGeometry, target_aligned_pixels: bool) -> OutputShape {
    let bounds = if target_aligned_pixels {
        snap_bounds(&geometry.bounds, geometry.res_x, geometry.res_y)
    } else {
        geometry.bounds
    };
    let width = span_pixels(bounds.width(), geometry.res_x);
    let height = span_pixels(bounds.height(), geometry.res_y);
    let transform = GeoTransform::north_up(
        bounds.min_x,
        bounds.max_y,
        geometry.res_x,
        geometry.res_y,
    );

    tracing::debug!(
        width,
        height,
        origin_x = transform.origin_x,
        origin_y = transform.origin_y,
        "aligned output grid"
    );

    OutputShape {
        width,
        height,
        transform,
    }
}

/// Widens the box outward to the enclosing multiples of the resolution.
fn snap_bounds(bounds: &BoundingBox, res_x: f64, res_y: f64) -> BoundingBox {
    BoundingBox {
        min_x: snap_floor(bounds.min_x, res_x),
        min_y: snap_floor(bounds.min_y, res_y),
        max_x: snap_ceil(bounds.max_x, res_x),
        max_y: snap_ceil(bounds.max_y, res_y),
    }
}

fn snap_floor(value: f64, step: f64) -> f64 {
    (value / step + SNAP_EPSILON).floor() * step
}

fn snap_ceil(value: f64, step: f64) -> f64 {
    (value / step - SNAP_EPSILON).ceil() * step
}

fn span_pixels(span: f64, res: f64) -> usize {
    ((span / res).round() as i64).max(1) as usize
}
