//! Affine geotransforms mapping pixel space to world space.
//!
//! A geotransform follows the GDAL six-coefficient convention:
//!
//! ```text
//! x_world = origin_x + col * pixel_width     + row * row_rotation
//! y_world = origin_y + col * column_rotation + row * pixel_height
//! ```
//!
//! Pixel (0, 0) is the top-left corner of the top-left pixel. North-up
//! rasters have zero rotation terms and a negative `pixel_height`, so row
//! indices grow southward.

use super::BoundingBox;

/// Determinants smaller than this are treated as non-invertible.
const MIN_DETERMINANT: f64 = 1.0e-15;

/// Affine map between pixel coordinates and world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// World x of the top-left corner of pixel (0, 0).
    pub origin_x: f64,
    /// World x step per column.
    pub pixel_width: f64,
    /// World x step per row.
    pub row_rotation: f64,
    /// World y of the top-left corner of pixel (0, 0).
    pub origin_y: f64,
    /// World y step per column.
    pub column_rotation: f64,
    /// World y step per row, negative for north-up rasters.
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Builds a transform from GDAL coefficient order
    /// `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`.
    pub fn from_coefficients(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            column_rotation: c[4],
            pixel_height: c[5],
        }
    }

    /// Returns the coefficients in GDAL order.
    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.column_rotation,
            self.pixel_height,
        ]
    }

    /// Builds an axis-aligned transform from a top-left corner and positive
    /// pixel sizes. Rows grow southward.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size_x: f64, pixel_size_y: f64) -> Self {
        Self {
            origin_x,
            pixel_width: pixel_size_x,
            row_rotation: 0.0,
            origin_y,
            column_rotation: 0.0,
            pixel_height: -pixel_size_y,
        }
    }

    /// Applies the affine map to a coordinate pair.
    ///
    /// For a forward transform the input is `(col, row)` in pixel space and
    /// the output is `(x, y)` in world space. An inverted transform maps the
    /// other way with the same call.
    #[inline]
    pub fn apply(&self, a: f64, b: f64) -> (f64, f64) {
        (
            self.origin_x + a * self.pixel_width + b * self.row_rotation,
            self.origin_y + a * self.column_rotation + b * self.pixel_height,
        )
    }

    /// Computes the inverse affine map, or `None` when the transform is
    /// singular (collinear axes or a zero-size pixel).
    pub fn invert(&self) -> Option<GeoTransform> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.column_rotation;
        if det.abs() < MIN_DETERMINANT {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(GeoTransform {
            origin_x: (self.row_rotation * self.origin_y - self.origin_x * self.pixel_height)
                * inv_det,
            pixel_width: self.pixel_height * inv_det,
            row_rotation: -self.row_rotation * inv_det,
            origin_y: (self.origin_x * self.column_rotation - self.pixel_width * self.origin_y)
                * inv_det,
            column_rotation: -self.column_rotation * inv_det,
            pixel_height: self.pixel_width * inv_det,
        })
    }

    /// Absolute pixel size per axis, `(|pixel_width|, |pixel_height|)`.
    #[inline]
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }

    /// World-space extent of a `width` x `height` pixel grid under this
    /// transform, from the min/max over the four transformed grid corners.
    pub fn grid_extent(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for (x, y) in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        // Non-zero pixel sizes keep both spans non-empty
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}
