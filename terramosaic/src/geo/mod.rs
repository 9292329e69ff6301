//! Georeferencing primitives: affine geotransforms and bounding boxes.
//!
//! Everything downstream of source ingestion works in these two types.
//! World coordinates are whatever linear system the sources share; the
//! mosaic engine never interprets them beyond affine arithmetic.

mod bbox;
mod transform;

pub use bbox::{BoundingBox, BoundingBoxError};
pub use transform::GeoTransform;
