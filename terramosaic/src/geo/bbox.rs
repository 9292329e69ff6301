//! Axis-aligned bounding boxes in georeferenced coordinates.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised when constructing or parsing a bounding box.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoundingBoxError {
    /// Minimum not strictly below maximum on at least one axis.
    #[error("Bounding box is empty: x [{min_x}, {max_x}], y [{min_y}, {max_y}]")]
    EmptyExtent {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    /// Input did not parse as four comma separated reals.
    #[error("Bounding box '{0}' should be four comma separated values: xmin,ymin,xmax,ymax")]
    Malformed(String),
}

/// An axis-aligned extent in the coordinate system of the sources.
///
/// `min_x < max_x` and `min_y < max_y` hold for every box built through
/// [`BoundingBox::new`] or parsed from text. Union and intersection stay in
/// world coordinates; converting to pixel space is the alignment step's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Creates a bounding box, rejecting empty or inverted extents.
    ///
    /// Non-finite coordinates fail the ordering comparison and are rejected
    /// the same way.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, BoundingBoxError> {
        if !(min_x < max_x && min_y < max_y) {
            return Err(BoundingBoxError::EmptyExtent {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Width of the box in world units.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box in world units.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Overlap of `self` and `other`, or `None` when they only touch or are
    /// disjoint.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);
        if min_x < max_x && min_y < max_y {
            Some(BoundingBox {
                min_x,
                min_y,
                max_x,
                max_y,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl FromStr for BoundingBox {
    type Err = BoundingBoxError;

    /// Parses `"xmin,ymin,xmax,ymax"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BoundingBoxError::Malformed(s.to_string()));
        }
        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BoundingBoxError::Malformed(s.to_string()))?;
        }
        BoundingBox::new(values[0], values[1], values[2], values[3])
    }
}
