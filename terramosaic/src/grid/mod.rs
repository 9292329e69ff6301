//! Pixel access for mosaic sources.
//!
//! The [`PixelSource`] trait is the seam between the compositor and raster
//! storage: the compositor asks for one band window at a time and receives
//! row-major `f64` samples, whatever the underlying sample type. The
//! in-memory implementation lives in [`MemoryGrid`]; file formats decode
//! into it when a source is opened.

mod memory;

pub use memory::MemoryGrid;

use std::fmt;

use thiserror::Error;

/// A rectangular pixel region, in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Leftmost column.
    pub x: usize,
    /// Topmost row.
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Window {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of pixels covered by the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Errors raised by pixel reads.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// Requested band index outside `1..=bands`.
    #[error("Band {band} out of range, raster has {bands} bands")]
    BandOutOfRange { band: usize, bands: usize },

    /// Requested window reaches outside the raster.
    #[error("Window {window} exceeds raster bounds {width}x{height}")]
    WindowOutOfBounds {
        window: Window,
        width: usize,
        height: usize,
    },

    /// Band data length disagrees with the raster dimensions.
    #[error("Band data holds {given} samples, expected {expected} for {width}x{height}")]
    BandSizeMismatch {
        given: usize,
        expected: usize,
        width: usize,
        height: usize,
    },

    /// The backing store failed to produce samples.
    #[error("Read failed: {0}")]
    ReadFailed(String),
}

/// Read access to banded raster samples.
///
/// Band indices are 1-based throughout, matching GIS convention.
/// Implementations must be thread-safe so sources can be shared across
/// compositing work.
pub trait PixelSource: Send + Sync {
    /// Reads one band within a window as row-major `f64` samples.
    ///
    /// # Arguments
    ///
    /// * `band` - 1-based band index
    /// * `window` - Pixel region, fully inside the raster
    ///
    /// # Errors
    ///
    /// Returns `GridError` if the band index or window is out of range, or
    /// the backing store cannot be read.
    fn read_window(&self, band: usize, window: Window) -> Result<Vec<f64>, GridError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct MockSource {
        should_fail: bool,
    }

    impl PixelSource for MockSource {
        fn read_window(&self, _band: usize, window: Window) -> Result<Vec<f64>, GridError> {
            if self.should_fail {
                Err(GridError::ReadFailed("mock failure".to_string()))
            } else {
                Ok(vec![7.0; window.len()])
            }
        }
    }

    #[test]
    fn test_trait_object_read() {
        let source: Arc<dyn PixelSource> = Arc::new(MockSource { should_fail: false });
        let samples = source.read_window(1, Window::new(0, 0, 2, 3)).unwrap();
        assert_eq!(samples, vec![7.0; 6]);
    }

    #[test]
    fn test_trait_object_failure() {
        let source: Box<dyn PixelSource> = Box::new(MockSource { should_fail: true });
        let result = source.read_window(1, Window::new(0, 0, 1, 1));
        assert!(matches!(result, Err(GridError::ReadFailed(_))));
    }

    #[test]
    fn test_window_len() {
        assert_eq!(Window::new(5, 9, 4, 3).len(), 12);
        assert!(Window::new(0, 0, 0, 3).is_empty());
        assert!(!Window::new(0, 0, 1, 1).is_empty());
    }

    #[test]
    fn test_window_display() {
        assert_eq!(Window::new(2, 3, 10, 20).to_string(), "10x20+2+3");
    }

    #[test]
    fn test_pixel_source_is_object_safe_and_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn PixelSource>();
    }
}
