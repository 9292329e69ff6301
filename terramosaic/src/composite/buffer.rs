//! The destination pixel buffer sources paint into.

/// Band-sequential output samples, initialized to the background fill and
/// overwritten as sources paint.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicBuffer {
    width: usize,
    height: usize,
    bands: Vec<Vec<f64>>,
}

impl MosaicBuffer {
    /// Creates a buffer with one band per fill value, each filled with its
    /// background value.
    pub fn filled(width: usize, height: usize, fill: &[f64]) -> Self {
        Self {
            width,
            height,
            bands: fill.iter().map(|&value| vec![value; width * height]).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Row-major samples of a 1-based band.
    ///
    /// # Panics
    ///
    /// Panics if the band is out of range.
    pub fn band(&self, band: usize) -> &[f64] {
        &self.bands[band - 1]
    }

    /// Sample at `(x, y)` of a 1-based band.
    ///
    /// # Panics
    ///
    /// Panics if the band or coordinates are out of range.
    pub fn get(&self, band: usize, x: usize, y: usize) -> f64 {
        self.bands[band - 1][y * self.width + x]
    }

    /// Overwrites the sample at `(x, y)` of a 1-based band.
    ///
    /// # Panics
    ///
    /// Panics if the band or coordinates are out of range.
    pub fn set(&mut self, band: usize, x: usize, y: usize, value: f64) {
        self.bands[band - 1][y * self.width + x] = value;
    }
}
