//! In-memory banded raster storage.

use image::DynamicImage;

use super::{GridError, PixelSource, Window};

/// Band-sequential raster samples held in memory as `f64`.
///
/// This is the working representation for every decoded source: small
/// enough for mosaic inputs, and uniform so the compositor never cares
/// about the original sample type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryGrid {
    width: usize,
    height: usize,
    bands: Vec<Vec<f64>>,
}

impl MemoryGrid {
    /// Creates a zero-filled grid.
    pub fn new(width: usize, height: usize, band_count: usize) -> Self {
        Self {
            width,
            height,
            bands: vec![vec![0.0; width * height]; band_count],
        }
    }

    /// Creates a grid with every sample set to `value`.
    pub fn from_constant(width: usize, height: usize, band_count: usize, value: f64) -> Self {
        Self {
            width,
            height,
            bands: vec![vec![value; width * height]; band_count],
        }
    }

    /// Wraps pre-built band vectors, each row-major with `width * height`
    /// samples.
    pub fn from_bands(
        width: usize,
        height: usize,
        bands: Vec<Vec<f64>>,
    ) -> Result<Self, GridError> {
        let expected = width * height;
        for band in &bands {
            if band.len() != expected {
                return Err(GridError::BandSizeMismatch {
                    given: band.len(),
                    expected,
                    width,
                    height,
                });
            }
        }
        Ok(Self {
            width,
            height,
            bands,
        })
    }

    /// Decodes a [`DynamicImage`] into one band per channel, widening
    /// samples to `f64` without rescaling.
    pub fn from_image(image: &DynamicImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let bands = match image {
            DynamicImage::ImageLuma8(buf) => collect_bands(buf.as_raw(), 1),
            DynamicImage::ImageLumaA8(buf) => collect_bands(buf.as_raw(), 2),
            DynamicImage::ImageRgb8(buf) => collect_bands(buf.as_raw(), 3),
            DynamicImage::ImageRgba8(buf) => collect_bands(buf.as_raw(), 4),
            DynamicImage::ImageLuma16(buf) => collect_bands(buf.as_raw(), 1),
            DynamicImage::ImageLumaA16(buf) => collect_bands(buf.as_raw(), 2),
            DynamicImage::ImageRgb16(buf) => collect_bands(buf.as_raw(), 3),
            DynamicImage::ImageRgba16(buf) => collect_bands(buf.as_raw(), 4),
            DynamicImage::ImageRgb32F(buf) => collect_bands(buf.as_raw(), 3),
            DynamicImage::ImageRgba32F(buf) => collect_bands(buf.as_raw(), 4),
            other => collect_bands(other.to_rgba8().as_raw(), 4),
        };
        Self {
            width,
            height,
            bands,
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

impl PixelSource for MemoryGrid {
    fn read_window(&self, band: usize, window: Window) -> Result<Vec<f64>, GridError> {
        if band == 0 || band > self.bands.len() {
            return Err(GridError::BandOutOfRange {
                band,
                bands: self.bands.len(),
            });
        }
        if window.x + window.width > self.width || window.y + window.height > self.height {
            return Err(GridError::WindowOutOfBounds {
                window,
                width: self.width,
                height: self.height,
            });
        }
        let data = &self.bands[band - 1];
        let mut samples = Vec::with_capacity(window.len());
        for row in window.y..window.y + window.height {
            let start = row * self.width + window.x;
            samples.extend_from_slice(&data[start..start + window.width]);
        }
        Ok(samples)
    }
}

/// De-interleaves packed channel samples into per-band vectors.
fn collect_bands<S>(samples: &[S], channels: usize) -> Vec<Vec<f64>>
where
    S: Copy + Into<f64>,
{
    let pixels = samples.len() / channels;
    let mut bands = vec![Vec::with_capacity(pixels); channels];
    for pixel in samples.chunks_exact(channels) {
        for (band, sample) in bands.iter_mut().zip(pixel) {
            band.push((*sample).into());
        }
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn counting_grid() -> MemoryGrid {
        // 4x3 grid, band 1 = index, band 2 = index * 10
        let base: Vec<f64> = (0..12).map(f64::from).collect();
        let tens: Vec<f64> = base.iter().map(|v| v * 10.0).collect();
        MemoryGrid::from_bands(4, 3, vec![base, tens]).unwrap()
    }

    #[test]
    fn test_full_window_read() {
        let grid = counting_grid();
        let samples = grid.read_window(1, Window::new(0, 0, 4, 3)).unwrap();
        assert_eq!(samples.len(), 12);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[11], 11.0);
    }

    #[test]
    fn test_partial_window_read() {
        let grid = counting_grid();
        // Rows 1..3, columns 1..3
        let samples = grid.read_window(1, Window::new(1, 1, 2, 2)).unwrap();
        assert_eq!(samples, vec![5.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_second_band_read() {
        let grid = counting_grid();
        let samples = grid.read_window(2, Window::new(3, 2, 1, 1)).unwrap();
        assert_eq!(samples, vec![110.0]);
    }

    #[test]
    fn test_band_zero_is_out_of_range() {
        let grid = counting_grid();
        let result = grid.read_window(0, Window::new(0, 0, 1, 1));
        assert!(matches!(
            result,
            Err(GridError::BandOutOfRange { band: 0, bands: 2 })
        ));
    }

    #[test]
    fn test_band_past_end_is_out_of_range() {
        let grid = counting_grid();
        let result = grid.read_window(3, Window::new(0, 0, 1, 1));
        assert!(matches!(result, Err(GridError::BandOutOfRange { .. })));
    }

    #[test]
    fn test_window_out_of_bounds() {
        let grid = counting_grid();
        let result = grid.read_window(1, Window::new(2, 0, 3, 1));
        assert!(matches!(result, Err(GridError::WindowOutOfBounds { .. })));
    }

    #[test]
    fn test_from_bands_rejects_short_band() {
        let result = MemoryGrid::from_bands(4, 3, vec![vec![0.0; 11]]);
        assert!(matches!(result, Err(GridError::BandSizeMismatch { .. })));
    }

    #[test]
    fn test_new_grid_is_zero_filled() {
        let grid = MemoryGrid::new(2, 2, 1);
        assert_eq!(grid.read_window(1, Window::new(0, 0, 2, 2)).unwrap(), vec![0.0; 4]);
    }

    #[test]
    fn test_from_constant() {
        let grid = MemoryGrid::from_constant(2, 1, 3, 5.5);
        assert_eq!(grid.band_count(), 3);
        assert_eq!(grid.get(3, 1, 0), 5.5);
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut grid = MemoryGrid::new(3, 3, 2);
        grid.set(2, 1, 2, 42.0);
        assert_eq!(grid.get(2, 1, 2), 42.0);
        assert_eq!(grid.get(1, 1, 2), 0.0);
    }

    #[test]
    fn test_from_image_splits_rgb_channels() {
        let image = RgbImage::from_fn(2, 2, |x, y| Rgb([(x + 10 * y) as u8, 100, 200]));
        let grid = MemoryGrid::from_image(&DynamicImage::ImageRgb8(image));
        assert_eq!(grid.band_count(), 3);
        assert_eq!(grid.get(1, 0, 0), 0.0);
        assert_eq!(grid.get(1, 1, 1), 11.0);
        assert_eq!(grid.get(2, 0, 0), 100.0);
        assert_eq!(grid.get(3, 1, 0), 200.0);
    }

    #[test]
    fn test_from_image_preserves_16_bit_range() {
        let mut image = image::ImageBuffer::<image::Luma<u16>, Vec<u16>>::new(1, 1);
        image.put_pixel(0, 0, image::Luma([40000u16]));
        let grid = MemoryGrid::from_image(&DynamicImage::ImageLuma16(image));
        assert_eq!(grid.get(1, 0, 0), 40000.0);
    }
}
