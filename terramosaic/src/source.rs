//! Descriptions of mosaic input rasters.
//!
//! A [`SourceDescriptor`] carries everything the geometry pipeline needs to
//! know about one input: its geotransform, pixel dimensions, band count,
//! spatial reference and per-band nodata. Pixel data itself stays behind
//! the [`PixelSource`](crate::grid::PixelSource) trait so descriptors can be
//! validated and reconciled without touching sample memory.

use thiserror::Error;

use crate::geo::{BoundingBox, GeoTransform};

/// Errors raised while validating a source description.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    /// Raster dimensions must both be at least one pixel.
    #[error("Source '{name}' has empty raster dimensions {width}x{height}")]
    EmptyRaster {
        name: String,
        width: usize,
        height: usize,
    },

    /// At least one band is required.
    #[error("Source '{name}' has no raster bands")]
    NoBands { name: String },

    /// The geotransform must step a non-zero distance per pixel on each axis.
    #[error("Source '{name}' has a zero pixel size")]
    ZeroPixelSize { name: String },

    /// Per-band nodata must list one entry per band.
    #[error("Source '{name}' declares {given} nodata entries for {bands} bands")]
    NodataLength {
        name: String,
        given: usize,
        bands: usize,
    },
}

/// Georeferencing and shape metadata for one mosaic input.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    name: String,
    transform: GeoTransform,
    width: usize,
    height: usize,
    band_count: usize,
    spatial_ref: Option<String>,
    band_nodata: Vec<Option<f64>>,
}

impl SourceDescriptor {
    /// Creates a descriptor, validating dimensions, band count and pixel
    /// sizes. Nodata defaults to unset for every band and the spatial
    /// reference to none.
    pub fn new(
        name: impl Into<String>,
        transform: GeoTransform,
        width: usize,
        height: usize,
        band_count: usize,
    ) -> Result<Self, SourceError> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(SourceError::EmptyRaster {
                name,
                width,
                height,
            });
        }
        if band_count == 0 {
            return Err(SourceError::NoBands { name });
        }
        let (res_x, res_y) = transform.resolution();
        if res_x == 0.0 || res_y == 0.0 {
            return Err(SourceError::ZeroPixelSize { name });
        }
        Ok(Self {
            name,
            transform,
            width,
            height,
            band_count,
            spatial_ref: None,
            band_nodata: vec![None; band_count],
        })
    }

    /// Attaches an opaque spatial reference string.
    ///
    /// The engine only ever compares these for equality; it never parses
    /// them.
    pub fn with_spatial_ref(mut self, spatial_ref: impl Into<String>) -> Self {
        self.spatial_ref = Some(spatial_ref.into());
        self
    }

    /// Sets per-band nodata values, one entry per band in band order.
    pub fn with_band_nodata(mut self, nodata: Vec<Option<f64>>) -> Result<Self, SourceError> {
        if nodata.len() != self.band_count {
            return Err(SourceError::NodataLength {
                name: self.name,
                given: nodata.len(),
                bands: self.band_count,
            });
        }
        self.band_nodata = nodata;
        Ok(self)
    }

    /// Sets the same nodata value on every band.
    pub fn with_uniform_nodata(mut self, nodata: f64) -> Self {
        self.band_nodata = vec![Some(nodata); self.band_count];
        self
    }

    /// Display name of the source, typically its path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixel-to-world geotransform.
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Raster width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of bands.
    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// Opaque spatial reference, if any.
    pub fn spatial_ref(&self) -> Option<&str> {
        self.spatial_ref.as_deref()
    }

    /// Nodata declared for a 1-based band index, if any.
    pub fn band_nodata(&self, band: usize) -> Option<f64> {
        debug_assert!(band >= 1 && band <= self.band_count);
        self.band_nodata.get(band - 1).copied().flatten()
    }

    /// Absolute pixel size per axis.
    pub fn resolution(&self) -> (f64, f64) {
        self.transform.resolution()
    }

    /// World-space footprint of the raster.
    pub fn extent(&self) -> BoundingBox {
        self.transform.grid_extent(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degree_transform() -> GeoTransform {
        GeoTransform::from_coefficients([2.0, 1.0, 0.0, 49.0, 0.0, -1.0])
    }

    #[test]
    fn test_new_descriptor_defaults() {
        let desc = SourceDescriptor::new("a.png", degree_transform(), 3, 2, 4).unwrap();
        assert_eq!(desc.name(), "a.png");
        assert_eq!(desc.band_count(), 4);
        assert_eq!(desc.spatial_ref(), None);
        for band in 1..=4 {
            assert_eq!(desc.band_nodata(band), None);
        }
    }

    #[test]
    fn test_rejects_empty_raster() {
        let result = SourceDescriptor::new("a.png", degree_transform(), 0, 2, 1);
        assert!(matches!(result, Err(SourceError::EmptyRaster { .. })));
    }

    #[test]
    fn test_rejects_zero_bands() {
        let result = SourceDescriptor::new("a.png", degree_transform(), 2, 2, 0);
        assert!(matches!(result, Err(SourceError::NoBands { .. })));
    }

    #[test]
    fn test_rejects_zero_pixel_size() {
        let gt = GeoTransform::from_coefficients([2.0, 0.0, 0.0, 49.0, 0.0, -1.0]);
        let result = SourceDescriptor::new("a.png", gt, 2, 2, 1);
        assert!(matches!(result, Err(SourceError::ZeroPixelSize { .. })));
    }

    #[test]
    fn test_extent_of_single_pixel() {
        let desc = SourceDescriptor::new("a.png", degree_transform(), 1, 1, 1).unwrap();
        let bbox = desc.extent();
        assert_eq!(bbox.min_x, 2.0);
        assert_eq!(bbox.max_x, 3.0);
        assert_eq!(bbox.min_y, 48.0);
        assert_eq!(bbox.max_y, 49.0);
    }

    #[test]
    fn test_band_nodata_round_trip() {
        let desc = SourceDescriptor::new("a.png", degree_transform(), 2, 2, 3)
            .unwrap()
            .with_band_nodata(vec![Some(0.0), None, Some(255.0)])
            .unwrap();
        assert_eq!(desc.band_nodata(1), Some(0.0));
        assert_eq!(desc.band_nodata(2), None);
        assert_eq!(desc.band_nodata(3), Some(255.0));
    }

    #[test]
    fn test_band_nodata_length_mismatch() {
        let result = SourceDescriptor::new("a.png", degree_transform(), 2, 2, 3)
            .unwrap()
            .with_band_nodata(vec![Some(0.0)]);
        assert!(matches!(result, Err(SourceError::NodataLength { .. })));
    }

    #[test]
    fn test_uniform_nodata() {
        let desc = SourceDescriptor::new("a.png", degree_transform(), 2, 2, 2)
            .unwrap()
            .with_uniform_nodata(1.0);
        assert_eq!(desc.band_nodata(1), Some(1.0));
        assert_eq!(desc.band_nodata(2), Some(1.0));
    }

    #[test]
    fn test_spatial_ref_attachment() {
        let desc = SourceDescriptor::new("a.png", degree_transform(), 2, 2, 1)
            .unwrap()
            .with_spatial_ref("EPSG:4326");
        assert_eq!(desc.spatial_ref(), Some("EPSG:4326"));
    }
}
