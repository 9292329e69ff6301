//! End-to-end mosaic assembly.
//!
//! [`mosaic`] is the library entry point: it reconciles source geometries,
//! finalizes the output grid, resolves bands and nodata, then paints every
//! source into one buffer. The [`MosaicSpec`] carries the caller's choices
//! and defaults to the strictest behavior, requiring all sources to share
//! one resolution and taking every band from homogeneous sources.

use thiserror::Error;

use crate::align::{align, OutputShape};
use crate::bands::{plan_bands, BandError};
use crate::composite::{CompositeError, Compositor, MosaicBuffer, MosaicInput};
use crate::geo::BoundingBox;
use crate::nodata::{resolve_nodata, NodataError};
use crate::progress::{MosaicProgress, ProgressCallback};
use crate::reconcile::{reconcile, ReconcileError, ResolutionPolicy};
use crate::source::SourceDescriptor;

/// Errors raised anywhere in a mosaic run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MosaicError {
    /// Source geometries could not be reconciled.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// The band selection is invalid for the sources.
    #[error(transparent)]
    Bands(#[from] BandError),

    /// The nodata configuration is invalid for the output band count.
    #[error(transparent)]
    Nodata(#[from] NodataError),

    /// Painting failed or was cancelled.
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

/// Caller choices for one mosaic run.
///
/// The default spec mosaics every band of homogeneous sources at their
/// shared resolution, over the union of their extents, with no nodata
/// handling.
#[derive(Debug, Clone, Default)]
pub struct MosaicSpec {
    /// Output bounds override. Taken verbatim; no clamping to source
    /// extents.
    pub bounds: Option<BoundingBox>,
    /// How the output pixel size is derived.
    pub resolution: ResolutionPolicy,
    /// Snap bounds outward onto the resolution grid before sizing.
    pub target_aligned_pixels: bool,
    /// 1-based source bands to copy, in output order. `None` copies all.
    pub bands: Option<Vec<usize>>,
    /// Nodata override applied to every source, one value or one per
    /// output band.
    pub src_nodata: Option<Vec<f64>>,
    /// Output nodata, used as background fill and advertised in metadata.
    pub dst_nodata: Option<Vec<f64>>,
    /// Keep the nodata fill but drop it from output metadata.
    pub hide_nodata: bool,
}

impl MosaicSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_resolution(mut self, resolution: ResolutionPolicy) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_target_aligned_pixels(mut self, enabled: bool) -> Self {
        self.target_aligned_pixels = enabled;
        self
    }

    pub fn with_bands(mut self, bands: Vec<usize>) -> Self {
        self.bands = Some(bands);
        self
    }

    pub fn with_src_nodata(mut self, values: Vec<f64>) -> Self {
        self.src_nodata = Some(values);
        self
    }

    pub fn with_dst_nodata(mut self, values: Vec<f64>) -> Self {
        self.dst_nodata = Some(values);
        self
    }

    pub fn with_hide_nodata(mut self, enabled: bool) -> Self {
        self.hide_nodata = enabled;
        self
    }
}

/// A finished mosaic: pixels plus the metadata a writer needs.
#[derive(Debug)]
pub struct MosaicResult {
    /// Output dimensions and geotransform.
    pub shape: OutputShape,
    /// Painted samples, one band per output band.
    pub buffer: MosaicBuffer,
    /// Nodata to advertise per output band, unless hidden.
    pub nodata: Option<Vec<f64>>,
    /// Spatial reference shared by all sources, if they declared one.
    pub spatial_ref: Option<String>,
}

impl MosaicResult {
    /// Number of output bands.
    pub fn band_count(&self) -> usize {
        self.buffer.band_count()
    }
}

/// Assembles one mosaic from ordered inputs.
///
/// Inputs paint in the order given, so later sources win wherever coverage
/// overlaps. Geometry, band and nodata validation all happen before the
/// first pixel is read.
///
/// # Arguments
///
/// * `inputs` - Sources in paint order, at least one
/// * `spec` - Output geometry, band and nodata choices
/// * `progress` - Polled across the run; returning `false` cancels
///
/// # Errors
///
/// Returns `MosaicError` if the sources cannot be reconciled, the spec is
/// invalid for them, a read fails, or the run is cancelled.
pub fn mosaic(
    inputs: &[MosaicInput],
    spec: &MosaicSpec,
    progress: Option<&ProgressCallback>,
) -> Result<MosaicResult, MosaicError> {
    if let Some(callback) = progress {
        if !callback(&MosaicProgress::reconciling(inputs.len())) {
            return Err(CompositeError::Cancelled.into());
        }
    }

    let descriptors: Vec<SourceDescriptor> = inputs
        .iter()
        .map(|input| input.descriptor().clone())
        .collect();

    let geometry = reconcile(&descriptors, spec.resolution, spec.bounds)?;
    let shape = align(&geometry, spec.target_aligned_pixels);
    let plan = plan_bands(spec.bands.as_deref(), &descriptors)?;
    let nodata = resolve_nodata(
        spec.src_nodata.as_deref(),
        spec.dst_nodata.as_deref(),
        plan.band_count(),
        spec.hide_nodata,
    )?;

    tracing::info!(
        width = shape.width,
        height = shape.height,
        bands = plan.band_count(),
        sources = inputs.len(),
        "assembling mosaic"
    );

    let buffer = Compositor::new(&shape, &plan, &nodata).run(inputs, progress)?;

    Ok(MosaicResult {
        shape,
        buffer,
        nodata: nodata.metadata().map(|values| values.to_vec()),
        spatial_ref: descriptors
            .first()
            .and_then(|d| d.spatial_ref())
            .map(str::to_string),
    })
}
