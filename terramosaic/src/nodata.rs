//! Nodata semantics for compositing.
//!
//! Three independent knobs meet here:
//!
//! * source nodata overrides, making matching source pixels transparent
//!   regardless of what the source itself declares,
//! * destination nodata, used as the background fill and advertised in the
//!   output metadata,
//! * hide-nodata, which keeps the fill but suppresses the metadata so
//!   readers treat background pixels as ordinary values.
//!
//! Per-band lists broadcast a single value across all output bands.
//! Comparison is exact `f64` equality, with NaN matching NaN so
//! float rasters using NaN sentinels behave.

use thiserror::Error;

use crate::source::SourceDescriptor;

/// Errors raised while resolving nodata configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NodataError {
    /// Nodata lists must hold one value, or one per output band.
    #[error("{which} nodata: expected 1 value or {expected} (one per output band), got {given}")]
    InvalidCount {
        which: &'static str,
        expected: usize,
        given: usize,
    },
}

/// Resolved nodata behavior for one mosaic run.
#[derive(Debug, Clone, PartialEq)]
pub struct NodataResolution {
    source_override: Option<Vec<f64>>,
    fill: Vec<f64>,
    metadata: Option<Vec<f64>>,
}

impl NodataResolution {
    /// Nodata to treat as transparent for one output band of one source.
    ///
    /// A run-level override beats whatever the source declares for the
    /// mapped band; with no override the source's own declaration applies.
    pub fn source_nodata(
        &self,
        output_band: usize,
        descriptor: &SourceDescriptor,
        source_band: usize,
    ) -> Option<f64> {
        match &self.source_override {
            Some(values) => Some(values[output_band]),
            None => descriptor.band_nodata(source_band),
        }
    }

    /// Background fill for the 0-based output band.
    pub fn fill(&self, output_band: usize) -> f64 {
        self.fill[output_band]
    }

    /// Background fill for every band, in band order.
    pub fn fill_values(&self) -> &[f64] {
        &self.fill
    }

    /// Nodata values to advertise in output metadata, unless hidden.
    pub fn metadata(&self) -> Option<&[f64]> {
        self.metadata.as_deref()
    }
}

/// Exact sentinel comparison; NaN counts as equal to NaN.
#[inline]
pub(crate) fn matches(value: f64, nodata: f64) -> bool {
    value == nodata || (value.is_nan() && nodata.is_nan())
}

/// Resolves run-level nodata configuration against the output band count.
///
/// # Arguments
///
/// * `src_nodata` - Transparency override per output band, single values
///   broadcast; empty lists count as absent
/// * `dst_nodata` - Background fill and metadata value per output band
/// * `band_count` - Number of output bands
/// * `hide` - Suppress nodata metadata on the output while keeping the fill
///
/// Without destination nodata the background fill is zero and no metadata
/// is advertised.
pub fn resolve_nodata(
    src_nodata: Option<&[f64]>,
    dst_nodata: Option<&[f64]>,
    band_count: usize,
    hide: bool,
) -> Result<NodataResolution, NodataError> {
    let source_override = match normalize(src_nodata) {
        Some(values) => Some(broadcast(values, band_count, "Source")?),
        None => None,
    };
    let destination = match normalize(dst_nodata) {
        Some(values) => Some(broadcast(values, band_count, "Destination")?),
        None => None,
    };

    let fill = destination
        .clone()
        .unwrap_or_else(|| vec![0.0; band_count]);
    let metadata = if hide { None } else { destination };

    Ok(NodataResolution {
        source_override,
        fill,
        metadata,
    })
}

fn normalize(values: Option<&[f64]>) -> Option<&[f64]> {
    values.filter(|v| !v.is_empty())
}

fn broadcast(values: &[f64], band_count: usize, which: &'static str) -> Result<Vec<f64>, NodataError> {
    match values.len() {
        1 => Ok(vec![values[0]; band_count]),
        n if n == band_count => Ok(values.to_vec()),
        n => Err(NodataError::InvalidCount {
            which,
            expected: band_count,
            given: n,
        }),
    }
}
