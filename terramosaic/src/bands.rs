//! Mapping output bands onto source bands.
//!
//! Without an explicit selection the output simply carries every band of
//! the first source, and all sources must agree on the band count. An
//! explicit selection is an ordered list of 1-based source band indices;
//! the same band may appear more than once and order is preserved, so
//! `[3, 2]` produces a two-band output with source band 3 first.

use thiserror::Error;

use crate::source::SourceDescriptor;

/// Errors raised while planning the band layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BandError {
    /// A selected band index was zero or past a source's band count.
    #[error("Illegal band index {band} for source '{source_name}' with {bands} bands")]
    InvalidBandIndex {
        source_name: String,
        band: usize,
        bands: usize,
    },

    /// Without a selection every source must have the same band count.
    #[error(
        "Mosaic does not support heterogeneous band counts: source '{source_name}' has {found} \
         bands, previous sources have {expected}"
    )]
    BandCountMismatch {
        source_name: String,
        found: usize,
        expected: usize,
    },
}

/// Ordered mapping from output band to 1-based source band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandPlan {
    bands: Vec<usize>,
}

impl BandPlan {
    /// Number of output bands.
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Source band feeding the 0-based output band.
    pub fn source_band(&self, output_band: usize) -> usize {
        self.bands[output_band]
    }

    /// Iterates 1-based source bands in output order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.bands.iter().copied()
    }
}

/// Validates a band selection against every source and fixes the output
/// band layout.
///
/// # Arguments
///
/// * `selection` - 1-based source band indices in output order, or `None`
///   to carry all bands of the first source
/// * `sources` - Descriptors in paint order, at least one
///
/// # Errors
///
/// Returns `BandError` if a selected index is out of range for any source,
/// or band counts differ with no selection given.
pub fn plan_bands(
    selection: Option<&[usize]>,
    sources: &[SourceDescriptor],
) -> Result<BandPlan, BandError> {
    debug_assert!(!sources.is_empty());
    match selection {
        Some(selected) if !selected.is_empty() => {
            for source in sources {
                for &band in selected {
                    if band == 0 || band > source.band_count() {
                        return Err(BandError::InvalidBandIndex {
                            source_name: source.name().to_string(),
                            band,
                            bands: source.band_count(),
                        });
                    }
                }
            }
            Ok(BandPlan {
                bands: selected.to_vec(),
            })
        }
        _ => {
            let expected = sources[0].band_count();
            for source in &sources[1..] {
                if source.band_count() != expected {
                    return Err(BandError::BandCountMismatch {
                        source_name: source.name().to_string(),
                        found: source.band_count(),
                        expected,
                    });
                }
            }
            Ok(BandPlan {
                bands: (1..=expected).collect(),
            })
        }
    }
}
