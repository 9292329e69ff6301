//! Painting source pixels into the output grid.
//!
//! The compositor walks the inputs in order and paints each one over the
//! buffer, so later sources win wherever coverage overlaps. Sampling is
//! nearest-neighbor through the affine transforms: every destination cell
//! center is mapped into source pixel space and takes the sample of the
//! pixel it lands in. Pixels matching the resolved nodata sentinel are
//! transparent and never overwrite the buffer.
//!
//! Reads go through [`PixelSource`] one window per source band, sized to
//! the painted destination region, so memory stays bounded by one source
//! overlap at a time. The progress callback is polled once per destination
//! row and can cancel the run between rows.

mod buffer;

pub use buffer::MosaicBuffer;

use thiserror::Error;

use crate::align::OutputShape;
use crate::bands::BandPlan;
use crate::geo::GeoTransform;
use crate::grid::{GridError, PixelSource, Window};
use crate::nodata::{self, NodataResolution};
use crate::progress::{MosaicProgress, ProgressCallback};
use crate::source::SourceDescriptor;

/// Errors raised while compositing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompositeError {
    /// A source failed to deliver pixel data.
    #[error("Failed to read source '{name}'")]
    SourceRead {
        name: String,
        #[source]
        source: GridError,
    },

    /// The source geotransform cannot be inverted for sampling.
    #[error("Source '{name}' has a non-invertible geotransform")]
    NonInvertibleTransform { name: String },

    /// The progress callback requested cancellation.
    #[error("Mosaic run cancelled")]
    Cancelled,
}

/// One mosaic input: a descriptor plus pixel access.
///
/// The pixel source must match the descriptor's dimensions and band count;
/// reads are issued in the descriptor's pixel space.
pub struct MosaicInput {
    descriptor: SourceDescriptor,
    pixels: Box<dyn PixelSource>,
}

impl MosaicInput {
    pub fn new(descriptor: SourceDescriptor, pixels: impl PixelSource + 'static) -> Self {
        Self {
            descriptor,
            pixels: Box::new(pixels),
        }
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.descriptor
    }

    pub fn pixels(&self) -> &dyn PixelSource {
        self.pixels.as_ref()
    }
}

/// Paints ordered inputs onto a finalized output grid.
pub struct Compositor<'a> {
    shape: &'a OutputShape,
    plan: &'a BandPlan,
    nodata: &'a NodataResolution,
}

/// Painting work for one input: the destination region it covers and the
/// source window feeding it.
struct PaintJob {
    dest: Window,
    src_window: Window,
    /// World to source pixel space.
    src_inverse: GeoTransform,
}

impl<'a> Compositor<'a> {
    pub fn new(shape: &'a OutputShape, plan: &'a BandPlan, nodata: &'a NodataResolution) -> Self {
        Self { shape, plan, nodata }
    }

    /// Runs the paint loop over all inputs, in order.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Sources in paint order; later inputs overwrite earlier
    ///   ones where both contribute
    /// * `progress` - Polled per destination row; returning `false` cancels.
    ///   A final [`MosaicPhase::Complete`](crate::progress::MosaicPhase)
    ///   snapshot is emitted once every source is painted
    ///
    /// # Errors
    ///
    /// Returns `CompositeError` if a source read fails, a source transform
    /// cannot be inverted, or the callback cancels the run.
    pub fn run(
        &self,
        inputs: &[MosaicInput],
        progress: Option<&ProgressCallback>,
    ) -> Result<MosaicBuffer, CompositeError> {
        let mut buffer = MosaicBuffer::filled(
            self.shape.width,
            self.shape.height,
            self.nodata.fill_values(),
        );

        // Plan every destination window up front so row totals are known
        // before the first paint
        let jobs: Vec<Option<PaintJob>> = inputs
            .iter()
            .map(|input| self.plan_job(input))
            .collect::<Result<_, _>>()?;
        let rows_total: u64 = jobs.iter().flatten().map(|job| job.dest.height as u64).sum();

        let mut rows_painted = 0u64;
        for (index, (input, job)) in inputs.iter().zip(&jobs).enumerate() {
            let Some(job) = job else {
                tracing::debug!(
                    source = input.descriptor().name(),
                    "source outside output extent, skipping"
                );
                continue;
            };
            self.paint(
                input,
                job,
                &mut buffer,
                progress,
                &mut rows_painted,
                rows_total,
                index,
                inputs.len(),
            )?;
        }

        if let Some(callback) = progress {
            callback(&MosaicProgress::complete(inputs.len(), rows_total));
        }

        Ok(buffer)
    }

    /// Derives the paint job for one input, or `None` when it lies outside
    /// the output extent.
    fn plan_job(&self, input: &MosaicInput) -> Result<Option<PaintJob>, CompositeError> {
        let descriptor = input.descriptor();
        let overlap = match descriptor.extent().intersection(&self.shape.extent()) {
            Some(overlap) => overlap,
            None => return Ok(None),
        };
        let src_inverse =
            descriptor
                .transform()
                .invert()
                .ok_or_else(|| CompositeError::NonInvertibleTransform {
                    name: descriptor.name().to_string(),
                })?;

        // Destination pixel range covering the overlap. The output
        // transform is north-up by construction.
        let out = &self.shape.transform;
        let res_x = out.pixel_width;
        let res_y = -out.pixel_height;
        let width = self.shape.width as i64;
        let height = self.shape.height as i64;
        let x0 = (((overlap.min_x - out.origin_x) / res_x).floor() as i64).clamp(0, width);
        let x1 = (((overlap.max_x - out.origin_x) / res_x).ceil() as i64).clamp(x0, width);
        let y0 = (((out.origin_y - overlap.max_y) / res_y).floor() as i64).clamp(0, height);
        let y1 = (((out.origin_y - overlap.min_y) / res_y).ceil() as i64).clamp(y0, height);
        if x0 == x1 || y0 == y1 {
            return Ok(None);
        }
        let dest = Window::new(
            x0 as usize,
            y0 as usize,
            (x1 - x0) as usize,
            (y1 - y0) as usize,
        );

        // Source window covering the destination region, from the inverse
        // map of its corners, padded one pixel for rounding slop
        let corners = [
            out.apply(x0 as f64, y0 as f64),
            out.apply(x1 as f64, y0 as f64),
            out.apply(x0 as f64, y1 as f64),
            out.apply(x1 as f64, y1 as f64),
        ];
        let mut min_col = f64::INFINITY;
        let mut min_row = f64::INFINITY;
        let mut max_col = f64::NEG_INFINITY;
        let mut max_row = f64::NEG_INFINITY;
        for (wx, wy) in corners {
            let (col, row) = src_inverse.apply(wx, wy);
            min_col = min_col.min(col);
            min_row = min_row.min(row);
            max_col = max_col.max(col);
            max_row = max_row.max(row);
        }
        let src_width = descriptor.width() as i64;
        let src_height = descriptor.height() as i64;
        let sx0 = (min_col.floor() as i64 - 1).clamp(0, src_width);
        let sx1 = (max_col.ceil() as i64 + 1).clamp(sx0, src_width);
        let sy0 = (min_row.floor() as i64 - 1).clamp(0, src_height);
        let sy1 = (max_row.ceil() as i64 + 1).clamp(sy0, src_height);
        if sx0 == sx1 || sy0 == sy1 {
            return Ok(None);
        }
        let src_window = Window::new(
            sx0 as usize,
            sy0 as usize,
            (sx1 - sx0) as usize,
            (sy1 - sy0) as usize,
        );

        Ok(Some(PaintJob {
            dest,
            src_window,
            src_inverse,
        }))
    }

    /// Paints one input over the buffer.
    #[allow(clippy::too_many_arguments)]
    fn paint(
        &self,
        input: &MosaicInput,
        job: &PaintJob,
        buffer: &mut MosaicBuffer,
        progress: Option<&ProgressCallback>,
        rows_painted: &mut u64,
        rows_total: u64,
        sources_complete: usize,
        sources_total: usize,
    ) -> Result<(), CompositeError> {
        let descriptor = input.descriptor();
        let name = descriptor.name();

        // One window read per mapped band
        let mut band_samples = Vec::with_capacity(self.plan.band_count());
        for source_band in self.plan.iter() {
            let samples = input
                .pixels()
                .read_window(source_band, job.src_window)
                .map_err(|source| CompositeError::SourceRead {
                    name: name.to_string(),
                    source,
                })?;
            band_samples.push(samples);
        }

        let out = &self.shape.transform;
        let window_x = job.src_window.x as i64;
        let window_y = job.src_window.y as i64;
        let window_width = job.src_window.width as i64;
        let window_height = job.src_window.height as i64;

        for dy in job.dest.y..job.dest.y + job.dest.height {
            if let Some(callback) = progress {
                let snapshot = MosaicProgress::painting(
                    name,
                    sources_complete,
                    sources_total,
                    *rows_painted,
                    rows_total,
                );
                if !callback(&snapshot) {
                    return Err(CompositeError::Cancelled);
                }
            }
            for dx in job.dest.x..job.dest.x + job.dest.width {
                // Destination cell center, mapped into source pixel space
                let (wx, wy) = out.apply(dx as f64 + 0.5, dy as f64 + 0.5);
                let (col, row) = job.src_inverse.apply(wx, wy);
                let sx = col.floor() as i64;
                let sy = row.floor() as i64;
                if sx < window_x
                    || sx >= window_x + window_width
                    || sy < window_y
                    || sy >= window_y + window_height
                {
                    continue;
                }
                let sample_index = ((sy - window_y) * window_width + (sx - window_x)) as usize;

                for (output_band, samples) in band_samples.iter().enumerate() {
                    let value = samples[sample_index];
                    let source_band = self.plan.source_band(output_band);
                    if let Some(sentinel) =
                        self.nodata.source_nodata(output_band, descriptor, source_band)
                    {
                        if nodata::matches(value, sentinel) {
                            continue;
                        }
                    }
                    buffer.set(output_band + 1, dx, dy, value);
                }
            }
            *rows_painted += 1;
        }

        tracing::debug!(source = name, rows = job.dest.height, "painted source");
        Ok(())
    }
}
