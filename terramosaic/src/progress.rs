//! Progress reporting and cooperative cancellation.
//!
//! The engine never spawns threads or installs signal handlers; callers
//! pass a [`ProgressCallback`] and decide themselves how to render updates
//! and when to stop. The callback is polled once per painted destination
//! row, so cancellation latency is bounded by one row of work.

use std::sync::Arc;

/// Callback receiving progress updates during a mosaic run.
///
/// Returning `false` requests cancellation: the engine stops at the next
/// row boundary and the run fails with a cancellation error.
pub type ProgressCallback = Arc<dyn Fn(&MosaicProgress) -> bool + Send + Sync>;

/// Coarse stage of a mosaic run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosaicPhase {
    /// Agreeing on output geometry, bands and nodata.
    Reconciling,
    /// Painting source pixels into the output buffer.
    Painting,
    /// All sources painted.
    Complete,
}

impl MosaicPhase {
    /// Human-readable description of the phase.
    pub fn description(&self) -> &'static str {
        match self {
            MosaicPhase::Reconciling => "reconciling source geometry",
            MosaicPhase::Painting => "painting sources",
            MosaicPhase::Complete => "complete",
        }
    }
}

/// A point-in-time snapshot of mosaic progress.
#[derive(Debug, Clone)]
pub struct MosaicProgress {
    pub phase: MosaicPhase,
    /// Source currently being painted, if any.
    pub current_source: Option<String>,
    /// Sources fully painted so far.
    pub sources_complete: usize,
    pub sources_total: usize,
    /// Destination rows painted so far, across all sources.
    pub rows_painted: u64,
    /// Total destination rows to paint, summed over all sources.
    pub rows_total: u64,
}

impl MosaicProgress {
    /// Snapshot for the geometry phase, before any painting.
    pub fn reconciling(sources_total: usize) -> Self {
        Self {
            phase: MosaicPhase::Reconciling,
            current_source: None,
            sources_complete: 0,
            sources_total,
            rows_painted: 0,
            rows_total: 0,
        }
    }

    /// Snapshot mid-paint.
    pub fn painting(
        source: &str,
        sources_complete: usize,
        sources_total: usize,
        rows_painted: u64,
        rows_total: u64,
    ) -> Self {
        Self {
            phase: MosaicPhase::Painting,
            current_source: Some(source.to_string()),
            sources_complete,
            sources_total,
            rows_painted,
            rows_total,
        }
    }

    /// Snapshot after the last source has been painted.
    pub fn complete(sources_total: usize, rows_total: u64) -> Self {
        Self {
            phase: MosaicPhase::Complete,
            current_source: None,
            sources_complete: sources_total,
            sources_total,
            rows_painted: rows_total,
            rows_total,
        }
    }

    /// Fraction complete in `[0, 1]`, row-based when row totals are known.
    pub fn fraction(&self) -> f64 {
        match self.phase {
            MosaicPhase::Complete => 1.0,
            _ if self.rows_total > 0 => self.rows_painted as f64 / self.rows_total as f64,
            _ => 0.0,
        }
    }
}
