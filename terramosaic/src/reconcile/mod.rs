//! Reconciling many source geometries into one output geometry.
//!
//! Given the descriptors of every input, this stage agrees on a single
//! bounding box and pixel size for the mosaic:
//!
//! 1. All sources must share one spatial reference. Mixed references fail
//!    here, before any geometry or pixel work.
//! 2. The output resolution comes from the [`ResolutionPolicy`], applied
//!    per axis over the absolute pixel sizes of the sources.
//! 3. The bounding box is taken verbatim when given explicitly, otherwise
//!    it is the union of every source's world-space extent.
//!
//! The result still lives in world coordinates; turning it into pixel
//! dimensions is the [`align`](crate::align) step.

mod resolution;

pub use resolution::{ResolutionParseError, ResolutionPolicy};

use thiserror::Error;

use crate::geo::BoundingBox;
use crate::source::SourceDescriptor;
use resolution::{common_resolution, RESOLUTION_TOLERANCE};

/// Errors raised while reconciling source geometries.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    /// A mosaic needs at least one input.
    #[error("At least one input source is required")]
    NoSources,

    /// Sources carry different spatial references.
    #[error(
        "Mosaic does not support heterogeneous projection: source '{source_name}' has {found}, \
         previous sources have {expected}"
    )]
    HeterogeneousProjection {
        source_name: String,
        found: String,
        expected: String,
    },

    /// Under the `Same` policy every source must report one resolution.
    #[error(
        "Source '{source_name}' has resolution ({found_x}, {found_y}) whereas previous sources \
         have resolution ({expected_x}, {expected_y})"
    )]
    InconsistentResolution {
        source_name: String,
        found_x: f64,
        found_y: f64,
        expected_x: f64,
        expected_y: f64,
    },

    /// The `Common` policy found no value dividing every resolution.
    #[error("No common resolution divides every source on the {axis} axis")]
    CommonResolutionNotFound { axis: &'static str },
}

/// Agreed output geometry, still in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconciledGeometry {
    pub bounds: BoundingBox,
    pub res_x: f64,
    pub res_y: f64,
}

/// Reconciles all source geometries under the given policy.
///
/// # Arguments
///
/// * `sources` - Descriptors in paint order, at least one
/// * `policy` - How the output resolution is derived
/// * `bounds` - Explicit output extent, or `None` to union the sources
///
/// # Errors
///
/// Returns `ReconcileError` if the source list is empty, spatial references
/// disagree, or the policy cannot produce a resolution.
pub fn reconcile(
    sources: &[SourceDescriptor],
    policy: ResolutionPolicy,
    bounds: Option<BoundingBox>,
) -> Result<ReconciledGeometry, ReconcileError> {
    let first = sources.first().ok_or(ReconcileError::NoSources)?;

    // Projection agreement is checked before any geometry is derived
    let expected_ref = first.spatial_ref();
    for source in &sources[1..] {
        if source.spatial_ref() != expected_ref {
            return Err(ReconcileError::HeterogeneousProjection {
                source_name: source.name().to_string(),
                found: spatial_ref_label(source.spatial_ref()),
                expected: spatial_ref_label(expected_ref),
            });
        }
    }

    let (res_x, res_y) = resolve_resolution(sources, policy)?;
    let bounds = bounds.unwrap_or_else(|| {
        sources
            .iter()
            .skip(1)
            .fold(first.extent(), |acc, source| acc.union(&source.extent()))
    });

    tracing::debug!(%bounds, res_x, res_y, policy = %policy, "reconciled output geometry");

    Ok(ReconciledGeometry {
        bounds,
        res_x,
        res_y,
    })
}

fn resolve_resolution(
    sources: &[SourceDescriptor],
    policy: ResolutionPolicy,
) -> Result<(f64, f64), ReconcileError> {
    match policy {
        ResolutionPolicy::Custom { x, y } => Ok((x, y)),
        ResolutionPolicy::Same => {
            let (expected_x, expected_y) = sources[0].resolution();
            for source in &sources[1..] {
                let (found_x, found_y) = source.resolution();
                if !approx_eq(found_x, expected_x) || !approx_eq(found_y, expected_y) {
                    return Err(ReconcileError::InconsistentResolution {
                        source_name: source.name().to_string(),
                        found_x,
                        found_y,
                        expected_x,
                        expected_y,
                    });
                }
            }
            Ok((expected_x, expected_y))
        }
        ResolutionPolicy::Average => {
            let count = sources.len() as f64;
            let (sum_x, sum_y) = sources.iter().fold((0.0, 0.0), |(ax, ay), source| {
                let (x, y) = source.resolution();
                (ax + x, ay + y)
            });
            Ok((sum_x / count, sum_y / count))
        }
        ResolutionPolicy::Highest => Ok(fold_resolutions(sources, f64::min)),
        ResolutionPolicy::Lowest => Ok(fold_resolutions(sources, f64::max)),
        ResolutionPolicy::Common => {
            let xs: Vec<f64> = sources.iter().map(|s| s.resolution().0).collect();
            let ys: Vec<f64> = sources.iter().map(|s| s.resolution().1).collect();
            let res_x = common_resolution(&xs)
                .ok_or(ReconcileError::CommonResolutionNotFound { axis: "x" })?;
            let res_y = common_resolution(&ys)
                .ok_or(ReconcileError::CommonResolutionNotFound { axis: "y" })?;
            Ok((res_x, res_y))
        }
    }
}

fn fold_resolutions(sources: &[SourceDescriptor], pick: fn(f64, f64) -> f64) -> (f64, f64) {
    let (mut acc_x, mut acc_y) = sources[0].resolution();
    for source in &sources[1..] {
        let (x, y) = source.resolution();
        acc_x = pick(acc_x, x);
        acc_y = pick(acc_y, y);
    }
    (acc_x, acc_y)
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= RESOLUTION_TOLERANCE * a.abs().max(b.abs())
}

fn spatial_ref_label(spatial_ref: Option<&str>) -> String {
    match spatial_ref {
        Some(value) => format!("'{}'", value),
        None => "none".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoTransform;

    fn source(name: &str, coefficients: [f64; 6], width: usize, height: usize) -> SourceDescriptor {
        SourceDescriptor::new(
            name,
            GeoTransform::from_coefficients(coefficients),
            width,
            height,
            1,
        )
        .unwrap()
    }

    /// 1x1 raster of 1-degree pixels at (2, 49) plus a 2x2 raster of
    /// half-degree pixels at (3, 49). Their union is x [2, 4], y [48, 49].
    fn degree_pair() -> Vec<SourceDescriptor> {
        vec![
            source("one.png", [2.0, 1.0, 0.0, 49.0, 0.0, -1.0], 1, 1),
            source("two.png", [3.0, 0.5, 0.0, 49.0, 0.0, -0.5], 2, 2),
        ]
    }

    #[test]
    fn test_no_sources() {
        let result = reconcile(&[], ResolutionPolicy::Same, None);
        assert_eq!(result.unwrap_err(), ReconcileError::NoSources);
    }

    #[test]
    fn test_single_source_keeps_its_geometry() {
        let sources = vec![source("one.png", [2.0, 1.0, 0.0, 49.0, 0.0, -1.0], 1, 1)];
        let geometry = reconcile(&sources, ResolutionPolicy::Same, None).unwrap();
        assert_eq!(geometry.res_x, 1.0);
        assert_eq!(geometry.res_y, 1.0);
        assert_eq!(geometry.bounds.min_x, 2.0);
        assert_eq!(geometry.bounds.max_y, 49.0);
    }

    #[test]
    fn test_same_policy_rejects_mixed_resolutions() {
        let err = reconcile(&degree_pair(), ResolutionPolicy::Same, None).unwrap_err();
        match &err {
            ReconcileError::InconsistentResolution { source_name, .. } => {
                assert_eq!(source_name, "two.png");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err
            .to_string()
            .contains("whereas previous sources have resolution"));
    }

    #[test]
    fn test_same_policy_tolerates_tiny_drift() {
        let sources = vec![
            source("one.png", [2.0, 1.0, 0.0, 49.0, 0.0, -1.0], 1, 1),
            source(
                "two.png",
                [3.0, 1.0 + 1.0e-12, 0.0, 49.0, 0.0, -1.0],
                1,
                1,
            ),
        ];
        let geometry = reconcile(&sources, ResolutionPolicy::Same, None).unwrap();
        assert_eq!(geometry.res_x, 1.0);
    }

    #[test]
    fn test_average_policy() {
        let geometry = reconcile(&degree_pair(), ResolutionPolicy::Average, None).unwrap();
        assert_eq!(geometry.res_x, 0.75);
        assert_eq!(geometry.res_y, 0.75);
    }

    #[test]
    fn test_highest_policy_picks_finest() {
        let geometry = reconcile(&degree_pair(), ResolutionPolicy::Highest, None).unwrap();
        assert_eq!(geometry.res_x, 0.5);
        assert_eq!(geometry.res_y, 0.5);
    }

    #[test]
    fn test_lowest_policy_picks_coarsest() {
        let geometry = reconcile(&degree_pair(), ResolutionPolicy::Lowest, None).unwrap();
        assert_eq!(geometry.res_x, 1.0);
        assert_eq!(geometry.res_y, 1.0);
    }

    #[test]
    fn test_common_policy_on_3_and_5() {
        let sources = vec![
            source("three.png", [2.0, 3.0, 0.0, 49.0, 0.0, -3.0], 5, 5),
            source("five.png", [17.0, 5.0, 0.0, 49.0, 0.0, -5.0], 3, 3),
        ];
        let geometry = reconcile(&sources, ResolutionPolicy::Common, None).unwrap();
        assert_eq!(geometry.res_x, 1.0);
        assert_eq!(geometry.res_y, 1.0);
        assert_eq!(geometry.bounds.min_x, 2.0);
        assert_eq!(geometry.bounds.max_x, 32.0);
        assert_eq!(geometry.bounds.min_y, 34.0);
        assert_eq!(geometry.bounds.max_y, 49.0);
    }

    #[test]
    fn test_common_policy_without_common_divisor() {
        let sources = vec![
            source("one.png", [0.0, 1.0, 0.0, 0.0, 0.0, -1.0], 1, 1),
            source(
                "root.png",
                [0.0, std::f64::consts::SQRT_2, 0.0, 0.0, 0.0, -1.0],
                1,
                1,
            ),
        ];
        let err = reconcile(&sources, ResolutionPolicy::Common, None).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::CommonResolutionNotFound { axis: "x" }
        );
    }

    #[test]
    fn test_custom_policy_passes_through() {
        let geometry = reconcile(
            &degree_pair(),
            ResolutionPolicy::Custom { x: 0.5, y: 1.0 },
            None,
        )
        .unwrap();
        assert_eq!(geometry.res_x, 0.5);
        assert_eq!(geometry.res_y, 1.0);
    }

    #[test]
    fn test_union_bounds_cover_both_sources() {
        let geometry = reconcile(&degree_pair(), ResolutionPolicy::Average, None).unwrap();
        assert_eq!(geometry.bounds.min_x, 2.0);
        assert_eq!(geometry.bounds.max_x, 4.0);
        assert_eq!(geometry.bounds.min_y, 48.0);
        assert_eq!(geometry.bounds.max_y, 49.0);
    }

    #[test]
    fn test_explicit_bounds_used_verbatim() {
        let bounds = BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let geometry = reconcile(&degree_pair(), ResolutionPolicy::Lowest, Some(bounds)).unwrap();
        assert_eq!(geometry.bounds, bounds);
    }

    #[test]
    fn test_mixed_projection_fails() {
        let sources = vec![
            source("a.png", [2.0, 1.0, 0.0, 49.0, 0.0, -1.0], 1, 1).with_spatial_ref("EPSG:4326"),
            source("b.png", [3.0, 1.0, 0.0, 49.0, 0.0, -1.0], 1, 1).with_spatial_ref("EPSG:32631"),
        ];
        let err = reconcile(&sources, ResolutionPolicy::Same, None).unwrap_err();
        match &err {
            ReconcileError::HeterogeneousProjection { source_name, .. } => {
                assert_eq!(source_name, "b.png");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err
            .to_string()
            .contains("does not support heterogeneous projection"));
    }

    #[test]
    fn test_missing_projection_on_one_source_fails() {
        let sources = vec![
            source("a.png", [2.0, 1.0, 0.0, 49.0, 0.0, -1.0], 1, 1).with_spatial_ref("EPSG:4326"),
            source("b.png", [3.0, 1.0, 0.0, 49.0, 0.0, -1.0], 1, 1),
        ];
        let err = reconcile(&sources, ResolutionPolicy::Same, None).unwrap_err();
        assert!(err.to_string().contains("has none"));
    }

    #[test]
    fn test_projection_check_runs_before_resolution_check() {
        // Mixed projections and mixed resolutions at once: projection wins
        let sources = vec![
            source("a.png", [2.0, 1.0, 0.0, 49.0, 0.0, -1.0], 1, 1).with_spatial_ref("EPSG:4326"),
            source("b.png", [3.0, 0.5, 0.0, 49.0, 0.0, -0.5], 2, 2).with_spatial_ref("EPSG:32631"),
        ];
        let err = reconcile(&sources, ResolutionPolicy::Same, None).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::HeterogeneousProjection { .. }
        ));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_source(index: usize) -> impl Strategy<Value = SourceDescriptor> {
            (
                -1.0e4..1.0e4_f64,
                -1.0e4..1.0e4_f64,
                1.0e-2..1.0e2_f64,
                1.0e-2..1.0e2_f64,
                1usize..32,
                1usize..32,
            )
                .prop_map(move |(ox, oy, rx, ry, w, h)| {
                    SourceDescriptor::new(
                        format!("s{}.png", index),
                        GeoTransform::north_up(ox, oy, rx, ry),
                        w,
                        h,
                        1,
                    )
                    .unwrap()
                })
        }

        proptest! {
            #[test]
            fn test_union_bounds_contain_every_source(
                a in arb_source(0),
                b in arb_source(1),
                c in arb_source(2),
            ) {
                let sources = vec![a, b, c];
                let geometry = reconcile(&sources, ResolutionPolicy::Average, None).unwrap();
                for source in &sources {
                    let extent = source.extent();
                    prop_assert!(geometry.bounds.min_x <= extent.min_x);
                    prop_assert!(geometry.bounds.min_y <= extent.min_y);
                    prop_assert!(geometry.bounds.max_x >= extent.max_x);
                    prop_assert!(geometry.bounds.max_y >= extent.max_y);
                }
            }

            #[test]
            fn test_highest_is_never_coarser_than_lowest(
                a in arb_source(0),
                b in arb_source(1),
            ) {
                let sources = vec![a, b];
                let finest = reconcile(&sources, ResolutionPolicy::Highest, None).unwrap();
                let coarsest = reconcile(&sources, ResolutionPolicy::Lowest, None).unwrap();
                prop_assert!(finest.res_x <= coarsest.res_x);
                prop_assert!(finest.res_y <= coarsest.res_y);
            }
        }
    }
}
