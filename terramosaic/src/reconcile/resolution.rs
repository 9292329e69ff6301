//! Output resolution policies and their parsing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Relative tolerance for resolution comparisons and divisibility checks.
pub(crate) const RESOLUTION_TOLERANCE: f64 = 1.0e-8;

/// Iteration budget for the real-valued Euclid walk.
const COMMON_DIVISOR_MAX_ITERATIONS: usize = 100;

/// Input did not name a policy and did not parse as a positive pair.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "Resolution '{input}': two comma separated positive values should be provided, or one of \
     'same', 'average', 'common', 'highest', 'lowest'"
)]
pub struct ResolutionParseError {
    pub input: String,
}

/// How the output pixel size is derived from the sources.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ResolutionPolicy {
    /// All sources must share one resolution, which the output keeps.
    #[default]
    Same,
    /// Arithmetic mean per axis.
    Average,
    /// Finest source per axis (smallest pixel).
    Highest,
    /// Coarsest source per axis (largest pixel).
    Lowest,
    /// Largest value dividing every source resolution per axis.
    Common,
    /// Fixed output pixel size.
    Custom { x: f64, y: f64 },
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionPolicy::Same => write!(f, "same"),
            ResolutionPolicy::Average => write!(f, "average"),
            ResolutionPolicy::Highest => write!(f, "highest"),
            ResolutionPolicy::Lowest => write!(f, "lowest"),
            ResolutionPolicy::Common => write!(f, "common"),
            ResolutionPolicy::Custom { x, y } => write!(f, "{},{}", x, y),
        }
    }
}

impl FromStr for ResolutionPolicy {
    type Err = ResolutionParseError;

    /// Parses a policy keyword or an explicit `"x,y"` pixel size.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "same" => Ok(ResolutionPolicy::Same),
            "average" => Ok(ResolutionPolicy::Average),
            "highest" => Ok(ResolutionPolicy::Highest),
            "lowest" => Ok(ResolutionPolicy::Lowest),
            "common" => Ok(ResolutionPolicy::Common),
            other => parse_pair(other).ok_or_else(|| ResolutionParseError {
                input: s.to_string(),
            }),
        }
    }
}

fn parse_pair(s: &str) -> Option<ResolutionPolicy> {
    let (x, y) = s.split_once(',')?;
    let x: f64 = x.trim().parse().ok()?;
    let y: f64 = y.trim().parse().ok()?;
    (x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0)
        .then_some(ResolutionPolicy::Custom { x, y })
}

/// Greatest value dividing both positive reals within the relative
/// tolerance.
///
/// Runs Euclid's algorithm on reals. A remainder within tolerance of zero
/// or of the current divisor counts as dividing evenly; the divisor
/// candidate must stay above the noise floor of the original inputs.
/// Returns `None` once the candidate degenerates below that floor or the
/// iteration budget runs out, meaning no meaningful common step exists.
pub(crate) fn common_divisor(a: f64, b: f64) -> Option<f64> {
    debug_assert!(a > 0.0 && b > 0.0);
    let noise_floor = a.max(b) * RESOLUTION_TOLERANCE;
    let (mut a, mut b) = if a >= b { (a, b) } else { (b, a) };
    for _ in 0..COMMON_DIVISOR_MAX_ITERATIONS {
        if b <= noise_floor {
            return None;
        }
        let remainder = a % b;
        let step_tolerance = b * RESOLUTION_TOLERANCE;
        if remainder <= step_tolerance || b - remainder <= step_tolerance {
            return Some(b);
        }
        a = b;
        b = remainder;
    }
    None
}

/// Folds [`common_divisor`] over a non-empty value list.
pub(crate) fn common_resolution(values: &[f64]) -> Option<f64> {
    let mut iter = values.iter().copied();
    let first = iter.next()?;
    iter.try_fold(first, common_divisor)
}
