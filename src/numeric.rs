//! Numeric helpers shared by the constraint catalogue
//!
//! Every trigonometric identity in the knowledge base works in degrees at
//! the API boundary and converts to radians internally. The helpers here
//! centralize that conversion together with the two guards the catalogue
//! leans on everywhere:
//!
//! - [`safe_sqrt`] absorbs tiny negative radicands (round-off from
//!   subtractive formulas like Heron or the law of cosines) and reports
//!   genuinely negative ones as "no result";
//! - [`clamp`] saturates ratios before they reach `asin`/`acos`.

#![forbid(unsafe_code)]

/// Negative radicands above this threshold are treated as exact zeros.
pub const SQRT_SLACK: f64 = 1e-12;

/// Denominators smaller than this (in absolute value) are considered
/// degenerate; rules return "no result" instead of dividing.
pub const DIV_GUARD: f64 = 1e-12;

/// Square root that tolerates round-off.
///
/// Returns `None` when `x < -SQRT_SLACK`; a slightly negative `x` in
/// `[-SQRT_SLACK, 0)` is flushed to `0.0` before taking the root.
#[inline]
pub fn safe_sqrt(x: f64) -> Option<f64> {
    if x < -SQRT_SLACK {
        return None;
    }
    Some(if x < 0.0 { 0.0 } else { x.sqrt() })
}

/// Saturate `x` to `[lo, hi]`.
#[inline]
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

/// Sine of an angle given in degrees.
#[inline]
pub fn sin_deg(deg: f64) -> f64 {
    deg.to_radians().sin()
}

/// Cosine of an angle given in degrees.
#[inline]
pub fn cos_deg(deg: f64) -> f64 {
    deg.to_radians().cos()
}

/// Principal-branch arcsine in degrees; the input is clamped to `[-1, 1]`.
#[inline]
pub fn asin_deg(x: f64) -> f64 {
    clamp(x, -1.0, 1.0).asin().to_degrees()
}

/// Arccosine in degrees; the input is clamped to `[-1, 1]`.
#[inline]
pub fn acos_deg(x: f64) -> f64 {
    clamp(x, -1.0, 1.0).acos().to_degrees()
}

/// Strict triangle inequality with `1e-6` slack on each comparison.
///
/// Used by the perimeter-reverse rule before it commits a derived third
/// side, and exposed for callers that validate three sides up front.
#[inline]
pub fn triangle_inequality_ok(a: f64, b: f64, c: f64) -> bool {
    const SLACK: f64 = 1e-6;
    a + b > c - SLACK && a + c > b - SLACK && b + c > a - SLACK
}
