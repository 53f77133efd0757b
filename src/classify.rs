//! Shape classification over a solved value snapshot
//!
//! [`classify`] maps the known values of a solved network to the most
//! specific shape name it can justify, together with the inheritance
//! chain up to the family root. It is a free function over a plain
//! `name → value` snapshot; it never consults the network's constraint
//! graph, only the numbers.
//!
//! Tolerances: side equality `1e-6`, angle equality `1e-3`, right angles
//! and parallel detection `0.1°`, Pythagorean identity `1e-3`.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

/// Side-equality tolerance.
pub const SIDE_EQ_TOLERANCE: f64 = 1e-6;
/// Angle-equality tolerance (degrees).
pub const ANGLE_EQ_TOLERANCE: f64 = 1e-3;
/// Right-angle and parallel-detection tolerance (degrees).
pub const RIGHT_ANGLE_TOLERANCE: f64 = 0.1;
/// Tolerance of the Pythagorean identity check.
pub const PYTHAGORAS_TOLERANCE: f64 = 1e-3;

/// The shape taxonomy. `Triangle` and `Quadrilateral` double as the
/// "nothing more specific is known" labels of their families.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ShapeClass {
    Equilateral,
    RightIsosceles,
    Right,
    Isosceles,
    Scalene,
    Triangle,
    Square,
    Rectangle,
    Rhombus,
    Parallelogram,
    IsoscelesTrapezoid,
    Trapezoid,
    Quadrilateral,
}

impl ShapeClass {
    /// Human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeClass::Equilateral => "equilateral triangle",
            ShapeClass::RightIsosceles => "right isosceles triangle",
            ShapeClass::Right => "right triangle",
            ShapeClass::Isosceles => "isosceles triangle",
            ShapeClass::Scalene => "scalene triangle",
            ShapeClass::Triangle => "triangle",
            ShapeClass::Square => "square",
            ShapeClass::Rectangle => "rectangle",
            ShapeClass::Rhombus => "rhombus",
            ShapeClass::Parallelogram => "parallelogram",
            ShapeClass::IsoscelesTrapezoid => "isosceles trapezoid",
            ShapeClass::Trapezoid => "trapezoid",
            ShapeClass::Quadrilateral => "quadrilateral",
        }
    }
}

impl fmt::Display for ShapeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most specific shape plus its inheritance chain (most specific first,
/// family root last).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Classification {
    pub shape: ShapeClass,
    pub chain: Vec<ShapeClass>,
}

impl Classification {
    fn new(shape: ShapeClass, chain: &[ShapeClass]) -> Self {
        Self { shape, chain: chain.to_vec() }
    }
}

fn close(x: Option<f64>, y: Option<f64>, tol: f64) -> bool {
    match (x, y) {
        (Some(x), Some(y)) => (x - y).abs() < tol,
        _ => false,
    }
}

fn is_right_angle(x: Option<f64>) -> bool {
    matches!(x, Some(v) if (v - 90.0).abs() < RIGHT_ANGLE_TOLERANCE)
}

/// Classify a solved snapshot. `is_triangle` selects the family; the
/// caller knows which factory produced the network.
pub fn classify(values: &HashMap<String, f64>, is_triangle: bool) -> Classification {
    if is_triangle {
        classify_triangle(values)
    } else {
        classify_quadrilateral(values)
    }
}

fn classify_triangle(values: &HashMap<String, f64>) -> Classification {
    use ShapeClass::*;
    let v = |n: &str| values.get(n).copied();
    let (a, b, c) = (v("a"), v("b"), v("c"));
    let (ang_a, ang_b, ang_c) = (v("A"), v("B"), v("C"));

    let equilateral = close(a, b, SIDE_EQ_TOLERANCE) && close(b, c, SIDE_EQ_TOLERANCE);
    let isosceles = close(a, b, SIDE_EQ_TOLERANCE)
        || close(a, c, SIDE_EQ_TOLERANCE)
        || close(b, c, SIDE_EQ_TOLERANCE);
    let right_by_angle =
        is_right_angle(ang_a) || is_right_angle(ang_b) || is_right_angle(ang_c);
    let right_by_pythagoras = match (a, b, c) {
        (Some(a), Some(b), Some(c)) => {
            (a * a + b * b - c * c).abs() < PYTHAGORAS_TOLERANCE
                || (a * a + c * c - b * b).abs() < PYTHAGORAS_TOLERANCE
                || (b * b + c * c - a * a).abs() < PYTHAGORAS_TOLERANCE
        }
        _ => false,
    };
    let right = right_by_angle || right_by_pythagoras;

    if equilateral {
        return Classification::new(Equilateral, &[Equilateral, Isosceles, Triangle]);
    }
    if right && isosceles {
        return Classification::new(
            RightIsosceles,
            &[RightIsosceles, Right, Isosceles, Triangle],
        );
    }
    if right {
        return Classification::new(Right, &[Right, Triangle]);
    }
    if isosceles {
        return Classification::new(Isosceles, &[Isosceles, Triangle]);
    }
    if [a, b, c, ang_a, ang_b, ang_c].iter().any(Option::is_some) {
        return Classification::new(Scalene, &[Scalene, Triangle]);
    }
    Classification::new(Triangle, &[Triangle])
}

fn classify_quadrilateral(values: &HashMap<String, f64>) -> Classification {
    use ShapeClass::*;
    let v = |n: &str| values.get(n).copied();
    let (a, b, c, d) = (v("a"), v("b"), v("c"), v("d"));
    let (ang_a, ang_b, ang_c, ang_d) = (v("A"), v("B"), v("C"), v("D"));

    let all_sides_equal = close(a, b, SIDE_EQ_TOLERANCE)
        && close(b, c, SIDE_EQ_TOLERANCE)
        && close(c, d, SIDE_EQ_TOLERANCE);
    let all_angles_right = is_right_angle(ang_a)
        && is_right_angle(ang_b)
        && is_right_angle(ang_c)
        && is_right_angle(ang_d);
    let opposite_sides_equal =
        close(a, c, SIDE_EQ_TOLERANCE) && close(b, d, SIDE_EQ_TOLERANCE);
    let opposite_angles_equal =
        close(ang_a, ang_c, ANGLE_EQ_TOLERANCE) && close(ang_b, ang_d, ANGLE_EQ_TOLERANCE);

    let supplementary = |x: Option<f64>, y: Option<f64>| match (x, y) {
        (Some(x), Some(y)) => (x + y - 180.0).abs() < RIGHT_ANGLE_TOLERANCE,
        _ => false,
    };
    // Co-interior angles along a leg are supplementary: b ∥ d shows up
    // as A+B = 180 (leg a) or C+D = 180 (leg c); a ∥ c as B+C (leg b)
    // or D+A (leg d).
    let b_parallel_d = supplementary(ang_a, ang_b) || supplementary(ang_c, ang_d);
    let a_parallel_c = supplementary(ang_b, ang_c) || supplementary(ang_d, ang_a);

    if all_sides_equal && all_angles_right {
        return Classification::new(
            Square,
            &[Square, Rectangle, Parallelogram, Quadrilateral],
        );
    }
    if all_angles_right && opposite_sides_equal {
        return Classification::new(Rectangle, &[Rectangle, Parallelogram, Quadrilateral]);
    }
    if all_sides_equal {
        return Classification::new(Rhombus, &[Rhombus, Parallelogram, Quadrilateral]);
    }
    if opposite_sides_equal || opposite_angles_equal || (b_parallel_d && a_parallel_c) {
        return Classification::new(Parallelogram, &[Parallelogram, Quadrilateral]);
    }
    if b_parallel_d != a_parallel_c {
        // legs are the non-parallel pair of sides
        let legs_equal = if b_parallel_d {
            close(a, c, SIDE_EQ_TOLERANCE)
        } else {
            close(b, d, SIDE_EQ_TOLERANCE)
        };
        if legs_equal {
            return Classification::new(
                IsoscelesTrapezoid,
                &[IsoscelesTrapezoid, Trapezoid, Quadrilateral],
            );
        }
        return Classification::new(Trapezoid, &[Trapezoid, Quadrilateral]);
    }
    Classification::new(Quadrilateral, &[Quadrilateral])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn right_triangle_by_pythagoras_alone() {
        let out = classify(&snapshot(&[("a", 3.0), ("b", 4.0), ("c", 5.0)]), true);
        assert_eq!(out.shape, ShapeClass::Right);
        assert_eq!(out.chain, vec![ShapeClass::Right, ShapeClass::Triangle]);
    }

    #[test]
    fn equilateral_beats_isosceles() {
        let out = classify(&snapshot(&[("a", 2.0), ("b", 2.0), ("c", 2.0)]), true);
        assert_eq!(out.shape, ShapeClass::Equilateral);
        assert_eq!(
            out.chain,
            vec![ShapeClass::Equilateral, ShapeClass::Isosceles, ShapeClass::Triangle]
        );
    }

    #[test]
    fn right_isosceles_combines_both_chains() {
        let s = snapshot(&[("a", 1.0), ("b", 1.0), ("C", 90.0)]);
        let out = classify(&s, true);
        assert_eq!(out.shape, ShapeClass::RightIsosceles);
        assert_eq!(out.chain.last(), Some(&ShapeClass::Triangle));
        assert!(out.chain.contains(&ShapeClass::Right));
        assert!(out.chain.contains(&ShapeClass::Isosceles));
    }

    #[test]
    fn bare_snapshot_is_unknown_triangle() {
        let out = classify(&HashMap::new(), true);
        assert_eq!(out.shape, ShapeClass::Triangle);
        assert_eq!(out.chain, vec![ShapeClass::Triangle]);
    }

    #[test]
    fn square_needs_sides_and_right_angles() {
        let mut pairs = vec![("a", 5.0), ("b", 5.0), ("c", 5.0), ("d", 5.0)];
        // without angles this is only a rhombus
        let out = classify(&snapshot(&pairs), false);
        assert_eq!(out.shape, ShapeClass::Rhombus);

        pairs.extend([("A", 90.0), ("B", 90.0), ("C", 90.0), ("D", 90.0)]);
        let out = classify(&snapshot(&pairs), false);
        assert_eq!(out.shape, ShapeClass::Square);
        assert_eq!(
            out.chain,
            vec![
                ShapeClass::Square,
                ShapeClass::Rectangle,
                ShapeClass::Parallelogram,
                ShapeClass::Quadrilateral
            ]
        );
    }

    #[test]
    fn parallelogram_by_supplementary_pairs() {
        let s = snapshot(&[("A", 70.0), ("B", 110.0), ("C", 70.0), ("D", 110.0)]);
        let out = classify(&s, false);
        assert_eq!(out.shape, ShapeClass::Parallelogram);
    }

    #[test]
    fn trapezoid_needs_exactly_one_parallel_pair() {
        // B+C = 180 and D+A = 180 (a ∥ c) while A+B = 170: one pair only
        let s = snapshot(&[("A", 70.0), ("B", 100.0), ("C", 80.0), ("D", 110.0)]);
        let out = classify(&s, false);
        assert_eq!(out.shape, ShapeClass::Trapezoid);

        // equal legs b and d upgrade to isosceles trapezoid
        let s = snapshot(&[
            ("A", 70.0),
            ("B", 100.0),
            ("C", 80.0),
            ("D", 110.0),
            ("b", 3.0),
            ("d", 3.0),
        ]);
        let out = classify(&s, false);
        assert_eq!(out.shape, ShapeClass::IsoscelesTrapezoid);
    }

    #[test]
    fn general_quadrilateral_fallback() {
        let s = snapshot(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        let out = classify(&s, false);
        assert_eq!(out.shape, ShapeClass::Quadrilateral);
        assert_eq!(out.chain, vec![ShapeClass::Quadrilateral]);
    }
}
