//! Knowledge base: triangle networks
//!
//! [`triangle`] wires the full catalogue of triangle relations: angle
//! sums, law of sines and cosines, perimeter and semi-perimeter in both
//! directions, Heron/SAS area and its altitude inverse, medians,
//! bisectors, altitudes, and the circum-/in-/ex-radii.
//!
//! [`equilateral_triangle`] layers the equilateral specializations on
//! top: side equality, the 60° angle defaults, and the closed forms
//! between one side, the perimeter, and the area. Specializations only
//! append relations; the base catalogue stays intact, and the write
//! protocol's change-guard keeps the overlapping derivations quiet.

#![forbid(unsafe_code)]

use crate::constraint::{Constraint, FlexRule, ForwardRule};
use crate::network::Network;

fn triangle_variables(net: &mut Network) {
    net.add_variable("a", "side a");
    net.add_variable("b", "side b");
    net.add_variable("c", "side c");
    net.add_variable("d", "side d (quadrilateral vocabulary; no triangle relation uses it)");
    net.add_variable("A", "angle A in degrees, opposite side a");
    net.add_variable("B", "angle B in degrees, opposite side b");
    net.add_variable("C", "angle C in degrees, opposite side c");
    net.add_variable("D", "angle D (quadrilateral vocabulary; no triangle relation uses it)");
    net.add_variable("perimeter", "perimeter a + b + c");
    net.add_variable("area", "triangle area");
    net.add_variable("s", "semi-perimeter (a + b + c) / 2");
    net.add_variable("R", "circumradius");
    net.add_variable("r", "inradius");
    net.add_variable("r_a", "exradius opposite side a");
    net.add_variable("r_b", "exradius opposite side b");
    net.add_variable("r_c", "exradius opposite side c");
    net.add_variable("m_a", "median toward side a");
    net.add_variable("m_b", "median toward side b");
    net.add_variable("m_c", "median toward side c");
    net.add_variable("l_a", "interior bisector length from vertex A");
    net.add_variable("l_b", "interior bisector length from vertex B");
    net.add_variable("l_c", "interior bisector length from vertex C");
    net.add_variable("h_a", "altitude onto side a");
    net.add_variable("h_b", "altitude onto side b");
    net.add_variable("h_c", "altitude onto side c");
}

/// A fully wired general-triangle network.
pub fn triangle() -> Network {
    let mut net = Network::new();
    triangle_variables(&mut net);

    // Angle sum, one forward rule per missing angle.
    net.add_constraint(Constraint::forward(
        "sum_A",
        &["A", "B", "C"],
        "A",
        ForwardRule::Complement { total: 180.0, terms: &["B", "C"] },
    ));
    net.add_constraint(Constraint::forward(
        "sum_B",
        &["A", "B", "C"],
        "B",
        ForwardRule::Complement { total: 180.0, terms: &["A", "C"] },
    ));
    net.add_constraint(Constraint::forward(
        "sum_C",
        &["A", "B", "C"],
        "C",
        ForwardRule::Complement { total: 180.0, terms: &["A", "B"] },
    ));

    net.add_constraint(Constraint::flex(
        "law_sines",
        &["a", "b", "c", "A", "B", "C"],
        FlexRule::LawOfSines,
    ));

    // Law of cosines, side form.
    net.add_constraint(Constraint::forward(
        "cos_a",
        &["a", "b", "c", "A"],
        "a",
        ForwardRule::LawOfCosinesSide { s1: "b", s2: "c", vertex: "A" },
    ));
    net.add_constraint(Constraint::forward(
        "cos_b",
        &["b", "a", "c", "B"],
        "b",
        ForwardRule::LawOfCosinesSide { s1: "a", s2: "c", vertex: "B" },
    ));
    net.add_constraint(Constraint::forward(
        "cos_c",
        &["c", "a", "b", "C"],
        "c",
        ForwardRule::LawOfCosinesSide { s1: "a", s2: "b", vertex: "C" },
    ));

    // Law of cosines, angle form (clamped before acos).
    net.add_constraint(Constraint::forward(
        "angle_A_from_cos",
        &["a", "b", "c", "A"],
        "A",
        ForwardRule::LawOfCosinesAngle { opposite: "a", s1: "b", s2: "c" },
    ));
    net.add_constraint(Constraint::forward(
        "angle_B_from_cos",
        &["a", "b", "c", "B"],
        "B",
        ForwardRule::LawOfCosinesAngle { opposite: "b", s1: "a", s2: "c" },
    ));
    net.add_constraint(Constraint::forward(
        "angle_C_from_cos",
        &["a", "b", "c", "C"],
        "C",
        ForwardRule::LawOfCosinesAngle { opposite: "c", s1: "a", s2: "b" },
    ));

    net.add_constraint(Constraint::forward(
        "perimeter",
        &["a", "b", "c", "perimeter"],
        "perimeter",
        ForwardRule::Sum { terms: &["a", "b", "c"], factor: 1.0 },
    ));
    net.add_constraint(Constraint::flex(
        "perimeter_reverse",
        &["a", "b", "c", "perimeter"],
        FlexRule::PerimeterReverse { sides: &["a", "b", "c"], triangle_check: true },
    ));

    net.add_constraint(Constraint::forward(
        "semi_perimeter",
        &["a", "b", "c", "s"],
        "s",
        ForwardRule::Sum { terms: &["a", "b", "c"], factor: 0.5 },
    ));
    net.add_constraint(Constraint::forward(
        "semi_perimeter_from_p",
        &["perimeter", "s"],
        "s",
        ForwardRule::Sum { terms: &["perimeter"], factor: 0.5 },
    ));

    net.add_constraint(Constraint::forward(
        "circumradius",
        &["a", "b", "c", "area", "R"],
        "R",
        ForwardRule::Circumradius,
    ));
    net.add_constraint(Constraint::forward(
        "inradius",
        &["area", "s", "r"],
        "r",
        ForwardRule::Ratio { num: "area", den: "s", factor: 1.0 },
    ));
    net.add_constraint(Constraint::forward(
        "exradius_a",
        &["area", "s", "a", "r_a"],
        "r_a",
        ForwardRule::RatioDiff { num: "area", lhs: "s", rhs: "a" },
    ));
    net.add_constraint(Constraint::forward(
        "exradius_b",
        &["area", "s", "b", "r_b"],
        "r_b",
        ForwardRule::RatioDiff { num: "area", lhs: "s", rhs: "b" },
    ));
    net.add_constraint(Constraint::forward(
        "exradius_c",
        &["area", "s", "c", "r_c"],
        "r_c",
        ForwardRule::RatioDiff { num: "area", lhs: "s", rhs: "c" },
    ));

    // Apollonius medians.
    net.add_constraint(Constraint::forward(
        "median_a",
        &["a", "b", "c", "m_a"],
        "m_a",
        ForwardRule::Median { opposite: "a", flank1: "b", flank2: "c" },
    ));
    net.add_constraint(Constraint::forward(
        "median_b",
        &["a", "b", "c", "m_b"],
        "m_b",
        ForwardRule::Median { opposite: "b", flank1: "a", flank2: "c" },
    ));
    net.add_constraint(Constraint::forward(
        "median_c",
        &["a", "b", "c", "m_c"],
        "m_c",
        ForwardRule::Median { opposite: "c", flank1: "a", flank2: "b" },
    ));

    net.add_constraint(Constraint::forward(
        "bisector_a",
        &["b", "c", "A", "l_a"],
        "l_a",
        ForwardRule::Bisector { flank1: "b", flank2: "c", vertex: "A" },
    ));
    net.add_constraint(Constraint::forward(
        "bisector_b",
        &["a", "c", "B", "l_b"],
        "l_b",
        ForwardRule::Bisector { flank1: "a", flank2: "c", vertex: "B" },
    ));
    net.add_constraint(Constraint::forward(
        "bisector_c",
        &["a", "b", "C", "l_c"],
        "l_c",
        ForwardRule::Bisector { flank1: "a", flank2: "b", vertex: "C" },
    ));

    net.add_constraint(Constraint::forward(
        "height_a",
        &["area", "a", "h_a"],
        "h_a",
        ForwardRule::Ratio { num: "area", den: "a", factor: 2.0 },
    ));
    net.add_constraint(Constraint::forward(
        "height_b",
        &["area", "b", "h_b"],
        "h_b",
        ForwardRule::Ratio { num: "area", den: "b", factor: 2.0 },
    ));
    net.add_constraint(Constraint::forward(
        "height_c",
        &["area", "c", "h_c"],
        "h_c",
        ForwardRule::Ratio { num: "area", den: "c", factor: 2.0 },
    ));

    net.add_constraint(Constraint::flex(
        "area_flex",
        &["a", "b", "c", "A", "B", "C", "area"],
        FlexRule::TriangleArea,
    ));
    net.add_constraint(Constraint::flex(
        "area_reverse_triangle",
        &["a", "b", "c", "area", "h_a", "h_b", "h_c"],
        FlexRule::SideFromAltitudeArea {
            pairs: &[("a", "h_a"), ("b", "h_b"), ("c", "h_c")],
        },
    ));

    net
}

/// The equilateral specialization of [`triangle`].
pub fn equilateral_triangle() -> Network {
    let mut net = triangle();

    net.add_constraint(Constraint::flex(
        "sides_equal",
        &["a", "b", "c"],
        FlexRule::EqualGroup { names: &["a", "b", "c"] },
    ));
    // Wide trigger scope: the first user input of any kind wakes the
    // 60-degree defaults.
    net.add_constraint(Constraint::flex(
        "equilateral_angles",
        &["a", "b", "c", "A", "B", "C", "perimeter", "area"],
        FlexRule::DefaultAngles { angles: &["A", "B", "C"], value: 60.0 },
    ));
    net.add_constraint(Constraint::forward(
        "equilateral_area",
        &["a", "area"],
        "area",
        ForwardRule::SquareScale { x: "a", factor: 3.0_f64.sqrt() / 4.0 },
    ));
    net.add_constraint(Constraint::forward(
        "equilateral_perimeter",
        &["a", "perimeter"],
        "perimeter",
        ForwardRule::Sum { terms: &["a"], factor: 3.0 },
    ));
    net.add_constraint(Constraint::forward(
        "side_from_perimeter",
        &["perimeter", "a"],
        "a",
        ForwardRule::Sum { terms: &["perimeter"], factor: 1.0 / 3.0 },
    ));
    net.add_constraint(Constraint::forward(
        "side_from_area",
        &["area", "a"],
        "a",
        ForwardRule::SqrtScale { x: "area", factor: 4.0 / 3.0_f64.sqrt() },
    ));

    net
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(x: Option<f64>, y: f64) -> bool {
        x.map(|v| (v - y).abs() < 1e-3).unwrap_or(false)
    }

    #[test]
    fn three_sides_derive_everything() {
        let mut net = triangle();
        net.set_input("a", 3.0).unwrap();
        net.set_input("b", 4.0).unwrap();
        net.set_input("c", 5.0).unwrap();
        net.solve().unwrap();
        assert!(close(net.value("C"), 90.0));
        assert!(close(net.value("A"), 36.8699));
        assert!(close(net.value("area"), 6.0));
        assert!(close(net.value("perimeter"), 12.0));
        assert!(close(net.value("R"), 2.5));
        assert!(close(net.value("r"), 1.0));
        assert!(close(net.value("h_c"), 2.4));
        assert!(close(net.value("m_c"), 2.5)); // median to the hypotenuse
    }

    #[test]
    fn two_angles_and_a_side_close_the_triangle() {
        let mut net = triangle();
        net.set_input("A", 30.0).unwrap();
        net.set_input("B", 90.0).unwrap();
        net.set_input("a", 1.0).unwrap();
        net.solve().unwrap();
        assert!(close(net.value("C"), 60.0));
        assert!(close(net.value("b"), 2.0));
        assert!(close(net.value("c"), 3.0_f64.sqrt()));
    }

    #[test]
    fn area_and_altitude_recover_the_base() {
        let mut net = triangle();
        net.set_input("area", 6.0).unwrap();
        net.set_input("h_a", 4.0).unwrap();
        net.solve().unwrap();
        assert!(close(net.value("a"), 3.0));
    }

    #[test]
    fn equilateral_from_one_side() {
        let mut net = equilateral_triangle();
        net.set_input("a", 2.0).unwrap();
        net.solve().unwrap();
        assert!(close(net.value("b"), 2.0));
        assert!(close(net.value("c"), 2.0));
        assert!(close(net.value("A"), 60.0));
        assert!(close(net.value("perimeter"), 6.0));
        assert!(close(net.value("area"), 3.0_f64.sqrt()));
    }

    #[test]
    fn equilateral_from_perimeter() {
        let mut net = equilateral_triangle();
        for angle in ["A", "B", "C"] {
            assert!(net.set_input(angle, 60.0).unwrap().is_accepted());
        }
        assert!(net.set_input("perimeter", 9.0).unwrap().is_accepted());
        net.solve().unwrap();
        assert!(close(net.value("a"), 3.0));
        assert!(close(net.value("b"), 3.0));
        assert!(close(net.value("area"), 9.0 * 3.0_f64.sqrt() / 4.0));
    }

    #[test]
    fn degenerate_sides_raise_and_roll_back() {
        // a > b + c cannot close: the clamped law-of-cosines angles land
        // on the open interval's endpoints, the write protocol raises,
        // and the offending input is rolled back
        let mut net = triangle();
        net.set_input("a", 10.0).unwrap();
        net.set_input("b", 2.0).unwrap();
        assert!(net.set_input("c", 3.0).is_err());
        assert!(!net.is_known("c"));
        assert!(!net.is_known("A"));
        assert_eq!(net.value("a"), Some(10.0));
        assert_eq!(net.value("b"), Some(2.0));
    }

    #[test]
    fn catalogue_names_are_unique() {
        // add_constraint asserts uniqueness; building both factories
        // exercises every registration path.
        let _ = triangle();
        let _ = equilateral_triangle();
    }
}
