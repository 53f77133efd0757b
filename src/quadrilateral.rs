//! Knowledge base: convex quadrilateral networks
//!
//! [`quadrilateral`] wires the relations every convex quadrilateral
//! satisfies: perimeter and semi-perimeter in both directions, the angle
//! sum, both diagonals via the law of cosines on their bounding
//! triangles, Bretschneider's area formula, and the trapezoidal
//! base/height area form.
//!
//! Each specialization *appends* constraints to that base, never
//! removing one, so a value written by a specialized rule may be
//! re-derived by a base rule and vice versa; the write protocol's
//! change-guard plus the shared domain checks keep that quiet.
//!
//! Vertex/side convention: vertices `A, B, C, D` in order, side `a = AB`,
//! `b = BC`, `c = CD`, `d = DA`; diagonal `d1 = AC`, `d2 = BD`. For the
//! trapezoid, `a` and `c` are the parallel bases and `h` the distance
//! between them.

#![forbid(unsafe_code)]

use crate::constraint::{Constraint, FlexRule, ForwardRule};
use crate::network::Network;

fn quad_variables(net: &mut Network) {
    net.add_variable("a", "side a (vertex A to B)");
    net.add_variable("b", "side b (vertex B to C)");
    net.add_variable("c", "side c (vertex C to D)");
    net.add_variable("d", "side d (vertex D to A)");
    net.add_variable("A", "angle at vertex A, degrees");
    net.add_variable("B", "angle at vertex B, degrees");
    net.add_variable("C", "angle at vertex C, degrees");
    net.add_variable("D", "angle at vertex D, degrees");
    net.add_variable("perimeter", "perimeter a + b + c + d");
    net.add_variable("area", "quadrilateral area");
    net.add_variable("s", "semi-perimeter (a + b + c + d) / 2");
    net.add_variable("d1", "diagonal from vertex A to C");
    net.add_variable("d2", "diagonal from vertex B to D");
    net.add_variable("h", "height between the parallel bases a and c");
}

/// A fully wired general convex quadrilateral network.
pub fn quadrilateral() -> Network {
    let mut net = Network::new();
    quad_variables(&mut net);

    net.add_constraint(Constraint::forward(
        "quad_perimeter",
        &["a", "b", "c", "d", "perimeter"],
        "perimeter",
        ForwardRule::Sum { terms: &["a", "b", "c", "d"], factor: 1.0 },
    ));
    net.add_constraint(Constraint::flex(
        "perimeter_reverse_quad",
        &["a", "b", "c", "d", "perimeter"],
        FlexRule::PerimeterReverse { sides: &["a", "b", "c", "d"], triangle_check: false },
    ));
    net.add_constraint(Constraint::forward(
        "semi_perimeter",
        &["a", "b", "c", "d", "s"],
        "s",
        ForwardRule::Sum { terms: &["a", "b", "c", "d"], factor: 0.5 },
    ));
    net.add_constraint(Constraint::forward(
        "semi_perimeter_from_p",
        &["perimeter", "s"],
        "s",
        ForwardRule::Sum { terms: &["perimeter"], factor: 0.5 },
    ));

    net.add_constraint(Constraint::flex(
        "angle_sum_quad",
        &["A", "B", "C", "D"],
        FlexRule::QuadAngleSum,
    ));

    // d1 = AC closes triangles ABC (sides a, b around B) and ACD (sides
    // c, d around D); d2 = BD closes ABD and BCD.
    net.add_constraint(Constraint::flex(
        "diagonal_d1",
        &["a", "b", "c", "d", "B", "D", "d1"],
        FlexRule::DiagonalFromSides { diag: "d1", options: &[("a", "b", "B"), ("c", "d", "D")] },
    ));
    net.add_constraint(Constraint::flex(
        "diagonal_d2",
        &["a", "b", "c", "d", "A", "C", "d2"],
        FlexRule::DiagonalFromSides { diag: "d2", options: &[("a", "d", "A"), ("b", "c", "C")] },
    ));

    net.add_constraint(Constraint::flex(
        "bretschneider",
        &["a", "b", "c", "d", "A", "B", "C", "D", "area"],
        FlexRule::Bretschneider,
    ));
    net.add_constraint(Constraint::flex(
        "trapezoid_area",
        &["a", "c", "h", "area"],
        FlexRule::TrapezoidArea,
    ));

    net
}

/// Trapezoid with bases `a ∥ c` atop the [`quadrilateral`] base.
pub fn trapezoid() -> Network {
    let mut net = quadrilateral();

    // Same-leg interior angles are supplementary when a ∥ c.
    net.add_constraint(Constraint::flex(
        "base_angle_supplements",
        &["A", "B", "C", "D"],
        FlexRule::SupplementaryPairs { pairs: &[("A", "D"), ("B", "C")] },
    ));
    net.add_constraint(Constraint::flex(
        "slant_height",
        &["b", "d", "B", "D", "h"],
        FlexRule::SlantHeight { pairs: &[("b", "B"), ("d", "D")] },
    ));
    net.add_constraint(Constraint::flex(
        "height_from_sides",
        &["a", "b", "c", "d", "h"],
        FlexRule::TrapezoidHeightFromSides,
    ));

    net
}

/// Parallelogram atop the [`quadrilateral`] base.
pub fn parallelogram() -> Network {
    let mut net = quadrilateral();

    net.add_constraint(Constraint::flex(
        "opposite_sides",
        &["a", "b", "c", "d"],
        FlexRule::EqualPairs { pairs: &[("a", "c"), ("b", "d")] },
    ));
    net.add_constraint(Constraint::flex(
        "opposite_angles",
        &["A", "B", "C", "D"],
        FlexRule::EqualPairs { pairs: &[("A", "C"), ("B", "D")] },
    ));
    net.add_constraint(Constraint::flex(
        "adjacent_supplements",
        &["A", "B", "C", "D"],
        FlexRule::SupplementaryPairs {
            pairs: &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")],
        },
    ));
    net.add_constraint(Constraint::flex(
        "par_area_height",
        &["area", "a", "h"],
        FlexRule::ProductAll { product: "area", x: "a", y: "h", factor: 1.0 },
    ));
    net.add_constraint(Constraint::flex(
        "par_area_sas",
        &["a", "b", "A", "area"],
        FlexRule::SasArea { s1: "a", s2: "b", vertex: "A" },
    ));
    net.add_constraint(Constraint::flex(
        "diagonal_identity",
        &["d1", "d2", "a", "b"],
        FlexRule::DiagonalIdentity,
    ));
    net.add_constraint(Constraint::flex(
        "sides_from_half_perimeter",
        &["perimeter", "a", "b"],
        FlexRule::SidesFromHalfPerimeter { x: "a", y: "b" },
    ));
    // Closed-form system: X² − (P/2)·X + area/sin A = 0.
    net.add_constraint(Constraint::flex(
        "par_sides_from_p_area",
        &["perimeter", "area", "A", "a", "b"],
        FlexRule::QuadraticSides { x: "a", y: "b", use_angle: true },
    ));

    net
}

/// Rectangle atop [`parallelogram`].
pub fn rectangle() -> Network {
    let mut net = parallelogram();

    // Wide trigger scope: the first user input of any kind wakes the
    // right-angle defaults.
    net.add_constraint(Constraint::flex(
        "right_angles",
        &["a", "b", "c", "d", "A", "B", "C", "D", "perimeter", "area"],
        FlexRule::DefaultAngles { angles: &["A", "B", "C", "D"], value: 90.0 },
    ));
    net.add_constraint(Constraint::flex(
        "equal_diagonals",
        &["d1", "d2"],
        FlexRule::EqualPairs { pairs: &[("d1", "d2")] },
    ));
    net.add_constraint(Constraint::forward(
        "diagonal_pythagoras",
        &["a", "b", "d1"],
        "d1",
        ForwardRule::Hypot { x: "a", y: "b", factor: 1.0 },
    ));
    net.add_constraint(Constraint::flex(
        "side_from_diagonal",
        &["a", "b", "d1"],
        FlexRule::LegFromHypot { hyp: "d1", legs: ("a", "b") },
    ));
    net.add_constraint(Constraint::flex(
        "rect_area",
        &["a", "b", "area"],
        FlexRule::ProductAll { product: "area", x: "a", y: "b", factor: 1.0 },
    ));
    // Closed-form system: X² − (P/2)·X + area = 0.
    net.add_constraint(Constraint::flex(
        "rect_sides_from_p_area",
        &["perimeter", "area", "a", "b"],
        FlexRule::QuadraticSides { x: "a", y: "b", use_angle: false },
    ));

    net
}

/// Rhombus atop [`parallelogram`].
pub fn rhombus() -> Network {
    let mut net = parallelogram();

    net.add_constraint(Constraint::flex(
        "sides_equal",
        &["a", "b", "c", "d"],
        FlexRule::EqualGroup { names: &["a", "b", "c", "d"] },
    ));
    net.add_constraint(Constraint::flex(
        "rhombus_area",
        &["area", "d1", "d2"],
        FlexRule::ProductAll { product: "area", x: "d1", y: "d2", factor: 0.5 },
    ));
    // The diagonals bisect each other at right angles.
    net.add_constraint(Constraint::forward(
        "side_from_diagonals",
        &["d1", "d2", "a"],
        "a",
        ForwardRule::Hypot { x: "d1", y: "d2", factor: 0.5 },
    ));
    net.add_constraint(Constraint::forward(
        "side_from_perimeter",
        &["perimeter", "a"],
        "a",
        ForwardRule::Sum { terms: &["perimeter"], factor: 0.25 },
    ));

    net
}

/// Square atop [`rectangle`].
pub fn square() -> Network {
    let mut net = rectangle();

    net.add_constraint(Constraint::flex(
        "sides_equal",
        &["a", "b", "c", "d"],
        FlexRule::EqualGroup { names: &["a", "b", "c", "d"] },
    ));
    net.add_constraint(Constraint::forward(
        "side_from_perimeter",
        &["perimeter", "a"],
        "a",
        ForwardRule::Sum { terms: &["perimeter"], factor: 0.25 },
    ));
    net.add_constraint(Constraint::forward(
        "side_from_area",
        &["area", "a"],
        "a",
        ForwardRule::SqrtScale { x: "area", factor: 1.0 },
    ));
    net.add_constraint(Constraint::forward(
        "diagonal_sqrt2",
        &["a", "d1"],
        "d1",
        ForwardRule::Sum { terms: &["a"], factor: std::f64::consts::SQRT_2 },
    ));

    net
}
