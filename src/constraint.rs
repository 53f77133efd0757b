//! Constraints: the closed relation vocabulary and its evaluation
//!
//! A [`Constraint`] is an immutable record: a unique name, a scope (the
//! variable names it reads or writes), and a [`Body`] in one of two forms.
//!
//! - **Forward** bodies have a single declared target and a
//!   [`ForwardRule`] whose parameter block names the dependencies. They
//!   fire when the target is unknown and every dependency is known.
//! - **Flexible** bodies carry a [`FlexRule`] that inspects the current
//!   known/unknown partition of its scope and may produce several
//!   updates at once (the law of sines is the canonical example).
//!
//! Rules are plain data (a tag plus variable names) with no captured
//! state, so the whole catalogue is a closed vocabulary the evaluator
//! dispatches on. Numeric degeneracies (division by a vanishing
//! denominator, negative radicands beyond [`safe_sqrt`]'s slack) yield
//! "no update" rather than an error; domain enforcement happens later,
//! in the variable write protocol.
//!
//! [`safe_sqrt`]: crate::numeric::safe_sqrt

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use crate::network::Network;
use crate::numeric::{
    acos_deg, asin_deg, clamp, cos_deg, safe_sqrt, sin_deg, triangle_inequality_ok, DIV_GUARD,
};

/// Updates proposed by one constraint application: `(name, value)` pairs.
///
/// The constraint never writes to the network itself; the network merges
/// these through the variable write protocol.
pub type Updates = Vec<(&'static str, f64)>;

/// A named rule over a set of variables.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Unique (per network) rule name; doubles as the provenance tag.
    pub name: &'static str,
    /// Every variable the rule reads or writes.
    pub scope: &'static [&'static str],
    pub body: Body,
}

/// The two supported rule forms.
#[derive(Debug, Clone)]
pub enum Body {
    /// Single-target, deterministic, with dependencies derived from the rule.
    Forward { target: &'static str, rule: ForwardRule },
    /// Multi-target; picks its own targets from the current state.
    Flex(FlexRule),
}

impl Constraint {
    pub(crate) fn forward(
        name: &'static str,
        scope: &'static [&'static str],
        target: &'static str,
        rule: ForwardRule,
    ) -> Self {
        Self { name, scope, body: Body::Forward { target, rule } }
    }

    pub(crate) fn flex(
        name: &'static str,
        scope: &'static [&'static str],
        rule: FlexRule,
    ) -> Self {
        Self { name, scope, body: Body::Flex(rule) }
    }

    /// Evaluate against the network and return the proposed updates.
    ///
    /// Forward bodies short-circuit when the target is already known or a
    /// dependency is missing. Flexible bodies short-circuit when the whole
    /// scope is known. Non-finite results are dropped here so the caller
    /// only ever merges well-formed numbers.
    pub fn try_apply(&self, net: &Network) -> Updates {
        match &self.body {
            Body::Forward { target, rule } => {
                if net.is_known(target) {
                    return Vec::new();
                }
                for dep in rule.deps() {
                    if !net.is_known(dep) {
                        return Vec::new();
                    }
                }
                let get = |n: &'static str| net.value(n).unwrap_or(f64::NAN);
                match rule.eval(&get) {
                    Some(v) if v.is_finite() => vec![(*target, v)],
                    Some(_) | None => {
                        tracing::trace!(rule = self.name, "forward body yielded no result");
                        Vec::new()
                    }
                }
            }
            Body::Flex(rule) => {
                if self.scope.iter().all(|n| net.is_known(n)) {
                    return Vec::new();
                }
                rule.eval(net)
                    .into_iter()
                    .filter(|(n, v)| v.is_finite() && !net.is_known(n))
                    .collect()
            }
        }
    }

    /// Dependencies of a forward body (empty for flexible bodies).
    pub fn forward_deps(&self) -> Vec<&'static str> {
        match &self.body {
            Body::Forward { rule, .. } => rule.deps(),
            Body::Flex(_) => Vec::new(),
        }
    }
}

// ============================================================================
// Forward rules
// ============================================================================

/// Single-target relations, tagged by shape and parameterized by the
/// variable names they read.
#[derive(Debug, Clone, Copy)]
pub enum ForwardRule {
    /// `target = factor · Σ terms` (perimeters, semi-perimeters, simple
    /// rescalings such as `d1 = √2 · a`).
    Sum { terms: &'static [&'static str], factor: f64 },
    /// `target = total − Σ terms`, rejected unless the result stays
    /// strictly inside `(0, total)` (angle sums).
    Complement { total: f64, terms: &'static [&'static str] },
    /// `target = factor · x · y` (rectangle and rhombus areas).
    Product { x: &'static str, y: &'static str, factor: f64 },
    /// `target = factor · num / den` (altitudes, inradius).
    Ratio { num: &'static str, den: &'static str, factor: f64 },
    /// `target = num / (lhs − rhs)` (exradii).
    RatioDiff { num: &'static str, lhs: &'static str, rhs: &'static str },
    /// `target = factor · x²` (equilateral area).
    SquareScale { x: &'static str, factor: f64 },
    /// `target = √(factor · x)` (side from area).
    SqrtScale { x: &'static str, factor: f64 },
    /// `target = factor · √(x² + y²)` (rectangle diagonal, rhombus side
    /// from half-diagonals).
    Hypot { x: &'static str, y: &'static str, factor: f64 },
    /// Law of cosines for the side opposite `vertex`.
    LawOfCosinesSide { s1: &'static str, s2: &'static str, vertex: &'static str },
    /// Law of cosines solved for the angle opposite `opposite`.
    LawOfCosinesAngle { opposite: &'static str, s1: &'static str, s2: &'static str },
    /// Apollonius' median length toward `opposite`.
    Median { opposite: &'static str, flank1: &'static str, flank2: &'static str },
    /// Interior bisector length from the vertex with angle `vertex`.
    Bisector { flank1: &'static str, flank2: &'static str, vertex: &'static str },
    /// `R = abc / (4 · area)`.
    Circumradius,
}

impl ForwardRule {
    /// The dependency names, in declaration order.
    pub fn deps(&self) -> Vec<&'static str> {
        match *self {
            ForwardRule::Sum { terms, .. } | ForwardRule::Complement { terms, .. } => {
                terms.to_vec()
            }
            ForwardRule::Product { x, y, .. } | ForwardRule::Hypot { x, y, .. } => vec![x, y],
            ForwardRule::Ratio { num, den, .. } => vec![num, den],
            ForwardRule::RatioDiff { num, lhs, rhs } => vec![num, lhs, rhs],
            ForwardRule::SquareScale { x, .. } | ForwardRule::SqrtScale { x, .. } => vec![x],
            ForwardRule::LawOfCosinesSide { s1, s2, vertex } => vec![s1, s2, vertex],
            ForwardRule::LawOfCosinesAngle { opposite, s1, s2 } => vec![opposite, s1, s2],
            ForwardRule::Median { opposite, flank1, flank2 } => vec![opposite, flank1, flank2],
            ForwardRule::Bisector { flank1, flank2, vertex } => vec![flank1, flank2, vertex],
            ForwardRule::Circumradius => vec!["a", "b", "c", "area"],
        }
    }

    fn eval(&self, get: &dyn Fn(&'static str) -> f64) -> Option<f64> {
        match *self {
            ForwardRule::Sum { terms, factor } => {
                Some(factor * terms.iter().map(|t| get(t)).sum::<f64>())
            }
            ForwardRule::Complement { total, terms } => {
                let rest: f64 = terms.iter().map(|t| get(t)).sum();
                let v = total - rest;
                (v > 0.0 && v < total).then_some(v)
            }
            ForwardRule::Product { x, y, factor } => Some(factor * get(x) * get(y)),
            ForwardRule::Ratio { num, den, factor } => {
                let d = get(den);
                (d.abs() > DIV_GUARD).then(|| factor * get(num) / d)
            }
            ForwardRule::RatioDiff { num, lhs, rhs } => {
                let d = get(lhs) - get(rhs);
                (d.abs() > DIV_GUARD).then(|| get(num) / d)
            }
            ForwardRule::SquareScale { x, factor } => {
                let v = get(x);
                Some(factor * v * v)
            }
            ForwardRule::SqrtScale { x, factor } => safe_sqrt(factor * get(x)),
            ForwardRule::Hypot { x, y, factor } => {
                let (xv, yv) = (get(x), get(y));
                safe_sqrt(xv * xv + yv * yv).map(|r| factor * r)
            }
            ForwardRule::LawOfCosinesSide { s1, s2, vertex } => {
                let (p, q) = (get(s1), get(s2));
                safe_sqrt(p * p + q * q - 2.0 * p * q * cos_deg(get(vertex)))
            }
            ForwardRule::LawOfCosinesAngle { opposite, s1, s2 } => {
                let (o, p, q) = (get(opposite), get(s1), get(s2));
                let den = 2.0 * p * q;
                if den.abs() <= DIV_GUARD {
                    return None;
                }
                Some(acos_deg(clamp((p * p + q * q - o * o) / den, -1.0, 1.0)))
            }
            ForwardRule::Median { opposite, flank1, flank2 } => {
                let (o, p, q) = (get(opposite), get(flank1), get(flank2));
                safe_sqrt(0.25 * (2.0 * (p * p + q * q) - o * o))
            }
            ForwardRule::Bisector { flank1, flank2, vertex } => {
                let (p, q) = (get(flank1), get(flank2));
                let den = p + q;
                (den.abs() > DIV_GUARD)
                    .then(|| 2.0 * p * q * cos_deg(get(vertex) / 2.0) / den)
            }
            ForwardRule::Circumradius => {
                let area = get("area");
                (area.abs() > DIV_GUARD)
                    .then(|| get("a") * get("b") * get("c") / (4.0 * area))
            }
        }
    }
}

// ============================================================================
// Flexible rules
// ============================================================================

/// Multi-target relations. Each evaluator reads the network, decides which
/// scope variables it can fill in, and returns those, and only those.
#[derive(Debug, Clone, Copy)]
pub enum FlexRule {
    /// Law of sines over `(a, A)`, `(b, B)`, `(c, C)`: the first known
    /// pair fixes the ratio, every other pair fills its missing half
    /// (sides directly, angles on the principal `asin` branch).
    LawOfSines,
    /// Missing side from the perimeter when all but one side is known.
    /// With `triangle_check` the completed side set must satisfy the
    /// triangle inequality; the quadrilateral variant only requires
    /// positivity.
    PerimeterReverse { sides: &'static [&'static str], triangle_check: bool },
    /// Triangle area: Heron when all sides are known, otherwise the SAS
    /// form over whichever (side, side, included angle) triple is known.
    TriangleArea,
    /// Base from area and the matching altitude: `x = 2 · area / h_x`.
    SideFromAltitudeArea { pairs: &'static [(&'static str, &'static str)] },
    /// Fourth quadrilateral angle from `360 − Σ` of the other three.
    QuadAngleSum,
    /// Diagonal via the law of cosines on either bounding triangle.
    DiagonalFromSides {
        diag: &'static str,
        options: &'static [(&'static str, &'static str, &'static str)],
    },
    /// Bretschneider's formula (four sides plus two opposite angles).
    Bretschneider,
    /// Trapezoid area `½·(a + c)·h` and its inverse for `h`.
    TrapezoidArea,
    /// Propagate the first known member of the group to all the others
    /// (equilateral / rhombus / square side equality).
    EqualGroup { names: &'static [&'static str] },
    /// Copy across each pair in whichever direction is determined
    /// (opposite sides, opposite angles, equal diagonals).
    EqualPairs { pairs: &'static [(&'static str, &'static str)] },
    /// For each pair, the missing member is `180 −` the known one.
    SupplementaryPairs { pairs: &'static [(&'static str, &'static str)] },
    /// Trapezoid altitude from a slant side and its base angle
    /// (`h = side · sin(angle)`) and the side from `h / sin(angle)`.
    SlantHeight { pairs: &'static [(&'static str, &'static str)] },
    /// Closed-form trapezoid altitude from all four sides when the two
    /// bases differ.
    TrapezoidHeightFromSides,
    /// `product = factor · x · y` together with both inverses.
    ProductAll {
        product: &'static str,
        x: &'static str,
        y: &'static str,
        factor: f64,
    },
    /// `area = s1 · s2 · sin(vertex)` (parallelogram SAS form).
    SasArea { s1: &'static str, s2: &'static str, vertex: &'static str },
    /// Parallelogram diagonal identity `d1² + d2² = 2(a² + b²)`, solved
    /// for whichever single participant is missing.
    DiagonalIdentity,
    /// Parallelogram: from the perimeter and one of the two distinct
    /// sides, the other is `P/2 −` the known one.
    SidesFromHalfPerimeter { x: &'static str, y: &'static str },
    /// The closed-form perimeter-and-area system
    /// `X² − (P/2)·X + q = 0` with `q = area` (rectangle) or
    /// `q = area / sin A` (parallelogram). Fires only when neither side
    /// is known; requires two strictly positive real roots and assigns
    /// the larger to `x`.
    QuadraticSides { x: &'static str, y: &'static str, use_angle: bool },
    /// Missing leg from the hypotenuse/diagonal: `x = √(h² − y²)`.
    LegFromHypot { hyp: &'static str, legs: (&'static str, &'static str) },
    /// Fill every still-unknown angle in the list with a fixed value
    /// (60° for the equilateral triangle, 90° for rectangle and square).
    DefaultAngles { angles: &'static [&'static str], value: f64 },
}

const SINE_PAIRS: [(&str, &str); 3] = [("a", "A"), ("b", "B"), ("c", "C")];

impl FlexRule {
    fn eval(&self, net: &Network) -> Updates {
        match *self {
            FlexRule::LawOfSines => law_of_sines(net),
            FlexRule::PerimeterReverse { sides, triangle_check } => {
                perimeter_reverse(net, sides, triangle_check)
            }
            FlexRule::TriangleArea => triangle_area(net),
            FlexRule::SideFromAltitudeArea { pairs } => side_from_altitude_area(net, pairs),
            FlexRule::QuadAngleSum => quad_angle_sum(net),
            FlexRule::DiagonalFromSides { diag, options } => {
                diagonal_from_sides(net, diag, options)
            }
            FlexRule::Bretschneider => bretschneider(net),
            FlexRule::TrapezoidArea => trapezoid_area(net),
            FlexRule::EqualGroup { names } => equal_group(net, names),
            FlexRule::EqualPairs { pairs } => equal_pairs(net, pairs),
            FlexRule::SupplementaryPairs { pairs } => supplementary_pairs(net, pairs),
            FlexRule::SlantHeight { pairs } => slant_height(net, pairs),
            FlexRule::TrapezoidHeightFromSides => trapezoid_height_from_sides(net),
            FlexRule::ProductAll { product, x, y, factor } => {
                product_all(net, product, x, y, factor)
            }
            FlexRule::SasArea { s1, s2, vertex } => sas_area(net, s1, s2, vertex),
            FlexRule::DiagonalIdentity => diagonal_identity(net),
            FlexRule::SidesFromHalfPerimeter { x, y } => {
                sides_from_half_perimeter(net, x, y)
            }
            FlexRule::QuadraticSides { x, y, use_angle } => {
                quadratic_sides(net, x, y, use_angle)
            }
            FlexRule::LegFromHypot { hyp, legs } => leg_from_hypot(net, hyp, legs),
            FlexRule::DefaultAngles { angles, value } => default_angles(net, angles, value),
        }
    }
}

fn law_of_sines(net: &Network) -> Updates {
    let mut ratio = None;
    for (side, angle) in SINE_PAIRS {
        if let (Some(s), Some(ang)) = (net.value(side), net.value(angle)) {
            let sin = sin_deg(ang);
            if sin.abs() < DIV_GUARD {
                continue;
            }
            ratio = Some(s / sin);
            break;
        }
    }
    let Some(ratio) = ratio else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (side, angle) in SINE_PAIRS {
        match (net.value(side), net.value(angle)) {
            (None, Some(ang)) => out.push((side, ratio * sin_deg(ang))),
            (Some(s), None) => {
                let sin = s / ratio;
                if (-1.0..=1.0).contains(&sin) {
                    out.push((angle, asin_deg(sin)));
                }
            }
            _ => {}
        }
    }
    out
}

fn perimeter_reverse(
    net: &Network,
    sides: &'static [&'static str],
    triangle_check: bool,
) -> Updates {
    let Some(p) = net.value("perimeter") else {
        return Vec::new();
    };
    let mut missing = None;
    let mut known_sum = 0.0;
    for s in sides {
        match net.value(s) {
            Some(v) => known_sum += v,
            None if missing.is_none() => missing = Some(*s),
            None => return Vec::new(), // more than one unknown
        }
    }
    let Some(target) = missing else {
        return Vec::new();
    };
    let v = p - known_sum;
    if v <= 0.0 {
        tracing::trace!(side = target, value = v, "perimeter leaves a non-positive side");
        return Vec::new();
    }
    if triangle_check {
        let mut abc = [0.0f64; 3];
        for (slot, s) in abc.iter_mut().zip(sides) {
            *slot = net.value(s).unwrap_or(v);
        }
        if !triangle_inequality_ok(abc[0], abc[1], abc[2]) {
            tracing::trace!(side = target, "derived side violates the triangle inequality");
            return Vec::new();
        }
    }
    vec![(target, v)]
}

fn triangle_area(net: &Network) -> Updates {
    if net.is_known("area") {
        return Vec::new();
    }
    if let (Some(a), Some(b), Some(c)) = (net.value("a"), net.value("b"), net.value("c")) {
        let s = (a + b + c) / 2.0;
        if let Some(area) = safe_sqrt(s * (s - a) * (s - b) * (s - c)) {
            return vec![("area", area)];
        }
        return Vec::new();
    }
    // SAS: two sides and the included angle, any orientation
    const SAS: [(&str, &str, &str); 3] = [("a", "b", "C"), ("b", "c", "A"), ("a", "c", "B")];
    for (s1, s2, vertex) in SAS {
        if let (Some(x), Some(y), Some(v)) =
            (net.value(s1), net.value(s2), net.value(vertex))
        {
            return vec![("area", 0.5 * x * y * sin_deg(v))];
        }
    }
    Vec::new()
}

fn side_from_altitude_area(
    net: &Network,
    pairs: &'static [(&'static str, &'static str)],
) -> Updates {
    let Some(area) = net.value("area") else {
        return Vec::new();
    };
    if area <= 0.0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    for (side, alt) in pairs {
        if net.is_known(side) {
            continue;
        }
        if let Some(h) = net.value(alt) {
            if h > DIV_GUARD {
                out.push((*side, 2.0 * area / h));
            }
        }
    }
    out
}

fn quad_angle_sum(net: &Network) -> Updates {
    const ANGLES: [&str; 4] = ["A", "B", "C", "D"];
    let mut missing = None;
    let mut sum = 0.0;
    for ang in ANGLES {
        match net.value(ang) {
            Some(v) => sum += v,
            None if missing.is_none() => missing = Some(ang),
            None => return Vec::new(),
        }
    }
    let Some(target) = missing else {
        return Vec::new();
    };
    let v = 360.0 - sum;
    let hi = if target == "D" { 360.0 } else { 180.0 };
    if v > 0.0 && v < hi {
        vec![(target, v)]
    } else {
        Vec::new()
    }
}

fn diagonal_from_sides(
    net: &Network,
    diag: &'static str,
    options: &'static [(&'static str, &'static str, &'static str)],
) -> Updates {
    if net.is_known(diag) {
        return Vec::new();
    }
    for (s1, s2, vertex) in options {
        if let (Some(p), Some(q), Some(v)) =
            (net.value(s1), net.value(s2), net.value(vertex))
        {
            if let Some(d) = safe_sqrt(p * p + q * q - 2.0 * p * q * cos_deg(v)) {
                return vec![(diag, d)];
            }
        }
    }
    Vec::new()
}

fn bretschneider(net: &Network) -> Updates {
    if net.is_known("area") {
        return Vec::new();
    }
    let (Some(a), Some(b), Some(c), Some(d)) =
        (net.value("a"), net.value("b"), net.value("c"), net.value("d"))
    else {
        return Vec::new();
    };
    let half = match (net.value("A"), net.value("C"), net.value("B"), net.value("D")) {
        (Some(x), Some(y), _, _) => (x + y) / 2.0,
        (_, _, Some(x), Some(y)) => (x + y) / 2.0,
        _ => return Vec::new(),
    };
    let s = (a + b + c + d) / 2.0;
    let cos_half = cos_deg(half);
    let radicand =
        (s - a) * (s - b) * (s - c) * (s - d) - a * b * c * d * cos_half * cos_half;
    match safe_sqrt(radicand) {
        Some(area) => vec![("area", area)],
        None => Vec::new(),
    }
}

fn trapezoid_area(net: &Network) -> Updates {
    let (a, c) = (net.value("a"), net.value("c"));
    match (net.value("area"), net.value("h"), a, c) {
        (None, Some(h), Some(a), Some(c)) => vec![("area", 0.5 * (a + c) * h)],
        (Some(area), None, Some(a), Some(c)) if (a + c).abs() > DIV_GUARD => {
            vec![("h", 2.0 * area / (a + c))]
        }
        _ => Vec::new(),
    }
}

fn equal_group(net: &Network, names: &'static [&'static str]) -> Updates {
    let Some(v) = names.iter().find_map(|n| net.value(n)) else {
        return Vec::new();
    };
    names
        .iter()
        .filter(|n| !net.is_known(n))
        .map(|n| (*n, v))
        .collect()
}

fn equal_pairs(net: &Network, pairs: &'static [(&'static str, &'static str)]) -> Updates {
    let mut out = Vec::new();
    for (x, y) in pairs {
        match (net.value(x), net.value(y)) {
            (Some(v), None) => out.push((*y, v)),
            (None, Some(v)) => out.push((*x, v)),
            _ => {}
        }
    }
    out
}

fn supplementary_pairs(
    net: &Network,
    pairs: &'static [(&'static str, &'static str)],
) -> Updates {
    let mut out = Vec::new();
    for (x, y) in pairs {
        match (net.value(x), net.value(y)) {
            (Some(v), None) if v < 180.0 => out.push((*y, 180.0 - v)),
            (None, Some(v)) if v < 180.0 => out.push((*x, 180.0 - v)),
            _ => {}
        }
    }
    out
}

fn slant_height(net: &Network, pairs: &'static [(&'static str, &'static str)]) -> Updates {
    let mut out = Vec::new();
    for (side, angle) in pairs {
        match (net.value("h"), net.value(side), net.value(angle)) {
            (None, Some(s), Some(ang)) => {
                let h = s * sin_deg(ang);
                if h > 0.0 {
                    out.push(("h", h));
                    break; // one derivation of h is enough
                }
            }
            (Some(h), None, Some(ang)) => {
                let sin = sin_deg(ang);
                if sin > DIV_GUARD {
                    out.push((*side, h / sin));
                }
            }
            _ => {}
        }
    }
    out
}

fn trapezoid_height_from_sides(net: &Network) -> Updates {
    if net.is_known("h") {
        return Vec::new();
    }
    let (Some(a), Some(b), Some(c), Some(d)) =
        (net.value("a"), net.value("b"), net.value("c"), net.value("d"))
    else {
        return Vec::new();
    };
    let m = a - c;
    if m.abs() <= DIV_GUARD {
        // degenerates to the parallelogram case; no closed form here
        return Vec::new();
    }
    let k = (m * m + b * b - d * d) / (2.0 * m);
    match safe_sqrt(b * b - k * k) {
        Some(h) if h > 0.0 => vec![("h", h)],
        _ => Vec::new(),
    }
}

fn product_all(
    net: &Network,
    product: &'static str,
    x: &'static str,
    y: &'static str,
    factor: f64,
) -> Updates {
    match (net.value(product), net.value(x), net.value(y)) {
        (None, Some(xv), Some(yv)) => vec![(product, factor * xv * yv)],
        (Some(p), Some(xv), None) if (factor * xv).abs() > DIV_GUARD => {
            vec![(y, p / (factor * xv))]
        }
        (Some(p), None, Some(yv)) if (factor * yv).abs() > DIV_GUARD => {
            vec![(x, p / (factor * yv))]
        }
        _ => Vec::new(),
    }
}

fn sas_area(net: &Network, s1: &'static str, s2: &'static str, vertex: &'static str) -> Updates {
    if net.is_known("area") {
        return Vec::new();
    }
    match (net.value(s1), net.value(s2), net.value(vertex)) {
        (Some(x), Some(y), Some(v)) => vec![("area", x * y * sin_deg(v))],
        _ => Vec::new(),
    }
}

fn diagonal_identity(net: &Network) -> Updates {
    let vals = [net.value("d1"), net.value("d2"), net.value("a"), net.value("b")];
    let unknowns = vals.iter().filter(|v| v.is_none()).count();
    if unknowns != 1 {
        return Vec::new();
    }
    let sq = |v: Option<f64>| v.map(|x| x * x);
    let result = if vals[0].is_none() {
        ("d1", 2.0 * (sq(vals[2]).unwrap_or(0.0) + sq(vals[3]).unwrap_or(0.0))
            - sq(vals[1]).unwrap_or(0.0))
    } else if vals[1].is_none() {
        ("d2", 2.0 * (sq(vals[2]).unwrap_or(0.0) + sq(vals[3]).unwrap_or(0.0))
            - sq(vals[0]).unwrap_or(0.0))
    } else if vals[2].is_none() {
        ("a", (sq(vals[0]).unwrap_or(0.0) + sq(vals[1]).unwrap_or(0.0)) / 2.0
            - sq(vals[3]).unwrap_or(0.0))
    } else {
        ("b", (sq(vals[0]).unwrap_or(0.0) + sq(vals[1]).unwrap_or(0.0)) / 2.0
            - sq(vals[2]).unwrap_or(0.0))
    };
    match safe_sqrt(result.1) {
        Some(v) => vec![(result.0, v)],
        None => Vec::new(),
    }
}

fn sides_from_half_perimeter(net: &Network, x: &'static str, y: &'static str) -> Updates {
    let Some(p) = net.value("perimeter") else {
        return Vec::new();
    };
    let half = p / 2.0;
    match (net.value(x), net.value(y)) {
        (Some(v), None) if half - v > 0.0 => vec![(y, half - v)],
        (None, Some(v)) if half - v > 0.0 => vec![(x, half - v)],
        _ => Vec::new(),
    }
}

fn quadratic_sides(net: &Network, x: &'static str, y: &'static str, use_angle: bool) -> Updates {
    if net.is_known(x) || net.is_known(y) {
        return Vec::new();
    }
    let (Some(p), Some(area)) = (net.value("perimeter"), net.value("area")) else {
        return Vec::new();
    };
    let q = if use_angle {
        let Some(ang) = net.value("A") else {
            return Vec::new();
        };
        let sin = sin_deg(ang);
        if sin.abs() <= DIV_GUARD {
            return Vec::new();
        }
        area / sin
    } else {
        area
    };
    let half = p / 2.0;
    let disc = half * half - 4.0 * q;
    let Some(root) = safe_sqrt(disc) else {
        tracing::trace!(perimeter = p, area, "perimeter/area system has no real roots");
        return Vec::new();
    };
    let hi = (half + root) / 2.0;
    let lo = (half - root) / 2.0;
    if lo <= 0.0 {
        return Vec::new();
    }
    vec![(x, hi), (y, lo)]
}

fn leg_from_hypot(
    net: &Network,
    hyp: &'static str,
    (x, y): (&'static str, &'static str),
) -> Updates {
    let Some(h) = net.value(hyp) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    match (net.value(x), net.value(y)) {
        (Some(v), None) => {
            if let Some(leg) = safe_sqrt(h * h - v * v) {
                out.push((y, leg));
            }
        }
        (None, Some(v)) => {
            if let Some(leg) = safe_sqrt(h * h - v * v) {
                out.push((x, leg));
            }
        }
        _ => {}
    }
    out
}

fn default_angles(net: &Network, angles: &'static [&'static str], value: f64) -> Updates {
    angles
        .iter()
        .filter(|a| !net.is_known(a))
        .map(|a| (*a, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::variable::Provenance;

    fn net_with(pairs: &[(&str, f64)]) -> Network {
        let mut net = Network::new();
        for name in ["a", "b", "c", "d", "A", "B", "C", "D", "perimeter", "area", "s", "h",
            "d1", "d2", "h_a", "h_b", "h_c"]
        {
            net.add_variable(name, "");
        }
        for (n, v) in pairs {
            net.write_unchecked(n, *v, Provenance::User);
        }
        net
    }

    #[test]
    fn forward_short_circuits() {
        let net = net_with(&[("a", 3.0), ("b", 4.0), ("c", 5.0), ("perimeter", 12.0)]);
        let cons = Constraint::forward(
            "perimeter",
            &["a", "b", "c", "perimeter"],
            "perimeter",
            ForwardRule::Sum { terms: &["a", "b", "c"], factor: 1.0 },
        );
        // target already known
        assert!(cons.try_apply(&net).is_empty());

        let net = net_with(&[("a", 3.0), ("b", 4.0)]);
        // dependency missing
        assert!(cons.try_apply(&net).is_empty());
    }

    #[test]
    fn law_of_cosines_angle_clamped() {
        let net = net_with(&[("a", 5.0), ("b", 3.0), ("c", 4.0)]);
        let cons = Constraint::forward(
            "angle_A_from_cos",
            &["a", "b", "c", "A"],
            "A",
            ForwardRule::LawOfCosinesAngle { opposite: "a", s1: "b", s2: "c" },
        );
        let ups = cons.try_apply(&net);
        assert_eq!(ups.len(), 1);
        assert!((ups[0].1 - 90.0).abs() < 1e-9);
    }

    #[test]
    fn complement_rejects_out_of_range() {
        let net = net_with(&[("A", 100.0), ("B", 120.0)]);
        let cons = Constraint::forward(
            "sum_C",
            &["A", "B", "C"],
            "C",
            ForwardRule::Complement { total: 180.0, terms: &["A", "B"] },
        );
        assert!(cons.try_apply(&net).is_empty());
    }

    #[test]
    fn law_of_sines_fills_both_directions() {
        let net = net_with(&[("a", 1.0), ("A", 30.0), ("B", 90.0)]);
        let cons = Constraint::flex(
            "law_sines",
            &["a", "b", "c", "A", "B", "C"],
            FlexRule::LawOfSines,
        );
        let ups = cons.try_apply(&net);
        // b from B, and nothing for the fully unknown (c, C) pair
        assert!(ups.iter().any(|(n, v)| *n == "b" && (v - 2.0).abs() < 1e-9));
        assert!(!ups.iter().any(|(n, _)| *n == "c" || *n == "C"));
    }

    #[test]
    fn perimeter_reverse_guards_inequality() {
        let net = net_with(&[("a", 1.0), ("b", 1.0), ("perimeter", 10.0)]);
        let cons = Constraint::flex(
            "perimeter_reverse",
            &["a", "b", "c", "perimeter"],
            FlexRule::PerimeterReverse { sides: &["a", "b", "c"], triangle_check: true },
        );
        // c = 8 violates a + b > c
        assert!(cons.try_apply(&net).is_empty());

        let net = net_with(&[("a", 3.0), ("b", 4.0), ("perimeter", 12.0)]);
        let ups = cons.try_apply(&net);
        assert_eq!(ups, vec![("c", 5.0)]);
    }

    #[test]
    fn heron_rejects_impossible_sides() {
        let net = net_with(&[("a", 1.0), ("b", 1.0), ("c", 5.0)]);
        let cons = Constraint::flex(
            "area_flex",
            &["a", "b", "c", "A", "B", "C", "area"],
            FlexRule::TriangleArea,
        );
        assert!(cons.try_apply(&net).is_empty());
    }

    #[test]
    fn quadratic_sides_positive_roots_only() {
        let net = net_with(&[("perimeter", 14.0), ("area", 12.0)]);
        let cons = Constraint::flex(
            "rect_sides_from_p_area",
            &["a", "b", "perimeter", "area"],
            FlexRule::QuadraticSides { x: "a", y: "b", use_angle: false },
        );
        let ups = cons.try_apply(&net);
        assert_eq!(ups, vec![("a", 4.0), ("b", 3.0)]);

        // no real roots: perimeter too small for the area
        let net = net_with(&[("perimeter", 4.0), ("area", 12.0)]);
        assert!(cons.try_apply(&net).is_empty());
    }

    #[test]
    fn diagonal_identity_solves_single_unknown() {
        let net = net_with(&[("a", 3.0), ("b", 4.0), ("d1", 5.0)]);
        let cons = Constraint::flex(
            "diagonal_identity",
            &["d1", "d2", "a", "b"],
            FlexRule::DiagonalIdentity,
        );
        let ups = cons.try_apply(&net);
        assert_eq!(ups.len(), 1);
        assert_eq!(ups[0].0, "d2");
        assert!((ups[0].1 - 5.0).abs() < 1e-9);
    }
}
