//! End-to-end scenarios: factory → inputs → solve → readout → classify.

use std::collections::HashMap;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use geosolve::{
    classify, detect_ssa, equilateral_triangle, rectangle, square, triangle, Acceptance,
    Conflict, ShapeClass,
};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn assert_close(actual: Option<f64>, expected: f64, tol: f64, what: &str) {
    let actual = actual.unwrap_or_else(|| panic!("{what} was not derived"));
    assert!(
        (actual - expected).abs() <= tol,
        "{what}: expected {expected}, got {actual}"
    );
}

#[test]
fn right_triangle_3_4_5() -> Result<()> {
    init_tracing();
    let mut net = triangle();
    for (name, value) in [("a", 3.0), ("b", 4.0), ("c", 5.0)] {
        assert!(net.set_input(name, value)?.is_accepted());
    }
    let report = net.solve()?;
    assert!(report.converged, "blocked: {:?}", report.blocked);

    assert_close(net.value("A"), 36.8699, 1e-3, "A");
    assert_close(net.value("B"), 53.1301, 1e-3, "B");
    assert_close(net.value("C"), 90.0, 1e-3, "C");
    assert_close(net.value("area"), 6.0, 1e-3, "area");
    assert_close(net.value("perimeter"), 12.0, 1e-3, "perimeter");
    assert_close(net.value("s"), 6.0, 1e-3, "s");
    assert_close(net.value("R"), 2.5, 1e-3, "R");
    assert_close(net.value("r"), 1.0, 1e-3, "r");
    assert_close(net.value("h_a"), 4.0, 1e-3, "h_a");
    assert_close(net.value("h_b"), 3.0, 1e-3, "h_b");
    assert_close(net.value("h_c"), 2.4, 1e-3, "h_c");

    let verdict = classify(&net.known_values(), true);
    assert_eq!(verdict.shape, ShapeClass::Right);
    assert_eq!(verdict.chain, vec![ShapeClass::Right, ShapeClass::Triangle]);
    Ok(())
}

#[test]
fn equilateral_from_angles_and_perimeter() -> Result<()> {
    init_tracing();
    let mut net = equilateral_triangle();
    for angle in ["A", "B", "C"] {
        assert!(net.set_input(angle, 60.0)?.is_accepted());
    }
    assert!(net.set_input("perimeter", 9.0)?.is_accepted());
    assert!(net.solve()?.converged);

    for side in ["a", "b", "c"] {
        assert_close(net.value(side), 3.0, 1e-3, side);
    }
    assert_close(net.value("area"), 9.0 * 3.0_f64.sqrt() / 4.0, 1e-3, "area");

    let verdict = classify(&net.known_values(), true);
    assert_eq!(verdict.shape, ShapeClass::Equilateral);
    assert_eq!(
        verdict.chain,
        vec![ShapeClass::Equilateral, ShapeClass::Isosceles, ShapeClass::Triangle]
    );
    Ok(())
}

#[test]
fn ssa_two_solutions_each_consistent() -> Result<()> {
    init_tracing();
    let inputs: HashMap<String, f64> =
        [("a", 7.0), ("b", 10.0), ("A", 30.0)].map(|(n, v)| (n.to_string(), v)).into();
    let solutions = detect_ssa(&inputs);
    assert_eq!(solutions.len(), 2);
    assert!((solutions[0]["B"] - 45.585).abs() < 1e-3);
    assert!((solutions[1]["B"] - 134.415).abs() < 1e-3);

    // each completion survives a full solve on a fresh network; sides go
    // in first so the derived angles already match the chosen branch
    for solution in &solutions {
        let mut net = triangle();
        for name in ["a", "b", "c", "A", "B", "C"] {
            if let Some(value) = solution.get(name) {
                assert!(net.set_input(name, *value)?.is_accepted(), "rejected {name}");
            }
        }
        assert!(net.solve()?.converged);
        let total = net.value("A").unwrap() + net.value("B").unwrap() + net.value("C").unwrap();
        assert!((total - 180.0).abs() <= 1e-3);
    }
    Ok(())
}

#[test]
fn rectangle_from_perimeter_and_area() -> Result<()> {
    init_tracing();
    let mut net = rectangle();
    assert!(net.set_input("perimeter", 14.0)?.is_accepted());
    assert!(net.set_input("area", 12.0)?.is_accepted());
    assert!(net.solve()?.converged);

    let mut sides = [net.value("a").unwrap(), net.value("b").unwrap()];
    sides.sort_by(f64::total_cmp);
    assert!((sides[0] - 3.0).abs() <= 1e-3 && (sides[1] - 4.0).abs() <= 1e-3);
    assert_close(net.value("d1"), 5.0, 1e-3, "d1");
    assert_close(net.value("d2"), 5.0, 1e-3, "d2");
    for angle in ["A", "B", "C", "D"] {
        assert_close(net.value(angle), 90.0, 1e-3, angle);
    }

    let verdict = classify(&net.known_values(), false);
    assert_eq!(verdict.shape, ShapeClass::Rectangle);
    assert_eq!(
        verdict.chain,
        vec![ShapeClass::Rectangle, ShapeClass::Parallelogram, ShapeClass::Quadrilateral]
    );
    Ok(())
}

#[test]
fn square_from_area_alone() -> Result<()> {
    init_tracing();
    let mut net = square();
    assert!(net.set_input("area", 25.0)?.is_accepted());
    assert!(net.solve()?.converged);

    for side in ["a", "b", "c", "d"] {
        assert_close(net.value(side), 5.0, 1e-3, side);
    }
    assert_close(net.value("perimeter"), 20.0, 1e-3, "perimeter");
    assert_close(net.value("d1"), 5.0 * 2.0_f64.sqrt(), 1e-3, "d1");

    let verdict = classify(&net.known_values(), false);
    assert_eq!(verdict.shape, ShapeClass::Square);
    assert_eq!(
        verdict.chain,
        vec![
            ShapeClass::Square,
            ShapeClass::Rectangle,
            ShapeClass::Parallelogram,
            ShapeClass::Quadrilateral
        ]
    );
    Ok(())
}

#[test]
fn perimeter_conflict_rolls_the_network_back() -> Result<()> {
    init_tracing();
    let mut net = triangle();
    for (name, value) in [("a", 3.0), ("b", 4.0), ("c", 5.0)] {
        net.set_input(name, value)?;
    }
    assert_close(net.value("perimeter"), 12.0, 1e-9, "perimeter");

    let before_values = net.results();
    let before_sources = net.provenance();
    let outcome = net.set_input("perimeter", 13.0)?;
    assert!(matches!(
        outcome,
        Acceptance::Rejected(Conflict::ValueMismatch { .. })
    ));
    // pre-state fully restored, variable by variable
    assert_eq!(net.results(), before_values);
    assert_eq!(net.provenance(), before_sources);
    Ok(())
}

#[test]
fn identical_input_sequences_are_bit_identical() -> Result<()> {
    init_tracing();
    type Run = (
        std::collections::BTreeMap<String, Option<f64>>,
        std::collections::BTreeMap<String, Option<&'static str>>,
    );
    fn run() -> Result<Run> {
        let mut net = triangle();
        net.set_input("a", 8.0)?;
        net.set_input("B", 41.0)?;
        net.set_input("c", 6.5)?;
        net.solve()?;
        Ok((net.results(), net.provenance()))
    }
    let (res1, src1) = run()?;
    let (res2, src2) = run()?;
    assert_eq!(res1, res2);
    assert_eq!(src1, src2);
    Ok(())
}

#[test]
fn law_of_sines_self_consistency_on_random_triangles() -> Result<()> {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let ang_a: f64 = rng.gen_range(20.0..100.0);
        let ang_b: f64 = rng.gen_range(20.0..(170.0 - ang_a));
        let side_a: f64 = rng.gen_range(0.5..50.0);

        let mut net = triangle();
        net.set_input("A", ang_a)?;
        net.set_input("B", ang_b)?;
        net.set_input("a", side_a)?;
        assert!(net.solve()?.converged);

        let ratio_a = net.value("a").unwrap() / net.value("A").unwrap().to_radians().sin();
        let ratio_b = net.value("b").unwrap() / net.value("B").unwrap().to_radians().sin();
        let ratio_c = net.value("c").unwrap() / net.value("C").unwrap().to_radians().sin();
        assert!((ratio_a - ratio_b).abs() / ratio_a < 1e-6);
        assert!((ratio_a - ratio_c).abs() / ratio_a < 1e-6);

        // Heron's area against the altitude form
        let area = net.value("area").unwrap();
        let h_a = net.value("h_a").unwrap();
        let alt_area = 0.5 * net.value("a").unwrap() * h_a;
        assert!((area - alt_area).abs() / area < 1e-6);
    }
    Ok(())
}

#[test]
fn solve_report_serializes_for_diagnostics() -> Result<()> {
    init_tracing();
    let mut net = triangle();
    net.set_input("a", 3.0)?;
    let report = net.solve()?;
    let json = serde_json::to_value(&report)?;
    assert_eq!(json["converged"], serde_json::json!(true));
    assert!(json["rounds"].is_u64());
    assert!(json["blocked"].as_array().unwrap().is_empty());
    Ok(())
}
