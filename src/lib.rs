//! Crate root: public surface and engine-wide invariants
//!
//! `geosolve` is a geometric constraint propagation engine: given a
//! partial set of attributes of a planar shape (sides, interior angles,
//! perimeter, area, heights, diagonals, medians, bisectors, radii), it
//! derives every attribute it can, enforces consistency, and classifies
//! the result within the triangle/quadrilateral taxonomy.
//!
//! The engine is a library with no I/O: callers build a network through
//! one of the shape factories, feed inputs one at a time (each input is
//! transactional and triggers incremental propagation), run the bounded
//! fixed-point [`Network::solve`], then read back results, provenance,
//! and the [`classify`] verdict.
//!
//! ## Invariants
//!
//! - **Units.** Angles are degrees at every API boundary; lengths are
//!   dimensionless (same unit in, same unit out). All values are IEEE-754
//!   doubles with the tolerances documented per module.
//! - **Monotonic knowledge.** Propagation never unsets a variable; only
//!   [`Network::reset`] clears values.
//! - **Determinism.** The same `set_input` sequence on a fresh network
//!   produces bit-identical values and provenance tags: incremental
//!   propagation walks back-lists in insertion order and the batch
//!   solver re-runs candidates in sorted-by-name order.
//! - **Transactionality.** A rejected or domain-erroring input leaves the
//!   network exactly as it was, with an explanation.
//! - **Error discipline.** Domain violations (an angle outside its range,
//!   a non-positive user side) surface as [`DomainError`] and are never
//!   swallowed; numeric degeneracies inside constraint bodies silently
//!   yield no update and are visible only in `tracing` output.
//!
//! A network is a plain single-threaded data structure: no background
//! activity, no suspension points, safe for any number of readers once
//! mutation stops.

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Shape classification over solved value snapshots.
pub mod classify;
/// Constraint bodies: the closed forward/flexible relation vocabulary.
pub mod constraint;
/// Network ownership, transactional input, propagation, batch solve.
pub mod network;
/// Shared numeric helpers (degree trig, guarded sqrt/clamp).
pub mod numeric;
/// The side–side–angle ambiguity detector.
pub mod ssa;
/// Triangle knowledge base factories.
pub mod triangle;
/// Variables, provenance, and the fallible write protocol.
pub mod variable;
/// Quadrilateral knowledge base factories.
pub mod quadrilateral;

pub use classify::{classify, Classification, ShapeClass};
pub use constraint::{Body, Constraint, FlexRule, ForwardRule};
pub use network::{
    score, Acceptance, Conflict, Network, SolveReport, DEFAULT_TOLERANCE, MAX_ROUNDS,
    PERIMETER_TOLERANCE,
};
pub use numeric::{clamp, safe_sqrt, triangle_inequality_ok};
pub use ssa::detect as detect_ssa;
pub use triangle::{equilateral_triangle, triangle};
pub use variable::{DomainError, Provenance, Variable, EPSILON};
pub use quadrilateral::{parallelogram, quadrilateral, rectangle, rhombus, square, trapezoid};
