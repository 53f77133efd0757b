//! Side–side–angle ambiguity detection
//!
//! The law-of-sines constraint alone always picks the acute `asin`
//! branch, silently dropping the obtuse completion of an SSA
//! configuration. [`detect`] recognizes the pattern in a caller-supplied
//! input map *before* the inputs reach a network and enumerates every
//! valid completion: zero, one, or two fully populated assignments.
//! When two survive, the caller decides which one to submit (or presents
//! both); the engine itself never chooses.

#![forbid(unsafe_code)]

use std::collections::HashMap;

use crate::numeric::{asin_deg, clamp, sin_deg, DIV_GUARD};

const PAIRS: [(&str, &str); 3] = [("a", "A"), ("b", "B"), ("c", "C")];

/// Slack allowed on `|sin O|` before the configuration is declared
/// unsolvable.
const SIN_RANGE_SLACK: f64 = 1e-12;

/// Enumerate the completions of an SSA configuration.
///
/// Precondition (checked here; a non-matching map yields an empty list):
/// exactly one of `A`, `B`, `C` is provided, at least two of `a`, `b`,
/// `c` are provided, and the angle is opposite one of the provided
/// sides. Each returned assignment contains the caller's inputs plus the
/// two remaining angles and the third side.
pub fn detect(inputs: &HashMap<String, f64>) -> Vec<HashMap<String, f64>> {
    // Canonical iteration order keeps the result deterministic no matter
    // how the caller built the map.
    let angles: Vec<&str> = PAIRS
        .iter()
        .filter(|(_, ang)| inputs.contains_key(*ang))
        .map(|(_, ang)| *ang)
        .collect();
    let sides: Vec<&str> = PAIRS
        .iter()
        .filter(|(side, _)| inputs.contains_key(*side))
        .map(|(side, _)| *side)
        .collect();
    if angles.len() != 1 || sides.len() < 2 {
        return Vec::new();
    }

    let given_angle = angles[0];
    let opposite_side = PAIRS
        .iter()
        .find(|(_, ang)| *ang == given_angle)
        .map(|(side, _)| *side)
        .expect("closed pair table");
    if !sides.contains(&opposite_side) {
        return Vec::new();
    }
    let Some(&other_side) = sides.iter().find(|s| **s != opposite_side) else {
        return Vec::new();
    };

    let a_x = inputs[opposite_side];
    let a_o = inputs[other_side];
    let x_deg = inputs[given_angle];

    let sin_x = sin_deg(x_deg);
    if sin_x.abs() < DIV_GUARD || a_x.abs() < DIV_GUARD {
        return Vec::new();
    }
    let sin_o = (a_o * sin_x) / a_x;
    if sin_o.abs() > 1.0 + SIN_RANGE_SLACK {
        return Vec::new();
    }
    let sin_o = clamp(sin_o, -1.0, 1.0);

    let primary = asin_deg(sin_o);
    let mut candidates = vec![primary];
    if (sin_o.abs() - 1.0).abs() > SIN_RANGE_SLACK {
        let supplement = 180.0 - primary;
        if (supplement - primary).abs() > 1e-6 {
            candidates.push(supplement);
        }
    }

    let other_angle = PAIRS
        .iter()
        .find(|(side, _)| *side == other_side)
        .map(|(_, ang)| *ang)
        .expect("closed pair table");
    let (third_side, third_angle) = PAIRS
        .iter()
        .find(|(side, ang)| *side != opposite_side && *ang != other_angle && *side != other_side)
        .map(|(side, ang)| (*side, *ang))
        .expect("closed pair table");

    let mut solutions = Vec::new();
    for candidate in candidates {
        let third = 180.0 - x_deg - candidate;
        if third <= 0.0 {
            continue;
        }
        let mut solution = inputs.clone();
        solution.insert(other_angle.to_owned(), candidate);
        solution.insert(third_angle.to_owned(), third);
        solution.insert(third_side.to_owned(), a_x * sin_deg(third) / sin_x);
        solutions.push(solution);
    }
    solutions
}
