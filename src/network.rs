//! Constraint network: ownership, transactional input, propagation, solve
//!
//! The [`Network`] owns its variables (creation-ordered) and its
//! constraints (an ordered table). Variables hold back-lists of
//! constraint *indices*, never owning references, so reverse lookup is
//! O(1) without reference cycles.
//!
//! ## Transactional input
//!
//! [`Network::set_input`] is all-or-nothing: the caller sees either a
//! fully consistent post-state or the untouched pre-state plus an
//! explanation. Three things can interrupt an input:
//!
//! - a **direct conflict** with an already-known value beyond the given
//!   tolerance (state untouched, nothing was written);
//! - a **perimeter postcheck failure** after propagation (state restored
//!   from the snapshot taken before the write);
//! - a **domain error** raised by a derived write mid-propagation (state
//!   restored, then the error propagates; it is never swallowed).
//!
//! ## Determinism
//!
//! Incremental propagation visits a variable's constraints in insertion
//! order; the batch solver re-runs candidate constraints in
//! sorted-by-name order. Given the same inputs on a fresh network, the
//! final values and provenance tags are bit-identical across runs.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::constraint::{Body, Constraint};
use crate::variable::{ConstraintId, DomainError, Provenance, VarId, Variable};

/// Default tolerance for the direct-conflict check in [`Network::set_input`].
pub const DEFAULT_TOLERANCE: f64 = 1e-2;

/// Tolerance of the perimeter-consistency postcheck. Tighter than the
/// direct-conflict default: sums of sides amplify round-off less than
/// general propagation.
pub const PERIMETER_TOLERANCE: f64 = 1e-4;

/// Round cap for the batch solver.
pub const MAX_ROUNDS: usize = 100;

/// Why an input was rejected (the network has been rolled back).
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum Conflict {
    #[error(
        "input {name}={proposed} disagrees with the previously established value \
         {existing:.4} (difference {delta:.4})"
    )]
    ValueMismatch { name: String, existing: f64, proposed: f64, delta: f64 },
    #[error(
        "sum of the sides ({sum_sides:.4}) does not match the supplied perimeter ({perimeter})"
    )]
    PerimeterMismatch { perimeter: f64, sum_sides: f64 },
    #[error(
        "perimeter {perimeter} is not greater than the known sides' sum ({sum_known:.4}); \
         no room left for the unknown side"
    )]
    PerimeterExhausted { perimeter: f64, sum_known: f64 },
}

/// Outcome of a transactional input.
#[derive(Debug, Clone, PartialEq)]
pub enum Acceptance {
    /// The value was written and propagated.
    Accepted,
    /// The variable was already known within tolerance; the stored value
    /// was refreshed to the user-supplied one without re-propagation.
    Refined,
    /// The input contradicted the current state; the network is unchanged.
    Rejected(Conflict),
}

impl Acceptance {
    /// `true` unless the input was rejected.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Acceptance::Rejected(_))
    }
}

/// Outcome of a batch solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    /// Whether a full round completed without any write.
    pub converged: bool,
    /// Rounds executed (including the quiescent one).
    pub rounds: usize,
    /// Forward constraints whose target is still unknown although every
    /// dependency is known: numeric-degeneracy suspects. Populated only
    /// when the round cap was hit.
    pub blocked: Vec<&'static str>,
}

type StateSnapshot = Vec<(Option<f64>, Option<Provenance>)>;

/// A variable/constraint graph with queue-based propagation.
#[derive(Debug, Default)]
pub struct Network {
    vars: Vec<Variable>,
    index: HashMap<String, VarId>,
    constraints: Vec<Constraint>,
}

impl Network {
    /// An empty network; factories populate it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable with a description. Adding an existing name is a
    /// no-op (the first description wins).
    pub fn add_variable(&mut self, name: &str, description: &'static str) -> VarId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = VarId(self.vars.len());
        self.vars.push(Variable::new(name, description));
        self.index.insert(name.to_owned(), id);
        id
    }

    /// Register a constraint: auto-creates any scope variable that does
    /// not exist yet and back-links the constraint into every scope
    /// variable.
    ///
    /// Constraint names are unique per network; a duplicate is a factory
    /// bug and panics.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        assert!(
            self.constraints.iter().all(|c| c.name != constraint.name),
            "duplicate constraint name '{}'",
            constraint.name
        );
        let cid = ConstraintId(self.constraints.len());
        for name in constraint.scope {
            let vid = self.add_variable(name, "");
            self.vars[vid.0].constraints.push(cid);
        }
        self.constraints.push(constraint);
    }

    // ------------------------------------------------------------------
    // Readout
    // ------------------------------------------------------------------

    /// Value of a variable, if the variable exists and is known.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.index.get(name).and_then(|id| self.vars[id.0].value())
    }

    /// Whether the named variable exists and is known.
    pub fn is_known(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    /// Whether the network defines the named variable at all.
    pub fn has_variable(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All variables in creation order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    /// `name → optional value` for every variable.
    pub fn results(&self) -> std::collections::BTreeMap<String, Option<f64>> {
        self.vars
            .iter()
            .map(|v| (v.name().to_owned(), v.value()))
            .collect()
    }

    /// `name → optional provenance` for every variable (`"user"` or the
    /// deriving constraint's name).
    pub fn provenance(&self) -> std::collections::BTreeMap<String, Option<&'static str>> {
        self.vars
            .iter()
            .map(|v| (v.name().to_owned(), v.source().map(|s| s.as_str())))
            .collect()
    }

    /// Only the known values, in the snapshot shape the classifier and the
    /// SSA detector consume.
    pub fn known_values(&self) -> HashMap<String, f64> {
        self.vars
            .iter()
            .filter_map(|v| v.value().map(|x| (v.name().to_owned(), x)))
            .collect()
    }

    /// Clear every value and provenance tag, keeping the graph intact.
    pub fn reset(&mut self) {
        for v in &mut self.vars {
            v.clear();
        }
    }

    // ------------------------------------------------------------------
    // Transactional input
    // ------------------------------------------------------------------

    /// [`Network::set_input_opts`] with `user` provenance and the default
    /// tolerance.
    pub fn set_input(&mut self, name: &str, value: f64) -> Result<Acceptance, DomainError> {
        self.set_input_opts(name, value, Provenance::User, DEFAULT_TOLERANCE)
    }

    /// The transactional write. Auto-creates the variable, checks for a
    /// direct conflict, writes, propagates incrementally, and runs the
    /// perimeter postcheck. On any rejection the pre-state is restored.
    pub fn set_input_opts(
        &mut self,
        name: &str,
        value: f64,
        source: Provenance,
        tolerance: f64,
    ) -> Result<Acceptance, DomainError> {
        let id = self.add_variable(name, "");

        // Direct conflict check against an already-known value.
        if let Some(existing) = self.vars[id.0].value() {
            let delta = (existing - value).abs();
            if delta > tolerance {
                let conflict = Conflict::ValueMismatch {
                    name: name.to_owned(),
                    existing,
                    proposed: value,
                    delta,
                };
                tracing::debug!(%conflict, "input rejected");
                return Ok(Acceptance::Rejected(conflict));
            }
            // Refresh to the user-supplied value so readouts echo the
            // exact input; the delta is within tolerance, so no
            // re-propagation is warranted.
            self.vars[id.0].set(value, source)?;
            return Ok(Acceptance::Refined);
        }

        let snapshot = self.snapshot();
        let changed = self.vars[id.0].set(value, source)?;
        if changed {
            tracing::debug!(name, value, source = source.as_str(), "input set");
            if let Err(err) = self.propagate_from(id) {
                self.restore(&snapshot);
                tracing::debug!(%err, "domain error during propagation; rolled back");
                return Err(err);
            }
            if let Some(conflict) = self.perimeter_postcheck() {
                self.restore(&snapshot);
                tracing::debug!(%conflict, "perimeter postcheck failed; rolled back");
                return Ok(Acceptance::Rejected(conflict));
            }
        }
        Ok(Acceptance::Accepted)
    }

    fn snapshot(&self) -> StateSnapshot {
        self.vars.iter().map(|v| (v.value(), v.source())).collect()
    }

    fn restore(&mut self, snapshot: &StateSnapshot) {
        for (var, (value, source)) in self.vars.iter_mut().zip(snapshot) {
            var.restore(*value, *source);
        }
    }

    /// The perimeter-consistency postcheck. Applies only when the
    /// perimeter is known with `user` provenance. The *relevant sides*
    /// are the subset of `a`–`d` that share a constraint scope with the
    /// perimeter. A triangle network defines `d`, but no perimeter
    /// constraint mentions it, so it is excluded here.
    fn perimeter_postcheck(&self) -> Option<Conflict> {
        let pid = *self.index.get("perimeter")?;
        let pvar = &self.vars[pid.0];
        let p = pvar.value()?;
        if pvar.source() != Some(Provenance::User) {
            return None;
        }
        let mut relevant: Vec<&'static str> = Vec::new();
        for cid in &pvar.constraints {
            for n in self.constraints[cid.0].scope {
                if matches!(*n, "a" | "b" | "c" | "d") && !relevant.contains(n) {
                    relevant.push(n);
                }
            }
        }
        let mut sum = 0.0;
        let mut known = 0usize;
        for side in &relevant {
            if let Some(v) = self.value(side) {
                sum += v;
                known += 1;
            }
        }
        if known == relevant.len() {
            if (sum - p).abs() > PERIMETER_TOLERANCE {
                return Some(Conflict::PerimeterMismatch { perimeter: p, sum_sides: sum });
            }
        } else if sum >= p - PERIMETER_TOLERANCE {
            return Some(Conflict::PerimeterExhausted { perimeter: p, sum_known: sum });
        }
        None
    }

    // ------------------------------------------------------------------
    // Propagation
    // ------------------------------------------------------------------

    /// Queue-based incremental propagation seeded at one variable.
    ///
    /// Each popped variable's constraints run in insertion order; every
    /// update is merged through the write protocol and, when it reports a
    /// change, the written variable is enqueued in turn. The `EPSILON`
    /// change-guard in the protocol bounds the loop.
    fn propagate_from(&mut self, start: VarId) -> Result<(), DomainError> {
        let mut queue = VecDeque::from([start]);
        while let Some(vid) = queue.pop_front() {
            let cons_ids = self.vars[vid.0].constraints.clone();
            for cid in cons_ids {
                let updates = self.constraints[cid.0].try_apply(self);
                let rule = self.constraints[cid.0].name;
                for (name, val) in updates {
                    if let Some(written) = self.merge_update(name, val, rule)? {
                        queue.push_back(written);
                    }
                }
            }
        }
        Ok(())
    }

    fn merge_update(
        &mut self,
        name: &'static str,
        value: f64,
        rule: &'static str,
    ) -> Result<Option<VarId>, DomainError> {
        let Some(&id) = self.index.get(name) else {
            return Ok(None);
        };
        let changed = self.vars[id.0].set(value, Provenance::Rule(rule))?;
        if changed {
            tracing::trace!(name, value, rule, "derived");
            Ok(Some(id))
        } else {
            Ok(None)
        }
    }

    // ------------------------------------------------------------------
    // Batch solve
    // ------------------------------------------------------------------

    /// [`Network::solve_rounds`] with the default round cap.
    pub fn solve(&mut self) -> Result<SolveReport, DomainError> {
        self.solve_rounds(MAX_ROUNDS)
    }

    /// Bounded fixed-point solve.
    ///
    /// Seeds a queue with every known variable, then repeats rounds:
    /// collect the constraints touching any queued variable, run them in
    /// sorted-by-name order (stable provenance across runs), and enqueue
    /// every changed target. Stops on a quiescent round (*converged*) or
    /// at the round cap (*capped*, with blocked-constraint diagnostics).
    pub fn solve_rounds(&mut self, max_rounds: usize) -> Result<SolveReport, DomainError> {
        let mut queue: VecDeque<VarId> = self
            .vars
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_known())
            .map(|(i, _)| VarId(i))
            .collect();
        let mut rounds = 0usize;
        let mut changed = true;
        while rounds < max_rounds && changed {
            changed = false;
            rounds += 1;
            let mut pending: Vec<ConstraintId> = Vec::new();
            while let Some(vid) = queue.pop_front() {
                pending.extend(self.vars[vid.0].constraints.iter().copied());
            }
            if pending.is_empty() {
                break;
            }
            pending.sort_unstable();
            pending.dedup();
            pending.sort_by_key(|cid| self.constraints[cid.0].name);
            for cid in pending {
                let updates = self.constraints[cid.0].try_apply(self);
                let rule = self.constraints[cid.0].name;
                for (name, val) in updates {
                    if let Some(written) = self.merge_update(name, val, rule)? {
                        changed = true;
                        queue.push_back(written);
                    }
                }
            }
        }
        let converged = !changed;
        let blocked = if converged { Vec::new() } else { self.blocked_constraints() };
        if !converged {
            tracing::debug!(rounds, ?blocked, "solve capped before quiescence");
        }
        Ok(SolveReport { converged, rounds, blocked })
    }

    /// Forward constraints whose target is unknown while every dependency
    /// is known, in insertion order.
    fn blocked_constraints(&self) -> Vec<&'static str> {
        self.constraints
            .iter()
            .filter(|c| match &c.body {
                Body::Forward { target, .. } => {
                    !self.is_known(target)
                        && c.forward_deps().iter().all(|d| self.is_known(d))
                }
                Body::Flex(_) => false,
            })
            .map(|c| c.name)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn write_unchecked(&mut self, name: &str, value: f64, source: Provenance) {
        let id = self.add_variable(name, "");
        self.vars[id.0]
            .set(value, source)
            .expect("test value violates a write-protocol domain");
    }
}

/// Network-selection heuristic: how strongly the known values of `net`
/// argue for choosing it over `other`. Known variables count once, known
/// variables that `other` does not even define count twice more.
pub fn score(net: &Network, other: &Network) -> usize {
    let known = net.variables().filter(|v| v.is_known()).count();
    let unique_known = net
        .variables()
        .filter(|v| v.is_known() && !other.has_variable(v.name()))
        .count();
    known + unique_known * 2
}
