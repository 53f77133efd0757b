//! Variables: named numeric slots with provenance
//!
//! A [`Variable`] is a named slot that is either unknown (`None`) or holds
//! a finite `f64` together with a [`Provenance`] tag saying who wrote it:
//! the user, or the constraint that derived it. Slots also carry the
//! back-list of constraints that mention them, stored as indices into the
//! owning network's constraint table (reverse lookup only: no ownership,
//! no cycles).
//!
//! ## Write protocol
//!
//! All writes funnel through [`Variable::set`], which enforces the
//! per-name value domains:
//!
//! - `A`, `B`, `C` strictly inside `(0, 180)` degrees;
//! - `D` strictly inside `(0, 360)` degrees, reduced mod 360 on intake;
//! - sides `a`–`d` non-negative, and strictly positive when the write
//!   comes from the user;
//! - every other catalogued length/area/radius non-negative;
//! - anything else merely finite.
//!
//! A write that lands within [`EPSILON`] of the stored value is idempotent:
//! it may fill in an absent provenance but reports "unchanged", which is
//! what keeps propagation from oscillating under round-off.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use serde::Serialize;

/// Writes closer than this to the stored value do not count as changes.
pub const EPSILON: f64 = 1e-9;

/// Index of a constraint in the owning network's constraint table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(pub usize);

/// Index of a variable in the owning network's variable table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

/// Who wrote a variable's current value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Provenance {
    /// Supplied directly through `set_input`.
    User,
    /// Derived by the named constraint.
    Rule(&'static str),
}

impl Provenance {
    /// Canonical string form (`"user"` or the constraint name).
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::User => "user",
            Provenance::Rule(name) => name,
        }
    }
}

/// Domain-invariant violations raised by the write protocol.
///
/// These surface out of `set_input` and `solve` and are never swallowed;
/// numeric degeneracies inside constraint bodies are a different category
/// (those simply yield no update).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("value for '{name}' must be a finite number (got {value})")]
    NonFinite { name: String, value: f64 },
    #[error("angle '{name}' must lie strictly inside ({lo}, {hi}) degrees (got {value})")]
    AngleRange { name: String, value: f64, lo: f64, hi: f64 },
    #[error("side '{name}' must be strictly positive (got {value})")]
    NonPositiveSide { name: String, value: f64 },
    #[error("'{name}' must be non-negative (got {value})")]
    NegativeLength { name: String, value: f64 },
}

/// Value-domain class of a canonical variable name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ValueDomain {
    /// `A`, `B`, `C`: strict `(0, 180)`.
    TriangleAngle,
    /// `D`: strict `(0, 360)`, reduced mod 360.
    QuadAngle,
    /// `a`–`d`: non-negative, strictly positive from the user.
    Side,
    /// Perimeter, area, radii, medians, bisectors, altitudes, diagonals.
    Length,
    /// Names outside the catalogue: finite only.
    Free,
}

fn domain_of(name: &str) -> ValueDomain {
    match name {
        "A" | "B" | "C" => ValueDomain::TriangleAngle,
        "D" => ValueDomain::QuadAngle,
        "a" | "b" | "c" | "d" => ValueDomain::Side,
        "perimeter" | "area" | "s" | "R" | "r" | "r_a" | "r_b" | "r_c" | "m_a" | "m_b"
        | "m_c" | "l_a" | "l_b" | "l_c" | "h" | "h_a" | "h_b" | "h_c" | "h_d" | "d1" | "d2" => {
            ValueDomain::Length
        }
        _ => ValueDomain::Free,
    }
}

/// A named numeric slot with optional value and provenance.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    description: &'static str,
    value: Option<f64>,
    source: Option<Provenance>,
    /// Constraints whose scope mentions this variable, in insertion order.
    pub(crate) constraints: Vec<ConstraintId>,
}

impl Variable {
    pub(crate) fn new(name: &str, description: &'static str) -> Self {
        Self {
            name: name.to_owned(),
            description,
            value: None,
            source: None,
            constraints: Vec::new(),
        }
    }

    /// The canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description (may be empty for auto-created slots).
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Current value, if known.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Provenance of the current value, if known.
    pub fn source(&self) -> Option<Provenance> {
        self.source
    }

    /// Whether the slot holds a value.
    pub fn is_known(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn clear(&mut self) {
        self.value = None;
        self.source = None;
    }

    pub(crate) fn restore(&mut self, value: Option<f64>, source: Option<Provenance>) {
        self.value = value;
        self.source = source;
    }

    /// Fallible write. Returns whether the stored value changed by more
    /// than [`EPSILON`].
    ///
    /// An equal-within-`EPSILON` write fills in an absent provenance but
    /// reports no change, so it never re-triggers propagation.
    pub(crate) fn set(&mut self, v: f64, source: Provenance) -> Result<bool, DomainError> {
        if !v.is_finite() {
            return Err(DomainError::NonFinite { name: self.name.clone(), value: v });
        }
        let v = match domain_of(&self.name) {
            ValueDomain::TriangleAngle => {
                if v <= 0.0 || v >= 180.0 {
                    return Err(DomainError::AngleRange {
                        name: self.name.clone(),
                        value: v,
                        lo: 0.0,
                        hi: 180.0,
                    });
                }
                v
            }
            ValueDomain::QuadAngle => {
                if v <= 0.0 || v >= 360.0 {
                    return Err(DomainError::AngleRange {
                        name: self.name.clone(),
                        value: v,
                        lo: 0.0,
                        hi: 360.0,
                    });
                }
                v % 360.0
            }
            ValueDomain::Side => {
                if source == Provenance::User && v <= 0.0 {
                    return Err(DomainError::NonPositiveSide {
                        name: self.name.clone(),
                        value: v,
                    });
                }
                if v < 0.0 {
                    return Err(DomainError::NegativeLength {
                        name: self.name.clone(),
                        value: v,
                    });
                }
                v
            }
            ValueDomain::Length => {
                if v < 0.0 {
                    return Err(DomainError::NegativeLength {
                        name: self.name.clone(),
                        value: v,
                    });
                }
                v
            }
            ValueDomain::Free => v,
        };
        match self.value {
            Some(cur) if (cur - v).abs() <= EPSILON => {
                if self.source.is_none() {
                    self.source = Some(source);
                }
                Ok(false)
            }
            _ => {
                self.value = Some(v);
                self.source = Some(source);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_within_epsilon() {
        let mut v = Variable::new("a", "");
        assert!(v.set(3.0, Provenance::User).unwrap());
        assert!(!v.set(3.0 + 1e-10, Provenance::Rule("perimeter")).unwrap());
        // provenance untouched by the idempotent write
        assert_eq!(v.source(), Some(Provenance::User));
        // a genuine change replaces both
        assert!(v.set(4.0, Provenance::Rule("perimeter")).unwrap());
        assert_eq!(v.source(), Some(Provenance::Rule("perimeter")));
    }

    #[test]
    fn epsilon_write_fills_absent_provenance() {
        let mut v = Variable::new("area", "");
        v.set(6.0, Provenance::Rule("area_flex")).unwrap();
        v.restore(Some(6.0), None);
        assert!(!v.set(6.0, Provenance::User).unwrap());
        assert_eq!(v.source(), Some(Provenance::User));
    }

    #[test]
    fn triangle_angle_range_enforced() {
        let mut v = Variable::new("A", "");
        assert!(matches!(
            v.set(180.0, Provenance::User),
            Err(DomainError::AngleRange { .. })
        ));
        assert!(matches!(
            v.set(-5.0, Provenance::Rule("sum_A")),
            Err(DomainError::AngleRange { .. })
        ));
        assert!(v.set(60.0, Provenance::User).unwrap());
    }

    #[test]
    fn quad_angle_reduced_mod_360() {
        let mut v = Variable::new("D", "");
        assert!(v.set(359.5, Provenance::User).unwrap());
        assert_eq!(v.value(), Some(359.5));
        assert!(matches!(
            v.set(360.0, Provenance::User),
            Err(DomainError::AngleRange { .. })
        ));
    }

    #[test]
    fn user_sides_strictly_positive() {
        let mut v = Variable::new("b", "");
        assert!(matches!(
            v.set(0.0, Provenance::User),
            Err(DomainError::NonPositiveSide { .. })
        ));
        // a derived zero side is tolerated by the protocol
        assert!(v.set(0.0, Provenance::Rule("perimeter_reverse")).unwrap());
    }

    #[test]
    fn non_finite_rejected() {
        let mut v = Variable::new("area", "");
        assert!(matches!(
            v.set(f64::NAN, Provenance::User),
            Err(DomainError::NonFinite { .. })
        ));
        assert!(!v.is_known());
    }
}
