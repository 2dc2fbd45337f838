//! SOAISU ring verification and search.
//!
//! A 6-6 SOAISU is a pair of disjoint 6-element integer sets whose power
//! sums agree for degrees 1 through 5 (an ideal Prouhet–Tarry–Escott
//! solution). It is a SOAISU *ring* when each set can be placed around a
//! hexagon so that the cyclic product sums (degrees 1–5), the diagonal
//! product sum and the regular-triangle product sum also agree. A full
//! ring additionally embeds a 3-3 sub-ring between alternating vertices.
//!
//! The crate computes those invariants, reduces arrangements modulo the
//! dihedral group of the hexagon, checks the stage hierarchy with either
//! numeric or polynomial-identity equality, and brute-forces pairs within
//! a bounded integer universe.

pub mod generalize;
pub mod invariants;
pub mod matcher;
pub mod oracle;
pub mod poly;
pub mod search;
pub mod symmetry;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use num_bigint::BigInt;
use serde::{Serialize, Serializer};

use invariants::{require_arity, InvariantError, HEXAGON, TRIANGLE};

pub use generalize::{affine_lift, generalize, generalize_with};
pub use matcher::{match_embedded, match_rings, verify_ring, RingMatchReport, RingMatcher};
pub use oracle::{EqualityOracle, NumericEquality, SymbolicEquality};
pub use poly::Polynomial;
pub use search::{search, search_parallel, RingSearch};
pub use symmetry::canonical_orbit_representatives;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberSetError {
    #[error("input is empty")]
    EmptyInput,
    #[error("expected {expected} distinct integers, found {found}", expected = NumberSet::SIZE)]
    WrongCardinality { found: usize },
    #[error("invalid integer '{0}'")]
    InvalidInteger(String),
}

/// Exactly six distinct integers, stored in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumberSet {
    elements: Vec<BigInt>,
}

impl NumberSet {
    pub const SIZE: usize = HEXAGON;

    /// Collects the values as a set, so duplicates count once.
    pub fn new<I, T>(values: I) -> Result<Self, NumberSetError>
    where
        I: IntoIterator<Item = T>,
        T: Into<BigInt>,
    {
        let distinct: BTreeSet<BigInt> = values.into_iter().map(Into::into).collect();
        if distinct.is_empty() {
            return Err(NumberSetError::EmptyInput);
        }
        if distinct.len() != Self::SIZE {
            return Err(NumberSetError::WrongCardinality {
                found: distinct.len(),
            });
        }
        Ok(NumberSet {
            elements: distinct.into_iter().collect(),
        })
    }

    pub(crate) fn from_sorted_distinct(elements: Vec<BigInt>) -> Self {
        debug_assert_eq!(elements.len(), Self::SIZE);
        debug_assert!(elements.windows(2).all(|w| w[0] < w[1]));
        NumberSet { elements }
    }

    pub fn elements(&self) -> &[BigInt] {
        &self.elements
    }

    pub fn contains(&self, value: &BigInt) -> bool {
        self.elements.binary_search(value).is_ok()
    }

    pub fn is_disjoint(&self, other: &NumberSet) -> bool {
        self.elements.iter().all(|v| !other.contains(v))
    }

    /// All 720 orderings as hexagon arrangements.
    pub fn permutations(&self) -> impl Iterator<Item = Arrangement> + '_ {
        self.elements
            .iter()
            .cloned()
            .permutations(Self::SIZE)
            .map(Arrangement)
    }
}

impl fmt::Display for NumberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.elements.iter().join(", "))
    }
}

/// Accepts `{5, 14, 16, 34, 36, 45}`, `5,14,16,34,36,45` or
/// space-separated integers.
impl FromStr for NumberSet {
    type Err = NumberSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s.trim().trim_matches(|c| c == '{' || c == '}').trim();
        if cleaned.is_empty() {
            return Err(NumberSetError::EmptyInput);
        }
        let values = cleaned
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<BigInt>()
                    .map_err(|_| NumberSetError::InvalidInteger(token.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        NumberSet::new(values)
    }
}

impl Serialize for NumberSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        display_serde::seq(&self.elements, serializer)
    }
}

/// Values placed on the vertices of a regular hexagon (6) or triangle (3),
/// in order around the polygon.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Arrangement<V = BigInt>(Vec<V>);

impl<V> Arrangement<V> {
    pub fn hexagon(values: Vec<V>) -> Result<Self, InvariantError> {
        require_arity(&values, HEXAGON)?;
        Ok(Arrangement(values))
    }

    pub fn triangle(values: Vec<V>) -> Result<Self, InvariantError> {
        require_arity(&values, TRIANGLE)?;
        Ok(Arrangement(values))
    }

    pub fn values(&self) -> &[V] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_values(self) -> Vec<V> {
        self.0
    }

    pub fn map<U>(&self, f: impl FnMut(&V) -> U) -> Arrangement<U> {
        Arrangement(self.0.iter().map(f).collect())
    }
}

impl<V: Clone> Arrangement<V> {
    /// Inscribed triangle of a hexagon starting at `offset`: offset 0 picks
    /// positions 0, 2, 4 (a1, a3, a5), offset 1 picks 1, 3, 5 (a2, a4, a6).
    pub fn triangle_at(&self, offset: usize) -> Result<Arrangement<V>, InvariantError> {
        require_arity(&self.0, HEXAGON)?;
        Ok(self.inscribed(offset))
    }

    // Caller guarantees a hexagon.
    pub(crate) fn inscribed(&self, offset: usize) -> Arrangement<V> {
        let offset = offset % 2;
        Arrangement((0..TRIANGLE).map(|k| self.0[offset + 2 * k].clone()).collect())
    }
}

impl<V: Ord + Clone> Arrangement<V> {
    /// Lexicographically smallest rotation/reflection of this arrangement.
    pub fn canonical(&self) -> Arrangement<V> {
        Arrangement(symmetry::canonical_form(&self.0))
    }
}

impl<V> AsRef<[V]> for Arrangement<V> {
    fn as_ref(&self) -> &[V] {
        &self.0
    }
}

impl<V: fmt::Display> fmt::Display for Arrangement<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

impl<V: fmt::Display> Serialize for Arrangement<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        display_serde::seq(&self.0, serializer)
    }
}

/// Two disjoint sets with equal power sums of degrees 1..=5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoaisuPair {
    pub s1: NumberSet,
    pub s2: NumberSet,
}

/// One hexagon arrangement from each side of a SOAISU whose product sums
/// all agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(bound(serialize = "V: fmt::Display"))]
pub struct SoaisuRingPair<V = BigInt> {
    pub s1: Arrangement<V>,
    pub s2: Arrangement<V>,
}

impl<V: fmt::Display> fmt::Display for SoaisuRingPair<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S1={} S2={}", self.s1, self.s2)
    }
}

/// Serialize invariant values through `Display`, so integers and
/// polynomials share one JSON shape.
pub(crate) mod display_serde {
    use std::fmt::Display;

    use serde::Serializer;

    pub fn value<V: Display, S: Serializer>(value: &V, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn seq<V: Display, S: Serializer>(values: &[V], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.to_string()))
    }
}
