/// Ordered stage hierarchy that decides whether two sets form a SOAISU ring.
///
/// 1. power sums (degrees 1–5) of the two sets
/// 2. cyclic product sums (degrees 1–5) of every canonical arrangement pair
/// 3. diagonal product sum of the stage-2 survivors
/// 4. regular-triangle product sum of the stage-3 survivors
/// 5. embedded 3-3 sub-ring between S1's (a1, a3, a5) and S2's (a2, a4, a6)
///
/// Each stage only sees what survived the previous one. The matcher owns
/// an [`EqualityOracle`], so the same control flow runs over integers or
/// polynomials.

use std::fmt;
use std::ops::RangeInclusive;

use num_bigint::BigInt;
use serde::Serialize;

use crate::display_serde;
use crate::invariants::{
    self, cyclic_product_sums, power_sum, require_arity, InvariantError, RingValue,
    HEXAGON, HEXAGON_MAX_DEGREE, TRIANGLE_MAX_DEGREE,
};
use crate::oracle::{EqualityOracle, NumericEquality};
use crate::symmetry::canonical_orbit_representatives;
use crate::{Arrangement, NumberSet, SoaisuRingPair};

/// Vertex offset of S1's inscribed triangle in the embedded check.
pub const S1_TRIANGLE_OFFSET: usize = 0;

/// Vertex offset of S2's inscribed triangle in the embedded check.
pub const S2_TRIANGLE_OFFSET: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    PowerSums,
    Cyclic,
    Diagonal,
    Triangle,
    Embedded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::PowerSums => write!(f, "power sums"),
            Stage::Cyclic => write!(f, "cyclic product sums"),
            Stage::Diagonal => write!(f, "diagonal product sum"),
            Stage::Triangle => write!(f, "regular triangle product sum"),
            Stage::Embedded => write!(f, "embedded 3-3 sub-ring"),
        }
    }
}

/// One invariant evaluated on both sides.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "V: fmt::Display"))]
pub struct Comparison<V> {
    pub degree: u32,
    #[serde(serialize_with = "display_serde::value")]
    pub lhs: V,
    #[serde(serialize_with = "display_serde::value")]
    pub rhs: V,
    pub matched: bool,
}

/// A run of per-degree comparisons that stops at the first mismatch; the
/// failing comparison is kept as the last entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "V: fmt::Display"))]
pub struct DegreeStage<V> {
    pub comparisons: Vec<Comparison<V>>,
    pub passed: bool,
}

impl<V> DegreeStage<V> {
    pub fn mismatch(&self) -> Option<&Comparison<V>> {
        self.comparisons.iter().find(|c| !c.matched)
    }
}

/// Invariants of one hexagon arrangement, computed once and reused for
/// every pairing it takes part in.
#[derive(Debug, Clone)]
pub struct ArrangementProfile<V> {
    pub arrangement: Arrangement<V>,
    pub cyclic: Vec<V>,
    pub diagonal: V,
    pub triangle: V,
}

impl<V: RingValue> ArrangementProfile<V> {
    pub fn new(arrangement: Arrangement<V>) -> Result<Self, InvariantError> {
        require_arity(arrangement.values(), HEXAGON)?;
        Ok(Self::of_hexagon(arrangement))
    }

    pub(crate) fn of_hexagon(arrangement: Arrangement<V>) -> Self {
        let values = arrangement.values();
        let cyclic = cyclic_product_sums(values, HEXAGON_MAX_DEGREE);
        let diagonal = invariants::diagonal_unchecked(values);
        let triangle = invariants::triangle_unchecked(values);
        ArrangementProfile {
            arrangement,
            cyclic,
            diagonal,
            triangle,
        }
    }
}

/// Profiles of the 60 canonical hexagons of a set.
pub fn hexagon_profiles(set: &NumberSet) -> Vec<ArrangementProfile<BigInt>> {
    canonical_orbit_representatives(set)
        .into_iter()
        .map(ArrangementProfile::of_hexagon)
        .collect()
}

/// An arrangement pair that passed the cyclic stage, with the outcome of
/// the later stages.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "V: fmt::Display"))]
pub struct PairCheck<V> {
    pub pair: SoaisuRingPair<V>,
    #[serde(serialize_with = "display_serde::seq")]
    pub cyclic_sums: Vec<V>,
    pub diagonal: Comparison<V>,
    /// `None` when the diagonal stage already failed.
    pub triangle: Option<Comparison<V>>,
    /// Only filled in when the embedded stage was requested.
    pub embedded: Option<EmbeddedMatchReport<V>>,
}

impl<V> PairCheck<V> {
    pub fn is_ring(&self) -> bool {
        self.diagonal.matched && self.triangle.as_ref().map_or(false, |t| t.matched)
    }

    pub fn has_embedded_ring(&self) -> bool {
        self.embedded.as_ref().map_or(false, EmbeddedMatchReport::passed)
    }
}

/// 3-3 sub-ring check between two inscribed triangles.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "V: fmt::Display"))]
pub struct EmbeddedMatchReport<V> {
    pub s1_triangle: Arrangement<V>,
    pub s2_triangle: Arrangement<V>,
    pub power_sums: DegreeStage<V>,
    /// `None` when the power sums already differ.
    pub cyclic: Option<DegreeStage<V>>,
}

impl<V> EmbeddedMatchReport<V> {
    pub fn passed(&self) -> bool {
        self.power_sums.passed && self.cyclic.as_ref().map_or(false, |c| c.passed)
    }
}

/// Pass/fail per stage. Same shape for numeric and symbolic runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub power_sums: bool,
    pub cyclic: bool,
    pub diagonal: bool,
    pub triangle: bool,
    /// `None` when stage 5 was not requested.
    pub embedded: Option<bool>,
}

impl StageOutcome {
    pub fn failed_stage(&self) -> Option<Stage> {
        if !self.power_sums {
            Some(Stage::PowerSums)
        } else if !self.cyclic {
            Some(Stage::Cyclic)
        } else if !self.diagonal {
            Some(Stage::Diagonal)
        } else if !self.triangle {
            Some(Stage::Triangle)
        } else if self.embedded == Some(false) {
            Some(Stage::Embedded)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "V: fmt::Display"))]
pub struct RingMatchReport<V> {
    pub oracle: &'static str,
    pub power_sums: DegreeStage<V>,
    /// Arrangement pairs that entered the cyclic stage.
    pub arrangement_pairs: usize,
    /// Pairs that passed the cyclic stage, in (S1, S2) order.
    pub cyclic_survivors: Vec<PairCheck<V>>,
    pub embedded_checked: bool,
}

impl<V> RingMatchReport<V> {
    fn not_a_soaisu(oracle: &'static str, power_sums: DegreeStage<V>) -> Self {
        RingMatchReport {
            oracle,
            power_sums,
            arrangement_pairs: 0,
            cyclic_survivors: Vec::new(),
            embedded_checked: false,
        }
    }

    pub fn is_soaisu(&self) -> bool {
        self.power_sums.passed
    }

    pub fn diagonal_survivors(&self) -> impl Iterator<Item = &PairCheck<V>> {
        self.cyclic_survivors.iter().filter(|c| c.diagonal.matched)
    }

    /// Pairs that passed stages 1–4.
    pub fn rings(&self) -> impl Iterator<Item = &PairCheck<V>> {
        self.cyclic_survivors.iter().filter(|c| c.is_ring())
    }

    /// Ring pairs that also carry an embedded 3-3 sub-ring.
    pub fn full_rings(&self) -> impl Iterator<Item = &PairCheck<V>> {
        self.rings().filter(|c| c.has_embedded_ring())
    }

    pub fn outcome(&self) -> StageOutcome {
        StageOutcome {
            power_sums: self.power_sums.passed,
            cyclic: !self.cyclic_survivors.is_empty(),
            diagonal: self.diagonal_survivors().next().is_some(),
            triangle: self.rings().next().is_some(),
            embedded: self
                .embedded_checked
                .then(|| self.full_rings().next().is_some()),
        }
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        self.outcome().failed_stage()
    }
}

impl<V: Clone> RingMatchReport<V> {
    pub fn ring_pairs(&self) -> Vec<SoaisuRingPair<V>> {
        self.rings().map(|c| c.pair.clone()).collect()
    }
}

pub struct RingMatcher<O> {
    oracle: O,
}

impl<O: EqualityOracle> RingMatcher<O> {
    pub fn new(oracle: O) -> Self {
        RingMatcher { oracle }
    }

    fn compare_degrees<F>(&self, degrees: RangeInclusive<u32>, mut invariant: F) -> DegreeStage<O::Value>
    where
        F: FnMut(u32) -> (O::Value, O::Value),
    {
        let mut comparisons = Vec::new();
        for degree in degrees {
            let (lhs, rhs) = invariant(degree);
            let matched = self.oracle.equal(&lhs, &rhs);
            comparisons.push(Comparison {
                degree,
                lhs,
                rhs,
                matched,
            });
            if !matched {
                return DegreeStage {
                    comparisons,
                    passed: false,
                };
            }
        }
        DegreeStage {
            comparisons,
            passed: true,
        }
    }

    fn compare(&self, degree: u32, lhs: O::Value, rhs: O::Value) -> Comparison<O::Value> {
        let matched = self.oracle.equal(&lhs, &rhs);
        Comparison {
            degree,
            lhs,
            rhs,
            matched,
        }
    }

    /// Stage 1. Order of the values is irrelevant.
    pub fn power_sum_stage(&self, s1: &[O::Value], s2: &[O::Value]) -> DegreeStage<O::Value> {
        self.compare_degrees(1..=HEXAGON_MAX_DEGREE, |p| (power_sum(s1, p), power_sum(s2, p)))
    }

    /// Stages 2–4 over the full cross product of the given profiles.
    pub fn arrangement_stages(
        &self,
        s1: &[ArrangementProfile<O::Value>],
        s2: &[ArrangementProfile<O::Value>],
    ) -> Vec<PairCheck<O::Value>> {
        let mut survivors = Vec::new();
        for p1 in s1 {
            for p2 in s2 {
                if !self.oracle.all_equal(&p1.cyclic, &p2.cyclic) {
                    continue;
                }
                let diagonal = self.compare(2, p1.diagonal.clone(), p2.diagonal.clone());
                let triangle = diagonal
                    .matched
                    .then(|| self.compare(3, p1.triangle.clone(), p2.triangle.clone()));
                log::trace!(
                    "cyclic match {} / {}: diagonal={} triangle={:?}",
                    p1.arrangement,
                    p2.arrangement,
                    diagonal.matched,
                    triangle.as_ref().map(|t| t.matched)
                );
                survivors.push(PairCheck {
                    pair: SoaisuRingPair {
                        s1: p1.arrangement.clone(),
                        s2: p2.arrangement.clone(),
                    },
                    cyclic_sums: p1.cyclic.clone(),
                    diagonal,
                    triangle,
                    embedded: None,
                });
            }
        }
        survivors
    }

    /// Stage 5 for a pair of hexagons.
    pub fn embedded_stage(
        &self,
        pair: &SoaisuRingPair<O::Value>,
    ) -> Result<EmbeddedMatchReport<O::Value>, InvariantError> {
        require_arity(pair.s1.values(), HEXAGON)?;
        require_arity(pair.s2.values(), HEXAGON)?;
        Ok(self.embedded_unchecked(pair))
    }

    fn embedded_unchecked(&self, pair: &SoaisuRingPair<O::Value>) -> EmbeddedMatchReport<O::Value> {
        let s1_triangle = pair.s1.inscribed(S1_TRIANGLE_OFFSET);
        let s2_triangle = pair.s2.inscribed(S2_TRIANGLE_OFFSET);
        let (t1, t2) = (s1_triangle.values(), s2_triangle.values());

        let power_sums =
            self.compare_degrees(1..=TRIANGLE_MAX_DEGREE, |p| (power_sum(t1, p), power_sum(t2, p)));
        let cyclic = power_sums.passed.then(|| {
            self.compare_degrees(1..=TRIANGLE_MAX_DEGREE, |m| {
                (
                    invariants::cyclic_product_sum(t1, m),
                    invariants::cyclic_product_sum(t2, m),
                )
            })
        });
        EmbeddedMatchReport {
            s1_triangle,
            s2_triangle,
            power_sums,
            cyclic,
        }
    }

    /// Drive stages 1–4, and stage 5 on every ring pair when `embedded`
    /// is set. `s1_values`/`s2_values` are the underlying sets.
    pub fn evaluate(
        &self,
        s1_values: &[O::Value],
        s2_values: &[O::Value],
        s1: &[ArrangementProfile<O::Value>],
        s2: &[ArrangementProfile<O::Value>],
        embedded: bool,
    ) -> RingMatchReport<O::Value> {
        let power_sums = self.power_sum_stage(s1_values, s2_values);
        self.evaluate_after_power_sums(power_sums, s1, s2, embedded)
    }

    fn evaluate_after_power_sums(
        &self,
        power_sums: DegreeStage<O::Value>,
        s1: &[ArrangementProfile<O::Value>],
        s2: &[ArrangementProfile<O::Value>],
        embedded: bool,
    ) -> RingMatchReport<O::Value> {
        if !power_sums.passed {
            log::debug!("power sums differ: {:?}", power_sums.mismatch().map(|c| c.degree));
            return RingMatchReport::not_a_soaisu(self.oracle.name(), power_sums);
        }

        let mut cyclic_survivors = self.arrangement_stages(s1, s2);
        if embedded {
            for check in cyclic_survivors.iter_mut().filter(|c| c.is_ring()) {
                check.embedded = Some(self.embedded_unchecked(&check.pair));
            }
        }

        let report = RingMatchReport {
            oracle: self.oracle.name(),
            power_sums,
            arrangement_pairs: s1.len() * s2.len(),
            cyclic_survivors,
            embedded_checked: embedded,
        };
        log::debug!(
            "{} arrangement pairs: {} cyclic, {} diagonal, {} ring",
            report.arrangement_pairs,
            report.cyclic_survivors.len(),
            report.diagonal_survivors().count(),
            report.rings().count()
        );
        report
    }
}

impl Default for RingMatcher<NumericEquality> {
    fn default() -> Self {
        RingMatcher::new(NumericEquality)
    }
}

fn match_sets(s1: &NumberSet, s2: &NumberSet, embedded: bool) -> RingMatchReport<BigInt> {
    let matcher = RingMatcher::default();
    let power_sums = matcher.power_sum_stage(s1.elements(), s2.elements());
    if !power_sums.passed {
        return matcher.evaluate_after_power_sums(power_sums, &[], &[], embedded);
    }
    // Profiles are built only once stage 1 has passed.
    let p1 = hexagon_profiles(s1);
    let p2 = hexagon_profiles(s2);
    matcher.evaluate_after_power_sums(power_sums, &p1, &p2, embedded)
}

/// Stages 1–4 for two integer sets.
pub fn match_rings(s1: &NumberSet, s2: &NumberSet) -> RingMatchReport<BigInt> {
    match_sets(s1, s2, false)
}

/// Stages 1–5: every ring pair is also checked for its embedded 3-3
/// sub-ring.
pub fn verify_ring(s1: &NumberSet, s2: &NumberSet) -> RingMatchReport<BigInt> {
    match_sets(s1, s2, true)
}

/// Stage 5 alone for an integer arrangement pair.
pub fn match_embedded(
    pair: &SoaisuRingPair<BigInt>,
) -> Result<EmbeddedMatchReport<BigInt>, InvariantError> {
    RingMatcher::default().embedded_stage(pair)
}
