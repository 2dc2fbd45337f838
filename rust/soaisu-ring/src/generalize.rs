/// Symbolic generalization of a known ring.
///
/// Every value `v` of a base pair is replaced by `v·n + m` over free
/// parameters `n` and `m`, and the whole stage hierarchy is re-run with
/// polynomial-identity equality. A pass means the base pair generates a
/// two-parameter family of rings, one for every choice of `n` and `m`.

use num_bigint::BigInt;

use crate::invariants::InvariantError;
use crate::matcher::{ArrangementProfile, RingMatchReport, RingMatcher};
use crate::oracle::{EqualityOracle, SymbolicEquality};
use crate::poly::Polynomial;
use crate::Arrangement;

/// Name of the scale parameter.
pub const SCALE: &str = "n";

/// Name of the offset parameter.
pub const OFFSET: &str = "m";

/// `v ↦ v·scale + offset` for every value.
pub fn affine_lift<T>(values: &[T], scale: &str, offset: &str) -> Vec<Polynomial>
where
    T: Clone + Into<BigInt>,
{
    values.iter().map(|v| lift(v, scale, offset)).collect()
}

fn lift<T: Clone + Into<BigInt>>(value: &T, scale: &str, offset: &str) -> Polynomial {
    Polynomial::affine(value.clone(), scale, offset)
}

/// Stages 1–5 on the lifted pair `(s1_base·n + m, s2_base·n + m)` with
/// [`SymbolicEquality`].
pub fn generalize<T>(s1_base: &[T], s2_base: &[T]) -> Result<RingMatchReport<Polynomial>, InvariantError>
where
    T: Clone + Into<BigInt>,
{
    generalize_with(s1_base, s2_base, SymbolicEquality)
}

/// Like [`generalize`], with a caller-chosen polynomial oracle.
///
/// The two sides are checked exactly in the given vertex order; no orbit
/// reduction happens, so the report has at most one arrangement pair.
pub fn generalize_with<T, O>(
    s1_base: &[T],
    s2_base: &[T],
    oracle: O,
) -> Result<RingMatchReport<Polynomial>, InvariantError>
where
    T: Clone + Into<BigInt>,
    O: EqualityOracle<Value = Polynomial>,
{
    let s1 = Arrangement::hexagon(s1_base.to_vec())?.map(|v| lift(v, SCALE, OFFSET));
    let s2 = Arrangement::hexagon(s2_base.to_vec())?.map(|v| lift(v, SCALE, OFFSET));
    log::info!("generalizing {} / {} with {} equality", s1, s2, oracle.name());

    let (v1, v2) = (s1.values().to_vec(), s2.values().to_vec());
    let p1 = [ArrangementProfile::new(s1)?];
    let p2 = [ArrangementProfile::new(s2)?];

    let report = RingMatcher::new(oracle).evaluate(&v1, &v2, &p1, &p2, true);
    if let Some(stage) = report.failed_stage() {
        log::info!("generalization fails at {}", stage);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::matcher::Stage;
    use crate::{verify_ring, NumberSet};

    const S1: [i64; 6] = [5, 14, 34, 45, 36, 16];
    const S2: [i64; 6] = [6, 10, 29, 44, 40, 21];

    #[test]
    fn test_affine_lift() {
        let lifted = affine_lift(&[3i64, -2], "n", "m");
        assert_eq!(lifted[0].to_string(), "3*n + m");
        assert_eq!(lifted[1].to_string(), "-2*n + m");
    }

    #[test]
    fn test_lifted_arrangement_keeps_vertex_order() {
        let report = generalize(&S1, &S2).unwrap();
        let pair = &report.cyclic_survivors[0].pair;
        assert_eq!(pair.s1.values().to_vec(), affine_lift(&S1, SCALE, OFFSET));
        assert_eq!(pair.s2.to_string(), "(6*n + m, 10*n + m, 29*n + m, 44*n + m, 40*n + m, 21*n + m)");
    }

    #[test]
    fn test_arrangement_map_lifts_between_domains() {
        let base = Arrangement::hexagon(S1.to_vec()).unwrap();
        let lifted = base.map(|v| lift(v, "n", "m"));
        assert_eq!(lifted.len(), 6);
        assert_eq!(lifted.values()[3].to_string(), "45*n + m");
    }

    #[test]
    fn test_known_ring_generalizes() {
        let report = generalize(&S1, &S2).unwrap();
        assert_eq!(report.oracle, "symbolic");
        assert_eq!(report.arrangement_pairs, 1);
        assert_eq!(report.failed_stage(), None);
        assert_eq!(report.power_sums.comparisons.len(), 5);
        assert_eq!(report.full_rings().count(), 1);

        let check = &report.cyclic_survivors[0];
        assert_eq!(check.cyclic_sums.len(), 5);
        assert_eq!(check.diagonal.lhs.to_string(), "1273*n^2 + 150*m*n + 3*m^2");
        assert_eq!(check.cyclic_sums[1].to_string(), "4352*n^2 + 300*m*n + 6*m^2");
    }

    #[test]
    fn test_outcome_mirrors_numeric_verifier() {
        let symbolic = generalize(&S1, &S2).unwrap().outcome();
        let numeric = verify_ring(
            &NumberSet::new(S1).unwrap(),
            &NumberSet::new(S2).unwrap(),
        )
        .outcome();
        assert_eq!(symbolic, numeric);
    }

    #[test]
    fn test_specialization_recovers_integers() {
        let report = generalize(&S1, &S2).unwrap();
        let check = &report.cyclic_survivors[0];
        let bindings: HashMap<&str, BigInt> =
            [("n", BigInt::from(1)), ("m", BigInt::from(0))].into_iter().collect();
        assert_eq!(check.diagonal.lhs.evaluate(&bindings).unwrap(), BigInt::from(1273));
        let triangle = check.triangle.as_ref().unwrap();
        assert_eq!(triangle.rhs.evaluate(&bindings).unwrap(), BigInt::from(16200));
    }

    #[test]
    fn test_rotated_order_still_generalizes() {
        let report = generalize(&S1, &[6, 21, 40, 44, 29, 10]).unwrap();
        assert_eq!(report.failed_stage(), None);
    }

    #[test]
    fn test_unarranged_sets_fail_at_cyclic() {
        let report = generalize(&[5, 14, 16, 34, 36, 45], &[6, 10, 21, 29, 40, 44]).unwrap();
        assert!(report.is_soaisu());
        assert_eq!(report.failed_stage(), Some(Stage::Cyclic));
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        let err = generalize(&[1, 2, 3], &S2).unwrap_err();
        assert_eq!(err, InvariantError::InvalidArity { expected: 6, found: 3 });
    }
}
