/// Equality oracles that decide when two invariant values "match".
///
/// The ring matcher never inspects value types itself. Integers compare
/// numerically; polynomials compare as identities via their expanded
/// normal forms, never by sampling points.

use std::fmt;

use num_bigint::BigInt;

use crate::invariants::RingValue;
use crate::poly::Polynomial;

pub trait EqualityOracle {
    type Value: RingValue + fmt::Debug + fmt::Display;

    fn name(&self) -> &'static str;

    fn equal(&self, lhs: &Self::Value, rhs: &Self::Value) -> bool;

    /// Element-wise equality, stopping at the first mismatch.
    fn all_equal(&self, lhs: &[Self::Value], rhs: &[Self::Value]) -> bool {
        lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(a, b)| self.equal(a, b))
    }
}

/// Exact comparison of arbitrary-precision integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericEquality;

impl EqualityOracle for NumericEquality {
    type Value = BigInt;

    fn name(&self) -> &'static str {
        "numeric"
    }

    fn equal(&self, lhs: &BigInt, rhs: &BigInt) -> bool {
        lhs == rhs
    }
}

/// Polynomial identity: expanded normal forms must be structurally equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolicEquality;

impl EqualityOracle for SymbolicEquality {
    type Value = Polynomial;

    fn name(&self) -> &'static str {
        "symbolic"
    }

    fn equal(&self, lhs: &Polynomial, rhs: &Polynomial) -> bool {
        lhs.normal_form() == rhs.normal_form()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_all_equal_checks_length() {
        let a = vec![BigInt::from(1), BigInt::from(2)];
        let b = vec![BigInt::from(1)];
        assert!(!NumericEquality.all_equal(&a, &b));
        assert!(NumericEquality.all_equal(&a, &a.clone()));
    }

    #[test]
    fn test_symbolic_identity_not_pointwise() {
        // n^2 and n agree at n = 0 and n = 1 but are different identities.
        let n = Polynomial::var("n");
        assert!(!SymbolicEquality.equal(&n.pow(2), &n));

        let lhs = (n.clone() + Polynomial::constant(1)).pow(2);
        let rhs = n.pow(2) + Polynomial::constant(2) * n.clone() + Polynomial::constant(1);
        assert!(SymbolicEquality.equal(&lhs, &rhs));
    }
}
