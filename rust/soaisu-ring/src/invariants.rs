/// Symmetric-function invariants of hexagon and triangle arrangements.
///
/// Every function here is generic over [`RingValue`], so the same formulas
/// serve plain integers (`BigInt`) and symbolic polynomials alike. Nothing
/// is special-cased per value domain.

use std::ops::{Add, Mul};

use num_traits::{One, Zero};

/// Highest power / cyclic degree checked on a hexagon.
pub const HEXAGON_MAX_DEGREE: u32 = 5;

/// Highest power / cyclic degree checked on an embedded triangle.
pub const TRIANGLE_MAX_DEGREE: u32 = 2;

/// Length of a hexagon arrangement.
pub const HEXAGON: usize = 6;

/// Length of a triangle arrangement.
pub const TRIANGLE: usize = 3;

/// Arithmetic needed by the invariant formulas: a commutative ring with
/// owned `+` and `*`.
pub trait RingValue: Clone + Zero + One + Add<Output = Self> + Mul<Output = Self> {}

impl<T> RingValue for T where T: Clone + Zero + One + Add<Output = T> + Mul<Output = T> {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    #[error("expected a sequence of length {expected}, found {found}")]
    InvalidArity { expected: usize, found: usize },
}

pub(crate) fn require_arity<T>(seq: &[T], expected: usize) -> Result<(), InvariantError> {
    if seq.len() != expected {
        return Err(InvariantError::InvalidArity {
            expected,
            found: seq.len(),
        });
    }
    Ok(())
}

/// Σ x^p over the sequence. `p = 0` yields the element count.
pub fn power_sum<T: RingValue>(seq: &[T], p: u32) -> T {
    seq.iter()
        .fold(T::zero(), |acc, x| acc + num_traits::pow(x.clone(), p as usize))
}

/// Power sums for degrees `0..=max_degree`, in degree order.
pub fn power_sums<T: RingValue>(seq: &[T], max_degree: u32) -> Vec<T> {
    (0..=max_degree).map(|p| power_sum(seq, p)).collect()
}

/// m-th cyclic product sum: Σ_j Π_{k<m} seq[(j + k) mod n].
///
/// Windows wrap around the end of the sequence. `m = 0` gives `n` (empty
/// product is one); an empty sequence gives zero for every `m`.
pub fn cyclic_product_sum<T: RingValue>(seq: &[T], m: u32) -> T {
    let n = seq.len();
    let mut total = T::zero();
    for j in 0..n {
        let window = (0..m as usize).fold(T::one(), |acc, k| acc * seq[(j + k) % n].clone());
        total = total + window;
    }
    total
}

/// Cyclic product sums for degrees `1..=max_degree`, in degree order.
pub fn cyclic_product_sums<T: RingValue>(seq: &[T], max_degree: u32) -> Vec<T> {
    (1..=max_degree).map(|m| cyclic_product_sum(seq, m)).collect()
}

/// Sum of products of opposite hexagon vertices: a0·a3 + a1·a4 + a2·a5.
pub fn diagonal_product_sum<T: RingValue>(seq: &[T]) -> Result<T, InvariantError> {
    require_arity(seq, HEXAGON)?;
    Ok(diagonal_unchecked(seq))
}

/// Sum of the two inscribed regular triangles: a0·a2·a4 + a1·a3·a5.
pub fn triangle_product_sum<T: RingValue>(seq: &[T]) -> Result<T, InvariantError> {
    require_arity(seq, HEXAGON)?;
    Ok(triangle_unchecked(seq))
}

// Callers have already checked that `seq` is a hexagon.

pub(crate) fn diagonal_unchecked<T: RingValue>(seq: &[T]) -> T {
    seq[0].clone() * seq[3].clone()
        + seq[1].clone() * seq[4].clone()
        + seq[2].clone() * seq[5].clone()
}

pub(crate) fn triangle_unchecked<T: RingValue>(seq: &[T]) -> T {
    seq[0].clone() * seq[2].clone() * seq[4].clone()
        + seq[1].clone() * seq[3].clone() * seq[5].clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn big(values: &[i64]) -> Vec<BigInt> {
        values.iter().map(|&v| BigInt::from(v)).collect()
    }

    #[test]
    fn test_power_sum_degree_zero_counts_elements() {
        let s = big(&[5, 14, 16, 34, 36, 45]);
        assert_eq!(power_sum(&s, 0), BigInt::from(6));
        assert_eq!(power_sum(&big(&[1, 2, 3]), 0), BigInt::from(3));
    }

    #[test]
    fn test_power_sums_known_values() {
        let s = big(&[5, 14, 16, 34, 36, 45]);
        let sums = power_sums(&s, HEXAGON_MAX_DEGREE);
        assert_eq!(
            sums,
            big(&[6, 150, 4954, 184_050, 7_221_154, 292_019_250])
        );
    }

    #[test]
    fn test_cyclic_degree_one_is_plain_sum() {
        let s = big(&[3, -7, 11, 2, 9, 4]);
        assert_eq!(cyclic_product_sum(&s, 1), power_sum(&s, 1));
    }

    #[test]
    fn test_cyclic_degree_zero_is_length() {
        assert_eq!(cyclic_product_sum(&big(&[8, 1, 5]), 0), BigInt::from(3));
        assert_eq!(cyclic_product_sum(&big(&[8, 1, 5, 2, 2, 7]), 0), BigInt::from(6));
    }

    #[test]
    fn test_cyclic_wraps_around() {
        // 1·2 + 2·3 + 3·1
        assert_eq!(cyclic_product_sum(&big(&[1, 2, 3]), 2), BigInt::from(11));
        // Every window of length 3 on a triangle is the full product.
        assert_eq!(cyclic_product_sum(&big(&[2, 3, 5]), 3), BigInt::from(90));
    }

    #[test]
    fn test_cyclic_empty_sequence() {
        let empty: Vec<BigInt> = Vec::new();
        assert_eq!(cyclic_product_sum(&empty, 0), BigInt::from(0));
        assert_eq!(cyclic_product_sum(&empty, 3), BigInt::from(0));
    }

    #[test]
    fn test_cyclic_sums_of_known_ring() {
        let s = big(&[5, 14, 34, 45, 36, 16]);
        assert_eq!(
            cyclic_product_sums(&s, HEXAGON_MAX_DEGREE),
            big(&[150, 4352, 108_800, 1_967_500, 25_498_800])
        );
    }

    #[test]
    fn test_diagonal_and_triangle() {
        let s = big(&[5, 14, 34, 45, 36, 16]);
        assert_eq!(diagonal_product_sum(&s).unwrap(), BigInt::from(1273));
        assert_eq!(triangle_product_sum(&s).unwrap(), BigInt::from(16200));
    }

    #[test]
    fn test_invalid_arity() {
        let s = big(&[1, 2, 3]);
        assert_eq!(
            diagonal_product_sum(&s),
            Err(InvariantError::InvalidArity { expected: 6, found: 3 })
        );
        assert!(triangle_product_sum(&big(&[1, 2, 3, 4, 5, 6, 7])).is_err());
    }

    #[test]
    fn test_no_overflow_on_large_values() {
        let v = BigInt::from(u64::MAX);
        let s = vec![v.clone(); 6];
        let expected = &v * &v * &v * BigInt::from(2);
        assert_eq!(triangle_product_sum(&s).unwrap(), expected);
    }
}
