/// Dihedral symmetry reduction of polygon arrangements.
///
/// Two arrangements that differ by a rotation or reflection describe the
/// same polygon, so only the lexicographically smallest member of each
/// orbit is ever checked.

use std::collections::BTreeSet;

use num_bigint::BigInt;

use crate::{Arrangement, NumberSet};

/// The 2n rotations of `arr` and of its reversal, in generation order.
/// Repeated values may produce duplicate images.
pub fn dihedral_images<T: Clone>(arr: &[T]) -> Vec<Vec<T>> {
    let n = arr.len();
    let reversed: Vec<T> = arr.iter().rev().cloned().collect();
    let mut images = Vec::with_capacity(2 * n);
    for base in [arr, reversed.as_slice()] {
        for shift in 0..n {
            let mut rotated = Vec::with_capacity(n);
            rotated.extend_from_slice(&base[shift..]);
            rotated.extend_from_slice(&base[..shift]);
            images.push(rotated);
        }
    }
    images
}

/// Orbit tag: the smallest of the dihedral images.
pub fn canonical_form<T: Ord + Clone>(arr: &[T]) -> Vec<T> {
    dihedral_images(arr)
        .into_iter()
        .min()
        .unwrap_or_default()
}

/// One canonical representative per orbit among the given orderings.
/// Insertion order does not matter; the result is sorted.
pub fn canonical_representatives<T, I>(orderings: I) -> BTreeSet<Vec<T>>
where
    T: Ord + Clone,
    I: IntoIterator<Item = Vec<T>>,
{
    orderings
        .into_iter()
        .map(|p| canonical_form(&p))
        .collect()
}

/// The 60 distinct hexagons that can be built from a 6-element set, each
/// given by its canonical representative, in ascending order.
pub fn canonical_orbit_representatives(set: &NumberSet) -> Vec<Arrangement<BigInt>> {
    let reps = canonical_representatives(set.permutations().map(Arrangement::into_values));
    log::trace!("{}: {} orbit representatives", set, reps.len());
    reps.into_iter().map(Arrangement).collect()
}
