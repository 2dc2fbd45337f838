//! Brute-force search for SOAISU rings inside a bounded integer universe.
//!
//! All 6-combinations of the universe are grouped by their degree-1 sum.
//! Sum classes are processed in ascending order; inside a class the
//! combinations are bucketed by their full power-sum tuple, so the
//! expensive arrangement stages only ever see genuine SOAISU pairs.
//!
//! The output order is (degree-1 sum, S1 lexicographic, S2 lexicographic),
//! with both `(A, B)` and `(B, A)` reported for every unordered pair.
//!
//! Classes are generated one at a time by a bounded depth-first walk over
//! the sorted universe, so memory stays proportional to the largest class
//! rather than to C(N, 6).

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use num_bigint::{BigInt, BigUint};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::invariants::{power_sums, HEXAGON_MAX_DEGREE};
use crate::matcher::{hexagon_profiles, ArrangementProfile, RingMatcher};
use crate::{display_serde, NumberSet, SoaisuPair, SoaisuRingPair};

/// Smallest universe that can hold two disjoint 6-sets.
pub const MIN_UNIVERSE: usize = 2 * NumberSet::SIZE;

type Combo = [u32; NumberSet::SIZE];

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid checkpoint: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// One ordered SOAISU pair together with every ring arrangement found for it.
/// `rings` is empty for a SOAISU that admits no ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub pair: SoaisuPair,
    pub sum: u64,
    pub rings: Vec<SoaisuRingPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub universe_size: usize,
    /// C(universe_size, 6).
    #[serde(serialize_with = "display_serde::value")]
    pub combinations: BigUint,
    pub classes_processed: usize,
    pub soaisu_pairs: usize,
    pub ring_pairs: usize,
}

/// Resume point of a [`RingSearch`]: the first sum class not yet fully
/// emitted and how many ring pairs of that class were already yielded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCheckpoint {
    pub universe: Vec<u32>,
    pub sum_class: u64,
    pub skip: usize,
}

impl SearchCheckpoint {
    pub fn save(&self, path: &Path) -> Result<(), SearchError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

// ---------------------------------------------------------------------------
// Sum classes
// ---------------------------------------------------------------------------

fn normalize_universe<I: IntoIterator<Item = u32>>(universe: I) -> Vec<u32> {
    let mut values: Vec<u32> = universe.into_iter().collect();
    values.sort_unstable();
    values.dedup();
    values
}

fn span_sum(values: &[u32]) -> u64 {
    values.iter().map(|&v| u64::from(v)).sum()
}

/// Smallest sum of `k` distinct entries of the sorted slice that is at
/// least `target`.
fn min_sum_at_least(values: &[u32], k: usize, target: u64) -> Option<u64> {
    if k == 0 {
        return (target == 0).then_some(0);
    }
    if values.len() < k {
        return None;
    }
    let mut best: Option<u64> = None;
    for i in 0..=values.len() - k {
        let v = u64::from(values[i]);
        let tail = &values[i + 1..];
        let low = v + span_sum(&tail[..k - 1]);
        if low >= target {
            // Later starts only sum higher.
            return Some(best.map_or(low, |b| b.min(low)));
        }
        let high = v + span_sum(&tail[tail.len() - (k - 1)..]);
        if high < target {
            continue;
        }
        if let Some(rest) = min_sum_at_least(tail, k - 1, target - v) {
            let candidate = v + rest;
            if candidate == target {
                return Some(candidate);
            }
            best = Some(best.map_or(candidate, |b| b.min(candidate)));
        }
    }
    best
}

/// Every 6-combination summing to exactly `sum`, in lexicographic order.
fn class_members(values: &[u32], sum: u64) -> Vec<Combo> {
    let mut members = Vec::new();
    let mut picked = [0u32; NumberSet::SIZE];
    collect_with_sum(values, 0, sum, &mut picked, &mut members);
    members
}

fn collect_with_sum(values: &[u32], depth: usize, remaining: u64, picked: &mut Combo, out: &mut Vec<Combo>) {
    let k = NumberSet::SIZE - depth;
    if k == 0 {
        if remaining == 0 {
            out.push(*picked);
        }
        return;
    }
    if values.len() < k {
        return;
    }
    for i in 0..=values.len() - k {
        let v = u64::from(values[i]);
        let low = v + span_sum(&values[i + 1..i + k]);
        if low > remaining {
            break;
        }
        let high = v + span_sum(&values[values.len() - (k - 1)..]);
        if high < remaining {
            continue;
        }
        picked[depth] = values[i];
        collect_with_sum(&values[i + 1..], depth + 1, remaining - v, picked, out);
    }
}

/// The first non-empty sum class at or above `from`.
fn next_class(universe: &[u32], from: u64) -> Option<(u64, Vec<Combo>)> {
    if universe.len() < MIN_UNIVERSE {
        return None;
    }
    let sum = min_sum_at_least(universe, NumberSet::SIZE, from)?;
    Some((sum, class_members(universe, sum)))
}

/// Every achievable degree-1 sum, ascending.
fn class_sums(universe: &[u32]) -> Vec<u64> {
    let mut sums = Vec::new();
    if universe.len() < MIN_UNIVERSE {
        return sums;
    }
    let mut from = 0;
    while let Some(sum) = min_sum_at_least(universe, NumberSet::SIZE, from) {
        sums.push(sum);
        from = sum + 1;
    }
    sums
}

fn disjoint(a: &Combo, b: &Combo) -> bool {
    a.iter().all(|x| !b.contains(x))
}

fn to_set(combo: &Combo) -> NumberSet {
    NumberSet::from_sorted_distinct(combo.iter().map(|&v| BigInt::from(v)).collect())
}

/// Match every ordered disjoint pair of one sum class that shares a
/// power-sum tuple. Hits come out in (S1, S2) lexicographic order.
fn process_class(sum: u64, members: &[Combo]) -> Vec<SearchHit> {
    let sets: Vec<NumberSet> = members.iter().map(to_set).collect();
    let signatures: Vec<Vec<BigInt>> = sets
        .iter()
        .map(|s| power_sums(s.elements(), HEXAGON_MAX_DEGREE))
        .collect();

    let mut buckets: HashMap<&[BigInt], Vec<usize>> = HashMap::new();
    for (i, sig) in signatures.iter().enumerate() {
        buckets.entry(sig.as_slice()).or_default().push(i);
    }

    let matcher = RingMatcher::default();
    let mut profiles: HashMap<usize, Vec<ArrangementProfile<BigInt>>> = HashMap::new();
    let mut hits = Vec::new();

    for (i, sig) in signatures.iter().enumerate() {
        let Some(bucket) = buckets.get(sig.as_slice()) else {
            continue;
        };
        for &j in bucket {
            if i == j || !disjoint(&members[i], &members[j]) {
                continue;
            }
            for idx in [i, j] {
                profiles
                    .entry(idx)
                    .or_insert_with(|| hexagon_profiles(&sets[idx]));
            }
            let (Some(p1), Some(p2)) = (profiles.get(&i), profiles.get(&j)) else {
                continue;
            };
            let report =
                matcher.evaluate(sets[i].elements(), sets[j].elements(), p1, p2, false);
            let rings = report.ring_pairs();
            if rings.is_empty() {
                log::trace!("{} / {}: SOAISU without ring", sets[i], sets[j]);
            }
            hits.push(SearchHit {
                pair: SoaisuPair {
                    s1: sets[i].clone(),
                    s2: sets[j].clone(),
                },
                sum,
                rings,
            });
        }
    }
    if !hits.is_empty() {
        log::debug!("sum class {}: {} SOAISU pairs", sum, hits.len());
    }
    hits
}

// ---------------------------------------------------------------------------
// Sequential search
// ---------------------------------------------------------------------------

/// Lazy, restartable sequence of ring pairs over a universe.
///
/// Nothing is computed until the first `next()`, and each pull generates at
/// most the sum classes needed to reach the next ring pair. Dropping the
/// iterator early is always safe. Every SOAISU pair met on the way,
/// including those without a ring, is kept for [`RingSearch::take_hits`].
pub struct RingSearch {
    universe: Vec<u32>,
    next_sum: u64,
    start_sum: u64,
    start_skip: usize,
    current_sum: Option<u64>,
    yielded_in_class: usize,
    pending: VecDeque<SoaisuRingPair>,
    hits: Vec<SearchHit>,
    stats: SearchStats,
}

impl RingSearch {
    pub fn over<I: IntoIterator<Item = u32>>(universe: I) -> Self {
        Self::starting_at(normalize_universe(universe), 0, 0)
    }

    /// Continue exactly where the checkpointed search stopped.
    pub fn resume(checkpoint: SearchCheckpoint) -> Self {
        Self::starting_at(
            normalize_universe(checkpoint.universe),
            checkpoint.sum_class,
            checkpoint.skip,
        )
    }

    fn starting_at(universe: Vec<u32>, start_sum: u64, start_skip: usize) -> Self {
        let universe_size = universe.len();
        let combinations = num_integer::binomial(
            BigUint::from(universe_size),
            BigUint::from(NumberSet::SIZE),
        );
        RingSearch {
            universe,
            next_sum: start_sum,
            start_sum,
            start_skip,
            current_sum: None,
            yielded_in_class: 0,
            pending: VecDeque::new(),
            hits: Vec::new(),
            stats: SearchStats {
                universe_size,
                combinations,
                ..SearchStats::default()
            },
        }
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// SOAISU pairs of the classes processed since the last call, in
    /// search order. A resumed search reports its first class in full.
    pub fn take_hits(&mut self) -> Vec<SearchHit> {
        std::mem::take(&mut self.hits)
    }

    /// Run to completion and return every SOAISU pair not yet taken.
    pub fn into_hits(mut self) -> Vec<SearchHit> {
        self.by_ref().for_each(drop);
        self.hits
    }

    pub fn checkpoint(&self) -> SearchCheckpoint {
        let (sum_class, skip) = match self.current_sum {
            None => (self.start_sum, self.start_skip),
            Some(sum) if !self.pending.is_empty() => (sum, self.yielded_in_class),
            Some(_) => (self.next_sum, 0),
        };
        SearchCheckpoint {
            universe: self.universe.clone(),
            sum_class,
            skip,
        }
    }
}

impl Iterator for RingSearch {
    type Item = SoaisuRingPair;

    fn next(&mut self) -> Option<SoaisuRingPair> {
        loop {
            if let Some(pair) = self.pending.pop_front() {
                self.yielded_in_class += 1;
                self.stats.ring_pairs += 1;
                return Some(pair);
            }

            if self.current_sum.is_none() {
                log::info!(
                    "universe of {} values: {} combinations, starting at sum {}",
                    self.universe.len(),
                    self.stats.combinations,
                    self.start_sum
                );
            }
            let Some((sum, members)) = next_class(&self.universe, self.next_sum) else {
                // Leave the cursor past the end so a checkpoint resumes empty.
                if self.current_sum.is_none() {
                    self.current_sum = Some(self.next_sum);
                }
                return None;
            };
            self.next_sum = sum + 1;

            let hits = process_class(sum, &members);
            self.stats.classes_processed += 1;
            self.stats.soaisu_pairs += hits.len();

            let mut rings: VecDeque<SoaisuRingPair> =
                hits.iter().flat_map(|h| h.rings.iter().cloned()).collect();
            let skip = if self.current_sum.is_none() && sum == self.start_sum {
                self.start_skip.min(rings.len())
            } else {
                0
            };
            rings.drain(..skip);
            self.hits.extend(hits);

            self.current_sum = Some(sum);
            self.yielded_in_class = skip;
            self.pending = rings;
        }
    }
}

/// All ring pairs over `{1, …, n_limit}`.
pub fn search(n_limit: u32) -> RingSearch {
    RingSearch::over(1..=n_limit)
}

// ---------------------------------------------------------------------------
// Parallel search
// ---------------------------------------------------------------------------

/// Every SOAISU pair over `universe` with its rings, sum classes spread
/// across the rayon pool. Order matches the sequential search.
pub fn search_hits_parallel(universe: &[u32]) -> Vec<SearchHit> {
    let universe = normalize_universe(universe.iter().copied());
    let sums = class_sums(&universe);
    log::info!(
        "parallel search over {} values: {} sum classes",
        universe.len(),
        sums.len()
    );
    let per_class: Vec<Vec<SearchHit>> = sums
        .par_iter()
        .map(|&sum| process_class(sum, &class_members(&universe, sum)))
        .collect();
    per_class.into_iter().flatten().collect()
}

/// Parallel counterpart of [`search`], collected eagerly.
pub fn search_parallel(n_limit: u32) -> Vec<SoaisuRingPair> {
    let universe: Vec<u32> = (1..=n_limit).collect();
    search_hits_parallel(&universe)
        .into_iter()
        .flat_map(|hit| hit.rings)
        .collect()
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    const FIXTURE: [u32; 12] = [5, 14, 16, 34, 36, 45, 6, 10, 21, 29, 40, 44];

    // One SOAISU pair with sum 99 that admits no ring arrangement.
    const RINGLESS: [u32; 12] = [1, 7, 9, 24, 26, 32, 2, 4, 12, 21, 29, 31];

    fn display(pairs: &[SoaisuRingPair]) -> Vec<String> {
        pairs.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_small_universe_is_empty() {
        assert_eq!(search(10).count(), 0);
        assert_eq!(search(11).count(), 0);
        assert_eq!(search(0).count(), 0);
        assert!(search_parallel(11).is_empty());
    }

    #[test]
    fn test_sum_classes_cover_every_combination() {
        let universe: Vec<u32> = (1..=13).collect();
        let sums = class_sums(&universe);
        assert_eq!(sums.first(), Some(&21));
        assert_eq!(sums.last(), Some(&63));
        assert_eq!(sums.len(), 43);

        let mut total = 0;
        for &sum in &sums {
            let members = class_members(&universe, sum);
            assert!(!members.is_empty());
            assert!(members.windows(2).all(|w| w[0] < w[1]));
            total += members.len();
        }
        assert_eq!(total, 1716);
    }

    #[test]
    fn test_class_members_match_brute_force() {
        let universe: Vec<u32> = (1..=14).collect();
        let expected: Vec<Combo> = universe
            .iter()
            .copied()
            .combinations(NumberSet::SIZE)
            .filter(|c| span_sum(c) == 45)
            .map(|c| [c[0], c[1], c[2], c[3], c[4], c[5]])
            .collect();
        assert_eq!(class_members(&universe, 45), expected);
        assert_eq!(next_class(&universe, 45).map(|(sum, _)| sum), Some(45));
    }

    #[test]
    fn test_sparse_universe_skips_empty_sums() {
        let universe: Vec<u32> = (1..=6).chain(1_000_000_000..=1_000_000_005).collect();
        let sums = class_sums(&universe);
        let total: usize = sums.iter().map(|&s| class_members(&universe, s).len()).sum();
        assert_eq!(total, 924);
        assert_eq!(sums[0], 21);
        assert_eq!(sums[1], 1_000_000_015);
        assert_eq!(min_sum_at_least(&universe, NumberSet::SIZE, 22), Some(1_000_000_015));
        assert_eq!(next_class(&universe, sums[sums.len() - 1] + 1), None);
    }

    #[test]
    fn test_search_of_huge_universe_is_lazy() {
        let search = search(10_000_000);
        let stats = search.stats();
        assert_eq!(stats.universe_size, 10_000_000);
        assert!(stats.combinations > BigUint::from(u128::MAX));
        assert_eq!(stats.classes_processed, 0);
        drop(search);
    }

    #[test]
    fn test_fixture_universe_finds_both_orders() {
        let found: Vec<SoaisuRingPair> = RingSearch::over(FIXTURE).collect();
        assert_eq!(
            display(&found),
            vec![
                "S1=(5, 14, 34, 45, 36, 16) S2=(6, 10, 29, 44, 40, 21)",
                "S1=(6, 10, 29, 44, 40, 21) S2=(5, 14, 34, 45, 36, 16)",
            ]
        );
    }

    #[test]
    fn test_stats_track_progress() {
        let mut search = RingSearch::over(FIXTURE);
        assert_eq!(search.stats().combinations, BigUint::from(924u32));
        assert_eq!(search.stats().classes_processed, 0);
        let all: Vec<_> = search.by_ref().collect();
        let stats = search.stats();
        assert_eq!(stats.universe_size, 12);
        assert_eq!(stats.ring_pairs, all.len());
        assert_eq!(stats.soaisu_pairs, 2);
        assert_eq!(stats.classes_processed, class_sums(&FIXTURE).len());
    }

    #[test]
    fn test_checkpoint_resume_continues_sequence() {
        let full: Vec<SoaisuRingPair> = RingSearch::over(FIXTURE).collect();

        let mut first = RingSearch::over(FIXTURE);
        let head = first.next();
        assert_eq!(head.as_ref(), full.first());
        let checkpoint = first.checkpoint();
        assert_eq!(checkpoint.sum_class, 150);
        assert_eq!(checkpoint.skip, 1);

        let rest: Vec<SoaisuRingPair> = RingSearch::resume(checkpoint).collect();
        assert_eq!(rest, full[1..].to_vec());
    }

    #[test]
    fn test_checkpoint_before_and_after() {
        let search = RingSearch::over(FIXTURE);
        let fresh = search.checkpoint();
        assert_eq!((fresh.sum_class, fresh.skip), (0, 0));

        let mut done = RingSearch::over(FIXTURE);
        done.by_ref().for_each(drop);
        assert_eq!(RingSearch::resume(done.checkpoint()).count(), 0);
    }

    #[test]
    fn test_checkpoint_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        let checkpoint = SearchCheckpoint {
            universe: FIXTURE.to_vec(),
            sum_class: 150,
            skip: 1,
        };
        checkpoint.save(&path).unwrap();
        assert_eq!(SearchCheckpoint::load(&path).unwrap(), checkpoint);
    }

    #[test]
    fn test_checkpoint_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            SearchCheckpoint::load(&missing),
            Err(SearchError::Io(_))
        ));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{ not json").unwrap();
        assert!(matches!(
            SearchCheckpoint::load(&garbage),
            Err(SearchError::Json(_))
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential: Vec<SoaisuRingPair> = RingSearch::over(FIXTURE).collect();
        let hits = search_hits_parallel(&FIXTURE);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.sum == 150));
        let parallel: Vec<SoaisuRingPair> = hits.into_iter().flat_map(|h| h.rings).collect();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_soaisu_without_ring_is_reported() {
        let mut search = RingSearch::over(RINGLESS);
        assert_eq!(search.next(), None);
        assert_eq!(search.stats().soaisu_pairs, 2);
        assert_eq!(search.stats().ring_pairs, 0);

        let hits = search.take_hits();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.sum == 99 && h.rings.is_empty()));
        assert_eq!(hits[0].pair.s1.to_string(), "{1, 7, 9, 24, 26, 32}");
        assert_eq!(hits[0].pair.s2, hits[1].pair.s1);
        assert!(search.take_hits().is_empty());
    }

    #[test]
    fn test_take_hits_follows_iteration() {
        let mut search = RingSearch::over(FIXTURE);
        assert!(search.take_hits().is_empty());
        search.next();
        let hits = search.take_hits();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rings.len(), 1);
        // The second ring pair comes from the class already taken.
        assert!(search.next().is_some());
        assert!(search.take_hits().is_empty());
    }

    #[test]
    fn test_sequential_hits_match_parallel() {
        assert_eq!(RingSearch::over(FIXTURE).into_hits(), search_hits_parallel(&FIXTURE));
        assert_eq!(RingSearch::over(RINGLESS).into_hits(), search_hits_parallel(&RINGLESS));
    }
}
