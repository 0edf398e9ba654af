//! Sweep-and-prune broad phase
//!
//! Bubble counts reach the tens of thousands, so bubble-bubble detection
//! cannot afford the O(n²) scan the cat loops get away with. Each entity is
//! projected onto the x axis as a `[center - r, center + r]` interval and
//! the entity indices are sorted by interval lower bound; only pairs whose
//! intervals overlap are surfaced to the narrow phase.
//!
//! The sort is an insertion sort seeded with the previous tick's ordering.
//! Entities barely move between ticks, so the permutation is already almost
//! sorted and the per-tick cost stays near linear. Clustering many entities
//! at the same x degrades toward O(n²); the caller mitigates that by culling
//! far-offscreen entities before populating.

use std::ops::Range;

use glam::Vec2;
use rayon::ThreadPool;

/// Anything with a center and a collision radius can be indexed.
pub trait BoundingCircle {
    fn center(&self) -> Vec2;
    fn radius(&self) -> f32;
}

/// Per-entity projection onto the sweep axis
#[derive(Debug, Clone, Copy)]
struct Interval {
    min: f32,
    max: f32,
}

/// Broad-phase index over one tick's entities.
///
/// Lifecycle per tick: [`clear`](Self::clear), [`populate`](Self::populate),
/// then one of the pair enumerations. Entity indices must stay stable (no
/// insertion or removal in the source slice) between `populate` and
/// enumeration. That is the caller's contract, checked by debug assertion
/// only.
#[derive(Debug, Default)]
pub struct SweepPrune {
    intervals: Vec<Interval>,
    /// Entity indices sorted by interval lower bound. Survives `clear` as a
    /// warm start for the insertion sort; carries no observable state.
    order: Vec<usize>,
}

impl SweepPrune {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the current tick's intervals. The sort permutation is retained:
    /// re-sorting last tick's order is what keeps the insertion sort cheap.
    pub fn clear(&mut self) {
        self.intervals.clear();
    }

    /// Record a bounding interval for every entity in the slice and restore
    /// the sorted order. The entity count may differ from the previous tick.
    pub fn populate<T: BoundingCircle>(&mut self, entities: &[T]) {
        debug_assert!(self.intervals.is_empty(), "populate called without clear");

        self.intervals.extend(entities.iter().map(|entity| {
            let center = entity.center();
            let radius = entity.radius();
            Interval {
                min: center.x - radius,
                max: center.x + radius,
            }
        }));

        // Reconcile the warm-start permutation with the new count: stale
        // indices out, new entities appended. Survivors keep their relative
        // order, so the permutation stays almost sorted.
        let count = self.intervals.len();
        self.order.retain(|&idx| idx < count);
        for idx in self.order.len()..count {
            self.order.push(idx);
        }

        sort_by_lower_bound(&mut self.order, &self.intervals);
    }

    /// Number of indexed entities
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Invoke `f` exactly once for every unordered pair of entity indices
    /// whose x intervals overlap. Zero or one entities yield no pairs.
    pub fn for_each_unique_pair(&self, mut f: impl FnMut(usize, usize)) {
        self.scan_range(0..self.order.len(), &mut f);
    }

    /// Scan one contiguous range of sorted positions, reporting each pair at
    /// the lower sorted position of its two members. Disjoint ranges
    /// therefore never report the same pair twice, which is what makes
    /// [`partition`](Self::partition)-based chunking safe.
    pub fn scan_range(&self, positions: Range<usize>, f: &mut impl FnMut(usize, usize)) {
        debug_assert_eq!(
            self.order.len(),
            self.intervals.len(),
            "pair enumeration requires populate after clear"
        );

        for position in positions {
            let i = self.order[position];
            let i_max = self.intervals[i].max;

            // Intervals are sorted by lower bound: once one starts past
            // i's upper bound, every later one does too.
            for &j in &self.order[position + 1..] {
                if self.intervals[j].min > i_max {
                    break;
                }
                f(i, j);
            }
        }
    }

    /// Split the sorted order into at most `worker_count` contiguous ranges
    /// of near-equal size. Ranges are disjoint and cover every position.
    pub fn partition(&self, worker_count: usize) -> Vec<Range<usize>> {
        let count = self.order.len();
        if count == 0 {
            return Vec::new();
        }
        let workers = worker_count.clamp(1, count);
        let chunk = count.div_ceil(workers);
        (0..count)
            .step_by(chunk)
            .map(|start| start..(start + chunk).min(count))
            .collect()
    }

    /// Enumerate overlapping pairs across `worker_count` workers on `pool`,
    /// blocking until every callback has run. Callback invocation order is
    /// unspecified and may differ between runs; the index itself is
    /// read-only for the duration. `f` must handle concurrent invocation;
    /// callers that want plain mutable accumulation should instead map over
    /// [`partition`](Self::partition) with [`scan_range`](Self::scan_range)
    /// and merge per-chunk results.
    pub fn par_for_each_unique_pair<F>(&self, pool: &ThreadPool, worker_count: usize, f: F)
    where
        F: Fn(usize, usize) + Sync,
    {
        let ranges = self.partition(worker_count);
        pool.scope(|scope| {
            for range in ranges {
                let f = &f;
                scope.spawn(move |_| {
                    self.scan_range(range, &mut |i, j| f(i, j));
                });
            }
        });
    }
}

/// Insertion sort of entity indices by interval lower bound. Quadratic in
/// the worst case, near-linear on the almost-sorted permutations this index
/// sees tick to tick.
fn sort_by_lower_bound(order: &mut [usize], intervals: &[Interval]) {
    for i in 1..order.len() {
        let mut j = i;
        while j > 0 && intervals[order[j]].min < intervals[order[j - 1]].min {
            order.swap(j, j - 1);
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Circle {
        pos: Vec2,
        radius: f32,
    }

    impl BoundingCircle for Circle {
        fn center(&self) -> Vec2 {
            self.pos
        }

        fn radius(&self) -> f32 {
            self.radius
        }
    }

    fn circle(x: f32, radius: f32) -> Circle {
        Circle {
            pos: Vec2::new(x, 0.0),
            radius,
        }
    }

    fn collect_pairs(index: &SweepPrune) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        index.for_each_unique_pair(|i, j| {
            let key = if i < j { (i, j) } else { (j, i) };
            assert!(pairs.insert(key), "pair {key:?} reported twice");
        });
        pairs
    }

    /// Reference O(n²) interval-overlap check
    fn brute_force_pairs(circles: &[Circle]) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        for i in 0..circles.len() {
            for j in (i + 1)..circles.len() {
                let (a_min, a_max) = (circles[i].pos.x - circles[i].radius, circles[i].pos.x + circles[i].radius);
                let (b_min, b_max) = (circles[j].pos.x - circles[j].radius, circles[j].pos.x + circles[j].radius);
                if a_min <= b_max && b_min <= a_max {
                    pairs.insert((i, j));
                }
            }
        }
        pairs
    }

    fn random_field(rng: &mut Pcg32, count: usize) -> Vec<Circle> {
        (0..count)
            .map(|_| Circle {
                pos: Vec2::new(rng.random_range(0.0..2000.0), rng.random_range(0.0..1000.0)),
                radius: rng.random_range(1.0..50.0),
            })
            .collect()
    }

    #[test]
    fn test_empty_and_singleton_yield_no_pairs() {
        let mut index = SweepPrune::new();
        index.clear();
        index.populate::<Circle>(&[]);
        assert!(collect_pairs(&index).is_empty());

        index.clear();
        index.populate(&[circle(0.0, 5.0)]);
        assert!(collect_pairs(&index).is_empty());
    }

    #[test]
    fn test_isolated_circle_is_not_paired() {
        // Intervals [-3,3], [2,8], [97,103]: only the first two overlap
        let mut index = SweepPrune::new();
        index.clear();
        index.populate(&[circle(0.0, 3.0), circle(5.0, 3.0), circle(100.0, 3.0)]);

        let pairs = collect_pairs(&index);
        assert_eq!(pairs.len(), 1);
        assert!(pairs.contains(&(0, 1)));
    }

    #[test]
    fn test_matches_brute_force_on_random_fields() {
        let mut rng = Pcg32::seed_from_u64(0x5EED);
        for count in [2, 17, 200, 500] {
            let circles = random_field(&mut rng, count);
            let mut index = SweepPrune::new();
            index.clear();
            index.populate(&circles);
            assert_eq!(index.len(), circles.len());
            assert_eq!(collect_pairs(&index), brute_force_pairs(&circles));
        }
    }

    #[test]
    fn test_warm_started_repopulation_stays_correct() {
        let mut rng = Pcg32::seed_from_u64(42);
        let mut circles = random_field(&mut rng, 300);
        let mut index = SweepPrune::new();

        // Simulate several ticks: small coherent movement plus churn in the
        // entity count, re-sorting from the previous permutation each time.
        for tick in 0..10 {
            for c in &mut circles {
                c.pos.x += rng.random_range(-5.0..5.0);
            }
            if tick % 3 == 0 {
                circles.truncate(circles.len() - 20);
            } else {
                circles.extend(random_field(&mut rng, 15));
            }

            index.clear();
            index.populate(&circles);
            assert_eq!(collect_pairs(&index), brute_force_pairs(&circles));
        }
    }

    #[test]
    fn test_clear_leaks_no_state_between_ticks() {
        let mut index = SweepPrune::new();
        index.clear();
        index.populate(&[circle(0.0, 10.0), circle(5.0, 10.0), circle(8.0, 10.0)]);
        assert_eq!(collect_pairs(&index).len(), 3);

        // A fresh index over the second field must agree with the reused one
        let next_field = [circle(0.0, 1.0), circle(100.0, 1.0)];
        index.clear();
        index.populate(&next_field);

        let mut fresh = SweepPrune::new();
        fresh.clear();
        fresh.populate(&next_field);

        assert_eq!(collect_pairs(&index), collect_pairs(&fresh));
        assert!(collect_pairs(&index).is_empty());
    }

    #[test]
    fn test_partition_covers_all_positions_disjointly() {
        let mut rng = Pcg32::seed_from_u64(7);
        let circles = random_field(&mut rng, 100);
        let mut index = SweepPrune::new();
        index.clear();
        index.populate(&circles);

        for workers in [1, 3, 7, 100, 1000] {
            let ranges = index.partition(workers);
            assert!(ranges.len() <= workers);

            let mut covered = vec![false; circles.len()];
            for range in ranges {
                for position in range {
                    assert!(!covered[position], "position {position} in two ranges");
                    covered[position] = true;
                }
            }
            assert!(covered.iter().all(|&c| c));
        }
    }

    #[test]
    fn test_parallel_enumeration_matches_serial() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .expect("test pool");

        let mut rng = Pcg32::seed_from_u64(0xCA75);
        let circles = random_field(&mut rng, 400);
        let mut index = SweepPrune::new();
        index.clear();
        index.populate(&circles);

        let parallel_pairs = Mutex::new(BTreeSet::new());
        index.par_for_each_unique_pair(&pool, 4, |i, j| {
            let key = if i < j { (i, j) } else { (j, i) };
            let inserted = parallel_pairs.lock().expect("lock").insert(key);
            assert!(inserted, "pair {key:?} reported twice");
        });

        assert_eq!(parallel_pairs.into_inner().expect("lock"), collect_pairs(&index));
    }
}
