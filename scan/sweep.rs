// ========================================================================================
//
//                      The sweeps: bounded fork-join tree traversals
//
// ========================================================================================
//
// Both sweeps are plain recursions over the implicit tree. Near the root, where each
// subtree is large, one child is forked as a concurrent task and the other runs on
// the calling thread; the caller joins before it touches the children's results.
// From depth `fork_depth` downward the recursion is sequential, which caps the number
// of live branches at 2^fork_depth.
//
// Race freedom comes from disjointness, not locks:
//   - The up-sweep writes each interior slot from exactly one task, the one that owns
//     that node's subtree.
//   - The down-sweep hands every subtree the contiguous run of output cells that holds
//     its own leaves, so two tasks can never even name the same cell.

use crate::config::{ForkMode, ScanConfig};
use crate::index::{HeapIndex, ROOT};
use crate::store::{PartialSums, PendingSums};
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Runs `inline` on the calling thread and `forked` as a concurrent task, returning
/// only after both are complete. A panic in either branch resumes in the caller.
pub fn fork_join<A, B>(mode: ForkMode, inline: A, forked: B)
where
    A: FnOnce() + Send,
    B: FnOnce() + Send,
{
    match mode {
        // `rayon::join` runs its first closure in place and offers the second to
        // idle workers.
        ForkMode::Pool => {
            rayon::join(inline, forked);
        }
        ForkMode::Spawn => thread::scope(|s| {
            let handle = s.spawn(forked);
            inline();
            if let Err(payload) = handle.join() {
                panic::resume_unwind(payload);
            }
        }),
    }
}

/// Fork accounting for one sweep.
///
/// `forks` is the number of branches handed to `fork_join`. `peak_in_flight` is the
/// largest number of forked branches that were outstanding at the same moment, which
/// never exceeds `2^fork_depth - 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub forks: usize,
    pub peak_in_flight: usize,
}

#[derive(Default)]
struct ForkCounter {
    forks: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ForkCounter {
    fn enter(&self) {
        self.forks.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak.fetch_max(now, Ordering::Relaxed);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    fn into_stats(self) -> SweepStats {
        SweepStats {
            forks: self.forks.into_inner(),
            peak_in_flight: self.peak.into_inner(),
        }
    }
}

// ========================================================================================
//                                      Up-sweep
// ========================================================================================

/// Fills every interior slot with the sum of its subtree's leaves.
pub fn up_sweep(
    index: HeapIndex,
    input: &[i64],
    pending: &PendingSums,
    config: &ScanConfig,
) -> SweepStats {
    let sweep = UpSweep {
        index,
        input,
        pending,
        fork_depth: config.fork_depth,
        mode: config.fork_mode,
        counter: ForkCounter::default(),
    };
    sweep.sum(ROOT, 0);
    sweep.counter.into_stats()
}

struct UpSweep<'a> {
    index: HeapIndex,
    input: &'a [i64],
    pending: &'a PendingSums,
    fork_depth: usize,
    mode: ForkMode,
    counter: ForkCounter,
}

impl UpSweep<'_> {
    #[inline(always)]
    fn value(&self, node: usize) -> i64 {
        if self.index.is_interior(node) {
            self.pending.read(node)
        } else {
            self.input[self.index.leaf_position(node)]
        }
    }

    fn sum(&self, node: usize, depth: usize) {
        if self.index.is_leaf(node) {
            return;
        }
        let left = self.index.left(node);
        let right = self.index.right(node);

        if depth < self.fork_depth {
            self.counter.enter();
            fork_join(
                self.mode,
                || self.sum(right, depth + 1),
                || self.sum(left, depth + 1),
            );
            self.counter.leave();
        } else {
            self.sum(left, depth + 1);
            self.sum(right, depth + 1);
        }

        // Both children are resolved: either they ran here, or their task was joined.
        self.pending
            .write(node, self.value(left).wrapping_add(self.value(right)));
    }
}

// ========================================================================================
//                                     Down-sweep
// ========================================================================================

/// Writes the inclusive prefix sum of `input` into `output`.
///
/// `sums` must be the frozen result of `up_sweep` over the same `input`, and
/// `output.len()` must equal `index.leaves()`.
pub fn down_sweep(
    index: HeapIndex,
    input: &[i64],
    sums: &PartialSums,
    config: &ScanConfig,
    output: &mut [i64],
) -> SweepStats {
    let sweep = DownSweep {
        index,
        input,
        sums,
        fork_depth: config.fork_depth,
        mode: config.fork_mode,
        counter: ForkCounter::default(),
    };
    sweep.prefix(ROOT, 0, 0, output);
    sweep.counter.into_stats()
}

struct DownSweep<'a> {
    index: HeapIndex,
    input: &'a [i64],
    sums: &'a PartialSums,
    fork_depth: usize,
    mode: ForkMode,
    counter: ForkCounter,
}

impl DownSweep<'_> {
    #[inline(always)]
    fn value(&self, node: usize) -> i64 {
        if self.index.is_interior(node) {
            self.sums.get(node)
        } else {
            self.input[self.index.leaf_position(node)]
        }
    }

    /// `offset` is the sum of every input element left of this subtree; `out` is
    /// exactly the run of output cells under it.
    fn prefix(&self, node: usize, offset: i64, depth: usize, out: &mut [i64]) {
        if self.index.is_leaf(node) {
            debug_assert_eq!(out.len(), 1, "leaf {node} must own exactly one cell");
            out[0] = offset.wrapping_add(self.value(node));
            return;
        }
        let left = self.index.left(node);
        let right = self.index.right(node);
        let right_offset = offset.wrapping_add(self.value(left));
        let (left_out, right_out) = out.split_at_mut(out.len() / 2);

        if depth < self.fork_depth {
            self.counter.enter();
            fork_join(
                self.mode,
                move || self.prefix(right, right_offset, depth + 1, right_out),
                move || self.prefix(left, offset, depth + 1, left_out),
            );
            self.counter.leave();
        } else {
            self.prefix(left, offset, depth + 1, left_out);
            self.prefix(right, right_offset, depth + 1, right_out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with_stats(
        input: &[i64],
        config: &ScanConfig,
    ) -> ((Vec<i64>, Vec<i64>), (SweepStats, SweepStats)) {
        let index = HeapIndex::new(input.len());
        let pending = PendingSums::zeroed(index.interior_len());
        let up = up_sweep(index, input, &pending, config);
        let sums = pending.freeze();
        let mut output = vec![0; input.len()];
        let down = down_sweep(index, input, &sums, config, &mut output);
        ((sums.as_slice().to_vec(), output), (up, down))
    }

    fn run(input: &[i64], config: &ScanConfig) -> (Vec<i64>, Vec<i64>) {
        run_with_stats(input, config).0
    }

    #[test]
    fn up_sweep_stores_subtree_totals() {
        let (sums, output) = run(&[3, 1, 4, 1], &ScanConfig::sequential());
        assert_eq!(sums, vec![9, 4, 5]);
        assert_eq!(output, vec![3, 4, 8, 9]);
    }

    #[test]
    fn both_fork_modes_agree_with_sequential() {
        let input: Vec<i64> = (0..64).map(|v| v * 7 - 100).collect();
        let expected = run(&input, &ScanConfig::sequential());
        for mode in [ForkMode::Pool, ForkMode::Spawn] {
            for depth in 0..=7 {
                let config = ScanConfig::sequential()
                    .with_fork_depth(depth)
                    .with_fork_mode(mode);
                assert_eq!(run(&input, &config), expected, "{mode:?} at depth {depth}");
            }
        }
    }

    #[test]
    fn zero_depth_never_forks() {
        let input: Vec<i64> = (1..=256).collect();
        for mode in [ForkMode::Pool, ForkMode::Spawn] {
            let config = ScanConfig::sequential().with_fork_mode(mode);
            let (up, down) = run_with_stats(&input, &config).1;
            assert_eq!(up, SweepStats::default(), "{mode:?}");
            assert_eq!(down, SweepStats::default(), "{mode:?}");
        }
    }

    #[test]
    fn forks_stop_at_the_depth_threshold() {
        let input: Vec<i64> = (1..=256).collect();
        let tree_depth = HeapIndex::new(input.len()).depth();
        for mode in [ForkMode::Pool, ForkMode::Spawn] {
            for fork_depth in 1..=10 {
                let config = ScanConfig::sequential()
                    .with_fork_depth(fork_depth)
                    .with_fork_mode(mode);
                let bound = (1usize << fork_depth.min(tree_depth)) - 1;
                let (up, down) = run_with_stats(&input, &config).1;
                for stats in [up, down] {
                    assert_eq!(stats.forks, bound, "{mode:?} at depth {fork_depth}");
                    assert!(stats.peak_in_flight >= 1, "{mode:?} at depth {fork_depth}");
                    assert!(
                        stats.peak_in_flight <= bound,
                        "{mode:?} at depth {fork_depth}: {} in flight",
                        stats.peak_in_flight
                    );
                }
            }
        }
    }

    #[test]
    fn overflow_wraps_instead_of_aborting() {
        let (sums, output) = run(&[i64::MAX, 1], &ScanConfig::sequential());
        assert_eq!(sums, vec![i64::MIN]);
        assert_eq!(output, vec![i64::MAX, i64::MIN]);
    }

    #[test]
    #[should_panic(expected = "forked branch failed")]
    fn spawned_panic_reaches_the_joiner() {
        fork_join(ForkMode::Spawn, || {}, || panic!("forked branch failed"));
    }

    #[test]
    #[should_panic(expected = "forked branch failed")]
    fn pooled_panic_reaches_the_joiner() {
        fork_join(ForkMode::Pool, || {}, || panic!("forked branch failed"));
    }
}
