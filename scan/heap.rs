// ========================================================================================
//
//                      The sum heap: the public face of the engine
//
// ========================================================================================
//
// A `SumHeap` borrows the caller's input, owns the interior partial sums, and nothing
// else. Construction validates the length and runs the up-sweep eagerly, so once a
// heap exists its totals are final. Prefix sums can then be produced any number of
// times into buffers the caller supplies.

use crate::config::ScanConfig;
use crate::index::{HeapIndex, ROOT};
use crate::store::{PartialSums, PendingSums};
use crate::sweep;
use crate::types::ScanError;
use std::time::Instant;

#[derive(Debug)]
pub struct SumHeap<'a> {
    input: &'a [i64],
    index: HeapIndex,
    sums: PartialSums,
    config: ScanConfig,
}

impl<'a> SumHeap<'a> {
    /// Builds a heap with the default configuration.
    pub fn new(input: &'a [i64]) -> Result<Self, ScanError> {
        Self::with_config(input, ScanConfig::default())
    }

    /// Builds a heap over `input` and computes every subtree sum.
    ///
    /// Fails with `ScanError::NotPowerOfTwo` unless the length is a non-zero power of
    /// two; nothing is allocated or traversed in that case.
    pub fn with_config(input: &'a [i64], config: ScanConfig) -> Result<Self, ScanError> {
        if !input.len().is_power_of_two() {
            return Err(ScanError::NotPowerOfTwo(input.len()));
        }
        let index = HeapIndex::new(input.len());

        let start = Instant::now();
        let pending = PendingSums::zeroed(index.interior_len());
        let stats = sweep::up_sweep(index, input, &pending, &config);
        let sums = pending.freeze();
        log::debug!(
            "Up-sweep over {} leaves (fork depth {}, {:?}) took {:.3?}; {} forks, peak {} in flight",
            index.leaves(),
            config.fork_depth,
            config.fork_mode,
            start.elapsed(),
            stats.forks,
            stats.peak_in_flight
        );

        Ok(Self {
            input,
            index,
            sums,
            config,
        })
    }

    /// Total of all input elements.
    pub fn sum(&self) -> i64 {
        self.value(ROOT)
    }

    /// Sum of the leaves under `node`, or `None` if `node` is outside the tree.
    pub fn node_sum(&self, node: usize) -> Option<i64> {
        (node < self.index.size()).then(|| self.value(node))
    }

    /// Writes the inclusive prefix sums of the input into `output`.
    ///
    /// The length is checked before any work is done.
    pub fn prefix_sums(&self, output: &mut [i64]) -> Result<(), ScanError> {
        if output.len() != self.input.len() {
            return Err(ScanError::LengthMismatch {
                expected: self.input.len(),
                found: output.len(),
            });
        }
        self.run_down_sweep(output);
        Ok(())
    }

    /// Allocates a fresh output buffer and fills it with the prefix sums.
    pub fn prefix_sums_vec(&self) -> Vec<i64> {
        let mut output = vec![0; self.input.len()];
        self.run_down_sweep(&mut output);
        output
    }

    /// `output.len()` must already equal the input length.
    fn run_down_sweep(&self, output: &mut [i64]) {
        let start = Instant::now();
        let stats = sweep::down_sweep(self.index, self.input, &self.sums, &self.config, output);
        log::debug!(
            "Down-sweep over {} leaves (fork depth {}, {:?}) took {:.3?}; {} forks, peak {} in flight",
            self.index.leaves(),
            self.config.fork_depth,
            self.config.fork_mode,
            start.elapsed(),
            stats.forks,
            stats.peak_in_flight
        );
    }

    /// Every node of the flat index space with its value, interior nodes first.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        (0..self.index.size()).map(|node| (node, self.value(node)))
    }

    /// Number of input elements.
    pub fn leaves(&self) -> usize {
        self.index.leaves()
    }

    pub fn index(&self) -> HeapIndex {
        self.index
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Panics if `node` is outside the tree.
    #[inline(always)]
    fn value(&self, node: usize) -> i64 {
        if self.index.is_interior(node) {
            self.sums.get(node)
        } else {
            self.input[self.index.leaf_position(node)]
        }
    }
}
