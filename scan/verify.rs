//! Sequential reference scan and result validation.
//!
//! The tree sweeps are checked against a single left-to-right pass that follows the
//! same wrapping arithmetic, so the two must agree bit for bit.

/// Inclusive prefix sum in one sequential pass: `output[i] = input[0] + .. + input[i]`.
///
/// Only the first `min(input.len(), output.len())` cells are written.
pub fn prefix_sums_sequential(input: &[i64], output: &mut [i64]) {
    let mut running = 0i64;
    for (out, &value) in output.iter_mut().zip(input) {
        running = running.wrapping_add(value);
        *out = running;
    }
}

/// Position of the first element of `prefix` that is not the inclusive prefix sum
/// of `input`, or `None` if every element checks out.
///
/// A length difference counts as a mismatch at the shorter length.
pub fn first_mismatch(input: &[i64], prefix: &[i64]) -> Option<usize> {
    let mut running = 0i64;
    for (i, (&value, &got)) in input.iter().zip(prefix).enumerate() {
        running = running.wrapping_add(value);
        if got != running {
            return Some(i);
        }
    }
    if input.len() == prefix.len() {
        None
    } else {
        Some(input.len().min(prefix.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_scan_of_small_input() {
        let mut out = [0i64; 5];
        prefix_sums_sequential(&[1, 2, 3, 4, 5], &mut out);
        assert_eq!(out, [1, 3, 6, 10, 15]);
    }

    #[test]
    fn mismatch_reports_first_bad_position() {
        assert_eq!(first_mismatch(&[1, 1, 1, 1], &[1, 2, 3, 4]), None);
        assert_eq!(first_mismatch(&[1, 1, 1, 1], &[1, 2, 4, 4]), Some(2));
        assert_eq!(first_mismatch(&[1, 1, 1, 1], &[1, 2]), Some(2));
        assert_eq!(first_mismatch(&[], &[]), None);
    }
}
