//! Deterministic random sampling.
//!
//! Row subsampling ahead of the all-pairs association analysis, and small
//! value samples for column summaries, both need reproducible randomness:
//! the same table and seed must select the same rows on every call.
//!
//! # Example
//!
//! ```
//! use tablescope::sample::sample_indices;
//!
//! let picked = sample_indices(100, 10, 42);
//! assert_eq!(picked.len(), 10);
//! assert_eq!(picked, sample_indices(100, 10, 42));
//! ```

use crate::dataframe::DataFrame;

/// Simple LCG-based random number generator for reproducibility.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Creates a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Returns a uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 33) as f64 / (1u64 << 31) as f64
    }

    /// Returns a uniform index in `[0, n)`. `n` must be nonzero.
    pub fn next_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "cannot draw from an empty range");
        (self.next_f64() * n as f64) as usize % n
    }
}

/// Selects `k` distinct indices from `0..n` uniformly at random, returned
/// in ascending order. When `k >= n` every index is returned.
///
/// Uses a partial Fisher-Yates shuffle, so cost is O(n) memory and O(k)
/// swaps regardless of how small the sample is.
pub fn sample_indices(n: usize, k: usize, seed: u64) -> Vec<usize> {
    if k >= n {
        return (0..n).collect();
    }
    let mut rng = Lcg::new(seed);
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = i + rng.next_index(n - i);
        pool.swap(i, j);
    }
    let mut picked: Vec<usize> = pool[..k].to_vec();
    picked.sort_unstable();
    picked
}

/// Returns a row-subsampled copy of `df` with at most `max_rows` rows,
/// selected uniformly with the given seed. Tables already within the
/// budget are cloned unchanged.
pub fn subsample_rows(df: &DataFrame, max_rows: usize, seed: u64) -> DataFrame {
    let n = df.row_count();
    if n <= max_rows {
        return df.clone();
    }
    log::debug!("subsampling {n} rows down to {max_rows} (seed {seed})");
    let indices = sample_indices(n, max_rows, seed);
    df.take_rows(&indices)
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::{Column, ValidityBitmap};

    #[test]
    fn lcg_is_deterministic() {
        let mut a = Lcg::new(7);
        let mut b = Lcg::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn lcg_stays_in_unit_interval() {
        let mut rng = Lcg::new(123);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn sample_indices_distinct_and_sorted() {
        let picked = sample_indices(1000, 50, 42);
        assert_eq!(picked.len(), 50);
        for w in picked.windows(2) {
            assert!(w[0] < w[1], "indices must be strictly ascending");
        }
        assert!(picked.iter().all(|&i| i < 1000));
    }

    #[test]
    fn sample_indices_full_when_k_exceeds_n() {
        let picked = sample_indices(5, 10, 0);
        assert_eq!(picked, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn sample_indices_same_seed_same_sample() {
        assert_eq!(sample_indices(500, 20, 9), sample_indices(500, 20, 9));
    }

    #[test]
    fn sample_indices_seed_changes_sample() {
        // Not guaranteed in general, but overwhelmingly likely for these sizes.
        assert_ne!(sample_indices(5000, 100, 1), sample_indices(5000, 100, 2));
    }

    #[test]
    fn subsample_small_table_unchanged() {
        let mut df = DataFrame::new();
        df.add_column(
            "x".to_string(),
            Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
        )
        .unwrap();
        let sub = subsample_rows(&df, 100, 42);
        assert_eq!(sub.row_count(), 3);
        assert_eq!(sub.column_by_name("x").unwrap().as_numeric().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn subsample_caps_rows() {
        let mut df = DataFrame::new();
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        df.add_column(
            "x".to_string(),
            Column::numeric(values, ValidityBitmap::all_valid(100)),
        )
        .unwrap();
        let sub = subsample_rows(&df, 10, 42);
        assert_eq!(sub.row_count(), 10);
        assert_eq!(sub.column_count(), 1);
        // sampled rows preserve original values
        let kept = sub.column(0).unwrap().as_numeric().unwrap().to_vec();
        assert!(kept.iter().all(|v| (0.0..100.0).contains(v)));
    }
}
