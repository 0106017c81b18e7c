//! Pairwise column associations.
//!
//! Scores every unordered pair of columns with Cramér's V computed over
//! discretized values, then ranks the strongest pairs. The score is
//! symmetric and bounded to `[0, 1]` (1.0 = perfect association), and it
//! is defined for mixed-type pairs: continuous columns are reduced to
//! equal-frequency bins, strings to dictionary codes, booleans to two
//! codes, and missing values form their own level.
//!
//! Cost is bounded by subsampling the table before the all-pairs pass:
//! each pair is O(rows), and the pair count is O(columns²).
//!
//! # Example
//!
//! ```
//! use tablescope::associations::{top_associations, AssociationConfig};
//! use tablescope::dataframe::{DataFrame, Column, ValidityBitmap};
//!
//! let mut df = DataFrame::new();
//! let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
//! df.add_column(
//!     "a".to_string(),
//!     Column::numeric(values.clone(), ValidityBitmap::all_valid(100)),
//! ).unwrap();
//! df.add_column(
//!     "b".to_string(),
//!     Column::numeric(values, ValidityBitmap::all_valid(100)),
//! ).unwrap();
//!
//! let ranked = top_associations(&df, &AssociationConfig::default());
//! assert_eq!(ranked[0].left_column, "a");
//! assert_eq!(ranked[0].right_column, "b");
//! assert!(ranked[0].score > 0.99);
//! ```

use serde::Serialize;

use crate::dataframe::{Column, DataFrame};
use crate::sample::subsample_rows;

/// Number of equal-frequency bins used to discretize continuous columns.
const N_BINS: usize = 10;

/// Configuration for the association analysis.
#[derive(Debug, Clone)]
pub struct AssociationConfig {
    /// Maximum rows scored; larger tables are subsampled. Default: 3000.
    pub subsample_size: usize,
    /// Seed for the deterministic subsample. Default: 42.
    pub subsample_seed: u64,
    /// Number of top-ranked pairs kept before the floor filter. Default: 20.
    pub top_k: usize,
    /// Minimum score a reported pair must exceed. Default: 0.2.
    pub floor: f64,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            subsample_size: 3000,
            subsample_seed: 42,
            top_k: 20,
            floor: 0.2,
        }
    }
}

/// A scored pair of distinct columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnAssociation {
    /// First column name (earlier in column order).
    pub left_column: String,
    /// Second column name.
    pub right_column: String,
    /// Cramér's V, in `[0, 1]`.
    pub score: f64,
}

/// Computes the ranked association table for a DataFrame.
///
/// Every unordered pair of distinct columns is scored exactly once; the
/// ranked list is truncated to `top_k` and then filtered to scores above
/// `floor`, in that order, so the reported head of the ranking is stable
/// even when many pairs clear the floor. Pairs whose score cannot be
/// computed (constant or entirely-null columns) contribute 0.0 and are
/// dropped by the floor filter rather than aborting the analysis.
pub fn top_associations(df: &DataFrame, config: &AssociationConfig) -> Vec<ColumnAssociation> {
    let n_cols = df.column_count();
    if n_cols < 2 {
        return Vec::new();
    }

    let sub = subsample_rows(df, config.subsample_size, config.subsample_seed);
    let encoded: Vec<Encoded> = (0..n_cols)
        .map(|i| encode_column(sub.column(i).expect("column index in range")))
        .collect();

    let mut scored: Vec<(usize, usize, f64)> = Vec::with_capacity(n_cols * (n_cols - 1) / 2);
    for i in 0..n_cols {
        for j in (i + 1)..n_cols {
            scored.push((i, j, pair_score(&encoded[i], &encoded[j])));
        }
    }
    log::debug!(
        "scored {} column pairs over {} rows",
        scored.len(),
        sub.row_count()
    );

    let names = df.column_names();
    rank_scored(scored, config.top_k, config.floor)
        .into_iter()
        .map(|(i, j, score)| ColumnAssociation {
            left_column: names[i].clone(),
            right_column: names[j].clone(),
            score,
        })
        .collect()
}

/// Ranks raw pair scores: descending by score (ties broken by pair
/// position for determinism), truncated to `top_k`, then filtered to
/// scores strictly above `floor`.
pub(crate) fn rank_scored(
    mut scored: Vec<(usize, usize, f64)>,
    top_k: usize,
    floor: f64,
) -> Vec<(usize, usize, f64)> {
    scored.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
    });
    scored.truncate(top_k);
    scored.retain(|&(_, _, score)| score > floor);
    scored
}

// ── Discretization ────────────────────────────────────────────────────

/// A column reduced to dense discrete codes.
struct Encoded {
    /// One code per row, in `0..n_levels`.
    codes: Vec<u32>,
    /// Number of distinct levels (occupied bins plus a null level when
    /// the column has missing values).
    n_levels: usize,
}

/// Discretizes a column of any type into dense codes.
fn encode_column(col: &Column) -> Encoded {
    let raw: Vec<Option<u32>> = match col {
        Column::Numeric { values, validity } => {
            let keyed: Vec<Option<f64>> = (0..col.len())
                .map(|i| {
                    if validity.is_valid(i) && values[i].is_finite() {
                        Some(values[i])
                    } else {
                        None
                    }
                })
                .collect();
            rank_bins(&keyed)
        }
        Column::Datetime { values, validity } => {
            let keyed: Vec<Option<f64>> = (0..col.len())
                .map(|i| validity.is_valid(i).then(|| values[i] as f64))
                .collect();
            rank_bins(&keyed)
        }
        Column::Boolean { values, validity } => (0..col.len())
            .map(|i| validity.is_valid(i).then(|| u32::from(values[i])))
            .collect(),
        Column::Categorical {
            indices, validity, ..
        } => (0..col.len())
            .map(|i| validity.is_valid(i).then(|| indices[i]))
            .collect(),
        Column::Text { values, validity } => {
            let mut seen: std::collections::HashMap<&str, u32> = std::collections::HashMap::new();
            (0..col.len())
                .map(|i| {
                    validity.is_valid(i).then(|| {
                        let next = seen.len() as u32;
                        *seen.entry(values[i].as_str()).or_insert(next)
                    })
                })
                .collect()
        }
    };
    compact(raw)
}

/// Assigns equal-frequency bins by rank. Equal values always share a bin,
/// so a constant column collapses to a single level instead of being
/// spread across bins by row position.
fn rank_bins(values: &[Option<f64>]) -> Vec<Option<u32>> {
    let mut indexed: Vec<(usize, f64)> = (0..values.len())
        .filter_map(|i| values[i].map(|v| (i, v)))
        .collect();
    let n_valid = indexed.len();
    let mut bins = vec![None; values.len()];
    if n_valid == 0 {
        return bins;
    }
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut prev_value = f64::NAN;
    let mut prev_bin = 0u32;
    for (rank, &(orig_idx, value)) in indexed.iter().enumerate() {
        let bin = if value == prev_value {
            prev_bin
        } else {
            ((rank * N_BINS / n_valid).min(N_BINS - 1)) as u32
        };
        bins[orig_idx] = Some(bin);
        prev_value = value;
        prev_bin = bin;
    }
    bins
}

/// Remaps raw codes to a dense `0..k` range and appends a null level when
/// missing values are present. Dense codes guarantee every contingency
/// row and column is occupied.
fn compact(raw: Vec<Option<u32>>) -> Encoded {
    let mut used: Vec<u32> = raw.iter().flatten().copied().collect();
    used.sort_unstable();
    used.dedup();
    let remap: std::collections::HashMap<u32, u32> = used
        .iter()
        .enumerate()
        .map(|(dense, &code)| (code, dense as u32))
        .collect();

    let has_null = raw.iter().any(|c| c.is_none());
    let null_code = used.len() as u32;
    let codes: Vec<u32> = raw
        .into_iter()
        .map(|c| c.map_or(null_code, |code| remap[&code]))
        .collect();

    Encoded {
        codes,
        n_levels: used.len() + usize::from(has_null),
    }
}

// ── Scoring ───────────────────────────────────────────────────────────

/// Scores one pair of encoded columns; degenerate pairs score 0.0.
fn pair_score(a: &Encoded, b: &Encoded) -> f64 {
    if a.n_levels < 2 || b.n_levels < 2 {
        return 0.0;
    }
    let mut table = vec![0.0f64; a.n_levels * b.n_levels];
    for (&ca, &cb) in a.codes.iter().zip(b.codes.iter()) {
        table[ca as usize * b.n_levels + cb as usize] += 1.0;
    }
    cramers_v(&table, a.n_levels, b.n_levels).unwrap_or(0.0)
}

/// Computes Cramér's V for a contingency table of observed frequencies.
///
/// V = sqrt(χ² / (n * min(r-1, c-1))), clamped to `[0, 1]`.
///
/// Reference: Cramér (1946). "Mathematical Methods of Statistics."
///
/// Returns `None` if the table is invalid (< 2 rows/cols, zero total, or
/// a failed chi-squared computation).
pub fn cramers_v(table: &[f64], n_rows: usize, n_cols: usize) -> Option<f64> {
    let test = u_analytics::testing::chi_squared_independence(table, n_rows, n_cols)?;

    let n: f64 = table.iter().sum();
    if n <= 0.0 {
        return None;
    }

    let k = n_rows.min(n_cols);
    if k < 2 {
        return None;
    }

    let denom = n * (k - 1) as f64;
    if denom <= 0.0 {
        return None;
    }
    Some((test.statistic / denom).sqrt().clamp(0.0, 1.0))
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::{DataFrame, ValidityBitmap};

    fn numeric_df(columns: &[(&str, Vec<f64>)]) -> DataFrame {
        let mut df = DataFrame::new();
        for (name, values) in columns {
            let n = values.len();
            df.add_column(
                (*name).to_string(),
                Column::numeric(values.clone(), ValidityBitmap::all_valid(n)),
            )
            .unwrap();
        }
        df
    }

    // ── Cramér's V ──────────────────────────────────────────────

    #[test]
    fn cramers_v_perfect_association() {
        // 2x2: perfectly associated
        let table = [50.0, 0.0, 0.0, 50.0];
        let v = cramers_v(&table, 2, 2).unwrap();
        assert!(v > 0.9, "V should be near 1.0: {v}");
    }

    #[test]
    fn cramers_v_no_association() {
        // 2x2: uniform — no association
        let table = [25.0, 25.0, 25.0, 25.0];
        let v = cramers_v(&table, 2, 2).unwrap();
        assert!(v < 0.05, "V should be near 0: {v}");
    }

    #[test]
    fn cramers_v_bounded() {
        let table = [10.0, 20.0, 30.0, 15.0, 25.0, 5.0];
        let v = cramers_v(&table, 2, 3).unwrap();
        assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn cramers_v_degenerate_table() {
        assert!(cramers_v(&[10.0, 20.0], 1, 2).is_none()); // 1 row
    }

    // ── Discretization ──────────────────────────────────────────

    #[test]
    fn rank_bins_equal_values_share_bin() {
        let values: Vec<Option<f64>> = vec![Some(5.0); 40];
        let bins = rank_bins(&values);
        assert!(bins.iter().all(|&b| b == Some(0)));
    }

    #[test]
    fn rank_bins_spread_distinct_values() {
        let values: Vec<Option<f64>> = (0..100).map(|i| Some(i as f64)).collect();
        let bins = rank_bins(&values);
        let mut distinct: Vec<u32> = bins.iter().flatten().copied().collect();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), N_BINS);
    }

    #[test]
    fn encode_constant_column_has_one_level() {
        let col = Column::numeric(vec![5.0; 20], ValidityBitmap::all_valid(20));
        let enc = encode_column(&col);
        assert_eq!(enc.n_levels, 1);
    }

    #[test]
    fn encode_nulls_form_their_own_level() {
        let mut validity = ValidityBitmap::all_valid(4);
        validity.set_invalid(3);
        let col = Column::boolean(vec![true, false, true, false], validity);
        let enc = encode_column(&col);
        assert_eq!(enc.n_levels, 3); // true, false, null
    }

    #[test]
    fn encode_all_null_column() {
        let col = Column::numeric(vec![0.0; 5], ValidityBitmap::all_invalid(5));
        let enc = encode_column(&col);
        assert_eq!(enc.n_levels, 1);
    }

    // ── Scoring ─────────────────────────────────────────────────

    #[test]
    fn score_is_symmetric() {
        let x = Column::numeric(
            (0..60).map(|i| f64::from(i % 7)).collect(),
            ValidityBitmap::all_valid(60),
        );
        let y = Column::text(
            (0..60).map(|i| format!("g{}", i % 3)).collect(),
            ValidityBitmap::all_valid(60),
        );
        let ex = encode_column(&x);
        let ey = encode_column(&y);
        let forward = pair_score(&ex, &ey);
        let backward = pair_score(&ey, &ex);
        assert!((forward - backward).abs() < 1e-12);
    }

    #[test]
    fn constant_column_scores_zero() {
        let constant = encode_column(&Column::numeric(
            vec![1.0; 30],
            ValidityBitmap::all_valid(30),
        ));
        let varied = encode_column(&Column::numeric(
            (0..30).map(|i| i as f64).collect(),
            ValidityBitmap::all_valid(30),
        ));
        assert_eq!(pair_score(&constant, &varied), 0.0);
    }

    // ── Ranking ─────────────────────────────────────────────────

    #[test]
    fn rank_truncates_before_filtering() {
        // 25 pairs above the floor: the ranking must keep the strongest
        // 20, not the first 20 that clear the floor.
        let scored: Vec<(usize, usize, f64)> =
            (0..25).map(|i| (i, i + 100, 0.3 + 0.01 * i as f64)).collect();
        let ranked = rank_scored(scored, 20, 0.2);
        assert_eq!(ranked.len(), 20);
        assert!((ranked[0].2 - 0.54).abs() < 1e-12);
        assert!((ranked[19].2 - 0.35).abs() < 1e-12);
    }

    #[test]
    fn rank_filters_after_truncation() {
        let scored = vec![(0, 1, 0.9), (0, 2, 0.15), (1, 2, 0.05)];
        let ranked = rank_scored(scored, 20, 0.2);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[0].1, 1);
    }

    #[test]
    fn rank_breaks_ties_by_pair_position() {
        let scored = vec![(2, 3, 0.5), (0, 1, 0.5)];
        let ranked = rank_scored(scored, 20, 0.2);
        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[1].0, 2);
    }

    // ── End to end ──────────────────────────────────────────────

    #[test]
    fn identical_columns_reach_maximum_score() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let df = numeric_df(&[("a", values.clone()), ("b", values)]);
        let ranked = top_associations(&df, &AssociationConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].left_column, "a");
        assert_eq!(ranked[0].right_column, "b");
        assert!(ranked[0].score > 0.99, "score: {}", ranked[0].score);
    }

    #[test]
    fn single_column_has_no_pairs() {
        let df = numeric_df(&[("only", vec![1.0, 2.0, 3.0])]);
        assert!(top_associations(&df, &AssociationConfig::default()).is_empty());
    }

    #[test]
    fn each_pair_reported_once() {
        let a: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..50).map(|i| (i * 2) as f64).collect();
        let c: Vec<f64> = (0..50).map(|i| f64::from(i % 5)).collect();
        let df = numeric_df(&[("a", a), ("b", b), ("c", c)]);
        // negative floor keeps even zero-scored pairs
        let ranked = top_associations(&df, &AssociationConfig { floor: -1.0, ..Default::default() });
        // 3 columns → 3 unordered pairs, no duplicates, no self-pairs
        assert_eq!(ranked.len(), 3);
        for pair in &ranked {
            assert_ne!(pair.left_column, pair.right_column);
        }
    }

    #[test]
    fn deterministic_across_calls() {
        let values: Vec<f64> = (0..5000).map(|i| f64::from(i % 97)).collect();
        let other: Vec<f64> = (0..5000).map(|i| f64::from(i % 13)).collect();
        let df = numeric_df(&[("x", values), ("y", other)]);
        let config = AssociationConfig::default();
        let first = top_associations(&df, &config);
        let second = top_associations(&df, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn row_order_does_not_change_scores() {
        // A symmetric metric on an unsorted subsample: sorting the input
        // table first must not matter when no subsampling kicks in.
        let x: Vec<f64> = (0..80).map(|i| f64::from((i * 37) % 80)).collect();
        let y: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
        let df = numeric_df(&[("x", x), ("y", y)]);
        let sorted = df.sort_by_column("x").unwrap();
        let config = AssociationConfig::default();
        let from_original = top_associations(&df, &config);
        let from_sorted = top_associations(&sorted, &config);
        assert_eq!(from_original.len(), from_sorted.len());
        for (a, b) in from_original.iter().zip(from_sorted.iter()) {
            assert!((a.score - b.score).abs() < 1e-12);
        }
    }
}
