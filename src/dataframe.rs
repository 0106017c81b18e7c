//! Column-major DataFrame for tabular data.
//!
//! The [`DataFrame`] stores data in column-major order with typed columns
//! and a compact validity bitmap for tracking missing values. Columns are
//! read-only once built; row reordering and subsampling produce new frames
//! via [`DataFrame::take_rows`].
//!
//! # Column Types
//!
//! | Type | Storage | Use case |
//! |------|---------|----------|
//! | [`Numeric`](Column::Numeric) | `Vec<f64>` + bitmap | Continuous/integer values |
//! | [`Boolean`](Column::Boolean) | `Vec<bool>` + bitmap | True/false values |
//! | [`Datetime`](Column::Datetime) | `Vec<i64>` + bitmap | Timestamps (epoch seconds) |
//! | [`Categorical`](Column::Categorical) | Dictionary + `Vec<u32>` | Low-cardinality strings |
//! | [`Text`](Column::Text) | `Vec<String>` + bitmap | High-cardinality strings |
//!
//! # Example
//!
//! ```
//! use tablescope::dataframe::{DataFrame, Column, ValidityBitmap};
//!
//! let mut df = DataFrame::new();
//! df.add_column(
//!     "temperature".to_string(),
//!     Column::numeric(vec![20.5, 21.3, 19.8], ValidityBitmap::all_valid(3)),
//! ).unwrap();
//! assert_eq!(df.row_count(), 3);
//! assert_eq!(df.column_count(), 1);
//! ```

use serde::Serialize;

use crate::error::ProfileError;

// ── ValidityBitmap ────────────────────────────────────────────────────

/// Bit-packed validity bitmap using `Vec<u64>`.
///
/// Each bit indicates whether the corresponding row is valid (1) or
/// missing/null (0). Uses 1 bit per row instead of 1 byte, yielding
/// 8× memory savings over `Vec<bool>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    bits: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates a bitmap where all `len` positions are valid.
    pub fn all_valid(len: usize) -> Self {
        let n_words = len.div_ceil(64);
        let mut bits = vec![u64::MAX; n_words];
        let trailing = len % 64;
        if trailing != 0 && n_words > 0 {
            bits[n_words - 1] = (1u64 << trailing) - 1;
        }
        Self { bits, len }
    }

    /// Creates a bitmap where all `len` positions are invalid (null).
    pub fn all_invalid(len: usize) -> Self {
        let n_words = len.div_ceil(64);
        Self {
            bits: vec![0u64; n_words],
            len,
        }
    }

    /// Creates an empty bitmap with no rows.
    pub fn empty() -> Self {
        Self {
            bits: Vec::new(),
            len: 0,
        }
    }

    /// Returns `true` if the value at `idx` is valid (not null).
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        let (word, bit) = (idx / 64, idx % 64);
        (self.bits[word] >> bit) & 1 == 1
    }

    /// Marks position `idx` as invalid (null).
    #[inline]
    pub fn set_invalid(&mut self, idx: usize) {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        let (word, bit) = (idx / 64, idx % 64);
        self.bits[word] &= !(1u64 << bit);
    }

    /// Appends a new position (valid or invalid).
    pub fn push(&mut self, valid: bool) {
        let idx = self.len;
        self.len += 1;
        let word = idx / 64;
        let bit = idx % 64;
        if word >= self.bits.len() {
            self.bits.push(0);
        }
        if valid {
            self.bits[word] |= 1u64 << bit;
        }
    }

    /// Returns the total number of tracked positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bitmap tracks zero positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts the number of null (invalid) positions.
    pub fn null_count(&self) -> usize {
        let valid_count: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        self.len - valid_count
    }

    /// Counts the number of valid (non-null) positions.
    pub fn valid_count(&self) -> usize {
        self.len - self.null_count()
    }

    /// Returns an iterator over indices of valid positions.
    pub fn valid_indices(&self) -> ValidIndicesIter<'_> {
        ValidIndicesIter {
            bitmap: self,
            current: 0,
        }
    }
}

/// Iterator over valid indices in a [`ValidityBitmap`].
pub struct ValidIndicesIter<'a> {
    bitmap: &'a ValidityBitmap,
    current: usize,
}

impl<'a> Iterator for ValidIndicesIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current < self.bitmap.len {
            let idx = self.current;
            self.current += 1;
            if self.bitmap.is_valid(idx) {
                return Some(idx);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.bitmap.len - self.current))
    }
}

// ── DataType ──────────────────────────────────────────────────────────

/// Storage data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    /// Continuous or integer numeric values (stored as `f64`).
    Numeric,
    /// Boolean (true/false) values.
    Boolean,
    /// Timestamps stored as epoch seconds.
    Datetime,
    /// Low-cardinality strings (dictionary-encoded).
    Categorical,
    /// High-cardinality or free-form text.
    Text,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "Numeric"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Datetime => write!(f, "Datetime"),
            Self::Categorical => write!(f, "Categorical"),
            Self::Text => write!(f, "Text"),
        }
    }
}

// ── CellValue ─────────────────────────────────────────────────────────

/// A single table cell, detached from its column.
///
/// Used for row samples (`head`/`tail`) and first-row lookups in summaries.
/// Serializes without a tag, so a row becomes a plain JSON array of
/// scalars. Datetimes are carried as ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value.
    Null,
    /// Numeric scalar.
    Number(f64),
    /// Boolean scalar.
    Bool(bool),
    /// Text scalar (also datetime in ISO-8601 form).
    Text(String),
}

/// Formats epoch seconds as an ISO-8601 timestamp string.
///
/// Timestamps outside chrono's representable range fall back to the raw
/// second count.
pub fn format_timestamp(secs: i64) -> String {
    match chrono::DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => secs.to_string(),
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column with validity bitmap for missing values.
///
/// All variants store values in a dense array alongside a
/// [`ValidityBitmap`]. Invalid positions hold a default value
/// (0.0, false, 0, empty string, or index 0) that should be ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Dense `f64` values. Null positions hold `0.0`.
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    /// Boolean values. Null positions hold `false`.
    Boolean {
        values: Vec<bool>,
        validity: ValidityBitmap,
    },
    /// Epoch-second timestamps. Null positions hold `0`.
    Datetime {
        values: Vec<i64>,
        validity: ValidityBitmap,
    },
    /// Dictionary-encoded categorical column.
    ///
    /// `dictionary` contains unique string values.
    /// `indices` maps each row to a dictionary index.
    /// Null positions have index `0` (ignored via validity bit).
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
    /// Free-form text column. Null positions hold an empty string.
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(values: Vec<f64>, validity: ValidityBitmap) -> Self {
        Self::Numeric { values, validity }
    }

    /// Creates a boolean column.
    pub fn boolean(values: Vec<bool>, validity: ValidityBitmap) -> Self {
        Self::Boolean { values, validity }
    }

    /// Creates a datetime column from epoch seconds.
    pub fn datetime(values: Vec<i64>, validity: ValidityBitmap) -> Self {
        Self::Datetime { values, validity }
    }

    /// Creates a categorical column from a dictionary and indices.
    pub fn categorical(
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    ) -> Self {
        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Creates a text column.
    pub fn text(values: Vec<String>, validity: ValidityBitmap) -> Self {
        Self::Text { values, validity }
    }

    /// Returns the data type of this column.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Numeric,
            Self::Boolean { .. } => DataType::Boolean,
            Self::Datetime { .. } => DataType::Datetime,
            Self::Categorical { .. } => DataType::Categorical,
            Self::Text { .. } => DataType::Text,
        }
    }

    /// Returns the number of rows in this column.
    pub fn len(&self) -> usize {
        self.validity().len()
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the validity bitmap.
    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. }
            | Self::Boolean { validity, .. }
            | Self::Datetime { validity, .. }
            | Self::Categorical { validity, .. }
            | Self::Text { validity, .. } => validity,
        }
    }

    /// Returns the number of null values.
    pub fn null_count(&self) -> usize {
        self.validity().null_count()
    }

    /// Returns the number of valid (non-null) values.
    pub fn valid_count(&self) -> usize {
        self.validity().valid_count()
    }

    /// Returns `true` if the value at `idx` is valid (not null).
    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity().is_valid(idx)
    }

    /// Returns the numeric values, or `None` if not a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Returns the epoch-second values, or `None` if not a datetime column.
    pub fn as_datetime(&self) -> Option<&[i64]> {
        match self {
            Self::Datetime { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Returns valid numeric values (nulls excluded) as a new `Vec<f64>`.
    pub fn valid_numeric_values(&self) -> Option<Vec<f64>> {
        match self {
            Self::Numeric { values, validity } => {
                Some(validity.valid_indices().map(|i| values[i]).collect())
            }
            _ => None,
        }
    }

    /// Returns valid epoch-second values (nulls excluded) as a new `Vec<i64>`.
    pub fn valid_datetime_values(&self) -> Option<Vec<i64>> {
        match self {
            Self::Datetime { values, validity } => {
                Some(validity.valid_indices().map(|i| values[i]).collect())
            }
            _ => None,
        }
    }

    /// Returns valid values rendered as strings for boolean, categorical,
    /// and text columns. Numeric and datetime columns yield `None`.
    pub fn valid_string_values(&self) -> Option<Vec<String>> {
        match self {
            Self::Boolean { values, validity } => Some(
                validity
                    .valid_indices()
                    .map(|i| if values[i] { "true".to_string() } else { "false".to_string() })
                    .collect(),
            ),
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } => Some(
                validity
                    .valid_indices()
                    .map(|i| {
                        dictionary
                            .get(indices[i] as usize)
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect(),
            ),
            Self::Text { values, validity } => Some(
                validity.valid_indices().map(|i| values[i].clone()).collect(),
            ),
            Self::Numeric { .. } | Self::Datetime { .. } => None,
        }
    }

    /// Returns the category string for a given row index in a categorical column.
    pub fn category_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } => {
                if validity.is_valid(idx) {
                    dictionary.get(indices[idx] as usize).map(|s| s.as_str())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns the text value for a given row index in a text column.
    pub fn text_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Text { values, validity } => {
                if validity.is_valid(idx) {
                    Some(&values[idx])
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns the cell at `idx` as a detached [`CellValue`].
    pub fn value_at(&self, idx: usize) -> CellValue {
        if !self.is_valid(idx) {
            return CellValue::Null;
        }
        match self {
            Self::Numeric { values, .. } => CellValue::Number(values[idx]),
            Self::Boolean { values, .. } => CellValue::Bool(values[idx]),
            Self::Datetime { values, .. } => CellValue::Text(format_timestamp(values[idx])),
            Self::Categorical {
                dictionary, indices, ..
            } => CellValue::Text(
                dictionary
                    .get(indices[idx] as usize)
                    .cloned()
                    .unwrap_or_default(),
            ),
            Self::Text { values, .. } => CellValue::Text(values[idx].clone()),
        }
    }

    /// Builds a new column containing the rows at `indices`, in order.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        let mut validity = ValidityBitmap::empty();
        for &i in indices {
            validity.push(self.is_valid(i));
        }
        match self {
            Self::Numeric { values, .. } => Self::Numeric {
                values: indices.iter().map(|&i| values[i]).collect(),
                validity,
            },
            Self::Boolean { values, .. } => Self::Boolean {
                values: indices.iter().map(|&i| values[i]).collect(),
                validity,
            },
            Self::Datetime { values, .. } => Self::Datetime {
                values: indices.iter().map(|&i| values[i]).collect(),
                validity,
            },
            Self::Categorical {
                dictionary,
                indices: codes,
                ..
            } => Self::Categorical {
                dictionary: dictionary.clone(),
                indices: indices.iter().map(|&i| codes[i]).collect(),
                validity,
            },
            Self::Text { values, .. } => Self::Text {
                values: indices.iter().map(|&i| values[i].clone()).collect(),
                validity,
            },
        }
    }

    /// Compares two rows of this column for sorting. Nulls order last;
    /// incomparable numerics (NaN) compare equal.
    fn compare_rows(&self, a: usize, b: usize) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self.is_valid(a), self.is_valid(b)) {
            (false, false) => return Ordering::Equal,
            (false, true) => return Ordering::Greater,
            (true, false) => return Ordering::Less,
            (true, true) => {}
        }
        match self {
            Self::Numeric { values, .. } => values[a]
                .partial_cmp(&values[b])
                .unwrap_or(Ordering::Equal),
            Self::Boolean { values, .. } => values[a].cmp(&values[b]),
            Self::Datetime { values, .. } => values[a].cmp(&values[b]),
            Self::Categorical {
                dictionary, indices, ..
            } => dictionary[indices[a] as usize].cmp(&dictionary[indices[b] as usize]),
            Self::Text { values, .. } => values[a].cmp(&values[b]),
        }
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Column-major tabular data structure.
///
/// Stores named columns of typed data. All columns must have the same
/// number of rows.
///
/// # Example
///
/// ```
/// use tablescope::dataframe::{DataFrame, Column, ValidityBitmap};
///
/// let mut df = DataFrame::new();
/// df.add_column(
///     "x".to_string(),
///     Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
/// ).unwrap();
/// df.add_column(
///     "label".to_string(),
///     Column::text(
///         vec!["a".into(), "b".into(), "c".into()],
///         ValidityBitmap::all_valid(3),
///     ),
/// ).unwrap();
/// assert_eq!(df.row_count(), 3);
/// assert_eq!(df.column_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Creates an empty DataFrame with no columns or rows.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Adds a named column to the DataFrame.
    ///
    /// Returns an error if the column length doesn't match the existing
    /// row count (unless this is the first column).
    pub fn add_column(&mut self, name: String, column: Column) -> Result<(), ProfileError> {
        let col_len = column.len();
        if self.columns.is_empty() {
            self.row_count = col_len;
        } else if col_len != self.row_count {
            return Err(ProfileError::DimensionMismatch {
                expected: self.row_count,
                actual: col_len,
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Returns the number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the DataFrame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns column names.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns a reference to the column at `index`.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns a reference to the column with the given `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Returns the index of the column with the given `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns an iterator over (name, column) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(|s| s.as_str()).zip(self.columns.iter())
    }

    /// Returns a summary of column data types.
    pub fn schema(&self) -> Vec<(&str, DataType)> {
        self.names
            .iter()
            .zip(self.columns.iter())
            .map(|(name, col)| (name.as_str(), col.data_type()))
            .collect()
    }

    /// Returns the row at `idx` as detached cell values, in column order.
    pub fn row(&self, idx: usize) -> Vec<CellValue> {
        self.columns.iter().map(|c| c.value_at(idx)).collect()
    }

    /// Returns the first `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> Vec<Vec<CellValue>> {
        (0..self.row_count.min(n)).map(|i| self.row(i)).collect()
    }

    /// Returns the last `n` rows (fewer if the table is shorter).
    pub fn tail(&self, n: usize) -> Vec<Vec<CellValue>> {
        let start = self.row_count.saturating_sub(n);
        (start..self.row_count).map(|i| self.row(i)).collect()
    }

    /// Builds a new DataFrame containing the rows at `indices`, in order.
    /// Column order is unchanged.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take_rows(indices)).collect(),
            row_count: indices.len(),
        }
    }

    /// Returns a new DataFrame with rows sorted ascending by the named
    /// column. The sort is stable and nulls order last; column order is
    /// unchanged.
    pub fn sort_by_column(&self, name: &str) -> Result<Self, ProfileError> {
        let col = self
            .column_by_name(name)
            .ok_or_else(|| ProfileError::ColumnNotFound {
                name: name.to_string(),
            })?;
        let mut order: Vec<usize> = (0..self.row_count).collect();
        order.sort_by(|&a, &b| col.compare_rows(a, b));
        Ok(self.take_rows(&order))
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── ValidityBitmap tests ──────────────────────────────────────

    #[test]
    fn bitmap_all_valid() {
        let bm = ValidityBitmap::all_valid(100);
        assert_eq!(bm.len(), 100);
        assert_eq!(bm.null_count(), 0);
        assert_eq!(bm.valid_count(), 100);
        for i in 0..100 {
            assert!(bm.is_valid(i));
        }
    }

    #[test]
    fn bitmap_all_invalid() {
        let bm = ValidityBitmap::all_invalid(100);
        assert_eq!(bm.null_count(), 100);
        assert_eq!(bm.valid_count(), 0);
        for i in 0..100 {
            assert!(!bm.is_valid(i));
        }
    }

    #[test]
    fn bitmap_push_across_word_boundary() {
        let mut bm = ValidityBitmap::empty();
        for i in 0..128 {
            bm.push(i % 3 != 0); // every 3rd is null
        }
        assert_eq!(bm.len(), 128);
        let expected_nulls = (0..128).filter(|i| i % 3 == 0).count();
        assert_eq!(bm.null_count(), expected_nulls);
    }

    #[test]
    fn bitmap_boundary_64() {
        let bm = ValidityBitmap::all_valid(64);
        assert_eq!(bm.null_count(), 0);

        let bm65 = ValidityBitmap::all_valid(65);
        assert_eq!(bm65.null_count(), 0);
        assert!(bm65.is_valid(64));
    }

    #[test]
    fn bitmap_valid_indices() {
        let mut bm = ValidityBitmap::all_valid(5);
        bm.set_invalid(1);
        bm.set_invalid(3);
        let indices: Vec<usize> = bm.valid_indices().collect();
        assert_eq!(indices, vec![0, 2, 4]);
    }

    // ── Column tests ─────────────────────────────────────────────

    #[test]
    fn numeric_column_with_nulls() {
        let mut validity = ValidityBitmap::all_valid(4);
        validity.set_invalid(1);
        validity.set_invalid(3);
        let col = Column::numeric(vec![1.0, 0.0, 3.0, 0.0], validity);
        assert_eq!(col.data_type(), DataType::Numeric);
        assert_eq!(col.null_count(), 2);
        assert_eq!(col.valid_count(), 2);
        let valid = col.valid_numeric_values().expect("numeric column");
        assert_eq!(valid, vec![1.0, 3.0]);
    }

    #[test]
    fn datetime_column() {
        // 2024-01-01T00:00:00 and 2024-01-02T00:00:00
        let col = Column::datetime(vec![1_704_067_200, 1_704_153_600], ValidityBitmap::all_valid(2));
        assert_eq!(col.data_type(), DataType::Datetime);
        assert_eq!(col.valid_datetime_values().unwrap(), vec![1_704_067_200, 1_704_153_600]);
        assert_eq!(
            col.value_at(0),
            CellValue::Text("2024-01-01T00:00:00".to_string())
        );
    }

    #[test]
    fn categorical_column_with_null() {
        let dict = vec!["a".into(), "b".into()];
        let indices = vec![0, 0, 1];
        let mut validity = ValidityBitmap::all_valid(3);
        validity.set_invalid(1);
        let col = Column::categorical(dict, indices, validity);
        assert_eq!(col.category_at(0), Some("a"));
        assert_eq!(col.category_at(1), None);
        assert_eq!(col.category_at(2), Some("b"));
    }

    #[test]
    fn string_values_for_boolean_column() {
        let mut validity = ValidityBitmap::all_valid(3);
        validity.set_invalid(2);
        let col = Column::boolean(vec![true, false, false], validity);
        assert_eq!(
            col.valid_string_values().unwrap(),
            vec!["true".to_string(), "false".to_string()]
        );
    }

    #[test]
    fn string_values_absent_for_numeric() {
        let col = Column::numeric(vec![1.0], ValidityBitmap::all_valid(1));
        assert!(col.valid_string_values().is_none());
    }

    #[test]
    fn cell_values() {
        let mut validity = ValidityBitmap::all_valid(2);
        validity.set_invalid(1);
        let col = Column::text(vec!["hello".into(), String::new()], validity);
        assert_eq!(col.value_at(0), CellValue::Text("hello".to_string()));
        assert_eq!(col.value_at(1), CellValue::Null);
    }

    #[test]
    fn take_rows_reorders_and_keeps_validity() {
        let mut validity = ValidityBitmap::all_valid(4);
        validity.set_invalid(2);
        let col = Column::numeric(vec![10.0, 20.0, 0.0, 40.0], validity);
        let taken = col.take_rows(&[3, 2, 0]);
        assert_eq!(taken.len(), 3);
        assert_eq!(taken.as_numeric().unwrap(), &[40.0, 0.0, 10.0]);
        assert!(taken.is_valid(0));
        assert!(!taken.is_valid(1));
        assert!(taken.is_valid(2));
    }

    // ── DataFrame tests ──────────────────────────────────────────

    #[test]
    fn add_columns() {
        let mut df = DataFrame::new();
        df.add_column(
            "x".to_string(),
            Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
        )
        .expect("first column");
        df.add_column(
            "y".to_string(),
            Column::numeric(vec![4.0, 5.0, 6.0], ValidityBitmap::all_valid(3)),
        )
        .expect("second column");

        assert_eq!(df.row_count(), 3);
        assert_eq!(df.column_count(), 2);
        assert_eq!(df.column_names(), &["x", "y"]);
    }

    #[test]
    fn column_length_mismatch() {
        let mut df = DataFrame::new();
        df.add_column(
            "x".to_string(),
            Column::numeric(vec![1.0, 2.0], ValidityBitmap::all_valid(2)),
        )
        .unwrap();

        let result = df.add_column(
            "y".to_string(),
            Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn dataframe_schema() {
        let mut df = DataFrame::new();
        df.add_column(
            "x".to_string(),
            Column::numeric(vec![1.0], ValidityBitmap::all_valid(1)),
        )
        .unwrap();
        df.add_column(
            "when".to_string(),
            Column::datetime(vec![0], ValidityBitmap::all_valid(1)),
        )
        .unwrap();

        let schema = df.schema();
        assert_eq!(schema[0], ("x", DataType::Numeric));
        assert_eq!(schema[1], ("when", DataType::Datetime));
    }

    #[test]
    fn head_and_tail_clamp() {
        let mut df = DataFrame::new();
        df.add_column(
            "x".to_string(),
            Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
        )
        .unwrap();

        assert_eq!(df.head(5).len(), 3);
        assert_eq!(df.tail(5).len(), 3);
        assert_eq!(df.head(2), vec![
            vec![CellValue::Number(1.0)],
            vec![CellValue::Number(2.0)],
        ]);
        assert_eq!(df.tail(1), vec![vec![CellValue::Number(3.0)]]);
    }

    #[test]
    fn sort_by_numeric_column_nulls_last() {
        let mut df = DataFrame::new();
        let mut validity = ValidityBitmap::all_valid(4);
        validity.set_invalid(1);
        df.add_column("x".to_string(), Column::numeric(vec![3.0, 0.0, 1.0, 2.0], validity))
            .unwrap();
        df.add_column(
            "label".to_string(),
            Column::text(
                vec!["c".into(), "null".into(), "a".into(), "b".into()],
                ValidityBitmap::all_valid(4),
            ),
        )
        .unwrap();

        let sorted = df.sort_by_column("x").unwrap();
        let x = sorted.column_by_name("x").unwrap();
        assert_eq!(x.as_numeric().unwrap()[..3], [1.0, 2.0, 3.0]);
        assert!(!x.is_valid(3)); // null sorted last
        // the companion column moved with its rows
        let label = sorted.column_by_name("label").unwrap();
        assert_eq!(label.text_at(0), Some("a"));
        assert_eq!(label.text_at(2), Some("c"));
        // column order unchanged
        assert_eq!(sorted.column_names(), &["x", "label"]);
    }

    #[test]
    fn sort_by_missing_column() {
        let mut df = DataFrame::new();
        df.add_column(
            "x".to_string(),
            Column::numeric(vec![1.0], ValidityBitmap::all_valid(1)),
        )
        .unwrap();
        let err = df.sort_by_column("nope").unwrap_err();
        assert!(matches!(err, ProfileError::ColumnNotFound { .. }));
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let mut df = DataFrame::new();
        df.add_column(
            "k".to_string(),
            Column::numeric(vec![1.0, 1.0, 0.0], ValidityBitmap::all_valid(3)),
        )
        .unwrap();
        df.add_column(
            "tag".to_string(),
            Column::text(
                vec!["first".into(), "second".into(), "zero".into()],
                ValidityBitmap::all_valid(3),
            ),
        )
        .unwrap();
        let sorted = df.sort_by_column("k").unwrap();
        let tag = sorted.column_by_name("tag").unwrap();
        assert_eq!(tag.text_at(0), Some("zero"));
        assert_eq!(tag.text_at(1), Some("first"));
        assert_eq!(tag.text_at(2), Some("second"));
    }
}
