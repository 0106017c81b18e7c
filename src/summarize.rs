//! Column-level and dataframe-level summarization.
//!
//! The summarization engine turns a [`DataFrame`] into a
//! [`DataframeSummary`]: one [`ColumnSummary`] per column plus table-level
//! row samples and a ranked association table. It tolerates dirty data —
//! missing values are expected input, not errors.
//!
//! Analyzers are dispatched on a [`SemanticType`] computed once per column
//! by [`classify`]; no analyzer re-probes the storage type. Per-column
//! work is independent and fans out across a thread pool; results are
//! collected back into the input column order.
//!
//! # Example
//!
//! ```
//! use tablescope::csv_parser::CsvParser;
//! use tablescope::summarize::{summarize_dataframe, SummaryConfig, SummaryOptions};
//!
//! let csv = "x,y\n1.0,A\n2.0,B\nNA,A\n4.0,A\n5.0,B\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//! let summary = summarize_dataframe(
//!     &df,
//!     &SummaryConfig::default(),
//!     &SummaryOptions::default(),
//! ).unwrap();
//!
//! assert_eq!(summary.n_rows, 5);
//! assert_eq!(summary.columns.len(), 2);
//! assert_eq!(summary.columns[0].null_count, 1);
//! assert!(summary.columns[0].numeric.is_some());
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;

use crate::associations::{top_associations, AssociationConfig, ColumnAssociation};
use crate::dataframe::{format_timestamp, CellValue, Column, DataFrame};
use crate::error::ProfileError;
use crate::plot::PlotRenderer;
use crate::sample::sample_indices;

/// Rows shown in the `head` and `tail` samples.
const SAMPLE_ROWS: usize = 5;

/// Maximum characters kept when eliding long strings.
const ELISION_LIMIT: usize = 100;

// ── Configuration ─────────────────────────────────────────────────────

/// Thresholds for the summarization engine.
///
/// Passed into every [`summarize_dataframe`] call; there is no global
/// state to configure.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Distinct-value count at which a column counts as high-cardinality
    /// and its frequency table is truncated. Default: 10.
    pub high_cardinality_threshold: usize,
    /// Maximum rows fed to the association analysis. Default: 3000.
    pub subsample_size: usize,
    /// Minimum score a reported association must exceed. Default: 0.2.
    pub association_floor: f64,
    /// Number of top associations kept before the floor filter. Default: 20.
    pub top_k_associations: usize,
    /// Seed for the deterministic association subsample. Default: 42.
    pub subsample_seed: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            high_cardinality_threshold: 10,
            subsample_size: 3000,
            association_floor: 0.2,
            top_k_associations: 20,
            subsample_seed: 42,
        }
    }
}

impl SummaryConfig {
    fn association_config(&self) -> AssociationConfig {
        AssociationConfig {
            subsample_size: self.subsample_size,
            subsample_seed: self.subsample_seed,
            top_k: self.top_k_associations,
            floor: self.association_floor,
        }
    }
}

/// Per-call options for [`summarize_dataframe`].
#[derive(Default)]
pub struct SummaryOptions<'a> {
    /// Sort the table by this column before sampling and per-column
    /// iteration. Also switches numeric/datetime plots from histograms
    /// to line plots against this column.
    pub order_by: Option<&'a str>,
    /// Title recorded in the summary.
    pub title: Option<&'a str>,
    /// Source file recorded in the summary.
    pub file_path: Option<&'a Path>,
    /// Plot collaborator; when absent no plots are requested.
    pub plots: Option<&'a dyn PlotRenderer>,
}

// ── Semantic classification ───────────────────────────────────────────

/// Semantic category driving analyzer dispatch.
///
/// Computed once per column and threaded through every analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    /// Continuous values: mean/std/quantile statistics apply.
    Numeric,
    /// Timestamps: min/max range statistics apply.
    Datetime,
    /// Everything else: cardinality and frequency statistics apply.
    String,
}

/// Classifies a column into its semantic category.
///
/// Boolean and dictionary-encoded columns profile like strings; string
/// handling is always a valid fallback, so this is a total function.
pub fn classify(column: &Column) -> SemanticType {
    match column {
        Column::Numeric { .. } => SemanticType::Numeric,
        Column::Datetime { .. } => SemanticType::Datetime,
        Column::Boolean { .. } | Column::Categorical { .. } | Column::Text { .. } => {
            SemanticType::String
        }
    }
}

// ── Summary records ───────────────────────────────────────────────────

/// Severity of a column's missing-value situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NullsLevel {
    /// No missing values.
    Ok,
    /// Some missing values.
    Warning,
    /// Every value is missing.
    Critical,
}

/// The single repeated value of a constant column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConstantValue {
    /// Numeric constant.
    Number(f64),
    /// Text constant (also datetime constants, in ISO-8601 form).
    Text(String),
}

/// Quantiles of a numeric column at the five standard levels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantiles {
    /// 0th percentile (minimum).
    pub min: f64,
    /// 25th percentile.
    pub q25: f64,
    /// 50th percentile.
    pub median: f64,
    /// 75th percentile.
    pub q75: f64,
    /// 100th percentile (maximum).
    pub max: f64,
}

/// Descriptive statistics for a non-constant numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation; NaN when undefined (single value).
    pub standard_deviation: f64,
    /// Quantiles at {0, 0.25, 0.5, 0.75, 1}.
    pub quantiles: Quantiles,
    /// q75 − q25.
    pub inter_quartile_range: f64,
}

/// Range statistics for a non-constant datetime column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatetimeSummary {
    /// Earliest timestamp, ISO-8601.
    pub min: String,
    /// Latest timestamp, ISO-8601.
    pub max: String,
}

/// Cardinality statistics for a string-like column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    /// Number of distinct non-null values.
    pub n_unique: usize,
    /// `n_unique` over the table's row count.
    pub unique_proportion: f64,
    /// Most frequent values with their counts, descending; truncated to
    /// the high-cardinality threshold. Ties keep first-encountered order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value_counts: Vec<(String, usize)>,
}

/// Summary of a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    /// 0-based position in the table.
    pub position: usize,
    /// Column name.
    pub name: String,
    /// Storage type name ("Numeric", "Boolean", "Datetime", ...).
    pub dtype_name: String,
    /// All non-null values are identical.
    pub value_is_constant: bool,
    /// Number of missing values.
    pub null_count: usize,
    /// `null_count` over the row count, in `[0, 1]`.
    pub null_proportion: f64,
    /// Missing-value severity.
    pub nulls_level: NullsLevel,
    /// Whether the distinct-value count meets the configured threshold.
    /// Numeric and datetime columns are always high-cardinality.
    pub high_cardinality: bool,
    /// Up to five random non-null values, elided for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_values: Option<Vec<String>>,
    /// Cardinality detail (string-like columns).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorical: Option<CategoricalSummary>,
    /// Numeric detail (non-constant numeric columns).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    /// Datetime detail (non-constant datetime columns).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DatetimeSummary>,
    /// The repeated value, when `value_is_constant`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constant_value: Option<ConstantValue>,
    /// Names of the plots present in `plots`.
    pub plot_names: Vec<String>,
    /// Rendered plots by name, as opaque image strings.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub plots: BTreeMap<String, String>,
}

/// Summary of a whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataframeSummary {
    /// Number of rows.
    pub n_rows: usize,
    /// Number of columns.
    pub n_columns: usize,
    /// One summary per column, in input column order.
    pub columns: Vec<ColumnSummary>,
    /// First rows of the (possibly sorted) table.
    pub head: Vec<Vec<CellValue>>,
    /// Last rows of the (possibly sorted) table.
    pub tail: Vec<Vec<CellValue>>,
    /// Column name → value in the first row.
    pub first_row: BTreeMap<String, CellValue>,
    /// Number of columns with `value_is_constant` set.
    pub n_constant_columns: usize,
    /// Strongest column associations, descending by score.
    pub top_associations: Vec<ColumnAssociation>,
    /// Optional report title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Source file path, when the table came from a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Source file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Name of the sort column, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

impl DataframeSummary {
    /// Serializes the summary to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ── Dataframe summarizer ──────────────────────────────────────────────

/// Summarizes every column of a table plus its pairwise associations.
///
/// Returns [`ProfileError::EmptyTable`] for a table with no columns and
/// [`ProfileError::ColumnNotFound`] for an unknown `order_by` column;
/// everything else is recovered per column.
pub fn summarize_dataframe(
    df: &DataFrame,
    config: &SummaryConfig,
    options: &SummaryOptions<'_>,
) -> Result<DataframeSummary, ProfileError> {
    if df.is_empty() {
        return Err(ProfileError::EmptyTable);
    }
    log::debug!(
        "summarizing {} columns over {} rows",
        df.column_count(),
        df.row_count()
    );

    // A symmetric metric does not care about row order, so associations
    // always run on the original table.
    let top_assoc = top_associations(df, &config.association_config());

    let sorted;
    let table: &DataFrame = match options.order_by {
        Some(name) => {
            sorted = df.sort_by_column(name)?;
            &sorted
        }
        None => df,
    };

    let n_rows = table.row_count();
    let order_column: Option<&Column> =
        options.order_by.and_then(|name| table.column_by_name(name));

    let columns: Vec<ColumnSummary> = (0..table.column_count())
        .into_par_iter()
        .map(|position| {
            let name = &table.column_names()[position];
            let column = table.column(position).expect("column index in range");
            summarize_column(
                column,
                name,
                position,
                n_rows,
                config,
                options.plots,
                order_column,
            )
        })
        .collect();

    let n_constant_columns = columns.iter().filter(|c| c.value_is_constant).count();

    let mut first_row = BTreeMap::new();
    if n_rows > 0 {
        for (name, value) in table.column_names().iter().zip(table.row(0)) {
            first_row.insert(name.clone(), value);
        }
    }

    Ok(DataframeSummary {
        n_rows,
        n_columns: table.column_count(),
        columns,
        head: table.head(SAMPLE_ROWS),
        tail: table.tail(SAMPLE_ROWS),
        first_row,
        n_constant_columns,
        top_associations: top_assoc,
        title: options.title.map(str::to_string),
        file_path: options
            .file_path
            .map(|p| p.display().to_string()),
        file_name: options.file_path.and_then(|p| {
            p.file_name().map(|n| n.to_string_lossy().into_owned())
        }),
        order_by: options.order_by.map(str::to_string),
    })
}

// ── Column summarizer ─────────────────────────────────────────────────

/// Summarizes a single column.
fn summarize_column(
    column: &Column,
    name: &str,
    position: usize,
    n_rows: usize,
    config: &SummaryConfig,
    plots: Option<&dyn PlotRenderer>,
    order_column: Option<&Column>,
) -> ColumnSummary {
    let semantic = classify(column);
    let mut summary = ColumnSummary {
        position,
        name: name.to_string(),
        dtype_name: column.data_type().to_string(),
        value_is_constant: false,
        null_count: 0,
        null_proportion: 0.0,
        nulls_level: NullsLevel::Ok,
        high_cardinality: false,
        sample_values: None,
        categorical: None,
        numeric: None,
        datetime: None,
        constant_value: None,
        plot_names: Vec::new(),
        plots: BTreeMap::new(),
    };
    add_nulls_summary(&mut summary, column, n_rows);
    add_sample_values(&mut summary, column);
    add_value_counts(&mut summary, column, semantic, n_rows, config, plots);
    add_numeric_summary(&mut summary, column, semantic, plots, order_column);
    add_datetime_summary(&mut summary, column, semantic, plots, order_column);
    summary.plot_names = summary.plots.keys().cloned().collect();
    summary
}

fn add_nulls_summary(summary: &mut ColumnSummary, column: &Column, n_rows: usize) {
    let null_count = column.null_count();
    summary.null_count = null_count;
    summary.null_proportion = if n_rows > 0 {
        null_count as f64 / n_rows as f64
    } else {
        0.0
    };
    // Exact boundaries: anything strictly between empty and full is a warning.
    summary.nulls_level = if summary.null_proportion == 0.0 {
        NullsLevel::Ok
    } else if summary.null_proportion == 1.0 {
        NullsLevel::Critical
    } else {
        NullsLevel::Warning
    };
}

fn add_sample_values(summary: &mut ColumnSummary, column: &Column) {
    let valid: Vec<usize> = column.validity().valid_indices().collect();
    if valid.is_empty() {
        return;
    }
    let size = valid.len().min(SAMPLE_ROWS);
    let picked = sample_indices(valid.len(), size, 0);
    let values: Vec<String> = picked
        .iter()
        .map(|&i| elide_string(&format_cell(&column.value_at(valid[i])), ELISION_LIMIT))
        .collect();
    summary.sample_values = Some(values);
}

fn add_value_counts(
    summary: &mut ColumnSummary,
    column: &Column,
    semantic: SemanticType,
    n_rows: usize,
    config: &SummaryConfig,
    plots: Option<&dyn PlotRenderer>,
) {
    if semantic != SemanticType::String {
        // Cardinality is meaningless for continuous ranges; numeric and
        // datetime columns skip the frequency table entirely.
        summary.high_cardinality = true;
        return;
    }
    let values = column.valid_string_values().unwrap_or_default();
    let (n_unique, counts) = value_counts(&values, config.high_cardinality_threshold);
    summary.high_cardinality = n_unique >= config.high_cardinality_threshold;
    summary.categorical = Some(CategoricalSummary {
        n_unique,
        unique_proportion: if n_rows > 0 {
            n_unique as f64 / n_rows as f64
        } else {
            0.0
        },
        value_counts: counts.clone(),
    });
    if n_unique == 0 {
        // Entirely-null column: distinct from the constant case.
        return;
    }
    if n_unique == 1 {
        summary.value_is_constant = true;
        summary.constant_value = Some(ConstantValue::Text(elide_string(
            &counts[0].0,
            ELISION_LIMIT,
        )));
        return;
    }
    if let Some(renderer) = plots {
        summary.plots.insert(
            "value_counts_plot".to_string(),
            renderer.value_counts(&counts, n_unique),
        );
    }
}

fn add_numeric_summary(
    summary: &mut ColumnSummary,
    column: &Column,
    semantic: SemanticType,
    plots: Option<&dyn PlotRenderer>,
    order_column: Option<&Column>,
) {
    if semantic != SemanticType::Numeric {
        return;
    }
    // Reserved gate for a future low-cardinality numeric path; today
    // numeric columns are always high-cardinality.
    if !summary.high_cardinality {
        return;
    }
    let valid = column.valid_numeric_values().unwrap_or_default();
    if valid.is_empty() {
        return;
    }

    let mean = u_numflow::stats::mean(&valid).unwrap_or(f64::NAN);
    let standard_deviation = u_numflow::stats::std_dev(&valid).unwrap_or(f64::NAN);
    let quantiles = Quantiles {
        min: u_numflow::stats::min(&valid).unwrap_or(f64::NAN),
        q25: u_numflow::stats::quantile(&valid, 0.25).unwrap_or(f64::NAN),
        median: u_numflow::stats::median(&valid).unwrap_or(f64::NAN),
        q75: u_numflow::stats::quantile(&valid, 0.75).unwrap_or(f64::NAN),
        max: u_numflow::stats::max(&valid).unwrap_or(f64::NAN),
    };

    if quantiles.min == quantiles.max {
        // A single repeated value is not distributed, it is constant.
        summary.value_is_constant = true;
        summary.constant_value = Some(ConstantValue::Number(quantiles.min));
        return;
    }

    summary.numeric = Some(NumericSummary {
        mean,
        standard_deviation,
        inter_quartile_range: quantiles.q75 - quantiles.q25,
        quantiles,
    });

    let Some(renderer) = plots else {
        return;
    };
    match order_column {
        None => {
            summary.plots.insert(
                "histogram_plot".to_string(),
                renderer.histogram(&valid, Some("Value distribution")),
            );
        }
        Some(order) => {
            let (x, y) = line_series(order, column);
            summary
                .plots
                .insert("line_plot".to_string(), renderer.line(&x, &y));
        }
    }
}

fn add_datetime_summary(
    summary: &mut ColumnSummary,
    column: &Column,
    semantic: SemanticType,
    plots: Option<&dyn PlotRenderer>,
    order_column: Option<&Column>,
) {
    if semantic != SemanticType::Datetime {
        return;
    }
    let valid = column.valid_datetime_values().unwrap_or_default();
    if valid.is_empty() {
        return;
    }

    let mut min = valid[0];
    let mut max = valid[0];
    for &v in &valid[1..] {
        min = min.min(v);
        max = max.max(v);
    }

    if min == max {
        summary.value_is_constant = true;
        summary.constant_value = Some(ConstantValue::Text(format_timestamp(min)));
        return;
    }

    summary.datetime = Some(DatetimeSummary {
        min: format_timestamp(min),
        max: format_timestamp(max),
    });

    let Some(renderer) = plots else {
        return;
    };
    match order_column {
        None => {
            let as_floats: Vec<f64> = valid.iter().map(|&v| v as f64).collect();
            summary.plots.insert(
                "histogram_plot".to_string(),
                renderer.histogram(&as_floats, None),
            );
        }
        Some(order) => {
            let (x, y) = line_series(order, column);
            summary
                .plots
                .insert("line_plot".to_string(), renderer.line(&x, &y));
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────

/// Counts distinct values, returning the full distinct count and the
/// top-`threshold` frequency table (descending by count; ties keep
/// first-encountered order).
fn value_counts(values: &[String], threshold: usize) -> (usize, Vec<(String, usize)>) {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for v in values {
        let entry = counts.entry(v.as_str()).or_insert(0);
        if *entry == 0 {
            order.push(v.as_str());
        }
        *entry += 1;
    }
    let n_unique = order.len();
    let mut ranked: Vec<(usize, &str, usize)> = order
        .iter()
        .enumerate()
        .map(|(first_seen, &v)| (first_seen, v, counts[v]))
        .collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(threshold);
    (
        n_unique,
        ranked.into_iter().map(|(_, v, c)| (v.to_string(), c)).collect(),
    )
}

/// Builds the (x, y) series for a line plot of `column` against the
/// ordering column. Rows where the plotted column is null are skipped;
/// a non-numeric ordering column falls back to row positions.
fn line_series(order: &Column, column: &Column) -> (Vec<f64>, Vec<f64>) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for i in 0..column.len() {
        if !column.is_valid(i) {
            continue;
        }
        let y_value = match column {
            Column::Numeric { values, .. } => values[i],
            Column::Datetime { values, .. } => values[i] as f64,
            _ => continue,
        };
        let x_value = match order {
            Column::Numeric { values, validity } => {
                if !validity.is_valid(i) {
                    continue;
                }
                values[i]
            }
            Column::Datetime { values, validity } => {
                if !validity.is_valid(i) {
                    continue;
                }
                values[i] as f64
            }
            _ => i as f64,
        };
        x.push(x_value);
        y.push(y_value);
    }
    (x, y)
}

/// Shortens a long string for display, keeping a note of how much was cut.
pub fn elide_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        return s.to_string();
    }
    if max_len > 30 {
        let truncated = char_count - max_len;
        let keep: String = s.chars().take(max_len - 30).collect();
        format!("{keep}[… {truncated} more chars]")
    } else {
        let keep: String = s.chars().take(max_len).collect();
        format!("{keep}…")
    }
}

/// Formats a number with three significant digits; integers print plain.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let magnitude = value.abs();
    if magnitude >= 1e4 || magnitude < 1e-3 {
        return format!("{value:.2e}");
    }
    let decimals = (2 - magnitude.log10().floor() as i32).clamp(0, 10) as usize;
    format!("{value:.decimals$}")
}

/// Renders a detached cell value for display.
fn format_cell(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Number(v) => format_number(*v),
        CellValue::Bool(v) => v.to_string(),
        CellValue::Text(v) => v.clone(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
