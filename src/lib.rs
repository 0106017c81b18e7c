//! # tablescope
//!
//! Tabular dataset profiling engine.
//!
//! tablescope turns a table of heterogeneously-typed columns into a
//! structured summary: per-column descriptive statistics, cardinality and
//! missing-value diagnostics, and a ranked table of pairwise column
//! associations. The summary is a plain data structure — independent
//! renderers consume it and produce HTML, text, or JSON.
//!
//! ## Modules
//!
//! - [`dataframe`] — Column-major tabular data model (DataFrame, Column, validity bitmaps)
//! - [`csv_parser`] — CSV parsing with automatic type inference (numeric, boolean, datetime, categorical, text)
//! - [`reader`] — File reading: CSV and Parquet, dispatched by extension
//! - [`summarize`] — Column-level and dataframe-level summarization
//! - [`associations`] — Pairwise column associations (Cramér's V over discretized columns)
//! - [`sample`] — Deterministic random sampling
//! - [`plot`] — Plot renderer collaborator boundary
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use tablescope::csv_parser::CsvParser;
//! use tablescope::summarize::{summarize_dataframe, SummaryConfig, SummaryOptions};
//!
//! let csv = "name,score,active\nAlice,1.5,true\nBob,2.3,false\nCharlie,3.1,true\n";
//! let df = CsvParser::new().parse_str(csv).unwrap();
//!
//! let summary = summarize_dataframe(
//!     &df,
//!     &SummaryConfig::default(),
//!     &SummaryOptions::default(),
//! ).unwrap();
//!
//! assert_eq!(summary.n_rows, 3);
//! assert_eq!(summary.n_columns, 3);
//! assert_eq!(summary.columns[1].dtype_name, "Numeric");
//!
//! // The summary serializes without custom encoders.
//! let json = summary.to_json().unwrap();
//! assert!(json.contains("\"n_rows\":3"));
//! ```

pub mod associations;
pub mod csv_parser;
pub mod dataframe;
pub mod error;
pub mod plot;
pub mod reader;
pub mod sample;
pub mod summarize;
