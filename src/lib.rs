//! Interactive exploration of tabular data: load a CSV or Excel sheet, narrow
//! it with per-column filters, then compute descriptive statistics and
//! pairwise correlations over the filtered rows.
//!
//! The data and analysis layers have no UI dependency; `app`, `ui` and
//! `color` render them with egui.

pub mod analysis;
pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod ui;

pub use error::{AnalysisError, Result};
