use std::borrow::Cow;

use crate::analysis::correlation::{correlate, CorrelationMatrix};
use crate::analysis::statistics::{compute_stat, StatOutcome, Statistic};
use crate::config::AppConfig;
use crate::data::classify::category_of;
use crate::data::dates;
use crate::data::filter::{default_filter, filter, FilterConfig};
use crate::data::loader::{self, Loaded};
use crate::data::model::Dataset;
use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Session selections
// ---------------------------------------------------------------------------

/// A workbook waiting for the operator to pick one of its sheets.
#[derive(Debug, Clone)]
pub struct PendingWorkbook {
    pub file_name: String,
    pub sheets: Vec<String>,
    bytes: Vec<u8>,
}

/// Inputs of the statistical analysis section.
#[derive(Debug, Clone, Default)]
pub struct StatSelection {
    pub column: Option<String>,
    pub statistic: Option<Statistic>,
    pub visualize: bool,
}

/// Inputs of the correlation section.
#[derive(Debug, Clone, Default)]
pub struct CorrelationSelection {
    pub enabled: bool,
    pub columns: Vec<String>,
}

impl CorrelationSelection {
    /// Shown and at least two columns picked.
    pub fn ready(&self) -> bool {
        self.enabled && self.columns.len() >= 2
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering. Engine errors stop
/// here: they are logged and surfaced through `status_message`.
#[derive(Default)]
pub struct AppState {
    pub config: AppConfig,

    /// Loaded dataset (None until the user opens a file; empty after a
    /// failed load).
    pub dataset: Option<Dataset>,

    /// Name of the file (and sheet) the dataset came from.
    pub source_name: Option<String>,

    pub pending_workbook: Option<PendingWorkbook>,

    pub filters: FilterConfig,
    pub stats: StatSelection,
    pub correlation: CorrelationSelection,

    pub last_stat: Option<StatOutcome>,
    pub last_correlation: Option<CorrelationMatrix>,

    /// Filters in force when the current results were computed.
    results_filters: Option<FilterConfig>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Load an uploaded file. A workbook with several sheets is parked in
    /// `pending_workbook` until [`AppState::choose_sheet`] is called.
    pub fn open_bytes(&mut self, bytes: Vec<u8>, file_name: &str) {
        self.pending_workbook = None;
        if bytes.len() > self.config.max_file_size {
            self.fail_load(AnalysisError::ParseFailure(format!(
                "{file_name} is {} bytes, larger than the {} byte limit",
                bytes.len(),
                self.config.max_file_size
            )));
            return;
        }

        match loader::load(&bytes, file_name, None) {
            Ok(Loaded::Dataset(ds)) => self.set_dataset(ds, file_name.to_string()),
            Ok(Loaded::NeedsSheet(sheets)) => {
                log::info!("{file_name} has {} sheets, waiting for a choice", sheets.len());
                self.status_message = Some(format!("Select a sheet from {file_name}"));
                self.pending_workbook = Some(PendingWorkbook {
                    file_name: file_name.to_string(),
                    sheets,
                    bytes,
                });
            }
            Err(e) => self.fail_load(e),
        }
    }

    /// Load the chosen sheet of the pending workbook.
    pub fn choose_sheet(&mut self, sheet: &str) {
        let Some(pending) = self.pending_workbook.take() else {
            self.status_message = Some("No workbook is waiting for a sheet choice".to_string());
            return;
        };
        match loader::load(&pending.bytes, &pending.file_name, Some(sheet)) {
            Ok(Loaded::Dataset(ds)) => {
                self.set_dataset(ds, format!("{} [{sheet}]", pending.file_name))
            }
            Ok(Loaded::NeedsSheet(_)) => {
                // a named sheet never asks again; keep the workbook just in case
                self.pending_workbook = Some(pending);
            }
            Err(e) => self.fail_load(e),
        }
    }

    /// Ingest a newly loaded dataset and reset every selection and result.
    pub fn set_dataset(&mut self, dataset: Dataset, source_name: String) {
        log::info!(
            "Loaded {source_name}: {} rows × {} columns",
            dataset.row_count(),
            dataset.width()
        );
        self.filters = FilterConfig::default();
        self.stats = StatSelection::default();
        self.correlation = CorrelationSelection::default();
        self.last_stat = None;
        self.last_correlation = None;
        self.results_filters = None;
        self.status_message = None;
        self.source_name = Some(source_name);
        self.dataset = Some(dataset);
    }

    fn fail_load(&mut self, err: AnalysisError) {
        self.set_dataset(Dataset::default(), String::new());
        self.source_name = None;
        self.report(err);
    }

    fn report(&mut self, err: AnalysisError) {
        log::error!("{err}");
        self.status_message = Some(err.to_string());
    }

    /// The dataset after applying the current filters. Empty when nothing is
    /// loaded or a filter names a column that no longer exists.
    pub fn filtered(&self) -> Cow<'_, Dataset> {
        let Some(ds) = &self.dataset else {
            return Cow::Owned(Dataset::default());
        };
        filter(ds, &self.filters).unwrap_or_else(|e| {
            log::error!("Filtering failed: {e}");
            Cow::Owned(Dataset::default())
        })
    }

    pub fn set_filters_enabled(&mut self, enabled: bool) {
        self.filters.enabled = enabled;
        self.refresh_after_filter_change();
    }

    /// Drop results computed under different filters. The correlation matrix
    /// is recomputed when its selection is ready; a statistic waits for the
    /// next explicit run. Returns whether anything was stale.
    pub fn refresh_after_filter_change(&mut self) -> bool {
        if self.results_filters.as_ref().map_or(true, |f| *f == self.filters) {
            return false;
        }
        log::debug!("Filters changed, dropping stale results");
        self.results_filters = None;
        self.last_stat = None;
        self.last_correlation = None;
        if self.correlation.ready() {
            self.run_correlation();
        }
        true
    }

    /// Choose the filtered columns. Columns already filtered keep their
    /// predicate; new ones start from the default.
    pub fn set_filter_columns(&mut self, names: &[String]) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let columns = names
            .iter()
            .map(|name| {
                let predicate = match self.filters.get(name) {
                    Some(existing) => existing.clone(),
                    None => default_filter(ds.try_column(name)?),
                };
                Ok((name.clone(), predicate))
            })
            .collect::<Result<Vec<_>, AnalysisError>>();
        match columns {
            Ok(columns) => {
                self.filters.columns = columns;
                self.refresh_after_filter_change();
            }
            Err(e) => self.report(e),
        }
    }

    /// Run the selected statistic on the filtered data.
    pub fn run_statistic(&mut self) {
        self.last_stat = None;
        let (Some(column), Some(statistic)) = (self.stats.column.clone(), self.stats.statistic) else {
            self.status_message = Some("Select a column and a statistic first".to_string());
            return;
        };
        let result = compute_stat(&self.filtered(), &column, statistic);
        match result {
            Ok(outcome) => {
                self.status_message = None;
                self.last_stat = Some(outcome);
                self.results_filters = Some(self.filters.clone());
            }
            Err(e) => self.report(e),
        }
    }

    /// Correlate the selected columns on the filtered data.
    pub fn run_correlation(&mut self) {
        self.last_correlation = None;
        let result = correlate(&self.filtered(), &self.correlation.columns);
        match result {
            Ok(matrix) => {
                self.status_message = None;
                self.last_correlation = Some(matrix);
                self.results_filters = Some(self.filters.clone());
            }
            Err(e) => self.report(e),
        }
    }

    /// Convert text columns to datetimes in place. Filters on converted
    /// columns are reset since their widget kind changes.
    pub fn convert_dates(&mut self, columns: &[String]) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let converted = dates::convert_dates(ds, columns);
        self.replace_typed(converted, columns);
    }

    /// Treat a column as categorical from now on.
    pub fn mark_categorical(&mut self, column: &str) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let mut typed = ds.clone();
        if let Err(e) = typed.as_categorical(column) {
            self.report(e);
            return;
        }
        self.replace_typed(typed, &[column.to_string()]);
    }

    fn replace_typed(&mut self, dataset: Dataset, changed: &[String]) {
        for (name, predicate) in self.filters.columns.iter_mut() {
            if changed.contains(name) {
                if let Some(col) = dataset.column(name) {
                    *predicate = default_filter(col);
                }
            }
        }
        if let Some(column) = &self.stats.column {
            let still_applies = self.stats.statistic.is_some_and(|stat| {
                dataset
                    .column(column)
                    .is_some_and(|c| Statistic::available_for(category_of(c)).contains(&stat))
            });
            if !still_applies {
                self.stats.statistic = None;
            }
        }
        self.last_stat = None;
        self.last_correlation = None;
        self.results_filters = None;
        self.dataset = Some(dataset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::statistics::StatResult;
    use crate::data::filter::ColumnFilter;
    use crate::data::model::{CellValue, ColumnType};

    const DATA_CSV: &[u8] = b"A,B,C\n1,2,3\n4,5,6\n";

    fn loaded(csv: &[u8]) -> AppState {
        let mut state = AppState::default();
        state.open_bytes(csv.to_vec(), "data.csv");
        state
    }

    fn names(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn opening_csv_sets_dataset() {
        let state = loaded(DATA_CSV);
        let ds = state.dataset.as_ref().unwrap();
        assert_eq!(ds.column_names(), names(&["A", "B", "C"]));
        assert_eq!(ds.row_count(), 2);
        assert_eq!(state.source_name.as_deref(), Some("data.csv"));
        assert!(state.status_message.is_none());
    }

    #[test]
    fn unsupported_extension_leaves_empty_dataset_and_message() {
        let mut state = AppState::default();
        state.open_bytes(DATA_CSV.to_vec(), "data.txt");
        assert!(state.dataset.as_ref().unwrap().is_empty());
        assert_eq!(
            state.status_message.as_deref(),
            Some("Unsupported file type 'data.txt'. Please upload a CSV or Excel file.")
        );
    }

    #[test]
    fn oversized_upload_is_refused() {
        let mut state = AppState::new(AppConfig {
            max_file_size: 4,
            ..AppConfig::default()
        });
        state.open_bytes(DATA_CSV.to_vec(), "data.csv");
        assert!(state.dataset.as_ref().unwrap().is_empty());
        assert!(state.status_message.unwrap().starts_with("Failed to load file"));
    }

    #[test]
    fn choose_sheet_without_workbook_only_sets_message() {
        let mut state = loaded(DATA_CSV);
        state.choose_sheet("Sheet1");
        assert_eq!(state.dataset.as_ref().unwrap().row_count(), 2);
        assert!(state.status_message.is_some());
    }

    #[test]
    fn filter_columns_keep_existing_predicates() {
        let mut state = loaded(b"A,B\n1,x\n2,y\n3,z\n");
        state.set_filters_enabled(true);
        state.set_filter_columns(&names(&["A"]));
        *state.filters.get_mut("A").unwrap() =
            ColumnFilter::Membership([CellValue::Integer(2)].into_iter().collect());
        state.set_filter_columns(&names(&["A", "B"]));

        assert_eq!(state.filters.columns.len(), 2);
        let filtered = state.filtered();
        assert_eq!(filtered.row_count(), 1);
        assert_eq!(filtered.column("B").unwrap().values, vec![CellValue::Text("y".into())]);

        state.set_filters_enabled(false);
        assert_eq!(state.filtered().row_count(), 3);
    }

    #[test]
    fn unknown_filter_column_is_reported() {
        let mut state = loaded(DATA_CSV);
        state.set_filter_columns(&names(&["Z"]));
        assert!(state.filters.columns.is_empty());
        assert_eq!(state.status_message.as_deref(), Some("Column 'Z' does not exist"));
    }

    #[test]
    fn statistic_runs_on_filtered_rows() {
        let mut state = loaded(b"v\n1\n2\n3\n10\n");
        state.stats.column = Some("v".into());
        state.stats.statistic = Some(Statistic::Mean);
        state.run_statistic();
        assert_eq!(state.last_stat.as_ref().unwrap().result, StatResult::Scalar(4.0));

        state.set_filters_enabled(true);
        state.set_filter_columns(&names(&["v"]));
        *state.filters.get_mut("v").unwrap() =
            ColumnFilter::Membership([CellValue::Integer(1), CellValue::Integer(3)].into_iter().collect());
        state.run_statistic();
        assert_eq!(state.last_stat.as_ref().unwrap().result, StatResult::Scalar(2.0));
    }

    #[test]
    fn failing_statistic_clears_result() {
        let mut state = loaded(b"v,t\n1,a\n2,b\n");
        state.stats.column = Some("t".into());
        state.stats.statistic = Some(Statistic::Mean);
        state.run_statistic();
        assert!(state.last_stat.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn correlation_needs_two_columns() {
        let mut state = loaded(DATA_CSV);
        state.correlation.columns = names(&["A"]);
        state.run_correlation();
        assert!(state.last_correlation.is_none());
        assert!(state.status_message.unwrap().contains("at least two"));
    }

    #[test]
    fn correlation_selection_is_ready_with_two_columns() {
        let mut state = loaded(DATA_CSV);
        state.correlation.enabled = true;
        state.correlation.columns = names(&["A"]);
        assert!(!state.correlation.ready());
        state.correlation.columns.push("B".into());
        assert!(state.correlation.ready());
        state.correlation.enabled = false;
        assert!(!state.correlation.ready());
    }

    #[test]
    fn filter_change_drops_the_statistic_and_recomputes_the_matrix() {
        let mut state = loaded(b"x,y,g\n1,2,a\n2,4,a\n3,5,b\n4,1,b\n");
        state.stats.column = Some("x".into());
        state.stats.statistic = Some(Statistic::Mean);
        state.run_statistic();
        state.correlation.enabled = true;
        state.correlation.columns = names(&["x", "y"]);
        state.run_correlation();
        let before = state.last_correlation.as_ref().unwrap().between("x", "y").unwrap();
        assert!(before < 1.0);

        state.set_filters_enabled(true);
        state.set_filter_columns(&names(&["g"]));
        *state.filters.get_mut("g").unwrap() =
            ColumnFilter::Membership([CellValue::Text("a".into())].into_iter().collect());
        assert!(state.refresh_after_filter_change());

        assert!(state.last_stat.is_none());
        let m = state.last_correlation.as_ref().unwrap();
        assert_eq!(m.between("x", "y"), Some(1.0));
        assert!(state.status_message.is_none());
    }

    #[test]
    fn unchanged_filters_keep_results() {
        let mut state = loaded(b"v\n1\n2\n3\n");
        state.set_filters_enabled(true);
        state.stats.column = Some("v".into());
        state.stats.statistic = Some(Statistic::Median);
        state.run_statistic();

        assert!(!state.refresh_after_filter_change());
        state.set_filters_enabled(true);
        assert_eq!(state.last_stat.as_ref().unwrap().result, StatResult::Scalar(2.0));
    }

    #[test]
    fn stale_matrix_is_dropped_when_selection_is_incomplete() {
        let mut state = loaded(b"x,y\n1,2\n2,4\n3,7\n");
        state.correlation.enabled = true;
        state.correlation.columns = names(&["x", "y"]);
        state.run_correlation();
        assert!(state.last_correlation.is_some());

        state.correlation.columns = names(&["x"]);
        state.set_filters_enabled(true);
        assert!(state.last_correlation.is_none());
        assert!(state.status_message.is_none());
    }

    #[test]
    fn correlation_of_perfectly_related_columns() {
        let mut state = loaded(b"x,y\n1,2\n2,4\n3,6\n");
        state.correlation.columns = names(&["x", "y"]);
        state.run_correlation();
        let m = state.last_correlation.unwrap();
        assert_eq!(m.between("x", "y"), Some(1.0));
    }

    #[test]
    fn date_conversion_resets_the_column_filter() {
        let mut state = loaded(b"d\n2024-01-01\n2024-01-02\nsoon\n");
        state.set_filters_enabled(true);
        state.set_filter_columns(&names(&["d"]));
        assert!(matches!(state.filters.get("d"), Some(ColumnFilter::Membership(_))));

        state.convert_dates(&names(&["d"]));
        let col = state.dataset.as_ref().unwrap().column("d").unwrap();
        assert_eq!(col.dtype, ColumnType::DateTime);
        assert!(col.values[2].is_null());
        // still low-cardinality, but rebuilt from the converted values
        let Some(ColumnFilter::Membership(selected)) = state.filters.get("d") else {
            panic!("expected membership filter");
        };
        assert!(selected.contains(&CellValue::Null));
        assert_eq!(state.filtered().row_count(), 3);
    }

    #[test]
    fn marking_categorical_drops_stale_statistic() {
        let mut state = loaded(b"t\nlong text\nother text\n");
        state.stats.column = Some("t".into());
        state.stats.statistic = Some(Statistic::TextLengthSummary);
        state.mark_categorical("t");
        assert_eq!(
            state.dataset.as_ref().unwrap().column("t").unwrap().dtype,
            ColumnType::Categorical
        );
        assert!(state.stats.statistic.is_none());

        state.mark_categorical("missing");
        assert_eq!(state.status_message.as_deref(), Some("Column 'missing' does not exist"));
    }
}
