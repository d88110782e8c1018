use eframe::egui::{self, RichText, Ui};

use crate::analysis::statistics::{StatOutcome, StatResult, Statistic};
use crate::data::classify::{category_of, numeric_columns};
use crate::state::AppState;
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Data views
// ---------------------------------------------------------------------------

/// Preview of the loaded data and the filtered table.
pub fn data_views(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let row_height = state.config.table_row_height;

    ui.heading("Data Preview");
    table::data_table(
        ui,
        "preview",
        &dataset.head(state.config.preview_rows),
        row_height,
        None,
    );

    ui.add_space(8.0);
    let filtered = state.filtered();
    ui.heading("Filtered Data");
    ui.label(format!(
        "{} of {} rows",
        filtered.row_count(),
        dataset.row_count()
    ));
    table::data_table(ui, "filtered", &filtered, row_height, Some(300.0));
}

// ---------------------------------------------------------------------------
// Statistical analysis
// ---------------------------------------------------------------------------

pub fn statistics_section(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    ui.heading("Statistical Analysis");

    let columns = dataset.column_names();
    let offered: Vec<Statistic> = state
        .stats
        .column
        .as_deref()
        .and_then(|name| dataset.column(name))
        .map(|c| Statistic::available_for(category_of(c)).to_vec())
        .unwrap_or_default();

    let mut column_changed = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Column");
        egui::ComboBox::from_id_salt("stat_column")
            .selected_text(state.stats.column.clone().unwrap_or_default())
            .show_ui(ui, |ui: &mut Ui| {
                for col in &columns {
                    let selected = state.stats.column.as_deref() == Some(col.as_str());
                    if ui.selectable_label(selected, col).clicked() && !selected {
                        state.stats.column = Some(col.clone());
                        column_changed = true;
                    }
                }
            });

        ui.label("Statistic");
        egui::ComboBox::from_id_salt("stat_kind")
            .selected_text(state.stats.statistic.map(|s| s.name()).unwrap_or(""))
            .show_ui(ui, |ui: &mut Ui| {
                for stat in &offered {
                    ui.selectable_value(&mut state.stats.statistic, Some(*stat), stat.name());
                }
            });
    });
    if column_changed {
        state.stats.statistic = None;
        state.last_stat = None;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut state.stats.visualize, "Visualize Results");
        if ui.button("Calculate").clicked() {
            state.run_statistic();
        }
    });

    if let Some(outcome) = &state.last_stat {
        ui.add_space(4.0);
        match (&outcome.chart, state.stats.visualize) {
            (Some(chart), true) => plot::bar_chart(ui, chart),
            _ => stat_result(ui, outcome),
        }
    }
}

fn stat_result(ui: &mut Ui, outcome: &StatOutcome) {
    ui.strong(format!("{} of {}", outcome.statistic, outcome.column));
    match &outcome.result {
        StatResult::Summary(summary) => {
            egui::Grid::new("stat_summary").striped(true).show(ui, |ui: &mut Ui| {
                for (label, value) in summary.rows() {
                    ui.label(label);
                    ui.monospace(value);
                    ui.end_row();
                }
            });
        }
        StatResult::Scalar(v) => {
            ui.monospace(format!("{v:.6}"));
        }
        StatResult::Count(n) => {
            ui.monospace(n.to_string());
        }
        StatResult::Values(values) => {
            for v in values {
                ui.monospace(v.to_string());
            }
        }
        StatResult::Frequencies(counts) => {
            egui::Grid::new("stat_frequencies").striped(true).show(ui, |ui: &mut Ui| {
                ui.strong("value");
                ui.strong("count");
                ui.end_row();
                for (v, n) in counts {
                    ui.label(v.to_string());
                    ui.monospace(n.to_string());
                    ui.end_row();
                }
            });
        }
        StatResult::NormalTest { statistic, p_value } => {
            ui.monospace(format!("statistic = {statistic:.6}"));
            ui.monospace(format!("p-value   = {p_value:.6}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Correlation analysis
// ---------------------------------------------------------------------------

pub fn correlation_section(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        return;
    }
    ui.heading("Correlation Analysis");

    let mut changed = ui
        .checkbox(&mut state.correlation.enabled, "Show Correlation Matrix")
        .changed();
    if !state.correlation.enabled {
        return;
    }

    let numeric = numeric_columns(&state.filtered());
    if numeric.is_empty() {
        ui.label("No numerical columns available.");
        return;
    }

    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label("Columns:");
        for name in &numeric {
            let mut on = state.correlation.columns.contains(name);
            if ui.checkbox(&mut on, name).changed() {
                changed = true;
                if on {
                    state.correlation.columns.push(name.clone());
                } else {
                    state.correlation.columns.retain(|c| c != name);
                }
            }
        }
    });

    if state.correlation.ready() {
        if changed || ui.button("Recalculate").clicked() {
            state.run_correlation();
        }
    } else if changed {
        state.last_correlation = None;
    }

    match &state.last_correlation {
        Some(matrix) => plot::heatmap(ui, matrix),
        None if state.correlation.columns.len() < 2 => {
            ui.label(RichText::new("Select at least two numerical columns.").weak());
        }
        None => {}
    }
}
