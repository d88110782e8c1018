use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::classify::{category_of, ColumnCategory};
use crate::data::filter::{datetime_bounds, numeric_bounds, ColumnFilter};
use crate::data::model::{Column, ColumnType};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets and column typing
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };
    if dataset.width() == 0 {
        ui.label("Dataset is empty.");
        return;
    }
    let all_columns = dataset.column_names();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let mut enabled = state.filters.enabled;
            if ui.checkbox(&mut enabled, "Add filters").changed() {
                state.set_filters_enabled(enabled);
            }

            if state.filters.enabled {
                // ---- Column multi-select ----
                let mut chosen: Vec<String> =
                    state.filters.columns.iter().map(|(c, _)| c.clone()).collect();
                let mut changed = false;
                ui.menu_button(format!("Columns to filter ({})", chosen.len()), |ui: &mut Ui| {
                    for col in &all_columns {
                        let mut on = chosen.contains(col);
                        if ui.checkbox(&mut on, col).changed() {
                            changed = true;
                            if on {
                                chosen.push(col.clone());
                            } else {
                                chosen.retain(|c| c != col);
                            }
                        }
                    }
                });
                if changed {
                    state.set_filter_columns(&chosen);
                }

                ui.separator();
                filter_widgets(ui, state);
            }

            ui.separator();
            typing_tools(ui, state);
        });
}

/// One collapsible widget per filtered column.
fn filter_widgets(ui: &mut Ui, state: &mut AppState) {
    let AppState {
        dataset: Some(dataset),
        filters,
        ..
    } = state
    else {
        return;
    };

    for (name, predicate) in filters.columns.iter_mut() {
        let Some(column) = dataset.column(name) else {
            continue;
        };
        egui::CollapsingHeader::new(RichText::new(name.as_str()).strong())
            .id_salt(("filter", name.as_str()))
            .default_open(true)
            .show(ui, |ui: &mut Ui| match predicate {
                ColumnFilter::Membership(selected) => {
                    let all_values = column.distinct_values();
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label(format!("{}/{}", selected.len(), all_values.len()));
                        if ui.small_button("All").clicked() {
                            *selected = all_values.clone();
                        }
                        if ui.small_button("None").clicked() {
                            selected.clear();
                        }
                    });
                    for val in &all_values {
                        let mut checked = selected.contains(val);
                        if ui.checkbox(&mut checked, val.to_string()).changed() {
                            if checked {
                                selected.insert(val.clone());
                            } else {
                                selected.remove(val);
                            }
                        }
                    }
                }
                ColumnFilter::Range { min, max } => range_widget(ui, column, min, max),
                ColumnFilter::DateRange { start, end } => date_widget(ui, column, name, start, end),
                ColumnFilter::Contains(needle) => {
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label("Contains");
                        ui.text_edit_singleline(needle);
                    });
                }
            });
    }
}

fn range_widget(ui: &mut Ui, column: &Column, min: &mut f64, max: &mut f64) {
    let Some((lo, hi)) = numeric_bounds(column) else {
        ui.label("No numeric values.");
        return;
    };
    let integral = column.dtype == ColumnType::Integer;
    for (value, label) in [(&mut *min, "min"), (&mut *max, "max")] {
        let mut slider = egui::Slider::new(value, lo..=hi).text(label);
        if integral {
            slider = slider.integer();
        }
        ui.add(slider);
    }
    if *min > *max {
        std::mem::swap(min, max);
    }
}

fn date_widget(
    ui: &mut Ui,
    column: &Column,
    name: &str,
    start: &mut NaiveDateTime,
    end: &mut NaiveDateTime,
) {
    if datetime_bounds(column).is_none() {
        ui.label("No date values.");
        return;
    }
    let mut from: NaiveDate = start.date();
    let mut to: NaiveDate = end.date();
    ui.horizontal(|ui: &mut Ui| {
        ui.label("From");
        if ui
            .add(DatePickerButton::new(&mut from).id_salt(&format!("{name}_from")))
            .changed()
        {
            *start = from.and_time(NaiveTime::MIN);
        }
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.label("To");
        if ui
            .add(DatePickerButton::new(&mut to).id_salt(&format!("{name}_to")))
            .changed()
        {
            // inclusive of the whole end day
            *end = to.and_time(NaiveTime::MIN) + chrono::Duration::days(1)
                - chrono::Duration::microseconds(1);
        }
    });
}

/// Explicit typing actions: text → datetime, any column → categorical.
fn typing_tools(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let text_columns: Vec<String> = dataset
        .columns()
        .iter()
        .filter(|c| matches!(c.dtype, ColumnType::Text | ColumnType::Categorical))
        .map(|c| c.name.clone())
        .collect();
    let categorizable: Vec<String> = dataset
        .columns()
        .iter()
        .filter(|c| !matches!(category_of(c), ColumnCategory::Categorical | ColumnCategory::Datetime))
        .map(|c| c.name.clone())
        .collect();

    let mut to_dates: Option<String> = None;
    let mut to_category: Option<String> = None;

    egui::CollapsingHeader::new(RichText::new("Column types").strong())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.menu_button("Convert to datetime…", |ui: &mut Ui| {
                for name in &text_columns {
                    if ui.button(name).clicked() {
                        to_dates = Some(name.clone());
                        ui.close_menu();
                    }
                }
            });
            ui.menu_button("Treat as category…", |ui: &mut Ui| {
                for name in &categorizable {
                    if ui.button(name).clicked() {
                        to_category = Some(name.clone());
                        ui.close_menu();
                    }
                }
            });
        });

    if let Some(name) = to_dates {
        state.convert_dates(&[name]);
    }
    if let Some(name) = to_category {
        state.mark_categorical(&name);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(name)) = (&state.dataset, &state.source_name) {
            ui.label(format!(
                "{name}: {} rows × {} columns",
                ds.row_count(),
                ds.width()
            ));
            ui.separator();
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

/// Sheet choice for a multi-sheet workbook; shown instead of the data views.
pub fn sheet_picker(ui: &mut Ui, state: &mut AppState) {
    let Some(pending) = &state.pending_workbook else {
        return;
    };
    let mut chosen: Option<String> = None;
    ui.heading(format!("{} contains several sheets", pending.file_name));
    ui.label("Select a sheet to load:");
    for sheet in &pending.sheets {
        if ui.button(sheet).clicked() {
            chosen = Some(sheet.clone());
        }
    }
    if let Some(sheet) = chosen {
        state.choose_sheet(&sheet);
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open data file")
        .add_filter("Supported files", &["csv", "xlsx", "xls"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xls"])
        .pick_file();

    let Some(path) = file else {
        return;
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match std::fs::read(&path) {
        Ok(bytes) => state.open_bytes(bytes, &file_name),
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
