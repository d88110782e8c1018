use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{CellValue, Dataset};

/// Render a dataset as a striped table with a header row.
///
/// `max_height` bounds the scroll area; `None` lays out every row.
pub fn data_table(ui: &mut Ui, id: &str, dataset: &Dataset, row_height: f32, max_height: Option<f32>) {
    if dataset.width() == 0 {
        ui.label("No columns.");
        return;
    }

    let mut table = TableBuilder::new(ui)
        .id_salt(id)
        .striped(true)
        .resizable(true)
        .columns(Column::auto().at_least(60.0).clip(true), dataset.width());
    table = match max_height {
        Some(h) => table.max_scroll_height(h),
        None => table.vscroll(false),
    };

    table
        .header(row_height + 4.0, |mut header| {
            for column in dataset.columns() {
                header.col(|ui: &mut Ui| {
                    ui.strong(&column.name)
                        .on_hover_text(column.dtype.to_string());
                });
            }
        })
        .body(|body| {
            body.rows(row_height, dataset.row_count(), |mut row| {
                let index = row.index();
                for column in dataset.columns() {
                    row.col(|ui: &mut Ui| match &column.values[index] {
                        CellValue::Null => {
                            ui.label(RichText::new("<null>").weak().italics());
                        }
                        value => {
                            ui.label(value.to_string());
                        }
                    });
                }
            });
        });
}
