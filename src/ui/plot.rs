use eframe::egui::{self, RichText, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::analysis::correlation::CorrelationMatrix;
use crate::analysis::statistics::Chart;
use crate::color;

/// Bars beyond this count share one colour.
const MAX_DISTINCT_COLOURS: usize = 24;

// ---------------------------------------------------------------------------
// Bar chart (statistics)
// ---------------------------------------------------------------------------

/// Render a statistic's chart, one bar per entry, labelled on the x axis.
pub fn bar_chart(ui: &mut Ui, chart: &Chart) {
    ui.strong(&chart.title);

    let palette = color::generate_palette(chart.bars.len().min(MAX_DISTINCT_COLOURS));
    let bars: Vec<Bar> = chart
        .bars
        .iter()
        .enumerate()
        .map(|(i, (label, height))| {
            let mut bar = Bar::new(i as f64, *height).name(label).width(0.8);
            if let Some(c) = palette.get(i) {
                bar = bar.fill(*c);
            }
            bar
        })
        .collect();

    let labels: Vec<String> = chart.bars.iter().map(|(l, _)| l.clone()).collect();
    Plot::new(("stat_chart", &chart.title))
        .height(260.0)
        .allow_drag(true)
        .allow_zoom(true)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| {
            let v = mark.value;
            if v.fract() != 0.0 || v < 0.0 {
                return String::new();
            }
            labels.get(v as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

/// Colour-coded matrix with two-decimal annotations.
pub fn heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    egui::Grid::new("correlation_heatmap")
        .spacing([2.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for name in &matrix.columns {
                ui.strong(name);
            }
            ui.end_row();

            for (i, row_name) in matrix.columns.iter().enumerate() {
                ui.strong(row_name);
                for j in 0..matrix.len() {
                    let r = matrix.get(i, j).unwrap_or(f64::NAN);
                    let text = RichText::new(format!(" {r:.2} "))
                        .monospace()
                        .background_color(color::diverging(r))
                        .color(color::diverging_text(r));
                    ui.label(text);
                }
                ui.end_row();
            }
        });

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Scale:");
        for v in [-1.0, -0.5, 0.0, 0.5, 1.0] {
            ui.label(
                RichText::new(format!(" {v:+.1} "))
                    .monospace()
                    .background_color(color::diverging(v))
                    .color(color::diverging_text(v)),
            );
        }
    });
}
