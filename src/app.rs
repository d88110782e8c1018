use eframe::egui::{self, ScrollArea, Ui};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::{analysis, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AnalytiqFlowApp {
    pub state: AppState,
}

impl AnalytiqFlowApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for AnalytiqFlowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Sheet choice blocks everything else ----
        if self.state.pending_workbook.is_some() {
            egui::CentralPanel::default().show(ctx, |ui| {
                panels::sheet_picker(ui, &mut self.state);
            });
            return;
        }

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });
        self.state.refresh_after_filter_change();

        // ---- Central panel: tables and analysis ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a CSV or Excel file to begin  (File → Open…)");
                });
                return;
            }
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    analysis::data_views(ui, &self.state);
                    ui.separator();
                    analysis::statistics_section(ui, &mut self.state);
                    ui.separator();
                    analysis::correlation_section(ui, &mut self.state);
                });
        });
    }
}
