use analytiq_flow::app::AnalytiqFlowApp;
use analytiq_flow::config::AppConfig;
use anyhow::Context;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::load().context("loading configuration")?;
    log::debug!("{config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size(config.min_window_size),
        ..Default::default()
    };

    eframe::run_native(
        "AnalytiqFlow",
        options,
        Box::new(move |_cc| Ok(Box::new(AnalytiqFlowApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
