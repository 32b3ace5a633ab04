use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, table};

/// The survey question every favorability column answers.
pub const DASHBOARD_TITLE: &str =
    "Do you have a favorable or unfavorable opinion of each of the following Institutions?";

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PollviewApp {
    pub state: AppState,
}

impl PollviewApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for PollviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(230.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: pagination ----
        egui::TopBottomPanel::bottom("pagination_bar").show(ctx, |ui| {
            panels::pagination_bar(ui, &mut self.state);
        });

        // ---- Central panel: results table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(DASHBOARD_TITLE);
            });
            ui.add_space(6.0);
            table::results_table(ui, &self.state);
        });
    }
}
