use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::RATE_COLUMNS;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Results table (central panel)
// ---------------------------------------------------------------------------

/// Format a fractional rate (0.31) as a percentage string ("31.00%").
pub fn format_percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

/// Render the current page of filtered survey records.
///
/// The viewable columns are `Institutions` plus the six rates; the raw
/// `Filters` label only drives the selectors and stays out of the table.
pub fn results_table(ui: &mut Ui, state: &AppState) {
    let rows = state.page_rows();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::auto().at_least(160.0))
        .columns(Column::remainder().at_least(70.0), RATE_COLUMNS.len())
        .header(22.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Institutions");
            });
            for name in RATE_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(20.0, rows.len(), |mut row| {
                let record = &state.dataset.records[rows[row.index()]];
                row.col(|ui: &mut Ui| {
                    ui.label(&record.institution);
                });
                for rate in record.rates() {
                    row.col(|ui: &mut Ui| {
                        ui.label(format_percent(rate));
                    });
                }
            });
        });
}
