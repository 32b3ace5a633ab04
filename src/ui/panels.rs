use eframe::egui::{self, Color32, ScrollArea, Ui, RichText};

use crate::data::model::FilterDimension;
use crate::state::{AppState, PAGE_SIZES};

// ---------------------------------------------------------------------------
// Left side panel – facet selectors
// ---------------------------------------------------------------------------

/// Render the left filter panel: one selector per facet plus the page size.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // Clone the option lists so we can mutate state inside the loops.
    let options = state.dataset.options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Institution");
            if let Some(change) = option_combo(
                ui,
                "institution_filter",
                state.selection.institution.as_deref(),
                &options.institutions,
            ) {
                state.set_institution(change);
            }
            ui.add_space(8.0);

            for dim in FilterDimension::ALL {
                ui.strong(dim.label());
                if let Some(change) =
                    option_combo(ui, dim.label(), state.selection.bracket(dim), options.brackets(dim))
                {
                    state.set_bracket(dim, change);
                }
                ui.add_space(8.0);
            }

            ui.separator();

            // Not clearable: the table always has a page size.
            ui.strong("Show number of rows");
            let mut picked = None;
            egui::ComboBox::from_id_salt("page_size")
                .selected_text(state.page_size.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for size in PAGE_SIZES {
                        if ui
                            .selectable_label(state.page_size == size, size.to_string())
                            .clicked()
                        {
                            picked = Some(size);
                        }
                    }
                });
            if let Some(size) = picked {
                state.set_page_size(size);
            }
        });
}

/// Render one clearable facet selector.  Returns the new selection when the
/// user picked an entry; the "All" entry clears the facet.
fn option_combo(
    ui: &mut Ui,
    id: &str,
    selected: Option<&str>,
    options: &[String],
) -> Option<Option<String>> {
    let mut change = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.unwrap_or("All").to_string())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(selected.is_none(), "All").clicked() {
                change = Some(None);
            }
            for value in options {
                if ui
                    .selectable_label(selected == Some(value.as_str()), value)
                    .clicked()
                {
                    change = Some(Some(value.clone()));
                }
            }
        });
    change
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status bar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} records loaded, {} visible",
            state.dataset.len(),
            state.visible_rows.len()
        ));

        ui.separator();

        if let Some(name) = state.source_path.file_name().and_then(|n| n.to_str()) {
            ui.label(name);
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Bottom bar – pagination
// ---------------------------------------------------------------------------

/// Render the pagination strip under the table.
pub fn pagination_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        if ui
            .add_enabled(state.page > 0, egui::Button::new("◀ Prev"))
            .clicked()
        {
            state.prev_page();
        }
        ui.label(format!("Page {} of {}", state.page + 1, state.page_count()));
        if ui
            .add_enabled(
                state.page + 1 < state.page_count(),
                egui::Button::new("Next ▶"),
            )
            .clicked()
        {
            state.next_page();
        }

        ui.separator();
        ui.label(format!("{} rows", state.visible_rows.len()));
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open survey data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq", "xlsx"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("Excel", &["xlsx"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} records ({} filterable) from {}",
                    dataset.len(),
                    dataset.baseline.len(),
                    path.display()
                );
                state.set_dataset(dataset, path);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
