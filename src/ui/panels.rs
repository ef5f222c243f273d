use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::legend_entries;
use crate::config::{Delimiter, Separator};
use crate::state::{AppState, Status};

// ---------------------------------------------------------------------------
// Left side panel – data and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel: loading options, contrast and thresholds.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Data");
            ui.separator();

            if ui.button("Open table…").clicked() {
                open_file_dialog(state);
            }

            // ---- Separator for delimited text ----
            let mut separator = state.separator;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Separator");
                egui::ComboBox::from_id_salt("separator")
                    .selected_text(separator.to_string())
                    .show_ui(ui, |ui: &mut Ui| {
                        for sep in Separator::ALL {
                            ui.selectable_value(&mut separator, sep, sep.to_string());
                        }
                    });
            });
            // Re-reads the loaded file with the new separator.
            state.set_separator(separator);

            let Some(table) = &state.table else {
                ui.label("No table loaded.");
                return;
            };

            if let Some(name) = &state.source_name {
                ui.label(RichText::new(name).italics());
            }
            ui.label(format!("{} rows × {} columns", table.len(), table.columns.len()));

            // ---- Gene column ----
            let current_gene = table.gene_column();
            let mut chosen_gene = current_gene;
            ui.strong("Gene column");
            egui::ComboBox::from_id_salt("gene_column")
                .selected_text(table.gene_column_name())
                .show_ui(ui, |ui: &mut Ui| {
                    for (idx, name) in table.columns.iter().enumerate() {
                        ui.add_enabled_ui(table.is_valid_gene_column(idx), |ui: &mut Ui| {
                            ui.selectable_value(&mut chosen_gene, idx, name);
                        });
                    }
                });
            if chosen_gene != current_gene {
                state.set_gene_column(chosen_gene);
            }

            ui.add_space(8.0);
            ui.heading("Filters");
            ui.separator();

            if state.detection.contrasts.is_empty() {
                ui.label("No contrasts detected.");
                return;
            }

            // ---- Contrast selector ----
            ui.strong("Contrast");
            let current = state.selected_contrast.clone().unwrap_or_default();
            let mut chosen = current.clone();
            let selected_text = state
                .selected()
                .map(|c| c.display_name().to_string())
                .unwrap_or_default();
            egui::ComboBox::from_id_salt("contrast")
                .selected_text(selected_text)
                .show_ui(ui, |ui: &mut Ui| {
                    for c in &state.detection.contrasts {
                        ui.selectable_value(&mut chosen, c.name.clone(), c.display_name());
                    }
                });
            if chosen != current {
                state.select_contrast(&chosen);
            }

            // ---- Thresholds ----
            ui.add_space(4.0);
            let mut logfc = state.logfc_input;
            let mut fdr = state.fdr_input;
            let mut changed = false;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("|logFC| ≥");
                changed |= ui
                    .add(egui::DragValue::new(&mut logfc).speed(0.05).max_decimals(3))
                    .changed();
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("adj.P.Val ≤");
                changed |= ui
                    .add(egui::DragValue::new(&mut fdr).speed(0.001).max_decimals(4))
                    .changed();
            });
            if changed {
                state.apply_thresholds(logfc, fdr);
            }

            if let Some(degs) = &state.degs {
                ui.label(format!("{} DEGs ({} up, {} down)", degs.len(), degs.up, degs.down));
            }

            // ---- Legend ----
            ui.add_space(8.0);
            ui.strong("Legend");
            for (label, color) in legend_entries() {
                ui.label(RichText::new(format!("● {label}")).color(color));
            }
        });
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
            let can_export = state.degs.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export DEGs…"))
                .clicked()
            {
                save_export_dialog(state);
                ui.close_menu();
            }
            ui.menu_button("Export format", |ui: &mut Ui| {
                ui.selectable_value(&mut state.export_delimiter, Delimiter::Comma, "CSV");
                ui.selectable_value(&mut state.export_delimiter, Delimiter::Tab, "TSV");
            });
        });

        ui.separator();

        if let (Some(table), Some(degs)) = (&state.table, &state.degs) {
            ui.label(format!("{} genes, {} DEGs", table.len(), degs.len()));
            ui.separator();
        }

        match &state.status {
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open differential expression table")
        .add_filter(
            "Supported files",
            &["tsv", "csv", "txt", "xlsx", "xls", "ods", "parquet", "pq", "json"],
        )
        .add_filter("Delimited text", &["tsv", "csv", "txt"])
        .add_filter("Spreadsheet", &["xlsx", "xls", "xlsm", "ods"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

pub fn save_export_dialog(state: &mut AppState) {
    let suggested = match state.export() {
        Some(Ok((name, _))) => name,
        Some(Err(e)) => {
            log::error!("Export failed: {e:#}");
            state.status = Some(Status::Error(format!("Export failed: {e}")));
            return;
        }
        None => return,
    };
    let file = rfd::FileDialog::new()
        .set_title("Save DEG table")
        .set_file_name(suggested)
        .save_file();

    if let Some(path) = file {
        state.save_export(&path);
    }
}
