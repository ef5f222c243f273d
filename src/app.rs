use eframe::egui::{self, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, tables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Tab {
    #[default]
    Exploration,
    VolcanoMa,
    Degs,
    Gene,
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DegLensApp {
    pub state: AppState,
    tab: Tab,
}

impl DegLensApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tab: Tab::default(),
        }
    }
}

impl eframe::App for DegLensApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: data + filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Exploration, "Exploration");
                ui.selectable_value(&mut self.tab, Tab::VolcanoMa, "Volcano / MA");
                ui.selectable_value(&mut self.tab, Tab::Degs, "DEGs");
                ui.selectable_value(&mut self.tab, Tab::Gene, "Gene");
            });
            ui.separator();

            if self.state.table.is_none() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a differential expression table to begin  (File → Open…)");
                });
                return;
            }

            match self.tab {
                Tab::Exploration => exploration_tab(ui, &self.state),
                Tab::VolcanoMa => volcano_ma_tab(ui, &self.state),
                Tab::Degs => degs_tab(ui, &mut self.state),
                Tab::Gene => gene_tab(ui, &mut self.state),
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

fn exploration_tab(ui: &mut Ui, state: &AppState) {
    let Some(table) = &state.table else {
        return;
    };
    ui.heading("Preview");
    tables::preview_table(ui, table, state.settings.preview_rows);
    ui.add_space(12.0);

    ui.heading("Detected contrasts");
    if state.detection.contrasts.is_empty() {
        ui.label("No contrasts found with *_logFC / *_adj.P.Val columns.");
    } else {
        tables::contrasts_table(ui, table, &state.detection);
    }
    for warning in &state.detection.warnings {
        ui.colored_label(egui::Color32::YELLOW, warning.to_string());
    }
}

fn volcano_ma_tab(ui: &mut Ui, state: &AppState) {
    let Some(volcano) = state.volcano_chart() else {
        ui.label("Load a table with detected contrasts to see volcano / MA plots.");
        return;
    };
    let height = (ui.available_height() / 2.0 - 30.0).max(200.0);
    plot::scatter_plot(ui, volcano, height);
    ui.add_space(8.0);
    match state.ma_chart() {
        Some(ma) => plot::scatter_plot(ui, ma, height),
        None => {
            ui.label("MA plot unavailable: this contrast has no AveExpr column.");
        }
    }
}

fn degs_tab(ui: &mut Ui, state: &mut AppState) {
    let rows = state.deg_rows_for_display();
    let (Some(table), Some(contrast), Some(degs)) = (&state.table, state.selected(), &state.degs)
    else {
        ui.label("Load a table with detected contrasts to list DEGs.");
        return;
    };

    ui.heading(format!(
        "{} – {} significant genes ({} up, {} down)",
        contrast.display_name(),
        degs.len(),
        degs.up,
        degs.down
    ));
    let mut sort = state.sort_by_adj_p;
    let mut export = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut sort, "Sort by adj.P.Val");
        export = ui.button("⬇ Export…").clicked();
    });
    ui.separator();
    if degs.is_empty() {
        ui.label("No genes pass the current thresholds.");
    } else {
        tables::deg_table(ui, table, contrast, &rows, &state.thresholds);
    }

    state.sort_by_adj_p = sort;
    if export {
        panels::save_export_dialog(state);
    }
}

fn gene_tab(ui: &mut Ui, state: &mut AppState) {
    let mut submitted = false;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Gene");
        let response = ui.text_edit_singleline(&mut state.gene_query);
        if response.changed() {
            state.gene_result = None;
        }
        submitted |= response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        submitted |= ui.button("Look up").clicked();
    });

    if state.table.is_some() {
        let query = state.gene_query.trim().to_lowercase();
        if !query.is_empty() && state.gene_result.is_none() {
            let suggestions: Vec<String> = state
                .gene_ids
                .iter()
                .filter(|g| g.to_lowercase().starts_with(&query))
                .take(10)
                .cloned()
                .collect();
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for gene in suggestions {
                    if ui.small_button(&gene).clicked() {
                        state.gene_query = gene;
                        submitted = true;
                    }
                }
            });
        }
    }

    if submitted {
        state.lookup();
    }
    ui.separator();

    match &state.gene_result {
        Some(Ok(summary)) => {
            tables::gene_summary_table(ui, summary);
            ui.add_space(12.0);
            plot::gene_bar_chart(ui, state.gene_query.trim(), summary);
        }
        Some(Err(e)) => {
            ui.label(e.to_string());
        }
        None => {
            ui.label("Type a gene identifier and press Enter.");
        }
    }
}
