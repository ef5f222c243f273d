use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::category_color;
use crate::data::contrast::{Contrast, Detection};
use crate::data::filter::{row_category, Thresholds};
use crate::data::lookup::GeneSummaryRow;
use crate::data::model::ExpressionTable;

const ROW_HEIGHT: f32 = 18.0;
const HEADER_HEIGHT: f32 = 20.0;

fn fmt_metric(v: Option<f64>) -> String {
    match v {
        Some(v) if v != 0.0 && v.abs() < 1e-3 => format!("{v:.3e}"),
        Some(v) => format!("{v:.4}"),
        None => "NA".to_string(),
    }
}

/// First `n` rows with every column.
pub fn preview_table(ui: &mut Ui, table: &ExpressionTable, n: usize) {
    let n_rows = n.min(table.len());
    ui.push_id("preview_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(n_rows as f32 * ROW_HEIGHT + HEADER_HEIGHT)
            .columns(Column::auto().at_least(60.0), table.columns.len())
            .header(HEADER_HEIGHT, |mut header| {
                for name in &table.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, n_rows, |mut row| {
                    let cells = &table.rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}

/// Detected contrasts with the columns bound to each metric.
pub fn contrasts_table(ui: &mut Ui, table: &ExpressionTable, detection: &Detection) {
    let col_name = |idx: Option<usize>| idx.map(|i| table.columns[i].clone()).unwrap_or_else(|| "—".into());
    ui.push_id("contrasts_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(80.0), 7)
            .header(HEADER_HEIGHT, |mut header| {
                for title in ["ID", "Name", "logFC", "AveExpr", "adj.P.Val", "P.Value", "MA plot"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, detection.contrasts.len(), |mut row| {
                    let c = &detection.contrasts[row.index()];
                    let cells = [
                        c.name.clone(),
                        c.display_name().to_string(),
                        col_name(Some(c.log_fc)),
                        col_name(c.ave_expr),
                        col_name(Some(c.adj_p)),
                        col_name(c.p_value),
                        if c.has_ma_plot() { "yes" } else { "no" }.to_string(),
                    ];
                    for text in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(text);
                        });
                    }
                });
            });
    });
}

/// DEG rows of one contrast, coloured by direction.
pub fn deg_table(
    ui: &mut Ui,
    table: &ExpressionTable,
    contrast: &Contrast,
    rows: &[usize],
    thresholds: &Thresholds,
) {
    let ave = contrast.ave_expr;
    ui.push_id("deg_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::auto().at_least(100.0))
            .columns(Column::auto().at_least(80.0), 4)
            .header(HEADER_HEIGHT, |mut header| {
                for title in [table.gene_column_name(), "logFC", "AveExpr", "adj.P.Val", "Category"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let r = rows[row.index()];
                    let category = row_category(table, contrast, r, thresholds);
                    row.col(|ui: &mut Ui| {
                        ui.label(table.gene_id(r));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(fmt_metric(table.number(r, contrast.log_fc)));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(fmt_metric(ave.and_then(|c| table.number(r, c))));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(fmt_metric(table.number(r, contrast.adj_p)));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(RichText::new(category.to_string()).color(category_color(category)));
                    });
                });
            });
    });
}

/// One row per contrast for the looked-up gene.
pub fn gene_summary_table(ui: &mut Ui, summary: &[GeneSummaryRow]) {
    ui.push_id("gene_summary_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .columns(Column::auto().at_least(90.0), 4)
            .header(HEADER_HEIGHT, |mut header| {
                for title in ["Contrast", "logFC", "AveExpr", "adj.P.Val"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, summary.len(), |mut row| {
                    let s = &summary[row.index()];
                    let cells = [
                        s.contrast.clone(),
                        fmt_metric(s.log_fc),
                        fmt_metric(s.ave_expr),
                        fmt_metric(s.adj_p),
                    ];
                    for text in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(text);
                        });
                    }
                });
            });
    });
}

#[cfg(test)]
mod tests {
    use super::fmt_metric;

    #[test]
    fn metrics_are_formatted_for_display() {
        assert_eq!(fmt_metric(None), "NA");
        assert_eq!(fmt_metric(Some(2.3)), "2.3000");
        assert_eq!(fmt_metric(Some(0.0)), "0.0000");
        assert_eq!(fmt_metric(Some(1.5e-8)), "1.500e-8");
    }
}
