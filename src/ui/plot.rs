use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, HLine, Legend, LineStyle, Plot, PlotPoints, Points, VLine};

use crate::color::{category_color, generate_palette};
use crate::data::chart::{gene_bars, ChartBinding, ChartKind, Guide};
use crate::data::lookup::GeneSummaryRow;

// ---------------------------------------------------------------------------
// Volcano / MA scatter
// ---------------------------------------------------------------------------

/// Render a volcano or MA binding: one point series per category plus the
/// threshold guides.
pub fn scatter_plot(ui: &mut Ui, binding: &ChartBinding, height: f32) {
    let id = match binding.kind {
        ChartKind::Volcano => "volcano_plot",
        ChartKind::Ma => "ma_plot",
    };
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(&binding.title);
        ui.weak(format!("x: {}   y: {}", binding.x_field, binding.y_field));
    });

    // (x, y, gene, row) for the hover label.
    let hover: Vec<(f64, f64, String, usize)> = binding
        .points
        .iter()
        .map(|p| (p.x, p.y, p.gene.clone(), p.row))
        .collect();

    Plot::new(id)
        .height(height)
        .legend(Legend::default())
        .x_axis_label(binding.x_label)
        .y_axis_label(binding.y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .label_formatter(move |_name, value| {
            let nearest = hover.iter().min_by(|a, b| {
                let da = (a.0 - value.x).powi(2) + (a.1 - value.y).powi(2);
                let db = (b.0 - value.x).powi(2) + (b.1 - value.y).powi(2);
                da.total_cmp(&db)
            });
            match nearest {
                Some((x, y, gene, row)) => {
                    format!("{gene} (row {})\nx = {x:.3}\ny = {y:.3}", row + 1)
                }
                None => String::new(),
            }
        })
        .show(ui, |plot_ui| {
            for (category, points) in binding.by_category() {
                let series: PlotPoints = points.iter().map(|p| [p.x, p.y]).collect();
                plot_ui.points(
                    Points::new(series)
                        .name(format!("{category} ({})", points.len()))
                        .color(category_color(category))
                        .radius(2.5),
                );
            }

            for guide in &binding.guides {
                let style = LineStyle::dashed_loose();
                match *guide {
                    Guide::Vertical(x) => {
                        plot_ui.vline(VLine::new(x).color(Color32::DARK_GRAY).style(style))
                    }
                    Guide::Horizontal(y) => {
                        plot_ui.hline(HLine::new(y).color(Color32::DARK_GRAY).style(style))
                    }
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Gene bar chart
// ---------------------------------------------------------------------------

/// logFC per contrast for the looked-up gene, highest first.
pub fn gene_bar_chart(ui: &mut Ui, gene: &str, summary: &[GeneSummaryRow]) {
    let bars = gene_bars(summary);
    if bars.is_empty() {
        ui.label("No logFC values to plot.");
        return;
    }
    let palette = generate_palette(bars.len());
    let labels: Vec<String> = bars.iter().map(|(name, _)| name.clone()).collect();

    let chart = BarChart::new(
        bars.iter()
            .zip(palette)
            .enumerate()
            .map(|(i, ((name, lfc), color))| {
                Bar::new(i as f64, *lfc).name(name).fill(color).width(0.6)
            })
            .collect(),
    );

    ui.strong(format!("logFC per contrast – {gene}"));
    Plot::new("gene_bars")
        .height(320.0)
        .y_axis_label("log2 Fold Change")
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
            plot_ui.hline(HLine::new(0.0).color(Color32::GRAY));
        });
}
