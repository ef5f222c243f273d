use super::contrast::Contrast;
use super::filter::{categorize, Category, Thresholds};
use super::lookup::GeneSummaryRow;
use super::model::ExpressionTable;

/// Smallest adjusted p-value used before taking -log10.
pub const MIN_ADJ_P: f64 = 1e-300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Volcano,
    Ma,
}

/// A threshold guide line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Guide {
    Vertical(f64),
    Horizontal(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub row: usize,
    pub gene: String,
    pub x: f64,
    pub y: f64,
    pub category: Category,
}

/// Field bindings and categorized points for one scatter chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBinding {
    pub kind: ChartKind,
    pub title: String,
    /// Source columns feeding each axis.
    pub x_field: String,
    pub y_field: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<ChartPoint>,
    pub guides: Vec<Guide>,
}

impl ChartBinding {
    /// Points grouped by category, in `Category::ALL` order.
    pub fn by_category(&self) -> Vec<(Category, Vec<&ChartPoint>)> {
        Category::ALL
            .iter()
            .map(|&cat| (cat, self.points.iter().filter(|p| p.category == cat).collect::<Vec<_>>()))
            .filter(|(_, pts)| !pts.is_empty())
            .collect()
    }
}

pub fn neg_log10_adj_p(p: f64) -> f64 {
    -p.clamp(MIN_ADJ_P, 1.0).log10()
}

/// Volcano: x = logFC, y = -log10(adj.P.Val).
pub fn volcano(
    table: &ExpressionTable,
    contrast: &Contrast,
    rows: &[usize],
    thresholds: &Thresholds,
) -> ChartBinding {
    let points = rows
        .iter()
        .filter_map(|&row| {
            let lfc = table.number(row, contrast.log_fc);
            let p = table.number(row, contrast.adj_p);
            Some(ChartPoint {
                row,
                gene: table.gene_id(row),
                x: lfc?,
                y: neg_log10_adj_p(p?),
                category: categorize(lfc, p, thresholds),
            })
        })
        .collect();

    let mut guides = Vec::new();
    if thresholds.logfc() > 0.0 {
        guides.push(Guide::Vertical(-thresholds.logfc()));
    }
    guides.push(Guide::Vertical(thresholds.logfc()));
    if thresholds.fdr() > 0.0 {
        guides.push(Guide::Horizontal(neg_log10_adj_p(thresholds.fdr())));
    }

    ChartBinding {
        kind: ChartKind::Volcano,
        title: format!("Volcano – {}", contrast.display_name()),
        x_field: table.columns[contrast.log_fc].clone(),
        y_field: table.columns[contrast.adj_p].clone(),
        x_label: "log2 Fold Change",
        y_label: "-log10(adj.P.Val)",
        points,
        guides,
    }
}

/// MA: x = AveExpr, y = logFC. `None` when the contrast has no AveExpr column.
pub fn ma(
    table: &ExpressionTable,
    contrast: &Contrast,
    rows: &[usize],
    thresholds: &Thresholds,
) -> Option<ChartBinding> {
    let ave_col = contrast.ave_expr?;
    let points = rows
        .iter()
        .filter_map(|&row| {
            let lfc = table.number(row, contrast.log_fc);
            let p = table.number(row, contrast.adj_p);
            Some(ChartPoint {
                row,
                gene: table.gene_id(row),
                x: table.number(row, ave_col)?,
                y: lfc?,
                category: categorize(lfc, p, thresholds),
            })
        })
        .collect();

    let mut guides = vec![Guide::Horizontal(thresholds.logfc())];
    if thresholds.logfc() > 0.0 {
        guides.push(Guide::Horizontal(-thresholds.logfc()));
    }

    Some(ChartBinding {
        kind: ChartKind::Ma,
        title: format!("MA plot – {}", contrast.display_name()),
        x_field: table.columns[ave_col].clone(),
        y_field: table.columns[contrast.log_fc].clone(),
        x_label: "AveExpr",
        y_label: "log2 Fold Change",
        points,
        guides,
    })
}

/// Bars of logFC per contrast for one gene, highest first.
pub fn gene_bars(summary: &[GeneSummaryRow]) -> Vec<(String, f64)> {
    let mut bars: Vec<(String, f64)> = summary
        .iter()
        .filter_map(|r| Some((r.contrast.clone(), r.log_fc?)))
        .collect();
    bars.sort_by(|a, b| b.1.total_cmp(&a.1));
    bars
}
