use super::contrast::Contrast;
use super::model::ExpressionTable;
use crate::error::GeneNotFoundError;

/// One gene's metrics under one contrast. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneSummaryRow {
    pub contrast: String,
    pub log_fc: Option<f64>,
    pub ave_expr: Option<f64>,
    pub adj_p: Option<f64>,
}

impl GeneSummaryRow {
    pub fn has_values(&self) -> bool {
        self.log_fc.is_some() || self.ave_expr.is_some() || self.adj_p.is_some()
    }
}

/// Project a gene across every contrast, one row per contrast in order.
///
/// Contrasts without values for the gene yield a row of missing markers.
/// Fails only when no contrast has any value for it, which includes a gene
/// absent from the table.
pub fn lookup_gene(
    table: &ExpressionTable,
    contrasts: &[Contrast],
    gene: &str,
) -> Result<Vec<GeneSummaryRow>, GeneNotFoundError> {
    let not_found = || GeneNotFoundError {
        gene: gene.trim().to_string(),
    };
    let row = table.find_gene(gene).ok_or_else(not_found)?;

    let summary: Vec<GeneSummaryRow> = contrasts
        .iter()
        .map(|c| GeneSummaryRow {
            contrast: c.display_name().to_string(),
            log_fc: table.number(row, c.log_fc),
            ave_expr: c.ave_expr.and_then(|col| table.number(row, col)),
            adj_p: table.number(row, c.adj_p),
        })
        .collect();

    if !contrasts.is_empty() && !summary.iter().any(GeneSummaryRow::has_values) {
        return Err(not_found());
    }
    log::debug!("Lookup '{}' → row {row} across {} contrasts", gene.trim(), summary.len());
    Ok(summary)
}
