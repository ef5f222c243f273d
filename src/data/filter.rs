use std::fmt;

use super::contrast::Contrast;
use super::model::ExpressionTable;
use crate::error::InvalidThresholdError;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Validated DEG cut-offs: `|logFC| >= logfc` and `adj.P.Val <= fdr`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    logfc: f64,
    fdr: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            logfc: 1.0,
            fdr: 0.05,
        }
    }
}

impl Thresholds {
    pub fn new(logfc: f64, fdr: f64) -> Result<Self, InvalidThresholdError> {
        if !logfc.is_finite() || logfc < 0.0 {
            return Err(InvalidThresholdError::LogFc(logfc));
        }
        if !(0.0..=1.0).contains(&fdr) {
            return Err(InvalidThresholdError::Fdr(fdr));
        }
        Ok(Thresholds { logfc, fdr })
    }

    pub fn logfc(&self) -> f64 {
        self.logfc
    }

    pub fn fdr(&self) -> f64 {
        self.fdr
    }

    /// The DEG predicate. Both values must be present.
    pub fn passes(&self, log_fc: f64, adj_p: f64) -> bool {
        log_fc.abs() >= self.logfc && adj_p <= self.fdr
    }
}

// ---------------------------------------------------------------------------
// Per-row category
// ---------------------------------------------------------------------------

/// Significance class of a row. Shared by the DEG table and the plots so
/// highlighting always agrees with the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Up,
    Down,
    NotSignificant,
    NotEvaluated,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Up,
        Category::Down,
        Category::NotSignificant,
        Category::NotEvaluated,
    ];

    pub fn is_deg(self) -> bool {
        matches!(self, Category::Up | Category::Down)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Up => "Up",
            Category::Down => "Down",
            Category::NotSignificant => "Not significant",
            Category::NotEvaluated => "Not evaluated",
        };
        f.write_str(label)
    }
}

pub fn categorize(log_fc: Option<f64>, adj_p: Option<f64>, thresholds: &Thresholds) -> Category {
    match (log_fc, adj_p) {
        (Some(lfc), Some(p)) if thresholds.passes(lfc, p) => {
            if lfc > 0.0 {
                Category::Up
            } else {
                Category::Down
            }
        }
        (Some(_), Some(_)) => Category::NotSignificant,
        _ => Category::NotEvaluated,
    }
}

/// Category of one table row under a contrast.
pub fn row_category(
    table: &ExpressionTable,
    contrast: &Contrast,
    row: usize,
    thresholds: &Thresholds,
) -> Category {
    categorize(
        table.number(row, contrast.log_fc),
        table.number(row, contrast.adj_p),
        thresholds,
    )
}

// ---------------------------------------------------------------------------
// DegSet
// ---------------------------------------------------------------------------

/// Rows of one contrast passing the thresholds, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct DegSet {
    pub rows: Vec<usize>,
    pub up: usize,
    pub down: usize,
}

impl DegSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keep the given rows that pass the thresholds under `contrast`.
///
/// Rows whose logFC or adjusted p-value is missing or non-numeric are
/// dropped. Input order is preserved, so applying the same thresholds to an
/// already-filtered set returns it unchanged.
pub fn filter_rows<I>(
    table: &ExpressionTable,
    contrast: &Contrast,
    thresholds: &Thresholds,
    rows: I,
) -> DegSet
where
    I: IntoIterator<Item = usize>,
{
    let mut set = DegSet {
        rows: Vec::new(),
        up: 0,
        down: 0,
    };
    for row in rows {
        let category = row_category(table, contrast, row, thresholds);
        if !category.is_deg() {
            continue;
        }
        if category == Category::Up {
            set.up += 1;
        } else {
            set.down += 1;
        }
        set.rows.push(row);
    }
    set
}

/// Filter the whole table for one contrast.
pub fn filter_degs(table: &ExpressionTable, contrast: &Contrast, thresholds: &Thresholds) -> DegSet {
    filter_rows(table, contrast, thresholds, 0..table.len())
}

/// Rows ordered by ascending adjusted p-value, for display only.
pub fn sorted_by_adj_p(table: &ExpressionTable, contrast: &Contrast, rows: &[usize]) -> Vec<usize> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|&a, &b| {
        let pa = table.number(a, contrast.adj_p).unwrap_or(f64::INFINITY);
        let pb = table.number(b, contrast.adj_p).unwrap_or(f64::INFINITY);
        pa.total_cmp(&pb)
    });
    sorted
}
