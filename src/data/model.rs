use std::collections::HashMap;
use std::fmt;

use crate::error::LoadError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the result table
// ---------------------------------------------------------------------------

/// Tokens that pipelines (R, pandas, Excel) write for a missing value.
const NA_TOKENS: &[&str] = &["NA", "NaN", "nan", "N/A", "null", "NULL", "#N/A"];

/// A dynamically-typed cell mirroring the dtypes a dataframe reader infers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Infer the type of a text cell: NA → integer → float → bool → string.
    pub fn infer(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || NA_TOKENS.contains(&s) {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    /// Numeric view used by the metric columns. Numeric text is coerced,
    /// everything else (including NaN) is missing.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Bool(_) | CellValue::Null => return None,
        };
        (!v.is_nan()).then_some(v)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// Lossless text form: parsing it back with [`CellValue::infer`] yields the
/// same value. Floats use the shortest round-trip representation and keep a
/// decimal point so they never come back as integers.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// ExpressionTable – the complete loaded result table
// ---------------------------------------------------------------------------

/// The parsed result table with a case-insensitive gene index.
#[derive(Debug, Clone)]
pub struct ExpressionTable {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Rows, each padded to `columns.len()`.
    pub rows: Vec<Vec<CellValue>>,
    gene_column: usize,
    /// Lower-cased gene id → first row carrying it.
    gene_index: HashMap<String, usize>,
}

impl ExpressionTable {
    /// Build a table, checking that `gene_column` is non-empty on every row.
    pub fn new(
        columns: Vec<String>,
        mut rows: Vec<Vec<CellValue>>,
        gene_column: usize,
    ) -> Result<Self, LoadError> {
        if gene_column >= columns.len() {
            return Err(LoadError::NoGeneColumn);
        }
        for row in &mut rows {
            row.resize(columns.len(), CellValue::Null);
        }
        let gene_index = build_gene_index(&columns, &rows, gene_column)?;
        Ok(ExpressionTable {
            columns,
            rows,
            gene_column,
            gene_index,
        })
    }

    /// Switch the identifier column. On failure the table is left unchanged.
    pub fn set_gene_column(&mut self, column: usize) -> Result<(), LoadError> {
        if column >= self.columns.len() {
            return Err(LoadError::NoGeneColumn);
        }
        self.gene_index = build_gene_index(&self.columns, &self.rows, column)?;
        self.gene_column = column;
        Ok(())
    }

    /// Whether `column` could serve as gene identifier (no empty cells).
    pub fn is_valid_gene_column(&self, column: usize) -> bool {
        column < self.columns.len() && self.rows.iter().all(|r| !r[column].is_null())
    }

    pub fn gene_column(&self) -> usize {
        self.gene_column
    }

    pub fn gene_column_name(&self) -> &str {
        &self.columns[self.gene_column]
    }

    /// Gene identifier of a row.
    pub fn gene_id(&self, row: usize) -> String {
        self.rows[row][self.gene_column].to_string()
    }

    /// Row of a gene, matched case-insensitively after trimming.
    pub fn find_gene(&self, gene: &str) -> Option<usize> {
        self.gene_index.get(&gene.trim().to_lowercase()).copied()
    }

    /// Numeric value of a metric cell; `None` when missing or non-numeric.
    pub fn number(&self, row: usize, column: usize) -> Option<f64> {
        self.rows.get(row)?.get(column)?.as_f64()
    }

    /// All gene identifiers, sorted and de-duplicated.
    pub fn sorted_gene_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = (0..self.len()).map(|r| self.gene_id(r)).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn build_gene_index(
    columns: &[String],
    rows: &[Vec<CellValue>],
    gene_column: usize,
) -> Result<HashMap<String, usize>, LoadError> {
    let mut index = HashMap::with_capacity(rows.len());
    let mut duplicates = 0usize;
    for (i, row) in rows.iter().enumerate() {
        let cell = &row[gene_column];
        if cell.is_null() {
            return Err(LoadError::MissingGeneId {
                column: columns[gene_column].clone(),
                row: i + 1,
            });
        }
        let key = cell.to_string().trim().to_lowercase();
        if index.contains_key(&key) {
            duplicates += 1;
        } else {
            index.insert(key, i);
        }
    }
    if duplicates > 0 {
        log::warn!(
            "{duplicates} duplicate identifiers in gene column '{}'; lookups use the first occurrence",
            columns[gene_column]
        );
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    #[test]
    fn infers_cell_types() {
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer("NA"), CellValue::Null);
        assert_eq!(CellValue::infer(" 42 "), CellValue::Integer(42));
        assert_eq!(CellValue::infer("-1.5e-3"), CellValue::Float(-1.5e-3));
        assert_eq!(CellValue::infer("true"), CellValue::Bool(true));
        assert_eq!(CellValue::infer("TP53"), s("TP53"));
    }

    #[test]
    fn display_parses_back_to_same_value() {
        for v in [
            CellValue::Float(2.0),
            CellValue::Float(1e-300),
            CellValue::Float(-0.0123),
            CellValue::Integer(-7),
            s("BRCA1"),
            CellValue::Null,
        ] {
            assert_eq!(CellValue::infer(&v.to_string()), v);
        }
    }

    #[test]
    fn numeric_view_coerces_text_and_drops_nan() {
        assert_eq!(s("0.25").as_f64(), Some(0.25));
        assert_eq!(s("up").as_f64(), None);
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
    }

    #[test]
    fn gene_lookup_is_case_insensitive_and_first_wins() {
        let table = ExpressionTable::new(
            vec!["gene".into(), "x".into()],
            vec![
                vec![s("Tp53"), CellValue::Integer(1)],
                vec![s("TP53"), CellValue::Integer(2)],
                vec![s("MYC")],
            ],
            0,
        )
        .unwrap();
        assert_eq!(table.find_gene(" tp53 "), Some(0));
        assert_eq!(table.find_gene("myc"), Some(2));
        assert_eq!(table.rows[2].len(), 2);
        assert_eq!(table.sorted_gene_ids(), vec!["MYC", "TP53", "Tp53"]);
    }

    #[test]
    fn rejects_empty_gene_ids() {
        let err = ExpressionTable::new(
            vec!["gene".into()],
            vec![vec![s("A")], vec![CellValue::Null]],
            0,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingGeneId { row: 2, .. }));
    }

    #[test]
    fn failed_gene_column_switch_keeps_previous() {
        let mut table = ExpressionTable::new(
            vec!["id".into(), "symbol".into()],
            vec![vec![s("g1"), s("A")], vec![s("g2"), CellValue::Null]],
            0,
        )
        .unwrap();
        assert!(!table.is_valid_gene_column(1));
        assert!(table.set_gene_column(1).is_err());
        assert_eq!(table.gene_column_name(), "id");
        assert_eq!(table.find_gene("g2"), Some(1));
    }
}
