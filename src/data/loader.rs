use std::fs::File;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::contrast::{classify_column, ColumnClass};
use super::model::{CellValue, ExpressionTable};
use crate::config::{Separator, Settings};
use crate::error::LoadError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Separators considered when sniffing a header line.
const SNIFF_CANDIDATES: [u8; 4] = [b'\t', b',', b';', b'|'];

type RawTable = (Vec<String>, Vec<Vec<CellValue>>);

/// How to read a file and pick its gene column.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub separator: Separator,
    pub gene_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions::from(&Settings::default())
    }
}

impl From<&Settings> for LoadOptions {
    fn from(settings: &Settings) -> Self {
        LoadOptions {
            separator: settings.separator,
            gene_columns: settings.gene_columns.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a result table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.tsv` / `.csv` / `.txt` – delimited text, separator from `options`
/// * `.xlsx` / `.xls` / `.xlsm` / `.xlsb` / `.ods` – first worksheet
/// * `.parquet` – flat columns, one row per gene
/// * `.json`    – `[{ "gene": "TP53", "A_logFC": 2.3, ... }, ...]`
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<ExpressionTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let meta = std::fs::metadata(path).map_err(|source| LoadError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    if meta.len() == 0 {
        return Err(LoadError::Empty);
    }

    let (columns, rows) = match ext.as_str() {
        "csv" | "tsv" | "txt" | "tab" => {
            let bytes = read_bytes(path)?;
            let delimiter = resolve_separator(&bytes, &ext, options.separator);
            parse_delimited(&bytes, delimiter)?
        }
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => load_spreadsheet(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(&read_bytes(path)?)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    let gene_column = choose_gene_column(&columns, &rows, &options.gene_columns)?;
    let table = ExpressionTable::new(columns, rows, gene_column)?;
    log::info!(
        "Loaded {} rows × {} columns from {} (gene column '{}')",
        table.len(),
        table.columns.len(),
        path.display(),
        table.gene_column_name()
    );
    Ok(table)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Unreadable {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Gene column
// ---------------------------------------------------------------------------

/// Pick the identifier column: exact candidate name, then case-insensitive
/// candidate name, then the first non-metric column. Columns with empty
/// cells are skipped.
pub fn choose_gene_column(
    columns: &[String],
    rows: &[Vec<CellValue>],
    candidates: &[String],
) -> Result<usize, LoadError> {
    let exact = candidates
        .iter()
        .filter_map(|c| columns.iter().position(|col| col == c));
    let loose = candidates
        .iter()
        .filter_map(|c| columns.iter().position(|col| col.eq_ignore_ascii_case(c)));
    let fallback = columns
        .iter()
        .enumerate()
        .filter(|(_, col)| classify_column(col) == ColumnClass::Unrecognized)
        .map(|(i, _)| i);

    let mut tried = Vec::new();
    for idx in exact.chain(loose).chain(fallback) {
        if tried.contains(&idx) {
            continue;
        }
        tried.push(idx);
        let usable = rows
            .iter()
            .all(|r| r.get(idx).is_some_and(|cell| !cell.is_null()));
        if usable {
            return Ok(idx);
        }
        log::warn!(
            "Column '{}' has empty identifiers, not using it as gene column",
            columns[idx]
        );
    }
    Err(LoadError::NoGeneColumn)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

fn resolve_separator(bytes: &[u8], ext: &str, choice: Separator) -> u8 {
    if let Some(b) = choice.byte() {
        return b;
    }
    if ext == "tsv" {
        return b'\t';
    }
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let header = body.split(|&b| b == b'\n').next().unwrap_or(body);
    let sniffed = sniff_separator(header);
    log::debug!("Sniffed separator {:?}", sniffed as char);
    sniffed
}

/// The candidate separator occurring most often in the header line; comma
/// when none occurs.
pub fn sniff_separator(header: &[u8]) -> u8 {
    SNIFF_CANDIDATES
        .iter()
        .map(|&sep| (sep, header.iter().filter(|&&b| b == sep).count()))
        .filter(|&(_, n)| n > 0)
        .max_by_key(|&(sep, n)| (n, std::cmp::Reverse(sep_rank(sep))))
        .map(|(sep, _)| sep)
        .unwrap_or(b',')
}

fn sep_rank(sep: u8) -> usize {
    SNIFF_CANDIDATES
        .iter()
        .position(|&c| c == sep)
        .unwrap_or(SNIFF_CANDIDATES.len())
}

/// Parse delimited text: first row is the header, remaining rows are typed
/// with [`CellValue::infer`]. Short rows are padded with nulls.
pub fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<RawTable, LoadError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(LoadError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    check_header(&columns)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() > columns.len() {
            return Err(LoadError::RaggedRow {
                row: row_no + 1,
                got: record.len(),
                expected: columns.len(),
            });
        }
        let mut row: Vec<CellValue> = record.iter().map(CellValue::infer).collect();
        row.resize(columns.len(), CellValue::Null);
        rows.push(row);
    }

    Ok((columns, rows))
}

fn check_header(columns: &[String]) -> Result<(), LoadError> {
    if columns.iter().all(|c| c.is_empty()) {
        return Err(LoadError::NoHeader);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// First worksheet; first row is the header.
fn load_spreadsheet(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| LoadError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::Empty)?
        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let columns: Vec<String> = sheet_rows
        .next()
        .ok_or(LoadError::Empty)?
        .iter()
        .map(|cell| match cell {
            Data::String(s) => s.trim().to_string(),
            Data::Empty => String::new(),
            other => other.to_string(),
        })
        .collect();
    check_header(&columns)?;

    let rows = sheet_rows
        .filter(|r| r.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|r| {
            let mut row: Vec<CellValue> = r.iter().map(sheet_cell).collect();
            row.resize(columns.len(), CellValue::Null);
            row
        })
        .collect();

    Ok((columns, rows))
}

fn sheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.is_nan() => CellValue::Null,
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::infer(s),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty | Data::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| LoadError::Parquet(e.to_string()))?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    check_header(&columns)?;
    let reader = builder
        .build()
        .map_err(|e| LoadError::Parquet(e.to_string()))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::Parquet(e.to_string()))?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok((columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let typed = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| CellValue::Bool(a.value(row))),
        _ => None,
    };
    match typed {
        Some(CellValue::Float(f)) if f.is_nan() => CellValue::Null,
        Some(value) => value,
        // Dictionary-encoded categoricals, small ints, dates, ...
        None => array_value_to_string(col.as_ref(), row)
            .map(|s| CellValue::infer(&s))
            .unwrap_or(CellValue::Null),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). Columns appear in
/// the order keys are first seen, in file order within each record.
fn load_json(bytes: &[u8]) -> Result<RawTable, LoadError> {
    let root: JsonValue =
        serde_json::from_slice(bytes).map_err(|e| LoadError::Json(e.to_string()))?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Json("expected top-level JSON array".into()))?;
    if records.is_empty() {
        return Err(LoadError::NoHeader);
    }

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Json(format!("row {} is not a JSON object", i + 1)))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    check_header(&columns)?;

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok((columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::{Builder, NamedTempFile};

    fn temp_with(suffix: &str, content: &[u8]) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_tsv_with_types_and_gene_column() {
        let file = temp_with(
            ".tsv",
            b"gene_id\tSYMBOL\tA_logFC\tA_adj.P.Val\ng1\tTP53\t2.3\t0.01\ng2\tMYC\tNA\t0.5\n",
        );
        let table = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.columns, vec!["gene_id", "SYMBOL", "A_logFC", "A_adj.P.Val"]);
        assert_eq!(table.gene_column_name(), "SYMBOL");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][2], CellValue::Float(2.3));
        assert_eq!(table.rows[1][2], CellValue::Null);
        assert_eq!(table.find_gene("myc"), Some(1));
    }

    #[test]
    fn sniffs_separator_for_csv_and_txt() {
        assert_eq!(sniff_separator(b"gene;A_logFC;A_padj"), b';');
        assert_eq!(sniff_separator(b"gene\tA_logFC,x\tA_padj"), b'\t');
        assert_eq!(sniff_separator(b"gene|a|b"), b'|');
        assert_eq!(sniff_separator(b"gene"), b',');

        let file = temp_with(".txt", b"\xEF\xBB\xBFgene;A_logFC;A_padj\nTP53;2,5;0.01\n");
        let table = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.columns, vec!["gene", "A_logFC", "A_padj"]);
        assert_eq!(table.rows[0][1], CellValue::String("2,5".into()));
    }

    #[test]
    fn explicit_separator_overrides_sniffing() {
        let file = temp_with(".csv", b"gene|A_logFC\nTP53|1.0\n");
        let options = LoadOptions {
            separator: Separator::Pipe,
            ..LoadOptions::default()
        };
        let table = load_file(file.path(), &options).unwrap();
        assert_eq!(table.columns.len(), 2);
    }

    #[test]
    fn empty_and_headerless_files_fail() {
        let empty = temp_with(".csv", b"");
        assert!(matches!(load_file(empty.path(), &LoadOptions::default()), Err(LoadError::Empty)));
        let blank = temp_with(".csv", b"\n\n  \n");
        assert!(matches!(load_file(blank.path(), &LoadOptions::default()), Err(LoadError::Empty)));
        assert!(matches!(parse_delimited(b",,\n1,2,3\n", b','), Err(LoadError::NoHeader)));
    }

    #[test]
    fn missing_file_and_unknown_extension_fail() {
        let err = load_file(Path::new("/nonexistent/table.tsv"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Unreadable { .. }));
        let file = temp_with(".bam", b"gene\nA\n");
        let err = load_file(file.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ext) if ext == "bam"));
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_rejected() {
        let (_, rows) = parse_delimited(b"gene,a,b\nX,1\n", b',').unwrap();
        assert_eq!(rows[0], vec![CellValue::String("X".into()), CellValue::Integer(1), CellValue::Null]);
        let err = parse_delimited(b"gene,a\nX,1,2\n", b',').unwrap_err();
        assert!(matches!(err, LoadError::RaggedRow { row: 1, got: 3, expected: 2 }));
    }

    #[test]
    fn gene_column_falls_back_past_incomplete_candidates() {
        let columns: Vec<String> = ["ID", "SYMBOL", "logFC", "adj.P.Val"].iter().map(|s| s.to_string()).collect();
        let s = |v: &str| CellValue::String(v.into());
        let rows = vec![
            vec![s("ENSG1"), s("TP53"), CellValue::Float(1.0), CellValue::Float(0.1)],
            vec![s("ENSG2"), CellValue::Null, CellValue::Float(1.0), CellValue::Float(0.1)],
        ];
        let defaults = LoadOptions::default().gene_columns;
        assert_eq!(choose_gene_column(&columns, &rows, &defaults).unwrap(), 0);

        let only_metrics: Vec<String> = vec!["logFC".into(), "adj.P.Val".into()];
        assert!(matches!(
            choose_gene_column(&only_metrics, &[], &defaults),
            Err(LoadError::NoGeneColumn)
        ));
    }

    #[test]
    fn gene_candidate_matches_case_insensitively() {
        let columns: Vec<String> = vec!["x_logFC".into(), "symbol".into()];
        let rows = vec![vec![CellValue::Float(1.0), CellValue::String("A".into())]];
        let defaults = LoadOptions::default().gene_columns;
        assert_eq!(choose_gene_column(&columns, &rows, &defaults).unwrap(), 1);
    }

    #[test]
    fn loads_json_records() {
        let file = temp_with(
            ".json",
            br#"[{"gene": "TP53", "A_logFC": 2, "A_padj": 0.01}, {"gene": "MYC", "A_logFC": null, "A_padj": 0.2, "extra": true}]"#,
        );
        let table = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.columns.len(), 4);
        let extra = table.columns.iter().position(|c| c == "extra").unwrap();
        assert_eq!(table.rows[0][extra], CellValue::Null);
        assert_eq!(table.rows[1][extra], CellValue::Bool(true));
        assert_eq!(table.gene_column_name(), "gene");
    }

    #[test]
    fn json_keeps_file_column_order() {
        let file = temp_with(
            ".json",
            br#"[{"gene":"TP53","Z_logFC":1.0,"Z_adj.P.Val":0.01,"A_logFC":2.0,"A_adj.P.Val":0.02}]"#,
        );
        let table = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.columns, vec!["gene", "Z_logFC", "Z_adj.P.Val", "A_logFC", "A_adj.P.Val"]);
        let names: Vec<String> = crate::data::contrast::detect_contrasts(&table.columns)
            .contrasts
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Z", "A"]);
    }

    #[test]
    fn loads_first_worksheet_skipping_blank_rows() {
        let file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["SYMBOL", "A_logFC", "A_adj.P.Val", "note"].iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "TP53").unwrap();
        sheet.write_number(1, 1, 2.5).unwrap();
        sheet.write_number(1, 2, 0.01).unwrap();
        sheet.write_string(1, 3, "NA").unwrap();
        // Row 2 left blank.
        sheet.write_string(3, 0, "MYC").unwrap();
        sheet.write_number(3, 2, 0.2).unwrap();
        sheet.write_boolean(3, 3, true).unwrap();
        workbook.save(file.path()).unwrap();

        let table = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.columns, vec!["SYMBOL", "A_logFC", "A_adj.P.Val", "note"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.gene_column_name(), "SYMBOL");
        assert_eq!(table.number(0, 1), Some(2.5));
        assert_eq!(table.rows[0][3], CellValue::Null);
        assert_eq!(table.gene_id(1), "MYC");
        assert_eq!(table.rows[1][1], CellValue::Null);
        assert_eq!(table.rows[1][3], CellValue::Bool(true));
    }

    #[test]
    fn sheet_cells_map_to_cell_values() {
        assert_eq!(sheet_cell(&Data::Int(7)), CellValue::Integer(7));
        assert_eq!(sheet_cell(&Data::Float(0.5)), CellValue::Float(0.5));
        assert_eq!(sheet_cell(&Data::Float(f64::NAN)), CellValue::Null);
        assert_eq!(sheet_cell(&Data::Empty), CellValue::Null);
        assert_eq!(sheet_cell(&Data::Error(calamine::CellErrorType::NA)), CellValue::Null);
        assert_eq!(sheet_cell(&Data::String("1e-5".into())), CellValue::Float(1e-5));
        assert_eq!(sheet_cell(&Data::String("TP53".into())), CellValue::String("TP53".into()));
    }

    #[test]
    fn loads_flat_parquet() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("gene", DataType::Utf8, false),
            Field::new("A_logFC", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["TP53", "MYC"])),
                Arc::new(Float64Array::from(vec![Some(2.3), None])),
            ],
        )
        .unwrap();
        let file = Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.columns, vec!["gene", "A_logFC"]);
        assert_eq!(table.rows[0][1], CellValue::Float(2.3));
        assert_eq!(table.rows[1][1], CellValue::Null);
        assert_eq!(table.gene_id(1), "MYC");
    }
}
