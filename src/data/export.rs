use super::model::ExpressionTable;
use crate::config::Delimiter;
use crate::error::ExportError;

/// Serialize the given rows with the table's header, in the order given.
///
/// Cells are written in their lossless text form, so reading the bytes back
/// with the same delimiter reproduces the rows of a table loaded from
/// delimited text. Text cells from typed sources (Parquet, JSON, spreadsheets)
/// that look like numbers or NA tokens, e.g. `"7157"` or `"NA"`, are re-read
/// as `Integer`/`Float`/`Null`.
pub fn export_rows(
    table: &ExpressionTable,
    rows: &[usize],
    delimiter: Delimiter,
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&table.columns)?;
    for &row in rows {
        writer.write_record(table.rows[row].iter().map(|cell| cell.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))
}

/// Suggested download name for a contrast's DEG table.
pub fn export_file_name(contrast: &str, delimiter: Delimiter) -> String {
    let safe: String = contrast
        .chars()
        .map(|c| if c.is_alphanumeric() || "._-".contains(c) { c } else { '_' })
        .collect();
    format!("DEGs_{safe}.{}", delimiter.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_delimited;
    use crate::data::model::CellValue;

    fn fixture() -> ExpressionTable {
        let columns = vec![
            "gene".to_string(),
            "note".into(),
            "logFC_A".into(),
            "adj.P.Val_A".into(),
        ];
        let s = |v: &str| CellValue::String(v.into());
        let rows = vec![
            vec![s("TP53"), s("tumor, suppressor"), CellValue::Float(2.3), CellValue::Float(0.01)],
            vec![s("MYC"), CellValue::Null, CellValue::Float(-1.0), CellValue::Float(1e-12)],
            vec![s("X"), s("say \"hi\""), CellValue::Integer(3), CellValue::Float(0.5)],
        ];
        ExpressionTable::new(columns, rows, 0).unwrap()
    }

    #[test]
    fn writes_header_and_selected_rows_in_order() {
        let t = fixture();
        let bytes = export_rows(&t, &[1, 0], Delimiter::Tab).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "gene\tnote\tlogFC_A\tadj.P.Val_A\nMYC\t\t-1.0\t1e-12\nTP53\ttumor, suppressor\t2.3\t0.01\n"
        );
    }

    #[test]
    fn output_is_deterministic() {
        let t = fixture();
        let a = export_rows(&t, &[0, 1, 2], Delimiter::Comma).unwrap();
        let b = export_rows(&t, &[0, 1, 2], Delimiter::Comma).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn reading_export_back_reproduces_rows() {
        let t = fixture();
        let rows = [2, 0];
        for delimiter in [Delimiter::Comma, Delimiter::Tab] {
            let bytes = export_rows(&t, &rows, delimiter).unwrap();
            let (columns, parsed) = parse_delimited(&bytes, delimiter.as_byte()).unwrap();
            assert_eq!(columns, t.columns);
            let expected: Vec<Vec<CellValue>> = rows.iter().map(|&r| t.rows[r].clone()).collect();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn numeric_looking_text_keeps_its_characters_but_not_its_type() {
        let columns = vec!["gene".to_string(), "entrez".into()];
        let rows = vec![vec![CellValue::String("TP53".into()), CellValue::String("7157".into())]];
        let t = ExpressionTable::new(columns, rows, 0).unwrap();
        let bytes = export_rows(&t, &[0], Delimiter::Comma).unwrap();
        assert_eq!(bytes, b"gene,entrez\nTP53,7157\n");
        let (_, parsed) = parse_delimited(&bytes, b',').unwrap();
        assert_eq!(parsed[0][1], CellValue::Integer(7157));
    }

    #[test]
    fn empty_selection_still_has_header() {
        let t = fixture();
        let bytes = export_rows(&t, &[], Delimiter::Comma).unwrap();
        assert_eq!(bytes, b"gene,note,logFC_A,adj.P.Val_A\n");
    }

    #[test]
    fn file_name_is_sanitized() {
        assert_eq!(export_file_name("heat vs/ctrl", Delimiter::Comma), "DEGs_heat_vs_ctrl.csv");
        assert_eq!(export_file_name("A.1", Delimiter::Tab), "DEGs_A.1.tsv");
    }
}
