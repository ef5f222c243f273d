use std::fmt;

// ---------------------------------------------------------------------------
// Column classification
// ---------------------------------------------------------------------------

/// Name given to metrics whose column is a bare token (`logFC`, `adj.P.Val`),
/// as in single-contrast `topTable` output.
pub const DEFAULT_CONTRAST: &str = "default";

/// The kind of statistic a metric column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    LogFc,
    AveExpr,
    AdjPValue,
    PValue,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::LogFc,
        MetricKind::AveExpr,
        MetricKind::AdjPValue,
        MetricKind::PValue,
    ];

    /// Column-name tokens recognised for this metric (matched case-insensitively).
    pub fn tokens(self) -> &'static [&'static str] {
        match self {
            MetricKind::LogFc => &["logFC", "log2FC", "log2FoldChange"],
            MetricKind::AveExpr => &["AveExpr", "baseMean"],
            MetricKind::AdjPValue => &["adj.P.Val", "padj", "FDR"],
            MetricKind::PValue => &["P.Value", "pvalue"],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MetricKind::LogFc => "logFC",
            MetricKind::AveExpr => "AveExpr",
            MetricKind::AdjPValue => "adj.P.Val",
            MetricKind::PValue => "P.Value",
        };
        f.write_str(label)
    }
}

/// Result of classifying one column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnClass {
    Metric { kind: MetricKind, contrast: String },
    Unrecognized,
}

/// Classify a column name as `<contrast>_<token>`, `<token>_<contrast>` or a
/// bare `<token>`. Suffix form is tried before prefix form.
pub fn classify_column(name: &str) -> ColumnClass {
    let name = name.trim();
    let lower = name.to_ascii_lowercase();

    for kind in MetricKind::ALL {
        for token in kind.tokens() {
            let token = token.to_ascii_lowercase();
            if lower == token {
                return ColumnClass::Metric {
                    kind,
                    contrast: DEFAULT_CONTRAST.to_string(),
                };
            }
        }
    }

    for kind in MetricKind::ALL {
        for token in kind.tokens() {
            let token = token.to_ascii_lowercase();
            let suffix = format!("_{token}");
            if lower.len() > suffix.len() && lower.ends_with(&suffix) {
                return ColumnClass::Metric {
                    kind,
                    contrast: name[..name.len() - suffix.len()].to_string(),
                };
            }
        }
    }

    for kind in MetricKind::ALL {
        for token in kind.tokens() {
            let token = token.to_ascii_lowercase();
            let prefix = format!("{token}_");
            if lower.len() > prefix.len() && lower.starts_with(&prefix) {
                return ColumnClass::Metric {
                    kind,
                    contrast: name[prefix.len()..].to_string(),
                };
            }
        }
    }

    ColumnClass::Unrecognized
}

// ---------------------------------------------------------------------------
// Contrast
// ---------------------------------------------------------------------------

/// One comparison with the column indices of its metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contrast {
    pub name: String,
    pub log_fc: usize,
    pub adj_p: usize,
    pub ave_expr: Option<usize>,
    pub p_value: Option<usize>,
}

impl Contrast {
    /// MA plots need an average-expression column.
    pub fn has_ma_plot(&self) -> bool {
        self.ave_expr.is_some()
    }

    /// Name without a leading `PRJNA<digits>_<token>_` accession prefix.
    pub fn display_name(&self) -> &str {
        strip_accession_prefix(&self.name)
    }
}

fn strip_accession_prefix(name: &str) -> &str {
    let Some(rest) = name.strip_prefix("PRJNA") else {
        return name;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return name;
    }
    let Some(rest) = rest[digits..].strip_prefix('_') else {
        return name;
    };
    match rest.find('_') {
        Some(0) | None => name,
        Some(end) if end + 1 < rest.len() => &rest[end + 1..],
        Some(_) => name,
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Conditions noticed during detection; never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionWarning {
    /// A second column mapped to an already-filled (contrast, metric) slot.
    DuplicateMetric {
        contrast: String,
        kind: MetricKind,
        kept: String,
        ignored: String,
    },
    /// A contrast lacking logFC or adjusted p-value was dropped.
    IncompleteContrast {
        contrast: String,
        missing: Vec<MetricKind>,
    },
}

impl fmt::Display for DetectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionWarning::DuplicateMetric {
                contrast,
                kind,
                kept,
                ignored,
            } => write!(
                f,
                "contrast '{contrast}': {kind} found in both '{kept}' and '{ignored}', using '{kept}'"
            ),
            DetectionWarning::IncompleteContrast { contrast, missing } => {
                let missing: Vec<String> = missing.iter().map(|k| k.to_string()).collect();
                write!(
                    f,
                    "contrast '{contrast}' dropped: missing {}",
                    missing.join(", ")
                )
            }
        }
    }
}

/// Detected contrasts in first-appearance order, plus warnings.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub contrasts: Vec<Contrast>,
    pub warnings: Vec<DetectionWarning>,
}

impl Detection {
    pub fn find(&self, name: &str) -> Option<&Contrast> {
        self.contrasts.iter().find(|c| c.name == name)
    }
}

#[derive(Default)]
struct Slots {
    name: String,
    metrics: [Option<usize>; 4],
}

/// Group metric columns by contrast identifier and keep the complete groups.
pub fn detect_contrasts(columns: &[String]) -> Detection {
    let mut groups: Vec<Slots> = Vec::new();
    let mut warnings = Vec::new();

    for (idx, column) in columns.iter().enumerate() {
        let ColumnClass::Metric { kind, contrast } = classify_column(column) else {
            continue;
        };
        let pos = match groups.iter().position(|g| g.name == contrast) {
            Some(p) => p,
            None => {
                groups.push(Slots {
                    name: contrast.clone(),
                    ..Default::default()
                });
                groups.len() - 1
            }
        };
        let slot = &mut groups[pos].metrics[kind as usize];
        if let Some(kept) = *slot {
            warnings.push(DetectionWarning::DuplicateMetric {
                contrast,
                kind,
                kept: columns[kept].clone(),
                ignored: column.clone(),
            });
        } else {
            *slot = Some(idx);
        }
    }

    let mut contrasts = Vec::new();
    for group in groups {
        let [log_fc, ave_expr, adj_p, p_value] = group.metrics;
        match (log_fc, adj_p) {
            (Some(log_fc), Some(adj_p)) => contrasts.push(Contrast {
                name: group.name,
                log_fc,
                adj_p,
                ave_expr,
                p_value,
            }),
            _ => {
                let missing = [(MetricKind::LogFc, log_fc), (MetricKind::AdjPValue, adj_p)]
                    .into_iter()
                    .filter(|(_, col)| col.is_none())
                    .map(|(kind, _)| kind)
                    .collect();
                warnings.push(DetectionWarning::IncompleteContrast {
                    contrast: group.name,
                    missing,
                });
            }
        }
    }

    for w in &warnings {
        log::warn!("{w}");
    }
    log::info!(
        "Detected {} contrasts: {:?}",
        contrasts.len(),
        contrasts.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );

    Detection {
        contrasts,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn metric(kind: MetricKind, contrast: &str) -> ColumnClass {
        ColumnClass::Metric {
            kind,
            contrast: contrast.to_string(),
        }
    }

    #[test]
    fn classifies_suffix_prefix_and_bare_tokens() {
        assert_eq!(classify_column("TvsC_logFC"), metric(MetricKind::LogFc, "TvsC"));
        assert_eq!(classify_column("logFC_A"), metric(MetricKind::LogFc, "A"));
        assert_eq!(classify_column("A_ADJ.P.VAL"), metric(MetricKind::AdjPValue, "A"));
        assert_eq!(classify_column("adj.P.Val_B"), metric(MetricKind::AdjPValue, "B"));
        assert_eq!(classify_column("A_P.Value"), metric(MetricKind::PValue, "A"));
        assert_eq!(classify_column("AveExpr_A"), metric(MetricKind::AveExpr, "A"));
        assert_eq!(classify_column("padj"), metric(MetricKind::AdjPValue, DEFAULT_CONTRAST));
        assert_eq!(classify_column("gene"), ColumnClass::Unrecognized);
        assert_eq!(classify_column("_logFC"), ColumnClass::Unrecognized);
        assert_eq!(classify_column("logFCs"), ColumnClass::Unrecognized);
    }

    #[test]
    fn groups_two_contrasts_and_disables_ma_without_aveexpr() {
        let d = detect_contrasts(&cols(&[
            "gene",
            "logFC_A",
            "AveExpr_A",
            "adj.P.Val_A",
            "logFC_B",
            "adj.P.Val_B",
        ]));
        assert_eq!(d.contrasts.len(), 2);
        let a = &d.contrasts[0];
        assert_eq!((a.name.as_str(), a.log_fc, a.ave_expr, a.adj_p), ("A", 1, Some(2), 3));
        assert!(a.has_ma_plot());
        let b = &d.contrasts[1];
        assert_eq!((b.name.as_str(), b.log_fc, b.adj_p), ("B", 4, 5));
        assert!(!b.has_ma_plot());
        assert!(d.warnings.is_empty());
    }

    #[test]
    fn no_matching_columns_yields_empty_detection() {
        let d = detect_contrasts(&cols(&["gene", "description", "chr", "start"]));
        assert!(d.contrasts.is_empty());
        assert!(detect_contrasts(&[]).contrasts.is_empty());
    }

    #[test]
    fn order_follows_first_appearance() {
        let d = detect_contrasts(&cols(&[
            "Z_adj.P.Val",
            "A_logFC",
            "A_adj.P.Val",
            "Z_logFC",
        ]));
        let names: Vec<&str> = d.contrasts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "A"]);
    }

    #[test]
    fn first_duplicate_column_wins_with_warning() {
        let d = detect_contrasts(&cols(&["A_logFC", "logFC_A", "A_padj"]));
        assert_eq!(d.contrasts[0].log_fc, 0);
        assert_eq!(
            d.warnings,
            vec![DetectionWarning::DuplicateMetric {
                contrast: "A".into(),
                kind: MetricKind::LogFc,
                kept: "A_logFC".into(),
                ignored: "logFC_A".into(),
            }]
        );
    }

    #[test]
    fn incomplete_contrast_is_dropped_and_flagged() {
        let d = detect_contrasts(&cols(&["A_logFC", "A_P.Value", "B_logFC", "B_FDR"]));
        assert_eq!(d.contrasts.len(), 1);
        assert_eq!(d.contrasts[0].name, "B");
        assert_eq!(
            d.warnings,
            vec![DetectionWarning::IncompleteContrast {
                contrast: "A".into(),
                missing: vec![MetricKind::AdjPValue],
            }]
        );
    }

    #[test]
    fn single_contrast_toptable_layout() {
        let d = detect_contrasts(&cols(&["ID", "logFC", "AveExpr", "t", "P.Value", "adj.P.Val", "B"]));
        assert_eq!(d.contrasts.len(), 1);
        let c = &d.contrasts[0];
        assert_eq!(c.name, DEFAULT_CONTRAST);
        assert_eq!((c.log_fc, c.ave_expr, c.p_value, c.adj_p), (1, Some(2), Some(4), 5));
    }

    #[test]
    fn display_name_strips_accession_prefix() {
        let c = |name: &str| Contrast {
            name: name.into(),
            log_fc: 0,
            adj_p: 1,
            ave_expr: None,
            p_value: None,
        };
        assert_eq!(c("PRJNA123456_Ecoli_heat_vs_ctrl").display_name(), "heat_vs_ctrl");
        assert_eq!(c("PRJNA_x_y").display_name(), "PRJNA_x_y");
        assert_eq!(c("PRJNA12_only").display_name(), "PRJNA12_only");
        assert_eq!(c("treated_vs_ctrl").display_name(), "treated_vs_ctrl");
    }
}
