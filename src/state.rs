use std::path::{Path, PathBuf};

use crate::config::{Delimiter, Separator, Settings};
use crate::data::chart::{self, ChartBinding};
use crate::data::contrast::{detect_contrasts, Contrast, Detection};
use crate::data::export::{export_file_name, export_rows};
use crate::data::filter::{filter_degs, sorted_by_adj_p, DegSet, Thresholds};
use crate::data::loader::{load_file, LoadOptions};
use crate::data::lookup::{lookup_gene, GeneSummaryRow};
use crate::data::model::ExpressionTable;
use crate::error::{ExportError, GeneNotFoundError};

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Loaded table (None until user loads a file).
    pub table: Option<ExpressionTable>,

    /// File name of the loaded table.
    pub source_name: Option<String>,

    /// Where the loaded table came from, for re-reading.
    pub source_path: Option<PathBuf>,

    /// Gene identifiers of the loaded table, sorted.
    pub gene_ids: Vec<String>,

    /// Contrasts detected in the loaded table.
    pub detection: Detection,

    /// Name of the contrast shown in plots and the DEG table.
    pub selected_contrast: Option<String>,

    /// Last valid thresholds.
    pub thresholds: Thresholds,

    /// Threshold widgets' values; reverted when invalid.
    pub logfc_input: f64,
    pub fdr_input: f64,

    /// DEGs of the selected contrast under `thresholds` (cached).
    pub degs: Option<DegSet>,

    /// Plot bindings of the selected contrast, rebuilt with `degs`.
    volcano: Option<ChartBinding>,
    ma: Option<ChartBinding>,

    /// Show the DEG table ordered by adjusted p-value.
    pub sort_by_adj_p: bool,

    pub separator: Separator,
    pub export_delimiter: Delimiter,

    pub gene_query: String,
    pub gene_result: Option<Result<Vec<GeneSummaryRow>, GeneNotFoundError>>,

    /// Status / error message shown in the UI.
    pub status: Option<Status>,
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let thresholds = settings.thresholds().unwrap_or_default();
        Self {
            table: None,
            source_name: None,
            source_path: None,
            gene_ids: Vec::new(),
            detection: Detection::default(),
            selected_contrast: None,
            thresholds,
            logfc_input: thresholds.logfc(),
            fdr_input: thresholds.fdr(),
            degs: None,
            volcano: None,
            ma: None,
            sort_by_adj_p: true,
            separator: settings.separator,
            export_delimiter: settings.export_delimiter,
            gene_query: String::new(),
            gene_result: None,
            status: None,
            settings,
        }
    }

    /// Load a file, replacing the current table on success. On failure the
    /// previous table stays and the error becomes the status line.
    pub fn open_path(&mut self, path: &Path) {
        let options = LoadOptions {
            separator: self.separator,
            ..LoadOptions::from(&self.settings)
        };
        match load_file(path, &options) {
            Ok(table) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.set_table(table, name);
                self.source_path = Some(path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                self.status = Some(Status::Error(format!("Error: {e}")));
            }
        }
    }

    /// Re-read the current file, e.g. after the separator changed.
    pub fn reload(&mut self) {
        if let Some(path) = self.source_path.clone() {
            self.open_path(&path);
        }
    }

    pub fn set_separator(&mut self, separator: Separator) {
        if separator != self.separator {
            self.separator = separator;
            self.reload();
        }
    }

    /// Ingest a newly loaded table, detect contrasts and reset derived views.
    pub fn set_table(&mut self, table: ExpressionTable, source_name: String) {
        if table.is_empty() {
            log::warn!("{source_name} has a header but no data rows");
        }
        self.detection = detect_contrasts(&table.columns);
        self.selected_contrast = self.detection.contrasts.first().map(|c| c.name.clone());
        self.gene_result = None;
        self.gene_ids = table.sorted_gene_ids();
        self.status = Some(if self.detection.contrasts.is_empty() {
            Status::Info(
                "No contrasts detected: expected columns like <contrast>_logFC and <contrast>_adj.P.Val"
                    .into(),
            )
        } else {
            Status::Info(format!(
                "{} rows × {} columns, {} contrasts detected",
                table.len(),
                table.columns.len(),
                self.detection.contrasts.len()
            ))
        });
        self.table = Some(table);
        self.source_name = Some(source_name);
        self.refilter();
    }

    pub fn selected(&self) -> Option<&Contrast> {
        self.detection.find(self.selected_contrast.as_deref()?)
    }

    pub fn select_contrast(&mut self, name: &str) {
        if self.detection.find(name).is_some() {
            self.selected_contrast = Some(name.to_string());
            self.refilter();
        }
    }

    /// Validate and apply the threshold inputs. Invalid values revert the
    /// inputs to the last valid thresholds.
    pub fn apply_thresholds(&mut self, logfc: f64, fdr: f64) {
        match Thresholds::new(logfc, fdr) {
            Ok(t) => {
                self.thresholds = t;
                self.logfc_input = logfc;
                self.fdr_input = fdr;
                if matches!(self.status, Some(Status::Error(_))) {
                    self.status = None;
                }
                self.refilter();
            }
            Err(e) => {
                log::warn!("Rejected threshold: {e}");
                self.logfc_input = self.thresholds.logfc();
                self.fdr_input = self.thresholds.fdr();
                self.status = Some(Status::Error(e.to_string()));
            }
        }
    }

    /// Recompute `degs` and the plot bindings after a contrast or threshold
    /// change.
    pub fn refilter(&mut self) {
        let (degs, volcano, ma) = match (&self.table, self.selected()) {
            (Some(table), Some(contrast)) => {
                let all: Vec<usize> = (0..table.len()).collect();
                (
                    Some(filter_degs(table, contrast, &self.thresholds)),
                    Some(chart::volcano(table, contrast, &all, &self.thresholds)),
                    chart::ma(table, contrast, &all, &self.thresholds),
                )
            }
            _ => (None, None, None),
        };
        self.degs = degs;
        self.volcano = volcano;
        self.ma = ma;
    }

    /// Switch the gene identifier column; keeps the old one on failure.
    pub fn set_gene_column(&mut self, column: usize) {
        let Some(table) = &mut self.table else {
            return;
        };
        match table.set_gene_column(column) {
            Ok(()) => {
                log::info!("Gene column set to '{}'", table.gene_column_name());
                self.gene_ids = table.sorted_gene_ids();
                self.gene_result = None;
                self.refilter();
            }
            Err(e) => {
                log::warn!("Cannot use column as gene identifier: {e}");
                self.status = Some(Status::Error(e.to_string()));
            }
        }
    }

    /// Look up `gene_query` across all contrasts.
    pub fn lookup(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let query = self.gene_query.trim();
        if query.is_empty() {
            self.gene_result = None;
            return;
        }
        let result = lookup_gene(table, &self.detection.contrasts, query);
        if let Err(e) = &result {
            log::info!("{e}");
        }
        self.gene_result = Some(result);
    }

    /// Rows of the DEG table in display order.
    pub fn deg_rows_for_display(&self) -> Vec<usize> {
        match (&self.table, self.selected(), &self.degs) {
            (Some(table), Some(contrast), Some(degs)) if self.sort_by_adj_p => {
                sorted_by_adj_p(table, contrast, &degs.rows)
            }
            (_, _, Some(degs)) => degs.rows.clone(),
            _ => Vec::new(),
        }
    }

    /// Volcano binding over every row of the selected contrast.
    pub fn volcano_chart(&self) -> Option<&ChartBinding> {
        self.volcano.as_ref()
    }

    /// MA binding; `None` also when the contrast has no AveExpr column.
    pub fn ma_chart(&self) -> Option<&ChartBinding> {
        self.ma.as_ref()
    }

    /// Exported bytes and suggested file name of the current DEG set.
    pub fn export(&self) -> Option<Result<(String, Vec<u8>), ExportError>> {
        let table = self.table.as_ref()?;
        let contrast = self.selected()?;
        let degs = self.degs.as_ref()?;
        let name = export_file_name(contrast.display_name(), self.export_delimiter);
        Some(export_rows(table, &degs.rows, self.export_delimiter).map(|bytes| (name, bytes)))
    }

    /// Write the current DEG set to `path`.
    pub fn save_export(&mut self, path: &Path) {
        let result = match self.export() {
            Some(Ok((_, bytes))) => std::fs::write(path, bytes).map_err(ExportError::from),
            Some(Err(e)) => Err(e),
            None => return,
        };
        match result {
            Ok(()) => {
                log::info!("Exported DEGs to {}", path.display());
                self.status = Some(Status::Info(format!("Saved {}", path.display())));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status = Some(Status::Error(format!("Export failed: {e}")));
            }
        }
    }
}
