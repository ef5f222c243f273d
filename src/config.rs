use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::filter::Thresholds;

/// Environment variable naming an optional JSON settings file.
pub const CONFIG_ENV: &str = "DEG_LENS_CONFIG";

// ---------------------------------------------------------------------------
// Separators
// ---------------------------------------------------------------------------

/// Field separator for reading delimited text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Separator {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = ",")]
    Comma,
    #[serde(rename = ";")]
    Semicolon,
    #[serde(rename = "\\t", alias = "\t")]
    Tab,
    #[serde(rename = "|")]
    Pipe,
}

impl Separator {
    pub const ALL: [Separator; 5] = [
        Separator::Auto,
        Separator::Comma,
        Separator::Semicolon,
        Separator::Tab,
        Separator::Pipe,
    ];

    /// The byte to split on, `None` for auto-detection.
    pub fn byte(self) -> Option<u8> {
        match self {
            Separator::Auto => None,
            Separator::Comma => Some(b','),
            Separator::Semicolon => Some(b';'),
            Separator::Tab => Some(b'\t'),
            Separator::Pipe => Some(b'|'),
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Separator::Auto => "auto",
            Separator::Comma => ",",
            Separator::Semicolon => ";",
            Separator::Tab => "\\t",
            Separator::Pipe => "|",
        };
        f.write_str(label)
    }
}

/// Delimiter for exported DEG tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Delimiter::Comma => "csv",
            Delimiter::Tab => "tsv",
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Start-up settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logfc_threshold: f64,
    pub fdr_threshold: f64,
    pub separator: Separator,
    pub preview_rows: usize,
    /// Column names tried, in order, as the gene identifier.
    pub gene_columns: Vec<String>,
    pub export_delimiter: Delimiter,
}

impl Default for Settings {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Settings {
            logfc_threshold: thresholds.logfc(),
            fdr_threshold: thresholds.fdr(),
            separator: Separator::Auto,
            preview_rows: 10,
            gene_columns: ["SYMBOL", "gene_id", "Geneid", "GeneID", "gene", "Gene", "locus_tag"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            export_delimiter: Delimiter::Comma,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text).context("parsing settings JSON")?;
        Ok(settings)
    }

    /// Settings from `$DEG_LENS_CONFIG`, falling back to defaults on any problem.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Settings::default();
        };
        match Settings::load_from(Path::new(&path)) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", Path::new(&path).display());
                settings.validated()
            }
            Err(e) => {
                log::warn!("Ignoring settings file: {e:#}");
                Settings::default()
            }
        }
    }

    /// Replace out-of-range thresholds with the defaults.
    pub fn validated(mut self) -> Self {
        if let Err(e) = self.thresholds() {
            log::warn!("Invalid threshold in settings, using defaults: {e}");
            let defaults = Thresholds::default();
            self.logfc_threshold = defaults.logfc();
            self.fdr_threshold = defaults.fdr();
        }
        self
    }

    pub fn thresholds(&self) -> Result<Thresholds, crate::error::InvalidThresholdError> {
        Thresholds::new(self.logfc_threshold, self.fdr_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"fdr_threshold": 0.1, "separator": "\\t", "export_delimiter": "tab"}}"#).unwrap();
        let s = Settings::load_from(file.path()).unwrap();
        assert_eq!(s.fdr_threshold, 0.1);
        assert_eq!(s.logfc_threshold, 1.0);
        assert_eq!(s.separator, Separator::Tab);
        assert_eq!(s.export_delimiter, Delimiter::Tab);
        assert_eq!(s.gene_columns[0], "SYMBOL");
    }

    #[test]
    fn out_of_range_thresholds_fall_back() {
        let s = Settings {
            logfc_threshold: -2.0,
            fdr_threshold: 0.2,
            ..Settings::default()
        }
        .validated();
        assert_eq!(s.thresholds().unwrap(), Thresholds::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        assert!(Settings::load_from(file.path()).is_err());
    }
}
