/// Data layer: table model, loading, contrast detection, filtering and the
/// views derived from them.
///
/// Architecture:
/// ```text
///  .tsv / .csv / .xlsx / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → ExpressionTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ contrast │  classify column names → Vec<Contrast>
///   └──────────┘
///        │
///        ├──────────────────────────┐
///        ▼                          ▼
///   ┌──────────┐               ┌──────────┐
///   │  filter  │  → DegSet     │  lookup  │  gene → Vec<GeneSummaryRow>
///   └──────────┘               └──────────┘
///        │                          │
///        ├──────────────┐           │
///        ▼              ▼           │
///   ┌──────────┐   ┌──────────┐     │
///   │  export  │   │  chart   │ ◄───┘ gene bars
///   └──────────┘   └──────────┘
///   CSV/TSV bytes   volcano / MA bindings
/// ```

pub mod chart;
pub mod contrast;
pub mod export;
pub mod filter;
pub mod loader;
pub mod lookup;
pub mod model;
