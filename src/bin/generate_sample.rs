//! Writes a synthetic multi-contrast differential expression table, as
//! `sample_degs.tsv` and `sample_degs.parquet`, into the directory given as
//! the first argument (default: current directory).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Builder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

const N_GENES: usize = 2000;
const DE_FRACTION: f64 = 0.08;
const MISSING_FRACTION: f64 = 0.01;

const KNOWN_GENES: [&str; 8] = ["TP53", "BRCA1", "MYC", "EGFR", "GAPDH", "ACTB", "KRAS", "VEGFA"];

/// (contrast name, has AveExpr column)
const CONTRASTS: [(&str, bool); 3] = [
    ("PRJNA000001_Hsap_heat_vs_ctrl", true),
    ("cold_vs_ctrl", true),
    ("starved_vs_ctrl", false),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Metric columns of one simulated contrast.
struct ContrastColumns {
    name: &'static str,
    log_fc: Vec<Option<f64>>,
    ave_expr: Option<Vec<Option<f64>>>,
    p_value: Vec<Option<f64>>,
    adj_p: Vec<Option<f64>>,
}

/// Benjamini-Hochberg adjustment; missing p-values stay missing.
fn benjamini_hochberg(p: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut present: Vec<(usize, f64)> = p
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    present.sort_by(|a, b| a.1.total_cmp(&b.1));

    let m = present.len() as f64;
    let mut adjusted = vec![None; p.len()];
    let mut running_min = 1.0_f64;
    for (rank, &(idx, pv)) in present.iter().enumerate().rev() {
        running_min = running_min.min(pv * m / (rank + 1) as f64);
        adjusted[idx] = Some(running_min);
    }
    adjusted
}

fn simulate(
    rng: &mut SimpleRng,
    name: &'static str,
    with_ave_expr: bool,
    baseline: &[f64],
) -> ContrastColumns {
    let mut log_fc = Vec::with_capacity(baseline.len());
    let mut ave_expr = Vec::with_capacity(baseline.len());
    let mut p_value = Vec::with_capacity(baseline.len());

    for &base in baseline {
        let (lfc, p) = if rng.next_f64() < DE_FRACTION {
            let sign = if rng.next_f64() < 0.5 { -1.0 } else { 1.0 };
            (sign * rng.gauss(2.5, 0.8).abs(), 10f64.powf(-rng.uniform(2.0, 12.0)))
        } else {
            (rng.gauss(0.0, 0.35), rng.next_f64())
        };
        let missing = rng.next_f64() < MISSING_FRACTION;
        log_fc.push((!missing).then_some(lfc));
        p_value.push((!missing).then_some(p));
        ave_expr.push(Some(base + rng.gauss(0.0, 0.2)));
    }

    let adj_p = benjamini_hochberg(&p_value);
    ContrastColumns {
        name,
        log_fc,
        ave_expr: with_ave_expr.then_some(ave_expr),
        p_value,
        adj_p,
    }
}

fn fmt_value(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.6e}")).unwrap_or_else(|| "NA".to_string())
}

fn float_array(values: &[Option<f64>]) -> ArrayRef {
    let mut builder = Float64Builder::with_capacity(values.len());
    for v in values {
        builder.append_option(*v);
    }
    Arc::new(builder.finish())
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let genes: Vec<String> = (0..N_GENES)
        .map(|i| match KNOWN_GENES.get(i) {
            Some(g) => g.to_string(),
            None => format!("GENE{i:05}"),
        })
        .collect();
    let baseline: Vec<f64> = (0..N_GENES).map(|_| rng.gauss(7.0, 2.0).max(0.0)).collect();

    let contrasts: Vec<ContrastColumns> = CONTRASTS
        .iter()
        .map(|&(name, with_ave)| simulate(&mut rng, name, with_ave, &baseline))
        .collect();

    // Column layout: gene, then per contrast logFC, AveExpr?, P.Value, adj.P.Val
    let mut fields = vec![Field::new("SYMBOL", DataType::Utf8, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from(genes.clone()))];
    let mut header = vec!["SYMBOL".to_string()];
    let mut text_columns: Vec<&[Option<f64>]> = Vec::new();
    for c in &contrasts {
        let mut metrics: Vec<(&str, &[Option<f64>])> = vec![("logFC", c.log_fc.as_slice())];
        if let Some(ave) = &c.ave_expr {
            metrics.push(("AveExpr", ave.as_slice()));
        }
        metrics.push(("P.Value", c.p_value.as_slice()));
        metrics.push(("adj.P.Val", c.adj_p.as_slice()));

        for (metric, values) in metrics {
            let column = format!("{}_{metric}", c.name);
            fields.push(Field::new(&column, DataType::Float64, true));
            arrays.push(float_array(values));
            header.push(column);
            text_columns.push(values);
        }
    }

    // ---- TSV ----
    let tsv_path = out_dir.join("sample_degs.tsv");
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&tsv_path)
        .with_context(|| format!("creating {}", tsv_path.display()))?;
    writer.write_record(&header)?;
    for (row, gene) in genes.iter().enumerate() {
        let mut record = vec![gene.clone()];
        record.extend(text_columns.iter().map(|col| fmt_value(col[row])));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    // ---- Parquet ----
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let parquet_path = out_dir.join("sample_degs.parquet");
    let file = std::fs::File::create(&parquet_path)
        .with_context(|| format!("creating {}", parquet_path.display()))?;
    let mut parquet_writer = ArrowWriter::try_new(file, schema, None)?;
    parquet_writer.write(&batch)?;
    parquet_writer.close()?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!(
        "Wrote {N_GENES} genes × {} contrasts to {} and {}",
        contrasts.len(),
        tsv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
