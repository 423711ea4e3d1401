use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::schema::{FEATURE_COUNT, FeatureRow, feature_names};

/// How missing values are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Imputation {
    /// Column mean over every row of the dataset (look-ahead across rows).
    #[default]
    GlobalMean,
    /// Column mean over strictly earlier rows only; 0 before any value is seen.
    RunningMean,
}

impl Imputation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "global" | "global_mean" => Some(Imputation::GlobalMean),
            "running" | "running_mean" => Some(Imputation::RunningMean),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Mean of present values, 0 when the column has none.
    pub mean: f32,
    pub present: usize,
    pub missing: usize,
}

/// Dense row-major matrix handed to the external trainer.
#[derive(Debug, Clone)]
pub struct TrainingMatrix {
    pub n_rows: usize,
    pub n_cols: usize,
    pub values: Vec<f32>,
    pub labels: Vec<f32>,
    /// Sentinel the trainer should treat as missing. Imputed matrices contain
    /// none, but the trainer contract still declares it.
    pub missing: f32,
    pub feature_names: Vec<String>,
    pub columns: Vec<ColumnStats>,
}

impl TrainingMatrix {
    pub fn row(&self, idx: usize) -> &[f32] {
        let start = idx * self.n_cols;
        &self.values[start..start + self.n_cols]
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().skip(col).step_by(self.n_cols.max(1)).copied()
    }

    pub fn positive_labels(&self) -> usize {
        self.labels.iter().filter(|l| **l > 0.5).count()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetAssembler {
    imputation: Imputation,
}

impl DatasetAssembler {
    pub fn new(imputation: Imputation) -> Self {
        Self { imputation }
    }

    pub fn assemble(&self, rows: &[FeatureRow]) -> Result<TrainingMatrix> {
        let Some(first) = rows.first() else {
            return Err(PipelineError::NoRows);
        };
        let n_cols = first.values.len();
        if let Some(bad) = rows.iter().find(|r| r.values.len() != n_cols) {
            return Err(PipelineError::RowWidth {
                expected: n_cols,
                found: bad.values.len(),
            });
        }

        let columns = column_stats(rows, n_cols);
        let values = match self.imputation {
            Imputation::GlobalMean => fill_global(rows, &columns),
            Imputation::RunningMean => fill_running(rows, n_cols),
        };
        let labels = rows.iter().map(|r| f32::from(r.label)).collect();

        let feature_names = if n_cols == FEATURE_COUNT {
            feature_names()
        } else {
            (0..n_cols).map(|i| format!("col_{i}")).collect()
        };

        let imputed: usize = columns.iter().map(|c| c.missing).sum();
        debug!(imputed, imputation = ?self.imputation, "missing values filled");
        info!(rows = rows.len(), cols = n_cols, "assembled training matrix");

        Ok(TrainingMatrix {
            n_rows: rows.len(),
            n_cols,
            values,
            labels,
            missing: f32::NAN,
            feature_names,
            columns,
        })
    }
}

/// Per-column statistics. Columns run in parallel, but each column is summed in
/// row order so the means are bit-identical between runs.
pub fn column_stats(rows: &[FeatureRow], n_cols: usize) -> Vec<ColumnStats> {
    (0..n_cols)
        .into_par_iter()
        .map(|c| {
            let mut sum = 0.0_f64;
            let mut present = 0usize;
            for r in rows {
                if let Some(v) = r.values[c]
                    && v.is_finite()
                {
                    sum += v as f64;
                    present += 1;
                }
            }
            ColumnStats {
                mean: if present > 0 {
                    (sum / present as f64) as f32
                } else {
                    0.0
                },
                present,
                missing: rows.len() - present,
            }
        })
        .collect()
}

fn fill_global(rows: &[FeatureRow], columns: &[ColumnStats]) -> Vec<f32> {
    let mut out = Vec::with_capacity(rows.len() * columns.len());
    for r in rows {
        for (v, col) in r.values.iter().zip(columns) {
            out.push(present(*v).unwrap_or(col.mean));
        }
    }
    out
}

fn fill_running(rows: &[FeatureRow], n_cols: usize) -> Vec<f32> {
    let mut sums = vec![0.0_f64; n_cols];
    let mut counts = vec![0usize; n_cols];
    let mut out = Vec::with_capacity(rows.len() * n_cols);
    for r in rows {
        for (c, v) in r.values.iter().enumerate() {
            let fill = if counts[c] > 0 {
                (sums[c] / counts[c] as f64) as f32
            } else {
                0.0
            };
            out.push(present(*v).unwrap_or(fill));
        }
        for (c, v) in r.values.iter().enumerate() {
            if let Some(v) = present(*v) {
                sums[c] += v as f64;
                counts[c] += 1;
            }
        }
    }
    out
}

fn present(v: Option<f32>) -> Option<f32> {
    v.filter(|x| x.is_finite())
}
