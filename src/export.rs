use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use parquet::basic::{Repetition, Type as PhysicalType};
use parquet::data_type::FloatType;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::dataset::TrainingMatrix;
use crate::schema::FeatureRow;

pub const LABEL_COLUMN: &str = "label";

/// One REQUIRED FLOAT column per feature, then `label`, in a single row group.
pub fn write_parquet(path: &Path, matrix: &TrainingMatrix) -> Result<()> {
    if matrix.feature_names.iter().any(|n| n == LABEL_COLUMN) {
        return Err(anyhow!("feature column clashes with {LABEL_COLUMN}"));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }

    let mut fields = Vec::with_capacity(matrix.n_cols + 1);
    for name in matrix
        .feature_names
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(LABEL_COLUMN))
    {
        let field = Type::primitive_type_builder(name, PhysicalType::FLOAT)
            .with_repetition(Repetition::REQUIRED)
            .build()
            .with_context(|| format!("parquet field {name}"))?;
        fields.push(Arc::new(field));
    }
    let schema = Type::group_type_builder("schema")
        .with_fields(fields)
        .build()
        .context("parquet schema")?;
    let props = WriterProperties::builder().build();

    let file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = SerializedFileWriter::new(file, Arc::new(schema), Arc::new(props))
        .context("open parquet writer")?;
    let mut row_group = writer.next_row_group().context("start row group")?;

    let mut col = 0usize;
    while let Some(mut column) = row_group.next_column().context("next column")? {
        let data: Vec<f32> = if col < matrix.n_cols {
            matrix.column(col).collect()
        } else {
            matrix.labels.clone()
        };
        column
            .typed::<FloatType>()
            .write_batch(&data, None, None)
            .with_context(|| format!("write column {col}"))?;
        column.close().with_context(|| format!("close column {col}"))?;
        col += 1;
    }
    row_group.close().context("close row group")?;
    writer.close().context("close parquet file")?;

    info!(
        path = %path.display(),
        rows = matrix.n_rows,
        cols = matrix.n_cols,
        "wrote parquet"
    );
    Ok(())
}

/// Debug workbook: the first row before and after imputation, plus per-column
/// statistics.
pub fn write_feature_workbook(
    path: &Path,
    matrix: &TrainingMatrix,
    rows: &[FeatureRow],
) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("FirstRow")?;
        write_header(sheet, &["Feature", "Raw", "Imputed"])?;
        let raw = rows.first();
        let imputed = (matrix.n_rows > 0).then(|| matrix.row(0));
        for (i, name) in matrix.feature_names.iter().enumerate() {
            let r = (i + 1) as u32;
            sheet
                .write_string(r, 0, name)
                .with_context(|| format!("write cell ({r},0)"))?;
            match raw.and_then(|row| row.values.get(i).copied().flatten()) {
                Some(v) => sheet.write_number(r, 1, f64::from(v)),
                None => sheet.write_string(r, 1, "missing"),
            }
            .with_context(|| format!("write cell ({r},1)"))?;
            if let Some(v) = imputed.and_then(|row| row.get(i)) {
                sheet
                    .write_number(r, 2, f64::from(*v))
                    .with_context(|| format!("write cell ({r},2)"))?;
            }
        }
        if let Some(row) = raw {
            let r = (matrix.feature_names.len() + 1) as u32;
            sheet.write_string(r, 0, LABEL_COLUMN)?;
            sheet.write_number(r, 1, f64::from(row.label))?;
        }
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Columns")?;
        write_header(sheet, &["Feature", "Mean", "Present", "Missing"])?;
        for (i, (name, stats)) in matrix.feature_names.iter().zip(&matrix.columns).enumerate() {
            let r = (i + 1) as u32;
            sheet.write_string(r, 0, name)?;
            sheet.write_number(r, 1, f64::from(stats.mean))?;
            sheet.write_number(r, 2, stats.present as f64)?;
            sheet.write_number(r, 3, stats.missing as f64)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_header(sheet: &mut Worksheet, labels: &[&str]) -> Result<()> {
    for (col_idx, label) in labels.iter().enumerate() {
        sheet
            .write_string(0, col_idx as u16, *label)
            .with_context(|| format!("write header {label}"))?;
    }
    Ok(())
}
