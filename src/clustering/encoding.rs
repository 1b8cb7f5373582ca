//! Imputation and one-hot encoding of a feature table.
//!
//! The result carries an explicit [`EncodingSchema`] listing, per source
//! feature, the encoded columns derived from it.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::utils::arrow::{f64_values, is_numeric, string_values};

/// How a source feature is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Passed through as a single `f64` column
    Numeric,
    /// One indicator column per distinct value
    Categorical,
}

/// Encoded columns derived from one source feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeature {
    pub name: String,
    pub kind: FeatureKind,
    pub columns: Vec<String>,
}

/// Per-feature mapping to encoded columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingSchema {
    features: Vec<EncodedFeature>,
}

impl EncodingSchema {
    /// Features in source column order
    #[must_use]
    pub fn features(&self) -> &[EncodedFeature] {
        &self.features
    }

    /// Encoded columns derived from `feature`
    #[must_use]
    pub fn columns_of(&self, feature: &str) -> Option<&[String]> {
        self.features
            .iter()
            .find(|f| f.name == feature)
            .map(|f| f.columns.as_slice())
    }

    /// All encoded column names, in matrix order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.features
            .iter()
            .flat_map(|f| f.columns.iter().cloned())
            .collect()
    }
}

/// Numeric matrix produced by [`encode`]
#[derive(Debug, Clone)]
pub struct EncodedTable {
    columns: Vec<String>,
    values: Array2<f64>,
    schema: EncodingSchema,
}

impl EncodedTable {
    /// Number of rows
    #[must_use]
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Encoded column names
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major value matrix
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Feature to column mapping
    #[must_use]
    pub const fn schema(&self) -> &EncodingSchema {
        &self.schema
    }

    /// The matrix as a table of nullable `Float64` columns (NaN becomes null)
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields = self
            .columns
            .iter()
            .map(|name| Field::new(name, DataType::Float64, true))
            .collect_vec();
        let arrays: Vec<ArrayRef> = self
            .values
            .columns()
            .into_iter()
            .map(|column| {
                Arc::new(Float64Array::from_iter(
                    column.iter().map(|v| (!v.is_nan()).then_some(*v)),
                )) as ArrayRef
            })
            .collect();
        if arrays.is_empty() {
            return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }
}

/// Median of the present values; even counts average the two middle values
#[must_use]
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let sorted = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| !v.is_nan())
        .sorted_by(f64::total_cmp)
        .collect_vec();
    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        len if len % 2 == 1 => Some(sorted[mid]),
        _ => Some((sorted[mid - 1] + sorted[mid]) / 2.0),
    }
}

/// Most frequent present value; ties resolve to the smallest value
#[must_use]
pub fn mode(values: &[Option<String>]) -> Option<String> {
    values
        .iter()
        .flatten()
        .counts()
        .into_iter()
        .sorted_by(|(a, ca), (b, cb)| cb.cmp(ca).then_with(|| a.cmp(b)))
        .next()
        .map(|(value, _)| value.clone())
}

/// Whether a column is imputed under `threshold`
fn should_impute(missing: usize, rows: usize, threshold: f64) -> bool {
    #[allow(clippy::cast_precision_loss)]
    let fraction = missing as f64 / rows as f64;
    missing > 0 && fraction < threshold
}

/// Impute and one-hot encode every column of `table`
///
/// Columns whose missing fraction is below `imputation_threshold` are
/// imputed: numeric columns with their median, categorical columns with their
/// mode. Columns at or above the threshold keep their missing values, which
/// become NaN (numeric) or an all-zero indicator row (categorical).
///
/// # Errors
/// Returns [`SimError::InvalidInput`] for a table without columns
pub fn encode(table: &RecordBatch, imputation_threshold: f64) -> Result<EncodedTable> {
    let rows = table.num_rows();
    let schema = table.schema();
    if schema.fields().is_empty() {
        return Err(SimError::InvalidInput("no features selected".to_string()));
    }

    let mut features = Vec::with_capacity(schema.fields().len());
    let mut matrix_columns: Vec<Vec<f64>> = Vec::new();

    for (field, column) in schema.fields().iter().zip(table.columns()) {
        let name = field.name();
        let missing = column.null_count();

        if is_numeric(column.data_type()) {
            let mut values = f64_values(table, name)?;
            let nan_or_null = values.iter().filter(|v| v.is_none_or(f64::is_nan)).count();
            if should_impute(nan_or_null, rows, imputation_threshold) {
                if let Some(fill) = median(&values) {
                    log::debug!("Imputing {nan_or_null} values of '{name}' with median {fill}");
                    for value in &mut values {
                        if value.is_none_or(f64::is_nan) {
                            *value = Some(fill);
                        }
                    }
                }
            }
            matrix_columns.push(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect());
            features.push(EncodedFeature {
                name: name.clone(),
                kind: FeatureKind::Numeric,
                columns: vec![name.clone()],
            });
        } else {
            let mut values = string_values(table, name)?;
            if should_impute(missing, rows, imputation_threshold) {
                if let Some(fill) = mode(&values) {
                    log::debug!("Imputing {missing} values of '{name}' with mode '{fill}'");
                    for value in values.iter_mut().filter(|v| v.is_none()) {
                        *value = Some(fill.clone());
                    }
                }
            }

            let categories = values.iter().flatten().unique().sorted().cloned().collect_vec();
            let mut columns = Vec::with_capacity(categories.len());
            for category in &categories {
                matrix_columns.push(
                    values
                        .iter()
                        .map(|v| if v.as_ref() == Some(category) { 1.0 } else { 0.0 })
                        .collect(),
                );
                columns.push(format!("{name}_{category}"));
            }
            features.push(EncodedFeature {
                name: name.clone(),
                kind: FeatureKind::Categorical,
                columns,
            });
        }
    }

    let mut values = Array2::<f64>::zeros((rows, matrix_columns.len()));
    for (j, column) in matrix_columns.iter().enumerate() {
        for (i, v) in column.iter().enumerate() {
            values[[i, j]] = *v;
        }
    }

    let schema = EncodingSchema { features };
    let columns = schema.column_names();
    log::info!(
        "Encoded {} features into {} columns over {rows} rows",
        schema.features().len(),
        columns.len()
    );
    Ok(EncodedTable {
        columns,
        values,
        schema,
    })
}
