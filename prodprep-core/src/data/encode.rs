//! Encoder stage: label codes and numeric feature encoding.
//!
//! Class codes and category indices are positions in a *sorted* list of the
//! distinct values, so fitting twice on the same data (in any row order)
//! yields the same codes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::data::table::{CleanTable, FeatureMatrix};
use crate::error::{PrepError, Result};

/// How categorical feature columns become numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalPolicy {
    /// One `0.0`/`1.0` column per category, named `<column>=<category>`.
    #[default]
    OneHot,
    /// A single column holding the category index.
    Ordinal,
}

impl std::str::FromStr for CategoricalPolicy {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one_hot" | "onehot" | "one-hot" => Ok(Self::OneHot),
            "ordinal" => Ok(Self::Ordinal),
            other => Err(PrepError::config(format!(
                "unknown categorical encoding '{other}' (expected one_hot or ordinal)"
            ))),
        }
    }
}

/// Dense bijection between the distinct labels seen at fit time and `[0, n)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoding {
    column: String,
    classes: Vec<String>,
}

impl LabelEncoding {
    /// Fit over the distinct values of `labels`.
    pub fn fit<'a>(column: &str, labels: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let classes: Vec<String> = labels
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        if classes.is_empty() {
            return Err(PrepError::empty_dataset(format!(
                "no labels to fit in column '{column}'"
            )));
        }
        Ok(Self {
            column: column.to_string(),
            classes,
        })
    }

    /// Build from an explicit class list, e.g. one read back from disk.
    pub fn from_classes(column: &str, classes: Vec<String>) -> Result<Self> {
        let sorted: Vec<String> = classes
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if sorted.is_empty() || sorted != classes {
            return Err(PrepError::format(format!(
                "label classes for '{column}' must be non-empty, sorted and unique"
            )));
        }
        Ok(Self {
            column: column.to_string(),
            classes,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Class code of `label`; unseen labels are an error, never a default.
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| PrepError::unseen_label(&self.column, label))
    }

    pub fn decode(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| PrepError::unseen_label(&self.column, code.to_string()))
    }
}

/// How a single input column is turned into output features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical { categories: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

/// Fitted encoding of every feature column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoding {
    policy: CategoricalPolicy,
    columns: Vec<FeatureColumn>,
    output_names: Vec<String>,
}

fn parse_numeric(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl FeatureEncoding {
    /// Fit on every column of `table` except `label_column`.
    pub fn fit(table: &CleanTable, label_column: &str, policy: CategoricalPolicy) -> Result<Self> {
        let mut columns = Vec::new();
        for (idx, name) in table.columns().iter().enumerate() {
            if name == label_column {
                continue;
            }
            let numeric = table.column_values(idx).all(|v| parse_numeric(v).is_some());
            let kind = if numeric {
                FeatureKind::Numeric
            } else {
                let categories = table
                    .column_values(idx)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                FeatureKind::Categorical { categories }
            };
            columns.push(FeatureColumn {
                name: name.clone(),
                kind,
            });
        }
        if columns.is_empty() {
            return Err(PrepError::format("table has no feature columns"));
        }
        let encoding = Self::from_columns(policy, columns);
        let mut seen = HashSet::new();
        if let Some(dup) = encoding.output_names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(PrepError::format(format!(
                "feature name '{dup}' is produced more than once"
            )));
        }
        Ok(encoding)
    }

    pub fn from_columns(policy: CategoricalPolicy, columns: Vec<FeatureColumn>) -> Self {
        let output_names = output_names(policy, &columns);
        Self {
            policy,
            columns,
            output_names,
        }
    }

    pub fn policy(&self) -> CategoricalPolicy {
        self.policy
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Names of the produced numeric features, in matrix column order.
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    pub fn num_features(&self) -> usize {
        self.output_names.len()
    }

    /// Encode rows whose layout is described by `header`.
    ///
    /// Extra columns in `header` (such as the label) are ignored; a missing
    /// feature column or non-numeric value is a format error, and a category
    /// not seen at fit time is an unseen-label error.
    pub fn transform(&self, header: &[String], rows: &[Vec<String>]) -> Result<FeatureMatrix> {
        let positions = self
            .columns
            .iter()
            .map(|col| {
                header.iter().position(|h| h == &col.name).ok_or_else(|| {
                    PrepError::format(format!("input is missing feature column '{}'", col.name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let mut encoded = Vec::with_capacity(self.output_names.len());
            for (col, &pos) in self.columns.iter().zip(&positions) {
                let value = row.get(pos).map(String::as_str).ok_or_else(|| {
                    PrepError::format(format!("row {row_idx} is shorter than the header"))
                })?;
                self.encode_cell(col, value, row_idx, &mut encoded)?;
            }
            out.push(encoded);
        }
        Ok(FeatureMatrix::new(self.output_names.clone(), out))
    }

    fn encode_cell(
        &self,
        col: &FeatureColumn,
        value: &str,
        row_idx: usize,
        out: &mut Vec<f64>,
    ) -> Result<()> {
        match &col.kind {
            FeatureKind::Numeric => {
                let v = parse_numeric(value).ok_or_else(|| {
                    PrepError::format(format!(
                        "row {row_idx}: column '{}' expects a number, got '{value}'",
                        col.name
                    ))
                })?;
                out.push(v);
            }
            FeatureKind::Categorical { categories } => {
                let value = value.trim();
                let idx = categories
                    .binary_search_by(|c| c.as_str().cmp(value))
                    .map_err(|_| PrepError::unseen_label(&col.name, value))?;
                match self.policy {
                    CategoricalPolicy::Ordinal => out.push(idx as f64),
                    CategoricalPolicy::OneHot => {
                        out.extend((0..categories.len()).map(|i| if i == idx { 1.0 } else { 0.0 }));
                    }
                }
            }
        }
        Ok(())
    }
}

fn output_names(policy: CategoricalPolicy, columns: &[FeatureColumn]) -> Vec<String> {
    let mut names = Vec::new();
    for col in columns {
        match (&col.kind, policy) {
            (FeatureKind::Categorical { categories }, CategoricalPolicy::OneHot) => {
                names.extend(categories.iter().map(|c| format!("{}={}", col.name, c)));
            }
            _ => names.push(col.name.clone()),
        }
    }
    names
}

/// Feature matrix plus row-aligned label codes.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    pub features: FeatureMatrix,
    pub labels: Vec<usize>,
}

impl EncodedTable {
    pub fn row_count(&self) -> usize {
        self.labels.len()
    }
}

/// Fit both encodings on `table` and apply them.
pub fn encode(
    table: &CleanTable,
    label_column: &str,
    policy: CategoricalPolicy,
) -> Result<(EncodedTable, LabelEncoding, FeatureEncoding)> {
    let label_idx = table.column_index(label_column).ok_or_else(|| {
        PrepError::format(format!("label column '{label_column}' not found"))
    })?;

    let label_encoding = LabelEncoding::fit(label_column, table.column_values(label_idx))?;
    let labels = table
        .column_values(label_idx)
        .map(|v| label_encoding.encode(v))
        .collect::<Result<Vec<_>>>()?;

    let feature_encoding = FeatureEncoding::fit(table, label_column, policy)?;
    let features = feature_encoding.transform(table.columns(), table.rows())?;

    tracing::debug!(
        num_classes = label_encoding.num_classes(),
        num_features = feature_encoding.num_features(),
        categorical = feature_encoding
            .columns()
            .iter()
            .filter(|c| matches!(c.kind, FeatureKind::Categorical { .. }))
            .count(),
        "Fitted encoders"
    );

    Ok((
        EncodedTable { features, labels },
        label_encoding,
        feature_encoding,
    ))
}
