use crate::config::toml_config::{CleaningConfig, PredictionConfig};
use crate::domain::columns::{GOALS_AGAINST, GOALS_FOR, GOAL_DIFF};
use crate::domain::model::Table;
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Brings arbitrary season tables into the shape the model was trained on.
#[derive(Debug, Clone)]
pub struct FeatureAligner {
    features: Vec<String>,
    rename: BTreeMap<String, String>,
    defaults: BTreeMap<String, f64>,
}

impl FeatureAligner {
    pub fn new(features: Vec<String>, cleaning: &CleaningConfig, prediction: &PredictionConfig) -> Self {
        let mut rename = cleaning.rename.clone();
        rename.extend(prediction.rename.clone());
        Self {
            features,
            rename,
            defaults: prediction.default_features.clone(),
        }
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Renamed columns, a derived `Goal_Diff` and default features added.
    /// Columns the model does not use are kept.
    pub fn prepare(&self, table: &Table) -> Result<Table> {
        let mut prepared = table.clone();
        prepared.rename_columns(&self.rename);

        if !prepared.has_column(GOAL_DIFF) && prepared.has_column(GOALS_FOR) && prepared.has_column(GOALS_AGAINST) {
            let diffs: Vec<Value> = prepared
                .records
                .iter()
                .map(|r| match (r.number(GOALS_FOR), r.number(GOALS_AGAINST)) {
                    (Some(scored), Some(conceded)) => Value::from(scored - conceded),
                    _ => Value::Null,
                })
                .collect();
            tracing::debug!("Deriving {} from {} and {}", GOAL_DIFF, GOALS_FOR, GOALS_AGAINST);
            prepared.add_column(GOAL_DIFF, diffs)?;
        }

        for (feature, default) in &self.defaults {
            if !prepared.has_column(feature) {
                tracing::debug!("Input has no '{}', using {}", feature, default);
                let values = vec![Value::from(*default); prepared.len()];
                prepared.add_column(feature, values)?;
            }
        }

        Ok(prepared)
    }

    /// Feature matrix in training order. Absent columns and missing cells
    /// count as 0; text is rejected.
    pub fn matrix(&self, prepared: &Table) -> Result<Vec<Vec<f64>>> {
        let absent: Vec<&String> = self.features.iter().filter(|f| !prepared.has_column(f)).collect();
        if !absent.is_empty() {
            tracing::warn!("Input lacks features {:?}, filling with 0", absent);
        }

        prepared
            .records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                self.features
                    .iter()
                    .map(|feature| match record.get(feature) {
                        None | Some(Value::Null) => Ok(0.0),
                        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0)),
                        Some(other) => Err(EtlError::validation(format!(
                            "feature '{}' has non-numeric value {} at row {}",
                            feature,
                            other,
                            row + 1
                        ))),
                    })
                    .collect()
            })
            .collect()
    }
}
