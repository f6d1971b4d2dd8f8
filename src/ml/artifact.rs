use crate::ml::forest::RandomForest;
use crate::ml::metrics::Evaluation;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted model: the forest together with the feature order it was
/// trained on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub forest: RandomForest,
    pub evaluation: Option<Evaluation>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn new(feature_names: Vec<String>, forest: RandomForest) -> Self {
        Self {
            feature_names,
            forest,
            evaluation: None,
            train_rows: 0,
            test_rows: 0,
            trained_at: Utc::now(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        if artifact.feature_names.len() != artifact.forest.n_features() {
            return Err(EtlError::model(format!(
                "artifact lists {} feature names for a forest of {} features",
                artifact.feature_names.len(),
                artifact.forest.n_features()
            )));
        }
        Ok(artifact)
    }

    /// (feature, importance), most important first.
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.forest.feature_importances().iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}
