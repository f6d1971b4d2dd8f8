use crate::ml::config::RandomForestConfig;
use crate::ml::tree::{DecisionTree, TreeConfig};
use crate::utils::error::{EtlError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Labels are dense class indices below this bound.
pub const MAX_CLASSES: usize = 64;

/// Bagged ensemble of CART trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: RandomForestConfig,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

fn validate_matrix(x: &[Vec<f64>], n_features: usize) -> Result<()> {
    for (row, values) in x.iter().enumerate() {
        if values.len() != n_features {
            return Err(EtlError::model(format!(
                "row {} has {} features, expected {}",
                row + 1,
                values.len(),
                n_features
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EtlError::model(format!("row {} contains a non-finite value", row + 1)));
        }
    }
    Ok(())
}

fn normalized(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter().map(|v| v / total).collect()
    } else {
        values.to_vec()
    }
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[usize], config: RandomForestConfig) -> Result<Self> {
        if x.is_empty() {
            return Err(EtlError::model("cannot fit a forest on zero samples"));
        }
        if x.len() != y.len() {
            return Err(EtlError::model(format!(
                "{} samples but {} labels",
                x.len(),
                y.len()
            )));
        }
        if config.n_estimators == 0 {
            return Err(EtlError::model("n_estimators must be at least 1"));
        }
        let n_features = x[0].len();
        if n_features == 0 {
            return Err(EtlError::model("samples have no features"));
        }
        validate_matrix(x, n_features)?;

        let max_label = y.iter().copied().max().unwrap_or(0);
        if max_label >= MAX_CLASSES {
            return Err(EtlError::model(format!(
                "label {} is not a class index below {}",
                max_label, MAX_CLASSES
            )));
        }
        let n_classes = max_label + 1;
        let class_weights = config.class_weight.weights(y, n_classes);
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split.max(2),
            max_features: config.max_features.resolve(n_features),
        };

        tracing::debug!(
            "Fitting {} trees on {} samples, {} features, {} classes",
            config.n_estimators,
            x.len(),
            n_features,
            n_classes
        );

        let mut rng = StdRng::seed_from_u64(config.seed);
        let n = x.len();
        let mut trees = Vec::with_capacity(config.n_estimators);
        for _ in 0..config.n_estimators {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());

            let weights: Vec<f64> = if config.bootstrap {
                let mut counts = vec![0u32; n];
                for _ in 0..n {
                    counts[tree_rng.gen_range(0..n)] += 1;
                }
                counts
                    .iter()
                    .zip(y)
                    .map(|(&c, &label)| c as f64 * class_weights[label])
                    .collect()
            } else {
                y.iter().map(|&label| class_weights[label]).collect()
            };

            trees.push(DecisionTree::fit(x, y, &weights, n_classes, tree_config, &mut tree_rng));
        }

        let mut importances = vec![0.0; n_features];
        for tree in &trees {
            for (total, value) in importances.iter_mut().zip(normalized(tree.importances())) {
                *total += value;
            }
        }
        let feature_importances = normalized(
            &importances
                .iter()
                .map(|v| v / trees.len() as f64)
                .collect::<Vec<_>>(),
        );

        Ok(Self {
            config,
            n_features,
            n_classes,
            trees,
            feature_importances,
        })
    }

    /// Class probabilities per row, averaged over trees.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        validate_matrix(x, self.n_features)?;
        Ok(x.iter()
            .map(|row| {
                let mut proba = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    for (p, v) in proba.iter_mut().zip(tree.predict_proba_row(row)) {
                        *p += v;
                    }
                }
                proba.iter().map(|p| p / self.trees.len() as f64).collect()
            })
            .collect())
    }

    /// Probability of class `1`, zero when the forest never saw it.
    pub fn positive_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| p.get(1).copied().unwrap_or(0.0))
            .collect())
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| {
                // first maximum wins ties
                p.iter()
                    .enumerate()
                    .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
                    .0
            })
            .collect())
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
