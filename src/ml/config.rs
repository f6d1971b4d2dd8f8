use serde::{Deserialize, Serialize};

/// How many features each split may consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    Sqrt,
    All,
    #[serde(untagged)]
    Fixed(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k.min(n_features),
        };
        n.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// `n_samples / (n_classes * count(class))`
    Balanced,
    None,
}

impl ClassWeight {
    pub fn weights(self, labels: &[usize], n_classes: usize) -> Vec<f64> {
        match self {
            ClassWeight::None => vec![1.0; n_classes],
            ClassWeight::Balanced => {
                let mut counts = vec![0usize; n_classes];
                for &label in labels {
                    counts[label] += 1;
                }
                counts
                    .iter()
                    .map(|&count| {
                        if count == 0 {
                            0.0
                        } else {
                            labels.len() as f64 / (n_classes as f64 * count as f64)
                        }
                    })
                    .collect()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub class_weight: ClassWeight,
    pub seed: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            class_weight: ClassWeight::Balanced,
            seed: 42,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::Sqrt.resolve(11), 3);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::All.resolve(11), 11);
        assert_eq!(MaxFeatures::Fixed(20).resolve(11), 11);
        assert_eq!(MaxFeatures::Fixed(0).resolve(11), 1);
    }

    #[test]
    fn test_balanced_weights() {
        // 18 losers, 2 winners
        let mut labels = vec![0usize; 18];
        labels.extend([1, 1]);

        let weights = ClassWeight::Balanced.weights(&labels, 2);

        assert!((weights[0] - 20.0 / 36.0).abs() < 1e-12);
        assert!((weights[1] - 5.0).abs() < 1e-12);
        assert_eq!(ClassWeight::None.weights(&labels, 2), vec![1.0, 1.0]);
    }
}
