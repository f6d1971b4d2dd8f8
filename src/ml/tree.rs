//! CART decision tree on weighted samples with Gini impurity.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const MIN_IMPURITY_DECREASE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Node {
    Leaf {
        /// Weighted class frequencies, summing to 1.
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Non-constant features to inspect per split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
    /// Total weighted impurity decrease per feature, unnormalized.
    importances: Vec<f64>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    /// `w_left * gini_left + w_right * gini_right`
    children_impurity: f64,
}

struct Builder<'a, R: Rng> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    config: TreeConfig,
    rng: &'a mut R,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

pub fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total) * (c / total)).sum::<f64>()
}

impl<R: Rng> Builder<'_, R> {
    fn class_totals(&self, indices: &[usize]) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_classes];
        for &i in indices {
            totals[self.y[i]] += self.weights[i];
        }
        totals
    }

    fn build(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let totals = self.class_totals(&indices);
        let weight: f64 = totals.iter().sum();
        let impurity = gini(&totals, weight);

        let node_id = self.nodes.len();
        let distribution = if weight > 0.0 {
            totals.iter().map(|t| t / weight).collect()
        } else {
            vec![0.0; self.n_classes]
        };
        self.nodes.push(Node::Leaf { distribution });

        let depth_ok = self.config.max_depth.map_or(true, |max| depth < max);
        if !depth_ok || indices.len() < self.config.min_samples_split || impurity <= MIN_IMPURITY_DECREASE {
            return node_id;
        }

        let Some(best) = self.best_split(&indices, &totals, weight) else {
            return node_id;
        };
        let decrease = weight * impurity - best.children_impurity;
        if decrease <= MIN_IMPURITY_DECREASE {
            return node_id;
        }
        self.importances[best.feature] += decrease;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[i][best.feature] <= best.threshold);

        let left = self.build(left_idx, depth + 1);
        let right = self.build(right_idx, depth + 1);
        self.nodes[node_id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_id
    }

    fn best_split(&mut self, indices: &[usize], totals: &[f64], weight: f64) -> Option<Candidate> {
        let x = self.x;
        let y = self.y;
        let weights = self.weights;
        let n_features = x[indices[0]].len();

        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(&mut *self.rng);

        let mut sorted = indices.to_vec();
        let mut visited = 0;
        let mut best: Option<Candidate> = None;

        for feature in features {
            // keep looking past the budget until some split exists
            if visited >= self.config.max_features && best.is_some() {
                break;
            }

            sorted.sort_by(|&a, &b| x[a][feature].partial_cmp(&x[b][feature]).unwrap_or(Ordering::Equal));
            let lowest = x[sorted[0]][feature];
            let highest = x[sorted[sorted.len() - 1]][feature];
            if highest <= lowest {
                continue;
            }
            visited += 1;

            let mut left = vec![0.0; self.n_classes];
            let mut left_weight = 0.0;
            for k in 0..sorted.len() - 1 {
                let i = sorted[k];
                left[y[i]] += weights[i];
                left_weight += weights[i];

                let value = x[i][feature];
                let next = x[sorted[k + 1]][feature];
                if next <= value {
                    continue;
                }

                let right: Vec<f64> = totals.iter().zip(&left).map(|(t, l)| t - l).collect();
                let right_weight = weight - left_weight;
                let score = left_weight * gini(&left, left_weight) + right_weight * gini(&right, right_weight);

                if best
                    .as_ref()
                    .map_or(true, |b| score < b.children_impurity - MIN_IMPURITY_DECREASE)
                {
                    let mut threshold = (value + next) / 2.0;
                    if threshold >= next || !threshold.is_finite() {
                        threshold = value;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        children_impurity: score,
                    });
                }
            }
        }

        best
    }
}

impl DecisionTree {
    /// Grow a tree on the samples with positive weight.
    pub fn fit<R: Rng>(
        x: &[Vec<f64>],
        y: &[usize],
        weights: &[f64],
        n_classes: usize,
        config: TreeConfig,
        rng: &mut R,
    ) -> Self {
        let indices: Vec<usize> = (0..x.len()).filter(|&i| weights[i] > 0.0).collect();
        let n_features = x.first().map_or(0, Vec::len);

        let mut builder = Builder {
            x,
            y,
            weights,
            n_classes,
            config,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };

        if indices.is_empty() {
            builder.nodes.push(Node::Leaf {
                distribution: vec![0.0; n_classes],
            });
        } else {
            builder.build(indices, 0);
        }

        DecisionTree {
            nodes: builder.nodes,
            n_classes,
            importances: builder.importances,
        }
    }

    pub fn predict_proba_row(&self, row: &[f64]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}
