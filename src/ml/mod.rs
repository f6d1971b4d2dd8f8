//! Random forest classification: split, train, evaluate, persist.

pub mod artifact;
pub mod config;
pub mod forest;
pub mod metrics;
pub mod split;
pub mod tree;

pub use artifact::ModelArtifact;
pub use config::{ClassWeight, MaxFeatures, RandomForestConfig};
pub use forest::RandomForest;
pub use metrics::{ClassificationReport, ConfusionMatrix, Evaluation};
pub use split::{stratified_split, SplitIndices};
