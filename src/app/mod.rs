pub mod features;
pub mod pipelines;
pub mod predictor;
pub mod sample;

pub use features::FeatureAligner;
pub use predictor::WinnerPredictor;
