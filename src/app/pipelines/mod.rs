pub mod clean_pipeline;
pub mod explore_pipeline;
pub mod predict_pipeline;
pub mod train_pipeline;

pub use clean_pipeline::CleanPipeline;
pub use explore_pipeline::ExplorePipeline;
pub use predict_pipeline::{prompt_input_source, InputSource, PredictPipeline};
pub use train_pipeline::TrainPipeline;
