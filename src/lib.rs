pub mod adapters;
pub mod app;
pub mod charts;
pub mod config;
pub mod core;
pub mod domain;
pub mod ml;
pub mod utils;
pub mod web;

pub use adapters::LocalStorage;
pub use app::pipelines::{CleanPipeline, ExplorePipeline, InputSource, PredictPipeline, TrainPipeline};
pub use app::WinnerPredictor;
pub use config::AppConfig;
#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use core::etl::EtlEngine;
pub use utils::error::{EtlError, Result};
