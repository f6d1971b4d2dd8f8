use crate::config::toml_config::{CleaningConfig, PredictionConfig, TrainingConfig};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// File names (not paths) directly under `dir`, sorted.
    fn list_files(&self, dir: &str) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn plots_dir(&self) -> &str;
    fn model_path(&self) -> &str;
    fn cleaned_data_path(&self) -> String;
    fn predictions_path(&self) -> String;
    fn web_predictions_path(&self) -> String;
    fn summary_path(&self) -> String;
    fn cleaning(&self) -> &CleaningConfig;
    fn training(&self) -> &TrainingConfig;
    fn prediction(&self) -> &PredictionConfig;

    fn plot_path(&self, file: &str) -> String {
        format!("{}/{}", self.plots_dir().trim_end_matches('/'), file)
    }
}

/// One stage of the workflow: extract its inputs, transform them, write the
/// outputs and report where they went.
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;

    fn name(&self) -> &str;
    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}
