use crate::app::predictor::WinnerPredictor;
use crate::charts::{Chart, HorizontalBarChart};
use crate::core::{ConfigProvider, Pipeline, Storage, Table};
use crate::ml::forest::MAX_CLASSES;
use crate::ml::{stratified_split, Evaluation, ModelArtifact, RandomForest};
use crate::utils::error::{EtlError, Result};

pub const IMPORTANCE_CHART: &str = "feature_importance.svg";

pub struct TrainOutput {
    pub artifact: ModelArtifact,
    pub importance_chart: Vec<u8>,
}

pub fn importance_chart(artifact: &ModelArtifact) -> HorizontalBarChart {
    HorizontalBarChart {
        title: "Feature Importance - Premier League Winner Prediction".to_string(),
        x_desc: "Importance".to_string(),
        bars: artifact.ranked_importances(),
    }
}

/// Fits the winner classifier on the cleaned seasons.
pub struct TrainPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> TrainPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn labels(&self, table: &Table) -> Result<Vec<usize>> {
        let label = &self.config.training().label;
        table
            .numeric_column(label)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                if value >= 0.0 && value < MAX_CLASSES as f64 && value.fract() == 0.0 {
                    Ok(value as usize)
                } else {
                    Err(EtlError::validation(format!(
                        "label '{}' must be a class index, got {} at row {}",
                        label,
                        value,
                        row + 1
                    )))
                }
            })
            .collect()
    }
}

fn rows(matrix: &[Vec<f64>], indices: &[usize]) -> Vec<Vec<f64>> {
    indices.iter().map(|&i| matrix[i].clone()).collect()
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for TrainPipeline<S, C> {
    type Extracted = Table;
    type Transformed = TrainOutput;

    fn name(&self) -> &str {
        "train"
    }

    async fn extract(&self) -> Result<Table> {
        let path = self.config.cleaned_data_path();
        let table = Table::from_csv(&self.storage.read_file(&path).await?)?;
        tracing::info!("Loaded {} cleaned rows from {}", table.len(), path);
        Ok(table)
    }

    async fn transform(&self, table: Table) -> Result<TrainOutput> {
        let training = self.config.training();
        table.require_columns(&training.features)?;

        let columns: Vec<Vec<f64>> = training
            .features
            .iter()
            .map(|f| table.numeric_column(f))
            .collect::<Result<_>>()?;
        let x: Vec<Vec<f64>> = (0..table.len())
            .map(|row| columns.iter().map(|c| c[row]).collect())
            .collect();
        let y = self.labels(&table)?;

        let split = stratified_split(&y, training.test_size, training.seed)?;
        tracing::info!("Training on {} rows, testing on {}", split.train.len(), split.test.len());

        let y_train: Vec<usize> = split.train.iter().map(|&i| y[i]).collect();
        let y_test: Vec<usize> = split.test.iter().map(|&i| y[i]).collect();
        let forest = RandomForest::fit(&rows(&x, &split.train), &y_train, training.forest_config())?;

        let predicted = forest.predict(&rows(&x, &split.test))?;
        let evaluation = Evaluation::new(&y_test, &predicted, forest.n_classes());
        tracing::info!("Model evaluation\n{}", evaluation);

        let mut artifact = ModelArtifact::new(training.features.clone(), forest);
        artifact.evaluation = Some(evaluation);
        artifact.train_rows = split.train.len();
        artifact.test_rows = split.test.len();

        for (feature, importance) in artifact.ranked_importances() {
            tracing::debug!("{:<16} {:.4}", feature, importance);
        }

        let importance_chart = importance_chart(&artifact).render()?;
        Ok(TrainOutput {
            artifact,
            importance_chart,
        })
    }

    async fn load(&self, output: TrainOutput) -> Result<String> {
        let model_path = self.config.model_path().to_string();
        self.storage
            .write_file(&model_path, &output.artifact.to_json()?)
            .await?;

        let chart_path = self.config.plot_path(IMPORTANCE_CHART);
        self.storage.write_file(&chart_path, &output.importance_chart).await?;
        tracing::info!("Feature importance chart saved to {}", chart_path);

        // the saved bytes must load back into a usable predictor
        let saved = self.storage.read_file(&model_path).await?;
        WinnerPredictor::from_json(&saved, self.config.cleaning(), self.config.prediction())?;

        Ok(model_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::core::etl::EtlEngine;
    use crate::core::test_support::MockStorage;
    use crate::domain::model::Record;
    use crate::ml::ClassWeight;

    /// Ten seasons of six teams; the champion has the most points.
    fn cleaned_csv() -> Vec<u8> {
        let features = crate::config::toml_config::default_features();
        let mut columns = vec!["Team".to_string(), "Season".to_string()];
        columns.extend(features.iter().cloned());
        columns.push("Winner".to_string());

        let mut table = Table::new(columns);
        for season in 0..10 {
            for team in 0..6 {
                let strength = (6 - team) as f64 + (season % 3) as f64 * 0.3;
                let mut record = Record::new();
                record.set("Team", serde_json::Value::from(format!("Team {}", team)));
                record.set_number("Season", (2010 + season) as f64);
                for (i, feature) in features.iter().enumerate() {
                    record.set_number(feature.clone(), strength * (i + 1) as f64);
                }
                record.set_number("Winner", if team == 0 { 1.0 } else { 0.0 });
                table.push(record);
            }
        }
        table.to_csv().unwrap()
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.training.n_estimators = 30;
        config
    }

    #[tokio::test]
    async fn test_train_writes_model_and_chart() {
        let storage = MockStorage::new()
            .with_file("outputs/cleaned_premier_league.csv", &cleaned_csv())
            .await;
        let engine = EtlEngine::new(TrainPipeline::new(storage.clone(), config()));

        let output = engine.run().await.unwrap();

        assert_eq!(output, "models/premier_league_winner_model.json");
        let artifact = ModelArtifact::from_json(&storage.get_file(&output).await.unwrap()).unwrap();
        assert_eq!(artifact.feature_names.len(), 11);
        assert_eq!(artifact.forest.n_trees(), 30);
        assert_eq!(artifact.train_rows + artifact.test_rows, 60);
        assert_eq!(artifact.test_rows, 12);

        let evaluation = artifact.evaluation.unwrap();
        assert_eq!(evaluation.confusion.total(), 12);
        assert!(evaluation.accuracy > 0.8);

        let chart = storage.get_file("outputs/plots/feature_importance.svg").await.unwrap();
        assert!(String::from_utf8(chart).unwrap().contains("<svg"));
    }

    #[tokio::test]
    async fn test_train_is_deterministic() {
        let storage = MockStorage::new()
            .with_file("outputs/cleaned_premier_league.csv", &cleaned_csv())
            .await;
        let pipeline = TrainPipeline::new(storage, config());

        let a = pipeline.transform(pipeline.extract().await.unwrap()).await.unwrap();
        let b = pipeline.transform(pipeline.extract().await.unwrap()).await.unwrap();

        assert_eq!(a.artifact.forest, b.artifact.forest);
    }

    #[tokio::test]
    async fn test_train_respects_forest_settings() {
        let storage = MockStorage::new()
            .with_file("outputs/cleaned_premier_league.csv", &cleaned_csv())
            .await;
        let mut config = config();
        config.training.class_weight = ClassWeight::None;
        config.training.n_estimators = 5;
        let pipeline = TrainPipeline::new(storage, config);

        let output = pipeline.transform(pipeline.extract().await.unwrap()).await.unwrap();

        assert_eq!(output.artifact.forest.n_trees(), 5);
        assert_eq!(output.artifact.forest.config().class_weight, ClassWeight::None);
    }

    #[tokio::test]
    async fn test_missing_feature_is_error() {
        let storage = MockStorage::new()
            .with_file("outputs/cleaned_premier_league.csv", b"Team,points,Winner\nA,90,1\nB,50,0\n")
            .await;
        let pipeline = TrainPipeline::new(storage, config());

        let table = pipeline.extract().await.unwrap();
        assert!(matches!(
            pipeline.transform(table).await,
            Err(EtlError::MissingColumnError { .. })
        ));
    }

    #[tokio::test]
    async fn test_huge_label_is_rejected() {
        let storage = MockStorage::new()
            .with_file("outputs/cleaned_premier_league.csv", &cleaned_csv())
            .await;
        let pipeline = TrainPipeline::new(storage, config());
        let mut table = pipeline.extract().await.unwrap();
        table.records[0].set_number("Winner", 1e9);

        assert!(matches!(
            pipeline.transform(table).await,
            Err(EtlError::ValidationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_cleaned_file_is_io_error() {
        let pipeline = TrainPipeline::new(MockStorage::new(), config());
        assert!(matches!(pipeline.extract().await, Err(EtlError::IoError(_))));
    }
}
