use crate::app::predictor::{prediction_chart, render_predictions, WinnerPredictor};
use crate::app::sample::sample_season;
use crate::charts::Chart;
use crate::core::{ConfigProvider, Pipeline, Storage, Table};
use crate::utils::error::{EtlError, Result};
use std::io::{BufRead, Write};

pub const PREDICTION_CHART: &str = "future_prediction_chart.svg";

/// Where the upcoming season's statistics come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Sample,
    Csv(String),
}

/// Ask on `output` and read the answer from `input`: `2` loads a CSV path,
/// anything else uses the sample season.
pub fn prompt_input_source<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<InputSource> {
    writeln!(output, "Choose input data:")?;
    writeln!(output, "  1) Sample season")?;
    writeln!(output, "  2) Load from CSV")?;
    write!(output, "Enter choice (1/2): ")?;
    output.flush()?;

    let mut choice = String::new();
    input.read_line(&mut choice)?;
    if choice.trim() != "2" {
        return Ok(InputSource::Sample);
    }

    write!(output, "Enter CSV file path: ")?;
    output.flush()?;
    let mut path = String::new();
    input.read_line(&mut path)?;
    let path = path.trim();
    if path.is_empty() {
        return Err(EtlError::validation("no CSV path given"));
    }
    Ok(InputSource::Csv(path.to_string()))
}

pub struct PredictOutput {
    pub predictions: Table,
    pub chart: Vec<u8>,
}

/// Scores an upcoming season with the saved model.
pub struct PredictPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    source: InputSource,
}

impl<S: Storage, C: ConfigProvider> PredictPipeline<S, C> {
    pub fn new(storage: S, config: C, source: InputSource) -> Self {
        Self {
            storage,
            config,
            source,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PredictPipeline<S, C> {
    type Extracted = (WinnerPredictor, Table);
    type Transformed = PredictOutput;

    fn name(&self) -> &str {
        "predict"
    }

    async fn extract(&self) -> Result<(WinnerPredictor, Table)> {
        let model_path = self.config.model_path();
        if !self.storage.exists(model_path).await {
            return Err(EtlError::model(format!(
                "no trained model at '{}'; run the train stage first",
                model_path
            )));
        }
        let predictor = WinnerPredictor::from_json(
            &self.storage.read_file(model_path).await?,
            self.config.cleaning(),
            self.config.prediction(),
        )?;

        let table = match &self.source {
            InputSource::Sample => {
                tracing::info!("Using the built-in sample season");
                sample_season()
            }
            InputSource::Csv(path) => {
                tracing::info!("Reading season data from {}", path);
                Table::from_csv(&self.storage.read_file(path).await?)?
            }
        };
        Ok((predictor, table))
    }

    async fn transform(&self, data: (WinnerPredictor, Table)) -> Result<PredictOutput> {
        let (predictor, table) = data;
        let predictions = predictor.predict(&table)?;
        tracing::info!("Predicted title odds\n{}", render_predictions(&predictions)?);

        let chart = prediction_chart(&predictions)?.render()?;
        Ok(PredictOutput { predictions, chart })
    }

    async fn load(&self, output: PredictOutput) -> Result<String> {
        let output_path = self.config.predictions_path();
        self.storage
            .write_file(&output_path, &output.predictions.to_csv()?)
            .await?;

        let chart_path = self.config.plot_path(PREDICTION_CHART);
        self.storage.write_file(&chart_path, &output.chart).await?;
        tracing::info!("Prediction chart saved to {}", chart_path);

        Ok(output_path)
    }
}
