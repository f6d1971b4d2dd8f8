use crate::app::pipelines::predict_pipeline::PREDICTION_CHART;
use crate::app::pipelines::train_pipeline::{importance_chart, IMPORTANCE_CHART};
use crate::app::predictor::{normalize, probability_chart};
use crate::app::sample::sample_probabilities;
use crate::charts::{Chart, GroupedBarChart, Heatmap, Histogram, LineChart, ScatterChart, ScatterSeries};
use crate::core::stats::{correlation_matrix, describe, group_mean, summary_table, value_counts};
use crate::core::{ConfigProvider, Pipeline, Storage, Table};
use crate::domain::columns::{GOAL_DIFF, LOSSES, POINTS, SEASON, TEAM, WINNER, WINS, WIN_PROBABILITY};
use crate::ml::ModelArtifact;
use crate::utils::error::{EtlError, Result};

const HISTOGRAM_BINS: usize = 12;
const COMPARED_METRICS: [&str; 4] = [POINTS, GOAL_DIFF, WINS, LOSSES];

pub struct ExploreInput {
    pub cleaned: Table,
    pub artifact: Option<ModelArtifact>,
    pub predictions: Option<Table>,
}

pub struct ExploreOutput {
    pub summary: Table,
    /// (file name, SVG document)
    pub charts: Vec<(String, Vec<u8>)>,
}

fn points_vs_goal_diff(table: &Table) -> Result<ScatterChart> {
    let points = table.optional_numeric_column(POINTS)?;
    let goal_diff = table.optional_numeric_column(GOAL_DIFF)?;
    let winners = table.optional_numeric_column(WINNER)?;

    let mut series: Vec<ScatterSeries> = [0.0, 1.0]
        .iter()
        .map(|flag| ScatterSeries {
            label: format!("{} = {}", WINNER, flag),
            points: Vec::new(),
        })
        .collect();
    for ((p, g), w) in points.into_iter().zip(goal_diff).zip(winners) {
        if let (Some(p), Some(g)) = (p, g) {
            let index = usize::from(w == Some(1.0));
            series[index].points.push((g, p));
        }
    }

    Ok(ScatterChart {
        title: "Points vs Goal Difference (Winner Highlighted)".to_string(),
        x_desc: "Goal Difference".to_string(),
        y_desc: "Points".to_string(),
        series,
    })
}

fn avg_points_per_season(table: &Table) -> Result<LineChart> {
    Ok(LineChart {
        title: "Average Points per Season".to_string(),
        x_desc: "Season".to_string(),
        y_desc: "Average Points".to_string(),
        points: group_mean(table, SEASON, POINTS)?,
    })
}

fn correlation_heatmap(table: &Table) -> Result<Heatmap> {
    let matrix = correlation_matrix(table)?;
    Ok(Heatmap {
        title: "Feature Correlation Heatmap".to_string(),
        labels: matrix.columns,
        values: matrix.values,
    })
}

fn points_distribution(table: &Table) -> Result<Histogram> {
    Ok(Histogram {
        title: "Distribution of Points".to_string(),
        x_desc: "Points".to_string(),
        y_desc: "Number of Teams".to_string(),
        values: table.optional_numeric_column(POINTS)?.into_iter().flatten().collect(),
        bins: HISTOGRAM_BINS,
    })
}

fn winner_vs_nonwinner(table: &Table) -> Result<GroupedBarChart> {
    let mut non_winners = Vec::new();
    let mut winners = Vec::new();
    for metric in COMPARED_METRICS {
        let means = group_mean(table, WINNER, metric)?;
        let lookup = |flag: &str| {
            means
                .iter()
                .find(|(key, _)| key == flag)
                .map(|(_, mean)| *mean)
                .unwrap_or(0.0)
        };
        non_winners.push(lookup("0"));
        winners.push(lookup("1"));
    }

    Ok(GroupedBarChart {
        title: "Winners vs Non-Winners: Average Stats".to_string(),
        y_desc: "Average Value".to_string(),
        groups: COMPARED_METRICS.iter().map(|m| m.to_string()).collect(),
        series: vec![
            ("Non-Winner (0)".to_string(), non_winners),
            ("Winner (1)".to_string(), winners),
        ],
    })
}

/// Last saved predictions, or the built-in odds when there are none;
/// re-normalized and sorted.
fn future_odds(predictions: Option<&Table>) -> Vec<(String, f64)> {
    let saved = predictions.and_then(|table| {
        let probabilities = table.numeric_column(WIN_PROBABILITY).ok()?;
        table.require_columns(&[TEAM]).ok()?;
        Some(
            table
                .records
                .iter()
                .map(|r| r.display(TEAM))
                .zip(probabilities)
                .collect::<Vec<_>>(),
        )
    });
    let odds = saved.unwrap_or_else(|| {
        tracing::info!("No saved predictions, charting the sample odds");
        sample_probabilities()
    });

    let normalized = normalize(&odds.iter().map(|(_, p)| *p).collect::<Vec<_>>());
    let mut bars: Vec<(String, f64)> = odds.into_iter().map(|(team, _)| team).zip(normalized).collect();
    bars.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    bars
}

/// Keeps a rendered chart; a chart that cannot be drawn is logged and left
/// out so the summary and the other charts are still written.
fn push_chart(charts: &mut Vec<(String, Vec<u8>)>, file: &str, rendered: Result<Vec<u8>>) -> Result<()> {
    match rendered {
        Ok(svg) => charts.push((file.to_string(), svg)),
        Err(EtlError::ChartError { message }) => tracing::warn!("Skipping {}: {}", file, message),
        Err(e) => return Err(e),
    }
    Ok(())
}

/// Summary statistics and the exploratory charts.
pub struct ExplorePipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> ExplorePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    async fn read_optional(&self, path: &str) -> Option<Vec<u8>> {
        if !self.storage.exists(path).await {
            return None;
        }
        match self.storage.read_file(path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path, e);
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ExplorePipeline<S, C> {
    type Extracted = ExploreInput;
    type Transformed = ExploreOutput;

    fn name(&self) -> &str {
        "explore"
    }

    async fn extract(&self) -> Result<ExploreInput> {
        let cleaned_path = self.config.cleaned_data_path();
        let cleaned = Table::from_csv(&self.storage.read_file(&cleaned_path).await?)?;
        tracing::info!("Loaded {} cleaned rows", cleaned.len());

        let artifact = match self.read_optional(self.config.model_path()).await {
            Some(bytes) => match ModelArtifact::from_json(&bytes) {
                Ok(artifact) => Some(artifact),
                Err(e) => {
                    tracing::warn!("Skipping feature importance, model did not load: {}", e);
                    None
                }
            },
            None => None,
        };

        let predictions = match self.read_optional(&self.config.predictions_path()).await {
            Some(bytes) => Table::from_csv(&bytes)
                .map_err(|e| tracing::warn!("Ignoring unreadable predictions file: {}", e))
                .ok(),
            None => None,
        };

        Ok(ExploreInput {
            cleaned,
            artifact,
            predictions,
        })
    }

    async fn transform(&self, input: ExploreInput) -> Result<ExploreOutput> {
        let table = &input.cleaned;
        let summary = summary_table(&describe(table)?);

        for (flag, count) in value_counts(table, WINNER)? {
            tracing::info!("{} = {}: {} team-seasons", WINNER, flag, count);
        }

        let mut charts = Vec::new();
        push_chart(&mut charts, "points_vs_goal_diff.svg", points_vs_goal_diff(table)?.render())?;
        push_chart(&mut charts, "avg_points_per_season.svg", avg_points_per_season(table)?.render())?;
        push_chart(&mut charts, "correlation_heatmap.svg", correlation_heatmap(table)?.render())?;
        push_chart(&mut charts, "points_distribution.svg", points_distribution(table)?.render())?;
        push_chart(&mut charts, "winner_vs_nonwinner.svg", winner_vs_nonwinner(table)?.render())?;

        if let Some(artifact) = &input.artifact {
            push_chart(&mut charts, IMPORTANCE_CHART, importance_chart(artifact).render())?;
        }

        let odds = future_odds(input.predictions.as_ref());
        push_chart(&mut charts, PREDICTION_CHART, probability_chart(odds).render())?;

        Ok(ExploreOutput { summary, charts })
    }

    async fn load(&self, output: ExploreOutput) -> Result<String> {
        let summary_path = self.config.summary_path();
        self.storage
            .write_file(&summary_path, &output.summary.to_csv()?)
            .await?;

        for (file, svg) in &output.charts {
            let path = self.config.plot_path(file);
            tracing::debug!("Saving {} ({} bytes)", path, svg.len());
            self.storage.write_file(&path, svg).await?;
        }
        tracing::info!("Saved {} charts", output.charts.len());

        Ok(self.config.plots_dir().to_string())
    }
}
