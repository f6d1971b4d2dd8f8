use crate::app::features::FeatureAligner;
use crate::charts::HorizontalBarChart;
use crate::config::toml_config::{CleaningConfig, PredictionConfig};
use crate::domain::columns::{NORMALIZED_PROB, TEAM, WIN_PROBABILITY};
use crate::domain::model::Table;
use crate::ml::ModelArtifact;
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

/// Divide by the total; an all-zero input spreads the mass evenly.
pub fn normalize(probabilities: &[f64]) -> Vec<f64> {
    let total: f64 = probabilities.iter().sum();
    if total > 0.0 {
        probabilities.iter().map(|p| p / total).collect()
    } else {
        let share = 1.0 / probabilities.len().max(1) as f64;
        vec![share; probabilities.len()]
    }
}

/// Scores a season table with a trained model.
#[derive(Debug, Clone)]
pub struct WinnerPredictor {
    artifact: ModelArtifact,
    aligner: FeatureAligner,
}

impl WinnerPredictor {
    pub fn new(artifact: ModelArtifact, cleaning: &CleaningConfig, prediction: &PredictionConfig) -> Self {
        let aligner = FeatureAligner::new(artifact.feature_names.clone(), cleaning, prediction);
        Self { artifact, aligner }
    }

    pub fn from_json(bytes: &[u8], cleaning: &CleaningConfig, prediction: &PredictionConfig) -> Result<Self> {
        let artifact = ModelArtifact::from_json(bytes)?;
        Ok(Self::new(artifact, cleaning, prediction))
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// The aligned input with `Win_Probability` and `Normalized_Prob`
    /// appended, most likely champion first.
    pub fn predict(&self, table: &Table) -> Result<Table> {
        if table.is_empty() {
            return Err(EtlError::validation("prediction input has no rows"));
        }
        table.require_columns(&[TEAM])?;

        let mut prepared = self.aligner.prepare(table)?;
        let matrix = self.aligner.matrix(&prepared)?;
        let probabilities = self.artifact.forest.positive_proba(&matrix)?;
        let normalized = normalize(&probabilities);

        prepared.add_column(WIN_PROBABILITY, probabilities.into_iter().map(Value::from).collect())?;
        prepared.add_column(NORMALIZED_PROB, normalized.into_iter().map(Value::from).collect())?;
        prepared.sort_by_desc(NORMALIZED_PROB);

        tracing::debug!("Scored {} teams", prepared.len());
        Ok(prepared)
    }
}

/// `Team / Win_Probability / Normalized_Prob` as an aligned text table.
pub fn render_predictions(predictions: &Table) -> Result<String> {
    predictions.require_columns(&[TEAM, WIN_PROBABILITY, NORMALIZED_PROB])?;
    let width = predictions
        .records
        .iter()
        .map(|r| r.display(TEAM).chars().count())
        .chain(std::iter::once(TEAM.len()))
        .max()
        .unwrap_or(TEAM.len());

    let mut lines = vec![format!(
        "{:<width$}  {:>15}  {:>15}",
        TEAM,
        WIN_PROBABILITY,
        NORMALIZED_PROB,
        width = width
    )];
    lines.extend(predictions.records.iter().map(|record| {
        format!(
            "{:<width$}  {:>15.4}  {:>15.4}",
            record.display(TEAM),
            record.number(WIN_PROBABILITY).unwrap_or(0.0),
            record.number(NORMALIZED_PROB).unwrap_or(0.0),
            width = width
        )
    }));
    Ok(lines.join("\n") + "\n")
}

/// Horizontal bars of the normalized probability per team, in table order.
pub fn prediction_chart(predictions: &Table) -> Result<HorizontalBarChart> {
    predictions.require_columns(&[TEAM, NORMALIZED_PROB])?;
    let bars = predictions
        .records
        .iter()
        .map(|r| (r.display(TEAM), r.number(NORMALIZED_PROB).unwrap_or(0.0)))
        .collect();
    Ok(probability_chart(bars))
}

pub fn probability_chart(bars: Vec<(String, f64)>) -> HorizontalBarChart {
    HorizontalBarChart {
        title: "Predicted Premier League Winner Probabilities".to_string(),
        x_desc: "Normalized Win Probability".to_string(),
        bars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::sample::sample_season;
    use crate::ml::{RandomForest, RandomForestConfig};

    fn predictor() -> WinnerPredictor {
        let x = vec![
            vec![90.0, 50.0],
            vec![60.0, 5.0],
            vec![88.0, 45.0],
            vec![55.0, -10.0],
            vec![70.0, 12.0],
            vec![92.0, 60.0],
        ];
        let y = vec![1, 0, 1, 0, 0, 1];
        let config = RandomForestConfig {
            n_estimators: 25,
            ..RandomForestConfig::default()
        };
        let forest = RandomForest::fit(&x, &y, config).unwrap();
        let artifact = ModelArtifact::new(vec!["points".to_string(), "Goal_Diff".to_string()], forest);
        WinnerPredictor::new(artifact, &CleaningConfig::default(), &PredictionConfig::default())
    }

    #[test]
    fn test_normalize() {
        let normalized = normalize(&[0.2, 0.6, 0.2]);
        assert!((normalized.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((normalized[1] - 0.6).abs() < 1e-12);

        assert_eq!(normalize(&[0.0, 0.0, 0.0, 0.0]), vec![0.25; 4]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_predict_sample_season() {
        let predictions = predictor().predict(&sample_season()).unwrap();

        assert_eq!(predictions.len(), 8);
        let normalized = predictions.numeric_column(NORMALIZED_PROB).unwrap();
        assert!((normalized.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(normalized.windows(2).all(|w| w[0] >= w[1]));
        assert!(predictions
            .numeric_column(WIN_PROBABILITY)
            .unwrap()
            .iter()
            .all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(predictions.records[0].text(TEAM), Some("Manchester City"));
    }

    #[test]
    fn test_predict_is_deterministic() {
        let a = predictor().predict(&sample_season()).unwrap();
        let b = predictor().predict(&sample_season()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predict_rejects_empty_and_teamless_input() {
        let predictor = predictor();

        let empty = Table::from_csv(b"Team,points\n").unwrap();
        assert!(matches!(
            predictor.predict(&empty),
            Err(EtlError::ValidationError { .. })
        ));

        let teamless = Table::from_csv(b"points\n80\n").unwrap();
        assert!(matches!(
            predictor.predict(&teamless),
            Err(EtlError::MissingColumnError { .. })
        ));
    }

    #[test]
    fn test_render_and_chart() {
        let predictions = predictor().predict(&sample_season()).unwrap();

        let rendered = render_predictions(&predictions).unwrap();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[0].starts_with("Team"));
        assert!(lines[0].contains(NORMALIZED_PROB));
        assert!(lines[1].starts_with("Manchester City"));
        assert!(rendered.ends_with('\n'));

        let chart = prediction_chart(&predictions).unwrap();
        assert_eq!(chart.bars.len(), 8);
        assert_eq!(chart.bars[0].0, "Manchester City");
    }
}
