use crate::domain::ports::ConfigProvider;
use crate::ml::config::{ClassWeight, MaxFeatures, RandomForestConfig};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub cleaning: CleaningConfig,
    pub training: TrainingConfig,
    pub prediction: PredictionConfig,
    pub server: ServerConfig,
    pub monitoring: MonitoringConfig,
}

/// Locations relative to the storage root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: String,
    pub output_dir: String,
    pub plots_dir: String,
    pub model_path: String,
    pub cleaned_file: String,
    pub predictions_file: String,
    pub web_predictions_file: String,
    pub summary_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            output_dir: "outputs".to_string(),
            plots_dir: "outputs/plots".to_string(),
            model_path: "models/premier_league_winner_model.json".to_string(),
            cleaned_file: "cleaned_premier_league.csv".to_string(),
            predictions_file: "predicted_future_results.csv".to_string(),
            web_predictions_file: "predicted_future_results_streamlit.csv".to_string(),
            summary_file: "summary_statistics.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub rename: BTreeMap<String, String>,
    pub numeric_columns: Vec<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        let rename = [
            ("DIF", "Goal_Diff"),
            ("Gain", "Wins"),
            ("Null", "Draws"),
            ("defeat", "Losses"),
            ("BP", "Goals_For"),
            ("BC", "Goals_Against"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        Self {
            rename,
            numeric_columns: strings(&[
                "members",
                "foreign_players",
                "mean_age",
                "rank",
                "points",
                "Goal_Diff",
                "Wins",
                "Draws",
                "Losses",
                "Goals_For",
                "Goals_Against",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub features: Vec<String>,
    pub label: String,
    pub test_size: f64,
    pub seed: u64,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub class_weight: ClassWeight,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let forest = RandomForestConfig::default();
        Self {
            features: default_features(),
            label: "Winner".to_string(),
            test_size: 0.2,
            seed: forest.seed,
            n_estimators: forest.n_estimators,
            max_depth: forest.max_depth,
            min_samples_split: forest.min_samples_split,
            max_features: forest.max_features,
            class_weight: forest.class_weight,
        }
    }
}

impl TrainingConfig {
    pub fn forest_config(&self) -> RandomForestConfig {
        RandomForestConfig {
            n_estimators: self.n_estimators,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.max_features,
            bootstrap: true,
            class_weight: self.class_weight,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Applied on top of the cleaning renames.
    pub rename: BTreeMap<String, String>,
    /// Filled in when an input lacks them entirely.
    pub default_features: BTreeMap<String, f64>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        let rename = [
            ("GF", "Goals_For"),
            ("GA", "Goals_Against"),
            ("PassAccuracy", "Pass_Accuracy"),
            ("Possession", "possession"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let default_features = ["foreign_players", "mean_age", "MOY"]
            .into_iter()
            .map(|f| (f.to_string(), 0.0))
            .collect();

        Self {
            rename,
            default_features,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn default_features() -> Vec<String> {
    strings(&[
        "members",
        "foreign_players",
        "mean_age",
        "MOY",
        "points",
        "Goal_Diff",
        "Wins",
        "Draws",
        "Losses",
        "Goals_For",
        "Goals_Against",
    ])
}

impl AppConfig {
    /// Load a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML string; missing sections fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unknown variables stay as-is
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("paths.data_dir", &self.paths.data_dir)?;
        validation::validate_path("paths.output_dir", &self.paths.output_dir)?;
        validation::validate_path("paths.plots_dir", &self.paths.plots_dir)?;
        validation::validate_path("paths.model_path", &self.paths.model_path)?;
        validation::validate_file_extension("paths.model_path", &self.paths.model_path, &["json"])?;
        for (field, file) in [
            ("paths.cleaned_file", &self.paths.cleaned_file),
            ("paths.predictions_file", &self.paths.predictions_file),
            ("paths.web_predictions_file", &self.paths.web_predictions_file),
            ("paths.summary_file", &self.paths.summary_file),
        ] {
            validation::validate_file_extension(field, file, &["csv"])?;
        }

        validation::validate_non_empty_list("cleaning.numeric_columns", &self.cleaning.numeric_columns)?;
        validation::validate_non_empty_list("training.features", &self.training.features)?;
        validation::validate_non_empty_string("training.label", &self.training.label)?;
        validation::validate_open_range("training.test_size", self.training.test_size, 0.0, 1.0)?;
        validation::validate_positive_number("training.n_estimators", self.training.n_estimators, 1)?;
        validation::validate_positive_number("training.min_samples_split", self.training.min_samples_split, 2)?;
        if let Some(depth) = self.training.max_depth {
            validation::validate_positive_number("training.max_depth", depth, 1)?;
        }

        self.server
            .bind
            .parse::<std::net::SocketAddr>()
            .map_err(|e| EtlError::InvalidConfigValueError {
                field: "server.bind".to_string(),
                value: self.server.bind.clone(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    fn join(dir: &str, file: &str) -> String {
        format!("{}/{}", dir.trim_end_matches('/'), file)
    }
}

impl ConfigProvider for AppConfig {
    fn data_dir(&self) -> &str {
        &self.paths.data_dir
    }

    fn output_dir(&self) -> &str {
        &self.paths.output_dir
    }

    fn plots_dir(&self) -> &str {
        &self.paths.plots_dir
    }

    fn model_path(&self) -> &str {
        &self.paths.model_path
    }

    fn cleaned_data_path(&self) -> String {
        Self::join(&self.paths.output_dir, &self.paths.cleaned_file)
    }

    fn predictions_path(&self) -> String {
        Self::join(&self.paths.output_dir, &self.paths.predictions_file)
    }

    fn web_predictions_path(&self) -> String {
        Self::join(&self.paths.output_dir, &self.paths.web_predictions_file)
    }

    fn summary_path(&self) -> String {
        Self::join(&self.paths.output_dir, &self.paths.summary_file)
    }

    fn cleaning(&self) -> &CleaningConfig {
        &self.cleaning
    }

    fn training(&self) -> &TrainingConfig {
        &self.training
    }

    fn prediction(&self) -> &PredictionConfig {
        &self.prediction
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
