use crate::core::stats::seasons_without_single_winner;
use crate::core::{ConfigProvider, Pipeline, Storage, Table};
use crate::domain::columns::{RANK, SEASON, TEAM, WINNER};
use crate::utils::error::{EtlError, Result};
use serde_json::Value;

/// Combines the per-season CSV files and standardizes them.
pub struct CleanPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> CleanPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CleanPipeline<S, C> {
    type Extracted = Table;
    type Transformed = Table;

    fn name(&self) -> &str {
        "clean"
    }

    async fn extract(&self) -> Result<Table> {
        let data_dir = self.config.data_dir();
        let files: Vec<String> = self
            .storage
            .list_files(data_dir)
            .await?
            .into_iter()
            .filter(|name| name.to_lowercase().ends_with(".csv"))
            .collect();

        if files.is_empty() {
            return Err(EtlError::validation(format!("no CSV files found in '{}'", data_dir)));
        }

        let mut seasons = Vec::with_capacity(files.len());
        for file in &files {
            let path = format!("{}/{}", data_dir.trim_end_matches('/'), file);
            let bytes = self.storage.read_file(&path).await?;
            let mut table = Table::from_csv(&bytes)?;

            let season = file[..file.len() - ".csv".len()].to_string();
            tracing::debug!("Loaded {} rows for season {}", table.len(), season);
            let values = vec![Value::String(season); table.len()];
            table.add_column(SEASON, values)?;
            seasons.push(table);
        }

        let combined = Table::concat(seasons);
        let (rows, cols) = combined.shape();
        tracing::info!("Combined {} season files: {} rows x {} columns", files.len(), rows, cols);
        tracing::debug!("Columns: {:?}", combined.columns);
        Ok(combined)
    }

    async fn transform(&self, mut table: Table) -> Result<Table> {
        let cleaning = self.config.cleaning();
        let before = table.shape();

        table.rename_columns(&cleaning.rename);
        table.fill_missing(Value::from(0));

        let (present, absent): (Vec<&String>, Vec<&String>) = cleaning
            .numeric_columns
            .iter()
            .partition(|c| table.has_column(c));
        if !absent.is_empty() {
            tracing::warn!("Numeric columns not found in the input: {:?}", absent);
        }
        table.coerce_numeric(&present)?;
        // text that failed to parse
        table.fill_missing(Value::from(0));

        let ranks = table.numeric_column(RANK)?;
        let winners = ranks
            .iter()
            .map(|rank| Value::from(i64::from(*rank == 1.0)))
            .collect();
        table.add_column(WINNER, winners)?;

        if table.has_column(TEAM) {
            table.trim_text(TEAM)?;
        }
        table.drop_duplicates();

        tracing::info!("Shape before cleaning: {:?}, after: {:?}", before, table.shape());
        if table.has_column(SEASON) {
            for issue in seasons_without_single_winner(&table, SEASON, WINNER)? {
                tracing::warn!("Season {} has {} winners", issue.season, issue.winners);
            }
        }
        Ok(table)
    }

    async fn load(&self, table: Table) -> Result<String> {
        let output_path = self.config.cleaned_data_path();
        let bytes = table.to_csv()?;

        tracing::debug!("Writing {} cleaned rows ({} bytes)", table.len(), bytes.len());
        self.storage.write_file(&output_path, &bytes).await?;
        Ok(output_path)
    }
}
