use std::path::Path;
use tempfile::TempDir;
use title_odds::domain::columns::{NORMALIZED_PROB, TEAM, WINNER};
use title_odds::domain::model::Table;
use title_odds::ml::ModelArtifact;
use title_odds::{
    AppConfig, CleanPipeline, EtlEngine, EtlError, ExplorePipeline, InputSource, LocalStorage, PredictPipeline,
    TrainPipeline,
};

const HEADER: &str = "Team,members,foreign_players,mean_age,MOY,rank,points,DIF,Gain,Null,defeat,BP,BC";

/// Raw season files the way the league site exports them: six clubs per
/// season, the champion ranked first.
fn write_seasons(root: &Path, seasons: usize) {
    let data_dir = root.join("data");
    std::fs::create_dir_all(&data_dir).unwrap();

    for season in 0..seasons {
        let mut lines = vec![HEADER.to_string()];
        for rank in 1..=6usize {
            let wins = 30 - rank * 3 + season % 2;
            let draws = 4 + rank % 3;
            let losses = 38 - wins - draws;
            let goals_for = 40 + wins * 2;
            let goals_against = 20 + losses * 2;
            lines.push(format!(
                " Club {} ,{},{},{:.1},{:.2},{},{},{},{},{},{},{},{}",
                rank,
                30 + rank,
                10 + (rank * 7 + season) % 15,
                25.0 + (rank + season) as f64 * 0.2,
                0.3 + (6 - rank) as f64 * 0.05,
                rank,
                wins * 3 + draws,
                goals_for as i64 - goals_against as i64,
                wins,
                draws,
                losses,
                goals_for,
                goals_against
            ));
        }
        std::fs::write(data_dir.join(format!("{}.csv", 2010 + season)), lines.join("\n")).unwrap();
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.training.n_estimators = 40;
    config
}

fn storage(temp_dir: &TempDir) -> LocalStorage {
    LocalStorage::new(temp_dir.path().to_str().unwrap().to_string())
}

fn read_table(path: &Path) -> Table {
    Table::from_csv(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_end_to_end_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_seasons(root, 10);

    let cleaned_path = EtlEngine::new(CleanPipeline::new(storage(&temp_dir), config()))
        .run()
        .await
        .unwrap();
    let cleaned = read_table(&root.join(&cleaned_path));
    assert_eq!(cleaned.len(), 60);
    assert_eq!(cleaned.records[0].text(TEAM), Some("Club 1"));
    assert_eq!(
        cleaned.numeric_column(WINNER).unwrap().iter().sum::<f64>(),
        10.0
    );

    let model_path = EtlEngine::new(TrainPipeline::new(storage(&temp_dir), config()))
        .run()
        .await
        .unwrap();
    let artifact = ModelArtifact::from_json(&std::fs::read(root.join(&model_path)).unwrap()).unwrap();
    assert_eq!(artifact.forest.n_trees(), 40);
    assert!(artifact.evaluation.is_some());
    assert!(root.join("outputs/plots/feature_importance.svg").exists());

    let predictions_path = EtlEngine::new(PredictPipeline::new(
        storage(&temp_dir),
        config(),
        InputSource::Sample,
    ))
    .run()
    .await
    .unwrap();
    let predictions = read_table(&root.join(&predictions_path));
    assert_eq!(predictions.len(), 8);
    let total: f64 = predictions.numeric_column(NORMALIZED_PROB).unwrap().iter().sum();
    assert!((total - 1.0).abs() < 1e-9);

    let plots_dir = EtlEngine::new(ExplorePipeline::new(storage(&temp_dir), config()))
        .run()
        .await
        .unwrap();
    let plots: Vec<String> = std::fs::read_dir(root.join(&plots_dir))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(plots.len(), 7, "unexpected plots {:?}", plots);
    assert!(root.join("outputs/summary_statistics.csv").exists());
}

#[tokio::test]
async fn test_predict_uploaded_season_by_absolute_path() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_seasons(root, 6);

    EtlEngine::new(CleanPipeline::new(storage(&temp_dir), config()))
        .run()
        .await
        .unwrap();
    EtlEngine::new(TrainPipeline::new(storage(&temp_dir), config()))
        .run()
        .await
        .unwrap();

    let upcoming = TempDir::new().unwrap();
    let upcoming_path = upcoming.path().join("2026.csv");
    std::fs::write(
        &upcoming_path,
        "Team,points,GF,GA,Gain,Null,defeat\nUnderdogs,45,35,60,11,12,15\nFavourites,90,95,30,28,6,4\n",
    )
    .unwrap();

    let pipeline = PredictPipeline::new(
        storage(&temp_dir),
        config(),
        InputSource::Csv(upcoming_path.to_str().unwrap().to_string()),
    );
    let output = EtlEngine::new(pipeline).run().await.unwrap();

    let predictions = read_table(&root.join(output));
    assert_eq!(predictions.records[0].text(TEAM), Some("Favourites"));
    assert_eq!(predictions.records[0].number("Goal_Diff"), Some(65.0));
}

#[tokio::test]
async fn test_stages_fail_cleanly_without_inputs() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("data")).unwrap();

    let clean = EtlEngine::new(CleanPipeline::new(storage(&temp_dir), config())).run().await;
    assert!(matches!(clean, Err(EtlError::ValidationError { .. })));

    let train = EtlEngine::new(TrainPipeline::new(storage(&temp_dir), config())).run().await;
    assert!(matches!(train, Err(EtlError::IoError(_))));

    let predict = EtlEngine::new(PredictPipeline::new(
        storage(&temp_dir),
        config(),
        InputSource::Sample,
    ))
    .run()
    .await;
    assert!(matches!(predict, Err(EtlError::ModelError { .. })));
}
