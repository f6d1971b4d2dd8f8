use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use title_odds::app::pipelines::prompt_input_source;
use title_odds::core::{ConfigProvider, Pipeline, Storage};
use title_odds::utils::error::ErrorSeverity;
use title_odds::utils::{logger, validation::Validate};
use title_odds::web::{self, WebState};
use title_odds::{
    AppConfig, CleanPipeline, CliConfig, Command, EtlEngine, EtlError, ExplorePipeline, InputSource, LocalStorage,
    PredictPipeline, Result, TrainPipeline, WinnerPredictor,
};

async fn run_stage<P: Pipeline>(pipeline: P, monitor: bool) -> Result<String> {
    EtlEngine::new_with_monitoring(pipeline, monitor).run().await
}

async fn serve(storage: LocalStorage, config: AppConfig) -> Result<String> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e: std::net::AddrParseError| EtlError::InvalidConfigValueError {
            field: "server.bind".to_string(),
            value: config.server.bind.clone(),
            reason: e.to_string(),
        })?;

    let model = storage.read_file(config.model_path()).await?;
    let predictor = WinnerPredictor::from_json(&model, &config.cleaning, &config.prediction)?;
    tracing::info!(
        "Loaded model with {} trees over {} features",
        predictor.artifact().forest.n_trees(),
        predictor.artifact().feature_names.len()
    );

    web::serve(Arc::new(WebState::new(predictor, storage, config)), addr).await?;
    Ok(format!("http://{}", addr))
}

async fn run(command: &Command, storage: LocalStorage, config: AppConfig) -> Result<String> {
    let monitor = config.monitoring.enabled;
    match command {
        Command::Clean => run_stage(CleanPipeline::new(storage, config), monitor).await,
        Command::Explore => run_stage(ExplorePipeline::new(storage, config), monitor).await,
        Command::Train => run_stage(TrainPipeline::new(storage, config), monitor).await,
        Command::Predict { input, interactive } => {
            let source = if *interactive {
                let stdin = std::io::stdin();
                prompt_input_source(&mut stdin.lock(), &mut std::io::stdout())?
            } else {
                match input {
                    Some(path) => InputSource::Csv(path.clone()),
                    None => InputSource::Sample,
                }
            };
            run_stage(PredictPipeline::new(storage, config, source), monitor).await
        }
        Command::Serve { .. } => serve(storage, config).await,
        Command::All => {
            run_stage(CleanPipeline::new(storage.clone(), config.clone()), monitor).await?;
            run_stage(TrainPipeline::new(storage.clone(), config.clone()), monitor).await?;
            run_stage(
                PredictPipeline::new(storage.clone(), config.clone(), InputSource::Sample),
                monitor,
            )
            .await?;
            run_stage(ExplorePipeline::new(storage, config), monitor).await
        }
    }
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if matches!(cli.command, Command::Serve { .. }) {
        logger::init_server_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting title-odds");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.load_app_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if config.monitoring.enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(cli.root.clone());
    match run(&cli.command, storage, config).await {
        Ok(output_path) => {
            tracing::info!("✅ Finished successfully");
            println!("✅ Finished successfully");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let code = exit_code(e.severity());
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
