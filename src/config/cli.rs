use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "title-odds")]
#[command(about = "Predict the league winner from season statistics")]
pub struct CliConfig {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory that data/, outputs/ and models/ are resolved against
    #[arg(long, default_value = ".")]
    pub root: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Combine the season CSVs and write the cleaned dataset
    Clean,
    /// Summary statistics and exploratory charts
    Explore,
    /// Train the random forest and save the model
    Train,
    /// Predict title odds for a future season
    Predict {
        /// Season CSV to score instead of the built-in sample
        #[arg(long, conflicts_with = "interactive")]
        input: Option<String>,
        /// Ask on stdin whether to use the sample or a CSV
        #[arg(short, long)]
        interactive: bool,
    },
    /// Serve the upload form
    Serve {
        /// Overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// clean, train, predict (sample) and explore in order
    All,
}

impl CliConfig {
    pub fn load_app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        if let Command::Serve { bind: Some(bind) } = &self.command {
            config.server.bind = bind.clone();
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
        Ok(config)
    }
}
