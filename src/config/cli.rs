use crate::config::toml_config::{MonitoringConfig, TomlConfig};
use crate::domain::model::MultiIncidentPolicy;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "assessor-etl")]
#[command(about = "Extract claim data from assessor report PDFs into a CSV file")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Folder holding the PDF reports
    #[arg(long)]
    pub input_folder: Option<String>,

    /// CSV file to write
    #[arg(long)]
    pub output_path: Option<String>,

    /// Model identifier, e.g. gemini-2.5-flash
    #[arg(long)]
    pub model: Option<String>,

    /// Cloud project that hosts the model
    #[arg(long)]
    pub project: Option<String>,

    /// Deployment region of the model
    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Seconds to wait per retry; the k-th retry waits k times this
    #[arg(long)]
    pub backoff_seconds: Option<f64>,

    /// How reports with several incidents become rows
    #[arg(long, value_enum)]
    pub multi_incident: Option<MultiIncidentPolicy>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log as JSON lines instead of compact text
    #[arg(long)]
    pub log_json: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    /// List what would be processed without calling the model
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// 讀取設定檔（若有），再套用命令列覆蓋設定
    pub fn load(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(folder) = &self.input_folder {
            config.source.input_folder = Some(folder.clone());
        }
        if let Some(path) = &self.output_path {
            config.load.output_path = Some(path.clone());
        }
        if let Some(model) = &self.model {
            config.model.name = Some(model.clone());
        }
        if let Some(project) = &self.project {
            config.model.project = Some(project.clone());
        }
        if let Some(location) = &self.location {
            config.model.location = Some(location.clone());
        }
        if let Some(max_retries) = self.max_retries {
            config.retry.max_retries = Some(max_retries);
        }
        if let Some(backoff) = self.backoff_seconds {
            config.retry.backoff_seconds = Some(backoff);
        }
        if let Some(policy) = self.multi_incident {
            config.extract.multi_incident = Some(policy);
        }
        if let Some(enabled) = self.monitor {
            config.monitoring = Some(MonitoringConfig { enabled });
        }
    }
}
