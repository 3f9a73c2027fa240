use crate::core::ConfigProvider;
use crate::domain::model::{GenerationParams, MultiIncidentPolicy};
use crate::domain::schema::{DEFAULT_INSTRUCTION, NULL_PLACEHOLDER};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_required_field,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_LOCATION: &str = "us-central1";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_SECONDS: f64 = 1.0;
/// 重試次數與等待秒數的上限（含）
pub const MAX_RETRIES_LIMIT: u32 = 20;
pub const MAX_BACKOFF_SECONDS: f64 = 600.0;
const DEFAULT_MERGE_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: Option<String>,
    pub project: Option<String>,
    pub location: Option<String>,
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub temperature: Option<f32>,
    pub json_response: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    pub input_folder: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub instruction_file: Option<String>,
    pub multi_incident: Option<MultiIncidentPolicy>,
    pub merge_separator: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub backoff_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: Option<String>,
    pub error_marker: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl ModelConfig {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    /// 未設定時依區域組出預設端點
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location()),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(0.0)
    }

    pub fn json_response(&self) -> bool {
        self.json_response.unwrap_or(true)
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VERTEX_ACCESS_TOKEN})，找不到的保留原文
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn pipeline_name(&self) -> &str {
        self.pipeline.name.as_deref().unwrap_or("assessor-etl")
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().is_some_and(|m| m.enabled)
    }

    /// Instruction text sent with every document.
    pub fn load_instruction(&self) -> Result<String> {
        match &self.extract.instruction_file {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                validate_non_empty_string("extract.instruction_file", &text)?;
                Ok(text)
            }
            None => Ok(DEFAULT_INSTRUCTION.to_string()),
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn input_folder(&self) -> &str {
        self.source.input_folder.as_deref().unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        self.load.output_path.as_deref().unwrap_or_default()
    }

    fn max_retries(&self) -> u32 {
        self.retry.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    fn backoff_seconds(&self) -> f64 {
        self.retry.backoff_seconds.unwrap_or(DEFAULT_BACKOFF_SECONDS)
    }

    fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.model.temperature(),
            json_response: self.model.json_response(),
        }
    }

    fn multi_incident(&self) -> MultiIncidentPolicy {
        self.extract.multi_incident.unwrap_or_default()
    }

    fn merge_separator(&self) -> &str {
        self.extract
            .merge_separator
            .as_deref()
            .unwrap_or(DEFAULT_MERGE_SEPARATOR)
    }

    fn error_marker(&self) -> &str {
        self.load.error_marker.as_deref().unwrap_or(NULL_PLACEHOLDER)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        let project = validate_required_field("model.project", &self.model.project)?;
        validate_non_empty_string("model.project", project)?;
        validate_non_empty_string("model.name", self.model.name())?;
        validate_non_empty_string("model.location", self.model.location())?;
        if let Some(endpoint) = &self.model.endpoint {
            validate_url("model.endpoint", endpoint)?;
        }
        validate_range("model.temperature", self.model.temperature(), 0.0, 2.0)?;

        let input_folder = validate_required_field("source.input_folder", &self.source.input_folder)?;
        validate_path("source.input_folder", input_folder)?;

        let output_path = validate_required_field("load.output_path", &self.load.output_path)?;
        validate_path("load.output_path", output_path)?;

        validate_range("retry.max_retries", self.max_retries(), 0, MAX_RETRIES_LIMIT)?;
        validate_range(
            "retry.backoff_seconds",
            self.backoff_seconds(),
            0.0,
            MAX_BACKOFF_SECONDS,
        )?;

        Ok(())
    }
}
