use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认的测验主题
pub const DEFAULT_TOPIC: &str =
    "集合论基础（描述法表示集合、列举法表示集合、集合之间的包含关系）";

/// 存放 API 密钥的环境变量名
pub const API_KEY_VAR: &str = "LLM_API_KEY";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 采样温度，刻意设高以增加题目多样性
    pub temperature: f32,
    // --- 测验配置 ---
    /// 出题主题
    pub topic: String,
    /// 每轮测验的题目数量
    pub max_questions: usize,
    /// 每道题最多生成尝试次数
    pub max_attempts: usize,
    /// 提示词中附带的最近题目数量
    pub dedup_hint_len: usize,
    /// 解析长度的建议下限（仅警告）
    pub min_explanation_len: usize,
    /// 题目重复后的等待时间
    pub duplicate_backoff: Duration,
    /// 生成失败后的等待时间
    pub failure_backoff: Duration,
    /// 已出题目记录的容量，None 表示不限
    pub history_capacity: Option<usize>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai"
                .to_string(),
            llm_model_name: "gemini-2.0-flash-lite-001".to_string(),
            temperature: 1.0,
            topic: DEFAULT_TOPIC.to_string(),
            max_questions: 10,
            max_attempts: 5,
            dedup_hint_len: 10,
            min_explanation_len: 20,
            duplicate_backoff: Duration::from_millis(500),
            failure_backoff: Duration::from_secs(1),
            history_capacity: None,
            verbose_logging: false,
        }
    }
}

/// 配置文件中的可选字段
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    llm_api_key: Option<String>,
    llm_api_base_url: Option<String>,
    llm_model_name: Option<String>,
    temperature: Option<f32>,
    topic: Option<String>,
    max_questions: Option<usize>,
    max_attempts: Option<usize>,
    duplicate_backoff_ms: Option<u64>,
    failure_backoff_ms: Option<u64>,
    history_capacity: Option<usize>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// 默认值 + 环境变量
    pub fn from_env() -> Self {
        Self::default().with_env(|name| std::env::var(name).ok())
    }

    /// 默认值 + 配置文件（`QUIZ_CONFIG_FILE`，默认 `quiz.toml`，不存在时跳过）+ 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("QUIZ_CONFIG_FILE").unwrap_or_else(|_| "quiz.toml".to_string());
        let mut config = Self::default();
        if Path::new(&path).exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|source| ConfigError::FileReadFailed {
                    path: path.clone(),
                    source,
                })?;
            config = config.with_toml(&path, &content)?;
        }
        Ok(config.with_env(|name| std::env::var(name).ok()))
    }

    /// 启动前检查 API 密钥
    pub fn require_credential(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential {
                var_name: API_KEY_VAR.to_string(),
            });
        }
        Ok(())
    }

    fn with_toml(mut self, path: &str, content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|source| ConfigError::FileParseFailed {
                path: path.to_string(),
                source,
            })?;

        if let Some(v) = file.llm_api_key {
            self.llm_api_key = v;
        }
        if let Some(v) = file.llm_api_base_url {
            self.llm_api_base_url = v;
        }
        if let Some(v) = file.llm_model_name {
            self.llm_model_name = v;
        }
        if let Some(v) = file.temperature {
            self.temperature = v;
        }
        if let Some(v) = file.topic {
            self.topic = v;
        }
        if let Some(v) = file.max_questions {
            self.max_questions = v;
        }
        if let Some(v) = file.max_attempts {
            self.max_attempts = v;
        }
        if let Some(v) = file.duplicate_backoff_ms {
            self.duplicate_backoff = Duration::from_millis(v);
        }
        if let Some(v) = file.failure_backoff_ms {
            self.failure_backoff = Duration::from_millis(v);
        }
        if file.history_capacity.is_some() {
            self.history_capacity = file.history_capacity;
        }
        if let Some(v) = file.verbose_logging {
            self.verbose_logging = v;
        }
        Ok(self)
    }

    fn with_env(self, var: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |name: &str| var(name).and_then(|v| v.trim().parse::<u64>().ok());
        Self {
            llm_api_key: var(API_KEY_VAR).unwrap_or(self.llm_api_key),
            llm_api_base_url: var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            temperature: var("LLM_TEMPERATURE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(self.temperature),
            topic: var("QUIZ_TOPIC").unwrap_or(self.topic),
            max_questions: parsed("QUIZ_MAX_QUESTIONS")
                .map(|v| v as usize)
                .unwrap_or(self.max_questions),
            max_attempts: parsed("QUIZ_MAX_ATTEMPTS")
                .map(|v| v as usize)
                .unwrap_or(self.max_attempts),
            dedup_hint_len: self.dedup_hint_len,
            min_explanation_len: self.min_explanation_len,
            duplicate_backoff: parsed("QUIZ_DUPLICATE_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(self.duplicate_backoff),
            failure_backoff: parsed("QUIZ_FAILURE_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(self.failure_backoff),
            history_capacity: parsed("QUIZ_HISTORY_CAPACITY")
                .map(|v| Some(v as usize))
                .unwrap_or(self.history_capacity),
            verbose_logging: var("VERBOSE_LOGGING")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(self.verbose_logging),
        }
    }
}
