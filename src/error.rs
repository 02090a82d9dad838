use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 题目生成错误
    #[error("生成错误: {0}")]
    Generation(#[from] GenerationError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 会话状态错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 终端读写失败
    #[error("终端读写失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 题目生成错误
///
/// 除 `ExhaustedRetries` 之外都会在生成边界被捕获并触发重试。
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 模型 API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    Llm {
        model: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 模型返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回文本无法解析为 JSON
    #[error("无法解析模型返回的JSON: {source}")]
    MalformedResponse {
        raw: String,
        source: serde_json::Error,
    },
    /// JSON 结构不符合题目格式
    #[error("题目格式校验失败: {detail}")]
    SchemaViolation { detail: String, raw: String },
    /// 题目与本次会话中已出过的题目重复
    #[error("题目重复: {text}")]
    DuplicateQuestion { text: String },
    /// 达到最大尝试次数仍未得到可用的新题目
    #[error("尝试 {attempts} 次后仍无法生成唯一且有效的题目")]
    ExhaustedRetries {
        attempts: usize,
        last: Option<Box<GenerationError>>,
    },
}

impl GenerationError {
    /// 是否应在重试范围内再次尝试
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GenerationError::ExhaustedRetries { .. })
    }

    /// 便于调试的原始响应文本
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            GenerationError::MalformedResponse { raw, .. }
            | GenerationError::SchemaViolation { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub(crate) fn schema(detail: impl Into<String>, raw: &str) -> Self {
        GenerationError::SchemaViolation {
            detail: detail.into(),
            raw: raw.to_string(),
        }
    }

    /// 创建 LLM API 调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GenerationError::Llm {
            model: model.into(),
            source: Box::new(source),
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺少模型服务的 API 密钥
    #[error("缺少 API 密钥: 请设置环境变量 {var_name} 或在配置文件中填写 llm_api_key")]
    MissingCredential { var_name: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    FileParseFailed {
        path: String,
        source: toml::de::Error,
    },
}

/// 会话状态转换错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// 当前阶段不允许该操作
    #[error("当前阶段 {phase} 不允许操作 {action}")]
    InvalidAction {
        action: &'static str,
        phase: &'static str,
    },
    /// 尚未选择答案
    #[error("请先选择一个答案")]
    EmptyChoice,
    /// 选择的答案不在选项中
    #[error("选项不存在: {choice}")]
    UnknownChoice { choice: String },
    /// 过期的生成请求结果
    #[error("生成请求已失效")]
    StaleRequest,
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
