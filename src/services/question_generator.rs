//! 出题服务 - 业务能力层
//!
//! 一次生成：提示词 → 模型 → 解析校验 → 打乱选项
//! 带重试生成：在上面的基础上做去重，失败按次数上限重试

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::GenerationError;
use crate::models::QuestionHistory;
use crate::services::llm_service::LanguageModel;
use crate::services::prompt::build_question_prompt;
use crate::services::question_parser::{parse_question, shuffle_options, ParsedQuestion};
use crate::utils::logging::truncate_text;

/// 出题服务
pub struct QuestionGenerator<M> {
    model: M,
    topic: String,
    max_attempts: usize,
    dedup_hint_len: usize,
    min_explanation_len: usize,
    duplicate_backoff: Duration,
    failure_backoff: Duration,
}

impl<M: LanguageModel> QuestionGenerator<M> {
    /// 创建新的出题服务
    pub fn new(model: M, config: &Config) -> Self {
        Self {
            model,
            topic: config.topic.clone(),
            max_attempts: config.max_attempts.max(1),
            dedup_hint_len: config.dedup_hint_len,
            min_explanation_len: config.min_explanation_len,
            duplicate_backoff: config.duplicate_backoff,
            failure_backoff: config.failure_backoff,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// 生成一道题（单次尝试，不做去重）
    ///
    /// # 参数
    /// - `recent`: 最近出过的题目，写进提示词
    pub async fn generate(&self, recent: &[String]) -> Result<ParsedQuestion, GenerationError> {
        let prompt = build_question_prompt(&self.topic, recent);
        let raw = self.model.complete(&prompt).await?;

        debug!("模型返回: {}", truncate_text(&raw, 200));

        let mut parsed = parse_question(&raw, self.min_explanation_len)?;
        if let Some(warning) = &parsed.warning {
            warn!("⚠️ {}", warning);
        }

        shuffle_options(&mut parsed.question, &mut rand::thread_rng());
        Ok(parsed)
    }

    /// 生成一道本次会话中未出现过的题目
    ///
    /// 重复题等待 `duplicate_backoff` 后重试，失败等待 `failure_backoff` 后重试，
    /// 超过 `max_attempts` 次返回 `ExhaustedRetries`。
    pub async fn generate_unique(
        &self,
        history: &QuestionHistory,
    ) -> Result<ParsedQuestion, GenerationError> {
        let recent = history.recent(self.dedup_hint_len);
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            debug!("🧠 生成题目 (尝试 {}/{})", attempt, self.max_attempts);

            let backoff = match self.generate(&recent).await {
                Ok(parsed) if !history.contains(parsed.question.text()) => {
                    info!(
                        "✓ 生成题目成功 (尝试 {}/{}): {}",
                        attempt,
                        self.max_attempts,
                        truncate_text(parsed.question.text(), 60)
                    );
                    return Ok(parsed);
                }
                Ok(parsed) => {
                    warn!(
                        "⚠️ 题目重复 (尝试 {}/{})，稍后重试",
                        attempt, self.max_attempts
                    );
                    last_error = Some(GenerationError::DuplicateQuestion {
                        text: parsed.question.text().to_string(),
                    });
                    self.duplicate_backoff
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!("😥 生成题目失败 (尝试 {}/{}): {}", attempt, self.max_attempts, e);
                    if let Some(raw) = e.raw_response() {
                        warn!("收到的文本 (用于调试): {}", raw);
                    }
                    last_error = Some(e);
                    self.failure_backoff
                }
            };

            if attempt < self.max_attempts && !backoff.is_zero() {
                sleep(backoff).await;
            }
        }

        error!(
            "❌ 尝试 {} 次后仍无法生成唯一且有效的题目",
            self.max_attempts
        );
        Err(GenerationError::ExhaustedRetries {
            attempts: self.max_attempts,
            last: last_error.map(Box::new),
        })
    }
}
