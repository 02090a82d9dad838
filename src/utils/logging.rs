/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则默认 info（详细模式为 debug）。
/// 日志写到 stderr，不与终端上的题目混在一起。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 测验启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📚 主题: {}", config.topic);
    info!("🤖 模型: {}", config.llm_model_name);
    info!(
        "📊 题目数量: {} | 每题最多尝试: {} 次",
        config.max_questions, config.max_attempts
    );
    info!("{}", "=".repeat(60));
}

/// 记录一轮测验的最终结果
///
/// # 参数
/// - `correct`: 答对数量
/// - `total`: 题目总数
/// - `accuracy`: 已格式化的正确率
pub fn log_session_summary(correct: usize, total: usize, accuracy: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 测验完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 正确: {}/{}", correct, total);
    info!("🎯 正确率: {}", accuracy);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("集合论", 10), "集合论");
        assert_eq!(truncate_text("空集是任何集合的子集", 4), "空集是任...");
        assert_eq!(truncate_text("", 3), "");
    }

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
