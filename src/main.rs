use anyhow::Result;
use set_quiz::config::{Config, API_KEY_VAR};
use set_quiz::error::ConfigError;
use set_quiz::orchestrator::App;
use set_quiz::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 缺少 API 密钥时直接退出，并给出配置说明
    if let Err(e @ ConfigError::MissingCredential { .. }) = config.require_credential() {
        eprintln!("🚨 {}", e);
        eprintln!("请在环境变量或 quiz.toml 中提供模型服务的 API 密钥，例如：");
        eprintln!();
        eprintln!("    export {}=\"你的密钥\"", API_KEY_VAR);
        eprintln!();
        eprintln!("或在 quiz.toml 中写入：");
        eprintln!();
        eprintln!("    llm_api_key = \"你的密钥\"");
        eprintln!();
        eprintln!("密钥可以在 Google AI Studio (https://aistudio.google.com/app/apikey) 获取。");
        std::process::exit(1);
    }

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
