//! # Set Quiz
//!
//! 一个由大模型出题的单人交互式测验程序
//!
//! ## 架构设计
//!
//! 本系统分为四层：
//!
//! ### ① 数据层（Models）
//! - `models/` - 题目、题型、难度、已出题目记录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单道题
//! - `LlmService` - 调用模型拿到文本
//! - `question_parser` - 去掉代码块、解析 JSON、校验、打乱选项
//! - `QuestionGenerator` - 单次出题，以及带去重和重试的出题
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 会话状态机和视图模型
//! - `SessionState` - 会话状态与状态转换
//! - `QuizFlow` - 一次操作 → 一次转换 → tick → 视图模型
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 终端输入输出
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ConfigError, GenerationError, SessionError};
pub use models::{Difficulty, Question, QuestionHistory, QuestionKind};
pub use orchestrator::App;
pub use services::{LanguageModel, LlmService, QuestionGenerator};
pub use workflow::{Action, QuizFlow, QuizPhase, SessionState, ViewModel};
