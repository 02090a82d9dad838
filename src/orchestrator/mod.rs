//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 持有会话状态和测验流程，把终端输入转换为操作，把视图模型输出到终端。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (终端输入输出)
//!     ↓
//! workflow::QuizFlow (一次操作 → 一次转换 → tick → 视图模型)
//!     ↓
//! services (能力层：出题 / 解析校验 / LLM)
//!     ↓
//! models (题目、已出题目记录)
//! ```

pub mod app;

pub use app::{parse_input, render_text, App, Command};
