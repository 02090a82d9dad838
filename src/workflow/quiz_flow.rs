//! 测验流程 - 流程层
//!
//! 核心职责：每次用户操作只应用一次状态转换，然后执行一次 tick，返回新的视图模型
//!
//! tick 的顺序：
//! 1. 已答满且没有当前题目 → 结束
//! 2. 需要出题 → 带重试地生成一道新题
//! 3. 其他情况什么都不做

use tracing::{info, warn};

use crate::error::SessionError;
use crate::services::{LanguageModel, QuestionGenerator};
use crate::workflow::session::SessionState;
use crate::workflow::view::{self, ViewModel};

/// 用户操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 选择答案
    Select(String),
    /// 提交已选择的答案
    Submit,
    /// 直接提交某个答案
    SubmitAnswer(String),
    /// 下一题
    Next,
    /// 查看最终结果
    ViewResults,
    /// 重新开始
    Restart,
    /// 出题失败后再试一次
    Retry,
}

/// 测验流程
///
/// - 持有出题服务
/// - 不持有会话状态，状态由调用方传入
pub struct QuizFlow<M> {
    generator: QuestionGenerator<M>,
}

impl<M: LanguageModel> QuizFlow<M> {
    /// 创建新的测验流程
    pub fn new(generator: QuestionGenerator<M>) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &QuestionGenerator<M> {
        &self.generator
    }

    /// 根据当前状态推进一步（结束或出题）
    pub async fn tick(&self, state: &mut SessionState) {
        if state.finish_if_complete() {
            info!(
                "🏁 测验结束: {}/{} 正确",
                state.correct_count(),
                state.max_questions()
            );
            return;
        }

        let Some(ticket) = state.begin_request() else {
            return;
        };

        info!(
            "🧠 正在生成第 {}/{} 题...",
            state.answered_count() + 1,
            state.max_questions()
        );
        let result = self.generator.generate_unique(state.history()).await;

        if let Err(e) = state.complete_request(ticket, result) {
            warn!("忽略出题结果: {}", e);
        }
    }

    /// 处理一次用户操作
    ///
    /// 操作不合法时状态不变，返回错误。
    pub async fn dispatch(
        &self,
        state: &mut SessionState,
        action: Action,
    ) -> Result<ViewModel, SessionError> {
        match action {
            Action::Select(choice) => state.select(&choice)?,
            Action::Submit => {
                let correct = state.submit()?;
                log_answer(state, correct);
            }
            Action::SubmitAnswer(choice) => {
                let correct = state.submit_answer(&choice)?;
                log_answer(state, correct);
            }
            Action::Next => state.next()?,
            Action::ViewResults => state.view_results()?,
            Action::Restart => {
                info!("🔁 重新开始测验");
                state.restart();
            }
            Action::Retry => {}
        }

        self.tick(state).await;
        Ok(self.render(state))
    }

    /// 渲染当前状态
    pub fn render(&self, state: &SessionState) -> ViewModel {
        view::render(state)
    }
}

fn log_answer(state: &SessionState, correct: bool) {
    info!(
        "{} 已作答 {}/{}",
        if correct { "✅" } else { "❌" },
        state.answered_count(),
        state.max_questions()
    );
}
