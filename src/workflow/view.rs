//! 视图模型
//!
//! 从会话状态到界面数据的纯投影，不修改状态。

use crate::workflow::session::{QuizPhase, SessionState};

/// 反馈界面之后的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// 下一题
    NextQuestion,
    /// 查看最终结果
    ViewResults,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionView {
    /// 题号（从 1 开始）
    pub number: usize,
    pub total: usize,
    pub prompt: String,
    pub difficulty: &'static str,
    pub options: Vec<String>,
    pub selected: Option<String>,
    /// 只有选择了答案才能提交
    pub submit_enabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackView {
    pub correct: bool,
    pub message: String,
    /// 答错时展示正确答案
    pub correct_answer: Option<String>,
    pub explanation: String,
    pub next: NextStep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryView {
    pub correct: usize,
    pub total: usize,
    pub accuracy: String,
}

/// 当前界面
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// 正在生成题目
    Loading,
    /// 等待出题（尚未开始或上一次出题失败）
    Waiting,
    Question(QuestionView),
    Feedback(FeedbackView),
    Summary(SummaryView),
}

/// 答题进度
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBoard {
    pub answered: usize,
    pub max: usize,
    pub correct: usize,
    pub accuracy: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub max_questions: usize,
    pub screen: Screen,
    /// 测验结束后不显示
    pub scoreboard: Option<ScoreBoard>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// 格式化百分比，保留一位小数
pub fn format_accuracy(value: f64) -> String {
    format!("{:.1}%", value)
}

/// 把会话状态投影为视图模型
pub fn render(state: &SessionState) -> ViewModel {
    let screen = match (state.phase(), state.current_question()) {
        (QuizPhase::Finished, _) => Screen::Summary(SummaryView {
            correct: state.correct_count(),
            total: state.max_questions(),
            accuracy: format_accuracy(state.final_accuracy()),
        }),
        (QuizPhase::ShowingQuestion, Some(q)) => Screen::Question(QuestionView {
            number: state.answered_count() + 1,
            total: state.max_questions(),
            prompt: q.text().to_string(),
            difficulty: q.difficulty().label(),
            options: q.options().to_vec(),
            selected: state.user_answer().map(str::to_string),
            submit_enabled: state.user_answer().is_some(),
        }),
        (QuizPhase::ShowingFeedback, Some(q)) => {
            let correct = state.feedback().map(|f| f.correct).unwrap_or(false);
            Screen::Feedback(FeedbackView {
                correct,
                message: state
                    .feedback()
                    .map(|f| f.message.clone())
                    .unwrap_or_default(),
                correct_answer: if correct {
                    None
                } else {
                    Some(q.answer().to_string())
                },
                explanation: q.explanation().to_string(),
                next: if state.answered_count() < state.max_questions() {
                    NextStep::NextQuestion
                } else {
                    NextStep::ViewResults
                },
            })
        }
        _ if state.question_requested() => Screen::Loading,
        _ => Screen::Waiting,
    };

    let scoreboard = if state.quiz_finished() {
        None
    } else {
        Some(ScoreBoard {
            answered: state.answered_count(),
            max: state.max_questions(),
            correct: state.correct_count(),
            accuracy: format_accuracy(state.accuracy()),
        })
    };

    ViewModel {
        max_questions: state.max_questions(),
        screen,
        scoreboard,
        error: state.last_error().map(str::to_string),
        notice: state.notice().map(str::to_string),
    }
}
