//! 测验会话状态 - 流程层
//!
//! 会话状态只通过这里的转换方法修改，转换本身不涉及模型调用和界面。
//!
//! ```text
//! AwaitingQuestion ──出题成功──▶ ShowingQuestion ──提交──▶ ShowingFeedback
//!        ▲                                                   │
//!        └────────────── Next (未答满) ◀─────────────────────┤
//!                                                            ▼
//!  Restart ◀────────────── Finished ◀──── ViewResults (已答满)
//! ```

use crate::config::Config;
use crate::error::{GenerationError, SessionError};
use crate::models::{Question, QuestionHistory};
use crate::services::ParsedQuestion;

/// 会话所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    /// 等待出题
    AwaitingQuestion,
    /// 显示题目，等待作答
    ShowingQuestion,
    /// 显示对错和解析
    ShowingFeedback,
    /// 测验结束
    Finished,
}

impl QuizPhase {
    pub fn name(self) -> &'static str {
        match self {
            QuizPhase::AwaitingQuestion => "AwaitingQuestion",
            QuizPhase::ShowingQuestion => "ShowingQuestion",
            QuizPhase::ShowingFeedback => "ShowingFeedback",
            QuizPhase::Finished => "Finished",
        }
    }
}

impl std::fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 正在进行中的出题请求
///
/// 同一时刻最多一个；结果必须带着对应的票据回来，过期票据会被拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// 作答反馈
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub message: String,
}

/// 测验会话状态
#[derive(Debug, Clone)]
pub struct SessionState {
    current_question: Option<Question>,
    in_flight: Option<RequestTicket>,
    next_ticket: u64,
    user_answer: Option<String>,
    submitted: bool,
    feedback: Option<Feedback>,
    correct_count: usize,
    answered_count: usize,
    max_questions: usize,
    quiz_finished: bool,
    history: QuestionHistory,
    last_error: Option<String>,
    notice: Option<String>,
}

impl SessionState {
    /// 创建新会话，所有字段为初始值
    pub fn new(max_questions: usize) -> Self {
        Self::with_history(max_questions, QuestionHistory::new())
    }

    /// 按配置创建新会话
    pub fn from_config(config: &Config) -> Self {
        let history = match config.history_capacity {
            Some(capacity) => QuestionHistory::with_capacity(capacity, config.dedup_hint_len),
            None => QuestionHistory::new(),
        };
        Self::with_history(config.max_questions, history)
    }

    fn with_history(max_questions: usize, history: QuestionHistory) -> Self {
        Self {
            current_question: None,
            in_flight: None,
            next_ticket: 0,
            user_answer: None,
            submitted: false,
            feedback: None,
            correct_count: 0,
            answered_count: 0,
            max_questions,
            quiz_finished: false,
            history,
            last_error: None,
            notice: None,
        }
    }

    // ========== 只读访问 ==========

    pub fn phase(&self) -> QuizPhase {
        if self.quiz_finished {
            QuizPhase::Finished
        } else {
            match &self.current_question {
                None => QuizPhase::AwaitingQuestion,
                Some(_) if self.submitted => QuizPhase::ShowingFeedback,
                Some(_) => QuizPhase::ShowingQuestion,
            }
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    /// 是否有出题请求正在进行
    pub fn question_requested(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn user_answer(&self) -> Option<&str> {
        self.user_answer.as_deref()
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn answered_count(&self) -> usize {
        self.answered_count
    }

    pub fn max_questions(&self) -> usize {
        self.max_questions
    }

    pub fn quiz_finished(&self) -> bool {
        self.quiz_finished
    }

    pub fn history(&self) -> &QuestionHistory {
        &self.history
    }

    /// 出题失败后展示给用户的错误
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 不影响作答的提示（例如解析过短）
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// 是否需要出下一道题
    pub fn needs_question(&self) -> bool {
        !self.quiz_finished
            && self.current_question.is_none()
            && self.in_flight.is_none()
            && self.answered_count < self.max_questions
    }

    // ========== 状态转换 ==========

    /// 开始出题，已有请求在进行或不需要出题时返回 None
    pub fn begin_request(&mut self) -> Option<RequestTicket> {
        if !self.needs_question() {
            return None;
        }
        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// 出题请求结束
    ///
    /// 成功时记录题目并进入 ShowingQuestion；失败时留在 AwaitingQuestion 并记录错误，
    /// 下一次 tick 会重新尝试。
    pub fn complete_request(
        &mut self,
        ticket: RequestTicket,
        result: Result<ParsedQuestion, GenerationError>,
    ) -> Result<(), SessionError> {
        if self.in_flight != Some(ticket) {
            return Err(SessionError::StaleRequest);
        }
        self.in_flight = None;

        match result {
            Ok(parsed) => {
                self.history.insert(parsed.question.text());
                self.current_question = Some(parsed.question);
                self.user_answer = None;
                self.submitted = false;
                self.feedback = None;
                self.last_error = None;
                self.notice = parsed.warning;
            }
            Err(e) => {
                self.last_error = Some(format!("❌ {}", e));
            }
        }
        Ok(())
    }

    /// 答满后进入结束状态，返回是否发生了转换
    pub fn finish_if_complete(&mut self) -> bool {
        if self.current_question.is_none()
            && !self.quiz_finished
            && self.answered_count >= self.max_questions
        {
            self.quiz_finished = true;
            self.clear_turn();
            return true;
        }
        false
    }

    /// 选择答案（尚未提交）
    pub fn select(&mut self, choice: &str) -> Result<(), SessionError> {
        self.expect_phase(QuizPhase::ShowingQuestion, "Select")?;
        let choice = self.checked_choice(choice)?;
        self.user_answer = Some(choice);
        Ok(())
    }

    /// 提交已选择的答案，返回是否答对
    pub fn submit(&mut self) -> Result<bool, SessionError> {
        self.expect_phase(QuizPhase::ShowingQuestion, "Submit")?;
        let choice = self.user_answer.clone().ok_or(SessionError::EmptyChoice)?;
        self.submit_answer(&choice)
    }

    /// 提交答案，返回是否答对
    pub fn submit_answer(&mut self, choice: &str) -> Result<bool, SessionError> {
        self.expect_phase(QuizPhase::ShowingQuestion, "Submit")?;
        let choice = self.checked_choice(choice)?;

        let correct = self
            .current_question
            .as_ref()
            .map(|q| q.is_correct(&choice))
            .unwrap_or(false);

        if correct {
            self.correct_count += 1;
        }
        self.feedback = Some(Feedback {
            correct,
            message: if correct {
                "✅ 回答正确！".to_string()
            } else {
                "❌ 回答错误。".to_string()
            },
        });
        self.answered_count += 1;
        self.user_answer = Some(choice);
        self.submitted = true;
        Ok(correct)
    }

    /// 下一题
    pub fn next(&mut self) -> Result<(), SessionError> {
        self.expect_phase(QuizPhase::ShowingFeedback, "Next")?;
        if self.answered_count >= self.max_questions {
            return Err(SessionError::InvalidAction {
                action: "Next",
                phase: QuizPhase::ShowingFeedback.name(),
            });
        }
        self.clear_turn();
        Ok(())
    }

    /// 查看最终结果
    pub fn view_results(&mut self) -> Result<(), SessionError> {
        self.expect_phase(QuizPhase::ShowingFeedback, "ViewResults")?;
        if self.answered_count < self.max_questions {
            return Err(SessionError::InvalidAction {
                action: "ViewResults",
                phase: QuizPhase::ShowingFeedback.name(),
            });
        }
        self.quiz_finished = true;
        self.clear_turn();
        Ok(())
    }

    /// 重新开始：计数、标记和已出题目全部清空
    pub fn restart(&mut self) {
        self.clear_turn();
        self.correct_count = 0;
        self.answered_count = 0;
        self.quiz_finished = false;
        self.history.clear();
        self.last_error = None;
    }

    // ========== 统计 ==========

    /// 当前正确率（已答题目为分母）
    pub fn accuracy(&self) -> f64 {
        percentage(self.correct_count, self.answered_count)
    }

    /// 最终正确率（总题数为分母）
    pub fn final_accuracy(&self) -> f64 {
        percentage(self.correct_count, self.max_questions)
    }

    fn clear_turn(&mut self) {
        self.current_question = None;
        self.in_flight = None;
        self.user_answer = None;
        self.submitted = false;
        self.feedback = None;
        self.notice = None;
    }

    fn expect_phase(&self, expected: QuizPhase, action: &'static str) -> Result<(), SessionError> {
        let phase = self.phase();
        if phase != expected {
            return Err(SessionError::InvalidAction {
                action,
                phase: phase.name(),
            });
        }
        Ok(())
    }

    fn checked_choice(&self, choice: &str) -> Result<String, SessionError> {
        let choice = choice.trim();
        if choice.is_empty() {
            return Err(SessionError::EmptyChoice);
        }
        let known = self
            .current_question
            .as_ref()
            .map(|q| q.options().iter().any(|o| o == choice))
            .unwrap_or(false);
        if !known {
            return Err(SessionError::UnknownChoice {
                choice: choice.to_string(),
            });
        }
        Ok(choice.to_string())
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
