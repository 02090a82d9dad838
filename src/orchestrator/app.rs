//! 终端测验 - 编排层
//!
//! ## 职责
//!
//! 代替外部界面框架：把视图模型打印到终端，读取一行输入，转换为一次操作。
//!
//! ## 输入约定
//!
//! - 题目界面：输入选项编号选择答案，回车提交
//! - 反馈界面：回车进入下一题（或查看结果）
//! - 出题失败：回车重试
//! - 任何时候：`r` 重新开始，`q` 退出

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::services::{LanguageModel, LlmService, QuestionGenerator};
use crate::utils::logging::{log_session_summary, log_startup};
use crate::workflow::{Action, NextStep, QuizFlow, Screen, SessionState, ViewModel};

/// 一行输入对应的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Action),
    Quit,
    /// 无法识别的输入，附带提示
    Invalid(String),
}

/// 应用主结构
pub struct App<M> {
    config: Config,
    flow: QuizFlow<M>,
    state: SessionState,
}

impl App<LlmService> {
    /// 初始化应用（使用真实模型）
    pub fn initialize(config: Config) -> AppResult<Self> {
        config.require_credential()?;
        log_startup(&config);
        let model = LlmService::new(&config);
        Ok(Self::with_model(config, model))
    }
}

impl<M: LanguageModel> App<M> {
    /// 使用指定模型创建应用
    pub fn with_model(config: Config, model: M) -> Self {
        let generator = QuestionGenerator::new(model, &config);
        let state = SessionState::from_config(&config);
        Self {
            config,
            flow: QuizFlow::new(generator),
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// 运行应用主逻辑（标准输入输出）
    pub async fn run(&mut self) -> AppResult<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        self.run_with(stdin, &mut stdout).await
    }

    /// 运行应用主逻辑
    ///
    /// 输入结束（EOF）或输入 `q` 时退出。
    pub async fn run_with<R, W>(&mut self, input: R, output: &mut W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        writeln!(output, "📚 练习测验: {}", self.config.topic)?;
        writeln!(
            output,
            "回答 {} 道随机题目，检验你的掌握程度。",
            self.state.max_questions()
        )?;

        self.flow.tick(&mut self.state).await;
        let mut view = self.flow.render(&self.state);

        loop {
            write!(output, "{}", render_text(&view))?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_input(&line, &view) {
                Command::Quit => break,
                Command::Invalid(hint) => {
                    writeln!(output, "⚠️ {}", hint)?;
                }
                Command::Dispatch(action) => {
                    let finishing = action == Action::ViewResults;
                    match self.flow.dispatch(&mut self.state, action).await {
                        Ok(next_view) => view = next_view,
                        Err(e) => {
                            warn!("操作被拒绝: {}", e);
                            writeln!(output, "⚠️ {}", e)?;
                        }
                    }
                    if finishing && self.state.quiz_finished() {
                        if let Screen::Summary(summary) = &view.screen {
                            log_session_summary(summary.correct, summary.total, &summary.accuracy);
                        }
                    }
                }
            }
        }

        info!("👋 退出测验 (模型: {})", self.config.llm_model_name);
        Ok(())
    }
}

/// 把一行输入解析为命令
pub fn parse_input(line: &str, view: &ViewModel) -> Command {
    let input = line.trim();

    match input.to_lowercase().as_str() {
        "q" | "quit" => return Command::Quit,
        "r" | "restart" => return Command::Dispatch(Action::Restart),
        _ => {}
    }

    match &view.screen {
        Screen::Question(q) => {
            if input.is_empty() {
                if q.submit_enabled {
                    Command::Dispatch(Action::Submit)
                } else {
                    Command::Invalid("请先输入选项编号选择答案".to_string())
                }
            } else {
                match input.parse::<usize>() {
                    Ok(n) if n >= 1 && n <= q.options.len() => {
                        Command::Dispatch(Action::Select(q.options[n - 1].clone()))
                    }
                    _ => Command::Invalid(format!("请输入 1-{} 之间的编号", q.options.len())),
                }
            }
        }
        Screen::Feedback(f) => match (input, f.next) {
            ("" | "n", NextStep::NextQuestion) => Command::Dispatch(Action::Next),
            ("" | "n", NextStep::ViewResults) => Command::Dispatch(Action::ViewResults),
            _ => Command::Invalid("回车继续".to_string()),
        },
        Screen::Summary(_) => Command::Invalid("输入 r 重新开始，q 退出".to_string()),
        Screen::Loading | Screen::Waiting => Command::Dispatch(Action::Retry),
    }
}

/// 把视图模型渲染为终端文本
pub fn render_text(view: &ViewModel) -> String {
    let mut out = String::new();
    let line = "─".repeat(60);
    out.push_str(&format!("\n{}\n", line));

    if let Some(error) = &view.error {
        out.push_str(&format!("{}\n", error));
    }

    match &view.screen {
        Screen::Loading => out.push_str("🧠 正在生成题目和解析...\n"),
        Screen::Waiting => {
            out.push_str("ℹ️ 题目尚未生成。回车重试，或输入 r 重新开始。\n");
        }
        Screen::Question(q) => {
            out.push_str(&format!("第 {} 题 / 共 {} 题\n\n", q.number, q.total));
            out.push_str(&format!("{}\n", q.prompt));
            out.push_str(&format!("难度: {}\n\n", q.difficulty));
            for (i, option) in q.options.iter().enumerate() {
                let marker = if q.selected.as_deref() == Some(option.as_str()) {
                    "●"
                } else {
                    "○"
                };
                out.push_str(&format!("  {} {}. {}\n", marker, i + 1, option));
            }
            if let Some(notice) = &view.notice {
                out.push_str(&format!("\n⚠️ {}\n", notice));
            }
            if q.submit_enabled {
                out.push_str("\n回车提交答案 ✔️\n");
            } else {
                out.push_str("\n输入选项编号选择答案\n");
            }
        }
        Screen::Feedback(f) => {
            match &f.correct_answer {
                Some(answer) => {
                    out.push_str(&format!("{} 正确答案是: {}\n", f.message, answer))
                }
                None => out.push_str(&format!("{} 🎉\n", f.message)),
            }
            out.push_str(&format!("\n解析:\n{}\n", f.explanation));
            match f.next {
                NextStep::NextQuestion => out.push_str("\n回车进入下一题 ➡️\n"),
                NextStep::ViewResults => out.push_str("\n回车查看最终结果 🏆\n"),
            }
        }
        Screen::Summary(s) => {
            out.push_str("🥳 测验结束！\n");
            out.push_str(&format!("你已完成全部 {} 道题。\n", s.total));
            out.push_str(&format!("正确: {}    正确率: {}\n", s.correct, s.accuracy));
            out.push_str("\n想再试一次吗？输入 r 重新开始，q 退出 🔁\n");
        }
    }

    if let Some(board) = &view.scoreboard {
        out.push_str(&format!(
            "\n已答: {} / {}    正确: {} ({})\n",
            board.answered, board.max, board.correct, board.accuracy
        ));
    }

    out.push_str("> ");
    out
}
