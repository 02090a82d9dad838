use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use set_quiz::config::Config;
use set_quiz::error::GenerationError;
use set_quiz::models::QuestionHistory;
use set_quiz::orchestrator::App;
use set_quiz::services::{LanguageModel, LlmService, QuestionGenerator};
use set_quiz::workflow::{Action, QuizFlow, QuizPhase, Screen, SessionState};

/// 按顺序返回预设响应的模型，用完后返回空响应错误
struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedModel {
    fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }
}

impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::EmptyResponse {
                model: "scripted".to_string(),
            })
    }
}

fn test_config(max_questions: usize) -> Config {
    Config {
        max_questions,
        duplicate_backoff: Duration::ZERO,
        failure_backoff: Duration::ZERO,
        ..Config::default()
    }
}

fn mc_json(text: &str) -> String {
    serde_json::json!({
        "question": text,
        "type": "mc",
        "options": ["{1}", "{2}", "{1, 2}", "∅", "{3}"],
        "answer": "{1, 2}",
        "difficulty": "Medium",
        "explanation": "集合 A 中的元素恰好是 1 和 2，所以用列举法写作 {1, 2}。"
    })
    .to_string()
}

fn tf_json(text: &str, answer: &str) -> String {
    serde_json::json!({
        "question": text,
        "type": "tf",
        "options": ["True", "False"],
        "answer": answer,
        "difficulty": "Easy",
        "explanation": "空集是任何集合的子集，这是子集定义的直接推论。"
    })
    .to_string()
}

fn flow_with(model: ScriptedModel, config: &Config) -> QuizFlow<ScriptedModel> {
    QuizFlow::new(QuestionGenerator::new(model, config))
}

fn correct_answer(state: &SessionState) -> String {
    state
        .current_question()
        .expect("应有当前题目")
        .answer()
        .to_string()
}

fn wrong_answer(state: &SessionState) -> String {
    let question = state.current_question().expect("应有当前题目");
    question
        .options()
        .iter()
        .find(|o| !question.is_correct(o))
        .expect("应有错误选项")
        .clone()
}

fn assert_counters(state: &SessionState) {
    assert!(state.correct_count() <= state.answered_count());
    assert!(state.answered_count() <= state.max_questions());
}

#[tokio::test]
async fn test_perfect_session() {
    let config = test_config(10);
    let model = ScriptedModel::new((0..10).map(|i| mc_json(&format!("第{}题：用列举法表示集合 A", i))));
    let flow = flow_with(model, &config);
    let mut state = SessionState::from_config(&config);

    flow.tick(&mut state).await;

    for i in 0..10 {
        assert_eq!(state.phase(), QuizPhase::ShowingQuestion);
        let answer = correct_answer(&state);
        flow.dispatch(&mut state, Action::Select(answer))
            .await
            .unwrap();
        let view = flow.dispatch(&mut state, Action::Submit).await.unwrap();
        assert_eq!(state.phase(), QuizPhase::ShowingFeedback);
        assert!(matches!(view.screen, Screen::Feedback(ref f) if f.correct));
        assert_counters(&state);

        let action = if i < 9 { Action::Next } else { Action::ViewResults };
        flow.dispatch(&mut state, action).await.unwrap();
    }

    assert_eq!(state.phase(), QuizPhase::Finished);
    assert_eq!(state.correct_count(), 10);
    assert_eq!(state.answered_count(), 10);

    let view = flow.render(&state);
    assert!(view.scoreboard.is_none());
    match view.screen {
        Screen::Summary(summary) => {
            assert_eq!(summary.correct, 10);
            assert_eq!(summary.total, 10);
            assert_eq!(summary.accuracy, "100.0%");
        }
        other => panic!("应显示结果页，实际为 {:?}", other),
    }
}

#[tokio::test]
async fn test_half_correct_session() {
    let config = test_config(2);
    let model = ScriptedModel::new([
        tf_json("空集是任何集合的子集吗？", "True"),
        tf_json("{1} ⊆ {2, 3} 成立吗？", "False"),
    ]);
    let flow = flow_with(model, &config);
    let mut state = SessionState::from_config(&config);

    flow.tick(&mut state).await;
    let answer = correct_answer(&state);
    flow.dispatch(&mut state, Action::SubmitAnswer(answer))
        .await
        .unwrap();
    assert_eq!(state.correct_count(), 1);

    flow.dispatch(&mut state, Action::Next).await.unwrap();
    assert_eq!(state.phase(), QuizPhase::ShowingQuestion);

    let wrong = wrong_answer(&state);
    let view = flow
        .dispatch(&mut state, Action::SubmitAnswer(wrong))
        .await
        .unwrap();
    match view.screen {
        Screen::Feedback(feedback) => {
            assert!(!feedback.correct);
            assert_eq!(feedback.correct_answer.as_deref(), Some("False"));
        }
        other => panic!("应显示反馈，实际为 {:?}", other),
    }

    // 已答满时不能再进入下一题
    assert!(flow.dispatch(&mut state, Action::Next).await.is_err());
    assert_eq!(state.phase(), QuizPhase::ShowingFeedback);

    flow.dispatch(&mut state, Action::ViewResults).await.unwrap();
    assert_eq!(state.phase(), QuizPhase::Finished);
    assert_eq!(state.answered_count(), 2);
    assert!((state.final_accuracy() - 50.0).abs() < f64::EPSILON);

    match flow.render(&state).screen {
        Screen::Summary(summary) => assert_eq!(summary.accuracy, "50.0%"),
        other => panic!("应显示结果页，实际为 {:?}", other),
    }
}

#[tokio::test]
async fn test_exhausted_retries_leave_session_waiting() {
    let config = test_config(10);
    let model = ScriptedModel::new(vec![
        "这不是 JSON".to_string(),
        r#"{"question": "缺少字段"}"#.to_string(),
        r#"[1, 2, 3]"#.to_string(),
        r#"{"question": "?", "type": "essay", "options": [], "answer": "", "difficulty": "Easy", "explanation": ""}"#.to_string(),
        r#"{"question": "三个选项", "type": "mc", "options": ["a", "b", "c"], "answer": "a", "difficulty": "Easy", "explanation": "只有三个选项是不够的"}"#.to_string(),
        // 前 5 次都失败，第 6 个响应留给重试
        mc_json("重试得到的题目"),
    ]);
    let flow = flow_with(model, &config);
    let mut state = SessionState::from_config(&config);

    flow.tick(&mut state).await;

    assert_eq!(state.phase(), QuizPhase::AwaitingQuestion);
    assert!(!state.question_requested());
    assert!(state.current_question().is_none());
    assert!(state.last_error().is_some());
    assert!(state.history().is_empty());

    let view = flow.render(&state);
    assert!(matches!(view.screen, Screen::Waiting));
    assert!(view.error.is_some());

    // 重试会用到剩下的那个响应
    flow.dispatch(&mut state, Action::Retry).await.unwrap();
    assert_eq!(state.phase(), QuizPhase::ShowingQuestion);
    assert!(state.last_error().is_none());
    assert_eq!(
        state.current_question().map(|q| q.text()),
        Some("重试得到的题目")
    );
}

#[tokio::test]
async fn test_generate_unique_reports_attempts() {
    let config = test_config(10);
    let model = ScriptedModel::new(["{}", "{}", "{}", "{}", "{}"]);
    let generator = QuestionGenerator::new(model, &config);

    let err = generator
        .generate_unique(&QuestionHistory::new())
        .await
        .unwrap_err();

    match err {
        GenerationError::ExhaustedRetries { attempts, last } => {
            assert_eq!(attempts, 5);
            assert!(matches!(
                last.as_deref(),
                Some(GenerationError::SchemaViolation { .. })
            ));
        }
        other => panic!("应为 ExhaustedRetries，实际为 {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicates_are_skipped() {
    let config = test_config(3);
    let model = ScriptedModel::new([
        mc_json("题目一"),
        mc_json("题目一"),
        mc_json("题目二"),
        mc_json("题目一"),
        mc_json("题目二"),
        mc_json("题目三"),
    ]);
    let flow = flow_with(model, &config);
    let mut state = SessionState::from_config(&config);

    let mut seen = Vec::new();
    flow.tick(&mut state).await;
    for i in 0..3 {
        let question = state.current_question().expect("应有当前题目");
        seen.push(question.text().to_string());
        let answer = correct_answer(&state);
        flow.dispatch(&mut state, Action::SubmitAnswer(answer))
            .await
            .unwrap();
        if i < 2 {
            flow.dispatch(&mut state, Action::Next).await.unwrap();
        }
    }

    assert_eq!(seen, ["题目一", "题目二", "题目三"]);
    assert_eq!(state.history().len(), 3);
    assert!(state.last_error().is_none());
}

#[tokio::test]
async fn test_restart_clears_history_and_counters() {
    let config = test_config(10);
    let mut responses: Vec<String> = (0..10).map(|i| mc_json(&format!("题目{}", i))).collect();
    // 重新开始后，同样的题目可以再次出现
    responses.push(mc_json("题目0"));
    let flow = flow_with(ScriptedModel::new(responses), &config);
    let mut state = SessionState::from_config(&config);

    flow.tick(&mut state).await;
    for i in 0..10 {
        let answer = if i < 7 {
            correct_answer(&state)
        } else {
            wrong_answer(&state)
        };
        flow.dispatch(&mut state, Action::SubmitAnswer(answer))
            .await
            .unwrap();
        assert_counters(&state);
        let action = if i < 9 { Action::Next } else { Action::ViewResults };
        flow.dispatch(&mut state, action).await.unwrap();
    }
    assert_eq!(state.phase(), QuizPhase::Finished);
    assert_eq!(state.correct_count(), 7);

    flow.dispatch(&mut state, Action::Restart).await.unwrap();

    assert_eq!(state.correct_count(), 0);
    assert_eq!(state.answered_count(), 0);
    assert!(!state.quiz_finished());
    assert_eq!(state.phase(), QuizPhase::ShowingQuestion);
    assert_eq!(state.current_question().map(|q| q.text()), Some("题目0"));
    assert_eq!(state.history().len(), 1);
}

#[tokio::test]
async fn test_invalid_actions_leave_state_unchanged() {
    let config = test_config(2);
    let flow = flow_with(ScriptedModel::new([mc_json("题目一")]), &config);
    let mut state = SessionState::from_config(&config);

    flow.tick(&mut state).await;
    assert_eq!(state.phase(), QuizPhase::ShowingQuestion);

    assert!(flow.dispatch(&mut state, Action::Submit).await.is_err());
    assert!(flow
        .dispatch(&mut state, Action::SubmitAnswer("   ".to_string()))
        .await
        .is_err());
    assert!(flow
        .dispatch(&mut state, Action::SubmitAnswer("{9}".to_string()))
        .await
        .is_err());
    assert!(flow.dispatch(&mut state, Action::Next).await.is_err());
    assert!(flow.dispatch(&mut state, Action::ViewResults).await.is_err());

    assert_eq!(state.phase(), QuizPhase::ShowingQuestion);
    assert_eq!(state.answered_count(), 0);
    assert!(!state.submitted());
}

#[tokio::test]
async fn test_terminal_session() {
    let config = test_config(2);
    let model = ScriptedModel::new([
        tf_json("空集是任何集合的子集吗？", "True"),
        tf_json("{1} ⊆ {2, 3} 成立吗？", "False"),
    ]);
    let mut app = App::with_model(config, model);

    // 选 1 → 提交 → 下一题 → 选 1 → 提交 → 查看结果 → 退出
    let input: &[u8] = b"1\n\n\n1\n\n\nq\n";
    let mut output = Vec::new();
    app.run_with(tokio::io::BufReader::new(input), &mut output)
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("第 1 题 / 共 2 题"));
    assert!(text.contains("第 2 题 / 共 2 题"));
    assert!(text.contains("测验结束"));
    assert_eq!(app.state().phase(), QuizPhase::Finished);
    assert_eq!(app.state().answered_count(), 2);
}

#[tokio::test]
#[ignore] // 需要真实的 API 密钥：cargo test -- --ignored
async fn test_live_question_generation() {
    let config = Config::from_env();
    config.require_credential().expect("缺少 API 密钥");

    let generator = QuestionGenerator::new(LlmService::new(&config), &config);
    let parsed = generator
        .generate_unique(&QuestionHistory::new())
        .await
        .expect("出题失败");

    let question = parsed.question;
    assert!(!question.text().is_empty());
    assert!(question.options().iter().any(|o| o == question.answer()));
}
