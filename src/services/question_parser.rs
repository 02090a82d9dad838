//! 题目解析与校验
//!
//! 模型返回的文本 → 去掉代码块标记 → JSON → 字段校验 → `Question`

use std::collections::HashSet;
use std::sync::LazyLock;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde_json::Value as JsonValue;

use crate::error::GenerationError;
use crate::models::question::{MC_OPTION_COUNT, TRUE_FALSE_OPTIONS};
use crate::models::{Difficulty, Question, QuestionKind, RawQuestion};

/// 解析结果
#[derive(Debug, Clone)]
pub struct ParsedQuestion {
    pub question: Question,
    /// 不影响使用的提示（例如解析过短）
    pub warning: Option<String>,
}

static LEADING_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z]*").ok());
static TRAILING_FENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"```$").ok());

/// 去掉模型可能包裹在 JSON 外面的 ``` 代码块标记
///
/// 开头和结尾的标记分别处理，只有其中一个时也能去掉。
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(m) = LEADING_FENCE.as_ref().and_then(|re| re.find(text)) {
        text = text[m.end()..].trim_start();
    }
    if let Some(m) = TRAILING_FENCE.as_ref().and_then(|re| re.find(text)) {
        text = text[..m.start()].trim_end();
    }
    text
}

/// 解析并校验模型返回的题目
///
/// # 参数
/// - `raw`: 模型返回的原始文本
/// - `min_explanation_len`: 解析长度的建议下限，低于下限只产生警告
pub fn parse_question(raw: &str, min_explanation_len: usize) -> Result<ParsedQuestion, GenerationError> {
    let cleaned = strip_code_fence(raw);

    let value: JsonValue =
        serde_json::from_str(cleaned).map_err(|source| GenerationError::MalformedResponse {
            raw: raw.to_string(),
            source,
        })?;

    let object = value
        .as_object()
        .ok_or_else(|| GenerationError::schema("顶层不是 JSON 对象", raw))?;

    let missing: Vec<&str> = RawQuestion::REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(GenerationError::schema(
            format!("JSON 缺少必需字段: {:?}", missing),
            raw,
        ));
    }

    if !object.get("options").map(JsonValue::is_array).unwrap_or(false) {
        return Err(GenerationError::schema("字段 'options' 必须是数组", raw));
    }

    let raw_question: RawQuestion = serde_json::from_value(value.clone())
        .map_err(|e| GenerationError::schema(format!("字段类型错误: {}", e), raw))?;

    let question = validate(raw_question, raw)?;

    let explanation_len = question.explanation().chars().count();
    let warning = if explanation_len < min_explanation_len {
        Some(format!(
            "生成的解析似乎过短 ({} 个字符)",
            explanation_len
        ))
    } else {
        None
    };

    Ok(ParsedQuestion { question, warning })
}

fn validate(raw_question: RawQuestion, raw: &str) -> Result<Question, GenerationError> {
    let kind = QuestionKind::from_wire(&raw_question.kind).ok_or_else(|| {
        GenerationError::schema(format!("未知题型: '{}'", raw_question.kind), raw)
    })?;

    let difficulty = Difficulty::from_label(&raw_question.difficulty).ok_or_else(|| {
        GenerationError::schema(format!("未知难度: '{}'", raw_question.difficulty), raw)
    })?;

    let text = raw_question.question.trim().to_string();
    if text.is_empty() {
        return Err(GenerationError::schema("题目文本为空", raw));
    }

    let options: Vec<String> = raw_question
        .options
        .iter()
        .map(|o| o.trim().to_string())
        .collect();
    let answer = raw_question.answer.trim().to_string();

    if options.iter().any(String::is_empty) {
        return Err(GenerationError::schema("选项中存在空白项", raw));
    }

    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if distinct.len() != options.len() {
        return Err(GenerationError::schema("选项中存在重复项", raw));
    }

    match kind {
        QuestionKind::MultipleChoice => {
            if options.len() != MC_OPTION_COUNT {
                return Err(GenerationError::schema(
                    format!(
                        "单选题需要 {} 个选项，实际为 {} 个",
                        MC_OPTION_COUNT,
                        options.len()
                    ),
                    raw,
                ));
            }
            if !options.contains(&answer) {
                return Err(GenerationError::schema(
                    "答案 ('answer') 不在选项 ('options') 中",
                    raw,
                ));
            }
        }
        QuestionKind::TrueFalse => {
            if !TRUE_FALSE_OPTIONS.contains(&answer.as_str()) {
                return Err(GenerationError::schema(
                    "判断题的答案 ('answer') 必须是 'True' 或 'False'",
                    raw,
                ));
            }
            let expected: HashSet<&str> = TRUE_FALSE_OPTIONS.into_iter().collect();
            if distinct != expected {
                return Err(GenerationError::schema(
                    "判断题的选项必须是 ['True', 'False']",
                    raw,
                ));
            }
        }
    }

    Ok(Question::new_unchecked(
        text,
        kind,
        options,
        answer,
        difficulty,
        raw_question.explanation.trim().to_string(),
    ))
}

/// 打乱单选题的选项顺序，避免正确答案总在固定位置
pub fn shuffle_options<R: Rng + ?Sized>(question: &mut Question, rng: &mut R) {
    if question.kind() == QuestionKind::MultipleChoice {
        question.options_mut().shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MC_JSON: &str = r#"{
        "question": "设 A = {x | x 是小于 4 的正整数}。\n**A 用列举法如何表示？**",
        "type": "mc",
        "options": ["{1, 2, 3}", "{0, 1, 2, 3}", "{1, 2, 3, 4}", "{2, 3}", "∅"],
        "answer": "{1, 2, 3}",
        "difficulty": "Easy",
        "explanation": "小于 4 的正整数只有 1、2、3，因此 A = {1, 2, 3}。0 不是正整数，4 不小于 4。"
    }"#;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json {\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```"), "");
    }

    #[test]
    fn test_trailing_fence_only_parses() {
        let fenced = format!("{}\n```", MC_JSON);
        assert!(parse_question(&fenced, 20).is_ok());
    }

    #[test]
    fn test_blank_option_rejected() {
        let raw = r#"{
            "question": "下列哪个集合是空集？",
            "type": "mc",
            "options": ["A", "B", "C", "D", " "],
            "answer": " ",
            "difficulty": "Easy",
            "explanation": "空白选项无法被选择，因此这道题不能使用。"
        }"#;
        let err = parse_question(raw, 20).unwrap_err();
        assert!(matches!(err, GenerationError::SchemaViolation { .. }));
    }

    #[test]
    fn test_parse_valid_mc() {
        let parsed = parse_question(MC_JSON, 20).unwrap();
        let q = parsed.question;
        assert_eq!(q.kind(), QuestionKind::MultipleChoice);
        assert_eq!(q.options().len(), 5);
        assert!(q.options().iter().any(|o| o == q.answer()));
        assert_eq!(q.difficulty(), Difficulty::Easy);
        assert!(parsed.warning.is_none());
    }

    #[test]
    fn test_parse_fenced_response() {
        let fenced = format!("```json\n{}\n```", MC_JSON);
        assert!(parse_question(&fenced, 20).is_ok());
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_question("这不是 JSON", 20).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse { .. }));
        assert_eq!(err.raw_response(), Some("这不是 JSON"));
    }

    #[test]
    fn test_missing_keys_listed() {
        let err = parse_question(r#"{"question": "q", "type": "mc"}"#, 20).unwrap_err();
        match err {
            GenerationError::SchemaViolation { detail, .. } => {
                assert!(detail.contains("answer"));
                assert!(detail.contains("explanation"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_options_must_be_array() {
        let json = MC_JSON.replace(
            r#"["{1, 2, 3}", "{0, 1, 2, 3}", "{1, 2, 3, 4}", "{2, 3}", "∅"]"#,
            r#""{1, 2, 3}""#,
        );
        let err = parse_question(&json, 20).unwrap_err();
        assert!(matches!(err, GenerationError::SchemaViolation { .. }));
    }

    #[test]
    fn test_answer_must_be_an_option() {
        let json = MC_JSON.replace(r#""answer": "{1, 2, 3}""#, r#""answer": "{3}""#);
        let err = parse_question(&json, 20).unwrap_err();
        assert!(matches!(err, GenerationError::SchemaViolation { .. }));
    }

    #[test]
    fn test_mc_requires_five_distinct_options() {
        let four = MC_JSON.replace(r#", "∅"]"#, "]");
        assert!(parse_question(&four, 20).is_err());

        let dup = MC_JSON.replace(r#""∅""#, r#""{2, 3}""#);
        assert!(parse_question(&dup, 20).is_err());
    }

    #[test]
    fn test_true_false() {
        let json = r#"{
            "question": "空集是任何集合的子集。",
            "type": "tf",
            "options": ["True", "False"],
            "answer": "True",
            "difficulty": "Medium",
            "explanation": "对任意集合 A，空集中没有不属于 A 的元素，所以 ∅ ⊆ A。"
        }"#;
        let parsed = parse_question(json, 20).unwrap();
        assert_eq!(parsed.question.kind(), QuestionKind::TrueFalse);

        let bad_answer = json.replace(r#""answer": "True""#, r#""answer": "Verdadero""#);
        assert!(parse_question(&bad_answer, 20).is_err());

        let bad_options = json.replace(r#"["True", "False"]"#, r#"["Yes", "No"]"#);
        assert!(parse_question(&bad_options, 20).is_err());
    }

    #[test]
    fn test_unknown_kind_and_difficulty() {
        let json = MC_JSON.replace(r#""type": "mc""#, r#""type": "essay""#);
        assert!(parse_question(&json, 20).is_err());

        let json = MC_JSON.replace(r#""difficulty": "Easy""#, r#""difficulty": "extreme""#);
        assert!(parse_question(&json, 20).is_err());
    }

    #[test]
    fn test_short_explanation_only_warns() {
        let json = MC_JSON.replace(
            "小于 4 的正整数只有 1、2、3，因此 A = {1, 2, 3}。0 不是正整数，4 不小于 4。",
            "见定义。",
        );
        let parsed = parse_question(&json, 20).unwrap();
        assert!(parsed.warning.is_some());
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut q = parse_question(MC_JSON, 20).unwrap().question;
        let mut before: Vec<String> = q.options().to_vec();
        let mut rng = StdRng::seed_from_u64(7);
        shuffle_options(&mut q, &mut rng);
        let mut after: Vec<String> = q.options().to_vec();
        before.sort();
        after.sort();
        assert_eq!(before, after);
        assert!(q.options().iter().any(|o| o == q.answer()));
    }

    #[test]
    fn test_shuffle_moves_answer_around() {
        let original = parse_question(MC_JSON, 20).unwrap().question;
        let mut rng = StdRng::seed_from_u64(42);
        let mut positions = [0usize; MC_OPTION_COUNT];
        for _ in 0..500 {
            let mut q = original.clone();
            shuffle_options(&mut q, &mut rng);
            let pos = q.options().iter().position(|o| o == q.answer()).unwrap();
            positions[pos] += 1;
        }
        // 500 次均匀打乱，每个位置都应出现相当多次
        assert!(positions.iter().all(|&count| count > 50), "{:?}", positions);
    }

    #[test]
    fn test_true_false_not_shuffled() {
        let json = r#"{"question": "∅ ⊆ ∅", "type": "tf", "options": ["True", "False"],
            "answer": "True", "difficulty": "Easy", "explanation": "任何集合都是自身的子集，空集也不例外。"}"#;
        let mut q = parse_question(json, 20).unwrap().question;
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            shuffle_options(&mut q, &mut rng);
            assert_eq!(q.options(), ["True".to_string(), "False".to_string()]);
        }
    }
}
