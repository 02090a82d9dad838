//! 出题提示词

use crate::models::question::MC_OPTION_COUNT;

/// 构建出题提示词
///
/// # 参数
/// - `topic`: 出题主题
/// - `recent`: 最近出过的题目，提示模型不要重复
pub fn build_question_prompt(topic: &str, recent: &[String]) -> String {
    let recent_json = serde_json::to_string_pretty(recent).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"请生成一道关于【{topic}】的测验题。
题目需要附带一个简短的理论情境（最多 1-2 段），情境与题目相关。
题目必须是单选题（'mc'），共 {count} 个选项。
只返回一个合法的 JSON 对象，严格遵守以下格式，JSON 前后不要有任何其他文字。

格式要求：
{{
  "question": "理论情境，换行后是题目本身（加粗）",
  "type": "mc" | "tf",
  "options": ["选项 A", "选项 B", "正确选项", "选项 D", "选项 E"],
  "answer": "正确选项的文本",
  "difficulty": "Easy" | "Medium" | "Hard",
  "explanation": "2-4 句话详细解释为什么答案正确，可以补充相关背景或其他选项错误的原因。"
}}

对于 'mc'，answer 必须与 options 中的某一项完全一致，且 options 中不能有重复项。
对于 'tf'，options 必须是 ["True", "False"]，answer 必须是 "True" 或 "False"。
解析应清晰、简洁、有教学意义。
题目必须与本次测验中之前出过的题目完全不同，如果相似请换一道。
已出过的题目（最近 {recent_count} 道）：
{recent_json}"#,
        topic = topic,
        count = MC_OPTION_COUNT,
        recent_count = recent.len(),
        recent_json = recent_json,
    )
}
