use serde::{Deserialize, Serialize};

/// 选择题的选项数量
pub const MC_OPTION_COUNT: usize = 5;

/// 判断题的两个合法答案
pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["True", "False"];

/// 题目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    /// 单选题
    #[serde(rename = "mc")]
    MultipleChoice,
    /// 判断题
    #[serde(rename = "tf")]
    TrueFalse,
}

impl QuestionKind {
    /// 从模型返回的类型字段解析
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim() {
            "mc" => Some(QuestionKind::MultipleChoice),
            "tf" => Some(QuestionKind::TrueFalse),
            _ => None,
        }
    }
}

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// 显示名称
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "简单",
            Difficulty::Medium => "中等",
            Difficulty::Hard => "困难",
        }
    }

    /// 解析难度标签，兼容模型可能返回的英文、西班牙文和中文写法
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "fácil" | "facil" | "简单" | "容易" => Some(Difficulty::Easy),
            "medium" | "intermedio" | "media" | "中等" | "一般" => Some(Difficulty::Medium),
            "hard" | "difícil" | "dificil" | "困难" | "难" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 一道经过校验的题目
///
/// 创建后不可变；`answer` 一定是 `options` 中的某一项。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    text: String,
    kind: QuestionKind,
    options: Vec<String>,
    answer: String,
    difficulty: Difficulty,
    explanation: String,
}

impl Question {
    /// 仅供解析模块在校验通过后调用
    pub(crate) fn new_unchecked(
        text: String,
        kind: QuestionKind,
        options: Vec<String>,
        answer: String,
        difficulty: Difficulty,
        explanation: String,
    ) -> Self {
        Self {
            text,
            kind,
            options,
            answer,
            difficulty,
            explanation,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// 判断答案是否正确
    pub fn is_correct(&self, choice: &str) -> bool {
        self.answer == choice
    }

    pub(crate) fn options_mut(&mut self) -> &mut Vec<String> {
        &mut self.options
    }
}

/// 模型返回的原始 JSON 结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub options: Vec<String>,
    pub answer: String,
    pub difficulty: String,
    pub explanation: String,
}

impl RawQuestion {
    /// 必须出现的字段
    pub const REQUIRED_KEYS: [&'static str; 6] = [
        "question",
        "type",
        "options",
        "answer",
        "difficulty",
        "explanation",
    ];
}
