pub mod llm_service;
pub mod prompt;
pub mod question_generator;
pub mod question_parser;

pub use llm_service::{LanguageModel, LlmService};
pub use question_generator::QuestionGenerator;
pub use question_parser::{parse_question, shuffle_options, strip_code_fence, ParsedQuestion};
