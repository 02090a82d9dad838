pub mod history;
pub mod question;

pub use history::QuestionHistory;
pub use question::{Difficulty, Question, QuestionKind, RawQuestion};
