pub mod quiz_flow;
pub mod session;
pub mod view;

pub use quiz_flow::{Action, QuizFlow};
pub use session::{Feedback, QuizPhase, RequestTicket, SessionState};
pub use view::{render, NextStep, ScoreBoard, Screen, ViewModel};
