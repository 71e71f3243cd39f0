pub mod pool;
pub mod question;
pub mod round;

pub use pool::CommandPool;
pub use question::{normalize, Question};
pub use round::{grade, GradingResult, QuestionOutcome, QuizRound, RoundPhase};
