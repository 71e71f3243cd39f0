pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod generator;
pub mod interceptors;
pub mod json_utils;
pub mod loader;
pub mod quiz;
pub mod session;
pub mod view;

// Convenient re-exports
pub use error::QuizError;
pub use generator::{QuizGenerator, RetryConfig};
pub use quiz::{CommandPool, GradingResult, Question, QuizRound};
pub use session::{Progress, Session};
