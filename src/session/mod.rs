pub mod mode;
pub mod quiz;
pub mod result;

pub use mode::TrainingMode;
pub use quiz::{GuessRecord, QuizSession, QuizState, Score};
pub use result::QuizResult;
