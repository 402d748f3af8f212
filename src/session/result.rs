use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::mode::TrainingMode;
use crate::session::quiz::{QuizSession, Score};
use crate::vocab::WordId;

/// Summary of a quiz, kept in the training history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizResult {
    pub mode: TrainingMode,
    pub correct: usize,
    /// Size of the pool, not the number of answered words.
    pub total: usize,
    pub timestamp: DateTime<Utc>,
    pub records: Vec<RecordSummary>,
    #[serde(default)]
    pub partial: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordSummary {
    pub word_id: WordId,
    #[serde(default)]
    pub kanji: Option<String>,
    pub kana: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub expected: Option<String>,
    pub guess: String,
    pub is_valid: bool,
}

impl QuizResult {
    /// Summarize `quiz`. A session abandoned before the end is marked `partial`.
    pub fn from_quiz(quiz: &QuizSession) -> Self {
        let mode = quiz.mode();
        let records = quiz
            .records()
            .iter()
            .map(|r| RecordSummary {
                word_id: r.word.id.clone(),
                kanji: r.word.kanji.clone(),
                kana: r.word.kana.clone(),
                prompt: r.word.field(mode.prompt_field()).map(str::to_string),
                expected: r.word.field(mode.answer_field()).map(str::to_string),
                guess: r.guess.clone(),
                is_valid: r.is_valid,
            })
            .collect();
        let score = quiz.score();

        Self {
            mode,
            correct: score.correct,
            total: score.total,
            timestamp: Utc::now(),
            records,
            partial: !quiz.is_finished(),
        }
    }

    pub fn score(&self) -> Score {
        Score {
            correct: self.correct,
            total: self.total,
        }
    }

    pub fn percent(&self) -> f64 {
        self.score().ratio() * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Word;

    #[test]
    fn test_denominator_is_pool_length() {
        let pool = vec![
            Word::new("1", "みず", "water").with_kanji("水"),
            Word::new("2", "ひ", "fire").with_kanji("火"),
        ];
        let quiz = QuizSession::replay(pool, TrainingMode::KanjiToKana, ["みず", "ひ"]).unwrap();
        let result = QuizResult::from_quiz(&quiz);
        assert_eq!(result.correct, 2);
        assert_eq!(result.total, 2);
        assert!((result.percent() - 100.0).abs() < f64::EPSILON);
        assert!(!result.partial);
    }

    #[test]
    fn test_records_carry_expected_answer() {
        let pool = vec![Word::new("1", "みず", "water").with_kanji("水")];
        let quiz = QuizSession::replay(pool, TrainingMode::TraductionToKanji, ["火"]).unwrap();
        let result = QuizResult::from_quiz(&quiz);
        let record = &result.records[0];
        assert_eq!(record.prompt.as_deref(), Some("water"));
        assert_eq!(record.expected.as_deref(), Some("水"));
        assert_eq!(record.guess, "火");
        assert!(!record.is_valid);
    }

    #[test]
    fn test_abandoned_quiz_is_partial() {
        let pool = vec![
            Word::new("1", "みず", "water").with_kanji("水"),
            Word::new("2", "ひ", "fire").with_kanji("火"),
        ];
        let quiz = QuizSession::replay(pool, TrainingMode::KanjiToKana, ["みず"]).unwrap();
        let result = QuizResult::from_quiz(&quiz);
        assert!(result.partial);
        assert_eq!(result.total, 2);
        assert_eq!(result.records.len(), 1);
    }
}
