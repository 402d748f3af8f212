use tracing::debug;

use crate::error::QuizError;
use crate::session::mode::TrainingMode;
use crate::vocab::Word;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizState {
    NotStarted,
    InProgress { index: usize },
    Finished,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuessRecord {
    pub word: Word,
    pub guess: String,
    pub is_valid: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

/// One training run over a fixed pool of words.
#[derive(Clone, Debug)]
pub struct QuizSession {
    pool: Vec<Word>,
    mode: TrainingMode,
    state: QuizState,
    records: Vec<GuessRecord>,
}

impl QuizSession {
    pub fn new(pool: Vec<Word>, mode: TrainingMode) -> Result<Self, QuizError> {
        if pool.is_empty() {
            return Err(QuizError::EmptyPool);
        }
        Ok(Self {
            pool,
            mode,
            state: QuizState::NotStarted,
            records: Vec::new(),
        })
    }

    /// Build a started session and feed it `guesses` in order.
    pub fn replay<'g>(
        pool: Vec<Word>,
        mode: TrainingMode,
        guesses: impl IntoIterator<Item = &'g str>,
    ) -> Result<Self, QuizError> {
        let mut session = Self::new(pool, mode)?;
        session.start()?;
        for guess in guesses {
            session.submit_guess(guess)?;
        }
        Ok(session)
    }

    pub fn start(&mut self) -> Result<(), QuizError> {
        if self.state != QuizState::NotStarted {
            return Err(QuizError::AlreadyStarted);
        }
        self.state = QuizState::InProgress { index: 0 };
        debug!(mode = %self.mode, pool = self.pool.len(), "quiz started");
        Ok(())
    }

    pub fn submit_guess(&mut self, guess: &str) -> Result<&GuessRecord, QuizError> {
        let index = match self.state {
            QuizState::NotStarted => return Err(QuizError::NotStarted),
            QuizState::Finished => return Err(QuizError::Finished),
            QuizState::InProgress { index } => index,
        };

        let word = &self.pool[index];
        let is_valid = word.field(self.mode.answer_field()) == Some(guess);
        self.records.push(GuessRecord {
            word: word.clone(),
            guess: guess.to_string(),
            is_valid,
        });

        let next = index + 1;
        self.state = if next == self.pool.len() {
            debug!(correct = self.correct_count(), total = self.pool.len(), "quiz finished");
            QuizState::Finished
        } else {
            QuizState::InProgress { index: next }
        };

        // just pushed
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn state(&self) -> QuizState {
        self.state
    }

    pub fn mode(&self) -> TrainingMode {
        self.mode
    }

    pub fn pool(&self) -> &[Word] {
        &self.pool
    }

    pub fn records(&self) -> &[GuessRecord] {
        &self.records
    }

    pub fn is_finished(&self) -> bool {
        self.state == QuizState::Finished
    }

    pub fn current_word(&self) -> Option<&Word> {
        match self.state {
            QuizState::InProgress { index } => self.pool.get(index),
            _ => None,
        }
    }

    /// Text shown for the current word. `None` outside `InProgress`, or when
    /// the word lacks the prompt field (e.g. no kanji in kanji_to_kana).
    pub fn prompt(&self) -> Option<&str> {
        self.current_word()?.field(self.mode.prompt_field())
    }

    pub fn expected_answer(&self) -> Option<&str> {
        self.current_word()?.field(self.mode.answer_field())
    }

    /// 1-based (current, total) while in progress.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self.state {
            QuizState::InProgress { index } => Some((index + 1, self.pool.len())),
            _ => None,
        }
    }

    pub fn correct_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_valid).count()
    }

    pub fn score(&self) -> Score {
        Score {
            correct: self.correct_count(),
            total: self.pool.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> Word {
        Word::new("1", "みず", "water").with_kanji("水")
    }

    fn pool() -> Vec<Word> {
        vec![
            water(),
            Word::new("2", "ひ", "fire").with_kanji("火"),
            Word::new("3", "これ", "this"),
        ]
    }

    #[test]
    fn test_empty_pool_rejected() {
        let err = QuizSession::new(Vec::new(), TrainingMode::KanjiToKana).unwrap_err();
        assert_eq!(err, QuizError::EmptyPool);
    }

    #[test]
    fn test_new_session_is_not_started() {
        let mut quiz = QuizSession::new(pool(), TrainingMode::KanjiToKana).unwrap();
        assert_eq!(quiz.state(), QuizState::NotStarted);
        assert!(quiz.current_word().is_none());
        assert!(quiz.progress().is_none());
        assert_eq!(quiz.submit_guess("みず").unwrap_err(), QuizError::NotStarted);
        assert!(quiz.records().is_empty());
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut quiz = QuizSession::new(pool(), TrainingMode::KanjiToKana).unwrap();
        quiz.start().unwrap();
        assert_eq!(quiz.start().unwrap_err(), QuizError::AlreadyStarted);
        assert_eq!(quiz.state(), QuizState::InProgress { index: 0 });
    }

    #[test]
    fn test_start_after_finish_rejected() {
        let mut quiz =
            QuizSession::replay(vec![water()], TrainingMode::KanjiToKana, ["みず"]).unwrap();
        let err = quiz.start().unwrap_err();
        assert_eq!(err, QuizError::AlreadyStarted);
        assert_eq!(err.to_string(), "quiz has already been started");
        assert_eq!(quiz.state(), QuizState::Finished);
    }

    #[test]
    fn test_kanji_to_kana_correct_guess_finishes() {
        let quiz = QuizSession::replay(vec![water()], TrainingMode::KanjiToKana, ["みず"]).unwrap();
        assert!(quiz.is_finished());
        assert!(quiz.records()[0].is_valid);
        assert_eq!(quiz.score(), Score { correct: 1, total: 1 });
    }

    #[test]
    fn test_traduction_to_kanji_wrong_guess() {
        let mut quiz = QuizSession::new(vec![water()], TrainingMode::TraductionToKanji).unwrap();
        quiz.start().unwrap();
        assert_eq!(quiz.prompt(), Some("water"));
        let record = quiz.submit_guess("火").unwrap();
        assert!(!record.is_valid);
        assert_eq!(quiz.score(), Score { correct: 0, total: 1 });
    }

    #[test]
    fn test_progress_is_one_based() {
        let mut quiz = QuizSession::new(pool(), TrainingMode::KanjiToKana).unwrap();
        quiz.start().unwrap();
        assert_eq!(quiz.progress(), Some((1, 3)));
        quiz.submit_guess("x").unwrap();
        assert_eq!(quiz.progress(), Some((2, 3)));
        quiz.submit_guess("x").unwrap();
        assert_eq!(quiz.progress(), Some((3, 3)));
        quiz.submit_guess("x").unwrap();
        assert_eq!(quiz.progress(), None);
    }

    #[test]
    fn test_finished_rejects_further_guesses() {
        let mut quiz = QuizSession::replay(vec![water()], TrainingMode::KanjiToKana, ["みず"]).unwrap();
        assert_eq!(quiz.submit_guess("みず").unwrap_err(), QuizError::Finished);
        assert_eq!(quiz.records().len(), 1);
    }

    #[test]
    fn test_records_keep_submission_order() {
        let quiz = QuizSession::replay(pool(), TrainingMode::KanjiToKana, ["みず", "wrong", "これ"])
            .unwrap();
        let guesses: Vec<&str> = quiz.records().iter().map(|r| r.guess.as_str()).collect();
        assert_eq!(guesses, vec!["みず", "wrong", "これ"]);
        let valid: Vec<bool> = quiz.records().iter().map(|r| r.is_valid).collect();
        assert_eq!(valid, vec![true, false, true]);
        assert_eq!(quiz.score().correct, 2);
        assert_eq!(quiz.score().total, 3);
    }

    #[test]
    fn test_kanji_to_traduction_falls_back_to_kana() {
        let mut quiz = QuizSession::new(pool(), TrainingMode::KanjiToTraduction).unwrap();
        quiz.start().unwrap();
        quiz.submit_guess("water").unwrap();
        quiz.submit_guess("fire").unwrap();
        assert_eq!(quiz.prompt(), Some("これ"));
        assert_eq!(quiz.expected_answer(), Some("this"));
    }

    #[test]
    fn test_missing_kanji_never_matches() {
        let quiz = QuizSession::replay(
            vec![Word::new("3", "これ", "this")],
            TrainingMode::TraductionToKanji,
            [""],
        )
        .unwrap();
        assert!(!quiz.records()[0].is_valid);
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        let quiz = QuizSession::replay(vec![water()], TrainingMode::KanjiToTraduction, ["Water"])
            .unwrap();
        assert!(!quiz.records()[0].is_valid);
    }

    #[test]
    fn test_empty_guess_is_scored_not_rejected() {
        let quiz = QuizSession::replay(vec![water()], TrainingMode::KanjiToKana, [""]).unwrap();
        assert!(quiz.is_finished());
        assert!(!quiz.records()[0].is_valid);
    }

    #[test]
    fn test_score_counts_valid_records_for_any_sequence() {
        let guesses = ["みず", "ひ", "x"];
        for n in 0..=guesses.len() {
            let mut quiz = QuizSession::new(pool(), TrainingMode::KanjiToKana).unwrap();
            quiz.start().unwrap();
            for g in &guesses[..n] {
                quiz.submit_guess(g).unwrap();
            }
            assert_eq!(quiz.records().len(), n);
            assert_eq!(quiz.is_finished(), n == 3);
            let valid = quiz.records().iter().filter(|r| r.is_valid).count();
            assert_eq!(quiz.score().correct, valid);
        }
    }
}
