use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::vocab::WordField;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingMode {
    #[default]
    KanjiToKana,
    KanjiToTraduction,
    TraductionToKanji,
    TraductionToKana,
}

/// (mode, prompt field, expected answer field)
const MODE_TABLE: [(TrainingMode, WordField, WordField); 4] = [
    (TrainingMode::KanjiToKana, WordField::Kanji, WordField::Kana),
    (
        TrainingMode::KanjiToTraduction,
        WordField::KanjiOrKana,
        WordField::Traduction,
    ),
    (
        TrainingMode::TraductionToKanji,
        WordField::Traduction,
        WordField::Kanji,
    ),
    (
        TrainingMode::TraductionToKana,
        WordField::Traduction,
        WordField::Kana,
    ),
];

impl TrainingMode {
    pub const ALL: [TrainingMode; 4] = [
        TrainingMode::KanjiToKana,
        TrainingMode::KanjiToTraduction,
        TrainingMode::TraductionToKanji,
        TrainingMode::TraductionToKana,
    ];

    fn entry(self) -> (WordField, WordField) {
        MODE_TABLE
            .iter()
            .find(|(mode, _, _)| *mode == self)
            .map(|&(_, prompt, answer)| (prompt, answer))
            .unwrap_or((WordField::Kanji, WordField::Kana))
    }

    pub fn prompt_field(self) -> WordField {
        self.entry().0
    }

    pub fn answer_field(self) -> WordField {
        self.entry().1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrainingMode::KanjiToKana => "kanji_to_kana",
            TrainingMode::KanjiToTraduction => "kanji_to_traduction",
            TrainingMode::TraductionToKanji => "traduction_to_kanji",
            TrainingMode::TraductionToKana => "traduction_to_kana",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrainingMode::KanjiToKana => "Kanji \u{2192} Kana",
            TrainingMode::KanjiToTraduction => "Kanji \u{2192} Translation",
            TrainingMode::TraductionToKanji => "Translation \u{2192} Kanji",
            TrainingMode::TraductionToKana => "Translation \u{2192} Kana",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown training mode: {s}"))
    }
}
