use serde::{Deserialize, Serialize};

use crate::vocab::list::ListId;

pub type WordId = String;

/// A vocabulary entry as stored under `users/{uid}/words/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub id: WordId,
    pub kana: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kanji: Option<String>,
    #[serde(alias = "name")]
    pub traduction: String,
    #[serde(
        default,
        rename = "secondaryTraduction",
        skip_serializing_if = "Option::is_none"
    )]
    pub secondary_traduction: Option<String>,
    /// `None` when the record has no `list` field or stores `null`.
    #[serde(default, rename = "list")]
    pub lists: Option<Vec<ListId>>,
}

/// Fields of a word a training mode can show or expect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordField {
    Kana,
    Kanji,
    /// Kanji when present, kana otherwise.
    KanjiOrKana,
    Traduction,
}

impl Word {
    pub fn new(id: &str, kana: &str, traduction: &str) -> Self {
        Self {
            id: id.to_string(),
            kana: kana.to_string(),
            kanji: None,
            traduction: traduction.to_string(),
            secondary_traduction: None,
            lists: None,
        }
    }

    pub fn with_kanji(mut self, kanji: &str) -> Self {
        self.kanji = Some(kanji.to_string());
        self
    }

    pub fn with_secondary(mut self, secondary: &str) -> Self {
        self.secondary_traduction = Some(secondary.to_string());
        self
    }

    pub fn with_lists(mut self, lists: &[&str]) -> Self {
        self.lists = Some(lists.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn field(&self, field: WordField) -> Option<&str> {
        match field {
            WordField::Kana => Some(self.kana.as_str()),
            WordField::Kanji => self.kanji.as_deref(),
            WordField::KanjiOrKana => self.kanji.as_deref().or(Some(self.kana.as_str())),
            WordField::Traduction => Some(self.traduction.as_str()),
        }
    }

    pub fn in_list(&self, list_id: &str) -> bool {
        self.lists
            .as_ref()
            .is_some_and(|lists| lists.iter().any(|l| l == list_id))
    }

    /// Kanji if the word has one, kana otherwise. Used as the display headword.
    pub fn headword(&self) -> &str {
        self.kanji.as_deref().unwrap_or(&self.kana)
    }
}

/// Partial update of a word. Only `Some` fields are written; `Some(None)`
/// writes `null`, which removes an optional field from the record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kana: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kanji: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traduction: Option<String>,
    #[serde(
        rename = "secondaryTraduction",
        skip_serializing_if = "Option::is_none"
    )]
    pub secondary_traduction: Option<Option<String>>,
    #[serde(rename = "list", skip_serializing_if = "Option::is_none")]
    pub lists: Option<Vec<ListId>>,
}

impl WordPatch {
    pub fn is_empty(&self) -> bool {
        self.kana.is_none()
            && self.kanji.is_none()
            && self.traduction.is_none()
            && self.secondary_traduction.is_none()
            && self.lists.is_none()
    }
}
