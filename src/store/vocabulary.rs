use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::store::paths;
use crate::store::repository::{Repository, SubscriptionId};
use crate::vocab::{ListId, Word, WordList, WordPatch};

/// Fields for a word that does not exist yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewWord {
    pub kana: String,
    pub kanji: Option<String>,
    pub traduction: String,
    pub secondary_traduction: Option<String>,
    pub lists: Option<Vec<ListId>>,
}

/// Typed word and list operations for one user on top of a `Repository`.
pub struct Vocabulary<R: Repository> {
    repo: R,
    uid: String,
}

impl<R: Repository> Vocabulary<R> {
    pub fn new(repo: R, uid: &str) -> Self {
        Self {
            repo,
            uid: uid.to_string(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn words(&self) -> Result<Vec<Word>, StoreError> {
        let value = self.repo.get(&paths::words(&self.uid))?;
        Ok(decode_words(value.as_ref()))
    }

    pub fn lists(&self) -> Result<Vec<WordList>, StoreError> {
        let value = self.repo.get(&paths::lists(&self.uid))?;
        Ok(decode_lists(value.as_ref()))
    }

    pub fn word(&self, id: &str) -> Result<Option<Word>, StoreError> {
        let value = self.repo.get(&paths::word(&self.uid, id))?;
        Ok(value.and_then(|v| decode_record(id, v)))
    }

    /// Calls `on_change` with the decoded word collection now and on every change.
    pub fn subscribe_words(
        &mut self,
        mut on_change: impl FnMut(Vec<Word>) + Send + 'static,
    ) -> Result<SubscriptionId, StoreError> {
        self.repo.subscribe(
            &paths::words(&self.uid),
            Box::new(move |value: Option<&Value>| on_change(decode_words(value))),
        )
    }

    pub fn subscribe_lists(
        &mut self,
        mut on_change: impl FnMut(Vec<WordList>) + Send + 'static,
    ) -> Result<SubscriptionId, StoreError> {
        self.repo.subscribe(
            &paths::lists(&self.uid),
            Box::new(move |value: Option<&Value>| on_change(decode_lists(value))),
        )
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.repo.unsubscribe(id);
    }

    /// Millisecond timestamp id, bumped until it is free in `collection`.
    fn next_id(&self, collection: &str) -> Result<String, StoreError> {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = millis.to_string();
            if self.repo.get(&format!("{collection}/{id}"))?.is_none() {
                return Ok(id);
            }
            millis += 1;
        }
    }

    pub fn add_word(&mut self, draft: NewWord) -> Result<Word, StoreError> {
        let id = self.next_id(&paths::words(&self.uid))?;
        let word = Word {
            id: id.clone(),
            kana: draft.kana,
            kanji: draft.kanji,
            traduction: draft.traduction,
            secondary_traduction: draft.secondary_traduction,
            lists: draft.lists,
        };
        self.repo
            .write(&paths::word(&self.uid, &id), serde_json::to_value(&word)?)?;
        info!(word = %id, "word added");
        Ok(word)
    }

    pub fn update_word(&mut self, id: &str, patch: &WordPatch) -> Result<(), StoreError> {
        let path = paths::word(&self.uid, id);
        if self.repo.get(&path)?.is_none() {
            return Err(StoreError::NotFound(path));
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.repo.update(&path, serde_json::to_value(patch)?)?;
        info!(word = %id, "word updated");
        Ok(())
    }

    pub fn remove_word(&mut self, id: &str) -> Result<(), StoreError> {
        self.repo.remove(&paths::word(&self.uid, id))?;
        info!(word = %id, "word removed");
        Ok(())
    }

    pub fn add_list(&mut self, name: &str) -> Result<WordList, StoreError> {
        let id = self.next_id(&paths::lists(&self.uid))?;
        let list = WordList::new(&id, name);
        self.repo
            .write(&paths::list(&self.uid, &id), serde_json::to_value(&list)?)?;
        info!(list = %id, name, "list added");
        Ok(list)
    }

    pub fn rename_list(&mut self, id: &str, name: &str) -> Result<(), StoreError> {
        let path = paths::list(&self.uid, id);
        if self.repo.get(&path)?.is_none() {
            return Err(StoreError::NotFound(path));
        }
        self.repo.update(&path, json!({ "name": name }))?;
        info!(list = %id, name, "list renamed");
        Ok(())
    }

    /// Detach `id` from every word that references it, then delete the list.
    /// Words are never deleted. Returns how many words were detached.
    pub fn remove_list(&mut self, id: &str) -> Result<usize, StoreError> {
        let mut detached = 0;
        for word in self.words()? {
            let Some(lists) = word.lists.as_ref() else {
                continue;
            };
            if !lists.iter().any(|l| l == id) {
                continue;
            }
            let remaining: Vec<&ListId> = lists.iter().filter(|l| *l != id).collect();
            self.repo
                .write(&paths::word_lists(&self.uid, &word.id), json!(remaining))?;
            detached += 1;
        }
        self.repo.remove(&paths::list(&self.uid, id))?;
        info!(list = %id, detached, "list removed");
        Ok(detached)
    }
}

fn decode_record<T: DeserializeOwned>(key: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(key, error = %e, "skipping malformed record");
            None
        }
    }
}

/// Records of a collection in key order. Collections may also arrive as
/// arrays with holes.
fn decode_collection<T: DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, v)| decode_record(key, v.clone()))
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .filter_map(|(i, v)| decode_record(&i.to_string(), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn decode_words(value: Option<&Value>) -> Vec<Word> {
    decode_collection(value)
}

pub fn decode_lists(value: Option<&Value>) -> Vec<WordList> {
    decode_collection(value)
}

/// Words that reference `list_id`.
pub fn count_members(words: &[Word], list_id: &str) -> usize {
    words.iter().filter(|w| w.in_list(list_id)).count()
}
