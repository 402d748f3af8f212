use serde::{Deserialize, Serialize};

pub type ListId = String;

/// A named grouping of words, stored under `users/{uid}/lists/{id}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordList {
    pub id: ListId,
    pub name: String,
}

impl WordList {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}
