pub mod list;
pub mod word;

pub use list::{ListId, WordList};
pub use word::{Word, WordField, WordId, WordPatch};
