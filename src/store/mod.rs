pub mod json_store;
pub mod paths;
pub mod repository;
pub mod schema;
pub mod tree;
pub mod vocabulary;

pub use json_store::JsonStore;
pub use repository::{Listener, Repository, SubscriptionId};
pub use tree::KeyTree;
pub use vocabulary::{NewWord, Vocabulary};
