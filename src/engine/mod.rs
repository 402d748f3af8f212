pub mod filter;
pub mod pool;

pub use filter::{WordFilter, filter_words};
pub use pool::{PoolOptions, build_pool};
