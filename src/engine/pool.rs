use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::filter::WordFilter;
use crate::vocab::{ListId, Word};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolOptions {
    pub shuffle: bool,
    /// 0 keeps every matching word.
    pub limit: usize,
}

/// Words belonging to every list in `lists`, in collection order unless
/// `options.shuffle` is set, capped at `options.limit`.
pub fn build_pool<R: Rng>(
    words: &[Word],
    lists: &BTreeSet<ListId>,
    options: PoolOptions,
    rng: &mut R,
) -> Vec<Word> {
    let filter = WordFilter {
        lists: lists.clone(),
        text: String::new(),
    };
    let mut pool: Vec<Word> = filter.apply(words).into_iter().cloned().collect();
    if options.shuffle {
        pool.shuffle(rng);
    }
    if options.limit > 0 {
        pool.truncate(options.limit);
    }
    pool
}
