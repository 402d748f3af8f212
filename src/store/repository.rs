use serde_json::Value;

use crate::error::StoreError;

/// Called with the full current value at the subscribed path, or `None`
/// when nothing is stored there.
pub type Listener = Box<dyn FnMut(Option<&Value>) + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A keyed tree of JSON values addressed by `/`-separated paths.
pub trait Repository {
    /// Register `on_change`. It fires once immediately, then after every
    /// mutation touching `path`, an ancestor of it, or a descendant of it.
    fn subscribe(&mut self, path: &str, on_change: Listener) -> Result<SubscriptionId, StoreError>;

    fn unsubscribe(&mut self, id: SubscriptionId);

    fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Create or fully replace the record at `path`.
    fn write(&mut self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Merge the fields of `partial` (a JSON object) into the record at `path`.
    fn update(&mut self, path: &str, partial: Value) -> Result<(), StoreError>;

    /// Delete the record at `path`. Removing an absent record is a no-op.
    fn remove(&mut self, path: &str) -> Result<(), StoreError>;
}
