use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::StoreError;
use crate::store::paths;
use crate::store::repository::{Listener, Repository, SubscriptionId};

struct Subscription {
    path: Vec<String>,
    listener: Listener,
}

/// In-memory keyed tree. Writing `null` removes a record, and objects left
/// empty by a removal are pruned.
pub struct KeyTree {
    root: Value,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    next_id: u64,
}

impl Default for KeyTree {
    fn default() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }
}

impl KeyTree {
    pub fn from_value(root: Value) -> Self {
        let root = match root {
            Value::Object(_) => root,
            _ => Value::Object(Map::new()),
        };
        Self {
            root,
            subscriptions: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Replace the whole tree and notify every subscriber.
    pub fn replace_root(&mut self, root: Value) {
        self.root = match root {
            Value::Object(_) => root,
            _ => Value::Object(Map::new()),
        };
        let everything: [&str; 0] = [];
        self.notify(&everything);
    }

    fn notify(&mut self, changed: &[&str]) {
        let root = &self.root;
        for (id, sub) in self.subscriptions.iter_mut() {
            if paths::related(sub.path.as_slice(), changed) {
                trace!(subscription = id.0, path = %sub.path.join("/"), "notify");
                (sub.listener)(lookup(root, sub.path.as_slice()));
            }
        }
    }
}

fn lookup<'a, S: AsRef<str>>(root: &'a Value, segments: &[S]) -> Option<&'a Value> {
    let mut node = root;
    for segment in segments {
        node = node.as_object()?.get(segment.as_ref())?;
    }
    Some(node)
}

/// Walk to `segments`, turning missing or non-object nodes into objects.
fn lookup_or_create<'a>(root: &'a mut Value, segments: &[&str]) -> &'a mut Value {
    let mut node = root;
    for segment in segments {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => unreachable!("node was just made an object"),
        };
    }
    node
}

fn remove_at(node: &mut Value, segments: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };
    let Value::Object(map) = node else {
        return false;
    };
    if rest.is_empty() {
        return map.remove(*first).is_some();
    }
    let Some(child) = map.get_mut(*first) else {
        return false;
    };
    let removed = remove_at(child, rest);
    if removed && child.as_object().is_some_and(Map::is_empty) {
        map.remove(*first);
    }
    removed
}

impl Repository for KeyTree {
    fn subscribe(&mut self, path: &str, mut on_change: Listener) -> Result<SubscriptionId, StoreError> {
        let segments = paths::segments(path)?;
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        on_change(lookup(&self.root, segments.as_slice()));

        self.subscriptions.insert(
            id,
            Subscription {
                path: segments.iter().map(|s| s.to_string()).collect(),
                listener: on_change,
            },
        );
        debug!(subscription = id.0, path, "subscribed");
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        if self.subscriptions.remove(&id).is_some() {
            debug!(subscription = id.0, "unsubscribed");
        }
    }

    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = paths::segments(path)?;
        Ok(lookup(&self.root, segments.as_slice()).cloned())
    }

    fn write(&mut self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = paths::segments(path)?;
        if value.is_null() {
            return self.remove(path);
        }
        let Some((last, parents)) = segments.split_last() else {
            self.replace_root(value);
            return Ok(());
        };
        let parent = lookup_or_create(&mut self.root, parents);
        if !parent.is_object() {
            *parent = Value::Object(Map::new());
        }
        if let Value::Object(map) = parent {
            map.insert(last.to_string(), value);
        }
        debug!(path, "write");
        self.notify(&segments);
        Ok(())
    }

    fn update(&mut self, path: &str, partial: Value) -> Result<(), StoreError> {
        let segments = paths::segments(path)?;
        let Value::Object(fields) = partial else {
            return Err(StoreError::InvalidUpdate {
                path: path.to_string(),
                reason: "partial value must be an object",
            });
        };
        for key in fields.keys() {
            if !paths::is_valid_key(key) {
                return Err(StoreError::InvalidUpdate {
                    path: path.to_string(),
                    reason: "field names must be valid path segments",
                });
            }
        }

        let target = lookup_or_create(&mut self.root, &segments);
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        if let Value::Object(map) = target {
            for (key, value) in fields {
                if value.is_null() {
                    map.remove(&key);
                } else {
                    map.insert(key, value);
                }
            }
        }
        let emptied = lookup(&self.root, segments.as_slice())
            .and_then(Value::as_object)
            .is_some_and(Map::is_empty);
        if emptied {
            remove_at(&mut self.root, &segments);
        }
        debug!(path, "update");
        self.notify(&segments);
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), StoreError> {
        let segments = paths::segments(path)?;
        if segments.is_empty() {
            self.replace_root(Value::Object(Map::new()));
            return Ok(());
        }
        if remove_at(&mut self.root, &segments) {
            debug!(path, "remove");
            self.notify(&segments);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<Option<Value>>>>, Listener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: Listener = Box::new(move |value: Option<&Value>| {
            sink.lock().unwrap().push(value.cloned());
        });
        (seen, listener)
    }

    #[test]
    fn test_write_creates_intermediate_objects() {
        let mut tree = KeyTree::default();
        tree.write("users/u/words/1", json!({"id": "1", "kana": "みず"}))
            .unwrap();
        assert_eq!(
            tree.get("users/u/words/1/kana").unwrap(),
            Some(json!("みず"))
        );
        assert!(tree.get("users/u/lists").unwrap().is_none());
    }

    #[test]
    fn test_write_replaces_record() {
        let mut tree = KeyTree::default();
        tree.write("a/b", json!({"x": 1, "y": 2})).unwrap();
        tree.write("a/b", json!({"x": 3})).unwrap();
        assert_eq!(tree.get("a/b").unwrap(), Some(json!({"x": 3})));
    }

    #[test]
    fn test_update_merges_and_null_deletes_field() {
        let mut tree = KeyTree::default();
        tree.write("a/b", json!({"x": 1, "y": 2})).unwrap();
        tree.update("a/b", json!({"y": null, "z": 3})).unwrap();
        assert_eq!(tree.get("a/b").unwrap(), Some(json!({"x": 1, "z": 3})));
    }

    #[test]
    fn test_update_rejects_non_object() {
        let mut tree = KeyTree::default();
        let err = tree.update("a/b", json!(5)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdate { .. }));
        let err = tree.update("a/b", json!({"bad.key": 1})).unwrap_err();
        assert!(matches!(err, StoreError::InvalidUpdate { .. }));
    }

    #[test]
    fn test_remove_prunes_empty_parents() {
        let mut tree = KeyTree::default();
        tree.write("users/u/lists/1", json!({"id": "1"})).unwrap();
        tree.remove("users/u/lists/1").unwrap();
        assert!(tree.get("users").unwrap().is_none());
        // Removing something absent is fine.
        tree.remove("users/u/lists/1").unwrap();
    }

    #[test]
    fn test_subscribe_fires_immediately_with_absence() {
        let mut tree = KeyTree::default();
        let (seen, listener) = recorder();
        tree.subscribe("users/u/words", listener).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_subscribers_see_descendant_and_ancestor_changes() {
        let mut tree = KeyTree::default();
        let (words_seen, words_listener) = recorder();
        let (lists_seen, lists_listener) = recorder();
        tree.subscribe("users/u/words", words_listener).unwrap();
        tree.subscribe("users/u/lists", lists_listener).unwrap();

        tree.write("users/u/words/1", json!({"id": "1"})).unwrap();
        tree.remove("users/u").unwrap();

        let words_seen = words_seen.lock().unwrap();
        assert_eq!(words_seen.len(), 3);
        assert_eq!(words_seen[1], Some(json!({"1": {"id": "1"}})));
        assert_eq!(words_seen[2], None);
        // lists: initial + ancestor removal, not the sibling write
        assert_eq!(lists_seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut tree = KeyTree::default();
        let (seen, listener) = recorder();
        let id = tree.subscribe("a", listener).unwrap();
        tree.unsubscribe(id);
        tree.write("a/b", json!(1)).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(tree.subscriptions.is_empty());
    }

    #[test]
    fn test_write_null_removes() {
        let mut tree = KeyTree::default();
        tree.write("a/b", json!(1)).unwrap();
        tree.write("a/b", Value::Null).unwrap();
        assert!(tree.get("a").unwrap().is_none());
    }
}
