use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::store::repository::{Listener, Repository, SubscriptionId};
use crate::store::schema::{EXPORT_VERSION, ExportData, TrainingHistoryData};
use crate::store::tree::KeyTree;

const TREE_FILE: &str = "tree.json";
const HISTORY_FILE: &str = "training_history.json";

/// A `KeyTree` persisted to `tree.json`, plus the training history file.
/// Every successful mutation rewrites the tree file.
pub struct JsonStore {
    base_dir: PathBuf,
    tree: KeyTree,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("creating data directory {}", base_dir.display()))?;
        let path = base_dir.join(TREE_FILE);
        let tree = if path.exists() {
            KeyTree::from_value(read_tree_file(&path)?)
        } else {
            KeyTree::default()
        };
        info!(dir = %base_dir.display(), "store opened");
        Ok(Self { base_dir, tree })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.file_path(name);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    warn!(file = name, error = %e, "unreadable data file, using defaults");
                    T::default()
                }),
                Err(_) => T::default(),
            }
        } else {
            T::default()
        }
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<(), StoreError> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn persist_tree(&self) -> Result<(), StoreError> {
        self.save(TREE_FILE, self.tree.root())
    }

    /// Returns a fresh history when the file is missing, corrupt, or from
    /// another schema version.
    pub fn load_history(&self) -> TrainingHistoryData {
        let history: TrainingHistoryData = self.load(HISTORY_FILE);
        if history.needs_reset() {
            warn!(
                version = history.schema_version,
                "training history schema changed, starting fresh"
            );
            return TrainingHistoryData::default();
        }
        history
    }

    pub fn save_history(&self, data: &TrainingHistoryData) -> Result<()> {
        Ok(self.save(HISTORY_FILE, data)?)
    }

    pub fn export_all(&self, config: &Config) -> ExportData {
        ExportData {
            kotoba_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            tree: self.tree.root().clone(),
            history: self.load_history(),
        }
    }

    /// Transactional import: two-phase commit with best-effort .bak rollback.
    ///
    /// Stage phase: write all data to .tmp files. If any fails, clean up and bail.
    /// Commit phase: for each file, rename original to .bak, then .tmp to final.
    /// On commit failure, attempt to restore .bak files and clean up .tmp files.
    /// After success, delete .bak files and swap in the imported tree, which
    /// notifies subscribers.
    pub fn import_all(&mut self, data: &ExportData) -> Result<()> {
        if data.kotoba_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.kotoba_export_version,
                EXPORT_VERSION
            );
        }
        if !data.tree.is_object() {
            bail!("Export tree must be a JSON object");
        }

        let files: Vec<(&str, String)> = vec![
            (TREE_FILE, serde_json::to_string_pretty(&data.tree)?),
            (HISTORY_FILE, serde_json::to_string_pretty(&data.history)?),
        ];

        // Stage phase: write .tmp files
        let mut staged: Vec<PathBuf> = Vec::new();
        for (name, json) in &files {
            let tmp_path = self.file_path(name).with_extension("json.tmp");
            match (|| -> Result<()> {
                let mut file = fs::File::create(&tmp_path)?;
                file.write_all(json.as_bytes())?;
                file.sync_all()?;
                Ok(())
            })() {
                Ok(()) => staged.push(tmp_path),
                Err(e) => {
                    for tmp in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    bail!("Import failed during staging: {e}");
                }
            }
        }

        // Commit phase: (final_path, bak_path, had_original)
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        for (i, (name, _)) in files.iter().enumerate() {
            let final_path = self.file_path(name);
            let bak_path = self.file_path(name).with_extension("json.bak");
            let tmp_path = &staged[i];
            let had_original = final_path.exists();

            if had_original && let Err(e) = fs::rename(&final_path, &bak_path) {
                rollback(&committed);
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                bail!("Import failed during commit (backup): {e}");
            }

            if let Err(e) = fs::rename(tmp_path, &final_path) {
                if had_original && bak_path.exists() {
                    let _ = fs::rename(&bak_path, &final_path);
                } else {
                    let _ = fs::remove_file(&final_path);
                }
                rollback(&committed);
                for tmp in &staged[i + 1..] {
                    let _ = fs::remove_file(tmp);
                }
                bail!("Import failed during commit (rename): {e}");
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }

        self.tree.replace_root(data.tree.clone());
        info!(exported_at = %data.exported_at, "import committed");
        Ok(())
    }

    /// Settle .bak files left by an interrupted import. A backup whose data
    /// file is missing is moved back into place (and the tree reloaded); a
    /// backup next to its data file is stale and deleted.
    /// Returns true if any backup was found.
    pub fn check_interrupted_import(&mut self) -> Result<bool> {
        let mut found = false;
        for name in [TREE_FILE, HISTORY_FILE] {
            let final_path = self.file_path(name);
            let bak_path = final_path.with_extension("json.bak");
            if !bak_path.exists() {
                continue;
            }
            found = true;
            if final_path.exists() {
                fs::remove_file(&bak_path)
                    .with_context(|| format!("removing {}", bak_path.display()))?;
                info!(file = name, "removed stale import backup");
                continue;
            }
            fs::rename(&bak_path, &final_path)
                .with_context(|| format!("restoring {}", bak_path.display()))?;
            warn!(file = name, "restored backup left by an interrupted import");
            if name == TREE_FILE {
                self.tree.replace_root(read_tree_file(&final_path)?);
            }
        }
        Ok(found)
    }
}

fn read_tree_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn rollback(committed: &[(PathBuf, PathBuf, bool)]) {
    for (final_path, bak_path, had_original) in committed {
        if *had_original {
            let _ = fs::rename(bak_path, final_path);
        } else {
            let _ = fs::remove_file(final_path);
        }
    }
}

impl Repository for JsonStore {
    fn subscribe(&mut self, path: &str, on_change: Listener) -> Result<SubscriptionId, StoreError> {
        self.tree.subscribe(path, on_change)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.tree.unsubscribe(id);
    }

    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.tree.get(path)
    }

    fn write(&mut self, path: &str, value: Value) -> Result<(), StoreError> {
        self.tree.write(path, value)?;
        self.persist_tree()
    }

    fn update(&mut self, path: &str, partial: Value) -> Result<(), StoreError> {
        self.tree.update(path, partial)?;
        self.persist_tree()
    }

    fn remove(&mut self, path: &str) -> Result<(), StoreError> {
        self.tree.remove(path)?;
        self.persist_tree()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::session::TrainingMode;
    use crate::session::quiz::QuizSession;
    use crate::session::result::QuizResult;
    use crate::vocab::Word;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn sample_result() -> QuizResult {
        let pool = vec![Word::new("1", "みず", "water").with_kanji("水")];
        let quiz = QuizSession::replay(pool, TrainingMode::KanjiToKana, ["みず"]).unwrap();
        QuizResult::from_quiz(&quiz)
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let (dir, mut store) = make_test_store();
        store
            .write("users/u/lists/1", json!({"id": "1", "name": "Food"}))
            .unwrap();
        store.update("users/u/lists/1", json!({"name": "Meals"})).unwrap();
        drop(store);

        let reopened = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get("users/u/lists/1/name").unwrap(),
            Some(json!("Meals"))
        );
    }

    #[test]
    fn test_corrupt_tree_is_an_error_not_a_reset() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TREE_FILE), "{not json").unwrap();
        assert!(JsonStore::with_base_dir(dir.path().to_path_buf()).is_err());
        // the file is left alone
        let content = fs::read_to_string(dir.path().join(TREE_FILE)).unwrap();
        assert_eq!(content, "{not json");
    }

    #[test]
    fn test_history_round_trip_and_corrupt_fallback() {
        let (_dir, store) = make_test_store();
        assert!(store.load_history().sessions.is_empty());

        let mut history = TrainingHistoryData::default();
        history.sessions.push(sample_result());
        store.save_history(&history).unwrap();
        assert_eq!(store.load_history().sessions.len(), 1);

        fs::write(store.file_path(HISTORY_FILE), "garbage").unwrap();
        assert!(store.load_history().sessions.is_empty());
    }

    #[test]
    fn test_round_trip_export_import() {
        let (_dir, mut store) = make_test_store();
        let config = Config::default();
        store.write("users/u/words/1", json!({"id": "1", "kana": "みず", "traduction": "water"})).unwrap();
        let mut history = TrainingHistoryData::default();
        history.sessions.push(sample_result());
        store.save_history(&history).unwrap();

        let export = store.export_all(&config);
        assert_eq!(export.kotoba_export_version, EXPORT_VERSION);

        let (_dir2, mut store2) = make_test_store();
        store2.import_all(&export).unwrap();

        assert_eq!(store2.get("users/u/words/1/kana").unwrap(), Some(json!("みず")));
        assert_eq!(store2.load_history().sessions.len(), 1);
    }

    #[test]
    fn test_import_notifies_subscribers() {
        let (_dir, mut store) = make_test_store();
        let (tx, rx) = std::sync::mpsc::channel();
        store
            .subscribe(
                "users/u/words",
                Box::new(move |value: Option<&Value>| {
                    let _ = tx.send(value.cloned());
                }),
            )
            .unwrap();
        assert_eq!(rx.recv().unwrap(), None);

        let mut export = store.export_all(&Config::default());
        export.tree = json!({"users": {"u": {"words": {"1": {"id": "1"}}}}});
        store.import_all(&export).unwrap();
        assert_eq!(rx.recv().unwrap(), Some(json!({"1": {"id": "1"}})));
    }

    #[test]
    fn test_version_rejection() {
        let (_dir, mut store) = make_test_store();
        let mut export = store.export_all(&Config::default());
        export.kotoba_export_version = 99;

        let result = store.import_all(&export);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Unsupported export version"));
        assert!(err_msg.contains("99"));
    }

    #[test]
    fn test_import_staging_failure_preserves_originals() {
        let (dir, mut store) = make_test_store();
        store.write("users/u/lists/1", json!({"id": "1", "name": "Food"})).unwrap();
        let original_content = fs::read_to_string(store.file_path(TREE_FILE)).unwrap();

        // Staging .tmp writes fail in a directory that does not exist.
        let bad_dir = dir.path().join("nonexistent_subdir");
        let mut bad_store = JsonStore {
            base_dir: bad_dir.clone(),
            tree: KeyTree::default(),
        };
        let export = store.export_all(&Config::default());
        let result = bad_store.import_all(&export);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Import failed during staging")
        );

        let after_content = fs::read_to_string(store.file_path(TREE_FILE)).unwrap();
        assert_eq!(original_content, after_content);
        assert!(!bad_dir.exists());
    }

    #[test]
    fn test_check_interrupted_import_removes_stale_backup() {
        let (_dir, mut store) = make_test_store();
        assert!(!store.check_interrupted_import().unwrap());

        store.write("users/u/lists/1", json!({"id": "1", "name": "Food"})).unwrap();
        fs::write(store.file_path("tree.json.bak"), "{}").unwrap();
        assert!(store.check_interrupted_import().unwrap());
        assert!(!store.file_path("tree.json.bak").exists());
        assert_eq!(store.get("users/u/lists/1/name").unwrap(), Some(json!("Food")));
    }

    #[test]
    fn test_check_interrupted_import_restores_backup_without_data_file() {
        let (dir, mut store) = make_test_store();
        store
            .write("users/u/words/1", json!({"id": "1", "kana": "みず", "traduction": "water"}))
            .unwrap();
        let mut history = TrainingHistoryData::default();
        history.sessions.push(sample_result());
        store.save_history(&history).unwrap();
        drop(store);

        // crash between "data -> .bak" and ".tmp -> data"
        for name in [TREE_FILE, HISTORY_FILE] {
            let path = dir.path().join(name);
            fs::rename(&path, path.with_extension("json.bak")).unwrap();
        }

        let mut reopened = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert!(reopened.get("users/u/words/1").unwrap().is_none());
        assert!(reopened.check_interrupted_import().unwrap());

        assert!(!reopened.file_path("tree.json.bak").exists());
        assert!(!reopened.file_path("training_history.json.bak").exists());
        assert_eq!(reopened.get("users/u/words/1/kana").unwrap(), Some(json!("みず")));
        assert_eq!(reopened.load_history().sessions.len(), 1);

        let again = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(again.get("users/u/words/1/kana").unwrap(), Some(json!("みず")));
    }

    #[test]
    fn test_restored_tree_notifies_subscribers() {
        let (dir, mut store) = make_test_store();
        store.write("users/u/lists/1", json!({"id": "1", "name": "Food"})).unwrap();
        drop(store);
        let path = dir.path().join(TREE_FILE);
        fs::rename(&path, path.with_extension("json.bak")).unwrap();

        let mut reopened = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        reopened
            .subscribe(
                "users/u/lists",
                Box::new(move |value: Option<&Value>| {
                    let _ = tx.send(value.is_some());
                }),
            )
            .unwrap();
        assert!(!rx.recv().unwrap());
        reopened.check_interrupted_import().unwrap();
        assert!(rx.recv().unwrap());
    }
}
