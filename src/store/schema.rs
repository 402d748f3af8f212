use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::session::result::QuizResult;

const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingHistoryData {
    pub schema_version: u32,
    pub sessions: Vec<QuizResult>,
}

impl Default for TrainingHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sessions: Vec::new(),
        }
    }
}

impl TrainingHistoryData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    pub fn last(&self) -> Option<&QuizResult> {
        self.sessions.last()
    }

    pub fn best_percent(&self) -> Option<f64> {
        self.sessions
            .iter()
            .filter(|s| !s.partial)
            .map(QuizResult::percent)
            .max_by(f64::total_cmp)
    }
}

pub const EXPORT_VERSION: u32 = 1;

/// Everything needed to restore a data directory: the keyed tree (all
/// users' words and lists) and the training history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub kotoba_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub tree: Value,
    pub history: TrainingHistoryData,
}
