use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{errors::Result, storage::KeyValueStore};

/// Persisted snapshot of an in-progress registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub current_step: usize,
    pub form_data: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

/// Reads and writes the single draft document under a fixed key.
#[derive(Debug)]
pub struct DraftStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> DraftStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Overwrites whatever draft was stored before.
    pub fn save(&self, snapshot: &FormSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.store.set_item(&self.key, &json)?;
        tracing::debug!(step = snapshot.current_step, fields = snapshot.form_data.len(), "draft saved");
        Ok(())
    }

    /// Returns the stored draft. Absent, unreadable or malformed data all mean
    /// "no draft".
    pub fn load(&self) -> Option<FormSnapshot> {
        let raw = match self.store.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(%err, "draft storage unavailable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(%err, "discarding malformed draft");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove_item(&self.key)
    }
}
