use std::collections::BTreeMap;

use academy_core::model::{ProgressKey, ProgressState, Quest};
use serde::{Deserialize, Deserializer, Serialize};

/// Persisted JSON shape of a `ProgressState`.
///
/// Every field is optional on read so partially written records still load.
/// The stored `level` is written for readers of the raw record but ignored on
/// load; the domain recomputes it from `xp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub level: u32,
    #[serde(default, deserialize_with = "progress_entries")]
    pub progress: BTreeMap<ProgressKey, bool>,
    #[serde(default)]
    pub quests: Option<Vec<Quest>>,
}

impl StateRecord {
    #[must_use]
    pub fn from_state(state: &ProgressState) -> Self {
        Self {
            xp: state.xp(),
            level: state.level(),
            progress: state.progress().clone(),
            quests: Some(state.quests().to_vec()),
        }
    }

    /// Convert the record back into a domain `ProgressState`.
    ///
    /// A record without a `quests` field gets the default quest list.
    #[must_use]
    pub fn into_state(self) -> ProgressState {
        let quests = self
            .quests
            .unwrap_or_else(|| ProgressState::default().quests().to_vec());
        ProgressState::from_parts(self.xp, self.progress, quests)
    }
}

/// Reads the progress map, dropping entries whose key is not `module:lesson`
/// instead of rejecting the whole record.
fn progress_entries<'de, D>(deserializer: D) -> Result<BTreeMap<ProgressKey, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, done)| match key.parse::<ProgressKey>() {
            Ok(parsed) => Some((parsed, done)),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable progress entry");
                None
            }
        })
        .collect())
}
