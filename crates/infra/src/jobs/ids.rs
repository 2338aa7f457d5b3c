//! Bidirectional external ↔ internal job id mapping.
//!
//! Process-lifetime only: after a restart every external id is unmapped and
//! lookups fall through to treating the given id as internal.

use std::collections::HashMap;
use std::sync::RwLock;

use feedrun_core::JobId;

/// Injected, lifecycle-scoped id lookup service.
#[derive(Debug, Default)]
pub struct IdTranslator {
    maps: RwLock<Maps>,
}

#[derive(Debug, Default)]
struct Maps {
    to_internal: HashMap<String, String>,
    to_external: HashMap<String, String>,
}

impl IdTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `external_id` to `internal_id` in both directions.
    ///
    /// Re-registering an external id moves it to the new internal id.
    pub fn register(&self, external_id: impl Into<String>, internal_id: JobId) {
        let external = external_id.into();
        let internal = internal_id.to_string();
        let mut maps = self.maps.write().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = maps.to_internal.insert(external.clone(), internal.clone()) {
            maps.to_external.remove(&previous);
        }
        maps.to_external.insert(internal, external);
    }

    /// Internal id for `external_id`, or `external_id` unchanged if unmapped.
    pub fn to_internal(&self, external_id: &str) -> String {
        let maps = self.maps.read().unwrap_or_else(|p| p.into_inner());
        maps.to_internal
            .get(external_id)
            .cloned()
            .unwrap_or_else(|| external_id.to_string())
    }

    /// External id for `internal_id`, or `internal_id` unchanged if unmapped.
    pub fn to_external(&self, internal_id: &str) -> String {
        let maps = self.maps.read().unwrap_or_else(|p| p.into_inner());
        maps.to_external
            .get(internal_id)
            .cloned()
            .unwrap_or_else(|| internal_id.to_string())
    }

    /// Whether `external_id` has been registered.
    pub fn is_registered(&self, external_id: &str) -> bool {
        let maps = self.maps.read().unwrap_or_else(|p| p.into_inner());
        maps.to_internal.contains_key(external_id)
    }
}
