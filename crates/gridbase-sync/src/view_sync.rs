use gridbase_model::ViewConfig;
use gridbase_store::{Store, StoreError};
use tracing::debug;
use uuid::Uuid;

/// Pushes view configuration to the store, skipping writes that would be
/// no-ops against the last pushed state. Sort and filter tweaks arrive in
/// bursts from the UI; most settle back to the value already persisted.
#[derive(Debug)]
pub struct ViewUpdater {
    view_id: Uuid,
    last_pushed: Option<ViewConfig>,
}

impl ViewUpdater {
    pub fn new(view_id: Uuid) -> Self {
        Self {
            view_id,
            last_pushed: None,
        }
    }

    /// Seed the comparison baseline from a config already loaded from the
    /// store, so the first no-op update is skipped too.
    pub fn with_current(view_id: Uuid, current: ViewConfig) -> Self {
        Self {
            view_id,
            last_pushed: Some(current),
        }
    }

    /// Persist `config` unless it matches the last pushed state. Returns
    /// whether a write happened.
    pub fn maybe_update(&mut self, store: &Store, config: &ViewConfig) -> Result<bool, StoreError> {
        if self.last_pushed.as_ref() == Some(config) {
            debug!(view = %self.view_id, "view config unchanged, skipping write");
            return Ok(false);
        }
        store.update_view(self.view_id, config)?;
        self.last_pushed = Some(config.clone());
        Ok(true)
    }
}
