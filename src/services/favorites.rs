//! Per-user favorite item ids.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::{favorites_key, GUEST_USER};
use crate::error::{Result, RivalsError};
use crate::storage::{self, KeyValueStore};

pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
    user_id: String,
    ids: BTreeSet<String>,
    hydrated: bool,
}

impl Favorites {
    /// Favorites for `user_id`, or the guest user when `None`.
    pub fn new(store: Arc<dyn KeyValueStore>, user_id: Option<&str>) -> Self {
        Self {
            store,
            user_id: user_id.unwrap_or(GUEST_USER).to_string(),
            ids: BTreeSet::new(),
            hydrated: false,
        }
    }

    pub fn hydrate(&mut self) {
        let key = favorites_key(&self.user_id);
        self.ids = storage::load_json(self.store.as_ref(), &key);
        self.hydrated = true;
    }

    /// Switch to another user's favorites and load them.
    pub fn switch_user(&mut self, user_id: Option<&str>) {
        self.user_id = user_id.unwrap_or(GUEST_USER).to_string();
        self.hydrate();
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    fn ensure_hydrated(&self) -> Result<()> {
        if self.hydrated {
            Ok(())
        } else {
            Err(RivalsError::NotHydrated("favorites"))
        }
    }

    fn persist(&self) {
        storage::save_json(self.store.as_ref(), &favorites_key(&self.user_id), &self.ids);
    }

    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn add(&mut self, id: &str) -> Result<()> {
        self.ensure_hydrated()?;
        if self.ids.insert(id.to_string()) {
            self.persist();
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.ensure_hydrated()?;
        if self.ids.remove(id) {
            self.persist();
        }
        Ok(())
    }

    /// Flip the favorite state of `id`; returns the new state.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        self.ensure_hydrated()?;
        let now = if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        };
        self.persist();
        Ok(now)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.ensure_hydrated()?;
        self.ids.clear();
        self.persist();
        Ok(())
    }
}
