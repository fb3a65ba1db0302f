//! Per-user default category, held in memory only (reset on restart).

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::category::CategoryRegistry;
use crate::error::PreferenceError;

/// Platform user identifier.
pub type UserId = i64;

/// Shared map of user -> default category. Reads vastly outnumber writes.
#[derive(Debug, Default)]
pub struct UserPreferences {
    defaults: RwLock<HashMap<UserId, String>>,
}

impl UserPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `user`'s default. The category must be registered at this moment.
    pub fn set_default(
        &self,
        user: UserId,
        category: &str,
        registry: &CategoryRegistry,
    ) -> Result<(), PreferenceError> {
        if !registry.contains(category) {
            return Err(PreferenceError::UnknownCategory {
                name: category.to_string(),
                available: registry.names(),
            });
        }
        self.defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, category.to_string());
        tracing::debug!(user, category, "default category set");
        Ok(())
    }

    pub fn get_default(&self, user: UserId) -> Option<String> {
        self.defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .cloned()
    }

    /// Removes `user`'s default, returning the category it pointed at.
    pub fn clear_default(&self, user: UserId) -> Result<String, PreferenceError> {
        let removed = self
            .defaults
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user)
            .ok_or(PreferenceError::NoDefaultSet)?;
        tracing::debug!(user, category = %removed, "default category cleared");
        Ok(removed)
    }
}
