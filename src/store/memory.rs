//! In-process store used when no database is configured.
//!
//! Behaves like the SQLite store except that nothing survives a restart.

use super::{PROFILE_EXISTS, StoredProfile, WaitlistStore};
use crate::{
    core::{item::Item, profile::ProfileSettings, status::ItemStatus},
    errors::{Error, Result},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    profiles: BTreeMap<String, ProfileSettings>,
    items: BTreeMap<String, Vec<Item>>,
    last_id: i64,
}

impl State {
    fn item_mut(&mut self, profile: &str, id: i64) -> Result<&mut Item> {
        self.items
            .get_mut(profile)
            .and_then(|items| items.iter_mut().find(|item| item.id == id))
            .ok_or(Error::ItemNotFound { id })
    }
}

/// Memory-only [`WaitlistStore`] with monotonically assigned item IDs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WaitlistStore for MemoryStore {
    async fn load_all(&self, profile: &str) -> Result<StoredProfile> {
        let state = self.state.lock().await;
        let mut items = state.items.get(profile).cloned().unwrap_or_default();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(StoredProfile {
            settings: state.profiles.get(profile).cloned(),
            items,
        })
    }

    async fn list_profiles(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().await.profiles.keys().cloned().collect())
    }

    async fn upsert_profile(&self, profile: &str, settings: &ProfileSettings) -> Result<()> {
        self.state
            .lock()
            .await
            .profiles
            .insert(profile.to_string(), settings.clone());
        Ok(())
    }

    async fn rename_profile(&self, from: &str, to: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.profiles.contains_key(to) {
            return Err(Error::conflict(PROFILE_EXISTS));
        }
        if let Some(settings) = state.profiles.remove(from) {
            state.profiles.insert(to.to_string(), settings);
        }
        if let Some(items) = state.items.remove(from) {
            state.items.entry(to.to_string()).or_default().extend(items);
        }
        Ok(())
    }

    async fn delete_profile(&self, profile: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.profiles.remove(profile);
        state.items.remove(profile);
        Ok(())
    }

    async fn insert_item(&self, profile: &str, item: &Item) -> Result<i64> {
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let id = state.last_id;
        state
            .items
            .entry(profile.to_string())
            .or_default()
            .push(Item { id, ..item.clone() });
        Ok(id)
    }

    async fn update_item(&self, profile: &str, item: &Item) -> Result<()> {
        let mut state = self.state.lock().await;
        *state.item_mut(profile, item.id)? = item.clone();
        Ok(())
    }

    async fn update_item_status(&self, profile: &str, id: i64, status: ItemStatus) -> Result<()> {
        self.state.lock().await.item_mut(profile, id)?.status = status;
        Ok(())
    }

    async fn mark_notification_attempted(&self, profile: &str, id: i64) -> Result<()> {
        self.state
            .lock()
            .await
            .item_mut(profile, id)?
            .notification_attempted = true;
        Ok(())
    }

    async fn delete_item(&self, profile: &str, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        let items = state
            .items
            .get_mut(profile)
            .ok_or(Error::ItemNotFound { id })?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(Error::ItemNotFound { id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{reference_now, sample_item};

    #[tokio::test]
    async fn test_ids_are_never_reused() -> Result<()> {
        let store = MemoryStore::new();
        let item = sample_item(0, "Bike", ItemStatus::Waiting, reference_now());
        let first = store.insert_item("alex", &item).await?;
        store.delete_item("alex", first).await?;
        let second = store.insert_item("alex", &item).await?;
        assert!(second > first);
        Ok(())
    }
}
