//! Persistence contract for profiles and their items.
//!
//! Every operation is scoped by profile name. [`MemoryStore`] backs ephemeral
//! runs and tests; [`SqliteStore`] persists through `SeaORM`.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::{
    core::{item::Item, profile::ProfileSettings, status::ItemStatus},
    errors::Result,
};
use async_trait::async_trait;

/// Message used when a rename targets a name that is already taken.
pub const PROFILE_EXISTS: &str = "A profile with that name already exists.";

/// Everything stored for one profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredProfile {
    /// Saved settings, `None` when the profile has never been saved
    pub settings: Option<ProfileSettings>,
    /// Owned items, newest first
    pub items: Vec<Item>,
}

/// Read/write operations the waitlist core needs from its backing store.
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// Loads a profile's settings and all of its items, newest first.
    async fn load_all(&self, profile: &str) -> Result<StoredProfile>;

    /// Names of every saved profile, alphabetically.
    async fn list_profiles(&self) -> Result<Vec<String>>;

    /// Creates or fully replaces a profile's settings.
    async fn upsert_profile(&self, profile: &str, settings: &ProfileSettings) -> Result<()>;

    /// Moves a profile and all of its items to a new name.
    ///
    /// Fails with a conflict when `to` already exists.
    async fn rename_profile(&self, from: &str, to: &str) -> Result<()>;

    /// Removes a profile and all of its items.
    async fn delete_profile(&self, profile: &str) -> Result<()>;

    /// Stores a new item and returns its assigned ID. `item.id` is ignored.
    async fn insert_item(&self, profile: &str, item: &Item) -> Result<i64>;

    /// Replaces every stored field of an existing item.
    async fn update_item(&self, profile: &str, item: &Item) -> Result<()>;

    /// Changes only the status of an item.
    async fn update_item_status(&self, profile: &str, id: i64, status: ItemStatus) -> Result<()>;

    /// Records that the ready notification for an item was attempted.
    async fn mark_notification_attempted(&self, profile: &str, id: i64) -> Result<()>;

    /// Removes an item.
    async fn delete_item(&self, profile: &str, id: i64) -> Result<()>;
}
