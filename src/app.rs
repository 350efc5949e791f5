//! The waitlist core: owns the active profile's items and serialises every
//! read and write through one lock.
//!
//! Each operation runs the promotion sweep first, under the same lock, so no
//! caller ever sees a `Waiting` item whose time has passed. Reminders queued by
//! a sweep are handed to the [`Dispatcher`] only after the lock is released.

use crate::{
    core::{
        dashboard::{Dashboard, DashboardQuery},
        insights::Insights,
        item::{Item, ItemForm},
        profile::{ProfileForm, ProfileSettings, ProfileSnapshot, ProfileUpdate},
        status::{self, Decision, ItemStatus},
        wait::Timestamp,
    },
    errors::{Error, Result},
    notify::{Dispatcher, Notification},
    store::WaitlistStore,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

const MISSING_PROFILE_NAME: &str = "Please enter a profile name.";
const LAST_PROFILE: &str = "The last remaining profile cannot be deleted.";

/// In-memory state of the active profile.
#[derive(Debug)]
struct ActiveProfile {
    name: String,
    settings: ProfileSettings,
    items: Vec<Item>,
}

impl ActiveProfile {
    fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            name: self.name.clone(),
            settings: self.settings.clone(),
            is_configured: !self.settings.hourly_wage.trim().is_empty(),
        }
    }

    fn needs_sweep(&self, now: Timestamp) -> bool {
        self.items
            .iter()
            .any(|item| status::should_promote(item.status, item.eligible_at, now))
    }

    fn position(&self, id: i64) -> Result<usize> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or(Error::ItemNotFound { id })
    }
}

async fn open_profile(store: &dyn WaitlistStore, name: &str) -> Result<ActiveProfile> {
    let stored = store.load_all(name).await?;
    let settings = match stored.settings {
        Some(settings) => settings,
        None => {
            let settings = ProfileSettings::default();
            store.upsert_profile(name, &settings).await?;
            info!(profile = name, "created profile");
            settings
        }
    };

    Ok(ActiveProfile {
        name: name.to_string(),
        settings,
        items: stored.items,
    })
}

/// The application core shared by request handlers and the scheduler.
pub struct App {
    state: RwLock<ActiveProfile>,
    store: Arc<dyn WaitlistStore>,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Opens `profile` from `store`, creating it with default settings when
    /// it does not exist yet.
    pub async fn new(
        store: Arc<dyn WaitlistStore>,
        dispatcher: Dispatcher,
        profile: &str,
    ) -> Result<Self> {
        let name = profile.trim();
        if name.is_empty() {
            return Err(Error::validation(MISSING_PROFILE_NAME));
        }
        let active = open_profile(store.as_ref(), name).await?;
        info!(profile = name, items = active.items.len(), "opened profile");

        Ok(Self {
            state: RwLock::new(active),
            store,
            dispatcher,
        })
    }

    /// Promotes every elapsed `Waiting` item, persisting each change and
    /// queueing at most one reminder per item.
    ///
    /// Store failures are logged; the in-memory state stays authoritative.
    async fn sweep_locked(
        &self,
        state: &mut ActiveProfile,
        now: Timestamp,
    ) -> Vec<Notification> {
        let ActiveProfile {
            name,
            settings,
            items,
        } = state;
        let mut outbox = Vec::new();

        for item in items
            .iter_mut()
            .filter(|item| status::should_promote(item.status, item.eligible_at, now))
        {
            item.status = ItemStatus::ReadyToBuy;
            info!(profile = %name, item_id = item.id, "item ready to buy");
            if let Err(e) = self
                .store
                .update_item_status(name, item.id, ItemStatus::ReadyToBuy)
                .await
            {
                error!(
                    profile = %name, item_id = item.id, error = %e,
                    "failed to persist promotion"
                );
            }

            if item.notification_attempted {
                continue;
            }
            item.notification_attempted = true;
            if let Err(e) = self.store.mark_notification_attempted(name, item.id).await {
                error!(
                    profile = %name, item_id = item.id, error = %e,
                    "failed to persist notification attempt"
                );
            }
            if let Some(notification) = self.dispatcher.prepare(item, settings) {
                outbox.push(notification);
            }
        }

        outbox
    }

    /// Runs the promotion sweep on its own. Returns how many items were promoted.
    pub async fn promote_ready(&self, now: Timestamp) -> usize {
        let mut state = self.state.write().await;
        let waiting = |items: &[Item]| {
            items
                .iter()
                .filter(|i| i.status == ItemStatus::Waiting)
                .count()
        };
        let before = waiting(&state.items);
        let outbox = self.sweep_locked(&mut state, now).await;
        let after = waiting(&state.items);
        drop(state);

        self.dispatcher.dispatch(outbox);
        before - after
    }

    /// Sweeps, then returns a copy of the active profile's items.
    async fn snapshot(&self, now: Timestamp) -> (ProfileSnapshot, Vec<Item>) {
        {
            let state = self.state.read().await;
            if !state.needs_sweep(now) {
                return (state.snapshot(), state.items.clone());
            }
        }

        let mut state = self.state.write().await;
        let outbox = self.sweep_locked(&mut state, now).await;
        let snapshot = (state.snapshot(), state.items.clone());
        drop(state);

        self.dispatcher.dispatch(outbox);
        snapshot
    }

    /// Items of the active profile, newest first.
    pub async fn items(&self, now: Timestamp) -> Vec<Item> {
        self.snapshot(now).await.1
    }

    /// One item of the active profile.
    pub async fn item(&self, id: i64, now: Timestamp) -> Result<Item> {
        self.snapshot(now)
            .await
            .1
            .into_iter()
            .find(|item| item.id == id)
            .ok_or(Error::ItemNotFound { id })
    }

    /// The dashboard view for `query`.
    pub async fn dashboard(&self, query: &DashboardQuery, now: Timestamp) -> Dashboard {
        let (profile, items) = self.snapshot(now).await;
        Dashboard::build(&items, &profile.settings, query)
    }

    /// The insights view.
    pub async fn insights(&self, now: Timestamp) -> Insights {
        Insights::build(&self.snapshot(now).await.1)
    }

    /// Adds an item. A blank wait preset takes the profile default.
    #[instrument(skip(self, form), fields(title = %form.title.trim()))]
    pub async fn create_item(&self, form: &ItemForm, now: Timestamp) -> Result<Item> {
        let mut state = self.state.write().await;
        let outbox = self.sweep_locked(&mut state, now).await;
        let result = self.create_locked(&mut state, form, now).await;
        drop(state);

        self.dispatcher.dispatch(outbox);
        result
    }

    async fn create_locked(
        &self,
        state: &mut ActiveProfile,
        form: &ItemForm,
        now: Timestamp,
    ) -> Result<Item> {
        let draft = form.validate(Some(&state.settings.default_wait), now)?;
        let mut item = Item::from_draft(draft, now);
        item.id = self.store.insert_item(&state.name, &item).await?;

        debug!(item_id = item.id, status = item.status.label(), "item created");
        state.items.insert(0, item.clone());
        Ok(item)
    }

    /// Replaces every field of an item from an edit form.
    #[instrument(skip(self, form))]
    pub async fn update_item(&self, id: i64, form: &ItemForm, now: Timestamp) -> Result<Item> {
        let mut state = self.state.write().await;
        let outbox = self.sweep_locked(&mut state, now).await;
        let result = self.update_locked(&mut state, id, form, now).await;
        drop(state);

        self.dispatcher.dispatch(outbox);
        result
    }

    async fn update_locked(
        &self,
        state: &mut ActiveProfile,
        id: i64,
        form: &ItemForm,
        now: Timestamp,
    ) -> Result<Item> {
        let index = state.position(id)?;
        let draft = form.validate(None, now)?;
        let edited = state.items[index].edited(draft, now);
        self.store.update_item(&state.name, &edited).await?;

        debug!(item_id = id, status = edited.status.label(), "item updated");
        state.items[index] = edited.clone();
        Ok(edited)
    }

    /// Records a buy/skip decision for a ready item.
    #[instrument(skip(self))]
    pub async fn set_status(&self, id: i64, decision: Decision, now: Timestamp) -> Result<Item> {
        let mut state = self.state.write().await;
        let outbox = self.sweep_locked(&mut state, now).await;
        let result = self.set_status_locked(&mut state, id, decision).await;
        drop(state);

        self.dispatcher.dispatch(outbox);
        result
    }

    async fn set_status_locked(
        &self,
        state: &mut ActiveProfile,
        id: i64,
        decision: Decision,
    ) -> Result<Item> {
        let index = state.position(id)?;
        let next = status::decide(state.items[index].status, decision)?;
        self.store.update_item_status(&state.name, id, next).await?;

        state.items[index].status = next;
        Ok(state.items[index].clone())
    }

    /// Defers a ready item by a day and re-arms its reminder. `preset` is the
    /// snooze selection; only `24h` (or blank) is accepted.
    #[instrument(skip(self))]
    pub async fn snooze(&self, id: i64, preset: &str, now: Timestamp) -> Result<Item> {
        let mut state = self.state.write().await;
        let outbox = self.sweep_locked(&mut state, now).await;
        let result = self.snooze_locked(&mut state, id, preset, now).await;
        drop(state);

        self.dispatcher.dispatch(outbox);
        result
    }

    async fn snooze_locked(
        &self,
        state: &mut ActiveProfile,
        id: i64,
        preset: &str,
        now: Timestamp,
    ) -> Result<Item> {
        let preset = status::parse_snooze_preset(preset)?;
        let index = state.position(id)?;
        let current = &state.items[index];
        let snoozed = Item {
            eligible_at: status::snooze(current.status, current.eligible_at, now)?,
            status: ItemStatus::Waiting,
            notification_attempted: false,
            ..current.clone()
        };
        self.store.update_item(&state.name, &snoozed).await?;

        debug!(
            item_id = id, preset = preset.as_str(), until = %snoozed.eligible_at,
            "item snoozed"
        );
        state.items[index] = snoozed.clone();
        Ok(snoozed)
    }

    /// Removes an item regardless of its status.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i64, now: Timestamp) -> Result<()> {
        let mut state = self.state.write().await;
        let outbox = self.sweep_locked(&mut state, now).await;
        let result = self.delete_locked(&mut state, id).await;
        drop(state);

        self.dispatcher.dispatch(outbox);
        result
    }

    async fn delete_locked(&self, state: &mut ActiveProfile, id: i64) -> Result<()> {
        let index = state.position(id)?;
        self.store.delete_item(&state.name, id).await?;
        state.items.remove(index);
        Ok(())
    }

    /// The active profile's name and settings.
    pub async fn profile(&self) -> ProfileSnapshot {
        self.state.read().await.snapshot()
    }

    /// Every saved profile name, alphabetically. The active profile is always
    /// among them.
    pub async fn profiles(&self) -> Result<Vec<String>> {
        self.store.list_profiles().await
    }

    /// Makes `name` the active profile, creating it with default settings when
    /// it does not exist yet.
    #[instrument(skip(self))]
    pub async fn switch_profile(&self, name: &str, now: Timestamp) -> Result<ProfileSnapshot> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation(MISSING_PROFILE_NAME));
        }

        let mut state = self.state.write().await;
        let mut outbox = self.sweep_locked(&mut state, now).await;
        let result = self.switch_locked(&mut state, name).await;
        if result.is_ok() {
            outbox.extend(self.sweep_locked(&mut state, now).await);
        }
        drop(state);

        self.dispatcher.dispatch(outbox);
        result
    }

    async fn switch_locked(
        &self,
        state: &mut ActiveProfile,
        name: &str,
    ) -> Result<ProfileSnapshot> {
        let next = open_profile(self.store.as_ref(), name).await?;
        info!(from = %state.name, to = name, items = next.items.len(), "switched profile");
        *state = next;
        Ok(state.snapshot())
    }

    /// Saves the settings form, renaming the active profile when the form
    /// carries a different name.
    #[instrument(skip(self, form))]
    pub async fn save_profile(
        &self,
        form: &ProfileForm,
        now: Timestamp,
    ) -> Result<ProfileSnapshot> {
        let update = form.validate()?;

        let mut state = self.state.write().await;
        let outbox = self.sweep_locked(&mut state, now).await;
        let result = self.save_profile_locked(&mut state, update).await;
        drop(state);

        self.dispatcher.dispatch(outbox);
        result
    }

    async fn save_profile_locked(
        &self,
        state: &mut ActiveProfile,
        update: ProfileUpdate,
    ) -> Result<ProfileSnapshot> {
        if let Some(new_name) = update.name.filter(|n| *n != state.name) {
            self.store.rename_profile(&state.name, &new_name).await?;
            info!(from = %state.name, to = %new_name, "renamed profile");
            state.name = new_name;
        }
        self.store
            .upsert_profile(&state.name, &update.settings)
            .await?;
        state.settings = update.settings;
        Ok(state.snapshot())
    }

    /// Deletes a profile and its items. Deleting the active profile switches
    /// to the first remaining one; the last profile cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete_profile(&self, name: &str, now: Timestamp) -> Result<ProfileSnapshot> {
        let name = name.trim();
        let mut state = self.state.write().await;
        let mut outbox = self.sweep_locked(&mut state, now).await;
        let result = self.delete_profile_locked(&mut state, name).await;
        if result.is_ok() {
            outbox.extend(self.sweep_locked(&mut state, now).await);
        }
        drop(state);

        self.dispatcher.dispatch(outbox);
        result
    }

    async fn delete_profile_locked(
        &self,
        state: &mut ActiveProfile,
        name: &str,
    ) -> Result<ProfileSnapshot> {
        let profiles = self.store.list_profiles().await?;
        if !profiles.iter().any(|p| p == name) {
            return Err(Error::ProfileNotFound {
                name: name.to_string(),
            });
        }
        let Some(fallback) = profiles.into_iter().find(|p| p != name) else {
            return Err(Error::conflict(LAST_PROFILE));
        };

        self.store.delete_profile(name).await?;
        info!(profile = name, "deleted profile");

        if state.name == name {
            info!(to = %fallback, "switched to remaining profile");
            *state = open_profile(self.store.as_ref(), &fallback).await?;
        }
        Ok(state.snapshot())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{item::ItemForm, wait::WaitPreset},
        notify::Notifier,
        store::{MemoryStore, SqliteStore},
        test_utils::{
            FlakyStore, HangingNotifier, RecordingNotifier, init_test_tracing, item_form,
            reference_now, settle, setup_test_db,
        },
    };
    use chrono::TimeDelta;
    use std::time::Duration;
    use tokio::time::timeout;

    const DASHBOARD: &str = "http://localhost:8080";

    async fn app_with(store: Arc<dyn WaitlistStore>, notifier: &Arc<RecordingNotifier>) -> App {
        init_test_tracing();
        let notifier = Arc::clone(notifier) as Arc<dyn Notifier>;
        App::new(store, Dispatcher::new(notifier, DASHBOARD), "default")
            .await
            .unwrap()
    }

    async fn memory_app(notifier: &Arc<RecordingNotifier>) -> App {
        app_with(Arc::new(MemoryStore::new()), notifier).await
    }

    fn ntfy_form() -> ProfileForm {
        ProfileForm {
            hourly_wage: "25".to_string(),
            notify_endpoint: "https://ntfy.example.com".to_string(),
            notify_topic: "wishlist".to_string(),
            ..ProfileForm::default()
        }
    }

    #[tokio::test]
    async fn test_bike_light_end_to_end() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        app.save_profile(&ntfy_form(), now).await?;

        let item = app.create_item(&item_form("Bike light"), now).await?;
        assert_eq!(item.status, ItemStatus::Waiting);
        let dashboard = app.dashboard(&DashboardQuery::default(), now).await;
        assert_eq!(dashboard.rows[0].item.title, "Bike light");

        let later = now + TimeDelta::hours(24) + TimeDelta::seconds(1);
        assert_eq!(app.promote_ready(later).await, 1);
        settle().await;

        let item = app.item(item.id, later).await?;
        assert_eq!(item.status, ItemStatus::ReadyToBuy);
        assert!(item.notification_attempted);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].message,
            "Bike light is now ready to buy.\nDashboard: http://localhost:8080/"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reminder_is_sent_once_across_sweeps_and_reads() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::failing());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        app.save_profile(&ntfy_form(), now).await?;
        app.create_item(&item_form("Desk"), now).await?;

        let later = now + TimeDelta::days(2);
        app.promote_ready(later).await;
        app.promote_ready(later).await;
        app.dashboard(&DashboardQuery::default(), later).await;
        app.insights(later + TimeDelta::hours(1)).await;
        settle().await;

        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(app.promote_ready(later).await, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_hanging_endpoint_does_not_hold_the_lock() -> Result<()> {
        init_test_tracing();
        let notifier = Arc::new(HangingNotifier::default());
        let dispatcher = Dispatcher::new(Arc::clone(&notifier) as Arc<dyn Notifier>, DASHBOARD);
        let app = App::new(Arc::new(MemoryStore::new()), dispatcher, "default").await?;
        let now = reference_now();
        app.save_profile(&ntfy_form(), now).await?;
        let item = app.create_item(&item_form("Desk"), now).await?;

        let later = now + TimeDelta::days(2);
        assert_eq!(app.promote_ready(later).await, 1);
        settle().await;
        assert_eq!(notifier.started(), 1);

        let items = timeout(Duration::from_secs(1), app.items(later))
            .await
            .unwrap();
        assert_eq!(items[0].status, ItemStatus::ReadyToBuy);
        let decided = timeout(
            Duration::from_secs(1),
            app.set_status(item.id, Decision::Bought, later),
        )
        .await
        .unwrap()?;
        assert_eq!(decided.status, ItemStatus::Bought);
        Ok(())
    }

    #[tokio::test]
    async fn test_sweep_write_failures_keep_memory_state() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = app_with(Arc::new(FlakyStore::default()), &notifier).await;
        let now = reference_now();
        app.save_profile(&ntfy_form(), now).await?;
        let item = app.create_item(&item_form("Monitor"), now).await?;

        let later = now + TimeDelta::days(2);
        assert_eq!(app.promote_ready(later).await, 1);
        assert_eq!(app.promote_ready(later).await, 0);
        settle().await;

        let item = app.item(item.id, later).await?;
        assert_eq!(item.status, ItemStatus::ReadyToBuy);
        assert!(item.notification_attempted);
        assert_eq!(notifier.sent().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_promote_without_scheduler() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        let item = app.create_item(&item_form("Lamp"), now).await?;

        let items = app.items(now + TimeDelta::hours(25)).await;
        assert_eq!(items[0].status, ItemStatus::ReadyToBuy);
        // No ntfy target configured: attempt recorded, nothing sent.
        assert!(items[0].notification_attempted);
        settle().await;
        assert!(notifier.sent().is_empty());
        assert_eq!(app.item(item.id, now).await?.status, ItemStatus::ReadyToBuy);
        Ok(())
    }

    #[tokio::test]
    async fn test_mutations_sweep_first() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        let item = app.create_item(&item_form("Headphones"), now).await?;

        // Deciding right after the wait works without an explicit sweep.
        let later = now + TimeDelta::hours(24);
        let decided = app.set_status(item.id, Decision::Skipped, later).await?;
        assert_eq!(decided.status, ItemStatus::Skipped);

        let err = app
            .set_status(item.id, Decision::Bought, later)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "status transition not allowed");
        assert_eq!(app.item(item.id, later).await?.status, ItemStatus::Skipped);
        Ok(())
    }

    #[tokio::test]
    async fn test_decisions_from_waiting_are_conflicts() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        let item = app.create_item(&item_form("Watch"), now).await?;

        let err = app.set_status(item.id, Decision::Bought, now).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        let err = app.snooze(item.id, "24h", now).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        assert!(matches!(
            app.set_status(999, Decision::Bought, now).await.unwrap_err(),
            Error::ItemNotFound { id: 999 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_snooze_rearms_a_single_new_reminder() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        app.save_profile(&ntfy_form(), now).await?;
        let item = app.create_item(&item_form("Tent"), now).await?;

        let ready_at = now + TimeDelta::hours(30);
        app.promote_ready(ready_at).await;
        let err = app.snooze(item.id, "7d", ready_at).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(app.item(item.id, ready_at).await?.status, ItemStatus::ReadyToBuy);

        let snoozed = app.snooze(item.id, "24h", ready_at).await?;
        assert_eq!(snoozed.status, ItemStatus::Waiting);
        assert!(!snoozed.notification_attempted);
        assert_eq!(snoozed.eligible_at, ready_at + TimeDelta::hours(24));

        app.promote_ready(ready_at + TimeDelta::hours(23)).await;
        settle().await;
        assert_eq!(notifier.sent().len(), 1);

        app.promote_ready(ready_at + TimeDelta::hours(24)).await;
        app.promote_ready(ready_at + TimeDelta::hours(48)).await;
        settle().await;
        assert_eq!(notifier.sent().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_validation_errors_leave_state_untouched() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        let item = app.create_item(&item_form("Chair"), now).await?;

        let err = app.create_item(&item_form("  "), now).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a title.");
        let bad_edit = ItemForm {
            wait_preset: "custom".to_string(),
            wait_custom_hours: "-2".to_string(),
            ..item_form("Chair v2")
        };
        assert!(app.update_item(item.id, &bad_edit, now).await.is_err());

        let items = app.items(now).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], item);
        Ok(())
    }

    #[tokio::test]
    async fn test_profile_default_wait_applies_to_new_items() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        app.save_profile(
            &ProfileForm {
                default_wait_preset: "7d".to_string(),
                ..ProfileForm::default()
            },
            now,
        )
        .await?;

        let item = app.create_item(&item_form("Camera"), now).await?;
        assert_eq!(item.wait.preset, WaitPreset::Days7);
        assert_eq!(item.eligible_at, now + TimeDelta::days(7));

        // Edits treat a blank preset as one day.
        let edited = app.update_item(item.id, &item_form("Camera"), now).await?;
        assert_eq!(edited.eligible_at, now + TimeDelta::hours(24));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_reopens_skipped_item_with_new_wait() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        let item = app.create_item(&item_form("Original"), now).await?;
        let later = now + TimeDelta::hours(25);
        app.set_status(item.id, Decision::Skipped, later).await?;

        let title_only = app.update_item(item.id, &item_form("Renamed"), later).await?;
        assert_eq!(title_only.status, ItemStatus::Skipped);

        let reopen = ItemForm {
            wait_preset: "custom".to_string(),
            wait_custom_hours: "5".to_string(),
            ..item_form("Renamed")
        };
        let reopened = app.update_item(item.id, &reopen, later).await?;
        assert_eq!(reopened.status, ItemStatus::Waiting);
        assert!(!reopened.notification_attempted);
        assert_eq!(reopened.eligible_at, later + TimeDelta::hours(5));
        Ok(())
    }

    #[tokio::test]
    async fn test_work_hours_follow_wage() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        app.save_profile(&ntfy_form(), now).await?;
        app.create_item(
            &ItemForm {
                price: "100".to_string(),
                ..item_form("Shoes")
            },
            now,
        )
        .await?;

        let query = DashboardQuery::default();
        let dashboard = app.dashboard(&query, now).await;
        assert_eq!(dashboard.rows[0].work_hours.as_deref(), Some("4.0"));

        for wage in ["0", ""] {
            app.save_profile(
                &ProfileForm {
                    hourly_wage: wage.to_string(),
                    ..ntfy_form()
                },
                now,
            )
            .await?;
            let dashboard = app.dashboard(&query, now).await;
            assert_eq!(dashboard.rows[0].work_hours, None, "wage {wage:?}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_saved_total_counts_priced_skips_only() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        let later = now + TimeDelta::hours(25);

        for (title, price, decision) in [
            ("Console", "300", Decision::Skipped),
            ("Gift", "about 20", Decision::Skipped),
            ("Mouse", "25", Decision::Bought),
        ] {
            let form = ItemForm {
                price: price.to_string(),
                ..item_form(title)
            };
            let item = app.create_item(&form, now).await?;
            app.set_status(item.id, decision, later).await?;
        }

        let insights = app.insights(later).await;
        assert_eq!(insights.saved_total, 300.0);
        assert_eq!(insights.skipped_count, 2);
        assert_eq!(insights.item_count, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        let item = app.create_item(&item_form("Kettle"), now).await?;

        app.delete_item(item.id, now).await?;
        assert!(app.items(now).await.is_empty());
        assert!(matches!(
            app.delete_item(item.id, now).await.unwrap_err(),
            Error::ItemNotFound { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_profiles_switch_rename_and_delete() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let app = memory_app(&notifier).await;
        let now = reference_now();
        app.create_item(&item_form("Default item"), now).await?;
        assert!(!app.profile().await.is_configured);

        let sam = app.switch_profile("sam", now).await?;
        assert_eq!(sam.name, "sam");
        assert!(app.items(now).await.is_empty());
        app.create_item(&item_form("Sam item"), now).await?;
        assert_eq!(app.profiles().await?, vec!["default", "sam"]);

        let renamed = app
            .save_profile(
                &ProfileForm {
                    name: "robin".to_string(),
                    ..ntfy_form()
                },
                now,
            )
            .await?;
        assert_eq!(renamed.name, "robin");
        assert!(renamed.is_configured);
        assert_eq!(app.profiles().await?, vec!["default", "robin"]);
        assert_eq!(app.items(now).await[0].title, "Sam item");

        let clash = app
            .save_profile(
                &ProfileForm {
                    name: "default".to_string(),
                    ..ntfy_form()
                },
                now,
            )
            .await
            .unwrap_err();
        assert!(matches!(clash, Error::Conflict { .. }));
        assert_eq!(app.profile().await.name, "robin");

        let fallback = app.delete_profile("robin", now).await?;
        assert_eq!(fallback.name, "default");
        assert_eq!(app.items(now).await[0].title, "Default item");

        let last = app.delete_profile("default", now).await.unwrap_err();
        assert!(matches!(last, Error::Conflict { .. }));
        let missing = app.delete_profile("nobody", now).await.unwrap_err();
        assert!(matches!(missing, Error::ProfileNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_backed_app_reloads_state() -> Result<()> {
        let notifier = Arc::new(RecordingNotifier::new());
        let db = setup_test_db().await?;
        let now = reference_now();

        let app = app_with(Arc::new(SqliteStore::new(db.clone())), &notifier).await;
        app.save_profile(&ntfy_form(), now).await?;
        let item = app.create_item(&item_form("Bike light"), now).await?;
        app.promote_ready(now + TimeDelta::hours(24)).await;
        settle().await;

        let reopened = app_with(Arc::new(SqliteStore::new(db)), &notifier).await;
        let items = reopened.items(now + TimeDelta::hours(24)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, item.id);
        assert_eq!(items[0].status, ItemStatus::ReadyToBuy);
        assert!(items[0].notification_attempted);
        assert_eq!(reopened.profile().await.settings.hourly_wage, "25");

        reopened.promote_ready(now + TimeDelta::days(3)).await;
        settle().await;
        assert_eq!(notifier.sent().len(), 1);
        Ok(())
    }
}
