//! `SeaORM`-backed store. Tables are created by
//! [`crate::config::database::create_tables`].

use super::{PROFILE_EXISTS, StoredProfile, WaitlistStore};
use crate::{
    core::{
        item::Item,
        profile::ProfileSettings,
        status::ItemStatus,
        wait::{self, WaitSpec},
    },
    entities::{Item as ItemEntity, Profile, item, profile},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{
    ActiveValue::NotSet, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::OnConflict,
};
use tracing::{debug, instrument};

/// [`WaitlistStore`] over a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn settings_from_model(model: profile::Model) -> ProfileSettings {
    ProfileSettings {
        hourly_wage: model.hourly_wage,
        currency: model.currency,
        default_wait: WaitSpec::new(model.default_wait_preset, model.default_wait_custom_hours),
        notify_endpoint: model.ntfy_endpoint,
        notify_topic: model.ntfy_topic,
    }
}

fn item_from_model(model: item::Model) -> Item {
    Item {
        id: model.id,
        title: model.title,
        price: model.price,
        price_value: model.price_value.filter(|_| model.has_price_value),
        link: model.link,
        note: model.note,
        tags: model.tags,
        status: model.status,
        wait: WaitSpec::new(model.wait_preset, model.wait_custom_hours),
        eligible_at: model.purchase_allowed_at,
        created_at: model.created_at,
        notification_attempted: model.ntfy_attempted,
    }
}

/// Active model carrying every mutable column of `item`. ID and owner are left
/// unset so the same model serves inserts and filtered updates.
fn item_columns(item: &Item) -> item::ActiveModel {
    item::ActiveModel {
        id: NotSet,
        profile_name: NotSet,
        title: Set(item.title.clone()),
        price: Set(item.price.clone()),
        price_value: Set(item.price_value),
        has_price_value: Set(item.price_value.is_some()),
        link: Set(item.link.clone()),
        note: Set(item.note.clone()),
        tags: Set(item.tags.clone()),
        status: Set(item.status),
        wait_preset: Set(item.wait.preset),
        wait_custom_hours: Set(item.wait.custom_hours.clone()),
        purchase_allowed_at: Set(item.eligible_at),
        created_at: Set(item.created_at),
        ntfy_attempted: Set(item.notification_attempted),
    }
}

impl SqliteStore {
    async fn patch_item(&self, profile: &str, id: i64, columns: item::ActiveModel) -> Result<()> {
        let result = ItemEntity::update_many()
            .set(columns)
            .filter(item::Column::Id.eq(id))
            .filter(item::Column::ProfileName.eq(profile))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(Error::ItemNotFound { id });
        }
        Ok(())
    }
}

#[async_trait]
impl WaitlistStore for SqliteStore {
    #[instrument(skip(self))]
    async fn load_all(&self, profile: &str) -> Result<StoredProfile> {
        let settings = Profile::find_by_id(profile.to_string())
            .one(&self.db)
            .await?
            .map(settings_from_model);

        let mut items: Vec<Item> = ItemEntity::find()
            .filter(item::Column::ProfileName.eq(profile))
            .order_by_desc(item::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(item_from_model)
            .collect();
        // Stored timestamps may carry different offsets, so order by instant here.
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(items = items.len(), found = settings.is_some(), "loaded profile");
        Ok(StoredProfile { settings, items })
    }

    async fn list_profiles(&self) -> Result<Vec<String>> {
        Ok(Profile::find()
            .order_by_asc(profile::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|model| model.name)
            .collect())
    }

    #[instrument(skip(self, settings))]
    async fn upsert_profile(&self, profile: &str, settings: &ProfileSettings) -> Result<()> {
        let row = profile::ActiveModel {
            name: Set(profile.to_string()),
            hourly_wage: Set(settings.hourly_wage.clone()),
            currency: Set(settings.currency.clone()),
            default_wait_preset: Set(settings.default_wait.preset),
            default_wait_custom_hours: Set(settings.default_wait.custom_hours.clone()),
            ntfy_endpoint: Set(settings.notify_endpoint.clone()),
            ntfy_topic: Set(settings.notify_topic.clone()),
            updated_at: Set(wait::current_time()),
        };

        Profile::insert(row)
            .on_conflict(
                OnConflict::column(profile::Column::Name)
                    .update_columns([
                        profile::Column::HourlyWage,
                        profile::Column::Currency,
                        profile::Column::DefaultWaitPreset,
                        profile::Column::DefaultWaitCustomHours,
                        profile::Column::NtfyEndpoint,
                        profile::Column::NtfyTopic,
                        profile::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn rename_profile(&self, from: &str, to: &str) -> Result<()> {
        let txn = self.db.begin().await?;

        if Profile::find_by_id(to.to_string()).one(&txn).await?.is_some() {
            return Err(Error::conflict(PROFILE_EXISTS));
        }

        Profile::update_many()
            .col_expr(profile::Column::Name, Expr::value(to))
            .filter(profile::Column::Name.eq(from))
            .exec(&txn)
            .await?;
        ItemEntity::update_many()
            .col_expr(item::Column::ProfileName, Expr::value(to))
            .filter(item::Column::ProfileName.eq(from))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_profile(&self, profile: &str) -> Result<()> {
        let txn = self.db.begin().await?;
        ItemEntity::delete_many()
            .filter(item::Column::ProfileName.eq(profile))
            .exec(&txn)
            .await?;
        Profile::delete_by_id(profile.to_string()).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self, item), fields(title = %item.title))]
    async fn insert_item(&self, profile: &str, item: &Item) -> Result<i64> {
        let row = item::ActiveModel {
            profile_name: Set(profile.to_string()),
            ..item_columns(item)
        };
        Ok(row.insert(&self.db).await?.id)
    }

    #[instrument(skip(self, item), fields(id = item.id))]
    async fn update_item(&self, profile: &str, item: &Item) -> Result<()> {
        self.patch_item(profile, item.id, item_columns(item)).await
    }

    #[instrument(skip(self))]
    async fn update_item_status(&self, profile: &str, id: i64, status: ItemStatus) -> Result<()> {
        let columns = item::ActiveModel {
            status: Set(status),
            ..Default::default()
        };
        self.patch_item(profile, id, columns).await
    }

    #[instrument(skip(self))]
    async fn mark_notification_attempted(&self, profile: &str, id: i64) -> Result<()> {
        let columns = item::ActiveModel {
            ntfy_attempted: Set(true),
            ..Default::default()
        };
        self.patch_item(profile, id, columns).await
    }

    #[instrument(skip(self))]
    async fn delete_item(&self, profile: &str, id: i64) -> Result<()> {
        let result = ItemEntity::delete_many()
            .filter(item::Column::Id.eq(id))
            .filter(item::Column::ProfileName.eq(profile))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(Error::ItemNotFound { id });
        }
        Ok(())
    }
}
