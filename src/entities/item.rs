//! Item entity - one waitlist entry owned by a profile.
//!
//! Status and wait preset are stored as their display strings; both
//! timestamps keep the UTC offset they were resolved in.

use crate::core::{status::ItemStatus, wait::WaitPreset};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning profile
    pub profile_name: String,
    /// What the user wants to buy
    pub title: String,
    /// Price text as entered
    pub price: String,
    /// Parsed price, NULL when the text is not a positive number
    pub price_value: Option<f64>,
    /// Whether `price_value` is set
    pub has_price_value: bool,
    /// Product link
    pub link: String,
    /// Free-form note
    pub note: String,
    /// Comma-joined tags
    pub tags: String,
    /// `"Waiting"`, `"Ready to buy"`, `"Bought"` or `"Skipped"`
    pub status: ItemStatus,
    /// Wait preset the buy-after instant was computed from
    pub wait_preset: WaitPreset,
    /// Custom hours for the `custom` preset
    pub wait_custom_hours: String,
    /// Buy-after instant
    pub purchase_allowed_at: DateTimeWithTimeZone,
    /// When the item was added
    pub created_at: DateTimeWithTimeZone,
    /// Whether the ready-to-buy notification was already attempted
    pub ntfy_attempted: bool,
}

/// Items have no declared relations; see [`super::profile::Relation`].
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
