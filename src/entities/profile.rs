//! Profile entity - one row of settings per named profile.
//!
//! The name is the primary key; items point at it through `profile_name`.

use crate::core::wait::WaitPreset;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// Profile name, unique
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    /// Hourly wage exactly as entered
    pub hourly_wage: String,
    /// Currency symbol
    pub currency: String,
    /// Default wait preset for new items
    pub default_wait_preset: WaitPreset,
    /// Default custom hours, empty unless the preset is `custom`
    pub default_wait_custom_hours: String,
    /// ntfy server base URL
    pub ntfy_endpoint: String,
    /// ntfy topic
    pub ntfy_topic: String,
    /// Last settings save
    pub updated_at: DateTimeWithTimeZone,
}

/// Items reference profiles by name without a foreign key, so a rename can
/// repoint both tables inside one transaction in any order.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
