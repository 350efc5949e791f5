//! Database configuration module.
//!
//! Handles `SQLite` connection setup and table creation using `SeaORM`. Tables
//! are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! models. Creation is idempotent and runs on every start.

use crate::entities::{Item, ItemColumn, Profile};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, Schema,
    sea_query::{Index, IndexCreateStatement},
};
use std::path::Path;
use tracing::info;

/// Opens a connection to `database_url`.
///
/// For `sqlite://` file URLs the parent directory is created first and the
/// file is opened in read-write-create mode.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    let url = prepare_sqlite_url(database_url)?;
    Database::connect(&url).await.map_err(Into::into)
}

/// Opens a connection and makes sure all tables and indexes exist.
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection> {
    let db = create_connection(database_url).await?;
    create_tables(&db).await?;
    info!("database ready");
    Ok(db)
}

fn prepare_sqlite_url(database_url: &str) -> Result<String> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(database_url.to_string());
    };
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    if path.is_empty() || path == ":memory:" {
        return Ok(database_url.to_string());
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    Ok(if query.contains("mode=") {
        database_url.to_string()
    } else if query.is_empty() {
        format!("sqlite://{path}?mode=rwc")
    } else {
        format!("sqlite://{path}?{query}&mode=rwc")
    })
}

fn item_indexes() -> [IndexCreateStatement; 2] {
    [
        Index::create()
            .name("idx_items_profile_name")
            .table(Item)
            .col(ItemColumn::ProfileName)
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_items_status_allowed")
            .table(Item)
            .col(ItemColumn::Status)
            .col(ItemColumn::PurchaseAllowedAt)
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates the `profiles` and `items` tables plus the item indexes.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let profile_table = schema.create_table_from_entity(Profile).if_not_exists().to_owned();
    let item_table = schema.create_table_from_entity(Item).if_not_exists().to_owned();

    db.execute(builder.build(&profile_table)).await?;
    db.execute(builder.build(&item_table)).await?;
    for index in item_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    Ok(())
}
