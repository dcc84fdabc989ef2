use std::path::Path;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Connect to the registry database and synchronize the schema.
///
/// Idempotent: syncing an already-created schema is a no-op, so this is safe
/// to call repeatedly (every process start goes through here). For file-backed
/// SQLite URLs the parent directory is created on first use.
pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    ensure_parent_dir(db_url)?;

    let mut opt = ConnectOptions::new(db_url.to_owned());
    opt.max_connections(16)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("registry::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

fn ensure_parent_dir(db_url: &str) -> Result<(), DbErr> {
    let Some(path) = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
    else {
        return Ok(());
    };
    if path.starts_with(':') {
        // sqlite::memory: and friends
        return Ok(());
    }
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbErr::Custom(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
    }
    Ok(())
}
