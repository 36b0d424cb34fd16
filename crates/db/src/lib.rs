use std::time::Duration;

use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use utils::assets::asset_dir;

pub use db_migration::Migrator;
pub use sea_orm::{DatabaseConnection, DbErr};

pub mod catalog;
pub mod entities;
pub mod models;
pub mod types;

pub type DbPool = DatabaseConnection;

#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "sqlite://{}?mode=rwc",
                asset_dir().join("db.sqlite").to_string_lossy()
            )
        });

        let mut options = ConnectOptions::new(database_url);
        options
            .max_connections(5)
            .connect_timeout(Duration::from_secs(30))
            .sqlx_logging(false);

        let pool = Database::connect(options).await?;
        Migrator::up(&pool, None).await?;

        models::methodology::Methodology::seed(&pool).await?;
        let catalog_rows = models::methodology::Methodology::count(&pool).await?;
        tracing::debug!(catalog_rows, "methodology catalog ready");

        Ok(DBService { pool })
    }
}
