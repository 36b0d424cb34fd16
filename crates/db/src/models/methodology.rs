use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::Serialize;

use crate::{catalog::METHODOLOGY_CATALOG, entities::methodology, types::MethodologyCategory};

#[derive(Debug, Clone, Serialize)]
pub struct Methodology {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category: MethodologyCategory,
    pub description: Option<String>,
    pub typical_effort_hours: Option<i32>,
    pub requires_details: bool,
}

impl Methodology {
    fn from_model(model: methodology::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            category: model.category,
            description: model.description,
            typical_effort_hours: model.typical_effort_hours,
            requires_details: model.requires_details,
        }
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<i64, DbErr> {
        let count = methodology::Entity::find().count(db).await?;
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    /// Catalog order: mining first, then assembling, each in seed order.
    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = methodology::Entity::find()
            .order_by_desc(methodology::Column::Category)
            .order_by_asc(methodology::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    /// Upsert of the fixed catalog, keyed by name. Safe to run on every
    /// startup; re-running never duplicates rows.
    pub async fn seed<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
        for entry in METHODOLOGY_CATALOG {
            let active = methodology::ActiveModel {
                code: Set(entry.code.to_string()),
                name: Set(entry.name.to_string()),
                category: Set(entry.category),
                description: Set(Some(entry.description.to_string())),
                typical_effort_hours: Set(Some(entry.typical_effort_hours)),
                requires_details: Set(entry.requires_details),
                ..Default::default()
            };
            methodology::Entity::insert(active)
                .on_conflict(
                    OnConflict::column(methodology::Column::Name)
                        .update_columns([
                            methodology::Column::Code,
                            methodology::Column::Category,
                            methodology::Column::Description,
                            methodology::Column::TypicalEffortHours,
                            methodology::Column::RequiresDetails,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(db)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;

    use super::Methodology;
    use crate::types::MethodologyCategory;

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn seeding_twice_keeps_36_rows() {
        let db = setup_db().await;

        Methodology::seed(&db).await.unwrap();
        assert_eq!(Methodology::count(&db).await.unwrap(), 36);

        Methodology::seed(&db).await.unwrap();
        assert_eq!(Methodology::count(&db).await.unwrap(), 36);
    }

    #[tokio::test]
    async fn find_all_orders_mining_before_assembling() {
        let db = setup_db().await;
        Methodology::seed(&db).await.unwrap();

        let all = Methodology::find_all(&db).await.unwrap();
        assert_eq!(all.len(), 36);
        assert_eq!(all[0].code, "БПМ1");
        assert_eq!(all[0].category, MethodologyCategory::Mining);
        assert_eq!(all[11].code, "БПА1");
        assert_eq!(all[35].code, "БПА25");
    }
}
