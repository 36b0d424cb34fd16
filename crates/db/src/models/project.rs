use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entities::project,
    types::{ProjectGroup, ProjectStatus},
};

/// Fallback sequence hint used when no project has been stored yet.
pub const DEFAULT_CODE_SEQUENCE: u32 = 2167;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Project not found")]
    NotFound,
    #[error("A project with code '{0}' already exists")]
    DuplicateCode(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub client: String,
    pub group: ProjectGroup,
    pub status: ProjectStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub drive_folder_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub code: String,
    pub name: String,
    pub client: String,
    pub group: ProjectGroup,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSortField {
    #[default]
    CreatedAt,
    Name,
    Client,
    StartDate,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Listing options. Defaults to every project, newest first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    /// Case-insensitive substring match over name and client.
    pub q: Option<String>,
    #[serde(default)]
    pub sort: ProjectSortField,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Project {
    fn from_model(model: project::Model) -> Self {
        Self {
            id: model.uuid,
            code: model.code,
            name: model.name,
            client: model.client,
            group: model.group,
            status: model.status,
            start_date: model.start_date,
            end_date: model.end_date,
            drive_folder_url: model.drive_folder_url,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn count<C: ConnectionTrait>(db: &C) -> Result<i64, DbErr> {
        let count = project::Entity::find().count(db).await?;
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    pub async fn find_all<C: ConnectionTrait>(
        db: &C,
        filter: &ProjectFilter,
    ) -> Result<Vec<Self>, DbErr> {
        let mut query = project::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(project::Column::Status.eq(status));
        }

        if let Some(text) = filter.q.as_deref() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                let pattern = format!("%{}%", trimmed.to_lowercase());
                query = query.filter(
                    Condition::any()
                        .add(
                            Expr::expr(Func::lower(Expr::col((
                                project::Entity,
                                project::Column::Name,
                            ))))
                            .like(pattern.clone()),
                        )
                        .add(
                            Expr::expr(Func::lower(Expr::col((
                                project::Entity,
                                project::Column::Client,
                            ))))
                            .like(pattern),
                        ),
                );
            }
        }

        let column = match filter.sort {
            ProjectSortField::CreatedAt => project::Column::CreatedAt,
            ProjectSortField::Name => project::Column::Name,
            ProjectSortField::Client => project::Column::Client,
            ProjectSortField::StartDate => project::Column::StartDate,
        };
        query = match filter.direction {
            SortDirection::Asc => query.order_by_asc(column),
            SortDirection::Desc => query.order_by_desc(column),
        };

        let records = query.all(db).await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_uuid<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_code<C: ConnectionTrait>(
        db: &C,
        code: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = project::Entity::find()
            .filter(project::Column::Code.eq(code))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Highest leading 4-digit sequence among stored codes. Codes all share
    /// the `NNNN.` prefix, so the lexicographic maximum carries it.
    pub async fn last_code_sequence<C: ConnectionTrait>(db: &C) -> Result<Option<u32>, DbErr> {
        let record = project::Entity::find()
            .order_by_desc(project::Column::Code)
            .one(db)
            .await?;
        Ok(record.and_then(|m| m.code.get(..4).and_then(|s| s.parse().ok())))
    }

    /// Uniqueness of the code is enforced by the unique index, not by a
    /// read-then-write check.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateProject,
        project_id: Uuid,
    ) -> Result<Self, ProjectError> {
        let now = Utc::now();
        let active = project::ActiveModel {
            uuid: Set(project_id),
            code: Set(data.code.clone()),
            name: Set(data.name.clone()),
            client: Set(data.client.clone()),
            group: Set(data.group),
            status: Set(ProjectStatus::Draft),
            start_date: Set(data.start_date),
            end_date: Set(data.end_date),
            drive_folder_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        match active.insert(db).await {
            Ok(model) => Ok(Self::from_model(model)),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(ProjectError::DuplicateCode(data.code.clone()))
                }
                _ => Err(ProjectError::Database(err)),
            },
        }
    }

    pub async fn update_status<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        status: ProjectStatus,
    ) -> Result<Self, ProjectError> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(ProjectError::NotFound)?;

        let mut active: project::ActiveModel = record.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    /// Idempotent: storing the url a second time skips the write entirely.
    pub async fn set_drive_folder_url<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        url: &str,
    ) -> Result<(), ProjectError> {
        let record = project::Entity::find()
            .filter(project::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(ProjectError::NotFound)?;

        if record.drive_folder_url.as_deref() == Some(url) {
            return Ok(());
        }

        let mut active: project::ActiveModel = record.into();
        active.drive_folder_url = Set(Some(url.to_string()));
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use uuid::Uuid;

    use super::{
        CreateProject, Project, ProjectError, ProjectFilter, ProjectSortField, SortDirection,
    };
    use crate::types::{ProjectGroup, ProjectStatus};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn payload(code: &str, name: &str, client: &str) -> CreateProject {
        CreateProject {
            code: code.to_string(),
            name: name.to_string(),
            client: client.to_string(),
            group: ProjectGroup::Left,
            start_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_code() {
        let db = setup_db().await;

        let first = Project::create(&db, &payload("2168.MED.mediq", "МедIQ", "МедIQ Clinic"), Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(first.code, "2168.MED.mediq");
        assert_eq!(first.status, ProjectStatus::Draft);

        let err = Project::create(&db, &payload("2168.MED.mediq", "Other", "Other Co"), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::DuplicateCode(code) if code == "2168.MED.mediq"));

        assert_eq!(Project::count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn set_drive_folder_url_is_idempotent() {
        let db = setup_db().await;
        let project = Project::create(&db, &payload("2169.ACM.acme", "Acme", "Acme Corp"), Uuid::new_v4())
            .await
            .unwrap();

        let url = "https://drive.google.com/drive/folders/abc";
        Project::set_drive_folder_url(&db, project.id, url)
            .await
            .unwrap();
        let first = Project::find_by_uuid(&db, project.id).await.unwrap().unwrap();

        Project::set_drive_folder_url(&db, project.id, url)
            .await
            .unwrap();
        let second = Project::find_by_uuid(&db, project.id).await.unwrap().unwrap();

        assert_eq!(second.drive_folder_url.as_deref(), Some(url));
        // The repeated call is a no-op, it does not even bump updated_at.
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn set_drive_folder_url_unknown_project() {
        let db = setup_db().await;
        let err = Project::set_drive_folder_url(&db, Uuid::new_v4(), "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectError::NotFound));
    }

    #[tokio::test]
    async fn find_all_filters_status_and_text() {
        let db = setup_db().await;

        let acme = Project::create(&db, &payload("2170.ACM.acme", "Acme rollout", "Acme Corp"), Uuid::new_v4())
            .await
            .unwrap();
        Project::create(&db, &payload("2171.GLB.globex", "Globex audit", "Globex"), Uuid::new_v4())
            .await
            .unwrap();
        let acme_two =
            Project::create(&db, &payload("2172.ACM.acme-hr", "HR strategy", "ACME Holding"), Uuid::new_v4())
                .await
                .unwrap();

        Project::update_status(&db, acme.id, ProjectStatus::Active)
            .await
            .unwrap();
        Project::update_status(&db, acme_two.id, ProjectStatus::Active)
            .await
            .unwrap();

        let filter = ProjectFilter {
            status: Some(ProjectStatus::Active),
            q: Some("acme".to_string()),
            sort: ProjectSortField::Name,
            direction: SortDirection::Asc,
        };
        let found = Project::find_all(&db, &filter).await.unwrap();

        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Acme rollout", "HR strategy"]);
    }

    #[tokio::test]
    async fn last_code_sequence_tracks_highest_code() {
        let db = setup_db().await;
        assert_eq!(Project::last_code_sequence(&db).await.unwrap(), None);

        Project::create(&db, &payload("2170.ACM.acme", "A", "A"), Uuid::new_v4())
            .await
            .unwrap();
        Project::create(&db, &payload("2168.MED.mediq", "B", "B"), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(Project::last_code_sequence(&db).await.unwrap(), Some(2170));
    }
}
