use sea_orm::entity::prelude::*;

use crate::types::{ProjectGroup, ProjectStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub code: String,
    pub name: String,
    pub client: String,
    pub group: ProjectGroup,
    pub status: ProjectStatus,
    pub start_date: Date,
    pub end_date: Date,
    pub drive_folder_url: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
