//! Comment entity for both issue comments and pull request review comments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A comment belongs to exactly one issue or one pull request.
///
/// `issue_id` and `pull_request_id` hold the parent's per-repository *number*,
/// which is how the upstream addresses comment listings. Exactly one is set.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub repository_id: i64,
    pub issue_id: Option<i64>,
    pub pull_request_id: Option<i64>,

    pub author_login: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub created_at: Option<DateTimeWithTimeZone>,
    pub updated_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(column_type = "Json")]
    pub payload: serde_json::Value,
    pub collected_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
