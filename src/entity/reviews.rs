//! 评分记录实体

use sea_orm::entity::prelude::*;

use crate::models::reviews::entities::Review;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub application_id: i64,
    pub essay_id: String,
    pub reviewer_id: i64,
    pub criterion: String,
    pub raw_score: i32,
    pub adjusted_score: f64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::applications::Entity",
        from = "Column::ApplicationId",
        to = "super::applications::Column::Id"
    )]
    Application,
}

impl Related<super::applications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Application.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_review(self) -> Review {
        Review {
            id: self.id,
            event_id: self.event_id,
            application_id: self.application_id,
            essay_id: self.essay_id,
            reviewer_id: self.reviewer_id,
            criterion: self.criterion,
            raw_score: self.raw_score,
            adjusted_score: self.adjusted_score,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
