//! 报名表实体（文书以 JSON 内嵌）

use std::str::FromStr;

use sea_orm::entity::prelude::*;

use crate::errors::{GradeSystemError, Result as SysResult};
use crate::models::applications::entities::{Application, ApplicationStatus, Essay};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub branch: String,
    pub school: String,
    pub applicant_email: String,
    pub status: String,
    #[sea_orm(column_type = "Text")]
    pub essays: String,
    pub grading_complete: bool,
    pub final_score: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_application(self) -> SysResult<Application> {
        let status = ApplicationStatus::from_str(&self.status)
            .map_err(GradeSystemError::serialization)?;
        let essays: Vec<Essay> = serde_json::from_str(&self.essays)
            .map_err(|e| GradeSystemError::serialization(format!("解析 essays 失败: {e}")))?;

        Ok(Application {
            id: self.id,
            event_id: self.event_id,
            branch: self.branch,
            school: self.school,
            applicant_email: self.applicant_email,
            status,
            essays,
            grading_complete: self.grading_complete,
            final_score: self.final_score,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: chrono::DateTime::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
