//! 评分员实体
//!
//! completed_grading_groups / calibration_scores / calibration_mapping
//! 以 JSON 文本列存储，读取时反序列化为业务实体。

use sea_orm::entity::prelude::*;

use crate::errors::{GradeSystemError, Result as SysResult};
use crate::models::graders::entities::{CalibrationScore, CriterionMapping, Grader};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "graders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub graded: i64,
    pub skipped: i64,
    pub current_grading_group: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub completed_grading_groups: String,
    #[sea_orm(column_type = "Text")]
    pub calibration_scores: String,
    #[sea_orm(column_type = "Text")]
    pub calibration_mapping: String,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_grader(self) -> SysResult<Grader> {
        let completed_grading_groups: Vec<String> =
            serde_json::from_str(&self.completed_grading_groups).map_err(|e| {
                GradeSystemError::serialization(format!("解析 completed_grading_groups 失败: {e}"))
            })?;
        let calibration_scores: Vec<CalibrationScore> =
            serde_json::from_str(&self.calibration_scores).map_err(|e| {
                GradeSystemError::serialization(format!("解析 calibration_scores 失败: {e}"))
            })?;
        let calibration_mapping: Vec<CriterionMapping> =
            serde_json::from_str(&self.calibration_mapping).map_err(|e| {
                GradeSystemError::serialization(format!("解析 calibration_mapping 失败: {e}"))
            })?;

        Ok(Grader {
            id: self.id,
            user_id: self.user_id,
            event_id: self.event_id,
            graded: self.graded,
            skipped: self.skipped,
            current_grading_group: self.current_grading_group,
            completed_grading_groups,
            calibration_scores,
            calibration_mapping,
            version: self.version,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: chrono::DateTime::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        })
    }
}
