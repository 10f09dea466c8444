//! 报名表存储操作

use super::SeaOrmStorage;
use crate::entity::applications::{Column, Entity as Applications};
use crate::errors::{GradeSystemError, Result};
use crate::models::applications::entities::{Application, ApplicationStatus};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

impl SeaOrmStorage {
    /// 通过 ID 获取报名表
    pub async fn get_application_impl(&self, application_id: i64) -> Result<Option<Application>> {
        let result = Applications::find_by_id(application_id)
            .one(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("查询报名表失败: {e}")))?;

        result.map(|m| m.into_application()).transpose()
    }

    /// 列出可评分的报名表
    ///
    /// 过滤条件：指定分支、已提交待评审、尚未完成评分。
    /// 文书级别的评满/去重过滤在分派引擎里做。
    pub async fn list_gradable_applications_impl(
        &self,
        event_id: i64,
        branches: &[String],
    ) -> Result<Vec<Application>> {
        if branches.is_empty() {
            return Ok(vec![]);
        }

        let models = Applications::find()
            .filter(Column::EventId.eq(event_id))
            .filter(Column::Branch.is_in(branches.iter().map(String::as_str)))
            .filter(Column::Status.eq(ApplicationStatus::SUBMITTED))
            .filter(Column::GradingComplete.eq(false))
            .all(&self.db)
            .await
            .map_err(|e| {
                GradeSystemError::database_operation(format!("查询可评分报名表失败: {e}"))
            })?;

        models.into_iter().map(|m| m.into_application()).collect()
    }

    /// 列出赛事全部报名表（报表用，只读）
    pub async fn list_applications_by_event_impl(&self, event_id: i64) -> Result<Vec<Application>> {
        let models = Applications::find()
            .filter(Column::EventId.eq(event_id))
            .all(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("查询报名表失败: {e}")))?;

        models.into_iter().map(|m| m.into_application()).collect()
    }
}
