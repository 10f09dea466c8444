//! 评分员存储操作

use super::SeaOrmStorage;
use crate::entity::graders::{ActiveModel, Column, Entity as Graders};
use crate::errors::{GradeSystemError, Result};
use crate::models::graders::entities::Grader;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, SqlErr,
};

impl SeaOrmStorage {
    /// 按 (user_id, event_id) 获取评分员
    pub async fn get_grader_impl(&self, user_id: i64, event_id: i64) -> Result<Option<Grader>> {
        let result = Graders::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::EventId.eq(event_id))
            .one(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("查询评分员失败: {e}")))?;

        result.map(|m| m.into_grader()).transpose()
    }

    /// 懒创建评分员
    ///
    /// 并发请求同时创建时，输给唯一索引的一方直接返回已存在的记录；
    /// 初始分组由配置确定，两边算出的结果一致。
    pub async fn create_grader_impl(
        &self,
        user_id: i64,
        event_id: i64,
        initial_group: &str,
    ) -> Result<Grader> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            user_id: Set(user_id),
            event_id: Set(event_id),
            graded: Set(0),
            skipped: Set(0),
            current_grading_group: Set(Some(initial_group.to_string())),
            completed_grading_groups: Set("[]".to_string()),
            calibration_scores: Set("[]".to_string()),
            calibration_mapping: Set("[]".to_string()),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(inserted) => inserted.into_grader(),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .get_grader_impl(user_id, event_id)
                .await?
                .ok_or_else(|| {
                    GradeSystemError::database_operation("评分员创建冲突后查询不到记录")
                }),
            Err(e) => Err(GradeSystemError::database_operation(format!(
                "创建评分员失败: {e}"
            ))),
        }
    }

    /// 乐观锁更新评分员状态
    ///
    /// 只更新生命周期字段（分组/校准进度/修正表），计数器走独立的自增语句。
    /// grader.version 是读取时的版本，不匹配说明有并发修改，返回 Conflict。
    pub async fn update_grader_state_impl(&self, grader: &Grader) -> Result<Grader> {
        let completed = serde_json::to_string(&grader.completed_grading_groups)?;
        let scores = serde_json::to_string(&grader.calibration_scores)?;
        let mapping = serde_json::to_string(&grader.calibration_mapping)?;
        let now = chrono::Utc::now().timestamp();

        let result = Graders::update_many()
            .col_expr(
                Column::CurrentGradingGroup,
                Expr::value(grader.current_grading_group.clone()),
            )
            .col_expr(Column::CompletedGradingGroups, Expr::value(completed))
            .col_expr(Column::CalibrationScores, Expr::value(scores))
            .col_expr(Column::CalibrationMapping, Expr::value(mapping))
            .col_expr(Column::Version, Expr::value(grader.version + 1))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(grader.id))
            .filter(Column::Version.eq(grader.version))
            .exec(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("更新评分员失败: {e}")))?;

        if result.rows_affected == 0 {
            return Err(GradeSystemError::conflict(
                "评分员状态已被并发修改，请重新获取下一题",
            ));
        }

        let refreshed = Graders::find_by_id(grader.id)
            .one(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("查询评分员失败: {e}")))?
            .ok_or_else(|| GradeSystemError::not_found("评分员不存在"))?;

        refreshed.into_grader()
    }

    /// 跳过计数自增
    pub async fn increment_grader_skipped_impl(&self, user_id: i64, event_id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Graders::update_many()
            .col_expr(Column::Skipped, Expr::col(Column::Skipped).add(1))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::EventId.eq(event_id))
            .exec(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("更新跳过计数失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 排行榜：按 graded 降序
    pub async fn list_top_graders_impl(&self, event_id: i64, limit: i64) -> Result<Vec<Grader>> {
        let models = Graders::find()
            .filter(Column::EventId.eq(event_id))
            .order_by_desc(Column::Graded)
            .limit(limit as u64)
            .all(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("查询排行榜失败: {e}")))?;

        models.into_iter().map(|m| m.into_grader()).collect()
    }
}
