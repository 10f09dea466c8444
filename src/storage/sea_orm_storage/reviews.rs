//! 评分记录存储操作
//!
//! 写入走单事务：唯一索引挡重复评分，事务内重新计数挡评满上限，
//! 条件更新保证报名表完成标志恰好翻转一次。

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::config::MAX_REVIEWS_PER_ESSAY;
use crate::entity::applications::{Column as ApplicationColumn, Entity as Applications};
use crate::entity::graders::{Column as GraderColumn, Entity as Graders};
use crate::entity::reviews::{ActiveModel, Column, Entity as Reviews};
use crate::errors::{GradeSystemError, Result};
use crate::models::applications::entities::ApplicationStatus;
use crate::models::reviews::entities::{NewReview, Review, ReviewOutcome, mean_of_essay_means};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, SqlErr, TransactionTrait,
};

impl SeaOrmStorage {
    /// 某评分员在某赛事的全部评分记录
    pub async fn list_reviews_by_reviewer_impl(
        &self,
        reviewer_id: i64,
        event_id: i64,
    ) -> Result<Vec<Review>> {
        let models = Reviews::find()
            .filter(Column::ReviewerId.eq(reviewer_id))
            .filter(Column::EventId.eq(event_id))
            .all(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("查询评分记录失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_review()).collect())
    }

    /// 赛事全部评分记录（报表用）
    pub async fn list_reviews_by_event_impl(&self, event_id: i64) -> Result<Vec<Review>> {
        let models = Reviews::find()
            .filter(Column::EventId.eq(event_id))
            .all(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("查询评分记录失败: {e}")))?;

        Ok(models.into_iter().map(|m| m.into_review()).collect())
    }

    /// 赛事内每篇文书的评分数
    pub async fn count_reviews_by_essay_impl(&self, event_id: i64) -> Result<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = Reviews::find()
            .select_only()
            .column(Column::EssayId)
            .column_as(Column::Id.count(), "review_count")
            .filter(Column::EventId.eq(event_id))
            .group_by(Column::EssayId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("统计评分数失败: {e}")))?;

        Ok(rows.into_iter().collect())
    }

    /// 事务内写入评分
    ///
    /// 失败路径（重复评分 / 评满 / 报名表不可评）一律回滚，
    /// 调用方收到 Conflict 后应重新拉取下一题。
    pub async fn submit_review_impl(&self, review: NewReview) -> Result<ReviewOutcome> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("开启事务失败: {e}")))?;

        // 报名表必须存在且处于待评审状态
        let application = Applications::find_by_id(review.application_id)
            .one(&txn)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("查询报名表失败: {e}")))?
            .ok_or_else(|| GradeSystemError::not_found("报名表不存在"))?
            .into_application()?;

        if application.status != ApplicationStatus::Submitted {
            return Err(GradeSystemError::validation(format!(
                "报名表当前状态为 {}，不可评分",
                application.status
            )));
        }
        if application.essay(&review.essay_id).is_none() {
            return Err(GradeSystemError::not_found(format!(
                "报名表 {} 中不存在文书 {}",
                review.application_id, review.essay_id
            )));
        }

        // 插入评分记录，(essay_id, reviewer_id) 唯一索引挡并发重复
        let model = ActiveModel {
            event_id: Set(review.event_id),
            application_id: Set(review.application_id),
            essay_id: Set(review.essay_id.clone()),
            reviewer_id: Set(review.reviewer_id),
            criterion: Set(review.criterion.clone()),
            raw_score: Set(review.raw_score),
            adjusted_score: Set(review.adjusted_score),
            created_at: Set(now),
            ..Default::default()
        };

        let inserted = match model.insert(&txn).await {
            Ok(m) => m,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(GradeSystemError::conflict(format!(
                    "评分员 {} 已评过文书 {}",
                    review.reviewer_id, review.essay_id
                )));
            }
            Err(e) => {
                return Err(GradeSystemError::database_operation(format!(
                    "写入评分失败: {e}"
                )));
            }
        };

        // 事务内重新计数（含本条），超出上限整体回滚
        let essay_review_count = Reviews::find()
            .filter(Column::EssayId.eq(review.essay_id.as_str()))
            .count(&txn)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("统计评分数失败: {e}")))?
            as i64;

        if essay_review_count > MAX_REVIEWS_PER_ESSAY {
            txn.rollback()
                .await
                .map_err(|e| GradeSystemError::database_operation(format!("回滚失败: {e}")))?;
            return Err(GradeSystemError::conflict(format!(
                "文书 {} 已评满 {MAX_REVIEWS_PER_ESSAY} 份",
                review.essay_id
            )));
        }

        // 恰好评满时翻转完成标志；条件更新保证只翻转一次
        let mut application_completed = false;
        let mut completed_final_score = None;
        if essay_review_count == MAX_REVIEWS_PER_ESSAY {
            let review_models = Reviews::find()
                .filter(Column::ApplicationId.eq(review.application_id))
                .all(&txn)
                .await
                .map_err(|e| {
                    GradeSystemError::database_operation(format!("查询评分记录失败: {e}"))
                })?;

            let final_score = mean_of_essay_means(
                review_models
                    .iter()
                    .map(|m| (m.essay_id.as_str(), m.adjusted_score)),
            )
            .ok_or_else(|| GradeSystemError::database_operation("完成评分时评分记录为空"))?;

            let updated = Applications::update_many()
                .col_expr(ApplicationColumn::GradingComplete, Expr::value(true))
                .col_expr(ApplicationColumn::FinalScore, Expr::value(Some(final_score)))
                .col_expr(ApplicationColumn::UpdatedAt, Expr::value(now))
                .filter(ApplicationColumn::Id.eq(review.application_id))
                .filter(ApplicationColumn::GradingComplete.eq(false))
                .exec(&txn)
                .await
                .map_err(|e| {
                    GradeSystemError::database_operation(format!("更新报名表失败: {e}"))
                })?;

            if updated.rows_affected > 0 {
                application_completed = true;
                completed_final_score = Some(final_score);
            }
        }

        // 评分员计数自增
        Graders::update_many()
            .col_expr(GraderColumn::Graded, Expr::col(GraderColumn::Graded).add(1))
            .col_expr(GraderColumn::UpdatedAt, Expr::value(now))
            .filter(GraderColumn::UserId.eq(review.reviewer_id))
            .filter(GraderColumn::EventId.eq(review.event_id))
            .exec(&txn)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("更新评分计数失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(ReviewOutcome {
            review: inserted.into_review(),
            application_completed,
            completed_final_score,
        })
    }
}
