use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{
    applications::entities::Application,
    graders::entities::Grader,
    reviews::entities::{NewReview, Review, ReviewOutcome},
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 评分员管理方法
    // 获取评分员（一人一赛事一条）
    async fn get_grader(&self, user_id: i64, event_id: i64) -> Result<Option<Grader>>;
    // 懒创建评分员；并发撞上唯一索引时返回已存在的记录
    async fn create_grader(
        &self,
        user_id: i64,
        event_id: i64,
        initial_group: &str,
    ) -> Result<Grader>;
    // 乐观锁更新评分员状态（校准进度/修正表/分组轮换）；版本不匹配返回 Conflict
    async fn update_grader_state(&self, grader: &Grader) -> Result<Grader>;
    // 跳过计数自增
    async fn increment_grader_skipped(&self, user_id: i64, event_id: i64) -> Result<bool>;
    // 按 graded 降序取前 N 名
    async fn list_top_graders(&self, event_id: i64, limit: i64) -> Result<Vec<Grader>>;

    /// 报名表管理方法
    // 通过ID获取报名表
    async fn get_application(&self, application_id: i64) -> Result<Option<Application>>;
    // 列出可评分的报名表（指定分支、已提交、未完成评分）
    async fn list_gradable_applications(
        &self,
        event_id: i64,
        branches: &[String],
    ) -> Result<Vec<Application>>;
    // 列出赛事全部报名表（报表用）
    async fn list_applications_by_event(&self, event_id: i64) -> Result<Vec<Application>>;

    /// 评分记录管理方法
    // 某评分员在某赛事的全部评分记录
    async fn list_reviews_by_reviewer(&self, reviewer_id: i64, event_id: i64)
    -> Result<Vec<Review>>;
    // 赛事全部评分记录（报表用）
    async fn list_reviews_by_event(&self, event_id: i64) -> Result<Vec<Review>>;
    // 赛事内每篇文书的评分数
    async fn count_reviews_by_essay(&self, event_id: i64) -> Result<HashMap<String, i64>>;
    // 事务内写入评分：唯一约束去重、评满上限回滚、恰好评满时翻转报名表完成标志
    async fn submit_review(&self, review: NewReview) -> Result<ReviewOutcome>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
