//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod applications;
mod graders;
mod reviews;

use crate::config::AppConfig;
use crate::errors::{GradeSystemError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| GradeSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| GradeSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| GradeSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| GradeSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(GradeSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use std::collections::HashMap;

use crate::models::{
    applications::entities::Application,
    graders::entities::Grader,
    reviews::entities::{NewReview, Review, ReviewOutcome},
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 评分员模块
    async fn get_grader(&self, user_id: i64, event_id: i64) -> Result<Option<Grader>> {
        self.get_grader_impl(user_id, event_id).await
    }

    async fn create_grader(
        &self,
        user_id: i64,
        event_id: i64,
        initial_group: &str,
    ) -> Result<Grader> {
        self.create_grader_impl(user_id, event_id, initial_group)
            .await
    }

    async fn update_grader_state(&self, grader: &Grader) -> Result<Grader> {
        self.update_grader_state_impl(grader).await
    }

    async fn increment_grader_skipped(&self, user_id: i64, event_id: i64) -> Result<bool> {
        self.increment_grader_skipped_impl(user_id, event_id).await
    }

    async fn list_top_graders(&self, event_id: i64, limit: i64) -> Result<Vec<Grader>> {
        self.list_top_graders_impl(event_id, limit).await
    }

    // 报名表模块
    async fn get_application(&self, application_id: i64) -> Result<Option<Application>> {
        self.get_application_impl(application_id).await
    }

    async fn list_gradable_applications(
        &self,
        event_id: i64,
        branches: &[String],
    ) -> Result<Vec<Application>> {
        self.list_gradable_applications_impl(event_id, branches)
            .await
    }

    async fn list_applications_by_event(&self, event_id: i64) -> Result<Vec<Application>> {
        self.list_applications_by_event_impl(event_id).await
    }

    // 评分记录模块
    async fn list_reviews_by_reviewer(
        &self,
        reviewer_id: i64,
        event_id: i64,
    ) -> Result<Vec<Review>> {
        self.list_reviews_by_reviewer_impl(reviewer_id, event_id)
            .await
    }

    async fn list_reviews_by_event(&self, event_id: i64) -> Result<Vec<Review>> {
        self.list_reviews_by_event_impl(event_id).await
    }

    async fn count_reviews_by_essay(&self, event_id: i64) -> Result<HashMap<String, i64>> {
        self.count_reviews_by_essay_impl(event_id).await
    }

    async fn submit_review(&self, review: NewReview) -> Result<ReviewOutcome> {
        self.submit_review_impl(review).await
    }
}
