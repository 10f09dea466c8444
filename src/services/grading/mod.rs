pub mod assignment;
pub mod calibration;
pub mod export;
pub mod leaderboard;
pub mod lifecycle;
pub mod locks;
pub mod next_question;
pub mod skip;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::config::GradingConfig;
use crate::errors::GradeSystemError;
use crate::models::auth::entities::{AuthenticatedUser, UserRole};
use crate::models::grading::requests::{
    EventQuery, LeaderboardQuery, SkipRequest, SubmitAnswerRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use locks::LockRegistry;

pub struct GradingService {
    storage: Option<Arc<dyn Storage>>,
    pub(crate) locks: LockRegistry,
}

impl GradingService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            locks: LockRegistry::new(),
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_grading_config(&self, request: &HttpRequest) -> Arc<GradingConfig> {
        request
            .app_data::<actix_web::web::Data<Arc<GradingConfig>>>()
            .expect("GradingConfig not found in app data")
            .get_ref()
            .clone()
    }

    pub(crate) fn get_cache(&self, request: &HttpRequest) -> Arc<dyn ObjectCache> {
        request
            .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
            .expect("Cache not found in app data")
            .get_ref()
            .clone()
    }

    /// 获取下一题（校准题或正式文书）
    pub async fn next_question(
        &self,
        request: &HttpRequest,
        query: EventQuery,
    ) -> ActixResult<HttpResponse> {
        next_question::next_question(self, request, query).await
    }

    /// 提交答案（校准答案或正式评分）
    pub async fn submit_answer(
        &self,
        request: &HttpRequest,
        req: SubmitAnswerRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit_answer(self, request, req).await
    }

    /// 跳过当前题
    pub async fn skip_current(
        &self,
        request: &HttpRequest,
        req: SkipRequest,
    ) -> ActixResult<HttpResponse> {
        skip::skip_current(self, request, req).await
    }

    /// 评分排行榜
    pub async fn leaderboard(
        &self,
        request: &HttpRequest,
        query: LeaderboardQuery,
    ) -> ActixResult<HttpResponse> {
        leaderboard::leaderboard(self, request, query).await
    }

    /// 评分报表导出
    pub async fn export_report(
        &self,
        request: &HttpRequest,
        query: EventQuery,
    ) -> ActixResult<HttpResponse> {
        export::export_report(self, request, query).await
    }
}

/// 提取当前评审用户；未认证或角色不足时返回错误响应
pub(crate) fn require_judge(request: &HttpRequest) -> Result<AuthenticatedUser, HttpResponse> {
    let user = match crate::middlewares::RequireJWT::extract_user(request) {
        Some(user) => user,
        None => {
            return Err(HttpResponse::Unauthorized()
                .json(ApiResponse::error_empty(ErrorCode::Unauthorized, "未登录")));
        }
    };
    if !UserRole::judge_roles().contains(&&user.role) {
        return Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "只有评审可以访问评分接口",
        )));
    }
    Ok(user)
}

/// 存储/引擎错误到 HTTP 响应的统一映射
///
/// Conflict 一律 409 并提示重新拉取下一题，保证并发输家拿到明确信号。
pub(crate) fn error_response(err: &GradeSystemError) -> HttpResponse {
    match err {
        GradeSystemError::Conflict(_) => HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::GraderStateConflict,
            format!("{}，请重新获取下一题", err.message()),
        )),
        GradeSystemError::NotFound(_) => HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::NotFound,
            err.message().to_string(),
        )),
        GradeSystemError::Validation(_) => HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::BadRequest, err.message().to_string()),
        ),
        GradeSystemError::Configuration(_) => HttpResponse::InternalServerError().json(
            ApiResponse::error_empty(ErrorCode::GradingConfigError, err.message().to_string()),
        ),
        _ => HttpResponse::InternalServerError().json(ApiResponse::error_empty(
            ErrorCode::InternalServerError,
            format!("内部错误: {err}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheResult;
    use crate::config::grading::tests::test_config;
    use crate::entity::applications::ActiveModel as ApplicationActiveModel;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use actix_web::HttpMessage;
    use actix_web::test::TestRequest;
    use actix_web::web;
    use async_trait::async_trait;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};

    /// 测试用空缓存：永远未命中，写入丢弃
    struct NoopCache;

    #[async_trait]
    impl ObjectCache for NoopCache {
        async fn get_raw(&self, _key: &str) -> CacheResult<String> {
            CacheResult::NotFound
        }
        async fn insert_raw(&self, _key: String, _value: String, _ttl: u64) {}
        async fn remove(&self, _key: &str) {}
        async fn invalidate_all(&self) {}
    }

    struct TestHarness {
        service: GradingService,
        storage: Arc<SeaOrmStorage>,
        config: Arc<GradingConfig>,
        cache: Arc<dyn ObjectCache>,
    }

    impl TestHarness {
        async fn new() -> Self {
            let mut opt = ConnectOptions::new("sqlite::memory:");
            opt.max_connections(1).sqlx_logging(false);
            let db = Database::connect(opt).await.expect("connect sqlite");
            Migrator::up(&db, None).await.expect("run migrations");

            Self {
                service: GradingService::new_lazy(),
                storage: Arc::new(SeaOrmStorage { db }),
                config: Arc::new(test_config()),
                cache: Arc::new(NoopCache),
            }
        }

        /// 构造带认证用户和依赖注入的请求
        fn request(&self, user_id: i64, email: &str) -> actix_web::HttpRequest {
            let request = TestRequest::default()
                .app_data(web::Data::new(self.storage.clone() as Arc<dyn Storage>))
                .app_data(web::Data::new(self.config.clone()))
                .app_data(web::Data::new(self.cache.clone()))
                .to_http_request();
            request.extensions_mut().insert(AuthenticatedUser {
                id: user_id,
                email: email.to_string(),
                role: UserRole::Judge,
            });
            request
        }

        async fn seed_application(&self, event_id: i64, branch: &str, essays: &[(&str, &str)]) {
            let essays_json = serde_json::to_string(
                &essays
                    .iter()
                    .map(|(id, criterion)| {
                        serde_json::json!({"id": id, "criterion": criterion, "answer": "essay text"})
                    })
                    .collect::<Vec<_>>(),
            )
            .unwrap();
            let now = chrono::Utc::now().timestamp();
            let model = ApplicationActiveModel {
                event_id: Set(event_id),
                branch: Set(branch.to_string()),
                school: Set("Test University".to_string()),
                applicant_email: Set("applicant@example.com".to_string()),
                status: Set("submitted".to_string()),
                essays: Set(essays_json),
                grading_complete: Set(false),
                final_score: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            model.insert(&self.storage.db).await.unwrap();
        }
    }

    async fn body_json(resp: HttpResponse) -> serde_json::Value {
        let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn submit_request(
        event_id: i64,
        is_calibration: bool,
        score: i32,
        application_id: Option<i64>,
        essay_id: Option<&str>,
    ) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            event_id,
            is_calibration,
            score,
            application_id,
            essay_id: essay_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_first_request_starts_calibration_in_fixed_order() {
        let harness = TestHarness::new().await;
        let request = harness.request(7, "judge@example.com");

        let resp = harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["is_calibration"], true);
        assert_eq!(json["data"]["grading_group"], "general");
        assert_eq!(json["data"]["calibration"]["question_id"], "gen-1");

        // 没有提交答案，重复请求必须返回同一道题
        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["calibration"]["question_id"], "gen-1");
    }

    #[tokio::test]
    async fn test_allowlisted_email_starts_in_its_group() {
        let harness = TestHarness::new().await;
        let request = harness.request(8, "vip@corp.example.com");

        let resp = harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["grading_group"], "sponsor");
        assert_eq!(json["data"]["calibration"]["question_id"], "spo-1");
    }

    #[tokio::test]
    async fn test_real_review_rejected_while_calibrating() {
        let harness = TestHarness::new().await;
        harness.seed_application(1, "general", &[("e1", "passion")]).await;

        // 创建评分员（处于校准阶段）
        let request = harness.request(7, "judge@example.com");
        harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();

        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .submit_answer(&request, submit_request(1, false, 3, Some(1), Some("e1")))
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["code"], ErrorCode::CalibrationIncomplete as i32);
    }

    #[tokio::test]
    async fn test_full_flow_calibration_then_adjusted_review() {
        let harness = TestHarness::new().await;
        harness.seed_application(1, "general", &[("e1", "passion")]).await;

        // 第一次请求创建评分员并给出校准题
        let request = harness.request(7, "judge@example.com");
        harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();

        // 答完两道校准题（答案与标准分一致 → 恒等修正表）
        for score in [2, 4] {
            let request = harness.request(7, "judge@example.com");
            let resp = harness
                .service
                .submit_answer(&request, submit_request(1, true, score, None, None))
                .await
                .unwrap();
            assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        }

        // 校准完成后不能再提交校准答案
        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .submit_answer(&request, submit_request(1, true, 3, None, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["code"], ErrorCode::CalibrationAlreadyComplete as i32);

        // 现在拿到的是正式文书
        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["is_calibration"], false);
        assert_eq!(json["data"]["essay"]["essay_id"], "e1");

        // 提交评分，恒等修正表下修正分等于原始分
        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .submit_answer(&request, submit_request(1, false, 3, Some(1), Some("e1")))
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["adjusted_score"], 3.0);

        // 同一评分员重复评同一篇 → 409
        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .submit_answer(&request, submit_request(1, false, 2, Some(1), Some("e1")))
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_no_essays_rotates_then_exhausts() {
        let harness = TestHarness::new().await;
        // 不投放任何报名表

        let request = harness.request(7, "judge@example.com");
        harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();

        // general 校准完成
        for score in [2, 4] {
            let request = harness.request(7, "judge@example.com");
            harness
                .service
                .submit_answer(&request, submit_request(1, true, score, None, None))
                .await
                .unwrap();
        }

        // general 没有文书 → 轮换进 sponsor，要求重新校准
        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["is_calibration"], true);
        assert_eq!(json["data"]["grading_group"], "sponsor");

        // sponsor 校准完成
        let request = harness.request(7, "judge@example.com");
        harness
            .service
            .submit_answer(&request, submit_request(1, true, 3, None, None))
            .await
            .unwrap();

        // sponsor 也没有文书，没有分组可轮换 → EXHAUSTED，而不是死循环
        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["data"]["exhausted"], true);

        // 耗尽后提交任何答案都被拒绝
        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .submit_answer(&request, submit_request(1, true, 3, None, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_second_review_completes_application() {
        let harness = TestHarness::new().await;
        harness.seed_application(1, "general", &[("e1", "passion")]).await;

        for (user_id, score) in [(7, 2), (8, 4)] {
            let request = harness.request(user_id, "judge@example.com");
            harness
                .service
                .next_question(&request, EventQuery { event_id: 1 })
                .await
                .unwrap();
            for calibration_score in [2, 4] {
                let request = harness.request(user_id, "judge@example.com");
                harness
                    .service
                    .submit_answer(
                        &request,
                        submit_request(1, true, calibration_score, None, None),
                    )
                    .await
                    .unwrap();
            }
            let request = harness.request(user_id, "judge@example.com");
            let resp = harness
                .service
                .submit_answer(&request, submit_request(1, false, score, Some(1), Some("e1")))
                .await
                .unwrap();
            let json = body_json(resp).await;
            let expected_completed = user_id == 8;
            assert_eq!(json["data"]["application_completed"], expected_completed);
        }

        // 完成后的报名表退出分派池：第三位评分员直接耗尽
        let app = harness.storage.get_application(1).await.unwrap().unwrap();
        assert!(app.grading_complete);
        assert_eq!(app.final_score, Some(3.0));
    }

    #[tokio::test]
    async fn test_score_out_of_range_rejected() {
        let harness = TestHarness::new().await;
        let request = harness.request(7, "judge@example.com");

        let resp = harness
            .service
            .submit_answer(&request, submit_request(1, true, 5, None, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["code"], ErrorCode::ScoreOutOfRange as i32);
    }

    #[tokio::test]
    async fn test_skip_only_touches_counter() {
        let harness = TestHarness::new().await;
        harness.seed_application(1, "general", &[("e1", "passion")]).await;

        let request = harness.request(7, "judge@example.com");
        harness
            .service
            .next_question(&request, EventQuery { event_id: 1 })
            .await
            .unwrap();

        let request = harness.request(7, "judge@example.com");
        let resp = harness
            .service
            .skip_current(&request, SkipRequest { event_id: 1 })
            .await
            .unwrap();
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

        let grader = harness.storage.get_grader(7, 1).await.unwrap().unwrap();
        assert_eq!(grader.skipped, 1);
        assert_eq!(grader.graded, 0);
        // 文书仍在分派池里
        let counts = harness.storage.count_reviews_by_essay(1).await.unwrap();
        assert!(counts.is_empty());
    }
}
