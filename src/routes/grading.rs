use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::grading::requests::{
    EventQuery, LeaderboardQuery, SkipRequest, SubmitAnswerRequest,
};
use crate::services::GradingService;

// 懒加载的全局 GradingService 实例
static GRADING_SERVICE: Lazy<GradingService> = Lazy::new(GradingService::new_lazy);

// 获取下一题（校准题或正式文书）
pub async fn next_question(
    req: HttpRequest,
    query: web::Query<EventQuery>,
) -> ActixResult<HttpResponse> {
    GRADING_SERVICE.next_question(&req, query.into_inner()).await
}

// 提交答案
pub async fn submit_answer(
    req: HttpRequest,
    body: web::Json<SubmitAnswerRequest>,
) -> ActixResult<HttpResponse> {
    GRADING_SERVICE.submit_answer(&req, body.into_inner()).await
}

// 跳过当前题
pub async fn skip_current(
    req: HttpRequest,
    body: web::Json<SkipRequest>,
) -> ActixResult<HttpResponse> {
    GRADING_SERVICE.skip_current(&req, body.into_inner()).await
}

// 评分排行榜
pub async fn leaderboard(
    req: HttpRequest,
    query: web::Query<LeaderboardQuery>,
) -> ActixResult<HttpResponse> {
    GRADING_SERVICE.leaderboard(&req, query.into_inner()).await
}

// 评分报表导出（权限在业务层检查，仅管理员）
pub async fn export_report(
    req: HttpRequest,
    query: web::Query<EventQuery>,
) -> ActixResult<HttpResponse> {
    GRADING_SERVICE.export_report(&req, query.into_inner()).await
}

// 配置路由
pub fn configure_grading_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/grading")
            .wrap(middlewares::RequireJWT)
            // 取题/交卷/跳过 - 评审角色，业务层校验
            .route("/next", web::get().to(next_question))
            .route("/submit", web::post().to(submit_answer))
            .route("/skip", web::post().to(skip_current))
            .route("/leaderboard", web::get().to(leaderboard))
            // 报表 - 仅管理员，业务层校验
            .route("/export", web::get().to(export_report)),
    );
}
