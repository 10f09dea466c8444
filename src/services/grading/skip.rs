use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{GradingService, error_response, require_judge};
use crate::models::grading::requests::SkipRequest;
use crate::models::{ApiResponse, ErrorCode};

/// 跳过当前题
/// POST /grading/skip
///
/// 只累加跳过计数，不碰文书：没有租约机制，
/// 被跳过的文书自然留在分派池里等下一次随机分派。
pub async fn skip_current(
    service: &GradingService,
    request: &HttpRequest,
    req: SkipRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let user = match require_judge(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    match storage.increment_grader_skipped(user.id, req.event_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("已跳过"))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GraderNotFound,
            "评分员不存在，请先获取下一题",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
