use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::{ApiResponse, AppStartTime};

/// 系统状态响应
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SystemStatusResponse {
    pub name: String,
    pub version: String,
    pub uptime_seconds: i64,
}

// 系统状态探针（无需认证）
pub async fn get_status(request: HttpRequest) -> ActixResult<HttpResponse> {
    let uptime_seconds = request
        .app_data::<web::Data<AppStartTime>>()
        .map(|start| {
            chrono::Utc::now()
                .signed_duration_since(start.start_datetime)
                .num_seconds()
        })
        .unwrap_or(0);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SystemStatusResponse {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds,
        },
        "查询成功",
    )))
}

// 配置路由
pub fn configure_system_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api/v1/system").route("/status", web::get().to(get_status)));
}
