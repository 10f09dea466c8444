use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::{GradingService, error_response, require_judge};
use crate::cache::CacheResult;
use crate::config::AppConfig;
use crate::models::graders::responses::{LeaderboardEntry, LeaderboardResponse};
use crate::models::grading::requests::LeaderboardQuery;
use crate::models::ApiResponse;

pub(crate) fn cache_key(event_id: i64) -> String {
    format!("leaderboard:{event_id}")
}

/// 评分排行榜
/// GET /grading/leaderboard
///
/// 按 graded 降序取前 N 名。读多写少，结果走对象缓存，
/// 每次评分提交时失效。
pub async fn leaderboard(
    service: &GradingService,
    request: &HttpRequest,
    query: LeaderboardQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let cache = service.get_cache(request);
    let app_config = AppConfig::get();

    if let Err(resp) = require_judge(request) {
        return Ok(resp);
    }

    let limit = query
        .limit
        .unwrap_or(app_config.grading.leaderboard_size)
        .clamp(1, 100);

    // 未指定条数的请求共享缓存
    let use_cache = query.limit.is_none();
    if use_cache {
        if let CacheResult::Found(json) = cache.get_raw(&cache_key(query.event_id)).await {
            match serde_json::from_str::<LeaderboardResponse>(&json) {
                Ok(response) => {
                    debug!("排行榜缓存命中: event {}", query.event_id);
                    return Ok(
                        HttpResponse::Ok().json(ApiResponse::success(response, "查询成功"))
                    );
                }
                Err(_) => {
                    cache.remove(&cache_key(query.event_id)).await;
                }
            }
        }
    }

    let graders = match storage.list_top_graders(query.event_id, limit).await {
        Ok(graders) => graders,
        Err(e) => return Ok(error_response(&e)),
    };

    let response = LeaderboardResponse {
        entries: graders
            .into_iter()
            .map(|g| LeaderboardEntry {
                user_id: g.user_id,
                graded: g.graded,
            })
            .collect(),
    };

    if use_cache {
        if let Ok(json) = serde_json::to_string(&response) {
            cache
                .insert_raw(
                    cache_key(query.event_id),
                    json,
                    app_config.grading.leaderboard_cache_ttl,
                )
                .await;
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功")))
}
