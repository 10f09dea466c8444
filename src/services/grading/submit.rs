use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{debug, info};

use super::{GradingService, calibration, error_response, lifecycle, locks::LockRegistry, require_judge};
use crate::errors::GradeSystemError;
use crate::models::grading::requests::SubmitAnswerRequest;
use crate::models::grading::responses::SubmitAnswerResponse;
use crate::models::graders::entities::CalibrationScore;
use crate::models::reviews::entities::NewReview;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_raw_score;

/// 提交答案
/// POST /grading/submit
///
/// 唯一的写入口：校准答案追加到评分员记录，正式评分走存储层事务。
pub async fn submit_answer(
    service: &GradingService,
    request: &HttpRequest,
    req: SubmitAnswerRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = service.get_grading_config(request);

    let user = match require_judge(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    if let Err(reason) = validate_raw_score(req.score, config.min_score, config.max_score) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ScoreOutOfRange,
            reason,
        )));
    }

    let _guard = service
        .locks
        .acquire(LockRegistry::grader_key(user.id, req.event_id))
        .await;

    let mut grader = match storage.get_grader(user.id, req.event_id).await {
        Ok(Some(grader)) => grader,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::GraderNotFound,
                "评分员不存在，请先获取下一题",
            )));
        }
        Err(e) => return Ok(error_response(&e)),
    };

    match lifecycle::phase(&config, &grader) {
        lifecycle::GraderPhase::Exhausted => Ok(HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::NoEssayEligible, "所有分组均已完成，无可提交的内容"),
        )),
        lifecycle::GraderPhase::Calibrating(group) => {
            // 校准阶段不接受正式评分
            if !req.is_calibration {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::CalibrationIncomplete,
                    format!("分组 {group} 的校准尚未完成，不能提交正式评分"),
                )));
            }

            grader.calibration_scores.push(CalibrationScore {
                group: group.clone(),
                score: req.score,
            });

            // 答完最后一题时触发一次偏差映射计算
            let calibration_completed = lifecycle::calibration_complete(&config, &grader, &group);
            if calibration_completed {
                let questions = config.questions_for(&group);
                let answers = grader.calibration_scores_for(&group);
                let fresh = match calibration::build_criterion_mappings(
                    questions,
                    &answers,
                    config.min_score,
                    config.max_score,
                ) {
                    Ok(mappings) => mappings,
                    Err(e) => return Ok(error_response(&e)),
                };
                calibration::merge_mappings(&mut grader.calibration_mapping, fresh);
                info!(
                    "评分员 {} 完成分组 {} 校准，生成 {} 个维度的修正表",
                    user.id,
                    group,
                    grader.calibration_mapping.len()
                );
            }

            if let Err(e) = storage.update_grader_state(&grader).await {
                return Ok(error_response(&e));
            }

            Ok(HttpResponse::Ok().json(ApiResponse::success(
                SubmitAnswerResponse {
                    is_calibration: true,
                    adjusted_score: None,
                    calibration_completed,
                    application_completed: false,
                },
                "校准答案已记录",
            )))
        }
        lifecycle::GraderPhase::Active(group) => {
            if req.is_calibration {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::CalibrationAlreadyComplete,
                    format!("分组 {group} 的校准已完成，不能再提交校准答案"),
                )));
            }

            let (application_id, essay_id) = match (req.application_id, req.essay_id.as_deref()) {
                (Some(application_id), Some(essay_id)) => (application_id, essay_id),
                _ => {
                    return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                        ErrorCode::MissingEssayReference,
                        "正式评分必须携带 application_id 和 essay_id",
                    )));
                }
            };

            let application = match storage.get_application(application_id).await {
                Ok(Some(application)) => application,
                Ok(None) => {
                    return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                        ErrorCode::ApplicationNotFound,
                        "报名表不存在",
                    )));
                }
                Err(e) => return Ok(error_response(&e)),
            };
            let essay = match application.essay(essay_id) {
                Some(essay) => essay,
                None => {
                    return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                        ErrorCode::EssayNotFound,
                        format!("报名表 {application_id} 中不存在文书 {essay_id}"),
                    )));
                }
            };

            // 原始分经当前修正表换算后落库
            let mapping = match grader.mapping_for(&essay.criterion) {
                Some(mapping) => mapping,
                None => {
                    return Ok(error_response(&GradeSystemError::configuration(format!(
                        "维度 '{}' 未被分组 {} 的校准题库覆盖，无法换算修正分",
                        essay.criterion, group
                    ))));
                }
            };
            let adjusted_score = match mapping.adjust(req.score, config.min_score) {
                Some(adjusted) => adjusted,
                None => {
                    return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                        ErrorCode::ScoreOutOfRange,
                        format!("原始分 {} 超出修正表范围", req.score),
                    )));
                }
            };

            // 同一文书的写入串行化，配合事务内计数守住评分上限
            let _essay_guard = service
                .locks
                .acquire(LockRegistry::essay_key(essay_id))
                .await;

            let outcome = match storage
                .submit_review(NewReview {
                    event_id: req.event_id,
                    application_id,
                    essay_id: essay_id.to_string(),
                    reviewer_id: user.id,
                    criterion: essay.criterion.clone(),
                    raw_score: req.score,
                    adjusted_score,
                })
                .await
            {
                Ok(outcome) => outcome,
                // 抢同一篇文书失败（重复评分或名额已满）→ 明确告知重新取题
                Err(GradeSystemError::Conflict(message)) => {
                    return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                        ErrorCode::ReviewConflict,
                        format!("{message}，请重新获取下一题"),
                    )));
                }
                Err(e) => return Ok(error_response(&e)),
            };

            if outcome.application_completed {
                info!(
                    "报名表 {} 完成评分，总分 {:?}",
                    application_id, outcome.completed_final_score
                );
            }

            // 评分计数变了，排行榜缓存作废
            let cache = service.get_cache(request);
            cache
                .remove(&super::leaderboard::cache_key(req.event_id))
                .await;
            debug!(
                "评分员 {} 评完文书 {}（原始 {} → 修正 {}）",
                user.id, essay_id, req.score, adjusted_score
            );

            Ok(HttpResponse::Ok().json(ApiResponse::success(
                SubmitAnswerResponse {
                    is_calibration: false,
                    adjusted_score: Some(outcome.review.adjusted_score),
                    calibration_completed: false,
                    application_completed: outcome.application_completed,
                },
                "评分已记录",
            )))
        }
    }
}
