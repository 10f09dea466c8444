use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashSet;
use tracing::{debug, info};

use super::{GradingService, assignment, error_response, lifecycle, locks::LockRegistry, require_judge};
use crate::models::grading::requests::EventQuery;
use crate::models::grading::responses::{
    CalibrationPayload, EssayPayload, NextQuestionResponse, RubricInfo,
};
use crate::models::{ApiResponse, ErrorCode};

/// 获取下一题
/// GET /grading/next
///
/// 幂等：没有新答案落库时，校准阶段重复请求返回同一道题；
/// 被放弃的正式文书不加租约，下次查询重新进入随机分派池。
pub async fn next_question(
    service: &GradingService,
    request: &HttpRequest,
    query: EventQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = service.get_grading_config(request);

    let user = match require_judge(request) {
        Ok(user) => user,
        Err(resp) => return Ok(resp),
    };

    // 同一评分员的生命周期决策串行化
    let _guard = service
        .locks
        .acquire(LockRegistry::grader_key(user.id, query.event_id))
        .await;

    // 懒创建：首次请求时按邮箱白名单/rest 分组落一条评分员记录
    let mut grader = match storage.get_grader(user.id, query.event_id).await {
        Ok(Some(grader)) => grader,
        Ok(None) => {
            let initial_group = lifecycle::resolve_initial_group(&config, &user.email);
            info!(
                "为用户 {} 创建评分员记录，初始分组: {}",
                user.id, initial_group
            );
            match storage
                .create_grader(user.id, query.event_id, &initial_group)
                .await
            {
                Ok(grader) => grader,
                Err(e) => return Ok(error_response(&e)),
            }
        }
        Err(e) => return Ok(error_response(&e)),
    };

    // 轮换是一次就地迁移，循环直到拿到题目或确认耗尽
    loop {
        match lifecycle::phase(&config, &grader) {
            lifecycle::GraderPhase::Exhausted => {
                debug!("评分员 {} 已耗尽所有分组", grader.user_id);
                return Ok(HttpResponse::Ok().json(ApiResponse::success(
                    NextQuestionResponse::exhausted(config.min_score, config.max_score),
                    "没有可评的内容了",
                )));
            }
            lifecycle::GraderPhase::Calibrating(group) => {
                let question = match lifecycle::next_calibration_question(&config, &grader, &group)
                {
                    Some(question) => question,
                    None => {
                        // 校准题数和答案数在同一把锁内变化，走不到这里
                        return Ok(error_response(&crate::errors::GradeSystemError::configuration(
                            format!("分组 {group} 的校准题库状态异常"),
                        )));
                    }
                };
                let rubric = match config.rubric_for(&question.criterion) {
                    Some(rubric) => rubric,
                    None => {
                        return Ok(HttpResponse::InternalServerError().json(
                            ApiResponse::error_empty(
                                ErrorCode::GradingConfigError,
                                format!("维度 '{}' 没有配置评分标准", question.criterion),
                            ),
                        ));
                    }
                };
                let total = config.questions_for(&group).len() as i64;
                let answered = grader.calibration_answers_for(&group) as i64;
                let response = NextQuestionResponse {
                    is_calibration: true,
                    exhausted: false,
                    grading_group: Some(group.clone()),
                    criterion: Some(question.criterion.clone()),
                    rubric: Some(RubricInfo {
                        question: rubric.question.clone(),
                        rubric_link: rubric.rubric_link.clone(),
                        scoring_guide: rubric.scoring_guide.clone(),
                    }),
                    calibration: Some(CalibrationPayload {
                        question_id: question.id.clone(),
                        answer: question.answer.clone(),
                        answered,
                        total,
                    }),
                    essay: None,
                    min_score: config.min_score,
                    max_score: config.max_score,
                };
                return Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功")));
            }
            lifecycle::GraderPhase::Active(group) => {
                // 当前分组里找一篇可评文书
                let branches = config.branches_for(&group);
                let applications = match storage
                    .list_gradable_applications(query.event_id, branches)
                    .await
                {
                    Ok(applications) => applications,
                    Err(e) => return Ok(error_response(&e)),
                };
                let review_counts = match storage.count_reviews_by_essay(query.event_id).await {
                    Ok(counts) => counts,
                    Err(e) => return Ok(error_response(&e)),
                };
                let own_reviews: HashSet<String> = match storage
                    .list_reviews_by_reviewer(user.id, query.event_id)
                    .await
                {
                    Ok(reviews) => reviews.into_iter().map(|r| r.essay_id).collect(),
                    Err(e) => return Ok(error_response(&e)),
                };

                let eligible =
                    assignment::eligible_essays(&applications, &review_counts, &own_reviews);
                if let Some(pick) = assignment::pick_essay(&mut rand::rng(), &eligible) {
                    let rubric = match config.rubric_for(&pick.essay.criterion) {
                        Some(rubric) => rubric,
                        None => {
                            return Ok(HttpResponse::InternalServerError().json(
                                ApiResponse::error_empty(
                                    ErrorCode::GradingConfigError,
                                    format!("维度 '{}' 没有配置评分标准", pick.essay.criterion),
                                ),
                            ));
                        }
                    };
                    let response = NextQuestionResponse {
                        is_calibration: false,
                        exhausted: false,
                        grading_group: Some(group.clone()),
                        criterion: Some(pick.essay.criterion.clone()),
                        rubric: Some(RubricInfo {
                            question: rubric.question.clone(),
                            rubric_link: rubric.rubric_link.clone(),
                            scoring_guide: rubric.scoring_guide.clone(),
                        }),
                        calibration: None,
                        essay: Some(EssayPayload {
                            application_id: pick.application_id,
                            essay_id: pick.essay.id.clone(),
                            answer: pick.essay.answer.clone(),
                        }),
                        min_score: config.min_score,
                        max_score: config.max_score,
                    };
                    return Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功")));
                }

                // 分组耗尽 → 轮换到下一个分组（需要重新校准）或进入 EXHAUSTED
                info!("评分员 {} 的分组 {} 已无可评文书，开始轮换", user.id, group);
                lifecycle::rotate(&config, &mut grader, &mut rand::rng());
                grader = match storage.update_grader_state(&grader).await {
                    Ok(grader) => grader,
                    Err(e) => return Ok(error_response(&e)),
                };
            }
        }
    }
}
