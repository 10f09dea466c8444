use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;

use super::{GradingService, error_response};
use crate::middlewares::RequireJWT;
use crate::models::applications::entities::Application;
use crate::models::auth::entities::UserRole;
use crate::models::grading::requests::EventQuery;
use crate::models::grading::responses::{GradingReportResponse, GradingReportRow};
use crate::models::reviews::entities::Review;
use crate::models::{ApiResponse, ErrorCode};

/// 评分报表导出
/// GET /grading/export
///
/// 只读聚合：报名表 × 评分记录，每份报名表一行。
/// 失败只影响报表本身，不触碰评分状态。
pub async fn export_report(
    service: &GradingService,
    request: &HttpRequest,
    query: EventQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    // 报表含全量申请数据，仅管理员可导出
    let user = match RequireJWT::extract_user(request) {
        Some(user) => user,
        None => {
            return Ok(HttpResponse::Unauthorized()
                .json(ApiResponse::error_empty(ErrorCode::Unauthorized, "未登录")));
        }
    };
    if !UserRole::admin_roles().contains(&&user.role) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "只有管理员可以导出评分报表",
        )));
    }

    let applications = match storage.list_applications_by_event(query.event_id).await {
        Ok(applications) => applications,
        Err(e) => return Ok(error_response(&e)),
    };
    let reviews = match storage.list_reviews_by_event(query.event_id).await {
        Ok(reviews) => reviews,
        Err(e) => return Ok(error_response(&e)),
    };

    let response = GradingReportResponse {
        rows: build_report(&applications, &reviews),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功")))
}

/// 聚合报表行：按报名表分组评分记录，求原始分均值
fn build_report(applications: &[Application], reviews: &[Review]) -> Vec<GradingReportRow> {
    let mut reviews_by_application: HashMap<i64, Vec<&Review>> = HashMap::new();
    for review in reviews {
        reviews_by_application
            .entry(review.application_id)
            .or_default()
            .push(review);
    }

    let mut rows: Vec<GradingReportRow> = applications
        .iter()
        .map(|application| {
            let reviews = reviews_by_application
                .get(&application.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let review_count = reviews.len() as i64;
            let mean_raw_score = if reviews.is_empty() {
                None
            } else {
                Some(
                    reviews.iter().map(|r| f64::from(r.raw_score)).sum::<f64>()
                        / review_count as f64,
                )
            };
            GradingReportRow {
                application_id: application.id,
                branch: application.branch.clone(),
                school: application.school.clone(),
                essay_ids: application.essays.iter().map(|e| e.id.clone()).collect(),
                mean_raw_score,
                review_count,
                grading_complete: application.grading_complete,
                final_score: application.final_score,
            }
        })
        .collect();

    rows.sort_by_key(|row| row.application_id);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::applications::entities::{ApplicationStatus, Essay};

    fn application(id: i64, branch: &str, essays: &[&str]) -> Application {
        Application {
            id,
            event_id: 1,
            branch: branch.to_string(),
            school: "Test University".to_string(),
            applicant_email: "applicant@example.com".to_string(),
            status: ApplicationStatus::Submitted,
            essays: essays
                .iter()
                .map(|essay_id| Essay {
                    id: essay_id.to_string(),
                    criterion: "passion".to_string(),
                    answer: "...".to_string(),
                })
                .collect(),
            grading_complete: false,
            final_score: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn review(application_id: i64, essay_id: &str, reviewer_id: i64, raw: i32) -> Review {
        Review {
            id: reviewer_id * 100 + application_id,
            event_id: 1,
            application_id,
            essay_id: essay_id.to_string(),
            reviewer_id,
            criterion: "passion".to_string(),
            raw_score: raw,
            adjusted_score: f64::from(raw),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_report_one_row_per_application() {
        let applications = [
            application(1, "general", &["e1"]),
            application(2, "sponsor", &["e2", "e3"]),
        ];
        let reviews = [
            review(1, "e1", 10, 2),
            review(1, "e1", 11, 4),
            review(2, "e2", 10, 3),
        ];

        let rows = build_report(&applications, &reviews);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].application_id, 1);
        assert_eq!(rows[0].branch, "general");
        assert_eq!(rows[0].review_count, 2);
        assert_eq!(rows[0].mean_raw_score, Some(3.0));

        assert_eq!(rows[1].application_id, 2);
        assert_eq!(rows[1].essay_ids, vec!["e2", "e3"]);
        assert_eq!(rows[1].review_count, 1);
        assert_eq!(rows[1].mean_raw_score, Some(3.0));
    }

    #[test]
    fn test_unreviewed_application_has_no_mean() {
        let applications = [application(1, "general", &["e1"])];
        let rows = build_report(&applications, &[]);
        assert_eq!(rows[0].review_count, 0);
        assert_eq!(rows[0].mean_raw_score, None);
    }
}
