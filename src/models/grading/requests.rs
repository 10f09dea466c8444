use serde::Deserialize;
use ts_rs::TS;

/// 指定赛事的查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct EventQuery {
    pub event_id: i64,
}

/// 提交答案请求
///
/// is_calibration 为 true 时 score 是校准题答案，essay/application 字段必须为空；
/// 为 false 时三者都必填。
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct SubmitAnswerRequest {
    pub event_id: i64,
    pub is_calibration: bool,
    pub score: i32,
    pub application_id: Option<i64>,
    pub essay_id: Option<String>,
}

/// 跳过当前题请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct SkipRequest {
    pub event_id: i64,
}

/// 排行榜查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct LeaderboardQuery {
    pub event_id: i64,
    pub limit: Option<i64>,
}
