use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 评分标准信息（来自只读配置）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct RubricInfo {
    pub question: String,
    pub rubric_link: String,
    pub scoring_guide: String,
}

/// 校准题载荷
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct CalibrationPayload {
    pub question_id: String,
    pub answer: String,
    /// 当前分组已答题数（从 0 计）
    pub answered: i64,
    /// 当前分组题目总数
    pub total: i64,
}

/// 正式文书载荷
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct EssayPayload {
    pub application_id: i64,
    pub essay_id: String,
    pub answer: String,
}

/// 下一题响应
///
/// exhausted 为 true 时其余字段为空：该评分员已完成所有分组且无可评文书。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct NextQuestionResponse {
    pub is_calibration: bool,
    pub exhausted: bool,
    pub grading_group: Option<String>,
    pub criterion: Option<String>,
    pub rubric: Option<RubricInfo>,
    pub calibration: Option<CalibrationPayload>,
    pub essay: Option<EssayPayload>,
    pub min_score: i32,
    pub max_score: i32,
}

impl NextQuestionResponse {
    pub fn exhausted(min_score: i32, max_score: i32) -> Self {
        Self {
            is_calibration: false,
            exhausted: true,
            grading_group: None,
            criterion: None,
            rubric: None,
            calibration: None,
            essay: None,
            min_score,
            max_score,
        }
    }
}

/// 提交答案响应
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct SubmitAnswerResponse {
    pub is_calibration: bool,
    /// 正式评分时的修正分
    pub adjusted_score: Option<f64>,
    /// 本次提交是否恰好让该分组校准完成
    pub calibration_completed: bool,
    /// 本次提交是否恰好让报名表完成评分
    pub application_completed: bool,
}

/// 评分报表单行：每份报名表一行
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct GradingReportRow {
    pub application_id: i64,
    pub branch: String,
    pub school: String,
    pub essay_ids: Vec<String>,
    pub mean_raw_score: Option<f64>,
    pub review_count: i64,
    pub grading_complete: bool,
    pub final_score: Option<f64>,
}

/// 评分报表响应
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grading.ts")]
pub struct GradingReportResponse {
    pub rows: Vec<GradingReportRow>,
}
