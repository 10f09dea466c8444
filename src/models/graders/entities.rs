use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 一条校准答题记录
///
/// 顺序敏感：同一分组内的记录顺序就是题库顺序，
/// 当前答到第几题由该分组的记录条数决定。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grader.ts")]
pub struct CalibrationScore {
    pub group: String,
    pub score: i32,
}

/// 单个维度的分数修正表
///
/// table[i] 是原始整数分 (min_score + i) 修正后的分数，步长 0.5。
/// 在该分组校准结束时一次性算出，之后不再变化。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grader.ts")]
pub struct CriterionMapping {
    pub criterion: String,
    pub table: Vec<f64>,
}

impl CriterionMapping {
    /// 查表：原始分 → 修正分
    pub fn adjust(&self, raw_score: i32, min_score: i32) -> Option<f64> {
        let idx = raw_score.checked_sub(min_score)? as usize;
        self.table.get(idx).copied()
    }
}

/// 评分员实体，一人一赛事一条，历史记录永不删除
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grader.ts")]
pub struct Grader {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub graded: i64,
    pub skipped: i64,
    /// None 表示所有分组都已耗尽（EXHAUSTED）
    pub current_grading_group: Option<String>,
    pub completed_grading_groups: Vec<String>,
    pub calibration_scores: Vec<CalibrationScore>,
    pub calibration_mapping: Vec<CriterionMapping>,
    /// 乐观锁版本号，每次状态变更自增
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub version: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Grader {
    /// 当前分组已答的校准题数
    pub fn calibration_answers_for(&self, group: &str) -> usize {
        self.calibration_scores
            .iter()
            .filter(|s| s.group == group)
            .count()
    }

    /// 当前分组的校准答案（按答题顺序）
    pub fn calibration_scores_for(&self, group: &str) -> Vec<i32> {
        self.calibration_scores
            .iter()
            .filter(|s| s.group == group)
            .map(|s| s.score)
            .collect()
    }

    /// 某维度的修正表
    pub fn mapping_for(&self, criterion: &str) -> Option<&CriterionMapping> {
        self.calibration_mapping
            .iter()
            .find(|m| m.criterion == criterion)
    }
}
