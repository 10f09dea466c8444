use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 一条正式评分记录：一个评分员对一篇文书的 (原始分, 修正分)
///
/// (essay_id, reviewer_id) 在存储层有唯一约束，
/// 每篇文书最多 MAX_REVIEWS_PER_ESSAY 条。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/review.ts")]
pub struct Review {
    pub id: i64,
    pub event_id: i64,
    pub application_id: i64,
    pub essay_id: String,
    pub reviewer_id: i64,
    pub criterion: String,
    pub raw_score: i32,
    pub adjusted_score: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 待插入的评分记录（id 由存储层生成）
#[derive(Debug, Clone)]
pub struct NewReview {
    pub event_id: i64,
    pub application_id: i64,
    pub essay_id: String,
    pub reviewer_id: i64,
    pub criterion: String,
    pub raw_score: i32,
    pub adjusted_score: f64,
}

/// 评分写入结果
///
/// completed_final_score 仅在本次写入恰好触发报名表完成评分时为 Some。
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub review: Review,
    pub application_completed: bool,
    pub completed_final_score: Option<f64>,
}

/// 报名表总分：先求每篇文书修正分的均值，再对文书均值取均值
///
/// 没有任何评分记录时返回 None；没被评过的文书不参与计算。
pub fn mean_of_essay_means<'a, I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut by_essay: std::collections::HashMap<&str, (f64, u32)> = std::collections::HashMap::new();
    for (essay_id, adjusted) in scores {
        let entry = by_essay.entry(essay_id).or_insert((0.0, 0));
        entry.0 += adjusted;
        entry.1 += 1;
    }
    if by_essay.is_empty() {
        return None;
    }
    let sum: f64 = by_essay.values().map(|(sum, n)| sum / f64::from(*n)).sum();
    Some(sum / by_essay.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_essay_means_single_essay() {
        let score = mean_of_essay_means([("e1", 3.0), ("e1", 4.0)]);
        assert_eq!(score, Some(3.5));
    }

    #[test]
    fn test_mean_of_essay_means_across_essays() {
        // e1 均值 3.5，e2 均值 2.0，总分 2.75
        let score = mean_of_essay_means([("e1", 3.0), ("e1", 4.0), ("e2", 2.0)]);
        assert_eq!(score, Some(2.75));
    }

    #[test]
    fn test_mean_of_essay_means_empty() {
        assert_eq!(mean_of_essay_means([]), None);
    }
}
