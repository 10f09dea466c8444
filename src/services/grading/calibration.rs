//! 偏差校准映射
//!
//! 用评分员在校准题上的答案和题库标准分做最小二乘拟合，
//! 得到每个维度的分数修正表。表在分组校准结束时算一次，之后只读。

use std::collections::BTreeMap;

use crate::config::CalibrationQuestion;
use crate::errors::{GradeSystemError, Result};
use crate::models::graders::entities::CriterionMapping;

/// x 方差低于该值视为"所有答案相同"，退化为恒等映射
const VARIANCE_EPSILON: f64 = 1e-9;

/// 计算单个维度的分数修正表
///
/// pairs 是 (评分员答案, 标准分)。返回的表按原始分从 min_score 到
/// max_score 依次排列，值已截断到区间内并取整到 0.5 步长。
pub fn compute_score_mapping(
    pairs: &[(f64, f64)],
    min_score: i32,
    max_score: i32,
) -> Result<Vec<f64>> {
    if min_score >= max_score {
        return Err(GradeSystemError::configuration(format!(
            "分数区间非法: [{min_score}, {max_score}]"
        )));
    }

    let identity: Vec<f64> = (min_score..=max_score).map(f64::from).collect();
    if pairs.is_empty() {
        return Ok(identity);
    }

    // 最小二乘: y = slope * x + intercept
    let n = pairs.len() as f64;
    let sum_x: f64 = pairs.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = pairs.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = pairs.iter().map(|(x, y)| x * y).sum();
    let sum_xx: f64 = pairs.iter().map(|(x, _)| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < VARIANCE_EPSILON {
        // 评分员所有答案相同，无法拟合，按恒等映射处理
        return Ok(identity);
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let mut table: Vec<f64> = (min_score..=max_score)
        .map(|raw| {
            let value = slope * f64::from(raw) + intercept;
            let clamped = value.clamp(f64::from(min_score), f64::from(max_score));
            round_to_half(clamped)
        })
        .collect();

    // 负相关评分员会产生递减的表，镜像翻转保证输出单调不减
    if let (Some(first), Some(last)) = (table.first(), table.last()) {
        if last < first {
            table.reverse();
        }
    }

    Ok(table)
}

/// 取整到最近的 0.5
fn round_to_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

/// 按维度分组计算整套修正表
///
/// answers 的长度必须与题库一致，不一致说明配置或调用方出错，
/// 必须报错而不是静默截断。
pub fn build_criterion_mappings(
    questions: &[CalibrationQuestion],
    answers: &[i32],
    min_score: i32,
    max_score: i32,
) -> Result<Vec<CriterionMapping>> {
    if questions.len() != answers.len() {
        return Err(GradeSystemError::configuration(format!(
            "校准答案数 ({}) 与题库题数 ({}) 不一致",
            answers.len(),
            questions.len()
        )));
    }

    // BTreeMap 保证输出顺序稳定
    let mut by_criterion: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
    for (question, answer) in questions.iter().zip(answers) {
        by_criterion
            .entry(question.criterion.as_str())
            .or_default()
            .push((f64::from(*answer), f64::from(question.expected_score)));
    }

    by_criterion
        .into_iter()
        .map(|(criterion, pairs)| {
            Ok(CriterionMapping {
                criterion: criterion.to_string(),
                table: compute_score_mapping(&pairs, min_score, max_score)?,
            })
        })
        .collect()
}

/// 把新算出的修正表合并进评分员已有的映射
///
/// 新分组覆盖到的维度整表替换，其余维度保留上一分组的结果。
pub fn merge_mappings(existing: &mut Vec<CriterionMapping>, fresh: Vec<CriterionMapping>) {
    for mapping in fresh {
        if let Some(slot) = existing.iter_mut().find(|m| m.criterion == mapping.criterion) {
            *slot = mapping;
        } else {
            existing.push(mapping);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_overscoring_grader_literal_values() {
        // 评分员整体偏高一档（顶格截断）：答案 (2,3,4,4) 对标准分 (1,2,3,4)
        // 拟合出 slope = 14/11, intercept = -18/11，逐点代入后取整：
        let pairs = [(2.0, 1.0), (3.0, 2.0), (4.0, 3.0), (4.0, 4.0)];
        let table = compute_score_mapping(&pairs, 1, 4).unwrap();
        assert_eq!(table, vec![1.0, 1.0, 2.0, 3.5]);
    }

    #[test]
    fn test_unbiased_grader_gets_identity() {
        let pairs = [(1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)];
        let table = compute_score_mapping(&pairs, 1, 4).unwrap();
        assert_eq!(table, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_identity_fallback_on_constant_answers() {
        // 所有答案都是 3，x 方差为零
        let pairs = [(3.0, 1.0), (3.0, 2.0), (3.0, 4.0)];
        let table = compute_score_mapping(&pairs, 1, 4).unwrap();
        assert_eq!(table, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_negatively_correlated_grader_mirrored() {
        // 完全反向的评分员：朴素表为 [4,3,2,1]，镜像后恢复单调不减
        let pairs = [(4.0, 1.0), (3.0, 2.0), (2.0, 3.0), (1.0, 4.0)];
        let table = compute_score_mapping(&pairs, 1, 4).unwrap();
        assert_eq!(table, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_empty_pairs_give_identity() {
        let table = compute_score_mapping(&[], 1, 4).unwrap();
        assert_eq!(table, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_mapping_bounded_and_monotone_for_random_inputs() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let n = rng.random_range(1..=12);
            let pairs: Vec<(f64, f64)> = (0..n)
                .map(|_| {
                    (
                        f64::from(rng.random_range(1..=4)),
                        f64::from(rng.random_range(1..=4)),
                    )
                })
                .collect();
            let table = compute_score_mapping(&pairs, 1, 4).unwrap();
            assert_eq!(table.len(), 4);
            for value in &table {
                assert!((1.0..=4.0).contains(value), "越界: {value} ({pairs:?})");
                assert_eq!(value * 2.0, (value * 2.0).round(), "步长必须是 0.5");
            }
            for window in table.windows(2) {
                assert!(window[0] <= window[1], "必须单调不减: {table:?} ({pairs:?})");
            }
        }
    }

    fn question(id: &str, criterion: &str, expected: i32) -> CalibrationQuestion {
        CalibrationQuestion {
            id: id.to_string(),
            criterion: criterion.to_string(),
            answer: "...".to_string(),
            expected_score: expected,
        }
    }

    #[test]
    fn test_build_mappings_grouped_by_criterion() {
        let questions = [
            question("q1", "passion", 1),
            question("q2", "technical", 2),
            question("q3", "passion", 4),
        ];
        let mappings = build_criterion_mappings(&questions, &[1, 2, 4], 1, 4).unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].criterion, "passion");
        assert_eq!(mappings[1].criterion, "technical");
        // passion: 答案与标准分一致 → 恒等
        assert_eq!(mappings[0].table, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_build_mappings_length_mismatch_fails_loudly() {
        let questions = [question("q1", "passion", 1), question("q2", "passion", 4)];
        let err = build_criterion_mappings(&questions, &[3], 1, 4).unwrap_err();
        assert_eq!(err.code(), "E006");
    }

    #[test]
    fn test_merge_replaces_covered_criteria_only() {
        let mut existing = vec![
            CriterionMapping {
                criterion: "passion".to_string(),
                table: vec![1.0, 1.5, 2.0, 2.5],
            },
            CriterionMapping {
                criterion: "technical".to_string(),
                table: vec![1.0, 2.0, 3.0, 4.0],
            },
        ];
        merge_mappings(
            &mut existing,
            vec![CriterionMapping {
                criterion: "passion".to_string(),
                table: vec![1.0, 2.0, 3.0, 4.0],
            }],
        );
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].table, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(existing[1].criterion, "technical");
    }
}
