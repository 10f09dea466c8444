//! 评分员生命周期
//!
//! NEW → CALIBRATING(g) → ACTIVE(g) → ROTATING → CALIBRATING(g') → … → EXHAUSTED
//!
//! 状态不单独落库，由 Grader 记录即时推导：
//! current_grading_group 为 None 即 EXHAUSTED；
//! 当前分组校准题没答完即 CALIBRATING，否则 ACTIVE。
//! 所有迁移由请求驱动，同一评分员的请求在服务层串行化。

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::{CalibrationQuestion, GradingConfig};
use crate::models::graders::entities::Grader;

/// 评分员当前所处阶段
#[derive(Debug, Clone, PartialEq)]
pub enum GraderPhase {
    /// 正在答当前分组的校准题
    Calibrating(String),
    /// 校准完成，可评正式文书
    Active(String),
    /// 所有分组都已耗尽
    Exhausted,
}

/// 推导评分员当前阶段
pub fn phase(config: &GradingConfig, grader: &Grader) -> GraderPhase {
    match &grader.current_grading_group {
        None => GraderPhase::Exhausted,
        Some(group) => {
            let total = config.questions_for(group).len();
            if grader.calibration_answers_for(group) < total {
                GraderPhase::Calibrating(group.clone())
            } else {
                GraderPhase::Active(group.clone())
            }
        }
    }
}

/// 解析初始分组：白名单命中优先，否则进 rest 分组
///
/// 多个分组都命中同一邮箱时按分组名排序取第一个，保证结果确定。
pub fn resolve_initial_group(config: &GradingConfig, email: &str) -> String {
    let mut names: Vec<&String> = config.group_names().collect();
    names.sort();
    for name in names {
        if let Some(group) = config.group(name) {
            if group.allows_email(email) {
                return name.clone();
            }
        }
    }
    config.rest_group().to_string()
}

/// 当前分组的下一道未答校准题
///
/// 题库顺序固定，不洗牌；重复请求在没有新答案落库前返回同一道题。
pub fn next_calibration_question<'a>(
    config: &'a GradingConfig,
    grader: &Grader,
    group: &str,
) -> Option<&'a CalibrationQuestion> {
    let answered = grader.calibration_answers_for(group);
    config.questions_for(group).get(answered)
}

/// 当前分组校准是否已完成
pub fn calibration_complete(config: &GradingConfig, grader: &Grader, group: &str) -> bool {
    grader.calibration_answers_for(group) >= config.questions_for(group).len()
}

/// 轮换候选：未完成、且不是当前分组
pub fn remaining_groups(config: &GradingConfig, grader: &Grader) -> Vec<String> {
    let mut candidates: Vec<String> = config
        .group_names()
        .filter(|name| {
            !grader.completed_grading_groups.contains(name)
                && grader.current_grading_group.as_ref() != Some(name)
        })
        .cloned()
        .collect();
    // 排序让随机选择在注入固定 RNG 时可复现
    candidates.sort();
    candidates
}

/// 从剩余分组中均匀随机选一个；没有剩余返回 None（EXHAUSTED）
pub fn choose_next_group<R: Rng + ?Sized>(
    config: &GradingConfig,
    grader: &Grader,
    rng: &mut R,
) -> Option<String> {
    let candidates = remaining_groups(config, grader);
    candidates.choose(rng).cloned()
}

/// 就地执行 ROTATING 迁移：当前分组标记完成，选出下一个分组
///
/// 返回是否还有下一个分组；调用方负责把更新后的 Grader 持久化。
pub fn rotate<R: Rng + ?Sized>(config: &GradingConfig, grader: &mut Grader, rng: &mut R) -> bool {
    if let Some(current) = grader.current_grading_group.take() {
        if !grader.completed_grading_groups.contains(&current) {
            grader.completed_grading_groups.push(current);
        }
    }
    grader.current_grading_group = choose_next_group(config, grader, rng);
    grader.current_grading_group.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::grading::tests::test_config;
    use crate::models::graders::entities::CalibrationScore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn new_grader(group: &str) -> Grader {
        Grader {
            id: 1,
            user_id: 7,
            event_id: 1,
            graded: 0,
            skipped: 0,
            current_grading_group: Some(group.to_string()),
            completed_grading_groups: vec![],
            calibration_scores: vec![],
            calibration_mapping: vec![],
            version: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_initial_group_allowlist_wins() {
        let config = test_config();
        assert_eq!(
            resolve_initial_group(&config, "vip@corp.example.com"),
            "sponsor"
        );
        assert_eq!(
            resolve_initial_group(&config, "random@example.com"),
            "general"
        );
    }

    #[test]
    fn test_calibration_questions_in_fixed_order() {
        let config = test_config();
        let mut grader = new_grader("general");

        let first = next_calibration_question(&config, &grader, "general").unwrap();
        assert_eq!(first.id, "gen-1");
        // 没有新答案时重复请求返回同一道题
        let again = next_calibration_question(&config, &grader, "general").unwrap();
        assert_eq!(again.id, "gen-1");

        grader.calibration_scores.push(CalibrationScore {
            group: "general".to_string(),
            score: 3,
        });
        let second = next_calibration_question(&config, &grader, "general").unwrap();
        assert_eq!(second.id, "gen-2");
    }

    #[test]
    fn test_phase_transitions_with_answers() {
        let config = test_config();
        let mut grader = new_grader("general");
        assert_eq!(
            phase(&config, &grader),
            GraderPhase::Calibrating("general".to_string())
        );

        for score in [3, 4] {
            grader.calibration_scores.push(CalibrationScore {
                group: "general".to_string(),
                score,
            });
        }
        assert!(calibration_complete(&config, &grader, "general"));
        assert_eq!(
            phase(&config, &grader),
            GraderPhase::Active("general".to_string())
        );
        assert!(next_calibration_question(&config, &grader, "general").is_none());
    }

    #[test]
    fn test_rotation_requires_fresh_calibration() {
        let config = test_config();
        let mut grader = new_grader("general");
        grader.calibration_scores.push(CalibrationScore {
            group: "general".to_string(),
            score: 3,
        });
        grader.calibration_scores.push(CalibrationScore {
            group: "general".to_string(),
            score: 4,
        });

        let mut rng = StdRng::seed_from_u64(7);
        assert!(rotate(&config, &mut grader, &mut rng));
        assert_eq!(grader.current_grading_group.as_deref(), Some("sponsor"));
        assert_eq!(grader.completed_grading_groups, vec!["general"]);
        // 新分组从第一题重新校准
        assert_eq!(
            phase(&config, &grader),
            GraderPhase::Calibrating("sponsor".to_string())
        );
    }

    #[test]
    fn test_rotation_exhausts_when_no_groups_left() {
        let config = test_config();
        let mut grader = new_grader("sponsor");
        grader.completed_grading_groups = vec!["general".to_string()];

        let mut rng = StdRng::seed_from_u64(1);
        assert!(!rotate(&config, &mut grader, &mut rng));
        assert_eq!(grader.current_grading_group, None);
        assert_eq!(phase(&config, &grader), GraderPhase::Exhausted);
        // 完成集合里不包含 current（此时 current 为 None）
        assert!(grader.completed_grading_groups.contains(&"sponsor".to_string()));
    }

    #[test]
    fn test_choose_next_group_excludes_current_and_completed() {
        let config = test_config();
        let grader = new_grader("general");
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let next = choose_next_group(&config, &grader, &mut rng).unwrap();
            assert_eq!(next, "sponsor");
        }
    }
}
