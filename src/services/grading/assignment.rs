//! 文书分派引擎
//!
//! 对 ACTIVE 评分员：在当前分组映射的分支里过滤出可评文书，
//! 从合格集合中均匀随机取一篇。不做优先级排序，公平性由
//! 每篇文书的评分数上限保证。合格集合为空即分组耗尽，驱动轮换。

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::config::MAX_REVIEWS_PER_ESSAY;
use crate::models::applications::entities::{Application, ApplicationStatus, Essay};

/// 一篇可评的文书及其所属报名表
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleEssay {
    pub application_id: i64,
    pub essay: Essay,
}

/// 过滤合格文书
///
/// 条件：报名表已提交待评审且未完成评分；该文书评分数未达上限；
/// 该评分员没评过这篇文书。分支归属已由存储层查询过滤。
pub fn eligible_essays(
    applications: &[Application],
    review_counts: &HashMap<String, i64>,
    reviewed_by_grader: &HashSet<String>,
) -> Vec<EligibleEssay> {
    let mut eligible = Vec::new();
    for application in applications {
        if application.status != ApplicationStatus::Submitted || application.grading_complete {
            continue;
        }
        for essay in &application.essays {
            if review_counts.get(&essay.id).copied().unwrap_or(0) >= MAX_REVIEWS_PER_ESSAY {
                continue;
            }
            if reviewed_by_grader.contains(&essay.id) {
                continue;
            }
            eligible.push(EligibleEssay {
                application_id: application.id,
                essay: essay.clone(),
            });
        }
    }
    eligible
}

/// 从合格集合中均匀随机取一篇
pub fn pick_essay<'a, R: Rng + ?Sized>(
    rng: &mut R,
    eligible: &'a [EligibleEssay],
) -> Option<&'a EligibleEssay> {
    eligible.choose(rng)
}
