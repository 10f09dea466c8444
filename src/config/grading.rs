//! 评分引擎只读配置
//!
//! 分组映射、校准题库、评分标准三张静态表，进程启动时加载一次，
//! 校验失败直接拒绝启动。加载后以 Arc 显式注入各组件，不走全局变量。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{GradeSystemError, Result};
use crate::utils::validate::validate_email;

/// 每篇文书最多允许的正式评分数
pub const MAX_REVIEWS_PER_ESSAY: i64 = 2;

const DEFAULT_MIN_SCORE: i32 = 1;
const DEFAULT_MAX_SCORE: i32 = 4;

/// 分组的邮箱白名单："rest" 字面量或显式邮箱列表
///
/// 恰好一个分组必须声明为 "rest"，兜底接收所有未被白名单命中的评分员。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmailAllowList {
    Emails(Vec<String>),
    Rest(String),
}

/// 评分分组：一组报名分支 + 进组规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingGroup {
    pub emails: EmailAllowList,
    pub branches: Vec<String>,
}

impl GradingGroup {
    pub fn is_rest(&self) -> bool {
        matches!(&self.emails, EmailAllowList::Rest(s) if s == "rest")
    }

    pub fn allows_email(&self, email: &str) -> bool {
        match &self.emails {
            EmailAllowList::Emails(list) => list.iter().any(|e| e.eq_ignore_ascii_case(email)),
            EmailAllowList::Rest(_) => false,
        }
    }
}

/// 校准题：带标准分的文书样题，组内顺序固定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationQuestion {
    pub id: String,
    pub criterion: String,
    pub answer: String,
    pub expected_score: i32,
}

/// 某个打分维度的题面与评分标准
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubric {
    pub question: String,
    pub rubric_link: String,
    pub scoring_guide: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GradingConfigFile {
    #[serde(default = "default_min_score")]
    min_score: i32,
    #[serde(default = "default_max_score")]
    max_score: i32,
    groups: HashMap<String, GradingGroup>,
    #[serde(default)]
    calibration: HashMap<String, Vec<CalibrationQuestion>>,
    rubrics: HashMap<String, Rubric>,
}

fn default_min_score() -> i32 {
    DEFAULT_MIN_SCORE
}

fn default_max_score() -> i32 {
    DEFAULT_MAX_SCORE
}

/// 校验通过的评分配置
#[derive(Debug, Clone)]
pub struct GradingConfig {
    pub min_score: i32,
    pub max_score: i32,
    groups: HashMap<String, GradingGroup>,
    calibration: HashMap<String, Vec<CalibrationQuestion>>,
    rubrics: HashMap<String, Rubric>,
    rest_group: String,
}

const NO_QUESTIONS: &[CalibrationQuestion] = &[];

impl GradingConfig {
    /// 从配置文件加载并校验
    pub fn load(path: &str) -> Result<Self> {
        let raw = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;
        let file: GradingConfigFile = raw.try_deserialize()?;
        Self::from_file(file)
    }

    fn from_file(file: GradingConfigFile) -> Result<Self> {
        if file.min_score >= file.max_score {
            return Err(GradeSystemError::configuration(format!(
                "分数区间非法: min_score={} max_score={}",
                file.min_score, file.max_score
            )));
        }

        if file.groups.is_empty() {
            return Err(GradeSystemError::configuration("未配置任何评分分组"));
        }

        // 恰好一个 rest 分组
        let mut rest_group = None;
        for (name, group) in &file.groups {
            match &group.emails {
                EmailAllowList::Rest(s) => {
                    if s != "rest" {
                        return Err(GradeSystemError::configuration(format!(
                            "分组 {name} 的 emails 字段非法: '{s}'，应为邮箱列表或 \"rest\""
                        )));
                    }
                    if let Some(other) = &rest_group {
                        return Err(GradeSystemError::configuration(format!(
                            "rest 分组重复: {other} 与 {name}"
                        )));
                    }
                    rest_group = Some(name.clone());
                }
                EmailAllowList::Emails(list) => {
                    for email in list {
                        validate_email(email).map_err(|e| {
                            GradeSystemError::configuration(format!(
                                "分组 {name} 白名单邮箱 '{email}' 非法: {e}"
                            ))
                        })?;
                    }
                }
            }
            if group.branches.is_empty() {
                return Err(GradeSystemError::configuration(format!(
                    "分组 {name} 未映射任何报名分支"
                )));
            }
        }
        let rest_group = rest_group
            .ok_or_else(|| GradeSystemError::configuration("缺少 rest 分组，无法兜底分配评分员"))?;

        // 校准题库：分组必须存在，标准分在区间内，维度必须有评分标准
        for (group, questions) in &file.calibration {
            if !file.groups.contains_key(group) {
                return Err(GradeSystemError::configuration(format!(
                    "校准题库引用了不存在的分组: {group}"
                )));
            }
            for q in questions {
                if q.expected_score < file.min_score || q.expected_score > file.max_score {
                    return Err(GradeSystemError::configuration(format!(
                        "校准题 {} 的标准分 {} 超出区间 [{}, {}]",
                        q.id, q.expected_score, file.min_score, file.max_score
                    )));
                }
                if !file.rubrics.contains_key(&q.criterion) {
                    return Err(GradeSystemError::configuration(format!(
                        "校准题 {} 的维度 '{}' 没有对应的评分标准",
                        q.id, q.criterion
                    )));
                }
            }
        }

        Ok(Self {
            min_score: file.min_score,
            max_score: file.max_score,
            groups: file.groups,
            calibration: file.calibration,
            rubrics: file.rubrics,
            rest_group,
        })
    }

    /// rest 分组名
    pub fn rest_group(&self) -> &str {
        &self.rest_group
    }

    pub fn group(&self, name: &str) -> Option<&GradingGroup> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &String> {
        self.groups.keys()
    }

    /// 某分组的校准题（固定顺序；未配置时为空）
    pub fn questions_for(&self, group: &str) -> &[CalibrationQuestion] {
        self.calibration
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or(NO_QUESTIONS)
    }

    pub fn rubric_for(&self, criterion: &str) -> Option<&Rubric> {
        self.rubrics.get(criterion)
    }

    /// 某分组映射的报名分支
    pub fn branches_for(&self, group: &str) -> &[String] {
        self.groups
            .get(group)
            .map(|g| g.branches.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> GradingConfig {
        let mut groups = HashMap::new();
        groups.insert(
            "general".to_string(),
            GradingGroup {
                emails: EmailAllowList::Rest("rest".to_string()),
                branches: vec!["general".to_string(), "campus".to_string()],
            },
        );
        groups.insert(
            "sponsor".to_string(),
            GradingGroup {
                emails: EmailAllowList::Emails(vec!["vip@corp.example.com".to_string()]),
                branches: vec!["sponsor".to_string()],
            },
        );

        let mut calibration = HashMap::new();
        calibration.insert(
            "general".to_string(),
            vec![
                CalibrationQuestion {
                    id: "gen-1".to_string(),
                    criterion: "passion".to_string(),
                    answer: "I really want to attend because...".to_string(),
                    expected_score: 2,
                },
                CalibrationQuestion {
                    id: "gen-2".to_string(),
                    criterion: "passion".to_string(),
                    answer: "Ever since I built my first robot...".to_string(),
                    expected_score: 4,
                },
            ],
        );
        calibration.insert(
            "sponsor".to_string(),
            vec![CalibrationQuestion {
                id: "spo-1".to_string(),
                criterion: "technical".to_string(),
                answer: "I maintain a distributed cache...".to_string(),
                expected_score: 3,
            }],
        );

        let mut rubrics = HashMap::new();
        rubrics.insert(
            "passion".to_string(),
            Rubric {
                question: "Why do you want to attend?".to_string(),
                rubric_link: "https://example.com/rubric/passion".to_string(),
                scoring_guide: "1 = generic, 4 = specific and personal".to_string(),
            },
        );
        rubrics.insert(
            "technical".to_string(),
            Rubric {
                question: "Describe a project you are proud of.".to_string(),
                rubric_link: "https://example.com/rubric/technical".to_string(),
                scoring_guide: "1 = no detail, 4 = deep technical ownership".to_string(),
            },
        );

        GradingConfig::from_file(GradingConfigFile {
            min_score: 1,
            max_score: 4,
            groups,
            calibration,
            rubrics,
        })
        .expect("test config should validate")
    }

    fn base_file() -> GradingConfigFile {
        let cfg = test_config();
        GradingConfigFile {
            min_score: cfg.min_score,
            max_score: cfg.max_score,
            groups: cfg.groups,
            calibration: cfg.calibration,
            rubrics: cfg.rubrics,
        }
    }

    #[test]
    fn test_valid_config_loads() {
        let cfg = test_config();
        assert_eq!(cfg.rest_group(), "general");
        assert_eq!(cfg.questions_for("general").len(), 2);
        assert_eq!(cfg.questions_for("unknown").len(), 0);
        assert_eq!(cfg.branches_for("sponsor"), ["sponsor"]);
        assert!(cfg.rubric_for("passion").is_some());
    }

    #[test]
    fn test_missing_rest_group_rejected() {
        let mut file = base_file();
        file.groups.get_mut("general").unwrap().emails =
            EmailAllowList::Emails(vec!["someone@example.com".to_string()]);
        let err = GradingConfig::from_file(file).unwrap_err();
        assert!(err.message().contains("rest"));
    }

    #[test]
    fn test_duplicate_rest_group_rejected() {
        let mut file = base_file();
        file.groups.get_mut("sponsor").unwrap().emails =
            EmailAllowList::Rest("rest".to_string());
        assert!(GradingConfig::from_file(file).is_err());
    }

    #[test]
    fn test_out_of_range_expected_score_rejected() {
        let mut file = base_file();
        file.calibration.get_mut("general").unwrap()[0].expected_score = 5;
        assert!(GradingConfig::from_file(file).is_err());
    }

    #[test]
    fn test_rubricless_criterion_rejected() {
        let mut file = base_file();
        file.rubrics.remove("technical");
        let err = GradingConfig::from_file(file).unwrap_err();
        assert!(err.message().contains("technical"));
    }

    #[test]
    fn test_invalid_allowlist_email_rejected() {
        let mut file = base_file();
        file.groups.get_mut("sponsor").unwrap().emails =
            EmailAllowList::Emails(vec!["not-an-email".to_string()]);
        assert!(GradingConfig::from_file(file).is_err());
    }

    #[test]
    fn test_calibration_for_unknown_group_rejected() {
        let mut file = base_file();
        file.calibration.insert("ghost".to_string(), vec![]);
        assert!(GradingConfig::from_file(file).is_err());
    }

    #[test]
    fn test_allows_email_case_insensitive() {
        let cfg = test_config();
        let sponsor = cfg.group("sponsor").unwrap();
        assert!(sponsor.allows_email("VIP@corp.example.com"));
        assert!(!sponsor.allows_email("other@corp.example.com"));
        assert!(!cfg.group("general").unwrap().allows_email("vip@corp.example.com"));
    }
}
