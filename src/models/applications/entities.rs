use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 报名表状态
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/application.ts")]
pub enum ApplicationStatus {
    Draft,      // 草稿，不可评分
    Submitted,  // 已提交待评审
    Accepted,   // 已录取
    Rejected,   // 已拒绝
    Waitlisted, // 候补
}

impl ApplicationStatus {
    pub const DRAFT: &'static str = "draft";
    pub const SUBMITTED: &'static str = "submitted";
    pub const ACCEPTED: &'static str = "accepted";
    pub const REJECTED: &'static str = "rejected";
    pub const WAITLISTED: &'static str = "waitlisted";
}

impl<'de> Deserialize<'de> for ApplicationStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            ApplicationStatus::DRAFT => Ok(ApplicationStatus::Draft),
            ApplicationStatus::SUBMITTED => Ok(ApplicationStatus::Submitted),
            ApplicationStatus::ACCEPTED => Ok(ApplicationStatus::Accepted),
            ApplicationStatus::REJECTED => Ok(ApplicationStatus::Rejected),
            ApplicationStatus::WAITLISTED => Ok(ApplicationStatus::Waitlisted),
            _ => Err(serde::de::Error::custom(format!(
                "无效的报名表状态: '{s}'. 支持的状态: draft, submitted, accepted, rejected, waitlisted"
            ))),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationStatus::Draft => write!(f, "{}", ApplicationStatus::DRAFT),
            ApplicationStatus::Submitted => write!(f, "{}", ApplicationStatus::SUBMITTED),
            ApplicationStatus::Accepted => write!(f, "{}", ApplicationStatus::ACCEPTED),
            ApplicationStatus::Rejected => write!(f, "{}", ApplicationStatus::REJECTED),
            ApplicationStatus::Waitlisted => write!(f, "{}", ApplicationStatus::WAITLISTED),
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "waitlisted" => Ok(ApplicationStatus::Waitlisted),
            _ => Err(format!("Invalid application status: {s}")),
        }
    }
}

/// 报名表内嵌的文书题
///
/// 提交后不可修改；criterion 对应评分配置里的一个打分维度。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/application.ts")]
pub struct Essay {
    pub id: String,
    pub criterion: String,
    pub answer: String,
}

// 报名表实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/application.ts")]
pub struct Application {
    pub id: i64,
    pub event_id: i64,
    pub branch: String,
    pub school: String,
    pub applicant_email: String,
    pub status: ApplicationStatus,
    pub essays: Vec<Essay>,
    pub grading_complete: bool,
    pub final_score: Option<f64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Application {
    /// 按文书 ID 查找内嵌文书
    pub fn essay(&self, essay_id: &str) -> Option<&Essay> {
        self.essays.iter().find(|e| e.id == essay_id)
    }
}
