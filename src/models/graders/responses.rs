use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 排行榜单项
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grader.ts")]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub graded: i64,
}

/// 排行榜响应
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/grader.ts")]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}
