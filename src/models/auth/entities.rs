use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色（由外部认证服务签发，本服务只做校验）
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub enum UserRole {
    Hacker, // 参赛者
    Judge,  // 评审
    Admin,  // 管理员
}

impl UserRole {
    pub const HACKER: &'static str = "hacker";
    pub const JUDGE: &'static str = "judge";
    pub const ADMIN: &'static str = "admin";

    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }
    pub fn judge_roles() -> &'static [&'static UserRole] {
        &[&Self::Judge, &Self::Admin]
    }
    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Hacker, &Self::Judge, &Self::Admin]
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            UserRole::HACKER => Ok(UserRole::Hacker),
            UserRole::JUDGE => Ok(UserRole::Judge),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: hacker, judge, admin"
            ))),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Hacker => write!(f, "{}", UserRole::HACKER),
            UserRole::Judge => write!(f, "{}", UserRole::JUDGE),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hacker" => Ok(UserRole::Hacker),
            "judge" => Ok(UserRole::Judge),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {s}")),
        }
    }
}

/// 经过 JWT 校验的当前用户
///
/// 账号体系归外部认证服务管理，这里只保留评分引擎需要的字段：
/// id 用于定位 Grader 记录，email 用于分组白名单解析。
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub struct AuthenticatedUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_round_trip() {
        for s in ["hacker", "judge", "admin"] {
            assert_eq!(UserRole::from_str(s).unwrap().to_string(), s);
        }
        assert!(UserRole::from_str("organizer").is_err());
    }

    #[test]
    fn test_judge_roles_include_admin() {
        assert!(UserRole::judge_roles().contains(&&UserRole::Admin));
        assert!(!UserRole::judge_roles().contains(&&UserRole::Hacker));
    }
}
