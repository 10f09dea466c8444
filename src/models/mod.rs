pub mod applications;
pub mod auth;
pub mod common;
pub mod graders;
pub mod grading;
pub mod reviews;

pub use common::error_code::ErrorCode;
pub use common::response::ApiResponse;

/// 程序启动时间，用于系统状态接口
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
