//! API 业务错误码
//!
//! 与 HTTP 状态码分离的机器可读错误码，前端据此分支处理。

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 40000,
    Unauthorized = 40100,
    Forbidden = 40300,
    NotFound = 40400,
    InternalServerError = 50000,

    // 评分流程错误
    CalibrationIncomplete = 42001,
    CalibrationAlreadyComplete = 42002,
    MissingEssayReference = 42003,
    ScoreOutOfRange = 42004,
    NoEssayEligible = 42005,

    // 资源错误
    GraderNotFound = 42401,
    ApplicationNotFound = 42402,
    EssayNotFound = 42403,

    // 并发冲突：调用方应重新拉取下一题后重试
    ReviewConflict = 42901,
    GraderStateConflict = 42902,

    // 配置错误
    GradingConfigError = 52001,
}
