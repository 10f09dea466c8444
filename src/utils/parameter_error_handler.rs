//! 请求参数解析错误处理器
//!
//! 让 JSON / Query 解析失败也走统一的 ApiResponse 信封。

use actix_web::{HttpRequest, HttpResponse, error};

use crate::models::{ApiResponse, ErrorCode};

pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    let message = format!("请求体解析失败: {err}");
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

pub fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> error::Error {
    let message = format!("查询参数解析失败: {err}");
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}
