/*!
 * JWT 认证中间件
 *
 * 此中间件用于验证 JWT 令牌的有效性，确保只有经过身份验证的用户才能访问受保护的路由。
 * 令牌由外部认证服务签发（共享密钥），这里只校验签名和有效期，
 * 并把 Claims 中的用户信息放进请求扩展。
 *
 * ## 使用方法
 *
 * 1. 在路由上应用中间件：
 * ```rust,ignore
 * use actix_web::{web, App, HttpServer};
 * use crate::middlewares::require_jwt::RequireJWT;
 *
 * HttpServer::new(|| {
 *     App::new()
 *         .service(
 *             web::scope("/api")
 *                 .wrap(RequireJWT)  // 应用JWT验证中间件
 *                 .route("/protected", web::get().to(protected_handler))
 *         )
 * })
 * ```
 *
 * 2. 在处理程序中提取用户信息：
 * ```rust,ignore
 * async fn protected_handler(req: HttpRequest) -> Result<HttpResponse> {
 *     if let Some(user) = RequireJWT::extract_user(&req) {
 *         return Ok(HttpResponse::Ok().json(format!("Hello, {}! Role: {}", user.email, user.role)));
 *     }
 *     Ok(HttpResponse::InternalServerError().finish())
 * }
 * ```
 *
 * ## 认证流程
 *
 * 1. 客户端在请求头中包含 `Authorization: Bearer <JWT_TOKEN>`
 * 2. 中间件提取并验证JWT令牌
 * 3. 如果令牌有效，将用户信息存储在请求扩展中，继续处理请求
 * 4. 如果令牌无效或缺失，返回401未授权错误
 *
 * ## 配置
 *
 * 确保在环境变量中设置了 `JWT_SECRET`，与认证服务保持一致。
 */

use crate::models::auth::entities::{AuthenticatedUser, UserRole};
use crate::models::{ApiResponse, ErrorCode};
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::str::FromStr;
use tracing::{debug, info};

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

// 辅助函数：创建错误响应
fn create_error_response(status: StatusCode, message: &str) -> HttpResponse {
    match status {
        StatusCode::NO_CONTENT => HttpResponse::build(status)
            .insert_header((CONTENT_TYPE, "text/plain; charset=utf-8"))
            .finish(),
        _ => HttpResponse::build(status)
            .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
            .json(ApiResponse::<()>::error_empty(
                ErrorCode::Unauthorized,
                message,
            )),
    }
}

// 辅助函数：提取并验证 JWT access token
fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<AuthenticatedUser, String> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = crate::utils::jwt::JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| "Invalid user ID in JWT".to_string())?;
    let role = UserRole::from_str(&claims.role)
        .map_err(|_| format!("Invalid role in JWT: {}", claims.role))?;

    Ok(AuthenticatedUser {
        id: user_id,
        email: claims.email,
        role,
    })
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 处理 OPTIONS 请求
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, "").map_into_right_body(),
                ));
            }

            // 验证 JWT token
            match extract_and_validate_jwt(&req) {
                Ok(user) => {
                    debug!("JWT authentication successful for ID: {}", user.id);
                    req.extensions_mut().insert(user);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 辅助函数：从请求中提取用户信息
impl RequireJWT {
    /// 从请求扩展中提取当前用户
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_user(req: &actix_web::HttpRequest) -> Option<AuthenticatedUser> {
        req.extensions().get::<AuthenticatedUser>().cloned()
    }

    /// 从请求扩展中提取用户ID
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions()
            .get::<AuthenticatedUser>()
            .map(|user| user.id)
    }

    /// 从请求扩展中提取用户角色
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions()
            .get::<AuthenticatedUser>()
            .map(|user| user.role.clone())
    }
}
