//! GradeSystem - 文书评分与偏差校准后端服务
//!
//! 基于 Actix Web 构建的报名文书评分引擎：评分员先过校准题，
//! 按最小二乘拟合出每人每维度的分数修正表，再评正式文书。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis）
//! - `config`: 配置管理（应用配置 + 评分只读配置）
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层（生命周期/分派/校准/提交/报表）
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
