//! 对象缓存层
//!
//! 可插拔的字符串对象缓存（Moka 内存 / Redis），
//! 后端通过 ctor 在进程启动时自注册，按配置选用。
//! 评分服务用它缓存排行榜等读多写少的聚合结果。

pub mod object_cache;
pub mod register;

use async_trait::async_trait;

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端暂时不可用等原因拿不到值，调用方按未命中处理
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

/// 声明并自注册一个缓存后端插件
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ident) => {
        paste::paste! {
            #[ctor::ctor]
            fn [<__register_object_cache_ $ty:snake>]() {
                $crate::cache::register::register_object_cache_plugin(
                    $name,
                    std::sync::Arc::new(|| {
                        Box::pin(async {
                            let cache = <$ty>::new().map_err(|e| {
                                $crate::errors::GradeSystemError::cache_connection(e)
                            })?;
                            Ok(Box::new(cache) as Box<dyn $crate::cache::ObjectCache>)
                        })
                    }),
                );
            }
        }
    };
}
