use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::{AppConfig, GradingConfig};
use crate::storage::Storage;
use std::sync::Arc;
use tracing::{info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub grading_config: Arc<GradingConfig>,
}

/// 创建缓存实例
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let config = AppConfig::get();
    let cache_type = &config.cache.cache_type;

    warn!("Attempting to create {} cache backend", cache_type);

    // 根据配置选择缓存后端
    if let Some(constructor) = get_object_cache_plugin(cache_type) {
        match constructor().await {
            Ok(cache) => {
                warn!("Successfully created {} cache backend", cache_type);
                return Ok(Arc::from(cache));
            }
            Err(e) => {
                warn!("Failed to create {} cache: {}", cache_type, e);

                // 如果配置的缓存失败，尝试回退策略
                if cache_type == "redis" {
                    warn!("Falling back to memory cache");
                    if let Some(fallback_constructor) = get_object_cache_plugin("moka") {
                        match fallback_constructor().await {
                            Ok(cache) => {
                                warn!(
                                    "Successfully created fallback Moka (in-memory) cache backend"
                                );
                                return Ok(Arc::from(cache));
                            }
                            Err(fallback_e) => {
                                warn!("Failed to create fallback Moka cache: {}", fallback_e);
                            }
                        }
                    }
                }
            }
        }
    } else {
        warn!("Cache backend '{}' not found in registry", cache_type);

        // 如果找不到配置的缓存类型，尝试默认的内存缓存
        if cache_type != "moka" {
            warn!("Falling back to default memory cache");
            if let Some(fallback_constructor) = get_object_cache_plugin("moka") {
                match fallback_constructor().await {
                    Ok(cache) => {
                        warn!("Successfully created fallback Moka (in-memory) cache backend");
                        return Ok(Arc::from(cache));
                    }
                    Err(fallback_e) => {
                        warn!("Failed to create fallback Moka cache: {}", fallback_e);
                    }
                }
            }
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 加载评分配置
///
/// 分组映射 / 校准题库 / 评分标准配置坏了就不该开始评分，
/// 校验失败直接终止启动。
fn load_grading_config() -> Arc<GradingConfig> {
    let config = AppConfig::get();
    match GradingConfig::load(&config.grading.config_file) {
        Ok(grading_config) => {
            info!(
                "评分配置加载完成: {} 个分组, rest 分组为 {}",
                grading_config.group_names().count(),
                grading_config.rest_group()
            );
            Arc::new(grading_config)
        }
        Err(e) => {
            eprintln!("Failed to load grading configuration: {e}");
            std::process::exit(1);
        }
    }
}

pub async fn prepare_server_startup() -> StartupContext {
    // 评分配置先于存储初始化，配置坏了不用等数据库
    let grading_config = load_grading_config();

    let storage = crate::storage::create_storage()
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize storage: {e}");
            std::process::exit(1);
        });

    let cache = create_cache().await.unwrap_or_else(|e| {
        eprintln!("Failed to initialize cache: {e}");
        std::process::exit(1);
    });

    StartupContext {
        storage,
        cache,
        grading_config,
    }
}
