use crate::log::fanout_logger::FanoutLogger;
use crate::log::filter::{FilterConfigError, LoggerFilterOptions};
use crate::log::logger_factory::{LoggerFactory, LoggerFactoryConfig};
use crate::log::sink::{ConsoleProvider, ConsoleProviderConfig, LoggerProvider};
use anyhow::Result;
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;

/// 全局 LoggerFactory 单例
///
/// 默认只有一个输出到终端的 provider，不带任何过滤规则
static GLOBAL_LOGGER_FACTORY: Lazy<ArcSwap<LoggerFactory>> = Lazy::new(|| {
    let console: Arc<dyn LoggerProvider> =
        Arc::new(ConsoleProvider::new(ConsoleProviderConfig::default()));
    ArcSwap::from_pointee(LoggerFactory::with_options(
        vec![console],
        LoggerFilterOptions::default(),
    ))
});

/// 初始化全局 LoggerFactory
///
/// 替换整个工厂；之前通过 `get_logger` 取得的句柄仍绑定在旧工厂上
///
/// # 示例
///
/// ```ignore
/// let config = LoggerFactoryConfig::from_json(r#"{
///     providers: [{ type: "ConsoleProvider" }],
///     filter: { minLevel: "info" },
/// }"#)?;
/// tracklog::log::init_logger_factory(config)?;
/// ```
pub fn init_logger_factory(config: LoggerFactoryConfig) -> Result<()> {
    let factory = LoggerFactory::from_config(config)?;
    GLOBAL_LOGGER_FACTORY.store(Arc::new(factory));
    Ok(())
}

/// 获取全局 LoggerFactory
pub fn global_logger_factory() -> Arc<LoggerFactory> {
    GLOBAL_LOGGER_FACTORY.load_full()
}

/// 获取指定 category 的 logger（全局）
pub fn get_logger(category: &str) -> Arc<FanoutLogger> {
    global_logger_factory().create_logger(category)
}

/// 替换全局工厂的过滤配置，已有句柄立即生效
pub fn set_filter_config(config: &Value) -> Result<(), FilterConfigError> {
    global_logger_factory().set_config(config)
}

/// flush 全局工厂创建的所有 logger
pub fn flush_all() -> Result<()> {
    global_logger_factory().flush_all()
}
