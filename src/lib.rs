//! TrackLog - 多 provider 日志与埋点分发库
//!
//! 一次调用分发到所有 provider，按 provider 和 category 分别过滤。
//!
//! ## 模块
//!
//! - **cfg**: 配置管理模块（`TypeOptions` 与按 trait 分组的类型注册表）
//! - **log**: 日志模块（过滤规则解析、匹配与分发）

pub mod cfg;
pub mod log;

// 重新导出主要的公共 API
pub use cfg::{create_trait_from_type_options, register_trait, TypeOptions};

pub use log::{
    get_logger, init_logger_factory, FanoutLogger, LogLevel, LoggerFactory, LoggerFactoryConfig,
    LoggerFilterOptions, LoggingSink, LoggerProvider,
};

#[doc(hidden)]
pub use serde_json as __serde_json;
