//! 日志模块
//!
//! 一个 logger 同时分发到多个 provider，每个 (provider, category) 组合按过滤规则
//! 独立决定是否输出。
//!
//! # 特性
//!
//! - 日志级别：Trace, Debug, Info, Warn, Error, Critical, None
//! - 页面访问、事件、用户 ID 的独立开关
//! - 过滤规则支持 provider 分组和 category 通配符（`ng*log`）
//! - 运行时替换配置，已创建的 logger 立即生效
//! - provider 通过 `TypeOptions` 配置创建
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use tracklog::log::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LoggerFactoryConfig::from_json(r#"
//!         {
//!             providers: [
//!                 { type: "ConsoleProvider", options: { colored: true } },
//!             ],
//!             filter: {
//!                 minLevel: "info",
//!                 console: {
//!                     logLevel: { "db*": "warn" },
//!                     event: { scroll: false },
//!                 },
//!             },
//!         }
//!     "#)?;
//!     init_logger_factory(config)?;
//!
//!     let logger = get_logger("checkout");
//!     logger.info("application started")?;
//!     tracklog::warn!(logger, "slow request", "duration_ms" => 1500)?;
//!
//!     Ok(())
//! }
//! ```

pub mod fanout_logger;
pub mod filter;
pub mod global_logger_factory;
pub mod level;
pub mod logger_factory;
pub mod macros;
pub mod sink;

pub use fanout_logger::{DispatchError, FanoutLogger, SinkFailure};
pub use filter::{
    ConfigParser, FilterConfigError, FilterResolver, FilterRule, LoggerFilterOptions,
    ResolvedFilter, RuleMatcher,
};
pub use level::LogLevel;
pub use logger_factory::{LoggerFactory, LoggerFactoryConfig};
pub use sink::{
    register_providers, ConsoleProvider, ConsoleProviderConfig, EventInfo, LoggerProvider,
    LoggingSink, MemoryProvider, MemoryProviderConfig, NoopProvider, NoopProviderConfig,
    PageViewInfo,
};

pub use global_logger_factory::{
    flush_all, get_logger, global_logger_factory, init_logger_factory, set_filter_config,
};
