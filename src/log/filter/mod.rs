//! 过滤规则引擎
//!
//! 配置 → `ConfigParser` → 规则列表 → `RuleMatcher`（每个 provider × category 求值）
//! → 缓存在 `LoggerInformation` 中供 `FanoutLogger` 每次调用使用

mod error;
mod matcher;
mod parser;
mod resolver;
mod rule;

pub use error::FilterConfigError;
pub use matcher::RuleMatcher;
pub use parser::{ConfigNode, ConfigParser, ParsedFilterConfig};
pub use resolver::{FilterResolver, FilterSnapshot, LoggerInformation, ResolvedFilter};
pub use rule::{EventTable, FilterKind, FilterRule, LoggerFilterOptions, RuleValue};
