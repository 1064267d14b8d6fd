use crate::cfg::TypeOptions;
use crate::log::fanout_logger::FanoutLogger;
use crate::log::filter::{FilterConfigError, FilterResolver, LoggerFilterOptions};
use crate::log::sink::{create_provider_from_options, register_providers, LoggerProvider};
use anyhow::Result;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::Value;
use smart_default::SmartDefault;
use std::sync::Arc;

// 注册失败时不记为已完成，下次调用重试
static PROVIDERS_REGISTERED: OnceCell<()> = OnceCell::new();

fn ensure_providers_registered() -> Result<()> {
    PROVIDERS_REGISTERED.get_or_try_init(register_providers)?;
    Ok(())
}

/// LoggerFactory 配置
///
/// # 示例
///
/// ```ignore
/// {
///     providers: [
///         { type: "ConsoleProvider", options: { colored: true } },
///         { type: "MemoryProvider", options: { name: "audit" } },
///     ],
///     filter: {
///         minLevel: "info",
///         console: { logLevel: { "ng*": "debug" } },
///     },
/// }
/// ```
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct LoggerFactoryConfig {
    /// provider 列表，按顺序分发
    #[default(vec![TypeOptions::new("ConsoleProvider")])]
    pub providers: Vec<TypeOptions>,

    /// 过滤配置（原始形式，交给 ConfigParser 解析）
    pub filter: Value,
}

impl LoggerFactoryConfig {
    /// 从 JSON 字符串加载（支持 JSON5 格式）
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(json5::from_str(json_str)?)
    }

    /// 从 YAML 字符串加载
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml_str)?)
    }

    /// 从 TOML 字符串加载
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }
}

/// Logger 工厂
///
/// 持有 provider 列表和过滤配置，按 category 创建并缓存 `FanoutLogger`。
/// 同一 category 始终返回同一个句柄，配置替换后已有句柄立即生效
pub struct LoggerFactory {
    providers: Vec<Arc<dyn LoggerProvider>>,
    resolver: FilterResolver,
    loggers: DashMap<String, Arc<FanoutLogger>>,
}

impl LoggerFactory {
    /// 使用原始过滤配置创建
    pub fn new(
        providers: Vec<Arc<dyn LoggerProvider>>,
        config: &Value,
    ) -> Result<Self, FilterConfigError> {
        Ok(Self::with_resolver(
            providers,
            FilterResolver::from_config(config)?,
        ))
    }

    /// 使用已解析的过滤配置创建
    pub fn with_options(
        providers: Vec<Arc<dyn LoggerProvider>>,
        options: LoggerFilterOptions,
    ) -> Self {
        Self::with_resolver(providers, FilterResolver::new(options))
    }

    fn with_resolver(providers: Vec<Arc<dyn LoggerProvider>>, resolver: FilterResolver) -> Self {
        Self {
            providers,
            resolver,
            loggers: DashMap::new(),
        }
    }

    /// 从配置创建，provider 通过注册表按 type 构造
    pub fn from_config(config: LoggerFactoryConfig) -> Result<Self> {
        ensure_providers_registered()?;

        let providers = config
            .providers
            .iter()
            .map(create_provider_from_options)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(providers, &config.filter)?)
    }

    /// 获取 category 对应的 logger，不存在时创建
    pub fn create_logger(&self, category: &str) -> Arc<FanoutLogger> {
        if let Some(logger) = self.loggers.get(category) {
            return Arc::clone(logger.value());
        }

        let entry = self
            .loggers
            .entry(category.to_string())
            .or_insert_with(|| {
                let loggers = self
                    .providers
                    .iter()
                    .map(|provider| {
                        self.resolver.register(
                            provider.create_logger(category),
                            provider.name(),
                            category,
                        )
                    })
                    .collect();
                Arc::new(FanoutLogger::new(category, loggers))
            });
        Arc::clone(entry.value())
    }

    /// 替换过滤配置；结构性错误时保留原配置
    pub fn set_config(&self, config: &Value) -> Result<(), FilterConfigError> {
        self.resolver.set_config(config)
    }

    /// 替换为已解析的过滤配置
    pub fn set_options(&self, options: LoggerFilterOptions) {
        self.resolver.set_options(options)
    }

    /// 当前生效的过滤配置
    pub fn filter_options(&self) -> LoggerFilterOptions {
        self.resolver.snapshot().options.clone()
    }

    /// 配置版本号，每次替换加一
    pub fn config_version(&self) -> u64 {
        self.resolver.version()
    }

    pub fn resolver(&self) -> &FilterResolver {
        &self.resolver
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| provider.name().to_string())
            .collect()
    }

    /// 已创建的 category 列表
    pub fn categories(&self) -> Vec<String> {
        self.loggers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// flush 所有已创建的 logger
    pub fn flush_all(&self) -> Result<()> {
        let mut failed = Vec::new();
        for entry in self.loggers.iter() {
            if let Err(err) = entry.value().flush() {
                failed.push(format!("{}: {}", entry.key(), err));
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("flush failed: {}", failed.join("; ")))
        }
    }
}

impl std::fmt::Debug for LoggerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerFactory")
            .field("providers", &self.provider_names())
            .field("version", &self.config_version())
            .field("categories", &self.categories())
            .finish()
    }
}
