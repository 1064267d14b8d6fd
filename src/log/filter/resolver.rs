use super::error::FilterConfigError;
use super::matcher::RuleMatcher;
use super::parser::ConfigParser;
use super::rule::{EventTable, FilterKind, FilterRule, LoggerFilterOptions};
use crate::log::level::LogLevel;
use crate::log::sink::LoggingSink;
use arc_swap::ArcSwap;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// 某个 (provider, category) 的过滤结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub min_level: Option<LogLevel>,
    pub page_view: Option<bool>,
    pub events: Option<EventTable>,
    pub user_id_enabled: Option<bool>,
}

impl ResolvedFilter {
    /// `None` 级别从不输出；未设置最低级别时全部放行
    pub fn allows_level(&self, level: LogLevel) -> bool {
        level != LogLevel::None && self.min_level.map_or(true, |min| level >= min)
    }

    pub fn allows_page_view(&self) -> bool {
        self.page_view != Some(false)
    }

    /// 事件表中没有的事件默认启用
    pub fn allows_event(&self, name: &str) -> bool {
        self.events
            .as_ref()
            .and_then(|events| events.get(name))
            .copied()
            != Some(false)
    }

    pub fn allows_user_id(&self) -> bool {
        self.user_id_enabled != Some(false)
    }
}

/// 带版本号的配置快照
#[derive(Debug, Default)]
pub struct FilterSnapshot {
    pub version: u64,
    pub options: LoggerFilterOptions,
}

impl FilterSnapshot {
    /// 对 (provider, category) 分别按三种规则种类求值
    pub fn resolve(&self, provider_name: &str, category: &str) -> ResolvedFilter {
        let rules = &self.options.rules;

        let min_level =
            RuleMatcher::select_best(rules, provider_name, category, FilterKind::LogLevel)
                .and_then(FilterRule::as_level)
                .or(self.options.min_level);
        let page_view =
            RuleMatcher::select_best(rules, provider_name, category, FilterKind::PageView)
                .and_then(FilterRule::as_toggle);
        let events = RuleMatcher::merge_events(rules, provider_name, category);

        ResolvedFilter {
            min_level,
            page_view,
            events,
            user_id_enabled: self.options.user_id_enabled,
        }
    }
}

/// 单个 (provider, category) 的缓存信息
///
/// 配置更新时由 `FilterResolver` 原地刷新，对象本身不变，已有的 logger 句柄立即看到新配置
pub struct LoggerInformation {
    sink: Arc<dyn LoggingSink>,
    provider_name: String,
    category: String,
    filter: ArcSwap<ResolvedFilter>,
}

impl LoggerInformation {
    pub fn sink(&self) -> &dyn LoggingSink {
        self.sink.as_ref()
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// 当前生效的过滤结果（整体替换，不会读到更新了一半的状态）
    pub fn filter(&self) -> Arc<ResolvedFilter> {
        self.filter.load_full()
    }

    fn refresh(&self, snapshot: &FilterSnapshot) {
        self.filter
            .store(Arc::new(snapshot.resolve(&self.provider_name, &self.category)));
    }
}

impl std::fmt::Debug for LoggerInformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerInformation")
            .field("provider_name", &self.provider_name)
            .field("category", &self.category)
            .field("filter", &self.filter.load_full())
            .finish()
    }
}

/// 过滤配置解析服务
///
/// 独占当前配置快照；所有创建过的 `LoggerInformation` 以弱引用登记，
/// 配置替换后通过 `refresh` 逐个重新求值
pub struct FilterResolver {
    snapshot: ArcSwap<FilterSnapshot>,
    // 写操作（替换快照、登记、刷新）都在这把锁内完成
    records: Mutex<Vec<Weak<LoggerInformation>>>,
}

impl FilterResolver {
    pub fn new(options: LoggerFilterOptions) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(FilterSnapshot {
                version: 1,
                options,
            }),
            records: Mutex::new(Vec::new()),
        }
    }

    /// 从原始配置创建
    pub fn from_config(config: &Value) -> Result<Self, FilterConfigError> {
        Ok(Self::new(ConfigParser::parse(config)?))
    }

    pub fn snapshot(&self) -> Arc<FilterSnapshot> {
        self.snapshot.load_full()
    }

    pub fn version(&self) -> u64 {
        self.snapshot.load().version
    }

    /// 按当前快照求值
    pub fn resolve(&self, provider_name: &str, category: &str) -> ResolvedFilter {
        self.snapshot.load().resolve(provider_name, category)
    }

    /// 创建并登记一条 `LoggerInformation`
    pub fn register(
        &self,
        sink: Arc<dyn LoggingSink>,
        provider_name: &str,
        category: &str,
    ) -> Arc<LoggerInformation> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        let info = Arc::new(LoggerInformation {
            sink,
            provider_name: provider_name.to_string(),
            category: category.to_string(),
            filter: ArcSwap::from_pointee(self.resolve(provider_name, category)),
        });
        records.push(Arc::downgrade(&info));

        info
    }

    /// 解析并替换配置；结构性错误时保留原配置
    pub fn set_config(&self, config: &Value) -> Result<(), FilterConfigError> {
        let options = ConfigParser::parse(config)?;
        self.set_options(options);
        Ok(())
    }

    /// 替换为已解析的配置并刷新所有登记的记录
    pub fn set_options(&self, options: LoggerFilterOptions) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);

        let version = self.snapshot.load().version + 1;
        self.snapshot
            .store(Arc::new(FilterSnapshot { version, options }));

        let live = Self::refresh_records(&mut records, &self.snapshot.load());
        tracing::debug!(version, live, "logger filter configuration replaced");
    }

    /// 用当前快照重新求值所有存活记录，返回存活数量
    pub fn refresh(&self) -> usize {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refresh_records(&mut records, &self.snapshot.load())
    }

    fn refresh_records(
        records: &mut Vec<Weak<LoggerInformation>>,
        snapshot: &FilterSnapshot,
    ) -> usize {
        records.retain(|record| match record.upgrade() {
            Some(info) => {
                info.refresh(snapshot);
                true
            }
            None => false,
        });
        records.len()
    }

    pub fn is_level_enabled(&self, provider_name: &str, category: &str, level: LogLevel) -> bool {
        self.resolve(provider_name, category).allows_level(level)
    }

    pub fn is_page_view_enabled(&self, provider_name: &str, category: &str) -> bool {
        self.resolve(provider_name, category).allows_page_view()
    }

    pub fn is_event_enabled(&self, provider_name: &str, category: &str, event: &str) -> bool {
        self.resolve(provider_name, category).allows_event(event)
    }

    pub fn is_user_id_enabled(&self) -> bool {
        self.snapshot.load().options.user_id_enabled != Some(false)
    }
}

impl Default for FilterResolver {
    fn default() -> Self {
        Self::new(LoggerFilterOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::sink::NoopSink;
    use serde_json::json;

    fn resolver(config: Value) -> FilterResolver {
        FilterResolver::from_config(&config).unwrap()
    }

    #[test]
    fn test_resolve_falls_back_to_global_min_level() {
        let resolver = resolver(json!({
            "minLevel": "warn",
            "logLevel": { "app": "debug" }
        }));

        assert_eq!(resolver.resolve("console", "app").min_level, Some(LogLevel::Debug));
        assert_eq!(resolver.resolve("console", "web").min_level, Some(LogLevel::Warn));
        assert_eq!(resolver.resolve("console", "web").page_view, None);
        assert_eq!(resolver.resolve("console", "web").events, None);
    }

    #[test]
    fn test_resolve_without_any_rule() {
        let resolver = FilterResolver::default();
        let filter = resolver.resolve("console", "app");
        assert_eq!(filter, ResolvedFilter::default());
        assert!(filter.allows_level(LogLevel::Trace));
        assert!(!filter.allows_level(LogLevel::None));
        assert!(filter.allows_page_view());
        assert!(filter.allows_event("anything"));
    }

    #[test]
    fn test_query_helpers() {
        let resolver = resolver(json!({
            "userIdEnabled": false,
            "console": {
                "logLevel": { "default": "error" },
                "pageView": false,
                "event": { "scroll": false }
            }
        }));

        assert!(!resolver.is_level_enabled("console", "x", LogLevel::Warn));
        assert!(resolver.is_level_enabled("console", "x", LogLevel::Critical));
        assert!(resolver.is_level_enabled("memory", "x", LogLevel::Trace));
        assert!(!resolver.is_page_view_enabled("console", "x"));
        assert!(resolver.is_page_view_enabled("memory", "x"));
        assert!(!resolver.is_event_enabled("console", "x", "scroll"));
        assert!(resolver.is_event_enabled("console", "x", "click"));
        assert!(!resolver.is_user_id_enabled());
    }

    #[test]
    fn test_registered_records_refresh_in_place() {
        let resolver = resolver(json!({ "minLevel": "trace" }));
        let info = resolver.register(Arc::new(NoopSink), "console", "app");
        assert_eq!(info.filter().min_level, Some(LogLevel::Trace));
        assert_eq!(resolver.version(), 1);

        resolver.set_config(&json!({ "minLevel": "error" })).unwrap();
        assert_eq!(info.filter().min_level, Some(LogLevel::Error));
        assert_eq!(resolver.version(), 2);
    }

    #[test]
    fn test_structural_error_keeps_previous_snapshot() {
        let resolver = resolver(json!({ "minLevel": "info" }));
        let info = resolver.register(Arc::new(NoopSink), "console", "app");

        assert!(resolver.set_config(&json!({ "rules": 1 })).is_err());
        assert_eq!(resolver.version(), 1);
        assert_eq!(info.filter().min_level, Some(LogLevel::Info));
    }

    #[test]
    fn test_dropped_records_are_pruned() {
        let resolver = FilterResolver::default();
        let kept = resolver.register(Arc::new(NoopSink), "console", "a");
        let dropped = resolver.register(Arc::new(NoopSink), "console", "b");
        assert_eq!(resolver.refresh(), 2);

        drop(dropped);
        assert_eq!(resolver.refresh(), 1);
        assert_eq!(kept.category(), "a");
    }
}
