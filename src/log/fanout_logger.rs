use crate::log::filter::{LoggerInformation, ResolvedFilter};
use crate::log::level::LogLevel;
use crate::log::sink::{EventInfo, LoggingSink, PageViewInfo};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// 单个 sink 的失败
#[derive(Debug)]
pub struct SinkFailure {
    pub provider_name: String,
    pub error: anyhow::Error,
}

/// 分发失败
///
/// 某个 sink 出错不影响其他 sink 收到调用，所有失败汇总在这里
#[derive(Error, Debug)]
#[error("{} failed for {} sink(s): {}", .operation, .failures.len(), describe(.failures))]
pub struct DispatchError {
    pub operation: &'static str,
    pub failures: Vec<SinkFailure>,
}

fn describe(failures: &[SinkFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{}: {}", failure.provider_name, failure.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// 按 category 聚合的 logger
///
/// 持有每个 provider 一条 `LoggerInformation`，每次调用按各自的过滤结果决定是否转发
pub struct FanoutLogger {
    category: String,
    loggers: Vec<Arc<LoggerInformation>>,
}

impl FanoutLogger {
    pub fn new(category: impl Into<String>, loggers: Vec<Arc<LoggerInformation>>) -> Self {
        Self {
            category: category.into(),
            loggers,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn loggers(&self) -> &[Arc<LoggerInformation>] {
        &self.loggers
    }

    /// 是否至少有一个 sink 会收到该级别的日志
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.loggers
            .iter()
            .any(|info| info.filter().allows_level(level))
    }

    fn dispatch(
        &self,
        operation: &'static str,
        allow: impl Fn(&ResolvedFilter) -> bool,
        call: impl Fn(&dyn LoggingSink) -> anyhow::Result<()>,
    ) -> Result<(), DispatchError> {
        let mut failures = Vec::new();

        for info in &self.loggers {
            if !allow(info.filter().as_ref()) {
                continue;
            }
            if let Err(error) = call(info.sink()) {
                tracing::error!(
                    provider = info.provider_name(),
                    category = %self.category,
                    operation,
                    error = %error,
                    "logging sink failed"
                );
                failures.push(SinkFailure {
                    provider_name: info.provider_name().to_string(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError {
                operation,
                failures,
            })
        }
    }

    /// 记录日志
    pub fn log(
        &self,
        level: LogLevel,
        message: &str,
        extra: Option<&Value>,
    ) -> Result<(), DispatchError> {
        if level == LogLevel::None {
            return Ok(());
        }
        self.dispatch(
            "log",
            |filter| filter.allows_level(level),
            |sink| sink.log(level, message, extra),
        )
    }

    /// 记录 TRACE 级别日志
    pub fn trace(&self, message: &str) -> Result<(), DispatchError> {
        self.log(LogLevel::Trace, message, None)
    }

    /// 记录 DEBUG 级别日志
    pub fn debug(&self, message: &str) -> Result<(), DispatchError> {
        self.log(LogLevel::Debug, message, None)
    }

    /// 记录 INFO 级别日志
    pub fn info(&self, message: &str) -> Result<(), DispatchError> {
        self.log(LogLevel::Info, message, None)
    }

    /// 记录 WARN 级别日志
    pub fn warn(&self, message: &str) -> Result<(), DispatchError> {
        self.log(LogLevel::Warn, message, None)
    }

    /// 记录 ERROR 级别日志
    pub fn error(&self, message: &str) -> Result<(), DispatchError> {
        self.log(LogLevel::Error, message, None)
    }

    /// 记录 CRITICAL 级别日志
    pub fn critical(&self, message: &str) -> Result<(), DispatchError> {
        self.log(LogLevel::Critical, message, None)
    }

    pub fn start_track_page(&self, name: Option<&str>) -> Result<(), DispatchError> {
        self.dispatch(
            "start_track_page",
            ResolvedFilter::allows_page_view,
            |sink| sink.start_track_page(name),
        )
    }

    /// 结束页面计时；配对检查由 sink 负责
    pub fn stop_track_page(
        &self,
        name: Option<&str>,
        info: Option<&PageViewInfo>,
    ) -> Result<(), DispatchError> {
        self.dispatch(
            "stop_track_page",
            ResolvedFilter::allows_page_view,
            |sink| sink.stop_track_page(name, info),
        )
    }

    pub fn track_page_view(&self, info: &PageViewInfo) -> Result<(), DispatchError> {
        self.dispatch(
            "track_page_view",
            ResolvedFilter::allows_page_view,
            |sink| sink.track_page_view(info),
        )
    }

    pub fn start_track_event(&self, name: &str) -> Result<(), DispatchError> {
        self.dispatch(
            "start_track_event",
            |filter| filter.allows_event(name),
            |sink| sink.start_track_event(name),
        )
    }

    pub fn stop_track_event(
        &self,
        name: &str,
        info: Option<&EventInfo>,
    ) -> Result<(), DispatchError> {
        self.dispatch(
            "stop_track_event",
            |filter| filter.allows_event(name),
            |sink| sink.stop_track_event(name, info),
        )
    }

    pub fn track_event(&self, info: &EventInfo) -> Result<(), DispatchError> {
        self.dispatch(
            "track_event",
            |filter| filter.allows_event(&info.name),
            |sink| sink.track_event(info),
        )
    }

    pub fn set_user_id(&self, user_id: &str) -> Result<(), DispatchError> {
        self.dispatch("set_user_id", ResolvedFilter::allows_user_id, |sink| {
            sink.set_user_id(user_id)
        })
    }

    pub fn clear_user_id(&self) -> Result<(), DispatchError> {
        self.dispatch("clear_user_id", ResolvedFilter::allows_user_id, |sink| {
            sink.clear_user_id()
        })
    }

    /// 不做过滤，转发给所有 sink
    pub fn flush(&self) -> Result<(), DispatchError> {
        self.dispatch("flush", |_| true, |sink| sink.flush())
    }
}

impl std::fmt::Debug for FanoutLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutLogger")
            .field("category", &self.category)
            .field("loggers", &self.loggers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::filter::FilterResolver;
    use crate::log::sink::{LoggerProvider, MemoryProvider, Telemetry};
    use anyhow::anyhow;
    use serde_json::json;

    struct FailingSink;

    impl LoggingSink for FailingSink {
        fn log(&self, _: LogLevel, _: &str, _: Option<&Value>) -> anyhow::Result<()> {
            Err(anyhow!("transport down"))
        }
        fn start_track_page(&self, _: Option<&str>) -> anyhow::Result<()> {
            Ok(())
        }
        fn stop_track_page(&self, _: Option<&str>, _: Option<&PageViewInfo>) -> anyhow::Result<()> {
            Ok(())
        }
        fn track_page_view(&self, _: &PageViewInfo) -> anyhow::Result<()> {
            Ok(())
        }
        fn start_track_event(&self, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn stop_track_event(&self, _: &str, _: Option<&EventInfo>) -> anyhow::Result<()> {
            Ok(())
        }
        fn track_event(&self, _: &EventInfo) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn fanout(
        resolver: &FilterResolver,
        provider: &MemoryProvider,
        category: &str,
    ) -> FanoutLogger {
        let info = resolver.register(provider.create_logger(category), provider.name(), category);
        FanoutLogger::new(category, vec![info])
    }

    #[test]
    fn test_log_respects_min_level() -> anyhow::Result<()> {
        let resolver = FilterResolver::from_config(&json!({ "minLevel": "warn" }))?;
        let memory = MemoryProvider::named("memory");
        let logger = fanout(&resolver, &memory, "app");

        logger.info("dropped")?;
        logger.warn("kept")?;
        logger.log(LogLevel::None, "never", None)?;
        logger.critical("also kept")?;

        assert_eq!(memory.buffer().messages(), vec!["kept", "also kept"]);
        assert!(!logger.is_enabled(LogLevel::Info));
        assert!(logger.is_enabled(LogLevel::Error));
        Ok(())
    }

    #[test]
    fn test_none_level_config_blocks_everything() -> anyhow::Result<()> {
        let resolver = FilterResolver::from_config(&json!({ "logLevel": { "app": "none" } }))?;
        let memory = MemoryProvider::named("memory");
        let logger = fanout(&resolver, &memory, "app");

        logger.critical("blocked")?;
        assert!(memory.buffer().is_empty());
        Ok(())
    }

    #[test]
    fn test_page_view_and_event_gating() -> anyhow::Result<()> {
        let resolver = FilterResolver::from_config(&json!({
            "pageView": false,
            "event": { "scroll": false }
        }))?;
        let memory = MemoryProvider::named("memory");
        let logger = fanout(&resolver, &memory, "app");

        logger.track_page_view(&PageViewInfo::new("home"))?;
        logger.start_track_page(Some("home"))?;
        logger.track_event(&EventInfo::new("scroll"))?;
        logger.track_event(&EventInfo::new("click"))?;

        let records = memory.buffer().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].telemetry, Telemetry::Event(EventInfo::new("click")));
        Ok(())
    }

    #[test]
    fn test_flush_is_never_filtered() -> anyhow::Result<()> {
        let resolver =
            FilterResolver::from_config(&json!({ "minLevel": "none", "pageView": false }))?;
        let memory = MemoryProvider::named("memory");
        let logger = fanout(&resolver, &memory, "app");

        logger.flush()?;
        assert_eq!(memory.buffer().records()[0].telemetry, Telemetry::Flush);
        Ok(())
    }

    #[test]
    fn test_user_id_gating() -> anyhow::Result<()> {
        let resolver = FilterResolver::from_config(&json!({ "userIdEnabled": false }))?;
        let memory = MemoryProvider::named("memory");
        let logger = fanout(&resolver, &memory, "app");

        logger.set_user_id("alice")?;
        logger.clear_user_id()?;
        assert!(memory.buffer().is_empty());
        Ok(())
    }

    #[test]
    fn test_sink_failure_does_not_stop_other_sinks() {
        let resolver = FilterResolver::default();
        let memory = MemoryProvider::named("memory");
        let failing = resolver.register(Arc::new(FailingSink), "broken", "app");
        let working = resolver.register(memory.create_logger("app"), "memory", "app");
        let logger = FanoutLogger::new("app", vec![failing, working]);

        let err = logger.info("still delivered").unwrap_err();
        assert_eq!(err.operation, "log");
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].provider_name, "broken");
        assert!(err.to_string().contains("transport down"));
        assert_eq!(memory.buffer().messages(), vec!["still delivered"]);
    }
}
