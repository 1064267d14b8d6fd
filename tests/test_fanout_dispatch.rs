//! LoggerFactory / FanoutLogger 分发的集成测试

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracklog::log::sink::{
    EventInfo, LoggerProvider, LoggingSink, MemoryBuffer, MemoryProvider, PageViewInfo, Telemetry,
};
use tracklog::log::{LogLevel, LoggerFactory, LoggerFactoryConfig};

// ============================================================================
// 测试用 provider
// ============================================================================

/// log 调用总是失败，其余调用计数
struct FailingProvider {
    flushes: Arc<AtomicUsize>,
}

struct FailingSink {
    flushes: Arc<AtomicUsize>,
}

impl LoggerProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn create_logger(&self, _category: &str) -> Arc<dyn LoggingSink> {
        Arc::new(FailingSink {
            flushes: Arc::clone(&self.flushes),
        })
    }
}

impl LoggingSink for FailingSink {
    fn log(&self, _level: LogLevel, _message: &str, _extra: Option<&Value>) -> Result<()> {
        Err(anyhow!("endpoint unreachable"))
    }

    fn start_track_page(&self, _name: Option<&str>) -> Result<()> {
        Ok(())
    }

    fn stop_track_page(&self, _name: Option<&str>, _info: Option<&PageViewInfo>) -> Result<()> {
        Ok(())
    }

    fn track_page_view(&self, _info: &PageViewInfo) -> Result<()> {
        Ok(())
    }

    fn start_track_event(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn stop_track_event(&self, _name: &str, _info: Option<&EventInfo>) -> Result<()> {
        Ok(())
    }

    fn track_event(&self, _info: &EventInfo) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn memory_provider(name: &str) -> (Arc<dyn LoggerProvider>, MemoryBuffer) {
    let provider = MemoryProvider::named(name);
    let buffer = provider.buffer();
    (Arc::new(provider), buffer)
}

// ============================================================================
// 测试用例
// ============================================================================

#[test]
fn test_same_category_returns_same_handle() {
    let (provider, _) = memory_provider("memory");
    let factory = LoggerFactory::new(vec![provider], &json!({})).unwrap();

    let a = factory.create_logger("checkout");
    let b = factory.create_logger("checkout");
    let c = factory.create_logger("search");

    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn test_set_config_applies_to_existing_handles() -> Result<()> {
    let (provider, buffer) = memory_provider("memory");
    let factory = LoggerFactory::new(vec![provider], &json!({ "minLevel": "trace" }))?;
    let logger = factory.create_logger("checkout");

    logger.trace("visible")?;
    factory.set_config(&json!({ "minLevel": "error" }))?;
    logger.trace("hidden")?;
    logger.warn("hidden")?;
    logger.error("visible again")?;

    assert_eq!(buffer.messages(), vec!["visible", "visible again"]);
    Ok(())
}

#[test]
fn test_provider_specific_filtering() -> Result<()> {
    let (console, console_buffer) = memory_provider("console");
    let (audit, audit_buffer) = memory_provider("audit");
    let factory = LoggerFactory::new(
        vec![console, audit],
        &json!({
            "minLevel": "info",
            "audit": {
                "logLevel": { "default": "error" },
                "pageView": false,
                "event": { "scroll": false }
            }
        }),
    )?;
    let logger = factory.create_logger("checkout");

    logger.info("order placed")?;
    logger.error("payment failed")?;
    logger.track_page_view(&PageViewInfo::new("cart"))?;
    logger.track_event(&EventInfo::new("scroll"))?;

    assert_eq!(console_buffer.len(), 4);
    assert_eq!(audit_buffer.messages(), vec!["payment failed"]);
    assert_eq!(audit_buffer.len(), 1);
    Ok(())
}

#[test]
fn test_track_page_and_event_timing() -> Result<()> {
    let (provider, buffer) = memory_provider("memory");
    let factory = LoggerFactory::new(vec![provider], &Value::Null)?;
    let logger = factory.create_logger("app");

    logger.start_track_page(Some("home"))?;
    logger.stop_track_page(Some("home"), None)?;
    logger.stop_track_page(Some("never-started"), None)?;
    logger.start_track_event("upload")?;
    logger.stop_track_event("upload", Some(&EventInfo::new("upload").with_property("size", 42)))?;

    let records = buffer.records();
    assert_eq!(records.len(), 4);
    match &records[1].telemetry {
        Telemetry::PageView(page) => {
            assert_eq!(page.name.as_deref(), Some("home"));
            assert!(page.duration.is_some());
        }
        other => panic!("unexpected telemetry: {:?}", other),
    }
    match &records[3].telemetry {
        Telemetry::Event(event) => {
            assert_eq!(event.properties["size"], 42);
            assert!(event.duration.is_some());
        }
        other => panic!("unexpected telemetry: {:?}", other),
    }
    Ok(())
}

#[test]
fn test_failing_sink_does_not_block_others() -> Result<()> {
    let flushes = Arc::new(AtomicUsize::new(0));
    let failing: Arc<dyn LoggerProvider> = Arc::new(FailingProvider {
        flushes: Arc::clone(&flushes),
    });
    let (memory, buffer) = memory_provider("memory");
    let factory = LoggerFactory::new(vec![failing, memory], &Value::Null)?;
    let logger = factory.create_logger("app");

    let err = logger.error("disk full").unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].provider_name, "failing");
    assert_eq!(buffer.messages(), vec!["disk full"]);

    factory.flush_all()?;
    assert_eq!(flushes.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_flush_ignores_filters() -> Result<()> {
    let (provider, buffer) = memory_provider("memory");
    let factory = LoggerFactory::new(
        vec![provider],
        &json!({ "minLevel": "none", "pageView": false, "userIdEnabled": false }),
    )?;
    let logger = factory.create_logger("app");

    logger.critical("blocked")?;
    logger.set_user_id("alice")?;
    logger.flush()?;

    let records = buffer.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].telemetry, Telemetry::Flush);
    Ok(())
}

#[test]
fn test_invalid_config_still_delivers() -> Result<()> {
    let (provider, buffer) = memory_provider("memory");
    let factory = LoggerFactory::new(
        vec![provider],
        &json!({ "minLevel": "important", "logLevel": { "a**b": "debug" } }),
    )?;

    factory.create_logger("a-b").error("still here")?;
    assert_eq!(buffer.messages(), vec!["still here"]);
    Ok(())
}

// ============================================================================
// 全局工厂
// ============================================================================

#[test]
#[serial]
fn test_global_factory_from_yaml() -> Result<()> {
    let config = LoggerFactoryConfig::from_yaml(
        r#"
providers:
  - type: MemoryProvider
    options:
      name: audit
  - type: NoopProvider
filter:
  audit:
    logLevel:
      default: warn
"#,
    )?;
    tracklog::log::init_logger_factory(config)?;

    let factory = tracklog::log::global_logger_factory();
    assert_eq!(factory.provider_names(), vec!["audit", "noop"]);

    let logger = tracklog::get_logger("global");
    assert!(Arc::ptr_eq(&logger, &tracklog::get_logger("global")));
    assert!(logger.is_enabled(LogLevel::Info));
    assert!(!factory.resolver().is_level_enabled("audit", "global", LogLevel::Info));

    tracklog::log::set_filter_config(&json!({ "minLevel": "error" }))?;
    assert!(!logger.is_enabled(LogLevel::Warn));
    assert_eq!(factory.config_version(), 2);
    Ok(())
}
