use crate::log::level::LogLevel;
use crate::log::sink::record::{EventInfo, PageViewInfo};
use crate::log::sink::{LoggerProvider, LoggingSink};
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use smart_default::SmartDefault;
use std::sync::Arc;

/// NoopProvider 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct NoopProviderConfig {
    #[default = "noop"]
    pub name: String,
}

/// 丢弃所有调用的 provider
pub struct NoopProvider {
    config: NoopProviderConfig,
}

impl NoopProvider {
    pub fn new(config: NoopProviderConfig) -> Self {
        Self { config }
    }
}

impl LoggerProvider for NoopProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn create_logger(&self, _category: &str) -> Arc<dyn LoggingSink> {
        Arc::new(NoopSink)
    }
}

crate::impl_from!(NoopProviderConfig => NoopProvider);
crate::impl_box_from!(NoopProvider => dyn LoggerProvider);

pub struct NoopSink;

impl LoggingSink for NoopSink {
    fn log(&self, _level: LogLevel, _message: &str, _extra: Option<&Value>) -> Result<()> {
        Ok(())
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
}
