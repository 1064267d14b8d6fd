use crate::log::level::LogLevel;
use crate::log::sink::record::{EventInfo, PageViewInfo};
use crate::log::sink::track_timer::TrackTimer;
use crate::log::sink::{LoggerProvider, LoggingSink};
use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use smart_default::SmartDefault;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// 一次已送达的调用
#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    Log {
        level: LogLevel,
        message: String,
        extra: Option<Value>,
    },
    PageStarted(Option<String>),
    PageView(PageViewInfo),
    EventStarted(String),
    Event(EventInfo),
    UserId(Option<String>),
    Flush,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub provider: String,
    pub category: String,
    pub telemetry: Telemetry,
}

/// 共享的内存缓冲区
///
/// 同一个 provider 创建的所有 sink 写入同一个缓冲区；设置容量后丢弃最旧的记录
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    records: Arc<Mutex<VecDeque<TelemetryRecord>>>,
    capacity: Option<usize>,
}

impl MemoryBuffer {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            records: Arc::default(),
            capacity,
        }
    }

    fn push(&self, record: TelemetryRecord) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push_back(record);
        if let Some(capacity) = self.capacity {
            while records.len() > capacity {
                records.pop_front();
            }
        }
    }

    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// 只取日志消息，便于断言
    pub fn messages(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|record| match record.telemetry {
                Telemetry::Log { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// MemoryProvider 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct MemoryProviderConfig {
    /// provider 名称，过滤规则按此匹配
    #[default = "memory"]
    pub name: String,

    /// 最多保留的记录数，不设置则不限
    pub capacity: Option<usize>,
}

/// 内存 provider
///
/// 记录所有送达的调用，用于测试和暂存
pub struct MemoryProvider {
    name: String,
    buffer: MemoryBuffer,
}

impl MemoryProvider {
    pub fn new(config: MemoryProviderConfig) -> Self {
        Self {
            name: config.name,
            buffer: MemoryBuffer::new(config.capacity),
        }
    }

    /// 指定名称的无容量限制 provider
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(MemoryProviderConfig {
            name: name.into(),
            capacity: None,
        })
    }

    pub fn buffer(&self) -> MemoryBuffer {
        self.buffer.clone()
    }
}

impl LoggerProvider for MemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_logger(&self, category: &str) -> Arc<dyn LoggingSink> {
        Arc::new(MemorySink {
            provider: self.name.clone(),
            category: category.to_string(),
            buffer: self.buffer.clone(),
            pages: TrackTimer::new(),
            events: TrackTimer::new(),
        })
    }
}

crate::impl_from!(MemoryProviderConfig => MemoryProvider);
crate::impl_box_from!(MemoryProvider => dyn LoggerProvider);

/// 内存输出端
pub struct MemorySink {
    provider: String,
    category: String,
    buffer: MemoryBuffer,
    pages: TrackTimer,
    events: TrackTimer,
}

impl MemorySink {
    fn record(&self, telemetry: Telemetry) {
        self.buffer.push(TelemetryRecord {
            provider: self.provider.clone(),
            category: self.category.clone(),
            telemetry,
        });
    }
}

impl LoggingSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str, extra: Option<&Value>) -> Result<()> {
        self.record(Telemetry::Log {
            level,
            message: message.to_string(),
            extra: extra.cloned(),
        });
        Ok(())
    }

    fn start_track_page(&self, name: Option<&str>) -> Result<()> {
        self.pages.start(name.unwrap_or_default());
        self.record(Telemetry::PageStarted(name.map(str::to_string)));
        Ok(())
    }

    fn stop_track_page(&self, name: Option<&str>, info: Option<&PageViewInfo>) -> Result<()> {
        let Some(duration) = self.pages.stop(name.unwrap_or_default()) else {
            tracing::warn!(
                category = %self.category,
                page = name.unwrap_or_default(),
                "stop_track_page called without a matching start_track_page"
            );
            return Ok(());
        };

        let mut page = info.cloned().unwrap_or_default();
        if page.name.is_none() {
            page.name = name.map(str::to_string);
        }
        self.record(Telemetry::PageView(page.with_duration(duration)));
        Ok(())
    }

    fn track_page_view(&self, info: &PageViewInfo) -> Result<()> {
        self.record(Telemetry::PageView(info.clone()));
        Ok(())
    }

    fn start_track_event(&self, name: &str) -> Result<()> {
        self.events.start(name);
        self.record(Telemetry::EventStarted(name.to_string()));
        Ok(())
    }

    fn stop_track_event(&self, name: &str, info: Option<&EventInfo>) -> Result<()> {
        let Some(duration) = self.events.stop(name) else {
            tracing::warn!(
                category = %self.category,
                event = name,
                "stop_track_event called without a matching start_track_event"
            );
            return Ok(());
        };

        let event = info.cloned().unwrap_or_else(|| EventInfo::new(name));
        self.record(Telemetry::Event(event.with_duration(duration)));
        Ok(())
    }

    fn track_event(&self, info: &EventInfo) -> Result<()> {
        self.record(Telemetry::Event(info.clone()));
        Ok(())
    }

    fn set_user_id(&self, user_id: &str) -> Result<()> {
        self.record(Telemetry::UserId(Some(user_id.to_string())));
        Ok(())
    }

    fn clear_user_id(&self) -> Result<()> {
        self.record(Telemetry::UserId(None));
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.record(Telemetry::Flush);
        Ok(())
    }
}
