use crate::log::level::LogLevel;
use crate::log::sink::record::{EventInfo, PageViewInfo};
use crate::log::sink::track_timer::TrackTimer;
use crate::log::sink::{LoggerProvider, LoggingSink};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use serde::Deserialize;
use serde_json::{Map, Value};
use smart_default::SmartDefault;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

/// 输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Stdout,
    Stderr,
}

/// ConsoleProvider 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ConsoleProviderConfig {
    /// provider 名称，过滤规则按此匹配
    #[default = "console"]
    pub name: String,

    /// 输出到 stdout 还是 stderr
    pub target: Target,

    /// 是否启用颜色输出
    #[default = false]
    pub colored: bool,
}

/// 终端 provider
///
/// 每次调用输出一行文本
pub struct ConsoleProvider {
    config: Arc<ConsoleProviderConfig>,
}

impl ConsoleProvider {
    pub fn new(config: ConsoleProviderConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl LoggerProvider for ConsoleProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn create_logger(&self, category: &str) -> Arc<dyn LoggingSink> {
        Arc::new(ConsoleSink {
            category: category.to_string(),
            config: Arc::clone(&self.config),
            pages: TrackTimer::new(),
            events: TrackTimer::new(),
        })
    }
}

crate::impl_from!(ConsoleProviderConfig => ConsoleProvider);
crate::impl_box_from!(ConsoleProvider => dyn LoggerProvider);

/// 终端输出端
pub struct ConsoleSink {
    category: String,
    config: Arc<ConsoleProviderConfig>,
    pages: TrackTimer,
    events: TrackTimer,
}

impl ConsoleSink {
    /// 格式: 2025-01-19T12:34:56.789Z INFO     [category] message | {"k":"v"}
    fn format_line(&self, label: &str, body: &str) -> String {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let label = format!("{:<8}", label);

        if self.config.colored {
            format!(
                "{} {} [{}] {}",
                timestamp.dimmed(),
                colorize_label(&label),
                self.category.cyan(),
                body
            )
        } else {
            format!("{} {} [{}] {}", timestamp, label, self.category, body)
        }
    }

    fn write_line(&self, label: &str, body: &str) -> Result<()> {
        let line = self.format_line(label, body);
        match self.config.target {
            Target::Stdout => writeln!(io::stdout().lock(), "{}", line)?,
            Target::Stderr => writeln!(io::stderr().lock(), "{}", line)?,
        }
        Ok(())
    }

    fn report_unmatched_stop(&self, what: &str, name: &str) -> Result<()> {
        self.write_line(
            "ERROR",
            &format!("{} `{}` stopped without a matching start", what, name),
        )
    }
}

fn colorize_label(label: &str) -> String {
    match label.trim_end() {
        "TRACE" => label.dimmed().to_string(),
        "DEBUG" => label.blue().to_string(),
        "INFO" => label.green().to_string(),
        "WARN" => label.yellow().to_string(),
        "ERROR" => label.red().to_string(),
        "CRITICAL" => label.red().bold().to_string(),
        _ => label.magenta().to_string(),
    }
}

fn format_properties(properties: &Map<String, Value>) -> String {
    if properties.is_empty() {
        String::new()
    } else {
        format!(" | {}", Value::Object(properties.clone()))
    }
}

fn format_duration(duration: Option<Duration>) -> String {
    duration
        .map(|d| format!(" duration={}ms", d.as_millis()))
        .unwrap_or_default()
}

fn format_page(page: &PageViewInfo) -> String {
    let mut body = page.name.clone().unwrap_or_default();
    if let Some(uri) = &page.uri {
        body.push_str(&format!(" uri={}", uri));
    }
    body.push_str(&format_duration(page.duration));
    body.push_str(&format_properties(&page.properties));
    body
}

fn format_event(event: &EventInfo) -> String {
    format!(
        "{}{}{}",
        event.name,
        format_duration(event.duration),
        format_properties(&event.properties)
    )
}

impl LoggingSink for ConsoleSink {
    fn log(&self, level: LogLevel, message: &str, extra: Option<&Value>) -> Result<()> {
        let body = match extra {
            Some(extra) if !extra.is_null() => format!("{} | {}", message, extra),
            _ => message.to_string(),
        };
        self.write_line(&level.to_string(), &body)
    }

    fn start_track_page(&self, name: Option<&str>) -> Result<()> {
        self.pages.start(name.unwrap_or_default());
        Ok(())
    }

    fn stop_track_page(&self, name: Option<&str>, info: Option<&PageViewInfo>) -> Result<()> {
        let key = name.unwrap_or_default();
        let Some(duration) = self.pages.stop(key) else {
            return self.report_unmatched_stop("page", key);
        };

        let mut page = info.cloned().unwrap_or_default();
        if page.name.is_none() {
            page.name = name.map(str::to_string);
        }
        self.write_line("PAGE", &format_page(&page.with_duration(duration)))
    }

    fn track_page_view(&self, info: &PageViewInfo) -> Result<()> {
        self.write_line("PAGE", &format_page(info))
    }

    fn start_track_event(&self, name: &str) -> Result<()> {
        self.events.start(name);
        Ok(())
    }

    fn stop_track_event(&self, name: &str, info: Option<&EventInfo>) -> Result<()> {
        let Some(duration) = self.events.stop(name) else {
            return self.report_unmatched_stop("event", name);
        };

        let event = info.cloned().unwrap_or_else(|| EventInfo::new(name));
        self.write_line("EVENT", &format_event(&event.with_duration(duration)))
    }

    fn track_event(&self, info: &EventInfo) -> Result<()> {
        self.write_line("EVENT", &format_event(info))
    }

    fn set_user_id(&self, user_id: &str) -> Result<()> {
        self.write_line("USER", &format!("user id set to {}", user_id))
    }

    fn clear_user_id(&self) -> Result<()> {
        self.write_line("USER", "user id cleared")
    }

    fn flush(&self) -> Result<()> {
        match self.config.target {
            Target::Stdout => io::stdout().flush()?,
            Target::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }
}
