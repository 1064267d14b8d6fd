use crate::log::level::LogLevel;
use crate::log::sink::record::{EventInfo, PageViewInfo};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// 日志输出端 trait
///
/// 负责把单个 category 的日志、页面浏览和事件转发到具体后端。
/// 过滤在 `FanoutLogger` 中完成，到达这里的调用都已放行
pub trait LoggingSink: Send + Sync {
    /// 输出日志
    fn log(&self, level: LogLevel, message: &str, extra: Option<&Value>) -> Result<()>;

    /// 开始页面计时
    fn start_track_page(&self, name: Option<&str>) -> Result<()>;

    /// 结束页面计时并上报；没有匹配的 start 时由实现自行决定是否报告
    fn stop_track_page(&self, name: Option<&str>, info: Option<&PageViewInfo>) -> Result<()>;

    /// 直接上报页面浏览
    fn track_page_view(&self, info: &PageViewInfo) -> Result<()>;

    /// 开始事件计时
    fn start_track_event(&self, name: &str) -> Result<()>;

    /// 结束事件计时并上报
    fn stop_track_event(&self, name: &str, info: Option<&EventInfo>) -> Result<()>;

    /// 直接上报事件
    fn track_event(&self, info: &EventInfo) -> Result<()>;

    /// 设置当前用户
    fn set_user_id(&self, _user_id: &str) -> Result<()> {
        Ok(())
    }

    /// 清除当前用户
    fn clear_user_id(&self) -> Result<()> {
        Ok(())
    }

    /// 刷新缓冲区（默认实现为空操作）
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// 日志后端 provider
///
/// `name` 是过滤规则中匹配 provider 的 key
pub trait LoggerProvider: Send + Sync {
    fn name(&self) -> &str;

    /// 为 category 创建输出端
    fn create_logger(&self, category: &str) -> Arc<dyn LoggingSink>;
}
