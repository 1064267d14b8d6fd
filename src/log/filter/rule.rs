use crate::log::level::LogLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 事件名 -> 是否启用
pub type EventTable = BTreeMap<String, bool>;

/// 规则种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    LogLevel,
    PageView,
    Event,
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterKind::LogLevel => write!(f, "LogLevel"),
            FilterKind::PageView => write!(f, "PageView"),
            FilterKind::Event => write!(f, "Event"),
        }
    }
}

/// 规则取值，与 `FilterKind` 一一对应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Toggle(bool),
    Level(LogLevel),
    Events(EventTable),
}

/// 一条过滤规则
///
/// `provider_name` 为空表示适用于所有 provider；`category_name` 为空表示适用于所有 category，
/// 非空时最多包含一个 `*` 通配符
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub kind: FilterKind,
    pub value: RuleValue,
}

impl FilterRule {
    pub fn level(
        provider_name: Option<&str>,
        category_name: Option<&str>,
        level: LogLevel,
    ) -> Self {
        Self {
            provider_name: provider_name.map(str::to_string),
            category_name: category_name.map(str::to_string),
            kind: FilterKind::LogLevel,
            value: RuleValue::Level(level),
        }
    }

    pub fn page_view(
        provider_name: Option<&str>,
        category_name: Option<&str>,
        enabled: bool,
    ) -> Self {
        Self {
            provider_name: provider_name.map(str::to_string),
            category_name: category_name.map(str::to_string),
            kind: FilterKind::PageView,
            value: RuleValue::Toggle(enabled),
        }
    }

    pub fn event(
        provider_name: Option<&str>,
        category_name: Option<&str>,
        events: EventTable,
    ) -> Self {
        Self {
            provider_name: provider_name.map(str::to_string),
            category_name: category_name.map(str::to_string),
            kind: FilterKind::Event,
            value: RuleValue::Events(events),
        }
    }

    pub fn as_level(&self) -> Option<LogLevel> {
        match self.value {
            RuleValue::Level(level) => Some(level),
            _ => None,
        }
    }

    pub fn as_toggle(&self) -> Option<bool> {
        match self.value {
            RuleValue::Toggle(enabled) => Some(enabled),
            _ => None,
        }
    }

    pub fn as_events(&self) -> Option<&EventTable> {
        match &self.value {
            RuleValue::Events(events) => Some(events),
            _ => None,
        }
    }

    /// category 是否命中本规则的模式
    ///
    /// 无模式时总是命中；有 `*` 时要求 `*` 之前为前缀、之后为后缀（忽略大小写）；
    /// 无 `*` 时要求忽略大小写完全相等
    pub fn matches_category(&self, category: &str) -> bool {
        let Some(pattern) = &self.category_name else {
            return true;
        };

        match pattern.split_once('*') {
            Some((prefix, suffix)) => {
                starts_with_ignore_case(category, prefix) && ends_with_ignore_case(category, suffix)
            }
            None => category.to_lowercase() == pattern.to_lowercase(),
        }
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.to_lowercase().starts_with(&prefix.to_lowercase())
}

fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    value.to_lowercase().ends_with(&suffix.to_lowercase())
}

/// 解析后可查询的过滤配置快照
///
/// 每次配置更新整体重建，不做增量修改
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerFilterOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level: Option<LogLevel>,
    #[serde(default)]
    pub rules: Vec<FilterRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id_enabled: Option<bool>,
}

impl LoggerFilterOptions {
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn with_rule(mut self, rule: FilterRule) -> Self {
        self.rules.push(rule);
        self
    }
}
