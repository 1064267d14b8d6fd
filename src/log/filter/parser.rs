//! 过滤配置解析
//!
//! 松散的嵌套配置先转换为 `ConfigNode` 树，再展开为有序的 `FilterRule` 列表。
//!
//! ```text
//! {
//!     minLevel: "info",
//!     logLevel: { default: "warn", "app*": "debug" },
//!     pageView: { default: true, admin: false },
//!     event: { click: true },
//!     console: {
//!         logLevel: { default: "trace" },
//!         event: { test: { scroll: false } },
//!     },
//! }
//! ```

use super::error::FilterConfigError;
use super::rule::{EventTable, FilterKind, FilterRule, LoggerFilterOptions};
use crate::log::level::LogLevel;
use serde::Deserialize;
use serde_json::{Map, Value};

const DEFAULT_CATEGORY: &str = "default";

/// 配置中的关键字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    MinLevel,
    UserIdEnabled,
    LogLevel,
    PageView,
    Event,
    Rules,
}

impl Keyword {
    fn of(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "minlevel" => Some(Keyword::MinLevel),
            "useridenabled" => Some(Keyword::UserIdEnabled),
            "loglevel" => Some(Keyword::LogLevel),
            "pageview" => Some(Keyword::PageView),
            "event" => Some(Keyword::Event),
            "rules" => Some(Keyword::Rules),
            _ => None,
        }
    }
}

/// 配置树节点
///
/// 只描述配置的形状，取值在展开时才校验
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    MinLevel {
        path: String,
        value: Value,
    },
    UserIdEnabled {
        path: String,
        value: Value,
    },
    LogLevel {
        path: String,
        category: Option<String>,
        value: Value,
    },
    PageView {
        path: String,
        category: Option<String>,
        value: Value,
    },
    Event {
        path: String,
        category: Option<String>,
        value: Value,
    },
    Provider {
        name: String,
        children: Vec<ConfigNode>,
    },
}

impl ConfigNode {
    /// 从顶层配置对象构建节点列表
    ///
    /// 形状问题（如 provider 段不是对象）记入 `diagnostics`，对应部分被跳过
    pub fn from_object(
        object: &Map<String, Value>,
        diagnostics: &mut Vec<FilterConfigError>,
    ) -> Vec<ConfigNode> {
        let mut nodes = Vec::new();

        for (key, value) in object {
            match Keyword::of(key) {
                Some(Keyword::MinLevel) => nodes.push(ConfigNode::MinLevel {
                    path: key.clone(),
                    value: value.clone(),
                }),
                Some(Keyword::UserIdEnabled) => nodes.push(ConfigNode::UserIdEnabled {
                    path: key.clone(),
                    value: value.clone(),
                }),
                Some(Keyword::Rules) => {}
                Some(keyword) => section_nodes(keyword, key, value, &mut nodes, diagnostics),
                None => match value {
                    Value::Object(section) => nodes.push(ConfigNode::Provider {
                        name: key.clone(),
                        children: provider_nodes(key, section, diagnostics),
                    }),
                    other => diagnostics.push(FilterConfigError::InvalidProviderSection {
                        path: key.clone(),
                        value: other.to_string(),
                    }),
                },
            }
        }

        nodes
    }
}

fn provider_nodes(
    provider: &str,
    section: &Map<String, Value>,
    diagnostics: &mut Vec<FilterConfigError>,
) -> Vec<ConfigNode> {
    let mut nodes = Vec::new();

    for (key, value) in section {
        let path = format!("{}.{}", provider, key);
        match Keyword::of(key) {
            Some(keyword @ (Keyword::LogLevel | Keyword::PageView | Keyword::Event)) => {
                section_nodes(keyword, &path, value, &mut nodes, diagnostics)
            }
            _ => diagnostics.push(FilterConfigError::UnknownProviderKey {
                path: provider.to_string(),
                key: key.clone(),
            }),
        }
    }

    nodes
}

/// 展开 logLevel / pageView / event 段
fn section_nodes(
    keyword: Keyword,
    path: &str,
    value: &Value,
    nodes: &mut Vec<ConfigNode>,
    diagnostics: &mut Vec<FilterConfigError>,
) {
    match keyword {
        Keyword::LogLevel => match value {
            Value::Object(entries) => {
                for (category, level) in entries {
                    nodes.push(ConfigNode::LogLevel {
                        path: format!("{}.{}", path, category),
                        category: category_key(category),
                        value: level.clone(),
                    });
                }
            }
            // 标量等价于 { default: <level> }
            scalar => nodes.push(ConfigNode::LogLevel {
                path: path.to_string(),
                category: None,
                value: scalar.clone(),
            }),
        },
        Keyword::PageView => match value {
            Value::Object(entries) => {
                for (category, enabled) in entries {
                    nodes.push(ConfigNode::PageView {
                        path: format!("{}.{}", path, category),
                        category: category_key(category),
                        value: enabled.clone(),
                    });
                }
            }
            scalar => nodes.push(ConfigNode::PageView {
                path: path.to_string(),
                category: None,
                value: scalar.clone(),
            }),
        },
        Keyword::Event => match value {
            // 只要有一个值是布尔，整段视为不带 category 的事件表
            Value::Object(entries) if entries.values().any(Value::is_boolean) => {
                nodes.push(ConfigNode::Event {
                    path: path.to_string(),
                    category: None,
                    value: value.clone(),
                });
            }
            Value::Object(entries) => {
                for (category, events) in entries {
                    nodes.push(ConfigNode::Event {
                        path: format!("{}.{}", path, category),
                        category: category_key(category),
                        value: events.clone(),
                    });
                }
            }
            other => diagnostics.push(FilterConfigError::InvalidEvent {
                path: path.to_string(),
                value: other.to_string(),
            }),
        },
        Keyword::MinLevel | Keyword::UserIdEnabled | Keyword::Rules => {}
    }
}

fn category_key(key: &str) -> Option<String> {
    if key.eq_ignore_ascii_case(DEFAULT_CATEGORY) {
        None
    } else {
        Some(key.to_string())
    }
}

/// 解析结果及其诊断信息
#[derive(Debug, Default)]
pub struct ParsedFilterConfig {
    pub options: LoggerFilterOptions,
    pub diagnostics: Vec<FilterConfigError>,
}

/// 过滤配置解析器
pub struct ConfigParser;

impl ConfigParser {
    /// 解析配置，语义错误通过 tracing 报告后丢弃
    pub fn parse(raw: &Value) -> Result<LoggerFilterOptions, FilterConfigError> {
        let parsed = Self::parse_with_diagnostics(raw)?;
        for diagnostic in &parsed.diagnostics {
            tracing::warn!(error = %diagnostic, "ignoring invalid logger filter configuration");
        }
        Ok(parsed.options)
    }

    /// 解析配置并返回收集到的诊断信息
    ///
    /// `null` 视为空配置；非对象输入、`rules` 不是数组等结构性错误直接返回 Err
    pub fn parse_with_diagnostics(raw: &Value) -> Result<ParsedFilterConfig, FilterConfigError> {
        let object = match raw {
            Value::Null => return Ok(ParsedFilterConfig::default()),
            Value::Object(object) => object,
            other => return Err(FilterConfigError::NotAnObject(other.to_string())),
        };

        let mut parsed = ParsedFilterConfig::default();

        let rules = object
            .iter()
            .find(|(key, _)| Keyword::of(key) == Some(Keyword::Rules));
        if let Some((_, rules)) = rules {
            parsed.options.rules = Self::pass_through_rules(rules, &mut parsed.diagnostics)?;
            for (key, value) in object {
                match Keyword::of(key) {
                    Some(Keyword::MinLevel) => {
                        parsed.options.min_level =
                            flatten_level(key, value, &mut parsed.diagnostics)
                    }
                    Some(Keyword::UserIdEnabled) => {
                        parsed.options.user_id_enabled =
                            flatten_user_id(key, value, &mut parsed.diagnostics)
                    }
                    _ => {}
                }
            }
            return Ok(parsed);
        }

        let nodes = ConfigNode::from_object(object, &mut parsed.diagnostics);
        flatten(&nodes, None, &mut parsed);
        Ok(parsed)
    }

    /// 已解析形态：`rules` 按顺序逐条校验
    ///
    /// 记录本身不是对象或 `kind` 未知属于结构性错误；取值非法、通配符过多只丢弃该条
    fn pass_through_rules(
        rules: &Value,
        diagnostics: &mut Vec<FilterConfigError>,
    ) -> Result<Vec<FilterRule>, FilterConfigError> {
        let Value::Array(items) = rules else {
            return Err(FilterConfigError::RulesNotArray(rules.to_string()));
        };

        let mut kept = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let raw = RawRule::deserialize(item)
                .map_err(|source| FilterConfigError::InvalidRule { index, source })?;
            let path = format!("rules[{}]", index);
            if !check_wildcards(&path, &raw.category_name, diagnostics) {
                continue;
            }

            let provider = raw.provider_name.as_deref();
            let category = raw.category_name.as_deref();
            let rule = match raw.kind {
                FilterKind::LogLevel => flatten_level(&path, &raw.value, diagnostics)
                    .map(|level| FilterRule::level(provider, category, level)),
                FilterKind::PageView => flatten_page_view(&path, &raw.value, diagnostics)
                    .map(|enabled| FilterRule::page_view(provider, category, enabled)),
                FilterKind::Event => flatten_events(&path, &raw.value, diagnostics)
                    .map(|events| FilterRule::event(provider, category, events)),
            };
            kept.extend(rule);
        }
        Ok(kept)
    }
}

/// `rules` 中的一条记录，取值留到按 `kind` 校验时再解析
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(default)]
    provider_name: Option<String>,
    #[serde(default)]
    category_name: Option<String>,
    kind: FilterKind,
    value: Value,
}

fn flatten(nodes: &[ConfigNode], provider: Option<&str>, parsed: &mut ParsedFilterConfig) {
    for node in nodes {
        match node {
            ConfigNode::MinLevel { path, value } => {
                if let Some(level) = flatten_level(path, value, &mut parsed.diagnostics) {
                    parsed.options.min_level = Some(level);
                }
            }
            ConfigNode::UserIdEnabled { path, value } => {
                if let Some(enabled) = flatten_user_id(path, value, &mut parsed.diagnostics) {
                    parsed.options.user_id_enabled = Some(enabled);
                }
            }
            ConfigNode::LogLevel {
                path,
                category,
                value,
            } => {
                if !check_wildcards(path, category, &mut parsed.diagnostics) {
                    continue;
                }
                if let Some(level) = flatten_level(path, value, &mut parsed.diagnostics) {
                    parsed
                        .options
                        .rules
                        .push(FilterRule::level(provider, category.as_deref(), level));
                }
            }
            ConfigNode::PageView {
                path,
                category,
                value,
            } => {
                if !check_wildcards(path, category, &mut parsed.diagnostics) {
                    continue;
                }
                if let Some(enabled) = flatten_page_view(path, value, &mut parsed.diagnostics) {
                    parsed.options.rules.push(FilterRule::page_view(
                        provider,
                        category.as_deref(),
                        enabled,
                    ));
                }
            }
            ConfigNode::Event {
                path,
                category,
                value,
            } => {
                if !check_wildcards(path, category, &mut parsed.diagnostics) {
                    continue;
                }
                if let Some(events) = flatten_events(path, value, &mut parsed.diagnostics) {
                    parsed
                        .options
                        .rules
                        .push(FilterRule::event(provider, category.as_deref(), events));
                }
            }
            ConfigNode::Provider { name, children } => {
                flatten(children, Some(name.as_str()), parsed)
            }
        }
    }
}

fn check_wildcards(
    path: &str,
    category: &Option<String>,
    diagnostics: &mut Vec<FilterConfigError>,
) -> bool {
    match category {
        Some(pattern) if pattern.matches('*').count() > 1 => {
            diagnostics.push(FilterConfigError::TooManyWildcards {
                path: path.to_string(),
                pattern: pattern.clone(),
            });
            false
        }
        _ => true,
    }
}

fn flatten_level(
    path: &str,
    value: &Value,
    diagnostics: &mut Vec<FilterConfigError>,
) -> Option<LogLevel> {
    LogLevel::from_value(value)
        .map_err(|message| {
            diagnostics.push(FilterConfigError::InvalidLevel {
                path: path.to_string(),
                message,
            })
        })
        .ok()
}

fn flatten_page_view(
    path: &str,
    value: &Value,
    diagnostics: &mut Vec<FilterConfigError>,
) -> Option<bool> {
    match value {
        Value::Bool(enabled) => Some(*enabled),
        other => {
            diagnostics.push(FilterConfigError::InvalidPageView {
                path: path.to_string(),
                value: other.to_string(),
            });
            None
        }
    }
}

fn flatten_user_id(
    path: &str,
    value: &Value,
    diagnostics: &mut Vec<FilterConfigError>,
) -> Option<bool> {
    match value {
        Value::Bool(enabled) => Some(*enabled),
        other => {
            diagnostics.push(FilterConfigError::InvalidUserIdEnabled {
                path: path.to_string(),
                value: other.to_string(),
            });
            None
        }
    }
}

fn flatten_events(
    path: &str,
    value: &Value,
    diagnostics: &mut Vec<FilterConfigError>,
) -> Option<EventTable> {
    let Value::Object(entries) = value else {
        diagnostics.push(FilterConfigError::InvalidEvent {
            path: path.to_string(),
            value: value.to_string(),
        });
        return None;
    };

    let mut events = EventTable::new();
    for (event, enabled) in entries {
        match enabled {
            Value::Bool(enabled) => {
                events.insert(event.clone(), *enabled);
            }
            other => diagnostics.push(FilterConfigError::InvalidEventToggle {
                path: path.to_string(),
                event: event.clone(),
                value: other.to_string(),
            }),
        }
    }
    Some(events)
}
