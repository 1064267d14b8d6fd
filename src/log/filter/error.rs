use thiserror::Error;

/// 过滤配置错误
///
/// 分为两类：
/// - 结构性错误（`is_structural() == true`）：配置整体形状不合法，`parse` 直接返回 Err
/// - 语义错误：只影响单条规则，该规则被丢弃并通过诊断通道报告，其余配置继续生效
#[derive(Error, Debug)]
pub enum FilterConfigError {
    #[error("filter configuration must be an object, got {0}")]
    NotAnObject(String),

    #[error("`rules` must be an array, got {0}")]
    RulesNotArray(String),

    #[error("invalid rule #{index}: {source}")]
    InvalidRule {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: {message}")]
    InvalidLevel { path: String, message: String },

    #[error("{path}: page view toggle must be a boolean, got {value}")]
    InvalidPageView { path: String, value: String },

    #[error("{path}: event section must be an object, got {value}")]
    InvalidEvent { path: String, value: String },

    #[error("{path}: event toggle `{event}` must be a boolean, got {value}")]
    InvalidEventToggle {
        path: String,
        event: String,
        value: String,
    },

    #[error("{path}: category pattern `{pattern}` contains more than one wildcard")]
    TooManyWildcards { path: String, pattern: String },

    #[error("{path}: provider section must be an object, got {value}")]
    InvalidProviderSection { path: String, value: String },

    #[error("{path}: unknown key `{key}` in provider section")]
    UnknownProviderKey { path: String, key: String },

    #[error("{path}: userIdEnabled must be a boolean, got {value}")]
    InvalidUserIdEnabled { path: String, value: String },
}

impl FilterConfigError {
    /// 结构性错误会中止解析
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FilterConfigError::NotAnObject(_)
                | FilterConfigError::RulesNotArray(_)
                | FilterConfigError::InvalidRule { .. }
        )
    }
}
