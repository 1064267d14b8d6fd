/// 日志宏模块
///
/// 在 `FanoutLogger::log` 之上提供 key/value 形式的附加字段
///
/// # 示例
///
/// ```ignore
/// use tracklog::log::get_logger;
///
/// let logger = get_logger("checkout");
///
/// // 简单日志
/// tracklog::info!(logger, "application started")?;
///
/// // 带附加字段的日志
/// tracklog::info!(logger, "user logged in", "user_id" => 12345, "username" => "alice")?;
/// ```

/// 以指定级别记录日志
///
/// 附加字段收集为一个 JSON object，作为 `extra` 传给每个 sink
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr) => {
        $logger.log($level, ::core::convert::AsRef::<str>::as_ref(&$msg), None)
    };
    ($logger:expr, $level:expr, $msg:expr, $($key:expr => $value:expr),+ $(,)?) => {{
        let mut extra = $crate::__serde_json::Map::new();
        $(
            extra.insert(
                ::std::string::String::from($key),
                $crate::__serde_json::Value::from($value),
            );
        )+
        $logger.log(
            $level,
            ::core::convert::AsRef::<str>::as_ref(&$msg),
            Some(&$crate::__serde_json::Value::Object(extra)),
        )
    }};
}

/// 记录 TRACE 级别日志
///
/// ```ignore
/// trace!(logger, "function call", "function" => "process_user", "user_id" => 12345);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Trace, $($arg)+)
    };
}

/// 记录 DEBUG 级别日志
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Debug, $($arg)+)
    };
}

/// 记录 INFO 级别日志
///
/// ```ignore
/// info!(logger, "user action", "user_id" => 12345, "action" => "login");
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Info, $($arg)+)
    };
}

/// 记录 WARN 级别日志
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Warn, $($arg)+)
    };
}

/// 记录 ERROR 级别日志
///
/// ```ignore
/// error!(logger, "query failed", "error_code" => "CONN001", "retry_count" => 3);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Error, $($arg)+)
    };
}

/// 记录 CRITICAL 级别日志
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::log::LogLevel::Critical, $($arg)+)
    };
}
