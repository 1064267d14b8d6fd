use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// start/stop 配对计时
///
/// 同名重复 start 会重新计时；stop 没有对应 start 时返回 None
#[derive(Debug, Default)]
pub struct TrackTimer {
    started: Mutex<HashMap<String, Instant>>,
}

impl TrackTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, name: &str) {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Instant::now());
    }

    pub fn stop(&self, name: &str) -> Option<Duration> {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .map(|started| started.elapsed())
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
