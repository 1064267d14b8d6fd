use super::rule::{EventTable, FilterKind, FilterRule};

/// 规则匹配器
///
/// 单次线性扫描，不排序。特异性比较：
/// 1. 指定 provider 的规则总是优于未指定的
/// 2. provider 特异性相同时，有 category 模式的优于没有的；都有时模式字符串更长者胜出
/// 3. 完全相同的特异性下，扫描顺序靠后的规则胜出
pub struct RuleMatcher;

impl RuleMatcher {
    /// 选出最具体的 LogLevel / PageView 规则
    pub fn select_best<'a>(
        rules: &'a [FilterRule],
        provider_name: &str,
        category: &str,
        kind: FilterKind,
    ) -> Option<&'a FilterRule> {
        let mut best: Option<&FilterRule> = None;

        for rule in rules
            .iter()
            .filter(|rule| Self::applies(rule, provider_name, category, kind))
        {
            if best.map_or(true, |current| Self::is_better(rule, current)) {
                best = Some(rule);
            }
        }

        best
    }

    /// 合并所有命中的 Event 规则，按扫描顺序浅合并，后者覆盖前者的同名 key
    ///
    /// 没有任何规则命中时返回 None
    pub fn merge_events(
        rules: &[FilterRule],
        provider_name: &str,
        category: &str,
    ) -> Option<EventTable> {
        let mut merged: Option<EventTable> = None;

        for rule in rules
            .iter()
            .filter(|rule| Self::applies(rule, provider_name, category, FilterKind::Event))
        {
            if let Some(events) = rule.as_events() {
                merged
                    .get_or_insert_with(EventTable::new)
                    .extend(events.iter().map(|(name, enabled)| (name.clone(), *enabled)));
            }
        }

        merged
    }

    /// 种类相同、provider 未指定或一致、category 命中模式
    fn applies(rule: &FilterRule, provider_name: &str, category: &str, kind: FilterKind) -> bool {
        rule.kind == kind
            && rule
                .provider_name
                .as_deref()
                .map_or(true, |provider| provider == provider_name)
            && rule.matches_category(category)
    }

    /// candidate 是否优于 current（两者都已确认命中）
    fn is_better(candidate: &FilterRule, current: &FilterRule) -> bool {
        match (&candidate.provider_name, &current.provider_name) {
            (Some(_), None) => return true,
            (None, Some(_)) => return false,
            _ => {}
        }

        match (&candidate.category_name, &current.category_name) {
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(candidate), Some(current)) => candidate.len() >= current.len(),
            (None, None) => true,
        }
    }
}
