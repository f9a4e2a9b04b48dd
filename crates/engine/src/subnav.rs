//! Sub-navigation projection.
//!
//! Pure `(layout, state, badge counts) -> view`. Counts come from the caller
//! as-is; nothing here aggregates business data.

use std::collections::HashMap;

use moa_config::ModuleLayout;
use moa_core::{Severity, StyleToken};
use serde::Serialize;

use crate::navigation::{Breadcrumb, NavigationState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub count: u32,
    pub severity: Severity,
    pub token: StyleToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubNavTab {
    pub id: String,
    pub label: String,
    pub active: bool,
    pub badge: Option<Badge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub id: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubNavView {
    pub breadcrumb: Breadcrumb,
    pub tabs: Vec<SubNavTab>,
    /// Present only when the active sub-category declares filters.
    pub filters: Option<Vec<FilterChip>>,
}

pub fn render(
    layout: &ModuleLayout,
    state: &NavigationState,
    badges: &HashMap<String, u32>,
) -> SubNavView {
    let category = layout.category(&state.active_category);
    let active_sub = state.active_sub_category.as_deref();

    let tabs = category
        .map(|c| c.sub_categories.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|sub| SubNavTab {
            id: sub.id.clone(),
            label: sub.label.clone(),
            active: active_sub == Some(sub.id.as_str()),
            badge: badges.get(&sub.id).copied().filter(|n| *n > 0).map(|count| Badge {
                count,
                severity: sub.severity,
                token: sub.severity.token(),
            }),
        })
        .collect();

    let filters = category
        .and_then(|c| c.sub_category(active_sub?))
        .filter(|s| !s.filters.is_empty())
        .map(|s| {
            s.filters
                .iter()
                .map(|f| FilterChip {
                    id: f.id.clone(),
                    label: f.label.clone(),
                    active: state.active_filter.as_deref() == Some(f.id.as_str()),
                })
                .collect()
        });

    SubNavView {
        breadcrumb: Breadcrumb::resolve(layout, state),
        tabs,
        filters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moa_config::presets;

    #[test]
    fn badges_only_for_non_zero_counts() {
        let layout = presets::builtin("audit").unwrap();
        let state = NavigationState::initial(&layout);
        let badges = HashMap::from([
            ("to-review".to_string(), 4),
            ("assigned".to_string(), 0),
            ("critical".to_string(), 9),
        ]);

        let view = render(&layout, &state, &badges);
        assert_eq!(view.tabs.len(), 2);
        assert!(view.tabs[0].active);
        assert_eq!(
            view.tabs[0].badge,
            Some(Badge {
                count: 4,
                severity: Severity::Warning,
                token: StyleToken::BadgeWarning,
            })
        );
        assert_eq!(view.tabs[1].badge, None);
    }

    #[test]
    fn filter_row_follows_active_sub_category() {
        let layout = presets::builtin("audit").unwrap();
        let mut state = NavigationState::initial(&layout);
        state.active_filter = Some("mine".into());

        let view = render(&layout, &state, &HashMap::new());
        let chips = view.filters.unwrap();
        assert_eq!(chips.len(), 2);
        assert!(!chips[0].active);
        assert!(chips[1].active);
        assert_eq!(view.breadcrumb.display(), "En attente › À revoir › Mes dossiers");

        state.active_sub_category = Some("assigned".into());
        state.active_filter = None;
        assert!(render(&layout, &state, &HashMap::new()).filters.is_none());
    }

    #[test]
    fn category_without_subs_renders_empty_row() {
        let layout = presets::builtin("finances").unwrap();
        let mut state = NavigationState::initial(&layout);
        state.active_category = "ledger".into();
        state.active_sub_category = None;

        let view = render(&layout, &state, &HashMap::new());
        assert!(view.tabs.is_empty());
        assert!(view.filters.is_none());
        assert_eq!(view.breadcrumb.display(), "Grand livre");
    }
}
