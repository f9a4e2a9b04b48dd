//! Workspace navigation: category → sub-category → filter, with back history.
//!
//! Key invariants:
//! - `active_category` is always a category of the layout
//! - `active_sub_category` belongs to the active category (first one on entry,
//!   `None` only when the category declares none)
//! - `active_filter` belongs to the active sub-category
//! - only category changes push history; `go_back` pops it
//!
//! Every mutation persists the full state under `<module>:nav-state`.

use std::collections::BTreeMap;
use std::rc::Rc;

use moa_config::ModuleLayout;
use serde::{Deserialize, Serialize};

use crate::error::NavError;
use crate::persist::Slot;

pub const NAV_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavFrame {
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
}

/// Persisted navigation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationState {
    pub version: u32,
    pub active_category: String,
    pub active_sub_category: Option<String>,
    pub active_filter: Option<String>,
    pub history: Vec<NavFrame>,
    /// Page-specific filter fields (search text, date ranges, ...)
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            version: NAV_STATE_VERSION,
            active_category: String::new(),
            active_sub_category: None,
            active_filter: None,
            history: Vec::new(),
            extras: BTreeMap::new(),
        }
    }
}

impl NavigationState {
    /// First category, its first sub-category, no filter.
    pub fn initial(layout: &ModuleLayout) -> Self {
        let first = layout.first_category();
        Self {
            active_category: first.map(|c| c.id.clone()).unwrap_or_default(),
            active_sub_category: first
                .and_then(|c| c.default_sub_category())
                .map(|s| s.id.clone()),
            ..Self::default()
        }
    }

    /// Repair a restored state so it satisfies the layout invariants.
    fn sanitize(mut self, layout: &ModuleLayout, history_limit: usize) -> Self {
        if self.version != NAV_STATE_VERSION {
            log::warn!(
                "nav-state version {} not supported; using defaults",
                self.version
            );
            return Self::initial(layout);
        }

        let Some(category) = layout.category(&self.active_category) else {
            log::warn!("unknown category '{}' in nav-state; using defaults", self.active_category);
            return Self {
                extras: self.extras,
                ..Self::initial(layout)
            };
        };

        let sub_valid = self
            .active_sub_category
            .as_deref()
            .is_some_and(|s| category.sub_category(s).is_some());
        if !sub_valid {
            self.active_sub_category = category.default_sub_category().map(|s| s.id.clone());
            self.active_filter = None;
        }

        if let Some(filter) = self.active_filter.as_deref() {
            let known = self
                .active_sub_category
                .as_deref()
                .and_then(|s| category.sub_category(s))
                .is_some_and(|s| s.filter(filter).is_some());
            if !known {
                self.active_filter = None;
            }
        }

        self.history = self
            .history
            .into_iter()
            .filter_map(|frame| {
                let cat = layout.category(&frame.category)?;
                let sub = frame
                    .sub_category
                    .filter(|s| cat.sub_category(s).is_some())
                    .or_else(|| cat.default_sub_category().map(|s| s.id.clone()));
                Some(NavFrame {
                    category: frame.category,
                    sub_category: sub,
                })
            })
            .collect();
        cap_history(&mut self.history, history_limit);

        self
    }
}

fn cap_history(history: &mut Vec<NavFrame>, limit: usize) {
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

// ============================================================================
// Breadcrumb
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub id: String,
    pub label: String,
}

/// Active path, resolved to display labels. Segments are present only when set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    pub category: Option<Crumb>,
    pub sub_category: Option<Crumb>,
    pub filter: Option<Crumb>,
}

impl Breadcrumb {
    pub fn resolve(layout: &ModuleLayout, state: &NavigationState) -> Self {
        let category = layout.category(&state.active_category);
        let sub = category.and_then(|c| c.sub_category(state.active_sub_category.as_deref()?));
        let filter = sub.and_then(|s| s.filter(state.active_filter.as_deref()?));

        Self {
            category: category.map(|c| Crumb {
                id: c.id.clone(),
                label: c.label.clone(),
            }),
            sub_category: sub.map(|s| Crumb {
                id: s.id.clone(),
                label: s.label.clone(),
            }),
            filter: filter.map(|f| Crumb {
                id: f.id.clone(),
                label: f.label.clone(),
            }),
        }
    }

    /// Labels joined with " › "
    pub fn display(&self) -> String {
        [&self.category, &self.sub_category, &self.filter]
            .into_iter()
            .flatten()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(" › ")
    }
}

// ============================================================================
// Navigator
// ============================================================================

/// Owns one module's navigation state and its persistence slot.
#[derive(Debug)]
pub struct Navigator {
    layout: Rc<ModuleLayout>,
    state: NavigationState,
    history_limit: usize,
    slot: Slot,
}

impl Navigator {
    /// Restore from `slot`, silently falling back to the initial state.
    pub fn mount(layout: Rc<ModuleLayout>, slot: Slot, history_limit: usize) -> Self {
        let state = match slot.load::<NavigationState>() {
            Some(stored) => {
                let state = stored.sanitize(&layout, history_limit);
                log::info!(
                    "restored {} navigation: {}",
                    layout.module,
                    Breadcrumb::resolve(&layout, &state).display()
                );
                state
            }
            None => NavigationState::initial(&layout),
        };

        Self {
            layout,
            state,
            history_limit,
            slot,
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn layout(&self) -> &ModuleLayout {
        &self.layout
    }

    pub fn breadcrumb(&self) -> Breadcrumb {
        Breadcrumb::resolve(&self.layout, &self.state)
    }

    fn persist(&self) {
        self.slot.save(&self.state);
    }

    pub fn flush(&self) {
        self.slot.flush();
    }

    /// Returns whether the state changed.
    pub fn change_category(&mut self, id: &str) -> Result<bool, NavError> {
        let category = self
            .layout
            .category(id)
            .ok_or_else(|| NavError::UnknownCategory(id.to_string()))?;

        if self.state.active_category == id {
            return Ok(false);
        }

        let default_sub = category.default_sub_category().map(|s| s.id.clone());

        self.state.history.push(NavFrame {
            category: std::mem::replace(&mut self.state.active_category, id.to_string()),
            sub_category: std::mem::replace(&mut self.state.active_sub_category, default_sub),
        });
        cap_history(&mut self.state.history, self.history_limit);
        self.state.active_filter = None;

        log::debug!("category -> {id}");
        self.persist();
        Ok(true)
    }

    /// Intra-category move; history untouched. A filter the new sub-category
    /// doesn't declare is cleared.
    pub fn change_sub_category(&mut self, id: &str) -> Result<bool, NavError> {
        let sub = self
            .layout
            .sub_category(&self.state.active_category, id)
            .ok_or_else(|| NavError::UnknownSubCategory {
                category: self.state.active_category.clone(),
                sub_category: id.to_string(),
            })?;

        if self.state.active_sub_category.as_deref() == Some(id) {
            return Ok(false);
        }

        if let Some(filter) = self.state.active_filter.as_deref() {
            if sub.filter(filter).is_none() {
                self.state.active_filter = None;
            }
        }
        self.state.active_sub_category = Some(id.to_string());

        log::debug!("sub-category -> {id}");
        self.persist();
        Ok(true)
    }

    /// Set or clear the filter; history untouched.
    pub fn change_filter(&mut self, id: Option<&str>) -> Result<bool, NavError> {
        if let Some(filter) = id {
            let known = self
                .state
                .active_sub_category
                .as_deref()
                .and_then(|s| self.layout.filter(&self.state.active_category, s, filter))
                .is_some();
            if !known {
                return Err(NavError::UnknownFilter {
                    sub_category: self.state.active_sub_category.clone(),
                    filter: filter.to_string(),
                });
            }
        }

        if self.state.active_filter.as_deref() == id {
            return Ok(false);
        }
        self.state.active_filter = id.map(str::to_string);

        log::debug!("filter -> {:?}", id);
        self.persist();
        Ok(true)
    }

    /// Restore the previous category and sub-category. No-op on empty history.
    pub fn go_back(&mut self) -> bool {
        let Some(frame) = self.state.history.pop() else {
            return false;
        };

        self.state.active_category = frame.category;
        self.state.active_sub_category = frame.sub_category;
        self.state.active_filter = None;

        log::debug!("back -> {}", self.state.active_category);
        self.persist();
        true
    }

    /// Back to the initial state, extras and history included.
    pub fn reset(&mut self) {
        self.state = NavigationState::initial(&self.layout);
        self.persist();
    }

    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.extras.get(key)
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.extras.insert(key.into(), value);
        self.persist();
    }

    pub fn clear_extra(&mut self, key: &str) -> bool {
        let removed = self.state.extras.remove(key).is_some();
        if removed {
            self.persist();
        }
        removed
    }
}
