use serde::{Deserialize, Serialize};

/// Effects the engine knows how to perform itself.
///
/// Navigation and chrome toggles are expressed as data rather than closures
/// so the workspace can apply them to its own state, log them, and keep
/// them testable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "intent", content = "target", rename_all = "snake_case")]
pub enum BuiltinAction {
    ChangeCategory(String),
    ChangeSubCategory(String),
    ChangeFilter(String),
    ClearFilter,
    GoBack,
    ToggleTheme,
    ToggleSidebar,
    ToggleFiltersPanel,
}

impl BuiltinAction {
    /// True for intents that mutate the navigation state machine.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ChangeCategory(_)
                | Self::ChangeSubCategory(_)
                | Self::ChangeFilter(_)
                | Self::ClearFilter
                | Self::GoBack
        )
    }
}
