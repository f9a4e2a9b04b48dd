//! `moa-engine`: command palette and workspace navigation.
//!
//! Single-threaded and synchronous: every transition happens inside the
//! caller's event handler. Persistence goes through a [`KeyValueStore`]
//! handed in at mount time, and every storage failure degrades to
//! in-memory state.
//!
//! [`KeyValueStore`]: moa_config::KeyValueStore

pub mod error;
pub mod keymap;
pub mod navigation;
pub mod palette;
pub mod persist;
pub mod recency;
pub mod registry;
pub mod search;
pub mod subnav;
pub mod workspace;

pub use error::{ExecuteError, NavError};
pub use keymap::{GlobalAction, Key, KeyInput, Keymap, Modifiers};
pub use navigation::{Breadcrumb, Crumb, NavFrame, NavigationState, Navigator};
pub use palette::{GroupKind, PaletteController, PaletteEvent, PaletteState, ResultGroup};
pub use recency::{RecencyList, RecencyStore};
pub use registry::{CommandContext, CommandRegistry, UiState};
pub use search::{fold, Ranked, RankingEngine};
pub use subnav::{Badge, FilterChip, SubNavTab, SubNavView};
pub use workspace::{KeyOutcome, Overlay, Workspace};
