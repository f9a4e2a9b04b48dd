//! Workspace: one module's palette, navigation and chrome, wired together.
//!
//! This is the surface page code talks to. It owns explicit per-module
//! stores (no globals), rebuilds the command list whenever something a
//! command depends on changes, and routes keyboard input: global shortcuts
//! first, then the palette when it is open.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use moa_config::store::{nav_state_key, recent_commands_key};
use moa_config::{KeyValueStore, ModuleLayout, Settings};
use moa_core::{ActionError, BuiltinAction, Command, CommandAction, CommandId, Theme};

use crate::error::{ExecuteError, NavError};
use crate::keymap::{GlobalAction, KeyInput, Keymap};
use crate::navigation::{Breadcrumb, NavigationState, Navigator};
use crate::palette::{PaletteController, PaletteEvent, ResultGroup};
use crate::persist::Slot;
use crate::recency::{RecencyList, RecencyStore};
use crate::registry::{CommandContext, CommandRegistry, UiState};
use crate::search::RankingEngine;
use crate::subnav::{self, SubNavView};

/// Panels that can sit on top of the workspace, topmost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Palette,
    FiltersPanel,
    DetailPanel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not a shortcut and no palette to type into.
    Ignored,
    Handled,
    Executed(Result<CommandId, ExecuteError>),
}

pub struct Workspace {
    layout: Rc<ModuleLayout>,
    keymap: Keymap,
    registry: CommandRegistry,
    context: CommandContext,
    commands: Vec<Command>,
    recency: RecencyStore,
    palette: PaletteController,
    nav: Navigator,
    ui: UiState,
    detail_open: bool,
    badges: HashMap<String, u32>,
}

impl Workspace {
    /// Mount a module: restore navigation and recency, build commands with
    /// an empty context.
    pub fn mount(layout: ModuleLayout, store: Rc<dyn KeyValueStore>, settings: &Settings) -> Self {
        let layout = Rc::new(layout);
        let keymap = Keymap::new(settings.modifier_style);

        let recency = RecencyStore::open(
            Slot::new(store.clone(), recent_commands_key(&layout.module)),
            settings.recent_limit,
        );
        let nav = Navigator::mount(
            layout.clone(),
            Slot::new(store, nav_state_key(&layout.module)),
            settings.history_limit,
        );
        let palette = PaletteController::new(
            RankingEngine::new(settings.ranking),
            settings.recent_bucket_size,
            settings.max_results,
        );

        let mut ws = Self {
            registry: CommandRegistry::new(layout.clone(), keymap),
            layout,
            keymap,
            context: CommandContext::default(),
            commands: Vec::new(),
            recency,
            palette,
            nav,
            ui: UiState::default(),
            detail_open: false,
            badges: HashMap::new(),
        };
        ws.rebuild_commands();
        log::debug!("mounted {} ({} commands)", ws.layout.module, ws.commands.len());
        ws
    }

    pub fn module(&self) -> &str {
        &self.layout.module
    }

    pub fn layout(&self) -> &ModuleLayout {
        &self.layout
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Replace the module hooks and rebuild the command list.
    pub fn register_commands(&mut self, context: CommandContext) {
        self.context = context;
        self.rebuild_commands();
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.id.as_str() == id)
    }

    pub fn recency(&self) -> &RecencyList {
        self.recency.list()
    }

    fn rebuild_commands(&mut self) {
        let state = self.nav.state();
        self.commands = self.registry.build(
            &self.context,
            &state.active_category,
            state.active_sub_category.as_deref(),
            &self.ui,
        );
        self.palette.refresh(&self.commands, self.recency.list());
    }

    /// Run a command as if chosen in the palette: record it, run its action,
    /// close the palette.
    ///
    /// A failing or panicking action still closes the palette and leaves
    /// navigation as it was before the action ran.
    pub fn execute(&mut self, id: &str) -> Result<(), ExecuteError> {
        let cmd = self
            .command(id)
            .cloned()
            .ok_or_else(|| ExecuteError::UnknownCommand(CommandId::from(id)))?;

        log::debug!("execute {}", cmd.id);
        self.recency.record(cmd.id.clone());

        let result = match &cmd.action {
            CommandAction::Builtin(action) => self.apply(action),
            CommandAction::Callback(callback) => run_callback(callback.as_ref()),
        };

        self.close_palette();
        self.rebuild_commands();

        result.map_err(|error| {
            log::warn!("command '{}' failed: {error}", cmd.id);
            ExecuteError::Action { id: cmd.id, error }
        })
    }

    fn apply(&mut self, action: &BuiltinAction) -> Result<(), ActionError> {
        let nav = |r: Result<bool, NavError>| {
            r.map(|_| ()).map_err(|e| ActionError::failed(e.to_string()))
        };
        match action {
            BuiltinAction::ChangeCategory(id) => nav(self.nav.change_category(id)),
            BuiltinAction::ChangeSubCategory(id) => nav(self.nav.change_sub_category(id)),
            BuiltinAction::ChangeFilter(id) => nav(self.nav.change_filter(Some(id.as_str()))),
            BuiltinAction::ClearFilter => nav(self.nav.change_filter(None)),
            BuiltinAction::GoBack => {
                self.nav.go_back();
                Ok(())
            }
            BuiltinAction::ToggleTheme => {
                self.ui.theme = self.ui.theme.toggled();
                Ok(())
            }
            BuiltinAction::ToggleSidebar => {
                self.ui.sidebar_collapsed = !self.ui.sidebar_collapsed;
                Ok(())
            }
            BuiltinAction::ToggleFiltersPanel => {
                self.ui.filters_panel_open = !self.ui.filters_panel_open;
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Palette
    // ------------------------------------------------------------------------

    pub fn open_palette(&mut self) {
        self.palette.open(&self.commands, self.recency.list());
    }

    /// Close and flush pending persistence.
    pub fn close_palette(&mut self) {
        self.palette.close();
        self.flush();
    }

    pub fn is_palette_open(&self) -> bool {
        self.palette.is_open()
    }

    pub fn palette(&self) -> &PaletteController {
        &self.palette
    }

    pub fn set_palette_query(&mut self, query: &str) {
        self.palette.set_query(query, &self.commands, self.recency.list());
    }

    /// Current palette results as (group, commands) pairs.
    pub fn palette_groups(&self) -> Vec<(&ResultGroup, Vec<&Command>)> {
        self.palette
            .groups()
            .iter()
            .map(|g| (g, g.items.iter().map(|&i| &self.commands[i]).collect()))
            .collect()
    }

    pub fn selected_command(&self) -> Option<&Command> {
        self.palette.selected_command(&self.commands)
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn nav_state(&self) -> &NavigationState {
        self.nav.state()
    }

    pub fn on_category_change(&mut self, id: &str) -> Result<bool, NavError> {
        let changed = self.nav.change_category(id)?;
        if changed {
            self.rebuild_commands();
        }
        Ok(changed)
    }

    pub fn on_sub_category_change(&mut self, id: &str) -> Result<bool, NavError> {
        let changed = self.nav.change_sub_category(id)?;
        if changed {
            self.rebuild_commands();
        }
        Ok(changed)
    }

    pub fn on_filter_change(&mut self, id: Option<&str>) -> Result<bool, NavError> {
        self.nav.change_filter(id)
    }

    pub fn go_back(&mut self) -> bool {
        let moved = self.nav.go_back();
        if moved {
            self.rebuild_commands();
        }
        moved
    }

    pub fn reset_navigation(&mut self) {
        self.nav.reset();
        self.rebuild_commands();
    }

    pub fn breadcrumb(&self) -> Breadcrumb {
        self.nav.breadcrumb()
    }

    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.nav.extra(key)
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.nav.set_extra(key, value);
    }

    pub fn clear_extra(&mut self, key: &str) -> bool {
        self.nav.clear_extra(key)
    }

    // ------------------------------------------------------------------------
    // Badges and sub-navigation
    // ------------------------------------------------------------------------

    /// Replace badge counts wholesale. Palette and navigation are untouched.
    pub fn set_badge_counts(&mut self, counts: HashMap<String, u32>) {
        self.badges = counts;
    }

    pub fn badge_counts(&self) -> &HashMap<String, u32> {
        &self.badges
    }

    pub fn subnav(&self) -> SubNavView {
        subnav::render(&self.layout, self.nav.state(), &self.badges)
    }

    // ------------------------------------------------------------------------
    // Chrome and overlays
    // ------------------------------------------------------------------------

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn theme(&self) -> Theme {
        self.ui.theme
    }

    pub fn toggle_sidebar(&mut self) {
        self.ui.sidebar_collapsed = !self.ui.sidebar_collapsed;
        self.rebuild_commands();
    }

    pub fn toggle_filters_panel(&mut self) {
        self.ui.filters_panel_open = !self.ui.filters_panel_open;
        self.rebuild_commands();
    }

    pub fn open_detail(&mut self) {
        self.detail_open = true;
    }

    pub fn close_detail(&mut self) {
        self.detail_open = false;
    }

    pub fn is_detail_open(&self) -> bool {
        self.detail_open
    }

    pub fn topmost_overlay(&self) -> Option<Overlay> {
        if self.palette.is_open() {
            Some(Overlay::Palette)
        } else if self.ui.filters_panel_open {
            Some(Overlay::FiltersPanel)
        } else if self.detail_open {
            Some(Overlay::DetailPanel)
        } else {
            None
        }
    }

    /// Close only the topmost open overlay.
    pub fn close_topmost_overlay(&mut self) -> Option<Overlay> {
        let top = self.topmost_overlay()?;
        match top {
            Overlay::Palette => self.close_palette(),
            Overlay::FiltersPanel => self.toggle_filters_panel(),
            Overlay::DetailPanel => self.close_detail(),
        }
        Some(top)
    }

    // ------------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------------

    pub fn handle_key(&mut self, input: &KeyInput) -> KeyOutcome {
        if let Some(action) = self.keymap.resolve(input) {
            match action {
                GlobalAction::OpenPalette => {
                    if !self.palette.is_open() {
                        self.open_palette();
                    }
                }
                GlobalAction::CloseOverlay => {
                    if self.close_topmost_overlay().is_none() {
                        return KeyOutcome::Ignored;
                    }
                }
                GlobalAction::ToggleSidebar => self.toggle_sidebar(),
                GlobalAction::GoBack => {
                    self.go_back();
                }
            }
            return KeyOutcome::Handled;
        }

        match self
            .palette
            .handle_key(input, &self.commands, self.recency.list())
        {
            PaletteEvent::Ignored => KeyOutcome::Ignored,
            PaletteEvent::Updated => KeyOutcome::Handled,
            PaletteEvent::Closed => {
                self.flush();
                KeyOutcome::Handled
            }
            PaletteEvent::Execute(id) => {
                let result = self.execute(id.as_str()).map(|()| id);
                KeyOutcome::Executed(result)
            }
        }
    }

    /// Synchronously flush recency and navigation writes.
    pub fn flush(&self) {
        self.recency.flush();
        self.nav.flush();
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Runs a host callback with panics turned into [`ActionError::Panicked`].
///
/// The process panic hook is swapped for a logging one during the call so a
/// contained panic never reaches stderr (the TUI owns the terminal).
fn run_callback(callback: &dyn Fn() -> Result<(), ActionError>) -> Result<(), ActionError> {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| log::debug!("command callback panicked: {info}")));
    let outcome = panic::catch_unwind(AssertUnwindSafe(callback));
    panic::set_hook(previous);

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(ActionError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{Key, Modifiers};
    use moa_config::{presets, MemoryStore, ModifierStyle};
    use std::cell::Cell;

    fn settings() -> Settings {
        Settings {
            modifier_style: ModifierStyle::Ctrl,
            ..Settings::default()
        }
    }

    fn audit(store: Rc<MemoryStore>) -> Workspace {
        Workspace::mount(presets::builtin("audit").unwrap(), store, &settings())
    }

    #[test]
    fn execute_records_recency_and_closes() {
        let store = Rc::new(MemoryStore::new());
        let mut ws = audit(store.clone());
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        ws.register_commands(CommandContext::new().with_refresh(move || {
            counter.set(counter.get() + 1);
            Ok(())
        }));

        ws.open_palette();
        ws.execute("refresh").unwrap();

        assert_eq!(hits.get(), 1);
        assert!(!ws.is_palette_open());
        assert_eq!(ws.recency().position("refresh"), Some(0));
        assert_eq!(
            store.get("audit:recent-commands").unwrap().as_deref(),
            Some(r#"["refresh"]"#)
        );
    }

    #[test]
    fn failing_action_still_closes() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        ws.register_commands(
            CommandContext::new().with_open_export(|| Err(ActionError::failed("disk full"))),
        );
        ws.on_category_change("urgent").unwrap();
        let before = ws.nav_state().clone();

        ws.open_palette();
        let err = ws.execute("export").unwrap_err();
        assert!(matches!(err, ExecuteError::Action { ref id, .. } if id == "export"));
        assert!(!ws.is_palette_open());
        assert_eq!(ws.nav_state(), &before);
    }

    #[test]
    fn panicking_action_is_contained() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static REPORTED: AtomicUsize = AtomicUsize::new(0);

        let original = panic::take_hook();
        panic::set_hook(Box::new(|_| {
            REPORTED.fetch_add(1, Ordering::SeqCst);
        }));

        let mut ws = audit(Rc::new(MemoryStore::new()));
        ws.register_commands(CommandContext::new().with_open_stats(|| panic!("boom")));
        ws.open_palette();
        let contained = ws.execute("open-stats");
        let during = REPORTED.load(Ordering::SeqCst);

        let _ = panic::catch_unwind(|| panic!("outside"));
        let after = REPORTED.load(Ordering::SeqCst);
        panic::set_hook(original);

        assert_eq!(
            contained,
            Err(ExecuteError::Action {
                id: "open-stats".into(),
                error: ActionError::Panicked("boom".into()),
            })
        );
        assert!(!ws.is_palette_open());
        assert_eq!(ws.recency().position("open-stats"), Some(0));
        // Contained panics stay off stderr; the host hook is back afterwards
        assert_eq!(during, 0);
        assert_eq!(after, 1);
    }

    #[test]
    fn unknown_command() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        assert_eq!(
            ws.execute("nope"),
            Err(ExecuteError::UnknownCommand("nope".into()))
        );
        assert!(ws.recency().is_empty());
    }

    #[test]
    fn category_command_rebuilds_sub_category_commands() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        assert!(ws.command("sub-category:to-review").is_some());

        ws.execute("category:urgent").unwrap();
        assert_eq!(ws.nav_state().active_category, "urgent");
        assert!(ws.command("sub-category:to-review").is_none());
        assert!(ws.command("sub-category:critical").is_some());

        ws.execute("nav-back").unwrap();
        assert_eq!(ws.nav_state().active_category, "pending");
        assert!(ws.command("sub-category:to-review").is_some());
    }

    #[test]
    fn filter_commands_track_sub_category() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        assert!(ws.command("filter:mine").is_some());

        ws.execute("filter:unresolved").unwrap();
        assert_eq!(ws.nav_state().active_filter.as_deref(), Some("unresolved"));

        assert!(ws.on_sub_category_change("assigned").unwrap());
        assert!(ws.command("filter:mine").is_none());
        assert_eq!(ws.nav_state().active_filter, None);

        ws.execute("category:urgent").unwrap();
        assert!(ws.command("filter:unresolved-only").is_some());
    }

    #[test]
    fn theme_command_relabels_itself() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        assert_eq!(ws.command("toggle-theme").unwrap().label, "Passer au thème sombre");
        ws.execute("toggle-theme").unwrap();
        assert_eq!(ws.theme(), Theme::Dark);
        assert_eq!(ws.command("toggle-theme").unwrap().label, "Passer au thème clair");
    }

    #[test]
    fn ctrl_k_then_enter_executes() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        let ctrl_k = KeyInput::new(Key::Char('k'), Modifiers::ctrl());
        assert_eq!(ws.handle_key(&ctrl_k), KeyOutcome::Handled);
        assert!(ws.is_palette_open());

        for c in "urgent".chars() {
            ws.handle_key(&KeyInput::char(c));
        }
        assert_eq!(ws.selected_command().unwrap().id, "category:urgent");

        let outcome = ws.handle_key(&KeyInput::plain(Key::Enter));
        assert_eq!(outcome, KeyOutcome::Executed(Ok("category:urgent".into())));
        assert!(!ws.is_palette_open());
        assert_eq!(ws.nav_state().active_category, "urgent");
    }

    #[test]
    fn escape_closes_topmost_overlay_only() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        ws.open_detail();
        ws.toggle_filters_panel();
        ws.open_palette();

        let esc = KeyInput::plain(Key::Escape);
        ws.handle_key(&esc);
        assert_eq!(ws.topmost_overlay(), Some(Overlay::FiltersPanel));
        ws.handle_key(&esc);
        assert_eq!(ws.topmost_overlay(), Some(Overlay::DetailPanel));
        ws.handle_key(&esc);
        assert_eq!(ws.topmost_overlay(), None);
        assert_eq!(ws.handle_key(&esc), KeyOutcome::Ignored);
    }

    #[test]
    fn alt_left_goes_back_and_ctrl_b_toggles_sidebar() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        ws.on_category_change("completed").unwrap();

        ws.handle_key(&KeyInput::new(Key::Left, Modifiers::alt()));
        assert_eq!(ws.nav_state().active_category, "pending");

        ws.handle_key(&KeyInput::new(Key::Char('b'), Modifiers::ctrl()));
        assert!(ws.ui().sidebar_collapsed);
        assert_eq!(
            ws.command("toggle-sidebar").unwrap().label,
            "Déplier la barre latérale"
        );
    }

    #[test]
    fn plain_keys_ignored_when_palette_closed() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        assert_eq!(ws.handle_key(&KeyInput::char('x')), KeyOutcome::Ignored);
    }

    #[test]
    fn badge_update_is_inert() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        ws.open_palette();
        ws.set_palette_query("urg");
        let palette_before = ws.palette().state().clone();
        let nav_before = ws.nav_state().clone();

        ws.set_badge_counts(HashMap::from([("to-review".to_string(), 3)]));

        assert_eq!(ws.palette().state(), &palette_before);
        assert_eq!(ws.nav_state(), &nav_before);
        assert_eq!(ws.subnav().tabs[0].badge.as_ref().map(|b| b.count), Some(3));
    }

    #[test]
    fn register_commands_reranks_open_palette() {
        let mut ws = audit(Rc::new(MemoryStore::new()));
        ws.open_palette();
        ws.set_palette_query("export");
        assert_eq!(ws.palette().result_count(), 0);

        ws.register_commands(CommandContext::new().with_open_export(|| Ok(())));
        assert_eq!(ws.selected_command().unwrap().id, "export");
    }

    #[test]
    fn remount_restores_navigation_and_recency() {
        let store = Rc::new(MemoryStore::new());
        {
            let mut ws = audit(store.clone());
            ws.execute("category:urgent").unwrap();
            ws.on_filter_change(Some("unresolved-only")).unwrap();
        }

        let ws = audit(store);
        assert_eq!(ws.nav_state().active_category, "urgent");
        assert_eq!(ws.breadcrumb().display(), "Urgent › Critiques › Non résolus uniquement");
        assert_eq!(ws.recency().position("category:urgent"), Some(0));
    }
}
