//! Command registry: the per-module list of invocable commands.
//!
//! Built from the layout (navigation commands), the ambient UI state (labels
//! that depend on theme or panel visibility) and a context of optional
//! callbacks. A command whose callback is absent is never built.

use std::collections::HashSet;
use std::rc::Rc;

use moa_config::ModuleLayout;
use moa_core::{ActionError, BuiltinAction, Callback, Command, CommandAction, CommandCategory, Theme};

use crate::keymap::Keymap;

/// Optional module hooks. Each present hook contributes one command.
#[derive(Clone, Default)]
pub struct CommandContext {
    pub on_open_stats: Option<Callback>,
    pub on_open_export: Option<Callback>,
    pub on_refresh: Option<Callback>,
    pub on_open_help: Option<Callback>,
    pub on_open_settings: Option<Callback>,
    /// Module-specific commands, each carrying its own callback.
    pub extra: Vec<Command>,
}

impl CommandContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_stats(mut self, f: impl Fn() -> Result<(), ActionError> + 'static) -> Self {
        self.on_open_stats = Some(Rc::new(f));
        self
    }

    pub fn with_open_export(mut self, f: impl Fn() -> Result<(), ActionError> + 'static) -> Self {
        self.on_open_export = Some(Rc::new(f));
        self
    }

    pub fn with_refresh(mut self, f: impl Fn() -> Result<(), ActionError> + 'static) -> Self {
        self.on_refresh = Some(Rc::new(f));
        self
    }

    pub fn with_open_help(mut self, f: impl Fn() -> Result<(), ActionError> + 'static) -> Self {
        self.on_open_help = Some(Rc::new(f));
        self
    }

    pub fn with_open_settings(mut self, f: impl Fn() -> Result<(), ActionError> + 'static) -> Self {
        self.on_open_settings = Some(Rc::new(f));
        self
    }

    pub fn with_command(mut self, command: Command) -> Self {
        self.extra.push(command);
        self
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("on_open_stats", &self.on_open_stats.is_some())
            .field("on_open_export", &self.on_open_export.is_some())
            .field("on_refresh", &self.on_refresh.is_some())
            .field("on_open_help", &self.on_open_help.is_some())
            .field("on_open_settings", &self.on_open_settings.is_some())
            .field("extra", &self.extra.len())
            .finish()
    }
}

/// UI state command labels depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiState {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    pub filters_panel_open: bool,
}

pub struct CommandRegistry {
    layout: Rc<ModuleLayout>,
    keymap: Keymap,
}

impl CommandRegistry {
    pub fn new(layout: Rc<ModuleLayout>, keymap: Keymap) -> Self {
        Self { layout, keymap }
    }

    /// Build the full command list for the current state.
    ///
    /// Ids are unique: a module command reusing a built-in id is dropped.
    /// Sub-category commands follow `active_category`; filter commands follow
    /// `active_sub_category` within it.
    pub fn build(
        &self,
        ctx: &CommandContext,
        active_category: &str,
        active_sub_category: Option<&str>,
        ui: &UiState,
    ) -> Vec<Command> {
        let mut commands = Vec::new();

        // Navigation
        for cat in &self.layout.categories {
            commands.push(
                Command::builtin(
                    format!("category:{}", cat.id),
                    format!("Aller à : {}", cat.label),
                    CommandCategory::Navigation,
                    BuiltinAction::ChangeCategory(cat.id.clone()),
                )
                .with_description(format!("{} › {}", self.layout.label, cat.label))
                .with_icon("folder")
                .with_keywords([cat.id.clone(), cat.label.clone()]),
            );
        }

        if let Some(cat) = self.layout.category(active_category) {
            for sub in &cat.sub_categories {
                commands.push(
                    Command::builtin(
                        format!("sub-category:{}", sub.id),
                        format!("Afficher : {}", sub.label),
                        CommandCategory::Navigation,
                        BuiltinAction::ChangeSubCategory(sub.id.clone()),
                    )
                    .with_description(format!("{} › {}", cat.label, sub.label))
                    .with_icon("list")
                    .with_keywords([sub.id.clone(), sub.label.clone()]),
                );
            }
        }

        commands.push(
            Command::builtin("nav-back", "Retour", CommandCategory::Navigation, BuiltinAction::GoBack)
                .with_description("Revenir à la catégorie précédente")
                .with_icon("arrow-left")
                .with_shortcut(self.keymap.back_label())
                .with_keywords(["back", "retour", "précédent"]),
        );

        // View
        commands.push(
            Command::builtin("clear-filter", "Effacer le filtre", CommandCategory::View, BuiltinAction::ClearFilter)
                .with_icon("filter-x")
                .with_keywords(["filtre", "filter", "reset"]),
        );

        let active_sub = active_sub_category.and_then(|sub| self.layout.sub_category(active_category, sub));
        if let Some(sub) = active_sub {
            for filter in &sub.filters {
                commands.push(
                    Command::builtin(
                        format!("filter:{}", filter.id),
                        format!("Filtrer : {}", filter.label),
                        CommandCategory::View,
                        BuiltinAction::ChangeFilter(filter.id.clone()),
                    )
                    .with_description(format!("{} › {}", sub.label, filter.label))
                    .with_icon("filter")
                    .with_keywords([filter.id.clone(), filter.label.clone()]),
                );
            }
        }

        let filters_label = if ui.filters_panel_open {
            "Masquer les filtres"
        } else {
            "Afficher les filtres"
        };
        commands.push(
            Command::builtin("toggle-filters", filters_label, CommandCategory::View, BuiltinAction::ToggleFiltersPanel)
                .with_icon("sliders")
                .with_keywords(["filtres", "filters", "panneau"]),
        );

        let sidebar_label = if ui.sidebar_collapsed {
            "Déplier la barre latérale"
        } else {
            "Réduire la barre latérale"
        };
        commands.push(
            Command::builtin("toggle-sidebar", sidebar_label, CommandCategory::View, BuiltinAction::ToggleSidebar)
                .with_icon("sidebar")
                .with_shortcut(self.keymap.shortcut_label('b'))
                .with_keywords(["sidebar", "menu", "barre"]),
        );

        // Settings
        commands.push(
            Command::builtin("toggle-theme", ui.theme.switch_label(), CommandCategory::Settings, BuiltinAction::ToggleTheme)
                .with_icon(match ui.theme {
                    Theme::Light => "moon",
                    Theme::Dark => "sun",
                })
                .with_keywords(["theme", "thème", "sombre", "clair", "dark", "light"]),
        );

        // Conditional on module hooks
        if let Some(cb) = &ctx.on_open_stats {
            commands.push(
                hook("open-stats", "Statistiques", CommandCategory::Data, cb)
                    .with_description("Ouvrir le tableau de bord statistique")
                    .with_icon("bar-chart")
                    .with_keywords(["stats", "statistiques", "kpi"]),
            );
        }
        if let Some(cb) = &ctx.on_open_export {
            commands.push(
                hook("export", "Exporter", CommandCategory::Data, cb)
                    .with_description("Exporter la vue courante")
                    .with_icon("download")
                    .with_keywords(["export", "csv"]),
            );
        }
        if let Some(cb) = &ctx.on_refresh {
            commands.push(
                hook("refresh", "Actualiser", CommandCategory::Actions, cb)
                    .with_description("Recharger les données")
                    .with_icon("refresh-cw")
                    .with_keywords(["refresh", "recharger", "actualiser"]),
            );
        }
        if let Some(cb) = &ctx.on_open_help {
            commands.push(
                hook("open-help", "Aide et raccourcis", CommandCategory::Help, cb)
                    .with_icon("help-circle")
                    .with_keywords(["help", "aide", "raccourcis"]),
            );
        }
        if let Some(cb) = &ctx.on_open_settings {
            commands.push(
                hook("open-settings", "Paramètres", CommandCategory::Settings, cb)
                    .with_icon("settings")
                    .with_keywords(["settings", "préférences", "options"]),
            );
        }

        let mut seen: HashSet<String> = commands.iter().map(|c| c.id.to_string()).collect();
        for cmd in &ctx.extra {
            if seen.insert(cmd.id.to_string()) {
                commands.push(cmd.clone());
            } else {
                log::warn!("duplicate command id '{}' ignored", cmd.id);
            }
        }

        commands
    }
}

fn hook(id: &str, label: &str, category: CommandCategory, cb: &Callback) -> Command {
    Command::new(id, label, category, CommandAction::Callback(cb.clone()))
}
