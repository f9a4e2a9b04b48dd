// moa: headless command palette and workspace navigation for dashboard modules

mod exit_codes;
mod tui;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::{ArgAction, Parser, Subcommand};
use moa_config::{presets, ConfigError, JsonFileStore, KeyValueStore, ModuleLayout, Settings};
use moa_core::{ActionError, Command};
use moa_engine::{CommandContext, ExecuteError, NavError, Workspace};
use serde_json::{json, Value};

use exit_codes::*;

#[derive(Parser)]
#[command(name = "moa")]
#[command(about = "Command palette and workspace navigation for dashboard modules")]
#[command(version)]
struct Cli {
    /// Use this layout file instead of the module's built-in layout
    #[arg(long, global = true, value_name = "TOML")]
    layout: Option<PathBuf>,

    /// Directory holding persisted navigation and recent commands
    #[arg(long, global = true, env = "MOA_STATE_DIR", value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Settings file (defaults to the per-user settings.json)
    #[arg(long, global = true, env = "MOA_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output as JSON for machine parsing
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List modules with a built-in layout
    Modules,

    /// List the commands a module registers
    #[command(after_help = "\
Examples:
  moa commands audit
  moa commands payments --json")]
    Commands {
        /// Module id (audit, payments, finances, messages, equipment)
        module: String,
    },

    /// Rank palette results for a query
    #[command(after_help = "\
Examples:
  moa search audit urg
  moa search audit            # browse mode: recent commands first, then by category
  moa search audit 'valider bc' --json")]
    Search {
        module: String,

        /// Search text; empty lists everything in browse order
        #[arg(default_value = "")]
        query: String,
    },

    /// Execute a command as if it were chosen in the palette
    #[command(after_help = "\
Examples:
  moa run audit category:urgent
  moa run audit toggle-theme
  moa run audit export

Recent commands and navigation are persisted under --state-dir.")]
    Run {
        module: String,

        /// Command id, as listed by `moa commands <module>`
        id: String,
    },

    /// Drive and inspect the persisted navigation state
    #[command(after_help = "\
Examples:
  moa nav audit show
  moa nav audit category urgent
  moa nav audit sub critical
  moa nav audit filter unresolved-only
  moa nav audit back")]
    Nav {
        module: String,

        #[command(subcommand)]
        action: NavCommands,
    },

    /// Interactive workspace with sub-navigation and command palette
    #[command(after_help = "\
Keys:
  Ctrl+K (Cmd+K)     Open command palette
  Esc                Close topmost overlay / quit
  Alt+Left           Back
  ?                  Show all keybindings

Badges file: a JSON object of sub-category id to count, e.g. {\"critical\": 12}")]
    Tui {
        module: String,

        /// JSON file with badge counts per sub-category
        #[arg(long, value_name = "FILE")]
        badges: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum NavCommands {
    /// Print the current location
    Show,
    /// Switch to a category (pushes history)
    Category { id: String },
    /// Switch to a sub-category of the active category
    Sub { id: String },
    /// Apply a filter of the active sub-category
    Filter { id: String },
    /// Remove the active filter
    ClearFilter,
    /// Return to the previous category
    Back,
    /// Forget history and return to the first category
    Reset,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = Options {
        layout: cli.layout,
        state_dir: cli.state_dir,
        config: cli.config,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Modules => cmd_modules(&opts),
        Commands::Commands { module } => cmd_commands(&opts, &module),
        Commands::Search { module, query } => cmd_search(&opts, &module, &query),
        Commands::Run { module, id } => cmd_run(&opts, &module, &id),
        Commands::Nav { module, action } => cmd_nav(&opts, &module, action),
        Commands::Tui { module, badges } => cmd_tui(&opts, &module, badges.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// `RUST_LOG` wins over `-v` when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn error(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_STORAGE, message: msg.into(), hint: None }
    }

    /// Create error from a layout failure with the matching exit code.
    pub fn config(err: ConfigError) -> Self {
        let (code, hint) = match &err {
            ConfigError::UnknownModule(_) => (
                EXIT_UNKNOWN_MODULE,
                Some("run `moa modules` to list built-in modules, or pass --layout".to_string()),
            ),
            ConfigError::Parse(_) | ConfigError::Validation(_) => (EXIT_INVALID_LAYOUT, None),
            ConfigError::Io(_) => (EXIT_USAGE, None),
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn execute(err: ExecuteError, module: &str) -> Self {
        match err {
            ExecuteError::UnknownCommand(_) => Self {
                code: EXIT_UNKNOWN_COMMAND,
                message: err.to_string(),
                hint: Some(format!("run `moa commands {module}` to list command ids")),
            },
            ExecuteError::Action { .. } => Self::error(err.to_string()),
        }
    }

    /// Navigation rejected an id; the hint lists what is valid right now.
    pub fn nav(err: NavError, ws: &Workspace) -> Self {
        let layout = ws.layout();
        let state = ws.nav_state();
        let valid: Vec<&str> = match &err {
            NavError::UnknownCategory(_) => layout.categories.iter().map(|c| c.id.as_str()).collect(),
            NavError::UnknownSubCategory { category, .. } => layout
                .category(category)
                .map(|c| c.sub_categories.iter().map(|s| s.id.as_str()).collect())
                .unwrap_or_default(),
            NavError::UnknownFilter { .. } => state
                .active_sub_category
                .as_deref()
                .and_then(|sub| layout.sub_category(&state.active_category, sub))
                .map(|s| s.filters.iter().map(|f| f.id.as_str()).collect())
                .unwrap_or_default(),
        };
        let hint = if valid.is_empty() {
            "nothing to choose from here".to_string()
        } else {
            format!("valid ids: {}", valid.join(", "))
        };
        Self::usage(err.to_string()).with_hint(hint)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Shared setup
// ============================================================================

struct Options {
    layout: Option<PathBuf>,
    state_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
}

impl Options {
    fn settings(&self) -> Settings {
        match &self.config {
            Some(path) => Settings::load_from(path),
            None => Settings::load(),
        }
    }

    fn load_layout(&self, module: &str) -> Result<ModuleLayout, CliError> {
        let Some(path) = &self.layout else {
            return presets::builtin(module).map_err(CliError::config);
        };

        let layout = ModuleLayout::load(path).map_err(CliError::config)?;
        if layout.module != module {
            return Err(CliError::usage(format!(
                "{} defines module '{}', not '{}'",
                path.display(),
                layout.module,
                module
            ))
            .with_hint(format!("use `{}` as the module argument", layout.module)));
        }
        Ok(layout)
    }

    fn open_store(&self, settings: &Settings) -> Result<Rc<dyn KeyValueStore>, CliError> {
        let dir = match &self.state_dir {
            Some(dir) => dir.clone(),
            None => settings.state_dir(),
        };
        fs::create_dir_all(&dir).map_err(|e| {
            CliError::storage(format!("cannot create state directory {}: {}", dir.display(), e))
                .with_hint("pass --state-dir or set storage.dir in settings.json")
        })?;
        log::debug!("state directory {}", dir.display());
        Ok(Rc::new(JsonFileStore::new(dir)))
    }

    /// Mount the module with host hooks bound.
    fn mount(&self, module: &str) -> Result<(Workspace, HookLog), CliError> {
        let layout = self.load_layout(module)?;
        let settings = self.settings();
        let store = self.open_store(&settings)?;

        let mut ws = Workspace::mount(layout, store, &settings);
        let hooks = HookLog::default();
        ws.register_commands(hooks.context());
        Ok((ws, hooks))
    }
}

/// Records which host hooks fired; the CLI stands in for the page that
/// would otherwise open dialogs or reload data.
#[derive(Clone, Default)]
pub struct HookLog(Rc<RefCell<Vec<&'static str>>>);

impl HookLog {
    fn context(&self) -> CommandContext {
        let hook = |name: &'static str| {
            let log = self.0.clone();
            move || -> Result<(), ActionError> {
                log.borrow_mut().push(name);
                Ok(())
            }
        };
        CommandContext::new()
            .with_open_stats(hook("open-stats"))
            .with_open_export(hook("export"))
            .with_refresh(hook("refresh"))
            .with_open_help(hook("open-help"))
            .with_open_settings(hook("open-settings"))
    }

    pub fn take(&self) -> Vec<&'static str> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

fn command_json(cmd: &Command) -> Value {
    json!({
        "id": cmd.id,
        "label": cmd.label,
        "description": cmd.description,
        "category": cmd.category.label(),
        "icon": cmd.icon,
        "shortcut": cmd.shortcut,
        "keywords": cmd.keywords,
    })
}

fn nav_json(ws: &Workspace) -> Value {
    json!({
        "module": ws.module(),
        "state": ws.nav_state(),
        "breadcrumb": ws.breadcrumb(),
    })
}

fn print_nav(ws: &Workspace) {
    let state = ws.nav_state();
    println!("{}", ws.breadcrumb().display());
    println!("  category:     {}", state.active_category);
    println!(
        "  sub-category: {}",
        state.active_sub_category.as_deref().unwrap_or("-")
    );
    println!("  filter:       {}", state.active_filter.as_deref().unwrap_or("-"));
    println!("  history:      {}", state.history.len());
    for (key, value) in &state.extras {
        println!("  {key}: {value}");
    }
}

// ============================================================================
// modules
// ============================================================================

fn cmd_modules(opts: &Options) -> Result<(), CliError> {
    let mut rows = Vec::new();
    for module in presets::builtin_modules() {
        let layout = presets::builtin(module).map_err(CliError::config)?;
        rows.push(layout);
    }

    if opts.json {
        let value: Vec<Value> = rows
            .iter()
            .map(|l| {
                json!({
                    "module": l.module,
                    "label": l.label,
                    "categories": l.categories.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{:#}", Value::Array(value));
        return Ok(());
    }

    for layout in &rows {
        println!(
            "{:<12} {:<28} {} categories",
            layout.module,
            layout.label,
            layout.categories.len()
        );
    }
    Ok(())
}

// ============================================================================
// commands
// ============================================================================

fn cmd_commands(opts: &Options, module: &str) -> Result<(), CliError> {
    let (ws, _) = opts.mount(module)?;

    if opts.json {
        let value: Vec<Value> = ws.commands().iter().map(command_json).collect();
        println!("{:#}", Value::Array(value));
        return Ok(());
    }

    let id_width = ws
        .commands()
        .iter()
        .map(|c| c.id.as_str().chars().count())
        .max()
        .unwrap_or(0);
    for cmd in ws.commands() {
        let shortcut = cmd.shortcut.as_deref().unwrap_or("");
        println!(
            "{:<id_width$}  {:<12} {}  {}",
            cmd.id.as_str(),
            cmd.category.label(),
            cmd.label,
            shortcut,
        );
    }
    Ok(())
}

// ============================================================================
// search
// ============================================================================

fn cmd_search(opts: &Options, module: &str, query: &str) -> Result<(), CliError> {
    let (mut ws, _) = opts.mount(module)?;
    ws.open_palette();
    ws.set_palette_query(query);

    let groups = ws.palette_groups();

    if opts.json {
        let value: Vec<Value> = groups
            .iter()
            .map(|(group, commands)| {
                json!({
                    "group": group.kind.title(),
                    "commands": commands.iter().map(|c| command_json(c)).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{:#}", json!({ "query": query, "groups": value }));
        return Ok(());
    }

    if groups.is_empty() {
        eprintln!("no commands match {:?}", query);
        return Ok(());
    }

    let mut first = true;
    for (group, commands) in &groups {
        println!("{}", group.kind.title());
        for cmd in commands {
            let marker = if first { ">" } else { " " };
            first = false;
            match &cmd.shortcut {
                Some(shortcut) => println!("{} {:<40} {}  [{}]", marker, cmd.label, cmd.id, shortcut),
                None => println!("{} {:<40} {}", marker, cmd.label, cmd.id),
            }
        }
    }
    Ok(())
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(opts: &Options, module: &str, id: &str) -> Result<(), CliError> {
    let (mut ws, hooks) = opts.mount(module)?;
    let label = ws.command(id).map(|c| c.label.clone());

    ws.execute(id).map_err(|e| CliError::execute(e, module))?;
    let fired = hooks.take();

    if opts.json {
        let mut value = nav_json(&ws);
        value["executed"] = json!(id);
        value["label"] = json!(label);
        value["hooks"] = json!(fired);
        println!("{:#}", value);
        return Ok(());
    }

    println!("ran {} ({})", id, label.unwrap_or_default());
    for hook in fired {
        println!("  hook: {hook}");
    }
    print_nav(&ws);
    Ok(())
}

// ============================================================================
// nav
// ============================================================================

fn cmd_nav(opts: &Options, module: &str, action: NavCommands) -> Result<(), CliError> {
    let (mut ws, _) = opts.mount(module)?;

    let result = match &action {
        NavCommands::Show => Ok(false),
        NavCommands::Category { id } => ws.on_category_change(id),
        NavCommands::Sub { id } => ws.on_sub_category_change(id),
        NavCommands::Filter { id } => ws.on_filter_change(Some(id.as_str())),
        NavCommands::ClearFilter => ws.on_filter_change(None),
        NavCommands::Back => {
            let moved = ws.go_back();
            if !moved {
                eprintln!("history is empty; nothing to go back to");
            }
            Ok(moved)
        }
        NavCommands::Reset => {
            ws.reset_navigation();
            Ok(true)
        }
    };
    if let Err(err) = result {
        return Err(CliError::nav(err, &ws));
    }

    if opts.json {
        println!("{:#}", nav_json(&ws));
    } else {
        print_nav(&ws);
    }
    Ok(())
}

// ============================================================================
// tui
// ============================================================================

fn cmd_tui(opts: &Options, module: &str, badges: Option<&Path>) -> Result<(), CliError> {
    let (mut ws, hooks) = opts.mount(module)?;
    if let Some(path) = badges {
        ws.set_badge_counts(read_badges(path)?);
    }
    tui::run(ws, hooks).map_err(CliError::error)
}

fn read_badges(path: &Path) -> Result<HashMap<String, u32>, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&text).map_err(|e| {
        CliError::usage(format!("invalid badges file {}: {}", path.display(), e))
            .with_hint("expected an object of sub-category id to count, e.g. {\"critical\": 12}")
    })
}
