//! Command palette state machine.
//!
//! `Closed -> Open` on an explicit open; `Open -> Closed` on close, Escape or
//! after a command runs. While open, keys act on the flattened grouped
//! results: Down/Tab and Up/Shift+Tab wrap around, Home/End jump, typing and
//! Backspace edit the query (re-rank, selection back to 0), Enter asks the
//! owner to execute the selected command.
//!
//! Result indices refer to the command slice passed to `open`/`refresh`; the
//! owner must call `refresh` whenever that slice changes.

use moa_core::{Command, CommandCategory, CommandId};

use crate::keymap::{Key, KeyInput};
use crate::recency::RecencyList;
use crate::search::RankingEngine;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaletteState {
    pub is_open: bool,
    pub query: String,
    pub selected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Recent,
    Category(CommandCategory),
}

impl GroupKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Recent => "Récents",
            Self::Category(cat) => cat.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultGroup {
    pub kind: GroupKind,
    /// Indices into the command slice, in display order.
    pub items: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteEvent {
    /// Key not meaningful to the palette (or palette closed).
    Ignored,
    /// Query or selection changed.
    Updated,
    Closed,
    /// Owner should execute this command, then close.
    Execute(CommandId),
}

#[derive(Debug)]
pub struct PaletteController {
    state: PaletteState,
    groups: Vec<ResultGroup>,
    /// Groups flattened, the selection indexes into this.
    flat: Vec<usize>,
    engine: RankingEngine,
    recent_bucket_size: usize,
    max_results: usize,
}

impl PaletteController {
    pub fn new(engine: RankingEngine, recent_bucket_size: usize, max_results: usize) -> Self {
        Self {
            state: PaletteState::default(),
            groups: Vec::new(),
            flat: Vec::new(),
            engine,
            recent_bucket_size,
            max_results,
        }
    }

    pub fn state(&self) -> &PaletteState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    pub fn query(&self) -> &str {
        &self.state.query
    }

    pub fn selected(&self) -> usize {
        self.state.selected
    }

    pub fn groups(&self) -> &[ResultGroup] {
        &self.groups
    }

    /// Flattened results in display order.
    pub fn results(&self) -> &[usize] {
        &self.flat
    }

    pub fn result_count(&self) -> usize {
        self.flat.len()
    }

    pub fn selected_command<'a>(&self, commands: &'a [Command]) -> Option<&'a Command> {
        self.flat
            .get(self.state.selected)
            .and_then(|&i| commands.get(i))
    }

    pub fn open(&mut self, commands: &[Command], recency: &RecencyList) {
        self.state = PaletteState {
            is_open: true,
            query: String::new(),
            selected: 0,
        };
        self.rerank(commands, recency);
        log::debug!("palette opened ({} results)", self.flat.len());
    }

    pub fn close(&mut self) {
        if self.state.is_open {
            log::debug!("palette closed");
        }
        self.state = PaletteState::default();
        self.groups.clear();
        self.flat.clear();
    }

    /// Re-rank after the command list changed; selection is clamped.
    pub fn refresh(&mut self, commands: &[Command], recency: &RecencyList) {
        if !self.state.is_open {
            return;
        }
        self.rerank(commands, recency);
        if self.state.selected >= self.flat.len() {
            self.state.selected = self.flat.len().saturating_sub(1);
        }
    }

    pub fn set_query(&mut self, query: &str, commands: &[Command], recency: &RecencyList) {
        self.state.query = query.to_string();
        self.state.selected = 0;
        self.rerank(commands, recency);
        log::debug!("palette query {:?} ({} results)", self.state.query, self.flat.len());
    }

    pub fn select_next(&mut self) {
        let count = self.flat.len();
        if count > 0 {
            self.state.selected = (self.state.selected + 1) % count;
        }
    }

    pub fn select_prev(&mut self) {
        let count = self.flat.len();
        if count > 0 {
            self.state.selected = (self.state.selected + count - 1) % count;
        }
    }

    pub fn select_first(&mut self) {
        self.state.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.state.selected = self.flat.len().saturating_sub(1);
    }

    pub fn handle_key(
        &mut self,
        input: &KeyInput,
        commands: &[Command],
        recency: &RecencyList,
    ) -> PaletteEvent {
        if !self.state.is_open {
            return PaletteEvent::Ignored;
        }

        let m = input.modifiers;
        match input.key {
            Key::Escape => {
                self.close();
                PaletteEvent::Closed
            }
            Key::Down => {
                self.select_next();
                PaletteEvent::Updated
            }
            Key::Tab if m.shift => {
                self.select_prev();
                PaletteEvent::Updated
            }
            Key::Tab => {
                self.select_next();
                PaletteEvent::Updated
            }
            Key::Up => {
                self.select_prev();
                PaletteEvent::Updated
            }
            Key::Home => {
                self.select_first();
                PaletteEvent::Updated
            }
            Key::End => {
                self.select_last();
                PaletteEvent::Updated
            }
            Key::Enter => match self.selected_command(commands) {
                Some(cmd) => PaletteEvent::Execute(cmd.id.clone()),
                None => PaletteEvent::Ignored,
            },
            Key::Backspace => {
                let mut query = self.state.query.clone();
                if query.pop().is_none() {
                    return PaletteEvent::Ignored;
                }
                self.set_query(&query, commands, recency);
                PaletteEvent::Updated
            }
            Key::Char(c) if !m.has_command() && !c.is_control() => {
                let mut query = self.state.query.clone();
                query.push(c);
                self.set_query(&query, commands, recency);
                PaletteEvent::Updated
            }
            _ => PaletteEvent::Ignored,
        }
    }

    fn rerank(&mut self, commands: &[Command], recency: &RecencyList) {
        let mut ranked: Vec<usize> = self
            .engine
            .rank(commands, &self.state.query, recency)
            .into_iter()
            .map(|r| r.index)
            .collect();
        ranked.truncate(self.max_results);

        self.groups = self.group(&ranked, commands, recency);
        self.flat = self.groups.iter().flat_map(|g| g.items.iter().copied()).collect();
    }

    fn group(&self, ranked: &[usize], commands: &[Command], recency: &RecencyList) -> Vec<ResultGroup> {
        let mut groups = Vec::new();
        let mut rest: Vec<usize> = ranked.to_vec();

        if self.state.query.trim().is_empty() && !recency.is_empty() {
            // Browse mode puts recent commands at the front of `ranked`
            let recent: Vec<usize> = ranked
                .iter()
                .copied()
                .take_while(|&i| recency.contains(commands[i].id.as_str()))
                .take(self.recent_bucket_size)
                .collect();
            if !recent.is_empty() {
                rest.retain(|i| !recent.contains(i));
                groups.push(ResultGroup {
                    kind: GroupKind::Recent,
                    items: recent,
                });
            }
        }

        for &category in CommandCategory::all() {
            let items: Vec<usize> = rest
                .iter()
                .copied()
                .filter(|&i| commands[i].category == category)
                .collect();
            if !items.is_empty() {
                groups.push(ResultGroup {
                    kind: GroupKind::Category(category),
                    items,
                });
            }
        }
        groups
    }
}
