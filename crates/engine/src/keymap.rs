// Keyboard surface, independent of any terminal or GUI toolkit.
// Front-ends translate their native events into KeyInput.

use moa_config::ModifierStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    /// Cmd on macOS, Super/Win elsewhere
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self { ctrl: true, ..Self::NONE }
    }

    pub fn alt() -> Self {
        Self { alt: true, ..Self::NONE }
    }

    pub fn shift() -> Self {
        Self { shift: true, ..Self::NONE }
    }

    pub fn meta() -> Self {
        Self { meta: true, ..Self::NONE }
    }

    /// True when a command modifier (not just Shift) is held.
    pub fn has_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyInput {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn char(c: char) -> Self {
        Self::plain(Key::Char(c))
    }
}

/// Shortcuts handled regardless of which panel has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    OpenPalette,
    /// Close the topmost overlay (palette > filters panel > detail panel).
    CloseOverlay,
    ToggleSidebar,
    GoBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap {
    /// Cmd rather than Ctrl is the primary modifier.
    uses_cmd: bool,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new(ModifierStyle::default())
    }
}

impl Keymap {
    pub fn new(style: ModifierStyle) -> Self {
        #[cfg(target_os = "macos")]
        let uses_cmd = matches!(style, ModifierStyle::Platform);
        #[cfg(not(target_os = "macos"))]
        let uses_cmd = {
            let _ = style;
            false
        };
        Self { uses_cmd }
    }

    fn primary_held(&self, m: &Modifiers) -> bool {
        if self.uses_cmd {
            m.meta && !m.ctrl && !m.alt
        } else {
            m.ctrl && !m.meta && !m.alt
        }
    }

    pub fn resolve(&self, input: &KeyInput) -> Option<GlobalAction> {
        let m = &input.modifiers;
        match input.key {
            Key::Char(c) if self.primary_held(m) && c.eq_ignore_ascii_case(&'k') => {
                Some(GlobalAction::OpenPalette)
            }
            Key::Char(c) if self.primary_held(m) && c.eq_ignore_ascii_case(&'b') => {
                Some(GlobalAction::ToggleSidebar)
            }
            Key::Escape if !m.has_command() => Some(GlobalAction::CloseOverlay),
            Key::Left if m.alt && !m.ctrl && !m.meta => Some(GlobalAction::GoBack),
            _ => None,
        }
    }

    /// Display string for primary-modifier shortcuts, e.g. "Ctrl+K" or "⌘K".
    pub fn shortcut_label(&self, key: char) -> String {
        let key = key.to_ascii_uppercase();
        if self.uses_cmd {
            format!("⌘{key}")
        } else {
            format!("Ctrl+{key}")
        }
    }

    pub fn back_label(&self) -> &'static str {
        if self.uses_cmd {
            "⌥←"
        } else {
            "Alt+←"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl_keymap() -> Keymap {
        Keymap::new(ModifierStyle::Ctrl)
    }

    #[test]
    fn ctrl_k_opens_palette() {
        let km = ctrl_keymap();
        let input = KeyInput::new(Key::Char('k'), Modifiers::ctrl());
        assert_eq!(km.resolve(&input), Some(GlobalAction::OpenPalette));

        let upper = KeyInput::new(Key::Char('K'), Modifiers::ctrl());
        assert_eq!(km.resolve(&upper), Some(GlobalAction::OpenPalette));
    }

    #[test]
    fn plain_k_is_not_global() {
        assert_eq!(ctrl_keymap().resolve(&KeyInput::char('k')), None);
    }

    #[test]
    fn sidebar_escape_and_back() {
        let km = ctrl_keymap();
        assert_eq!(
            km.resolve(&KeyInput::new(Key::Char('b'), Modifiers::ctrl())),
            Some(GlobalAction::ToggleSidebar)
        );
        assert_eq!(
            km.resolve(&KeyInput::plain(Key::Escape)),
            Some(GlobalAction::CloseOverlay)
        );
        assert_eq!(
            km.resolve(&KeyInput::new(Key::Left, Modifiers::alt())),
            Some(GlobalAction::GoBack)
        );
        assert_eq!(km.resolve(&KeyInput::plain(Key::Left)), None);
    }

    #[test]
    fn ctrl_style_labels() {
        let km = ctrl_keymap();
        assert_eq!(km.shortcut_label('k'), "Ctrl+K");
        assert_eq!(km.back_label(), "Alt+←");
    }
}
