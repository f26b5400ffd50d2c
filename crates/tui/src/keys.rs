//! Key events to names, and names to logical actions.

use {
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
    murmur_config::KeysConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FocusGuildsTree,
    FocusChannelsTree,
    FocusMessagesPanel,
    FocusMessageInput,
    SelectPreviousMessage,
    SelectNextMessage,
    SelectFirstMessage,
    SelectLastMessage,
    OpenMessageActions,
    SelectReply,
    OpenExternalEditor,
    Cancel,
    Quit,
}

/// Render a key press the way bindings are written: `Ctrl+E`, `Alt+1`,
/// `Shift+Up`, `Esc`, `k`, `G`.
pub fn key_name(key: &KeyEvent) -> String {
    let mut name = String::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        name.push_str("Ctrl+");
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        name.push_str("Alt+");
    }

    let base = match key.code {
        KeyCode::Char(' ') => "Space".to_owned(),
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            c.to_ascii_uppercase().to_string()
        },
        // Shift is already folded into the character.
        KeyCode::Char(c) => c.to_string(),
        code => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                name.push_str("Shift+");
            }
            named_key(code)
        },
    };
    name.push_str(&base);
    name
}

fn named_key(code: KeyCode) -> String {
    match code {
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Esc".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::BackTab => "Backtab".into(),
        KeyCode::Up => "Up".into(),
        KeyCode::Down => "Down".into(),
        KeyCode::Left => "Left".into(),
        KeyCode::Right => "Right".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::PageUp => "PageUp".into(),
        KeyCode::PageDown => "PageDown".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Insert => "Insert".into(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}

/// Canonical spelling of a configured binding, so `ctrl+e` matches the
/// `Ctrl+E` that [`key_name`] produces.
fn normalize(binding: &str) -> String {
    let parts: Vec<&str> = binding.split('+').collect();
    let Some((key, modifiers)) = parts.split_last() else {
        return binding.to_owned();
    };
    // A lone "+" splits into two empty parts.
    if key.is_empty() {
        return binding.to_owned();
    }

    let mut out = String::new();
    let mut ctrl = false;
    for modifier in modifiers {
        let canonical = match modifier.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => {
                ctrl = true;
                "Ctrl+"
            },
            "alt" | "meta" => "Alt+",
            "shift" => "Shift+",
            _ => return binding.to_owned(),
        };
        out.push_str(canonical);
    }

    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if ctrl => out.push(c.to_ascii_uppercase()),
        _ => out.push_str(key),
    }
    out
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<(Action, Vec<String>)>,
}

impl Keymap {
    pub fn from_config(keys: &KeysConfig) -> Self {
        let entry = |action: Action, names: &[String]| -> (Action, Vec<String>) {
            (action, names.iter().map(String::as_str).map(normalize).collect())
        };
        Self {
            bindings: vec![
                entry(Action::FocusGuildsTree, &keys.focus_guilds_tree),
                entry(Action::FocusChannelsTree, &keys.focus_channels_tree),
                entry(Action::FocusMessagesPanel, &keys.focus_messages_panel),
                entry(Action::FocusMessageInput, &keys.focus_message_input),
                entry(Action::SelectPreviousMessage, &keys.select_previous_message),
                entry(Action::SelectNextMessage, &keys.select_next_message),
                entry(Action::SelectFirstMessage, &keys.select_first_message),
                entry(Action::SelectLastMessage, &keys.select_last_message),
                entry(Action::OpenMessageActions, &keys.open_message_actions),
                entry(Action::SelectReply, &keys.select_reply),
                entry(Action::OpenExternalEditor, &keys.open_external_editor),
                entry(Action::Cancel, &keys.cancel),
                entry(Action::Quit, &keys.quit),
            ],
        }
    }

    pub fn matches(&self, action: Action, name: &str) -> bool {
        self.bindings
            .iter()
            .any(|(a, names)| *a == action && names.iter().any(|n| n == name))
    }

    /// The first of `candidates` bound to `name`.
    pub fn resolve(&self, name: &str, candidates: &[Action]) -> Option<Action> {
        candidates.iter().copied().find(|a| self.matches(*a, name))
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::from_config(&KeysConfig::default())
    }
}
