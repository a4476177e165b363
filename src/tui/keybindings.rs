use crate::tui::action::Action;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

/// Maps KeyEvents to Actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(rename = "bindings")]
    bindings_list: Vec<KeyBinding>,

    #[serde(skip)]
    bindings_map: HashMap<KeyPattern, Action>,
}

/// Single keybinding entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: Action,
}

/// Pattern for matching key events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings_list = vec![
            // Navigation
            KeyBinding::new("Up", Action::MoveUp),
            KeyBinding::new("Down", Action::MoveDown),
            KeyBinding::new("Left", Action::MoveLeft),
            KeyBinding::new("Right", Action::MoveRight),
            KeyBinding::new("PageUp", Action::PageUp),
            KeyBinding::new("PageDown", Action::PageDown),
            KeyBinding::new("Ctrl+u", Action::PageUp),
            KeyBinding::new("Ctrl+d", Action::PageDown),
            KeyBinding::new("Home", Action::Home),
            KeyBinding::new("End", Action::End),
            KeyBinding::new("Tab", Action::FocusNext),
            KeyBinding::new("Shift+Tab", Action::FocusPrev),
            // Editing
            KeyBinding::new("Backspace", Action::Backspace),
            KeyBinding::new("Delete", Action::Delete),
            // Insight; plain keys only reach bindings outside text fields
            KeyBinding::new("i", Action::OpenInsight),
            // Application
            KeyBinding::new("Enter", Action::Confirm),
            KeyBinding::new("Esc", Action::Cancel),
            KeyBinding::new("F1", Action::ToggleHelp),
            KeyBinding::new("?", Action::ToggleHelp),
            KeyBinding::new("Ctrl+q", Action::Quit),
            KeyBinding::new("Ctrl+c", Action::Quit),
            KeyBinding::new("q", Action::Quit),
            // Clipboard
            KeyBinding::new("Ctrl+y", Action::CopyChartUrl),
        ];

        let bindings_map = Self::build_map(&bindings_list);

        Self {
            bindings_list,
            bindings_map,
        }
    }
}

impl KeyBindings {
    /// Build hashmap from bindings list
    fn build_map(bindings: &[KeyBinding]) -> HashMap<KeyPattern, Action> {
        bindings
            .iter()
            .filter_map(|b| {
                KeyPattern::from_string(&b.key)
                    .ok()
                    .map(|pattern| (pattern, b.action))
            })
            .collect()
    }

    /// Get action for key event
    pub fn get_action(&self, key: &KeyEvent) -> Option<Action> {
        let pattern = KeyPattern::from_event(key);
        self.bindings_map.get(&pattern).copied()
    }

    /// Load from a JSON5 file (plain JSON is accepted too)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut bindings: KeyBindings = json5::from_str(&content)?;
        bindings.bindings_map = Self::build_map(&bindings.bindings_list);
        Ok(bindings)
    }

    /// Save to JSON config file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get all bindings for an action (for help display)
    pub fn get_keys_for_action(&self, action: Action) -> Vec<String> {
        self.bindings_list
            .iter()
            .filter(|b| b.action == action)
            .map(|b| b.key.clone())
            .collect()
    }

    /// Returns (Action, description) for every action without a key
    pub fn get_unbound_actions(&self) -> Vec<(Action, &'static str)> {
        let bound_actions: HashSet<Action> = self.bindings_list.iter().map(|b| b.action).collect();

        Action::all()
            .into_iter()
            .filter(|action| !bound_actions.contains(action))
            .map(|action| (action, action.description()))
            .collect()
    }

    /// Validate bindings and return warnings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        // Two spellings of the same key count as a duplicate
        let mut seen: HashMap<KeyPattern, (&str, Action)> = HashMap::new();
        for binding in &self.bindings_list {
            let Ok(pattern) = KeyPattern::from_string(&binding.key) else {
                warnings.push(format!(
                    "Invalid key pattern '{}' for action {:?}",
                    binding.key, binding.action
                ));
                continue;
            };
            if let Some((existing_key, existing_action)) = seen.get(&pattern) {
                warnings.push(format!(
                    "Duplicate key '{}' (also '{}'): bound to both {:?} and {:?}",
                    binding.key, existing_key, existing_action, binding.action
                ));
            } else {
                seen.insert(pattern, (binding.key.as_str(), binding.action));
            }
        }

        let unbound = self.get_unbound_actions();
        if !unbound.is_empty() {
            warnings.push(format!(
                "Warning: {} action(s) have no keybindings: {}",
                unbound.len(),
                unbound
                    .iter()
                    .map(|(action, _)| format!("{:?}", action))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        warnings
    }
}

impl KeyBinding {
    pub fn new(key: &str, action: Action) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

impl KeyPattern {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self::normalized(code, modifiers)
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self::normalized(event.code, event.modifiers)
    }

    /// Terminals disagree on how they report shifted keys. Letters are stored
    /// lowercase with SHIFT, punctuation without SHIFT and BackTab without it.
    fn normalized(code: KeyCode, mut modifiers: KeyModifiers) -> Self {
        let code = match code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => {
                modifiers |= KeyModifiers::SHIFT;
                KeyCode::Char(c.to_ascii_lowercase())
            }
            KeyCode::Char(c) if !c.is_alphanumeric() => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::Char(c)
            }
            KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            KeyCode::BackTab => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            other => other,
        };
        Self { code, modifiers }
    }

    /// Parse from string (e.g., "Ctrl+c", "Shift+Tab", "a", "F1")
    pub fn from_string(s: &str) -> Result<Self, String> {
        // A lone "+" is the plus key, not a separator
        let (modifier_parts, key_part) = match s.rsplit_once('+') {
            Some(("", "")) => ("", "+"),
            Some((mods, "")) if !mods.is_empty() => (mods.trim_end_matches('+'), "+"),
            Some((mods, key)) => (mods, key),
            None => ("", s),
        };

        let mut modifiers = KeyModifiers::empty();
        for part in modifier_parts.split('+').filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" | "option" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                "cmd" | "command" | "super" => {
                    #[cfg(target_os = "macos")]
                    {
                        modifiers |= KeyModifiers::SUPER;
                    }
                    #[cfg(not(target_os = "macos"))]
                    {
                        modifiers |= KeyModifiers::CONTROL;
                    }
                }
                _ => return Err(format!("Unknown modifier: {}", part)),
            }
        }

        let mut chars = key_part.chars();
        let code = match (chars.next(), chars.next()) {
            (None, _) => return Err(format!("Missing key in '{}'", s)),
            // Single characters keep their case so "G" means Shift+g
            (Some(ch), None) => KeyCode::Char(ch),
            _ => match key_part.to_lowercase().as_str() {
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                "pageup" | "pgup" => KeyCode::PageUp,
                "pagedown" | "pgdown" | "pgdn" => KeyCode::PageDown,
                "home" => KeyCode::Home,
                "end" => KeyCode::End,
                "tab" => KeyCode::Tab,
                "backtab" => KeyCode::BackTab,
                "enter" | "return" => KeyCode::Enter,
                "esc" | "escape" => KeyCode::Esc,
                "backspace" => KeyCode::Backspace,
                "delete" | "del" => KeyCode::Delete,
                "insert" | "ins" => KeyCode::Insert,
                "space" => KeyCode::Char(' '),
                f if f.starts_with('f') => match f[1..].parse::<u8>() {
                    Ok(n) if (1..=12).contains(&n) => KeyCode::F(n),
                    _ => return Err(format!("Invalid function key: {}", key_part)),
                },
                _ => return Err(format!("Unknown key: {}", key_part)),
            },
        };

        Ok(Self::normalized(code, modifiers))
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if self.modifiers.contains(KeyModifiers::SUPER) {
            parts.push(if cfg!(target_os = "macos") { "Cmd" } else { "Super" }.to_string());
        }
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            parts.push("Shift".to_string());
        }

        let key_str = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "Shift+Tab".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Delete => "Del".to_string(),
            KeyCode::F(n) => format!("F{}", n),
            other => format!("{:?}", other),
        };

        parts.push(key_str);
        write!(f, "{}", parts.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_key_pattern_parsing() {
        assert!(KeyPattern::from_string("Ctrl+c").is_ok());
        assert!(KeyPattern::from_string("a").is_ok());
        assert!(KeyPattern::from_string("F1").is_ok());
        assert!(KeyPattern::from_string("Up").is_ok());
        assert!(KeyPattern::from_string("Ctrl+Alt+Delete").is_ok());
        assert!(KeyPattern::from_string("+").is_ok());
        assert!(KeyPattern::from_string("Hyper+x").is_err());
        assert!(KeyPattern::from_string("F13").is_err());
    }

    #[test]
    fn test_mac_command_key() {
        let pattern = KeyPattern::from_string("Cmd+c").unwrap();
        #[cfg(target_os = "macos")]
        assert!(pattern.modifiers.contains(KeyModifiers::SUPER));
        #[cfg(not(target_os = "macos"))]
        assert!(pattern.modifiers.contains(KeyModifiers::CONTROL));
    }

    #[test]
    fn test_shifted_keys_match_terminal_events() {
        let bindings = KeyBindings::default();
        // Some terminals report '?' with SHIFT, some without
        assert_eq!(
            bindings.get_action(&key(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some(Action::ToggleHelp)
        );
        assert_eq!(
            bindings.get_action(&key(KeyCode::Char('?'), KeyModifiers::NONE)),
            Some(Action::ToggleHelp)
        );
        assert_eq!(
            bindings.get_action(&key(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(Action::FocusPrev)
        );
        assert_eq!(
            KeyPattern::from_string("G").unwrap(),
            KeyPattern::from_event(&key(KeyCode::Char('G'), KeyModifiers::SHIFT))
        );
    }

    #[test]
    fn test_default_lookup() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.get_action(&key(KeyCode::Char('y'), KeyModifiers::CONTROL)),
            Some(Action::CopyChartUrl)
        );
        assert_eq!(
            bindings.get_action(&key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(Action::Confirm)
        );
        assert_eq!(bindings.get_action(&key(KeyCode::Char('z'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_default_bindings_are_valid() {
        let bindings = KeyBindings::default();
        let warnings = bindings.validate();
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert!(bindings.get_unbound_actions().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut bindings = KeyBindings::default();
        bindings.bindings_list = vec![
            KeyBinding::new("Ctrl+x", Action::Quit),
            KeyBinding::new("control+x", Action::Cancel),
            KeyBinding::new("Nope+x", Action::Confirm),
        ];
        let warnings = bindings.validate();
        assert!(warnings.iter().any(|w| w.starts_with("Duplicate key")));
        assert!(warnings.iter().any(|w| w.starts_with("Invalid key pattern")));
        assert!(warnings.iter().any(|w| w.contains("have no keybindings")));
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyPattern::from_string("Ctrl+y").unwrap().to_string(), "Ctrl+y");
        assert_eq!(KeyPattern::from_string("Shift+Tab").unwrap().to_string(), "Shift+Tab");
        assert_eq!(KeyPattern::from_string("PageDown").unwrap().to_string(), "PgDn");
    }

    #[test]
    fn test_keys_for_action() {
        let bindings = KeyBindings::default();
        let keys = bindings.get_keys_for_action(Action::Quit);
        assert_eq!(keys, vec!["Ctrl+q", "Ctrl+c", "q"]);
    }

    #[test]
    fn test_save_and_load() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("keybindings.json");

        let bindings = KeyBindings::default();
        bindings.save_to_file(&path).unwrap();

        let loaded = KeyBindings::load_from_file(&path).unwrap();
        assert_eq!(bindings.bindings_list.len(), loaded.bindings_list.len());
        assert_eq!(
            loaded.get_action(&key(KeyCode::F(1), KeyModifiers::NONE)),
            Some(Action::ToggleHelp)
        );
    }

    #[test]
    fn test_load_json5_with_comments() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                // just the essentials
                bindings: [
                    {{ key: "Ctrl+x", action: "Quit" }},
                    {{ key: "Enter", action: "Confirm" }},
                ],
            }}"#
        )
        .unwrap();

        let loaded = KeyBindings::load_from_file(file.path()).unwrap();
        assert_eq!(
            loaded.get_action(&key(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(loaded.get_action(&key(KeyCode::Char('q'), KeyModifiers::CONTROL)), None);
    }
}
