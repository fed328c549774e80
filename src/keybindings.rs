//! Keybinding registry: maps actions to key events with config overrides.
//!
//! Defaults live in one table; users rebind actions from the `[keybindings]`
//! section of config.toml (action name → key string).
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    PageDown,
    PageUp,
    First,
    Last,
    Reload,
    OpenInPlayer,
    ShowLogin,
    AddReel,
    DeleteReel,
    ToggleMute,
    ShowHelp,
    Back,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Next reel",
            Self::NavUp => "Previous reel",
            Self::PageDown => "Next reel (page)",
            Self::PageUp => "Previous reel (page)",
            Self::First => "Jump to first reel",
            Self::Last => "Load more and jump to the end",
            Self::Reload => "Reload feed",
            Self::OpenInPlayer => "Open reel in system player",
            Self::ShowLogin => "Login / register",
            Self::AddReel => "Add a reel",
            Self::DeleteReel => "Delete current reel",
            Self::ToggleMute => "Toggle mute",
            Self::ShowHelp => "Show help",
            Self::Back => "Go back / dismiss",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
///
/// Dialogs with text fields read keys directly and never consult the
/// registry, so typing cannot trigger feed actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Feed,
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Drop SHIFT from character keys; the case of the char already says it.
    fn normalized(self) -> Self {
        match self.code {
            KeyCode::Char(_) => Self::new(self.code, self.modifiers.difference(KeyModifiers::SHIFT)),
            _ => self,
        }
    }
}

const fn ch(c: char) -> KeySpec {
    KeySpec::plain(KeyCode::Char(c))
}

const DEFAULT_BINDINGS: &[(Context, KeySpec, Action)] = &[
    (Context::Global, ch('q'), Action::Quit),
    (Context::Global, KeySpec::ctrl('c'), Action::Quit),
    (Context::Global, ch('?'), Action::ShowHelp),
    (Context::Global, KeySpec::plain(KeyCode::Esc), Action::Back),
    (Context::Feed, ch('j'), Action::NavDown),
    (Context::Feed, KeySpec::plain(KeyCode::Down), Action::NavDown),
    (Context::Feed, ch('k'), Action::NavUp),
    (Context::Feed, KeySpec::plain(KeyCode::Up), Action::NavUp),
    (Context::Feed, KeySpec::plain(KeyCode::PageDown), Action::PageDown),
    (Context::Feed, ch(' '), Action::PageDown),
    (Context::Feed, KeySpec::plain(KeyCode::PageUp), Action::PageUp),
    (Context::Feed, KeySpec::plain(KeyCode::Home), Action::First),
    (Context::Feed, ch('g'), Action::First),
    (Context::Feed, KeySpec::plain(KeyCode::End), Action::Last),
    (Context::Feed, ch('G'), Action::Last),
    (Context::Feed, ch('r'), Action::Reload),
    (Context::Feed, ch('o'), Action::OpenInPlayer),
    (Context::Feed, ch('l'), Action::ShowLogin),
    (Context::Feed, ch('a'), Action::AddReel),
    (Context::Feed, ch('d'), Action::DeleteReel),
    (Context::Feed, ch('m'), Action::ToggleMute),
];

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "/"
/// - Named keys: "Enter", "Esc", "Tab", "Up", "Down", "Home", "End",
///   "PageUp", "PageDown", "Space"
/// - Modifier combos: "Ctrl+d"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        let c = chars.next()?;
        return chars.next().is_none().then(|| KeySpec::ctrl(c));
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "pageup" | "pgup" => Some(KeyCode::PageUp),
        "pagedown" | "pgdn" => Some(KeyCode::PageDown),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s.strip_prefix(['F', 'f']).and_then(|n| n.parse::<u8>().ok()) {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then(|| ch(c))
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to [`Context::Global`].
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings in registration order, for the help screen
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        for &(context, key, action) in DEFAULT_BINDINGS {
            registry.bind(context, key, action);
        }
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    /// Apply user overrides from the config keybindings map.
    ///
    /// Keys in the map are action names ("quit", "nav_down"), values are key
    /// strings ("q", "Ctrl+d", "F5"). An override replaces every default key
    /// of that action, in the same contexts.
    ///
    /// Returns warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (ctx, _, a) in &self.bindings {
                if *a == action && !contexts.contains(ctx) {
                    contexts.push(*ctx);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a key, trying `context` first, then Global.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::new(code, modifiers).normalized();
        self.lookup
            .get(&(context, key))
            .or_else(|| self.lookup.get(&(Context::Global, key)))
            .copied()
    }

    /// All bindings as (context, key display string, action, description).
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "navdown" | "down" | "next" => Some(Action::NavDown),
        "nav_up" | "navup" | "up" | "previous" => Some(Action::NavUp),
        "page_down" | "pagedown" => Some(Action::PageDown),
        "page_up" | "pageup" => Some(Action::PageUp),
        "first" | "home" => Some(Action::First),
        "last" | "end" => Some(Action::Last),
        "reload" | "refresh" => Some(Action::Reload),
        "open_in_player" | "openinplayer" | "open" => Some(Action::OpenInPlayer),
        "show_login" | "showlogin" | "login" => Some(Action::ShowLogin),
        "add_reel" | "addreel" | "add" => Some(Action::AddReel),
        "delete_reel" | "deletereel" | "delete" => Some(Action::DeleteReel),
        "toggle_mute" | "togglemute" | "mute" => Some(Action::ToggleMute),
        "show_help" | "showhelp" | "help" => Some(Action::ShowHelp),
        "back" => Some(Action::Back),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
