//! User configuration: motion tunables, keybindings and persistence.
//!
//! Stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/card-reel/config.toml` (default
//! `~/.config/card-reel/config.toml`).  Unknown keys and malformed values are
//! reported as [`ConfigError`]s and the affected setting keeps its default.

use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

use crate::core::carousel::{CarouselConfig, InputMode};
use crate::core::reveal::RevealConfig;
use crate::core::scheduler::DEFAULT_FRAME_MS;

// ───────────────────────────────────────── errors ────────────

/// Problems found while reading the config file.  None of them are fatal.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("line {line}: expected `key = value`")]
    MissingEquals { line: usize },
    #[error("line {line}: unknown key `{key}`")]
    UnknownKey { line: usize, key: String },
    #[error("line {line}: `{key}` expects a number, got `{value}`")]
    NotANumber { line: usize, key: String, value: String },
    #[error("line {line}: `{key}` = {value} clamped to {clamped}")]
    Clamped {
        line: usize,
        key: String,
        value: f64,
        clamped: f64,
    },
    #[error("line {line}: no valid key in `{value}` for `{key}`")]
    BadBinding { line: usize, key: String, value: String },
}

// ───────────────────────────────────────── actions ───────────

/// All configurable user actions on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    NextCard,
    PrevCard,
    OpenCard,
    ToggleTouch,
    RestartText,
    ReloadCards,
    Help,
    Quit,
}

impl Action {
    /// Ordered list of all actions (used for the help overlay).
    pub const ALL: &[Action] = &[
        Action::NextCard,
        Action::PrevCard,
        Action::OpenCard,
        Action::ToggleTouch,
        Action::RestartText,
        Action::ReloadCards,
        Action::Help,
        Action::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::NextCard => "Next Card",
            Action::PrevCard => "Previous Card",
            Action::OpenCard => "Open Front Card",
            Action::ToggleTouch => "Toggle Touch Mode",
            Action::RestartText => "Restart Storyline",
            Action::ReloadCards => "Reload Card File",
            Action::Help => "Help / Controls",
            Action::Quit => "Quit",
        }
    }

    fn config_key(self) -> &'static str {
        match self {
            Action::NextCard => "next_card",
            Action::PrevCard => "prev_card",
            Action::OpenCard => "open_card",
            Action::ToggleTouch => "toggle_touch",
            Action::RestartText => "restart_text",
            Action::ReloadCards => "reload_cards",
            Action::Help => "help",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

const MODIFIER_MASK: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT);

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Only CTRL/ALT/SHIFT are compared.
    pub fn matches(&self, event: KeyEvent) -> bool {
        self.code == event.code && (self.modifiers & MODIFIER_MASK) == (event.modifiers & MODIFIER_MASK)
    }

    /// Create a binding from a raw key event (used during rebinding).
    pub fn from_key_event(event: KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers & MODIFIER_MASK,
        }
    }

    fn modifier_prefix(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s
    }

    /// User-friendly display string (e.g. `"Ctrl+c"`, `"→"`, `"Space"`).
    pub fn display(&self) -> String {
        let key = match self.code {
            KeyCode::Up => "↑".into(),
            KeyCode::Down => "↓".into(),
            KeyCode::Left => "←".into(),
            KeyCode::Right => "→".into(),
            KeyCode::Backspace => "Bksp".into(),
            KeyCode::Delete => "Del".into(),
            KeyCode::PageUp => "PgUp".into(),
            KeyCode::PageDown => "PgDn".into(),
            _ => key_name(self.code),
        };
        format!("{}{key}", self.modifier_prefix())
    }

    /// Config-file form (e.g. `"Alt+Right"`, `"q"`).
    fn to_config_string(&self) -> String {
        format!("{}{}", self.modifier_prefix(), key_name(self.code))
    }

    /// Parse a key string like `"Ctrl+c"`, `"Alt+Up"`, `"q"`, `"Enter"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let (key_part, mods) = parts.split_last()?;

        for part in mods {
            match part.trim().to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        let raw = key_part.trim();
        let code = match raw.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "bksp" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            s if s.starts_with('f') && s.len() > 1 => KeyCode::F(s[1..].parse().ok()?),
            // Single characters keep their case.
            _ if raw.chars().count() == 1 => KeyCode::Char(raw.chars().next()?),
            _ => return None,
        };

        Some(KeyBind { code, modifiers })
    }
}

fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".into(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Up => "Up".into(),
        KeyCode::Down => "Down".into(),
        KeyCode::Left => "Left".into(),
        KeyCode::Right => "Right".into(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Esc".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Delete => "Delete".into(),
        KeyCode::Home => "Home".into(),
        KeyCode::End => "End".into(),
        KeyCode::PageUp => "PageUp".into(),
        KeyCode::PageDown => "PageDown".into(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    }
}

// ───────────────────────────────────────── tunables ──────────

/// Every numeric knob of the carousel and the storyline reveal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    pub spacing: f64,
    pub card_width: f64,
    pub card_height: f64,
    pub repel_distance: f64,
    pub repel_duration_sec: f64,
    pub wheel_sensitivity: f64,
    pub touch_sensitivity: f64,
    pub drag_smoothing: f64,
    pub drift_smoothing: f64,
    pub mask_band: f64,
    pub typing_duration_ms: f64,
    pub min_char_delay_ms: f64,
    pub restart_delay_ms: f64,
    pub scramble_dissolve_frames: u32,
    pub scramble_resolve_frames: u32,
    pub frame_ms: f64,
}

impl Default for Tunables {
    fn default() -> Self {
        let c = CarouselConfig::default();
        let r = RevealConfig::default();
        Self {
            spacing: c.spacing,
            card_width: c.width,
            card_height: c.height,
            repel_distance: c.repel_distance,
            repel_duration_sec: c.repel_duration_sec,
            wheel_sensitivity: c.wheel_sensitivity,
            touch_sensitivity: c.touch_sensitivity,
            drag_smoothing: c.drag_smoothing,
            drift_smoothing: c.drift_smoothing,
            mask_band: c.mask_band,
            typing_duration_ms: r.typing_duration_ms,
            min_char_delay_ms: r.min_char_delay_ms,
            restart_delay_ms: r.restart_delay_ms,
            scramble_dissolve_frames: r.dissolve_frames,
            scramble_resolve_frames: r.resolve_frames,
            frame_ms: DEFAULT_FRAME_MS,
        }
    }
}

impl Tunables {
    pub fn carousel_config(&self, mode: InputMode) -> CarouselConfig {
        CarouselConfig {
            width: self.card_width,
            height: self.card_height,
            spacing: self.spacing,
            repel_distance: self.repel_distance,
            repel_duration_sec: self.repel_duration_sec,
            wheel_sensitivity: self.wheel_sensitivity,
            touch_sensitivity: self.touch_sensitivity,
            drag_smoothing: self.drag_smoothing,
            drift_smoothing: self.drift_smoothing,
            mask_band: self.mask_band,
            mode,
            ..CarouselConfig::default()
        }
    }

    pub fn reveal_config(&self) -> RevealConfig {
        RevealConfig {
            typing_duration_ms: self.typing_duration_ms,
            min_char_delay_ms: self.min_char_delay_ms,
            restart_delay_ms: self.restart_delay_ms,
            dissolve_frames: self.scramble_dissolve_frames,
            resolve_frames: self.scramble_resolve_frames,
            frame_ms: self.frame_ms,
            ..RevealConfig::default()
        }
    }
}

/// One `key = number` line of the config file.
struct TunableField {
    key: &'static str,
    min: f64,
    max: f64,
    get: fn(&Tunables) -> f64,
    set: fn(&mut Tunables, f64),
}

static TUNABLE_FIELDS: &[TunableField] = &[
    TunableField {
        key: "spacing",
        min: 1.0,
        max: 1000.0,
        get: |t| t.spacing,
        set: |t, v| t.spacing = v,
    },
    TunableField {
        key: "card_width",
        min: 10.0,
        max: 4000.0,
        get: |t| t.card_width,
        set: |t, v| t.card_width = v,
    },
    TunableField {
        key: "card_height",
        min: 10.0,
        max: 4000.0,
        get: |t| t.card_height,
        set: |t, v| t.card_height = v,
    },
    TunableField {
        key: "repel_distance",
        min: 0.0,
        max: 1000.0,
        get: |t| t.repel_distance,
        set: |t, v| t.repel_distance = v,
    },
    TunableField {
        key: "repel_duration_sec",
        min: 0.0,
        max: 5.0,
        get: |t| t.repel_duration_sec,
        set: |t, v| t.repel_duration_sec = v,
    },
    TunableField {
        key: "wheel_sensitivity",
        min: 0.0001,
        max: 1.0,
        get: |t| t.wheel_sensitivity,
        set: |t, v| t.wheel_sensitivity = v,
    },
    TunableField {
        key: "touch_sensitivity",
        min: 0.0001,
        max: 1.0,
        get: |t| t.touch_sensitivity,
        set: |t, v| t.touch_sensitivity = v,
    },
    TunableField {
        key: "drag_smoothing",
        min: 0.01,
        max: 1.0,
        get: |t| t.drag_smoothing,
        set: |t, v| t.drag_smoothing = v,
    },
    TunableField {
        key: "drift_smoothing",
        min: 0.01,
        max: 1.0,
        get: |t| t.drift_smoothing,
        set: |t, v| t.drift_smoothing = v,
    },
    TunableField {
        key: "mask_band",
        min: 0.0,
        max: 0.5,
        get: |t| t.mask_band,
        set: |t, v| t.mask_band = v,
    },
    TunableField {
        key: "typing_duration_ms",
        min: 1.0,
        max: 600_000.0,
        get: |t| t.typing_duration_ms,
        set: |t, v| t.typing_duration_ms = v,
    },
    TunableField {
        key: "min_char_delay_ms",
        min: 1.0,
        max: 10_000.0,
        get: |t| t.min_char_delay_ms,
        set: |t, v| t.min_char_delay_ms = v,
    },
    TunableField {
        key: "restart_delay_ms",
        min: 100.0,
        max: 3_600_000.0,
        get: |t| t.restart_delay_ms,
        set: |t, v| t.restart_delay_ms = v,
    },
    TunableField {
        key: "scramble_dissolve_frames",
        min: 1.0,
        max: 600.0,
        get: |t| f64::from(t.scramble_dissolve_frames),
        set: |t, v| t.scramble_dissolve_frames = v.round() as u32,
    },
    TunableField {
        key: "scramble_resolve_frames",
        min: 1.0,
        max: 600.0,
        get: |t| f64::from(t.scramble_resolve_frames),
        set: |t, v| t.scramble_resolve_frames = v.round() as u32,
    },
    TunableField {
        key: "frame_ms",
        min: 1.0,
        max: 1000.0,
        get: |t| t.frame_ms,
        set: |t, v| t.frame_ms = v,
    },
];

// ───────────────────────────────────────── config ────────────

/// Application configuration: keybindings and motion tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    pub tunables: Tunables,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            tunables: Tunables::default(),
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        use KeyCode::*;
        let n = KeyModifiers::NONE;
        let mut m = HashMap::new();

        m.insert(NextCard, vec![KeyBind::new(Right, n), KeyBind::new(Char('l'), n)]);
        m.insert(PrevCard, vec![KeyBind::new(Left, n), KeyBind::new(Char('h'), n)]);
        m.insert(OpenCard, vec![KeyBind::new(Enter, n)]);
        m.insert(ToggleTouch, vec![KeyBind::new(Char('t'), n)]);
        m.insert(RestartText, vec![KeyBind::new(Char('r'), n)]);
        m.insert(ReloadCards, vec![KeyBind::new(Char('c'), n)]);
        m.insert(Help, vec![KeyBind::new(Char('?'), n)]);
        m.insert(Quit, vec![KeyBind::new(Char('q'), n)]);

        m
    }

    /// Find the action that matches a key event.  When several bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<(Action, u32)> = None;
        for (&action, binds) in &self.bindings {
            for bind in binds.iter().filter(|b| b.matches(event)) {
                let mc = bind.modifiers.bits().count_ones();
                if best.map_or(true, |(_, b)| mc > b) {
                    best = Some((action, mc));
                }
            }
        }
        best.map(|(a, _)| a)
    }

    /// Add a binding for `action`, taking the key away from any other action.
    pub fn add_binding(&mut self, action: Action, bind: KeyBind) {
        for binds in self.bindings.values_mut() {
            binds.retain(|b| b != &bind);
        }
        self.bindings.entry(action).or_default().push(bind);
    }

    pub fn reset_defaults(&mut self) {
        self.bindings = Self::default_bindings();
    }

    /// Format the binding list for a given action (e.g. `"→/l"`).
    pub fn display_bindings(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => {
                binds.iter().map(KeyBind::display).collect::<Vec<_>>().join("/")
            }
            _ => "unbound".into(),
        }
    }

    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action).and_then(|b| b.first()) {
            Some(bind) => bind.display(),
            None => "?".into(),
        }
    }

    /// Build the status-bar hint string from current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: browse | wheel/drag: scroll | {}: open | {}: touch | {}: help",
            self.short_binding(Action::PrevCard),
            self.short_binding(Action::NextCard),
            self.short_binding(Action::OpenCard),
            self.short_binding(Action::ToggleTouch),
            self.short_binding(Action::Help),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.  Problems are logged
    /// and otherwise ignored.
    pub fn load() -> Self {
        let path = config_path();
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "could not read config, using defaults");
                return Self::default();
            }
        };
        let (config, errors) = Self::parse_config(&contents);
        for err in &errors {
            tracing::warn!(path = %path.display(), "{err}");
        }
        config
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.serialise())?;
        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Parse the config text.  Always yields a usable config; everything
    /// that had to be skipped or clamped comes back as an error.
    pub fn parse_config(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Self::default();
        let mut errors = Vec::new();

        for (idx, line) in s.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError::MissingEquals { line: line_no });
                continue;
            };
            let key = key.trim();
            let value = value.trim().trim_matches('"');

            if let Some(field) = TUNABLE_FIELDS.iter().find(|f| f.key == key) {
                match value.parse::<f64>() {
                    Ok(v) if v.is_finite() => {
                        let clamped = v.clamp(field.min, field.max);
                        if clamped != v {
                            errors.push(ConfigError::Clamped {
                                line: line_no,
                                key: key.into(),
                                value: v,
                                clamped,
                            });
                        }
                        (field.set)(&mut config.tunables, clamped);
                    }
                    _ => errors.push(ConfigError::NotANumber {
                        line: line_no,
                        key: key.into(),
                        value: value.into(),
                    }),
                }
                continue;
            }

            let Some(action) = Action::from_config_key(key) else {
                errors.push(ConfigError::UnknownKey {
                    line: line_no,
                    key: key.into(),
                });
                continue;
            };

            let parsed: Vec<KeyBind> = value
                .split(',')
                .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                .collect();
            if parsed.is_empty() {
                errors.push(ConfigError::BadBinding {
                    line: line_no,
                    key: key.into(),
                    value: value.into(),
                });
            } else {
                config.bindings.insert(action, parsed);
            }
        }

        (config, errors)
    }

    fn serialise(&self) -> String {
        let mut lines = vec![
            "# card-reel configuration".to_string(),
            String::new(),
            "# Motion".to_string(),
        ];
        for field in TUNABLE_FIELDS {
            lines.push(format!("{} = {}", field.key, (field.get)(&self.tunables)));
        }
        lines.extend([
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            String::new(),
        ]);

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(KeyBind::to_config_string).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/card-reel/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("card-reel").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn empty_file_gives_defaults() {
        let (config, errors) = AppConfig::parse_config("");
        assert!(errors.is_empty());
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.tunables.spacing, 50.0);
        assert_eq!(config.tunables.restart_delay_ms, 60_000.0);
    }

    #[test]
    fn tunables_and_bindings_override_defaults() {
        let text = "\
# comment
[motion]
spacing = 64
mask_band = 0
scramble_dissolve_frames = 10
next_card = Down, Ctrl+n
";
        let (config, errors) = AppConfig::parse_config(text);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(config.tunables.spacing, 64.0);
        assert_eq!(config.tunables.mask_band, 0.0);
        assert_eq!(config.tunables.scramble_dissolve_frames, 10);
        assert_eq!(
            config.bindings[&Action::NextCard],
            vec![
                KeyBind::new(KeyCode::Down, KeyModifiers::NONE),
                KeyBind::new(KeyCode::Char('n'), KeyModifiers::CONTROL),
            ]
        );
        let carousel = config.tunables.carousel_config(InputMode::Touch);
        assert_eq!(carousel.spacing, 64.0);
        assert_eq!(carousel.mode, InputMode::Touch);
        assert_eq!(config.tunables.reveal_config().dissolve_frames, 10);
    }

    #[test]
    fn bad_lines_are_reported_and_skipped() {
        let text = "\
spacing = wide
nonsense line
colour = blue
quit = Hyper+q
mask_band = 0.9
";
        let (config, errors) = AppConfig::parse_config(text);
        assert_eq!(config.tunables.spacing, 50.0);
        assert_eq!(config.tunables.mask_band, 0.5);
        assert_eq!(config.bindings[&Action::Quit], AppConfig::default_bindings()[&Action::Quit]);
        assert!(matches!(errors[0], ConfigError::NotANumber { line: 1, .. }));
        assert_eq!(errors[1], ConfigError::MissingEquals { line: 2 });
        assert!(matches!(errors[2], ConfigError::UnknownKey { line: 3, .. }));
        assert!(matches!(errors[3], ConfigError::BadBinding { line: 4, .. }));
        assert!(matches!(errors[4], ConfigError::Clamped { line: 5, clamped, .. } if clamped == 0.5));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let (config, errors) = AppConfig::parse_config("frame_ms = NaN\nspacing = inf");
        assert_eq!(config.tunables.frame_ms, DEFAULT_FRAME_MS);
        assert_eq!(config.tunables.spacing, 50.0);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn serialised_config_parses_back() {
        let mut config = AppConfig::default();
        config.tunables.drift_smoothing = 0.2;
        config.add_binding(Action::Help, KeyBind::new(KeyCode::F(1), KeyModifiers::NONE));
        let (parsed, errors) = AppConfig::parse_config(&config.serialise());
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(parsed, config);
    }

    #[test]
    fn add_binding_steals_key_from_other_action() {
        let mut config = AppConfig::default();
        config.add_binding(Action::Quit, KeyBind::new(KeyCode::Char('l'), KeyModifiers::NONE));
        assert_eq!(
            config.match_key(key(KeyCode::Char('l'), KeyModifiers::NONE)),
            Some(Action::Quit)
        );
        assert_eq!(config.display_bindings(Action::NextCard), "→");
        config.reset_defaults();
        assert_eq!(config.display_bindings(Action::NextCard), "→/l");
    }

    #[test]
    fn most_specific_binding_wins() {
        let mut config = AppConfig::default();
        config.add_binding(Action::RestartText, KeyBind::new(KeyCode::Right, KeyModifiers::ALT));
        assert_eq!(
            config.match_key(key(KeyCode::Right, KeyModifiers::ALT)),
            Some(Action::RestartText)
        );
        assert_eq!(
            config.match_key(key(KeyCode::Right, KeyModifiers::NONE)),
            Some(Action::NextCard)
        );
        assert_eq!(config.match_key(key(KeyCode::Char('z'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn key_strings_parse() {
        assert_eq!(
            KeyBind::parse("Ctrl+Shift+F5"),
            Some(KeyBind::new(
                KeyCode::F(5),
                KeyModifiers::CONTROL | KeyModifiers::SHIFT
            ))
        );
        assert_eq!(
            KeyBind::parse("space"),
            Some(KeyBind::new(KeyCode::Char(' '), KeyModifiers::NONE))
        );
        assert_eq!(
            KeyBind::parse("Q"),
            Some(KeyBind::new(KeyCode::Char('Q'), KeyModifiers::NONE))
        );
        assert_eq!(KeyBind::parse("Meta+x"), None);
        assert_eq!(KeyBind::parse("nope"), None);
    }
}
