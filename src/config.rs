/// External configuration loader.
///
/// Reads `config.toml` from an explicit path, or searches the executable's
/// directory, the CWD and `~/.local/share/escapeword`.
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::powerup::{ExpiryPolicy, ExtraTimeMode};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub rooms_dir: PathBuf,
    pub save_dir: Option<PathBuf>,
    pub sound_enabled: bool,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_ms: u64,
    pub expiry_check_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RulesConfig {
    pub expiry_policy: ExpiryPolicy,
    pub extra_time_mode: ExtraTimeMode,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    sound: TomlSound,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
    #[serde(default = "default_expiry_check_ms")]
    expiry_check_ms: u64,
}

#[derive(Deserialize, Debug, Default)]
struct TomlRules {
    #[serde(default)]
    expiry_policy: ExpiryPolicy,
    #[serde(default)]
    extra_time_mode: ExtraTimeMode,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_rooms_dir")]
    rooms_dir: String,
    #[serde(default)]
    save_dir: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_true")]
    enabled: bool,
}

// ── Defaults ──

fn default_tick_ms() -> u64 { 1000 }
fn default_expiry_check_ms() -> u64 { 1000 }
fn default_rooms_dir() -> String { "rooms".into() }
fn default_true() -> bool { true }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_ms: default_tick_ms(),
            expiry_check_ms: default_expiry_check_ms(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            rooms_dir: default_rooms_dir(),
            save_dir: None,
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound { enabled: true }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config. An explicit path is used as-is; otherwise search
    /// (1) exe directory, (2) current working directory, (3) XDG data home.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => search_toml(&search_dirs),
        };
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly, without touching the filesystem.
    #[cfg(test)]
    pub fn parse(text: &str) -> Self {
        let cfg = parse_toml(text, Path::new("<inline>")).unwrap_or_default();
        GameConfig::from_toml(cfg, &[])
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve rooms directory against the search dirs
        let rooms_dir_str = &toml_cfg.general.rooms_dir;
        let rooms_dir = if PathBuf::from(rooms_dir_str).is_absolute() {
            PathBuf::from(rooms_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(rooms_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(rooms_dir_str))
        };

        GameConfig {
            timing: TimingConfig {
                tick_ms: toml_cfg.timing.tick_ms.max(1),
                expiry_check_ms: toml_cfg.timing.expiry_check_ms.max(1),
            },
            rules: RulesConfig {
                expiry_policy: toml_cfg.rules.expiry_policy,
                extra_time_mode: toml_cfg.rules.extra_time_mode,
            },
            rooms_dir,
            save_dir: toml_cfg.general.save_dir.map(PathBuf::from),
            sound_enabled: toml_cfg.sound.enabled,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/escapeword");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn search_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            if let Some(cfg) = read_toml(&path) {
                return cfg;
            }
            return TomlConfig::default();
        }
    }
    TomlConfig::default()
}

fn read_toml(path: &Path) -> Option<TomlConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_toml(&text, path),
        Err(e) => {
            log::warn!("could not read {}: {e}", path.display());
            None
        }
    }
}

fn parse_toml(text: &str, path: &Path) -> Option<TomlConfig> {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("{} parse error: {e}; using default settings", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::parse("");
        assert_eq!(cfg.timing.tick_ms, 1000);
        assert_eq!(cfg.timing.expiry_check_ms, 1000);
        assert_eq!(cfg.rules, RulesConfig::default());
        assert_eq!(cfg.rules.expiry_policy, ExpiryPolicy::NextCheck);
        assert_eq!(cfg.rules.extra_time_mode, ExtraTimeMode::Pause);
        assert_eq!(cfg.rooms_dir, PathBuf::from("rooms"));
        assert!(cfg.save_dir.is_none());
        assert!(cfg.sound_enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            r#"
            [rules]
            expiry_policy = "elapsed"

            [sound]
            enabled = false
            "#,
        );
        assert_eq!(cfg.rules.expiry_policy, ExpiryPolicy::Elapsed);
        assert_eq!(cfg.rules.extra_time_mode, ExtraTimeMode::Pause);
        assert_eq!(cfg.timing.tick_ms, 1000);
        assert!(!cfg.sound_enabled);
    }

    #[test]
    fn malformed_text_falls_back() {
        let cfg = GameConfig::parse("timing = [oops");
        assert_eq!(cfg.timing.tick_ms, 1000);
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[rules]\nextra_time_mode = \"add-seconds\"\n[general]\nsave_dir = \"/tmp/ew\"\n").unwrap();
        let cfg = GameConfig::load(Some(&path));
        assert_eq!(cfg.rules.extra_time_mode, ExtraTimeMode::AddSeconds);
        assert_eq!(cfg.save_dir, Some(PathBuf::from("/tmp/ew")));
    }
}
