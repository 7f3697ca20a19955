// Runtime settings, read from the environment

use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Holds `models/` and `texture/`.
    pub asset_root: PathBuf,
    /// Fly speed for WASD, in world units per second.
    pub move_speed: f32,
    /// Length of the zoom-to-object tween, in seconds.
    pub focus_seconds: f32,
    pub double_click_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            move_speed: 9.0,
            focus_seconds: 0.8,
            double_click_ms: 300,
        }
    }
}

impl Config {
    /// Defaults overridden by `ROOM_ASSET_ROOT`, `ROOM_MOVE_SPEED`,
    /// `ROOM_FOCUS_SECONDS` and `ROOM_DOUBLE_CLICK_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            asset_root: lookup("ROOM_ASSET_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_root),
            move_speed: parse_or(&lookup, "ROOM_MOVE_SPEED", defaults.move_speed),
            focus_seconds: parse_or(&lookup, "ROOM_FOCUS_SECONDS", defaults.focus_seconds),
            double_click_ms: parse_or(&lookup, "ROOM_DOUBLE_CLICK_MS", defaults.double_click_ms),
        }
    }

    pub fn asset_path(&self, relative: &str) -> PathBuf {
        self.asset_root.join(relative)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable {key}={raw:?}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_and_bad_values() {
        let config = Config::from_lookup(|key| match key {
            "ROOM_ASSET_ROOT" => Some("/srv/room".into()),
            "ROOM_MOVE_SPEED" => Some(" 4.5 ".into()),
            "ROOM_DOUBLE_CLICK_MS" => Some("fast".into()),
            _ => None,
        });
        assert_eq!(config.asset_root, PathBuf::from("/srv/room"));
        assert_eq!(config.move_speed, 4.5);
        assert_eq!(config.focus_seconds, 0.8);
        assert_eq!(config.double_click_ms, 300);
        assert_eq!(config.asset_path("models/tv.glb"), PathBuf::from("/srv/room/models/tv.glb"));
    }
}
