use std::path::PathBuf;

use serde::Deserialize;

use crate::state::{DEFAULT_INTERVAL_SECS, TransitionKind, clamp_interval};

pub const TRANSITION_ENV: &str = "LANTERN_TRANSITION";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// Optional startup settings. Read once; never written back.
pub struct AppConfig {
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    /// Folder to load on startup.
    pub start_folder: Option<PathBuf>,
    pub interval_seconds: Option<u32>,
    pub transition: Option<TransitionKind>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("lantern").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Self {
        match toml::from_str(contents) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed config file");
                Self::default()
            }
        }
    }

    pub fn interval(&self) -> u32 {
        clamp_interval(self.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECS))
    }

    /// Transition from the environment, then the config file, then Fade.
    pub fn resolve_transition(&self) -> TransitionKind {
        if let Ok(raw) = std::env::var(TRANSITION_ENV) {
            if let Some(kind) = parse_transition(&raw) {
                return kind;
            }
        }
        self.transition.unwrap_or_default()
    }
}

pub fn parse_transition(value: &str) -> Option<TransitionKind> {
    match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
        "fade" => Some(TransitionKind::Fade),
        "slide_left" | "left" => Some(TransitionKind::SlideLeft),
        "slide_right" | "right" => Some(TransitionKind::SlideRight),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_transition_handles_supported_spellings() {
        assert_eq!(parse_transition("fade"), Some(TransitionKind::Fade));
        assert_eq!(parse_transition("Slide Left"), Some(TransitionKind::SlideLeft));
        assert_eq!(parse_transition("slide-right"), Some(TransitionKind::SlideRight));
        assert_eq!(parse_transition(" RIGHT "), Some(TransitionKind::SlideRight));
    }

    #[test]
    fn parse_transition_rejects_unknown_values() {
        assert_eq!(parse_transition("wipe"), None);
    }

    #[test]
    fn config_file_fields_are_optional() {
        let config = AppConfig::parse(
            r#"
            interval_seconds = 10
            transition = "slide_left"
            start_folder = "/photos"
            "#,
        );
        assert_eq!(config.interval(), 10);
        assert_eq!(config.transition, Some(TransitionKind::SlideLeft));
        assert_eq!(config.start_folder, Some(PathBuf::from("/photos")));
        assert_eq!(config.window_width, None);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let config = AppConfig::parse("interval_seconds = \"soon\"");
        assert_eq!(config.interval(), DEFAULT_INTERVAL_SECS);
        assert_eq!(config.transition, None);
    }

    #[test]
    fn interval_is_clamped() {
        let config = AppConfig {
            interval_seconds: Some(120),
            ..Default::default()
        };
        assert_eq!(config.interval(), 30);
    }
}
