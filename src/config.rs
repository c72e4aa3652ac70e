//! Configuration and color scheme management for linsim.
//!
//! The configuration file lives at `~/.linsim/config.toml`:
//!
//! ```toml
//! # Directory the session starts in (default: home)
//! start_dir = "~/projects"
//!
//! # Color scheme: classic, amber, solarized-dark, mono
//! color_scheme = "amber"
//!
//! [prompt]
//! suffix = "$ "
//! ```
//!
//! Missing keys take their defaults; a file that does not parse is ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial working directory; `~` expands to home
    pub start_dir: Option<String>,
    /// Color scheme name
    pub color_scheme: String,
    pub prompt: PromptConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_dir: None,
            color_scheme: "classic".to_string(),
            prompt: PromptConfig::default(),
        }
    }
}

/// Prompt settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Text drawn after the working directory
    pub suffix: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            suffix: "$ ".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `~/.linsim/config.toml`
    pub fn load() -> Self {
        match config_dir() {
            Some(dir) => Self::load_from(&dir.join("config.toml")),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Starting directory with `~` expanded
    pub fn start_dir(&self) -> Option<PathBuf> {
        let raw = self.start_dir.as_deref()?;
        match raw.strip_prefix('~') {
            Some(rest) => {
                let home = dirs::home_dir()?;
                Some(home.join(rest.trim_start_matches('/')))
            }
            None => Some(PathBuf::from(raw)),
        }
    }

    /// Get the color scheme
    pub fn get_color_scheme(&self) -> ColorScheme {
        ColorScheme::by_name(&self.color_scheme)
    }
}

/// `~/.linsim`, created on first use
pub fn config_dir() -> Option<PathBuf> {
    let dir = dirs::home_dir()?.join(".linsim");
    if !dir.exists() {
        let _ = fs::create_dir_all(&dir);
    }
    Some(dir)
}

/// Color definition (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Convert to crossterm Color
    pub fn to_crossterm(&self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Colors for the two text styles and the surface behind them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub name: String,
    pub background: Color,
    /// Prompt, input and plain output
    pub primary: Color,
    /// Directory names
    pub highlight: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::classic()
    }
}

impl ColorScheme {
    /// Green on near-black
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            background: Color::new(11, 15, 16),
            primary: Color::new(0, 255, 0),
            highlight: Color::new(85, 255, 255),
        }
    }

    pub fn amber() -> Self {
        Self {
            name: "amber".to_string(),
            background: Color::new(20, 12, 0),
            primary: Color::new(255, 176, 0),
            highlight: Color::new(255, 224, 130),
        }
    }

    /// Solarized Dark scheme
    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            background: Color::new(0, 43, 54),
            primary: Color::new(147, 161, 161),
            highlight: Color::new(38, 139, 210),
        }
    }

    pub fn mono() -> Self {
        Self {
            name: "mono".to_string(),
            background: Color::new(0, 0, 0),
            primary: Color::new(200, 200, 200),
            highlight: Color::new(255, 255, 255),
        }
    }

    /// Get scheme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "amber" => Self::amber(),
            "solarized-dark" | "solarized_dark" | "solarized" => Self::solarized_dark(),
            "mono" | "monochrome" => Self::mono(),
            _ => Self::classic(),
        }
    }

    /// List available schemes
    pub fn list() -> Vec<&'static str> {
        vec!["classic", "amber", "solarized-dark", "mono"]
    }
}
