use std::fs;
use std::path::PathBuf;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

const DEFAULT_THEME: &str = "catppuccin-mocha";

/// A named palette. A file under `<config dir>/kotoba/themes/` shadows the
/// bundled theme of the same name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

/// Colors as written in theme files: `#rrggbb` or a terminal color name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    /// Right answers in quiz feedback and the results table.
    pub text_correct: String,
    /// Wrong answers in quiz feedback and the results table.
    pub text_incorrect: String,
    /// Hints, placeholders and secondary columns.
    pub text_dim: String,
    /// The kanji, kana or translation being asked.
    pub prompt: String,
    pub accent: String,
    pub border: String,
    pub border_focused: String,
    pub header_bg: String,
    pub header_fg: String,
    pub bar_filled: String,
    pub bar_empty: String,
    /// Cursor row in the word table and list checkboxes.
    pub selection_bg: String,
    pub error: String,
    /// Status line and quiz notices.
    pub warning: String,
    pub success: String,
}

impl Theme {
    pub fn load(name: &str) -> Option<Self> {
        user_theme(name).or_else(|| bundled_theme(name))
    }

    /// Names of the bundled themes, sorted.
    pub fn available_themes() -> Vec<String> {
        let mut names: Vec<String> = ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(str::to_string))
            .collect();
        names.sort();
        names
    }
}

fn user_theme_path(name: &str) -> Option<PathBuf> {
    let dir = dirs::config_dir()?.join("kotoba").join("themes");
    Some(dir.join(format!("{name}.toml")))
}

fn user_theme(name: &str) -> Option<Theme> {
    let path = user_theme_path(name)?;
    let content = fs::read_to_string(&path).ok()?;
    match toml::from_str(&content) {
        Ok(theme) => Some(theme),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable theme file");
            None
        }
    }
}

fn bundled_theme(name: &str) -> Option<Theme> {
    let file = ThemeAssets::get(&format!("{name}.toml"))?;
    let content = std::str::from_utf8(file.data.as_ref()).ok()?;
    toml::from_str(content).ok()
}

impl Default for Theme {
    fn default() -> Self {
        Self::load(DEFAULT_THEME).unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#1e1e2e".to_string(),
            fg: "#cdd6f4".to_string(),
            text_correct: "#a6e3a1".to_string(),
            text_incorrect: "#f38ba8".to_string(),
            text_dim: "#6c7086".to_string(),
            prompt: "#f9e2af".to_string(),
            accent: "#89b4fa".to_string(),
            border: "#45475a".to_string(),
            border_focused: "#89b4fa".to_string(),
            header_bg: "#313244".to_string(),
            header_fg: "#cdd6f4".to_string(),
            bar_filled: "#89b4fa".to_string(),
            bar_empty: "#313244".to_string(),
            selection_bg: "#45475a".to_string(),
            error: "#f38ba8".to_string(),
            warning: "#f9e2af".to_string(),
            success: "#a6e3a1".to_string(),
        }
    }
}

impl ThemeColors {
    /// Unknown values fall back to white.
    pub fn parse_color(value: &str) -> Color {
        value.trim().parse().unwrap_or(Color::White)
    }
}

macro_rules! color_accessors {
    ($($role:ident),* $(,)?) => {
        impl ThemeColors {
            $(
                pub fn $role(&self) -> Color {
                    Self::parse_color(&self.$role)
                }
            )*
        }
    };
}

color_accessors!(
    bg,
    fg,
    text_correct,
    text_incorrect,
    text_dim,
    prompt,
    accent,
    border,
    border_focused,
    header_bg,
    header_fg,
    bar_filled,
    bar_empty,
    selection_bg,
    error,
    warning,
    success,
);
