use std::fs;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub text_dim: String,
    pub accent: String,
    pub border: String,
    pub header_bg: String,
    pub header_fg: String,
    pub timer_idle: String,
    pub timer_holding: String,
    pub timer_armed: String,
    pub timer_running: String,
    pub error: String,
    pub success: String,
}

impl Theme {
    /// User themes under the config dir shadow the bundled ones.
    pub fn load(name: &str) -> Option<Self> {
        if let Some(config_dir) = dirs::config_dir() {
            let user_theme_path = config_dir
                .join("cubedr")
                .join("themes")
                .join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_theme_path) {
                if let Ok(theme) = toml::from_str::<Theme>(&content) {
                    return Some(theme);
                }
            }
        }

        let filename = format!("{name}.toml");
        if let Some(file) = ThemeAssets::get(&filename) {
            if let Ok(content) = std::str::from_utf8(file.data.as_ref()) {
                if let Ok(theme) = toml::from_str::<Theme>(content) {
                    return Some(theme);
                }
            }
        }

        None
    }

    pub fn available_themes() -> Vec<String> {
        ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load("catppuccin-mocha").unwrap_or_else(|| Self {
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
            text_dim: "#585b70".to_string(),
            accent: "#89b4fa".to_string(),
            border: "#45475a".to_string(),
            header_bg: "#313244".to_string(),
            header_fg: "#cdd6f4".to_string(),
            timer_idle: "#9399b2".to_string(),
            timer_holding: "#f38ba8".to_string(),
            timer_armed: "#f9e2af".to_string(),
            timer_running: "#a6e3a1".to_string(),
            error: "#f38ba8".to_string(),
            success: "#a6e3a1".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Color::Rgb(r, g, b);
            }
        }
        Color::White
    }

    pub fn bg(&self) -> Color {
        Self::parse_color(&self.bg)
    }
    pub fn fg(&self) -> Color {
        Self::parse_color(&self.fg)
    }
    pub fn text_dim(&self) -> Color {
        Self::parse_color(&self.text_dim)
    }
    pub fn accent(&self) -> Color {
        Self::parse_color(&self.accent)
    }
    pub fn border(&self) -> Color {
        Self::parse_color(&self.border)
    }
    pub fn header_bg(&self) -> Color {
        Self::parse_color(&self.header_bg)
    }
    pub fn header_fg(&self) -> Color {
        Self::parse_color(&self.header_fg)
    }
    pub fn timer_idle(&self) -> Color {
        Self::parse_color(&self.timer_idle)
    }
    pub fn timer_holding(&self) -> Color {
        Self::parse_color(&self.timer_holding)
    }
    pub fn timer_armed(&self) -> Color {
        Self::parse_color(&self.timer_armed)
    }
    pub fn timer_running(&self) -> Color {
        Self::parse_color(&self.timer_running)
    }
    pub fn error(&self) -> Color {
        Self::parse_color(&self.error)
    }
    pub fn success(&self) -> Color {
        Self::parse_color(&self.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_color_handles_hex() {
        assert_eq!(ThemeColors::parse_color("#ff0000"), Color::Rgb(255, 0, 0));
        assert_eq!(ThemeColors::parse_color("00ff7f"), Color::Rgb(0, 255, 127));
    }

    #[test]
    fn parse_color_falls_back_on_garbage() {
        assert_eq!(ThemeColors::parse_color("#zzz"), Color::White);
    }

    #[test]
    fn bundled_themes_parse() {
        for name in Theme::available_themes() {
            assert!(Theme::load(&name).is_some(), "theme {name} failed to load");
        }
    }
}
