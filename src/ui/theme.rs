use std::fmt;
use tracing::warn;

use super::storage::Storage;

pub const THEME_KEY: &str = "theme";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn icon_class(&self) -> &'static str {
        match self {
            Theme::Dark => "fas fa-moon theme-toggle-icon",
            Theme::Light => "fas fa-sun theme-toggle-icon",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ThemeController {
    storage: Box<dyn Storage>,
    theme: Theme,
}

impl ThemeController {
    /// Reads the stored preference; anything other than `dark` means light.
    pub fn load(storage: Box<dyn Storage>) -> Self {
        let theme = storage
            .get(THEME_KEY)
            .and_then(|v| Theme::parse(&v))
            .unwrap_or_default();
        Self { storage, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(e) = self.storage.set(THEME_KEY, self.theme.as_str()) {
            warn!("[ai-or-human] Failed to persist theme: {:#}", e);
        }
        self.theme
    }
}
