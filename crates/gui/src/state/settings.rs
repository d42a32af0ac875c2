//! Application settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How faces are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// Per-vertex colors from the element type (quad blue, triangle red)
    #[default]
    ElementType,
    /// One uniform color for every face
    Uniform,
}

impl FillMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            FillMode::ElementType => "By element type",
            FillMode::Uniform => "Uniform",
        }
    }

    pub fn all() -> &'static [FillMode] {
        &[FillMode::ElementType, FillMode::Uniform]
    }
}

/// Viewport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    /// Background color RGB
    pub background_color: [u8; 3],
    /// Face color in uniform fill mode (RGBA, 0..1)
    pub triangle_color: [f32; 4],
    /// Edge overlay color (RGBA, 0..1)
    pub edge_color: [f32; 4],
    /// Picked face color RGB
    pub highlight_color: [u8; 3],
    pub fill_mode: FillMode,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            background_color: [26, 26, 31],
            triangle_color: [0.45, 0.8, 0.85, 1.0],
            edge_color: [0.15, 0.45, 0.5, 1.0],
            highlight_color: [255, 200, 0],
            fill_mode: FillMode::ElementType,
        }
    }
}

/// Overlay toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySettings {
    /// Draw the wireframe overlay
    pub show_edges: bool,
    /// Draw node ids next to their nodes
    pub show_node_labels: bool,
    /// Label font size in points
    pub label_font_size: f32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            show_edges: true,
            show_node_labels: false,
            label_font_size: 11.0,
        }
    }
}

/// Mouse input settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    /// Scroll distance (points) that counts as one zoom step
    pub scroll_points_per_step: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            scroll_points_per_step: 50.0,
        }
    }
}

/// All application settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    /// Viewport settings
    pub viewport: ViewportSettings,
    /// Overlay settings
    #[serde(default)]
    pub overlays: OverlaySettings,
    /// Input settings
    #[serde(default)]
    pub input: InputSettings,
}

impl AppSettings {
    /// Location of the settings file, if the platform has a config directory
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "qmvision", "qmvision")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`; a missing or unreadable file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        let Ok(json) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&json) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring malformed settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            tracing::warn!("Failed to save settings to {}: {e}", path.display());
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
