// Window geometry record - no Tauri imports.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ShellConfig;

const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

/// Last known position and size of the main window, in logical pixels.
///
/// Each field falls back to its own default when missing from the stored
/// record, so a partially written record still restores what it can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl WindowBounds {
    /// Reads bounds out of a raw stored value. Anything that is not an
    /// object of the right shape gives the defaults.
    pub fn from_stored(value: Option<Value>) -> Self {
        match value {
            Some(v @ Value::Object(_)) => serde_json::from_value(v).unwrap_or_else(|e| {
                log::warn!("[Window] Stored bounds are malformed ({}), using defaults", e);
                Self::default()
            }),
            Some(Value::Null) | None => Self::default(),
            Some(other) => {
                log::warn!("[Window] Stored bounds are not an object: {}", other);
                Self::default()
            }
        }
    }

    /// Raises the size to the configured minimum floor.
    pub fn clamped(self, config: &ShellConfig) -> Self {
        Self {
            width: self.width.max(config.min_width),
            height: self.height.max(config.min_height),
            ..self
        }
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}
