use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Formats as a CSS `rgb()` value, the form the display client paints swatches with
    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// A named color from the catalog. The `rgb` field is the answer key for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ColorPrompt {
    pub name: String,
    pub description: String,
    pub rgb: Rgb,
}

/// What players are shown for the active round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PromptView {
    pub name: String,
    pub description: String,
}

impl From<&ColorPrompt> for PromptView {
    fn from(prompt: &ColorPrompt) -> Self {
        PromptView {
            name: prompt.name.clone(),
            description: prompt.description.clone(),
        }
    }
}
