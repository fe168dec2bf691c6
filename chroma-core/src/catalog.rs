use anyhow::{Context, Result, anyhow};
use chroma_types::ColorPrompt;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("../data/colors.json");

/// The static list of color prompts rooms draw their rounds from
#[derive(Debug, Clone)]
pub struct ColorCatalog {
    prompts: Vec<ColorPrompt>,
}

impl ColorCatalog {
    pub fn new(prompts: Vec<ColorPrompt>) -> Result<Self> {
        let mut seen = HashSet::new();
        for prompt in &prompts {
            let name = prompt.name.trim();
            if name.is_empty() {
                return Err(anyhow!("Color prompt with an empty name"));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(anyhow!("Duplicate color prompt: {}", name));
            }
        }

        Ok(Self { prompts })
    }

    /// Parse a JSON array of `{ name, description, rgb: { r, g, b } }`
    pub fn from_json(json: &str) -> Result<Self> {
        let prompts: Vec<ColorPrompt> =
            serde_json::from_str(json).context("Failed to parse color catalog")?;
        Self::new(prompts)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read color catalog {}", path.display()))?;
        let catalog = Self::from_json(&json)
            .with_context(|| format!("Invalid color catalog {}", path.display()))?;

        debug!("Read {} colors from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// The catalog bundled with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn prompts(&self) -> &[ColorPrompt] {
        &self.prompts
    }

    /// Rooms draw one prompt per round without replacement, so a catalog
    /// smaller than the round count cannot host a game.
    pub fn ensure_supports(&self, rounds: u32) -> Result<()> {
        if self.prompts.len() < rounds as usize {
            return Err(anyhow!(
                "Color catalog has {} entries but a game needs {}",
                self.prompts.len(),
                rounds
            ));
        }
        Ok(())
    }

    /// Draw `count` distinct prompts in random order
    pub fn draw<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<ColorPrompt> {
        let mut drawn: Vec<ColorPrompt> = self
            .prompts
            .choose_multiple(rng, count)
            .cloned()
            .collect();
        drawn.shuffle(rng);
        drawn
    }
}
