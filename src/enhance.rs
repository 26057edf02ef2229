//! Template-based prompt enhancement.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    Cyberpunk,
    Anime,
    Realistic,
    Lowpoly,
    Fantasy,
    Scifi,
}

impl PromptStyle {
    pub const ALL: [PromptStyle; 6] = [
        PromptStyle::Cyberpunk,
        PromptStyle::Anime,
        PromptStyle::Realistic,
        PromptStyle::Lowpoly,
        PromptStyle::Fantasy,
        PromptStyle::Scifi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromptStyle::Cyberpunk => "cyberpunk",
            PromptStyle::Anime => "anime",
            PromptStyle::Realistic => "realistic",
            PromptStyle::Lowpoly => "lowpoly",
            PromptStyle::Fantasy => "fantasy",
            PromptStyle::Scifi => "scifi",
        }
    }

    /// Descriptive terms appended for this style.
    pub fn terms(self) -> &'static str {
        match self {
            PromptStyle::Cyberpunk => "neon-lit, holographic, futuristic, high-tech, glowing circuits, chrome details, dark atmosphere, urban dystopia",
            PromptStyle::Anime => "anime style, vibrant colors, detailed linework, expressive, manga-inspired, cel-shaded, dramatic lighting",
            PromptStyle::Realistic => "photorealistic, highly detailed, ultra HD, physically accurate, professional lighting, natural materials, lifelike textures",
            PromptStyle::Lowpoly => "low poly, geometric, minimalist, faceted, clean edges, flat shading, stylized, simple polygons",
            PromptStyle::Fantasy => "magical, enchanted, mystical, ornate details, ethereal glow, ancient runes, medieval inspired, fantastical",
            PromptStyle::Scifi => "sci-fi, advanced technology, space-age, metallic, sleek design, energy effects, futuristic architecture",
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expand a short prompt into a detailed one in the given style.
pub fn enhance_prompt(simple: &str, style: PromptStyle) -> String {
    format!(
        "A {}, {}, high quality 3D model, detailed, well-lit, professional render",
        simple.trim(),
        style.terms()
    )
}
