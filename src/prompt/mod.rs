//! Prompt assembler. Renders resolved phrases, the style signature, and the
//! scene into the text sent to the description and image services.
//!
//! # Layout
//!
//! ```text
//! Describe a photorealistic interior designed in the "japandi" style.
//! Style tags: serene, crafted, restrained
//! Design characteristics:
//! - warmth: <resolved phrase>
//! - density: <resolved phrase>
//! Signature materials: ash wood, rice paper
//! Signature forms: low platforms
//! Signature lighting: filtered daylight
//! Scene:
//! - Room type: living room
//! - Constraints: keep the fireplace; north-facing windows
//! <closing instruction>
//! ```

use serde::{Deserialize, Serialize};

use crate::library::{Style, StyleLibrary};
use crate::resolver::{lookup_style, ResolvedPhraseMap, ValidationError};

/// Placeholder rendered when the client gives no room type.
pub const UNSPECIFIED_ROOM: &str = "(not specified)";

const CLOSING_INSTRUCTION: &str = "Write a cohesive, vivid description of this interior that a designer could visualize. \
Do not mention numeric values, parameter names, sliders or scores.";

/// Optional scene context supplied with a generate request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(rename = "roomType", alias = "room_type", default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub constraints: Option<Vec<String>>,
}

impl Scene {
    /// Room type, or `None` when absent or blank.
    pub fn room_type(&self) -> Option<&str> {
        self.room_type
            .as_deref()
            .map(str::trim)
            .filter(|room| !room.is_empty())
    }

    /// Non-blank constraints, trimmed.
    pub fn constraints(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .flatten()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

/// Assemble the generation prompt for the named style.
pub fn assemble(
    library: &StyleLibrary,
    style_name: &str,
    resolved: &ResolvedPhraseMap,
    scene: Option<&Scene>,
) -> Result<String, ValidationError> {
    let style = lookup_style(library, style_name)?;
    Ok(assemble_style(style, resolved, scene))
}

/// Assemble the generation prompt for an already looked-up style.
pub fn assemble_style(style: &Style, resolved: &ResolvedPhraseMap, scene: Option<&Scene>) -> String {
    let mut lines = Vec::with_capacity(resolved.len() + 10);

    lines.push(format!(
        "Describe a photorealistic interior designed in the \"{}\" style.",
        style.name
    ));
    if !style.tags.is_empty() {
        lines.push(format!("Style tags: {}", style.tags.join(", ")));
    }

    lines.push("Design characteristics:".to_string());
    for (axis, phrase) in resolved {
        lines.push(format!("- {}: {}", axis, phrase));
    }

    let signature = &style.signature;
    lines.push(format!("Signature materials: {}", signature.materials.join(", ")));
    lines.push(format!("Signature forms: {}", signature.forms.join(", ")));
    lines.push(format!("Signature lighting: {}", signature.lighting.join(", ")));

    lines.push("Scene:".to_string());
    let room = scene.and_then(Scene::room_type).unwrap_or(UNSPECIFIED_ROOM);
    lines.push(format!("- Room type: {}", room));
    let constraints = scene.map(Scene::constraints).unwrap_or_default();
    if !constraints.is_empty() {
        lines.push(format!("- Constraints: {}", constraints.join("; ")));
    }

    lines.push(CLOSING_INSTRUCTION.to_string());
    lines.join("\n")
}
