//! Refinement engine: turns the difference between two parameter
//! snapshots into a bounded edit instruction for a second image pass.
//!
//! ```text
//! (p_0, p_1) ──compute_delta──▶ Delta (shared axes only, p_0 order)
//!     │ |Δ| ≥ epsilon, axis in dimensions[type], template for direction
//!     ▼
//! phrases ──take(max_phrases_per_refinement)──▶ assemble_refinement ──▶ prompt
//! ```
//!
//! The cap keeps the first phrases in delta order; it does not rank by
//! magnitude.

use indexmap::IndexMap;
use serde::Serialize;

use crate::library::{RefinementConfig, StyleLibrary, DECREASE, INCREASE, PHRASE_PLACEHOLDER};
use crate::resolver::{lookup_style, ParameterSet, ValidationError};

/// Slack on the epsilon comparison so a slider move of exactly epsilon
/// counts regardless of float rounding (0.35 - 0.30 < 0.05 in f64).
const EPSILON_TOLERANCE: f64 = 1e-9;

/// Axis → `p_1 - p_0`, for axes present in both snapshots.
pub type Delta = IndexMap<String, f64>;

/// Output of a refinement pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Refinement {
    pub delta: Delta,
    /// Phrases that made it into the prompt, after the cap.
    pub phrases: Vec<String>,
    pub prompt: String,
}

/// Compute the refinement for the named style and refinement type.
pub fn refine(
    library: &StyleLibrary,
    style_name: &str,
    p0: &ParameterSet,
    p1: &ParameterSet,
    refinement_type: &str,
) -> Result<Refinement, ValidationError> {
    lookup_style(library, style_name)?;
    let config = &library.refinement;
    if !config.dimensions.contains_key(refinement_type) {
        return Err(ValidationError::new(format!(
            "unknown refinement_type '{}'",
            refinement_type
        )));
    }

    let delta = compute_delta(p0, p1);
    let phrases = select_phrases(config, refinement_type, &delta);
    let prompt = assemble_refinement(config, &phrases);
    log::debug!(
        "Refinement '{}' for style '{}': {} shared axes, {} phrases",
        refinement_type,
        style_name,
        delta.len(),
        phrases.len()
    );

    Ok(Refinement {
        delta,
        phrases,
        prompt,
    })
}

/// Signed change for every axis present in both snapshots, in `p0` order.
/// Axes present in only one snapshot are left out.
pub fn compute_delta(p0: &ParameterSet, p1: &ParameterSet) -> Delta {
    p0.iter()
        .filter_map(|(axis, before)| p1.get(axis).map(|after| (axis.to_string(), after - before)))
        .collect()
}

/// Directional phrases for the significant changes in `delta`, capped at
/// `max_phrases_per_refinement`.
pub fn select_phrases(config: &RefinementConfig, refinement_type: &str, delta: &Delta) -> Vec<String> {
    let Some(group) = config.dimensions.get(refinement_type) else {
        return Vec::new();
    };

    delta
        .iter()
        .filter(|(_, change)| change.abs() + EPSILON_TOLERANCE >= config.epsilon)
        .filter_map(|(axis, change)| {
            let direction = if *change > 0.0 { INCREASE } else { DECREASE };
            group.get(axis)?.get(direction).cloned()
        })
        .take(config.max_phrases_per_refinement)
        .collect()
}

/// Render the final refinement prompt. An empty phrase list yields the
/// configured keep-as-is fallback.
pub fn assemble_refinement(config: &RefinementConfig, phrases: &[String]) -> String {
    if phrases.is_empty() {
        return config.fallback.clone();
    }

    let assembly = &config.assembly;
    let mut blocks: Vec<String> = Vec::with_capacity(phrases.len() + 3);
    blocks.push(assembly.prefix.clone());
    blocks.extend(
        phrases
            .iter()
            .map(|phrase| assembly.format.replace(PHRASE_PLACEHOLDER, phrase)),
    );
    blocks.push(assembly.preserve.clone());
    blocks.push(assembly.suffix.clone());

    blocks
        .into_iter()
        .filter(|block| !block.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
