//! Style library types — the document schema for axes, styles, and
//! refinement templates.
//!
//! A `StyleLibrary` is pure data: it describes *which* phrase belongs to
//! which (axis, bucket) pair and *how* each style bends that mapping. The
//! [`super::loader`] functions parse and validate a document into one, after
//! which it is never mutated.
//!
//! # Example YAML
//!
//! ```yaml
//! ranges:
//!   low: [0.0, 0.4]
//!   mid: [0.4, 0.7]
//!   high: [0.7, 1.0]
//! axes:
//!   warmth:
//!     low: "cool, crisp tones"
//!     mid: "balanced neutral warmth"
//!     high: "warm, sun-soaked tones"
//! styles:
//!   minimalist:
//!     tags: [calm, clean]
//!     signature:
//!       materials: [white oak]
//!       forms: [low profiles]
//!       lighting: [diffuse daylight]
//!     bias:
//!       density: -0.2
//! refinement:
//!   epsilon: 0.05
//!   max_phrases_per_refinement: 3
//!   dimensions:
//!     color:
//!       warmth:
//!         increase: "shift the palette warmer"
//!         decrease: "cool the palette down"
//!   assembly:
//!     prefix: "Edit the reference image."
//!     format: "- {PHRASE}"
//!     preserve: "Keep the layout."
//!     suffix: "Return one image."
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the bucket that is inclusive of its upper bound.
pub const HIGH_BUCKET: &str = "high";

/// Placeholder substituted by each refinement phrase in `AssemblyConfig::format`.
pub const PHRASE_PLACEHOLDER: &str = "{PHRASE}";

/// Direction key selected by a positive delta.
pub const INCREASE: &str = "increase";

/// Direction key selected by a zero or negative delta.
pub const DECREASE: &str = "decrease";

/// Instruction used when a refinement pass has nothing significant to change.
pub const DEFAULT_FALLBACK: &str =
    "Keep the reference image as-is. Make only minimal changes and preserve its composition, palette, and materials.";

// ============================================================================
// StyleLibrary
// ============================================================================

/// The complete style library, immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleLibrary {
    /// Bucket name → `[low, high]` bounds, in document order.
    pub ranges: IndexMap<String, Range>,
    /// Axis name → bucket name → base phrase.
    pub axes: IndexMap<String, IndexMap<String, String>>,
    /// Style name → style profile.
    pub styles: IndexMap<String, Style>,
    /// Templates for the refinement pass.
    #[serde(alias = "refinement_templates")]
    pub refinement: RefinementConfig,
}

impl StyleLibrary {
    /// Look up a style by name.
    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }

    /// Whether the library knows the axis.
    pub fn has_axis(&self, axis: &str) -> bool {
        self.axes.contains_key(axis)
    }

    /// Base phrase for an (axis, bucket) pair.
    pub fn base_text(&self, axis: &str, bucket: &str) -> Option<&str> {
        self.axes
            .get(axis)
            .and_then(|buckets| buckets.get(bucket))
            .map(String::as_str)
    }

    /// Style names in document order.
    pub fn style_names(&self) -> Vec<&str> {
        self.styles.keys().map(String::as_str).collect()
    }

    /// Axis names in document order.
    pub fn axis_names(&self) -> Vec<&str> {
        self.axes.keys().map(String::as_str).collect()
    }
}

/// Half-open `[low, high)` bucket bounds; the `high` bucket also admits its
/// upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Range {
    pub low: f64,
    pub high: f64,
}

impl Range {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Membership test. `inclusive_high` is set only for the `high` bucket.
    pub fn contains(&self, value: f64, inclusive_high: bool) -> bool {
        if inclusive_high {
            self.low <= value && value <= self.high
        } else {
            self.low <= value && value < self.high
        }
    }
}

impl From<[f64; 2]> for Range {
    fn from(bounds: [f64; 2]) -> Self {
        Self::new(bounds[0], bounds[1])
    }
}

impl From<Range> for [f64; 2] {
    fn from(range: Range) -> Self {
        [range.low, range.high]
    }
}

// ============================================================================
// Style
// ============================================================================

/// A named aesthetic profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    /// Filled from the map key at load time.
    #[serde(default)]
    pub name: String,
    /// Ordered descriptive tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Fixed materials/forms/lighting vocabulary.
    #[serde(default)]
    pub signature: Signature,
    /// Axis → bucket → replacement phrase. Sparse.
    #[serde(default)]
    pub overrides: IndexMap<String, IndexMap<String, String>>,
    /// Axis → offset added to raw values before bucketing.
    #[serde(default)]
    pub bias: IndexMap<String, f64>,
}

impl Style {
    /// Override phrase for an (axis, bucket) pair, if the style defines one.
    pub fn override_text(&self, axis: &str, bucket: &str) -> Option<&str> {
        self.overrides
            .get(axis)
            .and_then(|buckets| buckets.get(bucket))
            .map(String::as_str)
    }

    /// Bias for an axis, if any.
    pub fn bias_for(&self, axis: &str) -> Option<f64> {
        self.bias.get(axis).copied()
    }
}

/// Signature vocabulary rendered verbatim into every prompt for the style.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub forms: Vec<String>,
    #[serde(default)]
    pub lighting: Vec<String>,
}

// ============================================================================
// Refinement
// ============================================================================

/// Refinement type → axis → direction → phrase.
pub type Dimensions = IndexMap<String, IndexMap<String, IndexMap<String, String>>>;

/// Configuration for the delta-based refinement pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementConfig {
    /// Minimum |delta| that produces a phrase.
    pub epsilon: f64,
    /// Upper bound on phrases in one refinement prompt.
    #[serde(alias = "maxPhrasesPerRefinement")]
    pub max_phrases_per_refinement: usize,
    pub dimensions: Dimensions,
    pub assembly: AssemblyConfig,
    /// Instruction used when no phrase survives filtering.
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}

/// Blocks concatenated into a refinement prompt, in field order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    pub prefix: String,
    /// Per-phrase line; must contain `{PHRASE}`.
    pub format: String,
    pub preserve: String,
    pub suffix: String,
}
