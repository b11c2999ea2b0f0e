//! Parameter resolver — continuous slider values to style-aware phrases.
//!
//! For every axis in a [`ParameterSet`]:
//! 1. add the style's bias (if any) and clamp into [0, 1];
//! 2. bucketize against the library's ranges (`high` is closed at 1.0);
//! 3. take the style override for (axis, bucket) if defined, otherwise the
//!    axis base text.
//!
//! Validation happens before this point; see [`ParameterSet::from_json`]
//! and [`lookup_style`].

pub mod error;
pub mod params;

use indexmap::IndexMap;

pub use error::ValidationError;
pub use params::ParameterSet;

use crate::library::{Range, Style, StyleLibrary, HIGH_BUCKET};

/// Axis → resolved phrase, in parameter supply order.
pub type ResolvedPhraseMap = IndexMap<String, String>;

/// Find a style by name, rejecting unknown names.
pub fn lookup_style<'a>(library: &'a StyleLibrary, name: &str) -> Result<&'a Style, ValidationError> {
    library
        .style(name)
        .ok_or_else(|| ValidationError::new(format!("unknown style '{}'", name)))
}

/// Resolve every parameter for the named style.
pub fn resolve(
    library: &StyleLibrary,
    style_name: &str,
    params: &ParameterSet,
) -> Result<ResolvedPhraseMap, ValidationError> {
    let style = lookup_style(library, style_name)?;
    Ok(resolve_style(library, style, params))
}

/// Resolve every parameter for an already looked-up style.
pub fn resolve_style(library: &StyleLibrary, style: &Style, params: &ParameterSet) -> ResolvedPhraseMap {
    let mut resolved = ResolvedPhraseMap::with_capacity(params.len());
    for (axis, raw) in params.iter() {
        let value = apply_bias(style, axis, raw);
        let bucket = bucketize(&library.ranges, value);
        let text = style
            .override_text(axis, bucket)
            .or_else(|| library.base_text(axis, bucket));
        match text {
            Some(text) => {
                resolved.insert(axis.to_string(), text.to_string());
            }
            None => log::warn!("No text for axis '{}' bucket '{}'; skipping", axis, bucket),
        }
    }
    resolved
}

/// Add the style bias for `axis` and clamp into [0, 1]. The clamp applies
/// even when the style has no bias for the axis.
pub fn apply_bias(style: &Style, axis: &str, raw: f64) -> f64 {
    let biased = raw + style.bias_for(axis).unwrap_or(0.0);
    biased.clamp(0.0, 1.0)
}

/// Map a value in [0, 1] to a bucket name. Falls back to `high` when no
/// range matches.
pub fn bucketize(ranges: &IndexMap<String, Range>, value: f64) -> &str {
    ranges
        .iter()
        .find(|(name, range)| range.contains(value, name.as_str() == HIGH_BUCKET))
        .map(|(name, _)| name.as_str())
        .unwrap_or(HIGH_BUCKET)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> StyleLibrary {
        StyleLibrary::builtin().unwrap()
    }

    fn params(pairs: &[(&str, f64)]) -> ParameterSet {
        pairs.iter().map(|(axis, value)| (*axis, *value)).collect()
    }

    #[test]
    fn test_bucketize_boundaries() {
        let library = library();
        assert_eq!(bucketize(&library.ranges, 0.0), "low");
        assert_eq!(bucketize(&library.ranges, 0.39), "low");
        assert_eq!(bucketize(&library.ranges, 0.4), "mid");
        assert_eq!(bucketize(&library.ranges, 0.7), "high");
        assert_eq!(bucketize(&library.ranges, 1.0), "high");
    }

    #[test]
    fn test_bucketize_is_total_on_unit_interval() {
        let library = library();
        for step in 0..=1000 {
            let value = step as f64 / 1000.0;
            let matches = library
                .ranges
                .iter()
                .filter(|(name, range)| range.contains(value, name.as_str() == HIGH_BUCKET))
                .count();
            assert_eq!(matches, 1, "value {} matched {} buckets", value, matches);
        }
    }

    #[test]
    fn test_bucketize_defaults_to_high_without_match() {
        let mut ranges = IndexMap::new();
        ranges.insert("low".to_string(), Range::new(0.0, 0.5));
        assert_eq!(bucketize(&ranges, 0.75), "high");
    }

    #[test]
    fn test_unbiased_axis_returns_base_text() {
        let library = library();
        let resolved = resolve(&library, "minimalist", &params(&[("warmth", 0.95)])).unwrap();
        assert_eq!(resolved["warmth"], library.axes["warmth"]["high"]);
    }

    #[test]
    fn test_override_replaces_base_text() {
        let library = library();
        let resolved =
            resolve(&library, "mid_century_modern", &params(&[("saturation", 0.9)])).unwrap();
        assert_eq!(resolved["saturation"], "punchy mustard, teal and burnt orange accents");
        assert_ne!(resolved["saturation"], library.axes["saturation"]["high"]);
    }

    #[test]
    fn test_override_only_applies_to_its_bucket() {
        let library = library();
        let resolved =
            resolve(&library, "mid_century_modern", &params(&[("saturation", 0.1)])).unwrap();
        assert_eq!(resolved["saturation"], library.axes["saturation"]["low"]);
    }

    #[test]
    fn test_bias_is_applied_before_bucketing_and_clamped() {
        let library = library();
        let rustic = library.style("rustic_cabin").unwrap();
        // 0.8 + 0.25 clamps to 1.0
        assert_eq!(apply_bias(rustic, "warmth", 0.8), 1.0);
        let resolved = resolve(&library, "rustic_cabin", &params(&[("warmth", 0.8)])).unwrap();
        assert_eq!(resolved["warmth"], library.axes["warmth"]["high"]);

        // 0.5 + 0.25 crosses from mid into high
        let resolved = resolve(&library, "rustic_cabin", &params(&[("warmth", 0.5)])).unwrap();
        assert_eq!(resolved["warmth"], library.axes["warmth"]["high"]);
    }

    #[test]
    fn test_negative_bias_clamps_at_zero() {
        let library = library();
        let minimalist = library.style("minimalist").unwrap();
        assert_eq!(apply_bias(minimalist, "density", 0.1), 0.0);
        assert_eq!(apply_bias(minimalist, "warmth", 0.3), 0.3);
    }

    #[test]
    fn test_biased_value_can_reach_an_override_bucket() {
        let library = library();
        // minimalist density bias -0.2: 0.95 → 0.75, still high → override
        let resolved = resolve(&library, "minimalist", &params(&[("density", 0.95)])).unwrap();
        assert!(resolved["density"].starts_with("a curated but fuller"));
        // 0.8 → 0.6 lands in mid → base text
        let resolved = resolve(&library, "minimalist", &params(&[("density", 0.8)])).unwrap();
        assert_eq!(resolved["density"], library.axes["density"]["mid"]);
    }

    #[test]
    fn test_resolved_map_keeps_supply_order() {
        let library = library();
        let resolved = resolve(
            &library,
            "japandi",
            &params(&[("symmetry", 0.5), ("warmth", 0.1), ("brightness", 0.9)]),
        )
        .unwrap();
        let axes: Vec<&String> = resolved.keys().collect();
        assert_eq!(axes, vec!["symmetry", "warmth", "brightness"]);
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        let err = resolve(&library(), "baroque", &params(&[("warmth", 0.5)])).unwrap_err();
        assert_eq!(err.message(), "unknown style 'baroque'");
    }
}
