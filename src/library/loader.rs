//! Style library loading — parses a YAML or JSON document and validates
//! every invariant once, so request handling never meets a missing
//! (axis, bucket) combination.

use std::path::Path;

use super::error::LibraryError;
use super::style_def::{StyleLibrary, DECREASE, HIGH_BUCKET, INCREASE, PHRASE_PLACEHOLDER};

/// Tolerance for range boundary comparisons.
const BOUND_TOLERANCE: f64 = 1e-9;

/// The library shipped with the crate.
const BUILTIN_LIBRARY: &str = include_str!("../../data/style_library.yaml");

impl StyleLibrary {
    /// Parse and validate a library from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, LibraryError> {
        let library: StyleLibrary = serde_yaml::from_str(yaml)?;
        library.finish()
    }

    /// Parse and validate a library from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let library: StyleLibrary = serde_json::from_str(json)?;
        library.finish()
    }

    /// Load a library from disk. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        log::info!("Loading style library from {:?}", path);
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// The built-in library bundled at compile time.
    pub fn builtin() -> Result<Self, LibraryError> {
        Self::from_yaml(BUILTIN_LIBRARY)
    }

    fn finish(mut self) -> Result<Self, LibraryError> {
        for (name, style) in self.styles.iter_mut() {
            style.name = name.clone();
        }
        self.validate()?;
        log::debug!(
            "Style library ready: {} styles, {} axes, {} buckets",
            self.styles.len(),
            self.axes.len(),
            self.ranges.len()
        );
        Ok(self)
    }

    /// Check every structural invariant of the library.
    pub fn validate(&self) -> Result<(), LibraryError> {
        self.validate_ranges()?;
        self.validate_axes()?;
        self.validate_styles()?;
        self.validate_refinement()
    }

    fn validate_ranges(&self) -> Result<(), LibraryError> {
        if !self.ranges.contains_key(HIGH_BUCKET) {
            return Err(LibraryError::invalid(
                "ranges",
                format!("a bucket named '{}' is required", HIGH_BUCKET),
            ));
        }

        let mut sorted: Vec<(&String, f64, f64)> = Vec::with_capacity(self.ranges.len());
        for (bucket, range) in &self.ranges {
            let path = format!("ranges.{}", bucket);
            if !range.low.is_finite() || !range.high.is_finite() {
                return Err(LibraryError::invalid(path, "bounds must be finite"));
            }
            if range.low < 0.0 || range.high > 1.0 {
                return Err(LibraryError::invalid(path, "bounds must lie within [0, 1]"));
            }
            if range.low >= range.high {
                return Err(LibraryError::invalid(path, "low must be below high"));
            }
            sorted.push((bucket, range.low, range.high));
        }
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut expected_low = 0.0;
        for (bucket, low, high) in &sorted {
            if (low - expected_low).abs() > BOUND_TOLERANCE {
                return Err(LibraryError::invalid(
                    format!("ranges.{}", bucket),
                    format!("expected to start at {} to tile [0, 1]", expected_low),
                ));
            }
            expected_low = *high;
        }
        if (expected_low - 1.0).abs() > BOUND_TOLERANCE {
            return Err(LibraryError::invalid("ranges", "ranges must end at 1.0"));
        }
        if let Some((last, _, _)) = sorted.last() {
            if last.as_str() != HIGH_BUCKET {
                return Err(LibraryError::invalid(
                    format!("ranges.{}", last),
                    format!("the bucket containing 1.0 must be '{}'", HIGH_BUCKET),
                ));
            }
        }
        Ok(())
    }

    fn validate_axes(&self) -> Result<(), LibraryError> {
        if self.axes.is_empty() {
            return Err(LibraryError::invalid("axes", "at least one axis is required"));
        }
        for (axis, buckets) in &self.axes {
            for bucket in self.ranges.keys() {
                if !buckets.contains_key(bucket) {
                    return Err(LibraryError::invalid(
                        format!("axes.{}", axis),
                        format!("missing text for bucket '{}'", bucket),
                    ));
                }
            }
            for bucket in buckets.keys() {
                if !self.ranges.contains_key(bucket) {
                    return Err(LibraryError::invalid(
                        format!("axes.{}.{}", axis, bucket),
                        "unknown bucket",
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_styles(&self) -> Result<(), LibraryError> {
        if self.styles.is_empty() {
            return Err(LibraryError::invalid("styles", "at least one style is required"));
        }
        for (name, style) in &self.styles {
            for (axis, buckets) in &style.overrides {
                if !self.has_axis(axis) {
                    return Err(LibraryError::invalid(
                        format!("styles.{}.overrides.{}", name, axis),
                        "unknown axis",
                    ));
                }
                for bucket in buckets.keys() {
                    if !self.ranges.contains_key(bucket) {
                        return Err(LibraryError::invalid(
                            format!("styles.{}.overrides.{}.{}", name, axis, bucket),
                            "unknown bucket",
                        ));
                    }
                }
            }
            for (axis, offset) in &style.bias {
                let path = format!("styles.{}.bias.{}", name, axis);
                if !self.has_axis(axis) {
                    return Err(LibraryError::invalid(path, "unknown axis"));
                }
                if !offset.is_finite() {
                    return Err(LibraryError::invalid(path, "bias must be finite"));
                }
            }
        }
        Ok(())
    }

    fn validate_refinement(&self) -> Result<(), LibraryError> {
        let refinement = &self.refinement;
        if !refinement.epsilon.is_finite() || refinement.epsilon < 0.0 {
            return Err(LibraryError::invalid(
                "refinement.epsilon",
                "must be a finite, non-negative number",
            ));
        }
        if !refinement.assembly.format.contains(PHRASE_PLACEHOLDER) {
            return Err(LibraryError::invalid(
                "refinement.assembly.format",
                format!("must contain {}", PHRASE_PLACEHOLDER),
            ));
        }
        for (kind, axes) in &refinement.dimensions {
            for (axis, directions) in axes {
                if !self.has_axis(axis) {
                    return Err(LibraryError::invalid(
                        format!("refinement.dimensions.{}.{}", kind, axis),
                        "unknown axis",
                    ));
                }
                for direction in directions.keys() {
                    if direction != INCREASE && direction != DECREASE {
                        return Err(LibraryError::invalid(
                            format!("refinement.dimensions.{}.{}.{}", kind, axis, direction),
                            format!("direction must be '{}' or '{}'", INCREASE, DECREASE),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
ranges:
  low: [0.0, 0.5]
  high: [0.5, 1.0]
axes:
  warmth:
    low: "cool"
    high: "warm"
styles:
  plain:
    tags: [simple]
refinement:
  epsilon: 0.05
  max_phrases_per_refinement: 2
  dimensions:
    color:
      warmth:
        increase: "warmer"
        decrease: "cooler"
  assembly:
    prefix: "P"
    format: "- {PHRASE}"
    preserve: "K"
    suffix: "S"
"#;

    #[test]
    fn test_builtin_library_is_valid() {
        let library = StyleLibrary::builtin().unwrap();
        assert!(library.style("minimalist").is_some());
        assert!(library.has_axis("warmth"));
        assert_eq!(library.style("minimalist").unwrap().name, "minimalist");
    }

    #[test]
    fn test_minimal_library_loads_and_names_styles() {
        let library = StyleLibrary::from_yaml(MINIMAL).unwrap();
        assert_eq!(library.style_names(), vec!["plain"]);
        assert_eq!(library.style("plain").unwrap().name, "plain");
        assert!(library.refinement.fallback.contains("as-is"));
    }

    #[test]
    fn test_rejects_missing_bucket_text() {
        let yaml = MINIMAL.replace("    high: \"warm\"\n", "");
        let err = StyleLibrary::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("axes.warmth"), "{}", err);
    }

    #[test]
    fn test_rejects_gap_in_ranges() {
        let yaml = MINIMAL.replace("high: [0.5, 1.0]", "high: [0.6, 1.0]");
        let err = StyleLibrary::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("ranges.high"), "{}", err);
    }

    #[test]
    fn test_rejects_library_without_high_bucket() {
        let yaml = MINIMAL
            .replace("high: [0.5, 1.0]", "top: [0.5, 1.0]")
            .replace("high: \"warm\"", "top: \"warm\"");
        let err = StyleLibrary::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("'high'"), "{}", err);
    }

    #[test]
    fn test_rejects_override_on_unknown_axis() {
        let yaml = MINIMAL.replace(
            "    tags: [simple]\n",
            "    tags: [simple]\n    overrides:\n      glow:\n        low: \"dim\"\n",
        );
        let err = StyleLibrary::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("styles.plain.overrides.glow"), "{}", err);
    }

    #[test]
    fn test_rejects_unknown_refinement_direction() {
        let yaml = MINIMAL.replace("decrease: \"cooler\"", "sideways: \"cooler\"");
        let err = StyleLibrary::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("sideways"), "{}", err);
    }

    #[test]
    fn test_rejects_format_without_placeholder() {
        let yaml = MINIMAL.replace("format: \"- {PHRASE}\"", "format: \"- phrase\"");
        assert!(StyleLibrary::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_from_file_detects_json() {
        let library = StyleLibrary::from_yaml(MINIMAL).unwrap();
        let json = serde_json::to_string(&library).unwrap();

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = StyleLibrary::from_file(file.path()).unwrap();
        assert_eq!(loaded.axis_names(), vec!["warmth"]);
        assert_eq!(loaded.ranges["high"].high, 1.0);
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let loaded = StyleLibrary::from_file(file.path()).unwrap();
        assert_eq!(loaded.refinement.max_phrases_per_refinement, 2);
    }
}
