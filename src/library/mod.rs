//! Style library — the static vocabulary behind every prompt.
//!
//! ```text
//! YAML / JSON document
//!   ↓  StyleLibrary::from_file() / from_yaml() / builtin()
//! StyleLibrary (validated, immutable, shared as Arc<StyleLibrary>)
//!   ↓
//! resolver / prompt / refinement
//! ```

pub mod error;
pub mod loader;
pub mod style_def;

pub use error::LibraryError;
pub use style_def::{
    AssemblyConfig, Dimensions, Range, RefinementConfig, Signature, Style, StyleLibrary,
    DECREASE, DEFAULT_FALLBACK, HIGH_BUCKET, INCREASE, PHRASE_PLACEHOLDER,
};
