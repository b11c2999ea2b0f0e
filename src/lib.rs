//! # stylesynth
//!
//! Parameter-driven prompt synthesis for interior-design visualization.
//!
//! A client picks a style and moves a handful of normalized sliders
//! (warmth, density, texture, ...). The crate turns those values into
//! style-aware phrases, assembles a generation prompt, and forwards it to
//! external description and image services. A second pass turns the
//! difference between two slider snapshots into a bounded edit instruction
//! for the previous image.
//!
//! ```text
//! params ─▶ resolver ─▶ phrases ─▶ prompt ─▶ gateway ─▶ description + image
//! (p_0, p_1, type) ─▶ refinement ─▶ edit prompt ─▶ gateway ─▶ image
//! ```

pub mod config;
pub mod gateway;
pub mod library;
pub mod prompt;
pub mod refinement;
pub mod resolver;
pub mod security;
pub mod server;

pub use config::ServerConfig;
pub use library::{Style, StyleLibrary};
pub use prompt::{assemble, Scene};
pub use refinement::{refine, Delta, Refinement};
pub use resolver::{resolve, ParameterSet, ResolvedPhraseMap, ValidationError};

/// Crate version reported by `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
