//! PARLEY Context - Context Window Assembly
//!
//! Builds, for every message of an annotated chat log, the bounded run of
//! preceding turns used as conditioning input when that message is the
//! reply. Also hosts the token-length annotation pass and the conversion of
//! records into training pairs.

pub mod annotate;
pub mod builder;
pub mod materialize;

pub use annotate::{annotate, annotate_in_place, AnnotationStats};
pub use builder::{prompt_header, ContextWindowBuilder, WindowSummary, START_MARKER};
pub use materialize::materialize;
