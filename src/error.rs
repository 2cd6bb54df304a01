//! Error types for fontfit
//!
//! Two failure families exist in this crate:
//! - Aggregation errors, raised before any font work starts when the sample
//!   pool is unusable. These gate the whole calibration pipeline.
//! - Font errors, raised when stock bytes cannot be parsed or a required
//!   reference glyph is absent.
//!
//! Per-glyph conditions during calibration (a missing glyph, a non-finite
//! intermediate value) are deliberately *not* errors: they are absorbed
//! locally so a single bad glyph never aborts a whole font.
//!
//! All errors use the `thiserror` crate for minimal boilerplate and proper
//! error trait implementations.

use thiserror::Error;

/// Result type alias for fontfit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for fontfit.
#[derive(Error, Debug, Clone)]
pub enum Error {
  /// Sample aggregation failed
  #[error("Aggregation error: {0}")]
  Aggregate(#[from] AggregateError),

  /// Font parsing or glyph lookup error
  #[error("Font error: {0}")]
  Font(#[from] FontError),
}

/// Errors raised while reducing recognition samples to document metrics.
///
/// `InsufficientData` is blocking: no metrics record can be produced and the
/// caller should disable the optimize affordance. `DegradedData` is
/// non-blocking: prior metrics (when the caller retained any) stay valid,
/// but no new record was computed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
  /// No usable samples and at least one hard recognition error
  #[error("no usable character samples ({errors} character errors)")]
  InsufficientData { errors: usize },

  /// No good samples; only warning-level classifications were seen
  #[error("no good character samples ({warnings} character warnings)")]
  DegradedData { warnings: usize },
}

impl AggregateError {
  /// Whether this failure must disable calibration entirely.
  pub fn is_blocking(&self) -> bool {
    matches!(self, AggregateError::InsufficientData { .. })
  }
}

/// Errors that occur when parsing stock fonts or resolving glyphs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FontError {
  /// Font bytes could not be parsed
  #[error("invalid font data: {reason}")]
  InvalidFontData { reason: String },

  /// A required reference glyph is missing from the font
  #[error("glyph not found for character U+{codepoint:04X}")]
  GlyphNotFound { codepoint: u32 },

  /// Lookup of an unregistered family name
  #[error("font family not registered: '{family}'")]
  FamilyNotRegistered { family: String },
}
