//! Calibrated substitute-font synthesis for recognized documents
//!
//! When a scanned document's typeface is unknown and unembedded, a small set
//! of stock families has to stand in for it. This crate tunes a stock font's
//! glyph geometry to the pixel-level character dimensions observed by the
//! recognition engine, so overlaid or reflowed text keeps the original
//! page's visual proportions.
//!
//! # Pipeline
//!
//! 1. **Collect**: per-page character/kerning ratio samples accumulate in a
//!    [`DocumentSamples`] context ([`samples`]).
//! 2. **Aggregate**: once every page is in, the samples reduce to one robust
//!    [`FontMetrics`] record ([`metrics`]).
//! 3. **Calibrate**: a [`Calibrator`] reshapes a pristine stock font pair
//!    against the metrics ([`calibrate`]).
//! 4. **Small caps**: a companion family is synthesized from the calibrated
//!    face ([`smallcaps`]).
//! 5. **Render**: pure functions back-calculate per-word font sizes and
//!    character spacing from observed pixel footprints ([`render`]).
//!
//! Steps 1–4 run once per document (and again on re-optimization); step 5
//! runs continuously during rendering against whichever face is active.

pub mod calibrate;
pub mod error;
pub mod font;
pub mod metrics;
pub mod render;
pub mod samples;
pub mod smallcaps;
pub mod stats;

pub use calibrate::{CalibratedPair, CalibrationPolicy, Calibrator};
pub use error::{AggregateError, Error, FontError, Result};
pub use font::{FontFace, FontRegistry, Glyph, GlyphOutline, PathCommand, StockFont};
pub use metrics::FontMetrics;
pub use render::{
  char_spacing_for_width, font_size_from_height, line_font_size, measure_word, word_font_size,
  LineSizeCache, PixelBox, RecognizedLine, RecognizedWord, WordRenderMetrics,
};
pub use samples::{CharPair, DocumentSamples, PageSamples, QualityTally, SampleQuality};
pub use smallcaps::{register_small_caps_family, synthesize_small_caps};
