//! Render-time size and spacing back-calculation.
//!
//! Font size does not come straight from pixels on the page: different
//! faces draw different-sized characters at the same nominal size. These
//! functions invert the relationship: given a face and an observed pixel
//! footprint, they recover the point size and the per-character spacing the
//! text-drawing collaborator needs to reproduce the original layout.
//!
//! Everything here is pure. The only mutable state is the [`LineSizeCache`],
//! which the caller owns; concurrent writers computing the same
//! deterministic value are harmless, so it needs no lock.

use crate::error::{FontError, Result};
use crate::font::face::FontFace;
use crate::font::registry::FontRegistry;
use crate::stats::round3;
use rustc_hash::FxHashMap;

/// Visual footprint of one word at one size, in pixels.
///
/// `visual_width` covers printed ink only; the bearings on either side are
/// reported separately so callers can position against the ink edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordRenderMetrics {
  pub visual_width: f64,
  pub left_side_bearing: f64,
  pub right_side_bearing: f64,
}

/// Back-calculates the font size that renders `reference` at
/// `observed_px` pixels tall.
///
/// The default reference for body text is "o" (it tracks the x-height stat
/// better than "x" does); "A" for ascender-based sizing, "1" for
/// superscripts, the word's first character for drop caps.
pub fn font_size_from_height(face: &FontFace, observed_px: f64, reference: char) -> Result<f64> {
  let glyph_height = face
    .glyph_height(reference)
    .ok_or(FontError::GlyphNotFound {
      codepoint: reference as u32,
    })?;
  let unit_height = glyph_height / face.units_per_em as f64;
  Ok((observed_px / unit_height).round())
}

/// Measures a word's visual width and outer bearings at `font_size`.
///
/// Advance widths and kerning accumulate in font units; the first glyph's
/// left bearing and the last glyph's right bearing are then carved off so
/// the remainder is ink width. Characters without glyphs contribute
/// nothing.
pub fn measure_word(text: &str, face: &FontFace, font_size: f64) -> WordRenderMetrics {
  let chars: Vec<char> = text.chars().collect();

  let mut advance_total = 0.0;
  for (i, &ch) in chars.iter().enumerate() {
    if let Some(glyph) = face.glyph_for_char(ch) {
      advance_total += glyph.advance_width;
    }
    if let Some(&next) = chars.get(i + 1) {
      advance_total += face.kerning_between(ch as u32, next as u32);
    }
  }

  let left = chars
    .first()
    .and_then(|&c| face.glyph_for_char(c))
    .map(|g| g.left_side_bearing)
    .unwrap_or(0.0);
  let right = chars
    .last()
    .and_then(|&c| face.glyph_for_char(c))
    .map(|g| g.right_side_bearing)
    .unwrap_or(0.0);

  let px = font_size / face.units_per_em as f64;
  WordRenderMetrics {
    visual_width: (advance_total - left - right) * px,
    left_side_bearing: left * px,
    right_side_bearing: right * px,
  }
}

/// Uniform per-character spacing delta needed to stretch `text` to
/// `target_width` pixels. Zero for words shorter than two characters.
pub fn char_spacing_for_width(
  text: &str,
  face: &FontFace,
  font_size: f64,
  target_width: f64,
) -> f64 {
  let len = text.chars().count();
  if len < 2 {
    return 0.0;
  }
  let visual_width = measure_word(text, face, font_size).visual_width;
  round3((target_width - visual_width) / (len - 1) as f64)
}

/// Observed pixel bounding box of a word or line region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelBox {
  pub x0: f64,
  pub y0: f64,
  pub x1: f64,
  pub y1: f64,
}

impl PixelBox {
  pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
    Self { x0, y0, x1, y1 }
  }

  pub fn width(&self) -> f64 {
    self.x1 - self.x0
  }

  pub fn height(&self) -> f64 {
    self.y1 - self.y0
  }
}

/// One recognized word, as the segmentation collaborator reports it.
#[derive(Debug, Clone, Default)]
pub struct RecognizedWord {
  pub text: String,
  pub bbox: PixelBox,
  /// Family override for this word; the document default applies otherwise.
  pub font_family: Option<String>,
  /// Manually assigned size, taking precedence over any derivation.
  pub explicit_size: Option<f64>,
  pub superscript: bool,
  pub drop_cap: bool,
}

/// One recognized line with its observed vertical metrics.
#[derive(Debug, Clone, Default)]
pub struct RecognizedLine {
  /// Stable identity used as the size-cache key.
  pub id: u64,
  pub words: Vec<RecognizedWord>,
  /// Manually assigned size, taking precedence over any derivation.
  pub explicit_size: Option<f64>,
  /// Observed ascender height in pixels, when measured.
  pub asc_height: Option<f64>,
  /// Observed x-height in pixels, when measured.
  pub x_height: Option<f64>,
}

/// Externally owned cache of computed line sizes, keyed by line identity.
///
/// Invalidation is the owner's concern: drop or clear the cache when the
/// line observations it was computed from change.
#[derive(Debug, Clone, Default)]
pub struct LineSizeCache {
  sizes: FxHashMap<u64, f64>,
}

impl LineSizeCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, line_id: u64) -> Option<f64> {
    self.sizes.get(&line_id).copied()
  }

  pub fn insert(&mut self, line_id: u64, size: f64) {
    self.sizes.insert(line_id, size);
  }

  pub fn invalidate(&mut self, line_id: u64) {
    self.sizes.remove(&line_id);
  }

  pub fn clear(&mut self) {
    self.sizes.clear();
  }

  pub fn len(&self) -> usize {
    self.sizes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sizes.is_empty()
  }
}

/// Size for one word, or `None` when the line size should apply.
///
/// Precedence: the word's explicit size; a superscript derivation against
/// "1"; a drop-cap derivation against the word's first character; otherwise
/// defer to the line.
pub fn word_font_size(
  word: &RecognizedWord,
  registry: &FontRegistry,
  default_family: &str,
) -> Result<Option<f64>> {
  if let Some(size) = word.explicit_size {
    return Ok(Some(size));
  }

  let family = word.font_family.as_deref().unwrap_or(default_family);
  let face = registry
    .face(family)
    .ok_or_else(|| FontError::FamilyNotRegistered {
      family: family.to_string(),
    })?;

  if word.superscript {
    return font_size_from_height(face, word.bbox.height(), '1').map(Some);
  }
  if word.drop_cap {
    if let Some(first) = word.text.chars().next() {
      return font_size_from_height(face, word.bbox.height(), first).map(Some);
    }
  }
  Ok(None)
}

/// Size for one line: the explicit size, the cached derivation, or a fresh
/// derivation from the observed ascender height and/or x-height.
///
/// When both observations exist the two derivations are averaged (floored);
/// with neither, `None`, and the caller falls back to surrounding context.
/// The face comes from the first word's family, or `default_family`.
pub fn line_font_size(
  line: &RecognizedLine,
  registry: &FontRegistry,
  default_family: &str,
  cache: &mut LineSizeCache,
) -> Result<Option<f64>> {
  if let Some(size) = line.explicit_size {
    return Ok(Some(size));
  }
  if let Some(size) = cache.get(line.id) {
    return Ok(Some(size));
  }

  let family = line
    .words
    .first()
    .and_then(|w| w.font_family.as_deref())
    .unwrap_or(default_family);
  let face = registry
    .face(family)
    .ok_or_else(|| FontError::FamilyNotRegistered {
      family: family.to_string(),
    })?;

  let size = match (line.asc_height, line.x_height) {
    (Some(asc), None) => Some(font_size_from_height(face, asc, 'A')?),
    (None, Some(x)) => Some(font_size_from_height(face, x, 'o')?),
    (Some(asc), Some(x)) => {
      let from_asc = font_size_from_height(face, asc, 'A')?;
      let from_x = font_size_from_height(face, x, 'o')?;
      Some(((from_asc + from_x) / 2.0).floor())
    }
    (None, None) => None,
  };

  if let Some(size) = size {
    cache.insert(line.id, size);
  }
  Ok(size)
}
