//! Small-caps family synthesis.
//!
//! Renderers cannot select true small caps as a style variant of an
//! existing family, so a dedicated face is synthesized: every lowercase
//! letter receives a scaled-down copy of its uppercase outline, and the
//! result registers under its own family name (`"<family> Small Caps"`).

use crate::error::{FontError, Result};
use crate::font::face::{FontFace, Glyph};
use crate::font::registry::FontRegistry;
use log::debug;

/// Builds a small-caps companion face from a calibrated face.
///
/// The scale multiplier is `x_height("o") * height_small_caps /
/// cap_top("A")`, measured on the input face; a non-finite multiplier
/// degrades to 1.0 rather than corrupting outlines. Lowercase letters whose
/// uppercase partner has no glyph keep their original form.
///
/// Ligature substitution is dropped: lowercase ligature forms would replace
/// the synthesized small capitals.
pub fn synthesize_small_caps(source: &FontFace, height_small_caps: f64) -> Result<FontFace> {
  let x_height = source.x_height().ok_or(FontError::GlyphNotFound {
    codepoint: 'o' as u32,
  })?;
  let cap_top = source.cap_top().ok_or(FontError::GlyphNotFound {
    codepoint: 'A' as u32,
  })?;

  let mut mult = x_height * height_small_caps / cap_top;
  if !mult.is_finite() {
    debug!("non-finite small-caps multiplier; copying capitals unscaled");
    mult = 1.0;
  }

  let mut face = source.clone();
  for upper_code in 'A' as u32..='Z' as u32 {
    let lower_code = upper_code + 32;
    let Some(upper) = source.glyphs.get(&upper_code) else {
      debug!("no uppercase glyph for U+{upper_code:04X}; lowercase slot kept");
      continue;
    };

    let mut outline = upper.outline.clone();
    outline.map_x(|x| (x * mult).round());
    outline.map_y(|y| (y * mult).round());

    let advance_width = (upper.advance_width * mult).round();
    let (left_side_bearing, right_side_bearing) = match outline.bbox() {
      Some(bbox) => (bbox.x_min, advance_width - bbox.x_max),
      None => (0.0, advance_width),
    };

    face.glyphs.insert(
      lower_code,
      Glyph {
        outline,
        advance_width,
        left_side_bearing,
        right_side_bearing,
      },
    );
  }

  face.ligature_substitution = false;
  Ok(face)
}

/// Synthesizes and registers a small-caps family for `family`, returning the
/// registered family name.
pub fn register_small_caps_family(
  registry: &mut FontRegistry,
  family: &str,
  source: &FontFace,
  height_small_caps: f64,
) -> Result<String> {
  let face = synthesize_small_caps(source, height_small_caps)?;
  Ok(registry.register_small_caps(family, face))
}
