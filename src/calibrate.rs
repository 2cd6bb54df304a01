//! Glyph calibration
//!
//! Reshapes a stock font pair so its glyph geometry matches the character
//! dimensions measured in a recognized document. The pipeline runs one pass
//! per concern over an editable [`FontFace`] parsed fresh from stock bytes:
//!
//! 1. **Width pass**: per-character horizontal scaling against the x-height
//!    reference, with class-dependent clamps and a left-bearing shift for a
//!    fixed punctuation set.
//! 2. **Vertical pass**: uniform capital-letter scaling toward the observed
//!    cap height, applied to the primary and auxiliary weight in lockstep.
//! 3. **"J" correction**: restores the baseline overshoot proportion of "J"
//!    relative to "A", anchored at the cap line.
//! 4. **"p"/"q" correction**: stretches only the sub-baseline stem when the
//!    observed descender proportion disagrees with the stock design.
//! 5. **Kerning derivation**: converts observed pair-gap ratios into font
//!    units, clamped to class-dependent fractions of the em.
//!
//! Per-glyph problems never abort the font: a character without a glyph is
//! skipped, and any non-finite intermediate value degrades to the identity
//! transform for that value. Every coordinate is rounded exactly once per
//! pass.
//!
//! Calibration inputs are [`StockFont`] handles, never previously calibrated
//! faces, so repeated optimization of the same document cannot compound.

use crate::error::{FontError, Result};
use crate::font::face::{FontFace, StockFont};
use crate::font::registry::FontRegistry;
use crate::metrics::FontMetrics;
use crate::samples::CharPair;
use log::debug;
use rustc_hash::FxHashMap;

/// Characters whose bounding box is dominated by a single vertical stem;
/// horizontal scaling is tightly clamped for these.
const NARROW_STEM_SET: [char; 4] = ['i', 'l', 't', 'I'];

/// Characters rescaled about a fixed center point so the stylistic flourish
/// that dominates their bounding box is not distorted.
const WIDE_STEM_SET: [char; 8] = ['f', 'i', 'j', 'l', 't', 'I', 'J', 'T'];

/// Punctuation whose left bearing is repositioned from the observed cut
/// median.
const SHIFTED_PUNCTUATION: [char; 7] = [';', ':', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '"'];

/// Curly double quotes get a wider horizontal clamp; some document styles
/// legitimately use much wider quotes than the stock design.
const DOUBLE_QUOTE_SET: [char; 2] = ['\u{201C}', '\u{201D}'];

/// Curly opening quotes as leading pair members.
const OPENING_QUOTE_CODES: [u32; 2] = [0x201C as u32, 0x2018 as u32];

/// Curly closing quotes as trailing pair members.
const CLOSING_QUOTE_CODES: [u32; 2] = [0x201D as u32, 0x2019 as u32];

/// Pairs commonly drawn as ligatures (ff, fi, fl); these tolerate tighter
/// negative kerning.
const LIGATURE_PAIRS: [(u32, u32); 3] = [(102, 102), (102, 105), (102, 108)];

/// Numeric calibration thresholds.
///
/// The exact clamp intervals are policy, not algorithm; the defaults are the
/// values the statistics were tuned against.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationPolicy {
  /// Horizontal scale clamp for the single-stem set {i, l, t, I}.
  pub narrow_stem_clamp: (f64, f64),
  /// Horizontal scale clamp for curly double quotes.
  pub double_quote_clamp: (f64, f64),
  /// Horizontal scale clamp for every other glyph.
  pub general_clamp: (f64, f64),
  /// Kerning magnitude limit as a fraction of the em.
  pub kern_limit_em: f64,
  /// Multiplier widening the positive kerning bound for curly-quote pairs.
  pub quote_kern_stretch: f64,
  /// Multiplier widening the negative kerning bound for ligature-prone
  /// pairs.
  pub ligature_kern_stretch: f64,
  /// Minimum relative disagreement before the "J" height is corrected.
  pub cap_ratio_tolerance: f64,
  /// Minimum ratio magnitude before a "p"/"q" descender is corrected.
  pub descender_ratio_threshold: f64,
}

impl Default for CalibrationPolicy {
  fn default() -> Self {
    Self {
      narrow_stem_clamp: (0.9, 1.1),
      double_quote_clamp: (0.7, 1.5),
      general_clamp: (0.7, 1.3),
      kern_limit_em: 0.1,
      quote_kern_stretch: 2.0,
      ligature_kern_stretch: 1.5,
      cap_ratio_tolerance: 0.02,
      descender_ratio_threshold: 1.02,
    }
  }
}

/// The calibrated output pair. The kerning table derived from the document
/// lives on the primary face.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedPair {
  pub primary: FontFace,
  pub auxiliary: FontFace,
}

impl CalibratedPair {
  /// Registers both weights under the document's chosen family name.
  pub fn register(self, registry: &mut FontRegistry, family: impl Into<String>) {
    registry.register(family, self.primary, Some(self.auxiliary));
  }
}

/// Reshapes stock font pairs against a document's [`FontMetrics`].
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
  policy: CalibrationPolicy,
}

impl Calibrator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_policy(policy: CalibrationPolicy) -> Self {
    Self { policy }
  }

  pub fn policy(&self) -> &CalibrationPolicy {
    &self.policy
  }

  /// Calibrates a stock pair against document metrics.
  ///
  /// Both fonts are parsed fresh from their pristine bytes, so calling this
  /// again with the same inputs produces an identical result.
  ///
  /// Fails only when the stock bytes cannot be parsed or the primary font
  /// lacks the "o"/"A" reference glyphs; individual characters that cannot
  /// be calibrated are skipped.
  pub fn calibrate(
    &self,
    primary: &StockFont,
    auxiliary: &StockFont,
    metrics: &FontMetrics,
  ) -> Result<CalibratedPair> {
    let primary = FontFace::parse(primary)?;
    let auxiliary = FontFace::parse(auxiliary)?;
    self.calibrate_faces(primary, auxiliary, metrics)
  }

  pub(crate) fn calibrate_faces(
    &self,
    mut primary: FontFace,
    mut auxiliary: FontFace,
    metrics: &FontMetrics,
  ) -> Result<CalibratedPair> {
    let x_height = primary.x_height().ok_or(FontError::GlyphNotFound {
      codepoint: 'o' as u32,
    })?;
    let cap_top = primary.cap_top().ok_or(FontError::GlyphNotFound {
      codepoint: 'A' as u32,
    })?;

    self.width_pass(&mut primary, metrics, x_height);
    self.vertical_caps_pass(&mut primary, &mut auxiliary, metrics, x_height, cap_top);
    self.cap_j_pass(&mut primary, metrics);
    self.descender_pass(&mut primary, metrics);
    self.kerning_pass(&mut primary, metrics, x_height);

    primary.ligature_substitution = false;
    auxiliary.ligature_substitution = false;

    Ok(CalibratedPair { primary, auxiliary })
  }

  /// Horizontal scaling, punctuation shift, and advance/bearing rewrite.
  fn width_pass(&self, face: &mut FontFace, metrics: &FontMetrics, x_height: f64) {
    let mut codes: Vec<u32> = metrics.char_width.keys().copied().collect();
    codes.sort_unstable();

    for code in codes {
      if code < 33 {
        continue;
      }
      let Some(ch) = char::from_u32(code) else {
        continue;
      };
      // Periods are too commonly misidentified to recalibrate from.
      if ch == '.' {
        continue;
      }
      let Some(glyph) = face.glyphs.get(&code) else {
        debug!("no glyph for U+{code:04X}; width calibration skipped");
        continue;
      };
      let Some(bbox) = glyph.outline.bbox() else {
        continue;
      };
      let width = bbox.width();
      if width <= 0.0 {
        continue;
      }

      let ratio = metrics.char_width[&code];
      let raw_scale = (ratio * x_height) / width;
      if !raw_scale.is_finite() {
        debug!("non-finite width scale for U+{code:04X}; left unscaled");
        continue;
      }
      let (lo, hi) = if NARROW_STEM_SET.contains(&ch) {
        self.policy.narrow_stem_clamp
      } else if DOUBLE_QUOTE_SET.contains(&ch) {
        self.policy.double_quote_clamp
      } else {
        self.policy.general_clamp
      };
      let scale = raw_scale.clamp(lo, hi);

      let mut shift = 0.0;
      if SHIFTED_PUNCTUATION.contains(&ch) {
        if let Some(cut) = metrics.cut_median.get(&code) {
          let corrected = (cut * x_height).round();
          if corrected.is_finite() {
            shift = corrected - glyph.left_side_bearing;
          }
        }
      }

      // The stem is assumed to sit at the bbox midpoint (0.35 for "f",
      // whose flag pulls the box rightward).
      let center_point = if ch == 'f' { 0.35 } else { 0.5 };
      let center = bbox.x_min.max(0.0) + (width * center_point).round();
      let quarter = (width / 4.0).round();

      let Some(glyph) = face.glyphs.get_mut(&code) else {
        continue;
      };
      if WIDE_STEM_SET.contains(&ch) {
        glyph.outline.map_x(|x| {
          if (x - center).abs() > quarter {
            ((x - center) * scale).round() + center + shift
          } else {
            x + shift
          }
        });
      } else {
        glyph.outline.map_x(|x| (x * scale).round() + shift);
      }

      // Right bearings are collapsed; visual word spacing is reproduced at
      // render time through explicit per-word spacing instead.
      if let Some(bbox) = glyph.outline.bbox() {
        glyph.advance_width = bbox.x_max;
        glyph.left_side_bearing = bbox.x_min;
        glyph.right_side_bearing = 0.0;
      }
    }
  }

  /// Uniform vertical scaling of observed capitals in both weights.
  fn vertical_caps_pass(
    &self,
    primary: &mut FontFace,
    auxiliary: &mut FontFace,
    metrics: &FontMetrics,
    x_height: f64,
    cap_top: f64,
  ) {
    let Some(height_caps) = metrics.height_caps else {
      return;
    };
    let caps_mult = x_height * height_caps / cap_top;
    if !caps_mult.is_finite() {
      debug!("non-finite capital multiplier; vertical pass skipped");
      return;
    }

    let mut codes: Vec<u32> = metrics.char_height.keys().copied().collect();
    codes.sort_unstable();

    for code in codes {
      if code < 33 {
        continue;
      }
      let is_capital = char::from_u32(code).is_some_and(|c| c.is_ascii_uppercase());
      if !is_capital {
        continue;
      }
      for face in [&mut *primary, &mut *auxiliary] {
        if let Some(glyph) = face.glyphs.get_mut(&code) {
          glyph.outline.map_y(|y| (y * caps_mult).round());
        }
      }
    }
  }

  /// Restores the measured J/A height proportion, anchored at the cap line.
  ///
  /// "J" typically overshoots the baseline, so the whole adjustment is
  /// absorbed below the cap line.
  fn cap_j_pass(&self, face: &mut FontFace, metrics: &FontMetrics) {
    let (Some(&height_j), Some(&height_a)) = (
      metrics.char_height.get(&('J' as u32)),
      metrics.char_height.get(&('A' as u32)),
    ) else {
      return;
    };
    let measured = (height_j / height_a).max(0.0);

    let j_bbox = face.glyph_for_char('J').and_then(|g| g.outline.bbox());
    let a_bbox = face.glyph_for_char('A').and_then(|g| g.outline.bbox());
    let (Some(j_bbox), Some(a_bbox)) = (j_bbox, a_bbox) else {
      return;
    };

    let stock = j_bbox.height() / a_bbox.height();
    let mult = measured / stock;
    if !mult.is_finite() || (1.0 - mult).abs() <= self.policy.cap_ratio_tolerance {
      return;
    }

    let y_adj = (j_bbox.y_max - j_bbox.y_max * mult).round();
    let Some(glyph) = face.glyphs.get_mut(&('J' as u32)) else {
      return;
    };
    glyph.outline.map_y(|y| (y * mult + y_adj).round());
  }

  /// Stretches the sub-baseline stem of "p"/"q" toward the measured
  /// descender proportion relative to "a".
  fn descender_pass(&self, face: &mut FontFace, metrics: &FontMetrics) {
    let Some(&height_a) = metrics.char_height.get(&('a' as u32)) else {
      return;
    };
    let Some(a_bbox) = face.glyph_for_char('a').and_then(|g| g.outline.bbox()) else {
      return;
    };
    let baseline = a_bbox.y_min;

    for code in ['p' as u32, 'q' as u32] {
      let Some(&height_desc) = metrics.char_height.get(&code) else {
        continue;
      };
      let measured = (height_desc / height_a).max(0.0);

      let Some(bbox) = face.glyphs.get(&code).and_then(|g| g.outline.bbox()) else {
        continue;
      };
      let stock = bbox.height() / a_bbox.height();
      let mult = measured / stock;
      if !mult.is_finite() || mult.abs() <= self.policy.descender_ratio_threshold {
        continue;
      }

      let lower_stem = baseline - bbox.y_min;
      if lower_stem <= 0.0 {
        continue;
      }
      // Only the part below "a"'s baseline moves, so the factor is inflated
      // to land the full-glyph proportion on the measured value.
      let factor = (mult - 1.0) * (bbox.height() / lower_stem) + 1.0;
      if !factor.is_finite() {
        continue;
      }

      let Some(glyph) = face.glyphs.get_mut(&code) else {
        continue;
      };
      glyph.outline.map_y(|y| {
        if y != 0.0 && y < baseline {
          ((y - baseline) * factor).round()
        } else {
          y
        }
      });
    }
  }

  /// Converts observed pair-gap ratios to font-unit kerning, clamped per
  /// pair class, keyed by resolved glyph indices.
  fn kerning_pass(&self, face: &mut FontFace, metrics: &FontMetrics, x_height: f64) {
    let max_kern = (face.units_per_em as f64 * self.policy.kern_limit_em).round();
    let min_kern = -max_kern;

    let mut pairs: Vec<CharPair> = metrics.pair_kerning_raw.keys().copied().collect();
    pairs.sort_unstable();

    let mut table: FxHashMap<(u16, u16), f64> = FxHashMap::default();
    for pair in pairs {
      let (Some(&left_id), Some(&right_id)) = (
        face.glyph_ids.get(&pair.first),
        face.glyph_ids.get(&pair.second),
      ) else {
        debug!("pair {pair} has no glyphs; kerning skipped");
        continue;
      };
      let Some(right_glyph) = face.glyphs.get(&pair.second) else {
        continue;
      };

      let ratio = metrics.pair_kerning_raw[&pair];
      let kern = (ratio * x_height - right_glyph.left_side_bearing.max(0.0)).round();
      if !kern.is_finite() {
        continue;
      }

      let kern = if OPENING_QUOTE_CODES.contains(&pair.first)
        || CLOSING_QUOTE_CODES.contains(&pair.second)
      {
        // Text legitimately leaves generous space around curly quotes.
        kern.clamp(min_kern, max_kern * self.policy.quote_kern_stretch)
      } else if LIGATURE_PAIRS.contains(&(pair.first, pair.second)) {
        kern.clamp((min_kern * self.policy.ligature_kern_stretch).round(), max_kern)
      } else {
        kern.clamp(min_kern, max_kern)
      };

      table.insert((left_id, right_id), kern);
    }

    face.kerning = table;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::font::outline::{GlyphOutline, PathCommand};
  use crate::font::face::Glyph;

  fn rect_outline(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> GlyphOutline {
    GlyphOutline::new(vec![
      PathCommand::MoveTo { x: x_min, y: y_min },
      PathCommand::LineTo { x: x_max, y: y_min },
      PathCommand::LineTo { x: x_max, y: y_max },
      PathCommand::LineTo { x: x_min, y: y_max },
      PathCommand::Close,
    ])
  }

  fn insert_rect_glyph(
    face: &mut FontFace,
    ch: char,
    glyph_id: u16,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
  ) {
    let advance = x_max + 50.0;
    face.glyphs.insert(
      ch as u32,
      Glyph {
        outline: rect_outline(x_min, x_max, y_min, y_max),
        advance_width: advance,
        left_side_bearing: x_min,
        right_side_bearing: advance - x_max,
      },
    );
    face.glyph_ids.insert(ch as u32, glyph_id);
  }

  /// A face with 1000-unit x-height ("o") and 700-unit cap top ("A").
  fn reference_face() -> FontFace {
    let mut face = FontFace::empty(2048, 1638);
    insert_rect_glyph(&mut face, 'o', 1, 50.0, 950.0, 0.0, 1000.0);
    insert_rect_glyph(&mut face, 'A', 2, 20.0, 680.0, 0.0, 700.0);
    face
  }

  fn empty_metrics() -> FontMetrics {
    FontMetrics {
      char_width: FxHashMap::default(),
      char_height: FxHashMap::default(),
      cut_median: FxHashMap::default(),
      pair_kerning_raw: FxHashMap::default(),
      pair_kerning: FxHashMap::default(),
      height_caps: None,
      height_small_caps: 1.0,
    }
  }

  fn calibrate(face: FontFace, metrics: &FontMetrics) -> CalibratedPair {
    let auxiliary = face.clone();
    Calibrator::new()
      .calibrate_faces(face, auxiliary, metrics)
      .unwrap()
  }

  #[test]
  fn missing_reference_glyph_fails() {
    let mut face = FontFace::empty(1000, 800);
    insert_rect_glyph(&mut face, 'A', 1, 0.0, 700.0, 0.0, 700.0);
    let result = Calibrator::new().calibrate_faces(face.clone(), face, &empty_metrics());
    assert!(result.is_err());
  }

  #[test]
  fn control_codes_are_never_touched() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, '\u{0014}', 9, 0.0, 400.0, 0.0, 400.0);
    let mut metrics = empty_metrics();
    metrics.char_width.insert(0x14, 0.9);

    let before = face.glyphs[&0x14].clone();
    let pair = calibrate(face, &metrics);
    assert_eq!(pair.primary.glyphs[&0x14], before);
  }

  #[test]
  fn period_is_never_recalibrated() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, '.', 3, 40.0, 160.0, 0.0, 120.0);
    let mut metrics = empty_metrics();
    metrics.char_width.insert('.' as u32, 1.2);

    let before = face.glyphs[&('.' as u32)].clone();
    let pair = calibrate(face, &metrics);
    assert_eq!(pair.primary.glyphs[&('.' as u32)], before);
  }

  #[test]
  fn general_scale_clamps_to_lower_bound() {
    let mut face = reference_face();
    // Stock "a" is 1800 units wide; 0.52 * 1000 / 1800 ≈ 0.289 clamps to 0.7.
    insert_rect_glyph(&mut face, 'a', 4, 100.0, 1900.0, 0.0, 500.0);
    let mut metrics = empty_metrics();
    metrics.char_width.insert('a' as u32, 0.52);

    let pair = calibrate(face, &metrics);
    let glyph = &pair.primary.glyphs[&('a' as u32)];
    let bbox = glyph.outline.bbox().unwrap();
    assert_eq!(bbox.x_min, 70.0); // round(100 * 0.7)
    assert_eq!(bbox.x_max, 1330.0); // round(1900 * 0.7)
    assert_eq!(glyph.advance_width, 1330.0);
    assert_eq!(glyph.left_side_bearing, 70.0);
    assert_eq!(glyph.right_side_bearing, 0.0);
  }

  #[test]
  fn realized_scale_stays_inside_class_interval() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'n', 4, 0.0, 1000.0, 0.0, 500.0);
    let mut metrics = empty_metrics();
    // 2.0 * 1000 / 1000 = 2.0, clamps to the general upper bound 1.3.
    metrics.char_width.insert('n' as u32, 2.0);

    let pair = calibrate(face, &metrics);
    let bbox = pair.primary.glyphs[&('n' as u32)].outline.bbox().unwrap();
    assert_eq!(bbox.width(), 1300.0);
  }

  #[test]
  fn narrow_stem_scale_is_tightly_clamped() {
    let mut face = reference_face();
    // "l": stem at x 450..550, flourish pulling the box to 100..900.
    insert_rect_glyph(&mut face, 'l', 5, 100.0, 900.0, 0.0, 1400.0);
    let mut metrics = empty_metrics();
    // Raw scale 0.52 * 1000 / 800 = 0.65, clamps to 0.9.
    metrics.char_width.insert('l' as u32, 0.52);

    let pair = calibrate(face, &metrics);
    let bbox = pair.primary.glyphs[&('l' as u32)].outline.bbox().unwrap();
    // Center = 100 + round(800 * 0.5) = 500; quarter = 200. Both edges are
    // farther than a quarter-width from the center, so both rescale about it.
    assert_eq!(bbox.x_min, 140.0); // round((100 - 500) * 0.9) + 500
    assert_eq!(bbox.x_max, 860.0); // round((900 - 500) * 0.9) + 500
  }

  #[test]
  fn wide_stem_points_near_center_stay_put() {
    let mut face = reference_face();
    let outline = GlyphOutline::new(vec![
      PathCommand::MoveTo { x: 100.0, y: 0.0 },    // left flourish edge
      PathCommand::LineTo { x: 600.0, y: 0.0 },    // stem, near the center
      PathCommand::LineTo { x: 1100.0, y: 1400.0 }, // right flourish edge
    ]);
    face.glyphs.insert(
      'f' as u32,
      Glyph {
        outline,
        advance_width: 1150.0,
        left_side_bearing: 100.0,
        right_side_bearing: 50.0,
      },
    );
    face.glyph_ids.insert('f' as u32, 6);
    let mut metrics = empty_metrics();
    metrics.char_width.insert('f' as u32, 0.8); // raw scale 0.8 over width 1000

    let pair = calibrate(face, &metrics);
    let commands = &pair.primary.glyphs[&('f' as u32)].outline.commands;
    // Width 1000, center = 100 + round(1000 * 0.35) = 450, quarter = 250.
    // 600 sits within a quarter-width of the center: untouched.
    assert_eq!(commands[1], PathCommand::LineTo { x: 600.0, y: 0.0 });
    // The edges are beyond the quarter and rescale about the center:
    // round((100 - 450) * 0.8) + 450 = 170, round((1100 - 450) * 0.8) + 450 = 970.
    assert_eq!(commands[0], PathCommand::MoveTo { x: 170.0, y: 0.0 });
    assert_eq!(
      commands[2],
      PathCommand::LineTo {
        x: 970.0,
        y: 1400.0
      }
    );
  }

  #[test]
  fn punctuation_left_bearing_shifts_to_cut_median() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, ';', 7, 80.0, 280.0, -100.0, 500.0);
    let mut metrics = empty_metrics();
    // Scale 0.2 * 1000 / 200 = 1.0; shift = round(0.15 * 1000) - 80 = 70.
    metrics.char_width.insert(';' as u32, 0.2);
    metrics.cut_median.insert(';' as u32, 0.15);

    let pair = calibrate(face, &metrics);
    let glyph = &pair.primary.glyphs[&(';' as u32)];
    assert_eq!(glyph.left_side_bearing, 150.0);
    assert_eq!(glyph.outline.bbox().unwrap().x_max, 350.0);
  }

  #[test]
  fn capitals_scale_uniformly_in_both_weights() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'B', 8, 0.0, 600.0, 0.0, 700.0);
    let mut metrics = empty_metrics();
    metrics.height_caps = Some(1.4);
    metrics.char_height.insert('B' as u32, 1.4);
    metrics.char_height.insert('x' as u32, 1.0); // not a capital: untouched

    let pair = calibrate(face, &metrics);
    // caps_mult = 1000 * 1.4 / 700 = 2.0
    for output in [&pair.primary, &pair.auxiliary] {
      let bbox = output.glyphs[&('B' as u32)].outline.bbox().unwrap();
      assert_eq!(bbox.y_max, 1400.0);
    }
  }

  #[test]
  fn capitals_keep_stock_height_without_observations() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'B', 8, 0.0, 600.0, 0.0, 700.0);
    let mut metrics = empty_metrics();
    metrics.char_height.insert('B' as u32, 1.4); // height_caps stays None

    let pair = calibrate(face, &metrics);
    let bbox = pair.primary.glyphs[&('B' as u32)].outline.bbox().unwrap();
    assert_eq!(bbox.y_max, 700.0);
  }

  #[test]
  fn unobserved_capital_is_not_scaled() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'B', 8, 0.0, 600.0, 0.0, 700.0);
    insert_rect_glyph(&mut face, 'C', 9, 0.0, 600.0, 0.0, 700.0);
    let mut metrics = empty_metrics();
    metrics.height_caps = Some(1.4);
    metrics.char_height.insert('B' as u32, 1.4);

    let pair = calibrate(face, &metrics);
    assert_eq!(
      pair.primary.glyphs[&('B' as u32)].outline.bbox().unwrap().y_max,
      1400.0
    );
    assert_eq!(
      pair.primary.glyphs[&('C' as u32)].outline.bbox().unwrap().y_max,
      700.0
    );
  }

  #[test]
  fn cap_j_adjustment_preserves_the_cap_line() {
    let mut face = reference_face();
    // Stock J: 900 tall vs A's 700 (ratio ≈ 1.2857).
    insert_rect_glyph(&mut face, 'J', 10, 0.0, 400.0, -200.0, 700.0);
    let mut metrics = empty_metrics();
    metrics.char_height.insert('J' as u32, 1.5);
    metrics.char_height.insert('A' as u32, 1.0);

    let pair = calibrate(face, &metrics);
    let bbox = pair.primary.glyphs[&('J' as u32)].outline.bbox().unwrap();
    // measured/stock = 1.5 / (900/700) = 7/6; y_adj = round(700 - 700 * 7/6)
    // = -117. Cap line: round(700 * 7/6 - 117) = round(699.67) = 700.
    assert_eq!(bbox.y_max, 700.0);
    // Overshoot deepens: round(-200 * 7/6 - 117) = round(-350.33) = -350.
    assert_eq!(bbox.y_min, -350.0);
  }

  #[test]
  fn cap_j_within_tolerance_is_untouched() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'J', 10, 0.0, 400.0, -200.0, 700.0);
    let mut metrics = empty_metrics();
    // Measured ratio matches the stock 900/700 proportion.
    metrics.char_height.insert('J' as u32, 9.0);
    metrics.char_height.insert('A' as u32, 7.0);

    let before = face.glyphs[&('J' as u32)].clone();
    let pair = calibrate(face, &metrics);
    assert_eq!(pair.primary.glyphs[&('J' as u32)], before);
  }

  #[test]
  fn descender_stretch_moves_only_sub_baseline_points() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'a', 4, 0.0, 500.0, 0.0, 500.0);
    insert_rect_glyph(&mut face, 'p', 11, 0.0, 500.0, -250.0, 500.0);
    let mut metrics = empty_metrics();
    // measured p/a = 1.8 vs stock 750/500 = 1.5, mult = 1.2.
    metrics.char_height.insert('a' as u32, 1.0);
    metrics.char_height.insert('p' as u32, 1.8);

    let pair = calibrate(face, &metrics);
    let bbox = pair.primary.glyphs[&('p' as u32)].outline.bbox().unwrap();
    // factor = (1.2 - 1) * (750 / 250) + 1 = 1.6; -250 → -400.
    assert_eq!(bbox.y_min, -400.0);
    assert_eq!(bbox.y_max, 500.0);
    // Full height is now 900 = 750 * 1.2.
    assert_eq!(bbox.height(), 900.0);
  }

  #[test]
  fn descender_within_threshold_is_untouched() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'a', 4, 0.0, 500.0, 0.0, 500.0);
    insert_rect_glyph(&mut face, 'q', 12, 0.0, 500.0, -250.0, 500.0);
    let mut metrics = empty_metrics();
    metrics.char_height.insert('a' as u32, 1.0);
    metrics.char_height.insert('q' as u32, 1.5); // matches stock exactly

    let before = face.glyphs[&('q' as u32)].clone();
    let pair = calibrate(face, &metrics);
    assert_eq!(pair.primary.glyphs[&('q' as u32)], before);
  }

  #[test]
  fn kerning_within_limits_is_stored_unmodified() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'F', 13, 0.0, 550.0, 0.0, 700.0);
    let mut metrics = empty_metrics();
    metrics
      .pair_kerning_raw
      .insert(CharPair::new('F' as u32, 'A' as u32), 0.10);

    let pair = calibrate(face, &metrics);
    // round(0.10 * 1000 - 20) = 80; limit round(2048 * 0.1) = 205.
    assert_eq!(pair.primary.kerning[&(13, 2)], 80.0);
  }

  #[test]
  fn quote_pairs_get_a_widened_positive_bound() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, '\u{201C}', 14, 0.0, 300.0, 800.0, 1200.0);
    let mut metrics = empty_metrics();
    metrics
      .pair_kerning_raw
      .insert(CharPair::new(0x201C, 'A' as u32), 0.5);
    metrics
      .pair_kerning_raw
      .insert(CharPair::new('A' as u32, 'o' as u32), 0.5);

    let pair = calibrate(face, &metrics);
    let max_kern = (2048.0_f64 * 0.1).round();
    // Quote-leading pair: clamp widens to 2x the limit.
    assert_eq!(pair.primary.kerning[&(14, 2)], max_kern * 2.0);
    // Ordinary pair clamps to the plain limit.
    assert_eq!(pair.primary.kerning[&(2, 1)], max_kern);
  }

  #[test]
  fn ligature_pairs_get_a_relaxed_negative_bound() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'f', 15, 0.0, 450.0, 0.0, 1400.0);
    insert_rect_glyph(&mut face, 'i', 16, 0.0, 200.0, 0.0, 1400.0);
    insert_rect_glyph(&mut face, 'n', 17, 0.0, 500.0, 0.0, 500.0);
    let mut metrics = empty_metrics();
    metrics
      .pair_kerning_raw
      .insert(CharPair::new('f' as u32, 'i' as u32), -0.5);
    metrics
      .pair_kerning_raw
      .insert(CharPair::new('f' as u32, 'n' as u32), -0.5);

    let pair = calibrate(face, &metrics);
    let max_kern = (2048.0_f64 * 0.1).round();
    assert_eq!(pair.primary.kerning[&(15, 16)], (-max_kern * 1.5).round());
    assert_eq!(pair.primary.kerning[&(15, 17)], -max_kern);
  }

  #[test]
  fn kerning_skips_pairs_without_glyphs() {
    let face = reference_face();
    let mut metrics = empty_metrics();
    metrics
      .pair_kerning_raw
      .insert(CharPair::new('F' as u32, 'A' as u32), 0.10);

    let pair = calibrate(face, &metrics);
    assert!(pair.primary.kerning.is_empty());
  }

  #[test]
  fn derived_kerning_replaces_the_stock_table() {
    let mut face = reference_face();
    face.kerning.insert((1, 2), -999.0);
    let metrics = empty_metrics();

    let pair = calibrate(face, &metrics);
    assert!(pair.primary.kerning.is_empty());
  }

  #[test]
  fn ligature_substitution_is_dropped() {
    let mut face = reference_face();
    face.ligature_substitution = true;
    let pair = calibrate(face, &empty_metrics());
    assert!(!pair.primary.ligature_substitution);
    assert!(!pair.auxiliary.ligature_substitution);
  }

  #[test]
  fn calibration_is_idempotent_over_identical_inputs() {
    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'a', 4, 100.0, 1900.0, 0.0, 500.0);
    insert_rect_glyph(&mut face, 'B', 8, 0.0, 600.0, 0.0, 700.0);
    insert_rect_glyph(&mut face, 'F', 13, 0.0, 550.0, 0.0, 700.0);

    let mut metrics = empty_metrics();
    metrics.char_width.insert('a' as u32, 0.52);
    metrics.height_caps = Some(1.1);
    metrics.char_height.insert('B' as u32, 1.1);
    metrics
      .pair_kerning_raw
      .insert(CharPair::new('F' as u32, 'A' as u32), 0.10);

    let calibrator = Calibrator::new();
    let first = calibrator
      .calibrate_faces(face.clone(), face.clone(), &metrics)
      .unwrap();
    let second = calibrator
      .calibrate_faces(face.clone(), face.clone(), &metrics)
      .unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn policy_overrides_take_effect() {
    let mut policy = CalibrationPolicy::default();
    policy.general_clamp = (0.5, 2.0);
    let calibrator = Calibrator::with_policy(policy);

    let mut face = reference_face();
    insert_rect_glyph(&mut face, 'a', 4, 100.0, 1900.0, 0.0, 500.0);
    let mut metrics = empty_metrics();
    metrics.char_width.insert('a' as u32, 0.9);

    let pair = calibrator
      .calibrate_faces(face.clone(), face, &metrics)
      .unwrap();
    // Raw scale 0.9 * 1000 / 1800 = 0.5 survives the widened clamp.
    let bbox = pair.primary.glyphs[&('a' as u32)].outline.bbox().unwrap();
    assert_eq!(bbox.width(), 900.0);
  }
}
