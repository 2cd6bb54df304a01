//! Stock font handles and the editable face model.
//!
//! `StockFont` wraps the raw bytes of a stock font and nothing else. Every
//! parse starts fresh from those bytes, so repeated calibration of the same
//! document is idempotent and concurrent calibration of different documents
//! shares no mutable font state. There is no way to turn a calibrated
//! [`FontFace`] back into a `StockFont`.
//!
//! `FontFace` is the working model calibration edits: glyph outlines keyed
//! by character code, per-glyph advance and bearings, a glyph-index map, a
//! kerning table, and the global metrics the calibration math needs.

use crate::error::{FontError, Result};
use crate::font::outline::{GlyphOutline, OutlineCollector};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use ttf_parser::GlyphId;

/// Character codes extracted when parsing a stock font: printable ASCII,
/// printable Latin-1, en/em dashes and curly quotes.
fn charset() -> impl Iterator<Item = u32> {
  (33..=126)
    .chain(161..=255)
    .chain([8211, 8212, 8216, 8217, 8220, 8221])
}

/// Immutable handle over stock font bytes.
///
/// Cloning is cheap; the bytes are shared. Parsing always re-reads the
/// pristine bytes.
#[derive(Debug, Clone)]
pub struct StockFont {
  data: Arc<Vec<u8>>,
  index: u32,
}

impl StockFont {
  pub fn new(data: Vec<u8>) -> Self {
    Self {
      data: Arc::new(data),
      index: 0,
    }
  }

  /// Shares already-loaded bytes; `index` selects a face within a collection.
  pub fn from_shared(data: Arc<Vec<u8>>, index: u32) -> Self {
    Self { data, index }
  }

  pub fn data(&self) -> &[u8] {
    &self.data
  }

  /// Parses a fresh `ttf-parser` face from the stock bytes.
  pub fn face(&self) -> Result<ttf_parser::Face<'_>> {
    ttf_parser::Face::parse(&self.data, self.index).map_err(|e| {
      FontError::InvalidFontData {
        reason: format!("{e:?} (face index {})", self.index),
      }
      .into()
    })
  }
}

/// One editable glyph: outline plus horizontal metrics in font units.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
  pub outline: GlyphOutline,
  pub advance_width: f64,
  pub left_side_bearing: f64,
  pub right_side_bearing: f64,
}

/// An editable font face keyed by character code.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
  /// Font design resolution (typically 1000 or 2048).
  pub units_per_em: u16,
  /// hhea ascender, in font units.
  pub ascender: i16,
  /// Glyphs keyed by character code.
  pub glyphs: FxHashMap<u32, Glyph>,
  /// Character code → glyph index, for kerning keys.
  pub glyph_ids: FxHashMap<u32, u16>,
  /// Kerning adjustments in font units keyed by (left, right) glyph index.
  pub kerning: FxHashMap<(u16, u16), f64>,
  /// Whether the face still carries a glyph-substitution table. Calibrated
  /// and small-caps output clears this: ligature substitution would bypass
  /// the per-character metrics the calibration encodes.
  pub ligature_substitution: bool,
}

impl FontFace {
  /// An empty face, mostly useful for building synthetic fixtures.
  pub fn empty(units_per_em: u16, ascender: i16) -> Self {
    Self {
      units_per_em,
      ascender,
      glyphs: FxHashMap::default(),
      glyph_ids: FxHashMap::default(),
      kerning: FxHashMap::default(),
      ligature_substitution: false,
    }
  }

  /// Parses an editable face from pristine stock bytes.
  ///
  /// Extracts outlines, advances and bearings for the standard charset and
  /// captures the stock `kern` table values among those glyphs so word
  /// measurement is kern-aware for uncalibrated faces too.
  pub fn parse(stock: &StockFont) -> Result<FontFace> {
    let face = stock.face()?;

    let mut glyphs = FxHashMap::default();
    let mut glyph_ids = FxHashMap::default();

    for code in charset() {
      let Some(ch) = char::from_u32(code) else {
        continue;
      };
      let Some(glyph_id) = face.glyph_index(ch) else {
        continue;
      };
      glyph_ids.insert(code, glyph_id.0);

      let mut collector = OutlineCollector::new();
      let outline = if face.outline_glyph(glyph_id, &mut collector).is_some() {
        collector.finish()
      } else {
        GlyphOutline::default()
      };

      let advance_width = face.glyph_hor_advance(glyph_id).unwrap_or(0) as f64;
      let (left_side_bearing, right_side_bearing) = match outline.bbox() {
        Some(bbox) => (bbox.x_min, advance_width - bbox.x_max),
        None => (0.0, advance_width),
      };

      glyphs.insert(
        code,
        Glyph {
          outline,
          advance_width,
          left_side_bearing,
          right_side_bearing,
        },
      );
    }

    let kerning = capture_stock_kerning(&face, &glyph_ids);

    Ok(FontFace {
      units_per_em: face.units_per_em(),
      ascender: face.ascender(),
      glyphs,
      glyph_ids,
      kerning,
      ligature_substitution: face.tables().gsub.is_some(),
    })
  }

  pub fn glyph(&self, code: u32) -> Option<&Glyph> {
    self.glyphs.get(&code)
  }

  pub fn glyph_for_char(&self, ch: char) -> Option<&Glyph> {
    self.glyphs.get(&(ch as u32))
  }

  /// Bounding-box height of a character's outline, in font units.
  pub fn glyph_height(&self, ch: char) -> Option<f64> {
    self
      .glyph_for_char(ch)
      .and_then(|g| g.outline.bbox())
      .map(|b| b.height())
  }

  /// The x-height reference: bounding-box height of "o".
  pub fn x_height(&self) -> Option<f64> {
    self.glyph_height('o')
  }

  /// The ascender reference: bounding-box top of "A".
  pub fn cap_top(&self) -> Option<f64> {
    self
      .glyph_for_char('A')
      .and_then(|g| g.outline.bbox())
      .map(|b| b.y_max)
  }

  /// Kerning between two character codes, in font units. Zero when either
  /// character has no glyph or the pair has no entry.
  pub fn kerning_between(&self, first: u32, second: u32) -> f64 {
    let (Some(a), Some(b)) = (self.glyph_ids.get(&first), self.glyph_ids.get(&second)) else {
      return 0.0;
    };
    self.kerning.get(&(*a, *b)).copied().unwrap_or(0.0)
  }
}

/// Reads the stock `kern` table values for every glyph pair in the charset.
///
/// Only horizontal, non-variable subtables participate; the first subtable
/// that defines a pair wins.
fn capture_stock_kerning(
  face: &ttf_parser::Face<'_>,
  glyph_ids: &FxHashMap<u32, u16>,
) -> FxHashMap<(u16, u16), f64> {
  let mut kerning = FxHashMap::default();
  let Some(kern) = face.tables().kern else {
    return kerning;
  };

  let ids: Vec<u16> = glyph_ids.values().copied().collect();
  for subtable in kern.subtables {
    if !subtable.horizontal || subtable.variable {
      continue;
    }
    for &left in &ids {
      for &right in &ids {
        if let Some(value) = subtable.glyphs_kerning(GlyphId(left), GlyphId(right)) {
          if value != 0 {
            kerning.entry((left, right)).or_insert(value as f64);
          }
        }
      }
    }
  }
  kerning
}
