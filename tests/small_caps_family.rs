//! Small-caps synthesis and registration as an independently selectable
//! family.

use fontfit::{
  measure_word, register_small_caps_family, synthesize_small_caps, FontFace, FontRegistry, Glyph,
  GlyphOutline, PathCommand,
};

fn rect_glyph(x_min: f64, x_max: f64, y_min: f64, y_max: f64, advance: f64) -> Glyph {
  Glyph {
    outline: GlyphOutline::new(vec![
      PathCommand::MoveTo { x: x_min, y: y_min },
      PathCommand::LineTo { x: x_max, y: y_min },
      PathCommand::LineTo { x: x_max, y: y_max },
      PathCommand::LineTo { x: x_min, y: y_max },
      PathCommand::Close,
    ]),
    advance_width: advance,
    left_side_bearing: x_min,
    right_side_bearing: advance - x_max,
  }
}

/// upem 2000; "o" 1000 tall, caps 1250 tall and 1250 wide.
fn calibrated_face() -> FontFace {
  let mut face = FontFace::empty(2000, 1600);
  let glyphs: [(char, u16, Glyph); 4] = [
    ('o', 1, rect_glyph(100.0, 900.0, 0.0, 1000.0, 1000.0)),
    ('A', 2, rect_glyph(0.0, 1250.0, 0.0, 1250.0, 1300.0)),
    ('N', 3, rect_glyph(50.0, 1200.0, 0.0, 1250.0, 1250.0)),
    ('n', 4, rect_glyph(80.0, 920.0, 0.0, 1000.0, 1040.0)),
  ];
  for (ch, id, glyph) in glyphs {
    face.glyph_ids.insert(ch as u32, id);
    face.glyphs.insert(ch as u32, glyph);
  }
  face.ligature_substitution = true;
  face
}

#[test]
fn lowercase_letters_become_scaled_capitals() {
  let face = calibrated_face();
  // mult = 1000 * 1.0 / 1250 = 0.8
  let small_caps = synthesize_small_caps(&face, 1.0).unwrap();

  let a = &small_caps.glyphs[&('a' as u32)];
  assert_eq!(a.outline.bbox().unwrap().y_max, 1000.0); // round(1250 * 0.8)
  assert_eq!(a.advance_width, 1040.0); // round(1300 * 0.8)

  // "n" had an uppercase partner, so its slot is replaced too.
  let n = &small_caps.glyphs[&('n' as u32)];
  assert_eq!(n.outline.bbox().unwrap().y_max, 1000.0);
  assert_eq!(n.advance_width, 1000.0); // round(1250 * 0.8)
}

#[test]
fn observed_ratio_scales_the_copies() {
  let face = calibrated_face();
  // mult = 1000 * 0.9 / 1250 = 0.72
  let small_caps = synthesize_small_caps(&face, 0.9).unwrap();
  let a = &small_caps.glyphs[&('a' as u32)];
  assert_eq!(a.outline.bbox().unwrap().y_max, 900.0); // round(1250 * 0.72)
}

#[test]
fn synthesized_face_drops_ligature_substitution() {
  let face = calibrated_face();
  assert!(face.ligature_substitution);
  let small_caps = synthesize_small_caps(&face, 1.0).unwrap();
  assert!(!small_caps.ligature_substitution);
}

#[test]
fn registered_family_is_selectable_for_measurement() {
  let mut registry = FontRegistry::new();
  let face = calibrated_face();
  registry.register("Document Serif", face.clone(), None);
  let name = register_small_caps_family(&mut registry, "Document Serif", &face, 1.0).unwrap();
  assert_eq!(name, "Document Serif Small Caps");

  let small_caps = registry.face("Document Serif Small Caps").unwrap();
  let regular = registry.face("Document Serif").unwrap();

  // The small-caps face draws "n" wider than the regular lowercase "n":
  // it is a 0.8-scaled capital N, not the lowercase form.
  let sc = measure_word("n", small_caps, 20.0);
  let lc = measure_word("n", regular, 20.0);
  assert!(sc.visual_width > lc.visual_width);

  // Both families stay registered side by side.
  assert_eq!(registry.len(), 2);
}
