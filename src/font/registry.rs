//! In-memory registration of calibrated font families.
//!
//! The registry maps a family name to the faces the renderer may select:
//! the primary weight plus the auxiliary weight calibrated alongside it.
//! Small caps cannot be expressed as a style variant of an existing family,
//! so a synthesized small-caps face registers under its own family name,
//! `"<family> Small Caps"`.

use crate::font::face::FontFace;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// The faces registered under one family name.
#[derive(Debug, Clone)]
pub struct RegisteredFamily {
  pub primary: Arc<FontFace>,
  pub auxiliary: Option<Arc<FontFace>>,
}

/// Family-name keyed font registration.
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
  families: FxHashMap<String, RegisteredFamily>,
}

impl FontRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers (or replaces) a family. Re-optimization recreates faces from
  /// scratch, so replacement is the expected path on repeated calls.
  pub fn register(
    &mut self,
    family: impl Into<String>,
    primary: FontFace,
    auxiliary: Option<FontFace>,
  ) {
    self.families.insert(
      family.into(),
      RegisteredFamily {
        primary: Arc::new(primary),
        auxiliary: auxiliary.map(Arc::new),
      },
    );
  }

  /// Registers a synthesized small-caps face under the family's
  /// small-caps name and returns that name.
  pub fn register_small_caps(&mut self, family: &str, face: FontFace) -> String {
    let name = Self::small_caps_family(family);
    self.register(name.clone(), face, None);
    name
  }

  /// The family name a small-caps companion registers under.
  pub fn small_caps_family(family: &str) -> String {
    format!("{family} Small Caps")
  }

  pub fn family(&self, name: &str) -> Option<&RegisteredFamily> {
    self.families.get(name)
  }

  /// The primary face of a family, when registered.
  pub fn face(&self, name: &str) -> Option<&Arc<FontFace>> {
    self.families.get(name).map(|f| &f.primary)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.families.contains_key(name)
  }

  pub fn family_names(&self) -> impl Iterator<Item = &str> {
    self.families.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.families.len()
  }

  pub fn is_empty(&self) -> bool {
    self.families.is_empty()
  }
}
