//! Recognition sample collections.
//!
//! The recognition collaborator reports, per page, the observed ratio
//! samples for every character code (width, height, left-bearing "cut",
//! small-caps height) and for every ordered character pair (kerning gap),
//! plus a good/warning/error classification for each character instance.
//!
//! `DocumentSamples` is the per-document aggregation context. It is
//! constructed when the first page is recognized and torn down when the
//! document closes; nothing here is process-global. Re-recognizing a page
//! replaces that page's samples wholesale so stale and current statistics
//! are never mixed.

use rustc_hash::FxHashMap;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An ordered character-code pair identifying a kerning sample bucket.
///
/// Serializes as `"70,65"` (leading code, trailing code) so diagnostics keep
/// the wire shape recognition messages use for pair keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharPair {
  /// Leading character code.
  pub first: u32,
  /// Trailing character code.
  pub second: u32,
}

impl CharPair {
  pub fn new(first: u32, second: u32) -> Self {
    Self { first, second }
  }
}

impl fmt::Display for CharPair {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{},{}", self.first, self.second)
  }
}

impl Serialize for CharPair {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

struct CharPairVisitor;

impl Visitor<'_> for CharPairVisitor {
  type Value = CharPair;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a character pair key of the form \"70,65\"")
  }

  fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<CharPair, E> {
    let (first, second) = value
      .split_once(',')
      .ok_or_else(|| E::custom(format!("missing ',' in pair key '{value}'")))?;
    let first = first
      .trim()
      .parse::<u32>()
      .map_err(|_| E::custom(format!("bad leading code in pair key '{value}'")))?;
    let second = second
      .trim()
      .parse::<u32>()
      .map_err(|_| E::custom(format!("bad trailing code in pair key '{value}'")))?;
    Ok(CharPair::new(first, second))
  }
}

impl<'de> Deserialize<'de> for CharPair {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    deserializer.deserialize_str(CharPairVisitor)
  }
}

/// Recognition quality of one character instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleQuality {
  Good,
  Warning,
  Error,
}

/// Counts of character-instance classifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityTally {
  pub good: usize,
  pub warning: usize,
  pub error: usize,
}

impl QualityTally {
  pub fn record(&mut self, quality: SampleQuality) {
    match quality {
      SampleQuality::Good => self.good += 1,
      SampleQuality::Warning => self.warning += 1,
      SampleQuality::Error => self.error += 1,
    }
  }

  pub fn merge(&mut self, other: &QualityTally) {
    self.good += other.good;
    self.warning += other.warning;
    self.error += other.error;
  }

  pub fn total(&self) -> usize {
    self.good + self.warning + self.error
  }
}

/// Ratio samples observed on a single page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSamples {
  /// Width ratios keyed by character code.
  pub widths: FxHashMap<u32, Vec<f64>>,
  /// Height ratios keyed by character code.
  pub heights: FxHashMap<u32, Vec<f64>>,
  /// Left-bearing ("cut") ratios keyed by character code.
  pub cuts: FxHashMap<u32, Vec<f64>>,
  /// Small-caps height ratios keyed by character code (capitals rendered as
  /// small caps).
  pub small_caps_heights: FxHashMap<u32, Vec<f64>>,
  /// Kerning-gap ratios keyed by ordered character pair.
  pub kerning: FxHashMap<CharPair, Vec<f64>>,
  /// Classification counts for this page's character instances.
  pub tally: QualityTally,
}

impl PageSamples {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record_width(&mut self, code: u32, ratio: f64) {
    self.widths.entry(code).or_default().push(ratio);
  }

  pub fn record_height(&mut self, code: u32, ratio: f64) {
    self.heights.entry(code).or_default().push(ratio);
  }

  pub fn record_cut(&mut self, code: u32, ratio: f64) {
    self.cuts.entry(code).or_default().push(ratio);
  }

  pub fn record_small_caps_height(&mut self, code: u32, ratio: f64) {
    self.small_caps_heights.entry(code).or_default().push(ratio);
  }

  pub fn record_kerning(&mut self, pair: CharPair, ratio: f64) {
    self.kerning.entry(pair).or_default().push(ratio);
  }

  pub fn record_quality(&mut self, quality: SampleQuality) {
    self.tally.record(quality);
  }

  /// Number of ratio samples on this page across all metric kinds.
  pub fn sample_count(&self) -> usize {
    self.widths.values().map(Vec::len).sum::<usize>()
      + self.heights.values().map(Vec::len).sum::<usize>()
      + self.cuts.values().map(Vec::len).sum::<usize>()
      + self.small_caps_heights.values().map(Vec::len).sum::<usize>()
      + self.kerning.values().map(Vec::len).sum::<usize>()
  }
}

/// Per-document aggregation context holding every recognized page's samples.
///
/// Pages are keyed by page index. Inserting an index that already exists
/// replaces that page's samples entirely.
#[derive(Debug, Clone, Default)]
pub struct DocumentSamples {
  pages: FxHashMap<u32, PageSamples>,
}

impl DocumentSamples {
  pub fn new() -> Self {
    Self::default()
  }

  /// Stores samples for `page_index`, discarding any previous samples for
  /// that page.
  pub fn set_page(&mut self, page_index: u32, samples: PageSamples) {
    self.pages.insert(page_index, samples);
  }

  /// Drops a page's samples, e.g. when its recognition was cancelled.
  pub fn remove_page(&mut self, page_index: u32) -> Option<PageSamples> {
    self.pages.remove(&page_index)
  }

  pub fn page(&self, page_index: u32) -> Option<&PageSamples> {
    self.pages.get(&page_index)
  }

  pub fn page_count(&self) -> usize {
    self.pages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.pages.is_empty()
  }

  pub fn clear(&mut self) {
    self.pages.clear();
  }

  /// Classification counts summed over the whole document.
  pub fn tally(&self) -> QualityTally {
    let mut tally = QualityTally::default();
    for page in self.pages.values() {
      tally.merge(&page.tally);
    }
    tally
  }

  /// Total ratio samples across all pages.
  pub fn sample_count(&self) -> usize {
    self.pages.values().map(PageSamples::sample_count).sum()
  }

  /// Concatenates every page's sample arrays into one array per key.
  ///
  /// Pages are visited in index order so the merged arrays are deterministic
  /// regardless of recognition completion order.
  pub(crate) fn merged(&self) -> MergedSamples {
    let mut indices: Vec<u32> = self.pages.keys().copied().collect();
    indices.sort_unstable();

    let mut merged = MergedSamples::default();
    for index in indices {
      let page = &self.pages[&index];
      extend_map(&mut merged.widths, &page.widths);
      extend_map(&mut merged.heights, &page.heights);
      extend_map(&mut merged.cuts, &page.cuts);
      extend_map(&mut merged.small_caps_heights, &page.small_caps_heights);
      extend_map(&mut merged.kerning, &page.kerning);
    }
    merged
  }
}

fn extend_map<K: Eq + std::hash::Hash + Copy>(
  into: &mut FxHashMap<K, Vec<f64>>,
  from: &FxHashMap<K, Vec<f64>>,
) {
  for (key, values) in from {
    into.entry(*key).or_default().extend_from_slice(values);
  }
}

/// Whole-document sample arrays, one per key.
#[derive(Debug, Default)]
pub(crate) struct MergedSamples {
  pub widths: FxHashMap<u32, Vec<f64>>,
  pub heights: FxHashMap<u32, Vec<f64>>,
  pub cuts: FxHashMap<u32, Vec<f64>>,
  pub small_caps_heights: FxHashMap<u32, Vec<f64>>,
  pub kerning: FxHashMap<CharPair, Vec<f64>>,
}
