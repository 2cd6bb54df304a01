//! Document-level font metrics
//!
//! Reduces the raw per-page character and kerning samples to one robust
//! metrics record per document. Every entry is a median over all of a key's
//! samples across the whole document, rounded to 6 decimal places, so a
//! handful of badly recognized instances cannot skew the calibration.
//!
//! The reduction is a synchronization barrier: it must only run once every
//! page contributing to the document has been recognized. Aggregation-level
//! failures (no usable samples) halt the pipeline before any font work
//! starts; see [`crate::error::AggregateError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use fontfit::{DocumentSamples, FontMetrics};
//!
//! let mut doc = DocumentSamples::new();
//! // ... pages recorded by the recognition collaborator ...
//! let metrics = FontMetrics::from_samples(&doc, None)?;
//! println!("median width of 'a': {:?}", metrics.char_width.get(&97));
//! ```

use crate::error::AggregateError;
use crate::samples::{CharPair, DocumentSamples};
use crate::stats::{median, round6};
use log::warn;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Kerning-pair deviations below this magnitude are noise, not kerning.
const PAIR_KERNING_THRESHOLD: f64 = 0.02;

/// Small-caps height ratios outside this interval are discarded as
/// recognition artifacts.
const SMALL_CAPS_RANGE: (f64, f64) = (0.7, 1.3);

/// Sample pools at least this large reduce their medians on rayon.
const PARALLEL_REDUCTION_MIN_SAMPLES: usize = 4096;

/// Robust per-document character metrics, immutable once computed.
///
/// All ratio values are medians over the document's samples, rounded to
/// 6 decimal places. Serializable so diagnostic tooling can inspect the
/// record; pair keys keep the `"70,65"` string shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontMetrics {
  /// Median width ratio per character code.
  pub char_width: FxHashMap<u32, f64>,
  /// Median height ratio per character code.
  pub char_height: FxHashMap<u32, f64>,
  /// Median left-bearing ("cut") ratio per character code.
  pub cut_median: FxHashMap<u32, f64>,
  /// Median kerning-gap ratio per ordered character pair.
  pub pair_kerning_raw: FxHashMap<CharPair, f64>,
  /// Deviation of the kerning gap from the trailing character's cut median,
  /// kept only where the magnitude exceeds the noise threshold.
  pub pair_kerning: FxHashMap<CharPair, f64>,
  /// Median height ratio over capital letters, absent when no capital was
  /// observed.
  pub height_caps: Option<f64>,
  /// Median small-caps height ratio over capital letters; exactly 1.0 when
  /// unobserved or implausible.
  pub height_small_caps: f64,
}

impl FontMetrics {
  /// Reduces a document's sample pool to one metrics record.
  ///
  /// Gating on the classification tally happens first:
  /// - no good samples and at least one error → blocking
  ///   [`AggregateError::InsufficientData`];
  /// - no good samples, only warnings → the `previous` record is returned
  ///   unchanged when supplied, otherwise non-blocking
  ///   [`AggregateError::DegradedData`].
  ///
  /// Otherwise every key's samples are concatenated across pages and reduced
  /// to a rounded median. Pure function of its inputs.
  pub fn from_samples(
    samples: &DocumentSamples,
    previous: Option<&FontMetrics>,
  ) -> std::result::Result<FontMetrics, AggregateError> {
    let tally = samples.tally();

    if tally.good == 0 && tally.error > 0 {
      return Err(AggregateError::InsufficientData {
        errors: tally.error,
      });
    }
    if tally.good == 0 && tally.warning > 0 {
      if let Some(previous) = previous {
        warn!(
          "no good character samples ({} warnings); keeping previous metrics",
          tally.warning
        );
        return Ok(previous.clone());
      }
      warn!(
        "no good character samples ({} warnings); no previous metrics to keep",
        tally.warning
      );
      return Err(AggregateError::DegradedData {
        warnings: tally.warning,
      });
    }

    let merged = samples.merged();
    let parallel = samples.sample_count() >= PARALLEL_REDUCTION_MIN_SAMPLES;

    let char_width = reduce_medians(&merged.widths, parallel);
    let char_height = reduce_medians(&merged.heights, parallel);
    let cut_median = reduce_medians(&merged.cuts, parallel);
    let pair_kerning_raw = reduce_medians(&merged.kerning, parallel);

    let caps_samples = collect_capital_samples(&merged.heights);
    let height_caps = median(&caps_samples).map(round6);

    let small_caps_samples = collect_capital_samples(&merged.small_caps_heights);
    let height_small_caps = match median(&small_caps_samples).map(round6) {
      Some(ratio) if ratio >= SMALL_CAPS_RANGE.0 && ratio <= SMALL_CAPS_RANGE.1 => ratio,
      _ => 1.0,
    };

    let mut pair_kerning = FxHashMap::default();
    for (pair, raw) in &pair_kerning_raw {
      let Some(cut) = cut_median.get(&pair.second) else {
        continue;
      };
      let deviation = raw - cut;
      if deviation.abs() > PAIR_KERNING_THRESHOLD {
        pair_kerning.insert(*pair, round6(deviation));
      }
    }

    Ok(FontMetrics {
      char_width,
      char_height,
      cut_median,
      pair_kerning_raw,
      pair_kerning,
      height_caps,
      height_small_caps,
    })
  }
}

/// Reduces each key's sample array to its rounded median.
///
/// Keys with an empty sample array produce no entry. The parallel and serial
/// paths produce identical results; rayon only pays off on large pools.
fn reduce_medians<K>(map: &FxHashMap<K, Vec<f64>>, parallel: bool) -> FxHashMap<K, f64>
where
  K: Eq + Hash + Copy + Send + Sync,
{
  if parallel {
    map
      .par_iter()
      .filter_map(|(key, values)| median(values).map(|m| (*key, round6(m))))
      .collect()
  } else {
    map
      .iter()
      .filter_map(|(key, values)| median(values).map(|m| (*key, round6(m))))
      .collect()
  }
}

/// Flattens the samples of every capital-letter key (A-Z) into one pool.
fn collect_capital_samples(map: &FxHashMap<u32, Vec<f64>>) -> Vec<f64> {
  let mut samples = Vec::new();
  for (code, values) in map {
    let is_capital = char::from_u32(*code).is_some_and(|c| c.is_ascii_uppercase());
    if is_capital {
      samples.extend_from_slice(values);
    }
  }
  samples
}
