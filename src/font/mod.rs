//! Font model: stock byte handles, editable faces, outlines, registration.
//!
//! The type split here is deliberate: [`StockFont`] is an immutable handle
//! over pristine font bytes, [`FontFace`] is the editable model calibration
//! produces. Calibration only accepts `StockFont` inputs, so an
//! already-calibrated face can never be fed back in and compound its own
//! adjustments.

pub mod face;
pub mod outline;
pub mod registry;

pub use face::{FontFace, Glyph, StockFont};
pub use outline::{GlyphOutline, OutlineBbox, OutlineCollector, PathCommand};
pub use registry::{FontRegistry, RegisteredFamily};
