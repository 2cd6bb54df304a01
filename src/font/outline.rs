//! Glyph outline model and construction.
//!
//! Outlines are ordered lists of tagged path commands in font design units
//! (y-up). They are collected from `ttf-parser` via the `OutlineBuilder`
//! trait and stay editable so calibration can rewrite coordinates in place.
//! Bounding boxes include curve control points, matching how the per-glyph
//! metrics the statistics were gathered against are computed.

use ttf_parser::OutlineBuilder;

/// One outline drawing command.
///
/// Each variant carries exactly the coordinate fields it needs; transform
/// logic dispatches per variant instead of probing optional fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
  MoveTo { x: f64, y: f64 },
  LineTo { x: f64, y: f64 },
  QuadTo { x1: f64, y1: f64, x: f64, y: f64 },
  CurveTo { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
  Close,
}

/// Bounding box of an outline in font units (y-up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineBbox {
  pub x_min: f64,
  pub y_min: f64,
  pub x_max: f64,
  pub y_max: f64,
}

impl OutlineBbox {
  pub fn width(&self) -> f64 {
    self.x_max - self.x_min
  }

  pub fn height(&self) -> f64 {
    self.y_max - self.y_min
  }
}

/// An editable glyph outline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOutline {
  pub commands: Vec<PathCommand>,
}

impl GlyphOutline {
  pub fn new(commands: Vec<PathCommand>) -> Self {
    Self { commands }
  }

  pub fn is_empty(&self) -> bool {
    self.commands.is_empty()
  }

  /// Bounding box over every coordinate, control points included.
  ///
  /// Returns `None` when the outline has no coordinates or any extent is
  /// non-finite.
  pub fn bbox(&self) -> Option<OutlineBbox> {
    let mut x_min = f64::INFINITY;
    let mut y_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    let mut any = false;

    let mut visit = |x: f64, y: f64| {
      any = true;
      x_min = x_min.min(x);
      y_min = y_min.min(y);
      x_max = x_max.max(x);
      y_max = y_max.max(y);
    };

    for command in &self.commands {
      match *command {
        PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => visit(x, y),
        PathCommand::QuadTo { x1, y1, x, y } => {
          visit(x1, y1);
          visit(x, y);
        }
        PathCommand::CurveTo {
          x1,
          y1,
          x2,
          y2,
          x,
          y,
        } => {
          visit(x1, y1);
          visit(x2, y2);
          visit(x, y);
        }
        PathCommand::Close => {}
      }
    }

    if !any {
      return None;
    }
    if !(x_min.is_finite() && y_min.is_finite() && x_max.is_finite() && y_max.is_finite()) {
      return None;
    }
    Some(OutlineBbox {
      x_min,
      y_min,
      x_max,
      y_max,
    })
  }

  /// Rewrites every x coordinate (end points and control points) with `f`.
  pub fn map_x(&mut self, f: impl Fn(f64) -> f64) {
    for command in &mut self.commands {
      match command {
        PathCommand::MoveTo { x, .. } | PathCommand::LineTo { x, .. } => *x = f(*x),
        PathCommand::QuadTo { x1, x, .. } => {
          *x1 = f(*x1);
          *x = f(*x);
        }
        PathCommand::CurveTo { x1, x2, x, .. } => {
          *x1 = f(*x1);
          *x2 = f(*x2);
          *x = f(*x);
        }
        PathCommand::Close => {}
      }
    }
  }

  /// Rewrites every y coordinate (end points and control points) with `f`.
  pub fn map_y(&mut self, f: impl Fn(f64) -> f64) {
    for command in &mut self.commands {
      match command {
        PathCommand::MoveTo { y, .. } | PathCommand::LineTo { y, .. } => *y = f(*y),
        PathCommand::QuadTo { y1, y, .. } => {
          *y1 = f(*y1);
          *y = f(*y);
        }
        PathCommand::CurveTo { y1, y2, y, .. } => {
          *y1 = f(*y1);
          *y2 = f(*y2);
          *y = f(*y);
        }
        PathCommand::Close => {}
      }
    }
  }
}

/// Collects ttf-parser outline callbacks into a [`GlyphOutline`].
pub struct OutlineCollector {
  commands: Vec<PathCommand>,
}

impl OutlineCollector {
  pub fn new() -> Self {
    Self {
      commands: Vec::new(),
    }
  }

  pub fn finish(self) -> GlyphOutline {
    GlyphOutline::new(self.commands)
  }
}

impl Default for OutlineCollector {
  fn default() -> Self {
    Self::new()
  }
}

impl OutlineBuilder for OutlineCollector {
  fn move_to(&mut self, x: f32, y: f32) {
    self.commands.push(PathCommand::MoveTo {
      x: x as f64,
      y: y as f64,
    });
  }

  fn line_to(&mut self, x: f32, y: f32) {
    self.commands.push(PathCommand::LineTo {
      x: x as f64,
      y: y as f64,
    });
  }

  fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
    self.commands.push(PathCommand::QuadTo {
      x1: x1 as f64,
      y1: y1 as f64,
      x: x as f64,
      y: y as f64,
    });
  }

  fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
    self.commands.push(PathCommand::CurveTo {
      x1: x1 as f64,
      y1: y1 as f64,
      x2: x2 as f64,
      y2: y2 as f64,
      x: x as f64,
      y: y as f64,
    });
  }

  fn close(&mut self) {
    self.commands.push(PathCommand::Close);
  }
}
