use crate::core::geo::Point;
use crate::data::Rgb;

/// Drawing commands issued during one render
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Marker {
        position: Point,
        color: Rgb,
        radius: u32,
    },
}

/// Per-overlay outcome, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub color: Rgb,
    pub name: Option<String>,
    pub drawn: usize,
    pub skipped: usize,
}

/// State accumulated by one render invocation.
///
/// Created per render and passed explicitly through the overlay stage, so two
/// renders never observe each other's markers or legend.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    width: u32,
    height: u32,
    drawing_queue: Vec<DrawCommand>,
    legend: Vec<LegendEntry>,
}

impl RenderContext {
    /// Create a new render context for a canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Opens the legend entry that subsequent markers are counted against
    pub fn begin_overlay(&mut self, color: Rgb, name: Option<String>) {
        self.legend.push(LegendEntry {
            color,
            name,
            drawn: 0,
            skipped: 0,
        });
    }

    /// Record a marker drawn at a canvas position
    pub fn record_marker(&mut self, position: Point, color: Rgb, radius: u32) {
        self.drawing_queue.push(DrawCommand::Marker {
            position,
            color,
            radius,
        });
        if let Some(entry) = self.legend.last_mut() {
            entry.drawn += 1;
        }
    }

    /// Record a point that fell outside the mosaic
    pub fn record_skipped(&mut self) {
        if let Some(entry) = self.legend.last_mut() {
            entry.skipped += 1;
        }
    }

    /// Get the current drawing queue
    pub fn get_drawing_queue(&self) -> &[DrawCommand] {
        &self.drawing_queue
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    pub fn markers_drawn(&self) -> usize {
        self.legend.iter().map(|entry| entry.drawn).sum()
    }

    pub fn markers_skipped(&self) -> usize {
        self.legend.iter().map(|entry| entry.skipped).sum()
    }

    /// True when at least one overlay point was rendered
    pub fn has_markers(&self) -> bool {
        !self.drawing_queue.is_empty()
    }
}
