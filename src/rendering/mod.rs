pub mod context;
pub mod export;
pub mod georef;
pub mod mosaic;
pub mod overlay;
pub mod pipeline;
pub mod planner;

// Re-export main types
pub use context::{DrawCommand, LegendEntry, RenderContext};
pub use export::{Artifact, PageExporter, Placement};
pub use georef::GeoReferencer;
pub use mosaic::{Grid, GridCell, Mosaic};
pub use overlay::OverlayRenderer;
pub use pipeline::{RenderOutput, ReportRenderer};
pub use planner::{GridPlan, Orientation, PageSize, PageSpec, TileRange};
