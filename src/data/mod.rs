pub mod request;

pub use request::{Overlay, RenderRequest, Rgb};
