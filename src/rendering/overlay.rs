//! Point overlays drawn onto the composed mosaic.

use super::context::RenderContext;
use super::georef::GeoReferencer;
use crate::core::config::MarkerStyle;
use crate::data::{Overlay, Rgb};
use image::{GrayImage, Luma, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut};

/// Draws each overlay point as a translucent disc with a stronger outline.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    style: MarkerStyle,
}

impl OverlayRenderer {
    pub fn new(style: MarkerStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &MarkerStyle {
        &self.style
    }

    /// Draws every overlay in input order and returns the annotated canvas.
    ///
    /// Points outside the grid are skipped and counted in `ctx`; an overlay
    /// with no renderable points is not an error.
    pub fn draw(
        &self,
        mut canvas: RgbaImage,
        georef: &GeoReferencer,
        overlays: &[Overlay],
        ctx: &mut RenderContext,
    ) -> RgbaImage {
        let mask = MarkerMask::new(&self.style);

        for overlay in overlays {
            ctx.begin_overlay(overlay.color, overlay.name.clone());
            let fill = with_alpha(overlay.color, self.style.fill_alpha);
            let stroke = with_alpha(overlay.color, self.style.stroke_alpha);

            for point in &overlay.points {
                let Some(position) = georef.project_within(point) else {
                    log::debug!("skipping ({}, {}) outside the mosaic", point.lng, point.lat);
                    ctx.record_skipped();
                    continue;
                };
                mask.stamp(&mut canvas, position.to_pixel(), fill, stroke);
                ctx.record_marker(position, overlay.color, self.style.radius);
            }
        }

        if !overlays.is_empty() && !ctx.has_markers() {
            log::warn!("none of the {} overlays had a point inside the mosaic", overlays.len());
        }
        log::info!(
            "drew {} markers ({} outside the mosaic)",
            ctx.markers_drawn(),
            ctx.markers_skipped()
        );
        canvas
    }
}

/// Pixel coverage of one marker, rasterized once per style.
///
/// The midpoint circle routines revisit some pixels, so the shapes are drawn
/// into binary masks first and every covered canvas pixel is blended exactly
/// once per layer.
struct MarkerMask {
    half: i32,
    fill: GrayImage,
    stroke: GrayImage,
}

impl MarkerMask {
    fn new(style: &MarkerStyle) -> Self {
        let radius = style.radius as i32;
        let width = style.stroke_width as i32;
        let outer = radius + width / 2;
        let half = outer + 1;
        let side = (2 * half + 1) as u32;
        let center = (half, half);

        let mut fill = GrayImage::new(side, side);
        draw_filled_circle_mut(&mut fill, center, radius, Luma([255]));

        // Outline band centered on the disc edge.
        let mut stroke = GrayImage::new(side, side);
        if width > 0 {
            for ring in (radius - width / 2).max(1)..=outer {
                draw_hollow_circle_mut(&mut stroke, center, ring, Luma([255]));
            }
        }

        Self { half, fill, stroke }
    }

    fn stamp(&self, canvas: &mut RgbaImage, center: (i32, i32), fill: Rgba<u8>, stroke: Rgba<u8>) {
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);

        for (mx, my, covered) in self.fill.enumerate_pixels() {
            let x = center.0 - self.half + mx as i32;
            let y = center.1 - self.half + my as i32;
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            if covered[0] > 0 {
                pixel.blend(&fill);
            }
            if self.stroke.get_pixel(mx, my)[0] > 0 {
                pixel.blend(&stroke);
            }
        }
    }
}

fn with_alpha(color: Rgb, alpha: f32) -> Rgba<u8> {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([color.r, color.g, color.b, alpha])
}
