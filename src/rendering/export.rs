//! Page export: the annotated raster as a PNG plus a single-page PDF.

use super::planner::PageSpec;
use crate::core::config::OutputConfig;
use crate::core::constants::PAGE_MARGIN;
use crate::{MapError, Result};
use chrono::{DateTime, Local};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Files produced by one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub pdf_path: PathBuf,
    pub png_path: PathBuf,
    pub page: PageSpec,
}

/// Where the raster lands on the page, in page units with a bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Top-left aligned and unscaled, or shrunk into the page margins when
    /// `fit` is set and the raster is wider than the printable area.
    pub fn on_page(image: (u32, u32), page: &PageSpec, fit: bool) -> Self {
        let (page_w, page_h) = (page.width_px as f64, page.height_px as f64);
        let (img_w, img_h) = (image.0 as f64, image.1 as f64);
        let margin = PAGE_MARGIN as f64;

        if fit && img_w > page_w - 2.0 * margin {
            let scale = ((page_w - 2.0 * margin) / img_w).min((page_h - 2.0 * margin) / img_h);
            let (width, height) = (img_w * scale, img_h * scale);
            return Self {
                x: margin,
                y: page_h - margin - height,
                width,
                height,
            };
        }

        Self {
            x: 0.0,
            y: page_h - img_h,
            width: img_w,
            height: img_h,
        }
    }
}

/// Writes rendered canvases to the output directory under timestamped names.
#[derive(Debug, Clone)]
pub struct PageExporter {
    output_dir: PathBuf,
    fit_to_page: bool,
}

impl PageExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fit_to_page: false,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.output_dir.clone()).with_fit_to_page(config.fit_to_page)
    }

    pub fn with_fit_to_page(mut self, fit: bool) -> Self {
        self.fit_to_page = fit;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Exports `canvas` named after the current local time.
    pub fn export(&self, canvas: &RgbaImage, page: &PageSpec) -> Result<Artifact> {
        self.export_at(canvas, page, Local::now())
    }

    /// Exports `canvas` named after `timestamp`, to one-second resolution.
    ///
    /// An existing artifact is never overwritten; a `-N` suffix is appended
    /// to the name instead.
    pub fn export_at(
        &self,
        canvas: &RgbaImage,
        page: &PageSpec,
        timestamp: DateTime<Local>,
    ) -> Result<Artifact> {
        let png = encode_png(canvas)?;
        let placement = Placement::on_page(canvas.dimensions(), page, self.fit_to_page);
        let pdf = build_pdf(canvas, page, &placement)?;

        std::fs::create_dir_all(&self.output_dir)?;
        let base = timestamp.format("%Y-%m-%d_%H-%M-%S").to_string();

        let mut attempt = 0;
        loop {
            let stem = match attempt {
                0 => base.clone(),
                n => format!("{base}-{n}"),
            };
            let pdf_path = self.output_dir.join(format!("{stem}.pdf"));
            let png_path = self.output_dir.join(format!("{stem}.png"));
            attempt += 1;
            if png_path.exists() {
                continue;
            }

            match self.write_new(&pdf_path, &pdf) {
                Ok(()) => {}
                Err(MapError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
            if let Err(e) = self.write_new(&png_path, &png) {
                let _ = std::fs::remove_file(&pdf_path);
                return Err(e);
            }

            log::info!(
                "exported {:?} {:?} page to {}",
                page.size,
                page.orientation,
                pdf_path.display()
            );
            return Ok(Artifact {
                pdf_path,
                png_path,
                page: *page,
            });
        }
    }

    /// Writes through a temp file in the output directory, then links it
    /// into place only if `target` does not exist yet.
    fn write_new(&self, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.output_dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist_noclobber(target).map_err(|e| e.error)?;
        Ok(())
    }
}

fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        ColorType::Rgba8,
    )?;
    Ok(buf)
}

/// RGB samples with transparency composited over white.
fn flatten_on_white(canvas: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(canvas.width() as usize * canvas.height() as usize * 3);
    for pixel in canvas.pixels() {
        let [r, g, b, a] = pixel.0;
        let a = a as u32;
        for c in [r, g, b] {
            rgb.push(((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8);
        }
    }
    rgb
}

fn build_pdf(canvas: &RgbaImage, page: &PageSpec, placement: &Placement) -> Result<Vec<u8>> {
    let pdf_error = |e: lopdf::Error| MapError::Pdf(e.to_string());

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => canvas.width() as i64,
            "Height" => canvas.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        flatten_on_white(canvas),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(placement.width as _),
                    0.into(),
                    0.into(),
                    Object::Real(placement.height as _),
                    Object::Real(placement.x as _),
                    Object::Real(placement.y as _),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().map_err(pdf_error)?,
    ));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im0" => image_id,
        },
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            (page.width_px as i64).into(),
            (page.height_px as i64).into(),
        ],
        "Contents" => content_id,
        "Resources" => resources_id,
    });

    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        },
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| MapError::Pdf(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::planner::{Orientation, PageSize};
    use chrono::TimeZone;
    use image::Rgba;

    fn stamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(512, 256, Rgba([20, 40, 60, 255]))
    }

    #[test]
    fn test_placement_defaults_to_top_left_unscaled() {
        let page = PageSize::Letter.spec(Orientation::Portrait);
        let placement = Placement::on_page((1536, 2048), &page, false);
        assert_eq!(placement.x, 0.0);
        assert_eq!(placement.width, 1536.0);
        assert_eq!(placement.y, 1650.0 - 2048.0);
    }

    #[test]
    fn test_fit_to_page_respects_margins() {
        let page = PageSize::Letter.spec(Orientation::Portrait);
        let placement = Placement::on_page((1536, 2048), &page, true);
        assert!(placement.width <= 1275.0 - 40.0 + 1e-9);
        assert!(placement.height <= 1650.0 - 40.0 + 1e-9);
        assert_eq!(placement.x, 20.0);
        assert!((placement.y + placement.height - (1650.0 - 20.0)).abs() < 1e-9);

        let small = Placement::on_page((256, 256), &page, true);
        assert_eq!(small.width, 256.0);
    }

    #[test]
    fn test_flatten_composites_over_white() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        assert_eq!(flatten_on_white(&image), vec![255, 255, 255, 10, 20, 30]);
    }

    #[test]
    fn test_export_writes_pdf_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = PageExporter::new(dir.path().join("out"));
        let page = PageSize::Letter.spec(Orientation::Portrait);

        let artifact = exporter.export_at(&canvas(), &page, stamp()).unwrap();

        assert_eq!(
            artifact.pdf_path.file_name().unwrap().to_str().unwrap(),
            "2024-03-09_14-05-07.pdf"
        );
        let pdf = std::fs::read(&artifact.pdf_path).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.4"));
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        let page_id = *doc.get_pages().values().next().unwrap();
        let media_box: Vec<i64> = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        assert_eq!(media_box, vec![0, 0, 1275, 1650]);

        let png = image::open(&artifact.png_path).unwrap();
        assert_eq!((png.width(), png.height()), (512, 256));
        assert_eq!(artifact.page, page);
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = PageExporter::new(dir.path());
        let page = PageSize::Tabloid.spec(Orientation::Landscape);

        let first = exporter.export_at(&canvas(), &page, stamp()).unwrap();
        let second = exporter.export_at(&canvas(), &page, stamp()).unwrap();

        assert_ne!(first.pdf_path, second.pdf_path);
        assert!(second
            .pdf_path
            .to_string_lossy()
            .ends_with("2024-03-09_14-05-07-1.pdf"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }

    #[test]
    fn test_unwritable_output_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let exporter = PageExporter::new(blocker.join("nested"));
        let page = PageSize::Letter.spec(Orientation::Portrait);

        assert!(exporter.export_at(&canvas(), &page, stamp()).is_err());
    }
}
