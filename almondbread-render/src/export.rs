//! PNG export with embedded metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use almondbread_core::GridSettings;

use crate::buffer::PixelBuffer;
use crate::gradient::BuiltinScheme;

/// Metadata to embed in an exported PNG as tEXt chunks.
pub struct ExportMetadata {
    pub name: String,
    pub settings: GridSettings,
    pub scheme: BuiltinScheme,
}

/// Write a pixel buffer as an 8-bit RGBA PNG with embedded view metadata.
///
/// Uses the `png` crate directly (rather than `image`) to inject custom tEXt
/// chunks readable by exiftool and most image viewers.
pub fn export_png(
    buffer: &PixelBuffer,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    encoder.add_text_chunk("Software".to_string(), "AlmondBread".to_string())?;
    encoder.add_text_chunk("Description".to_string(), build_description(metadata))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&buffer.pixels)?;
    png_writer.finish()?;

    debug!(
        "Exported PNG {}x{} to {}",
        buffer.width,
        buffer.height,
        path.display()
    );
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    let s = &meta.settings;
    format!(
        "{} - Center: {} {}i, Extent: {:e} x {:e}, Pixel size: {:e}, Iterations: {}",
        meta.name,
        s.center_x,
        s.center_y,
        s.complex_width(),
        s.complex_height(),
        s.pixel_size,
        s.max_iterations,
    )
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    let s = &meta.settings;
    vec![
        ("AlmondBread.Name".into(), meta.name.clone()),
        ("AlmondBread.CenterX".into(), s.center_x.to_string()),
        ("AlmondBread.CenterY".into(), s.center_y.to_string()),
        ("AlmondBread.PixelSize".into(), s.pixel_size.to_string()),
        ("AlmondBread.MaxIterations".into(), s.max_iterations.to_string()),
        ("AlmondBread.Scheme".into(), meta.scheme.name().to_string()),
        ("AlmondBread.Resolution".into(), format!("{}x{}", s.width, s.height)),
        (
            "AlmondBread.Extent".into(),
            format!("{}x{}", s.complex_width(), s.complex_height()),
        ),
    ]
}
