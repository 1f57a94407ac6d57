use std::path::Path;

use anyhow::Context as _;

use crate::cache::CoverCache;
use crate::error::{CoverplateError, CoverplateResult};
use crate::geometry::Geometry;
use crate::panel::PanelBuffer;

/// A rasterized text fragment plus its placement on the canvas.
#[derive(Clone, Debug)]
pub struct TextLayer {
    pub buffer: PanelBuffer,
    pub top: i64,
    pub left: i64,
}

/// Stack cover, background and text layers onto a blank canvas.
///
/// Draw order is fixed: cover panel, background panel, then the text layers
/// in list order. List order is the z-order; the layout engine emits accent
/// elements last so they are never occluded.
pub fn compose(
    geometry: &Geometry,
    cache: &CoverCache,
    text_layers: &[TextLayer],
) -> CoverplateResult<image::RgbaImage> {
    let w = geometry.canvas.width;
    let h = geometry.canvas.height;

    // Opaque black base; everything below the text is opaque, so the result
    // stays straight-alpha-equivalent after premultiplied blending.
    let mut canvas = vec![0u8; (w as usize) * (h as usize) * 4];
    for px in canvas.chunks_exact_mut(4) {
        px[3] = 255;
    }

    blit_over(
        &mut canvas,
        w,
        h,
        &cache.cover,
        i64::from(geometry.cover_panel.x),
        i64::from(geometry.cover_panel.y),
    );
    blit_over(
        &mut canvas,
        w,
        h,
        &cache.background,
        i64::from(geometry.right_panel.x),
        i64::from(geometry.right_panel.y),
    );
    for layer in text_layers {
        blit_over(&mut canvas, w, h, &layer.buffer, layer.left, layer.top);
    }

    image::RgbaImage::from_raw(w, h, canvas)
        .ok_or_else(|| CoverplateError::asset("composed canvas has inconsistent dimensions"))
}

/// Source-over blit of a premultiplied buffer at `(left, top)`, clipped to
/// the canvas.
fn blit_over(dst: &mut [u8], dst_w: u32, dst_h: u32, src: &PanelBuffer, left: i64, top: i64) {
    let src_px = src.rgba8_premul.as_slice();
    for sy in 0..i64::from(src.height) {
        let dy = top + sy;
        if dy < 0 || dy >= i64::from(dst_h) {
            continue;
        }
        for sx in 0..i64::from(src.width) {
            let dx = left + sx;
            if dx < 0 || dx >= i64::from(dst_w) {
                continue;
            }
            let si = ((sy * i64::from(src.width) + sx) as usize) * 4;
            let di = ((dy * i64::from(dst_w) + dx) as usize) * 4;
            let sa = src_px[si + 3];
            if sa == 0 {
                continue;
            }
            if sa == 255 {
                dst[di..di + 4].copy_from_slice(&src_px[si..si + 4]);
                continue;
            }
            let inv = 255u16 - u16::from(sa);
            for c in 0..4 {
                let blended =
                    u16::from(src_px[si + c]) + mul_div255(u16::from(dst[di + c]), inv);
                dst[di + c] = blended.min(255) as u8;
            }
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Encode the composed canvas losslessly.
pub fn write_png(img: &image::RgbaImage, path: &Path) -> CoverplateResult<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
