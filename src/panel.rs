use std::path::Path;
use std::sync::Arc;

use image::imageops::FilterType;

use crate::error::{CoverplateError, CoverplateResult};
use crate::geometry::Rect;

/// A prepared raster buffer sized to a destination panel.
///
/// Pixels are premultiplied RGBA8, row-major, tightly packed. Buffers are
/// built once and shared read-only across concurrent per-track renders.
#[derive(Clone, Debug)]
pub struct PanelBuffer {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PanelBuffer {
    pub fn from_parts(width: u32, height: u32, rgba8_premul: Vec<u8>) -> CoverplateResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| CoverplateError::asset("panel buffer size overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(CoverplateError::asset(
                "panel buffer length must be width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Wrap a straight-alpha RGBA image, premultiplying in place.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut raw = img.into_raw();
        premultiply_rgba8_in_place(&mut raw);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(raw),
        }
    }
}

/// Resize the album cover to exactly the cover-panel dimensions.
///
/// "Cover" fit: fill the panel, crop overflow, centered. No aspect-ratio
/// distortion.
pub fn prepare_cover(cover_path: &Path, panel: Rect) -> CoverplateResult<PanelBuffer> {
    let img = image::open(cover_path).map_err(|e| {
        CoverplateError::asset(format!(
            "failed to read cover image '{}': {e}",
            cover_path.display()
        ))
    })?;
    let resized = img
        .resize_to_fill(panel.width, panel.height, FilterType::Lanczos3)
        .to_rgba8();
    Ok(PanelBuffer::from_rgba_image(resized))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        px[0] = ((u16::from(px[0]) * a + 127) / 255) as u8;
        px[1] = ((u16::from(px[1]) * a + 127) / 255) as u8;
        px[2] = ((u16::from(px[2]) * a + 127) / 255) as u8;
    }
}
