use std::path::Path;

use image::imageops::FilterType;
use rand::{RngExt as _, SeedableRng as _};

use crate::config::{BackgroundMode, BackgroundOptions};
use crate::error::{CoverplateError, CoverplateResult};
use crate::geometry::Rect;
use crate::panel::PanelBuffer;

/// Sigma of the fixed first blur pass applied before the configured one.
const BASE_BLUR_SIGMA: f32 = 10.0;

/// Saturation retained after the blur passes.
const SATURATION: f32 = 0.8;

/// Linear contrast/offset applied last to break up banding from the blur.
const LINEAR_SLOPE: f32 = 1.02;
const LINEAR_OFFSET: f32 = -0.01;

/// Gaussian grain parameters for solid mode.
const NOISE_MEAN: f64 = 128.0;
const NOISE_SIGMA: f64 = 5.0;

/// Produce the right-panel background buffer.
///
/// Solid mode composites a seeded gaussian-noise grain over a flat color and
/// never touches the cover image. Blur mode extracts a center-weighted region
/// of the cover, scales it to the panel and runs the blur/brightness/
/// saturation chain in f32 before quantizing back to 8-bit.
pub fn make_background(
    cover_path: &Path,
    opts: &BackgroundOptions,
    panel: Rect,
) -> CoverplateResult<PanelBuffer> {
    match opts.mode {
        BackgroundMode::Solid => solid_background(opts, panel),
        BackgroundMode::Blur => blurred_background(cover_path, opts, panel),
    }
}

fn solid_background(opts: &BackgroundOptions, panel: Rect) -> CoverplateResult<PanelBuffer> {
    let Some(color) = &opts.color else {
        return Err(CoverplateError::config(
            "solid background mode requires background.color",
        ));
    };
    let [r, g, b] = color.rgb8()?;

    let n = (panel.width as usize) * (panel.height as usize);
    let mut rgba = Vec::with_capacity(n * 4);
    for _ in 0..n {
        rgba.extend_from_slice(&[r, g, b, 255]);
    }

    let noise = gaussian_noise_plane(n, opts.noise_seed);
    for (px, &grain) in rgba.chunks_exact_mut(4).zip(noise.iter()) {
        px[0] = overlay(px[0], grain);
        px[1] = overlay(px[1], grain);
        px[2] = overlay(px[2], grain);
    }

    PanelBuffer::from_parts(panel.width, panel.height, rgba)
}

fn blurred_background(
    cover_path: &Path,
    opts: &BackgroundOptions,
    panel: Rect,
) -> CoverplateResult<PanelBuffer> {
    // Metadata first: an unreadable cover must fail the cache build before
    // any pixel work starts.
    let (src_w, src_h) = cover_dimensions(cover_path)?;

    let inset_x = (src_w as f32 * opts.zoom_percent / 100.0).round() as u32;
    let inset_y = (src_h as f32 * opts.zoom_percent / 100.0).round() as u32;
    if inset_x * 2 >= src_w || inset_y * 2 >= src_h {
        return Err(CoverplateError::asset(format!(
            "zoom of {}% leaves no pixels in a {src_w}x{src_h} cover",
            opts.zoom_percent
        )));
    }

    let img = image::open(cover_path).map_err(|e| {
        CoverplateError::asset(format!(
            "failed to read cover image '{}': {e}",
            cover_path.display()
        ))
    })?;

    let extract = img.crop_imm(inset_x, inset_y, src_w - 2 * inset_x, src_h - 2 * inset_y);
    let scaled = extract.resize_to_fill(panel.width, panel.height, FilterType::Lanczos3);

    // f32 working space for the blur/adjust chain; quantizing after every
    // stage would bake banding in.
    let mut plane = scaled.to_rgb32f().into_raw();
    plane = blur_rgb_f32(&plane, panel.width, panel.height, BASE_BLUR_SIGMA)?;
    plane = blur_rgb_f32(&plane, panel.width, panel.height, opts.blur_sigma)?;

    let brightness = opts.blur_brightness;
    let mut rgba = Vec::with_capacity(plane.len() / 3 * 4);
    for px in plane.chunks_exact(3) {
        let mut c = [px[0], px[1], px[2]];
        for v in &mut c {
            *v *= brightness;
        }
        let luma = 0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2];
        for v in &mut c {
            *v = luma + SATURATION * (*v - luma);
            *v = (*v * LINEAR_SLOPE + LINEAR_OFFSET).clamp(0.0, 1.0);
        }
        rgba.extend_from_slice(&[
            (c[0] * 255.0 + 0.5) as u8,
            (c[1] * 255.0 + 0.5) as u8,
            (c[2] * 255.0 + 0.5) as u8,
            255,
        ]);
    }

    PanelBuffer::from_parts(panel.width, panel.height, rgba)
}

/// Read the cover's native dimensions without decoding the full image.
pub fn cover_dimensions(cover_path: &Path) -> CoverplateResult<(u32, u32)> {
    image::ImageReader::open(cover_path)
        .map_err(|e| {
            CoverplateError::asset(format!(
                "failed to open cover image '{}': {e}",
                cover_path.display()
            ))
        })?
        .into_dimensions()
        .map_err(|e| {
            CoverplateError::asset(format!(
                "failed to read cover metadata '{}': {e}",
                cover_path.display()
            ))
        })
}

/// One gray noise sample per pixel, N(mean 128, sigma 5), fully determined by
/// the seed.
fn gaussian_noise_plane(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        // Box-Muller gives two independent normal samples per draw.
        let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = rng.random();
        let radius = (-2.0 * u1.ln()).sqrt();
        let theta = std::f64::consts::TAU * u2;
        for z in [radius * theta.cos(), radius * theta.sin()] {
            if out.len() < len {
                out.push((NOISE_MEAN + NOISE_SIGMA * z).round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    out
}

/// "Overlay" blend of one grain value onto a base channel.
fn overlay(base: u8, top: u8) -> u8 {
    let b = u32::from(base);
    let t = u32::from(top);
    let v = if b < 128 {
        (2 * b * t + 127) / 255
    } else {
        255 - (2 * (255 - b) * (255 - t) + 127) / 255
    };
    v.min(255) as u8
}

/// Separable gaussian blur over a straight RGB f32 buffer, clamped edges.
fn blur_rgb_f32(src: &[f32], width: u32, height: u32, sigma: f32) -> CoverplateResult<Vec<f32>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| CoverplateError::asset("blur buffer size overflow"))?;
    if src.len() != expected {
        return Err(CoverplateError::asset(
            "blur_rgb_f32 expects src matching width*height*3",
        ));
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CoverplateError::config("blur sigma must be finite and > 0"));
    }

    let kernel = gaussian_kernel(sigma);
    let mut tmp = vec![0f32; expected];
    let mut out = vec![0f32; expected];
    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil().max(1.0) as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let mut weights = Vec::with_capacity((2 * radius + 1) as usize);
    let mut sum = 0.0f64;
    for i in -radius..=radius {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights.push(w);
        sum += w;
    }
    weights.iter().map(|w| (w / sum) as f32).collect()
}

fn horizontal_pass(src: &[f32], dst: &mut [f32], width: u32, height: u32, k: &[f32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0f32; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 3;
                for c in 0..3 {
                    acc[c] += kw * src[idx + c];
                }
            }
            let out_idx = ((y * w + x) as usize) * 3;
            dst[out_idx..out_idx + 3].copy_from_slice(&acc);
        }
    }
}

fn vertical_pass(src: &[f32], dst: &mut [f32], width: u32, height: u32, k: &[f32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 3];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 3;
                for c in 0..3 {
                    acc[c] += kw * src[idx + c];
                }
            }
            let out_idx = ((y * w + x) as usize) * 3;
            dst[out_idx..out_idx + 3].copy_from_slice(&acc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HexColor;

    fn solid_opts(seed: u64) -> BackgroundOptions {
        BackgroundOptions {
            mode: BackgroundMode::Solid,
            color: Some(HexColor::new("#406080").unwrap()),
            noise_seed: seed,
            ..BackgroundOptions::default()
        }
    }

    #[test]
    fn solid_mode_without_color_is_config_error_before_io() {
        let opts = BackgroundOptions {
            mode: BackgroundMode::Solid,
            color: None,
            ..BackgroundOptions::default()
        };
        // The cover path does not exist; a config error proves no I/O ran.
        let err = make_background(Path::new("/nonexistent.png"), &opts, Rect::new(0, 0, 8, 8))
            .unwrap_err();
        assert!(err.to_string().contains("configuration error:"));
    }

    #[test]
    fn blur_mode_with_unreadable_cover_is_asset_error() {
        let opts = BackgroundOptions::default();
        let err = make_background(Path::new("/nonexistent.png"), &opts, Rect::new(0, 0, 8, 8))
            .unwrap_err();
        assert!(err.to_string().contains("asset error:"));
    }

    #[test]
    fn solid_background_is_deterministic_per_seed() {
        let panel = Rect::new(0, 0, 16, 16);
        let a = make_background(Path::new("unused.png"), &solid_opts(7), panel).unwrap();
        let b = make_background(Path::new("unused.png"), &solid_opts(7), panel).unwrap();
        let c = make_background(Path::new("unused.png"), &solid_opts(8), panel).unwrap();
        assert_eq!(a.rgba8_premul, b.rgba8_premul);
        assert_ne!(a.rgba8_premul, c.rgba8_premul);
    }

    #[test]
    fn noise_plane_is_centered_on_mean() {
        let plane = gaussian_noise_plane(10_000, 42);
        let avg = plane.iter().map(|&v| f64::from(v)).sum::<f64>() / plane.len() as f64;
        assert!((avg - 128.0).abs() < 1.0, "noise mean drifted: {avg}");
        // Grain must actually vary.
        assert!(plane.iter().any(|&v| v != plane[0]));
    }

    #[test]
    fn overlay_blend_endpoints() {
        assert_eq!(overlay(0, 200), 0);
        assert_eq!(overlay(255, 10), 255);
        // Mid-gray grain leaves the base roughly unchanged.
        let v = overlay(100, 128);
        assert!((i32::from(v) - 100).abs() <= 2);
    }

    #[test]
    fn blur_constant_image_is_identity() {
        let (w, h) = (6u32, 4u32);
        let src = vec![0.25f32; (w * h * 3) as usize];
        let out = blur_rgb_f32(&src, w, h, 2.0).unwrap();
        for (a, b) in src.iter().zip(out.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn blur_preserves_energy() {
        let (w, h) = (9u32, 9u32);
        let mut src = vec![0f32; (w * h * 3) as usize];
        let center = ((4 * w + 4) * 3) as usize;
        src[center] = 1.0;
        let out = blur_rgb_f32(&src, w, h, 1.0).unwrap();
        let sum: f32 = out.iter().step_by(3).sum();
        assert!((sum - 1.0).abs() < 1e-3);
    }

    #[test]
    fn kernel_is_normalized() {
        let k = gaussian_kernel(2.5);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(k.len() % 2, 1);
    }
}
