use crate::background::make_background;
use crate::config::AlbumSpec;
use crate::error::CoverplateResult;
use crate::geometry::Geometry;
use crate::panel::{PanelBuffer, prepare_cover};

/// The prepared cover and background buffers for one album.
///
/// Built exactly once per album generation and shared read-only by every
/// concurrent per-track render. Any failure in either sub-task fails the
/// whole build, before any per-track work starts.
#[derive(Clone, Debug)]
pub struct CoverCache {
    pub cover: PanelBuffer,
    pub background: PanelBuffer,
}

impl CoverCache {
    #[tracing::instrument(skip(spec, geometry), fields(album = %spec.album))]
    pub fn build(spec: &AlbumSpec, geometry: &Geometry) -> CoverplateResult<Self> {
        // The two preparations are independent; run them side by side.
        let (cover, background) = rayon::join(
            || prepare_cover(&spec.cover, geometry.cover_panel),
            || make_background(&spec.cover, &spec.background, geometry.right_panel),
        );
        let cache = Self {
            cover: cover?,
            background: background?,
        };
        tracing::debug!(
            cover_px = cache.cover.rgba8_premul.len() / 4,
            background_px = cache.background.rgba8_premul.len() / 4,
            "cover cache ready"
        );
        Ok(cache)
    }
}
