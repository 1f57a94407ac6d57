//! Coverplate renders a fixed-layout promotional image for each track of a
//! music album: the cover on the left, a background derived from that cover
//! (or a flat color with grain) on the right, and a vertically centered text
//! block naming the artist, album, track list and current track.
//!
//! # Pipeline overview
//!
//! 1. **Cache**: the cover panel and background panel are prepared once per
//!    album ([`CoverCache::build`]) and shared read-only by every render.
//! 2. **Layout**: [`LayoutEngine`] turns an [`AlbumSpec`] plus a track index
//!    into an ordered list of positioned [`TextElement`]s.
//! 3. **Rasterize**: each element becomes a standalone SVG fragment drawn
//!    through `resvg` with an explicit font database.
//! 4. **Compose**: [`compose`] stacks the panels and text layers in a fixed
//!    z-order and the result is encoded as lossless PNG.
//! 5. **Batch**: [`AlbumRenderer::generate_album`] runs per-track renders in
//!    bounded concurrent groups against the shared cache.
//!
//! Determinism: for a given spec (including the noise seed) the produced
//! pixels are stable; filenames are `NN-slug.png` derived from track names.
#![forbid(unsafe_code)]

mod background;
mod batch;
mod cache;
mod compose;
mod config;
mod error;
mod geometry;
mod layout;
mod panel;
mod slug;
mod text;
mod video;

pub use background::{cover_dimensions, make_background};
pub use batch::{AlbumRenderer, BatchOptions, BatchReport, track_filename};
pub use cache::CoverCache;
pub use compose::{TextLayer, compose, write_png};
pub use config::{
    AlbumSpec, BackgroundMode, BackgroundOptions, FontRole, FontSet, FontSpec, HexColor, Palette,
    TrackSpec,
};
pub use error::{CoverplateError, CoverplateResult};
pub use geometry::{Canvas, FontSizes, Geometry, Rect, Spacing};
pub use layout::{
    FontStyle, FontWeight, LayoutEngine, LayoutVariant, TextAnchor, TextElement, TextKind,
};
pub use panel::{PanelBuffer, prepare_cover};
pub use slug::slugify;
pub use text::{build_fontdb, escape_markup, rasterize_fragment, svg_fragment};
pub use video::{VideoJob, encode_track_video, generate_album_videos};
