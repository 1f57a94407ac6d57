use crate::config::{AlbumSpec, FontRole, HexColor};
use crate::error::{CoverplateError, CoverplateResult};
use crate::geometry::{FontSizes, Geometry, Spacing};

/// Which block of the image a text element belongs to.
///
/// Emission order is the z-order contract: the compositor paints elements in
/// exactly this order (corner label, artist, album, track lines, current
/// song, current artists), later entries over earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKind {
    CornerLabel,
    Artist,
    Album,
    TrackLine { index: usize },
    CurrentSong,
    CurrentArtists,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontWeight {
    Thin,
    Normal,
    Bold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// Centered within the panel width.
    Middle,
    /// Right-aligned; used by the corner label.
    End,
}

/// One positioned text block, ready for the rasterizer.
///
/// `top` is relative to the right panel's top edge; the compositor adds the
/// panel offset.
#[derive(Clone, Debug)]
pub struct TextElement {
    pub kind: TextKind,
    pub text: String,
    pub role: FontRole,
    pub size: u32,
    pub color: HexColor,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub anchor: TextAnchor,
    pub elevation: bool,
    pub top: i64,
}

/// Single- vs multi-track layout, selected once per render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutVariant {
    /// One track: no album title, no track list.
    Single,
    /// Multiple tracks: full block with album title and numbered track list.
    Album,
}

impl LayoutVariant {
    pub fn for_spec(spec: &AlbumSpec) -> Self {
        if spec.tracks.len() > 1 {
            Self::Album
        } else {
            Self::Single
        }
    }
}

/// Computes per-track text placement inside the right panel.
#[derive(Clone, Debug)]
pub struct LayoutEngine {
    geometry: Geometry,
    sizes: FontSizes,
    spacing: Spacing,
}

impl LayoutEngine {
    pub fn new(geometry: Geometry, sizes: FontSizes, spacing: Spacing) -> Self {
        Self {
            geometry,
            sizes,
            spacing,
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Total height of the centered block for the given track.
    pub fn block_height(&self, spec: &AlbumSpec, track_index: usize) -> CoverplateResult<f64> {
        let track = spec.tracks.get(track_index).ok_or_else(|| {
            CoverplateError::render(track_index + 1, "track index out of range")
        })?;
        let s = &self.sizes;
        let sp = &self.spacing;

        let mut total = f64::from(s.artist);
        if LayoutVariant::for_spec(spec) == LayoutVariant::Album {
            total += f64::from(sp.after_artist);
            total += f64::from(s.album) + f64::from(sp.section_gap);
            total += spec.tracks.len() as f64 * sp.track_line_height(s);
            total += f64::from(sp.section_gap);
        }
        total += f64::from(s.current_song);
        if !track.artists.is_empty() {
            total += f64::from(sp.before_current_artists) + f64::from(s.current_artists);
        }
        Ok(total)
    }

    /// Top edge of the centered block, relative to the right panel.
    pub fn block_top(&self, spec: &AlbumSpec, track_index: usize) -> CoverplateResult<f64> {
        let total = self.block_height(spec, track_index)?;
        Ok(f64::from(self.geometry.right_panel.height) / 2.0 - total / 2.0)
    }

    /// Compute the ordered element list for one track.
    pub fn layout(&self, spec: &AlbumSpec, track_index: usize) -> CoverplateResult<Vec<TextElement>> {
        let track = spec.tracks.get(track_index).ok_or_else(|| {
            CoverplateError::render(track_index + 1, "track index out of range")
        })?;
        let variant = LayoutVariant::for_spec(spec);
        let s = &self.sizes;
        let sp = &self.spacing;
        let colors = &spec.colors;

        let mut out = Vec::with_capacity(spec.tracks.len() + 5);

        // The corner label sits outside the centered block, pinned to the
        // canvas top-right corner.
        if spec.show_corner_label {
            out.push(TextElement {
                kind: TextKind::CornerLabel,
                text: spec.artist.clone(),
                role: FontRole::CornerLabel,
                size: s.corner_label,
                color: colors.main.clone(),
                weight: FontWeight::Normal,
                style: FontStyle::Normal,
                anchor: TextAnchor::End,
                elevation: false,
                top: i64::from(sp.corner_margin),
            });
        }

        let mut cursor = self.block_top(spec, track_index)?;

        out.push(TextElement {
            kind: TextKind::Artist,
            text: spec.artist.clone(),
            role: FontRole::Artist,
            size: s.artist,
            color: colors.main.clone(),
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            anchor: TextAnchor::Middle,
            elevation: true,
            top: cursor.round() as i64,
        });
        cursor += f64::from(s.artist);

        if variant == LayoutVariant::Album {
            cursor += f64::from(sp.after_artist);

            out.push(TextElement {
                kind: TextKind::Album,
                text: spec.album.clone(),
                role: FontRole::Album,
                size: s.album,
                color: colors.primary.clone(),
                weight: FontWeight::Thin,
                style: FontStyle::Normal,
                anchor: TextAnchor::Middle,
                elevation: false,
                top: cursor.round() as i64,
            });
            cursor += f64::from(s.album) + f64::from(sp.section_gap);

            let line_height = sp.track_line_height(s);
            for (i, t) in spec.tracks.iter().enumerate() {
                let is_current = i == track_index;
                out.push(TextElement {
                    kind: TextKind::TrackLine { index: i },
                    text: format!("{}. {}", i + 1, t.name),
                    role: FontRole::TrackList,
                    size: s.track_list,
                    color: if is_current {
                        colors.secondary.clone()
                    } else {
                        colors.main.clone()
                    },
                    weight: FontWeight::Normal,
                    style: if is_current {
                        FontStyle::Italic
                    } else {
                        FontStyle::Normal
                    },
                    anchor: TextAnchor::Middle,
                    elevation: false,
                    top: cursor.round() as i64,
                });
                cursor += line_height;
            }
            cursor += f64::from(sp.section_gap);
        }

        out.push(TextElement {
            kind: TextKind::CurrentSong,
            text: track.name.clone(),
            role: FontRole::CurrentSong,
            size: s.current_song,
            color: colors.secondary.clone(),
            weight: FontWeight::Bold,
            style: FontStyle::Normal,
            anchor: TextAnchor::Middle,
            elevation: true,
            top: cursor.round() as i64,
        });
        cursor += f64::from(s.current_song);

        if !track.artists.is_empty() {
            cursor += f64::from(sp.before_current_artists);
            out.push(TextElement {
                kind: TextKind::CurrentArtists,
                text: track.artists.join(", "),
                role: FontRole::CurrentArtists,
                size: s.current_artists,
                color: colors.main.clone(),
                weight: FontWeight::Normal,
                style: FontStyle::Normal,
                anchor: TextAnchor::Middle,
                elevation: false,
                top: cursor.round() as i64,
            });
        }

        Ok(out)
    }
}
