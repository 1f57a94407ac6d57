use crate::error::{CoverplateError, CoverplateResult};

/// Axis-aligned pixel rectangle, `(x, y)` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

/// Fixed canvas/panel split used for every rendered image.
///
/// The canvas is divided into a square cover panel on the left and a text
/// panel on the right; the text area is the inset region of the right panel
/// that text is allowed to occupy. [`Geometry::default`] carries the
/// production 4K dimensions; tests construct smaller geometries and run the
/// identical pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    pub canvas: Canvas,
    pub cover_panel: Rect,
    pub right_panel: Rect,
    pub text_area: Rect,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 3840,
                height: 2160,
            },
            cover_panel: Rect::new(0, 0, 2160, 2160),
            right_panel: Rect::new(2160, 0, 1680, 2160),
            text_area: Rect::new(2280, 120, 1440, 1920),
        }
    }
}

impl Geometry {
    /// Check the panel-split invariants: the two panels tile the canvas
    /// horizontally and share its full height.
    pub fn validate(&self) -> CoverplateResult<()> {
        if self.cover_panel.width + self.right_panel.width != self.canvas.width {
            return Err(CoverplateError::config(
                "cover panel width + right panel width must equal canvas width",
            ));
        }
        if self.cover_panel.height != self.canvas.height
            || self.right_panel.height != self.canvas.height
        {
            return Err(CoverplateError::config(
                "both panels must span the full canvas height",
            ));
        }
        if self.cover_panel.x != 0 || self.right_panel.x != self.cover_panel.width {
            return Err(CoverplateError::config(
                "panels must tile the canvas left to right without gaps",
            ));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(CoverplateError::config("canvas dimensions must be non-zero"));
        }
        Ok(())
    }
}

/// Font pixel sizes per text role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FontSizes {
    pub artist: u32,
    pub album: u32,
    pub track_list: u32,
    pub current_song: u32,
    pub current_artists: u32,
    pub corner_label: u32,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            artist: 140,
            album: 130,
            track_list: 80,
            current_song: 160,
            current_artists: 90,
            corner_label: 64,
        }
    }
}

/// Vertical gaps between the text blocks.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Spacing {
    /// Gap after the artist line; applied in album mode only.
    pub after_artist: u32,
    /// Gap after the album title and after the track list.
    pub section_gap: u32,
    /// Gap between the current song title and its credited artists.
    pub before_current_artists: u32,
    /// Track list line height as a multiple of the track-list font size.
    pub track_line_factor: f64,
    /// Distance of the corner label from the canvas top/right edges.
    pub corner_margin: u32,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            after_artist: 60,
            section_gap: 120,
            before_current_artists: 30,
            track_line_factor: 1.8,
            corner_margin: 60,
        }
    }
}

impl Spacing {
    pub fn track_line_height(&self, sizes: &FontSizes) -> f64 {
        f64::from(sizes.track_list) * self.track_line_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_is_valid() {
        let g = Geometry::default();
        g.validate().unwrap();
        assert_eq!(g.canvas.width, 3840);
        assert_eq!(g.canvas.height, 2160);
        assert_eq!(g.cover_panel, Rect::new(0, 0, 2160, 2160));
        assert_eq!(g.right_panel, Rect::new(2160, 0, 1680, 2160));
    }

    #[test]
    fn panel_split_invariant_is_enforced() {
        let mut g = Geometry::default();
        g.right_panel.width = 1000;
        assert!(g.validate().is_err());

        let mut g = Geometry::default();
        g.cover_panel.height = 2000;
        assert!(g.validate().is_err());
    }

    #[test]
    fn track_line_height_uses_factor() {
        let sizes = FontSizes::default();
        let spacing = Spacing::default();
        assert_eq!(spacing.track_line_height(&sizes), 80.0 * 1.8);
    }
}
