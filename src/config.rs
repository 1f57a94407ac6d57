use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::{CoverplateError, CoverplateResult};

/// A complete album description.
///
/// This is a pure serde data model (JSON on disk). Deserialization is
/// lenient; [`AlbumSpec::validate`] is the single gate everything else in the
/// crate trusts, and it runs before any file I/O.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AlbumSpec {
    pub artist: String,
    pub album: String,
    /// Path to the source cover image.
    pub cover: PathBuf,
    pub colors: Palette,
    #[serde(default)]
    pub background: BackgroundOptions,
    /// Ordered tracks; at least one is required.
    pub tracks: Vec<TrackSpec>,
    #[serde(default)]
    pub fonts: FontSet,
    /// Render the corner label (artist name, top right of the canvas).
    #[serde(default = "default_true")]
    pub show_corner_label: bool,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TrackSpec {
    pub name: String,
    /// Credited artists for this track; may be empty.
    #[serde(default)]
    pub artists: Vec<String>,
    /// Audio file used by video mode; ignored for image generation.
    #[serde(default)]
    pub audio: Option<PathBuf>,
}

/// The three accent colors: main text, primary accent, secondary accent.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Palette {
    pub main: HexColor,
    pub primary: HexColor,
    pub secondary: HexColor,
}

/// A `#rrggbb` color. Checked by [`HexColor::validate`], not at parse time.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    pub fn new(value: impl Into<String>) -> CoverplateResult<Self> {
        let color = Self(value.into());
        color.validate()?;
        Ok(color)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn validate(&self) -> CoverplateResult<()> {
        let s = &self.0;
        let ok = s.len() == 7
            && s.starts_with('#')
            && s[1..].bytes().all(|b| b.is_ascii_hexdigit());
        if !ok {
            return Err(CoverplateError::config(format!(
                "'{s}' is not a valid hex color (expected e.g. #4a9eff)"
            )));
        }
        Ok(())
    }

    pub fn rgb8(&self) -> CoverplateResult<[u8; 3]> {
        self.validate()?;
        let parse = |range| {
            u8::from_str_radix(&self.0[range], 16)
                .map_err(|e| CoverplateError::config(format!("hex color parse: {e}")))
        };
        Ok([parse(1..3)?, parse(3..5)?, parse(5..7)?])
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BackgroundMode {
    /// Derive the background from the cover: zoomed extract, blurred and
    /// dimmed.
    #[default]
    Blur,
    /// Flat color with a procedural noise grain; ignores the cover.
    Solid,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundOptions {
    #[serde(default)]
    pub mode: BackgroundMode,
    /// Percentage of each cover edge cropped away before scaling, pushing the
    /// extract toward the image center.
    #[serde(default = "default_zoom_percent")]
    pub zoom_percent: f32,
    /// Sigma of the second, configurable blur pass.
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
    /// Brightness multiplier applied after blurring, `0.0..=2.0`.
    #[serde(default = "default_blur_brightness")]
    pub blur_brightness: f32,
    /// Required when `mode` is [`BackgroundMode::Solid`].
    #[serde(default)]
    pub color: Option<HexColor>,
    /// Seed for the deterministic noise grain in solid mode.
    #[serde(default)]
    pub noise_seed: u64,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            mode: BackgroundMode::default(),
            zoom_percent: default_zoom_percent(),
            blur_sigma: default_blur_sigma(),
            blur_brightness: default_blur_brightness(),
            color: None,
            noise_seed: 0,
        }
    }
}

fn default_zoom_percent() -> f32 {
    10.0
}

fn default_blur_sigma() -> f32 {
    25.0
}

fn default_blur_brightness() -> f32 {
    0.6
}

fn default_true() -> bool {
    true
}

/// Font family + file path for one text role.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub path: PathBuf,
}

impl FontSpec {
    fn new(family: &str, path: &str) -> Self {
        Self {
            family: family.to_string(),
            path: PathBuf::from(path),
        }
    }
}

/// One font per text role. Font file presence is the caller's concern; the
/// rendering core assumes the paths have been checked.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct FontSet {
    pub artist: FontSpec,
    pub album: FontSpec,
    pub track_list: FontSpec,
    pub current_song: FontSpec,
    pub current_artists: FontSpec,
    pub corner_label: FontSpec,
}

impl Default for FontSet {
    fn default() -> Self {
        let klima = || FontSpec::new("Klima", "./fonts/klima/Klima-Regular.ttf");
        Self {
            artist: FontSpec::new("Clear Sans", "./fonts/clear-sans/ClearSans-Regular.ttf"),
            album: FontSpec::new("Clear Sans Thin", "./fonts/clear-sans/ClearSans-Thin.ttf"),
            track_list: klima(),
            current_song: klima(),
            current_artists: klima(),
            corner_label: klima(),
        }
    }
}

/// Text roles a font can be assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FontRole {
    Artist,
    Album,
    TrackList,
    CurrentSong,
    CurrentArtists,
    CornerLabel,
}

impl FontSet {
    pub fn for_role(&self, role: FontRole) -> &FontSpec {
        match role {
            FontRole::Artist => &self.artist,
            FontRole::Album => &self.album,
            FontRole::TrackList => &self.track_list,
            FontRole::CurrentSong => &self.current_song,
            FontRole::CurrentArtists => &self.current_artists,
            FontRole::CornerLabel => &self.corner_label,
        }
    }

    pub fn all(&self) -> [&FontSpec; 6] {
        [
            &self.artist,
            &self.album,
            &self.track_list,
            &self.current_song,
            &self.current_artists,
            &self.corner_label,
        ]
    }
}

impl AlbumSpec {
    /// Load an album spec from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> CoverplateResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read album spec '{}'", path.display()))?;
        serde_json::from_str(&text).map_err(|e| {
            CoverplateError::config(format!("parse album spec '{}': {e}", path.display()))
        })
    }

    pub fn validate(&self) -> CoverplateResult<()> {
        if self.artist.trim().is_empty() {
            return Err(CoverplateError::config("artist name is required"));
        }
        if self.album.trim().is_empty() {
            return Err(CoverplateError::config("album name is required"));
        }
        if self.cover.as_os_str().is_empty() {
            return Err(CoverplateError::config("cover image path is required"));
        }
        if self.tracks.is_empty() {
            return Err(CoverplateError::config("at least one track is required"));
        }
        for (i, track) in self.tracks.iter().enumerate() {
            if track.name.trim().is_empty() {
                return Err(CoverplateError::config(format!(
                    "track {} has an empty name",
                    i + 1
                )));
            }
        }

        self.colors.main.validate()?;
        self.colors.primary.validate()?;
        self.colors.secondary.validate()?;

        let bg = &self.background;
        if bg.mode == BackgroundMode::Solid {
            match &bg.color {
                Some(color) => color.validate()?,
                None => {
                    return Err(CoverplateError::config(
                        "solid background mode requires background.color",
                    ));
                }
            }
        }
        if !(0.0..=45.0).contains(&bg.zoom_percent) {
            return Err(CoverplateError::config(
                "background.zoom_percent must be within 0..=45",
            ));
        }
        if !bg.blur_sigma.is_finite() || bg.blur_sigma <= 0.0 {
            return Err(CoverplateError::config(
                "background.blur_sigma must be finite and > 0",
            ));
        }
        if !(0.0..=2.0).contains(&bg.blur_brightness) {
            return Err(CoverplateError::config(
                "background.blur_brightness must be within 0..=2",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r##"{
            "artist": "Some Artist",
            "album": "Some Album",
            "cover": "cover.png",
            "colors": { "main": "#ffffff", "primary": "#ffa500", "secondary": "#4a9eff" },
            "tracks": [ { "name": "Opener" } ]
        }"##
    }

    #[test]
    fn minimal_spec_parses_with_defaults() {
        let spec: AlbumSpec = serde_json::from_str(minimal_json()).unwrap();
        spec.validate().unwrap();
        assert_eq!(spec.background.mode, BackgroundMode::Blur);
        assert_eq!(spec.background.zoom_percent, 10.0);
        assert_eq!(spec.background.blur_brightness, 0.6);
        assert!(spec.show_corner_label);
        assert!(spec.tracks[0].artists.is_empty());
    }

    #[test]
    fn hex_color_validation() {
        assert!(HexColor::new("#ffffff").is_ok());
        assert!(HexColor::new("#FFA500").is_ok());
        assert!(HexColor::new("ffffff").is_err());
        assert!(HexColor::new("#fff").is_err());
        assert!(HexColor::new("#gggggg").is_err());
        assert_eq!(HexColor::new("#102030").unwrap().rgb8().unwrap(), [
            0x10, 0x20, 0x30
        ]);
    }

    #[test]
    fn validate_rejects_empty_tracks() {
        let mut spec: AlbumSpec = serde_json::from_str(minimal_json()).unwrap();
        spec.tracks.clear();
        assert!(matches!(
            spec.validate(),
            Err(CoverplateError::Config(msg)) if msg.contains("at least one track")
        ));
    }

    #[test]
    fn validate_rejects_solid_mode_without_color() {
        let mut spec: AlbumSpec = serde_json::from_str(minimal_json()).unwrap();
        spec.background.mode = BackgroundMode::Solid;
        assert!(matches!(
            spec.validate(),
            Err(CoverplateError::Config(msg)) if msg.contains("background.color")
        ));

        spec.background.color = Some(HexColor::new("#223344").unwrap());
        spec.validate().unwrap();
    }

    #[test]
    fn font_set_roles_are_wired() {
        let fonts = FontSet::default();
        assert_eq!(fonts.for_role(FontRole::Album).family, "Clear Sans Thin");
        assert_eq!(fonts.for_role(FontRole::CurrentSong).family, "Klima");
        assert_eq!(fonts.all().len(), 6);
    }
}
