use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::{FontSet, FontSpec};
use crate::error::{CoverplateError, CoverplateResult};
use crate::layout::{FontStyle, FontWeight, TextAnchor, TextElement};
use crate::panel::PanelBuffer;

/// Horizontal inset of right-anchored text from the panel edge.
const END_ANCHOR_INSET: u32 = 60;

/// Escape the five reserved markup characters in untrusted text.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Build the standalone SVG fragment for one text element.
///
/// Each fragment is a fixed-size snippet spanning the panel width, carrying
/// its own font-face declaration so it rasterizes without shared state.
pub fn svg_fragment(elem: &TextElement, font: &FontSpec, panel_width: u32) -> String {
    let height = elem.size + (elem.size / 2).max(20);
    let (x, anchor) = match elem.anchor {
        TextAnchor::Middle => (f64::from(panel_width) / 2.0, "middle"),
        TextAnchor::End => (
            f64::from(panel_width.saturating_sub(END_ANCHOR_INSET)),
            "end",
        ),
    };
    let weight = match elem.weight {
        FontWeight::Thin => "100",
        FontWeight::Normal => "normal",
        FontWeight::Bold => "bold",
    };
    let style = match elem.style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };

    let family = escape_markup(&font.family);
    let src = escape_markup(&font.path.display().to_string());
    let text = escape_markup(&elem.text);

    let mut svg = String::with_capacity(640 + text.len());
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{panel_width}" height="{height}">"#
    );
    let _ = write!(
        svg,
        "<style>@font-face {{ font-family: '{family}'; src: url('{src}'); }}</style>"
    );
    if elem.elevation {
        svg.push_str(elevation_filter());
    }
    let _ = write!(
        svg,
        r#"<text x="{x}" y="{size}" font-family="{family}" font-size="{size}" font-weight="{weight}" font-style="{style}" text-anchor="{anchor}" fill="{fill}""#,
        size = elem.size,
        fill = elem.color.as_str(),
    );
    if elem.elevation {
        svg.push_str(r#" filter="url(#elevation)""#);
    }
    let _ = write!(svg, ">{text}</text></svg>");
    svg
}

/// Two blurred, offset, alpha-attenuated copies merged beneath the source.
fn elevation_filter() -> &'static str {
    concat!(
        r#"<filter id="elevation" x="-20%" y="-20%" width="140%" height="160%">"#,
        r#"<feGaussianBlur in="SourceAlpha" stdDeviation="6" result="near-blur"/>"#,
        r#"<feOffset in="near-blur" dx="0" dy="8" result="near-off"/>"#,
        r#"<feComponentTransfer in="near-off" result="near">"#,
        r#"<feFuncA type="linear" slope="0.45"/></feComponentTransfer>"#,
        r#"<feGaussianBlur in="SourceAlpha" stdDeviation="16" result="far-blur"/>"#,
        r#"<feOffset in="far-blur" dx="0" dy="16" result="far-off"/>"#,
        r#"<feComponentTransfer in="far-off" result="far">"#,
        r#"<feFuncA type="linear" slope="0.25"/></feComponentTransfer>"#,
        r#"<feMerge><feMergeNode in="far"/><feMergeNode in="near"/>"#,
        r#"<feMergeNode in="SourceGraphic"/></feMerge>"#,
        r#"</filter>"#,
    )
}

/// Font database shared by every fragment rasterization of one album run.
///
/// System fonts first, then the configured per-role files; missing files are
/// tolerated here because presence is validated upstream.
pub fn build_fontdb(fonts: &FontSet) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    for spec in fonts.all() {
        if let Err(e) = db.load_font_file(&spec.path) {
            tracing::debug!(path = %spec.path.display(), error = %e, "font file not loaded");
        }
    }
    Arc::new(db)
}

/// Rasterize one SVG fragment into a premultiplied RGBA8 buffer.
pub fn rasterize_fragment(
    svg: &str,
    fontdb: &Arc<usvg::fontdb::Database>,
) -> CoverplateResult<PanelBuffer> {
    let opts = usvg::Options {
        fontdb: fontdb.clone(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
        .map_err(|e| CoverplateError::asset(format!("parse text fragment svg: {e}")))?;

    let size = tree.size();
    let width = (size.width().ceil() as u32).max(1);
    let height = (size.height().ceil() as u32).max(1);

    const MAX_DIM: u32 = 16_384;
    if width > MAX_DIM || height > MAX_DIM {
        return Err(CoverplateError::asset(format!(
            "text fragment raster too large: {width}x{height}"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CoverplateError::asset("failed to allocate text pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    PanelBuffer::from_parts(width, height, pixmap.take())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FontRole, HexColor};
    use crate::layout::TextKind;

    fn element(text: &str, elevation: bool) -> TextElement {
        TextElement {
            kind: TextKind::Artist,
            text: text.to_string(),
            role: FontRole::Artist,
            size: 40,
            color: HexColor::new("#ffffff").unwrap(),
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            anchor: TextAnchor::Middle,
            elevation,
            top: 0,
        }
    }

    fn font() -> FontSpec {
        FontSpec {
            family: "Test Family".to_string(),
            path: "./fonts/test.ttf".into(),
        }
    }

    #[test]
    fn escapes_all_five_reserved_characters() {
        assert_eq!(
            escape_markup(r#"A & B <C> "D" 'E'"#),
            "A &amp; B &lt;C&gt; &quot;D&quot; &apos;E&apos;"
        );
        assert_eq!(escape_markup("plain"), "plain");
    }

    #[test]
    fn fragment_contains_escaped_text_only() {
        let svg = svg_fragment(&element("Rock & <Roll>", false), &font(), 400);
        assert!(svg.contains("Rock &amp; &lt;Roll&gt;"));
        assert!(!svg.contains("Rock & <Roll>"));
    }

    #[test]
    fn fragment_is_parseable_markup() {
        let svg = svg_fragment(&element(r#"<&"'>"#, true), &font(), 400);
        let opts = usvg::Options::default();
        usvg::Tree::from_data(svg.as_bytes(), &opts).unwrap();
    }

    #[test]
    fn middle_anchor_centers_on_panel() {
        let svg = svg_fragment(&element("x", false), &font(), 400);
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains(r#"x="200""#));
    }

    #[test]
    fn end_anchor_insets_from_right_edge() {
        let mut elem = element("x", false);
        elem.anchor = TextAnchor::End;
        let svg = svg_fragment(&elem, &font(), 400);
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains(r#"x="340""#));
    }

    #[test]
    fn elevation_filter_only_when_requested() {
        let plain = svg_fragment(&element("x", false), &font(), 400);
        assert!(!plain.contains("filter"));

        let elevated = svg_fragment(&element("x", true), &font(), 400);
        assert!(elevated.contains(r#"filter="url(#elevation)""#));
        assert_eq!(elevated.matches("feGaussianBlur").count(), 2);
        assert_eq!(elevated.matches("feMergeNode").count(), 3);
    }

    #[test]
    fn rasterize_yields_fragment_sized_buffer() {
        let svg = svg_fragment(&element("hello", false), &font(), 200);
        let db = Arc::new(usvg::fontdb::Database::new());
        let buffer = rasterize_fragment(&svg, &db).unwrap();
        assert_eq!(buffer.width, 200);
        assert_eq!(buffer.rgba8_premul.len() % 4, 0);
    }

    #[test]
    fn rasterize_rejects_malformed_markup() {
        let db = Arc::new(usvg::fontdb::Database::new());
        assert!(rasterize_fragment("<svg", &db).is_err());
    }
}
