use coverplate::{
    AlbumSpec, BackgroundOptions, FontSet, FontSizes, FontStyle, Geometry, HexColor, LayoutEngine,
    Palette, Spacing, TextKind, TrackSpec, svg_fragment,
};

fn spec(tracks: Vec<TrackSpec>) -> AlbumSpec {
    AlbumSpec {
        artist: "The Artist".to_string(),
        album: "The Album".to_string(),
        cover: "cover.png".into(),
        colors: Palette {
            main: HexColor::new("#ffffff").unwrap(),
            primary: HexColor::new("#ffa500").unwrap(),
            secondary: HexColor::new("#4a9eff").unwrap(),
        },
        background: BackgroundOptions::default(),
        tracks,
        fonts: FontSet::default(),
        show_corner_label: true,
    }
}

fn track(name: &str, artists: &[&str]) -> TrackSpec {
    TrackSpec {
        name: name.to_string(),
        artists: artists.iter().map(|a| a.to_string()).collect(),
        audio: None,
    }
}

fn engine() -> LayoutEngine {
    LayoutEngine::new(Geometry::default(), FontSizes::default(), Spacing::default())
}

#[test]
fn single_track_height_formula() {
    let sizes = FontSizes::default();
    let engine = engine();

    let bare = spec(vec![track("Solo", &[])]);
    assert_eq!(
        engine.block_height(&bare, 0).unwrap(),
        f64::from(sizes.artist) + f64::from(sizes.current_song)
    );

    let credited = spec(vec![track("Solo", &["Guest"])]);
    assert_eq!(
        engine.block_height(&credited, 0).unwrap(),
        f64::from(sizes.artist)
            + f64::from(sizes.current_song)
            + 30.0
            + f64::from(sizes.current_artists)
    );

    // No album title, no track list.
    let elements = engine.layout(&bare, 0).unwrap();
    assert!(elements.iter().all(|e| e.kind != TextKind::Album));
    assert!(
        elements
            .iter()
            .all(|e| !matches!(e.kind, TextKind::TrackLine { .. }))
    );
}

#[test]
fn track_list_height_scales_with_track_count() {
    let engine = engine();
    let line_height = 80.0 * 1.8;

    for n in [2usize, 5, 12] {
        let tracks: Vec<TrackSpec> = (0..n).map(|i| track(&format!("Track {i}"), &[])).collect();
        let album = spec(tracks);
        let total = engine.block_height(&album, 0).unwrap();
        let expected = 140.0 + 60.0 + 130.0 + 120.0 + n as f64 * line_height + 120.0 + 160.0;
        assert_eq!(total, expected, "block height for {n} tracks");
    }
}

#[test]
fn exactly_one_highlighted_line_per_render() {
    let engine = engine();
    let album = spec(vec![track("A", &[]), track("B", &[]), track("C", &[])]);

    for current in 0..3 {
        let elements = engine.layout(&album, current).unwrap();
        let italic: Vec<_> = elements
            .iter()
            .filter(|e| matches!(e.kind, TextKind::TrackLine { .. }))
            .filter(|e| e.style == FontStyle::Italic)
            .collect();
        assert_eq!(italic.len(), 1);
        assert_eq!(italic[0].kind, TextKind::TrackLine { index: current });
    }
}

#[test]
fn block_is_centered_in_right_panel_for_all_tracks() {
    let engine = engine();
    let album = spec(vec![
        track("A", &["x", "y"]),
        track("B", &[]),
        track("C", &["z"]),
        track("D", &[]),
    ]);
    let panel_h = f64::from(engine.geometry().right_panel.height);
    for idx in 0..4 {
        let top = engine.block_top(&album, idx).unwrap();
        let height = engine.block_height(&album, idx).unwrap();
        assert_eq!(top + height / 2.0, panel_h / 2.0, "track {idx}");
    }
}

#[test]
fn hostile_names_produce_wellformed_markup() {
    let engine = engine();
    let album = spec(vec![
        track(r#"Rock & <Roll> "Live" 'Cut'"#, &["A & B", "<script>"]),
        track("Plain", &[]),
    ]);

    let elements = engine.layout(&album, 0).unwrap();
    let opts = usvg::Options::default();
    for elem in &elements {
        let svg = svg_fragment(elem, album.fonts.for_role(elem.role), 1680);
        assert!(!svg.contains("<Roll>"));
        assert!(!svg.contains("<script>"));
        // Every fragment must survive a strict XML/SVG parse.
        usvg::Tree::from_data(svg.as_bytes(), &opts)
            .unwrap_or_else(|e| panic!("fragment for {:?} failed to parse: {e}", elem.kind));
    }

    let current = elements
        .iter()
        .find(|e| e.kind == TextKind::CurrentSong)
        .unwrap();
    let svg = svg_fragment(current, album.fonts.for_role(current.role), 1680);
    assert!(svg.contains("Rock &amp; &lt;Roll&gt; &quot;Live&quot; &apos;Cut&apos;"));
}
