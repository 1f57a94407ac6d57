use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use rayon::prelude::*;

use crate::cache::CoverCache;
use crate::compose::{TextLayer, compose, write_png};
use crate::config::AlbumSpec;
use crate::error::{CoverplateError, CoverplateResult};
use crate::geometry::{FontSizes, Geometry, Spacing};
use crate::layout::LayoutEngine;
use crate::slug::slugify;
use crate::text::{build_fontdb, rasterize_fragment, svg_fragment};

/// Batch scheduling knobs.
#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Tracks rendered concurrently before the next group starts.
    pub group_size: usize,
    /// Worker thread override; `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            group_size: 4,
            threads: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    /// Output files in track order.
    pub written: Vec<PathBuf>,
}

/// Renders every track image of an album against one shared cover cache.
#[derive(Clone, Debug)]
pub struct AlbumRenderer {
    geometry: Geometry,
    layout: LayoutEngine,
}

impl Default for AlbumRenderer {
    /// Production geometry and type sizes. Infallible: the default geometry
    /// satisfies the panel-split invariants by construction.
    fn default() -> Self {
        let geometry = Geometry::default();
        Self {
            geometry,
            layout: LayoutEngine::new(geometry, FontSizes::default(), Spacing::default()),
        }
    }
}

impl AlbumRenderer {
    pub fn new(geometry: Geometry, sizes: FontSizes, spacing: Spacing) -> CoverplateResult<Self> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            layout: LayoutEngine::new(geometry, sizes, spacing),
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn layout_engine(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Generate one image per track into `out_dir`.
    ///
    /// The cover cache is built exactly once, then tracks are rendered in
    /// groups of [`BatchOptions::group_size`]; a group must fully complete
    /// before the next starts, and the first failure aborts the batch once
    /// its group has drained. Filenames are `NN-slug.png`.
    #[tracing::instrument(skip(self, spec), fields(album = %spec.album, tracks = spec.tracks.len()))]
    pub fn generate_album(
        &self,
        spec: &AlbumSpec,
        out_dir: &Path,
        opts: &BatchOptions,
    ) -> CoverplateResult<BatchReport> {
        spec.validate()?;
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("create output directory '{}'", out_dir.display()))?;

        let fontdb = build_fontdb(&spec.fonts);
        let cache = CoverCache::build(spec, &self.geometry)?;
        let pool = build_thread_pool(opts.threads)?;
        let group_size = opts.group_size.max(1);

        let indices: Vec<usize> = (0..spec.tracks.len()).collect();
        let mut report = BatchReport::default();
        for group in indices.chunks(group_size) {
            let results: Vec<CoverplateResult<PathBuf>> = pool.install(|| {
                group
                    .par_iter()
                    .map(|&idx| {
                        let img = self
                            .render_track(spec, &cache, &fontdb, idx)
                            .map_err(|e| e.for_track(idx + 1))?;
                        let path = out_dir.join(track_filename(idx, &spec.tracks[idx].name));
                        write_png(&img, &path).map_err(|e| e.for_track(idx + 1))?;
                        tracing::debug!(track = idx + 1, path = %path.display(), "track image written");
                        Ok(path)
                    })
                    .collect()
            });
            // Sibling renders in this group have already finished; now the
            // first failure stops the batch.
            for result in results {
                report.written.push(result?);
            }
        }

        tracing::debug!(written = report.written.len(), "album batch complete");
        Ok(report)
    }

    /// Render a single track image against a prebuilt cache.
    pub fn render_track(
        &self,
        spec: &AlbumSpec,
        cache: &CoverCache,
        fontdb: &Arc<usvg::fontdb::Database>,
        track_index: usize,
    ) -> CoverplateResult<image::RgbaImage> {
        let elements = self.layout.layout(spec, track_index)?;
        let panel = self.geometry.right_panel;

        let mut layers = Vec::with_capacity(elements.len());
        for elem in &elements {
            let font = spec.fonts.for_role(elem.role);
            let svg = svg_fragment(elem, font, panel.width);
            let buffer = rasterize_fragment(&svg, fontdb)?;
            layers.push(TextLayer {
                buffer,
                top: i64::from(panel.y) + elem.top,
                left: i64::from(panel.x),
            });
        }

        compose(&self.geometry, cache, &layers)
    }
}

/// `NN-slug.png` with a two-digit 1-based track number.
pub fn track_filename(track_index: usize, track_name: &str) -> String {
    let slug = slugify(track_name);
    if slug.is_empty() {
        format!("{:02}.png", track_index + 1)
    } else {
        format!("{:02}-{slug}.png", track_index + 1)
    }
}

fn build_thread_pool(threads: Option<usize>) -> CoverplateResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CoverplateError::config(
            "batch 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CoverplateError::Other(anyhow::anyhow!("build worker pool: {e}")))
}
