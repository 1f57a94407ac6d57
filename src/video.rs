use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context as _;

use crate::config::AlbumSpec;
use crate::error::{CoverplateError, CoverplateResult};
use crate::slug::slugify;

/// One invocation of the external video encoder.
#[derive(Clone, Debug)]
pub struct VideoJob {
    pub image: PathBuf,
    pub audio: PathBuf,
    pub out: PathBuf,
}

/// Run the external encoder tool for one track.
///
/// The tool receives exactly three positional arguments: the generated image,
/// the track's audio file, and the output video path. The tool's behavior is
/// its own; this only checks that it exits cleanly.
pub fn encode_track_video(encoder: &Path, job: &VideoJob) -> CoverplateResult<()> {
    if let Some(parent) = job.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }

    let output = Command::new(encoder)
        .arg(&job.image)
        .arg(&job.audio)
        .arg(&job.out)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            CoverplateError::asset(format!(
                "failed to run video encoder '{}': {e}",
                encoder.display()
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CoverplateError::asset(format!(
            "video encoder '{}' exited with status {}: {}",
            encoder.display(),
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

/// Encode a video for every track whose image was already generated.
///
/// Images must exist under `image_dir` with their batch filenames; every
/// track needs an `audio` path in the spec. Runs sequentially: encoders are
/// typically parallel internally and per-track output is easier to follow.
pub fn generate_album_videos(
    spec: &AlbumSpec,
    image_dir: &Path,
    video_dir: &Path,
    encoder: &Path,
) -> CoverplateResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(spec.tracks.len());
    for (idx, track) in spec.tracks.iter().enumerate() {
        let audio = track.audio.as_ref().ok_or_else(|| {
            CoverplateError::config(format!(
                "track {} ('{}') has no audio path; video mode requires one per track",
                idx + 1,
                track.name
            ))
        })?;

        let stem = crate::batch::track_filename(idx, &track.name);
        let image = image_dir.join(&stem);
        let out = video_dir.join(format!(
            "{:02}-{}.mp4",
            idx + 1,
            non_empty_slug(&track.name)
        ));

        encode_track_video(encoder, &VideoJob {
            image,
            audio: audio.clone(),
            out: out.clone(),
        })
        .map_err(|e| e.for_track(idx + 1))?;
        written.push(out);
    }
    Ok(written)
}

fn non_empty_slug(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() { "track".to_string() } else { slug }
}
