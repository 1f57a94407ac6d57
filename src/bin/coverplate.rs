use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use coverplate::{AlbumRenderer, AlbumSpec, BatchOptions, generate_album_videos};

#[derive(Parser, Debug)]
#[command(name = "coverplate", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one promotional image per track.
    Images(ImagesArgs),
    /// Generate images, then invoke an external encoder per track.
    Videos(VideosArgs),
}

#[derive(Parser, Debug)]
struct ImagesArgs {
    /// Album spec JSON.
    #[arg(short, long)]
    config: PathBuf,

    /// Output root; images land in `<out>/<album>/`.
    #[arg(short, long, default_value = "./output")]
    out: PathBuf,

    /// Tracks rendered concurrently per group.
    #[arg(long, default_value_t = 4)]
    group_size: usize,

    /// Override worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct VideosArgs {
    #[command(flatten)]
    images: ImagesArgs,

    /// Encoder script/tool; called with `<image> <audio> <output video>`.
    #[arg(long)]
    encoder: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Images(args) => {
            cmd_images(&args)?;
        }
        Command::Videos(args) => cmd_videos(args)?,
    }
    Ok(())
}

fn cmd_images(args: &ImagesArgs) -> anyhow::Result<PathBuf> {
    let spec = AlbumSpec::from_path(&args.config)
        .with_context(|| format!("load album spec '{}'", args.config.display()))?;

    let out_dir = args.out.join(&spec.album);
    eprintln!(
        "generating {} images for \"{}\" by {}",
        spec.tracks.len(),
        spec.album,
        spec.artist
    );

    let renderer = AlbumRenderer::default();
    let opts = BatchOptions {
        group_size: args.group_size,
        threads: args.threads,
    };
    let report = renderer.generate_album(&spec, &out_dir, &opts)?;

    for path in &report.written {
        eprintln!("  wrote {}", path.display());
    }
    eprintln!(
        "generated {} images in {}",
        report.written.len(),
        out_dir.display()
    );
    Ok(out_dir)
}

fn cmd_videos(args: VideosArgs) -> anyhow::Result<()> {
    let image_dir = cmd_images(&args.images)?;

    let spec = AlbumSpec::from_path(&args.images.config)?;
    let video_dir = image_dir.join("videos");
    let written = generate_album_videos(&spec, &image_dir, &video_dir, &args.encoder)?;

    for path in &written {
        eprintln!("  encoded {}", path.display());
    }
    eprintln!("encoded {} videos in {}", written.len(), video_dir.display());
    Ok(())
}
