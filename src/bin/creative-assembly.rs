use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use creative_assembly::{
    CancelToken, CaptionRenderer, ExportOpts, FrameCompositor, FrameIndex, NullAudioDevice,
    PlaybackState, ProjectFile, Studio, SystemClock, TimelineModel,
};

#[derive(Parser, Debug)]
#[command(name = "creative-assembly", version)]
struct Cli {
    /// Log at DEBUG level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the timeline as MP4 (requires `ffmpeg` on PATH).
    Export(ExportArgs),
    /// Render a single export frame as a PNG.
    Frame(FrameArgs),
    /// Write the selected image of one scene as a PNG.
    Still(StillArgs),
    /// Write the narration track as WAV.
    Wav(OutDirArgs),
    /// Play the timeline against the system clock, logging playback state.
    Preview(ProjectArgs),
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Refuse to replace an existing output file.
    #[arg(long, default_value_t = false)]
    no_overwrite: bool,

    /// Export without the narration track.
    #[arg(long, default_value_t = false)]
    no_audio: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    index: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct StillArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Scene index (0-based).
    #[arg(long)]
    scene: usize,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct OutDirArgs {
    /// Project JSON.
    #[arg(long)]
    project: PathBuf,

    /// Output directory.
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Still(args) => cmd_still(args),
        Command::Wav(args) => cmd_wav(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

struct Loaded {
    model: TimelineModel,
    captions: Option<CaptionRenderer>,
}

fn load(project: &Path) -> anyhow::Result<Loaded> {
    let file = ProjectFile::from_path(project)?;
    let root = project.parent().unwrap_or_else(|| Path::new("."));
    let model = file
        .into_model(root)
        .with_context(|| format!("load project '{}'", project.display()))?;
    let captions = file
        .caption_font_bytes(root)?
        .map(CaptionRenderer::from_font_bytes)
        .transpose()?;
    Ok(Loaded { model, captions })
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let Loaded { mut model, captions } = load(&args.project)?;
    if args.no_audio {
        model.set_audio(None);
    }
    let opts = ExportOpts {
        out_dir: args.out,
        overwrite: !args.no_overwrite,
        ..ExportOpts::default()
    };
    let mut studio = Studio::new(
        model,
        opts,
        SystemClock::start(),
        Box::new(NullAudioDevice),
        captions,
    )?;

    let mut last = None;
    let video = studio.export_mp4(CancelToken::new(), &mut |pct| {
        if last != Some(pct) {
            eprint!("\rexporting {pct:>3}%");
            last = Some(pct);
        }
    })?;
    eprintln!();

    if !video.has_audio {
        tracing::warn!("exported without audio");
    }
    match video.path {
        Some(path) => eprintln!(
            "wrote {} ({} frames, {} composited)",
            path.display(),
            video.frames,
            video.stats.frames_rendered
        ),
        None => eprintln!("export finished ({} frames)", video.frames),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let Loaded { model, captions } = load(&args.project)?;
    let opts = ExportOpts::default();
    let mut compositor = FrameCompositor::new(opts.canvas)?;
    compositor.set_caption_renderer(captions);
    let pipeline = creative_assembly::ExportPipeline::new(opts, SystemClock::start())?;

    let frame = pipeline.render_frame(&mut compositor, &model.snapshot(), FrameIndex(args.index))?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.write_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_still(args: StillArgs) -> anyhow::Result<()> {
    let Loaded { model, .. } = load(&args.project)?;
    let path = creative_assembly::export_scene_still(&model.snapshot(), args.scene, &args.out)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_wav(args: OutDirArgs) -> anyhow::Result<()> {
    let Loaded { model, .. } = load(&args.project)?;
    let path = creative_assembly::export_narration_wav(&model.snapshot(), &args.out)?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_preview(args: ProjectArgs) -> anyhow::Result<()> {
    let Loaded { model, captions } = load(&args.project)?;
    let mut studio = Studio::new(
        model,
        ExportOpts::default(),
        SystemClock::start(),
        Box::new(NullAudioDevice),
        captions,
    )?;

    let frame_interval = Duration::from_millis(33);
    studio.toggle_preview();
    let mut last: Option<PlaybackState> = None;
    while studio.tick_preview() {
        let state = studio.playback();
        let changed = last.as_ref().is_none_or(|l| {
            l.current_scene != state.current_scene || l.transitioning_to != state.transitioning_to
        });
        if changed {
            tracing::info!(
                scene = state.current_scene,
                next = ?state.transitioning_to,
                "preview"
            );
            last = Some(state.clone());
        }
        std::thread::sleep(frame_interval);
    }
    tracing::info!("preview finished");
    Ok(())
}
