use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "markbatch", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark every image and write `watermarked_images.zip`.
    Export(ExportArgs),
    /// Write a PNG preview of the first image with the watermark applied.
    Preview(PreviewArgs),
    /// Run an export described by a JSON job file.
    Job(JobArgs),
}

#[derive(Args, Debug)]
struct Placement {
    /// Watermark center, horizontal fraction of the image width.
    #[arg(long = "x", default_value_t = 0.5)]
    position_x: f32,

    /// Watermark center, vertical fraction of the image height.
    #[arg(long = "y", default_value_t = 0.5)]
    position_y: f32,

    /// Multiplier on the watermark's natural size.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
}

#[derive(Args, Debug)]
struct Sources {
    /// Base image; repeat for several (exported in the given order).
    #[arg(long = "image", required = true)]
    images: Vec<PathBuf>,

    /// Watermark image.
    #[arg(long)]
    watermark: PathBuf,

    #[command(flatten)]
    placement: Placement,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    sources: Sources,

    /// Output directory for the archive.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Replace an existing archive.
    #[arg(long)]
    overwrite: bool,

    /// Render images on a worker pool.
    #[arg(long)]
    parallel: bool,

    /// Worker thread count (implies --parallel).
    #[arg(long)]
    threads: Option<usize>,

    /// Deflate archive entries instead of storing them.
    #[arg(long)]
    deflate: bool,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    sources: Sources,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Fit the preview within this width.
    #[arg(long, default_value_t = 300)]
    max_width: u32,

    /// Fit the preview within this height.
    #[arg(long, default_value_t = 300)]
    max_height: u32,
}

#[derive(Parser, Debug)]
struct JobArgs {
    /// Job JSON file.
    #[arg(long)]
    job: PathBuf,

    /// Replace an existing archive regardless of the job's setting.
    #[arg(long)]
    overwrite: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Job(args) => cmd_job(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn load_sources(sources: &Sources) -> anyhow::Result<(markbatch::ImageSet, markbatch::WatermarkSpec)> {
    let buffers = sources
        .images
        .iter()
        .map(|p| read_bytes(p))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let images = markbatch::decode_image_set(&buffers)?;

    let watermark = markbatch::decode_image(&read_bytes(&sources.watermark)?)
        .with_context(|| format!("decode watermark '{}'", sources.watermark.display()))?;
    let params = markbatch::WatermarkParams {
        position_x: sources.placement.position_x,
        position_y: sources.placement.position_y,
        scale: sources.placement.scale,
    };
    params.validate()?;
    Ok((images, markbatch::WatermarkSpec::new(watermark, params)))
}

fn read_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let (images, watermark) = load_sources(&args.sources)?;
    let threading = markbatch::ExportThreading {
        parallel: args.parallel || args.threads.is_some(),
        threads: args.threads,
        ..Default::default()
    }
    .with_env_overrides();

    let archive = if args.deflate {
        markbatch::ZipArchiveWriter::with_compression(zip::CompressionMethod::Deflated)
    } else {
        markbatch::ZipArchiveWriter::new()
    };
    run_export(
        &images,
        &watermark,
        threading,
        archive,
        &args.out,
        args.overwrite,
    )
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let (images, watermark) = load_sources(&args.sources)?;
    let display =
        markbatch::PngFileDisplay::new(&args.out).fit_within(args.max_width, args.max_height);
    let controller = markbatch::PreviewController::new(display);
    match controller.refresh_preview(&images, Some(&watermark))? {
        markbatch::PreviewOutcome::Published(_) => {
            eprintln!("wrote {}", args.out.display());
            Ok(())
        }
        other => anyhow::bail!("preview was not published: {other:?}"),
    }
}

fn cmd_job(args: JobArgs) -> anyhow::Result<()> {
    let job = markbatch::ExportJob::from_path(&args.job)?;
    job.validate()?;
    let (images, watermark) = job.load_sources()?;
    let out = job
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    run_export(
        &images,
        &watermark,
        job.threading.clone().with_env_overrides(),
        markbatch::ZipArchiveWriter::new(),
        &out,
        job.overwrite || args.overwrite,
    )
}

fn run_export(
    images: &markbatch::ImageSet,
    watermark: &markbatch::WatermarkSpec,
    threading: markbatch::ExportThreading,
    archive: markbatch::ZipArchiveWriter,
    out: &Path,
    overwrite: bool,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("create output dir '{}'", out.display()))?;

    let mut sink = markbatch::DirectorySink::new(out).overwrite(overwrite);
    let mut progress = |p: u8| {
        if p > 0 {
            eprintln!("exported {p}%");
        }
    };
    let report = markbatch::BatchExporter::new(threading).export_all(
        images,
        watermark,
        archive,
        &mut sink,
        &mut progress,
    )?;

    eprintln!(
        "wrote {} ({} images)",
        out.join(&report.archive_name).display(),
        report.entries.len()
    );
    Ok(())
}
