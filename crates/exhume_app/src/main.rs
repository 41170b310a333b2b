//! exhume - signature-based file carver for raw disk and memory images.

mod sigfile;
mod writer;

use anyhow::{Context, Result};
use clap::Parser;
use exhume_core::{
    ByteSource, CarveConfig, Carver, FooterPolicy, ScanProgress, SignatureRegistry,
    DEFAULT_FALLBACK_LENGTH,
};
use exhume_io::Source;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use writer::ArtifactWriter;

#[derive(Parser, Debug)]
#[command(name = "exhume")]
#[command(author, version, about = "Recover files from raw images by byte-pattern signature", long_about = None)]
struct Args {
    /// Path to the disk image or raw byte stream to carve
    image: PathBuf,

    /// Directory to save recovered files
    output: PathBuf,

    /// Extraction length in bytes when no footer bounds a match
    #[arg(short, long, default_value_t = DEFAULT_FALLBACK_LENGTH)]
    block_size: u64,

    /// Path to the signature definition file
    #[arg(short, long, default_value = "filetypes.txt")]
    signatures: PathBuf,

    /// Discard matches whose footer is never found instead of truncating
    #[arg(long, default_value_t = false)]
    discard_unbounded: bool,

    /// Mirror diagnostics to this log file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Enable debug-level diagnostics
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let entries = sigfile::load_signature_file(&args.signatures)?;
    let registry =
        SignatureRegistry::from_entries(entries).context("invalid signature configuration")?;
    if registry.is_empty() {
        anyhow::bail!(
            "no usable signatures in {}",
            args.signatures.display()
        );
    }
    info!(
        signatures = registry.len(),
        path = %args.signatures.display(),
        "loaded signature definitions"
    );

    let source = Source::open(&args.image)
        .with_context(|| format!("failed to open image {}", args.image.display()))?;
    info!(
        image = %args.image.display(),
        size = source.len(),
        mmap = source.is_mmap(),
        "opened source"
    );

    let config = CarveConfig {
        fallback_length: args.block_size,
        footer_policy: if args.discard_unbounded {
            FooterPolicy::Discard
        } else {
            FooterPolicy::Fallback
        },
        ..Default::default()
    };
    let carver = Carver::new(registry, config)?;

    let pb = ProgressBar::new(source.len());
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:50.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("invalid progress bar template - this is a bug")
            .progress_chars("##-"),
    );
    let pb_scan = pb.clone();
    let progress = move |p: &ScanProgress| {
        pb_scan.set_position(p.scanned_bytes);
    };

    let report = carver.carve_with_progress(&source, &running, Some(&progress))?;
    pb.finish_and_clear();

    let writer = ArtifactWriter::new(&args.output)?;
    let mut written = 0usize;
    for artifact in &report.artifacts {
        writer.write(artifact)?;
        written += 1;
    }

    println!(
        "\n=== Carve {} ===",
        if report.cancelled {
            "Interrupted"
        } else {
            "Finished"
        }
    );
    println!("Elapsed:         {:.1}s", report.elapsed.as_secs_f64());
    println!("Scanned:         {}", format_size(report.scanned_bytes, BINARY));
    println!("Headers found:   {}", report.headers_found);
    println!("Files recovered: {}", written);
    println!("Matches skipped: {}", report.skipped.len());
    println!("Saved to:        {}", args.output.display());

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    match &args.log {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            use tracing_subscriber::fmt::writer::MakeWriterExt;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(Arc::new(file).and(std::io::stderr))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
