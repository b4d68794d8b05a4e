//! deckport CLI - export pre-rendered slides as PPTX, PDF, or images
//!
//! Each input image stands in for one rendered slide surface.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use deckport::{
    surfaces_from_paths, AspectRatio, CoordinatorConfig, DirectorySink, ExportCoordinator,
    ExportFormat, ExportOptions, ExportResult, ImageFileBackend, Pauses, Quality, SleepYield,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

/// Slide deck export to PowerPoint, PDF, and images
#[derive(Parser)]
#[command(
    name = "deckport",
    author = "iyulab",
    version,
    about = "Export slide images as PPTX, PDF, PNG, or JPEG",
    long_about = "deckport - slide deck export pipeline.\n\n\
                  Captures pre-rendered slide images and packages them as a PowerPoint \
                  presentation, a PDF document, or an image set."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export slide images into a deck
    Export {
        /// Slide images, in deck order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pptx")]
        format: FormatArg,

        /// Capture quality (scale 1x, 2x, 3x)
        #[arg(short, long, default_value = "medium")]
        quality: QualityArg,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Base file name
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Slide aspect ratio, e.g. 16:9 or 1920x1080
        #[arg(long)]
        aspect: Option<AspectRatio>,

        /// Only export these slide ids (file stems); repeatable
        #[arg(long = "select", value_name = "ID")]
        select: Vec<String>,

        /// Use file stems as slide titles
        #[arg(long)]
        titles: bool,

        /// Print the result envelope as JSON
        #[arg(long)]
        json: bool,

        /// Skip the pauses between captures and downloads
        #[arg(long)]
        no_delay: bool,
    },

    /// List the parts of a .pptx file and check its references
    Inspect {
        /// Input file path
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

/// Output format
#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// PowerPoint presentation
    Ppt,
    /// PowerPoint presentation
    Pptx,
    /// PowerPoint presentation for Keynote import
    Keynote,
    /// PDF document
    Pdf,
    /// One PNG per slide
    Png,
    /// One JPEG per slide
    Jpeg,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Ppt | FormatArg::Pptx => ExportFormat::Ppt,
            FormatArg::Keynote => ExportFormat::Keynote,
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
        }
    }
}

/// Capture quality
#[derive(Clone, Copy, ValueEnum)]
enum QualityArg {
    /// 1x
    Low,
    /// 2x
    Medium,
    /// 3x
    High,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => Quality::Low,
            QualityArg::Medium => Quality::Medium,
            QualityArg::High => Quality::High,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Export {
            images,
            format,
            quality,
            output,
            name,
            aspect,
            select,
            titles,
            json,
            no_delay,
        } => {
            let mut options = ExportOptions::new(format.into())
                .with_quality(quality.into())
                .with_selected_slides(select);
            if let Some(name) = name {
                options = options.with_file_name(name);
            }
            if let Some(ratio) = aspect {
                options = options.with_aspect_ratio(ratio);
            }

            let pauses = if no_delay {
                Pauses::none()
            } else {
                Pauses::default()
            };
            let sink = Arc::new(DirectorySink::new(&output));
            let coordinator = ExportCoordinator::from_config(
                CoordinatorConfig::default().with_pauses(pauses),
                Arc::new(ImageFileBackend::new()),
                sink.clone(),
                Arc::new(SleepYield),
            );

            let slides = surfaces_from_paths(&images, titles);
            log::debug!(
                "{} slide images -> {} in {}",
                slides.len(),
                options.format,
                output.display()
            );
            let pb = if json { ProgressBar::hidden() } else { create_bar()? };
            let result = coordinator.export(&slides, &options, &mut |p| {
                pb.set_position(u64::from(p.percentage));
                pb.set_message(p.message.clone());
            });
            pb.finish_and_clear();

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result, &sink.saved_paths());
            }
            if !result.success {
                std::process::exit(1);
            }
        }

        Commands::Inspect { input, json } => {
            let pb = create_spinner("Reading package...")?;
            let data = std::fs::read(&input)?;
            let summary = deckport::verify_presentation(&data);
            pb.finish_and_clear();
            let summary = summary?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("{}", "Presentation".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Slides".bold(), summary.slide_count);
            let (w, h) = summary.size.inches();
            println!(
                "{}: {} x {} EMU ({:.2}\" x {:.2}\")",
                "Size".bold(),
                summary.size.cx,
                summary.size.cy,
                w,
                h
            );
            for slide in &summary.slides {
                println!(
                    "  {} {} -> {}",
                    slide.id.to_string().dimmed(),
                    slide.part,
                    slide.media.join(", ")
                );
            }

            println!("\n{}", "Parts".cyan().bold());
            println!("{}", "─".repeat(40));
            for part in &summary.parts {
                println!("  {}", part);
            }
            println!("\n{} All references resolve", "✓".green().bold());
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_result(result: &ExportResult, saved: &[PathBuf]) {
    match (&result.error, result.stats) {
        (None, Some(stats)) => {
            println!(
                "{} Exported {}/{} slides in {} ms",
                "✓".green().bold(),
                stats.captured_slides,
                stats.total_slides,
                stats.duration_ms
            );
            if stats.failed_slides > 0 {
                println!(
                    "{} {} slides could not be captured",
                    "!".yellow().bold(),
                    stats.failed_slides
                );
            }
            for path in saved {
                println!("  {}", path.display());
            }
        }
        (Some(error), _) => {
            eprintln!(
                "{} {} ({})",
                "✗".red().bold(),
                error.message,
                error.kind
            );
            if let Some(details) = &error.details {
                eprintln!("  {}", details.dimmed());
            }
        }
        (None, None) => {}
    }
}

fn print_version() {
    println!("{} {}", "deckport".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Slide deck export to PowerPoint, PDF, and images");
    println!();
    println!("Output formats: PPTX, PDF, PNG, JPEG");
    println!("Repository: https://github.com/iyulab/deckport");
}

fn create_bar() -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos:>3}% {msg}")?
            .progress_chars("█▓░"),
    );
    Ok(pb)
}

fn create_spinner(message: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")?,
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_args() {
        let cli = Cli::try_parse_from([
            "deckport", "export", "a.png", "b.png", "-f", "keynote", "--aspect", "4:3",
            "--select", "a", "--select", "b", "--no-delay",
        ])
        .unwrap();
        match cli.command {
            Commands::Export {
                images,
                format,
                aspect,
                select,
                no_delay,
                ..
            } => {
                assert_eq!(images.len(), 2);
                assert_eq!(ExportFormat::from(format), ExportFormat::Keynote);
                assert_eq!(aspect, Some(AspectRatio::new(4, 3)));
                assert_eq!(select, vec!["a", "b"]);
                assert!(no_delay);
            }
            _ => panic!("expected export"),
        }
    }
}
