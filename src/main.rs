use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use forensic_image_analyzer::result::AnalysisResult;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "forensic-image-analyzer")]
#[command(version, about = "Forensic image authenticity analyzer", long_about = None)]
struct Cli {
    /// Input image file or directory
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Recurse into directories
    #[arg(short, long)]
    recursive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let targets = collect_targets(&cli.input, cli.recursive)?;
    if targets.is_empty() {
        anyhow::bail!("no image files found at {}", cli.input.display());
    }

    for path in targets {
        match analyze_path(&path) {
            Ok(result) => print_result(&path, &result, cli.output),
            Err(err) => eprintln!("{}: {err}", path.display()),
        }
    }

    Ok(())
}

fn collect_targets(input: &PathBuf, recursive: bool) -> anyhow::Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.clone()]);
    }

    let mut files = Vec::new();
    let walker = if recursive {
        WalkDir::new(input)
    } else {
        WalkDir::new(input).max_depth(1)
    };
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() && is_supported_extension(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

fn is_supported_extension(path: &std::path::Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("png") | Some("jpg") | Some("jpeg") | Some("webp")
    )
}

fn analyze_path(path: &std::path::Path) -> anyhow::Result<AnalysisResult> {
    let bytes = std::fs::read(path)?;
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
    forensic_image_analyzer::analyze(&bytes, filename).map_err(anyhow::Error::from)
}

fn print_result(path: &std::path::Path, result: &AnalysisResult, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result).unwrap_or_default());
        }
        OutputFormat::Human => {
            println!("{}", path.display());
            println!(
                "  verdict: {:?}  score: {:.1}  confidence: {:.2}",
                result.verdict, result.overall_score, result.confidence
            );
            for (label, layer) in [
                ("digital_footprint", &result.layers.digital_footprint),
                ("pixel_physics", &result.layers.pixel_physics),
                ("lighting_geometry", &result.layers.lighting_geometry),
                ("semantic_analysis", &result.layers.semantic_analysis),
            ] {
                println!("  {label}: score={} confidence={:.2}", layer.score, layer.confidence);
                for finding in &layer.findings {
                    println!("    - {finding}");
                }
            }
        }
    }
}
