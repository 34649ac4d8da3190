use std::{fs, path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use shotlens::{
    AnalysisOptions, AnalysisOutcome, AnalysisResult, Analyzer, EdlCutList, FfmpegLogLevel,
    MediaFile, ModelConfig, ProgressCallback, ProgressInfo, Thumbnail, validate_result,
};

const CLI_AFTER_HELP: &str = "Examples:\n  shotlens analyze film.mp4\n  shotlens analyze film.mp4 --edl film.edl --json --out film.json\n  shotlens analyze film.mp4 --model models/transnetv2 --progress\n  shotlens edl film.edl\n  shotlens completions zsh > _shotlens";

#[derive(Debug, Parser)]
#[command(
    name = "shotlens",
    version,
    about = "Measure the editing rhythm and color composition of a video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect shots and compute color statistics for a video.
    #[command(
        about = "Analyze a video",
        after_help = "Examples:\n  shotlens analyze film.mp4 --progress\n  shotlens analyze film.mp4 --edl film.edl --json"
    )]
    Analyze {
        /// Input media path.
        input: PathBuf,
        /// Edit decision list whose cuts replace automatic detection.
        #[arg(long)]
        edl: Option<PathBuf>,
        /// Shot-boundary model file or directory.
        #[arg(long, conflicts_with = "no_model")]
        model: Option<PathBuf>,
        /// Never try the learned model.
        #[arg(long)]
        no_model: bool,
        /// Fixed sample step in seconds for heuristic detection.
        #[arg(long, value_parser = parse_step)]
        step: Option<f64>,
        /// Output the full result as JSON.
        #[arg(long)]
        json: bool,
        /// Write output to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
        /// Show debug logging.
        #[arg(long)]
        verbose: bool,
        /// FFmpeg log level (quiet, fatal, error, warning, info, verbose, debug).
        #[arg(long, default_value = "error")]
        ffmpeg_log_level: FfmpegLogLevel,
    },

    /// Parse an edit decision list and print its cuts.
    #[command(
        about = "Inspect an edit decision list",
        after_help = "Examples:\n  shotlens edl film.edl\n  shotlens edl film.edl --json"
    )]
    Edl {
        /// EDL file path.
        file: PathBuf,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn parse_step(value: &str) -> Result<f64, String> {
    let step: f64 = value
        .parse()
        .map_err(|_| format!("not a number: {value}"))?;
    if step.is_finite() && step > 0.0 {
        Ok(step)
    } else {
        Err(format!("step must be a positive number of seconds, got {value}"))
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0);
    let minutes = (total / 60.0).floor() as u64;
    format!("{minutes:02}:{:05.2}", total - minutes as f64 * 60.0)
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.percent.round() as u64);
        self.bar.set_message(format!("{:?}", info.stage));
    }
}

fn thumbnail_json(thumbnail: Option<&Thumbnail>) -> Value {
    thumbnail.map_or(Value::Null, |thumbnail| json!(thumbnail.to_data_url()))
}

fn result_json(result: &AnalysisResult) -> Value {
    json!({
        "fileName": result.file_name,
        "duration": result.duration,
        "detection": result.detection.as_str(),
        "asl": result.asl,
        "msl": result.msl,
        "shots": result.shots.iter().map(|shot| json!({
            "id": shot.id,
            "startTime": shot.start,
            "endTime": shot.end,
            "duration": shot.duration,
            "dominantColor": shot.dominant_color,
            "thumbnail": thumbnail_json(shot.thumbnail.as_ref()),
        })).collect::<Vec<_>>(),
        "frames": result.frames.iter().map(|frame| json!({
            "time": frame.timestamp,
            "hue": frame.hsb.hue,
            "saturation": frame.hsb.saturation,
            "brightness": frame.hsb.brightness,
            "hex": frame.hex,
        })).collect::<Vec<_>>(),
        "cuttingDensity": result.cutting_density.iter().map(|point| json!({
            "time": point.time,
            "density": point.density,
        })).collect::<Vec<_>>(),
        "palette": result.palette.iter().map(|entry| json!({
            "color": entry.color,
            "thumbnail": thumbnail_json(entry.thumbnail.as_ref()),
        })).collect::<Vec<_>>(),
        "polarData": result.polar.iter().map(|point| json!({
            "time": point.time,
            "hue": point.hue,
            "saturation": point.saturation,
            "color": point.color,
        })).collect::<Vec<_>>(),
    })
}

fn result_summary(result: &AnalysisResult) -> String {
    let mut lines = vec![
        format!("{} {}", "file".cyan().bold(), result.file_name),
        format!(
            "{} {}",
            "duration".cyan().bold(),
            format_seconds(result.duration)
        ),
        format!("{} {}", "detection".cyan().bold(), result.detection),
        format!("{} {}", "shots".cyan().bold(), result.shots.len()),
        format!("{} {:.2}s", "ASL".cyan().bold(), result.asl),
        format!("{} {:.2}s", "MSL".cyan().bold(), result.msl),
    ];
    if !result.palette.is_empty() {
        let colors: Vec<&str> = result
            .palette
            .iter()
            .map(|entry| entry.color.as_str())
            .collect();
        lines.push(format!("{} {}", "palette".cyan().bold(), colors.join(" ")));
    }
    lines.push(String::new());
    for shot in &result.shots {
        lines.push(format!(
            "#{:<4} {} - {}  {:>7.2}s  {}",
            shot.id,
            format_seconds(shot.start),
            format_seconds(shot.end),
            shot.duration,
            shot.dominant_color
        ));
    }
    lines.join("\n")
}

fn emit(output: &str, out: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match out {
        Some(path) => {
            fs::write(path, output)?;
            eprintln!("{} {}", "wrote".green().bold(), path.display());
        }
        None => println!("{output}"),
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            edl,
            model,
            no_model,
            step,
            json,
            out,
            progress,
            verbose,
            ffmpeg_log_level,
        } => {
            init_logging(verbose);
            MediaFile::set_log_level(ffmpeg_log_level);

            let mut options = AnalysisOptions::new();
            if let Some(step) = step {
                options = options.with_sample_step(step);
            }
            if let Some(model) = model.filter(|_| !no_model) {
                let config = if model.is_dir() {
                    ModelConfig::from_directory(model)
                } else {
                    ModelConfig::from_file(model)
                };
                options = options.with_model(config);
            }

            let progress_bar = if progress {
                let bar = ProgressBar::new(100);
                let style =
                    ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos:>3}% {msg}")?;
                bar.set_style(style.progress_chars("##-"));
                options = options.with_progress(Arc::new(TerminalProgress { bar: bar.clone() }));
                Some(bar)
            } else {
                None
            };

            let edl_bytes = edl.as_ref().map(fs::read).transpose()?;

            let mut media = MediaFile::open(&input)?;
            let outcome = Analyzer::new(options).analyze(&mut media, edl_bytes.as_deref())?;
            if let Some(bar) = &progress_bar {
                bar.finish_and_clear();
            }

            let result = match outcome {
                AnalysisOutcome::Completed(result) => result,
                AnalysisOutcome::Cancelled => {
                    eprintln!("{}", "analysis cancelled".yellow());
                    return Ok(());
                }
            };

            let report = validate_result(&result);
            for warning in report.warnings.iter().chain(&report.errors) {
                eprintln!("{} {}", "warning:".yellow().bold(), warning.yellow());
            }

            let output = if json {
                serde_json::to_string_pretty(&result_json(&result))?
            } else {
                result_summary(&result)
            };
            emit(&output, out.as_ref())?;
        }
        Commands::Edl { file, json } => {
            init_logging(false);
            let list = EdlCutList::from_path(&file)?;
            if json {
                let payload = json!({
                    "frameRate": list.frame_rate,
                    "dropFrame": list.drop_frame,
                    "events": list.event_count,
                    "cuts": list.cuts,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {} fps{}",
                    "frame rate".cyan().bold(),
                    list.frame_rate,
                    if list.drop_frame { " (drop frame)" } else { "" }
                );
                println!("{} {}", "events".cyan().bold(), list.event_count);
                println!("{} {}", "cuts".cyan().bold(), list.cuts.len());
                for cut in &list.cuts {
                    println!("  {}", format_seconds(*cut));
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "shotlens", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
