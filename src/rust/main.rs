use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use hatescan::history::DEFAULT_EXPORT_FILE;
use hatescan::{
    AnalysisResult, AnalysisSession, ArtifactConfig, Detector, RuntimeConfig, SubmissionError,
};
use log::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding model.onnx and vectorizer.json
    /// (defaults to $HATESCAN_ARTIFACTS, then the working directory)
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Classifier file (.onnx or .json), overrides the artifacts directory
    #[arg(long)]
    model: Option<PathBuf>,

    /// Vectorizer file (.json), overrides the artifacts directory
    #[arg(long)]
    vectorizer: Option<PathBuf>,

    /// Expected SHA-256 of the classifier file
    #[arg(long)]
    model_sha256: Option<String>,

    /// Expected SHA-256 of the vectorizer file
    #[arg(long)]
    vectorizer_sha256: Option<String>,

    /// Intra-op threads for ONNX Runtime (0 lets the runtime decide)
    #[arg(long, default_value_t = 0)]
    intra_threads: usize,

    /// Text to analyze (repeatable); without --text or --file an interactive
    /// prompt is started
    #[arg(short, long)]
    text: Vec<String>,

    /// Text file to analyze (repeatable)
    #[arg(short, long)]
    file: Vec<PathBuf>,

    /// Write the session history as CSV to this path before exiting
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn artifact_config(args: &Args) -> ArtifactConfig {
    let dir = args
        .artifacts_dir
        .clone()
        .unwrap_or_else(ArtifactConfig::default_dir);
    let mut config = ArtifactConfig::from_dir(dir);

    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if let Some(vectorizer) = &args.vectorizer {
        config.vectorizer_path = vectorizer.clone();
    }
    config.model_sha256 = args.model_sha256.clone();
    config.vectorizer_sha256 = args.vectorizer_sha256.clone();

    config.with_runtime_config(RuntimeConfig {
        intra_threads: args.intra_threads,
        ..RuntimeConfig::default()
    })
}

fn main() -> anyhow::Result<()> {
    hatescan::init_logger();
    let args = Args::parse();

    info!("=== Starting Hate Speech Detector ===");
    let config = artifact_config(&args);
    let detector = Detector::load(&config).context("Error loading model files")?;

    let artifacts = detector.engine().info();
    info!(
        "Artifacts ready: {} classifier, {} features, classes {:?}",
        artifacts.backend, artifacts.n_features, artifacts.classes
    );

    let session = detector.session();
    if args.text.is_empty() && args.file.is_empty() {
        run_interactive(&session)?;
    } else {
        for text in &args.text {
            report(session.submit(text), false);
        }
        for path in &args.file {
            report(session.submit_file(path), true);
        }
    }

    if let Some(path) = &args.export {
        session
            .history()
            .export_to_file(path)
            .with_context(|| format!("Failed to export history to {}", path.display()))?;
        println!("History exported to {}", path.display());
    }

    info!("=== Session {} finished ({} analyses) ===", session.id(), session.history().len());
    Ok(())
}

fn report(outcome: Result<AnalysisResult, SubmissionError>, from_file: bool) {
    let source = if from_file { " in File" } else { "" };
    match outcome {
        Ok(result) => {
            if result.label.is_hate_speech() {
                println!("\u{26a0}\u{fe0f} Hate Speech Detected{}!", source);
            } else {
                println!("\u{2705} No Hate Speech Detected{}", source);
            }
            println!("Confidence: {}", result.confidence);
        }
        Err(SubmissionError::Validation(warning)) => println!("{}", warning),
        Err(e) => eprintln!("{}", e),
    }
}

fn print_history(session: &AnalysisSession) {
    let records = session.history().records();
    if records.is_empty() {
        println!("No analysis history yet. Start analyzing text to build history.");
        return;
    }

    println!("{:<19}  {:<11}  {:>10}  text", "timestamp", "prediction", "confidence");
    for record in records {
        println!(
            "{:<19}  {:<11}  {:>10}  {}",
            record.timestamp().format("%Y-%m-%d %H:%M:%S"),
            record.label().as_str(),
            record.confidence().to_string(),
            record.text().replace('\n', " ")
        );
    }
}

fn export(session: &AnalysisSession, path: &Path) {
    match session.history().export_to_file(path) {
        Ok(()) => println!("History exported to {}", path.display()),
        Err(e) => {
            error!("Export failed: {}", e);
            eprintln!("Failed to export history: {}", e);
        }
    }
}

fn run_interactive(session: &AnalysisSession) -> io::Result<()> {
    println!("Hate Speech Detection");
    println!("Enter text to analyze, or :file <path>, :history, :export [path], :quit");
    println!("Use :multi for text spanning several lines (finish with an empty line)");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let command = line.trim();

        match command {
            ":quit" | ":q" => break,
            ":history" => print_history(session),
            ":export" => export(session, Path::new(DEFAULT_EXPORT_FILE)),
            _ if command.starts_with(":export ") => {
                export(session, Path::new(command[":export ".len()..].trim()))
            }
            ":multi" => {
                let text = read_block(&mut lines)?;
                report(session.submit(&text), false)
            }
            _ if command.starts_with(":file ") => {
                report(session.submit_file(command[":file ".len()..].trim()), true)
            }
            _ => report(session.submit(&line), false),
        }
    }
    Ok(())
}

/// Collects lines up to the first empty one (or end of input) into one text.
fn read_block<I>(lines: &mut I) -> io::Result<String>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut block = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        block.push(line);
    }
    Ok(block.join("\n"))
}
