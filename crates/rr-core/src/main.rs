//! Result Report - HTML report assembly
//!
//! The main entry point for rr-core, handling:
//! - Report generation from manifests and flags
//! - Images directory preparation
//! - Demo reports from generated inputs
//! - Template inspection

use clap::{Args, CommandFactory, Parser, Subcommand};
use rr_core::demo::{self, DemoOptions, SyntheticLoader};
use rr_core::exit_codes::ExitCode;
use rr_core::logging::{event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use rr_core::manifest::{ManifestError, ReportManifest, DEFAULT_IMAGES_DIR, DEFAULT_OUTPUT};
use rr_core::OutputFormat;
use rr_report::template::tokens;
use rr_report::{
    ensure_images_directory, ErrorPair, ImageFormat, ImageLoader, ReportConfig, ReportError,
    ReportGenerator, ReportOutcome, ReportRequest, Template,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::{error, info};

/// Result Report - assemble printable HTML reports from result images
#[derive(Parser)]
#[command(name = "rr-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a report from a manifest and/or flags
    Generate(GenerateArgs),

    /// Create an images directory (and parents) if missing
    EnsureDir {
        /// Directory to create
        path: PathBuf,
    },

    /// Generate a demo report from placeholder images
    Demo(DemoArgs),

    /// Print the built-in template or inspect a template file
    Template(TemplateArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Report manifest (.toml, .json, .yaml)
    #[arg(long, short = 'm')]
    manifest: Option<PathBuf>,

    /// Report title
    #[arg(long)]
    title: Option<String>,

    /// Evaluation value
    #[arg(long)]
    evaluation: Option<String>,

    /// Message shown under the evaluation
    #[arg(long)]
    message: Option<String>,

    /// Primary result image
    #[arg(long = "result-1")]
    result_1: Option<PathBuf>,

    /// Secondary result image
    #[arg(long = "result-2")]
    result_2: Option<PathBuf>,

    /// Error image pair, repeatable; replaces the manifest's pairs
    #[arg(long = "error", value_name = "ORIGIN,RESULT", value_parser = parse_error_pair)]
    errors: Vec<ErrorPair>,

    /// HTML output path
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// HTML template (built-in template when unset)
    #[arg(long, env = "RR_TEMPLATE")]
    template: Option<PathBuf>,

    /// Directory receiving the report images
    #[arg(long, env = "RR_IMAGES_DIR")]
    images_dir: Option<PathBuf>,

    /// Stored image format (png, jpeg)
    #[arg(long)]
    image_format: Option<ImageFormat>,

    /// JPEG quality (1-100)
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Open the report in the default browser
    #[arg(long)]
    open: bool,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Working directory for the demo report
    #[arg(long, default_value = "demo_report")]
    dir: PathBuf,

    /// Directory with real images to use instead of placeholders
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Number of error pairs
    #[arg(long, default_value_t = demo::DEFAULT_ERROR_COUNT)]
    count: usize,

    /// Render error pairs in memory through a custom loader
    #[arg(long)]
    synthetic: bool,

    /// Open the report in the default browser
    #[arg(long)]
    open: bool,
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// List the tokens of this template instead of printing the built-in one
    #[arg(long, value_name = "PATH")]
    check: Option<PathBuf>,
}

fn parse_error_pair(s: &str) -> Result<ErrorPair, String> {
    match s.split_once(',') {
        Some((origin, result)) if !origin.trim().is_empty() && !result.trim().is_empty() => {
            Ok(ErrorPair::new(origin.trim(), result.trim()))
        }
        _ => Err(format!("expected ORIGIN,RESULT, got {:?}", s)),
    }
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let run_id = generate_run_id();
    let span = tracing::info_span!("run", run_id = %run_id);
    let _guard = span.enter();

    let exit_code = match cli.command {
        Commands::Generate(args) => run_generate(&cli.global, &run_id, &args),
        Commands::EnsureDir { path } => run_ensure_dir(&cli.global, &run_id, path),
        Commands::Demo(args) => run_demo(&cli.global, &run_id, &args),
        Commands::Template(args) => run_template(&cli.global, &run_id, &args),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "rr-core", &mut std::io::stdout());
            ExitCode::Clean
        }
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_generate(global: &GlobalOpts, run_id: &str, args: &GenerateArgs) -> ExitCode {
    info!(event = event_names::RUN_STARTED, command = "generate", "Starting generate command");

    let (request, config) = match build_request(args) {
        Ok(built) => built,
        Err((code, message)) => {
            error!(event = event_names::REPORT_FAILED, %message, "Invalid generate arguments");
            let kind = match code {
                ExitCode::NotFound => "not_found",
                _ => "invalid_input",
            };
            return emit_failure(global, run_id, "generate", code, kind, &message);
        }
    };

    let generator = ReportGenerator::new(config);
    finish_report(global, run_id, "generate", generator.generate(&request))
}

/// Layer flags over the manifest (when given) and fill in defaults.
fn build_request(args: &GenerateArgs) -> Result<(ReportRequest, ReportConfig), (ExitCode, String)> {
    let (mut request, mut config) = match &args.manifest {
        Some(path) => {
            let manifest = ReportManifest::load(path).map_err(|e| {
                let code = match e {
                    ManifestError::NotFound(_) => ExitCode::NotFound,
                    _ => ExitCode::ArgsError,
                };
                (code, e.to_string())
            })?;
            let config = manifest.config.clone();
            (manifest.into_request(), config)
        }
        None => {
            let title = args
                .title
                .clone()
                .ok_or((ExitCode::ArgsError, "--title is required without --manifest".to_string()))?;
            let evaluation = args.evaluation.clone().ok_or((
                ExitCode::ArgsError,
                "--evaluation is required without --manifest".to_string(),
            ))?;
            let request = ReportRequest::new(
                title,
                evaluation,
                String::new(),
                DEFAULT_OUTPUT,
                DEFAULT_IMAGES_DIR,
            );
            (request, ReportConfig::default())
        }
    };

    if let Some(title) = &args.title {
        request.title = title.clone();
    }
    if let Some(evaluation) = &args.evaluation {
        request.evaluation = evaluation.clone();
    }
    if let Some(message) = &args.message {
        request.message = message.clone();
    }
    if let Some(path) = &args.result_1 {
        request.result_1 = Some(path.clone().into());
    }
    if let Some(path) = &args.result_2 {
        request.result_2 = Some(path.clone().into());
    }
    if !args.errors.is_empty() {
        request.error_pairs = args.errors.clone();
    }
    if let Some(output) = &args.output {
        request.output_path = output.clone();
    }
    if let Some(template) = &args.template {
        request.template_path = Some(template.clone());
    }
    if let Some(images_dir) = &args.images_dir {
        request.images_dir = images_dir.clone();
    }
    if args.open {
        request.open_browser = true;
    }

    if let Some(format) = args.image_format {
        config.image_format = format;
    }
    if let Some(quality) = args.jpeg_quality {
        config.jpeg_quality = quality;
    }

    Ok((request, config))
}

fn run_ensure_dir(global: &GlobalOpts, run_id: &str, path: PathBuf) -> ExitCode {
    match ensure_images_directory(&path) {
        Ok(()) => {
            info!(event = event_names::IMAGES_DIR_READY, path = %path.display(), "Images directory ready");
            let payload = json!({
                "command": "ensure-dir",
                "status": "ok",
                "run_id": run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "path": path.display().to_string(),
            });
            emit(global, &payload, || format!("ready: {}", path.display()));
            ExitCode::Clean
        }
        Err(e) => report_error(global, run_id, "ensure-dir", &e),
    }
}

fn run_demo(global: &GlobalOpts, run_id: &str, args: &DemoArgs) -> ExitCode {
    info!(event = event_names::RUN_STARTED, command = "demo", "Starting demo command");

    let options = DemoOptions {
        work_dir: args.dir.clone(),
        source_dir: args.source_dir.clone(),
        error_count: args.count,
        synthetic: args.synthetic,
        open_browser: args.open,
    };
    let request = match demo::prepare(&options) {
        Ok(request) => request,
        Err(e) => return report_error(global, run_id, "demo", &e),
    };
    info!(
        event = event_names::DEMO_PREPARED,
        dir = %args.dir.display(),
        error_pairs = request.error_pairs.len(),
        "Demo inputs prepared"
    );

    let loader = SyntheticLoader;
    let loader: Option<&dyn ImageLoader> = if args.synthetic { Some(&loader) } else { None };
    let result = ReportGenerator::default_config().generate_with_loader(&request, loader);
    finish_report(global, run_id, "demo", result)
}

fn run_template(global: &GlobalOpts, run_id: &str, args: &TemplateArgs) -> ExitCode {
    let Some(path) = &args.check else {
        print!("{}", Template::builtin().text());
        return ExitCode::Clean;
    };

    let template = match Template::load(path) {
        Ok(template) => template,
        Err(e) => return report_error(global, run_id, "template", &e),
    };
    let found = template.tokens();
    let unknown: Vec<&String> = found.iter().filter(|t| !tokens::is_known(t)).collect();
    let unused: Vec<&str> = tokens::ALL
        .iter()
        .copied()
        .filter(|t| !found.iter().any(|f| f.as_str() == *t))
        .collect();

    let payload = json!({
        "command": "template",
        "status": "ok",
        "run_id": run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "template": path.display().to_string(),
        "tokens": found,
        "unknown_tokens": unknown,
        "unused_tokens": unused,
    });
    emit(global, &payload, || {
        format!(
            "{}: {} tokens, {} unknown",
            path.display(),
            found.len(),
            unknown.len()
        )
    });
    ExitCode::Clean
}

fn print_version(global: &GlobalOpts) {
    let version_info = json!({
        "rr_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => println!("{:#}", version_info),
        OutputFormat::Exitcode => {}
        _ => println!("rr-core {}", env!("CARGO_PKG_VERSION")),
    }
}

// ============================================================================
// Output helpers
// ============================================================================

fn finish_report(
    global: &GlobalOpts,
    run_id: &str,
    command: &str,
    result: rr_report::Result<ReportOutcome>,
) -> ExitCode {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return report_error(global, run_id, command, &e),
    };

    info!(
        event = event_names::REPORT_WRITTEN,
        output = %outcome.output_path.display(),
        images = outcome.stored_images.len(),
        "Report written"
    );

    let images: Vec<_> = outcome
        .stored_images
        .iter()
        .map(|img| json!({"role": img.role.to_string(), "path": img.path.display().to_string(), "src": img.src}))
        .collect();
    let payload = json!({
        "command": command,
        "status": "ok",
        "run_id": run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "output": outcome.output_path.display().to_string(),
        "error_count": outcome.error_count,
        "bytes": outcome.bytes,
        "images": images,
        "browser_opened": outcome.browser_opened,
    });
    emit(global, &payload, || {
        format!(
            "report: {} ({} error pairs, {} images)",
            outcome.output_path.display(),
            outcome.error_count,
            outcome.stored_images.len()
        )
    });
    ExitCode::Clean
}

fn report_error(global: &GlobalOpts, run_id: &str, command: &str, err: &ReportError) -> ExitCode {
    let code = ExitCode::from(err.kind());
    error!(event = event_names::REPORT_FAILED, kind = %err.kind(), error = %err, "Command failed");
    emit_failure(global, run_id, command, code, err.kind().as_str(), &err.to_string())
}

fn emit_failure(
    global: &GlobalOpts,
    run_id: &str,
    command: &str,
    code: ExitCode,
    kind: &str,
    message: &str,
) -> ExitCode {
    match global.format {
        OutputFormat::Json => {
            let payload = json!({
                "command": command,
                "status": "error",
                "run_id": run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "error": {
                    "code": code.code_name(),
                    "exit_code": code.as_i32(),
                    "kind": kind,
                    "message": message,
                },
            });
            println!("{:#}", payload);
        }
        OutputFormat::Exitcode => {}
        _ => eprintln!("rr-core {}: {}", command, message),
    }
    code
}

fn emit(global: &GlobalOpts, payload: &serde_json::Value, summary: impl FnOnce() -> String) {
    match global.format {
        OutputFormat::Json => println!("{:#}", payload),
        OutputFormat::Summary => println!("{}", summary()),
        OutputFormat::Md => print!("{}", render_md(payload)),
        OutputFormat::Exitcode => {}
    }
}

fn render_md(payload: &serde_json::Value) -> String {
    let mut out = String::new();
    let command = payload["command"].as_str().unwrap_or("rr-core");
    out.push_str(&format!("# rr-core {}\n\n", command));
    if let Some(map) = payload.as_object() {
        for (key, value) in map {
            if key == "command" {
                continue;
            }
            match value {
                serde_json::Value::Array(items) => {
                    out.push_str(&format!("- **{}**:\n", key));
                    for item in items {
                        out.push_str(&format!("  - {}\n", md_value(item)));
                    }
                }
                other => out.push_str(&format!("- **{}**: {}\n", key, md_value(other))),
            }
        }
    }
    out
}

fn md_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, md_value(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
