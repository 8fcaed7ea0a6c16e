//! CLI binary for docreader.
//!
//! A thin shim over the library crate: `convert` maps flags to a
//! `ReaderConfig` and prints or writes results, `serve` starts the web UI.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docreader::server::{serve, ServerConfig};
use docreader::{
    write_atomic, write_results, BatchProgressCallback, Converter, DownloadKind, EngineChoice,
    FileError, ProgressCallback, ReaderConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self, position: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&position))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} files…"))
        ));
    }

    fn on_file_start(&self, position: usize, _total: usize, name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(position, Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, position: usize, total: usize, name: &str, text_len: usize) {
        let secs = self.elapsed_secs(position);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            green("✓"),
            position,
            total,
            name,
            dim(&format!("{text_len:>7} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, position: usize, total: usize, error: &FileError) {
        let secs = self.elapsed_secs(position);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = error.to_string();
        let msg = match msg.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &msg[..cut]),
            None => msg,
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            position,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the web UI on http://127.0.0.1:8080
  docreader serve

  # Convert to stdout
  docreader convert report.docx

  # Convert several files and write .md files into a directory
  docreader convert a.docx b.pptx c.xlsx -o out/

  # Bundle every converted file into one zip
  docreader convert *.pdf --export converted.zip

  # Convert a web page
  docreader convert https://example.com/article.html

  # Delegate conversion to an external tool
  docreader --engine-command "markitdown {path}" convert notes.pdf

ENVIRONMENT VARIABLES:
  DOCREADER_ENGINE_COMMAND   External converter command line ({path} = staged file)
  DOCREADER_STAGING_DIR      Directory for temporary staged uploads
  DOCREADER_TIMEOUT          Per-file conversion timeout in seconds
  DOCREADER_HOST / _PORT     Listen address for `serve`
  RUST_LOG                   Log filter (overrides -v / -q)
"#;

/// Convert documents to Markdown text, from the terminal or a browser.
#[derive(Parser, Debug)]
#[command(
    name = "docreader",
    version,
    about = "Convert DOCX, XLSX, PPTX, PDF, HTML and ZIP files to Markdown text",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    reader: ReaderArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCREADER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCREADER_QUIET")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by `convert` and `serve`.
#[derive(Args, Debug)]
struct ReaderArgs {
    /// External converter command line; `{path}` is replaced by the staged file.
    #[arg(long, global = true, env = "DOCREADER_ENGINE_COMMAND")]
    engine_command: Option<String>,

    /// Directory for staged uploads (default: system temp dir).
    #[arg(long, global = true, env = "DOCREADER_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Per-file conversion timeout in seconds.
    #[arg(long, global = true, env = "DOCREADER_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Largest accepted file, in megabytes.
    #[arg(long, global = true, env = "DOCREADER_MAX_FILE_MB", default_value_t = 200)]
    max_file_mb: u64,

    /// Reading speed used for the reading-time estimate.
    #[arg(long, global = true, env = "DOCREADER_WPM", default_value_t = 200)]
    words_per_minute: u32,

    /// Keep engine output exactly as produced (no whitespace clean-up).
    #[arg(long, global = true, env = "DOCREADER_RAW")]
    raw: bool,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "DOCREADER_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert local files or URLs.
    Convert(ConvertArgs),
    /// Start the web UI and JSON API.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local file paths or HTTP/HTTPS URLs, converted in the given order.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write one `{stem}_converted.{md|txt}` per converted file into this directory.
    #[arg(short, long, env = "DOCREADER_OUTPUT")]
    output: Option<PathBuf>,

    /// Output file flavour for `--output`.
    #[arg(long, value_enum, default_value = "md")]
    format: FormatArg,

    /// Write every converted file into one zip archive.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the batch report as JSON instead of the extracted text.
    #[arg(long, env = "DOCREADER_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCREADER_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Interface to listen on.
    #[arg(long, env = "DOCREADER_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "DOCREADER_PORT", default_value_t = 8080)]
    port: u16,

    /// Largest accepted upload request, in megabytes.
    #[arg(long, env = "DOCREADER_MAX_REQUEST_MB", default_value_t = 512)]
    max_request_mb: usize,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Md,
    Txt,
}

impl From<FormatArg> for DownloadKind {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Md => DownloadKind::Markdown,
            FormatArg::Txt => DownloadKind::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs while it is on screen.
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.no_progress && !args.json,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(ref args) => {
            let config = build_config(&cli.reader, None)?;
            let converter = Converter::new(config).context("Failed to start converter")?;
            let server = ServerConfig {
                host: args.host.clone(),
                port: args.port,
                max_request_bytes: args.max_request_mb.saturating_mul(1024 * 1024),
            };
            serve(converter, &server).await.context("Server error")?;
            Ok(())
        }
        Command::Convert(ref args) => {
            let progress_cb: Option<ProgressCallback> = if show_progress {
                Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
            } else {
                None
            };
            run_convert(&cli, args, progress_cb).await
        }
    }
}

async fn run_convert(
    cli: &Cli,
    args: &ConvertArgs,
    progress: Option<ProgressCallback>,
) -> Result<()> {
    let bar_summary = progress.is_some();
    let config = build_config(&cli.reader, progress)?;
    let converter = Converter::new(config).context("Failed to start converter")?;

    let report = converter
        .convert_paths(args.inputs.as_slice())
        .await
        .context("Failed to read input")?;

    if let Some(ref dir) = args.output {
        let written = write_results(&report, dir, args.format.into())
            .await
            .context("Failed to write output files")?;
        if !cli.quiet {
            for path in &written {
                eprintln!("  {}  {}", green("→"), bold(&path.display().to_string()));
            }
        }
    }

    if let Some(ref zip_path) = args.export {
        let zip = report.export_zip().context("Nothing to export")?;
        write_atomic(zip_path, &zip)
            .await
            .context("Failed to write zip archive")?;
        if !cli.quiet {
            eprintln!("  {}  {}", green("→"), bold(&zip_path.display().to_string()));
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if args.output.is_none() && args.export.is_none() {
        print_texts(&report)?;
    }

    if !bar_summary && !cli.quiet {
        for error in report.failures() {
            eprintln!("{} {}", red("✗"), error.user_message());
        }
        eprintln!(
            "Converted {}/{} files",
            report.success_count(),
            report.len()
        );
    }

    if !report.is_empty() && report.success_count() == 0 {
        anyhow::bail!("none of the {} inputs could be converted", report.len());
    }
    Ok(())
}

/// Extracted text on stdout, one `## File:` section per file when there are several.
fn print_texts(report: &docreader::BatchReport) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let several = report.len() > 1;
    for result in report.successes() {
        if several {
            writeln!(handle, "## File: {}\n", result.source_name)
                .context("Failed to write to stdout")?;
        }
        handle
            .write_all(result.extracted_text.as_bytes())
            .context("Failed to write to stdout")?;
        if !result.extracted_text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        if several {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

/// Map CLI args to `ReaderConfig`.
fn build_config(args: &ReaderArgs, progress: Option<ProgressCallback>) -> Result<ReaderConfig> {
    let mut builder = ReaderConfig::builder()
        .conversion_timeout_secs(args.timeout)
        .max_file_bytes(args.max_file_mb.saturating_mul(1024 * 1024))
        .words_per_minute(args.words_per_minute)
        .normalize_text(!args.raw)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref line) = args.engine_command {
        let engine = EngineChoice::command_line(line)
            .with_context(|| format!("Invalid --engine-command: {line:?}"))?;
        builder = builder.engine(engine);
    }
    if let Some(ref dir) = args.staging_dir {
        builder = builder.staging_dir(dir.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
