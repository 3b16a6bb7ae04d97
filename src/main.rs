//! Purpose: `sstable-results` CLI entry point.
//! Role: Binary crate root; parses args, loads a result dump, renders it as a table or CSV.
//! Invariants: Rendered output goes to stdout only; diagnostics go to stderr.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `to_exit_code`.
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod result_dump;

use result_dump::{ResultDump, load_dump};
use sstable_results::{
    CsvRenderer, Error, ErrorKind, Palette, RenderOptions, TableRenderer, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `sstable-results --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    dispatch_command(cli.command, color_mode).map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "sstable-results",
    version,
    about = "Render storage query results as a box-drawn table or CSV",
    after_help = r#"EXAMPLES
  $ sstable-results table results.json
  $ sstable-results table --raw-timestamps results.json
  $ sstable-results csv --flush-after-line - < results.json

DUMP FORMAT
  {"flags": ["no_metadata"],
   "columns": [{"name": "id", "type": "int", "role": "partition_key"}],
   "rows": [["0000002a"], [null]]}"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize table output and stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Render results as a bordered table")]
    Table {
        #[arg(help = "Result dump (JSON) path, or - for stdin", value_hint = ValueHint::FilePath)]
        dump: PathBuf,
        #[arg(long, help = "Show timestamp columns as raw epoch milliseconds")]
        raw_timestamps: bool,
    },
    #[command(about = "Render results as CSV records (no header row)")]
    Csv {
        #[arg(help = "Result dump (JSON) path, or - for stdin", value_hint = ValueHint::FilePath)]
        dump: PathBuf,
        #[arg(long, help = "Show timestamp columns as raw epoch milliseconds")]
        raw_timestamps: bool,
        #[arg(long, help = "Flush stdout after every record")]
        flush_after_line: bool,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn dispatch_command(command: Command, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Table {
            dump,
            raw_timestamps,
        } => {
            let ResultDump { result, roles } = load_dump(&dump)?;
            let palette = if color_mode.use_color(io::stdout().is_terminal()) {
                Palette::ansi()
            } else {
                Palette::plain()
            };
            let options = RenderOptions::default().with_raw_timestamps(raw_timestamps);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            TableRenderer::new(palette, options).render(
                &result,
                |name| roles.role_of(name),
                &mut out,
            )?;
            Ok(RunOutcome::ok())
        }
        Command::Csv {
            dump,
            raw_timestamps,
            flush_after_line,
        } => {
            let ResultDump { result, .. } = load_dump(&dump)?;
            let options = RenderOptions::default()
                .with_raw_timestamps(raw_timestamps)
                .with_flush_after_line(flush_after_line);
            CsvRenderer::new(options).render(&result, io::stdout().lock())?;
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "sstable-results", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let stderr = io::stderr();
    let line = if stderr.is_terminal() {
        error_text(err, color_mode.use_color(true))
    } else {
        serde_json::to_string(&error_json(err))
            .unwrap_or_else(|_| format!("{{\"error\":{{\"kind\":\"{:?}\"}}}}", err.kind()))
    };
    let _ = writeln!(stderr.lock(), "{line}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Decode => "could not decode value".to_string(),
        ErrorKind::Write => "failed to write output".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_text(err: &Error, use_color: bool) -> String {
    let label = if use_color {
        "\u{1b}[31merror:\u{1b}[0m"
    } else {
        "error:"
    };
    let mut text = format!("{label} {}", error_message(err));
    if let (Some(row), Some(column)) = (err.row(), err.column()) {
        text.push_str(&format!(" (row {row}, column {column})"));
    } else if let Some(row) = err.row() {
        text.push_str(&format!(" (row {row})"));
    }
    if let Some(hint) = err.hint() {
        text.push_str(&format!("\nhint: {hint}"));
    }
    text
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(row) = err.row() {
        inner.insert("row".to_string(), json!(row));
    }
    if let Some(column) = err.column() {
        inner.insert("column".to_string(), json!(column));
    }
    if let Some(source) = std::error::Error::source(err) {
        inner.insert("cause".to_string(), json!(source.to_string()));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}
