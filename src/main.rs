// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};

use cuesync::app_config::{self, Config, DisplayConfig};
use cuesync::file_utils::FileManager;
use cuesync::presentation::LineView;
use cuesync::subtitle_processor::{self, SubtitleFormat};
use cuesync::sync::resolver::{self, ResolvedFrame, Tolerance};
use cuesync::sync::{ClockMode, Renderer, SyncSession};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play subtitles against a simulated clock with word highlighting
    Play(PlayArgs),

    /// List the cues (and word timings) parsed from a subtitle file
    Inspect(InspectArgs),

    /// Resolve the active cue and words at a single point in time
    At(AtArgs),

    /// Generate shell completions for cuesync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct PlayArgs {
    /// Subtitle file (.srt or .vtt)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Offset in seconds added to every cue
    #[arg(short, long, allow_hyphen_values = true)]
    offset: Option<f64>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Subtitle file (.srt or .vtt)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print cues as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct AtArgs {
    /// Subtitle file (.srt or .vtt)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Playback time in seconds
    #[arg(value_name = "SECONDS", allow_hyphen_values = true)]
    time: f64,

    /// Offset in seconds added to every cue
    #[arg(short, long, allow_hyphen_values = true)]
    offset: Option<f64>,

    /// Use exact cue bounds instead of the display padding
    #[arg(long)]
    strict: bool,

    /// Print the resolved frame as JSON
    #[arg(long)]
    json: bool,
}

/// cuesync - word-level subtitle synchronization
///
/// Parses SRT/VTT subtitles and follows them against a playback clock,
/// highlighting the word being spoken.
#[derive(Parser, Debug)]
#[command(name = "cuesync")]
#[command(version)]
#[command(about = "Word-level subtitle synchronization")]
#[command(long_about = "cuesync parses SRT and WebVTT subtitles and follows them against a playback clock, highlighting the active word.

EXAMPLES:
    cuesync play movie.srt                 # Play with a simulated clock
    cuesync play -o -1.5 movie.vtt         # Show subtitles 1.5s earlier
    cuesync inspect --json movie.srt       # Dump cues and word timings
    cuesync at movie.srt 42.3              # What is on screen at 42.3s
    cuesync completions bash > cuesync.bash

PLAY COMMANDS (type and press Enter):
    p          pause / resume
    o <secs>   set offset
    r          restart from zero
    q          quit

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    // @returns: Short tag for log level
    fn tag_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "ERR",
            Level::Warn => "WRN",
            Level::Info => "INF",
            Level::Debug => "DBG",
            Level::Trace => "TRC",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            // Log lines start on a fresh line so they don't collide with the live subtitle line
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\r\x1B[2K\x1B[{}m{} {} {}\x1B[0m",
                Self::color_for_level(level),
                now,
                Self::tag_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

// @struct: Renders frames as a single, continuously rewritten terminal line
struct TerminalRenderer {
    display: DisplayConfig,
    last_line: Mutex<Option<String>>,
}

impl TerminalRenderer {
    fn new(display: DisplayConfig) -> Self {
        TerminalRenderer {
            display,
            last_line: Mutex::new(None),
        }
    }

    fn format_frame(&self, frame: &ResolvedFrame) -> String {
        let line = LineView::build(frame, &self.display.highlight_words)
            .map(|view| view.render_ansi())
            .unwrap_or_default();

        match (self.display.show_timecodes, frame.time) {
            (true, Some(time)) => format!(
                "[{}] {}",
                subtitle_processor::format_timestamp(time, SubtitleFormat::Vtt),
                line
            ),
            _ => line,
        }
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, frame: &ResolvedFrame) {
        let line = self.format_frame(frame);

        let mut last_line = self.last_line.lock();
        if last_line.as_deref() == Some(line.as_str()) {
            return;
        }

        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "\r\x1B[2K{}", line);
        let _ = stdout.flush();
        *last_line = Some(line);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the global max level does the filtering
    // and is raised or lowered once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "cuesync", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config_path, cli.log_level.clone())?;

    match cli.command {
        Commands::Play(args) => run_play(args, config).await,
        Commands::Inspect(args) => run_inspect(args),
        Commands::At(args) => run_at(args, config),
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(config_path: &str, cli_level: Option<CliLogLevel>) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(level) = &cli_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(config_path)?;

    if let Some(level) = cli_level {
        config.log_level = level.into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

fn read_cues(path: &Path) -> Result<Vec<subtitle_processor::Cue>> {
    let (format, content) = FileManager::read_subtitle(path)?;
    let cues = subtitle_processor::parse(format, &content);
    if cues.is_empty() {
        return Err(anyhow!("No subtitles found in {:?}", path));
    }
    Ok(cues)
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let cues = read_cues(&args.file)?;

    if args.json {
        let json = serde_json::to_string_pretty(&cues).context("Failed to serialize cues")?;
        println!("{}", json);
        return Ok(());
    }

    for (i, cue) in cues.iter().enumerate() {
        println!("{:>4}  {}", i + 1, cue);
        for word in &cue.words {
            println!("        {:<16} {:>9.3} - {:>9.3}", word.text, word.start, word.end);
        }
    }
    info!("{} cues", cues.len());

    Ok(())
}

fn run_at(args: AtArgs, config: Config) -> Result<()> {
    let cues = read_cues(&args.file)?;
    let offset = args.offset.unwrap_or(config.sync.initial_offset_secs);
    let tolerance = if args.strict {
        Tolerance {
            cue_pad: 0.0,
            ..config.tolerance.to_tolerance()
        }
    } else {
        config.tolerance.to_tolerance()
    };

    let frame = resolver::resolve_with(&cues, args.time, offset, &tolerance).to_frame(args.time, offset);

    if args.json {
        let json = serde_json::to_string_pretty(&frame).context("Failed to serialize frame")?;
        println!("{}", json);
        return Ok(());
    }

    match LineView::build(&frame, &config.display.highlight_words) {
        Some(view) => {
            println!("{}", view.render_ansi());
            let active = view.active_text();
            if !active.is_empty() {
                println!("active: {}", active.join(" "));
            }
        }
        None => println!("(no subtitle at {:.3}s)", args.time),
    }

    Ok(())
}

async fn run_play(args: PlayArgs, mut config: Config) -> Result<()> {
    if config.sync.clock_mode == ClockMode::External {
        warn!("No external position source in the terminal, using the simulated clock");
        config.sync.clock_mode = ClockMode::Simulated;
    }

    let renderer = TerminalRenderer::new(config.display.clone());
    let mut session = SyncSession::from_config(&config, None, renderer)?;

    if session.load_file(&args.file)? == 0 {
        return Err(anyhow!("No subtitles found in {:?}. Please use a valid .srt or .vtt file.", args.file));
    }

    if let Some(offset) = args.offset {
        session.set_offset(offset);
    }

    let last_end = session.cues().iter().map(|cue| cue.end).fold(0.0, f64::max);
    session.start()?;
    info!("Commands: p = pause/resume, o <secs> = offset, r = restart, q = quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut end_check = tokio::time::interval(Duration::from_millis(500));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                break;
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read from stdin")? {
                    Some(command) => {
                        if !handle_command(&mut session, command.trim())? {
                            break;
                        }
                    }
                    None => stdin_open = false,
                }
            }
            _ = end_check.tick() => {
                let finished = !session.is_paused()
                    && session
                        .position()
                        .is_some_and(|t| t > last_end + session.offset() + config.tolerance.cue_pad_secs);
                if finished {
                    break;
                }
            }
        }
    }

    session.pause();
    println!();
    info!("Playback stopped at {:.1}s", session.position().unwrap_or(0.0));

    Ok(())
}

/// Apply one interactive command; returns false to quit
fn handle_command(session: &mut SyncSession, command: &str) -> Result<bool> {
    let (verb, rest) = command.split_once(' ').unwrap_or((command, ""));

    match verb {
        "" => {}
        "p" | "pause" => {
            if session.is_paused() {
                session.start()?;
            } else {
                session.pause();
            }
        }
        "o" | "offset" => {
            let offset = session.set_offset_str(rest);
            info!("Offset {:+.2}s", offset);
        }
        "r" | "restart" => session.restart()?,
        "q" | "quit" => return Ok(false),
        other => warn!("Unknown command '{}'", other),
    }

    Ok(true)
}
