use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use log::{set_boxed_logger, set_max_level, LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[derive(Parser, Debug)]
#[command(
    name = "trace",
    about = "trace records every syscall a program makes.",
    version,
    allow_external_subcommands = true,
    subcommand_required = true
)]
pub struct TraceArgs {
    /// write the trace to this file instead of stderr
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// provide a summary table at the end of tracing
    #[arg(short = 'c', long)]
    pub summary: bool,

    /// mute the traced program's std output
    #[arg(short = 'q', long = "mute-stdout")]
    pub mute_stdout: bool,

    /// log more about the tracer itself, repeat for more detail
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub binary: Option<Binary>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Binary {
    #[command(external_subcommand)]
    Command(Vec<String>),
}

impl TraceArgs {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Installs the stderr logger for the tracer's own diagnostics.
pub fn init_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
    set_boxed_logger(logger)?;
    set_max_level(level);
    Ok(())
}

/// Everything a trace session needs to know up front.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceConfig {
    pub output: Option<PathBuf>,
    pub summary: bool,
    pub mute_stdout: bool,
    pub command: Vec<String>,
}

impl From<TraceArgs> for TraceConfig {
    fn from(args: TraceArgs) -> Self {
        let command = match args.binary {
            Some(Binary::Command(binary_and_args)) => binary_and_args,
            None => vec![],
        };
        TraceConfig {
            output: args.output,
            summary: args.summary,
            mute_stdout: args.mute_stdout,
            command,
        }
    }
}
